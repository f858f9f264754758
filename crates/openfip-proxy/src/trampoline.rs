//! The fixed trampolines installed with the vendor library.
//!
//! One statically known `extern "system"` function per event shape. The
//! vendor only ever sees these four; the per-registration state rides in
//! the context pointer, which references a registry-owned
//! [`PairingRecord`]. Each trampoline recovers the record, then invokes the
//! caller's callback with the vendor's event arguments unchanged and the
//! caller's original context restored in the final slot.
//!
//! Trampolines run on whichever thread the vendor picks and keep no state
//! of their own; they never touch the registry. A panic in the caller's
//! callback propagates to the vendor's calling thread unmodified.

use openfip_abi::{CallerContext, DeviceHandle, EventShape};

use crate::pairing::{PairingRecord, TargetCallback};

/// Recover the pairing record behind a vendor-delivered context.
///
/// Returns `None` (with a log line) for a null context, which the vendor
/// should never produce.
///
/// # Safety
/// A non-null `context` must point to a `PairingRecord` that is still owned
/// by the registry. The registry guarantees this from registration until
/// release/teardown; releasing a registration the vendor can still fire
/// voids the guarantee.
unsafe fn record_from<'a>(context: CallerContext) -> Option<&'a PairingRecord> {
    if context.is_null() {
        tracing::error!("vendor delivered a null trampoline context");
        return None;
    }
    // SAFETY: non-null per the check above; liveness per this function's
    // contract.
    Some(unsafe { &*context.as_raw().cast::<PairingRecord>() })
}

fn shape_mismatch(expected: EventShape, record: &PairingRecord) {
    tracing::error!(
        expected = expected.as_str(),
        actual = record.shape().as_str(),
        "trampoline context does not match the event shape; event dropped"
    );
}

pub(crate) unsafe extern "system" fn enumerate_trampoline(
    device: DeviceHandle,
    context: CallerContext,
) {
    // SAFETY: the vendor echoes the context we installed at registration.
    let Some(record) = (unsafe { record_from(context) }) else {
        return;
    };
    match record.target() {
        // SAFETY: shape verified; arguments forwarded verbatim with the
        // caller's own context restored.
        TargetCallback::Enumerate(callback) => unsafe { callback(device, record.context()) },
        _ => shape_mismatch(EventShape::Enumerate, record),
    }
}

pub(crate) unsafe extern "system" fn device_change_trampoline(
    device: DeviceHandle,
    added: bool,
    context: CallerContext,
) {
    // SAFETY: the vendor echoes the context we installed at registration.
    let Some(record) = (unsafe { record_from(context) }) else {
        return;
    };
    match record.target() {
        // SAFETY: shape verified; arguments forwarded verbatim.
        TargetCallback::DeviceChange(callback) => unsafe {
            callback(device, added, record.context())
        },
        _ => shape_mismatch(EventShape::DeviceChange, record),
    }
}

pub(crate) unsafe extern "system" fn page_change_trampoline(
    device: DeviceHandle,
    page: u32,
    set_active: bool,
    context: CallerContext,
) {
    // SAFETY: the vendor echoes the context we installed at registration.
    let Some(record) = (unsafe { record_from(context) }) else {
        return;
    };
    match record.target() {
        // SAFETY: shape verified; arguments forwarded verbatim.
        TargetCallback::PageChange(callback) => unsafe {
            callback(device, page, set_active, record.context())
        },
        _ => shape_mismatch(EventShape::PageChange, record),
    }
}

pub(crate) unsafe extern "system" fn soft_button_trampoline(
    device: DeviceHandle,
    buttons: u32,
    context: CallerContext,
) {
    // SAFETY: the vendor echoes the context we installed at registration.
    let Some(record) = (unsafe { record_from(context) }) else {
        return;
    };
    match record.target() {
        // SAFETY: shape verified; arguments forwarded verbatim.
        TargetCallback::SoftButtonChange(callback) => unsafe {
            callback(device, buttons, record.context())
        },
        _ => shape_mismatch(EventShape::SoftButtonChange, record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::c_void;
    use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

    /// Target the test callbacks write into, addressed via the caller
    /// context exactly the way a real integrator would.
    #[derive(Default)]
    struct CallbackLog {
        hits: AtomicU32,
        last_device: AtomicUsize,
        last_page: AtomicU32,
        last_active: AtomicBool,
    }

    unsafe extern "system" fn log_page_change(
        device: DeviceHandle,
        page: u32,
        set_active: bool,
        context: CallerContext,
    ) {
        // SAFETY: the test passes a pointer to a live CallbackLog.
        let log = unsafe { &*context.as_raw().cast::<CallbackLog>() };
        log.hits.fetch_add(1, Ordering::SeqCst);
        log.last_device.store(device.as_raw() as usize, Ordering::SeqCst);
        log.last_page.store(page, Ordering::SeqCst);
        log.last_active.store(set_active, Ordering::SeqCst);
    }

    #[test]
    fn test_page_change_trampoline_restores_caller_context() {
        let log = CallbackLog::default();
        let caller_context =
            CallerContext::from_raw(std::ptr::from_ref(&log).cast_mut().cast::<c_void>());
        let record = PairingRecord::new(TargetCallback::PageChange(log_page_change), caller_context);
        let vendor_context =
            CallerContext::from_raw(std::ptr::from_ref(&record).cast_mut().cast::<c_void>());

        // SAFETY: the record outlives this call and matches the shape.
        unsafe {
            page_change_trampoline(
                DeviceHandle::from_raw(0x1 as *mut c_void),
                2,
                true,
                vendor_context,
            );
        }

        assert_eq!(log.hits.load(Ordering::SeqCst), 1);
        assert_eq!(log.last_device.load(Ordering::SeqCst), 0x1);
        assert_eq!(log.last_page.load(Ordering::SeqCst), 2);
        assert!(log.last_active.load(Ordering::SeqCst));
    }

    #[test]
    fn test_trampoline_drops_null_context() {
        // SAFETY: a null context takes the guarded early return.
        unsafe {
            page_change_trampoline(
                DeviceHandle::from_raw(0x1 as *mut c_void),
                0,
                false,
                CallerContext::NULL,
            );
        }
    }

    #[test]
    fn test_trampoline_drops_mismatched_shape() {
        let log = CallbackLog::default();
        let caller_context =
            CallerContext::from_raw(std::ptr::from_ref(&log).cast_mut().cast::<c_void>());
        // A page-change record delivered to the soft-button trampoline.
        let record = PairingRecord::new(TargetCallback::PageChange(log_page_change), caller_context);
        let vendor_context =
            CallerContext::from_raw(std::ptr::from_ref(&record).cast_mut().cast::<c_void>());

        // SAFETY: the record outlives this call; the shape check must fire.
        unsafe {
            soft_button_trampoline(
                DeviceHandle::from_raw(0x1 as *mut c_void),
                0x20,
                vendor_context,
            );
        }
        assert_eq!(log.hits.load(Ordering::SeqCst), 0);
    }
}
