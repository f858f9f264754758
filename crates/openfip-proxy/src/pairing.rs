//! Pairing records and the registry that owns them.
//!
//! The vendor library accepts exactly one callback pointer and one opaque
//! context pointer per registration. To forward a caller's (callback,
//! context) pair through that interface, the shim pairs them in a
//! [`PairingRecord`], hands the vendor a fixed trampoline plus a pointer to
//! the record, and recovers the pair inside the trampoline.
//!
//! The record must stay valid for as long as the vendor might invoke the
//! trampoline with it. [`CallbackRegistry`] owns every record behind an
//! `Arc` keyed by an opaque [`RegistrationId`], releasing it only on
//! explicit release or teardown, never implicitly when the registering
//! call returns.

use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use openfip_abi::{
    CallerContext, DeviceChangeCallback, DeviceHandle, EnumerateCallback, EventShape,
    PageChangeCallback, SoftButtonChangeCallback,
};

use crate::error::ProxyError;

/// A caller-supplied callback, tagged by the shape it was registered for.
///
/// The tag lets a trampoline verify it recovered a record of its own shape
/// before invoking anything.
#[derive(Debug, Clone, Copy)]
pub enum TargetCallback {
    /// Enumeration visit.
    Enumerate(EnumerateCallback),
    /// Device attach/detach.
    DeviceChange(DeviceChangeCallback),
    /// Page change.
    PageChange(PageChangeCallback),
    /// Soft-button change.
    SoftButtonChange(SoftButtonChangeCallback),
}

impl TargetCallback {
    /// The shape this callback was registered for.
    #[must_use]
    pub const fn shape(self) -> EventShape {
        match self {
            TargetCallback::Enumerate(_) => EventShape::Enumerate,
            TargetCallback::DeviceChange(_) => EventShape::DeviceChange,
            TargetCallback::PageChange(_) => EventShape::PageChange,
            TargetCallback::SoftButtonChange(_) => EventShape::SoftButtonChange,
        }
    }
}

/// The durable pairing of a caller's callback with the caller's context.
///
/// Read-only after construction; concurrent trampoline invocations against
/// one record are safe. The context is stored, never dereferenced.
#[derive(Debug)]
pub struct PairingRecord {
    target: TargetCallback,
    context: CallerContext,
}

impl PairingRecord {
    pub(crate) fn new(target: TargetCallback, context: CallerContext) -> Self {
        Self { target, context }
    }

    /// The caller's callback.
    #[must_use]
    pub fn target(&self) -> TargetCallback {
        self.target
    }

    /// The caller's context, restored verbatim when the callback fires.
    #[must_use]
    pub fn context(&self) -> CallerContext {
        self.context
    }

    /// The shape this record was registered for.
    #[must_use]
    pub fn shape(&self) -> EventShape {
        self.target.shape()
    }
}

/// Opaque handle naming one live registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(u64);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct LiveRegistration {
    /// Device the registration was made under; `None` for the global shapes.
    device: Option<DeviceHandle>,
    record: Arc<PairingRecord>,
}

/// Owner of every live pairing record.
///
/// Records are inserted at registration time and dropped only by
/// [`release`](Self::release), [`release_device`](Self::release_device), or
/// [`clear`](Self::clear). While a record is in the registry, the pointer
/// handed to the vendor stays valid: `Arc` storage never moves.
pub struct CallbackRegistry {
    next_id: AtomicU64,
    live: Mutex<HashMap<RegistrationId, LiveRegistration>>,
}

impl CallbackRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            live: Mutex::new(HashMap::new()),
        }
    }

    /// Insert a new pairing record and return its id together with the
    /// vendor-facing context pointer referencing the record.
    pub(crate) fn insert(
        &self,
        device: Option<DeviceHandle>,
        target: TargetCallback,
        context: CallerContext,
    ) -> (RegistrationId, CallerContext) {
        let id = RegistrationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let record = Arc::new(PairingRecord::new(target, context));
        let vendor_context =
            CallerContext::from_raw(Arc::as_ptr(&record).cast_mut().cast::<c_void>());
        self.live
            .lock()
            .insert(id, LiveRegistration { device, record });
        (id, vendor_context)
    }

    /// Drop the record for `id`.
    ///
    /// Only call once the vendor can no longer invoke the registration;
    /// the registry cannot verify that for you.
    ///
    /// # Errors
    /// [`ProxyError::UnknownRegistration`] if `id` is not live.
    pub fn release(&self, id: RegistrationId) -> Result<(), ProxyError> {
        match self.live.lock().remove(&id) {
            Some(live) => {
                tracing::debug!(
                    registration = %id,
                    shape = live.record.shape().as_str(),
                    "pairing record released"
                );
                Ok(())
            }
            None => Err(ProxyError::UnknownRegistration { id }),
        }
    }

    /// Drop every record registered under `device`, returning how many.
    ///
    /// Same liveness contract as [`release`](Self::release); intended for
    /// use after a device detach.
    pub fn release_device(&self, device: DeviceHandle) -> usize {
        let mut live = self.live.lock();
        let before = live.len();
        live.retain(|_, registration| registration.device != Some(device));
        before - live.len()
    }

    /// Drop every record, returning how many. For teardown.
    pub fn clear(&self) -> usize {
        let mut live = self.live.lock();
        let released = live.len();
        live.clear();
        released
    }

    /// Whether `id` names a live registration.
    #[must_use]
    pub fn contains(&self, id: RegistrationId) -> bool {
        self.live.lock().contains_key(&id)
    }

    /// The shape registered under `id`, if live.
    #[must_use]
    pub fn shape(&self, id: RegistrationId) -> Option<EventShape> {
        self.live.lock().get(&id).map(|live| live.record.shape())
    }

    /// Number of live registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.lock().len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.lock().is_empty()
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "system" fn noop_page(
        _device: DeviceHandle,
        _page: u32,
        _set_active: bool,
        _context: CallerContext,
    ) {
    }

    unsafe extern "system" fn noop_enumerate(_device: DeviceHandle, _context: CallerContext) {}

    fn device(raw: usize) -> DeviceHandle {
        DeviceHandle::from_raw(raw as *mut c_void)
    }

    #[test]
    fn test_insert_assigns_distinct_ids() {
        let registry = CallbackRegistry::new();
        let (a, _) = registry.insert(
            None,
            TargetCallback::Enumerate(noop_enumerate),
            CallerContext::NULL,
        );
        let (b, _) = registry.insert(
            None,
            TargetCallback::Enumerate(noop_enumerate),
            CallerContext::NULL,
        );
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_pairs_get_independent_records() {
        let registry = CallbackRegistry::new();
        let context = CallerContext::from_raw(0x1234 as *mut c_void);
        let (a, ctx_a) = registry.insert(
            Some(device(0x1)),
            TargetCallback::PageChange(noop_page),
            context,
        );
        let (b, ctx_b) = registry.insert(
            Some(device(0x1)),
            TargetCallback::PageChange(noop_page),
            context,
        );
        assert_ne!(a, b);
        assert_ne!(ctx_a, ctx_b, "each registration owns its own record");
    }

    #[test]
    fn test_release_unknown_id_is_an_error() {
        let registry = CallbackRegistry::new();
        let (id, _) = registry.insert(
            None,
            TargetCallback::Enumerate(noop_enumerate),
            CallerContext::NULL,
        );
        assert!(registry.release(id).is_ok());
        assert!(matches!(
            registry.release(id),
            Err(ProxyError::UnknownRegistration { .. })
        ));
    }

    #[test]
    fn test_release_device_drops_only_that_device() {
        let registry = CallbackRegistry::new();
        registry.insert(
            Some(device(0x1)),
            TargetCallback::PageChange(noop_page),
            CallerContext::NULL,
        );
        registry.insert(
            Some(device(0x2)),
            TargetCallback::PageChange(noop_page),
            CallerContext::NULL,
        );
        registry.insert(
            None,
            TargetCallback::Enumerate(noop_enumerate),
            CallerContext::NULL,
        );

        assert_eq!(registry.release_device(device(0x1)), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_clear_empties_the_registry() {
        let registry = CallbackRegistry::new();
        registry.insert(
            None,
            TargetCallback::Enumerate(noop_enumerate),
            CallerContext::NULL,
        );
        registry.insert(
            Some(device(0x1)),
            TargetCallback::PageChange(noop_page),
            CallerContext::NULL,
        );
        assert_eq!(registry.clear(), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_shape_lookup() {
        let registry = CallbackRegistry::new();
        let (id, _) = registry.insert(
            Some(device(0x1)),
            TargetCallback::PageChange(noop_page),
            CallerContext::NULL,
        );
        assert_eq!(registry.shape(id), Some(EventShape::PageChange));
        assert!(registry.release(id).is_ok());
        assert_eq!(registry.shape(id), None);
    }
}
