//! End-to-end re-indirection coverage over the scriptable mock vendor:
//! events fired by the vendor reach the originally registered callback
//! with the original context restored in the final argument slot.

use std::ffi::c_void;

use parking_lot::Mutex;

use openfip_abi::{CallerContext, DeviceHandle, E_HANDLE, S_OK, SoftButtons, succeeded};
use openfip_proxy::{Proxy, ProxyError, Registration};
use openfip_vendor::mock::{MockVendor, VendorCall};

// Callback targets must be plain extern fns, so invocations land in shared
// logs. Tests run in parallel in one binary; each test registers with a
// unique context sentinel and filters its own entries back out.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageEvent {
    device: usize,
    page: u32,
    set_active: bool,
    context: usize,
}

static PAGE_EVENTS: Mutex<Vec<PageEvent>> = Mutex::new(Vec::new());

unsafe extern "system" fn record_page(
    device: DeviceHandle,
    page: u32,
    set_active: bool,
    context: CallerContext,
) {
    PAGE_EVENTS.lock().push(PageEvent {
        device: device.as_raw() as usize,
        page,
        set_active,
        context: context.as_raw() as usize,
    });
}

fn page_events_for(context: usize) -> Vec<PageEvent> {
    PAGE_EVENTS
        .lock()
        .iter()
        .filter(|event| event.context == context)
        .copied()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DeviceEvent {
    device: usize,
    added: bool,
    context: usize,
}

static DEVICE_EVENTS: Mutex<Vec<DeviceEvent>> = Mutex::new(Vec::new());

unsafe extern "system" fn record_device(device: DeviceHandle, added: bool, context: CallerContext) {
    DEVICE_EVENTS.lock().push(DeviceEvent {
        device: device.as_raw() as usize,
        added,
        context: context.as_raw() as usize,
    });
}

fn device_events_for(context: usize) -> Vec<DeviceEvent> {
    DEVICE_EVENTS
        .lock()
        .iter()
        .filter(|event| event.context == context)
        .copied()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ButtonEvent {
    device: usize,
    buttons: u32,
    context: usize,
}

static BUTTON_EVENTS: Mutex<Vec<ButtonEvent>> = Mutex::new(Vec::new());

unsafe extern "system" fn record_buttons(device: DeviceHandle, buttons: u32, context: CallerContext) {
    BUTTON_EVENTS.lock().push(ButtonEvent {
        device: device.as_raw() as usize,
        buttons,
        context: context.as_raw() as usize,
    });
}

fn button_events_for(context: usize) -> Vec<ButtonEvent> {
    BUTTON_EVENTS
        .lock()
        .iter()
        .filter(|event| event.context == context)
        .copied()
        .collect()
}

static ENUM_EVENTS: Mutex<Vec<DeviceEvent>> = Mutex::new(Vec::new());

unsafe extern "system" fn record_enumerated(device: DeviceHandle, context: CallerContext) {
    ENUM_EVENTS.lock().push(DeviceEvent {
        device: device.as_raw() as usize,
        added: true,
        context: context.as_raw() as usize,
    });
}

fn handle(value: usize) -> DeviceHandle {
    DeviceHandle::from_raw(value as *mut c_void)
}

fn context(value: usize) -> CallerContext {
    CallerContext::from_raw(value as *mut c_void)
}

#[test]
fn test_page_change_restores_original_context() {
    let proxy = Proxy::new(MockVendor::new());
    let device = handle(0x1);
    let caller_context = 0x1234;

    // SAFETY: the callback only records scalar copies of its arguments.
    let registration =
        unsafe { proxy.register_page_callback(device, record_page, context(caller_context)) };
    assert!(registration.is_ok());
    assert_eq!(registration.status, S_OK);
    assert_eq!(proxy.live_registrations(), 1);

    // SAFETY: the pairing record is live until released below.
    let fired = unsafe { proxy.vendor().fire_page_change(device, 2, true) };
    assert_eq!(fired, 1);

    assert_eq!(
        page_events_for(caller_context),
        vec![PageEvent {
            device: 0x1,
            page: 2,
            set_active: true,
            context: caller_context,
        }]
    );
}

#[test]
fn test_duplicate_registrations_each_fire_once() {
    let proxy = Proxy::new(MockVendor::new());
    let device = handle(0x2);
    let caller_context = 0x2222;

    // Same callback and context registered twice is two distinct pairing
    // records, so one event reaches the callback twice.
    // SAFETY: the callback only records scalar copies of its arguments.
    let first =
        unsafe { proxy.register_page_callback(device, record_page, context(caller_context)) };
    // SAFETY: as above.
    let second =
        unsafe { proxy.register_page_callback(device, record_page, context(caller_context)) };
    assert_ne!(first.id, second.id);
    assert_eq!(proxy.live_registrations(), 2);
    assert_eq!(proxy.vendor().page_registrations(), 2);

    // SAFETY: both pairing records are live.
    let fired = unsafe { proxy.vendor().fire_page_change(device, 7, false) };
    assert_eq!(fired, 2);
    assert_eq!(page_events_for(caller_context).len(), 2);
}

#[test]
fn test_distinct_contexts_stay_paired() {
    let proxy = Proxy::new(MockVendor::new());
    let device = handle(0x3);

    // SAFETY: the callbacks only record scalar copies of their arguments.
    let first =
        unsafe { proxy.register_soft_button_callback(device, record_buttons, context(0xA1)) };
    // SAFETY: as above.
    let second =
        unsafe { proxy.register_soft_button_callback(device, record_buttons, context(0xB2)) };
    assert!(first.is_ok());
    assert!(second.is_ok());

    let mask = (SoftButtons::SELECT | SoftButtons::UP).bits();
    // SAFETY: both pairing records are live.
    let fired = unsafe { proxy.vendor().fire_soft_button_change(device, mask) };
    assert_eq!(fired, 2);

    // Each registration sees its own context, not the other's.
    assert_eq!(
        button_events_for(0xA1),
        vec![ButtonEvent {
            device: 0x3,
            buttons: mask,
            context: 0xA1,
        }]
    );
    assert_eq!(
        button_events_for(0xB2),
        vec![ButtonEvent {
            device: 0x3,
            buttons: mask,
            context: 0xB2,
        }]
    );
}

#[test]
fn test_device_change_forwards_attach_and_detach() {
    let proxy = Proxy::new(MockVendor::new());
    let caller_context = 0x4444;

    // SAFETY: the callback only records scalar copies of its arguments.
    let registration =
        unsafe { proxy.register_device_change_callback(record_device, context(caller_context)) };
    assert!(registration.is_ok());

    let device = handle(0x40);
    // SAFETY: the pairing record is live.
    unsafe {
        proxy.vendor().fire_device_change(device, true);
        proxy.vendor().fire_device_change(device, false);
    }

    assert_eq!(
        device_events_for(caller_context),
        vec![
            DeviceEvent {
                device: 0x40,
                added: true,
                context: caller_context,
            },
            DeviceEvent {
                device: 0x40,
                added: false,
                context: caller_context,
            },
        ]
    );
}

#[test]
fn test_enumerate_visits_each_device_with_original_context() {
    let proxy = Proxy::new(MockVendor::new());
    proxy.vendor().add_device(handle(0x51));
    proxy.vendor().add_device(handle(0x52));
    let caller_context = 0x5555;

    // SAFETY: the callback only records scalar copies of its arguments,
    // and enumeration completes before the registration is released.
    let registration = unsafe { proxy.enumerate(record_enumerated, context(caller_context)) };
    assert!(registration.is_ok());

    let visited: Vec<usize> = ENUM_EVENTS
        .lock()
        .iter()
        .filter(|event| event.context == caller_context)
        .map(|event| event.device)
        .collect();
    assert_eq!(visited, vec![0x51, 0x52]);

    // Enumeration is synchronous, so the record can be released right away.
    let id = registration.id.expect("successful registration has an id");
    proxy.release_callback(id).expect("registration is live");
    assert_eq!(proxy.live_registrations(), 0);
}

#[test]
fn test_enumerate_once_releases_after_the_synchronous_visit() {
    let proxy = Proxy::new(MockVendor::new());
    proxy.vendor().add_device(handle(0x61));
    let caller_context = 0x6161;

    // SAFETY: the callback only records scalar copies of its arguments,
    // and enumeration completes within the call.
    let status = unsafe { proxy.enumerate_once(record_enumerated, context(caller_context)) };
    assert_eq!(status, S_OK);

    let visited: Vec<usize> = ENUM_EVENTS
        .lock()
        .iter()
        .filter(|event| event.context == caller_context)
        .map(|event| event.device)
        .collect();
    assert_eq!(visited, vec![0x61]);

    // The pairing record does not outlive the visit.
    assert_eq!(proxy.live_registrations(), 0);
}

#[test]
fn test_vendor_rejection_rolls_back_the_record() {
    let proxy = Proxy::new(MockVendor::with_status(E_HANDLE));
    let device = handle(0x6);

    // SAFETY: the callback only records scalar copies of its arguments.
    let registration =
        unsafe { proxy.register_page_callback(device, record_page, context(0x6666)) };

    // Vendor status comes back verbatim; no record survives the failure.
    assert_eq!(registration.status, E_HANDLE);
    assert!(!registration.is_ok());
    assert!(registration.id.is_none());
    assert_eq!(proxy.live_registrations(), 0);
    assert_eq!(proxy.vendor().page_registrations(), 0);
}

#[test]
fn test_release_is_single_shot() {
    let proxy = Proxy::new(MockVendor::new());
    let device = handle(0x7);

    // SAFETY: the callback only records scalar copies of its arguments.
    let registration =
        unsafe { proxy.register_page_callback(device, record_page, context(0x7777)) };
    let id = registration.id.expect("successful registration has an id");

    proxy.release_callback(id).expect("registration is live");
    assert!(matches!(
        proxy.release_callback(id),
        Err(ProxyError::UnknownRegistration { .. })
    ));
}

#[test]
fn test_release_device_callbacks_drops_only_that_device() {
    let proxy = Proxy::new(MockVendor::new());
    let kept = handle(0x81);
    let removed = handle(0x82);

    // SAFETY: the callbacks only record scalar copies of their arguments.
    let registrations = unsafe {
        [
            proxy.register_page_callback(kept, record_page, context(0x8101)),
            proxy.register_page_callback(removed, record_page, context(0x8201)),
            proxy.register_soft_button_callback(removed, record_buttons, context(0x8202)),
        ]
    };
    assert!(registrations.iter().all(Registration::is_ok));
    assert_eq!(proxy.live_registrations(), 3);

    assert_eq!(proxy.release_device_callbacks(removed), 2);
    assert_eq!(proxy.live_registrations(), 1);
}

#[test]
fn test_deinitialize_forwards_and_clears_registrations() {
    let proxy = Proxy::new(MockVendor::new());
    let device = handle(0x9);

    // SAFETY: the callback only records scalar copies of its arguments.
    let registration =
        unsafe { proxy.register_page_callback(device, record_page, context(0x9999)) };
    assert!(registration.is_ok());
    assert_eq!(proxy.live_registrations(), 1);

    assert_eq!(proxy.deinitialize(), S_OK);
    assert_eq!(proxy.live_registrations(), 0);
    assert!(proxy.vendor().calls().contains(&VendorCall::Deinitialize));
}

#[test]
fn test_registration_status_is_verbatim_even_on_success_codes() {
    // S_FALSE-style positive statuses still count as success.
    let status = 0x1;
    let proxy = Proxy::new(MockVendor::with_status(status));
    let device = handle(0xA);

    // SAFETY: the callback only records scalar copies of its arguments.
    let registration =
        unsafe { proxy.register_page_callback(device, record_page, context(0xAAAA)) };
    assert_eq!(registration.status, status);
    assert!(succeeded(registration.status));
    assert!(registration.id.is_some());
    assert_eq!(proxy.live_registrations(), 1);
}
