//! Gate behavior of the `DirectOutput_*` export surface. No vendor library
//! exists in this environment, so `DirectOutput_Initialize` can never
//! install a proxy instance and every other export must refuse with
//! `E_HANDLE`. Teardown without an instance reports `S_OK`.

use std::ffi::c_void;
use std::ptr;

use openfip_abi::{CallerContext, DeviceHandle, E_FAIL, E_HANDLE, S_OK};
use openfip_proxy::exports;
use openfip_vendor::LIBRARY_PATH_ENV;

unsafe extern "system" fn noop_page(
    _device: DeviceHandle,
    _page: u32,
    _set_active: bool,
    _context: CallerContext,
) {
}

unsafe extern "system" fn noop_enumerate(_device: DeviceHandle, _context: CallerContext) {}

fn handle(value: usize) -> DeviceHandle {
    DeviceHandle::from_raw(value as *mut c_void)
}

#[test]
fn test_exports_refuse_before_initialize() {
    let device = handle(0x1);

    assert_eq!(exports::directoutput_set_led(device, 0, 3, 1), E_HANDLE);
    assert_eq!(exports::directoutput_remove_page(device, 0), E_HANDLE);

    // SAFETY: the uninitialized gate returns before any argument is used,
    // so null out-pointers are never written through.
    unsafe {
        assert_eq!(
            exports::directoutput_register_page_callback(device, noop_page, CallerContext::NULL),
            E_HANDLE
        );
        assert_eq!(
            exports::directoutput_enumerate(noop_enumerate, CallerContext::NULL),
            E_HANDLE
        );
        assert_eq!(
            exports::directoutput_get_device_type(device, ptr::null_mut()),
            E_HANDLE
        );
        assert_eq!(
            exports::directoutput_get_serial_number(device, ptr::null_mut(), 0),
            E_HANDLE
        );
    }
}

#[test]
fn test_deinitialize_without_initialize_reports_s_ok() {
    assert_eq!(exports::directoutput_deinitialize(), S_OK);
}

#[test]
fn test_initialize_reports_e_fail_when_vendor_library_is_missing() {
    // SAFETY: no other test in this binary reads environment variables.
    unsafe { std::env::set_var(LIBRARY_PATH_ENV, "/nonexistent/libdirectoutput.so") };

    // SAFETY: a null plugin name is permitted by the entry point.
    let status = unsafe { exports::directoutput_initialize(ptr::null()) };
    assert_eq!(status, E_FAIL);

    // A failed load must not leave a half-installed instance behind.
    assert_eq!(exports::directoutput_set_led(handle(0x1), 0, 0, 0), E_HANDLE);
}
