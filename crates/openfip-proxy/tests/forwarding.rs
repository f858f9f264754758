//! Pass-through property coverage: forwarded calls reach the vendor with
//! identical arguments and the vendor's status comes back unmodified, for
//! arbitrary argument values and arbitrary vendor statuses.

use std::ffi::c_void;

use parking_lot::Mutex;
use proptest::prelude::*;

use openfip_abi::{CallerContext, DeviceHandle, S_OK};
use openfip_proxy::Proxy;
use openfip_vendor::mock::{MockVendor, VendorCall};

fn handle(value: usize) -> DeviceHandle {
    DeviceHandle::from_raw(value as *mut c_void)
}

// One shared log for the proptest soft-button cases below; cases within a
// single proptest run sequentially, and the sentinel context keeps entries
// from other tests in this binary out.
const BUTTON_SENTINEL: usize = 0xF0F0;

static BUTTON_MASKS: Mutex<Vec<u32>> = Mutex::new(Vec::new());

unsafe extern "system" fn record_mask(_device: DeviceHandle, buttons: u32, context: CallerContext) {
    if context.as_raw() as usize == BUTTON_SENTINEL {
        BUTTON_MASKS.lock().push(buttons);
    }
}

#[test]
fn test_set_led_forwards_argument_for_argument() {
    let proxy = Proxy::new(MockVendor::new());
    let device = handle(0x1);

    assert_eq!(proxy.set_led(device, 0, 3, 1), S_OK);
    assert_eq!(
        proxy.vendor().calls(),
        vec![VendorCall::SetLed {
            device,
            page: 0,
            index: 3,
            value: 1,
        }]
    );
}

#[test]
fn test_pointer_arguments_pass_through_unchanged() {
    let proxy = Proxy::new(MockVendor::new());
    let device = handle(0x2);
    let pixels = [0u8; 16];
    let data = pixels.as_ptr();

    // SAFETY: the mock captures the pointer as an address only.
    let status = unsafe { proxy.set_image(device, 1, 0, pixels.len() as u32, data) };
    assert_eq!(status, S_OK);
    assert_eq!(
        proxy.vendor().calls(),
        vec![VendorCall::SetImage {
            device,
            page: 1,
            index: 0,
            size: pixels.len() as u32,
            data: data as usize,
        }]
    );
}

proptest! {
    #[test]
    fn test_set_led_arguments_and_status_are_verbatim(
        device_addr in 1usize..0x10000,
        page: u32,
        index: u32,
        value: u32,
        status: i32,
    ) {
        let proxy = Proxy::new(MockVendor::with_status(status));
        let device = handle(device_addr);

        prop_assert_eq!(proxy.set_led(device, page, index, value), status);
        prop_assert_eq!(
            proxy.vendor().calls(),
            vec![VendorCall::SetLed { device, page, index, value }]
        );
    }

    #[test]
    fn test_remove_page_status_is_verbatim(page: u32, status: i32) {
        let proxy = Proxy::new(MockVendor::with_status(status));
        let device = handle(0x3);

        prop_assert_eq!(proxy.remove_page(device, page), status);
        prop_assert_eq!(
            proxy.vendor().calls(),
            vec![VendorCall::RemovePage { device, page }]
        );
    }

    #[test]
    fn test_soft_button_mask_is_delivered_bit_identical(mask: u32) {
        let proxy = Proxy::new(MockVendor::new());
        let device = handle(0x4);

        // SAFETY: the callback only records scalar copies of its arguments.
        let registration = unsafe {
            proxy.register_soft_button_callback(
                device,
                record_mask,
                CallerContext::from_raw(BUTTON_SENTINEL as *mut c_void),
            )
        };
        prop_assert!(registration.is_ok());

        // SAFETY: the pairing record is live for the duration of the fire.
        let fired = unsafe { proxy.vendor().fire_soft_button_change(device, mask) };
        prop_assert_eq!(fired, 1);

        // Raw mask, including bits outside the defined soft buttons, passes
        // through untouched.
        prop_assert_eq!(BUTTON_MASKS.lock().last().copied(), Some(mask));
    }
}
