//! Status codes and device constants for the DirectOutput surface.
//!
//! The shim defines no error kinds of its own: everything below is either a
//! standard `HRESULT` or a vendor-defined code observed on the wire. Values
//! are written as unsigned literals and cast, matching how the vendor
//! documents them.

use crate::types::Guid;

/// Status code returned by every DirectOutput entry point.
///
/// Windows `HRESULT` semantics: zero or positive means success, negative
/// (high bit set) means failure.
pub type Hresult = i32;

/// Operation succeeded.
pub const S_OK: Hresult = 0;
/// Unspecified failure.
pub const E_FAIL: Hresult = 0x8000_4005_u32 as i32;
/// Invalid handle, or the library is not initialized.
pub const E_HANDLE: Hresult = 0x8007_0006_u32 as i32;
/// One or more arguments are invalid.
pub const E_INVALIDARG: Hresult = 0x8007_0057_u32 as i32;
/// Allocation failed inside the vendor library.
pub const E_OUTOFMEMORY: Hresult = 0x8007_000E_u32 as i32;
/// Entry point is not implemented for this device.
pub const E_NOTIMPL: Hresult = 0x8000_4001_u32 as i32;
/// Vendor code: supplied buffer is smaller than the device requires.
pub const E_BUFFERTOOSMALL: Hresult = 0xFF04_006F_u32 as i32;
/// Vendor code: the addressed page is not the active page.
pub const E_PAGENOTACTIVE: Hresult = 0xFF04_0001_u32 as i32;

/// Whether a status code reports success, per `HRESULT` convention.
#[must_use]
pub const fn succeeded(status: Hresult) -> bool {
    status >= 0
}

/// Device-type GUID for the Flight Instrument Panel.
pub const DEVICETYPE_FIP: Guid = Guid {
    data1: 0x3E08_3CD8,
    data2: 0x6A37,
    data3: 0x4A58,
    data4: [0x80, 0xA8, 0x3D, 0x6A, 0x2C, 0x07, 0x51, 0x3E],
};

/// Device-type GUID for the X52 Pro multifunction display.
pub const DEVICETYPE_X52PRO: Guid = Guid {
    data1: 0x29DA_D506,
    data2: 0xF93B,
    data3: 0x4F20,
    data4: [0x85, 0xFA, 0x1E, 0x02, 0xC0, 0x4F, 0xAC, 0x17],
};

/// FIP display width in pixels.
pub const FIP_IMAGE_WIDTH: u32 = 320;
/// FIP display height in pixels.
pub const FIP_IMAGE_HEIGHT: u32 = 240;
/// Size of one full FIP framebuffer: 320x240 pixels, 24-bit RGB.
pub const FIP_IMAGE_SIZE: u32 = FIP_IMAGE_WIDTH * FIP_IMAGE_HEIGHT * 3;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::uuid;

    #[test]
    fn test_success_codes() {
        assert!(succeeded(S_OK));
        assert!(!succeeded(E_FAIL));
        assert!(!succeeded(E_HANDLE));
        assert!(!succeeded(E_NOTIMPL));
        assert!(!succeeded(E_BUFFERTOOSMALL));
        assert!(!succeeded(E_PAGENOTACTIVE));
    }

    #[test]
    fn test_hresult_bit_patterns() {
        assert_eq!(E_HANDLE as u32, 0x8007_0006);
        assert_eq!(E_INVALIDARG as u32, 0x8007_0057);
        assert_eq!(E_PAGENOTACTIVE as u32, 0xFF04_0001);
        assert_eq!(E_BUFFERTOOSMALL as u32, 0xFF04_006F);
    }

    #[test]
    fn test_fip_framebuffer_size() {
        assert_eq!(FIP_IMAGE_SIZE, 0x38400);
    }

    #[test]
    fn test_device_type_guids_round_trip() {
        assert_eq!(
            DEVICETYPE_FIP.to_uuid(),
            uuid!("3E083CD8-6A37-4A58-80A8-3D6A2C07513E")
        );
        assert_eq!(
            DEVICETYPE_X52PRO.to_uuid(),
            uuid!("29DAD506-F93B-4F20-85FA-1E02C04FAC17")
        );
    }
}
