//! Convenience re-exports for common ABI types.

pub use crate::constants::{
    DEVICETYPE_FIP, DEVICETYPE_X52PRO, E_BUFFERTOOSMALL, E_FAIL, E_HANDLE, E_INVALIDARG,
    E_NOTIMPL, E_OUTOFMEMORY, E_PAGENOTACTIVE, FIP_IMAGE_SIZE, Hresult, S_OK, succeeded,
};
pub use crate::types::{
    CallerContext, DeviceChangeCallback, DeviceHandle, EnumerateCallback, EventShape, Guid,
    PageChangeCallback, PageFlags, SRequestStatus, SoftButtonChangeCallback, SoftButtons,
};
