//! C-compatible ABI surface for the DirectOutput forwarding shim.
//!
//! This crate defines the types both boundaries of the shim share:
//! - `HRESULT`-style status codes as returned by the vendor library
//! - Opaque handle newtypes ([`DeviceHandle`], [`CallerContext`]) that are
//!   forwarded but never dereferenced or interpreted
//! - `#[repr(C)]` structures exchanged with callers and the vendor library
//!   ([`Guid`], [`SRequestStatus`])
//! - The four callback function-pointer shapes and their [`EventShape`] tags
//! - Soft-button and page-flag bitmasks for the Flight Instrument Panel
//!
//! # ABI Stability
//!
//! Every structure here is `#[repr(C)]` or `#[repr(transparent)]` with a
//! layout checked by `static_assertions`. The shim is a drop-in substitute
//! for the vendor library's own entry points, so this surface must match the
//! vendor's calling convention bit for bit.
//!
//! This crate performs no I/O and allocates nothing.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod constants;
pub mod prelude;
pub mod types;

pub use constants::{
    DEVICETYPE_FIP, DEVICETYPE_X52PRO, E_BUFFERTOOSMALL, E_FAIL, E_HANDLE, E_INVALIDARG,
    E_NOTIMPL, E_OUTOFMEMORY, E_PAGENOTACTIVE, FIP_IMAGE_HEIGHT, FIP_IMAGE_SIZE, FIP_IMAGE_WIDTH,
    Hresult, S_OK, succeeded,
};
pub use types::{
    CallerContext, DeviceChangeCallback, DeviceHandle, EnumerateCallback, EventShape, Guid,
    PageChangeCallback, PageFlags, SRequestStatus, SoftButtonChangeCallback, SoftButtons,
};
