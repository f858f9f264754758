//! ABI type definitions for the DirectOutput surface.
//!
//! Handles and caller contexts are opaque: the shim stores and forwards them
//! but never dereferences them, and their meaning is defined entirely by the
//! vendor library (handles) or the calling application (contexts). Wrapping
//! them in distinct `#[repr(transparent)]` newtypes keeps them from being
//! mixed up while leaving the wire representation a plain pointer.

use std::ffi::c_void;
use std::ptr;

use bitflags::bitflags;
use uuid::Uuid;

/// Opaque vendor-issued device handle.
///
/// Produced by the vendor library during enumeration or device-change
/// callbacks and passed back into every per-device entry point. Never
/// dereferenced by the shim.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(*mut c_void);

// SAFETY: the handle is an opaque token. The shim never dereferences it,
// only stores and forwards it, so moving or sharing it across threads cannot
// violate any aliasing rule in this crate.
unsafe impl Send for DeviceHandle {}
// SAFETY: see the `Send` impl; the token is only ever copied.
unsafe impl Sync for DeviceHandle {}

impl DeviceHandle {
    /// The null handle.
    pub const NULL: Self = Self(ptr::null_mut());

    /// Wrap a raw vendor handle.
    #[must_use]
    pub const fn from_raw(raw: *mut c_void) -> Self {
        Self(raw)
    }

    /// The raw pointer value, for forwarding across the C boundary.
    #[must_use]
    pub const fn as_raw(self) -> *mut c_void {
        self.0
    }

    /// Whether this is the null handle.
    #[must_use]
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

/// Opaque caller-supplied context token.
///
/// Callers attach one of these to every callback registration; the shim
/// restores exactly this value in the final argument slot when the callback
/// fires. It may be any value, including null, and is never interpreted.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallerContext(*mut c_void);

// SAFETY: the context is an opaque token owned by the caller. The shim never
// dereferences it, so sending or sharing the token itself is sound; whatever
// it points at is governed by the caller's own callback contract.
unsafe impl Send for CallerContext {}
// SAFETY: see the `Send` impl; the token is only ever copied.
unsafe impl Sync for CallerContext {}

impl CallerContext {
    /// The null context.
    pub const NULL: Self = Self(ptr::null_mut());

    /// Wrap a raw caller context.
    #[must_use]
    pub const fn from_raw(raw: *mut c_void) -> Self {
        Self(raw)
    }

    /// The raw pointer value, for forwarding across the C boundary.
    #[must_use]
    pub const fn as_raw(self) -> *mut c_void {
        self.0
    }

    /// Whether this is the null context.
    #[must_use]
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

/// Enumeration visit: one invocation per device currently present.
pub type EnumerateCallback =
    unsafe extern "system" fn(device: DeviceHandle, context: CallerContext);

/// Device attach/detach notification.
pub type DeviceChangeCallback =
    unsafe extern "system" fn(device: DeviceHandle, added: bool, context: CallerContext);

/// Page activation/deactivation notification.
pub type PageChangeCallback = unsafe extern "system" fn(
    device: DeviceHandle,
    page: u32,
    set_active: bool,
    context: CallerContext,
);

/// Soft-button state-change notification; `buttons` is a [`SoftButtons`] mask.
pub type SoftButtonChangeCallback =
    unsafe extern "system" fn(device: DeviceHandle, buttons: u32, context: CallerContext);

/// The fixed set of callback shapes the vendor library exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventShape {
    /// Enumeration visit (`DeviceHandle` only, synchronous).
    Enumerate,
    /// Device attach/detach (`DeviceHandle` + added flag).
    DeviceChange,
    /// Page activated/deactivated (`DeviceHandle` + page id + flag).
    PageChange,
    /// Soft-button state change (`DeviceHandle` + button bitmask).
    SoftButtonChange,
}

impl EventShape {
    /// All shapes, in registration-surface order.
    pub const ALL: [EventShape; 4] = [
        EventShape::Enumerate,
        EventShape::DeviceChange,
        EventShape::PageChange,
        EventShape::SoftButtonChange,
    ];

    /// Stable name for logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EventShape::Enumerate => "enumerate",
            EventShape::DeviceChange => "device-change",
            EventShape::PageChange => "page-change",
            EventShape::SoftButtonChange => "soft-button-change",
        }
    }
}

/// Windows GUID layout, used for device type and instance identifiers.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guid {
    /// First 32 bits.
    pub data1: u32,
    /// Next 16 bits.
    pub data2: u16,
    /// Next 16 bits.
    pub data3: u16,
    /// Final 64 bits, byte-wise.
    pub data4: [u8; 8],
}

impl Guid {
    /// The all-zero GUID.
    pub const NIL: Self = Self {
        data1: 0,
        data2: 0,
        data3: 0,
        data4: [0; 8],
    };

    /// Convert from a [`Uuid`].
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        let (data1, data2, data3, data4) = uuid.as_fields();
        Self {
            data1,
            data2,
            data3,
            data4: *data4,
        }
    }

    /// Convert to a [`Uuid`].
    #[must_use]
    pub fn to_uuid(self) -> Uuid {
        Uuid::from_fields(self.data1, self.data2, self.data3, &self.data4)
    }
}

impl From<Uuid> for Guid {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl From<Guid> for Uuid {
    fn from(guid: Guid) -> Self {
        guid.to_uuid()
    }
}

/// Out-parameter status block used by the server and file entry points.
///
/// Filled in by the vendor library; the shim forwards the pointer verbatim
/// and never reads the contents.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SRequestStatus {
    /// Header-stage error code.
    pub header_error: u32,
    /// Header-stage info code.
    pub header_info: u32,
    /// Request-stage error code.
    pub request_error: u32,
    /// Request-stage info code.
    pub request_info: u32,
}

bitflags! {
    /// Soft-button bitmask reported by the soft-button-change shape.
    ///
    /// The bit layout is fixed by the vendor library; unused bits are
    /// reserved by the device firmware.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SoftButtons: u32 {
        /// Select (right rotary push).
        const SELECT     = 0x0000_0001;
        /// Right rotary turned up.
        const UP         = 0x0000_0002;
        /// Right rotary turned down.
        const DOWN       = 0x0000_0004;
        /// Left rotary turned up.
        const LEFT       = 0x0000_0008;
        /// Left rotary turned down.
        const RIGHT      = 0x0000_0010;
        /// Soft button S1.
        const S1         = 0x0000_0020;
        /// Soft button S2.
        const S2         = 0x0000_0040;
        /// Soft button S3.
        const S3         = 0x0000_0080;
        /// Soft button S4.
        const S4         = 0x0000_0100;
        /// Soft button S5.
        const S5         = 0x0000_0200;
        /// Soft button S6.
        const S6         = 0x0000_0400;
    }
}

bitflags! {
    /// Flags accepted by the AddPage entry point.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PageFlags: u32 {
        /// Make the new page active immediately.
        const SET_AS_ACTIVE = 0x0000_0001;
    }
}

static_assertions::const_assert_eq!(std::mem::size_of::<Guid>(), 16);
static_assertions::const_assert_eq!(std::mem::size_of::<SRequestStatus>(), 16);
static_assertions::const_assert_eq!(
    std::mem::size_of::<DeviceHandle>(),
    std::mem::size_of::<*mut c_void>()
);
static_assertions::const_assert_eq!(
    std::mem::size_of::<CallerContext>(),
    std::mem::size_of::<*mut c_void>()
);

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::uuid;

    #[test]
    fn test_handle_null_round_trip() {
        assert!(DeviceHandle::NULL.is_null());
        assert!(CallerContext::NULL.is_null());

        let handle = DeviceHandle::from_raw(0x1234 as *mut c_void);
        assert!(!handle.is_null());
        assert_eq!(handle.as_raw() as usize, 0x1234);
    }

    #[test]
    fn test_handle_types_do_not_compare_by_accident() {
        let a = DeviceHandle::from_raw(0x10 as *mut c_void);
        let b = DeviceHandle::from_raw(0x20 as *mut c_void);
        assert_ne!(a, b);
        assert_eq!(a, DeviceHandle::from_raw(0x10 as *mut c_void));
    }

    #[test]
    fn test_guid_uuid_round_trip() {
        let uuid = uuid!("3E083CD8-6A37-4A58-80A8-3D6A2C07513E");
        let guid = Guid::from_uuid(uuid);
        assert_eq!(guid.data1, 0x3E08_3CD8);
        assert_eq!(guid.data2, 0x6A37);
        assert_eq!(guid.data3, 0x4A58);
        assert_eq!(guid.to_uuid(), uuid);
    }

    #[test]
    fn test_srequest_status_default_is_zeroed() {
        let status = SRequestStatus::default();
        assert_eq!(status.header_error, 0);
        assert_eq!(status.request_error, 0);
    }

    #[test]
    fn test_soft_button_bits() {
        let pressed = SoftButtons::S1 | SoftButtons::SELECT;
        assert_eq!(pressed.bits(), 0x21);
        assert!(pressed.contains(SoftButtons::S1));
        assert!(!pressed.contains(SoftButtons::S6));

        // Firmware may set reserved bits; they must survive truncation checks.
        let raw = SoftButtons::from_bits_truncate(0xFFFF_FFFF);
        assert!(raw.contains(SoftButtons::S6));
    }

    #[test]
    fn test_event_shape_names_are_distinct() {
        let names: Vec<&str> = EventShape::ALL.iter().map(|s| s.as_str()).collect();
        for (i, name) in names.iter().enumerate() {
            for other in &names[i + 1..] {
                assert_ne!(name, other);
            }
        }
    }
}
