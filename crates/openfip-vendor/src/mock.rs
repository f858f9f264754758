//! Scriptable vendor stand-in for exercising the layers above.
//!
//! `MockVendor` records every call it receives (pointer arguments as raw
//! addresses), returns a configurable status, keeps every callback
//! registration it accepts, and can fire those callbacks on demand the way
//! the real vendor library would from its own threads.

use parking_lot::Mutex;

use openfip_abi::{
    CallerContext, DEVICETYPE_FIP, DeviceChangeCallback, DeviceHandle, EnumerateCallback, Guid,
    Hresult, PageChangeCallback, S_OK, SRequestStatus, SoftButtonChangeCallback, succeeded,
};

use crate::api::DirectOutputApi;

/// One recorded vendor call. Pointer arguments are captured as addresses so
/// tests can assert pass-through identity without dereferencing anything.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs, reason = "field names mirror the entry-point arguments")]
pub enum VendorCall {
    Initialize { plugin_name: usize },
    Deinitialize,
    RegisterDeviceChangeCallback,
    Enumerate,
    RegisterPageCallback { device: DeviceHandle },
    RegisterSoftButtonCallback { device: DeviceHandle },
    GetDeviceType { device: DeviceHandle },
    GetDeviceInstance { device: DeviceHandle },
    SetProfile { device: DeviceHandle, profile_len: u32, profile: usize },
    AddPage { device: DeviceHandle, page: u32, debug_name: usize, flags: u32 },
    RemovePage { device: DeviceHandle, page: u32 },
    SetLed { device: DeviceHandle, page: u32, index: u32, value: u32 },
    SetString { device: DeviceHandle, page: u32, index: u32, value_len: u32, value: usize },
    SetImage { device: DeviceHandle, page: u32, index: u32, size: u32, data: usize },
    SetImageFromFile { device: DeviceHandle, page: u32, index: u32, filename_len: u32, filename: usize },
    StartServer { device: DeviceHandle, filename_len: u32, filename: usize },
    CloseServer { device: DeviceHandle, server_id: u32 },
    SendServerMsg { device: DeviceHandle, server_id: u32, request: u32, page: u32, in_len: u32, out_len: u32 },
    SendServerFile { device: DeviceHandle, server_id: u32, request: u32, page: u32, header_len: u32, filename_len: u32, out_len: u32 },
    SaveFile { device: DeviceHandle, page: u32, file: u32, filename_len: u32, filename: usize },
    DisplayFile { device: DeviceHandle, page: u32, index: u32, file: u32 },
    DeleteFile { device: DeviceHandle, page: u32, file: u32 },
    GetSerialNumber { device: DeviceHandle, buffer_len: u32 },
}

/// A scriptable DirectOutput vendor for tests.
pub struct MockVendor {
    calls: Mutex<Vec<VendorCall>>,
    status: Mutex<Hresult>,
    devices: Mutex<Vec<DeviceHandle>>,
    device_change: Mutex<Vec<(DeviceChangeCallback, CallerContext)>>,
    page_change: Mutex<Vec<(DeviceHandle, PageChangeCallback, CallerContext)>>,
    soft_button: Mutex<Vec<(DeviceHandle, SoftButtonChangeCallback, CallerContext)>>,
}

impl MockVendor {
    /// A mock that reports `S_OK` for everything.
    #[must_use]
    pub fn new() -> Self {
        Self::with_status(S_OK)
    }

    /// A mock that reports `status` for everything.
    #[must_use]
    pub fn with_status(status: Hresult) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            status: Mutex::new(status),
            devices: Mutex::new(Vec::new()),
            device_change: Mutex::new(Vec::new()),
            page_change: Mutex::new(Vec::new()),
            soft_button: Mutex::new(Vec::new()),
        }
    }

    /// Change the status returned by subsequent calls.
    pub fn set_status(&self, status: Hresult) {
        *self.status.lock() = status;
    }

    /// Add a device that `enumerate` will visit.
    pub fn add_device(&self, device: DeviceHandle) {
        self.devices.lock().push(device);
    }

    /// Every call recorded so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<VendorCall> {
        self.calls.lock().clone()
    }

    /// Total number of recorded calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of accepted device-change registrations.
    #[must_use]
    pub fn device_change_registrations(&self) -> usize {
        self.device_change.lock().len()
    }

    /// Number of accepted page-change registrations.
    #[must_use]
    pub fn page_registrations(&self) -> usize {
        self.page_change.lock().len()
    }

    /// Number of accepted soft-button registrations.
    #[must_use]
    pub fn soft_button_registrations(&self) -> usize {
        self.soft_button.lock().len()
    }

    fn record(&self, call: VendorCall) -> Hresult {
        self.calls.lock().push(call);
        *self.status.lock()
    }

    /// Fire a device attach/detach event into every accepted registration.
    /// Returns the number of callbacks invoked.
    ///
    /// # Safety
    /// Every context stored at registration time must still reference a live
    /// pairing record, per the registration contract.
    pub unsafe fn fire_device_change(&self, device: DeviceHandle, added: bool) -> usize {
        let registered = self.device_change.lock().clone();
        let fired = registered.len();
        for (callback, context) in registered {
            // SAFETY: context liveness is our caller's contract.
            unsafe { callback(device, added, context) };
        }
        fired
    }

    /// Fire a page-change event into every registration made for `device`.
    /// Returns the number of callbacks invoked.
    ///
    /// # Safety
    /// Same contract as [`Self::fire_device_change`].
    pub unsafe fn fire_page_change(
        &self,
        device: DeviceHandle,
        page: u32,
        set_active: bool,
    ) -> usize {
        let registered = self.page_change.lock().clone();
        let mut fired = 0;
        for (registered_device, callback, context) in registered {
            if registered_device == device {
                // SAFETY: context liveness is our caller's contract.
                unsafe { callback(device, page, set_active, context) };
                fired += 1;
            }
        }
        fired
    }

    /// Fire a soft-button event into every registration made for `device`.
    /// Returns the number of callbacks invoked.
    ///
    /// # Safety
    /// Same contract as [`Self::fire_device_change`].
    pub unsafe fn fire_soft_button_change(&self, device: DeviceHandle, buttons: u32) -> usize {
        let registered = self.soft_button.lock().clone();
        let mut fired = 0;
        for (registered_device, callback, context) in registered {
            if registered_device == device {
                // SAFETY: context liveness is our caller's contract.
                unsafe { callback(device, buttons, context) };
                fired += 1;
            }
        }
        fired
    }
}

impl Default for MockVendor {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectOutputApi for MockVendor {
    unsafe fn initialize(&self, plugin_name: *const u16) -> Hresult {
        self.record(VendorCall::Initialize {
            plugin_name: plugin_name as usize,
        })
    }

    fn deinitialize(&self) -> Hresult {
        self.record(VendorCall::Deinitialize)
    }

    unsafe fn register_device_change_callback(
        &self,
        callback: DeviceChangeCallback,
        context: CallerContext,
    ) -> Hresult {
        let status = self.record(VendorCall::RegisterDeviceChangeCallback);
        if succeeded(status) {
            self.device_change.lock().push((callback, context));
        }
        status
    }

    unsafe fn enumerate(&self, callback: EnumerateCallback, context: CallerContext) -> Hresult {
        let status = self.record(VendorCall::Enumerate);
        if succeeded(status) {
            // Snapshot before visiting: the callback may re-enter the mock,
            // so no lock is held while it runs.
            let devices = self.devices.lock().clone();
            for device in devices {
                // SAFETY: the registering layer keeps `context` alive for
                // the duration of this call, which is all enumeration needs.
                unsafe { callback(device, context) };
            }
        }
        status
    }

    unsafe fn register_page_callback(
        &self,
        device: DeviceHandle,
        callback: PageChangeCallback,
        context: CallerContext,
    ) -> Hresult {
        let status = self.record(VendorCall::RegisterPageCallback { device });
        if succeeded(status) {
            self.page_change.lock().push((device, callback, context));
        }
        status
    }

    unsafe fn register_soft_button_callback(
        &self,
        device: DeviceHandle,
        callback: SoftButtonChangeCallback,
        context: CallerContext,
    ) -> Hresult {
        let status = self.record(VendorCall::RegisterSoftButtonCallback { device });
        if succeeded(status) {
            self.soft_button.lock().push((device, callback, context));
        }
        status
    }

    unsafe fn get_device_type(&self, device: DeviceHandle, type_guid: *mut Guid) -> Hresult {
        let status = self.record(VendorCall::GetDeviceType { device });
        if succeeded(status) && !type_guid.is_null() {
            // SAFETY: non-null per the check; valid for a 16-byte write per
            // the trait contract.
            unsafe { type_guid.write(DEVICETYPE_FIP) };
        }
        status
    }

    unsafe fn get_device_instance(
        &self,
        device: DeviceHandle,
        _instance_guid: *mut Guid,
    ) -> Hresult {
        self.record(VendorCall::GetDeviceInstance { device })
    }

    unsafe fn set_profile(
        &self,
        device: DeviceHandle,
        profile_len: u32,
        profile: *const u16,
    ) -> Hresult {
        self.record(VendorCall::SetProfile {
            device,
            profile_len,
            profile: profile as usize,
        })
    }

    unsafe fn add_page(
        &self,
        device: DeviceHandle,
        page: u32,
        debug_name: *const u16,
        flags: u32,
    ) -> Hresult {
        self.record(VendorCall::AddPage {
            device,
            page,
            debug_name: debug_name as usize,
            flags,
        })
    }

    fn remove_page(&self, device: DeviceHandle, page: u32) -> Hresult {
        self.record(VendorCall::RemovePage { device, page })
    }

    fn set_led(&self, device: DeviceHandle, page: u32, index: u32, value: u32) -> Hresult {
        self.record(VendorCall::SetLed {
            device,
            page,
            index,
            value,
        })
    }

    unsafe fn set_string(
        &self,
        device: DeviceHandle,
        page: u32,
        index: u32,
        value_len: u32,
        value: *const u16,
    ) -> Hresult {
        self.record(VendorCall::SetString {
            device,
            page,
            index,
            value_len,
            value: value as usize,
        })
    }

    unsafe fn set_image(
        &self,
        device: DeviceHandle,
        page: u32,
        index: u32,
        size: u32,
        data: *const u8,
    ) -> Hresult {
        self.record(VendorCall::SetImage {
            device,
            page,
            index,
            size,
            data: data as usize,
        })
    }

    unsafe fn set_image_from_file(
        &self,
        device: DeviceHandle,
        page: u32,
        index: u32,
        filename_len: u32,
        filename: *const u16,
    ) -> Hresult {
        self.record(VendorCall::SetImageFromFile {
            device,
            page,
            index,
            filename_len,
            filename: filename as usize,
        })
    }

    unsafe fn start_server(
        &self,
        device: DeviceHandle,
        filename_len: u32,
        filename: *const u16,
        _server_id: *mut u32,
        _status: *mut SRequestStatus,
    ) -> Hresult {
        self.record(VendorCall::StartServer {
            device,
            filename_len,
            filename: filename as usize,
        })
    }

    unsafe fn close_server(
        &self,
        device: DeviceHandle,
        server_id: u32,
        _status: *mut SRequestStatus,
    ) -> Hresult {
        self.record(VendorCall::CloseServer { device, server_id })
    }

    unsafe fn send_server_msg(
        &self,
        device: DeviceHandle,
        server_id: u32,
        request: u32,
        page: u32,
        in_len: u32,
        _in_data: *const u8,
        out_len: u32,
        _out_data: *mut u8,
        _status: *mut SRequestStatus,
    ) -> Hresult {
        self.record(VendorCall::SendServerMsg {
            device,
            server_id,
            request,
            page,
            in_len,
            out_len,
        })
    }

    unsafe fn send_server_file(
        &self,
        device: DeviceHandle,
        server_id: u32,
        request: u32,
        page: u32,
        header_len: u32,
        _header: *const u8,
        filename_len: u32,
        _filename: *const u16,
        out_len: u32,
        _out_data: *mut u8,
        _status: *mut SRequestStatus,
    ) -> Hresult {
        self.record(VendorCall::SendServerFile {
            device,
            server_id,
            request,
            page,
            header_len,
            filename_len,
            out_len,
        })
    }

    unsafe fn save_file(
        &self,
        device: DeviceHandle,
        page: u32,
        file: u32,
        filename_len: u32,
        filename: *const u16,
        _status: *mut SRequestStatus,
    ) -> Hresult {
        self.record(VendorCall::SaveFile {
            device,
            page,
            file,
            filename_len,
            filename: filename as usize,
        })
    }

    unsafe fn display_file(
        &self,
        device: DeviceHandle,
        page: u32,
        index: u32,
        file: u32,
        _status: *mut SRequestStatus,
    ) -> Hresult {
        self.record(VendorCall::DisplayFile {
            device,
            page,
            index,
            file,
        })
    }

    unsafe fn delete_file(
        &self,
        device: DeviceHandle,
        page: u32,
        file: u32,
        _status: *mut SRequestStatus,
    ) -> Hresult {
        self.record(VendorCall::DeleteFile { device, page, file })
    }

    unsafe fn get_serial_number(
        &self,
        device: DeviceHandle,
        _buffer: *mut u16,
        buffer_len: u32,
    ) -> Hresult {
        self.record(VendorCall::GetSerialNumber { device, buffer_len })
    }
}
