//! The forwarding proxy over a vendor DirectOutput implementation.
//!
//! Every operation mirrors the vendor surface argument for argument and
//! returns the vendor's status verbatim. The four callback-accepting
//! operations substitute the shim's fixed trampolines and registry-owned
//! pairing records; everything else is pure pass-through.

use openfip_abi::{
    CallerContext, DeviceChangeCallback, DeviceHandle, EnumerateCallback, Guid, Hresult,
    PageChangeCallback, SRequestStatus, SoftButtonChangeCallback, succeeded,
};
use openfip_vendor::DirectOutputApi;

use crate::error::ProxyError;
use crate::pairing::{CallbackRegistry, RegistrationId, TargetCallback};
use crate::trampoline;

/// Outcome of one callback registration.
///
/// `status` is the vendor's status, verbatim. `id` is the release handle
/// for the pairing record and is present only when the vendor reported
/// success; on failure the record has already been rolled back.
#[derive(Debug, Clone, Copy)]
#[must_use]
pub struct Registration {
    /// Vendor status, unmodified.
    pub status: Hresult,
    /// Release handle for the live pairing record.
    pub id: Option<RegistrationId>,
}

impl Registration {
    /// Whether the vendor reported success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        succeeded(self.status)
    }
}

/// Drop-in forwarding proxy over a vendor implementation.
///
/// Stateless per call apart from the [`CallbackRegistry`]; reentrant, and
/// safe to share across threads.
pub struct Proxy<V> {
    vendor: V,
    registry: CallbackRegistry,
}

impl<V: DirectOutputApi> Proxy<V> {
    /// Wrap a vendor implementation.
    pub fn new(vendor: V) -> Self {
        Self {
            vendor,
            registry: CallbackRegistry::new(),
        }
    }

    /// The wrapped vendor.
    pub fn vendor(&self) -> &V {
        &self.vendor
    }

    /// Number of live pairing records.
    #[must_use]
    pub fn live_registrations(&self) -> usize {
        self.registry.len()
    }

    fn finish_registration(
        &self,
        shape: &'static str,
        id: RegistrationId,
        status: Hresult,
    ) -> Registration {
        if succeeded(status) {
            tracing::debug!(registration = %id, shape, "callback registered");
            Registration {
                status,
                id: Some(id),
            }
        } else {
            // Vendor rejected the registration; the record can never fire.
            if let Err(err) = self.registry.release(id) {
                tracing::warn!(%err, "rollback of rejected registration");
            }
            Registration { status, id: None }
        }
    }

    /// Register a device attach/detach callback.
    ///
    /// # Safety
    /// Whatever `context` references must stay valid until the registration
    /// is released; the shim itself never dereferences it.
    pub unsafe fn register_device_change_callback(
        &self,
        callback: DeviceChangeCallback,
        context: CallerContext,
    ) -> Registration {
        let (id, vendor_context) =
            self.registry
                .insert(None, TargetCallback::DeviceChange(callback), context);
        // SAFETY: the trampoline is 'static and the record stays registry-
        // owned until release, satisfying the vendor's lifetime contract.
        let status = unsafe {
            self.vendor.register_device_change_callback(
                trampoline::device_change_trampoline,
                vendor_context,
            )
        };
        self.finish_registration("device-change", id, status)
    }

    /// Enumerate devices; `callback` is visited once per present device
    /// before the vendor call returns.
    ///
    /// # Safety
    /// Same context contract as
    /// [`Self::register_device_change_callback`]. Enumeration is
    /// synchronous, so the registration may be released as soon as this
    /// returns.
    pub unsafe fn enumerate(
        &self,
        callback: EnumerateCallback,
        context: CallerContext,
    ) -> Registration {
        let (id, vendor_context) =
            self.registry
                .insert(None, TargetCallback::Enumerate(callback), context);
        // SAFETY: record registry-owned for at least the duration of the
        // synchronous enumeration.
        let status = unsafe {
            self.vendor
                .enumerate(trampoline::enumerate_trampoline, vendor_context)
        };
        self.finish_registration("enumerate", id, status)
    }

    /// Enumerate and release the pairing record as soon as the vendor call
    /// returns: visitation is synchronous, so nothing can fire afterwards.
    /// Returns the vendor status verbatim.
    ///
    /// # Safety
    /// `context` only needs to stay valid for the duration of this call.
    pub unsafe fn enumerate_once(
        &self,
        callback: EnumerateCallback,
        context: CallerContext,
    ) -> Hresult {
        // SAFETY: forwarded under this function's contract.
        let registration = unsafe { self.enumerate(callback, context) };
        if let Some(id) = registration.id {
            if let Err(err) = self.release_callback(id) {
                tracing::warn!(%err, "releasing enumeration registration");
            }
        }
        registration.status
    }

    /// Register a page-change callback for `device`.
    ///
    /// # Safety
    /// Same context contract as [`Self::register_device_change_callback`].
    pub unsafe fn register_page_callback(
        &self,
        device: DeviceHandle,
        callback: PageChangeCallback,
        context: CallerContext,
    ) -> Registration {
        let (id, vendor_context) =
            self.registry
                .insert(Some(device), TargetCallback::PageChange(callback), context);
        // SAFETY: see register_device_change_callback.
        let status = unsafe {
            self.vendor.register_page_callback(
                device,
                trampoline::page_change_trampoline,
                vendor_context,
            )
        };
        self.finish_registration("page-change", id, status)
    }

    /// Register a soft-button callback for `device`.
    ///
    /// # Safety
    /// Same context contract as [`Self::register_device_change_callback`].
    pub unsafe fn register_soft_button_callback(
        &self,
        device: DeviceHandle,
        callback: SoftButtonChangeCallback,
        context: CallerContext,
    ) -> Registration {
        let (id, vendor_context) = self.registry.insert(
            Some(device),
            TargetCallback::SoftButtonChange(callback),
            context,
        );
        // SAFETY: see register_device_change_callback.
        let status = unsafe {
            self.vendor.register_soft_button_callback(
                device,
                trampoline::soft_button_trampoline,
                vendor_context,
            )
        };
        self.finish_registration("soft-button-change", id, status)
    }

    /// Release one pairing record.
    ///
    /// The vendor offers no unregister call, so this only drops the shim's
    /// record: only call it once the vendor can no longer fire the
    /// registration (after device removal or deinitialization).
    ///
    /// # Errors
    /// [`ProxyError::UnknownRegistration`] if `id` is not live.
    pub fn release_callback(&self, id: RegistrationId) -> Result<(), ProxyError> {
        self.registry.release(id)
    }

    /// Release every pairing record registered under `device`, returning
    /// how many. Same liveness contract as [`Self::release_callback`].
    pub fn release_device_callbacks(&self, device: DeviceHandle) -> usize {
        self.registry.release_device(device)
    }

    // Direct forwarders. Same argument order, same semantics, verbatim
    // status; no validation, no transformation.

    /// Forward `DirectOutput_Initialize`.
    ///
    /// # Safety
    /// Same contract as [`DirectOutputApi::initialize`].
    pub unsafe fn initialize(&self, plugin_name: *const u16) -> Hresult {
        // SAFETY: forwarded verbatim under the same contract.
        unsafe { self.vendor.initialize(plugin_name) }
    }

    /// Forward `DirectOutput_Deinitialize`, then release every pairing
    /// record: after vendor teardown no registration can fire.
    pub fn deinitialize(&self) -> Hresult {
        let status = self.vendor.deinitialize();
        let released = self.registry.clear();
        if released > 0 {
            tracing::debug!(released, "pairing records released at teardown");
        }
        status
    }

    /// Forward `DirectOutput_GetDeviceType`.
    ///
    /// # Safety
    /// Same contract as [`DirectOutputApi::get_device_type`].
    pub unsafe fn get_device_type(&self, device: DeviceHandle, type_guid: *mut Guid) -> Hresult {
        // SAFETY: forwarded verbatim under the same contract.
        unsafe { self.vendor.get_device_type(device, type_guid) }
    }

    /// Forward `DirectOutput_GetDeviceInstance`.
    ///
    /// # Safety
    /// Same contract as [`DirectOutputApi::get_device_instance`].
    pub unsafe fn get_device_instance(
        &self,
        device: DeviceHandle,
        instance_guid: *mut Guid,
    ) -> Hresult {
        // SAFETY: forwarded verbatim under the same contract.
        unsafe { self.vendor.get_device_instance(device, instance_guid) }
    }

    /// Forward `DirectOutput_SetProfile`.
    ///
    /// # Safety
    /// Same contract as [`DirectOutputApi::set_profile`].
    pub unsafe fn set_profile(
        &self,
        device: DeviceHandle,
        profile_len: u32,
        profile: *const u16,
    ) -> Hresult {
        // SAFETY: forwarded verbatim under the same contract.
        unsafe { self.vendor.set_profile(device, profile_len, profile) }
    }

    /// Forward `DirectOutput_AddPage`.
    ///
    /// # Safety
    /// Same contract as [`DirectOutputApi::add_page`].
    pub unsafe fn add_page(
        &self,
        device: DeviceHandle,
        page: u32,
        debug_name: *const u16,
        flags: u32,
    ) -> Hresult {
        // SAFETY: forwarded verbatim under the same contract.
        unsafe { self.vendor.add_page(device, page, debug_name, flags) }
    }

    /// Forward `DirectOutput_RemovePage`.
    pub fn remove_page(&self, device: DeviceHandle, page: u32) -> Hresult {
        self.vendor.remove_page(device, page)
    }

    /// Forward `DirectOutput_SetLed`.
    pub fn set_led(&self, device: DeviceHandle, page: u32, index: u32, value: u32) -> Hresult {
        self.vendor.set_led(device, page, index, value)
    }

    /// Forward `DirectOutput_SetString`.
    ///
    /// # Safety
    /// Same contract as [`DirectOutputApi::set_string`].
    pub unsafe fn set_string(
        &self,
        device: DeviceHandle,
        page: u32,
        index: u32,
        value_len: u32,
        value: *const u16,
    ) -> Hresult {
        // SAFETY: forwarded verbatim under the same contract.
        unsafe { self.vendor.set_string(device, page, index, value_len, value) }
    }

    /// Forward `DirectOutput_SetImage`.
    ///
    /// # Safety
    /// Same contract as [`DirectOutputApi::set_image`].
    pub unsafe fn set_image(
        &self,
        device: DeviceHandle,
        page: u32,
        index: u32,
        size: u32,
        data: *const u8,
    ) -> Hresult {
        // SAFETY: forwarded verbatim under the same contract.
        unsafe { self.vendor.set_image(device, page, index, size, data) }
    }

    /// Forward `DirectOutput_SetImageFromFile`.
    ///
    /// # Safety
    /// Same contract as [`DirectOutputApi::set_image_from_file`].
    pub unsafe fn set_image_from_file(
        &self,
        device: DeviceHandle,
        page: u32,
        index: u32,
        filename_len: u32,
        filename: *const u16,
    ) -> Hresult {
        // SAFETY: forwarded verbatim under the same contract.
        unsafe {
            self.vendor
                .set_image_from_file(device, page, index, filename_len, filename)
        }
    }

    /// Forward `DirectOutput_StartServer`.
    ///
    /// # Safety
    /// Same contract as [`DirectOutputApi::start_server`].
    pub unsafe fn start_server(
        &self,
        device: DeviceHandle,
        filename_len: u32,
        filename: *const u16,
        server_id: *mut u32,
        status: *mut SRequestStatus,
    ) -> Hresult {
        // SAFETY: forwarded verbatim under the same contract.
        unsafe {
            self.vendor
                .start_server(device, filename_len, filename, server_id, status)
        }
    }

    /// Forward `DirectOutput_CloseServer`.
    ///
    /// # Safety
    /// Same contract as [`DirectOutputApi::close_server`].
    pub unsafe fn close_server(
        &self,
        device: DeviceHandle,
        server_id: u32,
        status: *mut SRequestStatus,
    ) -> Hresult {
        // SAFETY: forwarded verbatim under the same contract.
        unsafe { self.vendor.close_server(device, server_id, status) }
    }

    /// Forward `DirectOutput_SendServerMsg`.
    ///
    /// # Safety
    /// Same contract as [`DirectOutputApi::send_server_msg`].
    #[allow(clippy::too_many_arguments, reason = "mirrors the vendor signature")]
    pub unsafe fn send_server_msg(
        &self,
        device: DeviceHandle,
        server_id: u32,
        request: u32,
        page: u32,
        in_len: u32,
        in_data: *const u8,
        out_len: u32,
        out_data: *mut u8,
        status: *mut SRequestStatus,
    ) -> Hresult {
        // SAFETY: forwarded verbatim under the same contract.
        unsafe {
            self.vendor.send_server_msg(
                device, server_id, request, page, in_len, in_data, out_len, out_data, status,
            )
        }
    }

    /// Forward `DirectOutput_SendServerFile`.
    ///
    /// # Safety
    /// Same contract as [`DirectOutputApi::send_server_file`].
    #[allow(clippy::too_many_arguments, reason = "mirrors the vendor signature")]
    pub unsafe fn send_server_file(
        &self,
        device: DeviceHandle,
        server_id: u32,
        request: u32,
        page: u32,
        header_len: u32,
        header: *const u8,
        filename_len: u32,
        filename: *const u16,
        out_len: u32,
        out_data: *mut u8,
        status: *mut SRequestStatus,
    ) -> Hresult {
        // SAFETY: forwarded verbatim under the same contract.
        unsafe {
            self.vendor.send_server_file(
                device,
                server_id,
                request,
                page,
                header_len,
                header,
                filename_len,
                filename,
                out_len,
                out_data,
                status,
            )
        }
    }

    /// Forward `DirectOutput_SaveFile`.
    ///
    /// # Safety
    /// Same contract as [`DirectOutputApi::save_file`].
    pub unsafe fn save_file(
        &self,
        device: DeviceHandle,
        page: u32,
        file: u32,
        filename_len: u32,
        filename: *const u16,
        status: *mut SRequestStatus,
    ) -> Hresult {
        // SAFETY: forwarded verbatim under the same contract.
        unsafe {
            self.vendor
                .save_file(device, page, file, filename_len, filename, status)
        }
    }

    /// Forward `DirectOutput_DisplayFile`.
    ///
    /// # Safety
    /// Same contract as [`DirectOutputApi::display_file`].
    pub unsafe fn display_file(
        &self,
        device: DeviceHandle,
        page: u32,
        index: u32,
        file: u32,
        status: *mut SRequestStatus,
    ) -> Hresult {
        // SAFETY: forwarded verbatim under the same contract.
        unsafe { self.vendor.display_file(device, page, index, file, status) }
    }

    /// Forward `DirectOutput_DeleteFile`.
    ///
    /// # Safety
    /// Same contract as [`DirectOutputApi::delete_file`].
    pub unsafe fn delete_file(
        &self,
        device: DeviceHandle,
        page: u32,
        file: u32,
        status: *mut SRequestStatus,
    ) -> Hresult {
        // SAFETY: forwarded verbatim under the same contract.
        unsafe { self.vendor.delete_file(device, page, file, status) }
    }

    /// Forward `DirectOutput_GetSerialNumber`.
    ///
    /// # Safety
    /// Same contract as [`DirectOutputApi::get_serial_number`].
    pub unsafe fn get_serial_number(
        &self,
        device: DeviceHandle,
        buffer: *mut u16,
        buffer_len: u32,
    ) -> Hresult {
        // SAFETY: forwarded verbatim under the same contract.
        unsafe { self.vendor.get_serial_number(device, buffer, buffer_len) }
    }
}
