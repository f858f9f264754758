//! The vendor library's native surface, one method per entry point.

use openfip_abi::{
    CallerContext, DeviceChangeCallback, DeviceHandle, EnumerateCallback, Guid, Hresult,
    PageChangeCallback, SRequestStatus, SoftButtonChangeCallback,
};

/// The DirectOutput surface the shim forwards to.
///
/// Method signatures mirror the vendor's `DirectOutput_*` exports argument
/// for argument; implementations must not reorder, validate, or transform
/// anything. Wide-string arguments are UTF-16 pointers with an explicit
/// length where the vendor takes one, and are never read by the shim.
///
/// Methods that accept raw pointers or install callbacks are `unsafe`: the
/// pointer contracts are the original C contracts and cannot be checked
/// here. Scalar-only methods are safe.
pub trait DirectOutputApi: Send + Sync {
    /// `DirectOutput_Initialize`.
    ///
    /// # Safety
    /// `plugin_name` must be null or a valid NUL-terminated UTF-16 string
    /// for the duration of the call.
    unsafe fn initialize(&self, plugin_name: *const u16) -> Hresult;

    /// `DirectOutput_Deinitialize`.
    fn deinitialize(&self) -> Hresult;

    /// `DirectOutput_RegisterDeviceCallback`.
    ///
    /// # Safety
    /// The vendor may invoke `callback` with `context` at any point until
    /// deinitialization; both must remain valid for that whole window.
    unsafe fn register_device_change_callback(
        &self,
        callback: DeviceChangeCallback,
        context: CallerContext,
    ) -> Hresult;

    /// `DirectOutput_Enumerate`. Visits every present device synchronously
    /// before returning.
    ///
    /// # Safety
    /// `callback` and `context` must be valid for the duration of the call.
    unsafe fn enumerate(&self, callback: EnumerateCallback, context: CallerContext) -> Hresult;

    /// `DirectOutput_RegisterPageCallback`.
    ///
    /// # Safety
    /// The vendor may invoke `callback` with `context` at any point until
    /// deinitialization or device removal; both must remain valid for that
    /// whole window.
    unsafe fn register_page_callback(
        &self,
        device: DeviceHandle,
        callback: PageChangeCallback,
        context: CallerContext,
    ) -> Hresult;

    /// `DirectOutput_RegisterSoftButtonCallback`.
    ///
    /// # Safety
    /// Same callback-lifetime contract as [`Self::register_page_callback`].
    unsafe fn register_soft_button_callback(
        &self,
        device: DeviceHandle,
        callback: SoftButtonChangeCallback,
        context: CallerContext,
    ) -> Hresult;

    /// `DirectOutput_GetDeviceType`.
    ///
    /// # Safety
    /// `type_guid` must be valid for a 16-byte write.
    unsafe fn get_device_type(&self, device: DeviceHandle, type_guid: *mut Guid) -> Hresult;

    /// `DirectOutput_GetDeviceInstance`.
    ///
    /// # Safety
    /// `instance_guid` must be valid for a 16-byte write.
    unsafe fn get_device_instance(&self, device: DeviceHandle, instance_guid: *mut Guid)
    -> Hresult;

    /// `DirectOutput_SetProfile`.
    ///
    /// # Safety
    /// `profile` must be null or valid for `profile_len` UTF-16 units.
    unsafe fn set_profile(
        &self,
        device: DeviceHandle,
        profile_len: u32,
        profile: *const u16,
    ) -> Hresult;

    /// `DirectOutput_AddPage`.
    ///
    /// # Safety
    /// `debug_name` must be null or a valid NUL-terminated UTF-16 string.
    unsafe fn add_page(
        &self,
        device: DeviceHandle,
        page: u32,
        debug_name: *const u16,
        flags: u32,
    ) -> Hresult;

    /// `DirectOutput_RemovePage`.
    fn remove_page(&self, device: DeviceHandle, page: u32) -> Hresult;

    /// `DirectOutput_SetLed`.
    fn set_led(&self, device: DeviceHandle, page: u32, index: u32, value: u32) -> Hresult;

    /// `DirectOutput_SetString`.
    ///
    /// # Safety
    /// `value` must be valid for `value_len` UTF-16 units.
    unsafe fn set_string(
        &self,
        device: DeviceHandle,
        page: u32,
        index: u32,
        value_len: u32,
        value: *const u16,
    ) -> Hresult;

    /// `DirectOutput_SetImage`.
    ///
    /// # Safety
    /// `data` must be valid for `size` bytes.
    unsafe fn set_image(
        &self,
        device: DeviceHandle,
        page: u32,
        index: u32,
        size: u32,
        data: *const u8,
    ) -> Hresult;

    /// `DirectOutput_SetImageFromFile`.
    ///
    /// # Safety
    /// `filename` must be valid for `filename_len` UTF-16 units.
    unsafe fn set_image_from_file(
        &self,
        device: DeviceHandle,
        page: u32,
        index: u32,
        filename_len: u32,
        filename: *const u16,
    ) -> Hresult;

    /// `DirectOutput_StartServer`.
    ///
    /// # Safety
    /// `filename` must be valid for `filename_len` UTF-16 units; `server_id`
    /// and `status` must be null or valid for writes.
    unsafe fn start_server(
        &self,
        device: DeviceHandle,
        filename_len: u32,
        filename: *const u16,
        server_id: *mut u32,
        status: *mut SRequestStatus,
    ) -> Hresult;

    /// `DirectOutput_CloseServer`.
    ///
    /// # Safety
    /// `status` must be null or valid for a write.
    unsafe fn close_server(
        &self,
        device: DeviceHandle,
        server_id: u32,
        status: *mut SRequestStatus,
    ) -> Hresult;

    /// `DirectOutput_SendServerMsg`.
    ///
    /// # Safety
    /// `in_data` must be valid for `in_len` bytes, `out_data` for `out_len`
    /// bytes of write; `status` must be null or valid for a write.
    #[allow(clippy::too_many_arguments, reason = "mirrors the vendor signature")]
    unsafe fn send_server_msg(
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
    ) -> Hresult;

    /// `DirectOutput_SendServerFile`.
    ///
    /// # Safety
    /// `header` must be valid for `header_len` bytes, `filename` for
    /// `filename_len` UTF-16 units, `out_data` for `out_len` bytes of write;
    /// `status` must be null or valid for a write.
    #[allow(clippy::too_many_arguments, reason = "mirrors the vendor signature")]
    unsafe fn send_server_file(
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
    ) -> Hresult;

    /// `DirectOutput_SaveFile`.
    ///
    /// # Safety
    /// `filename` must be valid for `filename_len` UTF-16 units; `status`
    /// must be null or valid for a write.
    unsafe fn save_file(
        &self,
        device: DeviceHandle,
        page: u32,
        file: u32,
        filename_len: u32,
        filename: *const u16,
        status: *mut SRequestStatus,
    ) -> Hresult;

    /// `DirectOutput_DisplayFile`.
    ///
    /// # Safety
    /// `status` must be null or valid for a write.
    unsafe fn display_file(
        &self,
        device: DeviceHandle,
        page: u32,
        index: u32,
        file: u32,
        status: *mut SRequestStatus,
    ) -> Hresult;

    /// `DirectOutput_DeleteFile`.
    ///
    /// # Safety
    /// `status` must be null or valid for a write.
    unsafe fn delete_file(
        &self,
        device: DeviceHandle,
        page: u32,
        file: u32,
        status: *mut SRequestStatus,
    ) -> Hresult;

    /// `DirectOutput_GetSerialNumber`.
    ///
    /// # Safety
    /// `buffer` must be valid for `buffer_len` UTF-16 units of write.
    unsafe fn get_serial_number(
        &self,
        device: DeviceHandle,
        buffer: *mut u16,
        buffer_len: u32,
    ) -> Hresult;
}
