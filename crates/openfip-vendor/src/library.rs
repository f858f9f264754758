//! Native binding to the vendor DirectOutput shared library.
//!
//! Every `DirectOutput_*` export is resolved exactly once at load time into
//! a plain function-pointer table; the `libloading::Library` is kept alive
//! alongside it so the pointers stay valid. Calls forward through the table
//! with no inspection of arguments or results.

use std::ffi::OsString;
use std::path::PathBuf;

use libloading::Library;

use openfip_abi::{CallerContext, DeviceHandle, Guid, Hresult, SRequestStatus};
use openfip_abi::{
    DeviceChangeCallback, EnumerateCallback, PageChangeCallback, SoftButtonChangeCallback,
};

use crate::api::DirectOutputApi;
use crate::error::VendorError;

/// Environment variable overriding the vendor library location.
pub const LIBRARY_PATH_ENV: &str = "OPENFIP_DIRECTOUTPUT_LIB";

/// Platform-default vendor library name, searched on the loader path.
#[cfg(windows)]
pub const DEFAULT_LIBRARY_NAME: &str = "DirectOutput.dll";
/// Platform-default vendor library name, searched on the loader path.
#[cfg(not(windows))]
pub const DEFAULT_LIBRARY_NAME: &str = "libdirectoutput.so";

/// Configuration for locating the vendor library.
#[derive(Debug, Clone, Default)]
pub struct VendorConfig {
    /// Explicit library path; takes precedence over the environment.
    pub library_path: Option<PathBuf>,
}

impl VendorConfig {
    /// Configuration using an explicit library path.
    #[must_use]
    pub fn with_library_path(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    /// Resolve the library path: explicit path, then the
    /// [`LIBRARY_PATH_ENV`] override, then [`DEFAULT_LIBRARY_NAME`].
    #[must_use]
    pub fn resolve_library_path(&self) -> PathBuf {
        self.resolve_with_env(std::env::var_os(LIBRARY_PATH_ENV))
    }

    fn resolve_with_env(&self, env_override: Option<OsString>) -> PathBuf {
        if let Some(path) = &self.library_path {
            return path.clone();
        }
        if let Some(path) = env_override {
            return PathBuf::from(path);
        }
        PathBuf::from(DEFAULT_LIBRARY_NAME)
    }
}

type RawInitialize = unsafe extern "system" fn(*const u16) -> Hresult;
type RawDeinitialize = unsafe extern "system" fn() -> Hresult;
type RawRegisterDeviceCallback =
    unsafe extern "system" fn(DeviceChangeCallback, CallerContext) -> Hresult;
type RawEnumerate = unsafe extern "system" fn(EnumerateCallback, CallerContext) -> Hresult;
type RawRegisterPageCallback =
    unsafe extern "system" fn(DeviceHandle, PageChangeCallback, CallerContext) -> Hresult;
type RawRegisterSoftButtonCallback =
    unsafe extern "system" fn(DeviceHandle, SoftButtonChangeCallback, CallerContext) -> Hresult;
type RawGetDeviceGuid = unsafe extern "system" fn(DeviceHandle, *mut Guid) -> Hresult;
type RawSetProfile = unsafe extern "system" fn(DeviceHandle, u32, *const u16) -> Hresult;
type RawAddPage = unsafe extern "system" fn(DeviceHandle, u32, *const u16, u32) -> Hresult;
type RawRemovePage = unsafe extern "system" fn(DeviceHandle, u32) -> Hresult;
type RawSetLed = unsafe extern "system" fn(DeviceHandle, u32, u32, u32) -> Hresult;
type RawSetString = unsafe extern "system" fn(DeviceHandle, u32, u32, u32, *const u16) -> Hresult;
type RawSetImage = unsafe extern "system" fn(DeviceHandle, u32, u32, u32, *const u8) -> Hresult;
type RawSetImageFromFile =
    unsafe extern "system" fn(DeviceHandle, u32, u32, u32, *const u16) -> Hresult;
type RawStartServer = unsafe extern "system" fn(
    DeviceHandle,
    u32,
    *const u16,
    *mut u32,
    *mut SRequestStatus,
) -> Hresult;
type RawCloseServer =
    unsafe extern "system" fn(DeviceHandle, u32, *mut SRequestStatus) -> Hresult;
type RawSendServerMsg = unsafe extern "system" fn(
    DeviceHandle,
    u32,
    u32,
    u32,
    u32,
    *const u8,
    u32,
    *mut u8,
    *mut SRequestStatus,
) -> Hresult;
type RawSendServerFile = unsafe extern "system" fn(
    DeviceHandle,
    u32,
    u32,
    u32,
    u32,
    *const u8,
    u32,
    *const u16,
    u32,
    *mut u8,
    *mut SRequestStatus,
) -> Hresult;
type RawSaveFile = unsafe extern "system" fn(
    DeviceHandle,
    u32,
    u32,
    u32,
    *const u16,
    *mut SRequestStatus,
) -> Hresult;
type RawDisplayFile =
    unsafe extern "system" fn(DeviceHandle, u32, u32, u32, *mut SRequestStatus) -> Hresult;
type RawDeleteFile =
    unsafe extern "system" fn(DeviceHandle, u32, u32, *mut SRequestStatus) -> Hresult;
type RawGetSerialNumber = unsafe extern "system" fn(DeviceHandle, *mut u16, u32) -> Hresult;

/// Function-pointer table resolved from the vendor library.
struct VendorSymbols {
    initialize: RawInitialize,
    deinitialize: RawDeinitialize,
    register_device_callback: RawRegisterDeviceCallback,
    enumerate: RawEnumerate,
    register_page_callback: RawRegisterPageCallback,
    register_soft_button_callback: RawRegisterSoftButtonCallback,
    get_device_type: RawGetDeviceGuid,
    get_device_instance: RawGetDeviceGuid,
    set_profile: RawSetProfile,
    add_page: RawAddPage,
    remove_page: RawRemovePage,
    set_led: RawSetLed,
    set_string: RawSetString,
    set_image: RawSetImage,
    set_image_from_file: RawSetImageFromFile,
    start_server: RawStartServer,
    close_server: RawCloseServer,
    send_server_msg: RawSendServerMsg,
    send_server_file: RawSendServerFile,
    save_file: RawSaveFile,
    display_file: RawDisplayFile,
    delete_file: RawDeleteFile,
    get_serial_number: RawGetSerialNumber,
}

/// The real vendor library, loaded and bound.
pub struct VendorLibrary {
    symbols: VendorSymbols,
    // Keeps every pointer in `symbols` valid.
    _library: Library,
}

// SAFETY: the symbol table is immutable after load and the vendor library's
// surface is documented callable from any thread.
unsafe impl Send for VendorLibrary {}
// SAFETY: see the `Send` impl.
unsafe impl Sync for VendorLibrary {}

macro_rules! resolve {
    ($library:expr, $ty:ty, $name:literal) => {
        // SAFETY: the export is declared with the matching signature; the
        // library file is vouched for by the caller of `load`.
        *unsafe { $library.get::<$ty>($name) }.map_err(|source| VendorError::MissingSymbol {
            name: match std::str::from_utf8($name) {
                Ok(name) => name.trim_end_matches('\0'),
                Err(_) => "?",
            },
            source,
        })?
    };
}

impl VendorLibrary {
    /// Load the vendor library and resolve every `DirectOutput_*` export.
    ///
    /// # Errors
    /// Fails if the library cannot be loaded or any export is missing.
    ///
    /// # Safety
    /// Loading a shared library runs its initialization routines; the
    /// configured path must name a genuine DirectOutput implementation.
    pub unsafe fn load(config: &VendorConfig) -> Result<Self, VendorError> {
        let path = config.resolve_library_path();
        tracing::info!(path = %path.display(), "loading vendor DirectOutput library");

        // SAFETY: caller vouches for the library per this function's contract.
        let library = unsafe { Library::new(&path) }?;

        let symbols = VendorSymbols {
            initialize: resolve!(library, RawInitialize, b"DirectOutput_Initialize\0"),
            deinitialize: resolve!(library, RawDeinitialize, b"DirectOutput_Deinitialize\0"),
            register_device_callback: resolve!(
                library,
                RawRegisterDeviceCallback,
                b"DirectOutput_RegisterDeviceCallback\0"
            ),
            enumerate: resolve!(library, RawEnumerate, b"DirectOutput_Enumerate\0"),
            register_page_callback: resolve!(
                library,
                RawRegisterPageCallback,
                b"DirectOutput_RegisterPageCallback\0"
            ),
            register_soft_button_callback: resolve!(
                library,
                RawRegisterSoftButtonCallback,
                b"DirectOutput_RegisterSoftButtonCallback\0"
            ),
            get_device_type: resolve!(library, RawGetDeviceGuid, b"DirectOutput_GetDeviceType\0"),
            get_device_instance: resolve!(
                library,
                RawGetDeviceGuid,
                b"DirectOutput_GetDeviceInstance\0"
            ),
            set_profile: resolve!(library, RawSetProfile, b"DirectOutput_SetProfile\0"),
            add_page: resolve!(library, RawAddPage, b"DirectOutput_AddPage\0"),
            remove_page: resolve!(library, RawRemovePage, b"DirectOutput_RemovePage\0"),
            set_led: resolve!(library, RawSetLed, b"DirectOutput_SetLed\0"),
            set_string: resolve!(library, RawSetString, b"DirectOutput_SetString\0"),
            set_image: resolve!(library, RawSetImage, b"DirectOutput_SetImage\0"),
            set_image_from_file: resolve!(
                library,
                RawSetImageFromFile,
                b"DirectOutput_SetImageFromFile\0"
            ),
            start_server: resolve!(library, RawStartServer, b"DirectOutput_StartServer\0"),
            close_server: resolve!(library, RawCloseServer, b"DirectOutput_CloseServer\0"),
            send_server_msg: resolve!(library, RawSendServerMsg, b"DirectOutput_SendServerMsg\0"),
            send_server_file: resolve!(
                library,
                RawSendServerFile,
                b"DirectOutput_SendServerFile\0"
            ),
            save_file: resolve!(library, RawSaveFile, b"DirectOutput_SaveFile\0"),
            display_file: resolve!(library, RawDisplayFile, b"DirectOutput_DisplayFile\0"),
            delete_file: resolve!(library, RawDeleteFile, b"DirectOutput_DeleteFile\0"),
            get_serial_number: resolve!(
                library,
                RawGetSerialNumber,
                b"DirectOutput_GetSerialNumber\0"
            ),
        };

        tracing::debug!("vendor DirectOutput surface bound");
        Ok(Self {
            symbols,
            _library: library,
        })
    }
}

impl DirectOutputApi for VendorLibrary {
    unsafe fn initialize(&self, plugin_name: *const u16) -> Hresult {
        // SAFETY: pointer contract is our caller's, per the trait docs.
        unsafe { (self.symbols.initialize)(plugin_name) }
    }

    fn deinitialize(&self) -> Hresult {
        // SAFETY: no arguments; the vendor owns all state involved.
        unsafe { (self.symbols.deinitialize)() }
    }

    unsafe fn register_device_change_callback(
        &self,
        callback: DeviceChangeCallback,
        context: CallerContext,
    ) -> Hresult {
        // SAFETY: callback-lifetime contract is our caller's, per the trait docs.
        unsafe { (self.symbols.register_device_callback)(callback, context) }
    }

    unsafe fn enumerate(&self, callback: EnumerateCallback, context: CallerContext) -> Hresult {
        // SAFETY: callback and context valid for this call per the trait docs.
        unsafe { (self.symbols.enumerate)(callback, context) }
    }

    unsafe fn register_page_callback(
        &self,
        device: DeviceHandle,
        callback: PageChangeCallback,
        context: CallerContext,
    ) -> Hresult {
        // SAFETY: callback-lifetime contract is our caller's, per the trait docs.
        unsafe { (self.symbols.register_page_callback)(device, callback, context) }
    }

    unsafe fn register_soft_button_callback(
        &self,
        device: DeviceHandle,
        callback: SoftButtonChangeCallback,
        context: CallerContext,
    ) -> Hresult {
        // SAFETY: callback-lifetime contract is our caller's, per the trait docs.
        unsafe { (self.symbols.register_soft_button_callback)(device, callback, context) }
    }

    unsafe fn get_device_type(&self, device: DeviceHandle, type_guid: *mut Guid) -> Hresult {
        // SAFETY: pointer contract is our caller's, per the trait docs.
        unsafe { (self.symbols.get_device_type)(device, type_guid) }
    }

    unsafe fn get_device_instance(
        &self,
        device: DeviceHandle,
        instance_guid: *mut Guid,
    ) -> Hresult {
        // SAFETY: pointer contract is our caller's, per the trait docs.
        unsafe { (self.symbols.get_device_instance)(device, instance_guid) }
    }

    unsafe fn set_profile(
        &self,
        device: DeviceHandle,
        profile_len: u32,
        profile: *const u16,
    ) -> Hresult {
        // SAFETY: pointer contract is our caller's, per the trait docs.
        unsafe { (self.symbols.set_profile)(device, profile_len, profile) }
    }

    unsafe fn add_page(
        &self,
        device: DeviceHandle,
        page: u32,
        debug_name: *const u16,
        flags: u32,
    ) -> Hresult {
        // SAFETY: pointer contract is our caller's, per the trait docs.
        unsafe { (self.symbols.add_page)(device, page, debug_name, flags) }
    }

    fn remove_page(&self, device: DeviceHandle, page: u32) -> Hresult {
        // SAFETY: scalar arguments only.
        unsafe { (self.symbols.remove_page)(device, page) }
    }

    fn set_led(&self, device: DeviceHandle, page: u32, index: u32, value: u32) -> Hresult {
        // SAFETY: scalar arguments only.
        unsafe { (self.symbols.set_led)(device, page, index, value) }
    }

    unsafe fn set_string(
        &self,
        device: DeviceHandle,
        page: u32,
        index: u32,
        value_len: u32,
        value: *const u16,
    ) -> Hresult {
        // SAFETY: pointer contract is our caller's, per the trait docs.
        unsafe { (self.symbols.set_string)(device, page, index, value_len, value) }
    }

    unsafe fn set_image(
        &self,
        device: DeviceHandle,
        page: u32,
        index: u32,
        size: u32,
        data: *const u8,
    ) -> Hresult {
        // SAFETY: pointer contract is our caller's, per the trait docs.
        unsafe { (self.symbols.set_image)(device, page, index, size, data) }
    }

    unsafe fn set_image_from_file(
        &self,
        device: DeviceHandle,
        page: u32,
        index: u32,
        filename_len: u32,
        filename: *const u16,
    ) -> Hresult {
        // SAFETY: pointer contract is our caller's, per the trait docs.
        unsafe { (self.symbols.set_image_from_file)(device, page, index, filename_len, filename) }
    }

    unsafe fn start_server(
        &self,
        device: DeviceHandle,
        filename_len: u32,
        filename: *const u16,
        server_id: *mut u32,
        status: *mut SRequestStatus,
    ) -> Hresult {
        // SAFETY: pointer contract is our caller's, per the trait docs.
        unsafe { (self.symbols.start_server)(device, filename_len, filename, server_id, status) }
    }

    unsafe fn close_server(
        &self,
        device: DeviceHandle,
        server_id: u32,
        status: *mut SRequestStatus,
    ) -> Hresult {
        // SAFETY: pointer contract is our caller's, per the trait docs.
        unsafe { (self.symbols.close_server)(device, server_id, status) }
    }

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
    ) -> Hresult {
        // SAFETY: pointer contract is our caller's, per the trait docs.
        unsafe {
            (self.symbols.send_server_msg)(
                device, server_id, request, page, in_len, in_data, out_len, out_data, status,
            )
        }
    }

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
    ) -> Hresult {
        // SAFETY: pointer contract is our caller's, per the trait docs.
        unsafe {
            (self.symbols.send_server_file)(
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

    unsafe fn save_file(
        &self,
        device: DeviceHandle,
        page: u32,
        file: u32,
        filename_len: u32,
        filename: *const u16,
        status: *mut SRequestStatus,
    ) -> Hresult {
        // SAFETY: pointer contract is our caller's, per the trait docs.
        unsafe { (self.symbols.save_file)(device, page, file, filename_len, filename, status) }
    }

    unsafe fn display_file(
        &self,
        device: DeviceHandle,
        page: u32,
        index: u32,
        file: u32,
        status: *mut SRequestStatus,
    ) -> Hresult {
        // SAFETY: pointer contract is our caller's, per the trait docs.
        unsafe { (self.symbols.display_file)(device, page, index, file, status) }
    }

    unsafe fn delete_file(
        &self,
        device: DeviceHandle,
        page: u32,
        file: u32,
        status: *mut SRequestStatus,
    ) -> Hresult {
        // SAFETY: pointer contract is our caller's, per the trait docs.
        unsafe { (self.symbols.delete_file)(device, page, file, status) }
    }

    unsafe fn get_serial_number(
        &self,
        device: DeviceHandle,
        buffer: *mut u16,
        buffer_len: u32,
    ) -> Hresult {
        // SAFETY: pointer contract is our caller's, per the trait docs.
        unsafe { (self.symbols.get_serial_number)(device, buffer, buffer_len) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_explicit_path_wins() {
        let config = VendorConfig::with_library_path("/opt/saitek/DirectOutput.so");
        assert_eq!(
            config.resolve_library_path(),
            PathBuf::from("/opt/saitek/DirectOutput.so")
        );
    }

    #[test]
    fn test_config_resolution_precedence() {
        let env_override = Some(OsString::from("/env/libdirectoutput.so"));

        // Explicit path beats the environment override.
        let explicit = VendorConfig::with_library_path("/opt/saitek/DirectOutput.so");
        assert_eq!(
            explicit.resolve_with_env(env_override.clone()),
            PathBuf::from("/opt/saitek/DirectOutput.so")
        );

        // The environment override beats the platform default.
        assert_eq!(
            VendorConfig::default().resolve_with_env(env_override),
            PathBuf::from("/env/libdirectoutput.so")
        );

        // Nothing configured resolves to the platform default name.
        assert_eq!(
            VendorConfig::default().resolve_with_env(None),
            PathBuf::from(DEFAULT_LIBRARY_NAME)
        );
    }

    #[test]
    fn test_load_reports_missing_library() {
        let config = VendorConfig::with_library_path("/nonexistent/libdirectoutput.so");
        // SAFETY: the path does not exist, so nothing is actually loaded.
        let result = unsafe { VendorLibrary::load(&config) };
        assert!(matches!(result, Err(VendorError::Library(_))));
    }
}
