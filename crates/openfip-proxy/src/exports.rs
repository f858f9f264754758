//! The `DirectOutput_*` C exports.
//!
//! Each export resolves the process-wide proxy instance and forwards into
//! [`Proxy`]. `DirectOutput_Initialize` loads the vendor library and
//! installs the instance; `DirectOutput_Deinitialize` tears it down. Every
//! other export returns `E_HANDLE` while no instance is installed.
//!
//! The global lock is never held across a vendor call: enumeration invokes
//! caller callbacks synchronously, and those callbacks are allowed to call
//! back into these exports.

use std::sync::{Arc, Once};

use parking_lot::Mutex;

use openfip_abi::{
    CallerContext, DeviceChangeCallback, DeviceHandle, E_FAIL, E_HANDLE, EnumerateCallback, Guid,
    Hresult, PageChangeCallback, S_OK, SRequestStatus, SoftButtonChangeCallback,
};
use openfip_vendor::{VendorConfig, VendorLibrary};

use crate::proxy::Proxy;

static PROXY: Mutex<Option<Arc<Proxy<VendorLibrary>>>> = Mutex::new(None);

fn current_proxy() -> Option<Arc<Proxy<VendorLibrary>>> {
    PROXY.lock().clone()
}

fn uninitialized(export: &'static str) -> Hresult {
    tracing::warn!(export, "called before DirectOutput_Initialize");
    E_HANDLE
}

fn init_tracing() {
    static TRACING: Once = Once::new();
    TRACING.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .finish();
        // The host process may run its own subscriber; losing the race is
        // fine, the logs go to theirs instead.
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            tracing::debug!("global tracing subscriber already installed");
        }
    });
}

/// Load the vendor library and forward `DirectOutput_Initialize`.
///
/// Returns `E_FAIL` when the vendor library cannot be loaded or is missing
/// entry points.
///
/// # Safety
/// `plugin_name` must be null or a valid nul-terminated wide string.
#[unsafe(export_name = "DirectOutput_Initialize")]
pub unsafe extern "system" fn directoutput_initialize(plugin_name: *const u16) -> Hresult {
    init_tracing();
    let mut slot = PROXY.lock();
    if slot.is_none() {
        // SAFETY: the symbol table is kept alive inside VendorLibrary for
        // as long as the proxy instance lives.
        let vendor = match unsafe { VendorLibrary::load(&VendorConfig::default()) } {
            Ok(vendor) => vendor,
            Err(err) => {
                tracing::error!(%err, "vendor DirectOutput library unavailable");
                return E_FAIL;
            }
        };
        *slot = Some(Arc::new(Proxy::new(vendor)));
    }
    let proxy = slot.clone();
    drop(slot);
    match proxy {
        // SAFETY: forwarded verbatim under the caller's contract.
        Some(proxy) => unsafe { proxy.initialize(plugin_name) },
        None => E_FAIL,
    }
}

/// Forward `DirectOutput_Deinitialize` and drop the proxy instance.
///
/// Deinitializing while never (or no longer) initialized returns `S_OK`.
#[unsafe(export_name = "DirectOutput_Deinitialize")]
pub extern "system" fn directoutput_deinitialize() -> Hresult {
    let proxy = PROXY.lock().take();
    match proxy {
        Some(proxy) => proxy.deinitialize(),
        None => S_OK,
    }
}

/// Forward `DirectOutput_RegisterDeviceCallback`.
///
/// # Safety
/// Whatever `context` references must stay valid for as long as the vendor
/// may invoke `callback`; the shim never dereferences it.
#[unsafe(export_name = "DirectOutput_RegisterDeviceCallback")]
pub unsafe extern "system" fn directoutput_register_device_callback(
    callback: DeviceChangeCallback,
    context: CallerContext,
) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_RegisterDeviceCallback");
    };
    // The record stays live until Deinitialize; there is no vendor
    // unregister to pair a release with.
    // SAFETY: forwarded under the caller's context contract.
    unsafe { proxy.register_device_change_callback(callback, context) }.status
}

/// Forward `DirectOutput_Enumerate`.
///
/// # Safety
/// Same context contract as `DirectOutput_RegisterDeviceCallback`.
#[unsafe(export_name = "DirectOutput_Enumerate")]
pub unsafe extern "system" fn directoutput_enumerate(
    callback: EnumerateCallback,
    context: CallerContext,
) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_Enumerate");
    };
    // SAFETY: forwarded under the caller's context contract; enumeration is
    // synchronous, so the pairing record is released before returning.
    unsafe { proxy.enumerate_once(callback, context) }
}

/// Forward `DirectOutput_RegisterPageCallback`.
///
/// # Safety
/// Same context contract as `DirectOutput_RegisterDeviceCallback`.
#[unsafe(export_name = "DirectOutput_RegisterPageCallback")]
pub unsafe extern "system" fn directoutput_register_page_callback(
    device: DeviceHandle,
    callback: PageChangeCallback,
    context: CallerContext,
) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_RegisterPageCallback");
    };
    // SAFETY: forwarded under the caller's context contract.
    unsafe { proxy.register_page_callback(device, callback, context) }.status
}

/// Forward `DirectOutput_RegisterSoftButtonCallback`.
///
/// # Safety
/// Same context contract as `DirectOutput_RegisterDeviceCallback`.
#[unsafe(export_name = "DirectOutput_RegisterSoftButtonCallback")]
pub unsafe extern "system" fn directoutput_register_soft_button_callback(
    device: DeviceHandle,
    callback: SoftButtonChangeCallback,
    context: CallerContext,
) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_RegisterSoftButtonCallback");
    };
    // SAFETY: forwarded under the caller's context contract.
    unsafe { proxy.register_soft_button_callback(device, callback, context) }.status
}

/// Forward `DirectOutput_GetDeviceType`.
///
/// # Safety
/// `type_guid` must be valid for writing one GUID.
#[unsafe(export_name = "DirectOutput_GetDeviceType")]
pub unsafe extern "system" fn directoutput_get_device_type(
    device: DeviceHandle,
    type_guid: *mut Guid,
) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_GetDeviceType");
    };
    // SAFETY: forwarded verbatim under the caller's contract.
    unsafe { proxy.get_device_type(device, type_guid) }
}

/// Forward `DirectOutput_GetDeviceInstance`.
///
/// # Safety
/// `instance_guid` must be valid for writing one GUID.
#[unsafe(export_name = "DirectOutput_GetDeviceInstance")]
pub unsafe extern "system" fn directoutput_get_device_instance(
    device: DeviceHandle,
    instance_guid: *mut Guid,
) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_GetDeviceInstance");
    };
    // SAFETY: forwarded verbatim under the caller's contract.
    unsafe { proxy.get_device_instance(device, instance_guid) }
}

/// Forward `DirectOutput_SetProfile`.
///
/// # Safety
/// `profile` must be null or valid for reading `profile_len` wide
/// characters.
#[unsafe(export_name = "DirectOutput_SetProfile")]
pub unsafe extern "system" fn directoutput_set_profile(
    device: DeviceHandle,
    profile_len: u32,
    profile: *const u16,
) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_SetProfile");
    };
    // SAFETY: forwarded verbatim under the caller's contract.
    unsafe { proxy.set_profile(device, profile_len, profile) }
}

/// Forward `DirectOutput_AddPage`.
///
/// # Safety
/// `debug_name` must be null or a valid nul-terminated wide string.
#[unsafe(export_name = "DirectOutput_AddPage")]
pub unsafe extern "system" fn directoutput_add_page(
    device: DeviceHandle,
    page: u32,
    debug_name: *const u16,
    flags: u32,
) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_AddPage");
    };
    // SAFETY: forwarded verbatim under the caller's contract.
    unsafe { proxy.add_page(device, page, debug_name, flags) }
}

/// Forward `DirectOutput_RemovePage`.
#[unsafe(export_name = "DirectOutput_RemovePage")]
pub extern "system" fn directoutput_remove_page(device: DeviceHandle, page: u32) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_RemovePage");
    };
    proxy.remove_page(device, page)
}

/// Forward `DirectOutput_SetLed`.
#[unsafe(export_name = "DirectOutput_SetLed")]
pub extern "system" fn directoutput_set_led(
    device: DeviceHandle,
    page: u32,
    index: u32,
    value: u32,
) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_SetLed");
    };
    proxy.set_led(device, page, index, value)
}

/// Forward `DirectOutput_SetString`.
///
/// # Safety
/// `value` must be valid for reading `value_len` wide characters.
#[unsafe(export_name = "DirectOutput_SetString")]
pub unsafe extern "system" fn directoutput_set_string(
    device: DeviceHandle,
    page: u32,
    index: u32,
    value_len: u32,
    value: *const u16,
) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_SetString");
    };
    // SAFETY: forwarded verbatim under the caller's contract.
    unsafe { proxy.set_string(device, page, index, value_len, value) }
}

/// Forward `DirectOutput_SetImage`.
///
/// # Safety
/// `data` must be valid for reading `size` bytes.
#[unsafe(export_name = "DirectOutput_SetImage")]
pub unsafe extern "system" fn directoutput_set_image(
    device: DeviceHandle,
    page: u32,
    index: u32,
    size: u32,
    data: *const u8,
) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_SetImage");
    };
    // SAFETY: forwarded verbatim under the caller's contract.
    unsafe { proxy.set_image(device, page, index, size, data) }
}

/// Forward `DirectOutput_SetImageFromFile`.
///
/// # Safety
/// `filename` must be valid for reading `filename_len` wide characters.
#[unsafe(export_name = "DirectOutput_SetImageFromFile")]
pub unsafe extern "system" fn directoutput_set_image_from_file(
    device: DeviceHandle,
    page: u32,
    index: u32,
    filename_len: u32,
    filename: *const u16,
) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_SetImageFromFile");
    };
    // SAFETY: forwarded verbatim under the caller's contract.
    unsafe { proxy.set_image_from_file(device, page, index, filename_len, filename) }
}

/// Forward `DirectOutput_StartServer`.
///
/// # Safety
/// Pointer arguments must satisfy the vendor's `StartServer` contract.
#[unsafe(export_name = "DirectOutput_StartServer")]
pub unsafe extern "system" fn directoutput_start_server(
    device: DeviceHandle,
    filename_len: u32,
    filename: *const u16,
    server_id: *mut u32,
    status: *mut SRequestStatus,
) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_StartServer");
    };
    // SAFETY: forwarded verbatim under the caller's contract.
    unsafe { proxy.start_server(device, filename_len, filename, server_id, status) }
}

/// Forward `DirectOutput_CloseServer`.
///
/// # Safety
/// `status` must be null or valid for writing one `SRequestStatus`.
#[unsafe(export_name = "DirectOutput_CloseServer")]
pub unsafe extern "system" fn directoutput_close_server(
    device: DeviceHandle,
    server_id: u32,
    status: *mut SRequestStatus,
) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_CloseServer");
    };
    // SAFETY: forwarded verbatim under the caller's contract.
    unsafe { proxy.close_server(device, server_id, status) }
}

/// Forward `DirectOutput_SendServerMsg`.
///
/// # Safety
/// Pointer arguments must satisfy the vendor's `SendServerMsg` contract.
#[unsafe(export_name = "DirectOutput_SendServerMsg")]
#[allow(clippy::too_many_arguments, reason = "mirrors the vendor signature")]
pub unsafe extern "system" fn directoutput_send_server_msg(
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
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_SendServerMsg");
    };
    // SAFETY: forwarded verbatim under the caller's contract.
    unsafe {
        proxy.send_server_msg(
            device, server_id, request, page, in_len, in_data, out_len, out_data, status,
        )
    }
}

/// Forward `DirectOutput_SendServerFile`.
///
/// # Safety
/// Pointer arguments must satisfy the vendor's `SendServerFile` contract.
#[unsafe(export_name = "DirectOutput_SendServerFile")]
#[allow(clippy::too_many_arguments, reason = "mirrors the vendor signature")]
pub unsafe extern "system" fn directoutput_send_server_file(
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
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_SendServerFile");
    };
    // SAFETY: forwarded verbatim under the caller's contract.
    unsafe {
        proxy.send_server_file(
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
/// Pointer arguments must satisfy the vendor's `SaveFile` contract.
#[unsafe(export_name = "DirectOutput_SaveFile")]
pub unsafe extern "system" fn directoutput_save_file(
    device: DeviceHandle,
    page: u32,
    file: u32,
    filename_len: u32,
    filename: *const u16,
    status: *mut SRequestStatus,
) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_SaveFile");
    };
    // SAFETY: forwarded verbatim under the caller's contract.
    unsafe { proxy.save_file(device, page, file, filename_len, filename, status) }
}

/// Forward `DirectOutput_DisplayFile`.
///
/// # Safety
/// `status` must be null or valid for writing one `SRequestStatus`.
#[unsafe(export_name = "DirectOutput_DisplayFile")]
pub unsafe extern "system" fn directoutput_display_file(
    device: DeviceHandle,
    page: u32,
    index: u32,
    file: u32,
    status: *mut SRequestStatus,
) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_DisplayFile");
    };
    // SAFETY: forwarded verbatim under the caller's contract.
    unsafe { proxy.display_file(device, page, index, file, status) }
}

/// Forward `DirectOutput_DeleteFile`.
///
/// # Safety
/// `status` must be null or valid for writing one `SRequestStatus`.
#[unsafe(export_name = "DirectOutput_DeleteFile")]
pub unsafe extern "system" fn directoutput_delete_file(
    device: DeviceHandle,
    page: u32,
    file: u32,
    status: *mut SRequestStatus,
) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_DeleteFile");
    };
    // SAFETY: forwarded verbatim under the caller's contract.
    unsafe { proxy.delete_file(device, page, file, status) }
}

/// Forward `DirectOutput_GetSerialNumber`.
///
/// # Safety
/// `buffer` must be valid for writing `buffer_len` wide characters.
#[unsafe(export_name = "DirectOutput_GetSerialNumber")]
pub unsafe extern "system" fn directoutput_get_serial_number(
    device: DeviceHandle,
    buffer: *mut u16,
    buffer_len: u32,
) -> Hresult {
    let Some(proxy) = current_proxy() else {
        return uninitialized("DirectOutput_GetSerialNumber");
    };
    // SAFETY: forwarded verbatim under the caller's contract.
    unsafe { proxy.get_serial_number(device, buffer, buffer_len) }
}
