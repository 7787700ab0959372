//! Device interface lists from the configuration manager
//!
//! The configuration manager returns device interface paths as a packed multi-string. The
//! functions here return them as a [`MultiSz`].
//!
//! References:
//! * [`CM_Get_Device_Interface_ListW`]
//!
//! [`CM_Get_Device_Interface_ListW`]: https://learn.microsoft.com/en-us/windows/win32/api/cfgmgr32/nf-cfgmgr32-cm_get_device_interface_listw

use std::ffi::OsStr;
use windows_sys::Win32::Devices::DeviceAndDriverInstallation::{
    CM_GET_DEVICE_INTERFACE_LIST_ALL_DEVICES, CM_GET_DEVICE_INTERFACE_LIST_PRESENT,
    CM_Get_Device_Interface_List_SizeW, CM_Get_Device_Interface_ListW, CM_MapCrToWin32Err,
};

pub use windows_sys::core::GUID;

use crate::{
    code::{ConfigRet, ConfigRetResult, Win32Error},
    define_int_enum,
    multi_sz::{MultiSz, MultiSzView},
    outcome::Outcome,
    outcome_try, util,
};

define_int_enum!(
    "Which devices to list interfaces for",
    u32,
    InterfaceListScope {
        Present = CM_GET_DEVICE_INTERFACE_LIST_PRESENT, "Only devices that are currently present";
        AllDevices = CM_GET_DEVICE_INTERFACE_LIST_ALL_DEVICES, "All devices, including those not present";
    }
);

/// Return the size, in UTF-16 units, of the buffer needed to hold the interface list.
///
/// The size includes the terminators. It is only a hint, since devices may arrive before the
/// list is retrieved.
///
/// This corresponds to [`CM_Get_Device_Interface_List_SizeW`].
///
/// [`CM_Get_Device_Interface_List_SizeW`]: https://learn.microsoft.com/en-us/windows/win32/api/cfgmgr32/nf-cfgmgr32-cm_get_device_interface_list_sizew
pub fn get_device_interface_list_size(
    interface_class: &GUID,
    device_id: Option<&OsStr>,
    scope: InterfaceListScope,
) -> ConfigRetResult<usize> {
    let device_id = util::wide_null_opt(device_id);
    let mut len = 0u32;
    // SAFETY: `device_id` is null or null-terminated, and `len` is writable
    let cr = ConfigRet(unsafe {
        CM_Get_Device_Interface_List_SizeW(
            &mut len,
            interface_class,
            util::opt_pcwstr(device_id.as_deref()),
            scope.into(),
        )
    });
    if cr != ConfigRet::SUCCESS {
        return Outcome::from_failure(cr);
    }
    Outcome::success(len as usize)
}

/// Return the paths of the interfaces of class `interface_class`, optionally restricted to the
/// device with instance ID `device_id`.
///
/// If the list grows between sizing the buffer and filling it, the call is retried.
///
/// This corresponds to [`CM_Get_Device_Interface_ListW`].
///
/// [`CM_Get_Device_Interface_ListW`]: https://learn.microsoft.com/en-us/windows/win32/api/cfgmgr32/nf-cfgmgr32-cm_get_device_interface_listw
pub fn get_device_interface_list(
    interface_class: &GUID,
    device_id: Option<&OsStr>,
    scope: InterfaceListScope,
) -> ConfigRetResult<MultiSz> {
    let wide_id = util::wide_null_opt(device_id);
    loop {
        let len = outcome_try!(get_device_interface_list_size(
            interface_class,
            device_id,
            scope
        ));
        // An empty list is still one terminator
        let mut buf = vec![0u16; len.max(1)];
        // SAFETY: `buf` is writable for the length passed
        let cr = ConfigRet(unsafe {
            CM_Get_Device_Interface_ListW(
                interface_class,
                util::opt_pcwstr(wide_id.as_deref()),
                buf.as_mut_ptr(),
                util::dword_len(buf.len()),
                scope.into(),
            )
        });
        match cr {
            ConfigRet::SUCCESS => {
                // Drop any unused tail of the buffer
                return Outcome::success(MultiSzView::new(&buf).to_multi_string());
            }
            ConfigRet::BUFFER_SMALL => continue,
            failure => return Outcome::from_failure(failure),
        }
    }
}

/// Map a `CONFIGRET` to a Win32 error code using the system's own table.
///
/// `default` is returned for codes with no Win32 counterpart. See also
/// [`ConfigRet::to_win32_or`], which does not call into the system.
///
/// This corresponds to [`CM_MapCrToWin32Err`].
///
/// [`CM_MapCrToWin32Err`]: https://learn.microsoft.com/en-us/windows/win32/api/cfgmgr32/nf-cfgmgr32-cm_mapcrtowin32err
pub fn map_configret_to_win32_err(cr: ConfigRet, default: Win32Error) -> Win32Error {
    // SAFETY: Trivially safe
    Win32Error(unsafe { CM_MapCrToWin32Err(cr.0, default.0) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multi_sz::is_valid_multi_string;

    const GUID_DEVINTERFACE_VOLUME: GUID =
        GUID::from_u128(0x53f5630d_b6bf_11d0_94f2_00a0c91efb8b);

    #[test]
    fn test_scope() {
        assert_eq!(u32::from(InterfaceListScope::Present), 0);
        assert_eq!(InterfaceListScope::try_from(1), Ok(InterfaceListScope::AllDevices));
    }

    #[test]
    fn test_volume_interfaces() {
        let list = get_device_interface_list(
            &GUID_DEVINTERFACE_VOLUME,
            None,
            InterfaceListScope::Present,
        )
        .throw_if_failed()
        .unwrap();
        assert!(is_valid_multi_string(list.as_slice()));
        for path in list.to_strings_lossy() {
            assert!(path.starts_with(r"\\?\"), "unexpected path {path}");
        }
    }

    #[test]
    fn test_unknown_device() {
        let result = get_device_interface_list(
            &GUID_DEVINTERFACE_VOLUME,
            Some(OsStr::new(r"ROOT\WINWRAP\NO_SUCH_DEVICE")),
            InterfaceListScope::Present,
        );
        assert!(result.is_failure() || result.get().is_empty());
    }

    #[test]
    fn test_map_configret() {
        assert_eq!(
            map_configret_to_win32_err(ConfigRet::SUCCESS, Win32Error::INVALID_FUNCTION),
            Win32Error::SUCCESS
        );
        for cr in [
            ConfigRet::OUT_OF_MEMORY,
            ConfigRet::ACCESS_DENIED,
            ConfigRet::BUFFER_SMALL,
        ] {
            assert_eq!(
                map_configret_to_win32_err(cr, Win32Error::INVALID_FUNCTION),
                cr.to_win32_or(Win32Error::INVALID_FUNCTION),
                "{cr:?}"
            );
        }
        let mapped = map_configret_to_win32_err(ConfigRet::FAILURE, Win32Error::GEN_FAILURE);
        assert_ne!(mapped, Win32Error::SUCCESS);
    }
}
