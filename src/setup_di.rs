//! SetupAPI device information sets
//!
//! # Examples
//!
//! List the instance IDs of all present devices:
//!
//! ```no_run
//! use winwrap::setup_di::{ClassDevsFlags, DevInfoList};
//!
//! let devices = DevInfoList::get_class_devs(
//!     None,
//!     None,
//!     ClassDevsFlags::ALL_CLASSES | ClassDevsFlags::PRESENT,
//!     None,
//! )
//! .throw_if_failed()?;
//! for device in devices.iter() {
//!     let device = device.throw_if_failed()?;
//!     println!("{:?}", devices.instance_id(&device).throw_if_failed()?);
//! }
//! # Ok::<(), winwrap::code::Win32Error>(())
//! ```
//!
//! References:
//! * [Device information sets]
//!
//! [Device information sets]: https://learn.microsoft.com/en-us/windows-hardware/drivers/install/device-information-sets

use bitflags::bitflags;
use std::{
    ffi::{OsStr, OsString},
    fmt,
    iter::FusedIterator,
    mem,
    os::windows::ffi::OsStringExt,
    ptr,
};
use windows_sys::Win32::Devices::DeviceAndDriverInstallation::{
    DICD_GENERATE_ID, DICD_INHERIT_CLASSDRVS, DIGCF_ALLCLASSES, DIGCF_DEFAULT,
    DIGCF_DEVICEINTERFACE, DIGCF_PRESENT, DIGCF_PROFILE, HDEVINFO, SP_DEVINFO_DATA,
    SetupDiCreateDeviceInfoListExW, SetupDiCreateDeviceInfoW, SetupDiEnumDeviceInfo,
    SetupDiGetClassDevsExW, SetupDiGetDeviceInstanceIdW,
};

pub use windows_sys::core::GUID;

use crate::{
    code::{Win32Error, Win32Result},
    handle::{DeviceInfoSet, HandleKind, OwnedHandle},
    outcome::Outcome,
    util,
};

/// Length of a device instance ID, including the terminator (`MAX_DEVICE_ID_LEN + 1`)
const DEVICE_ID_CAPACITY: usize = 201;

bitflags! {
    /// Flags for [`DevInfoList::get_class_devs`].
    ///
    /// These correspond to the `DIGCF_*` constants from the Windows API.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct ClassDevsFlags: u32 {
        /// Only devices associated with the system default interface of the class
        const DEFAULT = DIGCF_DEFAULT;
        /// Only devices that are currently present
        const PRESENT = DIGCF_PRESENT;
        /// Devices of every setup class or interface class
        const ALL_CLASSES = DIGCF_ALLCLASSES;
        /// Only devices in the current hardware profile
        const PROFILE = DIGCF_PROFILE;
        /// Treat the class GUID as an interface class
        const DEVICE_INTERFACE = DIGCF_DEVICEINTERFACE;
    }
}

bitflags! {
    /// Flags for [`DevInfoList::create_device_info`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct DeviceCreationFlags: u32 {
        /// Treat the name as a base name and generate a unique `ROOT\<name>\<n>` instance ID
        const GENERATE_ID = DICD_GENERATE_ID;
        /// Inherit the class driver list of the set
        const INHERIT_CLASS_DRIVERS = DICD_INHERIT_CLASSDRVS;
    }
}

fn new_devinfo_data() -> SP_DEVINFO_DATA {
    // SAFETY: SP_DEVINFO_DATA is plain data
    let mut data: SP_DEVINFO_DATA = unsafe { mem::zeroed() };
    data.cbSize = mem::size_of::<SP_DEVINFO_DATA>() as u32;
    data
}

fn check_devinfo(raw: HDEVINFO) -> Win32Result<DevInfoList> {
    if raw == DeviceInfoSet::INVALID {
        return Outcome::from_failure(Win32Error::last_failure());
    }
    Outcome::success(DevInfoList {
        // SAFETY: `raw` is a new device information set that we own
        handle: unsafe { OwnedHandle::from_raw(raw) },
    })
}

/// A device information set.
///
/// The set is destroyed when dropped.
#[derive(Debug)]
pub struct DevInfoList {
    handle: OwnedHandle<DeviceInfoSet>,
}

impl DevInfoList {
    /// Create an empty set, optionally restricted to the setup class `class`, for the devices
    /// of `machine` or of the local machine.
    ///
    /// This corresponds to [`SetupDiCreateDeviceInfoListExW`].
    ///
    /// [`SetupDiCreateDeviceInfoListExW`]: https://learn.microsoft.com/en-us/windows/win32/api/setupapi/nf-setupapi-setupdicreatedeviceinfolistexw
    pub fn create(class: Option<&GUID>, machine: Option<&OsStr>) -> Win32Result<DevInfoList> {
        let machine = util::wide_null_opt(machine);
        // SAFETY: The class is null or valid, and `machine` is null or null-terminated
        let raw = unsafe {
            SetupDiCreateDeviceInfoListExW(
                class.map_or(ptr::null(), |class| class as *const GUID),
                ptr::null_mut(),
                util::opt_pcwstr(machine.as_deref()),
                ptr::null(),
            )
        };
        check_devinfo(raw)
    }

    /// Create a set holding the devices that match `class`, `enumerator`, and `flags`.
    ///
    /// Without [`ClassDevsFlags::ALL_CLASSES`], `class` must be given.
    ///
    /// This corresponds to [`SetupDiGetClassDevsExW`].
    ///
    /// [`SetupDiGetClassDevsExW`]: https://learn.microsoft.com/en-us/windows/win32/api/setupapi/nf-setupapi-setupdigetclassdevsexw
    pub fn get_class_devs(
        class: Option<&GUID>,
        enumerator: Option<&OsStr>,
        flags: ClassDevsFlags,
        machine: Option<&OsStr>,
    ) -> Win32Result<DevInfoList> {
        let enumerator = util::wide_null_opt(enumerator);
        let machine = util::wide_null_opt(machine);
        // SAFETY: All pointers are null or valid, and strings are null-terminated
        let raw = unsafe {
            SetupDiGetClassDevsExW(
                class.map_or(ptr::null(), |class| class as *const GUID),
                util::opt_pcwstr(enumerator.as_deref()),
                ptr::null_mut(),
                flags.bits(),
                0,
                util::opt_pcwstr(machine.as_deref()),
                ptr::null(),
            )
        };
        check_devinfo(raw)
    }

    /// Add a new device information element to the set.
    ///
    /// The element exists only in this set until it is registered with the system.
    ///
    /// This corresponds to [`SetupDiCreateDeviceInfoW`].
    ///
    /// [`SetupDiCreateDeviceInfoW`]: https://learn.microsoft.com/en-us/windows/win32/api/setupapi/nf-setupapi-setupdicreatedeviceinfow
    pub fn create_device_info(
        &self,
        name: impl AsRef<OsStr>,
        class: &GUID,
        description: Option<&OsStr>,
        flags: DeviceCreationFlags,
    ) -> Win32Result<DeviceInfo> {
        let name = util::wide_null(name);
        let description = util::wide_null_opt(description);
        let mut data = new_devinfo_data();
        // SAFETY: Strings are null or null-terminated, and `data` has its size set
        let result = unsafe {
            SetupDiCreateDeviceInfoW(
                self.as_raw(),
                name.as_ptr(),
                class,
                util::opt_pcwstr(description.as_deref()),
                ptr::null_mut(),
                flags.bits(),
                &mut data,
            )
        };
        if result == 0 {
            return Outcome::from_failure(Win32Error::last_failure());
        }
        Outcome::success(DeviceInfo { data })
    }

    /// Return the element at `index`.
    ///
    /// Fails with [`Win32Error::NO_MORE_ITEMS`] past the last element.
    ///
    /// This corresponds to [`SetupDiEnumDeviceInfo`].
    ///
    /// [`SetupDiEnumDeviceInfo`]: https://learn.microsoft.com/en-us/windows/win32/api/setupapi/nf-setupapi-setupdienumdeviceinfo
    pub fn enum_device_info(&self, index: u32) -> Win32Result<DeviceInfo> {
        let mut data = new_devinfo_data();
        // SAFETY: `data` has its size set
        if unsafe { SetupDiEnumDeviceInfo(self.as_raw(), index, &mut data) } == 0 {
            return Outcome::from_failure(Win32Error::last_failure());
        }
        Outcome::success(DeviceInfo { data })
    }

    /// Return an iterator over the elements of the set
    pub fn iter(&self) -> DevInfoIter<'_> {
        DevInfoIter {
            list: self,
            index: 0,
            done: false,
        }
    }

    /// Return the device instance ID of `device`, such as `ROOT\SYSTEM\0000`.
    ///
    /// This corresponds to [`SetupDiGetDeviceInstanceIdW`].
    ///
    /// [`SetupDiGetDeviceInstanceIdW`]: https://learn.microsoft.com/en-us/windows/win32/api/setupapi/nf-setupapi-setupdigetdeviceinstanceidw
    pub fn instance_id(&self, device: &DeviceInfo) -> Win32Result<OsString> {
        let mut buf = vec![0u16; DEVICE_ID_CAPACITY];
        loop {
            let mut required = 0u32;
            // SAFETY: `buf` is writable for the length passed
            let result = unsafe {
                SetupDiGetDeviceInstanceIdW(
                    self.as_raw(),
                    &device.data,
                    buf.as_mut_ptr(),
                    util::dword_len(buf.len()),
                    &mut required,
                )
            };
            if result != 0 {
                let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
                return Outcome::success(OsString::from_wide(&buf[..len]));
            }
            let error = Win32Error::last_failure();
            if error != Win32Error::INSUFFICIENT_BUFFER || required as usize <= buf.len() {
                return Outcome::from_failure(error);
            }
            buf.resize(required as usize, 0);
        }
    }

    /// Return the raw handle
    pub fn as_raw(&self) -> HDEVINFO {
        self.handle.as_raw()
    }
}

impl<'a> IntoIterator for &'a DevInfoList {
    type Item = Win32Result<DeviceInfo>;
    type IntoIter = DevInfoIter<'a>;

    fn into_iter(self) -> DevInfoIter<'a> {
        self.iter()
    }
}

/// Iterator over the elements of a [`DevInfoList`].
///
/// Ends at the last element. Any other failure is yielded once, then the iterator ends.
pub struct DevInfoIter<'a> {
    list: &'a DevInfoList,
    index: u32,
    done: bool,
}

impl Iterator for DevInfoIter<'_> {
    type Item = Win32Result<DeviceInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let info = self.list.enum_device_info(self.index);
        if info.is_failure() {
            self.done = true;
            if info.code() == Win32Error::NO_MORE_ITEMS {
                return None;
            }
        }
        self.index += 1;
        Some(info)
    }
}

impl FusedIterator for DevInfoIter<'_> {}

/// An element of a device information set. See [`SP_DEVINFO_DATA`].
///
/// [`SP_DEVINFO_DATA`]: https://learn.microsoft.com/en-us/windows/win32/api/setupapi/ns-setupapi-sp_devinfo_data
#[derive(Clone, Copy)]
pub struct DeviceInfo {
    data: SP_DEVINFO_DATA,
}

impl DeviceInfo {
    /// Get the setup class of the device
    pub fn class_guid(&self) -> GUID {
        self.data.ClassGuid
    }

    /// Get the device instance handle (`DEVINST`), usable with the `CM_*` functions
    pub fn dev_inst(&self) -> u32 {
        self.data.DevInst
    }

    /// Get the raw `SP_DEVINFO_DATA` structure
    pub fn raw(&self) -> &SP_DEVINFO_DATA {
        &self.data
    }
}

impl fmt::Debug for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = self.class_guid();
        f.debug_struct("DeviceInfo")
            .field(
                "class_guid",
                &format_args!(
                    "{:08x}-{:04x}-{:04x}-{:02x?}",
                    class.data1, class.data2, class.data3, class.data4
                ),
            )
            .field("dev_inst", &self.dev_inst())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUID_DEVCLASS_SYSTEM: GUID = GUID::from_u128(0x4d36e97d_e325_11ce_bfc1_08002be10318);

    #[test]
    fn test_empty_list() {
        let list = DevInfoList::create(None, None).throw_if_failed().unwrap();
        assert_eq!(list.iter().count(), 0);
        assert_eq!(list.enum_device_info(0).code(), Win32Error::NO_MORE_ITEMS);
    }

    #[test]
    fn test_present_devices() {
        let list = DevInfoList::get_class_devs(
            None,
            None,
            ClassDevsFlags::ALL_CLASSES | ClassDevsFlags::PRESENT,
            None,
        )
        .throw_if_failed()
        .unwrap();

        let mut count = 0;
        for device in &list {
            let device = device.throw_if_failed().unwrap();
            let id = list.instance_id(&device).throw_if_failed().unwrap();
            assert!(!id.is_empty());
            count += 1;
        }
        assert!(count > 0);
    }

    #[test]
    fn test_system_class() {
        let list = DevInfoList::get_class_devs(
            Some(&GUID_DEVCLASS_SYSTEM),
            None,
            ClassDevsFlags::PRESENT,
            None,
        )
        .throw_if_failed()
        .unwrap();
        for device in &list {
            let class = device.into_value().class_guid();
            assert_eq!(class.data1, GUID_DEVCLASS_SYSTEM.data1);
            assert_eq!(class.data4, GUID_DEVCLASS_SYSTEM.data4);
        }
    }

    #[test]
    #[ignore = "creates a phantom device node, which requires elevation"]
    fn test_create_device_info() {
        let list = DevInfoList::create(Some(&GUID_DEVCLASS_SYSTEM), None)
            .throw_if_failed()
            .unwrap();
        let device = list
            .create_device_info(
                "WINWRAP_TEST",
                &GUID_DEVCLASS_SYSTEM,
                Some(OsStr::new("winwrap test device")),
                DeviceCreationFlags::GENERATE_ID,
            )
            .throw_if_failed()
            .unwrap();

        let id = list.instance_id(&device).into_value();
        assert!(
            id.to_string_lossy()
                .to_uppercase()
                .starts_with(r"ROOT\WINWRAP_TEST\"),
            "{id:?}"
        );
        assert_eq!(list.iter().count(), 1);
    }
}
