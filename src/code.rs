//! Native error code domains
//!
//! Three kinds of codes are returned by the APIs this crate wraps:
//!
//! - [`Win32Error`]: the `DWORD` reported by `GetLastError` and by functions returning an error
//!   code directly. Zero (`ERROR_SUCCESS`) is success; everything else is a failure.
//! - [`HResult`]: a COM-style `HRESULT`. Negative values (severity bit set) are failures; `S_OK`
//!   and other non-negative values are successes.
//! - [`ConfigRet`]: the `CONFIGRET` returned by the configuration manager (`CM_*`). Only
//!   `CR_SUCCESS` is success.
//!
//! Each implements [`ErrorCode`] and can be used as the failure type of an [`Outcome`]. Codes
//! convert between domains with `From`. Every conversion maps failures to failures and
//! successes to successes.
//!
//! The constants below are the values from the Windows SDK headers. They are spelled out here
//! so that the code types are available on every platform.

use std::{fmt, io};

use thiserror::Error;

use crate::outcome::{ErrorCode, Outcome};

macro_rules! define_error_code {
    ($doc:expr, $name:ident($repr:ty), $display:literal) => {
        #[doc = $doc]
        #[repr(transparent)]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Error)]
        #[error($display)]
        pub struct $name(pub $repr);

        impl From<$repr> for $name {
            fn from(code: $repr) -> Self {
                $name(code)
            }
        }

        impl From<$name> for $repr {
            fn from(code: $name) -> $repr {
                code.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:#010x})"), self.0)
            }
        }
    };
}

define_error_code!(
    "A Win32 error code (`DWORD`)",
    Win32Error(u32),
    "win32 error {0:#010x}"
);
define_error_code!("A COM status code (`HRESULT`)", HResult(i32), "HRESULT {0:#010x}");
define_error_code!(
    "A configuration manager return code (`CONFIGRET`)",
    ConfigRet(u32),
    "CONFIGRET {0:#010x}"
);

/// An [`Outcome`] whose failures are Win32 error codes
pub type Win32Result<T> = Outcome<T, Win32Error>;
/// A valueless [`Win32Result`]
pub type Win32Status = Win32Result<()>;
/// An [`Outcome`] whose failures are `HRESULT`s
pub type HResultResult<T> = Outcome<T, HResult>;
/// A valueless [`HResultResult`]
pub type HResultStatus = HResultResult<()>;
/// An [`Outcome`] whose failures are `CONFIGRET`s
pub type ConfigRetResult<T> = Outcome<T, ConfigRet>;
/// A valueless [`ConfigRetResult`]
pub type ConfigRetStatus = ConfigRetResult<()>;

impl Win32Error {
    pub const SUCCESS: Win32Error = Win32Error(0);
    pub const INVALID_FUNCTION: Win32Error = Win32Error(1);
    pub const FILE_NOT_FOUND: Win32Error = Win32Error(2);
    pub const ACCESS_DENIED: Win32Error = Win32Error(5);
    pub const INVALID_HANDLE: Win32Error = Win32Error(6);
    pub const NOT_ENOUGH_MEMORY: Win32Error = Win32Error(8);
    pub const OUTOFMEMORY: Win32Error = Win32Error(14);
    pub const INVALID_DATA: Win32Error = Win32Error(13);
    pub const GEN_FAILURE: Win32Error = Win32Error(31);
    pub const FILE_EXISTS: Win32Error = Win32Error(80);
    pub const INVALID_PARAMETER: Win32Error = Win32Error(87);
    pub const CALL_NOT_IMPLEMENTED: Win32Error = Win32Error(120);
    pub const INSUFFICIENT_BUFFER: Win32Error = Win32Error(122);
    pub const ALREADY_EXISTS: Win32Error = Win32Error(183);
    pub const NO_MORE_ITEMS: Win32Error = Win32Error(259);
    pub const OPERATION_ABORTED: Win32Error = Win32Error(995);
    pub const IO_PENDING: Win32Error = Win32Error(997);
    pub const INVALID_FLAGS: Win32Error = Win32Error(1004);
    pub const REGISTRY_CORRUPT: Win32Error = Win32Error(1015);
    pub const SERVICE_DOES_NOT_EXIST: Win32Error = Win32Error(1060);
    pub const SERVICE_NOT_ACTIVE: Win32Error = Win32Error(1062);
    pub const NOT_FOUND: Win32Error = Win32Error(1168);
    pub const INVALID_COMPUTERNAME: Win32Error = Win32Error(1210);
    pub const INVALID_USER_BUFFER: Win32Error = Win32Error(1784);

    /// Return the calling thread's last-error code.
    ///
    /// This reads the same value as `GetLastError`.
    pub fn last() -> Win32Error {
        Win32Error(
            io::Error::last_os_error()
                .raw_os_error()
                .map_or(0, |code| code as u32),
        )
    }

    /// Return the calling thread's last-error code, for use right after a call that reported
    /// failure.
    ///
    /// Some APIs fail without setting a last-error code. Those failures are reported as
    /// [`Win32Error::GEN_FAILURE`] so that the result is still a failure code.
    pub fn last_failure() -> Win32Error {
        match Win32Error::last() {
            Win32Error::SUCCESS => Win32Error::GEN_FAILURE,
            code => code,
        }
    }
}

impl ErrorCode for Win32Error {
    const SUCCESS: Self = Win32Error::SUCCESS;

    fn is_failure(self) -> bool {
        self != Win32Error::SUCCESS
    }
}

impl From<Win32Error> for io::Error {
    fn from(code: Win32Error) -> io::Error {
        io::Error::from_raw_os_error(code.0 as i32)
    }
}

/// `FACILITY_WIN32`
const FACILITY_WIN32: u32 = 7;

impl HResult {
    pub const S_OK: HResult = HResult(0);
    pub const S_FALSE: HResult = HResult(1);
    pub const E_NOTIMPL: HResult = HResult(0x8000_4001_u32 as i32);
    pub const E_FAIL: HResult = HResult(0x8000_4005_u32 as i32);
    pub const E_UNEXPECTED: HResult = HResult(0x8000_FFFF_u32 as i32);
    pub const E_ACCESSDENIED: HResult = HResult(0x8007_0005_u32 as i32);
    pub const E_OUTOFMEMORY: HResult = HResult(0x8007_000E_u32 as i32);
    pub const E_INVALIDARG: HResult = HResult(0x8007_0057_u32 as i32);

    /// Return the facility field
    pub const fn facility(self) -> u32 {
        ((self.0 as u32) >> 16) & 0x1FFF
    }

    /// Return the code field (the low 16 bits)
    pub const fn code(self) -> u32 {
        self.0 as u32 & 0xFFFF
    }
}

impl ErrorCode for HResult {
    const SUCCESS: Self = HResult::S_OK;

    fn is_failure(self) -> bool {
        self.0 < 0
    }
}

/// Convert a Win32 error code into an `HRESULT`.
///
/// This is the `HRESULT_FROM_WIN32` macro: zero and values that already look like an `HRESULT`
/// pass through, anything else is placed in `FACILITY_WIN32` with the failure bit set.
pub const fn hresult_from_win32(error: Win32Error) -> HResult {
    if error.0 as i32 <= 0 {
        HResult(error.0 as i32)
    } else {
        HResult(((error.0 & 0xFFFF) | (FACILITY_WIN32 << 16) | 0x8000_0000) as i32)
    }
}

/// Convert an `HRESULT` into a Win32 error code.
///
/// Successes become `ERROR_SUCCESS`. Failures in `FACILITY_WIN32` yield their code field.
/// Any other failure is passed through as its raw bit pattern, which is never zero.
pub const fn win32_from_hresult(hr: HResult) -> Win32Error {
    if hr.0 >= 0 {
        Win32Error::SUCCESS
    } else if hr.facility() == FACILITY_WIN32 && hr.code() != 0 {
        Win32Error(hr.code())
    } else {
        Win32Error(hr.0 as u32)
    }
}

impl From<Win32Error> for HResult {
    fn from(error: Win32Error) -> HResult {
        hresult_from_win32(error)
    }
}

impl From<HResult> for Win32Error {
    fn from(hr: HResult) -> Win32Error {
        win32_from_hresult(hr)
    }
}

impl ConfigRet {
    pub const SUCCESS: ConfigRet = ConfigRet(0x00);
    pub const DEFAULT: ConfigRet = ConfigRet(0x01);
    pub const OUT_OF_MEMORY: ConfigRet = ConfigRet(0x02);
    pub const INVALID_POINTER: ConfigRet = ConfigRet(0x03);
    pub const INVALID_FLAG: ConfigRet = ConfigRet(0x04);
    pub const INVALID_DEVNODE: ConfigRet = ConfigRet(0x05);
    pub const NO_SUCH_DEVNODE: ConfigRet = ConfigRet(0x0D);
    pub const ALREADY_SUCH_DEVNODE: ConfigRet = ConfigRet(0x10);
    pub const FAILURE: ConfigRet = ConfigRet(0x13);
    pub const NO_SUCH_LOGICAL_DEV: ConfigRet = ConfigRet(0x14);
    pub const BUFFER_SMALL: ConfigRet = ConfigRet(0x1A);
    pub const NO_REGISTRY_HANDLE: ConfigRet = ConfigRet(0x1C);
    pub const REGISTRY_ERROR: ConfigRet = ConfigRet(0x1D);
    pub const INVALID_DEVICE_ID: ConfigRet = ConfigRet(0x1E);
    pub const INVALID_DATA: ConfigRet = ConfigRet(0x1F);
    pub const NO_MORE_HW_PROFILES: ConfigRet = ConfigRet(0x23);
    pub const NO_SUCH_VALUE: ConfigRet = ConfigRet(0x25);
    pub const NO_SUCH_REGISTRY_KEY: ConfigRet = ConfigRet(0x2E);
    pub const INVALID_MACHINENAME: ConfigRet = ConfigRet(0x2F);
    pub const REMOTE_COMM_FAILURE: ConfigRet = ConfigRet(0x30);
    pub const MACHINE_UNAVAILABLE: ConfigRet = ConfigRet(0x31);
    pub const NO_CM_SERVICES: ConfigRet = ConfigRet(0x32);
    pub const ACCESS_DENIED: ConfigRet = ConfigRet(0x33);
    pub const CALL_NOT_IMPLEMENTED: ConfigRet = ConfigRet(0x34);
    pub const INVALID_PROPERTY: ConfigRet = ConfigRet(0x35);
    pub const NO_SUCH_DEVICE_INTERFACE: ConfigRet = ConfigRet(0x37);
    pub const INVALID_REFERENCE_STRING: ConfigRet = ConfigRet(0x38);
    pub const INVALID_STRUCTURE_SIZE: ConfigRet = ConfigRet(0x3B);

    /// Map this code to the closest Win32 error code, using `default` for codes that have no
    /// counterpart.
    ///
    /// This follows `CM_MapCrToWin32Err`. `default` must be a failure code.
    pub fn to_win32_or(self, default: Win32Error) -> Win32Error {
        debug_assert!(default.is_failure(), "default {default:?} is not a failure");

        match self {
            ConfigRet::SUCCESS => Win32Error::SUCCESS,
            ConfigRet::OUT_OF_MEMORY => Win32Error::NOT_ENOUGH_MEMORY,
            ConfigRet::INVALID_POINTER | ConfigRet::INVALID_STRUCTURE_SIZE => {
                Win32Error::INVALID_USER_BUFFER
            }
            ConfigRet::INVALID_FLAG => Win32Error::INVALID_FLAGS,
            ConfigRet::INVALID_DEVNODE
            | ConfigRet::INVALID_DEVICE_ID
            | ConfigRet::INVALID_MACHINENAME
            | ConfigRet::INVALID_PROPERTY
            | ConfigRet::INVALID_REFERENCE_STRING
            | ConfigRet::INVALID_DATA => Win32Error::INVALID_DATA,
            ConfigRet::NO_SUCH_DEVNODE
            | ConfigRet::NO_SUCH_LOGICAL_DEV
            | ConfigRet::NO_SUCH_VALUE
            | ConfigRet::NO_SUCH_REGISTRY_KEY
            | ConfigRet::NO_SUCH_DEVICE_INTERFACE => Win32Error::NOT_FOUND,
            ConfigRet::ALREADY_SUCH_DEVNODE => Win32Error::ALREADY_EXISTS,
            ConfigRet::BUFFER_SMALL => Win32Error::INSUFFICIENT_BUFFER,
            ConfigRet::NO_REGISTRY_HANDLE => Win32Error::INVALID_HANDLE,
            ConfigRet::REGISTRY_ERROR => Win32Error::REGISTRY_CORRUPT,
            ConfigRet::NO_MORE_HW_PROFILES => Win32Error::NO_MORE_ITEMS,
            ConfigRet::REMOTE_COMM_FAILURE
            | ConfigRet::MACHINE_UNAVAILABLE
            | ConfigRet::NO_CM_SERVICES => Win32Error::SERVICE_NOT_ACTIVE,
            ConfigRet::ACCESS_DENIED => Win32Error::ACCESS_DENIED,
            ConfigRet::CALL_NOT_IMPLEMENTED => Win32Error::CALL_NOT_IMPLEMENTED,
            _ => default,
        }
    }
}

impl ErrorCode for ConfigRet {
    const SUCCESS: Self = ConfigRet::SUCCESS;

    fn is_failure(self) -> bool {
        self != ConfigRet::SUCCESS
    }
}

/// Convert a `CONFIGRET` into a Win32 error code.
///
/// Codes without a Win32 counterpart become `ERROR_INVALID_FUNCTION`.
pub fn win32_from_configret(cr: ConfigRet) -> Win32Error {
    cr.to_win32_or(Win32Error::INVALID_FUNCTION)
}

/// Convert a Win32 error code into a `CONFIGRET`.
///
/// This inverts [`win32_from_configret`] where the mapping is one-to-one. Any other failure
/// becomes `CR_FAILURE`.
pub fn configret_from_win32(error: Win32Error) -> ConfigRet {
    match error {
        Win32Error::SUCCESS => ConfigRet::SUCCESS,
        Win32Error::NOT_ENOUGH_MEMORY => ConfigRet::OUT_OF_MEMORY,
        Win32Error::INVALID_USER_BUFFER => ConfigRet::INVALID_POINTER,
        Win32Error::INVALID_FLAGS => ConfigRet::INVALID_FLAG,
        Win32Error::INVALID_DATA => ConfigRet::INVALID_DATA,
        Win32Error::NOT_FOUND => ConfigRet::NO_SUCH_VALUE,
        Win32Error::ALREADY_EXISTS => ConfigRet::ALREADY_SUCH_DEVNODE,
        Win32Error::INSUFFICIENT_BUFFER => ConfigRet::BUFFER_SMALL,
        Win32Error::INVALID_HANDLE => ConfigRet::NO_REGISTRY_HANDLE,
        Win32Error::REGISTRY_CORRUPT => ConfigRet::REGISTRY_ERROR,
        Win32Error::NO_MORE_ITEMS => ConfigRet::NO_MORE_HW_PROFILES,
        Win32Error::SERVICE_NOT_ACTIVE => ConfigRet::NO_CM_SERVICES,
        Win32Error::ACCESS_DENIED => ConfigRet::ACCESS_DENIED,
        Win32Error::CALL_NOT_IMPLEMENTED => ConfigRet::CALL_NOT_IMPLEMENTED,
        _ => ConfigRet::FAILURE,
    }
}

impl From<ConfigRet> for Win32Error {
    fn from(cr: ConfigRet) -> Win32Error {
        win32_from_configret(cr)
    }
}

impl From<Win32Error> for ConfigRet {
    fn from(error: Win32Error) -> ConfigRet {
        configret_from_win32(error)
    }
}

impl From<ConfigRet> for HResult {
    fn from(cr: ConfigRet) -> HResult {
        hresult_from_win32(win32_from_configret(cr))
    }
}

impl From<HResult> for ConfigRet {
    fn from(hr: HResult) -> ConfigRet {
        configret_from_win32(win32_from_hresult(hr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIN32_SAMPLES: &[u32] = &[
        0,
        1,
        2,
        5,
        87,
        122,
        1168,
        0xFFFF,
        0x1_0000,
        0x7FFF_FFFF,
        0x8000_0000,
        0x8007_0005,
        0xE000_020B,
        u32::MAX,
    ];

    const HRESULT_SAMPLES: &[u32] = &[
        0,
        1,
        0x7FFF_FFFF,
        0x8000_4005,
        0x8007_0000,
        0x8007_0002,
        0x8007_FFFF,
        0x8009_0001,
        0xFFFF_FFFF,
    ];

    #[test]
    fn test_failure_predicates() {
        assert!(!Win32Error::SUCCESS.is_failure());
        assert!(Win32Error::ACCESS_DENIED.is_failure());
        assert!(!HResult::S_OK.is_failure());
        assert!(!HResult::S_FALSE.is_failure());
        assert!(HResult::E_FAIL.is_failure());
        assert!(!ConfigRet::SUCCESS.is_failure());
        assert!(ConfigRet::DEFAULT.is_failure());
    }

    #[test]
    fn test_hresult_from_win32() {
        assert_eq!(hresult_from_win32(Win32Error::SUCCESS), HResult::S_OK);
        assert_eq!(
            hresult_from_win32(Win32Error::ACCESS_DENIED),
            HResult::E_ACCESSDENIED
        );
        assert_eq!(
            hresult_from_win32(Win32Error::INVALID_PARAMETER),
            HResult::E_INVALIDARG
        );
        // Already an HRESULT
        assert_eq!(
            hresult_from_win32(Win32Error(0x8000_4005)),
            HResult::E_FAIL
        );
    }

    #[test]
    fn test_win32_from_hresult() {
        assert_eq!(win32_from_hresult(HResult::S_OK), Win32Error::SUCCESS);
        assert_eq!(win32_from_hresult(HResult::S_FALSE), Win32Error::SUCCESS);
        assert_eq!(
            win32_from_hresult(HResult::E_OUTOFMEMORY),
            Win32Error::OUTOFMEMORY
        );
        assert_eq!(
            hresult_from_win32(Win32Error::OUTOFMEMORY),
            HResult::E_OUTOFMEMORY
        );
        assert_eq!(win32_from_hresult(HResult::E_FAIL), Win32Error(0x8000_4005));
    }

    #[test]
    fn test_win32_hresult_round_trip() {
        for code in 1..=0xFFFF_u32 {
            let error = Win32Error(code);
            assert_eq!(win32_from_hresult(hresult_from_win32(error)), error);
        }
    }

    #[test]
    fn test_conversions_preserve_failure() {
        for &raw in WIN32_SAMPLES {
            let error = Win32Error(raw);
            let failed = error.is_failure();
            assert_eq!(HResult::from(error).is_failure(), failed, "{error:?}");
            assert_eq!(ConfigRet::from(error).is_failure(), failed, "{error:?}");
        }

        for &raw in HRESULT_SAMPLES {
            let hr = HResult(raw as i32);
            let failed = hr.is_failure();
            assert_eq!(Win32Error::from(hr).is_failure(), failed, "{hr:?}");
            assert_eq!(ConfigRet::from(hr).is_failure(), failed, "{hr:?}");
        }

        for raw in 0..=0x40 {
            let cr = ConfigRet(raw);
            let failed = cr.is_failure();
            assert_eq!(Win32Error::from(cr).is_failure(), failed, "{cr:?}");
            assert_eq!(HResult::from(cr).is_failure(), failed, "{cr:?}");
        }
    }

    #[test]
    fn test_configret_mapping() {
        assert_eq!(
            win32_from_configret(ConfigRet::BUFFER_SMALL),
            Win32Error::INSUFFICIENT_BUFFER
        );
        assert_eq!(
            win32_from_configret(ConfigRet::NO_SUCH_DEVICE_INTERFACE),
            Win32Error::NOT_FOUND
        );
        assert_eq!(
            win32_from_configret(ConfigRet::FAILURE),
            Win32Error::INVALID_FUNCTION
        );
        assert_eq!(
            ConfigRet::FAILURE.to_win32_or(Win32Error::GEN_FAILURE),
            Win32Error::GEN_FAILURE
        );
        assert_eq!(
            configret_from_win32(Win32Error::ACCESS_DENIED),
            ConfigRet::ACCESS_DENIED
        );
        assert_eq!(
            configret_from_win32(Win32Error::FILE_NOT_FOUND),
            ConfigRet::FAILURE
        );
        // CR_OUT_OF_MEMORY maps to ERROR_NOT_ENOUGH_MEMORY, not ERROR_OUTOFMEMORY
        assert_eq!(
            HResult::from(ConfigRet::OUT_OF_MEMORY),
            HResult(0x8007_0008_u32 as i32)
        );
    }

    #[test]
    fn test_display_and_debug() {
        assert_eq!(Win32Error::ACCESS_DENIED.to_string(), "win32 error 0x00000005");
        assert_eq!(HResult::E_FAIL.to_string(), "HRESULT 0x80004005");
        assert_eq!(ConfigRet::BUFFER_SMALL.to_string(), "CONFIGRET 0x0000001a");
        assert_eq!(format!("{:?}", ConfigRet::BUFFER_SMALL), "ConfigRet(0x0000001a)");
        let boxed: Box<dyn std::error::Error> = Box::new(Win32Error::FILE_NOT_FOUND);
        assert_eq!(boxed.to_string(), "win32 error 0x00000002");
    }

    #[test]
    fn test_io_error_bridge() {
        let error: io::Error = Win32Error::ACCESS_DENIED.into();
        assert_eq!(error.raw_os_error(), Some(5));
    }

    #[test]
    fn test_hresult_fields() {
        assert_eq!(HResult::E_ACCESSDENIED.facility(), FACILITY_WIN32);
        assert_eq!(HResult::E_ACCESSDENIED.code(), 5);
    }
}
