//! Outcome types and packed multi-strings for Windows system APIs
//!
//! This crate provides the building blocks for calling Win32, COM, and configuration manager
//! functions from Rust, and thin RAII wrappers around some of those functions.
//!
//! The core is portable and always available:
//!
//! - [`outcome`]: [`Outcome`], a value or a typed failure code, and the [`outcome_try!`] macro.
//! - [`code`]: the Win32, `HRESULT`, and `CONFIGRET` code domains and the conversions between
//!   them.
//! - [`multi_sz`]: an owned, always well-formed `REG_MULTI_SZ` buffer, a borrowed view over one,
//!   and bidirectional cursors.
//!
//! # Features
//!
//! The wrappers are only built on Windows, and each is behind a feature:
//!
//! - `full` - Enable all features
//! - `event` - Kernel event objects and waiting on handles
//! - `file` - Synchronous file handles
//! - `service` - Service control manager queries
//! - `cfgmgr` - Device interface lists from the configuration manager
//! - `setup-di` - SetupAPI device information sets
//!
//! # Examples
//!
//! ## Outcomes
//!
//! ```
//! use winwrap::code::{Win32Error, Win32Result};
//! use winwrap::Outcome;
//!
//! fn parse(s: &str) -> Win32Result<u32> {
//!     match s.parse() {
//!         Ok(value) => Outcome::success(value),
//!         Err(_) => Outcome::from_failure(Win32Error::INVALID_DATA),
//!     }
//! }
//!
//! assert_eq!(*parse("42").get(), 42);
//! assert_eq!(parse("x").code(), Win32Error::INVALID_DATA);
//! assert!(parse("x").throw_if_failed().is_err());
//! ```
//!
//! ## Multi-strings
//!
//! ```
//! use winwrap::MultiSz;
//!
//! let mut ids = MultiSz::from_strs(["ROOT\\0001"]);
//! ids.insert(ids.begin().position(), "ROOT\\0000".encode_utf16().collect::<Vec<_>>());
//! assert_eq!(ids.to_strings_lossy(), ["ROOT\\0000", "ROOT\\0001"]);
//! ```
//!
//! ## Device interfaces
//!
//! List the volume interfaces present on the system:
//!
//! ```no_run
//! # #[cfg(all(windows, feature = "cfgmgr"))]
//! # {
//! use winwrap::cfgmgr::{get_device_interface_list, InterfaceListScope, GUID};
//!
//! const GUID_DEVINTERFACE_VOLUME: GUID = GUID::from_u128(0x53f5630d_b6bf_11d0_94f2_00a0c91efb8b);
//!
//! let list = get_device_interface_list(&GUID_DEVINTERFACE_VOLUME, None, InterfaceListScope::Present)
//!     .throw_if_failed()?;
//! for path in list.to_strings_lossy() {
//!     println!("{path}");
//! }
//! # }
//! # Ok::<(), winwrap::code::ConfigRet>(())
//! ```
//!
//! See [cfgmgr].

pub mod code;
pub mod multi_sz;
pub mod outcome;

#[cfg(all(windows, feature = "cfgmgr"))]
pub mod cfgmgr;
#[cfg(all(windows, feature = "event"))]
pub mod event;
#[cfg(all(windows, feature = "file"))]
pub mod file;
#[cfg(all(
    windows,
    any(
        feature = "event",
        feature = "file",
        feature = "service",
        feature = "setup-di"
    )
))]
pub mod handle;
#[cfg(all(windows, feature = "service"))]
pub mod service;
#[cfg(all(windows, feature = "setup-di"))]
pub mod setup_di;

#[cfg(all(
    windows,
    any(
        feature = "event",
        feature = "file",
        feature = "service",
        feature = "cfgmgr",
        feature = "setup-di"
    )
))]
mod util;

pub use code::{ConfigRet, HResult, Win32Error};
pub use multi_sz::{MultiString, MultiStringView, MultiSz, MultiSzView};
pub use outcome::{ErrorCode, Outcome};
