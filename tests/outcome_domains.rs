//! Outcomes crossing error domains through the public API.

use winwrap::code::{ConfigRetResult, HResultResult, Win32Result};
use winwrap::{ConfigRet, HResult, MultiSz, Outcome, Win32Error, outcome_try};

fn lookup(found: bool) -> ConfigRetResult<MultiSz> {
    if found {
        Outcome::success(MultiSz::from_strs(["ROOT\\0000", "ROOT\\0001"]))
    } else {
        Outcome::from_failure(ConfigRet::NO_SUCH_DEVICE_INTERFACE)
    }
}

fn count(found: bool) -> Win32Result<usize> {
    let list = outcome_try!(lookup(found));
    Outcome::success(list.len())
}

fn count_hr(found: bool) -> HResultResult<usize> {
    let n = outcome_try!(count(found));
    Outcome::success(n)
}

#[test]
fn test_success_crosses_domains() {
    let n = count_hr(true);
    assert!(n.is_success());
    assert_eq!(n.code(), HResult::S_OK);
    assert_eq!(n.into_value(), 2);
}

#[test]
fn test_failure_crosses_domains() {
    let n = count(false);
    assert_eq!(n.code(), Win32Error::NOT_FOUND);

    let hr = count_hr(false);
    assert!(hr.is_failure());
    assert_eq!(hr.code(), HResult::from(Win32Error::NOT_FOUND));
    assert_eq!(hr.code().facility(), 7);
    assert_eq!(hr.code().code(), 1168);
}

#[test]
fn test_into_domain_keeps_value() {
    let list = lookup(true).into_domain::<Win32Error>();
    assert!(list.is_success());
    assert_eq!(list.get().to_strings_lossy(), ["ROOT\\0000", "ROOT\\0001"]);
}

#[test]
fn test_result_interop() {
    let result: Result<MultiSz, ConfigRet> = lookup(false).into();
    assert_eq!(result.unwrap_err(), ConfigRet::NO_SUCH_DEVICE_INTERFACE);

    let err: std::io::Error = count(false).throw_if_failed().unwrap_err().into();
    assert_eq!(err.raw_os_error(), Some(1168));
}

#[test]
fn test_unmapped_configret() {
    // No Win32 counterpart
    let cr = ConfigRet(0x3C);
    assert_eq!(Win32Error::from(cr), Win32Error::INVALID_FUNCTION);
    assert_eq!(cr.to_win32_or(Win32Error::GEN_FAILURE), Win32Error::GEN_FAILURE);
    assert!(HResult::from(cr).0 < 0);
}

#[test]
#[should_panic(expected = "failed outcome")]
fn test_value_of_failure_panics() {
    let _ = lookup(false).into_value();
}
