//! A success-or-failure value tagged with an error code
//!
//! [`Outcome`] is the return contract of every wrapper in this crate. It holds either a value
//! together with the (non-failure) code the call reported, or a failure code. Which codes count
//! as failures is decided by the code's [`ErrorCode`] implementation, so the same type serves
//! Win32 errors, `HRESULT`s and `CONFIGRET`s alike.
//!
//! # Examples
//!
//! ```
//! use winwrap::code::{HResult, Win32Error};
//! use winwrap::outcome::Outcome;
//!
//! let found: Outcome<u32, Win32Error> = Outcome::success(5);
//! assert!(found.is_success());
//! assert_eq!(*found.get(), 5);
//!
//! let missing: Outcome<u32, Win32Error> = Outcome::from_failure(Win32Error::FILE_NOT_FOUND);
//! let missing = missing.into_domain::<HResult>();
//! assert!(missing.is_failure());
//! assert_eq!(missing.code(), HResult(0x8007_0002_u32 as i32));
//! ```

use std::fmt;

/// An error code domain.
///
/// A domain names the code type a native call reports, the code that means "succeeded", and the
/// predicate deciding which codes are failures.
pub trait ErrorCode: Copy + Eq + fmt::Debug {
    /// The code reported by a call that succeeded without further detail.
    const SUCCESS: Self;

    /// Return whether this code denotes a failure.
    fn is_failure(self) -> bool;
}

/// Either a success value with its code, or a failure code.
///
/// The value exists only in the success state. `Outcome` is move-only: assigning over an
/// `Outcome` drops whatever value it held and adopts the source's state.
#[must_use = "this `Outcome` may hold a failure code, which should be handled"]
#[derive(PartialEq, Eq)]
pub struct Outcome<V, E> {
    state: State<V, E>,
}

#[derive(PartialEq, Eq)]
enum State<V, E> {
    Success(V, E),
    Failure(E),
}

impl<V, E: ErrorCode> Outcome<V, E> {
    /// Create a success holding `value`, reported with the domain's success code.
    pub fn success(value: V) -> Self {
        Self::success_with(value, E::SUCCESS)
    }

    /// Create a success holding `value`, reported with `code`.
    ///
    /// `code` must not be a failure code. This is checked in debug builds only.
    pub fn success_with(value: V, code: E) -> Self {
        debug_assert!(
            !code.is_failure(),
            "success constructed with failure code {code:?}"
        );
        Outcome {
            state: State::Success(value, code),
        }
    }

    /// Create a failure from `code`.
    ///
    /// `code` must be a failure code. This is checked in debug builds only.
    pub fn from_failure(code: E) -> Self {
        debug_assert!(
            code.is_failure(),
            "failure constructed with non-failure code {code:?}"
        );
        Outcome {
            state: State::Failure(code),
        }
    }

    /// Return whether this holds a value
    pub fn is_success(&self) -> bool {
        matches!(self.state, State::Success(..))
    }

    /// Return whether this holds only a failure code
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Return the stored code. For a success, this is the code it was created with.
    pub fn code(&self) -> E {
        match self.state {
            State::Success(_, code) | State::Failure(code) => code,
        }
    }

    /// Return a reference to the value.
    ///
    /// # Panics
    ///
    /// Panics if this is a failure. Check [`Outcome::is_success`] first, or use
    /// [`Outcome::throw_if_failed`] to propagate the failure instead.
    #[track_caller]
    pub fn get(&self) -> &V {
        match &self.state {
            State::Success(value, _) => value,
            State::Failure(code) => value_of_failure(*code),
        }
    }

    /// Return a mutable reference to the value.
    ///
    /// # Panics
    ///
    /// Panics if this is a failure.
    #[track_caller]
    pub fn get_mut(&mut self) -> &mut V {
        match &mut self.state {
            State::Success(value, _) => value,
            State::Failure(code) => value_of_failure(*code),
        }
    }

    /// Consume this and return the value.
    ///
    /// # Panics
    ///
    /// Panics if this is a failure.
    #[track_caller]
    pub fn into_value(self) -> V {
        match self.state {
            State::Success(value, _) => value,
            State::Failure(code) => value_of_failure(code),
        }
    }

    /// Convert a failure into `Err(code)` so it can be propagated with `?`.
    ///
    /// This is the only bridge from the checked `Outcome` contract to `Result`-style propagation.
    pub fn throw_if_failed(self) -> Result<V, E> {
        match self.state {
            State::Success(value, _) => Ok(value),
            State::Failure(code) => Err(code),
        }
    }

    /// Return the value if this is a success, discarding the failure code otherwise
    pub fn ok(self) -> Option<V> {
        self.throw_if_failed().ok()
    }

    /// Borrow the value, keeping the code.
    pub fn as_ref(&self) -> Outcome<&V, E> {
        Outcome {
            state: match &self.state {
                State::Success(value, code) => State::Success(value, *code),
                State::Failure(code) => State::Failure(*code),
            },
        }
    }

    /// Map the value of a success, keeping its code.
    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Outcome<U, E> {
        Outcome {
            state: match self.state {
                State::Success(value, code) => State::Success(f(value), code),
                State::Failure(code) => State::Failure(code),
            },
        }
    }

    /// Chain a fallible step onto a success. A failure is passed through unchanged.
    pub fn and_then<U>(self, f: impl FnOnce(V) -> Outcome<U, E>) -> Outcome<U, E> {
        match self.state {
            State::Success(value, _) => f(value),
            State::Failure(code) => Outcome::from_failure(code),
        }
    }

    /// Convert the code into another error domain.
    ///
    /// The converted code is judged by the target domain. Conversions provided by this crate
    /// map failures to failures and successes to successes, so the state is preserved.
    pub fn into_domain<F>(self) -> Outcome<V, F>
    where
        F: ErrorCode + From<E>,
    {
        match self.state {
            State::Success(value, code) => Outcome::success_with(value, F::from(code)),
            State::Failure(code) => Outcome::from_failure(F::from(code)),
        }
    }
}

impl<V, E: ErrorCode> From<E> for Outcome<V, E> {
    /// Create a failure from `code`. See [`Outcome::from_failure`].
    fn from(code: E) -> Self {
        Outcome::from_failure(code)
    }
}

impl<V, E: ErrorCode> From<Outcome<V, E>> for Result<V, E> {
    fn from(outcome: Outcome<V, E>) -> Self {
        outcome.throw_if_failed()
    }
}

impl<V: fmt::Debug, E: fmt::Debug> fmt::Debug for Outcome<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            State::Success(value, code) => f
                .debug_tuple("Success")
                .field(value)
                .field(code)
                .finish(),
            State::Failure(code) => f.debug_tuple("Failure").field(code).finish(),
        }
    }
}

#[cold]
#[track_caller]
fn value_of_failure<E: fmt::Debug>(code: E) -> ! {
    panic!("attempted to read the value of a failed outcome: {code:?}")
}

/// Unwrap a successful [`Outcome`], or return its failure from the enclosing function.
///
/// The enclosing function must itself return an `Outcome`. The failure code is converted with
/// `From` into that function's error domain.
///
/// ```
/// use winwrap::code::{HResult, HResultResult, Win32Error, Win32Result};
/// use winwrap::outcome::Outcome;
/// use winwrap::outcome_try;
///
/// fn size() -> Win32Result<u32> {
///     Outcome::from_failure(Win32Error::ACCESS_DENIED)
/// }
///
/// fn doubled() -> HResultResult<u32> {
///     let size = outcome_try!(size());
///     Outcome::success(size * 2)
/// }
///
/// assert_eq!(doubled().code(), HResult::from(Win32Error::ACCESS_DENIED));
/// ```
#[macro_export]
macro_rules! outcome_try {
    ($outcome:expr) => {
        match $crate::outcome::Outcome::throw_if_failed($outcome) {
            ::core::result::Result::Ok(value) => value,
            ::core::result::Result::Err(code) => {
                return $crate::outcome::Outcome::from_failure(::core::convert::From::from(code));
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{ConfigRet, HResult, Win32Error};
    use std::{cell::Cell, rc::Rc};

    /// Counts how many times it has been dropped.
    struct DropCounter(Rc<Cell<u32>>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_success() {
        let outcome: Outcome<i32, Win32Error> = Outcome::success(5);
        assert!(outcome.is_success());
        assert!(!outcome.is_failure());
        assert_eq!(*outcome.get(), 5);
        assert_eq!(outcome.code(), Win32Error::SUCCESS);
        assert_eq!(outcome.into_value(), 5);
    }

    #[test]
    fn test_success_with_informational_code() {
        let outcome: Outcome<&str, HResult> = Outcome::success_with("partial", HResult::S_FALSE);
        assert!(outcome.is_success());
        assert_eq!(outcome.code(), HResult::S_FALSE);
        assert_eq!(outcome.throw_if_failed(), Ok("partial"));
    }

    #[test]
    fn test_failure() {
        let outcome: Outcome<i32, Win32Error> = Outcome::from_failure(Win32Error::ACCESS_DENIED);
        assert!(outcome.is_failure());
        assert_eq!(outcome.code(), Win32Error::ACCESS_DENIED);
        assert_eq!(outcome.throw_if_failed(), Err(Win32Error::ACCESS_DENIED));
    }

    #[test]
    fn test_failure_from_code() {
        let outcome: Outcome<String, ConfigRet> = ConfigRet::BUFFER_SMALL.into();
        assert!(outcome.is_failure());
        assert_eq!(outcome.ok(), None);
    }

    #[test]
    #[should_panic(expected = "failed outcome")]
    fn test_get_on_failure_panics() {
        let outcome: Outcome<i32, Win32Error> = Outcome::from_failure(Win32Error::INVALID_HANDLE);
        let _ = outcome.get();
    }

    #[test]
    #[should_panic(expected = "failed outcome")]
    fn test_get_mut_on_failure_panics() {
        let mut outcome: Outcome<i32, HResult> = Outcome::from_failure(HResult::E_FAIL);
        *outcome.get_mut() += 1;
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "non-failure code")]
    fn test_failure_from_success_code_is_checked() {
        let _: Outcome<(), Win32Error> = Outcome::from_failure(Win32Error::SUCCESS);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "success constructed with failure code")]
    fn test_success_with_failure_code_is_checked() {
        let _ = Outcome::success_with(1, HResult::E_FAIL);
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn test_unchecked_contract_in_release() {
        // The state is fixed by the constructor, not by the code.
        let outcome: Outcome<(), Win32Error> = Outcome::from_failure(Win32Error::SUCCESS);
        assert!(outcome.is_failure());
        assert_eq!(outcome.code(), Win32Error::SUCCESS);
    }

    #[test]
    fn test_assign_success_over_success() {
        let drops = Rc::new(Cell::new(0));
        let mut target: Outcome<DropCounter, Win32Error> =
            Outcome::success(DropCounter(drops.clone()));
        let source = Outcome::success(DropCounter(drops.clone()));
        assert!(target.is_success());

        target = source;
        assert_eq!(drops.get(), 1, "the replaced value is dropped exactly once");
        assert!(target.is_success());

        drop(target);
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn test_assign_failure_over_success() {
        let drops = Rc::new(Cell::new(0));
        let mut target: Outcome<DropCounter, Win32Error> =
            Outcome::success(DropCounter(drops.clone()));
        assert!(target.is_success());
        assert_eq!(drops.get(), 0);

        target = Outcome::from_failure(Win32Error::NOT_FOUND);
        assert_eq!(drops.get(), 1, "the success value is destroyed");
        assert!(target.is_failure());
        assert_eq!(target.code(), Win32Error::NOT_FOUND);
    }

    #[test]
    fn test_assign_success_over_failure() {
        let drops = Rc::new(Cell::new(0));
        let mut target: Outcome<DropCounter, Win32Error> =
            Outcome::from_failure(Win32Error::NOT_FOUND);
        assert!(target.is_failure());

        target = Outcome::success(DropCounter(drops.clone()));
        assert_eq!(drops.get(), 0, "no stale value exists to be dropped");
        assert!(target.is_success());
        assert_eq!(target.code(), Win32Error::SUCCESS);

        drop(target);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_assign_failure_over_failure() {
        let mut target: Outcome<DropCounter, Win32Error> =
            Outcome::from_failure(Win32Error::NOT_FOUND);
        assert_eq!(target.code(), Win32Error::NOT_FOUND);
        target = Outcome::from_failure(Win32Error::ACCESS_DENIED);
        assert_eq!(target.code(), Win32Error::ACCESS_DENIED);
    }

    #[test]
    fn test_move_transfers_value() {
        let drops = Rc::new(Cell::new(0));
        let outcome: Outcome<DropCounter, HResult> = Outcome::success(DropCounter(drops.clone()));
        let moved = outcome;
        assert_eq!(drops.get(), 0);
        drop(moved);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_map_and_then() {
        let outcome: Outcome<u32, Win32Error> = Outcome::success(20);
        let doubled = outcome.map(|v| v * 2);
        assert_eq!(*doubled.get(), 40);

        let chained = doubled.and_then(|_| Outcome::<u32, _>::from_failure(Win32Error::GEN_FAILURE));
        assert_eq!(chained.code(), Win32Error::GEN_FAILURE);

        let failed: Outcome<u32, Win32Error> = Outcome::from_failure(Win32Error::ACCESS_DENIED);
        let mapped = failed.map(|v| v + 1);
        assert_eq!(mapped.code(), Win32Error::ACCESS_DENIED);
    }

    #[test]
    fn test_as_ref_keeps_value() {
        let outcome: Outcome<String, Win32Error> = Outcome::success("abc".to_owned());
        assert_eq!(outcome.as_ref().map(|s| s.len()).into_value(), 3);
        assert_eq!(outcome.get(), "abc");
    }

    #[test]
    fn test_into_domain_uses_target_predicate() {
        let failed: Outcome<(), Win32Error> = Outcome::from_failure(Win32Error::ACCESS_DENIED);
        let hr = failed.into_domain::<HResult>();
        assert!(hr.is_failure());
        assert!(hr.code().is_failure());
        assert_eq!(hr.code(), HResult(0x8007_0005_u32 as i32));

        let ok: Outcome<u8, ConfigRet> = Outcome::success(1);
        let hr = ok.into_domain::<HResult>();
        assert!(hr.is_success());
        assert_eq!(hr.code(), HResult::S_OK);
        assert_eq!(*hr.get(), 1);
    }

    #[test]
    fn test_outcome_try() {
        fn inner(fail: bool) -> Outcome<u32, ConfigRet> {
            if fail {
                Outcome::from_failure(ConfigRet::ACCESS_DENIED)
            } else {
                Outcome::success(7)
            }
        }

        fn outer(fail: bool) -> Outcome<u32, Win32Error> {
            let value = crate::outcome_try!(inner(fail));
            Outcome::success(value + 1)
        }

        assert_eq!(*outer(false).get(), 8);
        assert_eq!(outer(true).code(), Win32Error::ACCESS_DENIED);
    }

    #[test]
    fn test_debug_format() {
        let ok: Outcome<u8, Win32Error> = Outcome::success(3);
        assert!(format!("{ok:?}").starts_with("Success(3"));
        let failed: Outcome<u8, Win32Error> = Outcome::from_failure(Win32Error::ACCESS_DENIED);
        assert!(format!("{failed:?}").starts_with("Failure("));
    }
}
