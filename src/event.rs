//! Kernel event objects and waiting on handles
//!
//! # Examples
//!
//! Signal an event from another thread:
//!
//! ```no_run
//! use winwrap::event::{Event, Timeout, WaitResult};
//! use std::{sync::Arc, thread};
//!
//! let event = Arc::new(Event::create(true, false, None).throw_if_failed()?);
//!
//! let signaller = Arc::clone(&event);
//! thread::spawn(move || signaller.set());
//!
//! assert_eq!(event.wait(Timeout::INFINITE).throw_if_failed()?, WaitResult::Signaled(0));
//! # Ok::<(), winwrap::code::Win32Error>(())
//! ```
//!
//! References:
//! * [Event objects]
//! * [Wait functions]
//!
//! [Event objects]: https://learn.microsoft.com/en-us/windows/win32/sync/event-objects
//! [Wait functions]: https://learn.microsoft.com/en-us/windows/win32/sync/wait-functions

use bitflags::bitflags;
use std::{
    ffi::OsStr,
    os::windows::io::{AsHandle, AsRawHandle, BorrowedHandle, RawHandle},
    ptr,
    time::Duration,
};
use windows_sys::Win32::{
    Foundation::{
        HANDLE, WAIT_ABANDONED_0, WAIT_EVENT, WAIT_FAILED, WAIT_IO_COMPLETION, WAIT_OBJECT_0,
        WAIT_TIMEOUT,
    },
    System::Threading::{
        CreateEventW, EVENT_ALL_ACCESS, EVENT_MODIFY_STATE, INFINITE, OpenEventW, ResetEvent,
        SYNCHRONIZATION_SYNCHRONIZE, SetEvent, WaitForMultipleObjectsEx, WaitForSingleObjectEx,
    },
};

use crate::{
    code::{Win32Error, Win32Result, Win32Status},
    handle::{KernelObject, OwnedHandle},
    outcome::Outcome,
    util,
};

/// The largest number of handles a single wait can observe (`MAXIMUM_WAIT_OBJECTS`)
pub const MAXIMUM_WAIT_OBJECTS: usize = 64;

bitflags! {
    /// Access rights requested by [`Event::open`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct EventAccess: u32 {
        /// All access rights
        const ALL_ACCESS = EVENT_ALL_ACCESS;
        /// Set or reset the event
        const MODIFY_STATE = EVENT_MODIFY_STATE;
        /// Wait on the event
        const SYNCHRONIZE = SYNCHRONIZATION_SYNCHRONIZE;
    }
}

/// How long a wait may last, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timeout(u32);

impl Timeout {
    /// Wait until the object is signaled
    pub const INFINITE: Timeout = Timeout(INFINITE);
    /// Test the object and return immediately
    pub const ZERO: Timeout = Timeout(0);

    /// Create a timeout of `millis` milliseconds. `u32::MAX` is [`Timeout::INFINITE`].
    pub const fn from_millis(millis: u32) -> Timeout {
        Timeout(millis)
    }

    /// Return the timeout in milliseconds
    pub const fn as_millis(self) -> u32 {
        self.0
    }

    /// Return whether this is [`Timeout::INFINITE`]
    pub const fn is_infinite(self) -> bool {
        self.0 == INFINITE
    }
}

impl From<Duration> for Timeout {
    /// Durations too long to express are clamped to the longest finite timeout.
    fn from(duration: Duration) -> Timeout {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        Timeout(millis.min(INFINITE - 1))
    }
}

/// Why a wait returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitResult {
    /// The object at this index was signaled
    Signaled(usize),
    /// The mutex at this index was abandoned by its owning thread
    Abandoned(usize),
    /// The timeout elapsed
    TimedOut,
    /// An APC or I/O completion routine ran during an alertable wait
    IoCompletion,
}

/// Decode the return value of a wait on `count` handles. Returns `None` for `WAIT_FAILED`.
fn decode_wait(raw: WAIT_EVENT, count: usize) -> Option<WaitResult> {
    let signaled = raw.wrapping_sub(WAIT_OBJECT_0) as usize;
    let abandoned = raw.wrapping_sub(WAIT_ABANDONED_0) as usize;
    match raw {
        WAIT_FAILED => None,
        WAIT_TIMEOUT => Some(WaitResult::TimedOut),
        WAIT_IO_COMPLETION => Some(WaitResult::IoCompletion),
        _ if signaled < count => Some(WaitResult::Signaled(signaled)),
        _ if abandoned < count => Some(WaitResult::Abandoned(abandoned)),
        // Not documented; treat as a failure
        _ => None,
    }
}

fn wait_outcome(raw: WAIT_EVENT, count: usize) -> Win32Result<WaitResult> {
    match decode_wait(raw, count) {
        Some(result) => Outcome::success(result),
        None => Outcome::from_failure(Win32Error::last_failure()),
    }
}

/// An event object.
///
/// See [`CreateEventW`].
///
/// [`CreateEventW`]: https://learn.microsoft.com/en-us/windows/win32/api/synchapi/nf-synchapi-createeventw
#[derive(Debug)]
pub struct Event {
    handle: OwnedHandle<KernelObject>,
    existed: bool,
}

// SAFETY: Event operations are thread-safe
unsafe impl Sync for Event {}

impl Event {
    /// Create an event, or open it if `name` refers to an existing one.
    ///
    /// A manual-reset event stays signaled until [`Event::reset`] is called. An auto-reset event
    /// is reset when a single waiting thread is released.
    ///
    /// If an event with the same name already exists, it is opened, the arguments other than
    /// `name` are ignored, and [`Event::already_existed`] returns `true`.
    ///
    /// This corresponds to [`CreateEventW`].
    ///
    /// [`CreateEventW`]: https://learn.microsoft.com/en-us/windows/win32/api/synchapi/nf-synchapi-createeventw
    pub fn create(
        manual_reset: bool,
        initial_state: bool,
        name: Option<&OsStr>,
    ) -> Win32Result<Event> {
        let name = util::wide_null_opt(name);
        // SAFETY: `name` is null or a null-terminated string that outlives the call
        let raw = unsafe {
            CreateEventW(
                ptr::null(),
                manual_reset.into(),
                initial_state.into(),
                util::opt_pcwstr(name.as_deref()),
            )
        };
        if raw.is_null() {
            return Outcome::from_failure(Win32Error::last_failure());
        }
        let existed = Win32Error::last() == Win32Error::ALREADY_EXISTS;

        Outcome::success(Event {
            // SAFETY: `raw` is a new event handle that we own
            handle: unsafe { OwnedHandle::from_raw(raw) },
            existed,
        })
    }

    /// Open an existing named event.
    ///
    /// This corresponds to [`OpenEventW`].
    ///
    /// [`OpenEventW`]: https://learn.microsoft.com/en-us/windows/win32/api/synchapi/nf-synchapi-openeventw
    pub fn open(
        access: EventAccess,
        inherit: bool,
        name: impl AsRef<OsStr>,
    ) -> Win32Result<Event> {
        let name = util::wide_null(name);
        // SAFETY: `name` is null-terminated
        let raw = unsafe { OpenEventW(access.bits(), inherit.into(), name.as_ptr()) };
        if raw.is_null() {
            return Outcome::from_failure(Win32Error::last_failure());
        }
        Outcome::success(Event {
            // SAFETY: `raw` is a new event handle that we own
            handle: unsafe { OwnedHandle::from_raw(raw) },
            existed: true,
        })
    }

    /// Return whether the event existed before this handle was obtained
    pub fn already_existed(&self) -> bool {
        self.existed
    }

    /// Set the event to the signaled state
    pub fn set(&self) -> Win32Status {
        // SAFETY: The handle is valid
        check_bool(unsafe { SetEvent(self.as_raw()) })
    }

    /// Set the event to the nonsignaled state
    pub fn reset(&self) -> Win32Status {
        // SAFETY: The handle is valid
        check_bool(unsafe { ResetEvent(self.as_raw()) })
    }

    /// Wait until the event is signaled or `timeout` elapses.
    ///
    /// On success, the result is [`WaitResult::Signaled(0)`](WaitResult::Signaled) or
    /// [`WaitResult::TimedOut`].
    pub fn wait(&self, timeout: Timeout) -> Win32Result<WaitResult> {
        self.wait_ex(timeout, false)
    }

    /// Wait like [`Event::wait`], but also return when an APC is queued to the thread.
    ///
    /// This corresponds to [`WaitForSingleObjectEx`].
    ///
    /// [`WaitForSingleObjectEx`]: https://learn.microsoft.com/en-us/windows/win32/api/synchapi/nf-synchapi-waitforsingleobjectex
    pub fn wait_alertable(&self, timeout: Timeout) -> Win32Result<WaitResult> {
        self.wait_ex(timeout, true)
    }

    fn wait_ex(&self, timeout: Timeout, alertable: bool) -> Win32Result<WaitResult> {
        // SAFETY: The handle is valid
        let raw = unsafe { WaitForSingleObjectEx(self.as_raw(), timeout.0, alertable.into()) };
        wait_outcome(raw, 1)
    }

    /// Return the raw handle
    pub fn as_raw(&self) -> HANDLE {
        self.handle.as_raw()
    }
}

impl AsRawHandle for Event {
    fn as_raw_handle(&self) -> RawHandle {
        self.as_raw()
    }
}

impl AsHandle for Event {
    fn as_handle(&self) -> BorrowedHandle<'_> {
        // SAFETY: The handle is open for as long as `self` is borrowed
        unsafe { BorrowedHandle::borrow_raw(self.as_raw()) }
    }
}

fn check_bool(result: windows_sys::core::BOOL) -> Win32Status {
    if result == 0 {
        Outcome::from_failure(Win32Error::last_failure())
    } else {
        Outcome::success(())
    }
}

/// Wait until one or all of `handles` are signaled, or `timeout` elapses.
///
/// When waiting for any object, the index of the lowest signaled handle is returned. Between 1
/// and [`MAXIMUM_WAIT_OBJECTS`] handles may be given; otherwise the wait fails with
/// [`Win32Error::INVALID_PARAMETER`] without being attempted.
///
/// This corresponds to [`WaitForMultipleObjectsEx`].
///
/// [`WaitForMultipleObjectsEx`]: https://learn.microsoft.com/en-us/windows/win32/api/synchapi/nf-synchapi-waitformultipleobjectsex
pub fn wait_for_multiple_objects(
    handles: &[BorrowedHandle<'_>],
    wait_all: bool,
    timeout: Timeout,
    alertable: bool,
) -> Win32Result<WaitResult> {
    if handles.is_empty() || handles.len() > MAXIMUM_WAIT_OBJECTS {
        return Outcome::from_failure(Win32Error::INVALID_PARAMETER);
    }
    let raw: Vec<HANDLE> = handles.iter().map(|h| h.as_raw_handle()).collect();
    // SAFETY: `raw` holds `raw.len()` open handles
    let result = unsafe {
        WaitForMultipleObjectsEx(
            raw.len() as u32,
            raw.as_ptr(),
            wait_all.into(),
            timeout.0,
            alertable.into(),
        )
    };
    wait_outcome(result, raw.len())
}

/// Wait until all of `handles` are signaled. See [`wait_for_multiple_objects`].
pub fn wait_for_all_objects(
    handles: &[BorrowedHandle<'_>],
    timeout: Timeout,
) -> Win32Result<WaitResult> {
    wait_for_multiple_objects(handles, true, timeout, false)
}

/// Wait until any of `handles` is signaled. See [`wait_for_multiple_objects`].
pub fn wait_for_any_object(
    handles: &[BorrowedHandle<'_>],
    timeout: Timeout,
) -> Win32Result<WaitResult> {
    wait_for_multiple_objects(handles, false, timeout, false)
}
