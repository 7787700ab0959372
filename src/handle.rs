//! Owned native handles
//!
//! [`OwnedHandle`] closes the handle it holds when dropped. What "invalid" means and how the
//! handle is closed depend on the kind of object, described by a [`HandleKind`]:
//!
//! | Kind                  | Raw type   | Invalid value          | Closed by                       |
//! |-----------------------|------------|------------------------|---------------------------------|
//! | [`KernelObject`]      | `HANDLE`   | `NULL`                 | [`CloseHandle`]                  |
//! | [`KernelFile`]        | `HANDLE`   | `INVALID_HANDLE_VALUE` | [`CloseHandle`]                  |
//! | [`ServiceControl`]    | `SC_HANDLE`| `NULL`                 | [`CloseServiceHandle`]           |
//! | [`DeviceInfoSet`]     | `HDEVINFO` | `INVALID_HANDLE_VALUE` | [`SetupDiDestroyDeviceInfoList`] |
//!
//! [`CloseHandle`]: https://learn.microsoft.com/en-us/windows/win32/api/handleapi/nf-handleapi-closehandle
//! [`CloseServiceHandle`]: https://learn.microsoft.com/en-us/windows/win32/api/winsvc/nf-winsvc-closeservicehandle
//! [`SetupDiDestroyDeviceInfoList`]: https://learn.microsoft.com/en-us/windows/win32/api/setupapi/nf-setupapi-setupdidestroydeviceinfolist

use std::{fmt, marker::PhantomData, mem, ptr};

use windows_sys::Win32::{
    Devices::DeviceAndDriverInstallation::{HDEVINFO, SetupDiDestroyDeviceInfoList},
    Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE},
    System::Services::{CloseServiceHandle, SC_HANDLE},
};

/// A kind of native handle.
pub trait HandleKind {
    /// The raw handle type
    type Raw: Copy + PartialEq + fmt::Debug;

    /// The value that does not refer to any object
    const INVALID: Self::Raw;

    /// Close `raw`.
    ///
    /// # Safety
    ///
    /// `raw` must be a valid handle of this kind, owned by the caller, and must not be used
    /// afterwards.
    unsafe fn close(raw: Self::Raw);
}

/// Kernel objects whose creation functions return `NULL` on failure, such as events.
#[derive(Debug)]
pub enum KernelObject {}

impl HandleKind for KernelObject {
    type Raw = HANDLE;

    const INVALID: HANDLE = ptr::null_mut();

    unsafe fn close(raw: HANDLE) {
        // SAFETY: See trait docs
        unsafe {
            CloseHandle(raw);
        }
    }
}

/// File handles, which are `INVALID_HANDLE_VALUE` on failure.
#[derive(Debug)]
pub enum KernelFile {}

impl HandleKind for KernelFile {
    type Raw = HANDLE;

    const INVALID: HANDLE = INVALID_HANDLE_VALUE;

    unsafe fn close(raw: HANDLE) {
        // SAFETY: See trait docs
        unsafe {
            CloseHandle(raw);
        }
    }
}

/// Handles to the service control manager and to services.
#[derive(Debug)]
pub enum ServiceControl {}

impl HandleKind for ServiceControl {
    type Raw = SC_HANDLE;

    const INVALID: SC_HANDLE = ptr::null_mut();

    unsafe fn close(raw: SC_HANDLE) {
        // SAFETY: See trait docs
        unsafe {
            CloseServiceHandle(raw);
        }
    }
}

/// SetupAPI device information sets.
#[derive(Debug)]
pub enum DeviceInfoSet {}

impl HandleKind for DeviceInfoSet {
    type Raw = HDEVINFO;

    const INVALID: HDEVINFO = -1;

    unsafe fn close(raw: HDEVINFO) {
        // SAFETY: See trait docs
        unsafe {
            SetupDiDestroyDeviceInfoList(raw);
        }
    }
}

/// A native handle that is closed on drop.
///
/// The handle may be invalid, in which case nothing is closed.
pub struct OwnedHandle<K: HandleKind> {
    raw: K::Raw,
    _kind: PhantomData<K>,
}

// SAFETY: The wrapped kinds may be used and closed from any thread
unsafe impl<K: HandleKind> Send for OwnedHandle<K> {}

impl<K: HandleKind> OwnedHandle<K> {
    /// Create a handle that does not own anything
    pub const fn invalid() -> Self {
        OwnedHandle {
            raw: K::INVALID,
            _kind: PhantomData,
        }
    }

    /// Take ownership of `raw`.
    ///
    /// # Safety
    ///
    /// `raw` must be either invalid or a valid handle of kind `K` that is not owned elsewhere.
    pub const unsafe fn from_raw(raw: K::Raw) -> Self {
        OwnedHandle {
            raw,
            _kind: PhantomData,
        }
    }

    /// Return the raw handle without giving up ownership
    pub fn as_raw(&self) -> K::Raw {
        self.raw
    }

    /// Return whether a handle is held
    pub fn is_valid(&self) -> bool {
        self.raw != K::INVALID
    }

    /// Give up ownership of the handle, leaving this one invalid
    pub fn release(&mut self) -> K::Raw {
        mem::replace(&mut self.raw, K::INVALID)
    }

    /// Close the current handle, if any, and take ownership of `raw`.
    ///
    /// # Safety
    ///
    /// Same as [`OwnedHandle::from_raw`].
    pub unsafe fn reset(&mut self, raw: K::Raw) {
        let old = mem::replace(&mut self.raw, raw);
        if old != K::INVALID && old != raw {
            // SAFETY: We owned `old`
            unsafe { K::close(old) };
        }
    }

    /// Close the current handle, if any
    pub fn close(&mut self) {
        // SAFETY: The invalid value is always acceptable
        unsafe { self.reset(K::INVALID) };
    }

    /// Give up ownership of the handle
    pub fn into_raw(mut self) -> K::Raw {
        self.release()
    }
}

impl<K: HandleKind> Default for OwnedHandle<K> {
    fn default() -> Self {
        OwnedHandle::invalid()
    }
}

impl<K: HandleKind> fmt::Debug for OwnedHandle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OwnedHandle").field(&self.raw).finish()
    }
}

impl<K: HandleKind> Drop for OwnedHandle<K> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows_sys::Win32::{
        Foundation::WAIT_OBJECT_0,
        System::Threading::{CreateEventW, INFINITE, SetEvent, WaitForSingleObject},
    };

    fn raw_event() -> HANDLE {
        // SAFETY: Anonymous manual-reset event, no security attributes
        let raw = unsafe { CreateEventW(ptr::null(), 1, 0, ptr::null()) };
        assert!(!raw.is_null());
        raw
    }

    #[test]
    fn test_invalid() {
        let handle = OwnedHandle::<KernelObject>::invalid();
        assert!(!handle.is_valid());
        let handle = OwnedHandle::<KernelFile>::default();
        assert_eq!(handle.as_raw(), INVALID_HANDLE_VALUE);
        let handle = OwnedHandle::<DeviceInfoSet>::default();
        assert_eq!(handle.as_raw(), -1);
    }

    #[test]
    fn test_release() {
        let raw = raw_event();
        // SAFETY: `raw` is a fresh event handle
        let mut handle = unsafe { OwnedHandle::<KernelObject>::from_raw(raw) };
        assert!(handle.is_valid());
        assert_eq!(handle.release(), raw);
        assert!(!handle.is_valid());
        drop(handle);

        // SAFETY: We own `raw` again, and it is still open
        unsafe {
            assert_ne!(SetEvent(raw), 0);
            assert_eq!(WaitForSingleObject(raw, INFINITE), WAIT_OBJECT_0);
            CloseHandle(raw);
        }
    }

    #[test]
    fn test_reset_and_close() {
        let first = raw_event();
        let second = raw_event();
        // SAFETY: Both are fresh event handles
        let mut handle = unsafe { OwnedHandle::<KernelObject>::from_raw(first) };
        // SAFETY: `second` is not owned elsewhere
        unsafe { handle.reset(second) };
        assert_eq!(handle.as_raw(), second);

        handle.close();
        assert!(!handle.is_valid());
        handle.close();
    }

    #[test]
    fn test_into_raw() {
        let raw = raw_event();
        // SAFETY: `raw` is a fresh event handle
        let handle = unsafe { OwnedHandle::<KernelObject>::from_raw(raw) };
        assert_eq!(handle.into_raw(), raw);
        // SAFETY: Ownership was given up by `into_raw`
        unsafe { CloseHandle(raw) };
    }
}
