//! Synchronous file handles
//!
//! # Examples
//!
//! ```no_run
//! use winwrap::file::{CreationDisposition, File, FileAccess, FileFlags, ShareMode};
//!
//! let file = File::create(
//!     r"C:\Temp\log.txt",
//!     FileAccess::WRITE,
//!     ShareMode::READ,
//!     CreationDisposition::OpenAlways,
//!     FileFlags::NORMAL,
//! )
//! .throw_if_failed()?;
//! let written = file.write(b"hello").throw_if_failed()?;
//! assert_eq!(written, 5);
//! # Ok::<(), winwrap::code::Win32Error>(())
//! ```

use bitflags::bitflags;
use std::{
    os::windows::io::{AsRawHandle, RawHandle},
    path::Path,
    ptr,
};
use windows_sys::Win32::{
    Foundation::{GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE},
    Storage::FileSystem::{
        CREATE_ALWAYS, CREATE_NEW, CreateFileW, FILE_ATTRIBUTE_NORMAL, FILE_ATTRIBUTE_TEMPORARY,
        FILE_FLAG_DELETE_ON_CLOSE, FILE_FLAG_WRITE_THROUGH, FILE_SHARE_DELETE, FILE_SHARE_READ,
        FILE_SHARE_WRITE, OPEN_ALWAYS, OPEN_EXISTING, ReadFile, TRUNCATE_EXISTING, WriteFile,
    },
    System::IO::CancelIoEx,
};

use crate::{
    code::{Win32Error, Win32Result, Win32Status},
    define_int_enum,
    handle::{KernelFile, OwnedHandle},
    outcome::Outcome,
    util,
};

bitflags! {
    /// Access rights requested by [`File::create`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct FileAccess: u32 {
        /// Read data
        const READ = GENERIC_READ;
        /// Write data
        const WRITE = GENERIC_WRITE;
    }
}

bitflags! {
    /// Access that other handles to the same file may have while this one is open.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct ShareMode: u32 {
        const READ = FILE_SHARE_READ;
        const WRITE = FILE_SHARE_WRITE;
        const DELETE = FILE_SHARE_DELETE;
    }
}

bitflags! {
    /// File attributes and flags for [`File::create`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct FileFlags: u32 {
        /// No other attributes
        const NORMAL = FILE_ATTRIBUTE_NORMAL;
        /// The file is short-lived; avoid writing it back to disk
        const TEMPORARY = FILE_ATTRIBUTE_TEMPORARY;
        /// Delete the file once all of its handles are closed
        const DELETE_ON_CLOSE = FILE_FLAG_DELETE_ON_CLOSE;
        /// Write through any intermediate cache
        const WRITE_THROUGH = FILE_FLAG_WRITE_THROUGH;
    }
}

define_int_enum!(
    "What to do depending on whether the file exists. See [`File::create`].",
    u32,
    CreationDisposition {
        CreateNew = CREATE_NEW, "Create a new file, failing if it exists";
        CreateAlways = CREATE_ALWAYS, "Create a new file, truncating any existing one";
        OpenExisting = OPEN_EXISTING, "Open the file, failing if it does not exist";
        OpenAlways = OPEN_ALWAYS, "Open the file, creating it if it does not exist";
        TruncateExisting = TRUNCATE_EXISTING, "Open and truncate the file, failing if it does not exist";
    }
);

/// A file handle opened for synchronous I/O.
///
/// This uses the [`CreateFileW`] Windows API function.
///
/// [`CreateFileW`]: https://learn.microsoft.com/en-us/windows/win32/api/fileapi/nf-fileapi-createfilew
#[derive(Debug)]
pub struct File {
    handle: OwnedHandle<KernelFile>,
}

// SAFETY: Synchronous file operations are thread-safe
unsafe impl Sync for File {}

impl File {
    /// Create or open a file.
    ///
    /// Opening an existing file with [`CreationDisposition::CreateAlways`] or
    /// [`CreationDisposition::OpenAlways`] succeeds.
    pub fn create(
        path: impl AsRef<Path>,
        access: FileAccess,
        share: ShareMode,
        disposition: CreationDisposition,
        flags: FileFlags,
    ) -> Win32Result<File> {
        let path = util::wide_null(path.as_ref());
        // SAFETY: `path` is null-terminated, and no template file is given
        let raw = unsafe {
            CreateFileW(
                path.as_ptr(),
                access.bits(),
                share.bits(),
                ptr::null(),
                disposition.into(),
                flags.bits(),
                ptr::null_mut(),
            )
        };
        if raw == INVALID_HANDLE_VALUE {
            return Outcome::from_failure(Win32Error::last_failure());
        }
        Outcome::success(File {
            // SAFETY: `raw` is a new file handle that we own
            handle: unsafe { OwnedHandle::from_raw(raw) },
        })
    }

    /// Read into `buf`, returning the number of bytes read. Zero means end of file.
    ///
    /// At most `u32::MAX` bytes are read at once.
    ///
    /// This corresponds to [`ReadFile`].
    ///
    /// [`ReadFile`]: https://learn.microsoft.com/en-us/windows/win32/api/fileapi/nf-fileapi-readfile
    pub fn read(&self, buf: &mut [u8]) -> Win32Result<usize> {
        let mut read = 0u32;
        // SAFETY: `buf` is writable for the length passed
        let result = unsafe {
            ReadFile(
                self.as_raw(),
                buf.as_mut_ptr(),
                util::dword_len(buf.len()),
                &mut read,
                ptr::null_mut(),
            )
        };
        if result == 0 {
            return Outcome::from_failure(Win32Error::last_failure());
        }
        Outcome::success(read as usize)
    }

    /// Write from `buf`, returning the number of bytes written.
    ///
    /// At most `u32::MAX` bytes are written at once.
    ///
    /// This corresponds to [`WriteFile`].
    ///
    /// [`WriteFile`]: https://learn.microsoft.com/en-us/windows/win32/api/fileapi/nf-fileapi-writefile
    pub fn write(&self, buf: &[u8]) -> Win32Result<usize> {
        let mut written = 0u32;
        // SAFETY: `buf` is readable for the length passed
        let result = unsafe {
            WriteFile(
                self.as_raw(),
                buf.as_ptr(),
                util::dword_len(buf.len()),
                &mut written,
                ptr::null_mut(),
            )
        };
        if result == 0 {
            return Outcome::from_failure(Win32Error::last_failure());
        }
        Outcome::success(written as usize)
    }

    /// Write all of `buf`
    pub fn write_all(&self, mut buf: &[u8]) -> Win32Status {
        while !buf.is_empty() {
            let written = crate::outcome_try!(self.write(buf));
            if written == 0 {
                return Outcome::from_failure(Win32Error::GEN_FAILURE);
            }
            buf = &buf[written..];
        }
        Outcome::success(())
    }

    /// Cancel all pending I/O on this handle, from any thread of this process.
    ///
    /// Fails with [`Win32Error::NOT_FOUND`] if nothing was pending. Cancelled operations fail
    /// with [`Win32Error::OPERATION_ABORTED`].
    ///
    /// This corresponds to [`CancelIoEx`].
    ///
    /// [`CancelIoEx`]: https://learn.microsoft.com/en-us/windows/win32/fileio/cancelioex-func
    pub fn cancel_io(&self) -> Win32Status {
        // SAFETY: A null OVERLAPPED pointer cancels every request for the handle
        let result = unsafe { CancelIoEx(self.as_raw(), ptr::null()) };
        if result == 0 {
            return Outcome::from_failure(Win32Error::last_failure());
        }
        Outcome::success(())
    }

    /// Return the raw handle
    pub fn as_raw(&self) -> HANDLE {
        self.handle.as_raw()
    }
}

impl AsRawHandle for File {
    fn as_raw_handle(&self) -> RawHandle {
        self.as_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::PathBuf};

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("winwrap-{tag}-{}.tmp", std::process::id()))
    }

    #[test]
    fn test_disposition() {
        assert_eq!(u32::from(CreationDisposition::OpenExisting), OPEN_EXISTING);
        assert_eq!(
            CreationDisposition::try_from(CREATE_NEW),
            Ok(CreationDisposition::CreateNew)
        );
        assert_eq!(CreationDisposition::try_from(0), Err(0));
    }

    #[test]
    fn test_write_then_read() {
        let path = temp_path("rw");
        {
            let file = File::create(
                &path,
                FileAccess::WRITE,
                ShareMode::empty(),
                CreationDisposition::CreateAlways,
                FileFlags::NORMAL,
            )
            .into_value();
            file.write_all(b"hello world").throw_if_failed().unwrap();
        }

        let file = File::create(
            &path,
            FileAccess::READ,
            ShareMode::READ,
            CreationDisposition::OpenExisting,
            FileFlags::NORMAL,
        )
        .into_value();
        let mut buf = [0u8; 32];
        let read = file.read(&mut buf).into_value();
        assert_eq!(&buf[..read], b"hello world");
        assert_eq!(file.read(&mut buf).into_value(), 0);

        drop(file);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_create_new_existing() {
        let path = temp_path("exists");
        let first = File::create(
            &path,
            FileAccess::WRITE,
            ShareMode::all(),
            CreationDisposition::CreateNew,
            FileFlags::DELETE_ON_CLOSE,
        );
        assert!(first.is_success());

        let second = File::create(
            &path,
            FileAccess::WRITE,
            ShareMode::all(),
            CreationDisposition::CreateNew,
            FileFlags::NORMAL,
        );
        assert_eq!(second.code(), Win32Error::FILE_EXISTS);
    }

    #[test]
    fn test_open_missing() {
        let result = File::create(
            temp_path("missing"),
            FileAccess::READ,
            ShareMode::READ,
            CreationDisposition::OpenExisting,
            FileFlags::NORMAL,
        );
        assert!(result.is_failure());
        assert_eq!(result.code(), Win32Error::FILE_NOT_FOUND);
        let err: std::io::Error = result.code().into();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_cancel_without_pending_io() {
        let path = temp_path("cancel");
        let file = File::create(
            &path,
            FileAccess::WRITE,
            ShareMode::empty(),
            CreationDisposition::CreateAlways,
            FileFlags::DELETE_ON_CLOSE,
        )
        .into_value();
        assert_eq!(file.cancel_io().code(), Win32Error::NOT_FOUND);
    }
}
