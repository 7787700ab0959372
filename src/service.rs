//! Query services through the service control manager
//!
//! # Examples
//!
//! ```no_run
//! use winwrap::service::{ScManagerAccess, ServiceAccess, ServiceManager};
//!
//! let manager = ServiceManager::open(None, ScManagerAccess::CONNECT).throw_if_failed()?;
//! let service = manager
//!     .open_service("RpcSs", ServiceAccess::QUERY_STATUS)
//!     .throw_if_failed()?;
//! println!("{:?}", service.query_status().throw_if_failed()?.state());
//! # Ok::<(), winwrap::code::Win32Error>(())
//! ```
//!
//! References:
//! * [Service control manager]
//!
//! [Service control manager]: https://learn.microsoft.com/en-us/windows/win32/services/service-control-manager

use bitflags::bitflags;
use std::{ffi::OsStr, fmt, mem, ptr};
use windows_sys::Win32::System::Services::{
    OpenSCManagerW, OpenServiceW, QueryServiceStatus, SC_HANDLE, SC_MANAGER_ALL_ACCESS,
    SC_MANAGER_CONNECT, SC_MANAGER_ENUMERATE_SERVICE, SC_MANAGER_LOCK, SERVICE_ALL_ACCESS,
    SERVICE_CONTINUE_PENDING, SERVICE_INTERROGATE, SERVICE_PAUSE_CONTINUE, SERVICE_PAUSE_PENDING,
    SERVICE_PAUSED, SERVICE_QUERY_CONFIG, SERVICE_QUERY_STATUS, SERVICE_RUNNING, SERVICE_START,
    SERVICE_START_PENDING, SERVICE_STATUS, SERVICE_STOP, SERVICE_STOP_PENDING, SERVICE_STOPPED,
};

use crate::{
    code::{Win32Error, Win32Result},
    define_int_enum,
    handle::{OwnedHandle, ServiceControl},
    outcome::Outcome,
    util,
};

bitflags! {
    /// Access rights requested by [`ServiceManager::open`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct ScManagerAccess: u32 {
        const CONNECT = SC_MANAGER_CONNECT;
        const ENUMERATE_SERVICE = SC_MANAGER_ENUMERATE_SERVICE;
        const LOCK = SC_MANAGER_LOCK;
        const ALL_ACCESS = SC_MANAGER_ALL_ACCESS;
    }
}

bitflags! {
    /// Access rights requested by [`Service::open`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct ServiceAccess: u32 {
        const QUERY_CONFIG = SERVICE_QUERY_CONFIG;
        const QUERY_STATUS = SERVICE_QUERY_STATUS;
        const START = SERVICE_START;
        const STOP = SERVICE_STOP;
        const PAUSE_CONTINUE = SERVICE_PAUSE_CONTINUE;
        const INTERROGATE = SERVICE_INTERROGATE;
        const ALL_ACCESS = SERVICE_ALL_ACCESS;
    }
}

define_int_enum!(
    "The current state of a service",
    u32,
    ServiceState {
        Stopped = SERVICE_STOPPED, "Not running";
        StartPending = SERVICE_START_PENDING, "Starting";
        StopPending = SERVICE_STOP_PENDING, "Stopping";
        Running = SERVICE_RUNNING, "Running";
        ContinuePending = SERVICE_CONTINUE_PENDING, "Continuing after a pause";
        PausePending = SERVICE_PAUSE_PENDING, "Pausing";
        Paused = SERVICE_PAUSED, "Paused";
    }
);

fn check_sc_handle(raw: SC_HANDLE) -> Win32Result<OwnedHandle<ServiceControl>> {
    if raw.is_null() {
        return Outcome::from_failure(Win32Error::last_failure());
    }
    // SAFETY: `raw` is a new handle that we own
    Outcome::success(unsafe { OwnedHandle::from_raw(raw) })
}

/// A connection to the service control manager.
///
/// This uses the [`OpenSCManagerW`] Windows API function.
///
/// [`OpenSCManagerW`]: https://learn.microsoft.com/en-us/windows/win32/api/winsvc/nf-winsvc-openscmanagerw
#[derive(Debug)]
pub struct ServiceManager {
    handle: OwnedHandle<ServiceControl>,
}

impl ServiceManager {
    /// Connect to the service control manager on `machine`, or on the local machine if `None`.
    pub fn open(
        machine: Option<&OsStr>,
        access: ScManagerAccess,
    ) -> Win32Result<ServiceManager> {
        let machine = util::wide_null_opt(machine);
        // SAFETY: `machine` is null or null-terminated, and the default database is used
        let raw = unsafe {
            OpenSCManagerW(
                util::opt_pcwstr(machine.as_deref()),
                ptr::null(),
                access.bits(),
            )
        };
        check_sc_handle(raw).map(|handle| ServiceManager { handle })
    }

    /// Open the service called `name`. See [`Service::open`].
    pub fn open_service(
        &self,
        name: impl AsRef<OsStr>,
        access: ServiceAccess,
    ) -> Win32Result<Service> {
        Service::open(self, name, access)
    }

    /// Return the raw handle
    pub fn as_raw(&self) -> SC_HANDLE {
        self.handle.as_raw()
    }
}

/// An open service.
#[derive(Debug)]
pub struct Service {
    handle: OwnedHandle<ServiceControl>,
}

impl Service {
    /// Open the service called `name`.
    ///
    /// Fails with [`Win32Error::SERVICE_DOES_NOT_EXIST`] if there is no such service.
    ///
    /// This corresponds to [`OpenServiceW`].
    ///
    /// [`OpenServiceW`]: https://learn.microsoft.com/en-us/windows/win32/api/winsvc/nf-winsvc-openservicew
    pub fn open(
        manager: &ServiceManager,
        name: impl AsRef<OsStr>,
        access: ServiceAccess,
    ) -> Win32Result<Service> {
        let name = util::wide_null(name);
        // SAFETY: The manager handle is open and `name` is null-terminated
        let raw = unsafe { OpenServiceW(manager.as_raw(), name.as_ptr(), access.bits()) };
        check_sc_handle(raw).map(|handle| Service { handle })
    }

    /// Query the current status of the service. Requires [`ServiceAccess::QUERY_STATUS`].
    ///
    /// This corresponds to [`QueryServiceStatus`].
    ///
    /// [`QueryServiceStatus`]: https://learn.microsoft.com/en-us/windows/win32/api/winsvc/nf-winsvc-queryservicestatus
    pub fn query_status(&self) -> Win32Result<ServiceStatus> {
        // SAFETY: SERVICE_STATUS is plain data
        let mut status: SERVICE_STATUS = unsafe { mem::zeroed() };
        // SAFETY: The handle is open and `status` is writable
        if unsafe { QueryServiceStatus(self.as_raw(), &mut status) } == 0 {
            return Outcome::from_failure(Win32Error::last_failure());
        }
        Outcome::success(ServiceStatus { status })
    }

    /// Return the raw handle
    pub fn as_raw(&self) -> SC_HANDLE {
        self.handle.as_raw()
    }
}

/// A snapshot of the status of a service. See [`SERVICE_STATUS`].
///
/// [`SERVICE_STATUS`]: https://learn.microsoft.com/en-us/windows/win32/api/winsvc/ns-winsvc-service_status
#[derive(Clone, Copy)]
pub struct ServiceStatus {
    status: SERVICE_STATUS,
}

impl ServiceStatus {
    /// Get the current state, or the raw value if it is not recognized
    pub fn state(&self) -> Result<ServiceState, u32> {
        ServiceState::try_from(self.status.dwCurrentState)
    }

    /// Get the raw `SERVICE_*` service type bits
    pub fn service_type(&self) -> u32 {
        self.status.dwServiceType
    }

    /// Get the `SERVICE_ACCEPT_*` control codes the service handles
    pub fn controls_accepted(&self) -> u32 {
        self.status.dwControlsAccepted
    }

    /// Get the error the service reported when it stopped
    pub fn win32_exit_code(&self) -> Win32Error {
        Win32Error(self.status.dwWin32ExitCode)
    }

    /// Get the service-specific exit code, meaningful when [`ServiceStatus::win32_exit_code`]
    /// is `ERROR_SERVICE_SPECIFIC_ERROR`
    pub fn service_specific_exit_code(&self) -> u32 {
        self.status.dwServiceSpecificExitCode
    }

    /// Get the progress counter of a pending operation
    pub fn checkpoint(&self) -> u32 {
        self.status.dwCheckPoint
    }

    /// Get the estimated time, in milliseconds, until the next checkpoint
    pub fn wait_hint(&self) -> u32 {
        self.status.dwWaitHint
    }

    /// Get the raw `SERVICE_STATUS` structure
    pub fn raw(&self) -> &SERVICE_STATUS {
        &self.status
    }
}

impl fmt::Debug for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceStatus")
            .field("state", &self.state())
            .field("service_type", &self.service_type())
            .field("win32_exit_code", &self.win32_exit_code())
            .field("checkpoint", &self.checkpoint())
            .field("wait_hint", &self.wait_hint())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ServiceManager {
        ServiceManager::open(None, ScManagerAccess::CONNECT)
            .throw_if_failed()
            .unwrap()
    }

    #[test]
    fn test_state_conversion() {
        assert_eq!(ServiceState::try_from(4), Ok(ServiceState::Running));
        assert_eq!(u32::from(ServiceState::Paused), 7);
        assert_eq!(ServiceState::try_from(99), Err(99));
    }

    #[test]
    fn test_query_rpc() {
        // The RPC service runs on every Windows system
        let service = manager()
            .open_service("RpcSs", ServiceAccess::QUERY_STATUS)
            .throw_if_failed()
            .unwrap();
        let status = service.query_status().throw_if_failed().unwrap();
        assert_eq!(status.state(), Ok(ServiceState::Running));
        assert_eq!(status.win32_exit_code(), Win32Error::SUCCESS);
    }

    #[test]
    fn test_missing_service() {
        let result =
            manager().open_service("winwrap-no-such-service", ServiceAccess::QUERY_STATUS);
        assert!(result.is_failure());
        assert_eq!(result.code(), Win32Error::SERVICE_DOES_NOT_EXIST);
    }
}
