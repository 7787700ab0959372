//! Example showing how to query the status of a service by name.

use std::io;

#[cfg(all(windows, feature = "service"))]
fn main() -> Result<(), io::Error> {
    use winwrap::service::{ScManagerAccess, ServiceAccess, ServiceManager};

    let name = std::env::args().nth(1).unwrap_or_else(|| "RpcSs".to_owned());

    let manager = ServiceManager::open(None, ScManagerAccess::CONNECT).throw_if_failed()?;
    let service = manager
        .open_service(&name, ServiceAccess::QUERY_STATUS)
        .throw_if_failed()?;
    let status = service.query_status().throw_if_failed()?;

    println!("Service: {name}");
    match status.state() {
        Ok(state) => println!("State: {state:?}"),
        Err(raw) => println!("State: unknown ({raw})"),
    }
    println!("Type: {:#x}", status.service_type());
    println!("Exit code: {}", status.win32_exit_code());

    Ok(())
}

#[cfg(not(all(windows, feature = "service")))]
fn main() -> Result<(), io::Error> {
    println!("This example requires Windows and the `service` feature");
    Ok(())
}
