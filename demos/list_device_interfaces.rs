//! Example showing how to list device interfaces and the devices of a setup class.

use std::io;

#[cfg(all(windows, feature = "cfgmgr", feature = "setup-di"))]
fn main() -> Result<(), io::Error> {
    use winwrap::{
        cfgmgr::{GUID, InterfaceListScope, get_device_interface_list},
        code::Win32Error,
        setup_di::{ClassDevsFlags, DevInfoList},
    };

    const GUID_DEVINTERFACE_VOLUME: GUID =
        GUID::from_u128(0x53f5630d_b6bf_11d0_94f2_00a0c91efb8b);

    println!("Volume interfaces:\n");

    // CONFIGRET codes are mapped to Win32 errors for `?`
    let list =
        get_device_interface_list(&GUID_DEVINTERFACE_VOLUME, None, InterfaceListScope::Present)
            .into_domain::<Win32Error>()
            .throw_if_failed()?;
    for path in list.to_strings_lossy() {
        println!("  {path}");
    }
    println!("({} interfaces)", list.len());

    println!("\n\nPresent devices:\n");

    let devices = DevInfoList::get_class_devs(
        None,
        None,
        ClassDevsFlags::PRESENT | ClassDevsFlags::ALL_CLASSES,
        None,
    )
    .throw_if_failed()?;
    for device in devices.iter().take(10) {
        let device = device.throw_if_failed()?;
        let id = devices.instance_id(&device).throw_if_failed()?;
        println!("  {}", id.to_string_lossy());
    }
    println!("... (showing first 10 devices)");

    Ok(())
}

#[cfg(not(all(windows, feature = "cfgmgr", feature = "setup-di")))]
fn main() -> Result<(), io::Error> {
    println!("This example requires Windows and the `cfgmgr` and `setup-di` features");
    Ok(())
}
