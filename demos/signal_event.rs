//! Example showing how to signal an event from another thread and wait for several events.

use std::io;

#[cfg(all(windows, feature = "event"))]
fn main() -> Result<(), io::Error> {
    use std::{os::windows::io::AsHandle, sync::Arc, thread, time::Duration};
    use winwrap::event::{Event, Timeout, WaitResult, wait_for_any_object};

    let ready = Arc::new(Event::create(true, false, None).throw_if_failed()?);
    let done = Arc::new(Event::create(false, false, None).throw_if_failed()?);

    // Nothing is signaled yet
    let result = ready.wait(Timeout::ZERO).throw_if_failed()?;
    println!("Before signaling: {result:?}");

    let worker = {
        let ready = Arc::clone(&ready);
        let done = Arc::clone(&done);
        thread::spawn(move || -> Result<(), io::Error> {
            thread::sleep(Duration::from_millis(100));
            ready.set().throw_if_failed()?;
            thread::sleep(Duration::from_millis(100));
            done.set().throw_if_failed()?;
            Ok(())
        })
    };

    let handles = [ready.as_handle(), done.as_handle()];
    match wait_for_any_object(&handles, Duration::from_secs(5).into()).throw_if_failed()? {
        WaitResult::Signaled(index) => println!("Event {index} was signaled first"),
        other => println!("Wait ended with {other:?}"),
    }

    // The manual-reset event stays signaled, the auto-reset one is consumed by this wait
    let result = done.wait(Timeout::INFINITE).throw_if_failed()?;
    println!("Done event: {result:?}");
    let result = ready.wait(Timeout::ZERO).throw_if_failed()?;
    println!("Ready event is still: {result:?}");

    worker
        .join()
        .map_err(|_| io::Error::other("worker panicked"))??;
    Ok(())
}

#[cfg(not(all(windows, feature = "event")))]
fn main() -> Result<(), io::Error> {
    println!("This example requires Windows and the `event` feature");
    Ok(())
}
