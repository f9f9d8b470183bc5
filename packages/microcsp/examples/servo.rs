// tilt-following servo, with simulated hardware.
//
// a switch toggles whether accelerometer readings are forwarded to a servo. the switch is an
// "interrupt" raised from another thread, which only sets a flag. a polling task bridges that
// flag into a channel, which is the only way hardware should reach the runtime.

use microcsp::{
    as_chan, select, Channel, ChannelKind, Config, Scheduler, SourceExt,
};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering::Relaxed},
        Arc,
    },
    thread,
    time::Duration,
};


enum Input {
    Toggle,
    Tilt(f32),
    Gone,
}

fn main() {
    let scheduler = Scheduler::with_config(
        Config::default().with_tick_interval(Duration::from_millis(10))
    );

    // interrupt handler stand-in: raise the flag every 300ms
    let pressed = Arc::new(AtomicBool::new(false));
    let irq = pressed.clone();
    thread::spawn(move || loop {
        thread::sleep(Duration::from_millis(300));
        irq.store(true, Relaxed);
    });

    // bridge the flag into a channel
    let switch = Channel::bounded(&scheduler, 1);
    let bridge = scheduler.clone();
    let presses = switch.clone();
    scheduler.spawn(async move {
        loop {
            if pressed.swap(false, Relaxed) && !presses.put(()).await {
                break;
            }
            bridge.yield_now().await;
        }
    });

    // accelerometer stand-in: a slow sine sweep, where only the latest reading matters
    let sampler = scheduler.clone();
    let tilt = as_chan(&scheduler, ChannelKind::DropOldest(1), move |out| async move {
        let mut t = 0f32;
        loop {
            if !out.put((t * 0.2).sin() * 90.0).await {
                break;
            }
            t += 1.0;
            sampler.delay(Duration::from_millis(50)).await;
        }
    });

    let inputs = select(&scheduler, [
        switch.map(|press| match press {
            Some(()) => Input::Toggle,
            None => Input::Gone,
        }).boxed(),
        tilt.map(|reading| match reading {
            Some(angle) => Input::Tilt(angle),
            None => Input::Gone,
        }).boxed(),
    ]);

    scheduler.spawn(async move {
        let mut following = false;
        while let Some((_, input)) = inputs.get().await {
            match input {
                Input::Toggle => {
                    following = !following;
                    println!("switch pressed, following = {}", following);
                }
                Input::Tilt(angle) if following => println!("servo -> {:6.1} deg", angle),
                Input::Tilt(_) => (),
                Input::Gone => break,
            }
        }
    });

    scheduler.run_until(|| scheduler.ticks() >= 200);
    scheduler.shutdown();
}
