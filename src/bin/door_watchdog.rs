//! `door-watchdog` — correlates `{space}/isOpen` intent with `{door}/Events`
//! lock reality and drives re-locking with an audible countdown
//! (spec §4.7, §4.8).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::info;

use gatekeeper::infra::{logging, WatchdogArgs};
use gatekeeper::io::BusAdapter;
use gatekeeper::services::{Scheduler, Watchdog, WatchdogActions};

/// Binds the watchdog's abstract actions to bus publishes (spec §9 "beep
/// action... leave the binding pluggable"): locking publishes `{door}/Command
/// = "door close"`, beeping publishes `{shutter}/Beep = <pattern>`.
struct BusActions {
    bus: BusAdapter,
    door_topic: String,
    shutter_topic: String,
}

impl WatchdogActions for BusActions {
    fn issue_lock_command(&self) {
        if let Err(e) = self.bus.publish(&self.door_topic, "Command", "door close", false) {
            tracing::warn!(error = %e, "watchdog_lock_publish_failed");
        }
    }

    fn beep(&self, pattern: u8) {
        let payload = pattern.to_string();
        if let Err(e) = self.bus.publish(&self.shutter_topic, "Beep", &payload, false) {
            tracing::warn!(error = %e, "watchdog_beep_publish_failed");
        }
    }
}

fn main() -> anyhow::Result<()> {
    logging::init("door-watchdog");
    let args = WatchdogArgs::parse();

    info!(
        mqtthost = %args.mqtthost,
        mqttport = args.mqttport,
        topicdoor = %args.topicdoor,
        topicstate = %args.topicstate,
        topicshutter = %args.topicshutter,
        countdown_secs = args.countdown_secs,
        relock_interval_secs = args.relock_interval_secs,
        beep_interval_secs = args.beep_interval_secs,
        beep_pattern = args.beep_pattern,
        "config_loaded"
    );

    let bus = BusAdapter::connect("door-watchdog", &args.mqtthost, args.mqttport)?;
    let actions = Arc::new(BusActions {
        bus: bus.clone(),
        door_topic: args.topicdoor.clone(),
        shutter_topic: args.topicshutter.clone(),
    });

    let watchdog = Arc::new(Watchdog::new(
        actions,
        args.countdown_secs,
        args.relock_interval_secs,
        args.beep_interval_secs,
        args.beep_pattern,
    ));

    {
        let watchdog = watchdog.clone();
        bus.subscribe(&args.topicstate, "isOpen", move |payload| {
            watchdog.set_space_open(payload);
        })?;
    }
    {
        let watchdog = watchdog.clone();
        bus.subscribe(&args.topicdoor, "Events", move |payload| {
            watchdog.handle_door_event(payload);
        })?;
    }

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            if running.swap(false, Ordering::SeqCst) {
                info!("shutdown_signal_received");
            } else {
                std::process::exit(130);
            }
        })?;
    }

    let mut scheduler = Scheduler::new();
    info!("door_watchdog_started");
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        watchdog.step(now, &mut scheduler);
        scheduler.run_pending(now);
        std::thread::sleep(Duration::from_millis(500));
    }

    info!(final_state = watchdog.state().as_str(), "door_watchdog_shutdown_complete");
    Ok(())
}
