//! `door-bridge` — polls the door controller over I²C and bridges its
//! state to the bus; accepts lock/unlock commands from the bus.
//!
//! This binary's own ~1 Hz poll loop (spec §4.2) doubles as its main loop:
//! there is no watchdog automaton to schedule here, so each iteration is
//! simply "poll, report edges, sleep".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use gatekeeper::infra::{logging, DoorBridgeArgs};
use gatekeeper::io::{BusAdapter, I2cBus};
use gatekeeper::services::door_driver::PollOutcome;
use gatekeeper::services::{DoorBridge, DoorDriver, Listener};

fn main() -> anyhow::Result<()> {
    logging::init("door-bridge");
    let args = DoorBridgeArgs::parse();

    info!(
        mqtthost = %args.mqtthost,
        mqttport = args.mqttport,
        topic = %args.topic,
        i2c = %format!("{:#04x}", args.i2c),
        "config_loaded"
    );

    let bus = BusAdapter::connect("door-bridge", &args.mqtthost, args.mqttport)?;
    let i2c = Arc::new(I2cBus::open()?);
    let driver = Arc::new(DoorDriver::new(i2c, args.i2c));
    let bridge = Arc::new(DoorBridge::new(bus, args.topic.clone()));

    bridge.wire_commands(driver.clone())?;

    let running = Arc::new(AtomicBool::new(true));
    let force_exit = Arc::new(AtomicBool::new(false));
    {
        let running = running.clone();
        let force_exit = force_exit.clone();
        ctrlc::set_handler(move || {
            if running.swap(false, Ordering::SeqCst) {
                info!("shutdown_signal_received");
            } else {
                // Second SIGINT: the supervisor wants out now (spec §4.8).
                force_exit.store(true, Ordering::SeqCst);
                std::process::exit(130);
            }
        })?;
    }

    info!("door_bridge_started");
    while running.load(Ordering::SeqCst) {
        let sleep_for = match driver.poll() {
            PollOutcome::ReadFailed => Duration::from_millis(500),
            PollOutcome::NoChange => Duration::from_secs(1),
            PollOutcome::Changed(state, edges) => {
                bridge.on_edges(state, &edges);
                Duration::from_secs(1)
            }
        };
        std::thread::sleep(sleep_for);
    }

    info!("door_bridge_shutdown_complete");
    Ok(())
}
