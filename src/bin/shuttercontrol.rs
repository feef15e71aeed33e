//! `shuttercontrol` — drives the shutter/beep MCU from `{topic}/Beep`
//! commands on the bus (spec §4.3, §6.2).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use gatekeeper::infra::{logging, ShutterControlArgs};
use gatekeeper::io::{BusAdapter, I2cBus};
use gatekeeper::services::BeepDriver;

fn main() -> anyhow::Result<()> {
    logging::init("shuttercontrol");
    let args = ShutterControlArgs::parse();

    info!(
        mqtthost = %args.mqtthost,
        mqttport = args.mqttport,
        topic = %args.topic,
        i2c = %format!("{:#04x}", args.i2c),
        "config_loaded"
    );

    let bus = BusAdapter::connect("shuttercontrol", &args.mqtthost, args.mqttport)?;
    let i2c = Arc::new(I2cBus::open()?);
    let driver = Arc::new(BeepDriver::new(i2c, args.i2c));

    // Payload parsing matches Python's `int()` (accepts a leading `-`) and
    // `% 16` (always non-negative for a positive divisor); an unparseable
    // payload is silently dropped (spec §4.3), no log.
    let beep_driver = driver.clone();
    bus.subscribe(&args.topic, "Beep", move |payload| {
        if let Ok(value) = payload.trim().parse::<i64>() {
            let pattern = value.rem_euclid(16) as u8;
            beep_driver.beep(pattern);
        }
    })?;

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

    info!("shuttercontrol_started");
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(500));
    }

    info!("shuttercontrol_shutdown_complete");
    Ok(())
}
