//! Command-line configuration for the three binaries.
//!
//! There is no TOML file here: each process takes a handful of flags
//! (broker address, bus topic, I²C device address) and that is the whole
//! of its configuration surface, matching the original `argparse` defaults
//! of the Python services this system replaces.

use clap::Parser;

fn default_i2c_door() -> &'static str {
    "0x23"
}

fn default_i2c_shutter() -> &'static str {
    "0x22"
}

/// Parse a `0x`-prefixed or decimal I²C address.
pub fn parse_i2c_addr(s: &str) -> Result<u16, String> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16)
    } else {
        s.parse::<u16>()
    };
    parsed.map_err(|e| format!("invalid I2C address {s:?}: {e}"))
}

/// `door-bridge` — polls the door controller and bridges its state to the bus.
#[derive(Parser, Debug, Clone)]
#[command(name = "door-bridge", version, about)]
pub struct DoorBridgeArgs {
    /// MQTT broker hostname
    #[arg(long, default_value = "localhost")]
    pub mqtthost: String,

    /// MQTT broker port
    #[arg(long, default_value_t = 1883)]
    pub mqttport: u16,

    /// Base bus topic this door is announced under
    #[arg(long, default_value = "Netz39/Things/Door")]
    pub topic: String,

    /// I²C address of the door controller MCU
    #[arg(long, default_value = default_i2c_door(), value_parser = parse_i2c_addr)]
    pub i2c: u16,
}

/// `door-watchdog` — supervises space-open/locked facts and drives re-locking.
#[derive(Parser, Debug, Clone)]
#[command(name = "door-watchdog", version, about)]
pub struct WatchdogArgs {
    /// MQTT broker hostname
    #[arg(long, default_value = "localhost")]
    pub mqtthost: String,

    /// MQTT broker port
    #[arg(long, default_value_t = 1883)]
    pub mqttport: u16,

    /// Base bus topic the door bridge publishes state/events under
    #[arg(long, default_value = "Netz39/Things/Door")]
    pub topicdoor: String,

    /// Base bus topic that carries SpaceAPI open/closed state
    #[arg(long, default_value = "Netz39/SpaceAPI")]
    pub topicstate: String,

    /// Base bus topic the shutter/beep controller listens on
    #[arg(long, default_value = "Netz39/Things/Shuttercontrol")]
    pub topicshutter: String,

    /// Grace period after boot before the watchdog starts counting down, in seconds
    #[arg(long, default_value_t = 30)]
    pub countdown_secs: u64,

    /// Interval between re-lock attempts once locked, in seconds
    #[arg(long, default_value_t = 10)]
    pub relock_interval_secs: u64,

    /// Interval between warning beeps while counting down, in seconds
    #[arg(long, default_value_t = 5)]
    pub beep_interval_secs: u64,

    /// Beep pattern (0-15) sent while counting down
    #[arg(long, default_value_t = 1)]
    pub beep_pattern: u8,
}

/// `shuttercontrol` — drives the shutter/beep MCU from bus commands.
#[derive(Parser, Debug, Clone)]
#[command(name = "shuttercontrol", version, about)]
pub struct ShutterControlArgs {
    /// MQTT broker hostname
    #[arg(long, default_value = "localhost")]
    pub mqtthost: String,

    /// MQTT broker port
    #[arg(long, default_value_t = 1883)]
    pub mqttport: u16,

    /// Base bus topic this shutter is announced under
    #[arg(long, default_value = "Netz39/Things/Shuttercontrol")]
    pub topic: String,

    /// I²C address of the shutter/beep MCU
    #[arg(long, default_value = default_i2c_shutter(), value_parser = parse_i2c_addr)]
    pub i2c: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_address() {
        assert_eq!(parse_i2c_addr("0x23").unwrap(), 0x23);
    }

    #[test]
    fn parses_decimal_address() {
        assert_eq!(parse_i2c_addr("35").unwrap(), 35);
    }

    #[test]
    fn door_bridge_defaults_match_original_service() {
        let args = DoorBridgeArgs::parse_from(["door-bridge"]);
        assert_eq!(args.mqtthost, "localhost");
        assert_eq!(args.mqttport, 1883);
        assert_eq!(args.topic, "Netz39/Things/Door");
        assert_eq!(args.i2c, 0x23);
    }

    #[test]
    fn shuttercontrol_defaults_match_original_service() {
        let args = ShutterControlArgs::parse_from(["shuttercontrol"]);
        assert_eq!(args.topic, "Netz39/Things/Shuttercontrol");
        assert_eq!(args.i2c, 0x22);
    }

    #[test]
    fn watchdog_defaults() {
        let args = WatchdogArgs::parse_from(["door-watchdog"]);
        assert_eq!(args.topicstate, "Netz39/SpaceAPI");
        assert_eq!(args.countdown_secs, 30);
        assert_eq!(args.relock_interval_secs, 10);
        assert_eq!(args.beep_interval_secs, 5);
    }
}
