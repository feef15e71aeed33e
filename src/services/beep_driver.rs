//! Shutter/Beep Driver — encodes a 4-bit beep pattern into a parity-tagged
//! command byte and issues it to the shutter MCU (spec §4.3, §6.1).

use std::sync::Arc;

use tracing::warn;

use crate::io::I2cBus;

/// Encode `pattern` (only the low 4 bits are used) as `0x10 | (p & 0x0F)`,
/// then set bit 7 iff needed so the byte's popcount is odd (spec §4.3, §6.1).
pub fn encode_beep_command(pattern: u8) -> u8 {
    let cmd = 0x10 | (pattern & 0x0F);
    if cmd.count_ones() % 2 == 0 { cmd | 0x80 } else { cmd }
}

/// Owns the shutter MCU's I²C address.
pub struct BeepDriver {
    bus: Arc<I2cBus>,
    device_addr: u16,
}

impl BeepDriver {
    pub fn new(bus: Arc<I2cBus>, device_addr: u16) -> Self {
        Self { bus, device_addr }
    }

    /// Issue `pattern` as a beep command. Returns `false` (and logs) on
    /// failure; beeps are fire-and-forget, never retried beyond the
    /// codec's own retry budget.
    pub fn beep(&self, pattern: u8) -> bool {
        let cmd = encode_beep_command(pattern);
        let ok = self.bus.send_command(self.device_addr, cmd);
        if !ok {
            warn!(
                device_addr = %format!("{:#04x}", self.device_addr),
                pattern,
                cmd = %format!("{cmd:#04x}"),
                "beep_command_failed"
            );
        }
        ok
    }
}
