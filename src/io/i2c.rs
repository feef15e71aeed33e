//! I²C frame codec — the inverted-byte word protocol shared by the door and
//! shutter MCUs (spec §4.1, §6.1).
//!
//! Reads and writes both reuse the same wire primitive: write a register (or
//! command) byte, then read the reply with a repeated start. That is exactly
//! what SMBus word/byte-data reads do under the hood, and it is why the
//! write side of this protocol is implemented as a read, not a `write_byte`
//! — see spec §9 "Ack semantics of 0x01".

use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use rppal::i2c::I2c;
use tracing::warn;

use crate::domain::types::Frame;

/// Register address the door/shutter MCUs expose their state word at.
const STATE_REGISTER: u8 = 0x30;

/// Reply byte meaning "command accepted".
const ACK_BYTE: u8 = 0x01;

/// Bounded retry floor: 10 attempts, 500 ms apart, ~5s worst case (spec §4.1, §5).
const RETRY_ATTEMPTS: u32 = 10;
const RETRY_PAUSE: Duration = Duration::from_millis(500);

/// A single I²C bus (`/dev/i2c-1` by default) shared by every transaction a
/// process issues. Guarded by a mutex so a polling loop and a command
/// handler never interleave transactions on the wire (spec §4.2, §5).
pub struct I2cBus {
    handle: Mutex<I2c>,
}

impl I2cBus {
    /// Open I²C bus 1, matching the Raspberry Pi's `smbus.SMBus(1)` in the
    /// original implementation.
    pub fn open() -> anyhow::Result<Self> {
        let i2c = I2c::new()?;
        Ok(Self { handle: Mutex::new(i2c) })
    }

    /// Read the state word for `device_addr`, retrying on I/O failure or an
    /// invalid frame. Returns `None` once all attempts are exhausted; never
    /// raises the failure to the caller (spec §4.1, §7).
    pub fn read_state(&self, device_addr: u16) -> Option<u8> {
        for attempt in 0..RETRY_ATTEMPTS {
            match self.try_read_frame(device_addr) {
                Ok(Some(frame)) => return Some(frame.payload),
                Ok(None) => {}
                Err(e) => {
                    warn!(device_addr = %format!("{device_addr:#04x}"), attempt, error = %e, "i2c_read_failed");
                }
            }
            thread::sleep(RETRY_PAUSE);
        }
        None
    }

    fn try_read_frame(&self, device_addr: u16) -> rppal::i2c::Result<Option<Frame>> {
        let mut i2c = self.handle.lock();
        i2c.set_slave_address(device_addr)?;
        let mut reply = [0u8; 2];
        i2c.write_read(&[STATE_REGISTER], &mut reply)?;
        Ok(Frame::decode(reply[0], reply[1]))
    }

    /// Issue a command byte and retry until the device acks with `0x01`
    /// (spec §4.1, §4.2, §4.3). Returns `true` iff any attempt acked.
    pub fn send_command(&self, device_addr: u16, cmd_byte: u8) -> bool {
        for attempt in 0..RETRY_ATTEMPTS {
            match self.try_send_command(device_addr, cmd_byte) {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => {
                    warn!(device_addr = %format!("{device_addr:#04x}"), cmd = %format!("{cmd_byte:#04x}"), attempt, error = %e, "i2c_command_failed");
                }
            }
            thread::sleep(RETRY_PAUSE);
        }
        false
    }

    fn try_send_command(&self, device_addr: u16, cmd_byte: u8) -> rppal::i2c::Result<bool> {
        let mut i2c = self.handle.lock();
        i2c.set_slave_address(device_addr)?;
        let mut reply = [0u8; 1];
        i2c.write_read(&[cmd_byte], &mut reply)?;
        Ok(reply[0] == ACK_BYTE)
    }
}
