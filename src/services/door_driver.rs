//! Door Controller Driver — polls the door MCU at ~1 Hz, decodes frames,
//! and surfaces debounced edges to a [`Listener`] (spec §4.2, §9
//! "driver owns a typed Listener interface").

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::domain::types::{DoorStateWord, StateKey};
use crate::io::I2cBus;

/// Outcome of a single poll (spec §4.2 steps 1-4).
pub enum PollOutcome {
    /// The read failed or was rejected by the frame codec; the caller
    /// should use the short retry pacing (spec step 1: "sleep 500 ms").
    ReadFailed,
    /// A frame was read but produced no edges against the last sample.
    NoChange,
    /// A frame was read and at least one key changed since the last
    /// sample — or this is the first accepted sample, in which case every
    /// key counts as changed (matches `door-service.py`'s `old_state =
    /// dict()`, which makes every key "new" on the first poll so the
    /// initial door/lock state is always announced).
    Changed(DoorStateWord, BTreeSet<StateKey>),
}

/// Command byte that requests the lock bolt retract.
const CMD_UNLOCK: u8 = 0x90;
/// Command byte that requests the lock bolt engage.
const CMD_LOCK: u8 = 0xA0;

/// Receives edge notifications from [`DoorDriver::poll`]. Implemented
/// by the bridge service; kept as a trait so tests can assert on edges
/// without wiring a bus.
pub trait Listener: Send + Sync {
    fn on_edges(&self, state: DoorStateWord, edges: &BTreeSet<StateKey>);
}

/// Owns the door MCU's I²C address and the last accepted sample. Command
/// calls and polling share the bus's own mutex, so this struct holds no
/// lock of its own beyond the last-sample cache.
pub struct DoorDriver {
    bus: Arc<I2cBus>,
    device_addr: u16,
    last: Mutex<Option<DoorStateWord>>,
}

impl DoorDriver {
    pub fn new(bus: Arc<I2cBus>, device_addr: u16) -> Self {
        Self { bus, device_addr, last: Mutex::new(None) }
    }

    /// Read one frame and report what changed against the last accepted
    /// sample (spec §4.2 steps 1-4). The caller picks the pacing: 500 ms
    /// after `ReadFailed` (step 1), 1 s otherwise (step 5).
    pub fn poll(&self) -> PollOutcome {
        let Some(byte) = self.bus.read_state(self.device_addr) else {
            return PollOutcome::ReadFailed;
        };
        let state = DoorStateWord::decode(byte);

        let mut last = self.last.lock();
        let edges = state.edges_against(*last);
        *last = Some(state);

        if edges.is_empty() { PollOutcome::NoChange } else { PollOutcome::Changed(state, edges) }
    }

    /// Request the lock bolt retract. Failure is logged, not retried
    /// beyond the codec's own retry budget (spec §4.2 "Failure semantics").
    pub fn unlock(&self) -> bool {
        let ok = self.bus.send_command(self.device_addr, CMD_UNLOCK);
        if !ok {
            warn!(device_addr = %format!("{:#04x}", self.device_addr), "door_unlock_command_failed");
        }
        ok
    }

    /// Request the lock bolt engage.
    pub fn lock(&self) -> bool {
        let ok = self.bus.send_command(self.device_addr, CMD_LOCK);
        if !ok {
            warn!(device_addr = %format!("{:#04x}", self.device_addr), "door_lock_command_failed");
        }
        ok
    }
}
