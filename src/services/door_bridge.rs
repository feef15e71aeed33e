//! Door Bridge Service — glues [`DoorDriver`] edges to bus events, and bus
//! commands to driver writes (spec §4.5).

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use crate::domain::types::{messages, DoorStateWord, StateKey};
use crate::io::BusAdapter;
use crate::services::door_driver::{DoorDriver, Listener};

/// Publishes edge events under `{base}/Events` and `{base}/Button/Events`,
/// and drives unlock/lock from `{base}/Command` (spec §4.5, §6.2).
pub struct DoorBridge {
    bus: BusAdapter,
    base_topic: String,
}

impl DoorBridge {
    pub fn new(bus: BusAdapter, base_topic: String) -> Self {
        Self { bus, base_topic }
    }

    /// Subscribe `{base}/Command` to the driver's unlock/lock calls
    /// (spec §4.5). Unknown payloads are ignored, not errors (spec §7).
    pub fn wire_commands(&self, driver: Arc<DoorDriver>) -> anyhow::Result<()> {
        let base = self.base_topic.clone();
        self.bus.subscribe(&self.base_topic, "Command", move |payload| match payload {
            messages::CMD_OPEN => {
                info!(topic = %base, "door_command_unlock");
                driver.unlock();
            }
            messages::CMD_CLOSE => {
                info!(topic = %base, "door_command_lock");
                driver.lock();
            }
            other => {
                tracing::debug!(payload = %other, "door_command_ignored");
            }
        })
    }

    fn publish_events(&self, payload: &str) -> anyhow::Result<()> {
        self.bus.publish(&self.base_topic, "Events", payload, false)
    }

    fn publish_button_event(&self, payload: &str) -> anyhow::Result<()> {
        self.bus.publish(&self.base_topic, "Button/Events", payload, false)
    }
}

impl Listener for DoorBridge {
    fn on_edges(&self, state: DoorStateWord, edges: &BTreeSet<StateKey>) {
        for &key in edges {
            let result = match key {
                StateKey::GreenActive if state.green_active => {
                    self.publish_button_event(messages::BUTTON_GREEN)
                }
                StateKey::RedActive if state.red_active => {
                    self.publish_button_event(messages::BUTTON_RED)
                }
                StateKey::DoorClosed => {
                    let payload =
                        if state.door_closed { messages::DOOR_CLOSED } else { messages::DOOR_OPEN };
                    self.publish_events(payload)
                }
                StateKey::LockOpen => {
                    let payload =
                        if state.lock_open { messages::LOCK_OPEN } else { messages::LOCK_CLOSED };
                    self.publish_events(payload)
                }
                // Buttons only emit on the false->true edge (spec §3); the
                // falling edge of a button press is not reported.
                StateKey::GreenActive | StateKey::RedActive => Ok(()),
                StateKey::ForceClose | StateKey::ForceOpen => Ok(()),
            };

            if let Err(e) = result {
                tracing::warn!(key = ?key, error = %e, "door_event_publish_failed");
            }
        }
    }
}
