//! Bus Adapter — topic templating, subscribe/publish, and reconnect-safe
//! subscription restore (spec §4.4, §9 "process-wide topic registry").
//!
//! Built on `rumqttc`'s synchronous `Client`/`Connection` pair rather than
//! its async client: the control loops this bus feeds (door driver polling,
//! watchdog `step()`) are deliberately single-threaded and must not be
//! pulled onto a `tokio` runtime (spec §9 "scheduler stays synchronous").
//! The connection's own network thread plays the same role `paho-mqtt`'s
//! `loop_start()` background thread played in the original Python services.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};
use tracing::{error, info, warn};

type Handler = dyn Fn(&str) + Send + Sync;

/// Render `"{base}/{sub}"`, or just `sub` if `base` is empty (spec §4.4).
/// `sub` must be non-empty; that is a configuration error, not a runtime one.
pub fn topic(base: &str, sub: &str) -> anyhow::Result<String> {
    anyhow::ensure!(!sub.is_empty(), "bus sub-topic must not be empty");
    Ok(if base.is_empty() { sub.to_string() } else { format!("{base}/{sub}") })
}

/// Process-wide (per-adapter) topic→handler table, replayed against the
/// broker on every `ConnAck` so subscriptions survive a reconnect.
#[derive(Default)]
struct Registry {
    handlers: HashMap<String, Arc<Handler>>,
}

/// Owns the MQTT client handle and the topic registry. Cheap to clone —
/// every clone shares the same client connection and registry.
#[derive(Clone)]
pub struct BusAdapter {
    client: Client,
    registry: Arc<Mutex<Registry>>,
}

impl BusAdapter {
    /// Connect to `host:port` and spawn the background thread that pumps
    /// the connection, dispatches incoming publishes to registered
    /// handlers, and re-subscribes everything on reconnect.
    pub fn connect(client_id: &str, host: &str, port: u16) -> anyhow::Result<Self> {
        let mut options = MqttOptions::new(client_id, host, port);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, connection) = Client::new(options, 64);
        let registry = Arc::new(Mutex::new(Registry::default()));

        let adapter = Self { client, registry };
        adapter.spawn_event_loop(connection);
        Ok(adapter)
    }

    fn spawn_event_loop(&self, mut connection: Connection) {
        let registry = self.registry.clone();
        let mut client = self.client.clone();

        thread::spawn(move || {
            for notification in connection.iter() {
                match notification {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("bus_connected");
                        let topics: Vec<String> =
                            registry.lock().handlers.keys().cloned().collect();
                        for t in topics {
                            if let Err(e) = client.subscribe(&t, QoS::ExactlyOnce) {
                                error!(topic = %t, error = %e, "bus_resubscribe_failed");
                            }
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let handler = registry.lock().handlers.get(publish.topic.as_str()).cloned();
                        let Some(handler) = handler else { continue };
                        match std::str::from_utf8(&publish.payload) {
                            Ok(payload) => handler(payload),
                            Err(e) => {
                                warn!(topic = %publish.topic, error = %e, "bus_invalid_utf8_payload");
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "bus_connection_error");
                    }
                }
            }
        });
    }

    /// Record `handler` for `topic_sub` rendered against `base`, and
    /// subscribe immediately. A fresh connect also replays every registered
    /// topic from its `ConnAck` handler, so a handler added before the
    /// first connect is covered twice — the second `subscribe` is a no-op
    /// on the broker side.
    pub fn subscribe(
        &self,
        base: &str,
        sub: &str,
        handler: impl Fn(&str) + Send + Sync + 'static,
    ) -> anyhow::Result<()> {
        let t = topic(base, sub)?;
        self.registry.lock().handlers.insert(t.clone(), Arc::new(handler));
        self.client.clone().subscribe(&t, QoS::ExactlyOnce)?;
        Ok(())
    }

    /// Publish `payload` to `"{base}/{sub}"` at QoS 2 (spec §4.4, §6.2).
    pub fn publish(&self, base: &str, sub: &str, payload: &str, retain: bool) -> anyhow::Result<()> {
        let t = topic(base, sub)?;
        self.client.clone().publish(&t, QoS::ExactlyOnce, retain, payload.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_renders_with_base() {
        assert_eq!(topic("Netz39/Things/Door", "Events").unwrap(), "Netz39/Things/Door/Events");
    }

    #[test]
    fn topic_renders_without_base() {
        assert_eq!(topic("", "Events").unwrap(), "Events");
    }

    #[test]
    fn topic_rejects_empty_sub() {
        assert!(topic("base", "").is_err());
    }
}
