//! Infrastructure - CLI configuration and logging
//!
//! - `config` - per-binary `clap` argument structs
//! - `logging` - shared `tracing_subscriber` init

pub mod config;
pub mod logging;

pub use config::{DoorBridgeArgs, ShutterControlArgs, WatchdogArgs};
