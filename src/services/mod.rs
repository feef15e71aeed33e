//! Services - business logic and state management
//!
//! - `door_driver` - Door Controller Driver: polling, edges, unlock/lock
//! - `beep_driver` - Shutter/Beep Driver: pattern encoding
//! - `door_bridge` - Door Bridge Service: driver edges <-> bus events
//! - `scheduler` - Countdown Scheduler: time-indexed event queue
//! - `watchdog` - Watchdog State Machine

pub mod beep_driver;
pub mod door_bridge;
pub mod door_driver;
pub mod scheduler;
pub mod watchdog;

pub use beep_driver::BeepDriver;
pub use door_bridge::DoorBridge;
pub use door_driver::{DoorDriver, Listener};
pub use scheduler::{EventHandle, Scheduler};
pub use watchdog::{Watchdog, WatchdogActions};
