//! Domain models - core types shared by all three binaries
//!
//! - `types` - `DoorStateWord`, `Frame`, `WatchdogState`, and the canonical
//!   bus message bodies (`types::messages`)

pub mod types;

pub use types::{DoorStateWord, Frame, StateKey, WatchdogState};
