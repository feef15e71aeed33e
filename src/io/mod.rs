//! IO modules - external system interfaces
//!
//! - `i2c` - inverted-byte frame codec and retrying transactions with the
//!   door/shutter MCUs
//! - `bus` - MQTT topic templating, subscribe/publish, reconnect-safe
//!   subscription restore

pub mod bus;
pub mod i2c;

pub use bus::BusAdapter;
pub use i2c::I2cBus;
