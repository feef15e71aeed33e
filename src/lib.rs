//! Gatekeeper library
//!
//! Shared domain types, I²C/bus IO, and services for the three binaries:
//! `door-bridge`, `door-watchdog`, `shuttercontrol`.

pub mod domain;
pub mod infra;
pub mod io;
pub mod services;
