//! # inistore-cli
//!
//! Library half of the `inistore` tool: the device settings table it manages
//! and the subcommand implementations.  The binary in `main.rs` only parses
//! arguments, sets up logging and dispatches here.

pub mod commands;
pub mod schema;

pub use schema::{DeviceField, DeviceSettings};
