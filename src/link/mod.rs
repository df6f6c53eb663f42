//! Outbound link to the actuator controller.
//!
//! The tracking core only emits a pair of numbers per frame (a deviation, or
//! a pitch/roll reading). This module turns that pair into the ASCII line
//! the controller reads and pushes it over a serial-style byte stream.

pub mod command;
pub mod serial;

pub use command::AlignmentCommand;
pub use serial::{ChannelSink, CommandSink, LinkConfig, SerialLink, spawn_transmitter};
