//! Application core: exhibit logic behind port traits.
//!
//! This module contains the rules for the exhibit host: parsing device
//! lines, driving the presentation state machine, delivering timer
//! expiries, and stepping the run loop.  All interaction with the serial
//! port, threads and outputs happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real devices.

pub mod events;
pub mod ports;
pub mod runner;
pub mod service;
