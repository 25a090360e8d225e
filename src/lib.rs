//! Interactive exhibit host library.
//!
//! Exposes the pure-logic modules for integration testing and the host
//! adapters the binary wires together.  The serial adapter is guarded by
//! the `host` feature.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod protocol;
pub mod timer;
