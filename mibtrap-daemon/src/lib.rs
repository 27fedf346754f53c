//! mibtrap daemon library.
//!
//! The binary in `main.rs` is a thin shell over these modules; they are
//! exposed here so integration tests can drive the service directly.

pub mod cli;
pub mod health;
pub mod logging;
pub mod metrics_server;
pub mod service;

pub use service::{ServiceExit, TrapService};
