//! Logging setup.
//!
//! Library code logs through `tracing` macros only; binaries call
//! [`init_tracing`] once at startup.

mod subscriber;

pub use subscriber::{init_tracing, LogFormat, LoggingConfig};
