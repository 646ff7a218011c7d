//! Shared utilities for the gold analysis workspace
//!
//! Logging setup and small helpers for reading configuration out of the
//! process environment.

pub mod env;
pub mod logging;

pub use env::{EnvError, EnvLookup};
pub use logging::{LogFormat, init_tracing};
