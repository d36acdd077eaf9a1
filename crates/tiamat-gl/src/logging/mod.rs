//! Logger setup for binaries and tests built on this crate.
//!
//! The crate itself only talks to the `log` facade. Levels used:
//! - `debug`: resource creation/deletion, context resets
//! - `trace`: state changes suppressed by the cache
//! - `warn`: queries whose dispatch failed
//! - `error`: the device refused to allocate a name

mod init;

pub use init::{init_logging, LoggingConfig};
