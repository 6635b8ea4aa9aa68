//! # Core Runtime Module
//!
//! Runtime infrastructure shared by music service sessions:
//! - Logging and tracing setup
//! - Session configuration (transport, timeouts, default quality bounds)
//!
//! Backends and hosts call [`logging::init_logging`] once at startup and build
//! a [`config::SessionConfig`] per session they open.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
