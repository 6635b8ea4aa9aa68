//! Workspace façade crate.
//!
//! Exposes feature flags that map to the individual workspace crates so a
//! backend implementation can depend on `music-service-workspace` alone.
//! With the default `desktop-shims` feature the session core and a
//! reqwest-backed default transport are both available.

#[cfg(feature = "desktop-shims")]
pub use core_service as service;

#[cfg(any(feature = "desktop-shims", feature = "runtime-only"))]
pub use core_runtime as runtime;
