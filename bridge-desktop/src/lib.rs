//! # Desktop Bridge Implementations
//!
//! Default transport for sessions created on desktop platforms
//! (macOS, Windows, Linux).
//!
//! - `HttpClient` using `reqwest`, with retry and streaming downloads
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::sync::Arc;
//!
//! let transport = Arc::new(ReqwestHttpClient::new()?);
//! let session = Session::builder(backend).transport(transport).build()?;
//! ```

mod http;

pub use http::ReqwestHttpClient;
