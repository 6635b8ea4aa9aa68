//! # Host Bridge Traits
//!
//! Capabilities the music service core consumes from its host but does not
//! implement itself.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - the session transport. Backends issue
//!   API requests through it and the file-fetching side streams bytes from it.
//! - [`LoggerSink`](logging::LoggerSink) - forwards structured log events to
//!   a host logging pipeline.
//!
//! The desktop default transport lives in `bridge-desktop`.
//!
//! ## Error Handling
//!
//! All bridge traits report [`BridgeError`](error::BridgeError). Implementations
//! should convert their native errors into it and keep the message actionable
//! (status code, URL, underlying cause).
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::http::{DynAsyncRead, HttpClient, HttpRequest, HttpResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct RecordingClient;
//!
//! #[async_trait]
//! impl HttpClient for RecordingClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         todo!()
//!     }
//!
//!     async fn download_stream(&self, url: String) -> Result<Box<DynAsyncRead>> {
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod logging;

pub use error::BridgeError;

pub use http::{
    DynAsyncRead, HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy,
    DEFAULT_USER_AGENT,
};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
