//! Playable objects and the remote files behind them.

use async_trait::async_trait;
use bridge_traits::http::{DynAsyncRead, HttpClient};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::object::Object;
use crate::quality::QualityRange;

/// A single playable object.
#[async_trait]
pub trait Track: Object {
    fn title(&self) -> String;

    /// Display name of the performing artist, as the service reports it.
    fn artist_name(&self) -> String;

    /// Tags to write into a downloaded file, e.g. `title`, `album`, `isrc`.
    async fn metadata(&self) -> Result<HashMap<String, String>>;

    /// Direct file URL for the best quality `range` allows.
    ///
    /// Implementations usually pick the level with
    /// [`QualityRange::select`] and fail with
    /// [`ServiceError::InsufficientAudioQuality`](crate::error::ServiceError::InsufficientAudioQuality)
    /// when nothing reaches the floor.
    async fn file_url(&self, range: &QualityRange) -> Result<String>;
}

/// Artwork attached to an object.
pub trait Cover: Send + Sync + fmt::Debug {
    /// Image URL, scaled to `size` pixels when the service supports it.
    fn url(&self, size: Option<u32>) -> String;
}

/// A resolved file URL together with the transport that can fetch it.
#[derive(Clone)]
pub struct RemoteFile {
    url: String,
    filename: Option<String>,
    transport: Arc<dyn HttpClient>,
}

impl RemoteFile {
    pub fn new(url: impl Into<String>, transport: Arc<dyn HttpClient>) -> Self {
        Self {
            url: url.into(),
            filename: None,
            transport,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Start streaming the file body.
    pub async fn open(&self) -> Result<Box<DynAsyncRead>> {
        debug!(filename = ?self.filename, "Opening remote file");
        let reader = self.transport.download_stream(self.url.clone()).await?;
        Ok(reader)
    }
}

impl fmt::Debug for RemoteFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteFile")
            .field("url", &self.url)
            .field("filename", &self.filename)
            .field("transport", &"HttpClient { ... }")
            .finish()
    }
}
