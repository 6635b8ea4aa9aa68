//! # Session Configuration
//!
//! Settings a host supplies when it opens a session against a music service
//! backend. The builder validates everything up front so a misconfigured
//! session fails at construction rather than on its first request.
//!
//! ## Transport
//!
//! A session needs an [`HttpClient`]. When the `desktop-shims` feature is
//! enabled and no client is supplied, a `ReqwestHttpClient` is created from
//! the configured user agent, timeout and retry policy. Without the feature a
//! missing transport is reported as [`Error::CapabilityMissing`].
//!
//! ## Quality bounds
//!
//! [`QualitySettings`] carries level *names*. They are resolved against the
//! backend's own quality scale when the session is built, because this crate
//! knows nothing about any particular backend.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{QualitySettings, SessionConfig};
//!
//! let config = SessionConfig::builder()
//!     .user_agent("my-player/1.0")
//!     .quality(QualitySettings::from_json(r#"{ "required": "HIGH" }"#)?)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::http::{HttpClient, RetryPolicy, DEFAULT_USER_AGENT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on per-request timeouts accepted by the builder.
const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Default quality floor and ceiling, by level name.
///
/// `None` means "use the lowest (floor) or highest (ceiling) level of the
/// backend's scale".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualitySettings {
    pub required: Option<String>,
    pub preferred: Option<String>,
}

impl QualitySettings {
    /// Parse settings from a JSON document such as
    /// `{ "required": "LOW", "preferred": "LOSSLESS" }`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid quality settings: {}", e)))
    }
}

/// Validated configuration for one session.
#[derive(Clone)]
pub struct SessionConfig {
    pub transport: Arc<dyn HttpClient>,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub retry_policy: RetryPolicy,
    pub quality: QualitySettings,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("transport", &"HttpClient { ... }")
            .field("user_agent", &self.user_agent)
            .field("request_timeout", &self.request_timeout)
            .field("retry_policy", &self.retry_policy)
            .field("quality", &self.quality)
            .finish()
    }
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }
}

/// Builder for [`SessionConfig`].
pub struct SessionConfigBuilder {
    transport: Option<Arc<dyn HttpClient>>,
    user_agent: String,
    request_timeout: Duration,
    retry_policy: RetryPolicy,
    quality: QualitySettings,
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self {
            transport: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(30),
            retry_policy: RetryPolicy::default(),
            quality: QualitySettings::default(),
        }
    }
}

impl SessionConfigBuilder {
    /// Use an existing transport instead of the platform default.
    pub fn transport(mut self, transport: Arc<dyn HttpClient>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn quality(mut self, quality: QualitySettings) -> Self {
        self.quality = quality;
        self
    }

    pub fn required_quality(mut self, level: impl Into<String>) -> Self {
        self.quality.required = Some(level.into());
        self
    }

    pub fn preferred_quality(mut self, level: impl Into<String>) -> Self {
        self.quality.preferred = Some(level.into());
        self
    }

    /// Validate the settings and resolve the transport.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] for an empty user agent, a zero or excessive
    ///   timeout, a retry policy without attempts, or a blank quality name
    /// - [`Error::CapabilityMissing`] when no transport was given and no
    ///   platform default is compiled in
    pub fn build(self) -> Result<SessionConfig> {
        if self.user_agent.trim().is_empty() {
            return Err(Error::Config("user_agent must not be empty".to_string()));
        }

        if self.request_timeout.is_zero() || self.request_timeout > MAX_REQUEST_TIMEOUT {
            return Err(Error::Config(format!(
                "request_timeout must be between 1ms and {}s, got {:?}",
                MAX_REQUEST_TIMEOUT.as_secs(),
                self.request_timeout
            )));
        }

        if self.retry_policy.max_attempts == 0 {
            return Err(Error::Config(
                "retry_policy.max_attempts must be at least 1".to_string(),
            ));
        }

        for (field, value) in [
            ("required", &self.quality.required),
            ("preferred", &self.quality.preferred),
        ] {
            if matches!(value, Some(name) if name.trim().is_empty()) {
                return Err(Error::Config(format!(
                    "quality.{} must name a level when set",
                    field
                )));
            }
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport(&self.user_agent, self.request_timeout, &self.retry_policy)?,
        };

        Ok(SessionConfig {
            transport,
            user_agent: self.user_agent,
            request_timeout: self.request_timeout,
            retry_policy: self.retry_policy,
            quality: self.quality,
        })
    }
}

#[cfg(feature = "desktop-shims")]
fn default_transport(
    user_agent: &str,
    timeout: Duration,
    retry_policy: &RetryPolicy,
) -> Result<Arc<dyn HttpClient>> {
    let client =
        bridge_desktop::ReqwestHttpClient::with_options(timeout, user_agent, retry_policy.clone())
            .map_err(|e| Error::Config(format!("Failed to create default transport: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn default_transport(
    _user_agent: &str,
    _timeout: Duration,
    _retry_policy: &RetryPolicy,
) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No transport provided. Desktop: enable the `desktop-shims` feature. \
                  Other hosts: pass one with SessionConfigBuilder::transport."
            .to_string(),
    })
}
