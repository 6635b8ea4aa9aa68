//! # Sessions
//!
//! A [`Session`] is the entry point a host holds for one music service. It
//! pairs a [`Backend`] (the service's kind registry, quality scale and URL
//! filter) with a transport and the default quality bounds for downloads.
//!
//! ## Resolution
//!
//! [`Session::object_from_url`] offers the URL to every registered kind in
//! registration order. The first kind that resolves it wins; kinds that
//! decline are skipped; a kind that recognizes the URL but fails while
//! building the object stops the search with that error.
//!
//! [`Session::parse_urls`] applies the same resolution lazily to each
//! whitespace-separated token of a text, yielding objects as they resolve.
//!
//! ## Usage
//!
//! ```ignore
//! let session = Session::builder(Arc::new(TidalBackend::new()))
//!     .required_quality(TidalQuality::High)
//!     .build()?;
//!
//! let album = session.object_from_url("https://tidal.com/album/91969976").await?;
//! let mut found = session.parse_urls(message_text);
//! while let Some(object) = found.next().await {
//!     println!("{:?}", object?);
//! }
//! ```

use bridge_traits::http::HttpClient;
use core_runtime::config::SessionConfig;
use core_runtime::logging::redact_url;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::collection::ObjectStream;
use crate::error::{Result, ServiceError};
use crate::object::{Decline, DynObject, Kind, ObjectId, ObjectKind, Resolution};
use crate::quality::{QualityLevel, QualityRange, QualityScale};
use crate::registry::KindRegistry;
use crate::track::{Cover, RemoteFile, Track};

/// What a concrete music service plugs into a [`Session`].
pub trait Backend: Send + Sync + 'static {
    /// Service name used in logs and errors, e.g. `"Tidal"`.
    fn name(&self) -> &'static str;

    fn quality_scale(&self) -> &'static QualityScale;

    /// Cheap syntactic filter applied to scan tokens before resolution.
    fn is_valid_url(&self, url: &str) -> bool;

    fn registry(&self) -> &KindRegistry;

    /// Run a search restricted to `kinds`, all of which are registered and
    /// searchable. Backends without search keep the default.
    fn search<'a>(
        &'a self,
        session: &'a Session,
        query: &'a str,
        kinds: Vec<Kind>,
        limit: usize,
    ) -> ObjectStream<'a> {
        let _ = (session, query, kinds, limit);
        stream::once(async { Err(ServiceError::not_supported("search")) }).boxed()
    }
}

struct SessionInner {
    id: Uuid,
    backend: Arc<dyn Backend>,
    transport: Arc<dyn HttpClient>,
    required: AtomicUsize,
    preferred: AtomicUsize,
}

/// Handle to an open session. Clones share state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

/// Non-owning handle objects keep to the session that built them.
#[derive(Clone, Debug)]
pub struct SessionRef(Weak<SessionInner>);

impl SessionRef {
    /// Fails with [`ServiceError::SessionClosed`] once every [`Session`]
    /// clone has been dropped.
    pub fn upgrade(&self) -> Result<Session> {
        self.0
            .upgrade()
            .map(|inner| Session { inner })
            .ok_or(ServiceError::SessionClosed)
    }
}

impl Session {
    pub fn builder(backend: Arc<dyn Backend>) -> SessionBuilder {
        SessionBuilder {
            backend,
            transport: None,
            required: None,
            preferred: None,
        }
    }

    /// Open a session from host configuration.
    ///
    /// Quality names in `config.quality` are looked up in the backend's
    /// scale, ignoring case; an unknown name is
    /// [`ServiceError::UnknownQualityLevel`].
    pub fn from_config(backend: Arc<dyn Backend>, config: SessionConfig) -> Result<Session> {
        let scale = backend.quality_scale();
        let mut builder = Session::builder(backend).transport(config.transport);

        if let Some(name) = &config.quality.required {
            builder = builder.required_quality(scale.parse(name)?);
        }
        if let Some(name) = &config.quality.preferred {
            builder = builder.preferred_quality(scale.parse(name)?);
        }

        builder.build()
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn backend(&self) -> &dyn Backend {
        self.inner.backend.as_ref()
    }

    pub fn registry(&self) -> &KindRegistry {
        self.inner.backend.registry()
    }

    pub fn transport(&self) -> Arc<dyn HttpClient> {
        Arc::clone(&self.inner.transport)
    }

    pub fn quality_scale(&self) -> &'static QualityScale {
        self.inner.backend.quality_scale()
    }

    pub fn downgrade(&self) -> SessionRef {
        SessionRef(Arc::downgrade(&self.inner))
    }

    /// Default lower bound for track downloads.
    pub fn required_quality(&self) -> QualityLevel {
        self.level_at(self.inner.required.load(Ordering::Acquire))
    }

    /// Default upper bound for track downloads.
    pub fn preferred_quality(&self) -> QualityLevel {
        self.level_at(self.inner.preferred.load(Ordering::Acquire))
    }

    /// Fails with [`ServiceError::QualityScaleMismatch`] for a level of
    /// another backend's scale, leaving the setting as it was.
    pub fn set_required_quality(&self, level: impl Into<QualityLevel>) -> Result<()> {
        let level = level.into();
        self.quality_scale().check(&level)?;
        self.inner.required.store(level.index(), Ordering::Release);
        debug!(session_id = %self.inner.id, level = %level, "Required quality changed");
        Ok(())
    }

    /// See [`set_required_quality`](Self::set_required_quality).
    pub fn set_preferred_quality(&self, level: impl Into<QualityLevel>) -> Result<()> {
        let level = level.into();
        self.quality_scale().check(&level)?;
        self.inner.preferred.store(level.index(), Ordering::Release);
        debug!(session_id = %self.inner.id, level = %level, "Preferred quality changed");
        Ok(())
    }

    /// Session defaults, overridden per bound where an explicit level is given.
    pub fn quality_range(
        &self,
        required: Option<QualityLevel>,
        preferred: Option<QualityLevel>,
    ) -> Result<QualityRange> {
        let scale = self.quality_scale();
        let required = match required {
            Some(level) => {
                scale.check(&level)?;
                level
            }
            None => self.required_quality(),
        };
        let preferred = match preferred {
            Some(level) => {
                scale.check(&level)?;
                level
            }
            None => self.preferred_quality(),
        };
        QualityRange::new(required, preferred)
    }

    /// Resolve a service URL to an object of whichever registered kind
    /// accepts it.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::InvalidUrl`] if every kind declines
    /// - whatever the accepting kind failed with while building the object
    #[instrument(skip(self, url), fields(session_id = %self.inner.id, url = %redact_url(url)))]
    pub async fn object_from_url(&self, url: &str) -> Result<DynObject> {
        for descriptor in self.registry().snapshot() {
            match descriptor.from_url(self, url).await {
                Resolution::Resolved(object) => {
                    info!(kind = %descriptor.kind(), id = %object.id(), "Resolved URL");
                    return Ok(object);
                }
                Resolution::Declined(reason) => {
                    debug!(
                        kind = %descriptor.kind(),
                        unsupported = (reason == Decline::Unsupported),
                        "Kind declined URL"
                    );
                }
                Resolution::Failed(err) => {
                    warn!(kind = %descriptor.kind(), error = %err, "Kind failed to build object");
                    return Err(err);
                }
            }
        }

        Err(ServiceError::InvalidUrl(url.to_string()))
    }

    /// Build an object of a registered kind from its native id.
    #[instrument(skip(self), fields(session_id = %self.inner.id))]
    pub async fn object_from_id(&self, kind: Kind, id: &ObjectId) -> Result<DynObject> {
        let descriptor = self.registry().require(kind)?;
        descriptor.from_id(self, id).await
    }

    /// Typed form of [`object_from_id`](Self::object_from_id).
    pub async fn fetch<T: ObjectKind>(&self, id: impl Into<ObjectId>) -> Result<T> {
        self.registry().require(Kind::of::<T>())?;
        T::from_id(self, &id.into()).await
    }

    /// Lazily resolve every URL in `text`.
    ///
    /// Tokens are whitespace-separated and handled one at a time, left to
    /// right, only as the stream is polled. Tokens the backend's
    /// [`is_valid_url`](Backend::is_valid_url) rejects are skipped, as are
    /// tokens no kind accepts. Any other failure is yielded once and ends the
    /// stream.
    pub fn parse_urls<'a>(&'a self, text: &'a str) -> ObjectStream<'a> {
        let tokens = text.split_whitespace();

        stream::unfold(Some(tokens), move |state| async move {
            let mut tokens = state?;

            while let Some(token) = tokens.next() {
                if !self.backend().is_valid_url(token) {
                    continue;
                }

                match self.object_from_url(token).await {
                    Ok(object) => return Some((Ok(object), Some(tokens))),
                    Err(ServiceError::InvalidUrl(_)) => {
                        warn!(
                            session_id = %self.inner.id,
                            token = %redact_url(token),
                            "Skipping URL no object kind recognizes"
                        );
                    }
                    Err(err) => return Some((Err(err), None)),
                }
            }

            None
        })
        .boxed()
    }

    /// Search the service.
    ///
    /// An empty `kinds` searches every searchable kind. Naming a kind that is
    /// not registered as searchable fails before any request is made.
    pub fn search<'a>(
        &'a self,
        query: &'a str,
        kinds: &[Kind],
        limit: usize,
    ) -> Result<ObjectStream<'a>> {
        let registry = self.registry();

        let kinds = if kinds.is_empty() {
            registry.searchable_kinds()
        } else {
            for kind in kinds {
                let searchable = registry
                    .descriptor(*kind)
                    .map_or(false, |descriptor| descriptor.is_searchable());
                if !searchable {
                    return Err(ServiceError::InvalidSearchType {
                        backend: self.backend().name().to_string(),
                        kind: kind.name().to_string(),
                    });
                }
            }
            kinds.to_vec()
        };

        debug!(session_id = %self.inner.id, ?kinds, limit, "Searching");
        Ok(self
            .inner
            .backend
            .search(self, query, kinds, limit)
            .take(limit)
            .boxed())
    }

    /// Resolve the file behind `track` within the given (or default) bounds.
    #[instrument(skip(self, track, required, preferred), fields(session_id = %self.inner.id, track = %track.id()))]
    pub async fn track_file(
        &self,
        track: &dyn Track,
        required: Option<QualityLevel>,
        preferred: Option<QualityLevel>,
    ) -> Result<RemoteFile> {
        let range = self.quality_range(required, preferred)?;
        let url = track.file_url(&range).await?;
        debug!(required = %range.required(), preferred = %range.preferred(), "Resolved track file");
        Ok(RemoteFile::new(url, self.transport()).with_filename(track.title()))
    }

    pub fn cover_file(&self, cover: &dyn Cover, size: Option<u32>) -> RemoteFile {
        RemoteFile::new(cover.url(size), self.transport())
    }

    fn level_at(&self, index: usize) -> QualityLevel {
        QualityLevel::from_declared(self.quality_scale(), index)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .field("backend", &self.inner.backend.name())
            .field("required", &self.required_quality())
            .field("preferred", &self.preferred_quality())
            .finish()
    }
}

/// Builder for [`Session`].
pub struct SessionBuilder {
    backend: Arc<dyn Backend>,
    transport: Option<Arc<dyn HttpClient>>,
    required: Option<QualityLevel>,
    preferred: Option<QualityLevel>,
}

impl SessionBuilder {
    pub fn transport(mut self, transport: Arc<dyn HttpClient>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Defaults to the lowest level of the backend's scale.
    pub fn required_quality(mut self, level: impl Into<QualityLevel>) -> Self {
        self.required = Some(level.into());
        self
    }

    /// Defaults to the highest level of the backend's scale.
    pub fn preferred_quality(mut self, level: impl Into<QualityLevel>) -> Self {
        self.preferred = Some(level.into());
        self
    }

    /// # Errors
    ///
    /// - [`ServiceError::EmptyQualityScale`] if the backend declares no levels
    /// - [`ServiceError::QualityScaleMismatch`] for a level of another scale
    /// - [`ServiceError::InvalidQualityRange`] if required is above preferred
    /// - [`ServiceError::Runtime`] if no transport was given and none could be
    ///   created for this platform
    pub fn build(self) -> Result<Session> {
        let scale = self.backend.quality_scale();
        let full = QualityRange::full(scale)?;

        let required = self.required.unwrap_or(full.required());
        let preferred = self.preferred.unwrap_or(full.preferred());
        scale.check(&required)?;
        scale.check(&preferred)?;
        let range = QualityRange::new(required, preferred)?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => SessionConfig::builder().build()?.transport,
        };

        let inner = SessionInner {
            id: Uuid::new_v4(),
            backend: self.backend,
            transport,
            required: AtomicUsize::new(range.required().index()),
            preferred: AtomicUsize::new(range.preferred().index()),
        };

        info!(
            session_id = %inner.id,
            backend = inner.backend.name(),
            kinds = inner.backend.registry().len(),
            required = %range.required(),
            preferred = %range.preferred(),
            "Session opened"
        );

        Ok(Session {
            inner: Arc::new(inner),
        })
    }
}
