//! In-memory backend shared by the integration tests.
//!
//! URLs look like `https://svc/<kind>/<digits>`. The kinds are:
//! - `Track` (searchable): resolvable from URLs; id `500` fails with an HTTP error
//! - `Album` (searchable): collects three tracks
//! - `Playlist`: collects two tracks, not resolvable from URLs
//! - `Artist`: collects two albums and one playlist

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{DynAsyncRead, HttpClient, HttpRequest, HttpResponse};
use core_service::{
    Backend, Collect, Collection, CollectionLayout, Cover, DynObject, Kind, KindDescriptor,
    KindRegistry, Object, ObjectId, ObjectKind, ObjectStream, QualityLevel, QualityRange,
    QualityScale, Resolution, Result, Searchable, ServiceError, Session, SessionRef, Track,
};
use futures::stream::{self, StreamExt};
use mockall::mock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

core_service::quality_scale! {
    pub enum DemoQuality { Low, High, HiRes }
}

core_service::quality_scale! {
    pub enum OtherQuality { Low, High }
}

mock! {
    pub Transport {}

    #[async_trait]
    impl HttpClient for Transport {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        async fn download_stream(&self, url: String) -> BridgeResult<Box<DynAsyncRead>>;
    }
}

pub const BASE: &str = "https://svc/";
pub const FAILING_ID: &str = "500";

fn parse_id(url: &str, segment: &str) -> Result<String> {
    url.strip_prefix(BASE)
        .and_then(|rest| rest.strip_prefix(segment))
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .ok_or_else(|| ServiceError::InvalidUrl(url.to_string()))
}

fn numbered_tracks<'a>(session: &SessionRef, parent: &ObjectId, count: usize) -> ObjectStream<'a> {
    let session = session.clone();
    let parent = parent.to_string();
    stream::iter((1..=count).map(move |n| {
        Ok(Arc::new(DemoTrack::new(session.clone(), format!("{parent}{n}"))) as DynObject)
    }))
    .boxed()
}

// ============================================================================
// Track
// ============================================================================

#[derive(Debug)]
pub struct DemoTrack {
    id: ObjectId,
    session: SessionRef,
}

impl DemoTrack {
    pub fn new(session: SessionRef, id: impl Into<ObjectId>) -> Self {
        Self {
            id: id.into(),
            session,
        }
    }
}

#[async_trait]
impl Object for DemoTrack {
    fn kind(&self) -> Kind {
        Kind::of::<Self>()
    }

    fn id(&self) -> ObjectId {
        self.id.clone()
    }

    async fn url(&self) -> Result<String> {
        Ok(format!("{BASE}track/{}", self.id))
    }

    fn cover(&self) -> Option<Arc<dyn Cover>> {
        Some(Arc::new(DemoCover(self.id.clone())))
    }

    fn as_track(&self) -> Option<&dyn Track> {
        Some(self)
    }
}

#[async_trait]
impl ObjectKind for DemoTrack {
    const NAME: &'static str = "Track";

    async fn from_url(session: &Session, url: &str) -> Resolution<Self> {
        parse_id(url, "track")
            .and_then(|id| {
                if id == FAILING_ID {
                    Err(ServiceError::Bridge(BridgeError::Status {
                        status: 500,
                        url: url.to_string(),
                    }))
                } else {
                    Ok(DemoTrack::new(session.downgrade(), id))
                }
            })
            .into()
    }

    async fn from_id(session: &Session, id: &ObjectId) -> Result<Self> {
        Ok(DemoTrack::new(session.downgrade(), id.clone()))
    }
}

impl Searchable for DemoTrack {}

#[async_trait]
impl Track for DemoTrack {
    fn title(&self) -> String {
        format!("Track {}", self.id)
    }

    fn artist_name(&self) -> String {
        "Demo Artist".to_string()
    }

    async fn metadata(&self) -> Result<HashMap<String, String>> {
        let session = self.session.upgrade()?;
        let mut tags = HashMap::new();
        tags.insert("title".to_string(), self.title());
        tags.insert("artist".to_string(), self.artist_name());
        tags.insert("source".to_string(), session.backend().name().to_string());
        Ok(tags)
    }

    async fn file_url(&self, range: &QualityRange) -> Result<String> {
        let offered = [
            QualityLevel::from(DemoQuality::Low),
            QualityLevel::from(DemoQuality::High),
        ];
        let level = range.select(offered)?;
        Ok(format!(
            "https://cdn.svc/{}/{}.flac",
            self.id,
            level.name().to_lowercase()
        ))
    }
}

#[derive(Debug)]
pub struct DemoCover(ObjectId);

impl Cover for DemoCover {
    fn url(&self, size: Option<u32>) -> String {
        let size = size.unwrap_or(640);
        format!("https://img.svc/{}/{size}x{size}.jpg", self.0)
    }
}

// ============================================================================
// Album
// ============================================================================

#[derive(Debug)]
pub struct DemoAlbum {
    id: ObjectId,
    session: SessionRef,
    layout: Arc<CollectionLayout<DemoAlbum>>,
}

impl DemoAlbum {
    fn build(session: &Session, id: impl Into<ObjectId>) -> Result<Self> {
        Ok(Self {
            id: id.into(),
            session: session.downgrade(),
            layout: session.registry().layout::<Self>()?,
        })
    }

    pub fn tracks(&self) -> ObjectStream<'_> {
        numbered_tracks(&self.session, &self.id, 3)
    }
}

#[async_trait]
impl Object for DemoAlbum {
    fn kind(&self) -> Kind {
        Kind::of::<Self>()
    }

    fn id(&self) -> ObjectId {
        self.id.clone()
    }

    async fn url(&self) -> Result<String> {
        Ok(format!("{BASE}album/{}", self.id))
    }

    fn as_collection(&self) -> Option<&dyn Collection> {
        Some(self)
    }
}

#[async_trait]
impl ObjectKind for DemoAlbum {
    const NAME: &'static str = "Album";

    async fn from_url(session: &Session, url: &str) -> Resolution<Self> {
        parse_id(url, "album")
            .and_then(|id| DemoAlbum::build(session, id))
            .into()
    }

    async fn from_id(session: &Session, id: &ObjectId) -> Result<Self> {
        DemoAlbum::build(session, id.clone())
    }
}

impl Searchable for DemoAlbum {}

impl Collect for DemoAlbum {
    fn layout(&self) -> &CollectionLayout<Self> {
        &self.layout
    }
}

// ============================================================================
// Playlist
// ============================================================================

#[derive(Debug)]
pub struct DemoPlaylist {
    id: ObjectId,
    session: SessionRef,
    layout: Arc<CollectionLayout<DemoPlaylist>>,
}

impl DemoPlaylist {
    fn build(session: &Session, id: impl Into<ObjectId>) -> Result<Self> {
        Ok(Self {
            id: id.into(),
            session: session.downgrade(),
            layout: session.registry().layout::<Self>()?,
        })
    }

    pub fn tracks(&self) -> ObjectStream<'_> {
        numbered_tracks(&self.session, &self.id, 2)
    }
}

#[async_trait]
impl Object for DemoPlaylist {
    fn kind(&self) -> Kind {
        Kind::of::<Self>()
    }

    fn id(&self) -> ObjectId {
        self.id.clone()
    }

    async fn url(&self) -> Result<String> {
        Ok(format!("{BASE}playlist/{}", self.id))
    }

    fn as_collection(&self) -> Option<&dyn Collection> {
        Some(self)
    }
}

#[async_trait]
impl ObjectKind for DemoPlaylist {
    const NAME: &'static str = "Playlist";

    async fn from_id(session: &Session, id: &ObjectId) -> Result<Self> {
        DemoPlaylist::build(session, id.clone())
    }
}

impl Collect for DemoPlaylist {
    fn layout(&self) -> &CollectionLayout<Self> {
        &self.layout
    }
}

// ============================================================================
// Artist
// ============================================================================

#[derive(Debug)]
pub struct DemoArtist {
    id: ObjectId,
    session: SessionRef,
    layout: Arc<CollectionLayout<DemoArtist>>,
}

impl DemoArtist {
    fn build(session: &Session, id: impl Into<ObjectId>) -> Result<Self> {
        Ok(Self {
            id: id.into(),
            session: session.downgrade(),
            layout: session.registry().layout::<Self>()?,
        })
    }

    pub fn albums(&self) -> ObjectStream<'_> {
        let session = self.session.clone();
        let id = self.id.to_string();
        stream::iter(1..=2)
            .map(move |n| -> Result<DynObject> {
                let session = session.upgrade()?;
                Ok(Arc::new(DemoAlbum::build(&session, format!("{id}{n}"))?) as DynObject)
            })
            .boxed()
    }

    pub fn playlists(&self) -> ObjectStream<'_> {
        let session = self.session.clone();
        let id = self.id.to_string();
        stream::once(async move {
            let session = session.upgrade()?;
            let playlist = DemoPlaylist::build(&session, format!("{id}0"))?;
            Ok::<DynObject, ServiceError>(Arc::new(playlist))
        })
        .boxed()
    }
}

#[async_trait]
impl Object for DemoArtist {
    fn kind(&self) -> Kind {
        Kind::of::<Self>()
    }

    fn id(&self) -> ObjectId {
        self.id.clone()
    }

    async fn url(&self) -> Result<String> {
        Ok(format!("{BASE}artist/{}", self.id))
    }

    fn as_collection(&self) -> Option<&dyn Collection> {
        Some(self)
    }
}

#[async_trait]
impl ObjectKind for DemoArtist {
    const NAME: &'static str = "Artist";

    async fn from_url(session: &Session, url: &str) -> Resolution<Self> {
        parse_id(url, "artist")
            .and_then(|id| DemoArtist::build(session, id))
            .into()
    }

    async fn from_id(session: &Session, id: &ObjectId) -> Result<Self> {
        DemoArtist::build(session, id.clone())
    }
}

impl Collect for DemoArtist {
    fn layout(&self) -> &CollectionLayout<Self> {
        &self.layout
    }
}

// ============================================================================
// Backend
// ============================================================================

pub fn register_track(registry: &KindRegistry) -> Result<()> {
    registry.register(KindDescriptor::of::<DemoTrack>().searchable())
}

pub fn register_album(registry: &KindRegistry) -> Result<()> {
    let tracks = registry.collection_of_kind(Kind::of::<DemoTrack>())?;
    let layout = CollectionLayout::<DemoAlbum>::builder()
        .extends(&tracks, DemoAlbum::tracks)
        .build()?;
    registry.register(KindDescriptor::of::<DemoAlbum>().searchable().collection(layout))
}

pub fn register_playlist_and_artist(registry: &KindRegistry) -> Result<()> {
    let tracks = registry.collection_of_kind(Kind::of::<DemoTrack>())?;
    let layout = CollectionLayout::<DemoPlaylist>::builder()
        .extends(&tracks, DemoPlaylist::tracks)
        .build()?;
    registry.register(KindDescriptor::of::<DemoPlaylist>().collection(layout))?;

    let albums = registry.collection_of_kind(Kind::of::<DemoAlbum>())?;
    let playlists = registry.collection_of_kind(Kind::of::<DemoPlaylist>())?;
    let layout = CollectionLayout::<DemoArtist>::builder()
        .extends(&albums, DemoArtist::albums)
        .extends(&playlists, DemoArtist::playlists)
        .build()?;
    registry.register(KindDescriptor::of::<DemoArtist>().collection(layout))
}

pub struct DemoBackend {
    registry: KindRegistry,
    validated: AtomicUsize,
}

impl DemoBackend {
    /// Backend with no kinds registered yet.
    pub fn empty() -> Self {
        Self {
            registry: KindRegistry::new("DemoObject"),
            validated: AtomicUsize::new(0),
        }
    }

    /// Backend with every demo kind registered.
    pub fn new() -> Arc<Self> {
        let backend = Self::empty();
        register_track(&backend.registry).expect("register track");
        register_album(&backend.registry).expect("register album");
        register_playlist_and_artist(&backend.registry).expect("register playlist and artist");
        Arc::new(backend)
    }

    /// How many tokens went through `is_valid_url`.
    pub fn validated_tokens(&self) -> usize {
        self.validated.load(Ordering::SeqCst)
    }
}

impl Backend for DemoBackend {
    fn name(&self) -> &'static str {
        "Demo"
    }

    fn quality_scale(&self) -> &'static QualityScale {
        <DemoQuality as core_service::Quality>::scale()
    }

    fn is_valid_url(&self, url: &str) -> bool {
        self.validated.fetch_add(1, Ordering::SeqCst);
        url.starts_with(BASE)
    }

    fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    fn search<'a>(
        &'a self,
        session: &'a Session,
        query: &'a str,
        kinds: Vec<Kind>,
        limit: usize,
    ) -> ObjectStream<'a> {
        // Over-produce so callers can see the limit being enforced.
        let hits = kinds.into_iter().flat_map(move |kind| {
            (1..=limit + 2).map(move |n| (kind, ObjectId::from(format!("{}{n}", query.len()))))
        });

        stream::iter(hits)
            .then(move |(kind, id)| async move { session.object_from_id(kind, &id).await })
            .boxed()
    }
}

pub fn demo_session(backend: Arc<DemoBackend>) -> Session {
    demo_session_with(backend, MockTransport::new())
}

pub fn demo_session_with(backend: Arc<DemoBackend>, transport: MockTransport) -> Session {
    Session::builder(backend)
        .transport(Arc::new(transport))
        .build()
        .expect("demo session")
}
