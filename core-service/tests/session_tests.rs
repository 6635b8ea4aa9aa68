//! Session construction, quality settings, search and file access.

mod common;

use common::{
    demo_session, demo_session_with, DemoAlbum, DemoArtist, DemoBackend, DemoQuality, DemoTrack,
    MockTransport, OtherQuality,
};
use core_runtime::config::{QualitySettings, SessionConfig};
use core_service::{
    Backend, Kind, KindRegistry, Object, QualityLevel, QualityScale, ServiceError, Session,
};
use futures::{StreamExt, TryStreamExt};
use std::sync::Arc;
use tokio::io::AsyncReadExt;

fn level(quality: DemoQuality) -> QualityLevel {
    quality.into()
}

#[test]
fn test_default_bounds_span_the_scale() {
    let session = demo_session(DemoBackend::new());

    assert_eq!(session.required_quality(), level(DemoQuality::Low));
    assert_eq!(session.preferred_quality(), level(DemoQuality::HiRes));
}

#[test]
fn test_builder_bounds() {
    let session = Session::builder(DemoBackend::new())
        .transport(Arc::new(MockTransport::new()))
        .required_quality(DemoQuality::High)
        .build()
        .unwrap();
    assert_eq!(session.required_quality(), level(DemoQuality::High));
    assert_eq!(session.preferred_quality(), level(DemoQuality::HiRes));

    let result = Session::builder(DemoBackend::new())
        .transport(Arc::new(MockTransport::new()))
        .required_quality(DemoQuality::HiRes)
        .preferred_quality(DemoQuality::Low)
        .build();
    assert!(matches!(result, Err(ServiceError::InvalidQualityRange { .. })));

    let result = Session::builder(DemoBackend::new())
        .transport(Arc::new(MockTransport::new()))
        .preferred_quality(OtherQuality::High)
        .build();
    assert!(matches!(result, Err(ServiceError::QualityScaleMismatch { .. })));
}

#[test]
fn test_foreign_quality_is_rejected_and_setting_kept() {
    let session = demo_session(DemoBackend::new());
    session.set_required_quality(DemoQuality::High).unwrap();

    let result = session.set_required_quality(OtherQuality::Low);
    assert!(matches!(
        result,
        Err(ServiceError::QualityScaleMismatch {
            expected: "DemoQuality",
            found: "OtherQuality"
        })
    ));
    assert_eq!(session.required_quality(), level(DemoQuality::High));

    assert!(session.set_preferred_quality(OtherQuality::High).is_err());
    assert_eq!(session.preferred_quality(), level(DemoQuality::HiRes));
}

#[test]
fn test_settings_are_shared_between_clones() {
    let session = demo_session(DemoBackend::new());
    let clone = session.clone();

    clone.set_preferred_quality(DemoQuality::High).unwrap();
    assert_eq!(session.preferred_quality(), level(DemoQuality::High));
    assert_eq!(session.id(), clone.id());
}

#[test]
fn test_quality_range_overrides() {
    let session = demo_session(DemoBackend::new());

    let range = session
        .quality_range(Some(level(DemoQuality::High)), None)
        .unwrap();
    assert_eq!(range.required(), level(DemoQuality::High));
    assert_eq!(range.preferred(), level(DemoQuality::HiRes));

    let result = session.quality_range(None, Some(OtherQuality::High.into()));
    assert!(matches!(result, Err(ServiceError::QualityScaleMismatch { .. })));
}

#[test]
fn test_from_config_resolves_quality_names() {
    let config = SessionConfig::builder()
        .transport(Arc::new(MockTransport::new()))
        .quality(QualitySettings::from_json(r#"{ "required": "high", "preferred": "HIGH" }"#).unwrap())
        .build()
        .unwrap();

    let session = Session::from_config(DemoBackend::new(), config).unwrap();
    assert_eq!(session.required_quality(), level(DemoQuality::High));
    assert_eq!(session.preferred_quality(), level(DemoQuality::High));
}

#[test]
fn test_from_config_rejects_unknown_quality_name() {
    let config = SessionConfig::builder()
        .transport(Arc::new(MockTransport::new()))
        .required_quality("MASTER")
        .build()
        .unwrap();

    let result = Session::from_config(DemoBackend::new(), config);
    assert!(matches!(
        result,
        Err(ServiceError::UnknownQualityLevel { scale: "DemoQuality", ref name }) if name == "MASTER"
    ));
}

static EMPTY_SCALE: QualityScale = QualityScale::new("EmptyQuality", &[]);

struct SilentBackend {
    registry: KindRegistry,
    scale: &'static QualityScale,
}

impl Backend for SilentBackend {
    fn name(&self) -> &'static str {
        "Silent"
    }

    fn quality_scale(&self) -> &'static QualityScale {
        self.scale
    }

    fn is_valid_url(&self, _url: &str) -> bool {
        false
    }

    fn registry(&self) -> &KindRegistry {
        &self.registry
    }
}

#[test]
fn test_empty_scale_cannot_open_session() {
    let backend = Arc::new(SilentBackend {
        registry: KindRegistry::new("SilentObject"),
        scale: &EMPTY_SCALE,
    });

    let result = Session::builder(backend)
        .transport(Arc::new(MockTransport::new()))
        .build();
    assert!(matches!(
        result,
        Err(ServiceError::EmptyQualityScale("EmptyQuality"))
    ));
}

#[tokio::test]
async fn test_search_defaults_to_not_supported() {
    let backend = Arc::new(SilentBackend {
        registry: KindRegistry::new("SilentObject"),
        scale: <DemoQuality as core_service::Quality>::scale(),
    });
    let session = Session::builder(backend)
        .transport(Arc::new(MockTransport::new()))
        .build()
        .unwrap();

    let results: Vec<_> = session.search("anything", &[], 10).unwrap().collect().await;
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(ServiceError::NotSupported { .. })));
}

#[tokio::test]
async fn test_search_rejects_non_searchable_kind() {
    let session = demo_session(DemoBackend::new());

    let result = session.search("query", &[Kind::of::<DemoArtist>()], 5);
    assert!(matches!(
        result,
        Err(ServiceError::InvalidSearchType { ref backend, ref kind })
            if backend == "Demo" && kind == "Artist"
    ));
}

#[tokio::test]
async fn test_search_all_searchable_kinds_respects_limit() {
    let session = demo_session(DemoBackend::new());

    let hits: Vec<_> = session
        .search("abc", &[], 2)
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|hit| hit.is::<DemoTrack>()));

    let hits: Vec<_> = session
        .search("abc", &[Kind::of::<DemoAlbum>()], 3)
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|hit| hit.is::<DemoAlbum>()));
    assert_eq!(hits[0].id().as_str(), "31");
}

#[tokio::test]
async fn test_track_file_opens_best_offered_quality() {
    let mut transport = MockTransport::new();
    transport
        .expect_download_stream()
        .withf(|url| url == "https://cdn.svc/8/high.flac")
        .times(1)
        .returning(|_| Ok(Box::new(std::io::Cursor::new(b"audio".to_vec()))));
    let session = demo_session_with(DemoBackend::new(), transport);

    let track = session.object_from_url("https://svc/track/8").await.unwrap();
    let track = track.as_track().expect("track object");

    assert_eq!(track.title(), "Track 8");
    assert_eq!(track.artist_name(), "Demo Artist");

    let file = session.track_file(track, None, None).await.unwrap();
    assert_eq!(file.url(), "https://cdn.svc/8/high.flac");
    assert_eq!(file.filename(), Some("Track 8"));

    let mut body = Vec::new();
    file.open().await.unwrap().read_to_end(&mut body).await.unwrap();
    assert_eq!(body, b"audio");
}

#[tokio::test]
async fn test_track_file_respects_preferred_ceiling() {
    let session = demo_session(DemoBackend::new());
    let track: DemoTrack = session.fetch("8").await.unwrap();

    let file = session
        .track_file(&track, None, Some(DemoQuality::Low.into()))
        .await
        .unwrap();
    assert_eq!(file.url(), "https://cdn.svc/8/low.flac");
}

#[tokio::test]
async fn test_track_file_reports_insufficient_quality() {
    let session = demo_session(DemoBackend::new());
    session.set_required_quality(DemoQuality::HiRes).unwrap();
    let track: DemoTrack = session.fetch("8").await.unwrap();

    let result = session.track_file(&track, None, None).await;
    match result {
        Err(ServiceError::InsufficientAudioQuality {
            required,
            best_available,
        }) => {
            assert_eq!(required, level(DemoQuality::HiRes));
            assert_eq!(best_available, Some(level(DemoQuality::High)));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_cover_file() {
    let session = demo_session(DemoBackend::new());
    let track = session.object_from_url("https://svc/track/8").await.unwrap();

    let cover = track.cover().expect("track cover");
    let file = session.cover_file(cover.as_ref(), Some(320));
    assert_eq!(file.url(), "https://img.svc/8/320x320.jpg");
    assert_eq!(file.filename(), None);
}

#[tokio::test]
async fn test_objects_outliving_session_report_closed() {
    let session = demo_session(DemoBackend::new());
    let track: DemoTrack = session.fetch("1").await.unwrap();

    let tags = core_service::Track::metadata(&track).await.unwrap();
    assert_eq!(tags.get("source").map(String::as_str), Some("Demo"));
    assert_eq!(tags.get("artist").map(String::as_str), Some("Demo Artist"));

    drop(session);
    assert!(matches!(
        core_service::Track::metadata(&track).await,
        Err(ServiceError::SessionClosed)
    ));
}
