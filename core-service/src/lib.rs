//! Client contract for asynchronous music service backends.
//!
//! A backend crate (Tidal, Deezer, ...) implements [`Backend`] and registers
//! its object kinds with a [`KindRegistry`]. Hosts then work against a
//! [`Session`] without knowing which service is behind it:
//!
//! - [`quality`]: per-backend ordered quality scales that refuse to compare
//!   across backends
//! - [`Session::object_from_url`] and [`Session::parse_urls`]: turn service
//!   URLs, or free text containing them, into objects
//! - [`collection`]: kinds that yield other kinds (`album.iterate(Track)`)
//!
//! Transport comes from `bridge-traits` (`HttpClient`); desktop builds get a
//! reqwest-backed client through the `desktop-shims` feature.

pub mod collection;
pub mod error;
pub mod object;
pub mod quality;
pub mod registry;
pub mod session;
pub mod track;

pub use collection::{
    plural_noun, Collect, Collection, CollectionCapability, CollectionLayout, ObjectStream,
    Producer,
};
pub use error::{Result, ServiceError};
pub use object::{
    downcast, Decline, DynObject, Kind, Object, ObjectId, ObjectKind, Resolution, Searchable,
};
pub use quality::{Quality, QualityLevel, QualityRange, QualityScale};
pub use registry::{KindDescriptor, KindRegistry};
pub use session::{Backend, Session, SessionBuilder, SessionRef};
pub use track::{Cover, RemoteFile, Track};
