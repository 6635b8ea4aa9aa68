//! # Objects and Kinds
//!
//! An [`Object`] is anything a music service can point at: a track, album,
//! playlist, artist. Each concrete Rust type implementing it is one *kind*,
//! identified at runtime by a [`Kind`] key.
//!
//! Construction goes through [`ObjectKind`]: `from_url` may decline an input
//! it does not recognize (see [`Resolution`]), `from_id` may not.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::collection::Collection;
use crate::error::{Result, ServiceError};
use crate::session::Session;
use crate::track::{Cover, Track};

/// Runtime key of a concrete object kind.
///
/// Only obtainable through [`Kind::of`], so every `Kind` names a type that
/// implements [`ObjectKind`]. Equality is type identity; the name is for
/// display and for deriving collection accessor names.
#[derive(Clone, Copy)]
pub struct Kind {
    name: &'static str,
    type_id: TypeId,
}

impl Kind {
    pub fn of<T: ObjectKind>() -> Self {
        Self {
            name: T::NAME,
            type_id: TypeId::of::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: ObjectKind>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for Kind {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for Kind {}

impl Hash for Kind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kind({})", self.name)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Backend-native identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for ObjectId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// `Any` access for trait objects; blanket-implemented for every object type.
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A music service object.
///
/// Objects keep a [`SessionRef`](crate::session::SessionRef) to the session
/// that built them, which is how they reach the transport.
#[async_trait]
pub trait Object: AsAny + fmt::Debug {
    fn kind(&self) -> Kind;

    fn id(&self) -> ObjectId;

    /// Canonical URL of this object on the service.
    async fn url(&self) -> Result<String>;

    fn cover(&self) -> Option<Arc<dyn Cover>> {
        None
    }

    fn as_track(&self) -> Option<&dyn Track> {
        None
    }

    fn as_collection(&self) -> Option<&dyn Collection> {
        None
    }
}

pub type DynObject = Arc<dyn Object>;

impl dyn Object {
    pub fn is<T: Object>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Recover the concrete type of a resolved object.
pub fn downcast<T: Object>(object: DynObject) -> Option<Arc<T>> {
    <dyn Object as AsAny>::into_any(object).downcast::<T>().ok()
}

/// Why a kind did not produce an object from a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decline {
    /// The input is not a URL of this kind.
    Unrecognized,
    /// This kind cannot be constructed from URLs at all.
    Unsupported,
}

/// Outcome of one kind's attempt at a URL.
#[derive(Debug)]
pub enum Resolution<T> {
    Resolved(T),
    Declined(Decline),
    Failed(ServiceError),
}

impl<T> Resolution<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Resolved(value) => Resolution::Resolved(f(value)),
            Resolution::Declined(reason) => Resolution::Declined(reason),
            Resolution::Failed(err) => Resolution::Failed(err),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    /// Collapse into a `Result`, turning a decline into [`ServiceError::InvalidUrl`].
    pub fn into_result(self, url: &str) -> Result<T> {
        match self {
            Resolution::Resolved(value) => Ok(value),
            Resolution::Declined(_) => Err(ServiceError::InvalidUrl(url.to_string())),
            Resolution::Failed(err) => Err(err),
        }
    }
}

/// Lets `from_url` bodies use `?`: `InvalidUrl` and `NotSupported` become
/// declines, every other error a failure.
impl<T> From<Result<T>> for Resolution<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Resolution::Resolved(value),
            Err(ServiceError::InvalidUrl(_)) => Resolution::Declined(Decline::Unrecognized),
            Err(ServiceError::NotSupported { .. }) => Resolution::Declined(Decline::Unsupported),
            Err(err) => Resolution::Failed(err),
        }
    }
}

/// Construction side of a concrete kind.
#[async_trait]
pub trait ObjectKind: Object + Sized {
    /// Kind name, e.g. `"Track"`. Collection accessors derive from it.
    const NAME: &'static str;

    /// Build from a service URL, or decline it.
    async fn from_url(session: &Session, url: &str) -> Resolution<Self> {
        let _ = (session, url);
        Resolution::Declined(Decline::Unsupported)
    }

    /// Build from a backend-native id.
    async fn from_id(session: &Session, id: &ObjectId) -> Result<Self>;
}

/// Marker for kinds that may appear in search results.
pub trait Searchable: ObjectKind {}
