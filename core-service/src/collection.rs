//! # Collections
//!
//! A collection kind (an album, a playlist, an artist) yields objects of one
//! or more *item* kinds. Each item kind it collects comes with a producer
//! reachable under the pluralized item name: an album collecting `Track`
//! exposes `"tracks"`, an artist collecting `Album` and `Playlist` exposes
//! `"albums"` and `"playlists"`.
//!
//! The "collects K" capability itself is handed out by
//! [`KindRegistry::collection_of_kind`](crate::registry::KindRegistry::collection_of_kind),
//! which returns the same [`CollectionCapability`] for the same `K` every time.
//!
//! ## Building a layout
//!
//! ```ignore
//! let tracks = registry.collection_of_kind(Kind::of::<DemoTrack>())?;
//! let layout = CollectionLayout::<DemoAlbum>::builder()
//!     .extends(&tracks, DemoAlbum::tracks)
//!     .build()?;
//! registry.register(KindDescriptor::of::<DemoAlbum>().collection(layout))?;
//! ```

use futures::stream::BoxStream;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::{Result, ServiceError};
use crate::object::{DynObject, Kind, Object, ObjectKind};

/// Accessor name for a collected kind: lower-cased name plus `s`.
///
/// Every accessor name in the crate goes through this function.
pub fn plural_noun(name: &str) -> String {
    let mut plural = name.to_lowercase();
    plural.push('s');
    plural
}

/// Lazy stream of collected items.
pub type ObjectStream<'a> = BoxStream<'a, Result<DynObject>>;

/// Yields the items of one collected kind.
pub type Producer<O> = for<'a> fn(&'a O) -> ObjectStream<'a>;

/// "Collects objects of kind `item`" within one backend's registry.
#[derive(Debug)]
pub struct CollectionCapability {
    base: String,
    item: Kind,
    accessor: String,
}

impl CollectionCapability {
    pub(crate) fn new(base: &str, item: Kind) -> Self {
        Self {
            base: base.to_string(),
            item,
            accessor: plural_noun(item.name()),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn item(&self) -> Kind {
        self.item
    }

    pub fn accessor(&self) -> &str {
        &self.accessor
    }
}

impl fmt::Display for CollectionCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Collection[{}]", self.base, self.item)
    }
}

/// Which kinds `O` collects, and the producer for each.
pub struct CollectionLayout<O> {
    collection_of: HashSet<Kind>,
    producers: HashMap<String, Producer<O>>,
}

impl<O> Clone for CollectionLayout<O> {
    fn clone(&self) -> Self {
        Self {
            collection_of: self.collection_of.clone(),
            producers: self.producers.clone(),
        }
    }
}

impl<O> fmt::Debug for CollectionLayout<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut accessors: Vec<&String> = self.producers.keys().collect();
        accessors.sort();
        f.debug_struct("CollectionLayout")
            .field("collection_of", &self.collection_of)
            .field("accessors", &accessors)
            .finish()
    }
}

impl<O: ObjectKind> CollectionLayout<O> {
    pub fn builder() -> CollectionLayoutBuilder<O> {
        CollectionLayoutBuilder {
            collection_of: HashSet::new(),
            producers: HashMap::new(),
        }
    }

    pub fn collection_of(&self) -> &HashSet<Kind> {
        &self.collection_of
    }

    pub fn collects(&self, kind: Kind) -> bool {
        self.collection_of.contains(&kind)
    }

    pub fn producer(&self, accessor: &str) -> Option<Producer<O>> {
        self.producers.get(accessor).copied()
    }
}

/// Accumulates capabilities for a [`CollectionLayout`].
///
/// The declared set only grows: extending twice with the same capability,
/// or inheriting a layout that already declares a kind, is a no-op for that
/// kind apart from replacing its producer. Distinct kinds sharing an accessor
/// name are rejected by [`build`](Self::build).
pub struct CollectionLayoutBuilder<O> {
    collection_of: HashSet<Kind>,
    producers: HashMap<String, Producer<O>>,
}

impl<O: ObjectKind> CollectionLayoutBuilder<O> {
    /// Collect `capability.item()`, produced by `producer`.
    pub fn extends(mut self, capability: &CollectionCapability, producer: Producer<O>) -> Self {
        self.collection_of.insert(capability.item());
        self.producers
            .insert(capability.accessor().to_string(), producer);
        self
    }

    /// Declare the kind without a producer; one must arrive through
    /// [`producer`](Self::producer) or [`inherit`](Self::inherit) before `build`.
    pub fn declares(mut self, capability: &CollectionCapability) -> Self {
        self.collection_of.insert(capability.item());
        self
    }

    /// Register a producer under an explicit accessor name.
    pub fn producer(mut self, accessor: impl Into<String>, producer: Producer<O>) -> Self {
        self.producers.insert(accessor.into(), producer);
        self
    }

    /// Union in everything `parent` collects.
    pub fn inherit(mut self, parent: &CollectionLayout<O>) -> Self {
        self.collection_of
            .extend(parent.collection_of.iter().copied());
        for (accessor, producer) in &parent.producers {
            self.producers
                .entry(accessor.clone())
                .or_insert(*producer);
        }
        self
    }

    /// Fails with [`ServiceError::MissingProducer`] if a declared kind has no
    /// producer under its accessor name, and with
    /// [`ServiceError::AccessorConflict`] if two declared kinds pluralize to
    /// the same accessor.
    pub fn build(self) -> Result<CollectionLayout<O>> {
        let mut declared: Vec<Kind> = self.collection_of.iter().copied().collect();
        declared.sort_by_key(|kind| kind.name());

        let mut claimed: HashMap<String, Kind> = HashMap::new();
        for item in declared {
            let accessor = plural_noun(item.name());
            if let Some(first) = claimed.get(&accessor) {
                return Err(ServiceError::AccessorConflict {
                    collection: O::NAME,
                    accessor,
                    first: first.name(),
                    second: item.name(),
                });
            }
            if !self.producers.contains_key(&accessor) {
                return Err(ServiceError::MissingProducer {
                    collection: O::NAME,
                    item: item.name(),
                    accessor,
                });
            }
            claimed.insert(accessor, item);
        }

        Ok(CollectionLayout {
            collection_of: self.collection_of,
            producers: self.producers,
        })
    }
}

/// Typed side of a collection kind: it owns (a handle to) its layout.
pub trait Collect: ObjectKind {
    fn layout(&self) -> &CollectionLayout<Self>;
}

/// Object-safe view of any collection.
pub trait Collection: Object {
    /// Item kinds this collection yields.
    fn collection_of(&self) -> &HashSet<Kind>;

    /// Stream from the producer named `accessor`, if there is one.
    fn produce(&self, accessor: &str) -> Option<ObjectStream<'_>>;

    /// Iterate the items of `kind`.
    ///
    /// Fails with [`ServiceError::NotCollected`] when `kind` is not one of
    /// [`collection_of`](Self::collection_of).
    fn iterate(&self, kind: Kind) -> Result<ObjectStream<'_>> {
        let not_collected = || ServiceError::NotCollected {
            collection: self.kind().name(),
            item: kind.name(),
        };

        if !self.collection_of().contains(&kind) {
            return Err(not_collected());
        }
        self.produce(&plural_noun(kind.name()))
            .ok_or_else(not_collected)
    }
}

impl<O: Collect> Collection for O {
    fn collection_of(&self) -> &HashSet<Kind> {
        self.layout().collection_of()
    }

    fn produce(&self, accessor: &str) -> Option<ObjectStream<'_>> {
        self.layout()
            .producer(accessor)
            .map(|producer| producer(self))
    }
}
