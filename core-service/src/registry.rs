//! # Kind Registry
//!
//! The set of concrete object kinds a backend knows about. Resolution walks
//! this list on every call, in registration order, so kinds registered after a
//! session was opened (a plugin loaded late, say) take part in the next
//! resolution.
//!
//! The registry is also the *base* for collection capabilities: asking it for
//! [`collection_of_kind`](KindRegistry::collection_of_kind) twice with the
//! same item kind yields the same `Arc`.

use futures::future::BoxFuture;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::debug;

use crate::collection::{plural_noun, Collect, CollectionCapability, CollectionLayout};
use crate::error::{Result, ServiceError};
use crate::object::{DynObject, Kind, ObjectId, ObjectKind, Resolution, Searchable};
use crate::session::Session;

type UrlResolver = for<'a> fn(&'a Session, &'a str) -> BoxFuture<'a, Resolution<DynObject>>;
type IdResolver = for<'a> fn(&'a Session, &'a ObjectId) -> BoxFuture<'a, Result<DynObject>>;

fn resolve_url<'a, T: ObjectKind>(
    session: &'a Session,
    url: &'a str,
) -> BoxFuture<'a, Resolution<DynObject>> {
    Box::pin(async move {
        T::from_url(session, url)
            .await
            .map(|object| Arc::new(object) as DynObject)
    })
}

fn resolve_id<'a, T: ObjectKind>(
    session: &'a Session,
    id: &'a ObjectId,
) -> BoxFuture<'a, Result<DynObject>> {
    Box::pin(async move {
        let object = T::from_id(session, id).await?;
        Ok(Arc::new(object) as DynObject)
    })
}

/// Type-erased entry for one registered kind.
pub struct KindDescriptor {
    kind: Kind,
    searchable: bool,
    from_url: UrlResolver,
    from_id: IdResolver,
    collection_of: HashSet<Kind>,
    layout: Option<Arc<dyn Any + Send + Sync>>,
}

impl KindDescriptor {
    /// Start describing kind `T`.
    pub fn of<T: ObjectKind>() -> KindBuilder<T> {
        KindBuilder {
            searchable: false,
            layout: None,
            _kind: PhantomData,
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    /// Item kinds this kind collects; empty for non-collections.
    pub fn collection_of(&self) -> &HashSet<Kind> {
        &self.collection_of
    }

    pub(crate) fn from_url<'a>(
        &self,
        session: &'a Session,
        url: &'a str,
    ) -> BoxFuture<'a, Resolution<DynObject>> {
        (self.from_url)(session, url)
    }

    pub(crate) fn from_id<'a>(
        &self,
        session: &'a Session,
        id: &'a ObjectId,
    ) -> BoxFuture<'a, Result<DynObject>> {
        (self.from_id)(session, id)
    }
}

impl fmt::Debug for KindDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindDescriptor")
            .field("kind", &self.kind)
            .field("searchable", &self.searchable)
            .field("collection_of", &self.collection_of)
            .finish()
    }
}

/// Typed builder for a [`KindDescriptor`].
pub struct KindBuilder<T> {
    searchable: bool,
    layout: Option<Arc<dyn Any + Send + Sync>>,
    _kind: PhantomData<fn() -> T>,
}

impl<T: ObjectKind> KindBuilder<T> {
    /// Allow this kind in search results.
    pub fn searchable(mut self) -> Self
    where
        T: Searchable,
    {
        self.searchable = true;
        self
    }

    /// Attach the collection layout instances of `T` iterate with.
    pub fn collection(mut self, layout: CollectionLayout<T>) -> Self
    where
        T: Collect,
    {
        self.layout = Some(Arc::new(layout));
        self
    }

    pub fn build(self) -> KindDescriptor {
        let collection_of = self
            .layout
            .as_ref()
            .and_then(|layout| layout.downcast_ref::<CollectionLayout<T>>())
            .map(|layout| layout.collection_of().clone())
            .unwrap_or_default();

        KindDescriptor {
            kind: Kind::of::<T>(),
            searchable: self.searchable,
            from_url: resolve_url::<T>,
            from_id: resolve_id::<T>,
            collection_of,
            layout: self.layout,
        }
    }
}

impl<T: ObjectKind> From<KindBuilder<T>> for KindDescriptor {
    fn from(builder: KindBuilder<T>) -> Self {
        builder.build()
    }
}

/// Ordered, extensible list of the kinds one backend can construct.
pub struct KindRegistry {
    base: String,
    kinds: RwLock<Vec<Arc<KindDescriptor>>>,
    capabilities: Mutex<HashMap<Kind, Arc<CollectionCapability>>>,
}

impl KindRegistry {
    /// `base` names the backend's root object type, e.g. `"TidalObject"`.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            kinds: RwLock::new(Vec::new()),
            capabilities: Mutex::new(HashMap::new()),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Add a kind. Later registrations are tried after earlier ones.
    ///
    /// A kind whose accessor name (see [`plural_noun`]) is already taken by a
    /// registered kind is a [`ServiceError::DuplicateKind`], as is the same
    /// kind registered twice.
    pub fn register(&self, descriptor: impl Into<KindDescriptor>) -> Result<()> {
        let descriptor = descriptor.into();
        let mut kinds = self.kinds.write().unwrap_or_else(PoisonError::into_inner);

        let accessor = plural_noun(descriptor.kind.name());
        if kinds
            .iter()
            .any(|d| d.kind == descriptor.kind || plural_noun(d.kind.name()) == accessor)
        {
            return Err(ServiceError::DuplicateKind {
                backend: self.base.clone(),
                kind: descriptor.kind.name().to_string(),
            });
        }

        debug!(
            base = %self.base,
            kind = descriptor.kind.name(),
            searchable = descriptor.searchable,
            collects = descriptor.collection_of.len(),
            "Registered object kind"
        );
        kinds.push(Arc::new(descriptor));
        Ok(())
    }

    /// Current kinds in trial order. Taken fresh on every call.
    pub fn kinds(&self) -> Vec<Kind> {
        self.snapshot().iter().map(|d| d.kind).collect()
    }

    pub fn contains(&self, kind: Kind) -> bool {
        self.descriptor(kind).is_some()
    }

    pub fn len(&self) -> usize {
        self.kinds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn descriptor(&self, kind: Kind) -> Option<Arc<KindDescriptor>> {
        self.kinds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|d| d.kind == kind)
            .cloned()
    }

    pub fn searchable_kinds(&self) -> Vec<Kind> {
        self.snapshot()
            .iter()
            .filter(|d| d.searchable)
            .map(|d| d.kind)
            .collect()
    }

    /// Copy of the descriptor list; the lock is released before any resolver runs.
    pub(crate) fn snapshot(&self) -> Vec<Arc<KindDescriptor>> {
        self.kinds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn require(&self, kind: Kind) -> Result<Arc<KindDescriptor>> {
        self.descriptor(kind).ok_or_else(|| ServiceError::UnknownKind {
            backend: self.base.clone(),
            kind: kind.name().to_string(),
        })
    }

    /// The "collects `item`" capability of this base.
    ///
    /// Memoized: the same `item` always yields the same `Arc`. `item` must be
    /// a kind registered here.
    pub fn collection_of_kind(&self, item: Kind) -> Result<Arc<CollectionCapability>> {
        if !self.contains(item) {
            return Err(ServiceError::NotAnObjectKind {
                base: self.base.clone(),
                kind: item.name().to_string(),
            });
        }

        let mut capabilities = self
            .capabilities
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let capability = capabilities
            .entry(item)
            .or_insert_with(|| Arc::new(CollectionCapability::new(&self.base, item)));

        Ok(Arc::clone(capability))
    }

    /// Layout registered for collection kind `T`.
    pub fn layout<T: Collect>(&self) -> Result<Arc<CollectionLayout<T>>> {
        let kind = Kind::of::<T>();
        let descriptor = self.require(kind)?;

        descriptor
            .layout
            .clone()
            .and_then(|layout| layout.downcast::<CollectionLayout<T>>().ok())
            .ok_or_else(|| {
                ServiceError::not_supported(format!("{} was registered without a collection layout", kind))
            })
    }
}

impl fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindRegistry")
            .field("base", &self.base)
            .field("kinds", &self.kinds())
            .finish()
    }
}
