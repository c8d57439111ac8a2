//! Entity trait and shared entity handles.
//!
//! Entities are identified by an [`ObjectId`] assigned when the handle is
//! created, never by their field values: two unsaved entities with equal
//! fields are still distinct rows to be written.
//!
//! # Example
//!
//! ```ignore
//! let author = EntityRef::new(Author::new("Ursula"));
//! let book = EntityRef::new(Book::new("The Dispossessed"));
//!
//! book.with_mut(|b: &mut Book| b.author.set(Some(author.clone())));
//! assert_eq!(book.entity_name(), "Book");
//! ```

use crate::collection::CollectionRef;
use crate::error::Result;
use crate::metadata::EntityMetadata;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an entity or relationship collection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocate a fresh identity.
    pub fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle points at which repositories notify entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// Fired once per entity when it first joins a cascade queue.
    BeforePersist,
    /// Fired after the storage layer wrote the entity.
    AfterPersist,
}

impl LifecycleEvent {
    /// Hook name as used by listeners.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LifecycleEvent::BeforePersist => "onBeforePersist",
            LifecycleEvent::AfterPersist => "onAfterPersist",
        }
    }
}

/// A resolved relationship value.
#[derive(Debug, Clone)]
pub enum RelationValue {
    /// The entity on the other side of a one-to-one or many-to-one.
    Single(EntityRef),
    /// The collection behind a one-to-many or many-to-many.
    Many(CollectionRef),
}

impl RelationValue {
    /// `"single"` or `"plural"`, for diagnostics.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            RelationValue::Single(_) => "single",
            RelationValue::Many(_) => "plural",
        }
    }
}

/// A domain object that can take part in cascade persistence.
///
/// Implementations expose their static metadata and a few accessors over
/// relationship properties. `raw_property` and `is_loaded` must never trigger
/// loading; `value` may, through whatever loader the entity holds.
pub trait Entity: Any + Send + Sync {
    /// Static metadata for this entity type.
    fn metadata(&self) -> &'static EntityMetadata;

    /// Whether this entity has ever been written to storage.
    fn is_persisted(&self) -> bool;

    /// Unresolved stored value of a property (a key, a list of keys, or NULL).
    fn raw_property(&self, name: &str) -> Value;

    /// Whether a relationship property has been materialized.
    fn is_loaded(&self, name: &str) -> bool;

    /// Resolve a relationship property, loading it if necessary.
    ///
    /// Returns `Ok(None)` for an empty singular relationship.
    fn value(&self, name: &str) -> Result<Option<RelationValue>>;

    /// Called before the entity is queued for persistence.
    fn before_persist(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called after the entity was written.
    fn after_persist(&mut self) -> Result<()> {
        Ok(())
    }
}

impl dyn Entity {
    /// Entity type name from metadata.
    pub fn entity_name(&self) -> &'static str {
        self.metadata().entity_name
    }

    /// Dispatch a lifecycle event to the matching hook.
    pub fn on_lifecycle_event(&mut self, event: LifecycleEvent) -> Result<()> {
        match event {
            LifecycleEvent::BeforePersist => self.before_persist(),
            LifecycleEvent::AfterPersist => self.after_persist(),
        }
    }
}

/// Shared handle to an entity.
///
/// Clones point at the same entity and share its [`ObjectId`].
#[derive(Clone)]
pub struct EntityRef {
    id: ObjectId,
    inner: Arc<RwLock<dyn Entity>>,
}

impl EntityRef {
    /// Wrap an entity in a new handle with a fresh identity.
    pub fn new<E: Entity>(entity: E) -> Self {
        Self {
            id: ObjectId::next(),
            inner: Arc::new(RwLock::new(entity)),
        }
    }

    /// Identity of this entity.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Acquire a read guard, recovering from a poisoned lock.
    pub fn read(&self) -> RwLockReadGuard<'_, dyn Entity> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire a write guard, recovering from a poisoned lock.
    pub fn write(&self) -> RwLockWriteGuard<'_, dyn Entity> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Entity type name.
    pub fn entity_name(&self) -> &'static str {
        self.read().entity_name()
    }

    /// Whether the entity has been written to storage.
    pub fn is_persisted(&self) -> bool {
        self.read().is_persisted()
    }

    /// Borrow the concrete entity, if it is an `E`.
    pub fn with<E: Entity, R>(&self, f: impl FnOnce(&E) -> R) -> Option<R> {
        let guard = self.read();
        let any: &dyn Any = &*guard;
        any.downcast_ref::<E>().map(f)
    }

    /// Mutably borrow the concrete entity, if it is an `E`.
    pub fn with_mut<E: Entity, R>(&self, f: impl FnOnce(&mut E) -> R) -> Option<R> {
        let mut guard = self.write();
        let any: &mut dyn Any = &mut *guard;
        any.downcast_mut::<E>().map(f)
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityRef {}

impl Hash for EntityRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("EntityRef");
        s.field("id", &self.id);
        // Debug may run while a writer holds the lock.
        match self.inner.try_read() {
            Ok(entity) => s
                .field("entity", &entity.entity_name())
                .field("persisted", &entity.is_persisted()),
            Err(_) => s.field("entity", &"<locked>"),
        };
        s.finish()
    }
}
