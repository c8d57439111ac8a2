//! Relationship collections (one-to-many and many-to-many).
//!
//! A collection is queued for persistence next to its members so the storage
//! layer can write join rows or collection-level state once the members have
//! keys.

use crate::entity::{EntityRef, ObjectId};
use crate::value::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The collection side of a plural relationship.
pub trait RelationshipCollection: Send + Sync {
    /// Entity type of the members.
    fn target_entity(&self) -> &'static str;

    /// Members that must take part in persistence, in natural order.
    fn entities_for_persistence(&self) -> Vec<EntityRef>;
}

/// Shared handle to a relationship collection.
///
/// Identity is assigned at creation and shared by clones, like [`EntityRef`].
#[derive(Clone)]
pub struct CollectionRef {
    id: ObjectId,
    inner: Arc<dyn RelationshipCollection>,
}

impl CollectionRef {
    /// Wrap a collection in a new handle with a fresh identity.
    pub fn new(inner: Arc<dyn RelationshipCollection>) -> Self {
        Self {
            id: ObjectId::next(),
            inner,
        }
    }

    /// Identity of this collection.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Entity type of the members.
    pub fn target_entity(&self) -> &'static str {
        self.inner.target_entity()
    }

    /// Members that must take part in persistence.
    pub fn entities_for_persistence(&self) -> Vec<EntityRef> {
        self.inner.entities_for_persistence()
    }
}

impl PartialEq for CollectionRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CollectionRef {}

impl fmt::Debug for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionRef")
            .field("id", &self.id)
            .field("target", &self.inner.target_entity())
            .finish()
    }
}

#[derive(Default)]
struct MembersState {
    loaded: Option<Vec<EntityRef>>,
    added: Vec<EntityRef>,
    removed: Vec<EntityRef>,
}

struct Members {
    target: &'static str,
    state: RwLock<MembersState>,
}

impl Members {
    fn read(&self) -> RwLockReadGuard<'_, MembersState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MembersState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MembersState {
    fn is_touched(&self) -> bool {
        self.loaded.is_some() || !self.added.is_empty() || !self.removed.is_empty()
    }

    fn current(&self) -> Vec<EntityRef> {
        let removed: HashSet<ObjectId> = self.removed.iter().map(EntityRef::id).collect();
        let mut seen = HashSet::new();
        self.loaded
            .iter()
            .flatten()
            .chain(self.added.iter())
            .filter(|e| !removed.contains(&e.id()) && seen.insert(e.id()))
            .cloned()
            .collect()
    }
}

impl RelationshipCollection for Members {
    fn target_entity(&self) -> &'static str {
        self.target
    }

    fn entities_for_persistence(&self) -> Vec<EntityRef> {
        self.read().current()
    }
}

/// Collection holder for one-to-many and many-to-many properties.
///
/// This wrapper can be in one of two states:
/// - **Untouched**: never loaded and never modified
/// - **Loaded**: members fetched, or added/removed locally
///
/// Added and removed members are tracked separately so the storage layer can
/// emit join-row inserts and deletes.
#[derive(Clone)]
pub struct HasMany {
    members: Arc<Members>,
    handle: CollectionRef,
}

impl HasMany {
    /// Create an untouched collection of `target` entities.
    pub fn new(target: &'static str) -> Self {
        let members = Arc::new(Members {
            target,
            state: RwLock::new(MembersState::default()),
        });
        let handle = CollectionRef::new(members.clone());
        Self { members, handle }
    }

    /// Create a collection with already-fetched members.
    pub fn with_loaded(target: &'static str, loaded: Vec<EntityRef>) -> Self {
        let collection = Self::new(target);
        collection.set_loaded(loaded);
        collection
    }

    /// Set the fetched members (used by the loading layer).
    pub fn set_loaded(&self, loaded: Vec<EntityRef>) {
        self.members.write().loaded = Some(loaded);
    }

    /// Add a member. Re-adding a removed member cancels the removal.
    pub fn add(&self, entity: &EntityRef) {
        let mut state = self.members.write();
        if let Some(pos) = state.removed.iter().position(|e| e == entity) {
            state.removed.remove(pos);
            return;
        }
        let already = state.loaded.iter().flatten().any(|e| e == entity)
            || state.added.iter().any(|e| e == entity);
        if !already {
            state.added.push(entity.clone());
        }
    }

    /// Remove a member. Removing a pending addition cancels it.
    pub fn remove(&self, entity: &EntityRef) {
        let mut state = self.members.write();
        if let Some(pos) = state.added.iter().position(|e| e == entity) {
            state.added.remove(pos);
            return;
        }
        let is_loaded_member = state.loaded.iter().flatten().any(|e| e == entity);
        if is_loaded_member && !state.removed.iter().any(|e| e == entity) {
            state.removed.push(entity.clone());
        }
    }

    /// Whether the collection was fetched or modified.
    pub fn is_loaded(&self) -> bool {
        self.members.read().is_touched()
    }

    /// Current members: fetched ones not removed, then additions.
    pub fn members(&self) -> Vec<EntityRef> {
        self.members.read().current()
    }

    /// Members added since load.
    pub fn added(&self) -> Vec<EntityRef> {
        self.members.read().added.clone()
    }

    /// Members removed since load.
    pub fn removed(&self) -> Vec<EntityRef> {
        self.members.read().removed.clone()
    }

    /// Raw stored value: NULL when untouched, otherwise one key slot per member.
    ///
    /// Member keys are assigned by the storage layer, so each slot is
    /// `Value::Default`.
    pub fn raw_value(&self) -> Value {
        let state = self.members.read();
        if !state.is_touched() {
            return Value::Null;
        }
        Value::Array(vec![Value::Default; state.current().len()])
    }

    /// Handle to queue alongside the members.
    pub fn collection(&self) -> CollectionRef {
        self.handle.clone()
    }
}

impl fmt::Debug for HasMany {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.members.read();
        f.debug_struct("HasMany")
            .field("id", &self.handle.id())
            .field("target", &self.members.target)
            .field("loaded", &state.loaded.as_ref().map(Vec::len))
            .field("added", &state.added.len())
            .field("removed", &state.removed.len())
            .finish()
    }
}
