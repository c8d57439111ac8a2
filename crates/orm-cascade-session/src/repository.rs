//! Repositories and repository resolution.
//!
//! A repository owns the entities of one or more entity types: persisting an
//! entity attaches it to its repository and notifies it through lifecycle
//! events. The cascade builder only ever talks to repositories through a
//! [`RepositoryResolver`].

use orm_cascade_core::{EntityRef, LifecycleEvent, ObjectId, RepositoryError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Repository collaborator of the cascade builder.
pub trait Repository: Send + Sync {
    /// Repository name, for diagnostics.
    fn name(&self) -> &str;

    /// Entity types served by this repository.
    fn entity_names(&self) -> &[&'static str];

    /// Take ownership of the entity for the coming write.
    fn attach(&self, entity: &EntityRef) -> Result<()>;

    /// Notify the entity and any listeners of a lifecycle event.
    fn fire_event(&self, entity: &EntityRef, event: LifecycleEvent) -> Result<()>;
}

/// Maps entities to the repository that owns them.
pub trait RepositoryResolver {
    /// Repository owning the entity's type.
    fn repository_for(&self, entity: &EntityRef) -> Result<Arc<dyn Repository>>;
}

/// Listener invoked after the entity's own lifecycle hook.
pub type EventListener = Box<dyn FnMut(&EntityRef) -> Result<()> + Send>;

#[derive(Default)]
struct EventListeners {
    before_persist: Vec<EventListener>,
    after_persist: Vec<EventListener>,
}

impl EventListeners {
    fn fire(&mut self, entity: &EntityRef, event: LifecycleEvent) -> Result<()> {
        let listeners = match event {
            LifecycleEvent::BeforePersist => &mut self.before_persist,
            LifecycleEvent::AfterPersist => &mut self.after_persist,
        };
        for listener in listeners.iter_mut() {
            listener(entity)?;
        }
        Ok(())
    }
}

/// In-memory repository tracking attached entities.
///
/// Listeners must not call back into the repository that invokes them.
pub struct EntityRepository {
    name: String,
    entity_names: Vec<&'static str>,
    attached: Mutex<Vec<EntityRef>>,
    listeners: Mutex<EventListeners>,
}

impl EntityRepository {
    /// Create a repository serving the given entity types.
    pub fn new(name: impl Into<String>, entity_names: &[&'static str]) -> Self {
        Self {
            name: name.into(),
            entity_names: entity_names.to_vec(),
            attached: Mutex::new(Vec::new()),
            listeners: Mutex::new(EventListeners::default()),
        }
    }

    /// Register a callback fired after an entity's `BeforePersist` hook.
    ///
    /// The callback can abort the cascade by returning `Err`.
    pub fn on_before_persist(&self, f: impl FnMut(&EntityRef) -> Result<()> + Send + 'static) {
        self.lock_listeners().before_persist.push(Box::new(f));
    }

    /// Register a callback fired after an entity's `AfterPersist` hook.
    pub fn on_after_persist(&self, f: impl FnMut(&EntityRef) -> Result<()> + Send + 'static) {
        self.lock_listeners().after_persist.push(Box::new(f));
    }

    /// Attached entities in attachment order.
    pub fn attached(&self) -> Vec<EntityRef> {
        self.lock_attached().clone()
    }

    /// Whether the entity is attached.
    pub fn is_attached(&self, id: ObjectId) -> bool {
        self.lock_attached().iter().any(|e| e.id() == id)
    }

    /// Forget an entity. Returns whether it was attached.
    pub fn detach(&self, id: ObjectId) -> bool {
        let mut attached = self.lock_attached();
        let before = attached.len();
        attached.retain(|e| e.id() != id);
        attached.len() != before
    }

    fn lock_attached(&self) -> MutexGuard<'_, Vec<EntityRef>> {
        self.attached.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_listeners(&self) -> MutexGuard<'_, EventListeners> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Repository for EntityRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn entity_names(&self) -> &[&'static str] {
        &self.entity_names
    }

    fn attach(&self, entity: &EntityRef) -> Result<()> {
        let name = entity.entity_name();
        if !self.entity_names.contains(&name) {
            return Err(RepositoryError::attach(
                name,
                format!("repository '{}' does not serve this entity type", self.name),
            )
            .into());
        }

        let mut attached = self.lock_attached();
        if !attached.iter().any(|e| e == entity) {
            tracing::trace!(repository = %self.name, entity = name, id = %entity.id(), "Attaching entity");
            attached.push(entity.clone());
        }
        Ok(())
    }

    fn fire_event(&self, entity: &EntityRef, event: LifecycleEvent) -> Result<()> {
        tracing::trace!(
            repository = %self.name,
            id = %entity.id(),
            event = event.as_str(),
            "Firing lifecycle event"
        );
        entity.write().on_lifecycle_event(event)?;
        self.lock_listeners().fire(entity, event)
    }
}

impl std::fmt::Debug for EntityRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.lock_listeners();
        f.debug_struct("EntityRepository")
            .field("name", &self.name)
            .field("entity_names", &self.entity_names)
            .field("attached", &self.lock_attached().len())
            .field("before_persist", &listeners.before_persist.len())
            .field("after_persist", &listeners.after_persist.len())
            .finish()
    }
}

/// Resolver backed by an entity-name lookup table.
#[derive(Default)]
pub struct RepositoryRegistry {
    repositories: HashMap<&'static str, Arc<dyn Repository>>,
}

impl RepositoryRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a repository for every entity type it serves.
    ///
    /// A later registration for the same entity type replaces the earlier one.
    pub fn register(&mut self, repository: Arc<dyn Repository>) {
        for name in repository.entity_names() {
            self.repositories.insert(*name, Arc::clone(&repository));
        }
    }

    /// Builder-style [`RepositoryRegistry::register`].
    #[must_use]
    pub fn with(mut self, repository: Arc<dyn Repository>) -> Self {
        self.register(repository);
        self
    }

    /// Repository registered for an entity type.
    pub fn get(&self, entity_name: &str) -> Option<Arc<dyn Repository>> {
        self.repositories.get(entity_name).cloned()
    }

    /// Number of registered entity types.
    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    /// Whether no entity type is registered.
    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

impl RepositoryResolver for RepositoryRegistry {
    fn repository_for(&self, entity: &EntityRef) -> Result<Arc<dyn Repository>> {
        let name = entity.entity_name();
        self.get(name)
            .ok_or_else(|| RepositoryError::not_found(name).into())
    }
}

impl std::fmt::Debug for RepositoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.repositories.keys().collect();
        names.sort();
        f.debug_struct("RepositoryRegistry")
            .field("entities", &names)
            .finish()
    }
}
