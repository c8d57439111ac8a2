//! Cascade queue construction.
//!
//! Persisting an entity also persists every entity reachable from it through
//! relationships declared with `cascade.persist`. The builder walks that graph
//! and fills a [`CascadeQueue`] in an order the storage layer can write without
//! dangling foreign keys:
//!
//! - entities referenced through owning-side relationships (the referencing
//!   entity stores the foreign key) come before the referencing entity
//! - entities reached through owned-side relationships come after it
//! - a collection comes after all of its members
//!
//! # Cycles
//!
//! An owning-side chain that loops back to an entity still being expanded
//! cannot be ordered: each entity needs the other's key first. Such a chain is
//! rejected with [`CascadeError::CycleDetected`] unless the looped-to entity
//! is already persisted. Callers break the loop by persisting part of the
//! graph in a separate call first (two-phase persist).

use crate::config::CascadeConfig;
use crate::queue::{CascadeQueue, QueuedItem};
use crate::repository::RepositoryResolver;
use orm_cascade_core::{
    CascadeError, EntityRef, LifecycleEvent, MetadataError, RelationValue, Result,
};

/// Builds cascade queues.
///
/// A builder can be reused across queues. It keeps only the current recursion
/// depth, which returns to zero after every top-level call.
pub struct CascadeQueueBuilder<'a> {
    resolver: &'a dyn RepositoryResolver,
    config: CascadeConfig,
    depth: usize,
}

impl<'a> CascadeQueueBuilder<'a> {
    /// Create a builder with the default configuration.
    pub fn new(resolver: &'a dyn RepositoryResolver) -> Self {
        Self::with_config(resolver, CascadeConfig::default())
    }

    /// Create a builder with a custom configuration.
    pub fn with_config(resolver: &'a dyn RepositoryResolver, config: CascadeConfig) -> Self {
        Self {
            resolver,
            config,
            depth: 0,
        }
    }

    /// Get the builder configuration.
    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Add an entity to the queue, cascading through its relationships.
    ///
    /// An entity already in the queue (finalized or still being expanded) is
    /// left alone. Otherwise it is attached to its repository and receives
    /// `BeforePersist` exactly once. With `with_cascade == false` the entity is
    /// queued on its own and no relationship is looked at.
    ///
    /// On error the queue is left partially filled and must be discarded.
    pub fn enqueue(
        &mut self,
        entity: &EntityRef,
        with_cascade: bool,
        queue: &mut CascadeQueue,
    ) -> Result<()> {
        if queue.contains(entity.id()) {
            return Ok(());
        }

        self.depth += 1;
        let result = self.enqueue_new(entity, with_cascade, queue);
        self.depth -= 1;
        result
    }

    fn enqueue_new(
        &mut self,
        entity: &EntityRef,
        with_cascade: bool,
        queue: &mut CascadeQueue,
    ) -> Result<()> {
        let metadata = entity.read().metadata();
        let entity_name = metadata.entity_name;

        if let Some(max_depth) = self.config.max_depth {
            if self.depth > max_depth {
                return Err(CascadeError::DepthExceeded {
                    entity: entity_name,
                    depth: max_depth,
                }
                .into());
            }
        }

        tracing::debug!(
            entity = entity_name,
            id = %entity.id(),
            depth = self.depth,
            with_cascade,
            "Enqueueing entity"
        );

        let repository = self.resolver.repository_for(entity)?;
        repository.attach(entity)?;
        if self.config.fire_events {
            repository.fire_event(entity, LifecycleEvent::BeforePersist)?;
        }

        if !with_cascade {
            queue.enqueue(QueuedItem::Entity(entity.clone()));
            return Ok(());
        }

        let partition = metadata.cascade_partition();

        // Visible to cycle checks while the owning side is expanded.
        queue.mark_tentative(entity);

        for property in &partition.owning {
            self.add_relation_to_queue(entity, property.name, true, queue)?;
        }

        queue.enqueue(QueuedItem::Entity(entity.clone()));

        for property in &partition.owned {
            self.add_relation_to_queue(entity, property.name, false, queue)?;
        }

        Ok(())
    }

    /// Expand one relationship property of `entity` into the queue.
    ///
    /// Properties that cannot have changed are skipped: a NULL reference on a
    /// persisted entity or in a nullable column, and relationships a persisted
    /// entity never loaded. Singular relationships recurse into the related
    /// entity; with `check_cycles` set, reaching an unsaved entity that is
    /// still being expanded fails. Plural relationships recurse into every
    /// member and then queue the collection itself.
    pub fn add_relation_to_queue(
        &mut self,
        entity: &EntityRef,
        property: &str,
        check_cycles: bool,
        queue: &mut CascadeQueue,
    ) -> Result<()> {
        // The guard must be gone before recursing: the graph may lead back here.
        let (entity_name, info, value) = {
            let guard = entity.read();
            let metadata = guard.metadata();
            let entity_name = metadata.entity_name;
            let info =
                metadata
                    .property(property)
                    .ok_or_else(|| MetadataError::UnknownProperty {
                        entity: entity_name,
                        property: property.to_string(),
                    })?;
            if info.relationship.is_none() {
                return Err(MetadataError::NotARelationship {
                    entity: entity_name,
                    property: info.name,
                }
                .into());
            }

            let persisted = guard.is_persisted();
            if guard.raw_property(info.name).is_null() && (info.nullable || persisted) {
                tracing::trace!(
                    entity = entity_name,
                    property = info.name,
                    "Skipping NULL relationship"
                );
                return Ok(());
            }
            if persisted && !guard.is_loaded(info.name) {
                tracing::trace!(
                    entity = entity_name,
                    property = info.name,
                    "Skipping unloaded relationship of persisted entity"
                );
                return Ok(());
            }

            (entity_name, info, guard.value(info.name)?)
        };

        let plural = info
            .relationship
            .as_ref()
            .is_some_and(|rel| rel.is_plural());

        match (plural, value) {
            (_, None) => Ok(()),
            (false, Some(RelationValue::Single(related))) => {
                if check_cycles {
                    let tentative = queue.is_tentative(related.id());
                    tracing::debug!(
                        entity = entity_name,
                        property = info.name,
                        related = %related.id(),
                        tentative,
                        "Checking for persist cycle"
                    );
                    if tentative && !related.is_persisted() {
                        tracing::warn!(
                            entity = entity_name,
                            property = info.name,
                            related = %related.id(),
                            "Persist cycle detected"
                        );
                        return Err(CascadeError::CycleDetected {
                            entity: entity_name,
                            property: info.name,
                        }
                        .into());
                    }
                }
                self.enqueue(&related, true, queue)
            }
            (true, Some(RelationValue::Many(collection))) => {
                for member in collection.entities_for_persistence() {
                    self.enqueue(&member, true, queue)?;
                }
                if !queue.contains(collection.id()) {
                    queue.enqueue(QueuedItem::Collection(collection));
                }
                Ok(())
            }
            (plural, Some(other)) => Err(MetadataError::ValueKindMismatch {
                entity: entity_name,
                property: info.name,
                expected: if plural { "plural" } else { "single" },
                found: other.shape(),
            }
            .into()),
        }
    }
}

impl std::fmt::Debug for CascadeQueueBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadeQueueBuilder")
            .field("config", &self.config)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}
