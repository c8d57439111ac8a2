//! Persist plans: the finalized output of a cascade traversal.
//!
//! A plan is what the storage layer consumes. It lists entities and
//! collections in write order and, once the write succeeded, fires the
//! after-persist notifications.

use crate::cascade::CascadeQueueBuilder;
use crate::config::CascadeConfig;
use crate::queue::{CascadeQueue, QueuedItem};
use crate::repository::RepositoryResolver;
use orm_cascade_core::{CollectionRef, EntityRef, Error, LifecycleEvent, ObjectId, Result};
use serde::{Deserialize, Serialize};

/// Ordered write plan for one persist call.
#[derive(Debug, Clone)]
pub struct PersistPlan {
    items: Vec<QueuedItem>,
    config: CascadeConfig,
}

impl PersistPlan {
    /// Build the plan for persisting `root`.
    ///
    /// Any error aborts construction; no partial plan is returned.
    #[tracing::instrument(level = "debug", skip(resolver, config, root), fields(root = %root.id()))]
    pub fn build(
        resolver: &dyn RepositoryResolver,
        config: CascadeConfig,
        root: &EntityRef,
        with_cascade: bool,
    ) -> Result<Self> {
        let mut queue = CascadeQueue::new();
        CascadeQueueBuilder::with_config(resolver, config.clone()).enqueue(
            root,
            with_cascade,
            &mut queue,
        )?;
        Ok(Self::from_queue(queue, config))
    }

    /// Build one plan for persisting several roots, sharing a single queue.
    ///
    /// An entity reachable from more than one root is planned once.
    #[tracing::instrument(level = "debug", skip(resolver, config, roots), fields(roots = roots.len()))]
    pub fn build_all(
        resolver: &dyn RepositoryResolver,
        config: CascadeConfig,
        roots: &[EntityRef],
    ) -> Result<Self> {
        let mut queue = CascadeQueue::new();
        let mut builder = CascadeQueueBuilder::with_config(resolver, config.clone());
        for root in roots {
            builder.enqueue(root, true, &mut queue)?;
        }
        Ok(Self::from_queue(queue, config))
    }

    fn from_queue(queue: CascadeQueue, config: CascadeConfig) -> Self {
        debug_assert!(!queue.has_tentative(), "tentative entries after traversal");
        let plan = Self {
            items: queue.into_items(),
            config,
        };
        tracing::info!(
            entities = plan.entities().count(),
            collections = plan.collections().count(),
            "Persist plan built"
        );
        plan
    }

    /// Items in write order.
    pub fn items(&self) -> &[QueuedItem] {
        &self.items
    }

    /// Entities in write order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityRef> {
        self.items.iter().filter_map(QueuedItem::as_entity)
    }

    /// Collections in write order.
    pub fn collections(&self) -> impl Iterator<Item = &CollectionRef> {
        self.items.iter().filter_map(QueuedItem::as_collection)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there is nothing to write.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Position of an entity or collection in write order.
    pub fn position_of(&self, id: ObjectId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Consume the plan, returning its items.
    pub fn into_items(self) -> Vec<QueuedItem> {
        self.items
    }

    /// Fire `AfterPersist` for every planned entity.
    ///
    /// Call once the storage layer wrote the whole plan. Does nothing when
    /// lifecycle events are disabled.
    #[tracing::instrument(level = "debug", skip(self, resolver))]
    pub fn complete(&self, resolver: &dyn RepositoryResolver) -> Result<()> {
        if !self.config.fire_events {
            return Ok(());
        }
        for entity in self.entities() {
            let repository = resolver.repository_for(entity)?;
            repository.fire_event(entity, LifecycleEvent::AfterPersist)?;
        }
        tracing::info!(entities = self.entities().count(), "Persist plan completed");
        Ok(())
    }

    /// Serializable overview of the plan.
    pub fn summary(&self) -> PlanSummary {
        let order: Vec<PlanEntry> = self
            .items
            .iter()
            .map(|item| match item {
                QueuedItem::Entity(entity) => PlanEntry {
                    kind: PlanEntryKind::Entity,
                    name: entity.entity_name().to_string(),
                    id: entity.id(),
                },
                QueuedItem::Collection(collection) => PlanEntry {
                    kind: PlanEntryKind::Collection,
                    name: collection.target_entity().to_string(),
                    id: collection.id(),
                },
            })
            .collect();

        PlanSummary {
            entities: order
                .iter()
                .filter(|e| e.kind == PlanEntryKind::Entity)
                .count(),
            collections: order
                .iter()
                .filter(|e| e.kind == PlanEntryKind::Collection)
                .count(),
            order,
        }
    }

    /// Plan summary as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.summary())
            .map_err(|e| Error::Custom(format!("failed to serialize persist plan: {}", e)))
    }
}

/// Kind of a planned item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanEntryKind {
    Entity,
    Collection,
}

/// One planned item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub kind: PlanEntryKind,
    /// Entity type name; for collections, the member type.
    pub name: String,
    pub id: ObjectId,
}

/// Diagnostic overview of a [`PersistPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub entities: usize,
    pub collections: usize,
    pub order: Vec<PlanEntry>,
}
