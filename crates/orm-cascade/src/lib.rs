//! orm-cascade - cascade persistence ordering for object-relational mapping.
//!
//! Persisting one entity in an ORM usually means persisting a whole graph:
//! the author a new book points at, the tags attached to it, the chapters that
//! point back at it. orm-cascade computes which entities and collections take
//! part in such a write and the order in which a storage layer must write them
//! so that every foreign key refers to a row that already exists.
//!
//! - Entities referenced through owning-side relationships are written first
//! - Entities reached through owned-side relationships and collections follow
//! - Unsatisfiable owning-side cycles are rejected with a clear error
//!
//! # Quick Start
//!
//! ```ignore
//! use orm_cascade::prelude::*;
//!
//! const BOOK_PROPERTIES: &[PropertyInfo] = &[
//!     PropertyInfo::new("title"),
//!     PropertyInfo::relationship(
//!         "author",
//!         RelationshipInfo::new(RelationshipKind::ManyHasOne, "Author"),
//!     ),
//! ];
//! static BOOK: EntityMetadata = EntityMetadata::new("Book", BOOK_PROPERTIES);
//!
//! let registry = RepositoryRegistry::new()
//!     .with(Arc::new(EntityRepository::new("books", &["Book"])))
//!     .with(Arc::new(EntityRepository::new("authors", &["Author"])));
//!
//! let plan = PersistPlan::build(&registry, CascadeConfig::default(), &book, true)?;
//! assert!(plan.position_of(author.id()) < plan.position_of(book.id()));
//! ```

pub use orm_cascade_core::{
    CascadeError, CascadeOptions, CascadePartition, CollectionRef, Entity, EntityMetadata,
    EntityRef, Error, HasMany, HasOne, LazyLoader, LifecycleEvent, LoadError, MetadataError,
    ObjectId, PropertyInfo, RelationValue, RelationshipCollection, RelationshipInfo,
    RelationshipKind, RepositoryError, RepositoryErrorKind, Result, Value,
};
pub use orm_cascade_session::{
    CascadeConfig, CascadeQueue, CascadeQueueBuilder, EntityRepository, EventListener,
    PersistPlan, PlanEntry, PlanEntryKind, PlanSummary, QueueState, QueuedItem, Repository,
    RepositoryRegistry, RepositoryResolver,
};

/// Plan the persistence of `entity` and everything it cascades to.
///
/// Shorthand for [`PersistPlan::build`] with the default configuration.
pub fn plan_persist(resolver: &dyn RepositoryResolver, entity: &EntityRef) -> Result<PersistPlan> {
    PersistPlan::build(resolver, CascadeConfig::default(), entity, true)
}

/// Prelude module for convenient imports.
///
/// ```ignore
/// use orm_cascade::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CascadeConfig, CascadeError, CascadeOptions, CascadeQueue, CascadeQueueBuilder, Entity,
        EntityMetadata, EntityRef, EntityRepository, Error, HasMany, HasOne, LifecycleEvent,
        PersistPlan, PropertyInfo, RelationValue, RelationshipInfo, RelationshipKind, Repository,
        RepositoryRegistry, RepositoryResolver, Result, Value, plan_persist,
    };
}
