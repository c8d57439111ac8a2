//! Cascade persistence for orm-cascade.
//!
//! `orm-cascade-session` is the **persist-ordering layer**. Given one entity to
//! persist, it discovers every entity and collection that must be written with
//! it and puts them in an order the storage layer can execute without
//! dangling foreign keys.
//!
//! # Role In The Architecture
//!
//! - **Cascade queue builder**: walks `cascade.persist` relationships, owning
//!   side first, and rejects unsatisfiable persist cycles.
//! - **Repositories**: entities are attached to their repository and notified
//!   of lifecycle events as they join the queue.
//! - **Persist plans**: the finalized, ordered output handed to storage.
//!
//! # Example
//!
//! ```ignore
//! let registry = RepositoryRegistry::new()
//!     .with(Arc::new(EntityRepository::new("books", &["Book"])))
//!     .with(Arc::new(EntityRepository::new("authors", &["Author"])));
//!
//! let plan = PersistPlan::build(&registry, CascadeConfig::default(), &book, true)?;
//! for item in plan.items() {
//!     storage.write(item)?;
//! }
//! plan.complete(&registry)?;
//! ```

pub mod cascade;
pub mod config;
pub mod plan;
pub mod queue;
pub mod repository;

pub use cascade::CascadeQueueBuilder;
pub use config::CascadeConfig;
pub use plan::{PersistPlan, PlanEntry, PlanEntryKind, PlanSummary};
pub use queue::{CascadeQueue, QueueState, QueuedItem};
pub use repository::{
    EntityRepository, EventListener, Repository, RepositoryRegistry, RepositoryResolver,
};
