//! Core types and traits for orm-cascade.
//!
//! This crate provides the entity model the cascade builder works against:
//!
//! - `Entity` trait and the shared `EntityRef` handle with stable identity
//! - `PropertyInfo` / `RelationshipInfo` static metadata
//! - `HasOne` / `HasMany` relationship holders with lazy loading
//! - `Error` types, including the persist-cycle failure

pub mod collection;
pub mod entity;
pub mod error;
pub mod metadata;
pub mod related;
pub mod relationship;
pub mod value;

pub use collection::{CollectionRef, HasMany, RelationshipCollection};
pub use entity::{Entity, EntityRef, LifecycleEvent, ObjectId, RelationValue};
pub use error::{
    CascadeError, Error, LoadError, MetadataError, RepositoryError, RepositoryErrorKind, Result,
};
pub use metadata::{CascadePartition, EntityMetadata, PropertyInfo};
pub use related::{HasOne, LazyLoader};
pub use relationship::{CascadeOptions, RelationshipInfo, RelationshipKind};
pub use value::Value;
