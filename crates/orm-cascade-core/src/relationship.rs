//! Relationship metadata.
//!
//! Relationships are declared statically on each entity type and describe
//! which side of a link stores the foreign key. The cascade builder relies on
//! that to decide what has to be written before an entity and what may follow
//! it.

use serde::{Deserialize, Serialize};

/// The type of relationship between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    /// One-to-one: `Author` has one `Profile`. Only the main side stores the key.
    OneHasOne,
    /// Many-to-one: many `Book`s belong to one `Publisher`.
    ManyHasOne,
    /// One-to-many: one `Publisher` has many `Book`s.
    OneHasMany,
    /// Many-to-many: `Book`s have many `Tag`s via a join table.
    ManyHasMany,
}

impl RelationshipKind {
    /// Whether the relationship resolves to a collection.
    #[must_use]
    pub const fn is_plural(self) -> bool {
        matches!(
            self,
            RelationshipKind::OneHasMany | RelationshipKind::ManyHasMany
        )
    }
}

/// Which lifecycle operations propagate across a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeOptions {
    /// Persisting the owner also persists the related entities.
    pub persist: bool,
    /// Removing the owner also removes the related entities.
    pub remove: bool,
}

impl CascadeOptions {
    /// Persist cascades, remove does not.
    pub const DEFAULT: Self = Self {
        persist: true,
        remove: false,
    };

    /// Nothing cascades.
    pub const NONE: Self = Self {
        persist: false,
        remove: false,
    };

    /// Everything cascades.
    pub const ALL: Self = Self {
        persist: true,
        remove: true,
    };
}

impl Default for CascadeOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Metadata about a relationship between entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipInfo {
    /// Kind of relationship.
    pub kind: RelationshipKind,

    /// Related entity type name.
    pub target_entity: &'static str,

    /// Property on the related entity that points back, if bidirectional.
    pub target_property: Option<&'static str>,

    /// For `OneHasOne`, whether this side stores the foreign key.
    pub is_main: bool,

    /// Cascade behavior.
    pub cascade: CascadeOptions,
}

impl RelationshipInfo {
    /// Create a new relationship with default cascade options.
    #[must_use]
    pub const fn new(kind: RelationshipKind, target_entity: &'static str) -> Self {
        Self {
            kind,
            target_entity,
            target_property: None,
            is_main: false,
            cascade: CascadeOptions::DEFAULT,
        }
    }

    /// Set the back-reference property on the target entity.
    #[must_use]
    pub const fn target_property(mut self, property: &'static str) -> Self {
        self.target_property = Some(property);
        self
    }

    /// Mark this side of a one-to-one as the side holding the key.
    #[must_use]
    pub const fn main(mut self, value: bool) -> Self {
        self.is_main = value;
        self
    }

    /// Set cascade options.
    #[must_use]
    pub const fn cascade(mut self, opts: CascadeOptions) -> Self {
        self.cascade = opts;
        self
    }

    /// Whether this side of the relationship stores the foreign key.
    ///
    /// True for the main side of a one-to-one and for many-to-one. Entities
    /// reached through such a property must be written first.
    #[must_use]
    pub const fn stores_foreign_key(&self) -> bool {
        match self.kind {
            RelationshipKind::OneHasOne => self.is_main,
            RelationshipKind::ManyHasOne => true,
            RelationshipKind::OneHasMany | RelationshipKind::ManyHasMany => false,
        }
    }

    /// Whether the relationship resolves to a collection.
    #[must_use]
    pub const fn is_plural(&self) -> bool {
        self.kind.is_plural()
    }

    /// Whether persisting the owner cascades into this relationship.
    #[must_use]
    pub const fn cascades_persist(&self) -> bool {
        self.cascade.persist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_key_side_classification() {
        let main = RelationshipInfo::new(RelationshipKind::OneHasOne, "Profile").main(true);
        let inverse = RelationshipInfo::new(RelationshipKind::OneHasOne, "Author");
        let many_one = RelationshipInfo::new(RelationshipKind::ManyHasOne, "Publisher");
        let one_many = RelationshipInfo::new(RelationshipKind::OneHasMany, "Book");
        let many_many = RelationshipInfo::new(RelationshipKind::ManyHasMany, "Tag").main(true);

        assert!(main.stores_foreign_key());
        assert!(!inverse.stores_foreign_key());
        assert!(many_one.stores_foreign_key());
        assert!(!one_many.stores_foreign_key());
        // is_main is meaningless outside one-to-one
        assert!(!many_many.stores_foreign_key());
    }

    #[test]
    fn test_plural_kinds() {
        assert!(!RelationshipKind::OneHasOne.is_plural());
        assert!(!RelationshipKind::ManyHasOne.is_plural());
        assert!(RelationshipKind::OneHasMany.is_plural());
        assert!(RelationshipKind::ManyHasMany.is_plural());
    }

    #[test]
    fn test_cascade_defaults() {
        let rel = RelationshipInfo::new(RelationshipKind::ManyHasOne, "Publisher");
        assert!(rel.cascades_persist());
        assert!(!rel.cascade.remove);

        let rel = rel.cascade(CascadeOptions::NONE);
        assert!(!rel.cascades_persist());

        let rel = rel.cascade(CascadeOptions::ALL);
        assert!(rel.cascades_persist() && rel.cascade.remove);
    }
}
