//! Property and entity metadata.

use crate::relationship::RelationshipInfo;

/// Metadata about one entity property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyInfo {
    /// Property name
    pub name: &'static str,
    /// Whether the property accepts NULL
    pub nullable: bool,
    /// Relationship descriptor, `None` for scalar properties
    pub relationship: Option<RelationshipInfo>,
}

impl PropertyInfo {
    /// Create a scalar, non-nullable property.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            nullable: false,
            relationship: None,
        }
    }

    /// Create a relationship property.
    pub const fn relationship(name: &'static str, relationship: RelationshipInfo) -> Self {
        Self {
            name,
            nullable: false,
            relationship: Some(relationship),
        }
    }

    /// Set whether this property is nullable.
    pub const fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Relationship descriptor if persisting should cascade through this property.
    pub fn cascading_persist(&self) -> Option<&RelationshipInfo> {
        self.relationship.as_ref().filter(|rel| rel.cascades_persist())
    }
}

/// Static description of an entity type.
#[derive(Debug, Clone, Copy)]
pub struct EntityMetadata {
    /// Entity type name, used in diagnostics and repository lookup.
    pub entity_name: &'static str,
    /// Properties in declaration order.
    pub properties: &'static [PropertyInfo],
}

/// Cascading relationship properties split by foreign-key side.
///
/// Both lists keep declaration order.
#[derive(Debug, Clone, Default)]
pub struct CascadePartition {
    /// Properties whose foreign key lives on this entity.
    pub owning: Vec<&'static PropertyInfo>,
    /// Properties whose foreign key lives on the related entity or a join table.
    pub owned: Vec<&'static PropertyInfo>,
}

impl EntityMetadata {
    /// Create metadata for an entity type.
    pub const fn new(entity_name: &'static str, properties: &'static [PropertyInfo]) -> Self {
        Self {
            entity_name,
            properties,
        }
    }

    /// Find a property by name.
    pub fn property(&self, name: &str) -> Option<&'static PropertyInfo> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Split the persist-cascading relationships into owning and owned side.
    pub fn cascade_partition(&self) -> CascadePartition {
        let mut partition = CascadePartition::default();
        for property in self.properties {
            let Some(rel) = property.cascading_persist() else {
                continue;
            };
            if rel.stores_foreign_key() {
                partition.owning.push(property);
            } else {
                partition.owned.push(property);
            }
        }
        partition
    }
}
