//! Raw stored values.
//!
//! A `Value` is what an entity holds for a relationship property before the
//! relationship is resolved: a foreign key, a list of keys, or NULL.

use serde::{Deserialize, Serialize};

/// Unresolved content of a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// No key stored.
    Null,

    /// Integer key
    BigInt(i64),

    /// String key (natural keys, UUID text)
    Text(String),

    /// One entry per member of a to-many relationship
    Array(Vec<Value>),

    /// Key that the storage layer generates on insert
    Default,
}

impl Value {
    /// Check if this value is NULL.
    ///
    /// `Default` is not NULL: a key will exist once the row is written.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}
