//! Singular relationship holder with lazy loading.

use crate::entity::EntityRef;
use crate::error::{LoadError, Result};
use crate::value::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Loads a related entity by key on first access.
///
/// Implemented by the session/repository layer; the holder only calls it.
pub trait LazyLoader: Send + Sync {
    /// Fetch the `target_entity` row identified by `key`.
    fn load(&self, target_entity: &'static str, key: &Value) -> Result<Option<EntityRef>>;
}

/// A related single entity (many-to-one or one-to-one).
///
/// This wrapper can be in one of three states:
/// - **Empty**: no relationship (`fk` is NULL, nothing loaded)
/// - **Unloaded**: has a key but the entity was not fetched yet
/// - **Loaded**: the entity (or NULL) was fetched or assigned
pub struct HasOne {
    target: &'static str,
    fk: Value,
    loaded: OnceLock<Option<EntityRef>>,
    loader: Option<Arc<dyn LazyLoader>>,
}

impl HasOne {
    /// Create an empty relationship.
    pub fn new(target: &'static str) -> Self {
        Self {
            target,
            fk: Value::Null,
            loaded: OnceLock::new(),
            loader: None,
        }
    }

    /// Create from a stored foreign key (not yet loaded).
    pub fn from_fk(target: &'static str, fk: impl Into<Value>) -> Self {
        Self {
            fk: fk.into(),
            ..Self::new(target)
        }
    }

    /// Create with an already-assigned entity.
    pub fn with_entity(target: &'static str, entity: Option<EntityRef>) -> Self {
        let mut rel = Self::new(target);
        rel.set(entity);
        rel
    }

    /// Attach the loader used by [`HasOne::resolve`].
    #[must_use]
    pub fn with_loader(mut self, loader: Arc<dyn LazyLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Assign the related entity, replacing any stored key.
    pub fn set(&mut self, entity: Option<EntityRef>) {
        self.fk = Value::Null;
        self.loaded = OnceLock::from(entity);
    }

    /// Related entity type name.
    pub fn target(&self) -> &'static str {
        self.target
    }

    /// Whether the entity was fetched or assigned (including NULL).
    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// The loaded entity, without loading.
    pub fn get(&self) -> Option<EntityRef> {
        self.loaded.get().cloned().flatten()
    }

    /// Raw stored value.
    ///
    /// An assigned entity without a stored key yields `Value::Default`: its key
    /// is only known once the storage layer wrote it.
    pub fn raw_value(&self) -> Value {
        match self.loaded.get() {
            Some(Some(_)) if self.fk.is_null() => Value::Default,
            Some(None) => Value::Null,
            Some(Some(_)) | None => self.fk.clone(),
        }
    }

    /// Return the related entity, loading it through the loader if needed.
    pub fn resolve(&self) -> Result<Option<EntityRef>> {
        if let Some(entity) = self.loaded.get() {
            return Ok(entity.clone());
        }
        if self.fk.is_null() {
            return Ok(self.loaded.get_or_init(|| None).clone());
        }
        let Some(loader) = &self.loader else {
            return Err(LoadError::new(
                self.target,
                "reference is not loaded and no loader is configured",
            )
            .into());
        };

        tracing::trace!(target_entity = self.target, key = ?self.fk, "Loading related entity");
        let entity = loader.load(self.target, &self.fk)?;
        // Readers may resolve concurrently; every caller gets the first stored handle.
        Ok(self.loaded.get_or_init(|| entity).clone())
    }
}

impl fmt::Debug for HasOne {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_loaded() {
            "loaded"
        } else if self.fk.is_null() {
            "empty"
        } else {
            "unloaded"
        };

        f.debug_struct("HasOne")
            .field("target", &self.target)
            .field("state", &state)
            .field("fk", &self.fk)
            .finish()
    }
}
