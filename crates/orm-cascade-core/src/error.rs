//! Error types for cascade persistence.

use std::fmt;

/// The primary error type for all orm-cascade operations.
#[derive(Debug)]
pub enum Error {
    /// Cascade traversal refused the entity graph
    Cascade(CascadeError),
    /// Repository resolution, attachment, or lifecycle event failure
    Repository(RepositoryError),
    /// Entity metadata does not match the entity's values
    Metadata(MetadataError),
    /// Lazy loading of a relationship failed
    Load(LoadError),
    /// Custom error with message
    Custom(String),
}

/// Failures raised by the cascade queue builder itself.
///
/// These are modeling errors: retrying with the same graph produces the same
/// failure. The caller must restructure the graph or persist part of it first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeError {
    /// An owning-side relationship chain loops back to an entity that is still
    /// being expanded and has never been persisted.
    CycleDetected {
        /// Entity type that holds the closing relationship.
        entity: &'static str,
        /// Property that closes the cycle.
        property: &'static str,
    },
    /// Traversal nested deeper than the configured limit.
    DepthExceeded {
        /// Entity type at which the limit was hit.
        entity: &'static str,
        /// Configured maximum depth.
        depth: usize,
    },
}

impl CascadeError {
    /// Check if this is a persist cycle.
    #[must_use]
    pub const fn is_cycle(&self) -> bool {
        matches!(self, CascadeError::CycleDetected { .. })
    }
}

#[derive(Debug)]
pub struct RepositoryError {
    pub kind: RepositoryErrorKind,
    pub entity: &'static str,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryErrorKind {
    /// No repository is registered for the entity type
    NotFound,
    /// The repository rejected the entity
    Attach,
    /// A lifecycle hook or listener failed
    Event,
}

impl RepositoryError {
    /// No repository serves the given entity type.
    pub fn not_found(entity: &'static str) -> Self {
        Self {
            kind: RepositoryErrorKind::NotFound,
            entity,
            message: format!("no repository registered for entity '{}'", entity),
            source: None,
        }
    }

    /// A lifecycle hook or listener failed.
    pub fn event(entity: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: RepositoryErrorKind::Event,
            entity,
            message: message.into(),
            source: None,
        }
    }

    /// The repository refused to attach the entity.
    pub fn attach(entity: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: RepositoryErrorKind::Attach,
            entity,
            message: message.into(),
            source: None,
        }
    }

    /// Attach an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

/// Inconsistencies between static metadata and an entity's runtime values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    /// The entity has no property with this name.
    UnknownProperty {
        entity: &'static str,
        property: String,
    },
    /// A relationship operation was requested on a plain property.
    NotARelationship {
        entity: &'static str,
        property: &'static str,
    },
    /// The resolved value disagrees with the declared relationship kind.
    ValueKindMismatch {
        entity: &'static str,
        property: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

#[derive(Debug)]
pub struct LoadError {
    pub entity: &'static str,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl LoadError {
    /// Create a load error for the given target entity type.
    pub fn new(entity: &'static str, message: impl Into<String>) -> Self {
        Self {
            entity,
            message: message.into(),
            source: None,
        }
    }

    /// Attach an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl Error {
    /// Check if this error is a persist cycle.
    #[must_use]
    pub fn is_cycle(&self) -> bool {
        matches!(self, Error::Cascade(e) if e.is_cycle())
    }

    /// Get the cascade error, if this is one.
    #[must_use]
    pub fn as_cascade(&self) -> Option<&CascadeError> {
        match self {
            Error::Cascade(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Cascade(e) => write!(f, "{}", e),
            Error::Repository(e) => write!(f, "Repository error: {}", e),
            Error::Metadata(e) => write!(f, "Metadata error: {}", e),
            Error::Load(e) => write!(f, "Load error: {}", e),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Repository(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Load(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for CascadeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CascadeError::CycleDetected { entity, property } => write!(
                f,
                "Persist cycle detected in {}::{}. Use manual two phase persist.",
                entity, property
            ),
            CascadeError::DepthExceeded { entity, depth } => write!(
                f,
                "Cascade depth limit of {} exceeded at entity '{}'",
                depth, entity
            ),
        }
    }
}

impl std::error::Error for CascadeError {}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataError::UnknownProperty { entity, property } => {
                write!(f, "entity '{}' has no property '{}'", entity, property)
            }
            MetadataError::NotARelationship { entity, property } => {
                write!(f, "{}::{} is not a relationship", entity, property)
            }
            MetadataError::ValueKindMismatch {
                entity,
                property,
                expected,
                found,
            } => write!(
                f,
                "{}::{} declared as {} relationship but holds a {} value",
                entity, property, expected, found
            ),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load '{}': {}", self.entity, self.message)
    }
}

impl From<CascadeError> for Error {
    fn from(err: CascadeError) -> Self {
        Error::Cascade(err)
    }
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        Error::Repository(err)
    }
}

impl From<MetadataError> for Error {
    fn from(err: MetadataError) -> Self {
        Error::Metadata(err)
    }
}

impl From<LoadError> for Error {
    fn from(err: LoadError) -> Self {
        Error::Load(err)
    }
}

/// Result type alias for orm-cascade operations.
pub type Result<T> = std::result::Result<T, Error>;
