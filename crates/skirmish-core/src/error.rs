//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

use crate::snapshot::Lifecycle;

/// Top-level domain error type.
///
/// Every variant is a programmer error in a correctly wired simulation:
/// expected outcomes such as insufficient resource are modelled as values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// The entity id was never registered.
    #[error("entity not found: {0}")]
    EntityNotFound(Uuid),

    /// The entity was registered once but has since been removed.
    #[error("entity removed: {0}")]
    EntityRemoved(Uuid),

    /// An entity with this id is already registered.
    #[error("entity already registered: {0}")]
    DuplicateEntity(Uuid),

    /// The entity exists but its lifecycle state forbids the operation.
    #[error("cannot {operation} entity {entity_id} while {lifecycle:?}")]
    InvalidLifecycle {
        /// The entity the operation targeted.
        entity_id: Uuid,
        /// The lifecycle state it was in.
        lifecycle: Lifecycle,
        /// The rejected operation.
        operation: &'static str,
    },

    /// A validation error in domain logic or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// A required collaborator was never provided.
    #[error("missing required collaborator: {0}")]
    MissingCollaborator(&'static str),
}
