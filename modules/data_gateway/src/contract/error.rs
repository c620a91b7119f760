//! Contract error types for the data gateway
//!
//! These errors are transport-agnostic and used for inter-module communication.

/// Data gateway domain errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Entity type is not registered in the model registry
    ModelNotFound {
        /// Entity-type name as supplied by the caller
        entity: String,
    },
    /// Required relational field absent, or referenced owner does not exist
    ForeignKeyMissing {
        /// Entity type the create targeted
        entity: String,
        /// Foreign-key field that is missing or references no record
        field: String,
    },
    /// Id-based lookup miss on update/delete
    NotFound {
        /// Entity type
        entity: String,
        /// Record identifier
        id: String,
    },
    /// Storage-level unique-constraint violation
    UniqueConstraint {
        entity: String,
        /// Field carrying the violated constraint
        field: String,
    },
    /// Storage-level required-field validation failure
    Validation {
        entity: String,
        /// Offending field, or "unknown" when the engine message is unrecognized
        field: String,
    },
    /// Any other storage failure, original engine message preserved
    Operation {
        entity: String,
        message: String,
    },
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModelNotFound { entity } => {
                write!(f, "Unknown entity type: {}", entity)
            }
            Self::ForeignKeyMissing { entity, field } => {
                write!(
                    f,
                    "{}: required foreign key '{}' is missing or references no record",
                    entity, field
                )
            }
            Self::NotFound { entity, id } => {
                write!(f, "{} not found: {}", entity, id)
            }
            Self::UniqueConstraint { entity, field } => {
                write!(f, "{}: unique constraint violated on field '{}'", entity, field)
            }
            Self::Validation { entity, field } => {
                write!(f, "{}: validation failed for field '{}'", entity, field)
            }
            Self::Operation { entity, message } => {
                write!(f, "{}: operation failed: {}", entity, message)
            }
        }
    }
}

impl std::error::Error for GatewayError {}
