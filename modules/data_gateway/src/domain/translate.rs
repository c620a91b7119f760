//! Translation of storage failure signals into the gateway error taxonomy

use super::repository::StorageError;
use crate::contract::error::GatewayError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches the field name in engine validation messages such as
/// "missing required value for field `title`" or
/// "null constraint on column `name`".
static FIELD_NAME: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?:field|column|argument)\s+`?(\w+)`?").ok());

fn field_from_message(message: &str) -> String {
    FIELD_NAME
        .as_ref()
        .and_then(|re| re.captures(message))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Map a storage failure onto the domain taxonomy.
///
/// `NotFound` signals from the engine translate to the same kind the gateway
/// raises from its own existence checks, so callers see a single "not found"
/// shape regardless of origin.
pub fn translate(entity: &str, id: Option<&str>, err: StorageError) -> GatewayError {
    match err {
        StorageError::NotFound => GatewayError::NotFound {
            entity: entity.to_string(),
            id: id.unwrap_or("unknown").to_string(),
        },
        StorageError::UniqueViolation { field } => GatewayError::UniqueConstraint {
            entity: entity.to_string(),
            field,
        },
        StorageError::Validation { message } => GatewayError::Validation {
            entity: entity.to_string(),
            field: field_from_message(&message),
        },
        StorageError::Other(message) => GatewayError::Operation {
            entity: entity.to_string(),
            message,
        },
    }
}
