//! Model registry - runtime entity-type dispatch

use super::repository::EntityStore;
use crate::contract::error::GatewayError;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps entity-type names to their storage delegates.
///
/// Wired once at process start and immutable thereafter. Every gateway
/// operation resolves here before any side effect, so an unregistered name
/// fails without touching storage.
pub struct ModelRegistry {
    models: HashMap<String, Arc<dyn EntityStore>>,
}

impl ModelRegistry {
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::default()
    }

    /// Resolve an entity-type name to its delegate
    pub fn resolve(&self, entity: &str) -> Result<Arc<dyn EntityStore>, GatewayError> {
        self.models
            .get(entity)
            .cloned()
            .ok_or_else(|| GatewayError::ModelNotFound {
                entity: entity.to_string(),
            })
    }

    /// Whether an entity type is registered
    pub fn contains(&self, entity: &str) -> bool {
        self.models.contains_key(entity)
    }

    /// Registered entity-type names, sorted
    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Builder wiring delegates at startup
#[derive(Default)]
pub struct ModelRegistryBuilder {
    models: HashMap<String, Arc<dyn EntityStore>>,
}

impl ModelRegistryBuilder {
    pub fn register(mut self, entity: impl Into<String>, store: Arc<dyn EntityStore>) -> Self {
        self.models.insert(entity.into(), store);
        self
    }

    pub fn build(self) -> ModelRegistry {
        ModelRegistry {
            models: self.models,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_entity_fails_resolution() {
        let registry = ModelRegistry::builder().build();
        let err = match registry.resolve("Widget") {
            Err(e) => e,
            Ok(_) => panic!("expected resolution failure"),
        };
        assert_eq!(
            err,
            GatewayError::ModelNotFound {
                entity: "Widget".to_string()
            }
        );
    }
}
