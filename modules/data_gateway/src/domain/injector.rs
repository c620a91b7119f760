//! Ownership invariants applied before create operations
//!
//! A small set of entity types carries a required ownership foreign key.
//! Before a create reaches the storage client, the input is normalized:
//! shorthand relation references are flattened, missing keys are derived
//! from the caller context, and - where configured - the referenced owner
//! record is verified to exist. All checks here are fail-fast and pre-write.

use super::registry::ModelRegistry;
use super::translate::translate;
use crate::contract::error::GatewayError;
use crate::contract::model::{ListQuery, Projection, RequestContext};
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};

/// Ownership derivation rule for one entity type
#[derive(Debug, Clone)]
pub struct OwnershipRule {
    /// Entity type the rule applies to
    pub entity: String,
    /// Relation name accepted in shorthand `connect` input
    pub relation: String,
    /// Flat foreign-key field the storage schema requires
    pub fk_field: String,
    /// Entity type the foreign key references
    pub owner_entity: String,
    /// Verify the referenced record exists before any write
    pub verify_owner: bool,
}

/// Standard rule set for the task-, comment- and project-like entity types
pub fn standard_rules() -> Vec<OwnershipRule> {
    vec![
        OwnershipRule {
            entity: "Task".to_string(),
            relation: "user".to_string(),
            fk_field: "user_id".to_string(),
            owner_entity: "User".to_string(),
            verify_owner: false,
        },
        OwnershipRule {
            entity: "Comment".to_string(),
            relation: "user".to_string(),
            fk_field: "user_id".to_string(),
            owner_entity: "User".to_string(),
            verify_owner: false,
        },
        OwnershipRule {
            entity: "Project".to_string(),
            relation: "owner".to_string(),
            fk_field: "owner_id".to_string(),
            owner_entity: "User".to_string(),
            verify_owner: true,
        },
    ]
}

/// Applies ownership rules to create inputs
pub struct InvariantInjector {
    rules: HashMap<String, OwnershipRule>,
}

impl InvariantInjector {
    pub fn new(rules: Vec<OwnershipRule>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|rule| (rule.entity.clone(), rule))
                .collect(),
        }
    }

    /// Injector carrying the standard rule set
    pub fn standard() -> Self {
        Self::new(standard_rules())
    }

    pub fn rule_for(&self, entity: &str) -> Option<&OwnershipRule> {
        self.rules.get(entity)
    }

    /// Normalize a create payload in place.
    ///
    /// When the flat foreign key is absent: a shorthand
    /// `{"<relation>": {"connect": {"id": X}}}` reference is flattened onto
    /// the key; failing that, the key is derived from the caller context.
    /// A key that is still absent fails with `ForeignKeyMissing` - no write
    /// is attempted. Payloads with the flat key already set pass through
    /// unchanged.
    pub fn prepare_create(
        &self,
        entity: &str,
        data: &mut Value,
        ctx: &RequestContext,
    ) -> Result<(), GatewayError> {
        let Some(rule) = self.rules.get(entity) else {
            return Ok(());
        };
        let Some(map) = data.as_object_mut() else {
            // Non-object payloads are left for storage-level validation.
            return Ok(());
        };

        if !map.contains_key(&rule.fk_field) {
            if let Some(id) = connect_id(map.get(&rule.relation)) {
                map.insert(rule.fk_field.clone(), Value::String(id));
                map.remove(&rule.relation);
            }
        }

        if !map.contains_key(&rule.fk_field) {
            if let Some(id) = ctx.caller_id() {
                tracing::debug!(entity, field = %rule.fk_field, "ownership derived from caller context");
                map.insert(rule.fk_field.clone(), Value::String(id.to_string()));
            }
        }

        if !map.contains_key(&rule.fk_field) {
            return Err(GatewayError::ForeignKeyMissing {
                entity: entity.to_string(),
                field: rule.fk_field.clone(),
            });
        }

        Ok(())
    }

    /// Owner-existence check for a single create
    pub async fn verify_owner(
        &self,
        registry: &ModelRegistry,
        entity: &str,
        data: &Value,
    ) -> Result<(), GatewayError> {
        let Some(rule) = self.rules.get(entity).filter(|r| r.verify_owner) else {
            return Ok(());
        };
        let Some(owner_id) = data.get(&rule.fk_field).and_then(Value::as_str) else {
            return Err(GatewayError::ForeignKeyMissing {
                entity: entity.to_string(),
                field: rule.fk_field.clone(),
            });
        };

        let store = registry.resolve(&rule.owner_entity)?;
        let owner = store
            .find_by_id(owner_id, &Projection::default())
            .await
            .map_err(|e| translate(&rule.owner_entity, Some(owner_id), e))?;
        if owner.is_none() {
            return Err(GatewayError::ForeignKeyMissing {
                entity: entity.to_string(),
                field: rule.fk_field.clone(),
            });
        }
        Ok(())
    }

    /// Batched owner-existence check across all distinct owner ids in a
    /// bulk input.
    ///
    /// Ownership is a precondition of the whole operation: one missing owner
    /// rejects the entire call before any row is written. Per-row data
    /// problems are not batched this way.
    pub async fn verify_owners_batch(
        &self,
        registry: &ModelRegistry,
        entity: &str,
        rows: &[Value],
    ) -> Result<(), GatewayError> {
        let Some(rule) = self.rules.get(entity).filter(|r| r.verify_owner) else {
            return Ok(());
        };

        let mut owner_ids = BTreeSet::new();
        for row in rows {
            if let Some(id) = row.get(&rule.fk_field).and_then(Value::as_str) {
                owner_ids.insert(id.to_string());
            }
        }
        if owner_ids.is_empty() {
            return Ok(());
        }

        let store = registry.resolve(&rule.owner_entity)?;
        let id_list: Vec<Value> = owner_ids.iter().cloned().map(Value::String).collect();
        let query = ListQuery::filtered(json!({ "id": { "in": id_list } }));
        let owners = store
            .find_many(&query)
            .await
            .map_err(|e| translate(&rule.owner_entity, None, e))?;

        let found: BTreeSet<&str> = owners
            .iter()
            .filter_map(|record| record.get("id").and_then(Value::as_str))
            .collect();
        for id in &owner_ids {
            if !found.contains(id.as_str()) {
                tracing::warn!(entity, owner = %id, "bulk create rejected: owner does not exist");
                return Err(GatewayError::ForeignKeyMissing {
                    entity: entity.to_string(),
                    field: rule.fk_field.clone(),
                });
            }
        }
        Ok(())
    }
}

fn connect_id(value: Option<&Value>) -> Option<String> {
    value?
        .get("connect")?
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthand_connect_is_flattened() {
        let injector = InvariantInjector::standard();
        let mut data = json!({"title": "x", "user": {"connect": {"id": "u9"}}});
        injector
            .prepare_create("Task", &mut data, &RequestContext::anonymous())
            .expect("prepare should succeed");
        assert_eq!(data["user_id"], "u9");
        assert!(data.get("user").is_none());
    }

    #[test]
    fn test_missing_key_derived_from_context() {
        let injector = InvariantInjector::standard();
        let mut data = json!({"title": "x"});
        injector
            .prepare_create("Task", &mut data, &RequestContext::for_user("u1"))
            .expect("prepare should succeed");
        assert_eq!(data["user_id"], "u1");
    }

    #[test]
    fn test_underivable_key_fails_fast() {
        let injector = InvariantInjector::standard();
        let mut data = json!({"title": "x"});
        let err = injector
            .prepare_create("Task", &mut data, &RequestContext::anonymous())
            .expect_err("prepare should fail");
        assert_eq!(
            err,
            GatewayError::ForeignKeyMissing {
                entity: "Task".to_string(),
                field: "user_id".to_string()
            }
        );
    }

    #[test]
    fn test_explicit_key_passes_through_unchanged() {
        let injector = InvariantInjector::standard();
        let mut data = json!({"title": "x", "user_id": "u2", "user": {"connect": {"id": "u9"}}});
        injector
            .prepare_create("Task", &mut data, &RequestContext::for_user("u1"))
            .expect("prepare should succeed");
        // The flat key wins; the shorthand is not rewritten over it.
        assert_eq!(data["user_id"], "u2");
        assert!(data.get("user").is_some());
    }

    #[test]
    fn test_unruled_entity_is_untouched() {
        let injector = InvariantInjector::standard();
        let mut data = json!({"email": "a@b.c"});
        injector
            .prepare_create("User", &mut data, &RequestContext::anonymous())
            .expect("prepare should succeed");
        assert_eq!(data, json!({"email": "a@b.c"}));
    }
}
