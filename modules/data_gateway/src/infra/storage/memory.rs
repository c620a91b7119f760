//! In-memory storage engine
//!
//! Reference implementation of the entity-store contract, used for module
//! wiring in tests and single-process deployments. Tables hold plain JSON
//! rows behind a synchronous lock; every primitive operation also bumps a
//! per-entity op counter so tests can assert how many storage calls an
//! orchestration path issued.

use crate::contract::model::{ListQuery, Projection, SortOrder, UpdateItem};
use crate::domain::repository::{EntityStore, StorageError};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Relation declaration driving `include` expansion
#[derive(Debug, Clone)]
pub struct RelationDef {
    /// Relation name exposed to `include`
    pub name: String,
    /// Entity type of the related record
    pub entity: String,
    /// Foreign-key field on this entity holding the related id
    pub fk_field: String,
}

/// Per-entity schema knobs for the in-memory engine
#[derive(Debug, Clone, Default)]
pub struct TableSchema {
    pub unique_fields: Vec<String>,
    pub required_fields: Vec<String>,
    pub relations: Vec<RelationDef>,
}

#[derive(Default)]
struct Table {
    rows: Vec<Value>,
    schema: TableSchema,
}

/// Shared in-memory storage engine.
///
/// Hand out one `MemoryStore` delegate per entity type via [`define`].
///
/// [`define`]: MemoryStorage::define
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<HashMap<String, Table>>,
    op_counts: RwLock<HashMap<(String, String), u64>>,
}

impl MemoryStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Declare an entity table and return its delegate
    pub fn define(self: &Arc<Self>, entity: &str, schema: TableSchema) -> Arc<MemoryStore> {
        self.tables.write().insert(
            entity.to_string(),
            Table {
                rows: Vec::new(),
                schema,
            },
        );
        Arc::new(MemoryStore {
            entity: entity.to_string(),
            storage: Arc::clone(self),
        })
    }

    /// Number of times `op` ran against `entity`
    pub fn op_count(&self, entity: &str, op: &str) -> u64 {
        self.op_counts
            .read()
            .get(&(entity.to_string(), op.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Raw row count, bypassing the primitive-operation surface
    pub fn rows(&self, entity: &str) -> usize {
        self.tables
            .read()
            .get(entity)
            .map(|table| table.rows.len())
            .unwrap_or(0)
    }

    fn bump(&self, entity: &str, op: &str) {
        *self
            .op_counts
            .write()
            .entry((entity.to_string(), op.to_string()))
            .or_insert(0) += 1;
    }
}

/// Storage delegate for one entity type backed by `MemoryStorage`
pub struct MemoryStore {
    entity: String,
    storage: Arc<MemoryStorage>,
}

impl MemoryStore {
    fn with_table<T>(
        &self,
        f: impl FnOnce(&HashMap<String, Table>, &Table) -> T,
    ) -> Result<T, StorageError> {
        let tables = self.storage.tables.read();
        let table = tables
            .get(&self.entity)
            .ok_or_else(|| StorageError::Other(format!("no table for entity {}", self.entity)))?;
        Ok(f(&tables, table))
    }
}

// ===== Row-level helpers =====

fn row_id(row: &Value) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

fn matches(filter: Option<&Value>, row: &Value) -> bool {
    let Some(conditions) = filter.and_then(Value::as_object) else {
        return true;
    };
    conditions.iter().all(|(field, expected)| {
        let actual = row.get(field);
        match expected.as_object().and_then(|obj| obj.get("in")) {
            Some(Value::Array(options)) => actual.is_some_and(|a| options.contains(a)),
            _ => actual == Some(expected),
        }
    })
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Shape one row per the projection; `include` wins over `select`.
fn shape(tables: &HashMap<String, Table>, table: &Table, row: &Value, projection: &Projection) -> Value {
    if let Some(includes) = &projection.include {
        let mut shaped = row.clone();
        if let Some(map) = shaped.as_object_mut() {
            for name in includes {
                let Some(relation) = table.schema.relations.iter().find(|r| &r.name == name)
                else {
                    continue;
                };
                let related = row
                    .get(&relation.fk_field)
                    .and_then(Value::as_str)
                    .and_then(|fk| {
                        tables.get(&relation.entity).and_then(|target| {
                            target.rows.iter().find(|r| row_id(r) == Some(fk)).cloned()
                        })
                    });
                map.insert(name.clone(), related.unwrap_or(Value::Null));
            }
        }
        return shaped;
    }
    if let Some(select) = &projection.select {
        let mut shaped = Map::new();
        if let Some(map) = row.as_object() {
            for field in select {
                if let Some(value) = map.get(field) {
                    shaped.insert(field.clone(), value.clone());
                }
            }
        }
        return Value::Object(shaped);
    }
    row.clone()
}

/// Validate and normalize one row for insertion against a table.
fn admit_row(entity: &str, table: &Table, mut row: Value) -> Result<Value, StorageError> {
    let Some(map) = row.as_object_mut() else {
        return Err(StorageError::Validation {
            message: "record payload must be an object".to_string(),
        });
    };

    for field in &table.schema.required_fields {
        let missing = match map.get(field) {
            None => true,
            Some(value) => value.is_null(),
        };
        if missing {
            return Err(StorageError::Validation {
                message: format!("missing required value for field `{}` on {}", field, entity),
            });
        }
    }

    if !map.contains_key("id") {
        map.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
    }

    if let Some(id) = map.get("id").and_then(Value::as_str) {
        if table.rows.iter().any(|r| row_id(r) == Some(id)) {
            return Err(StorageError::UniqueViolation {
                field: "id".to_string(),
            });
        }
    }

    for field in &table.schema.unique_fields {
        if let Some(value) = map.get(field) {
            if table.rows.iter().any(|r| r.get(field) == Some(value)) {
                return Err(StorageError::UniqueViolation {
                    field: field.clone(),
                });
            }
        }
    }

    let now = Utc::now().to_rfc3339();
    map.entry("created_at".to_string())
        .or_insert_with(|| Value::String(now.clone()));
    map.insert("updated_at".to_string(), Value::String(now));

    Ok(row)
}

/// Merge an update payload into a row and re-stamp it.
fn apply_update(row: &mut Value, data: &Value) {
    if let (Some(target), Some(changes)) = (row.as_object_mut(), data.as_object()) {
        for (key, value) in changes {
            target.insert(key.clone(), value.clone());
        }
        target.insert(
            "updated_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn insert_one(
        &self,
        data: Value,
        projection: &Projection,
    ) -> Result<Value, StorageError> {
        self.storage.bump(&self.entity, "insert_one");
        let mut tables = self.storage.tables.write();
        let table = tables
            .get_mut(&self.entity)
            .ok_or_else(|| StorageError::Other(format!("no table for entity {}", self.entity)))?;
        let row = admit_row(&self.entity, table, data)?;
        table.rows.push(row.clone());
        let table = tables
            .get(&self.entity)
            .ok_or_else(|| StorageError::Other(format!("no table for entity {}", self.entity)))?;
        Ok(shape(&tables, table, &row, projection))
    }

    async fn insert_many(
        &self,
        rows: Vec<Value>,
        skip_duplicates: bool,
    ) -> Result<u64, StorageError> {
        self.storage.bump(&self.entity, "insert_many");
        let mut tables = self.storage.tables.write();
        let table = tables
            .get_mut(&self.entity)
            .ok_or_else(|| StorageError::Other(format!("no table for entity {}", self.entity)))?;
        let mut written = 0u64;
        for row in rows {
            match admit_row(&self.entity, table, row) {
                Ok(admitted) => {
                    table.rows.push(admitted);
                    written += 1;
                }
                Err(StorageError::UniqueViolation { .. }) if skip_duplicates => continue,
                // No transaction here: rows admitted so far stay committed.
                Err(err) => return Err(err),
            }
        }
        Ok(written)
    }

    async fn insert_many_atomic(
        &self,
        rows: Vec<Value>,
    ) -> Result<Vec<Result<Value, StorageError>>, StorageError> {
        self.storage.bump(&self.entity, "insert_many_atomic");
        let mut tables = self.storage.tables.write();
        let table = tables
            .get_mut(&self.entity)
            .ok_or_else(|| StorageError::Other(format!("no table for entity {}", self.entity)))?;

        let snapshot = table.rows.clone();
        let mut outcomes = Vec::with_capacity(rows.len());
        let mut failed = false;
        for row in rows {
            match admit_row(&self.entity, table, row) {
                Ok(admitted) => {
                    table.rows.push(admitted.clone());
                    outcomes.push(Ok(admitted));
                }
                Err(err) => {
                    failed = true;
                    outcomes.push(Err(err));
                }
            }
        }
        if failed {
            table.rows = snapshot;
        }
        Ok(outcomes)
    }

    async fn find_by_id(
        &self,
        id: &str,
        projection: &Projection,
    ) -> Result<Option<Value>, StorageError> {
        self.storage.bump(&self.entity, "find_one");
        self.with_table(|tables, table| {
            table
                .rows
                .iter()
                .find(|row| row_id(row) == Some(id))
                .map(|row| shape(tables, table, row, projection))
        })
    }

    async fn find_many(&self, query: &ListQuery) -> Result<Vec<Value>, StorageError> {
        self.storage.bump(&self.entity, "find_many");
        self.with_table(|tables, table| {
            let mut rows: Vec<&Value> = table
                .rows
                .iter()
                .filter(|row| matches(query.filter.as_ref(), row))
                .collect();
            if let Some(order) = &query.order_by {
                rows.sort_by(|a, b| {
                    let ordering = compare_values(
                        a.get(&order.field).unwrap_or(&Value::Null),
                        b.get(&order.field).unwrap_or(&Value::Null),
                    );
                    match order.direction {
                        SortOrder::Asc => ordering,
                        SortOrder::Desc => ordering.reverse(),
                    }
                });
            }
            rows.into_iter()
                .skip(query.skip.unwrap_or(0) as usize)
                .take(query.take.map(|t| t as usize).unwrap_or(usize::MAX))
                .map(|row| shape(tables, table, row, &query.projection))
                .collect()
        })
    }

    async fn count(&self, filter: Option<&Value>) -> Result<u64, StorageError> {
        self.storage.bump(&self.entity, "count");
        self.with_table(|_, table| {
            table.rows.iter().filter(|row| matches(filter, row)).count() as u64
        })
    }

    async fn update_one(
        &self,
        id: &str,
        data: Value,
        projection: &Projection,
    ) -> Result<Value, StorageError> {
        self.storage.bump(&self.entity, "update_one");
        let mut tables = self.storage.tables.write();
        let table = tables
            .get_mut(&self.entity)
            .ok_or_else(|| StorageError::Other(format!("no table for entity {}", self.entity)))?;

        if let Some(changes) = data.as_object() {
            for field in &table.schema.unique_fields {
                if let Some(value) = changes.get(field) {
                    if table
                        .rows
                        .iter()
                        .any(|r| r.get(field) == Some(value) && row_id(r) != Some(id))
                    {
                        return Err(StorageError::UniqueViolation {
                            field: field.clone(),
                        });
                    }
                }
            }
        }

        let position = table
            .rows
            .iter()
            .position(|row| row_id(row) == Some(id))
            .ok_or(StorageError::NotFound)?;
        apply_update(&mut table.rows[position], &data);
        let updated = table.rows[position].clone();
        let table = tables
            .get(&self.entity)
            .ok_or_else(|| StorageError::Other(format!("no table for entity {}", self.entity)))?;
        Ok(shape(&tables, table, &updated, projection))
    }

    async fn update_many(&self, items: Vec<UpdateItem>) -> Result<u64, StorageError> {
        self.storage.bump(&self.entity, "update_many");
        let mut tables = self.storage.tables.write();
        let table = tables
            .get_mut(&self.entity)
            .ok_or_else(|| StorageError::Other(format!("no table for entity {}", self.entity)))?;
        let mut affected = 0u64;
        for item in items {
            if let Some(position) = table.rows.iter().position(|row| row_id(row) == Some(item.id.as_str())) {
                apply_update(&mut table.rows[position], &item.data);
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn delete_one(
        &self,
        id: &str,
        projection: &Projection,
    ) -> Result<Value, StorageError> {
        self.storage.bump(&self.entity, "delete_one");
        let mut tables = self.storage.tables.write();
        let table = tables
            .get_mut(&self.entity)
            .ok_or_else(|| StorageError::Other(format!("no table for entity {}", self.entity)))?;
        let position = table
            .rows
            .iter()
            .position(|row| row_id(row) == Some(id))
            .ok_or(StorageError::NotFound)?;
        let removed = table.rows.remove(position);
        let table = tables
            .get(&self.entity)
            .ok_or_else(|| StorageError::Other(format!("no table for entity {}", self.entity)))?;
        Ok(shape(&tables, table, &removed, projection))
    }

    async fn delete_many(&self, ids: &[String]) -> Result<u64, StorageError> {
        self.storage.bump(&self.entity, "delete_many");
        let mut tables = self.storage.tables.write();
        let table = tables
            .get_mut(&self.entity)
            .ok_or_else(|| StorageError::Other(format!("no table for entity {}", self.entity)))?;
        let before = table.rows.len();
        table
            .rows
            .retain(|row| !row_id(row).is_some_and(|id| ids.iter().any(|target| target == id)));
        Ok((before - table.rows.len()) as u64)
    }

    async fn upsert(
        &self,
        filter: &Value,
        create: Value,
        update: Value,
        projection: &Projection,
    ) -> Result<Value, StorageError> {
        self.storage.bump(&self.entity, "upsert");
        let mut tables = self.storage.tables.write();
        let table = tables
            .get_mut(&self.entity)
            .ok_or_else(|| StorageError::Other(format!("no table for entity {}", self.entity)))?;

        let position = table
            .rows
            .iter()
            .position(|row| matches(Some(filter), row));
        let result = match position {
            Some(position) => {
                apply_update(&mut table.rows[position], &update);
                table.rows[position].clone()
            }
            None => {
                let row = admit_row(&self.entity, table, create)?;
                table.rows.push(row.clone());
                row
            }
        };
        let table = tables
            .get(&self.entity)
            .ok_or_else(|| StorageError::Other(format!("no table for entity {}", self.entity)))?;
        Ok(shape(&tables, table, &result, projection))
    }
}
