//! Storage delegate traits for data access
//!
//! `EntityStore` is the uniform set of primitive operations the external
//! storage client provides per entity type. Implementations are wired into
//! the model registry at process start; the in-memory engine lives in
//! infra/storage/memory.rs.

use crate::contract::model::{ListQuery, Projection, UpdateItem};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Failure signals surfaced by a storage engine.
///
/// The domain layer translates these into the gateway error taxonomy;
/// engines never construct `GatewayError` directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// No record matched an id-based operation
    #[error("record not found")]
    NotFound,
    /// A uniqueness constraint was violated
    #[error("unique constraint violation on field `{field}`")]
    UniqueViolation { field: String },
    /// A required-field validation failed; the message names the field
    #[error("{message}")]
    Validation { message: String },
    /// Any other engine failure
    #[error("{0}")]
    Other(String),
}

/// Primitive storage operations for one entity type.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Insert a single record, returning it shaped by `projection`.
    async fn insert_one(&self, data: Value, projection: &Projection)
        -> Result<Value, StorageError>;

    /// Native batch insert covering all rows in one storage call.
    ///
    /// Not transactional: a mid-batch failure may leave earlier rows
    /// committed. Returns the number of rows written.
    async fn insert_many(&self, rows: Vec<Value>, skip_duplicates: bool)
        -> Result<u64, StorageError>;

    /// Insert all rows inside a single transaction.
    ///
    /// The returned vector holds one outcome per input row, in input order.
    /// If any outcome is an error the transaction is rolled back and no row
    /// is persisted. The outer error is reserved for catastrophic failures.
    async fn insert_many_atomic(
        &self,
        rows: Vec<Value>,
    ) -> Result<Vec<Result<Value, StorageError>>, StorageError>;

    /// Look up a record by id.
    async fn find_by_id(
        &self,
        id: &str,
        projection: &Projection,
    ) -> Result<Option<Value>, StorageError>;

    /// List records matching a query.
    async fn find_many(&self, query: &ListQuery) -> Result<Vec<Value>, StorageError>;

    /// Count records matching a filter.
    async fn count(&self, filter: Option<&Value>) -> Result<u64, StorageError>;

    /// Update a record by id; `NotFound` when the id does not exist.
    async fn update_one(
        &self,
        id: &str,
        data: Value,
        projection: &Projection,
    ) -> Result<Value, StorageError>;

    /// Native batch update. Rows whose id does not exist are skipped and
    /// not counted; returns the number of rows affected.
    async fn update_many(&self, items: Vec<UpdateItem>) -> Result<u64, StorageError>;

    /// Delete a record by id, returning the removed record shaped by
    /// `projection`; `NotFound` when the id does not exist.
    async fn delete_one(&self, id: &str, projection: &Projection)
        -> Result<Value, StorageError>;

    /// Native batch delete; ids without a record are skipped and not
    /// counted.
    async fn delete_many(&self, ids: &[String]) -> Result<u64, StorageError>;

    /// Combined insert-or-update keyed by `filter`.
    async fn upsert(
        &self,
        filter: &Value,
        create: Value,
        update: Value,
        projection: &Projection,
    ) -> Result<Value, StorageError>;
}
