//! Native client trait for inter-module communication
//!
//! This trait defines the generic record-access API that domain modules use.
//! The upstream API resolver maps external requests onto these calls.
//! NO HTTP - direct function calls for performance.

use super::error::GatewayError;
use super::model::{
    BulkCreateOptions, BulkResult, ListQuery, Page, PageQuery, Projection, RequestContext,
    UpdateItem,
};
use async_trait::async_trait;
use serde_json::Value;

/// Generic record access, one operation per verb, parameterized by
/// entity-type name.
#[async_trait]
pub trait DataGatewayApi: Send + Sync {
    // ===== Create =====

    /// Create a single record after ownership derivation
    async fn create(
        &self,
        entity: &str,
        data: Value,
        projection: Projection,
        ctx: &RequestContext,
    ) -> Result<Value, GatewayError>;

    /// Batch create; not transactional on the native batch path
    async fn create_bulk(
        &self,
        entity: &str,
        rows: Vec<Value>,
        options: BulkCreateOptions,
        ctx: &RequestContext,
    ) -> Result<BulkResult, GatewayError>;

    /// Batch create inside a single storage transaction (all-or-nothing)
    async fn create_bulk_atomic(
        &self,
        entity: &str,
        rows: Vec<Value>,
        ctx: &RequestContext,
    ) -> Result<BulkResult, GatewayError>;

    // ===== Read =====

    /// Read a record by id; full-shape reads are served from the cache
    /// within the TTL window
    async fn find_by_id(
        &self,
        entity: &str,
        id: &str,
        projection: Projection,
    ) -> Result<Option<Value>, GatewayError>;

    /// List records matching a query; never touches the cache
    async fn find_many(&self, entity: &str, query: ListQuery) -> Result<Vec<Value>, GatewayError>;

    /// List records plus navigation metadata, driven by skip/take
    async fn find_many_with_meta(
        &self,
        entity: &str,
        query: ListQuery,
    ) -> Result<Page, GatewayError>;

    /// List records plus navigation metadata, driven by page/limit
    async fn find_many_paginated(
        &self,
        entity: &str,
        query: PageQuery,
    ) -> Result<Page, GatewayError>;

    /// Count records matching a filter
    async fn count(&self, entity: &str, filter: Option<Value>) -> Result<u64, GatewayError>;

    /// True when at least one record matches the filter
    async fn exists(&self, entity: &str, filter: Option<Value>) -> Result<bool, GatewayError>;

    // ===== Update =====

    /// Update a record by id; fails with `NotFound` when absent
    async fn update(
        &self,
        entity: &str,
        id: &str,
        data: Value,
        projection: Projection,
    ) -> Result<Value, GatewayError>;

    /// Batch update with per-item payloads
    async fn update_bulk(
        &self,
        entity: &str,
        items: Vec<UpdateItem>,
        projection: Projection,
    ) -> Result<BulkResult, GatewayError>;

    /// Insert-or-update keyed by a filter
    async fn upsert(
        &self,
        entity: &str,
        filter: Value,
        create: Value,
        update: Value,
        projection: Projection,
    ) -> Result<Value, GatewayError>;

    // ===== Delete =====

    /// Delete a record by id; fails with `NotFound` when absent
    async fn delete(
        &self,
        entity: &str,
        id: &str,
        projection: Projection,
    ) -> Result<Value, GatewayError>;

    /// Batch delete by id
    async fn delete_bulk(
        &self,
        entity: &str,
        ids: Vec<String>,
        projection: Projection,
    ) -> Result<BulkResult, GatewayError>;
}
