//! Native client implementation - wraps the gateway service for in-process calls

use crate::contract::{
    BulkCreateOptions, BulkResult, DataGatewayApi, GatewayError, ListQuery, Page, PageQuery,
    Projection, RequestContext, UpdateItem,
};
use crate::domain::Gateway;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Native client that directly calls the gateway service
///
/// This client is used for in-process communication without HTTP overhead.
#[derive(Clone)]
pub struct NativeClient {
    gateway: Arc<Gateway>,
}

impl NativeClient {
    /// Create a new native client
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl DataGatewayApi for NativeClient {
    async fn create(
        &self,
        entity: &str,
        data: Value,
        projection: Projection,
        ctx: &RequestContext,
    ) -> Result<Value, GatewayError> {
        self.gateway.create(entity, data, projection, ctx).await
    }

    async fn create_bulk(
        &self,
        entity: &str,
        rows: Vec<Value>,
        options: BulkCreateOptions,
        ctx: &RequestContext,
    ) -> Result<BulkResult, GatewayError> {
        self.gateway.create_bulk(entity, rows, options, ctx).await
    }

    async fn create_bulk_atomic(
        &self,
        entity: &str,
        rows: Vec<Value>,
        ctx: &RequestContext,
    ) -> Result<BulkResult, GatewayError> {
        self.gateway.create_bulk_atomic(entity, rows, ctx).await
    }

    async fn find_by_id(
        &self,
        entity: &str,
        id: &str,
        projection: Projection,
    ) -> Result<Option<Value>, GatewayError> {
        self.gateway.find_by_id(entity, id, projection).await
    }

    async fn find_many(&self, entity: &str, query: ListQuery) -> Result<Vec<Value>, GatewayError> {
        self.gateway.find_many(entity, query).await
    }

    async fn find_many_with_meta(
        &self,
        entity: &str,
        query: ListQuery,
    ) -> Result<Page, GatewayError> {
        self.gateway.find_many_with_meta(entity, query).await
    }

    async fn find_many_paginated(
        &self,
        entity: &str,
        query: PageQuery,
    ) -> Result<Page, GatewayError> {
        self.gateway.find_many_paginated(entity, query).await
    }

    async fn count(&self, entity: &str, filter: Option<Value>) -> Result<u64, GatewayError> {
        self.gateway.count(entity, filter).await
    }

    async fn exists(&self, entity: &str, filter: Option<Value>) -> Result<bool, GatewayError> {
        self.gateway.exists(entity, filter).await
    }

    async fn update(
        &self,
        entity: &str,
        id: &str,
        data: Value,
        projection: Projection,
    ) -> Result<Value, GatewayError> {
        self.gateway.update(entity, id, data, projection).await
    }

    async fn update_bulk(
        &self,
        entity: &str,
        items: Vec<UpdateItem>,
        projection: Projection,
    ) -> Result<BulkResult, GatewayError> {
        self.gateway.update_bulk(entity, items, projection).await
    }

    async fn upsert(
        &self,
        entity: &str,
        filter: Value,
        create: Value,
        update: Value,
        projection: Projection,
    ) -> Result<Value, GatewayError> {
        self.gateway
            .upsert(entity, filter, create, update, projection)
            .await
    }

    async fn delete(
        &self,
        entity: &str,
        id: &str,
        projection: Projection,
    ) -> Result<Value, GatewayError> {
        self.gateway.delete(entity, id, projection).await
    }

    async fn delete_bulk(
        &self,
        entity: &str,
        ids: Vec<String>,
        projection: Projection,
    ) -> Result<BulkResult, GatewayError> {
        self.gateway.delete_bulk(entity, ids, projection).await
    }
}
