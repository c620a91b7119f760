//! Gateway service - generic record orchestration
//!
//! One service handles create/read/update/delete/upsert for every registered
//! entity type. Dispatch is driven entirely by runtime entity-type names; the
//! registry, cache and ownership rules are wired once at construction and
//! immutable thereafter.

use super::injector::{InvariantInjector, OwnershipRule};
use super::registry::ModelRegistry;
use super::translate::translate;
use crate::config::Config;
use crate::contract::error::GatewayError;
use crate::contract::model::{
    ListQuery, Page, PageQuery, PaginationMeta, Projection, RequestContext,
};
use crate::infra::cache::RecordCache;
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_LIMIT: u64 = 10;

/// Generic, model-agnostic record access for every domain module
pub struct Gateway {
    registry: Arc<ModelRegistry>,
    cache: RecordCache,
    injector: InvariantInjector,
}

impl Gateway {
    /// Gateway with default configuration and the standard ownership rules
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self::with_config(registry, Config::default())
    }

    pub fn with_config(registry: Arc<ModelRegistry>, config: Config) -> Self {
        Self {
            registry,
            cache: RecordCache::new(config.cache_ttl),
            injector: InvariantInjector::standard(),
        }
    }

    /// Replace the standard ownership rules, for embedders with a custom
    /// entity set
    pub fn with_rules(mut self, rules: Vec<OwnershipRule>) -> Self {
        self.injector = InvariantInjector::new(rules);
        self
    }

    pub(crate) fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub(crate) fn cache(&self) -> &RecordCache {
        &self.cache
    }

    pub(crate) fn injector(&self) -> &InvariantInjector {
        &self.injector
    }

    // ===== Create =====

    /// Create a single record.
    ///
    /// Ownership fields are derived and verified before the insert; the
    /// cache for the entity type is invalidated after it.
    pub async fn create(
        &self,
        entity: &str,
        mut data: Value,
        projection: Projection,
        ctx: &RequestContext,
    ) -> Result<Value, GatewayError> {
        let store = self.registry.resolve(entity)?;
        self.injector.prepare_create(entity, &mut data, ctx)?;
        self.injector
            .verify_owner(&self.registry, entity, &data)
            .await?;
        let record = store
            .insert_one(data, &projection)
            .await
            .map_err(|e| translate(entity, None, e))?;
        self.cache.invalidate(entity);
        tracing::debug!(entity, "record created");
        Ok(record)
    }

    // ===== Read =====

    /// Read a record by id.
    ///
    /// Full-shape reads consult the cache first and populate it on a miss;
    /// projected reads bypass the cache entirely.
    pub async fn find_by_id(
        &self,
        entity: &str,
        id: &str,
        projection: Projection,
    ) -> Result<Option<Value>, GatewayError> {
        let store = self.registry.resolve(entity)?;

        if projection.is_empty() {
            if let Some(hit) = self.cache.get(entity, id) {
                return Ok(Some(hit));
            }
        }

        let record = store
            .find_by_id(id, &projection)
            .await
            .map_err(|e| translate(entity, Some(id), e))?;

        if projection.is_empty() {
            if let Some(record) = &record {
                self.cache.put(entity, id, record.clone());
            }
        }
        Ok(record)
    }

    /// List records matching a query; never touches the cache
    pub async fn find_many(
        &self,
        entity: &str,
        query: ListQuery,
    ) -> Result<Vec<Value>, GatewayError> {
        let store = self.registry.resolve(entity)?;
        store
            .find_many(&query)
            .await
            .map_err(|e| translate(entity, None, e))
    }

    /// List records plus navigation metadata, driven by skip/take.
    ///
    /// The page number in the metadata is derived as `skip / take + 1` for
    /// display only; the window itself is whatever skip/take the caller
    /// supplied.
    pub async fn find_many_with_meta(
        &self,
        entity: &str,
        query: ListQuery,
    ) -> Result<Page, GatewayError> {
        let store = self.registry.resolve(entity)?;
        let take = query.take.unwrap_or(DEFAULT_LIMIT);
        let skip = query.skip.unwrap_or(0);

        let (rows, total) = tokio::join!(store.find_many(&query), store.count(query.filter.as_ref()));
        let data = rows.map_err(|e| translate(entity, None, e))?;
        let total = total.map_err(|e| translate(entity, None, e))?;

        let page = if take == 0 { DEFAULT_PAGE } else { skip / take + 1 };
        Ok(Page {
            data,
            meta: PaginationMeta::compute(total, page, take),
        })
    }

    /// List records plus navigation metadata, driven by page/limit.
    ///
    /// Defaults `page = 1`, `limit = 10`; the window is
    /// `skip = (page - 1) * limit`. The list and count queries run
    /// concurrently.
    pub async fn find_many_paginated(
        &self,
        entity: &str,
        query: PageQuery,
    ) -> Result<Page, GatewayError> {
        let store = self.registry.resolve(entity)?;
        let page = query.page.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

        let list = ListQuery {
            filter: query.filter,
            order_by: query.order_by,
            skip: Some((page - 1) * limit),
            take: Some(limit),
            projection: query.projection,
        };
        let (rows, total) = tokio::join!(store.find_many(&list), store.count(list.filter.as_ref()));
        let data = rows.map_err(|e| translate(entity, None, e))?;
        let total = total.map_err(|e| translate(entity, None, e))?;

        Ok(Page {
            data,
            meta: PaginationMeta::compute(total, page, limit),
        })
    }

    /// Count records matching a filter
    pub async fn count(&self, entity: &str, filter: Option<Value>) -> Result<u64, GatewayError> {
        let store = self.registry.resolve(entity)?;
        store
            .count(filter.as_ref())
            .await
            .map_err(|e| translate(entity, None, e))
    }

    /// True when at least one record matches the filter
    pub async fn exists(&self, entity: &str, filter: Option<Value>) -> Result<bool, GatewayError> {
        Ok(self.count(entity, filter).await? > 0)
    }

    // ===== Update =====

    /// Update a record by id.
    ///
    /// The record's existence is verified first; a missing id fails with
    /// `NotFound` and no update is attempted.
    pub async fn update(
        &self,
        entity: &str,
        id: &str,
        data: Value,
        projection: Projection,
    ) -> Result<Value, GatewayError> {
        let store = self.registry.resolve(entity)?;
        let existing = store
            .find_by_id(id, &Projection::default())
            .await
            .map_err(|e| translate(entity, Some(id), e))?;
        if existing.is_none() {
            return Err(GatewayError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            });
        }

        let record = store
            .update_one(id, data, &projection)
            .await
            .map_err(|e| translate(entity, Some(id), e))?;
        self.cache.invalidate(entity);
        tracing::debug!(entity, id, "record updated");
        Ok(record)
    }

    /// Insert-or-update keyed by a filter
    pub async fn upsert(
        &self,
        entity: &str,
        filter: Value,
        create: Value,
        update: Value,
        projection: Projection,
    ) -> Result<Value, GatewayError> {
        let store = self.registry.resolve(entity)?;
        let record = store
            .upsert(&filter, create, update, &projection)
            .await
            .map_err(|e| translate(entity, None, e))?;
        self.cache.invalidate(entity);
        tracing::debug!(entity, "record upserted");
        Ok(record)
    }

    // ===== Delete =====

    /// Delete a record by id, with the same existence-check discipline as
    /// `update`
    pub async fn delete(
        &self,
        entity: &str,
        id: &str,
        projection: Projection,
    ) -> Result<Value, GatewayError> {
        let store = self.registry.resolve(entity)?;
        let existing = store
            .find_by_id(id, &Projection::default())
            .await
            .map_err(|e| translate(entity, Some(id), e))?;
        if existing.is_none() {
            return Err(GatewayError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            });
        }

        let record = store
            .delete_one(id, &projection)
            .await
            .map_err(|e| translate(entity, Some(id), e))?;
        self.cache.invalidate(entity);
        tracing::debug!(entity, id, "record deleted");
        Ok(record)
    }
}
