//! Bulk operations engine
//!
//! Two mutually exclusive execution strategies per call: a native batch when
//! the caller asked for no projection, and an ordered per-row loop that
//! recovers individual failures into the result object. Per-row results and
//! errors always reference the 0-based position of the item in the original
//! input, and every bulk call invalidates the cache for its entity type
//! exactly once.

use super::service::Gateway;
use super::translate::translate;
use crate::contract::error::GatewayError;
use crate::contract::model::{
    BulkCreateOptions, BulkError, BulkResult, ListQuery, Projection, RequestContext, UpdateItem,
};
use serde_json::{json, Value};

impl Gateway {
    /// Batch create with explicit partial-failure semantics.
    ///
    /// Per-row ownership-derivation failures are reported in
    /// `BulkResult.errors`; a missing owner record rejects the whole call
    /// before any write. Without a projection the remaining rows go through
    /// one native batch insert - the batch is NOT transactional, so a
    /// mid-batch storage failure escapes as an error and earlier rows may
    /// remain committed. With `skip_duplicates` the native path is used
    /// regardless, and a requested projection is materialized by a follow-up
    /// read keyed on the client-supplied row ids.
    pub async fn create_bulk(
        &self,
        entity: &str,
        rows: Vec<Value>,
        options: BulkCreateOptions,
        ctx: &RequestContext,
    ) -> Result<BulkResult, GatewayError> {
        let store = self.registry().resolve(entity)?;
        let (prepared, mut errors) = self.prepare_rows(entity, rows, ctx);

        let owner_rows: Vec<Value> = prepared.iter().map(|(_, row)| row.clone()).collect();
        self.injector()
            .verify_owners_batch(self.registry(), entity, &owner_rows)
            .await?;

        let result = if options.skip_duplicates {
            let batch: Vec<Value> = prepared.iter().map(|(_, row)| row.clone()).collect();
            let count = store
                .insert_many(batch, true)
                .await
                .map_err(|e| translate(entity, None, e))?;
            let data = if options.projection.is_empty() {
                None
            } else {
                let ids: Vec<Value> = prepared
                    .iter()
                    .filter_map(|(_, row)| row.get("id").cloned())
                    .collect();
                let query = ListQuery {
                    filter: Some(json!({ "id": { "in": ids } })),
                    projection: options.projection.clone(),
                    ..Default::default()
                };
                Some(
                    store
                        .find_many(&query)
                        .await
                        .map_err(|e| translate(entity, None, e))?,
                )
            };
            BulkResult::from_parts(count, data, errors)
        } else if options.projection.is_empty() {
            let batch: Vec<Value> = prepared.into_iter().map(|(_, row)| row).collect();
            let count = store
                .insert_many(batch, false)
                .await
                .map_err(|e| translate(entity, None, e))?;
            BulkResult::from_parts(count, None, errors)
        } else {
            let mut data = Vec::with_capacity(prepared.len());
            for (index, row) in prepared {
                match store.insert_one(row.clone(), &options.projection).await {
                    Ok(record) => data.push(record),
                    Err(e) => errors.push(BulkError {
                        index,
                        error: translate(entity, None, e),
                        data: row,
                    }),
                }
            }
            errors.sort_by_key(|e| e.index);
            BulkResult::from_parts(data.len() as u64, Some(data), errors)
        };

        self.cache().invalidate(entity);
        tracing::debug!(entity, count = result.count, "bulk create finished");
        Ok(result)
    }

    /// Batch create inside a single storage transaction.
    ///
    /// All-or-nothing: any row failure - including a pre-write derivation
    /// failure - rolls the whole batch back. The result then reports every
    /// failing row by original index with `count = 0`, and no row is
    /// persisted.
    pub async fn create_bulk_atomic(
        &self,
        entity: &str,
        rows: Vec<Value>,
        ctx: &RequestContext,
    ) -> Result<BulkResult, GatewayError> {
        let store = self.registry().resolve(entity)?;
        let (prepared, mut errors) = self.prepare_rows(entity, rows, ctx);

        let owner_rows: Vec<Value> = prepared.iter().map(|(_, row)| row.clone()).collect();
        self.injector()
            .verify_owners_batch(self.registry(), entity, &owner_rows)
            .await?;

        if !errors.is_empty() {
            errors.sort_by_key(|e| e.index);
            self.cache().invalidate(entity);
            return Ok(BulkResult {
                success: false,
                count: 0,
                data: None,
                errors: Some(errors),
            });
        }

        let batch: Vec<Value> = prepared.iter().map(|(_, row)| row.clone()).collect();
        let outcomes = store
            .insert_many_atomic(batch)
            .await
            .map_err(|e| translate(entity, None, e))?;

        let mut data = Vec::with_capacity(outcomes.len());
        for ((index, original), outcome) in prepared.into_iter().zip(outcomes) {
            match outcome {
                Ok(record) => data.push(record),
                Err(e) => errors.push(BulkError {
                    index,
                    error: translate(entity, None, e),
                    data: original,
                }),
            }
        }

        self.cache().invalidate(entity);
        if errors.is_empty() {
            tracing::debug!(entity, count = data.len(), "atomic bulk create committed");
            Ok(BulkResult::from_parts(data.len() as u64, Some(data), errors))
        } else {
            errors.sort_by_key(|e| e.index);
            tracing::debug!(entity, failures = errors.len(), "atomic bulk create rolled back");
            Ok(BulkResult {
                success: false,
                count: 0,
                data: None,
                errors: Some(errors),
            })
        }
    }

    /// Batch update with per-item payloads.
    ///
    /// Without a projection the items go through one native batch call and
    /// only the affected count is reported. With a projection each item is
    /// updated individually; per-item failures (including `NotFound`) are
    /// collected and execution continues.
    pub async fn update_bulk(
        &self,
        entity: &str,
        items: Vec<UpdateItem>,
        projection: Projection,
    ) -> Result<BulkResult, GatewayError> {
        let store = self.registry().resolve(entity)?;

        let result = if projection.is_empty() {
            let count = store
                .update_many(items)
                .await
                .map_err(|e| translate(entity, None, e))?;
            BulkResult::from_parts(count, None, Vec::new())
        } else {
            let mut data = Vec::with_capacity(items.len());
            let mut errors = Vec::new();
            for (index, item) in items.into_iter().enumerate() {
                match store.update_one(&item.id, item.data.clone(), &projection).await {
                    Ok(record) => data.push(record),
                    Err(e) => errors.push(BulkError {
                        index,
                        error: translate(entity, Some(&item.id), e),
                        data: item.data,
                    }),
                }
            }
            BulkResult::from_parts(data.len() as u64, Some(data), errors)
        };

        self.cache().invalidate(entity);
        tracing::debug!(entity, count = result.count, "bulk update finished");
        Ok(result)
    }

    /// Batch delete by id, with the same two execution strategies as
    /// `update_bulk`
    pub async fn delete_bulk(
        &self,
        entity: &str,
        ids: Vec<String>,
        projection: Projection,
    ) -> Result<BulkResult, GatewayError> {
        let store = self.registry().resolve(entity)?;

        let result = if projection.is_empty() {
            let count = store
                .delete_many(&ids)
                .await
                .map_err(|e| translate(entity, None, e))?;
            BulkResult::from_parts(count, None, Vec::new())
        } else {
            let mut data = Vec::with_capacity(ids.len());
            let mut errors = Vec::new();
            for (index, id) in ids.into_iter().enumerate() {
                match store.delete_one(&id, &projection).await {
                    Ok(record) => data.push(record),
                    Err(e) => errors.push(BulkError {
                        index,
                        error: translate(entity, Some(&id), e),
                        data: json!({ "id": id }),
                    }),
                }
            }
            BulkResult::from_parts(data.len() as u64, Some(data), errors)
        };

        self.cache().invalidate(entity);
        tracing::debug!(entity, count = result.count, "bulk delete finished");
        Ok(result)
    }

    /// Run ownership derivation over every row, splitting survivors from
    /// per-item failures. Indexes reference the original input positions.
    fn prepare_rows(
        &self,
        entity: &str,
        rows: Vec<Value>,
        ctx: &RequestContext,
    ) -> (Vec<(usize, Value)>, Vec<BulkError>) {
        let mut prepared = Vec::with_capacity(rows.len());
        let mut errors = Vec::new();
        for (index, mut row) in rows.into_iter().enumerate() {
            match self.injector().prepare_create(entity, &mut row, ctx) {
                Ok(()) => prepared.push((index, row)),
                Err(error) => errors.push(BulkError {
                    index,
                    error,
                    data: row,
                }),
            }
        }
        (prepared, errors)
    }
}
