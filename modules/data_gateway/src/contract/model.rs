//! Contract models for the data gateway
//!
//! These models are transport-agnostic and used for inter-module communication.
//! NO serde derives - these are pure domain types.

use super::error::GatewayError;
use serde_json::Value;

/// Result-shape modifier for reads and writes.
///
/// `include` takes precedence over `select` when both are supplied; the two
/// are never combined in a single storage query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    /// Field allow-list
    pub select: Option<Vec<String>>,
    /// Related-record expansion
    pub include: Option<Vec<String>>,
}

impl Projection {
    /// Projection selecting a subset of fields
    pub fn select<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            select: Some(fields.into_iter().map(Into::into).collect()),
            include: None,
        }
    }

    /// Projection expanding related records
    pub fn include<I, S>(relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            select: None,
            include: Some(relations.into_iter().map(Into::into).collect()),
        }
    }

    /// True when the caller requested no shaping at all
    pub fn is_empty(&self) -> bool {
        self.select.is_none() && self.include.is_none()
    }
}

/// Sort direction for `order_by`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Ordering clause for list queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortOrder,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortOrder::Desc,
        }
    }
}

/// Arguments for `find_many` and `find_many_with_meta`.
///
/// `filter` is an equality map; a value may also be an `{"in": [...]}` list.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filter: Option<Value>,
    pub order_by: Option<OrderBy>,
    pub skip: Option<u64>,
    pub take: Option<u64>,
    pub projection: Projection,
}

impl ListQuery {
    /// Query matching records against an equality filter
    pub fn filtered(filter: Value) -> Self {
        Self {
            filter: Some(filter),
            ..Default::default()
        }
    }
}

/// Page-driven arguments for `find_many_paginated`.
///
/// Defaults: `page = 1`, `limit = 10`.
#[derive(Debug, Clone, Default)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub filter: Option<Value>,
    pub order_by: Option<OrderBy>,
    pub projection: Projection,
}

/// Navigation metadata computed from a separate count query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationMeta {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PaginationMeta {
    /// Metadata for a window of `limit` records at `page` out of `total`
    pub fn compute(total: u64, page: u64, limit: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            total,
            page,
            limit,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

/// A page of records plus navigation metadata
#[derive(Debug, Clone)]
pub struct Page {
    pub data: Vec<Value>,
    pub meta: PaginationMeta,
}

/// One item of a bulk update call
#[derive(Debug, Clone)]
pub struct UpdateItem {
    pub id: String,
    pub data: Value,
}

impl UpdateItem {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Options for `create_bulk`
#[derive(Debug, Clone, Default)]
pub struct BulkCreateOptions {
    /// Silently omit rows that would violate a uniqueness constraint
    pub skip_duplicates: bool,
    pub projection: Projection,
}

/// Per-item failure inside a bulk operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkError {
    /// 0-based position of the item in the original input array
    pub index: usize,
    pub error: GatewayError,
    /// Original payload of the failing item
    pub data: Value,
}

/// Outcome of a bulk operation with explicit partial-failure reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkResult {
    /// True iff no item failed
    pub success: bool,
    /// Number of records successfully affected
    pub count: u64,
    /// Affected records; present only on the per-row path or when a
    /// projection was requested
    pub data: Option<Vec<Value>>,
    /// Per-item failures, correlated to 0-based input positions
    pub errors: Option<Vec<BulkError>>,
}

impl BulkResult {
    /// Assemble a result, normalizing an empty error list to absent
    pub fn from_parts(count: u64, data: Option<Vec<Value>>, errors: Vec<BulkError>) -> Self {
        Self {
            success: errors.is_empty(),
            count,
            data,
            errors: if errors.is_empty() { None } else { Some(errors) },
        }
    }
}

/// Caller identity as supplied by the upstream resolver layer.
///
/// Used only to fill in omitted ownership fields - never to authorize the
/// operation itself. Authorization is external.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Nested request shape (`request.user.id`)
    pub request: Option<RequestInfo>,
    /// Direct user shape (`user.id`)
    pub user: Option<UserRef>,
    /// Bare user-id field
    pub user_id: Option<String>,
}

/// Request envelope carried inside a `RequestContext`
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    pub user: Option<UserRef>,
}

/// Reference to an authenticated user
#[derive(Debug, Clone)]
pub struct UserRef {
    pub id: String,
}

impl RequestContext {
    /// Context with no caller identity
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context carrying a caller id in the nested request shape
    pub fn for_user(id: impl Into<String>) -> Self {
        Self {
            request: Some(RequestInfo {
                user: Some(UserRef { id: id.into() }),
            }),
            ..Default::default()
        }
    }

    /// Caller id, read in priority order: nested request user, direct user,
    /// bare user-id field.
    pub fn caller_id(&self) -> Option<&str> {
        if let Some(user) = self.request.as_ref().and_then(|r| r.user.as_ref()) {
            return Some(user.id.as_str());
        }
        if let Some(user) = self.user.as_ref() {
            return Some(user.id.as_str());
        }
        self.user_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_meta_interior_page() {
        let meta = PaginationMeta::compute(25, 3, 10);
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next_page);
        assert!(meta.has_prev_page);
    }

    #[test]
    fn test_pagination_meta_first_page() {
        let meta = PaginationMeta::compute(25, 1, 10);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next_page);
        assert!(!meta.has_prev_page);
    }

    #[test]
    fn test_pagination_meta_empty_result() {
        let meta = PaginationMeta::compute(0, 1, 10);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_prev_page);
    }

    #[test]
    fn test_caller_id_prefers_nested_request_user() {
        let ctx = RequestContext {
            request: Some(RequestInfo {
                user: Some(UserRef {
                    id: "nested".to_string(),
                }),
            }),
            user: Some(UserRef {
                id: "direct".to_string(),
            }),
            user_id: Some("bare".to_string()),
        };
        assert_eq!(ctx.caller_id(), Some("nested"));
    }

    #[test]
    fn test_caller_id_falls_back_in_order() {
        let ctx = RequestContext {
            request: None,
            user: Some(UserRef {
                id: "direct".to_string(),
            }),
            user_id: Some("bare".to_string()),
        };
        assert_eq!(ctx.caller_id(), Some("direct"));

        let ctx = RequestContext {
            user_id: Some("bare".to_string()),
            ..Default::default()
        };
        assert_eq!(ctx.caller_id(), Some("bare"));

        assert_eq!(RequestContext::anonymous().caller_id(), None);
    }

    #[test]
    fn test_bulk_result_normalizes_empty_errors() {
        let result = BulkResult::from_parts(2, None, Vec::new());
        assert!(result.success);
        assert!(result.errors.is_none());
    }
}
