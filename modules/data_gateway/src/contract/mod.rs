//! Contract layer - public API for inter-module communication
//!
//! This layer contains transport-agnostic models, the gateway error taxonomy
//! and the native client trait. NO serde derives on models - these are pure
//! domain types.

pub mod client;
pub mod error;
pub mod model;

pub use client::DataGatewayApi;
pub use error::GatewayError;
pub use model::{
    BulkCreateOptions, BulkError, BulkResult, ListQuery, OrderBy, Page, PageQuery, PaginationMeta,
    Projection, RequestContext, RequestInfo, SortOrder, UpdateItem, UserRef,
};
