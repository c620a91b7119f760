//! Data Gateway Module
//!
//! Generic, model-agnostic record access for Meridian domain modules.
//! Every module creates, reads, updates, deletes and bulk-mutates records of
//! any registered entity type through one service, which enforces ownership
//! invariants, caches full-shape single-record reads, and gives callers
//! explicit partial-failure semantics for batch operations.

// Public exports
pub mod contract;
pub use contract::{
    client::DataGatewayApi, error::GatewayError, BulkCreateOptions, BulkError, BulkResult,
    ListQuery, OrderBy, Page, PageQuery, PaginationMeta, Projection, RequestContext, SortOrder,
    UpdateItem,
};

pub mod config;
pub use config::Config;

pub use api::native::NativeClient;
pub use domain::{EntityStore, Gateway, ModelRegistry, ModelRegistryBuilder, StorageError};

// Internal modules (hidden from public API)
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
