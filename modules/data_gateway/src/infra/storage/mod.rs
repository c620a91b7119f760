//! Storage engines implementing the entity-store contract

pub mod memory;

pub use memory::{MemoryStorage, MemoryStore, RelationDef, TableSchema};
