//! API layer - native in-process client

pub mod native;
