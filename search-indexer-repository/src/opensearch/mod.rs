//! OpenSearch implementation of the index service gateway.
//!
//! This module provides a concrete implementation of `IndexServiceGateway`
//! using the OpenSearch `_bulk` API as the backend.

mod bulk;
mod gateway;
mod index_config;

pub use gateway::OpenSearchGateway;
pub use index_config::IndexConfig;
