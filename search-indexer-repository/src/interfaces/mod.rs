//! Interface definitions for the batch indexing client's collaborators.
//!
//! These traits allow dependency injection and swappable backend implementations.

mod activity_queue_connector;
mod index_service_gateway;

pub use activity_queue_connector::ActivityQueueConnector;
pub use index_service_gateway::{IndexResponse, IndexServiceGateway};
