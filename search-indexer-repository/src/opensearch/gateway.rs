//! OpenSearch gateway implementation.
//!
//! This module provides the concrete implementation of `IndexServiceGateway`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use chrono::Utc;
use opensearch::{
    auth::Credentials,
    cluster::ClusterHealthParts,
    http::{
        request::JsonBody,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    BulkParts, OpenSearch,
};
use serde_json::Value;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::errors::SearchError;
use crate::interfaces::{IndexResponse, IndexServiceGateway};
use crate::opensearch::bulk;
use crate::opensearch::index_config::IndexConfig;
use crate::types::Batch;

/// OpenSearch gateway implementation.
///
/// Submits each batch as a single `_bulk` request against the configured index.
/// The underlying connection is created once in the constructor and reused for
/// every request.
///
/// # Example
///
/// ```ignore
/// use search_indexer_repository::opensearch::{IndexConfig, OpenSearchGateway};
/// let gateway = OpenSearchGateway::new("http://localhost:9200", IndexConfig::new("documents"))?;
/// let healthy = gateway.health_check().await?;
/// ```
pub struct OpenSearchGateway {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchGateway {
    /// Create a new OpenSearch gateway connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The target index and request settings
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchGateway)` - A new gateway instance
    /// * `Err(SearchError)` - If connection setup fails
    pub fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchError> {
        Self::build(url, index_config, None)
    }

    /// Create a new OpenSearch gateway that authenticates with basic credentials.
    pub fn with_basic_auth(
        url: &str,
        index_config: IndexConfig,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, SearchError> {
        let credentials = Credentials::Basic(username.into(), password.into());
        Self::build(url, index_config, Some(credentials))
    }

    fn build(
        url: &str,
        index_config: IndexConfig,
        credentials: Option<Credentials>,
    ) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .timeout(index_config.request_timeout);
        if let Some(credentials) = credentials {
            builder = builder.auth(credentials);
        }
        let transport = builder
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            index = %index_config.index_name,
            timeout_secs = index_config.request_timeout.as_secs(),
            "Created OpenSearch gateway"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    pub fn index_config(&self) -> &IndexConfig {
        &self.index_config
    }
}

#[async_trait]
impl IndexServiceGateway for OpenSearchGateway {
    /// Submit a batch as one bulk request.
    ///
    /// # Arguments
    ///
    /// * `batch` - The operations to apply
    ///
    /// # Returns
    ///
    /// * `Ok(IndexResponse)` - Per-document results parsed from the bulk response
    /// * `Err(SearchError)` - If the request could not be sent, was rejected as a whole,
    ///   or returned a malformed body
    #[instrument(skip_all, fields(index = %self.index_config.index_name, operations = batch.len()))]
    async fn index(&self, batch: &Batch) -> Result<IndexResponse, SearchError> {
        let body: Vec<JsonBody<Value>> = bulk::build_bulk_body(batch, Utc::now())
            .into_iter()
            .map(JsonBody::from)
            .collect();

        let response = self
            .client
            .bulk(BulkParts::Index(&self.index_config.index_name))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request was not authorized");
            return Err(SearchError::authentication(format!(
                "Bulk request rejected with status {}: {}",
                status, error_body
            )));
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchError::bulk_index(format!(
                "Bulk request failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let response = bulk::parse_bulk_response(&response_body)?;
        debug!(
            results = response.results().len(),
            partial = matches!(response, IndexResponse::PartialFailure(_)),
            "Bulk request completed"
        );
        Ok(response)
    }

    /// Check cluster health; green and yellow count as healthy.
    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let health: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;
        let status = health
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown");

        debug!(status = %status, "OpenSearch cluster health");
        Ok(status == "green" || status == "yellow")
    }
}
