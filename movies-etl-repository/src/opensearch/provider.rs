//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate. The same REST surface is served by
//! Elasticsearch, so the provider works against either backend.

use async_trait::async_trait;
use movies_etl_shared::MovieDocument;
use opensearch::{
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkOperation, BulkParts, OpenSearch,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::IndexConfig;
use crate::types::{BatchOperationResult, BatchOperationSummary};

/// OpenSearch provider implementation.
///
/// # Example
///
/// ```ignore
/// use movies_etl_repository::opensearch::IndexConfig;
/// let config = IndexConfig::new("movies");
/// let provider = OpenSearchProvider::new("http://localhost:9200", config).await?;
///
/// provider.ensure_index_exists().await?;
/// let summary = provider.bulk_upsert_documents(&documents).await?;
/// assert!(summary.is_complete_success());
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// No request is sent here; an unreachable server surfaces on the first call.
    ///
    /// # Arguments
    ///
    /// * `url` - The server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index name and creation settings
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If the URL is invalid or transport setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::validation(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            index = %index_config.name,
            "Created OpenSearch provider"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Name of the index this provider writes to.
    pub fn index_name(&self) -> &str {
        &self.index_config.name
    }

    async fn create_index(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.index_config.name))
            .body(self.index_config.settings.clone())
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            // Another process may have created it between the check and the create.
            if error_body.contains("resource_already_exists_exception") {
                warn!(index = %self.index_config.name, "Index was created concurrently");
                return Ok(());
            }
            error!(status = %status, body = %error_body, "Index creation failed");
            return Err(SearchIndexError::index_creation(format!(
                "Create index failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %self.index_config.name, "Created search index");
        Ok(())
    }
}

/// Turn a bulk API response body into per-document outcomes.
///
/// Every entry of `items` holds exactly one action object (`index` here) with
/// the document `_id`, its `status`, and an `error` object when rejected.
pub(crate) fn parse_bulk_response(body: &Value) -> Result<BatchOperationSummary, SearchIndexError> {
    let items = body
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchIndexError::parse("Bulk response has no items array"))?;

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let outcome = item
            .as_object()
            .and_then(|actions| actions.values().next())
            .ok_or_else(|| SearchIndexError::parse(format!("Malformed bulk item: {}", item)))?;

        let document_id = outcome
            .get("_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let status = outcome.get("status").and_then(Value::as_u64).unwrap_or(0);

        let error = match outcome.get("error") {
            Some(err) if !err.is_null() => {
                let reason = err
                    .get("reason")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| err.to_string());
                let kind = err.get("type").and_then(Value::as_str).unwrap_or("error");
                Some(SearchIndexError::index(format!("{}: {}", kind, reason)))
            }
            _ if !(200..300).contains(&status) => Some(SearchIndexError::index(format!(
                "Document rejected with status {}",
                status
            ))),
            _ => None,
        };

        results.push(BatchOperationResult {
            document_id,
            success: error.is_none(),
            error,
        });
    }

    Ok(BatchOperationSummary::from_results(results))
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    /// Check for the index and create it with the configured settings when absent.
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[self.index_config.name.as_str()]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => {
                debug!(index = %self.index_config.name, "Search index already exists");
                Ok(())
            }
            404 => self.create_index().await,
            other => Err(SearchIndexError::index_creation(format!(
                "Unexpected status {} checking index {}",
                other, self.index_config.name
            ))),
        }
    }

    /// Write all documents in one bulk request.
    ///
    /// # Arguments
    ///
    /// * `documents` - Documents to insert or replace
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Per-document outcomes; rejected documents are
    ///   counted as failed, not returned as an error
    /// * `Err(SearchIndexError)` - `ConnectionError` if the server was unreachable,
    ///   `BulkIndexError` if the request as a whole was refused
    async fn bulk_upsert_documents(
        &self,
        documents: &[MovieDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::from_results(Vec::new()));
        }

        let operations: Vec<BulkOperation<&MovieDocument>> = documents
            .iter()
            .map(|doc| BulkOperation::index(doc).id(doc.document_id()).into())
            .collect();

        debug!(
            index = %self.index_config.name,
            documents = operations.len(),
            "Sending bulk request"
        );

        let response = self
            .client
            .bulk(BulkParts::Index(&self.index_config.name))
            .body(operations)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchIndexError::bulk_index(format!(
                "Bulk request failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;
        let summary = parse_bulk_response(&body)?;

        if summary.failed > 0 {
            warn!(
                index = %self.index_config.name,
                total = summary.total,
                failed = summary.failed,
                "Bulk request had rejected documents"
            );
        }

        Ok(summary)
    }
}
