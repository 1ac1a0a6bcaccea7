//! HTTP adapter for a JSON document API.
//!
//! Speaks a minimal collection/document REST dialect:
//!
//! | operation | request |
//! |---|---|
//! | insert | `POST {base}/{collection}` |
//! | list   | `GET {base}/{collection}?limit=N` |
//! | get    | `GET {base}/{collection}/{id}` |
//! | update | `PUT {base}/{collection}/{id}` with `If-Match: {version}` |
//! | delete | `DELETE {base}/{collection}/{id}` |
//!
//! Responses carry [`Document`] JSON. A `412 Precondition Failed` on
//! update maps to [`GatewayError::VersionConflict`]; a `404` on get maps
//! to `None` and on delete to success.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::{Document, DocumentStore, GatewayError};

/// [`DocumentStore`] backed by a remote JSON document API.
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
}

impl RestStore {
    /// Creates an adapter for the document API at `base_url` (no trailing
    /// slash required).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{collection}", self.base_url)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.base_url)
    }
}

#[async_trait]
impl DocumentStore for RestStore {
    async fn insert(&self, collection: &str, value: Value) -> Result<Document, GatewayError> {
        let url = self.collection_url(collection);
        log::debug!("POST {url}");
        let response = self.client.post(&url).json(&value).send().await?;

        if !response.status().is_success() {
            return Err(GatewayError::UnexpectedStatus {
                status: response.status().as_u16(),
                url,
            });
        }
        Ok(response.json().await?)
    }

    async fn list(
        &self,
        collection: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Document>, GatewayError> {
        let url = self.collection_url(collection);
        log::debug!("GET {url} (limit {limit:?})");
        let mut request = self.client.get(&url);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(GatewayError::UnexpectedStatus {
                status: response.status().as_u16(),
                url,
            });
        }
        Ok(response.json().await?)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, GatewayError> {
        let url = self.document_url(collection, id);
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(GatewayError::UnexpectedStatus {
                status: response.status().as_u16(),
                url,
            });
        }
        Ok(Some(response.json().await?))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        value: Value,
        expected_version: u64,
    ) -> Result<Document, GatewayError> {
        let url = self.document_url(collection, id);
        let response = self
            .client
            .put(&url)
            .header("If-Match", expected_version.to_string())
            .json(&value)
            .send()
            .await?;

        match response.status() {
            StatusCode::PRECONDITION_FAILED => Err(GatewayError::VersionConflict {
                collection: collection.to_string(),
                id: id.to_string(),
                expected: expected_version,
            }),
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
            status if status.is_success() => Ok(response.json().await?),
            status => Err(GatewayError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            }),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), GatewayError> {
        let url = self.document_url(collection, id);
        let response = self.client.delete(&url).send().await?;

        // Deleting a document that is already gone is a success.
        if response.status() == StatusCode::NOT_FOUND || response.status().is_success() {
            return Ok(());
        }
        Err(GatewayError::UnexpectedStatus {
            status: response.status().as_u16(),
            url,
        })
    }
}
