#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Gateway to the remote document store.
//!
//! The portal treats its document database as an opaque collaborator: this
//! crate defines the [`DocumentStore`] contract, the versioned
//! [`Document`] envelope, and the single decode layer that turns raw
//! documents into canonical typed records ([`decode`]). Two adapters are
//! provided: [`MemoryStore`] for tests and deployments without a remote,
//! and [`RestStore`] for a JSON document API over HTTP.
//!
//! Every stored document carries a version; updates state the version they
//! were based on and fail with [`GatewayError::VersionConflict`] when it
//! has moved, so two near-simultaneous edits of the same entity can never
//! silently overwrite each other.

pub mod decode;
mod memory;
mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Collection names used by the portal.
pub mod collections {
    /// Geotagged map markers.
    pub const MARKERS: &str = "markers";
    /// Filed crime reports.
    pub const CRIME_REPORTS: &str = "crime-reports";
    /// Persisted drawn shapes.
    pub const SHAPES: &str = "shapes";
    /// News articles.
    pub const NEWS_ARTICLES: &str = "news-articles";
    /// Portal user accounts (memory-backed only).
    pub const USERS: &str = "users";
    /// Generic content items (memory-backed only).
    pub const CONTENT: &str = "content";
}

/// A stored document: id, monotonically increasing version, and the raw
/// JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Store-assigned id.
    pub id: String,
    /// Bumped by one on every successful update.
    pub version: u64,
    /// The document body.
    pub value: serde_json::Value,
}

/// Errors from document store operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The addressed document does not exist.
    #[error("Document not found: {collection}/{id}")]
    NotFound {
        /// Collection name.
        collection: String,
        /// Document id.
        id: String,
    },

    /// The document moved past the version the caller based its update on.
    /// Re-read and retry manually.
    #[error("Version conflict on {collection}/{id}: update was based on version {expected}")]
    VersionConflict {
        /// Collection name.
        collection: String,
        /// Document id.
        id: String,
        /// The version the caller expected.
        expected: u64,
    },

    /// The document API answered with a status the adapter does not
    /// understand.
    #[error("Unexpected response from document API: {status} for {url}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Request URL.
        url: String,
    },

    /// A raw document failed canonical decoding.
    #[error("Decode error: {0}")]
    Decode(#[from] decode::DecodeError),
}

/// Collection-scoped CRUD over the remote document store.
///
/// Reads that fail should be swallowed by callers to empty results (with a
/// log line); failed writes surface to the user and are retried manually.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores a new document and returns it with its assigned id and
    /// initial version.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the store rejects the write.
    async fn insert(
        &self,
        collection: &str,
        value: serde_json::Value,
    ) -> Result<Document, GatewayError>;

    /// Lists documents in a collection, up to `limit` when given.
    ///
    /// Ordering is the store's insertion order; there is no cursor — the
    /// limit is a plain fetch-size cap.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the read fails.
    async fn list(
        &self,
        collection: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Document>, GatewayError>;

    /// Fetches one document, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the read fails.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, GatewayError>;

    /// Replaces a document's value, guarded by the version the caller
    /// read.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::VersionConflict`] if the stored version no
    /// longer equals `expected_version`, [`GatewayError::NotFound`] if the
    /// document is gone, or another [`GatewayError`] on transport failure.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        value: serde_json::Value,
        expected_version: u64,
    ) -> Result<Document, GatewayError>;

    /// Deletes a document. Deleting a missing document succeeds (the
    /// operation is idempotent).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the delete fails.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), GatewayError>;
}
