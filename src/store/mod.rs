//! Content store - where posts come from
//!
//! The generator only needs two operations from the content repository:
//! list every document of a type, and fetch one document by uid. Both are
//! captured by [`ContentStore`]; [`PrismicClient`] talks to the real API,
//! [`LocalStore`] reads exported JSON documents from disk and [`MemoryStore`]
//! keeps them in memory.

mod local;
mod prismic;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub use local::LocalStore;
pub use prismic::PrismicClient;

use crate::config::PrismicConfig;

/// Errors raised at the content store boundary
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} responded with status {status}")]
    Status { status: u16, url: String },

    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("repository has no master ref")]
    MissingMasterRef,

    #[error("invalid document {id}: {reason}")]
    InvalidDocument { id: String, reason: String },

    #[error("no content endpoint configured (set prismic.endpoint or PRISMIC_API_ENDPOINT)")]
    NotConfigured,
}

/// A raw document as stored in the content repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Read-only access to the content repository
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// All documents of the given custom type
    async fn query_by_type(&self, doc_type: &str) -> Result<Vec<Document>, StoreError>;

    /// The document of the given type with the given uid, if any
    async fn get_by_uid(&self, doc_type: &str, uid: &str)
        -> Result<Option<Document>, StoreError>;
}

/// Build the store described by the configuration
///
/// `local_dir` (resolved against `base_dir`) wins over the API endpoint.
pub fn from_config(
    config: &PrismicConfig,
    base_dir: &Path,
) -> Result<Arc<dyn ContentStore>, StoreError> {
    if let Some(dir) = &config.local_dir {
        let dir = base_dir.join(dir);
        tracing::info!("Reading documents from {:?}", dir);
        return Ok(Arc::new(LocalStore::new(dir)));
    }

    if config.endpoint.trim().is_empty() {
        return Err(StoreError::NotConfigured);
    }

    tracing::info!("Using content repository at {}", config.endpoint);
    Ok(Arc::new(PrismicClient::from_config(config)))
}

/// Documents held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Vec<Document>,
}

impl MemoryStore {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn query_by_type(&self, doc_type: &str) -> Result<Vec<Document>, StoreError> {
        Ok(filter_by_type(&self.documents, doc_type))
    }

    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
    ) -> Result<Option<Document>, StoreError> {
        Ok(find_by_uid(&self.documents, doc_type, uid))
    }
}

fn filter_by_type(documents: &[Document], doc_type: &str) -> Vec<Document> {
    documents
        .iter()
        .filter(|d| d.doc_type == doc_type)
        .cloned()
        .collect()
}

fn find_by_uid(documents: &[Document], doc_type: &str, uid: &str) -> Option<Document> {
    documents
        .iter()
        .find(|d| d.doc_type == doc_type && d.uid.as_deref() == Some(uid))
        .cloned()
}
