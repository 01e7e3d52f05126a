//! Prismic REST API v2 client

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{ContentStore, Document, StoreError};
use crate::config::PrismicConfig;

/// API entry point response; only the refs matter here
#[derive(Debug, Deserialize)]
struct ApiRoot {
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total_pages: u32,
    results: Vec<Document>,
}

/// Client for a Prismic repository
#[derive(Debug, Clone)]
pub struct PrismicClient {
    endpoint: String,
    access_token: Option<String>,
    page_size: u32,
    client: reqwest::Client,
}

impl PrismicClient {
    pub fn new(endpoint: &str, access_token: Option<String>, page_size: u32) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token,
            page_size: page_size.clamp(1, 100),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &PrismicConfig) -> Self {
        Self::new(
            &config.endpoint,
            config.access_token.clone(),
            config.page_size,
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        mut query: Vec<(&str, String)>,
    ) -> Result<T, StoreError> {
        if let Some(token) = &self.access_token {
            query.push(("access_token", token.clone()));
        }

        // The request URL carries the access token; keep it out of errors
        let response = self
            .client
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.without_url()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Http(e.without_url()))
    }

    /// Current master ref; every search must be pinned to a ref
    async fn master_ref(&self) -> Result<String, StoreError> {
        let root: ApiRoot = self.get_json(&self.endpoint, Vec::new()).await?;
        root.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or(StoreError::MissingMasterRef)
    }

    async fn search(
        &self,
        reference: &str,
        predicates: &[String],
        page: u32,
        page_size: u32,
    ) -> Result<SearchResponse, StoreError> {
        let url = format!("{}/documents/search", self.endpoint);
        let mut query = vec![("ref", reference.to_string())];
        for predicate in predicates {
            query.push(("q", predicate.clone()));
        }
        query.push(("page", page.to_string()));
        query.push(("pageSize", page_size.to_string()));

        tracing::debug!("Searching {} page {} with {:?}", url, page, predicates);
        self.get_json(&url, query).await
    }
}

#[async_trait]
impl ContentStore for PrismicClient {
    async fn query_by_type(&self, doc_type: &str) -> Result<Vec<Document>, StoreError> {
        let reference = self.master_ref().await?;
        let predicates = vec![at_predicate("document.type", doc_type)];

        let mut documents = Vec::new();
        let mut page = 1;
        loop {
            let response = self
                .search(&reference, &predicates, page, self.page_size)
                .await?;
            documents.extend(response.results);

            if page >= response.total_pages {
                break;
            }
            page += 1;
        }

        tracing::debug!("Fetched {} documents of type {}", documents.len(), doc_type);
        Ok(documents)
    }

    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
    ) -> Result<Option<Document>, StoreError> {
        let reference = self.master_ref().await?;
        let predicates = vec![
            at_predicate("document.type", doc_type),
            at_predicate(&format!("my.{}.uid", doc_type), uid),
        ];

        let response = self.search(&reference, &predicates, 1, 1).await?;
        Ok(response.results.into_iter().next())
    }
}

/// `[[at(path, "value")]]` query predicate
fn at_predicate(path: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!(r#"[[at({}, "{}")]]"#, path, escaped)
}
