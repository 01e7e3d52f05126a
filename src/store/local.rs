//! Documents exported as JSON files

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{filter_by_type, find_by_uid, ContentStore, Document, StoreError};

/// Reads documents from `*.json` files below a directory
///
/// Each file holds either a single document or an array of documents.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    async fn load(&self) -> Result<Vec<Document>, StoreError> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || load_dir(&dir))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }
}

fn load_dir(dir: &Path) -> Result<Vec<Document>, StoreError> {
    if !dir.exists() {
        return Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("document directory {:?} does not exist", dir),
        )));
    }

    let mut documents = Vec::new();

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let content = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        match value {
            serde_json::Value::Array(items) => {
                for item in items {
                    documents.push(serde_json::from_value(item)?);
                }
            }
            other => documents.push(serde_json::from_value(other)?),
        }
        tracing::debug!("Loaded documents from {:?}", path);
    }

    Ok(documents)
}

#[async_trait]
impl ContentStore for LocalStore {
    async fn query_by_type(&self, doc_type: &str) -> Result<Vec<Document>, StoreError> {
        Ok(filter_by_type(&self.load().await?, doc_type))
    }

    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
    ) -> Result<Option<Document>, StoreError> {
        Ok(find_by_uid(&self.load().await?, doc_type, uid))
    }
}
