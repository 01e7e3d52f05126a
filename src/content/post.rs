//! Post model

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

use crate::helpers::parse_timestamp;
use crate::richtext::StructuredText;
use crate::store::{Document, StoreError};

/// A blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Routable identifier
    pub uid: String,

    /// First publication date, absent for documents never published
    pub first_publication_date: Option<DateTime<FixedOffset>>,

    pub title: String,

    pub banner: Banner,

    pub author: String,

    /// Sections in display order
    pub content: Vec<ContentBlock>,
}

/// Banner image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

/// A titled section of a post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default, deserialize_with = "null_as_default")]
    pub heading: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: StructuredText,
}

impl ContentBlock {
    pub fn new<S: Into<String>>(heading: S, body: StructuredText) -> Self {
        Self {
            heading: heading.into(),
            body,
        }
    }
}

/// The `data` object of a post document
#[derive(Debug, Deserialize)]
struct PostData {
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    banner: Banner,
    #[serde(default, deserialize_with = "null_as_default")]
    author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    content: Vec<ContentBlock>,
}

/// Empty fields come back from the repository as `null`
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Post {
    /// Normalize a raw repository document into a post
    pub fn from_document(document: Document) -> Result<Self, StoreError> {
        let uid = document
            .uid
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| StoreError::InvalidDocument {
                id: document.id.clone(),
                reason: "missing uid".to_string(),
            })?;

        let data: PostData =
            serde_json::from_value(document.data).map_err(|e| StoreError::InvalidDocument {
                id: document.id.clone(),
                reason: e.to_string(),
            })?;

        let first_publication_date = match document.first_publication_date.as_deref() {
            Some(raw) => {
                let parsed = parse_timestamp(raw);
                if parsed.is_none() {
                    tracing::warn!(
                        "Ignoring unparseable publication date {:?} on {}",
                        raw,
                        uid
                    );
                }
                parsed
            }
            None => None,
        };

        Ok(Self {
            uid,
            first_publication_date,
            title: data.title,
            banner: data.banner,
            author: data.author,
            content: data.content,
        })
    }
}
