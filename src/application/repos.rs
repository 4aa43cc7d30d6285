//! Traits describing the external collaborators: the CMS and the document
//! database behind the content cache.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{Asset, ContentType, Entry, Locale};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("storage timeout")]
    Timeout,
    #[error("failed to encode document: {0}")]
    Encode(String),
    #[error("document `{key}` is corrupt: {message}")]
    Corrupt { key: String, message: String },
}

impl StoreError {
    pub fn from_backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// A document database addressed by collection name and string key.
///
/// Only whole-document reads and overwrites are needed; there is no query,
/// delete or transaction surface.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the document stored under `key`, creating it if absent.
    async fn put(&self, collection: &str, key: &str, document: Value) -> Result<(), StoreError>;
}

#[derive(Debug, Error)]
pub enum CmsError {
    #[error("cms request failed: {0}")]
    Transport(String),
    #[error("cms responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode cms response: {0}")]
    Decode(String),
    #[error("{kind} `{id}` not found")]
    NotFound { kind: &'static str, id: String },
    #[error("cms client misconfigured: {0}")]
    Configuration(String),
}

impl CmsError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Parameters of an entries listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryQuery {
    pub content_type: ContentType,
    pub locale: Locale,
    pub limit: Option<u32>,
    /// Link resolution depth.
    pub include: Option<u8>,
    /// CMS order expression, e.g. `-sys.createdAt` or `fields.date`.
    pub order: Option<String>,
}

impl EntryQuery {
    pub fn new(content_type: ContentType, locale: Locale) -> Self {
        Self {
            content_type,
            locale,
            limit: None,
            include: None,
            order: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_include(mut self, include: u8) -> Self {
        self.include = Some(include);
        self
    }

    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn in_locale(&self, locale: Locale) -> Self {
        Self {
            locale,
            ..self.clone()
        }
    }
}

/// Read access to the headless CMS.
#[async_trait]
pub trait CmsClient: Send + Sync {
    /// List entries of one content type, with links resolved inline.
    async fn entries(&self, query: &EntryQuery) -> Result<Vec<Entry>, CmsError>;

    async fn entry(&self, id: &str, locale: Locale) -> Result<Entry, CmsError>;

    async fn asset(&self, id: &str, locale: Locale) -> Result<Asset, CmsError>;

    async fn assets(&self, locale: Locale, limit: u32) -> Result<Vec<Asset>, CmsError>;
}
