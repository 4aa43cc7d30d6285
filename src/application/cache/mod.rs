//! Content cache over a document store.
//!
//! Three record kinds live in one collection:
//!
//! - `entries::{contentType}::{locale}` → `{ "items": [...], "syncedAt": ... }`
//! - `entry::{entryId}::{locale}` → `{ "data": {...}, "syncedAt": ... }`
//! - `asset::{assetId}` → `{ "url": "...", "syncedAt": ... }`
//!
//! Every write overwrites the previous document for its key and stamps the
//! current time. Reads report absence and storage failure separately through
//! [`CacheLookup`].

mod keys;

pub use keys::CacheKey;

use std::sync::Arc;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::application::repos::{DocumentStore, StoreError};
use crate::domain::{ContentType, Entry, Locale};

pub const DEFAULT_COLLECTION: &str = "contentCache";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to write `{key}`: {source}")]
    Write {
        key: String,
        #[source]
        source: StoreError,
    },
}

/// Outcome of a cache read.
#[derive(Debug)]
pub enum CacheLookup<T> {
    Found(T),
    NotFound,
    StorageError(StoreError),
}

impl<T> CacheLookup<T> {
    /// Collapse to an `Option`, treating storage errors as absence.
    pub fn found(self) -> Option<T> {
        match self {
            CacheLookup::Found(value) => Some(value),
            CacheLookup::NotFound | CacheLookup::StorageError(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, CacheLookup::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheLookup<U> {
        match self {
            CacheLookup::Found(value) => CacheLookup::Found(f(value)),
            CacheLookup::NotFound => CacheLookup::NotFound,
            CacheLookup::StorageError(err) => CacheLookup::StorageError(err),
        }
    }
}

/// A cached value together with the time it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamped<T> {
    pub value: T,
    pub synced_at: OffsetDateTime,
}

#[derive(Serialize, Deserialize)]
struct Record<B> {
    #[serde(flatten)]
    body: B,
    #[serde(rename = "syncedAt", with = "time::serde::rfc3339")]
    synced_at: OffsetDateTime,
}

#[derive(Serialize)]
struct ItemsRef<'a> {
    items: &'a [Entry],
}

#[derive(Deserialize)]
struct Items {
    items: Vec<Entry>,
}

#[derive(Serialize)]
struct DataRef<'a> {
    data: &'a Entry,
}

#[derive(Deserialize)]
struct Data {
    data: Entry,
}

#[derive(Serialize)]
struct UrlRef<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct Url {
    url: String,
}

#[derive(Clone)]
pub struct ContentCache {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl ContentCache {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub async fn get_entries(
        &self,
        content_type: ContentType,
        locale: Locale,
    ) -> CacheLookup<Vec<Entry>> {
        self.get_entries_record(content_type, locale)
            .await
            .map(|record| record.value)
    }

    pub async fn get_entries_record(
        &self,
        content_type: ContentType,
        locale: Locale,
    ) -> CacheLookup<Stamped<Vec<Entry>>> {
        self.read::<Items>(&CacheKey::entries(content_type, locale))
            .await
            .map(|stamped| Stamped {
                value: stamped.value.items,
                synced_at: stamped.synced_at,
            })
    }

    pub async fn set_entries(
        &self,
        content_type: ContentType,
        locale: Locale,
        items: &[Entry],
    ) -> Result<(), CacheError> {
        self.write(&CacheKey::entries(content_type, locale), ItemsRef { items })
            .await
    }

    pub async fn get_entry(&self, entry_id: &str, locale: Locale) -> CacheLookup<Entry> {
        self.get_entry_record(entry_id, locale)
            .await
            .map(|record| record.value)
    }

    pub async fn get_entry_record(
        &self,
        entry_id: &str,
        locale: Locale,
    ) -> CacheLookup<Stamped<Entry>> {
        self.read::<Data>(&CacheKey::entry(entry_id, locale))
            .await
            .map(|stamped| Stamped {
                value: stamped.value.data,
                synced_at: stamped.synced_at,
            })
    }

    pub async fn set_entry(
        &self,
        entry_id: &str,
        locale: Locale,
        entry: &Entry,
    ) -> Result<(), CacheError> {
        self.write(&CacheKey::entry(entry_id, locale), DataRef { data: entry })
            .await
    }

    pub async fn get_asset_url(&self, asset_id: &str) -> CacheLookup<String> {
        self.get_asset_url_record(asset_id)
            .await
            .map(|record| record.value)
    }

    pub async fn get_asset_url_record(&self, asset_id: &str) -> CacheLookup<Stamped<String>> {
        self.read::<Url>(&CacheKey::asset(asset_id))
            .await
            .map(|stamped| Stamped {
                value: stamped.value.url,
                synced_at: stamped.synced_at,
            })
    }

    pub async fn set_asset_url(&self, asset_id: &str, url: &str) -> Result<(), CacheError> {
        self.write(&CacheKey::asset(asset_id), UrlRef { url }).await
    }

    async fn read<B: DeserializeOwned>(&self, key: &CacheKey) -> CacheLookup<Stamped<B>> {
        let key = key.to_string();
        let document = match self.store.get(&self.collection, &key).await {
            Ok(Some(document)) => document,
            Ok(None) => return CacheLookup::NotFound,
            Err(err) => {
                warn!(
                    target = "ura_sync::cache",
                    key = %key,
                    error = %err,
                    "cache read failed"
                );
                return CacheLookup::StorageError(err);
            }
        };

        match serde_json::from_value::<Record<B>>(document) {
            Ok(record) => CacheLookup::Found(Stamped {
                value: record.body,
                synced_at: record.synced_at,
            }),
            Err(err) => {
                warn!(
                    target = "ura_sync::cache",
                    key = %key,
                    error = %err,
                    "cached document does not decode"
                );
                CacheLookup::StorageError(StoreError::Corrupt {
                    key,
                    message: err.to_string(),
                })
            }
        }
    }

    async fn write<B: Serialize>(&self, key: &CacheKey, body: B) -> Result<(), CacheError> {
        let key = key.to_string();
        let record = Record {
            body,
            synced_at: OffsetDateTime::now_utc(),
        };
        let document = serde_json::to_value(&record).map_err(|err| CacheError::Write {
            key: key.clone(),
            source: StoreError::Encode(err.to_string()),
        })?;

        self.store
            .put(&self.collection, &key, document)
            .await
            .map_err(|source| CacheError::Write {
                key: key.clone(),
                source,
            })?;

        debug!(target = "ura_sync::cache", key = %key, "cache record written");
        Ok(())
    }
}
