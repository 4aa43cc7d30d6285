//! Read path used by page code.
//!
//! Every lookup normalizes the requested locale, falls back to the default
//! locale when the localized request fails, and degrades to an empty result
//! instead of an error. With a cache attached, a cache hit short-circuits
//! the CMS request.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::application::{
    cache::{CacheLookup, ContentCache},
    repos::{CmsClient, EntryQuery},
};
use crate::domain::{ContentType, Entry, Locale, normalize_locale};

/// Optional query knobs for [`ContentReader::entries`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryOptions {
    pub limit: Option<u32>,
    pub include: Option<u8>,
    pub order: Option<String>,
}

impl EntryOptions {
    fn apply(&self, mut query: EntryQuery) -> EntryQuery {
        query.limit = self.limit;
        query.include = self.include;
        query.order = self.order.clone();
        query
    }

    /// Cached lists are stored in CMS default order; only unordered requests
    /// are answered from them, truncated to `limit`.
    fn cacheable(&self) -> bool {
        self.order.is_none()
    }
}

#[derive(Clone)]
pub struct ContentReader {
    cms: Arc<dyn CmsClient>,
    cache: Option<ContentCache>,
}

impl ContentReader {
    pub fn new(cms: Arc<dyn CmsClient>) -> Self {
        Self { cms, cache: None }
    }

    pub fn with_cache(mut self, cache: ContentCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn entries(
        &self,
        content_type: ContentType,
        locale: Option<&str>,
        options: &EntryOptions,
    ) -> Vec<Entry> {
        let locale = normalize_locale(locale);

        if options.cacheable() {
            if let Some(mut cached) = self.cached_entries(content_type, locale).await {
                if let Some(limit) = options.limit {
                    cached.truncate(limit as usize);
                }
                return cached;
            }
        }

        let query = options.apply(EntryQuery::new(content_type, locale));
        match self.cms.entries(&query).await {
            Ok(items) => items,
            Err(err) => {
                error!(
                    target = "ura_sync::content",
                    content_type = %content_type,
                    locale = %locale,
                    error = %err,
                    "failed to fetch entries"
                );
                if locale.is_default() {
                    return Vec::new();
                }

                info!(
                    target = "ura_sync::content",
                    content_type = %content_type,
                    fallback = %Locale::DEFAULT,
                    "falling back to default locale"
                );
                self.cms
                    .entries(&query.in_locale(Locale::DEFAULT))
                    .await
                    .unwrap_or_else(|err| {
                        error!(
                            target = "ura_sync::content",
                            content_type = %content_type,
                            error = %err,
                            "failed to fetch entries in fallback locale"
                        );
                        Vec::new()
                    })
            }
        }
    }

    pub async fn entry(&self, entry_id: &str, locale: Option<&str>) -> Option<Entry> {
        let locale = normalize_locale(locale);

        if let Some(cache) = &self.cache {
            if let Some(entry) = accept(cache.get_entry(entry_id, locale).await, entry_id) {
                return Some(entry);
            }
        }

        match self.cms.entry(entry_id, locale).await {
            Ok(entry) => Some(entry),
            Err(err) => {
                error!(
                    target = "ura_sync::content",
                    entry_id,
                    locale = %locale,
                    error = %err,
                    "failed to fetch entry"
                );
                if locale.is_default() {
                    return None;
                }

                info!(
                    target = "ura_sync::content",
                    entry_id,
                    fallback = %Locale::DEFAULT,
                    "falling back to default locale"
                );
                match self.cms.entry(entry_id, Locale::DEFAULT).await {
                    Ok(entry) => Some(entry),
                    Err(err) => {
                        error!(
                            target = "ura_sync::content",
                            entry_id,
                            error = %err,
                            "failed to fetch entry in fallback locale"
                        );
                        None
                    }
                }
            }
        }
    }

    /// Absolute URL of an asset, looked up in the default locale.
    pub async fn asset_url(&self, asset_id: &str) -> Option<String> {
        if asset_id.is_empty() {
            return None;
        }

        if let Some(cache) = &self.cache {
            if let Some(url) = accept(cache.get_asset_url(asset_id).await, asset_id) {
                return Some(url);
            }
        }

        match self.cms.asset(asset_id, Locale::DEFAULT).await {
            Ok(asset) => asset.resolved_url(),
            Err(err) => {
                error!(
                    target = "ura_sync::content",
                    asset_id,
                    error = %err,
                    "failed to fetch asset"
                );
                None
            }
        }
    }

    /// Resolve a reference value (`{"sys": {"id": ...}, ...}`) to a URL.
    pub async fn asset_url_from_reference(&self, reference: &Value) -> Option<String> {
        let asset_id = reference.pointer("/sys/id").and_then(Value::as_str)?;
        self.asset_url(asset_id).await
    }

    /// Resolve an array of references, dropping the ones without a URL.
    pub async fn asset_urls(&self, references: &Value) -> Vec<String> {
        let Some(references) = references.as_array() else {
            return Vec::new();
        };

        let mut urls = Vec::with_capacity(references.len());
        for reference in references {
            if let Some(url) = self.asset_url_from_reference(reference).await {
                urls.push(url);
            }
        }
        urls
    }

    async fn cached_entries(
        &self,
        content_type: ContentType,
        locale: Locale,
    ) -> Option<Vec<Entry>> {
        let cache = self.cache.as_ref()?;
        let key = format!("{content_type}/{locale}");
        accept(cache.get_entries(content_type, locale).await, &key)
    }
}

fn accept<T>(lookup: CacheLookup<T>, subject: &str) -> Option<T> {
    match lookup {
        CacheLookup::Found(value) => Some(value),
        CacheLookup::NotFound => None,
        CacheLookup::StorageError(err) => {
            warn!(
                target = "ura_sync::content",
                subject,
                error = %err,
                "cache unavailable, reading from cms"
            );
            None
        }
    }
}
