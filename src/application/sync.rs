//! Batch job that mirrors CMS content into the content cache.
//!
//! A run walks every configured content type in every locale, one request at
//! a time. A failing (content type, locale) pair is reported and skipped;
//! only a broken progress sink or a failed write of an extracted asset URL
//! ends the run early. Nothing is rolled back.

use std::{sync::Arc, time::Instant};

use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{info, warn};

use crate::application::{
    cache::{CacheError, ContentCache},
    progress::{ProgressError, ProgressSink},
    repos::{CmsClient, CmsError, EntryQuery},
};
use crate::config::SyncSettings;
use crate::domain::{
    ContentType, Locale,
    fields::{AssetCollector, walk_fields},
};

pub const DEFAULT_PAGE_LIMIT: u32 = 1000;
pub const DEFAULT_INCLUDE_DEPTH: u8 = 10;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error("failed to cache asset `{asset_id}`: {source}")]
    AssetWrite {
        asset_id: String,
        #[source]
        source: CacheError,
    },
}

#[derive(Debug, Error)]
enum UnitError {
    #[error(transparent)]
    Cms(#[from] CmsError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub content_types: Vec<ContentType>,
    pub locales: Vec<Locale>,
    /// Maximum entries (and assets) requested per call.
    pub page_limit: u32,
    pub include_depth: u8,
    /// Also cache every asset from the CMS asset listing, referenced or not.
    pub include_asset_listing: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            content_types: ContentType::ALL.to_vec(),
            locales: Locale::ALL.to_vec(),
            page_limit: DEFAULT_PAGE_LIMIT,
            include_depth: DEFAULT_INCLUDE_DEPTH,
            include_asset_listing: true,
        }
    }
}

impl From<&SyncSettings> for SyncOptions {
    fn from(settings: &SyncSettings) -> Self {
        Self {
            content_types: settings.content_types.clone(),
            locales: Locale::ALL.to_vec(),
            page_limit: settings.page_limit,
            include_depth: settings.include_depth,
            include_asset_listing: settings.include_asset_listing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Synced { count: usize },
    Failed { error: String },
}

impl UnitOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, UnitOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairReport {
    pub content_type: ContentType,
    pub locale: Locale,
    pub outcome: UnitOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetListingReport {
    pub locale: Locale,
    pub outcome: UnitOutcome,
}

/// Typed summary of a completed run; the same information was emitted as
/// progress lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pairs: Vec<PairReport>,
    pub extracted_assets: usize,
    pub asset_listings: Vec<AssetListingReport>,
}

impl SyncReport {
    pub fn failed_pairs(&self) -> impl Iterator<Item = &PairReport> {
        self.pairs.iter().filter(|pair| pair.outcome.is_failed())
    }

    pub fn synced_entries(&self) -> usize {
        self.pairs
            .iter()
            .map(|pair| match pair.outcome {
                UnitOutcome::Synced { count } => count,
                UnitOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn is_clean(&self) -> bool {
        self.failed_pairs().next().is_none()
            && self
                .asset_listings
                .iter()
                .all(|listing| !listing.outcome.is_failed())
    }
}

#[derive(Clone)]
pub struct SyncService {
    cms: Arc<dyn CmsClient>,
    cache: ContentCache,
    options: SyncOptions,
}

impl SyncService {
    pub fn new(cms: Arc<dyn CmsClient>, cache: ContentCache, options: SyncOptions) -> Self {
        Self {
            cms,
            cache,
            options,
        }
    }

    /// Run one full sync, reporting progress line by line.
    pub async fn sync_all_content(
        &self,
        progress: &mut dyn ProgressSink,
    ) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        let mut report = SyncReport::default();
        let mut assets = AssetCollector::new();

        info!(
            target = "ura_sync::sync",
            content_types = self.options.content_types.len(),
            locales = self.options.locales.len(),
            "content sync started"
        );

        for &content_type in &self.options.content_types {
            for &locale in &self.options.locales {
                progress.emit(&format!("Syncing {content_type} ({locale})..."))?;

                let pair_started = Instant::now();
                let outcome = match self.sync_pair(content_type, locale, &mut assets).await {
                    Ok(count) => {
                        progress.emit(&format!(
                            "  Done {content_type} ({locale}): {count} entries"
                        ))?;
                        counter!(
                            "ura_sync_entries_total",
                            "content_type" => content_type.tag(),
                            "locale" => locale.as_str()
                        )
                        .increment(count as u64);
                        UnitOutcome::Synced { count }
                    }
                    Err(err) => {
                        warn!(
                            target = "ura_sync::sync",
                            content_type = %content_type,
                            locale = %locale,
                            error = %err,
                            "content type sync failed"
                        );
                        progress.emit(&format!("  Failed {content_type} ({locale}): {err}"))?;
                        counter!("ura_sync_failures_total", "unit" => "entries").increment(1);
                        UnitOutcome::Failed {
                            error: err.to_string(),
                        }
                    }
                };
                histogram!("ura_sync_pair_ms")
                    .record(pair_started.elapsed().as_secs_f64() * 1000.0);

                report.pairs.push(PairReport {
                    content_type,
                    locale,
                    outcome,
                });
            }
        }

        progress.emit("Caching extracted assets...")?;
        for (asset_id, url) in assets.iter() {
            self.cache
                .set_asset_url(asset_id, url)
                .await
                .map_err(|source| SyncError::AssetWrite {
                    asset_id: asset_id.to_string(),
                    source,
                })?;
        }
        report.extracted_assets = assets.len();
        counter!("ura_sync_assets_total", "source" => "entries").increment(assets.len() as u64);
        progress.emit(&format!("Cached {} assets from entries", assets.len()))?;

        if self.options.include_asset_listing {
            for &locale in &self.options.locales {
                progress.emit(&format!("Fetching all assets ({locale})..."))?;
                let outcome = match self.sync_asset_listing(locale).await {
                    Ok(count) => {
                        progress.emit(&format!("  Done all assets ({locale}): {count}"))?;
                        UnitOutcome::Synced { count }
                    }
                    Err(err) => {
                        warn!(
                            target = "ura_sync::sync",
                            locale = %locale,
                            error = %err,
                            "asset listing sync failed"
                        );
                        progress.emit(&format!("  Failed assets ({locale}): {err}"))?;
                        counter!("ura_sync_failures_total", "unit" => "assets").increment(1);
                        UnitOutcome::Failed {
                            error: err.to_string(),
                        }
                    }
                };
                report.asset_listings.push(AssetListingReport { locale, outcome });
            }
        }

        info!(
            target = "ura_sync::sync",
            entries = report.synced_entries(),
            extracted_assets = report.extracted_assets,
            failed_pairs = report.failed_pairs().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "content sync finished"
        );
        progress.emit("\nSync complete!")?;

        Ok(report)
    }

    async fn sync_pair(
        &self,
        content_type: ContentType,
        locale: Locale,
        assets: &mut AssetCollector,
    ) -> Result<usize, UnitError> {
        let query = EntryQuery::new(content_type, locale)
            .with_limit(self.options.page_limit)
            .with_include(self.options.include_depth);
        let items = self.cms.entries(&query).await?;

        self.cache.set_entries(content_type, locale, &items).await?;

        for entry in &items {
            self.cache.set_entry(entry.id(), locale, entry).await?;
            walk_fields(assets, &entry.fields);
        }

        Ok(items.len())
    }

    async fn sync_asset_listing(&self, locale: Locale) -> Result<usize, UnitError> {
        let listed = self.cms.assets(locale, self.options.page_limit).await?;

        let mut cached = 0_u64;
        for asset in &listed {
            if let Some(url) = asset.resolved_url() {
                self.cache.set_asset_url(asset.id(), &url).await?;
                cached += 1;
            }
        }
        counter!("ura_sync_assets_total", "source" => "listing").increment(cached);

        Ok(listed.len())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::application::cache::{CacheLookup, DEFAULT_COLLECTION};
    use crate::domain::{Asset, Entry};
    use crate::infra::memory::InMemoryDocumentStore;

    #[derive(Default)]
    struct StubCms {
        entries: HashMap<(ContentType, Locale), Vec<Entry>>,
        failing: Vec<(ContentType, Locale)>,
        assets: Vec<Asset>,
        assets_fail: bool,
    }

    #[async_trait]
    impl CmsClient for StubCms {
        async fn entries(&self, query: &EntryQuery) -> Result<Vec<Entry>, CmsError> {
            assert_eq!(query.limit, Some(DEFAULT_PAGE_LIMIT));
            assert_eq!(query.include, Some(DEFAULT_INCLUDE_DEPTH));
            let key = (query.content_type, query.locale);
            if self.failing.contains(&key) {
                return Err(CmsError::Status {
                    status: 503,
                    body: "unavailable".into(),
                });
            }
            Ok(self.entries.get(&key).cloned().unwrap_or_default())
        }

        async fn entry(&self, id: &str, _locale: Locale) -> Result<Entry, CmsError> {
            Err(CmsError::not_found("entry", id))
        }

        async fn asset(&self, id: &str, _locale: Locale) -> Result<Asset, CmsError> {
            Err(CmsError::not_found("asset", id))
        }

        async fn assets(&self, _locale: Locale, _limit: u32) -> Result<Vec<Asset>, CmsError> {
            if self.assets_fail {
                return Err(CmsError::Transport("timed out".into()));
            }
            Ok(self.assets.clone())
        }
    }

    fn sponsor(id: &str, asset_id: &str) -> Entry {
        serde_json::from_value(json!({
            "sys": {
                "id": id,
                "type": "Entry",
                "contentType": {"sys": {"type": "Link", "linkType": "ContentType", "id": "sponsors"}}
            },
            "fields": {
                "sponsorsImages": [{
                    "sys": {"id": asset_id, "type": "Asset"},
                    "fields": {"file": {"url": "//images.ctfassets.net/x/y/z.png"}}
                }]
            }
        }))
        .expect("entry")
    }

    fn service(cms: StubCms, options: SyncOptions) -> (ContentCache, SyncService) {
        let cache = ContentCache::new(Arc::new(InMemoryDocumentStore::new()), DEFAULT_COLLECTION);
        let service = SyncService::new(Arc::new(cms), cache.clone(), options);
        (cache, service)
    }

    async fn run(service: &SyncService) -> (Vec<String>, SyncReport) {
        let mut lines = Vec::new();
        let report = service
            .sync_all_content(&mut |line: &str| lines.push(line.to_string()))
            .await
            .expect("sync");
        (lines, report)
    }

    #[tokio::test]
    async fn sponsors_scenario_caches_entries_and_assets() {
        let mut cms = StubCms::default();
        cms.entries.insert(
            (ContentType::Sponsors, Locale::De),
            vec![sponsor("s1", "logo-1"), sponsor("s2", "logo-2")],
        );
        let (cache, service) = service(cms, SyncOptions::default());

        let (lines, report) = run(&service).await;

        let cached = cache
            .get_entries(ContentType::Sponsors, Locale::De)
            .await
            .found()
            .expect("entries cached");
        assert_eq!(cached.len(), 2);
        for entry in &cached {
            let single = cache.get_entry(entry.id(), Locale::De).await.found();
            assert_eq!(single.as_ref(), Some(entry));
        }
        assert_eq!(
            cache.get_asset_url("logo-1").await.found().as_deref(),
            Some("https://images.ctfassets.net/x/y/z.png")
        );
        assert_eq!(report.extracted_assets, 2);
        assert!(lines.contains(&"  Done sponsors (de): 2 entries".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("\nSync complete!"));
    }

    #[tokio::test]
    async fn every_pair_is_cached_even_when_empty() {
        let (cache, service) = service(StubCms::default(), SyncOptions::default());

        let (_, report) = run(&service).await;

        assert_eq!(report.pairs.len(), ContentType::ALL.len() * Locale::ALL.len());
        for content_type in ContentType::ALL {
            for locale in Locale::ALL {
                let lookup = cache.get_entries(content_type, locale).await;
                assert!(matches!(lookup, CacheLookup::Found(ref items) if items.is_empty()));
            }
        }
    }

    #[tokio::test]
    async fn one_failing_pair_does_not_abort_the_run() {
        let mut cms = StubCms::default();
        cms.entries.insert(
            (ContentType::Sponsors, Locale::Sq),
            vec![sponsor("s1", "logo-1")],
        );
        cms.failing.push((ContentType::Faqs, Locale::Sq));
        let (cache, service) = service(cms, SyncOptions::default());

        let (lines, report) = run(&service).await;

        let failures: Vec<_> = lines.iter().filter(|line| line.starts_with("  Failed")).collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].starts_with("  Failed faqs (sq): cms responded with status 503"));

        let failed: Vec<_> = report.failed_pairs().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!((failed[0].content_type, failed[0].locale), (ContentType::Faqs, Locale::Sq));

        assert!(matches!(
            cache.get_entries(ContentType::Faqs, Locale::Sq).await,
            CacheLookup::NotFound
        ));
        assert!(cache.get_entries(ContentType::Faqs, Locale::De).await.is_found());
        assert!(cache.get_entries(ContentType::TermsOfService, Locale::Sq).await.is_found());
        assert!(report.synced_entries() >= 1);
    }

    #[tokio::test]
    async fn asset_listing_caches_unreferenced_assets() {
        let mut cms = StubCms::default();
        cms.assets = vec![
            serde_json::from_value(json!({
                "sys": {"id": "poster", "type": "Asset"},
                "fields": {"file": {"url": "//images.ctfassets.net/p/poster.jpg"}}
            }))
            .expect("asset"),
            serde_json::from_value(json!({"sys": {"id": "draft", "type": "Asset"}, "fields": {}}))
                .expect("asset"),
            serde_json::from_value(json!({
                "sys": {"id": "processing", "type": "Asset"},
                "fields": {"file": {"fileName": "p.png", "upload": "https://upload/p.png"}}
            }))
            .expect("asset"),
        ];
        let (cache, service) = service(cms, SyncOptions::default());

        let (lines, report) = run(&service).await;

        assert_eq!(
            cache.get_asset_url("poster").await.found().as_deref(),
            Some("https://images.ctfassets.net/p/poster.jpg")
        );
        assert!(matches!(cache.get_asset_url("draft").await, CacheLookup::NotFound));
        assert!(matches!(cache.get_asset_url("processing").await, CacheLookup::NotFound));
        assert!(lines.contains(&"  Done all assets (sq): 3".to_string()));
        assert_eq!(report.asset_listings.len(), 2);
    }

    #[tokio::test]
    async fn asset_listing_failures_are_logged_not_fatal() {
        let cms = StubCms {
            assets_fail: true,
            ..StubCms::default()
        };
        let (_, service) = service(cms, SyncOptions::default());

        let (lines, report) = run(&service).await;

        assert!(lines.contains(&"  Failed assets (de): cms request failed: timed out".to_string()));
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn asset_listing_can_be_disabled() {
        let options = SyncOptions {
            content_types: vec![ContentType::About],
            include_asset_listing: false,
            ..SyncOptions::default()
        };
        let (_, service) = service(StubCms::default(), options);

        let (lines, report) = run(&service).await;

        assert_eq!(
            lines,
            [
                "Syncing about (de)...",
                "  Done about (de): 0 entries",
                "Syncing about (sq)...",
                "  Done about (sq): 0 entries",
                "Caching extracted assets...",
                "Cached 0 assets from entries",
                "\nSync complete!",
            ]
        );
        assert!(report.asset_listings.is_empty());
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn repeated_runs_produce_identical_entries() {
        let mut cms = StubCms::default();
        cms.entries.insert(
            (ContentType::Sponsors, Locale::De),
            vec![sponsor("s1", "logo-1"), sponsor("s2", "logo-2")],
        );
        let (cache, service) = service(cms, SyncOptions::default());

        run(&service).await;
        let first = cache
            .get_entries_record(ContentType::Sponsors, Locale::De)
            .await
            .found()
            .expect("first");
        run(&service).await;
        let second = cache
            .get_entries_record(ContentType::Sponsors, Locale::De)
            .await
            .found()
            .expect("second");

        assert_eq!(first.value, second.value);
        assert!(second.synced_at >= first.synced_at);
    }

    #[tokio::test]
    async fn broken_progress_sink_is_fatal() {
        struct Refuse;

        impl ProgressSink for Refuse {
            fn emit(&mut self, _line: &str) -> Result<(), ProgressError> {
                Err(ProgressError("terminal gone".into()))
            }
        }

        let (cache, service) = service(StubCms::default(), SyncOptions::default());
        let err = service
            .sync_all_content(&mut Refuse)
            .await
            .expect_err("fatal");

        assert!(matches!(err, SyncError::Progress(_)));
        assert!(matches!(
            cache.get_entries(ContentType::Text, Locale::De).await,
            CacheLookup::NotFound
        ));
    }
}
