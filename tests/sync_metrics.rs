use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use metrics_util::debugging::DebuggingRecorder;
use serde_json::json;

use ura_sync::application::cache::{ContentCache, DEFAULT_COLLECTION};
use ura_sync::application::progress::Silent;
use ura_sync::application::repos::{CmsClient, CmsError, EntryQuery};
use ura_sync::application::sync::{SyncOptions, SyncService};
use ura_sync::domain::{Asset, ContentType, Entry, Locale};
use ura_sync::infra::memory::InMemoryDocumentStore;

/// Serves one gallery entry for German and fails every Albanian request.
struct GermanOnly;

#[async_trait]
impl CmsClient for GermanOnly {
    async fn entries(&self, query: &EntryQuery) -> Result<Vec<Entry>, CmsError> {
        if query.locale == Locale::Sq {
            return Err(CmsError::Transport("connection reset".into()));
        }
        Ok(vec![
            serde_json::from_value(json!({
                "sys": {"id": "g1", "type": "Entry"},
                "fields": {"img1": {
                    "sys": {"id": "a1", "type": "Asset"},
                    "fields": {"file": {"url": "//images.ctfassets.net/a1.png"}}
                }}
            }))
            .expect("entry"),
        ])
    }

    async fn entry(&self, id: &str, _locale: Locale) -> Result<Entry, CmsError> {
        Err(CmsError::not_found("entry", id))
    }

    async fn asset(&self, id: &str, _locale: Locale) -> Result<Asset, CmsError> {
        Err(CmsError::not_found("asset", id))
    }

    async fn assets(&self, locale: Locale, _limit: u32) -> Result<Vec<Asset>, CmsError> {
        if locale == Locale::Sq {
            return Err(CmsError::Transport("connection reset".into()));
        }
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn sync_emits_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let cache = ContentCache::new(Arc::new(InMemoryDocumentStore::new()), DEFAULT_COLLECTION);
    let service = SyncService::new(
        Arc::new(GermanOnly),
        cache,
        SyncOptions {
            content_types: vec![ContentType::GalleryBlock],
            ..SyncOptions::default()
        },
    );
    let report = service
        .sync_all_content(&mut Silent)
        .await
        .expect("sync runs");
    assert_eq!(report.failed_pairs().count(), 1);
    assert_eq!(report.extracted_assets, 1);

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "ura_sync_entries_total",
        "ura_sync_assets_total",
        "ura_sync_failures_total",
        "ura_sync_pair_ms",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
