use std::{io, process, str::FromStr, sync::Arc};

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use ura_sync::{
    application::{
        cache::{CacheLookup, ContentCache, Stamped},
        content::{ContentReader, EntryOptions},
        error::AppError,
        progress::{LineWriter, ProgressSink},
        repos::{CmsClient, DocumentStore},
        sync::{SyncOptions, SyncService},
    },
    config,
    domain::{ContentType, normalize_locale},
    infra::{
        cms::ContentfulClient, db::PostgresDocumentStore, error::InfraError,
        memory::InMemoryDocumentStore, telemetry,
    },
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let chain = error.chain();
    if dispatcher::has_been_set() {
        error!(error = %error, chain = ?chain, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, chain = ?chain, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        config::Command::Sync(args) => run_sync(settings, args).await,
        config::Command::Show(args) => run_show(settings, args).await,
        config::Command::Fetch(args) => run_fetch(settings, args).await,
    }
}

async fn run_sync(settings: config::Settings, args: config::SyncArgs) -> Result<(), AppError> {
    let store: Arc<dyn DocumentStore> = if args.dry_run {
        info!(target = "ura_sync::main", "dry run: writing to an in-memory store");
        Arc::new(InMemoryDocumentStore::new())
    } else {
        init_store(&settings).await?
    };

    let cms = init_cms(&settings)?;
    let cache = ContentCache::new(store, settings.cache.collection.clone());
    let service = SyncService::new(cms, cache, SyncOptions::from(&settings.sync));

    let mut progress = LineWriter::new(io::stdout());
    match service.sync_all_content(&mut progress).await {
        Ok(report) => {
            let failed = report.failed_pairs().count();
            if failed > 0 {
                warn!(
                    target = "ura_sync::main",
                    failed_pairs = failed,
                    "sync finished with failures"
                );
            }
            info!(
                target = "ura_sync::main",
                entries = report.synced_entries(),
                assets = report.extracted_assets,
                "sync finished"
            );
            Ok(())
        }
        Err(err) => {
            if let Err(emit_err) = progress.emit(&format!("Fatal error: {err}")) {
                warn!(
                    target = "ura_sync::main",
                    error = %emit_err,
                    "could not report fatal error on stdout"
                );
            }
            Err(err.into())
        }
    }
}

async fn run_show(settings: config::Settings, args: config::ShowArgs) -> Result<(), AppError> {
    let store = init_store(&settings).await?;
    let cache = ContentCache::new(store, settings.cache.collection.clone());

    match args.target {
        config::ShowTarget::Entries {
            content_type,
            locale,
        } => {
            let content_type = ContentType::from_str(&content_type)?;
            let locale = normalize_locale(locale.as_deref());
            print_lookup(cache.get_entries_record(content_type, locale).await)
        }
        config::ShowTarget::Entry { id, locale } => {
            let locale = normalize_locale(locale.as_deref());
            print_lookup(cache.get_entry_record(&id, locale).await)
        }
        config::ShowTarget::Asset { id } => print_lookup(cache.get_asset_url_record(&id).await),
    }
}

async fn run_fetch(settings: config::Settings, args: config::FetchArgs) -> Result<(), AppError> {
    let mut reader = ContentReader::new(init_cms(&settings)?);
    if args.cache_first {
        let store = init_store(&settings).await?;
        reader = reader.with_cache(ContentCache::new(store, settings.cache.collection.clone()));
    }

    match args.target {
        config::FetchTarget::Entries {
            content_type,
            locale,
            limit,
            order,
        } => {
            let content_type = ContentType::from_str(&content_type)?;
            let options = EntryOptions {
                limit,
                include: Some(settings.sync.include_depth),
                order,
            };
            let entries = reader
                .entries(content_type, locale.as_deref(), &options)
                .await;
            print_json(&entries)
        }
        config::FetchTarget::Entry { id, locale } => {
            match reader.entry(&id, locale.as_deref()).await {
                Some(entry) => print_json(&entry),
                None => {
                    println!("not found");
                    Ok(())
                }
            }
        }
        config::FetchTarget::Asset { id } => {
            match reader.asset_url(&id).await {
                Some(url) => println!("{url}"),
                None => println!("not found"),
            }
            Ok(())
        }
    }
}

async fn init_store(settings: &config::Settings) -> Result<Arc<dyn DocumentStore>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresDocumentStore::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    PostgresDocumentStore::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    Ok(Arc::new(PostgresDocumentStore::new(pool)))
}

fn init_cms(settings: &config::Settings) -> Result<Arc<dyn CmsClient>, AppError> {
    let client = ContentfulClient::from_settings(&settings.cms)?
        .with_include_depth(settings.sync.include_depth);
    Ok(Arc::new(client))
}

#[derive(Serialize)]
struct CachedRecord<'a, T> {
    value: &'a T,
    #[serde(rename = "syncedAt")]
    synced_at: String,
}

fn print_lookup<T: Serialize>(lookup: CacheLookup<Stamped<T>>) -> Result<(), AppError> {
    match lookup {
        CacheLookup::Found(record) => {
            let synced_at = record
                .synced_at
                .format(&Rfc3339)
                .map_err(|err| AppError::unexpected(err.to_string()))?;
            print_json(&CachedRecord {
                value: &record.value,
                synced_at,
            })
        }
        CacheLookup::NotFound => {
            println!("not cached");
            Ok(())
        }
        CacheLookup::StorageError(err) => Err(InfraError::from(err).into()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|err| AppError::unexpected(err.to_string()))?;
    println!("{rendered}");
    Ok(())
}
