//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{
    CliArgs, Command, DatabaseOverride, FetchArgs, FetchTarget, LoggingOverrides, ShowArgs,
    ShowTarget, SyncArgs, SyncOverrides,
};

use std::{num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::cache::DEFAULT_COLLECTION;
use crate::application::sync::{DEFAULT_INCLUDE_DEPTH, DEFAULT_PAGE_LIMIT};
use crate::domain::ContentType;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "ura-sync";
const ENV_PREFIX: &str = "URA";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 4;
const DEFAULT_CMS_BASE_URL: &str = "https://cdn.contentful.com";
const DEFAULT_CMS_ENVIRONMENT: &str = "master";
const DEFAULT_CMS_TIMEOUT_SECS: u64 = 30;
const MAX_PAGE_LIMIT: u32 = 1000;
const MAX_INCLUDE_DEPTH: u8 = 10;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cms: CmsSettings,
    pub sync: SyncSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

/// Delivery API credentials. Space and token are only checked when a
/// command actually talks to the CMS.
#[derive(Debug, Clone)]
pub struct CmsSettings {
    pub space_id: Option<String>,
    pub access_token: Option<String>,
    pub environment: String,
    pub base_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub page_limit: u32,
    pub include_depth: u8,
    pub include_asset_listing: bool,
    pub content_types: Vec<ContentType>,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub collection: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("sync.content_types"),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_command_overrides(&cli.command);

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cms: RawCmsSettings,
    sync: RawSyncSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_command_overrides(&mut self, command: &Command) {
        match command {
            Command::Sync(args) => self.apply_sync_overrides(&args.overrides),
            Command::Show(args) => {
                self.apply_logging_overrides(&args.logging);
                self.apply_database_override(&args.database);
            }
            Command::Fetch(args) => {
                self.apply_logging_overrides(&args.logging);
                self.apply_database_override(&args.database);
            }
        }
    }

    fn apply_sync_overrides(&mut self, overrides: &SyncOverrides) {
        self.apply_logging_overrides(&overrides.logging);
        self.apply_database_override(&overrides.database);

        if !overrides.content_types.is_empty() {
            self.sync.content_types = Some(overrides.content_types.clone());
        }
        if overrides.skip_asset_listing {
            self.sync.include_asset_listing = Some(false);
        }
        if let Some(limit) = overrides.page_limit {
            self.sync.page_limit = Some(limit);
        }
        if let Some(depth) = overrides.include_depth {
            self.sync.include_depth = Some(depth);
        }
    }

    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            database,
            cms,
            sync,
            cache,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            cms: build_cms_settings(cms)?,
            sync: build_sync_settings(sync)?,
            cache: build_cache_settings(cache)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let max_connections = database
        .max_connections
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);

    Ok(DatabaseSettings {
        url: non_blank(database.url),
        max_connections: NonZeroU32::new(max_connections).ok_or_else(|| {
            LoadError::invalid("database.max_connections", "must be greater than zero")
        })?,
    })
}

fn build_cms_settings(cms: RawCmsSettings) -> Result<CmsSettings, LoadError> {
    let environment = cms
        .environment
        .unwrap_or_else(|| DEFAULT_CMS_ENVIRONMENT.to_string());
    if environment.trim().is_empty() {
        return Err(LoadError::invalid("cms.environment", "must not be empty"));
    }

    let base_url = cms
        .base_url
        .as_deref()
        .unwrap_or(DEFAULT_CMS_BASE_URL);
    let base_url = Url::parse(base_url)
        .map_err(|err| LoadError::invalid("cms.base_url", format!("invalid url: {err}")))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid("cms.base_url", "scheme must be http or https"));
    }

    let timeout_seconds = cms.timeout_seconds.unwrap_or(DEFAULT_CMS_TIMEOUT_SECS);
    if timeout_seconds == 0 {
        return Err(LoadError::invalid(
            "cms.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(CmsSettings {
        space_id: non_blank(cms.space_id),
        access_token: non_blank(cms.access_token),
        environment,
        base_url,
        timeout: Duration::from_secs(timeout_seconds),
    })
}

fn build_sync_settings(sync: RawSyncSettings) -> Result<SyncSettings, LoadError> {
    let page_limit = sync.page_limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if !(1..=MAX_PAGE_LIMIT).contains(&page_limit) {
        return Err(LoadError::invalid(
            "sync.page_limit",
            format!("must be between 1 and {MAX_PAGE_LIMIT}"),
        ));
    }

    let include_depth = sync.include_depth.unwrap_or(DEFAULT_INCLUDE_DEPTH);
    if include_depth > MAX_INCLUDE_DEPTH {
        return Err(LoadError::invalid(
            "sync.include_depth",
            format!("must be at most {MAX_INCLUDE_DEPTH}"),
        ));
    }

    let content_types = match sync.content_types {
        Some(tags) if !tags.is_empty() => {
            let mut content_types = Vec::with_capacity(tags.len());
            for tag in &tags {
                let content_type = ContentType::from_str(tag.trim())
                    .map_err(|err| LoadError::invalid("sync.content_types", err.to_string()))?;
                if !content_types.contains(&content_type) {
                    content_types.push(content_type);
                }
            }
            content_types
        }
        _ => ContentType::ALL.to_vec(),
    };

    Ok(SyncSettings {
        page_limit,
        include_depth,
        include_asset_listing: sync.include_asset_listing.unwrap_or(true),
        content_types,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let collection = cache
        .collection
        .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
    if collection.trim().is_empty() {
        return Err(LoadError::invalid("cache.collection", "must not be empty"));
    }

    Ok(CacheSettings { collection })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCmsSettings {
    space_id: Option<String>,
    access_token: Option<String>,
    environment: Option<String>,
    base_url: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSyncSettings {
    page_limit: Option<u32>,
    include_depth: Option<u8>,
    include_asset_listing: Option<bool>,
    content_types: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    collection: Option<String>,
}
