use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the ura-sync binary.
#[derive(Debug, Parser)]
#[command(
    name = "ura-sync",
    version,
    about = "Mirror CMS content into the site content cache"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "URA_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Pull every content type in every locale and write it to the cache.
    Sync(SyncArgs),
    /// Print a cached record.
    Show(ShowArgs),
    /// Read live from the CMS with locale fallback.
    Fetch(FetchArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SyncArgs {
    #[command(flatten)]
    pub overrides: SyncOverrides,

    /// Write into an in-memory store instead of the database.
    #[arg(long = "dry-run", action = clap::ArgAction::SetTrue)]
    pub dry_run: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SyncOverrides {
    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Restrict the run to these content types; repeat for several.
    #[arg(long = "content-type", value_name = "TAG")]
    pub content_types: Vec<String>,

    /// Skip the full asset listing per locale.
    #[arg(long = "skip-asset-listing", action = clap::ArgAction::SetTrue)]
    pub skip_asset_listing: bool,

    /// Override the page size of each entries request.
    #[arg(long = "page-limit", value_name = "COUNT")]
    pub page_limit: Option<u32>,

    /// Override the link resolution depth.
    #[arg(long = "include-depth", value_name = "DEPTH")]
    pub include_depth: Option<u8>,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(flatten)]
    pub database: DatabaseOverride,

    #[command(subcommand)]
    pub target: ShowTarget,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ShowTarget {
    /// Cached entry list of one content type.
    Entries {
        #[arg(value_name = "CONTENT_TYPE")]
        content_type: String,
        #[arg(value_name = "LOCALE")]
        locale: Option<String>,
    },
    /// One cached entry.
    Entry {
        #[arg(value_name = "ID")]
        id: String,
        #[arg(value_name = "LOCALE")]
        locale: Option<String>,
    },
    /// One cached asset URL.
    Asset {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Debug, Args, Clone)]
pub struct FetchArgs {
    #[command(flatten)]
    pub logging: LoggingOverrides,

    /// Consult the cache before the CMS.
    #[arg(long = "cache-first", action = clap::ArgAction::SetTrue)]
    pub cache_first: bool,

    #[command(flatten)]
    pub database: DatabaseOverride,

    #[command(subcommand)]
    pub target: FetchTarget,
}

#[derive(Debug, Subcommand, Clone)]
pub enum FetchTarget {
    /// Entries of one content type.
    Entries {
        #[arg(value_name = "CONTENT_TYPE")]
        content_type: String,
        #[arg(value_name = "LOCALE")]
        locale: Option<String>,
        /// Maximum number of entries.
        #[arg(long, value_name = "COUNT")]
        limit: Option<u32>,
        /// CMS order expression, e.g. `-sys.createdAt`.
        #[arg(long, value_name = "EXPR", allow_hyphen_values = true)]
        order: Option<String>,
    },
    /// One entry by id.
    Entry {
        #[arg(value_name = "ID")]
        id: String,
        #[arg(value_name = "LOCALE")]
        locale: Option<String>,
    },
    /// Absolute URL of one asset.
    Asset {
        #[arg(value_name = "ID")]
        id: String,
    },
}
