//! Cache key definitions.

use std::fmt;

use crate::domain::{ContentType, Locale};

const SEPARATOR: &str = "::";

/// Composite key of one cached record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Every entry of a content type in one locale.
    Entries {
        content_type: ContentType,
        locale: Locale,
    },
    /// A single entry in one locale.
    Entry { entry_id: String, locale: Locale },
    /// A resolved asset URL; assets are cached independent of locale.
    Asset { asset_id: String },
}

impl CacheKey {
    pub fn entries(content_type: ContentType, locale: Locale) -> Self {
        Self::Entries {
            content_type,
            locale,
        }
    }

    pub fn entry(entry_id: impl Into<String>, locale: Locale) -> Self {
        Self::Entry {
            entry_id: entry_id.into(),
            locale,
        }
    }

    pub fn asset(asset_id: impl Into<String>) -> Self {
        Self::Asset {
            asset_id: asset_id.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Entries {
                content_type,
                locale,
            } => write!(f, "entries{SEPARATOR}{content_type}{SEPARATOR}{locale}"),
            CacheKey::Entry { entry_id, locale } => {
                write!(f, "entry{SEPARATOR}{entry_id}{SEPARATOR}{locale}")
            }
            CacheKey::Asset { asset_id } => write!(f, "asset{SEPARATOR}{asset_id}"),
        }
    }
}
