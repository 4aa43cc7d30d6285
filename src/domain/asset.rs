//! CMS assets and URL normalization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Make a CMS file URL absolute. Protocol-relative URLs (`//host/path`) get
/// an `https:` scheme; anything else is returned unchanged, so the function
/// is idempotent.
pub fn normalize_asset_url(raw: &str) -> String {
    if raw.starts_with("//") {
        format!("https:{raw}")
    } else {
        raw.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSys {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetFile {
    /// Absent while the CMS is still processing an upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(
        rename = "contentType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<String>,
    #[serde(rename = "fileName", default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<AssetFile>,
}

/// A binary resource (image) managed by the CMS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub sys: AssetSys,
    #[serde(default)]
    pub fields: AssetFields,
}

impl Asset {
    pub fn id(&self) -> &str {
        &self.sys.id
    }

    /// Absolute file URL, when the asset has a file attached.
    pub fn resolved_url(&self) -> Option<String> {
        self.fields
            .file
            .as_ref()
            .and_then(|file| file.url.as_deref())
            .map(normalize_asset_url)
    }
}
