//! CMS entries as plain owned data.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

/// A reference to another CMS object (`{"sys": {"type": "Link", ...}}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub sys: LinkSys,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSys {
    pub id: String,
    #[serde(rename = "type", default = "link_kind")]
    pub kind: String,
    #[serde(rename = "linkType")]
    pub link_type: String,
}

fn link_kind() -> String {
    "Link".to_string()
}

fn entry_kind() -> String {
    "Entry".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySys {
    pub id: String,
    #[serde(rename = "type", default = "entry_kind")]
    pub kind: String,
    #[serde(
        rename = "contentType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Remaining system metadata (revision, timestamps, space) kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One structured content record as returned by the CMS, with linked
/// entries and assets already inlined into `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub sys: EntrySys,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Entry {
    pub fn id(&self) -> &str {
        &self.sys.id
    }

    pub fn content_type_tag(&self) -> Option<&str> {
        self.sys
            .content_type
            .as_ref()
            .map(|link| link.sys.id.as_str())
    }

    /// Returns the raw field value, treating JSON `null` as absent.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|value| !value.is_null())
    }

    /// Decode a field, falling back to `default` when it is missing, null or
    /// of an unexpected shape.
    pub fn field_or<T: DeserializeOwned>(&self, name: &str, default: T) -> T {
        field_or(&self.fields, name, default)
    }
}

pub fn field_or<T: DeserializeOwned>(fields: &Map<String, Value>, name: &str, default: T) -> T {
    match fields.get(name) {
        None | Some(Value::Null) => default,
        Some(value) => T::deserialize(value).unwrap_or(default),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Value {
        json!({
            "metadata": {"tags": []},
            "sys": {
                "id": "5KsDBWseXY6QegucYAoacS",
                "type": "Entry",
                "revision": 3,
                "createdAt": "2025-02-01T10:00:00.000Z",
                "contentType": {"sys": {"type": "Link", "linkType": "ContentType", "id": "teamMember"}},
                "locale": "de"
            },
            "fields": {
                "name": "Arta",
                "role": null,
                "order": 2
            }
        })
    }

    #[test]
    fn decode_preserves_unknown_sys_metadata() {
        let raw = sample();
        let entry: Entry = serde_json::from_value(raw.clone()).expect("decode");

        assert_eq!(entry.id(), "5KsDBWseXY6QegucYAoacS");
        assert_eq!(entry.content_type_tag(), Some("teamMember"));
        assert_eq!(entry.sys.locale.as_deref(), Some("de"));

        let encoded = serde_json::to_value(&entry).expect("encode");
        assert_eq!(encoded, raw);
    }

    #[test]
    fn field_or_uses_default_for_null_missing_and_mismatch() {
        let entry: Entry = serde_json::from_value(sample()).expect("decode");

        assert_eq!(entry.field_or("name", String::new()), "Arta");
        assert_eq!(entry.field_or("role", "member".to_string()), "member");
        assert_eq!(entry.field_or("bio", String::new()), "");
        assert_eq!(entry.field_or("order", String::from("n/a")), "n/a");
        assert_eq!(entry.field_or("order", 0_u32), 2);
        assert!(entry.field("role").is_none());
    }
}
