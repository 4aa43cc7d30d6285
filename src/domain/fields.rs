//! Typed traversal of entry field trees.
//!
//! Field values are arbitrary JSON, but only five shapes matter when
//! walking them: scalars, arrays, plain objects, and references to assets or
//! other entries. [`FieldNode::classify`] maps a value onto that closed set
//! and [`walk`] drives a [`FieldVisitor`] over a whole tree.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::asset::normalize_asset_url;

/// An asset reference, either inlined (`url` present when the asset has a
/// file) or an unresolved link (`url` is `None`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetNode<'a> {
    pub id: &'a str,
    pub url: Option<&'a str>,
    pub title: Option<&'a str>,
}

/// An entry reference. `fields` is present when the entry was inlined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryNode<'a> {
    pub id: &'a str,
    pub fields: Option<&'a Map<String, Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldNode<'a> {
    Scalar(&'a Value),
    Array(&'a [Value]),
    Object(&'a Map<String, Value>),
    AssetReference(AssetNode<'a>),
    EntryReference(EntryNode<'a>),
}

impl<'a> FieldNode<'a> {
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Array(items) => FieldNode::Array(items),
            Value::Object(map) => classify_object(map),
            scalar => FieldNode::Scalar(scalar),
        }
    }
}

fn classify_object(map: &Map<String, Value>) -> FieldNode<'_> {
    let Some(sys) = map.get("sys").and_then(Value::as_object) else {
        return FieldNode::Object(map);
    };
    let Some(id) = sys.get("id").and_then(Value::as_str) else {
        return FieldNode::Object(map);
    };
    let kind = sys.get("type").and_then(Value::as_str);
    let fields = map.get("fields").and_then(Value::as_object);

    match kind {
        Some("Asset") => FieldNode::AssetReference(AssetNode {
            id,
            url: fields
                .and_then(|fields| fields.get("file"))
                .and_then(|file| file.get("url"))
                .and_then(Value::as_str),
            title: fields
                .and_then(|fields| fields.get("title"))
                .and_then(Value::as_str),
        }),
        Some("Entry") => FieldNode::EntryReference(EntryNode { id, fields }),
        Some("Link") => match sys.get("linkType").and_then(Value::as_str) {
            Some("Asset") => FieldNode::AssetReference(AssetNode {
                id,
                url: None,
                title: None,
            }),
            Some("Entry") => FieldNode::EntryReference(EntryNode { id, fields: None }),
            _ => FieldNode::Object(map),
        },
        _ => FieldNode::Object(map),
    }
}

/// Callbacks invoked by [`walk`]. Every method has a no-op default.
pub trait FieldVisitor {
    fn visit_scalar(&mut self, _value: &Value) {}

    fn visit_asset(&mut self, _asset: AssetNode<'_>) {}

    /// Return `false` to skip the fields of an inlined entry.
    fn visit_entry(&mut self, _entry: EntryNode<'_>) -> bool {
        true
    }
}

/// Depth-first traversal. Asset references are leaves; inlined entries are
/// descended through their fields.
pub fn walk<V: FieldVisitor + ?Sized>(visitor: &mut V, value: &Value) {
    match FieldNode::classify(value) {
        FieldNode::Scalar(scalar) => visitor.visit_scalar(scalar),
        FieldNode::Array(items) => {
            for item in items {
                walk(visitor, item);
            }
        }
        FieldNode::Object(map) => walk_fields(visitor, map),
        FieldNode::AssetReference(asset) => visitor.visit_asset(asset),
        FieldNode::EntryReference(entry) => {
            if !visitor.visit_entry(entry) {
                return;
            }
            if let Some(fields) = entry.fields {
                walk_fields(visitor, fields);
            }
        }
    }
}

pub fn walk_fields<V: FieldVisitor + ?Sized>(visitor: &mut V, fields: &Map<String, Value>) {
    for value in fields.values() {
        walk(visitor, value);
    }
}

/// Collects `asset id → absolute URL` for every asset reference that carries
/// a file URL. A later occurrence of the same id replaces the earlier one.
#[derive(Debug, Default, Clone)]
pub struct AssetCollector {
    assets: BTreeMap<String, String>,
}

impl AssetCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.assets.get(id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.assets
            .iter()
            .map(|(id, url)| (id.as_str(), url.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.assets
    }
}

impl FieldVisitor for AssetCollector {
    fn visit_asset(&mut self, asset: AssetNode<'_>) {
        if let Some(url) = asset.url {
            self.assets
                .insert(asset.id.to_string(), normalize_asset_url(url));
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn asset(id: &str, url: &str) -> Value {
        json!({
            "sys": {"id": id, "type": "Asset"},
            "fields": {"title": id, "file": {"url": url}}
        })
    }

    #[test]
    fn classify_covers_every_shape() {
        let scalar = json!("text");
        assert!(matches!(FieldNode::classify(&scalar), FieldNode::Scalar(_)));

        let array = json!([1, 2]);
        assert!(matches!(FieldNode::classify(&array), FieldNode::Array(items) if items.len() == 2));

        let rich_text = json!({"nodeType": "document", "content": []});
        assert!(matches!(FieldNode::classify(&rich_text), FieldNode::Object(_)));

        let inlined = asset("a1", "//x/a1.png");
        assert!(matches!(
            FieldNode::classify(&inlined),
            FieldNode::AssetReference(AssetNode { id: "a1", url: Some("//x/a1.png"), title: Some("a1") })
        ));

        let asset_link = json!({"sys": {"type": "Link", "linkType": "Asset", "id": "a2"}});
        assert!(matches!(
            FieldNode::classify(&asset_link),
            FieldNode::AssetReference(AssetNode { id: "a2", url: None, .. })
        ));

        let entry_link = json!({"sys": {"type": "Link", "linkType": "Entry", "id": "e1"}});
        assert!(matches!(
            FieldNode::classify(&entry_link),
            FieldNode::EntryReference(EntryNode { id: "e1", fields: None })
        ));

        let content_type_link =
            json!({"sys": {"type": "Link", "linkType": "ContentType", "id": "faqs"}});
        assert!(matches!(FieldNode::classify(&content_type_link), FieldNode::Object(_)));
    }

    #[test]
    fn collector_finds_nested_assets_and_normalizes() {
        let fields = json!({
            "title": "Sponsors",
            "logos": [asset("s1", "//images.ctfassets.net/s1.png"), asset("s2", "https://cdn/s2.png")],
            "body": {
                "nodeType": "document",
                "content": [{
                    "nodeType": "embedded-asset-block",
                    "data": {"target": asset("s3", "//images.ctfassets.net/s3.png")}
                }]
            },
            "related": {
                "sys": {"id": "e9", "type": "Entry"},
                "fields": {"cover": asset("s4", "//images.ctfassets.net/s4.png")}
            },
            "pending": {"sys": {"type": "Link", "linkType": "Asset", "id": "s5"}}
        });

        let mut collector = AssetCollector::new();
        walk(&mut collector, &fields);

        assert_eq!(collector.len(), 4);
        assert_eq!(collector.get("s1"), Some("https://images.ctfassets.net/s1.png"));
        assert_eq!(collector.get("s2"), Some("https://cdn/s2.png"));
        assert_eq!(collector.get("s3"), Some("https://images.ctfassets.net/s3.png"));
        assert_eq!(collector.get("s4"), Some("https://images.ctfassets.net/s4.png"));
        assert!(collector.get("s5").is_none());
    }

    #[test]
    fn asset_fields_are_not_descended() {
        let mut nested = asset("outer", "//x/outer.png");
        nested["fields"]["thumbnail"] = asset("inner", "//x/inner.png");

        let mut collector = AssetCollector::new();
        walk(&mut collector, &nested);

        assert_eq!(collector.len(), 1);
        assert!(collector.get("inner").is_none());
    }

    #[test]
    fn visitor_can_skip_inlined_entries() {
        struct TopLevelOnly(AssetCollector);

        impl FieldVisitor for TopLevelOnly {
            fn visit_asset(&mut self, asset: AssetNode<'_>) {
                self.0.visit_asset(asset);
            }

            fn visit_entry(&mut self, _entry: EntryNode<'_>) -> bool {
                false
            }
        }

        let value = json!({
            "image": asset("top", "//x/top.png"),
            "author": {"sys": {"id": "e1", "type": "Entry"}, "fields": {"photo": asset("deep", "//x/deep.png")}}
        });

        let mut visitor = TopLevelOnly(AssetCollector::new());
        walk(&mut visitor, &value);

        assert_eq!(visitor.0.len(), 1);
        assert!(visitor.0.get("top").is_some());
    }
}
