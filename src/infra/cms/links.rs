//! Inline resolution of `Link` objects in a delivery API page.
//!
//! A page carries its items plus an `includes` section with the linked
//! entries and assets. Links found in `fields` are replaced by the linked
//! object, recursively, until the include depth is spent. An entry that is
//! already on the current resolution path is left as a link so cyclic
//! content terminates.

use std::collections::HashMap;

use serde_json::{Map, Value};

#[derive(Debug, Default)]
pub struct LinkIndex {
    entries: HashMap<String, Value>,
    assets: HashMap<String, Value>,
}

impl LinkIndex {
    /// Index the page items and the `includes.Entry` / `includes.Asset` lists.
    pub fn from_page(items: &[Value], includes: Option<&Value>) -> Self {
        let mut index = Self::default();
        for item in items {
            index.insert(item);
        }
        if let Some(includes) = includes {
            for key in ["Entry", "Asset"] {
                if let Some(list) = includes.get(key).and_then(Value::as_array) {
                    for item in list {
                        index.insert(item);
                    }
                }
            }
        }
        index
    }

    fn insert(&mut self, item: &Value) {
        let Some(id) = item.pointer("/sys/id").and_then(Value::as_str) else {
            return;
        };
        match item.pointer("/sys/type").and_then(Value::as_str) {
            Some("Entry") => {
                self.entries.insert(id.to_string(), item.clone());
            }
            Some("Asset") => {
                self.assets.insert(id.to_string(), item.clone());
            }
            _ => {}
        }
    }

    /// Return `item` with the links in its fields resolved up to `depth` levels.
    pub fn resolve_item(&self, item: &Value, depth: u8) -> Value {
        let mut resolved = item.clone();
        let mut path = Vec::new();
        if let Some(id) = item.pointer("/sys/id").and_then(Value::as_str) {
            path.push(id.to_string());
        }
        if let Some(fields) = resolved.get_mut("fields") {
            self.resolve_value(fields, depth, &mut path);
        }
        resolved
    }

    fn resolve_value(&self, value: &mut Value, depth: u8, path: &mut Vec<String>) {
        if let Some((link_type, id)) = link_target(value) {
            if let Some(target) = self.lookup(link_type, id, depth, path) {
                *value = target;
            }
            return;
        }

        match value {
            Value::Array(items) => {
                for item in items {
                    self.resolve_value(item, depth, path);
                }
            }
            Value::Object(map) => self.resolve_map(map, depth, path),
            _ => {}
        }
    }

    fn resolve_map(&self, map: &mut Map<String, Value>, depth: u8, path: &mut Vec<String>) {
        for value in map.values_mut() {
            self.resolve_value(value, depth, path);
        }
    }

    fn lookup(
        &self,
        link_type: &str,
        id: &str,
        depth: u8,
        path: &mut Vec<String>,
    ) -> Option<Value> {
        if depth == 0 {
            return None;
        }

        match link_type {
            "Asset" => self.assets.get(id).cloned(),
            "Entry" => {
                if path.iter().any(|seen| seen == id) {
                    return None;
                }
                let mut entry = self.entries.get(id)?.clone();
                path.push(id.to_string());
                if let Some(fields) = entry.get_mut("fields") {
                    self.resolve_value(fields, depth - 1, path);
                }
                path.pop();
                Some(entry)
            }
            _ => None,
        }
    }
}

fn link_target(value: &Value) -> Option<(&str, &str)> {
    let sys = value.get("sys")?;
    if sys.get("type").and_then(Value::as_str) != Some("Link") {
        return None;
    }
    let link_type = sys.get("linkType").and_then(Value::as_str)?;
    let id = sys.get("id").and_then(Value::as_str)?;
    Some((link_type, id))
}
