//! Typed views over entry field maps, one per content model.
//!
//! Every field is optional in the CMS, so each record carries explicit
//! defaults instead of failing on missing data. A field that is present but
//! has the wrong shape is a decode error.

use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::{Map, Value};
use time::{Date, macros::format_description};

use super::{
    asset::normalize_asset_url,
    content_type::ContentType,
    entry::Entry,
    error::DomainError,
    fields::FieldNode,
};

/// Number of numbered image slots (`img1` … `img20`) on a gallery block.
pub const GALLERY_IMAGE_SLOTS: usize = 20;

/// A decoded asset reference. `url` is absolute when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetRef {
    pub id: String,
    pub url: Option<String>,
    pub title: Option<String>,
}

impl AssetRef {
    pub fn from_value(value: &Value) -> Option<Self> {
        match FieldNode::classify(value) {
            FieldNode::AssetReference(node) => Some(Self {
                id: node.id.to_string(),
                url: node.url.map(normalize_asset_url),
                title: node.title.map(str::to_string),
            }),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for AssetRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        AssetRef::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom("expected an asset reference"))
    }
}

/// A record decoded from the fields of one entry.
pub trait ContentRecord: Sized {
    /// Content models this record can be decoded from.
    const CONTENT_TYPES: &'static [ContentType];

    fn from_fields(entry_id: &str, fields: &Map<String, Value>) -> Result<Self, DomainError>;

    fn from_entry(entry: &Entry) -> Result<Self, DomainError> {
        if let Some(tag) = entry.content_type_tag() {
            let accepted = Self::CONTENT_TYPES
                .iter()
                .any(|content_type| content_type.tag() == tag);
            if !accepted {
                return Err(DomainError::ContentTypeMismatch {
                    entry_id: entry.id().to_string(),
                    expected: Self::CONTENT_TYPES
                        .first()
                        .map(|content_type| content_type.tag())
                        .unwrap_or_default(),
                    actual: tag.to_string(),
                });
            }
        }
        Self::from_fields(entry.id(), &entry.fields)
    }
}

fn decode_fields<T: DeserializeOwned>(
    entry_id: &str,
    fields: &Map<String, Value>,
) -> Result<T, DomainError> {
    // Nulls mean "unset" in the CMS; drop them so serde defaults apply.
    let cleaned: Map<String, Value> = fields
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    T::deserialize(Value::Object(cleaned))
        .map_err(|err| DomainError::field_decode(entry_id, err.to_string()))
}

macro_rules! serde_record {
    ($record:ty, [$($content_type:expr),+ $(,)?]) => {
        impl ContentRecord for $record {
            const CONTENT_TYPES: &'static [ContentType] = &[$($content_type),+];

            fn from_fields(
                entry_id: &str,
                fields: &Map<String, Value>,
            ) -> Result<Self, DomainError> {
                decode_fields(entry_id, fields)
            }
        }
    };
}

/// Generic page copy (`teksti`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextBlock {
    pub hero_image: Option<AssetRef>,
    pub groups_schedule_time: Vec<String>,
    pub groups_schedule_location: Vec<String>,
    pub groups_section_description: String,
    pub join_title: String,
    pub join_description: String,
    pub side_text_rich: Option<Value>,
}

serde_record!(TextBlock, [ContentType::Text]);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SponsorsBlock {
    pub sponsors_images: Vec<AssetRef>,
    pub join_title: String,
    /// The CMS field is named `joinDescriptio`.
    #[serde(rename = "joinDescriptio")]
    pub join_description: String,
    pub side_text_rich: Option<Value>,
}

serde_record!(SponsorsBlock, [ContentType::Sponsors]);

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaqList {
    pub items: Vec<Faq>,
}

impl ContentRecord for FaqList {
    const CONTENT_TYPES: &'static [ContentType] = &[ContentType::Faqs];

    fn from_fields(entry_id: &str, fields: &Map<String, Value>) -> Result<Self, DomainError> {
        let Some(list) = fields.get("faqList").filter(|value| !value.is_null()) else {
            return Ok(Self::default());
        };
        let list = list
            .as_array()
            .ok_or_else(|| DomainError::field_decode(entry_id, "`faqList` is not an array"))?;

        // Unresolved links carry no fields and are skipped.
        let items = list
            .iter()
            .filter_map(|item| match FieldNode::classify(item) {
                FieldNode::EntryReference(node) => node.fields,
                _ => None,
            })
            .map(|faq_fields| decode_fields::<Faq>(entry_id, faq_fields))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { items })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryBlock {
    pub category: String,
    pub images: Vec<AssetRef>,
}

impl ContentRecord for GalleryBlock {
    const CONTENT_TYPES: &'static [ContentType] = &[ContentType::GalleryBlock];

    fn from_fields(entry_id: &str, fields: &Map<String, Value>) -> Result<Self, DomainError> {
        let category = match fields.get("category") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(category)) => category.trim().to_string(),
            Some(_) => {
                return Err(DomainError::field_decode(
                    entry_id,
                    "`category` is not a string",
                ));
            }
        };

        let images = (1..=GALLERY_IMAGE_SLOTS)
            .filter_map(|slot| fields.get(&format!("img{slot}")))
            .filter_map(AssetRef::from_value)
            .collect();

        Ok(Self { category, images })
    }
}

/// Static website imagery (`imazhetEwebit`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WebsiteImages {
    #[serde(rename = "grups")]
    pub groups: Vec<AssetRef>,
    #[serde(rename = "imazhiBallines")]
    pub home_banner: Option<AssetRef>,
    #[serde(rename = "contactImg")]
    pub contact_image: Option<AssetRef>,
}

serde_record!(WebsiteImages, [ContentType::WebsiteImages]);

/// News and blog posts (`ura`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NewsItem {
    pub title: String,
    pub description: String,
    pub author: String,
    pub date: Option<String>,
    pub image: Option<AssetRef>,
}

impl Default for NewsItem {
    fn default() -> Self {
        Self {
            title: "No title".to_string(),
            description: String::new(),
            author: "Unknown".to_string(),
            date: None,
            image: None,
        }
    }
}

impl NewsItem {
    /// Calendar date of the post; the CMS stores ISO 8601 date or datetime.
    pub fn published_on(&self) -> Option<Date> {
        let raw = self.date.as_deref()?;
        let day = raw.get(..10)?;
        Date::parse(day, format_description!("[year]-[month]-[day]")).ok()
    }
}

serde_record!(NewsItem, [ContentType::News]);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TeamMember {
    pub name: String,
    pub role: String,
    pub description: String,
    pub image: Option<AssetRef>,
}

serde_record!(TeamMember, [ContentType::TeamMember]);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AboutContent {
    pub main_title: String,
    pub subtitle: String,
    pub intro_text: String,
    pub hero_image: Option<AssetRef>,
}

serde_record!(AboutContent, [ContentType::About]);

/// Rich-text legal pages.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PolicyDocument {
    pub content: Option<Value>,
}

serde_record!(
    PolicyDocument,
    [ContentType::PrivacyPolicy, ContentType::TermsOfService]
);

/// Like [`ContentRecord::from_entry`] but keeps going past bad entries.
pub fn decode_all<R: ContentRecord>(entries: &[Entry]) -> (Vec<R>, Vec<DomainError>) {
    let mut records = Vec::with_capacity(entries.len());
    let mut errors = Vec::new();
    for entry in entries {
        match R::from_entry(entry) {
            Ok(record) => records.push(record),
            Err(err) => errors.push(err),
        }
    }
    (records, errors)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::Month;

    use super::*;

    fn entry(content_type: &str, fields: Value) -> Entry {
        serde_json::from_value(json!({
            "sys": {
                "id": format!("{content_type}-1"),
                "type": "Entry",
                "contentType": {"sys": {"type": "Link", "linkType": "ContentType", "id": content_type}}
            },
            "fields": fields
        }))
        .expect("entry")
    }

    fn asset(id: &str, url: &str) -> Value {
        json!({"sys": {"id": id, "type": "Asset"}, "fields": {"title": id, "file": {"url": url}}})
    }

    #[test]
    fn team_member_uses_defaults_for_missing_fields() {
        let member = TeamMember::from_entry(&entry(
            "teamMember",
            json!({"name": "Blerta", "role": null, "image": asset("p1", "//images.ctfassets.net/p1.jpg")}),
        ))
        .expect("decode");

        assert_eq!(member.name, "Blerta");
        assert_eq!(member.role, "");
        let image = member.image.expect("image");
        assert_eq!(image.url.as_deref(), Some("https://images.ctfassets.net/p1.jpg"));
    }

    #[test]
    fn news_item_defaults_and_date() {
        let item = NewsItem::from_entry(&entry("ura", json!({"date": "2024-11-05T18:00+01:00"})))
            .expect("decode");

        assert_eq!(item.title, "No title");
        assert_eq!(item.author, "Unknown");
        let date = item.published_on().expect("date");
        assert_eq!((date.year(), date.month(), date.day()), (2024, Month::November, 5));
    }

    #[test]
    fn faq_list_reads_inlined_entries_and_skips_links() {
        let list = FaqList::from_entry(&entry(
            "faqs",
            json!({"faqList": [
                {"sys": {"id": "q1", "type": "Entry"}, "fields": {"question": "Wann?", "answer": "Montags"}},
                {"sys": {"id": "q2", "type": "Link", "linkType": "Entry"}}
            ]}),
        ))
        .expect("decode");

        assert_eq!(
            list.items,
            vec![Faq {
                question: "Wann?".into(),
                answer: "Montags".into()
            }]
        );
    }

    #[test]
    fn gallery_block_collects_numbered_slots_in_order() {
        let block = GalleryBlock::from_entry(&entry(
            "galleryBlock",
            json!({
                "category": "  Festival 2024 ",
                "img2": asset("b", "//x/b.jpg"),
                "img1": asset("a", "//x/a.jpg"),
                "img21": asset("z", "//x/z.jpg"),
                "img3": {"sys": {"type": "Link", "linkType": "Asset", "id": "c"}}
            }),
        ))
        .expect("decode");

        assert_eq!(block.category, "Festival 2024");
        let ids: Vec<_> = block.images.iter().map(|image| image.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert!(block.images[2].url.is_none());
    }

    #[test]
    fn sponsors_block_maps_cms_field_names() {
        let block = SponsorsBlock::from_entry(&entry(
            "sponsors",
            json!({"joinDescriptio": "Werde Sponsor", "sponsorsImages": [asset("s1", "//x/s1.png")]}),
        ))
        .expect("decode");

        assert_eq!(block.join_description, "Werde Sponsor");
        assert_eq!(block.sponsors_images.len(), 1);
    }

    #[test]
    fn policy_document_accepts_both_legal_types() {
        for tag in ["privacyPolicy", "termsService"] {
            let doc = PolicyDocument::from_entry(&entry(tag, json!({"content": {"nodeType": "document"}})))
                .expect("decode");
            assert!(doc.content.is_some());
        }
    }

    #[test]
    fn wrong_content_type_is_rejected() {
        let err = TeamMember::from_entry(&entry("faqs", json!({}))).expect_err("mismatch");
        assert!(matches!(
            err,
            DomainError::ContentTypeMismatch { expected: "teamMember", .. }
        ));
    }

    #[test]
    fn malformed_field_is_a_decode_error() {
        let err = AboutContent::from_entry(&entry("about", json!({"heroImage": "not-an-asset"})))
            .expect_err("bad field");
        assert!(matches!(err, DomainError::FieldDecode { .. }));
    }

    #[test]
    fn decode_all_separates_failures() {
        let entries = vec![
            entry("teamMember", json!({"name": "A"})),
            entry("teamMember", json!({"name": 7})),
        ];
        let (records, errors) = decode_all::<TeamMember>(&entries);
        assert_eq!(records.len(), 1);
        assert_eq!(errors.len(), 1);
    }
}
