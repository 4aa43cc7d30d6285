//! Content types modelled in the CMS.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Every CMS content model the site reads. The tags are the CMS identifiers
/// and are used verbatim in API queries and cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    /// Generic page copy (`teksti`).
    #[serde(rename = "teksti")]
    Text,
    #[serde(rename = "sponsors")]
    Sponsors,
    #[serde(rename = "faqs")]
    Faqs,
    #[serde(rename = "galleryBlock")]
    GalleryBlock,
    /// Static website imagery (`imazhetEwebit`).
    #[serde(rename = "imazhetEwebit")]
    WebsiteImages,
    /// News and blog posts (`ura`).
    #[serde(rename = "ura")]
    News,
    #[serde(rename = "teamMember")]
    TeamMember,
    #[serde(rename = "partner")]
    Partner,
    #[serde(rename = "about")]
    About,
    #[serde(rename = "privacyPolicy")]
    PrivacyPolicy,
    #[serde(rename = "termsService")]
    TermsOfService,
}

impl ContentType {
    /// Sync order.
    pub const ALL: [ContentType; 11] = [
        ContentType::Text,
        ContentType::Sponsors,
        ContentType::Faqs,
        ContentType::GalleryBlock,
        ContentType::WebsiteImages,
        ContentType::News,
        ContentType::TeamMember,
        ContentType::Partner,
        ContentType::About,
        ContentType::PrivacyPolicy,
        ContentType::TermsOfService,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            ContentType::Text => "teksti",
            ContentType::Sponsors => "sponsors",
            ContentType::Faqs => "faqs",
            ContentType::GalleryBlock => "galleryBlock",
            ContentType::WebsiteImages => "imazhetEwebit",
            ContentType::News => "ura",
            ContentType::TeamMember => "teamMember",
            ContentType::Partner => "partner",
            ContentType::About => "about",
            ContentType::PrivacyPolicy => "privacyPolicy",
            ContentType::TermsOfService => "termsService",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ContentType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ContentType::ALL
            .into_iter()
            .find(|content_type| content_type.tag() == value)
            .ok_or_else(|| DomainError::unknown_content_type(value))
    }
}
