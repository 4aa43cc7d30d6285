//! Contentful Content Delivery API client.

mod links;

pub use links::LinkIndex;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use crate::application::repos::{CmsClient, CmsError, EntryQuery};
use crate::application::sync::DEFAULT_INCLUDE_DEPTH;
use crate::config::CmsSettings;
use crate::domain::{Asset, Entry, Locale};

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    includes: Option<Value>,
}

#[derive(Clone, Debug)]
pub struct ContentfulClient {
    client: Client,
    base: Url,
    access_token: String,
    include_depth: u8,
}

impl ContentfulClient {
    pub fn new(
        base_url: &Url,
        space_id: &str,
        environment: &str,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CmsError> {
        let mut root = base_url.clone();
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        let base = root
            .join(&format!("spaces/{space_id}/environments/{environment}/"))
            .map_err(|err| CmsError::Configuration(err.to_string()))?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()
            .map_err(|err| CmsError::Configuration(err.to_string()))?;

        Ok(Self {
            client,
            base,
            access_token: access_token.into(),
            include_depth: DEFAULT_INCLUDE_DEPTH,
        })
    }

    pub fn from_settings(settings: &CmsSettings) -> Result<Self, CmsError> {
        let space_id = settings
            .space_id
            .as_deref()
            .ok_or_else(|| CmsError::Configuration("cms.space_id is not set".into()))?;
        let access_token = settings
            .access_token
            .as_deref()
            .ok_or_else(|| CmsError::Configuration("cms.access_token is not set".into()))?;

        Self::new(
            &settings.base_url,
            space_id,
            &settings.environment,
            access_token,
            settings.timeout,
        )
    }

    /// Link depth used for single-entry lookups and queries without one.
    pub fn with_include_depth(mut self, depth: u8) -> Self {
        self.include_depth = depth;
        self
    }

    pub fn user_agent() -> &'static str {
        concat!("ura-sync/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Environment URL with `segments` appended, each percent-encoded as a
    /// single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, CmsError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| CmsError::Configuration(format!("{} cannot be a base", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, CmsError> {
        let mut url = self.endpoint(segments)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        debug!(target = "ura_sync::cms", url = %url, "cms request");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|err| CmsError::Transport(err.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| CmsError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(CmsError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        serde_json::from_slice(&bytes).map_err(|err| CmsError::Decode(err.to_string()))
    }

    async fn entry_page(
        &self,
        query: &[(&str, String)],
        depth: u8,
    ) -> Result<Vec<Entry>, CmsError> {
        let page: Page<Value> = self.get(&["entries"], query).await?;
        let index = LinkIndex::from_page(&page.items, page.includes.as_ref());

        page.items
            .iter()
            .map(|item| {
                serde_json::from_value(index.resolve_item(item, depth))
                    .map_err(|err| CmsError::Decode(err.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl CmsClient for ContentfulClient {
    async fn entries(&self, query: &EntryQuery) -> Result<Vec<Entry>, CmsError> {
        let depth = query.include.unwrap_or(self.include_depth);
        let mut params = vec![
            ("content_type", query.content_type.tag().to_string()),
            ("locale", query.locale.as_str().to_string()),
            ("include", depth.to_string()),
        ];
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(order) = &query.order {
            params.push(("order", order.clone()));
        }

        self.entry_page(&params, depth).await
    }

    async fn entry(&self, id: &str, locale: Locale) -> Result<Entry, CmsError> {
        let params = [
            ("sys.id", id.to_string()),
            ("locale", locale.as_str().to_string()),
            ("include", self.include_depth.to_string()),
        ];

        self.entry_page(&params, self.include_depth)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CmsError::not_found("entry", id))
    }

    async fn asset(&self, id: &str, locale: Locale) -> Result<Asset, CmsError> {
        let params = [("locale", locale.as_str().to_string())];
        match self.get::<Asset>(&["assets", id], &params).await {
            Err(CmsError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(CmsError::not_found("asset", id))
            }
            other => other,
        }
    }

    async fn assets(&self, locale: Locale, limit: u32) -> Result<Vec<Asset>, CmsError> {
        let params = [
            ("locale", locale.as_str().to_string()),
            ("limit", limit.to_string()),
        ];
        let page: Page<Asset> = self.get(&["assets"], &params).await?;
        Ok(page.items)
    }
}
