use super::traits::{SourceError, SourceProvider};
use crate::client::HttpClientConfig;
use crate::config::NyaaConfig;
use crate::models::{FieldValue, Game, Resource};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use roxmltree::{Document, Node};
use std::time::Instant;
use tracing::{debug, info};

const SOURCE_NAME: &str = "Nyaa";

/// Label of the single resource synthesized for a feed entry
pub const LINK_RESOURCE_NAME: &str = "magnet/download link";

/// Resource type of the synthesized resource
pub const LINK_RESOURCE_TYPE: &str = "BitTorrent";

/// Nyaa RSS feed source.
///
/// The feed's `<link>` already carries the download locator, so it doubles as
/// the game id and resolving never touches the network.
pub struct NyaaProvider {
    client: Client,
    base_url: String,
    category: String,
}

impl NyaaProvider {
    /// Create a new Nyaa source
    pub fn new(config: &NyaaConfig, http: &HttpClientConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: http.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            category: config.category.clone(),
        })
    }

    /// Build the feed URL for a keyword
    fn build_feed_url(&self, keyword: &str) -> String {
        format!(
            "{}/?page=rss&c={}&q={}",
            self.base_url,
            self.category,
            urlencoding::encode(keyword)
        )
    }

    /// Parse the RSS document into games, one per `<item>`
    fn parse_feed(xml: &str) -> Result<Vec<Game>, SourceError> {
        let doc = Document::parse(xml)
            .map_err(|e| SourceError::parse(format!("Nyaa feed: failed to parse XML: {e}")))?;

        let games: Vec<Game> = doc
            .descendants()
            .filter(|n| n.has_tag_name("item"))
            .map(|item| {
                let link = child_text(item, "link");
                Game {
                    name: child_text(item, "title"),
                    introduction: format!("published: {}", child_text(item, "pubDate")),
                    platform: vec!["PC".to_string()],
                    source: SOURCE_NAME.to_string(),
                    id: link,
                }
            })
            .collect();

        debug!("Parsed {} items from Nyaa feed", games.len());
        Ok(games)
    }
}

/// Text content of the first descendant named `tag`, empty when missing
fn child_text(element: Node<'_, '_>, tag: &str) -> String {
    element
        .descendants()
        .find(|n| n.is_element() && n.has_tag_name(tag))
        .map(|n| {
            n.descendants()
                .filter(Node::is_text)
                .filter_map(|t| t.text())
                .collect::<String>()
                .trim()
                .to_string()
        })
        .unwrap_or_default()
}

#[async_trait]
impl SourceProvider for NyaaProvider {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn description(&self) -> &str {
        "Nyaa - BitTorrent feed filtered to the software/games category"
    }

    async fn search(&self, keyword: &str) -> Result<Vec<Game>, SourceError> {
        let start_time = Instant::now();
        info!("Searching Nyaa for: {}", keyword);

        let url = self.build_feed_url(keyword);
        debug!("Nyaa feed URL: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::from_transport(SOURCE_NAME, &e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(SourceError::status(
                status.as_u16(),
                format!("Nyaa returned {status}"),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::from_transport(SOURCE_NAME, &e))?;

        let games = Self::parse_feed(&body)?;
        info!(
            "Nyaa search completed: {} games found in {:?}",
            games.len(),
            start_time.elapsed()
        );
        Ok(games)
    }

    async fn resolve(&self, id: &str) -> Result<Vec<Resource>, SourceError> {
        // TODO: fall back to a magnet built from <nyaa:infoHash> when <link> is a page URL.
        Ok(vec![Resource {
            name: Some(LINK_RESOURCE_NAME.to_string()),
            content: Some(FieldValue::Single(id.to_string())),
            password: None,
            kind: Some(FieldValue::Single(LINK_RESOURCE_TYPE.to_string())),
        }])
    }
}
