use super::traits::{SourceError, SourceProvider};
use crate::client::HttpClientConfig;
use crate::config::TouchGalConfig;
use crate::models::{Game, Resource};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

const SOURCE_NAME: &str = "TouchGal";

/// One entry of the filter list the search endpoint expects
#[derive(Debug, Serialize)]
struct KeywordFilter<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchOption {
    search_in_introduction: bool,
    search_in_alias: bool,
    search_in_tag: bool,
}

/// Body of `POST /search`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest {
    /// The filter list serialized to a JSON string, not a nested value
    query_string: String,
    limit: u32,
    page: u32,
    selected_type: &'static str,
    selected_language: &'static str,
    selected_platform: &'static str,
    sort_field: &'static str,
    sort_order: &'static str,
    search_option: SearchOption,
    selected_years: Vec<String>,
    selected_months: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    galgames: Option<Vec<GalgameEntry>>,
}

#[derive(Debug, Deserialize)]
struct GalgameEntry {
    #[serde(default)]
    id: serde_json::Value,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    introduction: Option<String>,
    #[serde(default)]
    platform: Option<Vec<String>>,
}

impl GalgameEntry {
    fn into_game(self) -> Game {
        let id = match self.id {
            serde_json::Value::String(id) => id,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };

        Game {
            id,
            name: self.name.unwrap_or_default(),
            introduction: self.introduction.unwrap_or_default(),
            platform: self.platform.unwrap_or_default(),
            source: SOURCE_NAME.to_string(),
        }
    }
}

/// TouchGal JSON API source
pub struct TouchGalProvider {
    client: Client,
    base_url: String,
    page_size: u32,
    cookie: String,
}

impl TouchGalProvider {
    /// Create a new TouchGal source
    pub fn new(config: &TouchGalConfig, http: &HttpClientConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: http.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            cookie: config.nsfw_cookie.clone(),
        })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }

    fn resource_url(&self) -> String {
        format!("{}/patch/resource", self.base_url)
    }

    /// Build the search body, double-encoding the keyword filter into `queryString`
    fn build_search_body(&self, keyword: &str) -> Result<SearchRequest, SourceError> {
        let filters = [KeywordFilter {
            kind: "keyword",
            name: keyword,
        }];
        let query_string = serde_json::to_string(&filters)
            .map_err(|e| SourceError::parse(format!("Failed to encode query filter: {e}")))?;

        Ok(SearchRequest {
            query_string,
            limit: self.page_size,
            page: 1,
            selected_type: "all",
            selected_language: "all",
            selected_platform: "all",
            sort_field: "resource_update_time",
            sort_order: "desc",
            search_option: SearchOption {
                search_in_introduction: true,
                search_in_alias: true,
                search_in_tag: true,
            },
            selected_years: Vec::new(),
            selected_months: Vec::new(),
        })
    }

    fn parse_search_response(body: &str) -> Result<Vec<Game>, SourceError> {
        let response: SearchResponse = serde_json::from_str(body).map_err(|e| {
            warn!("Failed to parse TouchGal search response");
            SourceError::parse(format!("TouchGal search: invalid JSON: {e}"))
        })?;

        Ok(response
            .galgames
            .unwrap_or_default()
            .into_iter()
            .map(GalgameEntry::into_game)
            .collect())
    }

    fn parse_resource_response(body: &str) -> Result<Vec<Resource>, SourceError> {
        serde_json::from_str(body)
            .map_err(|e| SourceError::parse(format!("TouchGal resources: invalid JSON: {e}")))
    }

    async fn read_body(response: reqwest::Response, what: &str) -> Result<String, SourceError> {
        let status = response.status();
        if status != StatusCode::OK {
            return Err(SourceError::status(
                status.as_u16(),
                format!("TouchGal {what} returned {status}"),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::from_transport(SOURCE_NAME, &e))
    }
}

#[async_trait]
impl SourceProvider for TouchGalProvider {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn description(&self) -> &str {
        "TouchGal - galgame catalogue with curated download resources"
    }

    async fn search(&self, keyword: &str) -> Result<Vec<Game>, SourceError> {
        let start_time = Instant::now();
        info!("Searching TouchGal for: {}", keyword);

        let url = self.search_url();
        let body = self.build_search_body(keyword)?;
        debug!("TouchGal search URL: {}", url);

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(COOKIE, &self.cookie)
            .json(&body)
            .send()
            .await
            .map_err(|e| SourceError::from_transport(SOURCE_NAME, &e))?;

        let text = Self::read_body(response, "search").await?;
        let games = Self::parse_search_response(&text)?;

        info!(
            "TouchGal search completed: {} games found in {:?}",
            games.len(),
            start_time.elapsed()
        );
        Ok(games)
    }

    async fn resolve(&self, id: &str) -> Result<Vec<Resource>, SourceError> {
        let url = self.resource_url();
        debug!("Fetching TouchGal resources for patch {}", id);

        let response = self
            .client
            .get(&url)
            .query(&[("patchId", id)])
            .send()
            .await
            .map_err(|e| SourceError::from_transport(SOURCE_NAME, &e))?;

        let text = Self::read_body(response, "resource listing").await?;
        let resources = Self::parse_resource_response(&text)?;

        debug!("TouchGal returned {} resources for patch {}", resources.len(), id);
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;

    fn provider() -> TouchGalProvider {
        TouchGalProvider::new(&TouchGalConfig::default(), &HttpClientConfig::default()).unwrap()
    }

    #[test]
    fn test_search_body_double_encodes_query() {
        let body = provider().build_search_body("千恋＊万花").unwrap();
        let value = serde_json::to_value(&body).unwrap();

        let query_string = value["queryString"].as_str().expect("queryString is a string");
        let inner: serde_json::Value = serde_json::from_str(query_string).unwrap();
        assert_eq!(
            inner,
            serde_json::json!([{"type": "keyword", "name": "千恋＊万花"}])
        );

        assert_eq!(value["limit"], 15);
        assert_eq!(value["page"], 1);
        assert_eq!(value["selectedType"], "all");
        assert_eq!(value["selectedLanguage"], "all");
        assert_eq!(value["selectedPlatform"], "all");
        assert_eq!(value["sortField"], "resource_update_time");
        assert_eq!(value["sortOrder"], "desc");
        assert_eq!(
            value["searchOption"],
            serde_json::json!({"searchInIntroduction": true, "searchInAlias": true, "searchInTag": true})
        );
        assert_eq!(value["selectedYears"], serde_json::json!([]));
        assert_eq!(value["selectedMonths"], serde_json::json!([]));
    }

    #[test]
    fn test_parse_search_response_normalises_missing_fields() {
        let body = r#"{
            "galgames": [
                {"id": 42, "name": "A", "introduction": "intro", "platform": ["PC"], "banner": "x.png"},
                {"id": "43", "name": null, "platform": null},
                {"name": "C"}
            ],
            "total": 3
        }"#;

        let games = TouchGalProvider::parse_search_response(body).unwrap();
        assert_eq!(games.len(), 3);
        assert_eq!(games[0].id, "42");
        assert_eq!(games[0].platform, vec!["PC".to_string()]);
        assert_eq!(games[1].id, "43");
        assert_eq!(games[1].name, "");
        assert_eq!(games[1].introduction, "");
        assert!(games[1].platform.is_empty());
        assert_eq!(games[2].id, "");
        assert!(games.iter().all(|g| g.source == "TouchGal"));
    }

    #[test]
    fn test_parse_search_response_without_galgames() {
        let games = TouchGalProvider::parse_search_response(r#"{"total": 0}"#).unwrap();
        assert!(games.is_empty());
    }

    #[test]
    fn test_parse_search_response_rejects_non_object() {
        let err = TouchGalProvider::parse_search_response(r#""rate limited""#).unwrap_err();
        assert!(matches!(err, SourceError::Protocol { status: None, .. }));
    }

    #[test]
    fn test_parse_resource_response() {
        let body = r#"[
            {"name": "本体", "content": "https://pan.touchgal.net/s/1", "password": "", "type": "pan", "id": 1},
            {"name": "补丁", "content": ["https://a", "https://b"], "type": ["pan", "mirror"]}
        ]"#;

        let resources = TouchGalProvider::parse_resource_response(body).unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].primary_content(), "https://pan.touchgal.net/s/1");
        assert_eq!(resources[0].password(), None);
        assert_eq!(resources[1].primary_content(), "https://a");
        assert_eq!(
            resources[1].kind,
            Some(FieldValue::Multiple(vec!["pan".into(), "mirror".into()]))
        );
    }

    #[test]
    fn test_parse_resource_response_rejects_object() {
        assert!(TouchGalProvider::parse_resource_response(r#"{"error": "nope"}"#).is_err());
    }

    #[test]
    fn test_urls_trim_trailing_slash() {
        let config = TouchGalConfig {
            base_url: "http://localhost:1234/api/".to_string(),
            ..TouchGalConfig::default()
        };
        let provider = TouchGalProvider::new(&config, &HttpClientConfig::default()).unwrap();
        assert_eq!(provider.search_url(), "http://localhost:1234/api/search");
        assert_eq!(provider.resource_url(), "http://localhost:1234/api/patch/resource");
    }
}
