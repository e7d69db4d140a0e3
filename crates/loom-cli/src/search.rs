//! Catalog search
//!
//! Queries the Google Books volumes API and maps volumes to `Book`
//! summaries. Callers turn failures into an empty result and a notice;
//! nothing here retries or caches.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use loom_core::{Book, Config};

/// Fetch timeout in seconds
const FETCH_TIMEOUT: u64 = 10;

/// Shown when a volume has no cover
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/80x120";

/// Author shown when a volume lists none
const UNKNOWN_AUTHOR: &str = "Unknown";

/// Client for the catalog endpoint
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_results: u32,
}

impl CatalogClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT))
            .user_agent("Mozilla/5.0 (compatible; Loom/1.0)")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.search_url.clone(),
            api_key: config.api_key.clone(),
            max_results: config.max_results,
        })
    }

    /// Search volumes matching free text
    ///
    /// A blank query returns no results without a request.
    pub async fn search(&self, query: &str) -> Result<Vec<Book>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut url = self.endpoint()?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("maxResults", &self.max_results.to_string());
        self.append_key(&mut url);

        debug!(query, "Searching catalog");
        let body = self.fetch(url).await?;
        parse_search_response(&body)
    }

    /// Look up one volume by id
    pub async fn volume(&self, id: &str) -> Result<Book> {
        let mut url = self.endpoint()?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Search URL cannot have path segments: {}", self.base_url))?
            .pop_if_empty()
            .push(id);
        self.append_key(&mut url);

        debug!(id, "Fetching volume");
        let body = self.fetch(url).await?;
        parse_volume_response(&body)
    }

    fn endpoint(&self) -> Result<Url> {
        Url::parse(&self.base_url).with_context(|| format!("Invalid search URL: {}", self.base_url))
    }

    fn append_key(&self, url: &mut Url) {
        if let Some(ref key) = self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
    }

    async fn fetch(&self, url: Url) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Catalog request failed")?
            .error_for_status()
            .context("Catalog returned an error status")?;

        response
            .text()
            .await
            .context("Failed to read catalog response")
    }
}

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    id: String,
    #[serde(default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    description: Option<String>,
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
}

impl From<Volume> for Book {
    fn from(volume: Volume) -> Self {
        let info = volume.volume_info;
        let author = info
            .authors
            .into_iter()
            .next()
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        let image_url = info
            .image_links
            .and_then(|links| links.thumbnail)
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

        Book::new(volume.id, info.title.unwrap_or_default())
            .with_author(author)
            .with_description(info.description.unwrap_or_default())
            .with_image_url(image_url)
    }
}

/// Map a volumes listing to books; a missing `items` array means no results
fn parse_search_response(body: &str) -> Result<Vec<Book>> {
    let response: VolumesResponse =
        serde_json::from_str(body).context("Malformed catalog response")?;
    Ok(response.items.into_iter().map(Book::from).collect())
}

fn parse_volume_response(body: &str) -> Result<Book> {
    let volume: Volume = serde_json::from_str(body).context("Malformed volume response")?;
    Ok(volume.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_response() {
        let body = r#"{
            "kind": "books#volumes",
            "totalItems": 2,
            "items": [
                {
                    "id": "B1",
                    "volumeInfo": {
                        "title": "Dune",
                        "authors": ["Frank Herbert", "Someone Else"],
                        "description": "<p>Desert</p>",
                        "imageLinks": {"thumbnail": "http://img/dune"}
                    }
                },
                {
                    "id": "B2",
                    "volumeInfo": {"title": "Anonymous Work"}
                }
            ]
        }"#;

        let books = parse_search_response(body).unwrap();
        assert_eq!(books.len(), 2);

        assert_eq!(books[0].id, "B1");
        assert_eq!(books[0].author, "Frank Herbert");
        assert_eq!(books[0].image_url.as_deref(), Some("http://img/dune"));
        assert_eq!(books[0].description, "<p>Desert</p>");

        assert_eq!(books[1].author, "Unknown");
        assert_eq!(books[1].description, "");
        assert_eq!(books[1].image_url.as_deref(), Some(PLACEHOLDER_IMAGE));
    }

    #[test]
    fn test_parse_search_without_items() {
        let books = parse_search_response(r#"{"kind":"books#volumes","totalItems":0}"#).unwrap();
        assert!(books.is_empty());
    }

    #[test]
    fn test_parse_malformed_payload() {
        assert!(parse_search_response("<html>oops</html>").is_err());
        assert!(parse_volume_response(r#"{"volumeInfo":{}}"#).is_err());
    }

    #[test]
    fn test_parse_volume_response() {
        let book = parse_volume_response(
            r#"{"id":"B1","volumeInfo":{"title":"Dune","authors":["Frank Herbert"]}}"#,
        )
        .unwrap();
        assert_eq!(book.id, "B1");
        assert_eq!(book.title, "Dune");
    }

    #[tokio::test]
    async fn test_blank_query_makes_no_request() {
        let config = Config {
            // Unroutable; a request would fail
            search_url: "http://127.0.0.1:9/volumes".to_string(),
            ..Config::default()
        };
        let client = CatalogClient::new(&config).unwrap();

        assert!(client.search("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_search_url_is_an_error() {
        let config = Config {
            search_url: "not a url".to_string(),
            ..Config::default()
        };
        let client = CatalogClient::new(&config).unwrap();

        assert!(client.search("dune").await.is_err());
    }
}
