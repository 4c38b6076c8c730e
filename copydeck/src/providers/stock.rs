//! Stock photo search clients.
//!
//! Each client asks for `count` results and returns whatever the service gave back (possibly
//! fewer). Pixabay rejects `per_page` below 3, so it over-asks and truncates.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use super::{StockPhoto, StockPhotoSource, ensure_slash, error_for_status};

const PIXABAY_MIN_PER_PAGE: usize = 3;

pub struct Unsplash {
    client: Client,
    base_url: Url,
    access_key: String,
}

impl Unsplash {
    pub fn new(client: Client, base_url: Url, access_key: String) -> Self {
        Self {
            client,
            base_url,
            access_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UnsplashSearch {
    #[serde(default)]
    results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    urls: UnsplashUrls,
    description: Option<String>,
    alt_description: Option<String>,
    user: Option<UnsplashUser>,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    regular: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashUser {
    name: Option<String>,
    links: Option<UnsplashUserLinks>,
}

#[derive(Debug, Deserialize)]
struct UnsplashUserLinks {
    html: Option<String>,
}

#[async_trait]
impl StockPhotoSource for Unsplash {
    fn name(&self) -> &'static str {
        "unsplash"
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, count: usize) -> anyhow::Result<Vec<StockPhoto>> {
        let mut url = ensure_slash(&self.base_url).join("search/photos")?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("per_page", &count.to_string())
            .append_pair("orientation", "landscape");

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .send()
            .await?;
        let body: UnsplashSearch = error_for_status("Unsplash", response).await?.json().await?;

        Ok(body
            .results
            .into_iter()
            .map(|photo| {
                let (photographer, photographer_url) = match photo.user {
                    Some(user) => (user.name, user.links.and_then(|links| links.html)),
                    None => (None, None),
                };
                StockPhoto {
                    url: photo.urls.regular,
                    description: photo.alt_description.or(photo.description),
                    photographer,
                    photographer_url,
                }
            })
            .collect())
    }
}

pub struct Pexels {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl Pexels {
    pub fn new(client: Client, base_url: Url, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PexelsSearch {
    #[serde(default)]
    photos: Vec<PexelsPhoto>,
}

#[derive(Debug, Deserialize)]
struct PexelsPhoto {
    src: PexelsSrc,
    alt: Option<String>,
    photographer: Option<String>,
    photographer_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PexelsSrc {
    large: String,
}

#[async_trait]
impl StockPhotoSource for Pexels {
    fn name(&self) -> &'static str {
        "pexels"
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, count: usize) -> anyhow::Result<Vec<StockPhoto>> {
        let mut url = ensure_slash(&self.base_url).join("search")?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("per_page", &count.to_string());

        let response = self.client.get(url).header("Authorization", &self.api_key).send().await?;
        let body: PexelsSearch = error_for_status("Pexels", response).await?.json().await?;

        Ok(body
            .photos
            .into_iter()
            .map(|photo| StockPhoto {
                url: photo.src.large,
                description: photo.alt.filter(|alt| !alt.is_empty()),
                photographer: photo.photographer,
                photographer_url: photo.photographer_url,
            })
            .collect())
    }
}

pub struct Pixabay {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl Pixabay {
    pub fn new(client: Client, base_url: Url, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PixabaySearch {
    #[serde(default)]
    hits: Vec<PixabayHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PixabayHit {
    #[serde(rename = "webformatURL")]
    webformat_url: String,
    tags: Option<String>,
    user: Option<String>,
    #[serde(rename = "pageURL")]
    page_url: Option<String>,
}

#[async_trait]
impl StockPhotoSource for Pixabay {
    fn name(&self) -> &'static str {
        "pixabay"
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, count: usize) -> anyhow::Result<Vec<StockPhoto>> {
        let mut url = ensure_slash(&self.base_url);
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("q", query)
            .append_pair("image_type", "photo")
            .append_pair("safesearch", "true")
            .append_pair("per_page", &count.max(PIXABAY_MIN_PER_PAGE).to_string());

        let response = self.client.get(url).send().await?;
        let body: PixabaySearch = error_for_status("Pixabay", response).await?.json().await?;

        Ok(body
            .hits
            .into_iter()
            .take(count)
            .map(|hit| StockPhoto {
                url: hit.webformat_url,
                description: hit.tags,
                photographer: hit.user,
                photographer_url: hit.page_url,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_http_client;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn base(server: &MockServer, suffix: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), suffix)).unwrap()
    }

    #[tokio::test]
    async fn test_unsplash_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/photos"))
            .and(query_param("query", "cold brew"))
            .and(query_param("per_page", "2"))
            .and(header("authorization", "Client-ID u-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "urls": {"regular": "https://images.unsplash.com/1"},
                    "alt_description": "iced coffee in a glass",
                    "user": {"name": "Ana", "links": {"html": "https://unsplash.com/@ana"}}
                }]
            })))
            .mount(&server)
            .await;

        let source = Unsplash::new(test_http_client(), base(&server, "/"), "u-key".to_string());
        let photos = source.search("cold brew", 2).await.unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].url, "https://images.unsplash.com/1");
        assert_eq!(photos[0].description.as_deref(), Some("iced coffee in a glass"));
        assert_eq!(photos[0].photographer_url.as_deref(), Some("https://unsplash.com/@ana"));
    }

    #[tokio::test]
    async fn test_pexels_search_keeps_base_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(header("authorization", "p-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "photos": [
                    {"src": {"large": "https://images.pexels.com/a"}, "alt": "", "photographer": "Bo"},
                    {"src": {"large": "https://images.pexels.com/b"}, "alt": "beans"}
                ]
            })))
            .mount(&server)
            .await;

        let source = Pexels::new(test_http_client(), base(&server, "/v1"), "p-key".to_string());
        let photos = source.search("beans", 2).await.unwrap();
        assert_eq!(photos.len(), 2);
        assert!(photos[0].description.is_none());
        assert_eq!(photos[1].description.as_deref(), Some("beans"));
    }

    #[tokio::test]
    async fn test_pixabay_over_asks_then_truncates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/"))
            .and(query_param("key", "x-key"))
            .and(query_param("per_page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": [
                    {"webformatURL": "https://pixabay.com/1.jpg", "tags": "coffee, cup"},
                    {"webformatURL": "https://pixabay.com/2.jpg"},
                    {"webformatURL": "https://pixabay.com/3.jpg"}
                ]
            })))
            .mount(&server)
            .await;

        let source = Pixabay::new(test_http_client(), base(&server, "/api/"), "x-key".to_string());
        let photos = source.search("coffee", 1).await.unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].description.as_deref(), Some("coffee, cup"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("bad key"))
            .mount(&server)
            .await;

        let source = Pexels::new(test_http_client(), base(&server, "/v1/"), "nope".to_string());
        let err = source.search("anything", 1).await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
