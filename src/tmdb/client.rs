use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use super::types::{GenreList, MovieList};

pub const GENRE_LIST: &str = "/genre/movie/list";
pub const POPULAR: &str = "/movie/popular";
pub const SEARCH: &str = "/search/movie";
pub const DISCOVER: &str = "/discover/movie";

pub type Params = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("TMDB error: HTTP {0}")]
    Status(u16),
    #[error("Invalid response body: {0}")]
    Decode(String),
}

/// Access to the movie catalog. `call` is the only required method; the
/// typed helpers decode the endpoints this application uses.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn call(&self, endpoint: &str, params: Params) -> Result<Value, ApiError>;

    async fn genre_list(&self) -> Result<GenreList, ApiError> {
        let body = self.call(GENRE_LIST, Vec::new()).await?;
        decode(GENRE_LIST, body)
    }

    async fn popular(&self) -> Result<MovieList, ApiError> {
        let body = self.call(POPULAR, Vec::new()).await?;
        decode(POPULAR, body)
    }

    async fn search(&self, query: &str) -> Result<MovieList, ApiError> {
        let params = vec![("query".to_string(), query.to_string())];
        let body = self.call(SEARCH, params).await?;
        decode(SEARCH, body)
    }

    async fn discover_by_genre(&self, genre_id: u64) -> Result<MovieList, ApiError> {
        let params = vec![
            ("with_genres".to_string(), genre_id.to_string()),
            ("sort_by".to_string(), "popularity.desc".to_string()),
        ];
        let body = self.call(DISCOVER, params).await?;
        decode(DISCOVER, body)
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| {
        error!(endpoint, "TMDB response did not match expected shape: {}", e);
        ApiError::Decode(e.to_string())
    })
}

pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn url_for(&self, endpoint: &str, params: Params) -> String {
        build_url(&self.base_url, endpoint, params, &self.api_key)
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn call(&self, endpoint: &str, params: Params) -> Result<Value, ApiError> {
        let url = self.url_for(endpoint, params);
        debug!(endpoint, "TMDB request");

        let response = self.http.get(&url).send().await.map_err(|e| {
            error!(endpoint, "TMDB fetch error: {}", e);
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(endpoint, status = status.as_u16(), "TMDB fetch error");
            return Err(ApiError::Status(status.as_u16()));
        }

        response.json::<Value>().await.map_err(|e| {
            error!(endpoint, "TMDB fetch error: {}", e);
            ApiError::Decode(e.to_string())
        })
    }
}

/// Build `{base}{endpoint}?{params}&api_key={key}`.
pub fn build_url(base_url: &str, endpoint: &str, mut params: Params, api_key: &str) -> String {
    params.push(("api_key".to_string(), api_key.to_string()));

    let query: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect();

    format!("{}{}?{}", base_url, endpoint, query.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tmdb::fake::FakeApi;
    use serde_json::json;

    #[test]
    fn test_build_url_appends_key_last() {
        let url = build_url(
            "https://api.themoviedb.org/3",
            SEARCH,
            vec![("query".to_string(), "The Matrix & co".to_string())],
            "k3y",
        );
        assert_eq!(
            url,
            "https://api.themoviedb.org/3/search/movie?query=The%20Matrix%20%26%20co&api_key=k3y"
        );
    }

    #[test]
    fn test_build_url_no_params() {
        let url = build_url("http://x/3", POPULAR, Vec::new(), "k");
        assert_eq!(url, "http://x/3/movie/popular?api_key=k");
    }

    #[test]
    fn test_client_trims_base() {
        let client = TmdbClient::new("http://x/3/", "k", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url_for(GENRE_LIST, Vec::new()), "http://x/3/genre/movie/list?api_key=k");
    }

    #[tokio::test]
    async fn test_discover_params() {
        let api = FakeApi::new().respond(DISCOVER, json!({"results": []}));
        let list = api.discover_by_genre(28).await.unwrap();
        assert_eq!(list.results.unwrap().len(), 0);

        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, DISCOVER);
        assert_eq!(
            calls[0].1,
            vec![
                ("with_genres".to_string(), "28".to_string()),
                ("sort_by".to_string(), "popularity.desc".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_decode_error() {
        let api = FakeApi::new().respond(POPULAR, json!({"results": "nope"}));
        let err = api.popular().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = TmdbClient::new("http://127.0.0.1:1/3", "k", Duration::from_secs(2)).unwrap();
        let err = client.call(POPULAR, Vec::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
