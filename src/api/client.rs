use super::types::{
    FeedResponse, ProfileEnvelope, ProfileFromTextBody, ProfileUpdateBody, SourceId, UserProfile,
};
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Cap on response bodies. Feed pages are a few hundred KB at most.
const MAX_RESPONSE_SIZE: usize = 8 * 1024 * 1024;

/// Per-request timeout. The backend fans out to three upstream APIs
/// plus optional AI ranking, so this is generous.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out after 20s")]
    Timeout,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Feed error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("Invalid request: {0}")]
    InvalidRequest(&'static str),
    #[error("Request task did not complete")]
    Aborted,
}

/// Parameters for one feed page.
#[derive(Debug, Clone, Copy)]
pub struct FeedQuery<'a> {
    pub user_id: &'a str,
    pub sources: &'a [SourceId],
    pub limit: usize,
    pub offset: usize,
    pub api_key: Option<&'a SecretString>,
}

/// Typed client for the opportunity backend.
///
/// Every call is a single attempt; callers decide how to degrade.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Build a client with its own connection pool.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(Duration::from_secs(30))
            .build()?;
        Self::with_client(http, base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, ApiError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(&format!("{}/", trimmed))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidRequest("base URL must use http or https"));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    /// Build the feed URL. `page` carries the offset, and the key is only
    /// sent when non-empty.
    pub fn feed_url(&self, query: &FeedQuery<'_>) -> Result<Url, ApiError> {
        let mut url = self.endpoint("api/feed/")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("user_id", query.user_id)
                .append_pair("sources", &SourceId::join(query.sources))
                .append_pair("limit", &query.limit.to_string())
                .append_pair("page", &query.offset.to_string());
            if let Some(key) = query.api_key {
                let key = key.expose_secret();
                if !key.is_empty() {
                    pairs.append_pair("openai_key", key);
                }
            }
        }
        Ok(url)
    }

    /// `GET /api/feed/`: one page of merged items.
    pub async fn fetch_feed(&self, query: &FeedQuery<'_>) -> Result<FeedResponse, ApiError> {
        if query.limit == 0 {
            return Err(ApiError::InvalidRequest("limit must be greater than zero"));
        }
        if query.sources.is_empty() {
            return Err(ApiError::InvalidRequest("at least one source is required"));
        }

        let url = self.feed_url(query)?;
        tracing::debug!(
            sources = %SourceId::join(query.sources),
            limit = query.limit,
            offset = query.offset,
            ai = query.api_key.is_some(),
            "Fetching feed page"
        );

        let response = send(self.http.get(url)).await?;
        if !response.status().is_success() {
            tracing::warn!(status = response.status().as_u16(), "Feed request failed");
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }

        let feed: FeedResponse = read_json(response).await?;
        tracing::debug!(
            items = feed.items.len(),
            has_more = feed.has_more,
            "Feed page received"
        );
        Ok(feed)
    }

    /// `POST /api/profile/from-text`: let the backend derive a profile from prose.
    pub async fn update_profile_from_text(
        &self,
        raw_input: &str,
        api_key: Option<&SecretString>,
        user_id: &str,
    ) -> Result<UserProfile, ApiError> {
        let body = ProfileFromTextBody {
            user_id,
            raw_input,
            openai_api_key: api_key.map(|k| k.expose_secret()).unwrap_or(""),
        };
        self.post_profile("api/profile/from-text", &body).await
    }

    /// `POST /api/profile/update`: store structured keywords and focus.
    pub async fn update_profile_direct(
        &self,
        keywords: &str,
        focus: &str,
        api_key: Option<&SecretString>,
        user_id: &str,
    ) -> Result<UserProfile, ApiError> {
        let body = ProfileUpdateBody {
            user_id,
            keywords,
            focus,
            openai_api_key: api_key.map(|k| k.expose_secret()).unwrap_or(""),
        };
        self.post_profile("api/profile/update", &body).await
    }

    /// `GET /api/profile/{user_id}`: the server's stored profile.
    pub async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, ApiError> {
        let mut url = self.endpoint("api/profile/")?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest("base URL cannot carry a path"))?
            .pop_if_empty()
            .push(user_id);

        let response = send(self.http.get(url)).await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }
        let envelope: ProfileEnvelope = read_json(response).await?;
        Ok(envelope.profile)
    }

    /// The profile endpoints are decoded without a status gate; a non-2xx
    /// body only fails if it lacks a `profile` field.
    async fn post_profile<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<UserProfile, ApiError> {
        let url = self.endpoint(path)?;
        let payload = serde_json::to_vec(body)?;

        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        let response = send(request).await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(path, status = status.as_u16(), "Profile endpoint returned error status");
        }

        let envelope: ProfileEnvelope = read_json(response).await?;
        tracing::info!(path, keywords = %envelope.profile.keywords, "Profile updated");
        Ok(envelope.profile)
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
    tokio::time::timeout(REQUEST_TIMEOUT, request.send())
        .await
        .map_err(|_| ApiError::Timeout)?
        .map_err(ApiError::Network)
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let bytes = read_limited(response, MAX_RESPONSE_SIZE).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn read_limited(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
