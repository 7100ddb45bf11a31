use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::core::models::range::Range;
use crate::core::models::stats::StatsResponse;

/// Why a statistics request produced no payload.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Transport(String),
    /// The server answered outside the 2xx range.
    #[error("HTTP {0}")]
    Status(u16),
    /// The body was not `{"stats": {...}, "trend": [...]}`.
    #[error("unexpected response: {0}")]
    Format(String),
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }
}

/// Outcome of one statistics request, polled on the local task set.
pub type FetchFuture = Pin<Box<dyn Future<Output = Result<StatsResponse, FetchError>>>>;

/// Something that can answer "usage for this range".
pub trait StatsSource {
    fn fetch(&self, range: Range) -> FetchFuture;
}

/// `GET {endpoint}?range=...` against the chat backend.
pub struct HttpStatsSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpStatsSource {
    /// No overlay-level timeout is set; the transport's own limits apply.
    pub fn new(endpoint: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn url_for(&self, range: Range) -> String {
        stats_url(&self.endpoint, range)
    }
}

impl StatsSource for HttpStatsSource {
    fn fetch(&self, range: Range) -> FetchFuture {
        let client = self.client.clone();
        let url = self.url_for(range);
        Box::pin(async move { fetch_stats(&client, &url).await })
    }
}

/// Request URL for one range, respecting any query already on the endpoint.
pub fn stats_url(endpoint: &str, range: Range) -> String {
    let sep = if endpoint.contains('?') { '&' } else { '?' };
    format!("{}{}range={}", endpoint, sep, range.id())
}

async fn fetch_stats(client: &reqwest::Client, url: &str) -> Result<StatsResponse, FetchError> {
    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let body = response
        .text()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| FetchError::Format(e.to_string()))
}
