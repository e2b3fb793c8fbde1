use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info};

use crate::types::Website;

/// Errors produced at the fetch boundary.
///
/// Aggregation itself is total over its inputs; only fetching and decoding the
/// upstream response can fail.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(StatusCode),

    #[error("could not decode website list: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Client for the websites API.
///
/// Fetches the raw website collection from `GET {base}/websites`, filtered by
/// a comma-separated list of tag names.
pub struct WebsiteClient {
    client: Client,
    base_url: String,
}

impl WebsiteClient {
    /// Create a client for the API at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Fetch all websites tagged with any of the given tag names.
    pub async fn fetch_websites(&self, tags: &[String]) -> Result<Vec<Website>, FetchError> {
        let url = format!("{}/websites", self.base_url);
        debug!(url = %url, tags = %tags.join(","), "fetching websites");

        let response = self
            .client
            .get(&url)
            .query(&[("tags", tags.join(","))])
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body = response.text().await?;
        let websites = decode_websites(&body)?;
        info!(count = websites.len(), "fetched websites");
        Ok(websites)
    }
}

/// Decode the JSON body of a websites response.
///
/// The upstream returns an empty JSON object instead of a list when the tag
/// filter is empty; treat that as an empty website list.
pub fn decode_websites(body: &str) -> Result<Vec<Website>, FetchError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    match value {
        serde_json::Value::Object(map) if map.is_empty() => Ok(Vec::new()),
        other => Ok(serde_json::from_value(other)?),
    }
}
