//! Blocking HTTP client for the Druid router.

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::timeline::TimelineError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8888";

impl From<reqwest::Error> for TimelineError {
    fn from(e: reqwest::Error) -> Self {
        TimelineError::Fetch(format!("Request failed: {}", e))
    }
}

#[derive(Clone)]
pub struct DruidClient {
    client: Client,
    base_url: String,
}

impl DruidClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the router is up
    pub fn health(&self) -> Result<bool, TimelineError> {
        let url = format!("{}/status/health", self.base_url);
        let resp = self.client.get(&url).send()?;
        if resp.status().is_success() {
            Ok(true)
        } else {
            Err(TimelineError::Fetch(format!("API returned status: {}", resp.status())))
        }
    }

    pub fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TimelineError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);
        let resp = self.client.get(&url).send()?;

        if !resp.status().is_success() {
            return Err(TimelineError::Fetch(format!("API error: {} ({})", resp.status(), path)));
        }

        resp.json()
            .map_err(|e| TimelineError::InvalidData(format!("Failed to parse response: {}", e)))
    }

    pub fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, TimelineError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {}", url);
        let resp = self.client.post(&url).json(body).send()?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().unwrap_or_default();
            return Err(TimelineError::Fetch(format!("API error: {} {}", status, detail.trim())));
        }

        resp.json()
            .map_err(|e| TimelineError::InvalidData(format!("Failed to parse response: {}", e)))
    }
}
