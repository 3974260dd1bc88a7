//! GBIF species search client.

use super::TaxonomyLookup;
use crate::config::TaxonomyConfig;
use crate::constants::gbif::{LIMIT, OFFSET};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Species search response; only the fields the lookup needs.
#[derive(Debug, Deserialize)]
struct SpeciesSearch {
    #[serde(default)]
    results: Vec<SpeciesRecord>,
}

#[derive(Debug, Deserialize)]
struct SpeciesRecord {
    key: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
enum LookupError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(StatusCode),

    #[error("unexpected response body: {0}")]
    Body(#[from] serde_json::Error),
}

/// Client for `GET <base_url>?name=<latin name>&offset=0&limit=1`.
#[derive(Debug, Clone)]
pub struct GbifClient {
    client: Client,
    base_url: String,
}

impl GbifClient {
    /// Create a client with a whole-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| Error::HttpClient { source })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Create a client from the `[taxonomy]` config section.
    pub fn from_config(config: &TaxonomyConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Endpoint this client queries.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn lookup(&self, latin_name: &str) -> std::result::Result<Option<i64>, LookupError> {
        let params = [
            ("name", latin_name.to_string()),
            ("offset", OFFSET.to_string()),
            ("limit", LIMIT.to_string()),
        ];

        info!("GBIF API Request - URL: {}", self.base_url);
        info!("GBIF API Request - Parameters: {:?}", params);
        info!("GBIF API Request - Species: {}", latin_name);

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        info!("GBIF API Response - Status Code: {}", status.as_u16());
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }

        let body = response.text().await?;
        debug!("GBIF API Response - Data: {}", body);

        let search: SpeciesSearch = serde_json::from_str(&body)?;
        let key = search.results.first().and_then(|record| record.key);
        match key {
            Some(key) => info!("GBIF API Success - Found species ID {key} for {latin_name}"),
            None => warn!("GBIF API Warning - No species found for: {latin_name}"),
        }
        Ok(key)
    }
}

#[async_trait]
impl TaxonomyLookup for GbifClient {
    async fn species_key(&self, latin_name: &str) -> Option<i64> {
        match self.lookup(latin_name).await {
            Ok(key) => key,
            Err(e) => {
                error!("GBIF API Error - Request failed for {latin_name}: {e}");
                error!("GBIF API Error - URL: {}", self.base_url);
                None
            }
        }
    }
}
