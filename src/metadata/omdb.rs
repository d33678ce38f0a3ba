use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{MetadataFetcher, MetadataQuery, MetadataRecord};
use crate::errors::MetadataError;

/// OMDb client for title lookups
#[derive(Debug)]
pub struct OmdbClient {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL
    endpoint: String,
}

/// OMDb title record
#[derive(Debug, Deserialize)]
pub struct OmdbResponse {
    /// "True" or "False"
    #[serde(rename = "Response")]
    pub response: String,

    /// Error message when `response` is "False"
    #[serde(rename = "Error", default)]
    pub error: Option<String>,

    #[serde(rename = "Title", default)]
    pub title: Option<String>,

    #[serde(rename = "Genre", default)]
    pub genre: Option<String>,

    #[serde(rename = "Country", default)]
    pub country: Option<String>,

    #[serde(rename = "Language", default)]
    pub language: Option<String>,

    #[serde(rename = "Type", default)]
    pub record_type: Option<String>,

    #[serde(rename = "imdbID", default)]
    pub imdb_id: Option<String>,

    #[serde(rename = "seriesID", default)]
    pub series_id: Option<String>,
}

// OMDb reports unknown fields as "N/A"
fn known(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "N/A")
}

impl OmdbResponse {
    fn into_record(self, fallback_id: &str) -> MetadataRecord {
        MetadataRecord {
            imdb_id: known(self.imdb_id).unwrap_or_else(|| fallback_id.to_string()),
            title: known(self.title),
            series_title: None,
            series_imdb_id: known(self.series_id),
            genre: known(self.genre),
            country: known(self.country),
            language: known(self.language),
        }
    }

    fn is_episode(&self) -> bool {
        self.record_type.as_deref() == Some("episode")
    }
}

impl OmdbClient {
    /// Create a new OMDb client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Build the request URL for a set of query parameters
    pub fn request_url(&self, params: &[(&str, String)]) -> Result<Url, MetadataError> {
        let base = format!("{}/", self.endpoint.trim_end_matches('/'));
        let mut all: Vec<(&str, String)> = vec![("apikey", self.api_key.clone())];
        all.extend(params.iter().cloned());

        Url::parse_with_params(&base, &all).map_err(|e| MetadataError::RequestFailed(format!("Invalid endpoint {}: {}", base, e)))
    }

    /// Query parameters for a title search
    pub fn query_params(query: &MetadataQuery) -> Vec<(&'static str, String)> {
        match query {
            MetadataQuery::Movie { title, year } => {
                let mut params = vec![("t", title.clone()), ("type", "movie".to_string())];
                if let Some(year) = year {
                    params.push(("y", year.to_string()));
                }
                params
            }
            MetadataQuery::Episode { series, season, episode } => vec![
                ("t", series.clone()),
                ("Season", season.to_string()),
                ("Episode", episode.to_string()),
            ],
        }
    }

    /// Send a request and decode the record
    async fn get(&self, params: &[(&str, String)]) -> Result<OmdbResponse, MetadataError> {
        let url = self.request_url(params)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MetadataError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OMDb API error ({}): {}", status, error_text);
            return Err(MetadataError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        let record = response
            .json::<OmdbResponse>()
            .await
            .map_err(|e| MetadataError::ParseError(e.to_string()))?;

        if !record.response.eq_ignore_ascii_case("true") {
            let message = record.error.unwrap_or_else(|| "unknown error".to_string());
            return Err(MetadataError::NotFound(message));
        }

        Ok(record)
    }
}

#[async_trait]
impl MetadataFetcher for OmdbClient {
    async fn lookup_id(&self, query: &MetadataQuery) -> Result<String, MetadataError> {
        let record = self.get(&Self::query_params(query)).await?;
        known(record.imdb_id).ok_or_else(|| MetadataError::NotFound(format!("{:?}", query)))
    }

    async fn fetch_metadata(&self, imdb_id: &str) -> Result<MetadataRecord, MetadataError> {
        let response = self.get(&[("i", imdb_id.to_string())]).await?;
        let is_episode = response.is_episode();
        let mut record = response.into_record(imdb_id);

        if is_episode {
            if let Some(series_id) = record.series_imdb_id.clone() {
                let series = self.get(&[("i", series_id)]).await?;
                record.series_title = known(series.title);
                // Episodes carry no genre/country of their own on OMDb
                if record.genre.is_none() {
                    record.genre = known(series.genre);
                }
                if record.country.is_none() {
                    record.country = known(series.country);
                }
            }
        }

        Ok(record)
    }
}
