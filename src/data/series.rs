//! Client for the per-country total series endpoint
//!
//! Fetches `/total/country/<slug>` and turns the JSON array into
//! [`DailyTotals`] records.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;

use super::transport::{HttpTransport, TransportError};
use super::DailyTotals;

/// Base URL of the public COVID-19 API
pub const DEFAULT_API_URL: &str = "https://api.covid19api.com";

/// Errors that can occur when fetching one country's series
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a body
    #[error("request for {slug} failed: {source}")]
    RemoteFetch {
        slug: String,
        #[source]
        source: TransportError,
    },

    /// The body was not the expected array of records
    #[error("unexpected response for {slug}: {reason}")]
    ResponseFormat { slug: String, reason: String },

    /// The country slug can't be used in a request path
    #[error("invalid country slug {0:?}")]
    InvalidCountry(String),
}

/// A single record of the series response
#[derive(Debug, Deserialize)]
struct SeriesRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Confirmed")]
    confirmed: u32,
    #[serde(rename = "Deaths")]
    deaths: u32,
    #[serde(rename = "Recovered")]
    recovered: u32,
}

/// Client for fetching country series from the remote API
#[derive(Clone)]
pub struct SeriesClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl SeriesClient {
    pub fn with_base_url(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// URL of the series endpoint for a country
    pub fn series_url(&self, slug: &str) -> String {
        format!("{}/total/country/{}", self.base_url, slug)
    }

    /// Fetch the full daily series for one country
    ///
    /// Issues exactly one request. Transport failures map to
    /// [`FetchError::RemoteFetch`], bodies that don't parse to
    /// [`FetchError::ResponseFormat`].
    pub async fn fetch_series(&self, slug: &str) -> Result<Vec<DailyTotals>, FetchError> {
        if slug.trim().is_empty() || slug.contains('/') {
            return Err(FetchError::InvalidCountry(slug.to_string()));
        }

        let body = self
            .transport
            .get_text(&self.series_url(slug))
            .await
            .map_err(|source| FetchError::RemoteFetch {
                slug: slug.to_string(),
                source,
            })?;

        parse_series(&body).map_err(|reason| FetchError::ResponseFormat {
            slug: slug.to_string(),
            reason,
        })
    }
}

/// Parse a series response body
///
/// Returns a description of the problem when the body is not an array of
/// `{Date, Confirmed, Deaths, Recovered}` records.
pub fn parse_series(body: &str) -> Result<Vec<DailyTotals>, String> {
    let records: Vec<SeriesRecord> = serde_json::from_str(body).map_err(|e| e.to_string())?;

    records
        .into_iter()
        .map(|record| {
            Ok(DailyTotals {
                timestamp: parse_api_date(&record.date)?,
                confirmed: record.confirmed,
                deaths: record.deaths,
                recovered: record.recovered,
            })
        })
        .collect()
}

/// Parse an API date such as "2020-03-01T00:00:00Z", dropping the UTC marker
fn parse_api_date(date: &str) -> Result<NaiveDateTime, String> {
    date.trim_end_matches('Z')
        .parse::<NaiveDateTime>()
        .map_err(|e| format!("invalid date {date:?}: {e}"))
}
