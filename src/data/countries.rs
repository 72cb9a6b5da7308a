//! Country list providers
//!
//! The loader walks countries in the order the provider returns them, so
//! every provider must give a stable order.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::series::FetchError;
use super::transport::HttpTransport;
use super::Country;

/// Supplies the ordered list of countries to load
#[async_trait]
pub trait CountryProvider: Send + Sync {
    async fn countries(&self) -> Result<Vec<Country>, FetchError>;
}

/// A fixed list of countries, returned as given
#[derive(Debug, Clone, Default)]
pub struct StaticCountries {
    countries: Vec<Country>,
}

impl StaticCountries {
    pub fn new(countries: Vec<Country>) -> Self {
        Self { countries }
    }

    /// Builds the list from bare slugs
    pub fn from_slugs<I, S>(slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(slugs.into_iter().map(Country::from_slug).collect())
    }
}

#[async_trait]
impl CountryProvider for StaticCountries {
    async fn countries(&self) -> Result<Vec<Country>, FetchError> {
        Ok(self.countries.clone())
    }
}

/// One entry of the `/countries` response
#[derive(Debug, Deserialize)]
struct CountryRecord {
    #[serde(rename = "Country")]
    name: String,
    #[serde(rename = "Slug")]
    slug: String,
    #[serde(rename = "ISO2", default)]
    iso2: String,
}

/// Fetches the country list from the remote API's `/countries` endpoint
#[derive(Clone)]
pub struct ApiCountryProvider {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl ApiCountryProvider {
    pub fn with_base_url(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CountryProvider for ApiCountryProvider {
    async fn countries(&self) -> Result<Vec<Country>, FetchError> {
        let url = format!("{}/countries", self.base_url);
        let body = self
            .transport
            .get_text(&url)
            .await
            .map_err(|source| FetchError::RemoteFetch {
                slug: "countries".to_string(),
                source,
            })?;

        parse_countries(&body).map_err(|reason| FetchError::ResponseFormat {
            slug: "countries".to_string(),
            reason,
        })
    }
}

/// Parse a `/countries` body into a list sorted by slug
///
/// The API returns countries in no particular order; sorting keeps progress
/// and cache contents stable between runs. Entries without a slug are dropped.
fn parse_countries(body: &str) -> Result<Vec<Country>, String> {
    let records: Vec<CountryRecord> = serde_json::from_str(body).map_err(|e| e.to_string())?;

    let mut countries: Vec<Country> = records
        .into_iter()
        .filter(|record| !record.slug.trim().is_empty())
        .map(|record| Country {
            id: if record.iso2.is_empty() {
                record.slug.clone()
            } else {
                record.iso2
            },
            name: record.name,
            slug: record.slug,
        })
        .collect();

    countries.sort_by(|a, b| a.slug.cmp(&b.slug));
    countries.dedup_by(|a, b| a.slug == b.slug);
    Ok(countries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::series::tests::CannedTransport;

    const COUNTRIES: &str = r#"[
        {"Country":"Peru","Slug":"peru","ISO2":"PE"},
        {"Country":"Brazil","Slug":"brazil","ISO2":"BR"},
        {"Country":"Nowhere","Slug":"","ISO2":""}
    ]"#;

    #[test]
    fn test_parse_countries_sorted_and_filtered() {
        let countries = parse_countries(COUNTRIES).expect("Should parse");

        let slugs: Vec<&str> = countries.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["brazil", "peru"]);
        assert_eq!(countries[0].id, "BR");
        assert_eq!(countries[0].name, "Brazil");
    }

    #[test]
    fn test_parse_countries_rejects_garbage() {
        assert!(parse_countries("not json").is_err());
    }

    #[tokio::test]
    async fn test_static_countries_preserve_order() {
        let provider = StaticCountries::from_slugs(["peru", "brazil"]);

        let countries = provider.countries().await.expect("Static list never fails");

        assert_eq!(countries[0].slug, "peru");
        assert_eq!(countries[1].slug, "brazil");
    }

    #[tokio::test]
    async fn test_api_provider_fetches_countries_endpoint() {
        let transport = CannedTransport::default().with("https://api.test/countries", COUNTRIES);
        let provider = ApiCountryProvider::with_base_url(Arc::new(transport), "https://api.test");

        let countries = provider.countries().await.expect("Should fetch");

        assert_eq!(countries.len(), 2);
    }

    #[tokio::test]
    async fn test_api_provider_transport_failure() {
        let provider =
            ApiCountryProvider::with_base_url(Arc::new(CannedTransport::default()), "https://api.test");

        let result = provider.countries().await;

        assert!(matches!(result, Err(FetchError::RemoteFetch { .. })));
    }
}
