//! Core data models for the COVID tracker
//!
//! This module contains the measurement types shared by the cache, the remote
//! series client and the loader, plus the collaborators that supply countries
//! and raw series.

pub mod countries;
pub mod series;
pub mod transport;

pub use countries::{ApiCountryProvider, CountryProvider, StaticCountries};
pub use series::{parse_series, FetchError, SeriesClient};
pub use transport::{HttpTransport, ReqwestTransport, TransportError};

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Kind of case count a measurement holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Confirmed,
    Deaths,
    Recovered,
}

impl Category {
    /// All categories in snapshot order
    pub const ALL: [Category; 3] = [Category::Confirmed, Category::Deaths, Category::Recovered];

    /// Name used in snapshot file names
    pub fn file_name(self) -> &'static str {
        match self {
            Category::Confirmed => "confirmados",
            Category::Deaths => "mortos",
            Category::Recovered => "recuperados",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Confirmed => "CONFIRMED",
            Category::Deaths => "DEATHS",
            Category::Recovered => "RECOVERED",
        };
        f.write_str(label)
    }
}

/// A country known to the remote API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// ISO code or other stable identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Slug used in API paths, e.g. "south-africa"
    pub slug: String,
}

impl Country {
    /// Builds a country whose id and name are both the slug
    pub fn from_slug(slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            id: slug.clone(),
            name: slug.clone(),
            slug,
        }
    }
}

/// One country/timestamp/value/category data point
///
/// Fields are private so a measurement can't be altered once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    country: String,
    timestamp: NaiveDateTime,
    value: u32,
    category: Category,
}

impl Measurement {
    pub fn new(
        country: impl Into<String>,
        timestamp: NaiveDateTime,
        value: u32,
        category: Category,
    ) -> Self {
        Self {
            country: country.into(),
            timestamp,
            value,
            category,
        }
    }

    /// Slug of the country this measurement belongs to
    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

/// The three counts reported for one country on one day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTotals {
    pub timestamp: NaiveDateTime,
    pub confirmed: u32,
    pub deaths: u32,
    pub recovered: u32,
}

impl DailyTotals {
    /// Count for the given category
    pub fn count(&self, category: Category) -> u32 {
        match category {
            Category::Confirmed => self.confirmed,
            Category::Deaths => self.deaths,
            Category::Recovered => self.recovered,
        }
    }

    /// Splits the record into one measurement per category
    pub fn measurements(&self, country: &str) -> [Measurement; 3] {
        Category::ALL.map(|category| {
            Measurement::new(country, self.timestamp, self.count(category), category)
        })
    }
}

/// Whether a set holds every country that was asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    Complete,
    /// The load stopped early; only the first `countries_done` countries are present
    Partial {
        countries_done: usize,
        countries_total: usize,
    },
}

/// The confirmed, deaths and recovered collections of one load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementSet {
    confirmed: Vec<Measurement>,
    deaths: Vec<Measurement>,
    recovered: Vec<Measurement>,
    completeness: Completeness,
}

impl Default for MeasurementSet {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementSet {
    /// Creates an empty, complete set
    pub fn new() -> Self {
        Self {
            confirmed: Vec::new(),
            deaths: Vec::new(),
            recovered: Vec::new(),
            completeness: Completeness::Complete,
        }
    }

    /// Builds a set from already-separated collections
    pub fn from_parts(
        confirmed: Vec<Measurement>,
        deaths: Vec<Measurement>,
        recovered: Vec<Measurement>,
    ) -> Self {
        Self {
            confirmed,
            deaths,
            recovered,
            completeness: Completeness::Complete,
        }
    }

    /// Appends one country's series, keeping the source's order
    pub fn push_series(&mut self, country: &str, series: &[DailyTotals]) {
        for totals in series {
            let [confirmed, deaths, recovered] = totals.measurements(country);
            self.confirmed.push(confirmed);
            self.deaths.push(deaths);
            self.recovered.push(recovered);
        }
    }

    /// Marks the set as holding only part of the requested countries
    pub fn into_partial(mut self, countries_done: usize, countries_total: usize) -> Self {
        self.completeness = Completeness::Partial {
            countries_done,
            countries_total,
        };
        self
    }

    pub fn get(&self, category: Category) -> &[Measurement] {
        match category {
            Category::Confirmed => &self.confirmed,
            Category::Deaths => &self.deaths,
            Category::Recovered => &self.recovered,
        }
    }

    pub fn confirmed(&self) -> &[Measurement] {
        &self.confirmed
    }

    pub fn deaths(&self) -> &[Measurement] {
        &self.deaths
    }

    pub fn recovered(&self) -> &[Measurement] {
        &self.recovered
    }

    pub fn completeness(&self) -> Completeness {
        self.completeness
    }

    pub fn is_complete(&self) -> bool {
        self.completeness == Completeness::Complete
    }

    /// Total number of measurements across all three categories
    pub fn len(&self) -> usize {
        self.confirmed.len() + self.deaths.len() + self.recovered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn march_first() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_measurement_accessors() {
        let m = Measurement::new("brazil", march_first(), 10, Category::Confirmed);

        assert_eq!(m.country(), "brazil");
        assert_eq!(m.timestamp(), march_first());
        assert_eq!(m.value(), 10);
        assert_eq!(m.category(), Category::Confirmed);
    }

    #[test]
    fn test_category_file_names() {
        assert_eq!(Category::Confirmed.file_name(), "confirmados");
        assert_eq!(Category::Deaths.file_name(), "mortos");
        assert_eq!(Category::Recovered.file_name(), "recuperados");
    }

    #[test]
    fn test_category_display() {
        assert_eq!(Category::Deaths.to_string(), "DEATHS");
    }

    #[test]
    fn test_daily_totals_split_into_matching_categories() {
        let totals = DailyTotals {
            timestamp: march_first(),
            confirmed: 10,
            deaths: 1,
            recovered: 2,
        };

        let [c, d, r] = totals.measurements("italy");

        assert_eq!((c.category(), c.value()), (Category::Confirmed, 10));
        assert_eq!((d.category(), d.value()), (Category::Deaths, 1));
        assert_eq!((r.category(), r.value()), (Category::Recovered, 2));
        assert!([&c, &d, &r].iter().all(|m| m.country() == "italy"));
    }

    #[test]
    fn test_push_series_keeps_order_and_duplicates() {
        let day = DailyTotals {
            timestamp: march_first(),
            confirmed: 3,
            deaths: 0,
            recovered: 1,
        };
        let mut set = MeasurementSet::new();

        set.push_series("a", &[day, day]);
        set.push_series("b", &[day]);

        let countries: Vec<&str> = set.confirmed().iter().map(|m| m.country()).collect();
        assert_eq!(countries, vec!["a", "a", "b"]);
        assert_eq!(set.len(), 9);
        assert!(set.get(Category::Deaths).iter().all(|m| m.category() == Category::Deaths));
    }

    #[test]
    fn test_partial_marker() {
        let set = MeasurementSet::new().into_partial(2, 5);

        assert!(!set.is_complete());
        assert_eq!(
            set.completeness(),
            Completeness::Partial {
                countries_done: 2,
                countries_total: 5
            }
        );
    }

    #[test]
    fn test_measurement_serialization_roundtrip() {
        let m = Measurement::new("spain", march_first(), 42, Category::Recovered);

        let json = serde_json::to_string(&m).expect("Failed to serialize Measurement");
        let back: Measurement = serde_json::from_str(&json).expect("Failed to deserialize");

        assert_eq!(back, m);
        assert!(json.contains("\"recovered\""));
    }
}
