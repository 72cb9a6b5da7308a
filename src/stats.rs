//! Per-country summaries of a loaded measurement set

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::data::{Category, MeasurementSet};

/// Latest counts reported for one country
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryTotals {
    pub country: String,
    /// Timestamp of the newest confirmed measurement
    pub as_of: NaiveDateTime,
    pub confirmed: u32,
    pub deaths: u32,
    pub recovered: u32,
}

impl CountryTotals {
    /// Cases that are neither deaths nor recoveries
    pub fn active(&self) -> u32 {
        self.confirmed
            .saturating_sub(self.deaths)
            .saturating_sub(self.recovered)
    }
}

/// Latest value per country for each category, highest confirmed first
///
/// When a country reports the same timestamp twice the later record wins.
/// Ties on confirmed are ordered by country slug.
pub fn latest_totals(set: &MeasurementSet) -> Vec<CountryTotals> {
    let mut by_country: HashMap<&str, CountryTotals> = HashMap::new();

    for category in Category::ALL {
        for m in set.get(category) {
            let entry = by_country
                .entry(m.country())
                .or_insert_with(|| CountryTotals {
                    country: m.country().to_string(),
                    as_of: m.timestamp(),
                    confirmed: 0,
                    deaths: 0,
                    recovered: 0,
                });
            let newer = m.timestamp() >= entry.as_of;
            match category {
                Category::Confirmed if newer => {
                    entry.as_of = m.timestamp();
                    entry.confirmed = m.value();
                }
                Category::Deaths if newer => entry.deaths = m.value(),
                Category::Recovered if newer => entry.recovered = m.value(),
                _ => {}
            }
        }
    }

    let mut totals: Vec<CountryTotals> = by_country.into_values().collect();
    totals.sort_by(|a, b| {
        b.confirmed
            .cmp(&a.confirmed)
            .then_with(|| a.country.cmp(&b.country))
    });
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DailyTotals;
    use chrono::NaiveDate;

    fn day(d: u32, confirmed: u32, deaths: u32, recovered: u32) -> DailyTotals {
        DailyTotals {
            timestamp: NaiveDate::from_ymd_opt(2020, 3, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            confirmed,
            deaths,
            recovered,
        }
    }

    #[test]
    fn test_latest_totals_picks_newest_day() {
        let mut set = MeasurementSet::new();
        set.push_series("italy", &[day(1, 10, 1, 0), day(2, 20, 2, 5)]);

        let totals = latest_totals(&set);

        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].confirmed, 20);
        assert_eq!(totals[0].deaths, 2);
        assert_eq!(totals[0].recovered, 5);
        assert_eq!(totals[0].active(), 13);
    }

    #[test]
    fn test_latest_totals_sorted_by_confirmed() {
        let mut set = MeasurementSet::new();
        set.push_series("a", &[day(1, 5, 0, 0)]);
        set.push_series("b", &[day(1, 50, 0, 0)]);
        set.push_series("c", &[day(1, 5, 0, 0)]);

        let order: Vec<String> = latest_totals(&set).into_iter().map(|t| t.country).collect();

        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_duplicate_timestamp_later_record_wins() {
        let mut set = MeasurementSet::new();
        set.push_series("peru", &[day(1, 3, 0, 0), day(1, 4, 1, 0)]);

        let totals = latest_totals(&set);

        assert_eq!(totals[0].confirmed, 4);
        assert_eq!(totals[0].deaths, 1);
    }

    #[test]
    fn test_active_never_underflows() {
        let totals = CountryTotals {
            country: "x".to_string(),
            as_of: NaiveDate::from_ymd_opt(2020, 3, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            confirmed: 1,
            deaths: 1,
            recovered: 1,
        };
        assert_eq!(totals.active(), 0);
    }

    #[test]
    fn test_empty_set() {
        assert!(latest_totals(&MeasurementSet::new()).is_empty());
    }
}
