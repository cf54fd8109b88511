//! Core observation types for birdrisk.
//!
//! This module defines the records loaded from an observation dataset and
//! the immutable collection the estimator and summaries work over.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Date-only formats accepted in the date column.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%m/%d/%Y"];

/// Date-time formats accepted in the date column; the time part is dropped.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse an observation date into a calendar date.
///
/// Accepts ISO dates, a few common regional layouts, naive date-times and
/// RFC 3339 timestamps. Returns `None` for anything else, including blanks.
#[must_use]
pub fn parse_observation_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// A single geotagged bird sighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Stable species code used for grouping.
    pub species_id: String,

    /// Display label for the species.
    pub common_name: String,

    /// Latitude in degrees (WGS84).
    pub latitude: f64,

    /// Longitude in degrees (WGS84).
    pub longitude: f64,

    /// Calendar date of the sighting, `None` when the source value did not parse.
    pub date: Option<NaiveDate>,
}

impl Observation {
    /// Create a new observation.
    #[must_use]
    pub fn new(
        species_id: impl Into<String>,
        common_name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        date: Option<NaiveDate>,
    ) -> Self {
        Self {
            species_id: species_id.into(),
            common_name: common_name.into(),
            latitude,
            longitude,
            date,
        }
    }

    /// Check if this observation belongs to the given species.
    #[must_use]
    pub fn is_species(&self, species_id: &str) -> bool {
        self.species_id == species_id
    }

    /// Check if the observation carries a usable date.
    #[must_use]
    pub fn has_date(&self) -> bool {
        self.date.is_some()
    }
}

/// A species present in a dataset, with its record count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesInfo {
    /// Stable species code.
    pub species_id: String,
    /// Display label (first one seen for the code).
    pub common_name: String,
    /// Number of records of this species.
    pub count: usize,
}

/// An immutable collection of observations.
///
/// Loaded once by the caller. Filtering produces borrowed views and never
/// changes the set itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationSet {
    observations: Vec<Observation>,
}

impl ObservationSet {
    /// Create a set from a list of observations.
    #[must_use]
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    /// Number of observations in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Iterate over all observations.
    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    /// All observations as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of observations whose date did not parse.
    #[must_use]
    pub fn undated_count(&self) -> usize {
        self.observations.iter().filter(|o| !o.has_date()).count()
    }

    /// Check if any observation has the given species code.
    #[must_use]
    pub fn contains_species(&self, species_id: &str) -> bool {
        self.observations.iter().any(|o| o.is_species(species_id))
    }

    /// Display label for a species code, if present.
    #[must_use]
    pub fn common_name(&self, species_id: &str) -> Option<&str> {
        self.observations
            .iter()
            .find(|o| o.is_species(species_id))
            .map(|o| o.common_name.as_str())
    }

    /// List the distinct species in the set, ordered by species code.
    #[must_use]
    pub fn species(&self) -> Vec<SpeciesInfo> {
        let mut by_id: BTreeMap<&str, SpeciesInfo> = BTreeMap::new();
        for obs in &self.observations {
            by_id
                .entry(obs.species_id.as_str())
                .or_insert_with(|| SpeciesInfo {
                    species_id: obs.species_id.clone(),
                    common_name: obs.common_name.clone(),
                    count: 0,
                })
                .count += 1;
        }
        by_id.into_values().collect()
    }
}

impl FromIterator<Observation> for ObservationSet {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ObservationSet {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_observation_date("2019-04-07"), date(2019, 4, 7));
        assert_eq!(parse_observation_date("  2019-04-07 "), date(2019, 4, 7));
    }

    #[test]
    fn test_parse_regional_dates() {
        assert_eq!(parse_observation_date("2019/04/07"), date(2019, 4, 7));
        assert_eq!(parse_observation_date("07.04.2019"), date(2019, 4, 7));
        assert_eq!(parse_observation_date("04/07/2019"), date(2019, 4, 7));
    }

    #[test]
    fn test_parse_datetime_drops_time() {
        assert_eq!(
            parse_observation_date("2020-12-31 23:59:00"),
            date(2020, 12, 31)
        );
        assert_eq!(
            parse_observation_date("2020-12-31T06:15:00"),
            date(2020, 12, 31)
        );
        assert_eq!(
            parse_observation_date("2020-12-31T06:15:00+02:00"),
            date(2020, 12, 31)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_observation_date(""), None);
        assert_eq!(parse_observation_date("   "), None);
        assert_eq!(parse_observation_date("not a date"), None);
        assert_eq!(parse_observation_date("2019-13-45"), None);
    }

    #[test]
    fn test_observation_is_species() {
        let obs = Observation::new("houspa", "House Sparrow", 52.5, 13.4, date(2020, 1, 1));
        assert!(obs.is_species("houspa"));
        assert!(!obs.is_species("HOUSPA"));
        assert!(obs.has_date());
    }

    #[test]
    fn test_set_species_listing() {
        let set: ObservationSet = vec![
            Observation::new("eagle", "Eagle", 0.0, 0.0, None),
            Observation::new("sparrow", "Sparrow", 0.0, 0.0, date(2020, 1, 1)),
            Observation::new("eagle", "Eagle", 1.0, 1.0, date(2020, 1, 2)),
        ]
        .into_iter()
        .collect();

        let species = set.species();
        assert_eq!(species.len(), 2);
        assert_eq!(species[0].species_id, "eagle");
        assert_eq!(species[0].count, 2);
        assert_eq!(species[1].species_id, "sparrow");
        assert_eq!(species[1].count, 1);

        assert_eq!(set.undated_count(), 1);
        assert!(set.contains_species("sparrow"));
        assert!(!set.contains_species("parrot"));
        assert_eq!(set.common_name("eagle"), Some("Eagle"));
        assert_eq!(set.common_name("parrot"), None);
    }

    #[test]
    fn test_empty_set() {
        let set = ObservationSet::default();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert!(set.species().is_empty());
    }

    #[test]
    fn test_observation_serialization() {
        let obs = Observation::new("eagle", "Eagle", 40.7128, -74.006, date(2021, 6, 1));
        let json = serde_json::to_string(&obs).unwrap();
        assert!(json.contains("\"date\":\"2021-06-01\""));
        let back: Observation = serde_json::from_str(&json).unwrap();
        assert_eq!(obs, back);
    }
}
