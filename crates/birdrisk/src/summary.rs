//! Summary statistics over a filtered view of observations.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::filter::ObservationFilter;
use crate::observation::{Observation, ObservationSet};

/// Alpha channel of species marker colours.
const SPECIES_ALPHA: u8 = 160;

/// Stable RGBA marker colour for a species code.
///
/// Derived from a BLAKE3 hash of the code, so the same species keeps its
/// colour across datasets and runs.
#[must_use]
pub fn species_color(species_id: &str) -> [u8; 4] {
    let hash = blake3::hash(species_id.as_bytes());
    let bytes = hash.as_bytes();
    [bytes[0], bytes[1], bytes[2], SPECIES_ALPHA]
}

/// Mean position of a set of observations, used to centre a map view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapCenter {
    /// Mean latitude in degrees.
    pub latitude: f64,
    /// Mean longitude in degrees.
    pub longitude: f64,
}

/// Record count for one species in a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesCount {
    /// Stable species code.
    pub species_id: String,
    /// Display label.
    pub common_name: String,
    /// Records of the species in the view.
    pub count: usize,
    /// Marker colour for the species.
    pub color: [u8; 4],
}

/// Summary of a filtered view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Records in the view.
    pub total_records: usize,
    /// Distinct species codes in the view.
    pub distinct_species: usize,
    /// Records in the view whose date did not parse.
    pub undated_records: usize,
    /// Earliest observation date.
    pub first_date: Option<NaiveDate>,
    /// Latest observation date.
    pub last_date: Option<NaiveDate>,
    /// Mean position, `None` for an empty view.
    pub center: Option<MapCenter>,
    /// Records per calendar year, ascending.
    pub records_per_year: BTreeMap<i32, usize>,
    /// Per-species counts, most observed first.
    pub species: Vec<SpeciesCount>,
}

impl Summary {
    /// Summarize the observations passing `filter`.
    #[must_use]
    pub fn of(observations: &ObservationSet, filter: &ObservationFilter) -> Self {
        Self::from_view(&filter.apply(observations))
    }

    /// Summarize an already filtered view.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_view(view: &[&Observation]) -> Self {
        let mut by_species: HashMap<&str, SpeciesCount> = HashMap::new();
        let mut records_per_year = BTreeMap::new();
        let mut first_date: Option<NaiveDate> = None;
        let mut last_date: Option<NaiveDate> = None;
        let mut undated_records = 0;
        let (mut lat_sum, mut lon_sum) = (0.0, 0.0);

        for obs in view {
            by_species
                .entry(obs.species_id.as_str())
                .or_insert_with(|| SpeciesCount {
                    species_id: obs.species_id.clone(),
                    common_name: obs.common_name.clone(),
                    count: 0,
                    color: species_color(&obs.species_id),
                })
                .count += 1;

            lat_sum += obs.latitude;
            lon_sum += obs.longitude;

            match obs.date {
                Some(date) => {
                    *records_per_year.entry(date.year()).or_insert(0) += 1;
                    first_date = Some(first_date.map_or(date, |d| d.min(date)));
                    last_date = Some(last_date.map_or(date, |d| d.max(date)));
                }
                None => undated_records += 1,
            }
        }

        let center = (!view.is_empty()).then(|| MapCenter {
            latitude: lat_sum / view.len() as f64,
            longitude: lon_sum / view.len() as f64,
        });

        let mut species: Vec<SpeciesCount> = by_species.into_values().collect();
        species.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.species_id.cmp(&b.species_id))
        });

        Self {
            total_records: view.len(),
            distinct_species: species.len(),
            undated_records,
            first_date,
            last_date,
            center,
            records_per_year,
            species,
        }
    }

    /// Check if the view was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_records == 0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::filter::SpeciesSelector;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn sample() -> ObservationSet {
        vec![
            Observation::new("sparrow", "Sparrow", 52.52, 13.405, date(2019, 3, 1)),
            Observation::new("eagle", "Eagle", 40.7128, -74.006, date(2020, 7, 4)),
            Observation::new("sparrow", "Sparrow", 48.8566, 2.3522, date(2021, 1, 9)),
            Observation::new("penguin", "Penguin", -33.8688, 151.2093, None),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_species_color_is_stable() {
        assert_eq!(species_color("sparrow"), species_color("sparrow"));
        assert_ne!(species_color("sparrow"), species_color("eagle"));
        assert_eq!(species_color("sparrow")[3], 160);
    }

    #[test]
    fn test_summary_of_whole_set() {
        let summary = Summary::of(&sample(), &ObservationFilter::new());

        assert_eq!(summary.total_records, 4);
        assert_eq!(summary.distinct_species, 3);
        assert_eq!(summary.undated_records, 1);
        assert_eq!(summary.first_date, date(2019, 3, 1));
        assert_eq!(summary.last_date, date(2021, 1, 9));
        assert_eq!(summary.records_per_year.get(&2020), Some(&1));
        assert_eq!(summary.species[0].species_id, "sparrow");
        assert_eq!(summary.species[0].count, 2);
        // Ties are ordered by species code.
        assert_eq!(summary.species[1].species_id, "eagle");
    }

    #[test]
    fn test_summary_center_is_mean_position() {
        let filter =
            ObservationFilter::new().with_species(SpeciesSelector::Species("sparrow".to_string()));
        let summary = Summary::of(&sample(), &filter);
        let center = summary.center.unwrap();
        assert_relative_eq!(center.latitude, (52.52 + 48.8566) / 2.0, epsilon = 1e-9);
        assert_relative_eq!(center.longitude, (13.405 + 2.3522) / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_summary_of_empty_view() {
        let filter =
            ObservationFilter::new().with_species(SpeciesSelector::Species("dodo".to_string()));
        let summary = Summary::of(&sample(), &filter);
        assert!(summary.is_empty());
        assert!(summary.center.is_none());
        assert!(summary.first_date.is_none());
        assert!(summary.species.is_empty());
    }
}
