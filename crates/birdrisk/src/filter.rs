//! Spatial, temporal and species filters over observations.
//!
//! Filters never modify an [`ObservationSet`]; they produce borrowed views
//! that the estimator and summaries consume.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::observation::{Observation, ObservationSet};

/// Keyword that selects every species.
pub const ALL_SPECIES: &str = "all";

/// A longitude/latitude rectangle, inclusive on all four bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western bound in degrees.
    pub min_lon: f64,
    /// Eastern bound in degrees.
    pub max_lon: f64,
    /// Southern bound in degrees.
    pub min_lat: f64,
    /// Northern bound in degrees.
    pub max_lat: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::WORLD
    }
}

impl BoundingBox {
    /// The full world extent.
    pub const WORLD: Self = Self {
        min_lon: -180.0,
        max_lon: 180.0,
        min_lat: -90.0,
        max_lat: 90.0,
    };

    /// Create a bounding box from its four bounds.
    #[must_use]
    pub fn new(min_lon: f64, max_lon: f64, min_lat: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        }
    }

    /// Check that every bound is a number and that no range is inverted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] describing the first bad bound.
    pub fn validate(&self) -> Result<()> {
        let bounds = [self.min_lon, self.max_lon, self.min_lat, self.max_lat];
        if bounds.iter().any(|b| b.is_nan()) {
            return Err(Error::invalid_argument("bounding box bounds must be numbers"));
        }
        if self.min_lon > self.max_lon {
            return Err(Error::invalid_argument(format!(
                "min_lon ({}) is greater than max_lon ({})",
                self.min_lon, self.max_lon
            )));
        }
        if self.min_lat > self.max_lat {
            return Err(Error::invalid_argument(format!(
                "min_lat ({}) is greater than max_lat ({})",
                self.min_lat, self.max_lat
            )));
        }
        Ok(())
    }

    /// Check if a point lies inside the box, boundaries included.
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_lon..=self.max_lon).contains(&longitude)
            && (self.min_lat..=self.max_lat).contains(&latitude)
    }
}

/// An optional start and end date, both inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day included, if bounded.
    pub start: Option<NaiveDate>,
    /// Last day included, if bounded.
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Create a range from optional bounds.
    #[must_use]
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Check if neither bound is set.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Check if a date falls inside the range, endpoints included.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }

    /// Check if an optional date passes the range.
    ///
    /// Undated records pass only an unbounded range.
    #[must_use]
    pub fn admits(&self, date: Option<NaiveDate>) -> bool {
        match date {
            Some(d) => self.contains(d),
            None => self.is_unbounded(),
        }
    }
}

/// Species selection from the user-facing selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeciesSelector {
    /// Every species.
    #[default]
    All,
    /// A single species code.
    Species(String),
}

impl SpeciesSelector {
    /// Check if an observation matches the selection.
    #[must_use]
    pub fn matches(&self, observation: &Observation) -> bool {
        match self {
            Self::All => true,
            Self::Species(id) => observation.is_species(id),
        }
    }

    /// The selected species code, if a single species is selected.
    #[must_use]
    pub fn species_id(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Species(id) => Some(id),
        }
    }
}

impl FromStr for SpeciesSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::invalid_argument("species selector must not be empty"));
        }
        if s.eq_ignore_ascii_case(ALL_SPECIES) {
            Ok(Self::All)
        } else {
            Ok(Self::Species(s.to_string()))
        }
    }
}

impl fmt::Display for SpeciesSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "{ALL_SPECIES}"),
            Self::Species(id) => write!(f, "{id}"),
        }
    }
}

/// The combined filter selections of one user interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationFilter {
    /// Species selection.
    pub species: SpeciesSelector,
    /// Spatial bounds.
    pub bounding_box: BoundingBox,
    /// Temporal bounds.
    pub date_range: DateRange,
}

impl ObservationFilter {
    /// Create a filter that keeps everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a species selection.
    #[must_use]
    pub fn with_species(mut self, species: SpeciesSelector) -> Self {
        self.species = species;
        self
    }

    /// Restrict to a bounding box.
    #[must_use]
    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = bounding_box;
        self
    }

    /// Restrict to a date range.
    #[must_use]
    pub fn with_date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = date_range;
        self
    }

    /// Check if a single observation passes every selection.
    #[must_use]
    pub fn matches(&self, observation: &Observation) -> bool {
        self.date_range.admits(observation.date)
            && self
                .bounding_box
                .contains(observation.latitude, observation.longitude)
            && self.species.matches(observation)
    }

    /// Return the observations that pass the filter, in input order.
    #[must_use]
    pub fn apply<'a>(&self, observations: &'a ObservationSet) -> Vec<&'a Observation> {
        let kept: Vec<&Observation> = observations.iter().filter(|o| self.matches(o)).collect();
        debug!(
            input = observations.len(),
            kept = kept.len(),
            species = %self.species,
            "Applied observation filter"
        );
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn obs(species: &str, lat: f64, lon: f64, d: Option<NaiveDate>) -> Observation {
        Observation::new(species, species, lat, lon, d)
    }

    #[test]
    fn test_default_bounding_box_is_world() {
        let bbox = BoundingBox::default();
        assert_eq!(bbox, BoundingBox::WORLD);
        assert!(bbox.contains(90.0, 180.0));
        assert!(bbox.contains(-90.0, -180.0));
        assert!(!bbox.contains(90.5, 0.0));
    }

    #[test]
    fn test_bounding_box_inclusive_bounds() {
        let bbox = BoundingBox::new(10.0, 20.0, 40.0, 50.0);
        assert!(bbox.contains(45.0, 10.0));
        assert!(bbox.contains(45.0, 20.0));
        assert!(bbox.contains(40.0, 15.0));
        assert!(bbox.contains(50.0, 15.0));
        assert!(!bbox.contains(45.0, 9.999));
        assert!(!bbox.contains(50.001, 15.0));
    }

    #[test]
    fn test_bounding_box_validate() {
        assert!(BoundingBox::WORLD.validate().is_ok());

        let inverted = BoundingBox::new(20.0, 10.0, 0.0, 1.0);
        let err = inverted.validate().unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("min_lon"));

        let nan = BoundingBox::new(f64::NAN, 10.0, 0.0, 1.0);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_date_range_inclusive() {
        let range = DateRange::new(Some(date(2020, 1, 1)), Some(date(2020, 12, 31)));
        assert!(range.contains(date(2020, 1, 1)));
        assert!(range.contains(date(2020, 12, 31)));
        assert!(!range.contains(date(2019, 12, 31)));
        assert!(!range.contains(date(2021, 1, 1)));
    }

    #[test]
    fn test_date_range_half_open() {
        let from = DateRange::new(Some(date(2020, 6, 1)), None);
        assert!(from.contains(date(2030, 1, 1)));
        assert!(!from.contains(date(2020, 5, 31)));

        let until = DateRange::new(None, Some(date(2020, 6, 1)));
        assert!(until.contains(date(1900, 1, 1)));
        assert!(!until.contains(date(2020, 6, 2)));
    }

    #[test]
    fn test_date_range_admits_undated_only_when_unbounded() {
        assert!(DateRange::default().admits(None));
        let bounded = DateRange::new(None, Some(date(2020, 1, 1)));
        assert!(!bounded.admits(None));
    }

    #[test]
    fn test_species_selector_parse() {
        assert_eq!("all".parse::<SpeciesSelector>().unwrap(), SpeciesSelector::All);
        assert_eq!("ALL".parse::<SpeciesSelector>().unwrap(), SpeciesSelector::All);
        assert_eq!(
            "houspa".parse::<SpeciesSelector>().unwrap(),
            SpeciesSelector::Species("houspa".to_string())
        );
        assert!("  ".parse::<SpeciesSelector>().is_err());
    }

    #[test]
    fn test_species_selector_display() {
        assert_eq!(SpeciesSelector::All.to_string(), "all");
        assert_eq!(
            SpeciesSelector::Species("eagle".to_string()).to_string(),
            "eagle"
        );
    }

    #[test]
    fn test_filter_apply_combines_selections() {
        let set: ObservationSet = vec![
            obs("sparrow", 52.5, 13.4, Some(date(2020, 5, 1))),
            obs("eagle", 52.5, 13.4, Some(date(2020, 5, 1))),
            obs("sparrow", -33.8, 151.2, Some(date(2020, 5, 1))),
            obs("sparrow", 52.5, 13.4, Some(date(2018, 5, 1))),
            obs("sparrow", 52.5, 13.4, None),
        ]
        .into_iter()
        .collect();

        let filter = ObservationFilter::new()
            .with_species(SpeciesSelector::Species("sparrow".to_string()))
            .with_bounding_box(BoundingBox::new(0.0, 30.0, 40.0, 60.0))
            .with_date_range(DateRange::new(Some(date(2019, 1, 1)), None));

        let kept = filter.apply(&set);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].date, Some(date(2020, 5, 1)));
    }

    #[test]
    fn test_default_filter_keeps_everything() {
        let set: ObservationSet = vec![
            obs("sparrow", 52.5, 13.4, None),
            obs("eagle", 40.7, -74.0, Some(date(2020, 5, 1))),
        ]
        .into_iter()
        .collect();

        assert_eq!(ObservationFilter::new().apply(&set).len(), 2);
    }
}
