//! Per-species decline risk estimation.
//!
//! The estimator bins filtered observations by calendar year, normalizes the
//! target species' share of records to a per-mille frequency, smooths counts
//! and frequency over a short trailing window, and classifies each year
//! against fixed thresholds:
//!
//! - too little data in the window → [`RiskLevel::NoData`]
//! - species count and frequency both dropped → [`RiskLevel::High`]
//! - one of the two dropped → [`RiskLevel::Medium`]
//! - neither dropped → [`RiskLevel::Low`]
//!
//! # Example
//!
//! ```
//! use birdrisk::observation::ObservationSet;
//! use birdrisk::risk::{estimate, RiskOutcome, RiskQuery};
//!
//! let observations = ObservationSet::default();
//! let query = RiskQuery::new("houspa");
//! assert_eq!(estimate(&observations, &query).unwrap(), RiskOutcome::NoData);
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::filter::{BoundingBox, DateRange, ObservationFilter};
use crate::observation::ObservationSet;

/// Frequency is expressed as species records per this many total records.
pub const FREQUENCY_SCALE: f64 = 1000.0;

/// Discrete decline risk of a species in one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    /// Not enough records in the window to judge.
    NoData,
    /// No drop against the rolling baseline.
    Low,
    /// Either the count or the frequency dropped.
    Medium,
    /// Both the count and the frequency dropped.
    High,
}

impl RiskLevel {
    /// RGBA colour used when rendering rows of this level.
    #[must_use]
    pub fn color(self) -> [u8; 4] {
        match self {
            Self::NoData => [150, 150, 150, 160],
            Self::Low => [40, 167, 69, 160],
            Self::Medium => [255, 165, 0, 160],
            Self::High => [220, 20, 60, 160],
        }
    }

    /// All levels, in ascending severity.
    #[must_use]
    pub fn all() -> [Self; 4] {
        [Self::NoData, Self::Low, Self::Medium, Self::High]
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData => write!(f, "No-Data"),
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// Classification thresholds and smoothing window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Minimum rolling total records for a year to be judged.
    pub min_total: f64,
    /// Minimum rolling species records for a year to be judged.
    pub min_species_avg: f64,
    /// Count ratio at or below which the species count has dropped.
    pub count_drop: f64,
    /// Frequency ratio at or below which the frequency has dropped.
    pub freq_drop: f64,
    /// Number of years in the trailing window, current year included.
    pub window: usize,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            min_total: 40.0,
            min_species_avg: 3.0,
            count_drop: 0.7,
            freq_drop: 0.8,
            window: 3,
        }
    }
}

impl RiskThresholds {
    /// Check that the thresholds describe a usable classifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(Error::ConfigValidation {
                message: "risk window must be at least 1".to_string(),
            });
        }
        if self.min_total.is_nan()
            || self.min_total <= 0.0
            || self.min_species_avg.is_nan()
            || self.min_species_avg <= 0.0
        {
            return Err(Error::ConfigValidation {
                message: format!(
                    "min_total ({}) and min_species_avg ({}) must be positive",
                    self.min_total, self.min_species_avg
                ),
            });
        }
        for (name, ratio) in [("count_drop", self.count_drop), ("freq_drop", self.freq_drop)] {
            if ratio.is_nan() || ratio <= 0.0 || ratio > 1.0 {
                return Err(Error::ConfigValidation {
                    message: format!("{name} ({ratio}) must be in (0, 1]"),
                });
            }
        }
        Ok(())
    }

    /// Classify one year from its raw and rolling values.
    #[must_use]
    pub fn classify(
        &self,
        species_count: f64,
        frequency: f64,
        rolling_total: f64,
        rolling_species: f64,
        rolling_frequency: f64,
    ) -> RiskLevel {
        if rolling_total < self.min_total || rolling_species < self.min_species_avg {
            return RiskLevel::NoData;
        }

        let count_dropped = ratio(species_count, rolling_species) <= self.count_drop;
        let freq_dropped = ratio(frequency, rolling_frequency) <= self.freq_drop;

        match (count_dropped, freq_dropped) {
            (true, true) => RiskLevel::High,
            (true, false) | (false, true) => RiskLevel::Medium,
            (false, false) => RiskLevel::Low,
        }
    }
}

/// Ratio of a value to its baseline; a non-positive baseline counts as no change.
fn ratio(value: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        value / baseline
    } else {
        1.0
    }
}

/// Parameters of one estimation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskQuery {
    /// Target species code.
    pub species_id: String,
    /// Spatial bounds; the whole world by default.
    #[serde(default)]
    pub bounding_box: BoundingBox,
    /// Temporal bounds; unbounded by default.
    #[serde(default)]
    pub date_range: DateRange,
}

impl RiskQuery {
    /// Create a query for a species over the whole world and all dates.
    #[must_use]
    pub fn new(species_id: impl Into<String>) -> Self {
        Self {
            species_id: species_id.into(),
            bounding_box: BoundingBox::WORLD,
            date_range: DateRange::default(),
        }
    }

    /// Restrict the query to a bounding box.
    #[must_use]
    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = bounding_box;
        self
    }

    /// Restrict the query to a date range.
    #[must_use]
    pub fn with_date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = date_range;
        self
    }

    /// The filter defining the record universe: every species, this query's bounds.
    #[must_use]
    pub fn universe_filter(&self) -> ObservationFilter {
        ObservationFilter::new()
            .with_bounding_box(self.bounding_box)
            .with_date_range(self.date_range)
    }
}

/// One year of the estimation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyRiskRow {
    /// Calendar year.
    pub year: i32,
    /// Records of any species in the filtered universe this year.
    pub total_count: u64,
    /// Records of the target species this year.
    pub species_count: u64,
    /// Species records per 1000 total records.
    pub frequency: f64,
    /// Trailing mean of `total_count`.
    pub rolling_total: f64,
    /// Trailing mean of `species_count`.
    pub rolling_species: f64,
    /// Trailing mean of `frequency`.
    pub rolling_frequency: f64,
    /// Classification of this year.
    pub risk: RiskLevel,
}

/// Result of an estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "rows", rename_all = "snake_case")]
pub enum RiskOutcome {
    /// One row per year, ascending.
    Rows(Vec<YearlyRiskRow>),
    /// No records survived filtering.
    NoData,
}

impl RiskOutcome {
    /// Check if the estimation had nothing to work with.
    #[must_use]
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }

    /// The yearly rows, empty for [`RiskOutcome::NoData`].
    #[must_use]
    pub fn rows(&self) -> &[YearlyRiskRow] {
        match self {
            Self::Rows(rows) => rows,
            Self::NoData => &[],
        }
    }

    /// The most recent year's row, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&YearlyRiskRow> {
        self.rows().last()
    }
}

/// Per-year record tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct YearTally {
    total: u64,
    species: u64,
}

/// Trailing mean over the last `size` values pushed, with a minimum period of 1.
#[derive(Debug, Clone)]
struct RollingMean {
    values: VecDeque<f64>,
    size: usize,
}

impl RollingMean {
    fn new(size: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(size),
            size,
        }
    }

    /// Push the next value and return the mean of the current window.
    #[allow(clippy::cast_precision_loss)]
    fn push(&mut self, value: f64) -> f64 {
        if self.values.len() == self.size {
            self.values.pop_front();
        }
        self.values.push_back(value);
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }
}

/// Risk estimator with configurable thresholds.
#[derive(Debug, Clone, Default)]
pub struct RiskEstimator {
    thresholds: RiskThresholds,
}

impl RiskEstimator {
    /// Create an estimator with the default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an estimator with custom thresholds.
    #[must_use]
    pub fn with_thresholds(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    /// The thresholds in use.
    #[must_use]
    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    /// Estimate the yearly decline risk of a species.
    ///
    /// Records whose date did not parse never count toward any year.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the species code is empty or the
    /// thresholds use a zero-length window. An empty filtered universe is not
    /// an error and yields [`RiskOutcome::NoData`].
    pub fn estimate(&self, observations: &ObservationSet, query: &RiskQuery) -> Result<RiskOutcome> {
        let species_id = query.species_id.trim();
        if species_id.is_empty() {
            return Err(Error::invalid_argument("species id must not be empty"));
        }
        if self.thresholds.window == 0 {
            return Err(Error::invalid_argument("risk window must be at least 1"));
        }

        let universe = query.universe_filter().apply(observations);
        if universe.is_empty() {
            debug!(species = species_id, "No observations survived filtering");
            return Ok(RiskOutcome::NoData);
        }

        let mut tallies: BTreeMap<i32, YearTally> = BTreeMap::new();
        for obs in &universe {
            let Some(date) = obs.date else { continue };
            let tally = tallies.entry(date.year()).or_default();
            tally.total += 1;
            if obs.is_species(species_id) {
                tally.species += 1;
            }
        }

        if tallies.is_empty() {
            debug!(species = species_id, "No dated observations survived filtering");
            return Ok(RiskOutcome::NoData);
        }

        let rows = self.annotate(&tallies);
        debug!(
            species = species_id,
            records = universe.len(),
            years = rows.len(),
            "Estimated decline risk"
        );
        Ok(RiskOutcome::Rows(rows))
    }

    /// Fold ordered yearly tallies into annotated rows.
    #[allow(clippy::cast_precision_loss)]
    fn annotate(&self, tallies: &BTreeMap<i32, YearTally>) -> Vec<YearlyRiskRow> {
        let window = self.thresholds.window;
        let mut totals = RollingMean::new(window);
        let mut species = RollingMean::new(window);
        let mut frequencies = RollingMean::new(window);

        tallies
            .iter()
            .map(|(&year, tally)| {
                let frequency = if tally.total == 0 {
                    0.0
                } else {
                    tally.species as f64 / tally.total as f64 * FREQUENCY_SCALE
                };

                let rolling_total = totals.push(tally.total as f64);
                let rolling_species = species.push(tally.species as f64);
                let rolling_frequency = frequencies.push(frequency);

                let risk = self.thresholds.classify(
                    tally.species as f64,
                    frequency,
                    rolling_total,
                    rolling_species,
                    rolling_frequency,
                );
                trace!(year, total = tally.total, species = tally.species, %risk, "Classified year");

                YearlyRiskRow {
                    year,
                    total_count: tally.total,
                    species_count: tally.species,
                    frequency,
                    rolling_total,
                    rolling_species,
                    rolling_frequency,
                    risk,
                }
            })
            .collect()
    }
}

/// Estimate with the default thresholds.
///
/// # Errors
///
/// See [`RiskEstimator::estimate`].
pub fn estimate(observations: &ObservationSet, query: &RiskQuery) -> Result<RiskOutcome> {
    RiskEstimator::new().estimate(observations, query)
}
