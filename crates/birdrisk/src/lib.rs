//! `birdrisk` - Bird observation explorer with decline risk estimation
//!
//! This library loads geotagged bird sightings, filters and summarizes them,
//! and estimates a per-year decline risk for a species from historical
//! record counts.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod logging;
pub mod lookup;
pub mod observation;
pub mod report;
pub mod risk;
pub mod summary;

pub use config::Config;
pub use dataset::load_observations;
pub use error::{Error, Result};
pub use filter::{BoundingBox, DateRange, ObservationFilter, SpeciesSelector};
pub use logging::init_logging;
pub use observation::{Observation, ObservationSet};
pub use risk::{estimate, RiskEstimator, RiskLevel, RiskOutcome, RiskQuery, YearlyRiskRow};
pub use summary::Summary;
