//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::filter::{BoundingBox, DateRange};
use crate::observation::parse_observation_date;

/// Parse a date flag using the dataset date formats.
fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    parse_observation_date(raw).ok_or_else(|| format!("invalid date: {raw:?} (expected YYYY-MM-DD)"))
}

/// Spatial and temporal filter flags shared by several commands.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Western bound in degrees (default -180)
    #[arg(long, allow_negative_numbers = true)]
    pub min_lon: Option<f64>,

    /// Eastern bound in degrees (default 180)
    #[arg(long, allow_negative_numbers = true)]
    pub max_lon: Option<f64>,

    /// Southern bound in degrees (default -90)
    #[arg(long, allow_negative_numbers = true)]
    pub min_lat: Option<f64>,

    /// Northern bound in degrees (default 90)
    #[arg(long, allow_negative_numbers = true)]
    pub max_lat: Option<f64>,

    /// First day to include (inclusive)
    #[arg(long, value_parser = parse_date_arg)]
    pub start: Option<NaiveDate>,

    /// Last day to include (inclusive)
    #[arg(long, value_parser = parse_date_arg)]
    pub end: Option<NaiveDate>,
}

impl FilterArgs {
    /// The bounding box, with unset bounds taken from the world extent.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        let world = BoundingBox::WORLD;
        BoundingBox::new(
            self.min_lon.unwrap_or(world.min_lon),
            self.max_lon.unwrap_or(world.max_lon),
            self.min_lat.unwrap_or(world.min_lat),
            self.max_lat.unwrap_or(world.max_lat),
        )
    }

    /// The date range from the start and end flags.
    #[must_use]
    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start, self.end)
    }
}

/// Risk command arguments.
#[derive(Debug, Args)]
pub struct RiskCommand {
    /// Species code to estimate
    pub species: String,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Summary command arguments.
#[derive(Debug, Args)]
pub struct SummaryCommand {
    /// Species code, or "all"
    #[arg(short, long, default_value = "all")]
    pub species: String,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Species listing arguments.
#[derive(Debug, Args)]
pub struct SpeciesCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Lookup command arguments.
#[derive(Debug, Args)]
pub struct LookupCommand {
    /// Species code to look up
    pub species: String,

    /// Display name for the image lookup (defaults to the dataset's common name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
    /// CSV output
    Csv,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_parse_date_arg() {
        assert_eq!(
            parse_date_arg("2020-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2020, 2, 29).unwrap()
        );
        assert!(parse_date_arg("2021-02-29").is_err());
        assert!(parse_date_arg("yesterday").is_err());
    }

    #[test]
    fn test_filter_args_default_world() {
        let args = FilterArgs::default();
        assert_eq!(args.bounding_box(), BoundingBox::WORLD);
        assert!(args.date_range().is_unbounded());
    }

    #[test]
    fn test_filter_args_partial_bounds() {
        let args = FilterArgs {
            min_lat: Some(40.0),
            max_lon: Some(-60.0),
            ..FilterArgs::default()
        };
        let bbox = args.bounding_box();
        assert!((bbox.min_lat - 40.0).abs() < f64::EPSILON);
        assert!((bbox.max_lon + 60.0).abs() < f64::EPSILON);
        assert!((bbox.min_lon + 180.0).abs() < f64::EPSILON);
        assert!((bbox.max_lat - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
