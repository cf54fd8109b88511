//! Command-line interface for birdrisk.
//!
//! This module provides the CLI structure for the `birdrisk` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    ConfigCommand, FilterArgs, LookupCommand, OutputFormat, RiskCommand, SpeciesCommand,
    SummaryCommand,
};

/// birdrisk - Explore bird observations and species decline risk
///
/// Loads a table of geotagged sightings, summarizes filtered views of it,
/// and estimates a per-year decline risk for a species.
#[derive(Debug, Parser)]
#[command(name = "birdrisk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Observation dataset (overrides dataset.path)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate yearly decline risk for a species
    Risk(RiskCommand),

    /// Summarize observations matching filters
    Summary(SummaryCommand),

    /// List species in the dataset
    Species(SpeciesCommand),

    /// Fetch taxonomy and image metadata for a species
    Lookup(LookupCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clap::CommandFactory;

    fn species_command() -> Command {
        Command::Species(SpeciesCommand {
            format: OutputFormat::Plain,
        })
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "birdrisk");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        let mut cli = Cli {
            config: None,
            data: None,
            verbose: 0,
            quiet: true,
            command: species_command(),
        };
        assert_eq!(cli.verbosity(), Verbosity::Quiet);

        cli.quiet = false;
        assert_eq!(cli.verbosity(), Verbosity::Normal);

        cli.verbose = 1;
        assert_eq!(cli.verbosity(), Verbosity::Verbose);

        cli.verbose = 3;
        assert_eq!(cli.verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_risk_with_filters() {
        let args = vec![
            "birdrisk",
            "--data",
            "birds.csv",
            "risk",
            "houspa",
            "--min-lon",
            "-10.5",
            "--max-lat",
            "60",
            "--start",
            "2018-01-01",
            "--format",
            "json",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.data, Some(PathBuf::from("birds.csv")));
        let Command::Risk(risk) = cli.command else {
            panic!("expected risk command");
        };
        assert_eq!(risk.species, "houspa");
        assert_eq!(risk.filters.min_lon, Some(-10.5));
        assert_eq!(risk.filters.max_lat, Some(60.0));
        assert_eq!(risk.filters.start, NaiveDate::from_ymd_opt(2018, 1, 1));
        assert_eq!(risk.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_risk_rejects_bad_date() {
        let args = vec!["birdrisk", "risk", "houspa", "--end", "soon"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_summary_defaults_to_all() {
        let cli = Cli::try_parse_from(vec!["birdrisk", "summary"]).unwrap();
        let Command::Summary(summary) = cli.command else {
            panic!("expected summary command");
        };
        assert_eq!(summary.species, "all");
        assert_eq!(summary.format, OutputFormat::Plain);
    }

    #[test]
    fn test_parse_lookup() {
        let args = vec!["birdrisk", "lookup", "houspa", "--name", "House Sparrow"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(cli.command, Command::Lookup(_)));
    }

    #[test]
    fn test_parse_with_config() {
        let args = vec!["birdrisk", "-c", "/custom/config.toml", "config", "path"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose_and_quiet() {
        let cli = Cli::try_parse_from(vec!["birdrisk", "-vv", "species"]).unwrap();
        assert_eq!(cli.verbose, 2);

        let cli = Cli::try_parse_from(vec!["birdrisk", "-q", "species"]).unwrap();
        assert!(cli.quiet);
    }
}
