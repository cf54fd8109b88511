//! `birdrisk` - CLI for exploring bird observations
//!
//! This binary loads an observation dataset and runs summaries, species
//! listings, reference lookups and decline risk estimation over it.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{debug, info};

use birdrisk::cli::{
    Cli, Command, ConfigCommand, LookupCommand, OutputFormat, RiskCommand, SpeciesCommand,
    SummaryCommand,
};
use birdrisk::lookup::{species_profile, EbirdTaxonomy, LookupOutcome, SpeciesProfile, WikipediaImages};
use birdrisk::{
    init_logging, load_observations, report, Config, ObservationFilter, ObservationSet,
    RiskEstimator, RiskQuery, SpeciesSelector, Summary,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let sources = Sources {
        config: cli.config,
        data: cli.data,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Risk(cmd) => handle_risk(&sources, &cmd, &mut out),
        Command::Summary(cmd) => handle_summary(&sources, &cmd, &mut out),
        Command::Species(cmd) => handle_species(&sources, &cmd, &mut out),
        Command::Lookup(cmd) => handle_lookup(&sources, &cmd, &mut out),
        Command::Config(cmd) => handle_config(&sources, cmd, &mut out),
    }
}

/// Files named by the global `--config` and `--data` flags.
#[derive(Debug, Default)]
struct Sources {
    config: Option<PathBuf>,
    data: Option<PathBuf>,
}

impl Sources {
    /// Load the layered configuration.
    fn config(&self) -> anyhow::Result<Config> {
        Config::load_from(self.config.clone()).context("loading configuration")
    }

    /// Check if a dataset is named by `--data` or the configuration.
    fn has_dataset(&self, config: &Config) -> bool {
        self.data.is_some() || config.dataset.path.is_some()
    }

    /// Load the dataset named by `--data` or the configuration.
    fn dataset(&self, config: &Config) -> anyhow::Result<ObservationSet> {
        let path = config.dataset_path(self.data.clone())?;
        let observations = load_observations(&path, &config.dataset)
            .with_context(|| format!("loading dataset {}", path.display()))?;
        Ok(observations)
    }
}

fn handle_risk(sources: &Sources, cmd: &RiskCommand, out: &mut impl Write) -> anyhow::Result<()> {
    let species_id = match cmd.species.parse::<SpeciesSelector>()? {
        SpeciesSelector::Species(id) => id,
        SpeciesSelector::All => bail!("risk needs a single species code, not \"all\""),
    };
    let bounding_box = cmd.filters.bounding_box();
    bounding_box.validate()?;

    let config = sources.config()?;
    let observations = sources.dataset(&config)?;
    let query = RiskQuery::new(species_id)
        .with_bounding_box(bounding_box)
        .with_date_range(cmd.filters.date_range());

    let outcome = RiskEstimator::with_thresholds(config.risk).estimate(&observations, &query)?;
    if let Some(latest) = outcome.latest() {
        info!(species = %query.species_id, year = latest.year, risk = %latest.risk, "Latest risk");
    }

    report::write_risk(
        out,
        &query.species_id,
        observations.common_name(&query.species_id),
        &outcome,
        cmd.format,
    )?;
    Ok(())
}

fn handle_summary(
    sources: &Sources,
    cmd: &SummaryCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let species: SpeciesSelector = cmd.species.parse()?;
    let bounding_box = cmd.filters.bounding_box();
    bounding_box.validate()?;

    let config = sources.config()?;
    let observations = sources.dataset(&config)?;
    let filter = ObservationFilter::new()
        .with_species(species)
        .with_bounding_box(bounding_box)
        .with_date_range(cmd.filters.date_range());

    let summary = Summary::of(&observations, &filter);
    report::write_summary(out, &summary, cmd.format)?;
    Ok(())
}

fn handle_species(
    sources: &Sources,
    cmd: &SpeciesCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let config = sources.config()?;
    let observations = sources.dataset(&config)?;
    report::write_species(out, &observations.species(), cmd.format)?;
    Ok(())
}

/// Pick the name used for the image lookup.
///
/// An explicit `--name` wins. Otherwise the dataset supplies the common
/// name when one is configured; a dataset that fails to load is an error.
/// Without any dataset the species code is used as is.
fn lookup_display_name(
    sources: &Sources,
    config: &Config,
    cmd: &LookupCommand,
) -> anyhow::Result<String> {
    if let Some(name) = &cmd.name {
        return Ok(name.clone());
    }
    if !sources.has_dataset(config) {
        debug!(species = %cmd.species, "No dataset configured, using the species code as name");
        return Ok(cmd.species.clone());
    }

    let observations = sources.dataset(config)?;
    Ok(observations
        .common_name(&cmd.species)
        .map_or_else(|| cmd.species.clone(), str::to_string))
}

fn handle_lookup(sources: &Sources, cmd: &LookupCommand, out: &mut impl Write) -> anyhow::Result<()> {
    let config = sources.config()?;
    let display_name = lookup_display_name(sources, &config, cmd)?;

    let profile = if config.lookup.enabled {
        let taxonomy = EbirdTaxonomy::new(&config.lookup)?;
        let images = WikipediaImages::new(&config.lookup)?;
        species_profile(&taxonomy, &images, &cmd.species, &display_name)
    } else {
        let disabled = "lookups disabled in configuration".to_string();
        SpeciesProfile {
            species_id: cmd.species.clone(),
            display_name,
            taxonomy: LookupOutcome::Unavailable(disabled.clone()),
            image: LookupOutcome::Unavailable(disabled),
        }
    };

    let format = if cmd.json {
        OutputFormat::Json
    } else {
        OutputFormat::Plain
    };
    report::write_profile(out, &profile, format)?;
    Ok(())
}

fn handle_config(sources: &Sources, cmd: ConfigCommand, out: &mut impl Write) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = sources.config()?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&config)?)?;
            } else {
                writeln!(out, "Current Configuration")?;
                writeln!(out, "=====================")?;
                writeln!(out)?;
                writeln!(out, "[Dataset]")?;
                match &config.dataset.path {
                    Some(path) => writeln!(out, "  Path:               {}", path.display())?,
                    None => writeln!(out, "  Path:               (not set)")?,
                }
                writeln!(out, "  Delimiter:          {:?}", config.dataset.delimiter)?;
                writeln!(
                    out,
                    "  Columns:            {}",
                    config.dataset.required_columns().join(", ")
                )?;
                writeln!(out)?;
                writeln!(out, "[Risk]")?;
                writeln!(out, "  Min total:          {}", config.risk.min_total)?;
                writeln!(out, "  Min species avg:    {}", config.risk.min_species_avg)?;
                writeln!(out, "  Count drop:         {}", config.risk.count_drop)?;
                writeln!(out, "  Frequency drop:     {}", config.risk.freq_drop)?;
                writeln!(out, "  Window (years):     {}", config.risk.window)?;
                writeln!(out)?;
                writeln!(out, "[Lookup]")?;
                writeln!(out, "  Enabled:            {}", config.lookup.enabled)?;
                writeln!(out, "  Taxonomy URL:       {}", config.lookup.taxonomy_url)?;
                writeln!(out, "  Image URL:          {}", config.lookup.image_url)?;
                writeln!(
                    out,
                    "  API token:          {}",
                    if config.lookup.api_token.is_some() { "set" } else { "not set" }
                )?;
                writeln!(out, "  Timeout (secs):     {}", config.lookup.timeout_secs)?;
            }
        }
        ConfigCommand::Path => {
            let path = sources
                .config
                .clone()
                .unwrap_or_else(Config::default_config_path);
            writeln!(out, "{}", path.display())?;
        }
        ConfigCommand::Validate { file } => {
            // Checks the file alone; a broken environment must not mask it.
            let path = file
                .or_else(|| sources.config.clone())
                .unwrap_or_else(Config::default_config_path);
            writeln!(out, "Validating configuration: {}", path.display())?;
            match Config::load_file(&path) {
                Ok(_) => writeln!(out, "Configuration is valid.")?,
                Err(e) => writeln!(out, "Configuration error: {e}")?,
            }
        }
    }
    Ok(())
}
