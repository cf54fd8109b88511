//! Rendering of estimation results, summaries and species listings.
//!
//! Every risk row is rendered together with its risk level and the level's
//! colour, so downstream viewers can colour-code rows without re-deriving
//! the classification.

use std::io::Write;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::lookup::SpeciesProfile;
use crate::observation::SpeciesInfo;
use crate::risk::{RiskLevel, RiskOutcome, YearlyRiskRow};
use crate::summary::Summary;

/// Message shown when an estimation had nothing to work with.
pub const INSUFFICIENT_DATA: &str = "Insufficient data for the selected species and filters.";

/// Format an RGBA colour as `#rrggbb`.
#[must_use]
pub fn hex_color(rgba: [u8; 4]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgba[0], rgba[1], rgba[2])
}

#[derive(Serialize)]
struct RiskReport<'a> {
    species_id: &'a str,
    common_name: Option<&'a str>,
    #[serde(flatten)]
    outcome: &'a RiskOutcome,
}

#[derive(Serialize)]
struct CsvRiskRow<'a> {
    year: i32,
    total_count: u64,
    species_count: u64,
    frequency: f64,
    rolling_total: f64,
    rolling_species: f64,
    rolling_frequency: f64,
    risk: RiskLevel,
    color: &'a str,
}

/// Write an estimation outcome.
///
/// # Errors
///
/// Returns an error if writing or serialization fails.
pub fn write_risk(
    out: &mut impl Write,
    species_id: &str,
    common_name: Option<&str>,
    outcome: &RiskOutcome,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let report = RiskReport {
                species_id,
                common_name,
                outcome,
            };
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => write_risk_csv(out, outcome.rows())?,
        OutputFormat::Plain | OutputFormat::Table => {
            let label = common_name.map_or_else(
                || species_id.to_string(),
                |name| format!("{name} ({species_id})"),
            );
            writeln!(out, "Decline risk: {label}")?;
            match outcome {
                RiskOutcome::NoData => writeln!(out, "{INSUFFICIENT_DATA}")?,
                RiskOutcome::Rows(rows) if format == OutputFormat::Table => {
                    write_risk_table(out, rows)?;
                }
                RiskOutcome::Rows(rows) => {
                    for row in rows {
                        writeln!(
                            out,
                            "{}: {} ({} of {} records, {:.1} per 1000)",
                            row.year, row.risk, row.species_count, row.total_count, row.frequency
                        )?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn write_risk_table(out: &mut impl Write, rows: &[YearlyRiskRow]) -> Result<()> {
    writeln!(
        out,
        "{:>6} {:>8} {:>8} {:>10} {:>10} {:>10} {:>10}  {:<8} {}",
        "year", "total", "species", "freq", "avg_total", "avg_spec", "avg_freq", "risk", "color"
    )?;
    writeln!(out, "{}", "-".repeat(92))?;
    for row in rows {
        writeln!(
            out,
            "{:>6} {:>8} {:>8} {:>10.2} {:>10.2} {:>10.2} {:>10.2}  {:<8} {}",
            row.year,
            row.total_count,
            row.species_count,
            row.frequency,
            row.rolling_total,
            row.rolling_species,
            row.rolling_frequency,
            row.risk.to_string(),
            hex_color(row.risk.color())
        )?;
    }
    Ok(())
}

fn write_risk_csv(out: &mut impl Write, rows: &[YearlyRiskRow]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(&mut *out);
    wtr.write_record([
        "year",
        "total_count",
        "species_count",
        "frequency",
        "rolling_total",
        "rolling_species",
        "rolling_frequency",
        "risk",
        "color",
    ])?;
    for row in rows {
        let color = hex_color(row.risk.color());
        wtr.serialize(CsvRiskRow {
            year: row.year,
            total_count: row.total_count,
            species_count: row.species_count,
            frequency: row.frequency,
            rolling_total: row.rolling_total,
            rolling_species: row.rolling_species,
            rolling_frequency: row.rolling_frequency,
            risk: row.risk,
            color: &color,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a summary of a filtered view.
///
/// # Errors
///
/// Returns an error if writing or serialization fails.
pub fn write_summary(out: &mut impl Write, summary: &Summary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, summary)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(&mut *out);
            wtr.write_record(["species_id", "common_name", "count", "color"])?;
            for s in &summary.species {
                let count = s.count.to_string();
                let color = hex_color(s.color);
                wtr.write_record([
                    s.species_id.as_str(),
                    s.common_name.as_str(),
                    count.as_str(),
                    color.as_str(),
                ])?;
            }
            wtr.flush()?;
        }
        OutputFormat::Plain | OutputFormat::Table => {
            if summary.is_empty() {
                writeln!(out, "No observations match the current filters.")?;
                return Ok(());
            }
            writeln!(out, "Records:       {}", summary.total_records)?;
            writeln!(out, "Species:       {}", summary.distinct_species)?;
            writeln!(out, "Undated:       {}", summary.undated_records)?;
            if let (Some(first), Some(last)) = (summary.first_date, summary.last_date) {
                writeln!(out, "Date range:    {first} .. {last}")?;
            }
            if let Some(center) = summary.center {
                writeln!(
                    out,
                    "Map centre:    {:.4}, {:.4}",
                    center.latitude, center.longitude
                )?;
            }
            writeln!(out)?;
            for s in &summary.species {
                writeln!(
                    out,
                    "{:>8}  {:<12} {} {}",
                    s.count,
                    s.species_id,
                    s.common_name,
                    hex_color(s.color)
                )?;
            }
        }
    }
    Ok(())
}

/// Write the list of species known to a dataset.
///
/// # Errors
///
/// Returns an error if writing or serialization fails.
pub fn write_species(out: &mut impl Write, species: &[SpeciesInfo], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, species)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(&mut *out);
            for s in species {
                wtr.serialize(s)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Plain | OutputFormat::Table => {
            for s in species {
                writeln!(out, "{:<12} {:<30} {:>8}", s.species_id, s.common_name, s.count)?;
            }
        }
    }
    Ok(())
}

/// Write reference metadata gathered for a species.
///
/// # Errors
///
/// Returns an error if writing or serialization fails.
pub fn write_profile(out: &mut impl Write, profile: &SpeciesProfile, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        serde_json::to_writer_pretty(&mut *out, profile)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "{} ({})", profile.display_name, profile.species_id)?;
    match profile.taxonomy.found() {
        Some(records) => {
            for record in records {
                writeln!(
                    out,
                    "  {} / {}",
                    record.scientific_name, record.common_name
                )?;
            }
        }
        None => writeln!(out, "  Taxonomy: {}", profile.taxonomy)?,
    }
    match profile.image.found() {
        Some(url) => writeln!(out, "  Image: {url}")?,
        None => writeln!(out, "  Image: {}", profile.image)?,
    }
    Ok(())
}
