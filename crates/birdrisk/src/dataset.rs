//! Observation dataset loading.
//!
//! Reads a delimited text file with one sighting per row. The header must
//! name every configured column; anything else in the file is ignored.
//! Rows are handled as follows:
//!
//! - unparseable latitude/longitude or a blank species code: row skipped
//! - unparseable date: row kept with no date, so it never counts toward a year

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

use crate::config::DatasetConfig;
use crate::error::{Error, Result};
use crate::observation::{parse_observation_date, Observation, ObservationSet};

/// Positions of the required columns in a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnIndex {
    latitude: usize,
    longitude: usize,
    common_name: usize,
    species: usize,
    date: usize,
}

impl ColumnIndex {
    /// Locate every required column, reporting all that are missing at once.
    fn resolve(headers: &StringRecord, config: &DatasetConfig) -> Result<Self> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
        };

        let found = config.required_columns().map(|name| (name, position(name)));
        let missing: Vec<String> = found
            .iter()
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| (*name).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingColumns { missing });
        }

        let idx = found.map(|(_, idx)| idx.unwrap_or_default());
        Ok(Self {
            latitude: idx[0],
            longitude: idx[1],
            common_name: idx[2],
            species: idx[3],
            date: idx[4],
        })
    }

    /// Build an observation from a record, or `None` if it cannot be placed.
    fn observation(&self, record: &StringRecord) -> Option<Observation> {
        let field = |i: usize| record.get(i).unwrap_or("").trim();

        let species_id = field(self.species);
        if species_id.is_empty() {
            return None;
        }
        let latitude: f64 = field(self.latitude).parse().ok()?;
        let longitude: f64 = field(self.longitude).parse().ok()?;
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }

        Some(Observation::new(
            species_id,
            field(self.common_name),
            latitude,
            longitude,
            parse_observation_date(field(self.date)),
        ))
    }
}

/// Load observations from a file.
///
/// # Errors
///
/// Returns [`Error::DatasetOpen`] if the file cannot be opened,
/// [`Error::MissingColumns`] if the header lacks a required column, and
/// [`Error::Csv`] if the file is not valid delimited text.
pub fn load_observations(path: impl AsRef<Path>, config: &DatasetConfig) -> Result<ObservationSet> {
    let path = path.as_ref();
    debug!("Opening dataset at {}", path.display());
    let file = File::open(path).map_err(|source| Error::DatasetOpen {
        path: path.to_path_buf(),
        source,
    })?;

    let set = read_observations(file, config)?;
    info!(
        records = set.len(),
        undated = set.undated_count(),
        "Loaded dataset from {}",
        path.display()
    );
    Ok(set)
}

/// Read observations from any reader.
///
/// # Errors
///
/// Returns [`Error::MissingColumns`] if the header lacks a required column,
/// [`Error::ConfigValidation`] for an unusable delimiter, and [`Error::Csv`]
/// if the input is not valid delimited text.
pub fn read_observations<R: Read>(reader: R, config: &DatasetConfig) -> Result<ObservationSet> {
    let delimiter = config
        .delimiter_byte()
        .ok_or_else(|| Error::ConfigValidation {
            message: format!(
                "delimiter {:?} must be a single ASCII character",
                config.delimiter
            ),
        })?;

    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let columns = ColumnIndex::resolve(rdr.headers()?, config)?;

    let mut observations = Vec::new();
    let mut skipped = 0usize;
    for record in rdr.records() {
        let record = record?;
        match columns.observation(&record) {
            Some(obs) => observations.push(obs),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, "Skipped rows without a species code or valid coordinates");
    }
    Ok(ObservationSet::new(observations))
}
