//! Configuration management for birdrisk.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::risk::RiskThresholds;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "birdrisk";

/// Prefix of environment variable overrides.
const ENV_PREFIX: &str = "BIRDRISK_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `BIRDRISK_`, sections split on `__`)
/// 2. TOML config file at `~/.config/birdrisk/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Observation dataset configuration.
    pub dataset: DatasetConfig,
    /// Risk classification thresholds.
    pub risk: RiskThresholds,
    /// Reference service configuration.
    pub lookup: LookupConfig,
}

/// Dataset-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Path to the observation file. The `--data` flag takes precedence.
    pub path: Option<PathBuf>,
    /// Field delimiter.
    pub delimiter: char,
    /// Column holding the latitude.
    pub latitude_column: String,
    /// Column holding the longitude.
    pub longitude_column: String,
    /// Column holding the species display name.
    pub common_name_column: String,
    /// Column holding the stable species code.
    pub species_column: String,
    /// Column holding the observation date.
    pub date_column: String,
}

/// Reference service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Enable reference service lookups.
    pub enabled: bool,
    /// Base URL of the taxonomy service; the species code is passed as a query parameter.
    pub taxonomy_url: String,
    /// Base URL of the page summary service used for images.
    pub image_url: String,
    /// API token sent to the taxonomy service. Never serialized back out.
    #[serde(skip_serializing)]
    pub api_token: Option<String>,
    /// Locale for common names.
    pub locale: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: None,
            delimiter: ',',
            latitude_column: "latitude".to_string(),
            longitude_column: "longitude".to_string(),
            common_name_column: "common_name".to_string(),
            species_column: "species_code".to_string(),
            date_column: "observation_date".to_string(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            taxonomy_url: "https://api.ebird.org/v2/ref/taxonomy/ebird".to_string(),
            image_url: "https://en.wikipedia.org/api/rest_v1/page/summary".to_string(),
            api_token: None,
            locale: "en".to_string(),
            timeout_secs: 10,
        }
    }
}

impl DatasetConfig {
    /// Required column names, in the order latitude, longitude, common name,
    /// species, date.
    #[must_use]
    pub fn required_columns(&self) -> [&str; 5] {
        [
            self.latitude_column.as_str(),
            self.longitude_column.as_str(),
            self.common_name_column.as_str(),
            self.species_column.as_str(),
            self.date_column.as_str(),
        ]
    }

    /// The delimiter as a byte, if it is a single ASCII character.
    #[must_use]
    pub fn delimiter_byte(&self) -> Option<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
    }
}

impl LookupConfig {
    /// Request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load a single configuration file over the defaults, ignoring the
    /// environment.
    ///
    /// Used to check a file on its own, independent of any `BIRDRISK_`
    /// overrides in the current shell.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, fails to parse, or holds
    /// invalid values.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ConfigValidation {
                message: format!("configuration file not found: {}", path.display()),
            });
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.dataset.delimiter_byte().is_none() {
            return Err(Error::ConfigValidation {
                message: format!(
                    "delimiter {:?} must be a single ASCII character",
                    self.dataset.delimiter
                ),
            });
        }

        let columns = self.dataset.required_columns();
        if columns.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::ConfigValidation {
                message: "dataset column names must not be empty".to_string(),
            });
        }
        let distinct: HashSet<&str> = columns.iter().copied().collect();
        if distinct.len() != columns.len() {
            return Err(Error::ConfigValidation {
                message: "dataset column names must be distinct".to_string(),
            });
        }

        self.risk.validate()?;

        if self.lookup.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "lookup timeout_secs must be greater than 0".to_string(),
            });
        }
        if self.lookup.enabled
            && (self.lookup.taxonomy_url.is_empty() || self.lookup.image_url.is_empty())
        {
            return Err(Error::ConfigValidation {
                message: "lookup URLs must be set when lookups are enabled".to_string(),
            });
        }

        Ok(())
    }

    /// Resolve the dataset path, preferring an explicit override.
    ///
    /// # Errors
    ///
    /// Returns an error if neither the override nor the configuration names a file.
    pub fn dataset_path(&self, override_path: Option<PathBuf>) -> Result<PathBuf> {
        override_path
            .or_else(|| self.dataset.path.clone())
            .ok_or_else(|| Error::ConfigValidation {
                message: "no dataset configured; pass --data or set dataset.path".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.dataset.path.is_none());
        assert_eq!(config.dataset.delimiter, ',');
        assert_eq!(config.risk, RiskThresholds::default());
        assert!(config.lookup.enabled);
        assert!(config.lookup.api_token.is_none());
    }

    #[test]
    fn test_default_dataset_columns() {
        let dataset = DatasetConfig::default();
        assert_eq!(
            dataset.required_columns(),
            [
                "latitude",
                "longitude",
                "common_name",
                "species_code",
                "observation_date"
            ]
        );
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_non_ascii_delimiter() {
        let mut config = Config::default();
        config.dataset.delimiter = '→';

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("delimiter"));
    }

    #[test]
    fn test_validate_duplicate_columns() {
        let mut config = Config::default();
        config.dataset.longitude_column = "latitude".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("distinct"));
    }

    #[test]
    fn test_validate_empty_column() {
        let mut config = Config::default();
        config.dataset.date_column = " ".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_thresholds() {
        let mut config = Config::default();
        config.risk.window = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("window"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.lookup.timeout_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("timeout_secs"));
    }

    #[test]
    fn test_validate_disabled_lookup_allows_empty_urls() {
        let mut config = Config::default();
        config.lookup.enabled = false;
        config.lookup.taxonomy_url = String::new();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lookup_timeout() {
        assert_eq!(LookupConfig::default().timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_dataset_path_resolution() {
        let mut config = Config::default();
        assert!(config.dataset_path(None).is_err());

        config.dataset.path = Some(PathBuf::from("/data/birds.csv"));
        assert_eq!(
            config.dataset_path(None).unwrap(),
            PathBuf::from("/data/birds.csv")
        );
        assert_eq!(
            config
                .dataset_path(Some(PathBuf::from("/tmp/other.csv")))
                .unwrap(),
            PathBuf::from("/tmp/other.csv")
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("birdrisk"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[dataset]
path = "/data/observations.tsv"
delimiter = "\t"
species_column = "bird_species"

[risk]
min_total = 25.0
window = 5

[lookup]
enabled = false
"#
        )
        .unwrap();

        let config = Config::load_from(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(
            config.dataset.path,
            Some(PathBuf::from("/data/observations.tsv"))
        );
        assert_eq!(config.dataset.delimiter, '\t');
        assert_eq!(config.dataset.species_column, "bird_species");
        assert_eq!(config.dataset.date_column, "observation_date");
        assert!((config.risk.min_total - 25.0).abs() < f64::EPSILON);
        assert_eq!(config.risk.window, 5);
        assert!((config.risk.count_drop - 0.7).abs() < f64::EPSILON);
        assert!(!config.lookup.enabled);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[risk]\ncount_drop = 2.0").unwrap();

        let err = Config::load_from(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_load_file_checks_only_that_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[risk]\nwindow = 4").unwrap();

        let config = Config::load_file(file.path()).unwrap();
        assert_eq!(config.risk.window, 4);
        assert_eq!(config.dataset, DatasetConfig::default());
    }

    #[test]
    fn test_load_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[lookup]\ntimeout_secs = 0").unwrap();

        let err = Config::load_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_load_file_requires_existing_file() {
        let err = Config::load_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_api_token_not_serialized() {
        let mut config = Config::default();
        config.lookup.api_token = Some("secret-token".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret-token"));
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("species_column"));
        assert!(json.contains("min_total"));
        assert!(json.contains("taxonomy_url"));
    }
}
