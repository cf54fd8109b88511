//! Reference service lookups for species metadata.
//!
//! Two collaborators enrich the species view:
//!
//! - **Taxonomy**: species code → scientific and localized common names.
//! - **Image**: display name → an image URL.
//!
//! Both are best-effort. [`taxonomy_best_effort`] and [`image_best_effort`]
//! turn every failure into [`LookupOutcome::Unavailable`] so that a network
//! problem only ever changes what is displayed.
//!
//! # Example
//!
//! ```no_run
//! use birdrisk::config::LookupConfig;
//! use birdrisk::lookup::{species_profile, EbirdTaxonomy, WikipediaImages};
//!
//! let config = LookupConfig::default();
//! let taxonomy = EbirdTaxonomy::new(&config).unwrap();
//! let images = WikipediaImages::new(&config).unwrap();
//! let profile = species_profile(&taxonomy, &images, "houspa", "House Sparrow");
//! println!("{profile:?}");
//! ```

mod image;
mod taxonomy;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

pub use image::{parse_image_response, WikipediaImages};
pub use taxonomy::{parse_taxonomy_response, EbirdTaxonomy};

/// User agent sent to reference services.
pub(crate) const USER_AGENT: &str = concat!("birdrisk/", env!("CARGO_PKG_VERSION"));

/// One taxonomy entry for a species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonRecord {
    /// Scientific (Latin) name.
    pub scientific_name: String,
    /// Common name in the requested locale.
    pub common_name: String,
}

/// Source of taxonomy records.
pub trait TaxonomyLookup: Send + Sync {
    /// The name of this service (for logging).
    fn name(&self) -> &'static str;

    /// Look up the taxonomy records for a species code.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an unexpected response.
    fn taxonomy(&self, species_id: &str) -> Result<Vec<TaxonRecord>>;
}

/// Source of species images.
pub trait ImageLookup: Send + Sync {
    /// The name of this service (for logging).
    fn name(&self) -> &'static str;

    /// Look up an image URL for a display name.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an unexpected response.
    fn image_url(&self, display_name: &str) -> Result<Option<String>>;
}

/// Outcome of a best-effort lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum LookupOutcome<T> {
    /// The service answered with data.
    Found(T),
    /// The service answered but had nothing for this species.
    NotFound,
    /// The service could not be used; the message is for display.
    Unavailable(String),
}

impl<T> LookupOutcome<T> {
    /// The found value, if any.
    #[must_use]
    pub fn found(&self) -> Option<&T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound | Self::Unavailable(_) => None,
        }
    }

    /// Check if the service could not be used.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl<T> fmt::Display for LookupOutcome<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(value) => write!(f, "{value:?}"),
            Self::NotFound => write!(f, "no data"),
            Self::Unavailable(reason) => write!(f, "unavailable ({reason})"),
        }
    }
}

/// Look up taxonomy records, degrading every failure to an outcome.
pub fn taxonomy_best_effort(
    lookup: &dyn TaxonomyLookup,
    species_id: &str,
) -> LookupOutcome<Vec<TaxonRecord>> {
    match lookup.taxonomy(species_id) {
        Ok(records) if records.is_empty() => {
            debug!(service = lookup.name(), species = species_id, "No taxonomy records");
            LookupOutcome::NotFound
        }
        Ok(records) => LookupOutcome::Found(records),
        Err(e) => {
            warn!(service = lookup.name(), species = species_id, error = %e, "Taxonomy lookup failed");
            LookupOutcome::Unavailable(e.to_string())
        }
    }
}

/// Look up an image URL, degrading every failure to an outcome.
pub fn image_best_effort(lookup: &dyn ImageLookup, display_name: &str) -> LookupOutcome<String> {
    match lookup.image_url(display_name) {
        Ok(Some(url)) => LookupOutcome::Found(url),
        Ok(None) => {
            debug!(service = lookup.name(), name = display_name, "No image");
            LookupOutcome::NotFound
        }
        Err(e) => {
            warn!(service = lookup.name(), name = display_name, error = %e, "Image lookup failed");
            LookupOutcome::Unavailable(e.to_string())
        }
    }
}

/// Reference metadata gathered for one species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesProfile {
    /// Stable species code.
    pub species_id: String,
    /// Display name used for the image lookup.
    pub display_name: String,
    /// Taxonomy lookup result.
    pub taxonomy: LookupOutcome<Vec<TaxonRecord>>,
    /// Image lookup result.
    pub image: LookupOutcome<String>,
}

/// Gather taxonomy and image metadata for a species.
///
/// Never fails; each part reports its own outcome.
pub fn species_profile(
    taxonomy: &dyn TaxonomyLookup,
    images: &dyn ImageLookup,
    species_id: &str,
    display_name: &str,
) -> SpeciesProfile {
    SpeciesProfile {
        species_id: species_id.to_string(),
        display_name: display_name.to_string(),
        taxonomy: taxonomy_best_effort(taxonomy, species_id),
        image: image_best_effort(images, display_name),
    }
}
