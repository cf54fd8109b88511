//! eBird taxonomy client.
//!
//! API documentation: <https://documenter.getpostman.com/view/664302/S1ENwy59>

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use super::{TaxonRecord, TaxonomyLookup, USER_AGENT};
use crate::config::LookupConfig;
use crate::error::{Error, Result};

const SERVICE: &str = "taxonomy";

/// Header carrying the eBird API token.
const TOKEN_HEADER: &str = "X-eBirdApiToken";

/// One entry of the taxonomy response array.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EbirdTaxon {
    sci_name: String,
    com_name: String,
}

/// Parse a taxonomy response body.
///
/// # Errors
///
/// Returns [`Error::Lookup`] if the body is not an array of taxon objects.
pub fn parse_taxonomy_response(body: &str) -> Result<Vec<TaxonRecord>> {
    let taxa: Vec<EbirdTaxon> = serde_json::from_str(body)
        .map_err(|e| Error::lookup(SERVICE, format!("unexpected response shape: {e}")))?;

    Ok(taxa
        .into_iter()
        .map(|t| TaxonRecord {
            scientific_name: t.sci_name,
            common_name: t.com_name,
        })
        .collect())
}

/// Taxonomy lookups against the eBird reference API.
#[derive(Debug)]
pub struct EbirdTaxonomy {
    client: Client,
    base_url: String,
    token: Option<String>,
    locale: String,
}

impl EbirdTaxonomy {
    /// Create a client from the lookup configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.taxonomy_url.clone(),
            token: config.api_token.clone(),
            locale: config.locale.clone(),
        })
    }
}

impl TaxonomyLookup for EbirdTaxonomy {
    fn name(&self) -> &'static str {
        "ebird"
    }

    fn taxonomy(&self, species_id: &str) -> Result<Vec<TaxonRecord>> {
        let mut request = self
            .client
            .get(&self.base_url)
            .query(&[
                ("species", species_id),
                ("fmt", "json"),
                ("locale", self.locale.as_str()),
            ])
            .header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::lookup(SERVICE, format!("HTTP {status}")));
        }

        let body = response.text()?;
        debug!(species = species_id, bytes = body.len(), "Received taxonomy response");
        parse_taxonomy_response(&body)
    }
}
