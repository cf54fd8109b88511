//! Wikipedia page summary client used for species images.

use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use super::{ImageLookup, USER_AGENT};
use crate::config::LookupConfig;
use crate::error::{Error, Result};

const SERVICE: &str = "image";

#[derive(Debug, Deserialize)]
struct PageImage {
    source: String,
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    thumbnail: Option<PageImage>,
    originalimage: Option<PageImage>,
}

/// Parse a page summary body into an image URL.
///
/// Prefers the thumbnail and falls back to the original image.
///
/// # Errors
///
/// Returns [`Error::Lookup`] if the body is not a page summary object.
pub fn parse_image_response(body: &str) -> Result<Option<String>> {
    let summary: PageSummary = serde_json::from_str(body)
        .map_err(|e| Error::lookup(SERVICE, format!("unexpected response shape: {e}")))?;

    Ok(summary
        .thumbnail
        .or(summary.originalimage)
        .map(|image| image.source))
}

/// Image lookups against the Wikipedia page summary API.
#[derive(Debug)]
pub struct WikipediaImages {
    client: Client,
    base_url: Url,
}

impl WikipediaImages {
    /// Create a client from the lookup configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] for an unusable base URL and
    /// [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let base_url = Url::parse(&config.image_url).map_err(|e| Error::ConfigValidation {
            message: format!("invalid image_url {:?}: {e}", config.image_url),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::ConfigValidation {
                message: format!("image_url {:?} cannot be a base URL", config.image_url),
            });
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// URL of the page summary for a display name.
    #[must_use]
    pub fn summary_url(&self, display_name: &str) -> Url {
        let title = display_name.trim().replace(' ', "_");
        let mut url = self.base_url.clone();
        // `new` rejects URLs that cannot be a base, so segments are available.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&title);
        }
        url
    }
}

impl ImageLookup for WikipediaImages {
    fn name(&self) -> &'static str {
        "wikipedia"
    }

    fn image_url(&self, display_name: &str) -> Result<Option<String>> {
        if display_name.trim().is_empty() {
            return Ok(None);
        }

        let url = self.summary_url(display_name);
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::lookup(SERVICE, format!("HTTP {status}")));
        }

        let body = response.text()?;
        debug!(name = display_name, bytes = body.len(), "Received page summary");
        parse_image_response(&body)
    }
}
