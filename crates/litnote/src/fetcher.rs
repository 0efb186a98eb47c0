//! Registry client for DOI metadata.
//!
//! Metadata is fetched from the DOI resolver using content negotiation: a `GET` of
//! `<base>/<doi>` with an `Accept` header asking for CSL-JSON. The resolver redirects to the
//! registration agency (Crossref, DataCite, ...) which answers with the record.
//!
//! The client performs exactly one request per fetch. There are no retries; a failure is
//! reported to the caller and the pipeline aborts that DOI.

use std::time::Duration;

use reqwest::{header, StatusCode};
use serde_json::Value;

use super::*;

/// Default DOI resolver.
pub const DEFAULT_REGISTRY_URL: &str = "https://doi.org";

/// Media type requested from the resolver.
pub const CSL_JSON: &str = "application/vnd.citationstyles.csl+json";

/// Time allowed for a single metadata request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches [`Record`]s for DOIs.
#[derive(Debug, Clone)]
pub struct MetadataClient {
  /// HTTP client with the user agent and timeout applied
  client:   reqwest::Client,
  /// Resolver base URL without a trailing slash
  base_url: String,
}

impl MetadataClient {
  /// Creates a client for the public DOI resolver.
  pub fn new() -> Result<Self> { Self::with_base_url(DEFAULT_REGISTRY_URL) }

  /// Creates a client against a custom resolver, e.g. a mirror or a test server.
  pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
    let base_url = base_url.into().trim_end_matches('/').to_string();
    let client = reqwest::Client::builder()
      .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
      .timeout(REQUEST_TIMEOUT)
      .build()?;
    Ok(Self { client, base_url })
  }

  /// The resolver this client talks to.
  pub fn base_url(&self) -> &str { &self.base_url }

  /// Fetches and normalises the record for `doi`.
  ///
  /// # Errors
  ///
  /// - [`LitnoteError::NotFound`] when the resolver answers 404
  /// - [`LitnoteError::ApiError`] for any other unsuccessful status
  /// - [`LitnoteError::Network`] when the request itself fails
  /// - [`LitnoteError::MalformedResponse`] when the body is not a CSL-JSON object
  pub async fn fetch(&self, doi: &Doi) -> Result<Record> {
    let url = format!("{}/{}", self.base_url, encoded_path(doi));
    debug!("Fetching metadata for {doi} from {url}");

    let response = self.client.get(&url).header(header::ACCEPT, CSL_JSON).send().await?;
    let status = response.status();
    match status {
      StatusCode::NOT_FOUND => return Err(LitnoteError::NotFound(doi.to_string())),
      status if !status.is_success() => {
        return Err(LitnoteError::ApiError(format!(
          "{} returned {} for {doi}",
          self.base_url, status
        )))
      },
      _ => {},
    }

    let data = response.bytes().await?;
    trace!("Registry response for {doi}: {}", String::from_utf8_lossy(&data));

    let json: Value = serde_json::from_slice(&data)
      .map_err(|e| LitnoteError::MalformedResponse(format!("Failed to parse JSON: {e}")))?;

    let mut record = Record::from_csl(&json)?;
    if record.doi.is_empty() {
      record.doi = doi.to_string();
    }
    debug!("Fetched \"{}\" ({} authors)", record.title, record.authors.len());
    Ok(record)
  }
}

/// Percent-encodes every `/`-separated segment of `doi` so that `#`, `?` and `%` in a
/// suffix stay part of the request path.
fn encoded_path(doi: &Doi) -> String {
  doi.as_str().split('/').map(urlencoding::encode).collect::<Vec<_>>().join("/")
}
