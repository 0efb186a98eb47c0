//! Error types for the litnote library.
//!
//! This module provides a single error type that covers every failure mode of the
//! note pipeline, including:
//! - Identifier validation
//! - Registry lookups and response parsing
//! - Template loading
//! - Configuration loading
//! - File system operations
//!
//! # Examples
//!
//! ```no_run
//! use litnote::{doi::Doi, error::LitnoteError, fetcher::MetadataClient};
//!
//! # async fn example() -> Result<(), LitnoteError> {
//! let doi: Doi = "10.1145/1327452.1327492".parse()?;
//! match MetadataClient::new()?.fetch(&doi).await {
//!   Err(LitnoteError::NotFound(doi)) => println!("No registry entry for {doi}"),
//!   Err(LitnoteError::Network(e)) => println!("Network error: {e}"),
//!   Err(e) => println!("Other error: {e}"),
//!   Ok(record) => println!("Fetched: {}", record.title),
//! }
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Error type alias used for the [`litnote`](crate) crate.
pub type Result<T> = core::result::Result<T, LitnoteError>;

/// Errors that can occur while turning a DOI into a note.
///
/// Most variants carry enough context (the DOI, the path, the offending value) to
/// produce a useful message for the user without further lookups.
#[derive(Error, Debug)]
pub enum LitnoteError {
  /// The provided text is not a DOI.
  ///
  /// The string parameter contains the rejected input after prefix stripping.
  #[error("Invalid DOI: \"{0}\"")]
  InvalidIdentifier(String),

  /// The registry has no entry for this DOI.
  #[error("DOI not found in registry: {0}")]
  NotFound(String),

  /// A network request failed.
  ///
  /// This can occur when:
  /// - The network is unavailable
  /// - The server is unreachable
  /// - The request times out
  /// - TLS errors occur
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// The registry answered with an unexpected status.
  #[error("API error: {0}")]
  ApiError(String),

  /// The registry answered, but the body was not usable CSL-JSON.
  #[error("Malformed registry response: {0}")]
  MalformedResponse(String),

  /// The forced or configured publication type is not one of the supported ones.
  #[error("Invalid publication type \"{0}\", expected one of journal, conference, book, chapter, misc")]
  InvalidType(String),

  /// No template file exists for the chosen publication type.
  #[error("Missing template for type '{kind}' at {}", path.display())]
  MissingTemplate {
    /// The publication type whose template was requested
    kind: String,
    /// Where the template was expected
    path: PathBuf,
  },

  /// A file system operation failed.
  ///
  /// This occurs when:
  /// - Reading a template or configuration file fails
  /// - Creating the note or PDF directories fails
  /// - Writing the note or copying the PDF fails
  #[error(transparent)]
  Path(#[from] std::io::Error),

  /// A glob pattern used to look up existing notes was invalid.
  #[error(transparent)]
  Pattern(#[from] glob::PatternError),

  /// A PDF could not be obtained from a particular source.
  ///
  /// These errors are reported as warnings by the acquirer and never abort note
  /// creation.
  #[error("PDF unavailable: {0}")]
  Pdf(String),

  /// The configuration is incomplete or malformed.
  #[error("{0}")]
  Config(String),
}
