//! Literature note generation from DOIs.
//!
//! `litnote` turns a Digital Object Identifier into a markdown literature note, providing:
//!
//! - Metadata retrieval from the DOI registry (CSL-JSON content negotiation)
//! - Publication type classification
//! - Template rendering with an embedded BibTeX entry
//! - Year/quarter foldering of notes with idempotent overwrite
//! - Best-effort PDF acquisition
//! - Sequential batch processing of DOI lists
//!
//! # Getting Started
//!
//! ```no_run
//! use litnote::{config::Directories, pipeline::{Pipeline, Request}, prelude::*};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), LitnoteError> {
//!   let directories = Directories::load(None)?.resolve(None, None, None)?;
//!   let pipeline = Pipeline::new(directories)?;
//!
//!   let outcome = pipeline.run(&Request::new("10.1145/1327452.1327492".parse()?)).await?;
//!   println!("Note written to {}", outcome.note_path.display());
//!   println!("{}", outcome.bibtex);
//!   Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`doi`]: DOI parsing and normalisation
//! - [`record`]: The canonical bibliographic record
//! - [`fetcher`]: Registry client
//! - [`classify`]: Publication type classification
//! - [`template`]: Template loading and rendering
//! - [`bibtex`]: BibTeX entry generation
//! - [`organizer`]: Note placement on disk
//! - [`pdf`]: PDF acquisition
//! - [`batch`]: DOI list handling
//! - [`config`]: `directories.txt` handling
//! - [`pipeline`]: The single-DOI pipeline

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  fmt::Display,
  path::{Path, PathBuf},
  str::FromStr,
};

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod batch;
pub mod bibtex;
pub mod classify;
pub mod config;
pub mod doi;
pub mod error;
pub mod fetcher;
pub mod format;
pub mod organizer;
pub mod pdf;
pub mod pipeline;
pub mod record;
pub mod template;

use crate::{classify::PublicationType, doi::Doi, error::*, record::Record};

/// Common traits and types for ergonomic imports.
///
/// # Usage
///
/// ```no_run
/// use litnote::prelude::*;
///
/// fn example() -> Result<PublicationType, LitnoteError> { "journal".parse() }
/// ```
pub mod prelude {
  pub use crate::{
    classify::PublicationType, doi::Doi, error::LitnoteError, pdf::PdfSource, record::Record,
  };
}
