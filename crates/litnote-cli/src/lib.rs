//! Shared plumbing for the `litnote` and `litnote-batch` binaries.
//!
//! Both binaries read `directories.txt`, merge it with their command-line flags and drive
//! the [`litnote`] pipeline. `litnote` imports a single DOI:
//!
//! ```bash
//! litnote -doi 10.1145/1327452.1327492
//! litnote --doi 10.1145/1327452.1327492 --force-type conference --skip-pdf
//! litnote --doi 10.1145/1327452.1327492 --local-pdf ~/Downloads/mapreduce.pdf
//! ```
//!
//! `litnote-batch` imports every DOI listed in a file, one after another:
//!
//! ```bash
//! litnote-batch dois.txt -v
//! ```

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{ffi::OsString, path::PathBuf};

use clap::{builder::ArgAction, Args, Parser};
use console::style;
use litnote::{
  batch::{read_doi_list, run_batch},
  config::{Directories, Settings},
  pdf::{PdfChoice, PdfOutcome},
  pipeline::{Outcome, Pipeline, Request},
  prelude::*,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub mod error;

use crate::error::*;

/// Prefix for information messages
pub static INFO_PREFIX: &str = "ℹ ";
/// Prefix for success messages
pub static SUCCESS_PREFIX: &str = "✓ ";
/// Prefix for warning messages
pub static WARNING_PREFIX: &str = "⚠️ ";
/// Prefix for error messages
pub static ERROR_PREFIX: &str = "✗ ";

/// Flags shared by both binaries.
#[derive(Args, Clone, Debug, Default)]
pub struct SharedArgs {
  /// Path to a directories.txt file. Defaults to ./directories.txt, then the per-user
  /// configuration directory.
  #[arg(long, value_name = "PATH")]
  pub config: Option<PathBuf>,

  /// Directory notes are filed under, overriding markdown_dir
  #[arg(long, value_name = "DIR")]
  pub markdown_dir: Option<PathBuf>,

  /// Directory PDFs are placed in, overriding pdf_dir
  #[arg(long, value_name = "DIR")]
  pub pdf_dir: Option<PathBuf>,

  /// Directory holding <type>_template.md files, overriding template_dir
  #[arg(long, value_name = "DIR")]
  pub template_dir: Option<PathBuf>,

  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(short, long, action = ArgAction::Count, help = "Increase logging verbosity")]
  pub verbose: u8,
}

impl SharedArgs {
  /// Loads `directories.txt` and applies the directory flags over it.
  pub fn settings(&self) -> Result<Settings> {
    let directories = Directories::load(self.config.as_deref())?;
    if let Some(source) = &directories.source {
      debug!("Using configuration from {source:?}");
    }
    Ok(directories.resolve(
      self.markdown_dir.clone(),
      self.pdf_dir.clone(),
      self.template_dir.clone(),
    )?)
  }
}

/// Import a single DOI as a literature note
#[derive(Parser, Debug)]
#[command(name = "litnote", author, version, about = "Turn a DOI into a templated literature note")]
pub struct NoteCli {
  /// The DOI to import, optionally prefixed with `doi:` or given as a doi.org URL
  #[arg(long, value_name = "DOI")]
  pub doi: String,

  /// Render the note as this type instead of the registry's
  #[arg(long, value_name = "TYPE", value_parser = parse_type)]
  pub force_type: Option<PublicationType>,

  /// Do not download or copy a PDF
  #[arg(long, conflicts_with = "local_pdf")]
  pub skip_pdf: bool,

  /// Use this PDF instead of downloading one
  #[arg(long, value_name = "PATH")]
  pub local_pdf: Option<PathBuf>,

  /// Flags shared with litnote-batch
  #[command(flatten)]
  pub shared: SharedArgs,
}

/// Import every DOI listed in a file
#[derive(Parser, Debug)]
#[command(
  name = "litnote-batch",
  author,
  version,
  about = "Import a newline-separated list of DOIs as literature notes"
)]
pub struct BatchCli {
  /// File with one DOI per line; blank lines and lines starting with # are skipped
  pub file: PathBuf,

  /// Do not download PDFs
  #[arg(long)]
  pub skip_pdf: bool,

  /// Flags shared with litnote
  #[command(flatten)]
  pub shared: SharedArgs,
}

/// Parses `--force-type` values.
fn parse_type(value: &str) -> std::result::Result<PublicationType, LitnoteError> { value.parse() }

/// Accepts the single-dash `-doi` spelling by rewriting it to `--doi`.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where I: IntoIterator<Item = OsString> {
  args
    .into_iter()
    .map(|arg| {
      let rewritten = match arg.to_str() {
        Some("-doi") => Some(OsString::from("--doi")),
        Some(s) if s.starts_with("-doi=") => Some(OsString::from(format!("-{s}"))),
        _ => None,
      };
      rewritten.unwrap_or(arg)
    })
    .collect()
}

/// Configures the logging system based on the verbosity level
///
/// The verbosity levels are:
/// - 0: error (default)
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
///
/// `RUST_LOG`, when set, takes precedence. Logs go to stderr so stdout carries only the
/// progress lines and the BibTeX entry.
pub fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_file(true)
    .with_line_number(true)
    .with_target(true)
    .init();
}

/// Prints an error with the error prefix.
pub fn report_error(error: &LitnoteCliError) {
  eprintln!("{} {}", style(ERROR_PREFIX).red(), style(error).red());
}

/// Runs the `litnote` binary.
pub async fn run_note(cli: NoteCli) -> Result<()> {
  let settings = cli.shared.settings()?;
  let doi: Doi = cli.doi.parse()?;

  let pdf = match (cli.skip_pdf, cli.local_pdf) {
    (true, _) => PdfChoice::Skip,
    (false, Some(path)) => PdfChoice::Local(path),
    (false, None) => PdfChoice::Download,
  };
  let request = Request::new(doi).with_force_type(cli.force_type).with_pdf(pdf);

  let pipeline = Pipeline::new(settings)?;
  import(&pipeline, &request).await?;
  Ok(())
}

/// Runs the `litnote-batch` binary.
pub async fn run_batch_file(cli: BatchCli) -> Result<()> {
  let settings = cli.shared.settings()?;
  let dois = read_doi_list(&cli.file)?;
  println!(
    "{} Importing {} DOIs from {}",
    style(INFO_PREFIX).cyan(),
    dois.len(),
    style(cli.file.display()).yellow()
  );

  let pipeline = Pipeline::new(settings)?;
  let pdf = if cli.skip_pdf { PdfChoice::Skip } else { PdfChoice::Download };

  let summary = run_batch(&dois, |doi| {
    let pipeline = &pipeline;
    let pdf = pdf.clone();
    async move {
      let result = match doi.parse::<Doi>() {
        Ok(parsed) => import(pipeline, &Request::new(parsed).with_pdf(pdf)).await,
        Err(e) => Err(e),
      };
      if let Err(e) = &result {
        eprintln!("{} {}: {}", style(ERROR_PREFIX).red(), style(&doi).yellow(), style(e).red());
      }
      result
    }
  })
  .await;

  println!("\n{} Batch finished: {summary}", style(INFO_PREFIX).cyan());
  for (doi, message) in &summary.failed {
    println!("  {} {doi}: {message}", style(ERROR_PREFIX).red());
  }

  if summary.is_success() {
    Ok(())
  } else {
    Err(LitnoteCliError::BatchFailed { failed: summary.failed.len(), total: summary.processed })
  }
}

/// Imports one DOI and prints what happened.
async fn import(pipeline: &Pipeline, request: &Request) -> litnote::error::Result<Outcome> {
  println!("{} Importing {}", style(INFO_PREFIX).cyan(), style(&request.doi).yellow());
  let outcome = pipeline.run(request).await?;

  if !outcome.missing_fields.is_empty() {
    println!(
      "{} Missing {} fields: {}",
      style(WARNING_PREFIX).yellow(),
      outcome.kind.label(),
      outcome.missing_fields.join(", ")
    );
  }

  match &outcome.pdf {
    PdfOutcome::Placed(path) =>
      println!("{} PDF saved to {}", style(SUCCESS_PREFIX).green(), style(path.display()).cyan()),
    PdfOutcome::Missing =>
      println!("{} No PDF available for {}", style(WARNING_PREFIX).yellow(), request.doi),
    PdfOutcome::Skipped => println!("{} Skipped PDF", style(INFO_PREFIX).cyan()),
  }

  println!(
    "{} Note written to {}",
    style(SUCCESS_PREFIX).green(),
    style(outcome.note_path.display()).cyan()
  );
  println!("\n{}\n", outcome.bibtex);
  Ok(outcome)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args(values: &[&str]) -> Vec<OsString> { values.iter().map(OsString::from).collect() }

  #[test]
  fn test_single_dash_doi() {
    let normalized = normalize_args(args(&["litnote", "-doi", "10.1/x", "-v"]));
    assert_eq!(normalized, args(&["litnote", "--doi", "10.1/x", "-v"]));

    let normalized = normalize_args(args(&["litnote", "-doi=10.1/x"]));
    assert_eq!(normalized, args(&["litnote", "--doi=10.1/x"]));
  }

  #[test]
  fn test_parse_note_flags() {
    let cli = NoteCli::try_parse_from(normalize_args(args(&[
      "litnote",
      "-doi",
      "10.1/x",
      "--force-type",
      "chapter",
      "--skip-pdf",
      "-vv",
    ])))
    .unwrap();
    assert_eq!(cli.doi, "10.1/x");
    assert_eq!(cli.force_type, Some(PublicationType::Chapter));
    assert!(cli.skip_pdf);
    assert_eq!(cli.shared.verbose, 2);
  }

  #[test]
  fn test_skip_and_local_pdf_conflict() {
    let result = NoteCli::try_parse_from(args(&[
      "litnote",
      "--doi",
      "10.1/x",
      "--skip-pdf",
      "--local-pdf",
      "a.pdf",
    ]));
    assert!(result.is_err());
  }

  #[test]
  fn test_invalid_force_type() {
    let result =
      NoteCli::try_parse_from(args(&["litnote", "--doi", "10.1/x", "--force-type", "thesis"]));
    assert!(result.is_err());
  }

  #[test]
  fn test_parse_batch_flags() {
    let cli = BatchCli::try_parse_from(args(&["litnote-batch", "dois.txt", "--config", "d.txt"]))
      .unwrap();
    assert_eq!(cli.file, PathBuf::from("dois.txt"));
    assert_eq!(cli.shared.config, Some(PathBuf::from("d.txt")));
    assert!(!cli.skip_pdf);
  }
}
