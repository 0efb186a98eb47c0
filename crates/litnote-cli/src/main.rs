//! `litnote`: import one DOI as a literature note.
//!
//! Fetches the DOI's metadata, renders the template for its publication type, files the
//! note under `markdown_dir/<year>/Q<n>/`, tries to place the PDF in `pdf_dir`, and prints
//! the note's BibTeX entry.

use std::process::ExitCode;

use clap::Parser;
use litnote_cli::{normalize_args, report_error, run_note, setup_logging, NoteCli};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
  let cli = NoteCli::parse_from(normalize_args(std::env::args_os()));
  setup_logging(cli.shared.verbose);

  match run_note(cli).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      report_error(&e);
      ExitCode::FAILURE
    },
  }
}
