//! `litnote-batch`: import every DOI listed in a file.
//!
//! DOIs are processed one at a time. A failure is reported and the batch moves on; the
//! exit status is non-zero when any DOI failed.

use std::process::ExitCode;

use clap::Parser;
use litnote_cli::{report_error, run_batch_file, setup_logging, BatchCli};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
  let cli = BatchCli::parse();
  setup_logging(cli.shared.verbose);

  match run_batch_file(cli).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      report_error(&e);
      ExitCode::FAILURE
    },
  }
}
