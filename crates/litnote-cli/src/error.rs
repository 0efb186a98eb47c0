//! Error types for the litnote command line tools.

use litnote::error::LitnoteError;
use thiserror::Error;

/// Result alias used by the command line tools.
pub type Result<T> = core::result::Result<T, LitnoteCliError>;

/// Errors surfaced to the user by `litnote` and `litnote-batch`.
#[derive(Error, Debug)]
pub enum LitnoteCliError {
  /// Anything the library reports
  #[error(transparent)]
  Litnote(#[from] LitnoteError),

  /// Some DOIs of a batch could not be imported
  #[error("{failed} of {total} DOIs failed")]
  BatchFailed {
    /// Number of failed DOIs
    failed: usize,
    /// Number of DOIs attempted
    total:  usize,
  },
}
