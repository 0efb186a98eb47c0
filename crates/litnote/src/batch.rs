//! DOI list handling for batch imports.
//!
//! A DOI list is a text file with one DOI per line. Lines may carry a `doi:` or `DOI `
//! prefix; blank lines and `#` comments are skipped. Each remaining line is handed to the
//! single-DOI pipeline in turn, and a failure for one DOI never stops the rest.
//!
//! # Examples
//!
//! ```
//! use litnote::batch::parse_doi_list;
//!
//! let dois = parse_doi_list("DOI 10.1000/xyz123\n\n# later\n10.1000/abc456\n");
//! assert_eq!(dois, vec!["10.1000/xyz123", "10.1000/abc456"]);
//! ```

use std::future::Future;

use super::*;

/// Extracts the DOIs from the contents of a DOI list.
pub fn parse_doi_list(text: &str) -> Vec<String> {
  text
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty() && !line.starts_with('#'))
    .map(|line| doi::strip_prefix(line).trim().to_string())
    .filter(|doi| !doi.is_empty())
    .collect()
}

/// Reads and parses a DOI list file.
pub fn read_doi_list(path: &Path) -> Result<Vec<String>> {
  let text = std::fs::read_to_string(path)?;
  let dois = parse_doi_list(&text);
  debug!("Read {} DOIs from {path:?}", dois.len());
  Ok(dois)
}

/// Tally of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
  /// Number of DOIs attempted
  pub processed: usize,
  /// DOIs that failed, with the error message
  pub failed:    Vec<(String, String)>,
}

impl BatchSummary {
  /// Number of DOIs that succeeded.
  pub fn succeeded(&self) -> usize { self.processed - self.failed.len() }

  /// Whether every DOI succeeded.
  pub fn is_success(&self) -> bool { self.failed.is_empty() }
}

impl Display for BatchSummary {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} processed, {} succeeded, {} failed", self.processed, self.succeeded(), self.failed.len())
  }
}

/// Runs `invoke` once per DOI, in order, waiting for each to finish before the next.
///
/// Errors are recorded in the summary and never stop the batch.
pub async fn run_batch<F, Fut, T>(dois: &[String], mut invoke: F) -> BatchSummary
where
  F: FnMut(String) -> Fut,
  Fut: Future<Output = Result<T>>, {
  let mut summary = BatchSummary::default();
  for (index, doi) in dois.iter().enumerate() {
    info!("[{}/{}] Processing {doi}", index + 1, dois.len());
    summary.processed += 1;
    if let Err(e) = invoke(doi.clone()).await {
      warn!("Failed to process {doi}: {e}");
      summary.failed.push((doi.clone(), e.to_string()));
    }
  }
  summary
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  #[test]
  fn test_parse_strips_prefixes_and_blanks() {
    let text = "DOI 10.1000/xyz123\n\n10.1000/abc456\n";
    assert_eq!(parse_doi_list(text), vec!["10.1000/xyz123", "10.1000/abc456"]);

    let text = "  doi:10.1/a  \n# 10.1/commented\nDoi: 10.1/b\r\n   \n";
    assert_eq!(parse_doi_list(text), vec!["10.1/a", "10.1/b"]);
  }

  #[test]
  fn test_read_doi_list() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dois.txt");
    fs::write(&path, "10.1000/one\n10.1000/two\n").unwrap();
    assert_eq!(read_doi_list(&path).unwrap().len(), 2);
    assert!(read_doi_list(&dir.path().join("none.txt")).is_err());
  }

  #[traced_test]
  #[tokio::test]
  async fn test_run_batch_invokes_once_per_doi() {
    let dois = parse_doi_list("DOI 10.1000/xyz123\n\n10.1000/abc456\n");
    let mut seen = Vec::new();
    let summary = run_batch(&dois, |doi| {
      seen.push(doi);
      async { Ok::<_, LitnoteError>(()) }
    })
    .await;

    assert_eq!(seen, vec!["10.1000/xyz123", "10.1000/abc456"]);
    assert_eq!(summary.processed, 2);
    assert!(summary.is_success());
  }

  #[traced_test]
  #[tokio::test]
  async fn test_run_batch_continues_after_failure() {
    let dois: Vec<String> = vec!["10.1/bad".into(), "10.1/good".into(), "garbage".into()];
    let summary = run_batch(&dois, |doi| async move {
      match doi.as_str() {
        "10.1/good" => Ok(()),
        other => Err(LitnoteError::NotFound(other.to_string())),
      }
    })
    .await;

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.failed[0].0, "10.1/bad");
    assert_eq!(summary.to_string(), "3 processed, 1 succeeded, 2 failed");
    assert!(logs_contain("Failed to process garbage"));
  }
}
