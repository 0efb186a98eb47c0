//! Integration tests for the litnote and litnote-batch binaries.
//!
//! Each test points the binaries at a mock registry through a temporary directories.txt
//! and renders the templates shipped in the repository.

use std::{
  fs,
  path::{Path, PathBuf},
};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::{tempdir, TempDir};
use wiremock::{
  matchers::{method, path},
  Mock, MockServer, ResponseTemplate,
};

const MAPREDUCE: &str = "10.1145/1327452.1327492";
const NOTE: &str = "notes/2008/Q1/Dean2008_MapReduce_simplified_data_processing_on_large_clusters.md";

fn litnote() -> Command { Command::cargo_bin("litnote").unwrap() }

fn litnote_batch() -> Command { Command::cargo_bin("litnote-batch").unwrap() }

fn templates() -> PathBuf { Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates") }

async fn registry() -> MockServer {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path(format!("/{MAPREDUCE}")))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "DOI": MAPREDUCE,
      "type": "journal-article",
      "title": "MapReduce: simplified data processing on large clusters",
      "author": [
        { "given": "Jeffrey", "family": "Dean" },
        { "given": "Sanjay", "family": "Ghemawat" }
      ],
      "container-title": "Communications of the ACM",
      "volume": "51",
      "issue": "1",
      "page": "107-113",
      "publisher": "Association for Computing Machinery (ACM)",
      "issued": { "date-parts": [[2008, 1]] },
      "ISSN": ["0001-0782"]
    })))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/10.1000/abc456"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "DOI": "10.1000/abc456",
      "type": "dataset",
      "title": "Sensor readings",
      "author": [{ "given": "Grace", "family": "Hopper" }],
      "issued": { "date-parts": [[2021, 11]] }
    })))
    .mount(&server)
    .await;
  server
}

/// Writes a directories.txt for `server` and returns the workspace and its path.
fn workspace(server: &MockServer) -> (TempDir, PathBuf) {
  let dir = tempdir().unwrap();
  let config = dir.path().join("directories.txt");
  fs::write(
    &config,
    format!(
      "# test layout\nmarkdown_dir={}\npdf_dir={}\ntemplate_dir={}\nregistry_url={}\n\
       pdf_command=litnote-test-missing-tool {{doi}}\n",
      dir.path().join("notes").display(),
      dir.path().join("pdfs").display(),
      templates().display(),
      server.uri()
    ),
  )
  .unwrap();
  (dir, config)
}

fn markdown_files(dir: &Path) -> usize {
  let mut count = 0;
  let mut pending = vec![dir.to_path_buf()];
  while let Some(current) = pending.pop() {
    for entry in fs::read_dir(current).unwrap().flatten() {
      let path = entry.path();
      if path.is_dir() {
        pending.push(path);
      } else if path.extension().is_some_and(|ext| ext == "md") {
        count += 1;
      }
    }
  }
  count
}

#[test]
fn test_help() {
  litnote()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("--force-type"))
    .stdout(predicate::str::contains("--local-pdf"));
  litnote_batch().arg("--help").assert().success().stdout(predicate::str::contains("<FILE>"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_import_with_skip_pdf() -> anyhow::Result<()> {
  let server = registry().await;
  let (dir, config) = workspace(&server);

  litnote()
    .args(["-doi", MAPREDUCE, "--skip-pdf", "--config"])
    .arg(&config)
    .assert()
    .success()
    .stdout(predicate::str::contains("Note written to"))
    .stdout(predicate::str::contains("@article{Dean2008,"))
    .stdout(predicate::str::contains("\tpages={107--113},"));

  let note = fs::read_to_string(dir.path().join(NOTE))?;
  assert!(note.contains("type: Journal Article"));
  assert!(note.contains("status: NoPDF"));
  assert!(note.contains("  - \"Jeffrey Dean\"\n  - \"Sanjay Ghemawat\""));
  assert!(note.contains("journal: \"Communications of the ACM\""));
  assert!(note.contains("pages: \"107-113\""));
  assert!(note.contains("pdf: \"PDF not available\""));
  assert!(!note.contains("{{"));
  assert!(!dir.path().join("pdfs").exists());
  Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_force_type() -> anyhow::Result<()> {
  let server = registry().await;
  let (dir, config) = workspace(&server);

  litnote()
    .args(["--doi", MAPREDUCE, "--skip-pdf", "--force-type", "conference", "--config"])
    .arg(&config)
    .assert()
    .success()
    .stdout(predicate::str::contains("@inproceedings{Dean2008,"));

  let note = fs::read_to_string(dir.path().join(NOTE))?;
  assert!(note.contains("type: Conference Proceedings"));
  assert!(note.contains("booktitle: \"Communications of the ACM\""));
  Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_local_pdf_is_copied() -> anyhow::Result<()> {
  let server = registry().await;
  let (dir, config) = workspace(&server);
  let local = dir.path().join("downloaded.pdf");
  fs::write(&local, b"%PDF-1.4 the exact bytes")?;

  litnote()
    .args(["--doi", MAPREDUCE, "--config"])
    .arg(&config)
    .arg("--local-pdf")
    .arg(&local)
    .assert()
    .success()
    .stdout(predicate::str::contains("PDF saved to"));

  let pdf =
    dir.path().join("pdfs/Dean2008_MapReduce_simplified_data_processing_on_large_clusters.pdf");
  assert_eq!(fs::read(&pdf)?, b"%PDF-1.4 the exact bytes");
  let note = fs::read_to_string(dir.path().join(NOTE))?;
  assert!(note.contains("status: Imported"));
  assert!(note.contains(&format!("pdf: \"{}\"", pdf.display())));
  Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rerun_overwrites_note() -> anyhow::Result<()> {
  let server = registry().await;
  let (dir, config) = workspace(&server);

  for _ in 0..2 {
    litnote().args(["--doi", MAPREDUCE, "--skip-pdf", "--config"]).arg(&config).assert().success();
  }
  assert_eq!(markdown_files(&dir.path().join("notes")), 1);

  // A note the user moved elsewhere is updated where it now lives.
  let moved = dir.path().join("notes/reading");
  fs::create_dir_all(&moved)?;
  let original = dir.path().join(NOTE);
  let target = moved.join(original.file_name().unwrap());
  fs::rename(&original, &target)?;

  litnote().args(["--doi", MAPREDUCE, "--skip-pdf", "--config"]).arg(&config).assert().success();
  assert!(!original.exists());
  assert!(fs::read_to_string(&target)?.contains("type: Journal Article"));
  assert_eq!(markdown_files(&dir.path().join("notes")), 1);
  Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_doi_fails() {
  let server = registry().await;
  let (dir, config) = workspace(&server);

  litnote()
    .args(["--doi", "10.9999/nothing", "--skip-pdf", "--config"])
    .arg(&config)
    .assert()
    .failure()
    .stderr(predicate::str::contains("not found"));
  assert!(!dir.path().join("notes").exists());
}

#[test]
fn test_invalid_doi_fails() {
  let dir = tempdir().unwrap();
  litnote()
    .args(["--doi", "not-a-doi", "--markdown-dir"])
    .arg(dir.path())
    .arg("--pdf-dir")
    .arg(dir.path())
    .current_dir(dir.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("Invalid DOI"));
}

#[test]
fn test_missing_directories_fails() {
  let dir = tempdir().unwrap();
  let config = dir.path().join("directories.txt");
  fs::write(&config, "markdown_dir=/tmp/notes\n").unwrap();

  litnote()
    .args(["--doi", MAPREDUCE, "--config"])
    .arg(&config)
    .assert()
    .failure()
    .stderr(predicate::str::contains("pdf_dir is not configured"))
    .stderr(predicate::str::contains("markdown_dir=/path/to/notes"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_batch_imports_every_listed_doi() -> anyhow::Result<()> {
  let server = registry().await;
  let (dir, config) = workspace(&server);
  let list = dir.path().join("dois.txt");
  fs::write(&list, format!("DOI {MAPREDUCE}\n\n# skipped\ndoi:10.1000/abc456\n"))?;

  litnote_batch()
    .arg(&list)
    .args(["--skip-pdf", "--config"])
    .arg(&config)
    .assert()
    .success()
    .stdout(predicate::str::contains("2 processed, 2 succeeded, 0 failed"));

  assert!(dir.path().join(NOTE).is_file());
  assert!(dir.path().join("notes/2021/Q4/Hopper2021_Sensor_readings.md").is_file());

  let requests = server.received_requests().await.unwrap_or_default();
  assert_eq!(requests.len(), 2);
  Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_batch_continues_past_failures() -> anyhow::Result<()> {
  let server = registry().await;
  let (dir, config) = workspace(&server);
  let list = dir.path().join("dois.txt");
  fs::write(&list, "10.9999/nothing\nnot a doi\n10.1000/abc456\n")?;

  litnote_batch()
    .arg(&list)
    .args(["--skip-pdf", "--config"])
    .arg(&config)
    .assert()
    .failure()
    .stdout(predicate::str::contains("3 processed, 1 succeeded, 2 failed"))
    .stderr(predicate::str::contains("2 of 3 DOIs failed"));

  assert!(dir.path().join("notes/2021/Q4/Hopper2021_Sensor_readings.md").is_file());
  Ok(())
}
