//! PDF acquisition.
//!
//! Getting the full text of a paper is best-effort. The acquirer either skips PDFs
//! entirely, copies a file the user already has, or tries a list of [`PdfSource`]s in
//! order until one produces a PDF. Whatever it ends up with is copied to
//! `pdf_dir/<alias>_<clean title>.pdf`, overwriting any earlier copy.
//!
//! Nothing here is fatal: every failure is logged as a warning and reported as
//! [`PdfOutcome::Missing`], and the note is written regardless.
//!
//! # Examples
//!
//! ```no_run
//! use litnote::{
//!   pdf::{PdfAcquirer, PdfChoice, PdfOutcome},
//!   prelude::*,
//! };
//!
//! # async fn example(record: Record) -> Result<(), LitnoteError> {
//! let doi: Doi = "10.1145/1327452.1327492".parse()?;
//! let acquirer = PdfAcquirer::with_defaults("papers", None)?;
//!
//! match acquirer.acquire(&doi, &record, &PdfChoice::Download).await {
//!   PdfOutcome::Placed(path) => println!("PDF saved to {}", path.display()),
//!   PdfOutcome::Missing => println!("No PDF found"),
//!   PdfOutcome::Skipped => unreachable!(),
//! }
//! # Ok(())
//! # }
//! ```

use std::{process::Stdio, time::Duration};

use async_trait::async_trait;
use tokio::process::Command;

use super::*;

/// External tool run by default to find a PDF for a DOI.
pub const DEFAULT_PDF_COMMAND: &str = "python3 -m PyPaperBot --doi {doi} --dwn-dir {dir}";

/// How long the external tool may run before it is killed.
const COMMAND_TIME_LIMIT: Duration = Duration::from_secs(300);

/// Time allowed for a direct PDF download.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Something that can try to produce a PDF for a publication.
///
/// Sources write into a scratch directory owned by the caller and return the path of
/// the PDF they produced. The acquirer takes care of copying it into place.
#[async_trait]
pub trait PdfSource: Send + Sync {
  /// Short name used in log messages.
  fn name(&self) -> &str;

  /// Tries to produce a PDF for `doi` inside `dir`.
  async fn fetch(&self, doi: &Doi, record: &Record, dir: &Path) -> Result<PathBuf>;
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfChoice {
  /// Leave the PDF directory alone
  Skip,
  /// Use this file instead of downloading
  Local(PathBuf),
  /// Try the configured sources
  Download,
}

/// Result of a PDF acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfOutcome {
  /// PDFs were skipped on request
  Skipped,
  /// A PDF was placed at this path
  Placed(PathBuf),
  /// No PDF could be obtained
  Missing,
}

impl PdfOutcome {
  /// Path of the placed PDF, if there is one.
  pub fn path(&self) -> Option<&Path> {
    match self {
      PdfOutcome::Placed(path) => Some(path),
      _ => None,
    }
  }
}

/// Runs an external command that downloads PDFs into a directory.
///
/// The command line is split on whitespace; `{doi}` and `{dir}` in any argument are
/// replaced with the DOI and the scratch directory. Output is discarded, and the newest
/// `.pdf` found under the directory afterwards is taken as the result.
#[derive(Debug, Clone)]
pub struct CommandFetcher {
  /// Program to run
  program:    String,
  /// Argument templates
  args:       Vec<String>,
  /// Upper bound on the command's run time
  time_limit: Duration,
}

impl CommandFetcher {
  /// Parses a command line such as [`DEFAULT_PDF_COMMAND`].
  pub fn from_command_line(line: &str) -> Result<Self> {
    let mut parts = line.split_whitespace().map(String::from);
    let program = parts
      .next()
      .ok_or_else(|| LitnoteError::Config("pdf_command must not be empty".to_string()))?;
    Ok(Self { program, args: parts.collect(), time_limit: COMMAND_TIME_LIMIT })
  }

  /// Sets how long the command may run.
  pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
    self.time_limit = time_limit;
    self
  }
}

#[async_trait]
impl PdfSource for CommandFetcher {
  fn name(&self) -> &str { &self.program }

  async fn fetch(&self, doi: &Doi, _record: &Record, dir: &Path) -> Result<PathBuf> {
    let dir_arg = dir.display().to_string();
    let args: Vec<String> = self
      .args
      .iter()
      .map(|arg| arg.replace("{doi}", doi.as_str()).replace("{dir}", &dir_arg))
      .collect();
    debug!("Running {} {}", self.program, args.join(" "));

    let mut child = Command::new(&self.program)
      .args(&args)
      .current_dir(dir)
      .stdin(Stdio::null())
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .kill_on_drop(true)
      .spawn()
      .map_err(|e| LitnoteError::Pdf(format!("could not start {}: {e}", self.program)))?;

    let status = tokio::time::timeout(self.time_limit, child.wait()).await.map_err(|_| {
      LitnoteError::Pdf(format!(
        "{} did not finish within {:?}",
        self.program, self.time_limit
      ))
    })??;
    debug!("{} exited with {status}", self.program);
    if !status.success() {
      return Err(LitnoteError::Pdf(format!("{} exited with {status} for {doi}", self.program)));
    }

    let path = newest_pdf(dir)?
      .ok_or_else(|| LitnoteError::Pdf(format!("{} produced no PDF for {doi}", self.program)))?;
    if !tokio::fs::read(&path).await?.starts_with(b"%PDF") {
      return Err(LitnoteError::Pdf(format!("{} wrote {path:?}, which is not a PDF", self.program)));
    }
    Ok(path)
  }
}

/// Downloads PDF links advertised in the record.
#[derive(Debug, Clone)]
pub struct LinkFetcher {
  /// HTTP client
  client: reqwest::Client,
}

impl LinkFetcher {
  /// Creates a fetcher with its own HTTP client.
  pub fn new() -> Result<Self> {
    let client = reqwest::Client::builder()
      .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
      .timeout(DOWNLOAD_TIMEOUT)
      .build()?;
    Ok(Self { client })
  }

  /// Downloads one URL, returning the body only if it is a PDF.
  async fn download(&self, url: &str) -> Result<Vec<u8>> {
    let response = self.client.get(url).send().await?;
    if !response.status().is_success() {
      trace!("PDF link response: {response:?}");
      return Err(LitnoteError::Pdf(format!("{url} returned {}", response.status())));
    }
    let bytes = response.bytes().await?;
    if !bytes.starts_with(b"%PDF") {
      return Err(LitnoteError::Pdf(format!("{url} did not return a PDF")));
    }
    Ok(bytes.to_vec())
  }
}

#[async_trait]
impl PdfSource for LinkFetcher {
  fn name(&self) -> &str { "record link" }

  async fn fetch(&self, doi: &Doi, record: &Record, dir: &Path) -> Result<PathBuf> {
    let mut last_error = None;
    for link in record.links.iter().filter(|link| link.is_pdf()) {
      debug!("Trying PDF link {}", link.url);
      match self.download(&link.url).await {
        Ok(bytes) => {
          let path = dir.join(format!("{}.pdf", doi.slug()));
          std::fs::write(&path, bytes)?;
          return Ok(path);
        },
        Err(e) => {
          debug!("PDF link failed: {e}");
          last_error = Some(e);
        },
      }
    }
    Err(last_error.unwrap_or_else(|| LitnoteError::Pdf(format!("no PDF links for {doi}"))))
  }
}

/// Places PDFs into the PDF directory.
pub struct PdfAcquirer {
  /// Destination directory
  pdf_dir: PathBuf,
  /// Sources tried in order when downloading
  sources: Vec<Box<dyn PdfSource>>,
}

impl PdfAcquirer {
  /// Creates an acquirer with explicit sources.
  pub fn new(pdf_dir: impl Into<PathBuf>, sources: Vec<Box<dyn PdfSource>>) -> Self {
    Self { pdf_dir: pdf_dir.into(), sources }
  }

  /// Creates an acquirer trying the external command first, then record links.
  ///
  /// `command` defaults to [`DEFAULT_PDF_COMMAND`].
  pub fn with_defaults(pdf_dir: impl Into<PathBuf>, command: Option<&str>) -> Result<Self> {
    let command = CommandFetcher::from_command_line(command.unwrap_or(DEFAULT_PDF_COMMAND))?;
    Ok(Self::new(pdf_dir, vec![Box::new(command), Box::new(LinkFetcher::new()?)]))
  }

  /// Where the PDF for `record` is placed.
  pub fn destination(&self, record: &Record) -> PathBuf {
    self.pdf_dir.join(format!("{}.pdf", record.file_stem()))
  }

  /// Acquires the PDF for `record` according to `choice`.
  pub async fn acquire(&self, doi: &Doi, record: &Record, choice: &PdfChoice) -> PdfOutcome {
    let result = match choice {
      PdfChoice::Skip => {
        debug!("Skipping PDF for {doi}");
        return PdfOutcome::Skipped;
      },
      PdfChoice::Local(path) => self.place_local(path, record),
      PdfChoice::Download => self.download(doi, record).await,
    };

    match result {
      Ok(Some(path)) => {
        info!("PDF placed at {path:?}");
        PdfOutcome::Placed(path)
      },
      Ok(None) => PdfOutcome::Missing,
      Err(e) => {
        warn!("Could not place PDF for {doi}: {e}");
        PdfOutcome::Missing
      },
    }
  }

  /// Copies a user-supplied file into place.
  fn place_local(&self, source: &Path, record: &Record) -> Result<Option<PathBuf>> {
    if !source.is_file() {
      warn!("Local PDF {source:?} does not exist");
      return Ok(None);
    }
    self.copy_into_place(source, record).map(Some)
  }

  /// Tries every source in a fresh scratch directory.
  async fn download(&self, doi: &Doi, record: &Record) -> Result<Option<PathBuf>> {
    let scratch = tempfile::tempdir()?;
    for source in &self.sources {
      match source.fetch(doi, record, scratch.path()).await {
        Ok(found) => {
          debug!("{} produced {found:?}", source.name());
          return self.copy_into_place(&found, record).map(Some);
        },
        Err(e) => warn!(source = %source.name(), "PDF source failed: {e}"),
      }
    }
    warn!("No PDF found for {doi}");
    Ok(None)
  }

  /// Copies `source` to the destination, overwriting what is there.
  fn copy_into_place(&self, source: &Path, record: &Record) -> Result<PathBuf> {
    let destination = self.destination(record);
    std::fs::create_dir_all(&self.pdf_dir)?;
    if destination.exists() && same_file(source, &destination)? {
      return Ok(destination);
    }
    std::fs::copy(source, &destination)?;
    Ok(destination)
  }
}

/// Whether two existing paths refer to the same file.
fn same_file(a: &Path, b: &Path) -> Result<bool> { Ok(a.canonicalize()? == b.canonicalize()?) }

/// Most recently modified `.pdf` anywhere under `dir`.
fn newest_pdf(dir: &Path) -> Result<Option<PathBuf>> {
  let pattern = format!("{}/**/*.pdf", glob::Pattern::escape(&dir.to_string_lossy()));
  let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
  for path in glob::glob(&pattern)?.flatten() {
    let modified = std::fs::metadata(&path)?.modified()?;
    if newest.as_ref().map_or(true, |(time, _)| modified >= *time) {
      newest = Some((modified, path));
    }
  }
  Ok(newest.map(|(_, path)| path))
}
