//! Placement of notes on disk.
//!
//! Notes live under `markdown_dir/<year>/Q<quarter>/`. A note is identified by its file
//! name alone: writing a note whose file already exists anywhere under the markdown
//! directory replaces that file in place, so re-importing a DOI never leaves a second
//! copy behind in another folder.

use super::*;
use crate::template::RenderedNote;

/// How the year/quarter folder of a note is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderScheme {
  /// By publication date, falling back to the import date when it is incomplete
  #[default]
  Published,
  /// By import date
  Imported,
}

impl FromStr for FolderScheme {
  type Err = LitnoteError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "published" => Ok(FolderScheme::Published),
      "imported" => Ok(FolderScheme::Imported),
      other => Err(LitnoteError::Config(format!(
        "Invalid folder_scheme \"{other}\", expected \"published\" or \"imported\""
      ))),
    }
  }
}

/// Quarter (1 to 4) containing `month`.
pub fn quarter(month: u32) -> u32 { (month.clamp(1, 12) - 1) / 3 + 1 }

/// Writes notes into the markdown directory.
#[derive(Debug, Clone)]
pub struct Organizer {
  /// Root of the notes tree
  markdown_dir: PathBuf,
  /// Folder selection
  scheme:       FolderScheme,
}

impl Organizer {
  /// Creates an organizer rooted at `markdown_dir`.
  pub fn new(markdown_dir: impl Into<PathBuf>, scheme: FolderScheme) -> Self {
    Self { markdown_dir: markdown_dir.into(), scheme }
  }

  /// The `<year>/Q<n>` folder a new note for `record` goes into.
  pub fn folder_for(&self, record: &Record, imported: NaiveDate) -> PathBuf {
    let (year, quarter) = match (self.scheme, record.published_quarter()) {
      (FolderScheme::Published, Some(published)) => published,
      (FolderScheme::Published, None) => {
        debug!("Incomplete publication date for {}, filing by import date", record.doi);
        (imported.year(), quarter(imported.month()))
      },
      (FolderScheme::Imported, _) => (imported.year(), quarter(imported.month())),
    };
    self.markdown_dir.join(year.to_string()).join(format!("Q{quarter}"))
  }

  /// Finds a note named `file_name` anywhere under the markdown directory.
  ///
  /// Hidden directories such as `.trash/` or `.obsidian/` are not searched.
  pub fn find_existing(&self, file_name: &str) -> Result<Option<PathBuf>> {
    if !self.markdown_dir.is_dir() {
      return Ok(None);
    }
    let pattern = format!(
      "{}/**/{}",
      glob::Pattern::escape(&self.markdown_dir.to_string_lossy()),
      glob::Pattern::escape(file_name)
    );
    trace!("Looking for existing note with pattern {pattern}");
    let options = glob::MatchOptions { require_literal_leading_dot: true, ..Default::default() };
    Ok(
      glob::glob_with(&pattern, options)?
        .flatten()
        .find(|path| path.is_file() && !self.is_hidden(path)),
    )
  }

  /// Whether `path` lies in a dot-directory below the markdown directory.
  fn is_hidden(&self, path: &Path) -> bool {
    path
      .strip_prefix(&self.markdown_dir)
      .map(|relative| {
        relative.components().any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
      })
      .unwrap_or(false)
  }

  /// Writes `note`, replacing an existing note of the same name if there is one.
  ///
  /// Returns the path written.
  pub fn write(&self, note: &RenderedNote, record: &Record, imported: NaiveDate) -> Result<PathBuf> {
    let file_name = note.file_name();
    let path = match self.find_existing(&file_name)? {
      Some(existing) => {
        info!("Overwriting existing note {existing:?}");
        existing
      },
      None => {
        let folder = self.folder_for(record, imported);
        std::fs::create_dir_all(&folder)?;
        folder.join(file_name)
      },
    };

    std::fs::write(&path, normalise_escapes(&note.body))?;
    debug!("Wrote note to {path:?}");
    Ok(path)
  }
}

/// Collapses `\&amp;`, an escaped ampersand that was HTML-encoded again, back to `\&`.
fn normalise_escapes(body: &str) -> String { body.replace("\\&amp;", "\\&") }
