//! `directories.txt` handling.
//!
//! The configuration file is a list of `key=value` lines. Blank lines and lines starting
//! with `#` are ignored, and keys and values are trimmed. Command-line flags take
//! precedence over anything read from the file.
//!
//! ```text
//! # where notes go
//! markdown_dir=/home/me/vault/literature
//! pdf_dir=/home/me/vault/pdfs
//! template_dir=/home/me/vault/templates
//! folder_scheme=published
//! ```
//!
//! The file is looked up, in order, at the path given with `--config`, at
//! `./directories.txt`, and at `<config dir>/litnote/directories.txt`.

use super::*;
use crate::{fetcher::DEFAULT_REGISTRY_URL, organizer::FolderScheme};

/// Name of the configuration file.
pub const CONFIG_FILE: &str = "directories.txt";

/// Template directory used when none is configured.
pub const DEFAULT_TEMPLATE_DIR: &str = "templates";

/// Shown when a required directory is not configured.
pub const CONFIG_HINT: &str = "Expected a directories.txt with lines like:\n  \
                               markdown_dir=/path/to/notes\n  pdf_dir=/path/to/pdfs\n  \
                               template_dir=/path/to/templates  # optional";

/// Values read from `directories.txt`, all optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directories {
  /// Root of the notes tree
  pub markdown_dir:  Option<PathBuf>,
  /// Where PDFs are placed
  pub pdf_dir:       Option<PathBuf>,
  /// Where `<type>_template.md` files are read from
  pub template_dir:  Option<PathBuf>,
  /// Year/quarter folder selection
  pub folder_scheme: Option<FolderScheme>,
  /// DOI resolver base URL
  pub registry_url:  Option<String>,
  /// External PDF tool command line
  pub pdf_command:   Option<String>,
  /// The file these values came from
  pub source:        Option<PathBuf>,
}

/// Fully resolved settings for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  /// Root of the notes tree
  pub markdown_dir:  PathBuf,
  /// Where PDFs are placed
  pub pdf_dir:       PathBuf,
  /// Where templates are read from
  pub template_dir:  PathBuf,
  /// Year/quarter folder selection
  pub folder_scheme: FolderScheme,
  /// DOI resolver base URL
  pub registry_url:  String,
  /// External PDF tool command line, `None` for the default
  pub pdf_command:   Option<String>,
}

impl Directories {
  /// Per-user configuration file location.
  pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("litnote").join(CONFIG_FILE))
  }

  /// Loads the configuration.
  ///
  /// With `explicit`, that file must exist. Otherwise the working directory and the
  /// per-user location are tried; when neither has a file, every value is unset.
  pub fn load(explicit: Option<&Path>) -> Result<Self> {
    let path = match explicit {
      Some(path) if path.is_file() => path.to_path_buf(),
      Some(path) => {
        return Err(LitnoteError::Config(format!(
          "Configuration file {} does not exist",
          path.display()
        )))
      },
      None => {
        let candidates = std::iter::once(PathBuf::from(CONFIG_FILE)).chain(Self::default_path());
        match candidates.into_iter().find(|p| p.is_file()) {
          Some(path) => path,
          None => {
            debug!("No {CONFIG_FILE} found, relying on command-line flags");
            return Ok(Self::default());
          },
        }
      },
    };

    debug!("Loading configuration from {path:?}");
    let mut directories = Self::parse(&std::fs::read_to_string(&path)?)?;
    directories.source = Some(path);
    Ok(directories)
  }

  /// Parses the `key=value` format.
  pub fn parse(text: &str) -> Result<Self> {
    let mut directories = Self::default();
    for (number, line) in text.lines().enumerate() {
      let line = line.trim();
      if line.is_empty() || line.starts_with('#') {
        continue;
      }
      let Some((key, value)) = line.split_once('=') else {
        warn!("Ignoring line {} of {CONFIG_FILE}, expected key=value: {line}", number + 1);
        continue;
      };
      let value = value.trim();
      match key.trim() {
        "markdown_dir" => directories.markdown_dir = Some(PathBuf::from(value)),
        "pdf_dir" => directories.pdf_dir = Some(PathBuf::from(value)),
        "template_dir" => directories.template_dir = Some(PathBuf::from(value)),
        "folder_scheme" => directories.folder_scheme = Some(value.parse()?),
        "registry_url" => directories.registry_url = Some(value.to_string()),
        "pdf_command" => directories.pdf_command = Some(value.to_string()),
        other => warn!("Ignoring unknown key in {CONFIG_FILE}: {other}"),
      }
    }
    Ok(directories)
  }

  /// Merges command-line values over the file's values.
  ///
  /// # Errors
  ///
  /// Returns [`LitnoteError::Config`] when the markdown or PDF directory is set in
  /// neither place.
  pub fn resolve(
    self,
    markdown_dir: Option<PathBuf>,
    pdf_dir: Option<PathBuf>,
    template_dir: Option<PathBuf>,
  ) -> Result<Settings> {
    let missing = |key: &str| {
      let location =
        self.source.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default();
      LitnoteError::Config(format!("{key} is not configured{location}.\n{CONFIG_HINT}"))
    };

    let markdown_dir =
      markdown_dir.or_else(|| self.markdown_dir.clone()).ok_or_else(|| missing("markdown_dir"))?;
    let pdf_dir = pdf_dir.or_else(|| self.pdf_dir.clone()).ok_or_else(|| missing("pdf_dir"))?;
    let template_dir = template_dir
      .or(self.template_dir)
      .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_DIR));

    Ok(Settings {
      markdown_dir,
      pdf_dir,
      template_dir,
      folder_scheme: self.folder_scheme.unwrap_or_default(),
      registry_url: self.registry_url.unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string()),
      pdf_command: self.pdf_command,
    })
  }
}
