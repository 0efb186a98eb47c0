//! Publication type classification.
//!
//! Every note is rendered from one of five templates. The classifier picks the template
//! from the registry's type tag, accepting both the CSL vocabulary returned by content
//! negotiation (`article-journal`, `paper-conference`, `chapter`) and the Crossref
//! vocabulary (`journal-article`, `proceedings-article`, `book-chapter`). Works whose tag
//! is not mapped fall back to a container-title heuristic, then to [`PublicationType::Misc`].
//!
//! # Examples
//!
//! ```
//! use litnote::{classify::{classify, PublicationType}, record::Record};
//!
//! let record = Record { kind: Some("journal-article".into()), ..Default::default() };
//! assert_eq!(classify(&record, None), PublicationType::Journal);
//!
//! // A forced type always wins.
//! assert_eq!(classify(&record, Some(PublicationType::Book)), PublicationType::Book);
//! ```

use super::*;

/// The five supported publication categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationType {
  /// Journal articles
  Journal,
  /// Papers in conference proceedings
  Conference,
  /// Whole books
  Book,
  /// Chapters or sections of books
  Chapter,
  /// Anything else
  Misc,
}

impl PublicationType {
  /// All types, in the order they are listed to users.
  pub const ALL: [PublicationType; 5] = [
    PublicationType::Journal,
    PublicationType::Conference,
    PublicationType::Book,
    PublicationType::Chapter,
    PublicationType::Misc,
  ];

  /// Lowercase name, as accepted by `--force-type`.
  pub fn name(&self) -> &'static str {
    match self {
      PublicationType::Journal => "journal",
      PublicationType::Conference => "conference",
      PublicationType::Book => "book",
      PublicationType::Chapter => "chapter",
      PublicationType::Misc => "misc",
    }
  }

  /// Label written into notes and the BibTeX `type` field.
  pub fn label(&self) -> &'static str {
    match self {
      PublicationType::Journal => "Journal Article",
      PublicationType::Conference => "Conference Proceedings",
      PublicationType::Book => "Book",
      PublicationType::Chapter => "Book Chapter",
      PublicationType::Misc => "Misc",
    }
  }

  /// File name of this type's template inside the templates directory.
  pub fn template_file(&self) -> String { format!("{}_template.md", self.name()) }

  /// BibTeX entry type.
  pub fn bibtex_entry(&self) -> &'static str {
    match self {
      PublicationType::Journal => "article",
      PublicationType::Conference => "inproceedings",
      PublicationType::Book => "book",
      PublicationType::Chapter => "inbook",
      PublicationType::Misc => "misc",
    }
  }

  /// Maps a registry type tag to a category, if the tag is known.
  fn from_registry_tag(tag: &str) -> Option<Self> {
    match tag.trim().to_ascii_lowercase().as_str() {
      "article-journal" | "journal-article" => Some(PublicationType::Journal),
      "paper-conference" | "proceedings-article" => Some(PublicationType::Conference),
      "chapter" | "book-chapter" | "book-section" | "book-part" => Some(PublicationType::Chapter),
      "book" | "monograph" | "edited-book" | "reference-book" => Some(PublicationType::Book),
      _ => None,
    }
  }
}

/// Chooses the publication type for a record.
///
/// A forced type is returned verbatim. Otherwise the registry type tag decides; when it
/// is missing or unmapped, a container title mentioning "conference" or "proceedings"
/// selects [`PublicationType::Conference`], and anything else is
/// [`PublicationType::Misc`]. The result depends only on the inputs.
pub fn classify(record: &Record, forced: Option<PublicationType>) -> PublicationType {
  if let Some(forced) = forced {
    debug!("Using forced publication type: {}", forced.name());
    return forced;
  }

  if let Some(kind) = record.kind.as_deref().and_then(PublicationType::from_registry_tag) {
    debug!("Registry type {:?} classified as {}", record.kind, kind.name());
    return kind;
  }

  let container = record.container_title.as_deref().unwrap_or_default().to_lowercase();
  if container.contains("conference") || container.contains("proceedings") {
    debug!("Container title {container:?} suggests a conference paper");
    return PublicationType::Conference;
  }

  debug!("No type signal for registry type {:?}, defaulting to misc", record.kind);
  PublicationType::Misc
}

impl Display for PublicationType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.label()) }
}

impl FromStr for PublicationType {
  type Err = LitnoteError;

  fn from_str(s: &str) -> Result<Self> {
    PublicationType::ALL
      .into_iter()
      .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| LitnoteError::InvalidType(s.to_owned()))
  }
}
