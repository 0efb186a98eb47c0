//! BibTeX entry generation.
//!
//! Each note embeds a BibTeX entry for its publication, and the pipeline prints the same
//! entry after writing the note so it can be pasted into a bibliography file.
//!
//! # Examples
//!
//! ```
//! use litnote::{bibtex::BibtexEntry, classify::PublicationType, record::{Person, Record}};
//!
//! let record = Record {
//!   title: "Fast & Loose".into(),
//!   authors: vec![Person { given: "Ada".into(), family: "Lovelace".into() }],
//!   year: Some(1843),
//!   container_title: Some("Notes".into()),
//!   pages: Some("1-10".into()),
//!   ..Default::default()
//! };
//!
//! let entry = BibtexEntry::new(&record, PublicationType::Journal, "Lovelace1843");
//! let text = entry.to_string();
//! assert!(text.starts_with("@article{Lovelace1843,\n"));
//! assert!(text.contains("\tjournal={Notes},\n"));
//! assert!(text.contains("\tpages={1--10}"));
//! assert!(text.ends_with("\n}"));
//! ```

use super::*;

/// A BibTeX entry with its fields in output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibtexEntry {
  /// Entry type, e.g. `article`
  pub entry_type: &'static str,
  /// Citation key
  pub key:        String,
  /// Field name and escaped value pairs; fields with empty values are kept here and
  /// skipped when formatting
  pub fields:     Vec<(&'static str, String)>,
}

impl BibtexEntry {
  /// Builds the entry for `record` rendered as `kind`, keyed by `key`.
  pub fn new(record: &Record, kind: PublicationType, key: impl Into<String>) -> Self {
    let mut fields = vec![
      ("author", join_names(&record.authors)),
      ("title", escape(&record.title)),
      ("year", record.year.map(|y| y.to_string()).unwrap_or_default()),
      ("doi", record.doi.clone()),
      ("type", kind.label().to_string()),
    ];
    fields.extend(type_fields(record, kind));

    Self { entry_type: kind.bibtex_entry(), key: key.into(), fields }
  }
}

impl Display for BibtexEntry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let body = self
      .fields
      .iter()
      .filter(|(_, value)| !value.is_empty())
      .map(|(name, value)| format!("\t{name}={{{value}}}"))
      .collect::<Vec<_>>()
      .join(",\n");

    if body.is_empty() {
      write!(f, "@{}{{{},\n}}", self.entry_type, self.key)
    } else {
      write!(f, "@{}{{{},\n{}\n}}", self.entry_type, self.key, body)
    }
  }
}

/// Fields specific to a publication type, in output order, with escaped values.
pub fn type_fields(record: &Record, kind: PublicationType) -> Vec<(&'static str, String)> {
  let opt = |value: &Option<String>| value.as_deref().map(escape).unwrap_or_default();
  let pages = record.pages.as_deref().map(bibtex_pages).unwrap_or_default();
  let editors = join_names(&record.editors);
  let first = |values: &[String]| values.first().cloned().unwrap_or_default();

  match kind {
    PublicationType::Conference => vec![
      ("booktitle", opt(&record.container_title)),
      ("month", record.month.map(|m| m.to_string()).unwrap_or_default()),
      ("volume", opt(&record.volume)),
      ("number", opt(&record.number)),
      ("pages", pages),
      ("series", opt(&record.collection_title)),
      ("editor", editors),
      ("publisher", opt(&record.publisher)),
      ("address", opt(&record.address)),
      ("organization", opt(&record.organization)),
    ],
    PublicationType::Journal => vec![
      ("journal", opt(&record.container_title)),
      ("volume", opt(&record.volume)),
      ("number", opt(&record.number)),
      ("pages", pages),
      ("issn", first(&record.issn)),
    ],
    PublicationType::Book => vec![
      ("booktitle", escape(&record.title)),
      ("publisher", opt(&record.publisher)),
      ("address", opt(&record.address)),
      ("isbn", first(&record.isbn)),
      ("edition", opt(&record.edition)),
      ("editor", editors),
      ("pages", pages),
      ("series", opt(&record.container_title)),
    ],
    PublicationType::Chapter => vec![
      ("booktitle", opt(&record.container_title)),
      ("publisher", opt(&record.publisher)),
      ("address", opt(&record.address)),
      ("pages", pages),
      ("editor", editors),
      ("isbn", first(&record.isbn)),
      ("series", opt(&record.collection_title)),
      ("edition", opt(&record.edition)),
      ("chapter", opt(&record.chapter)),
    ],
    PublicationType::Misc => Vec::new(),
  }
}

/// Names of the type-specific fields the record cannot fill.
pub fn missing_fields(record: &Record, kind: PublicationType) -> Vec<&'static str> {
  type_fields(record, kind)
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(name, _)| name)
    .collect()
}

/// Joins people as `Family, Given and Family, Given`.
fn join_names(people: &[record::Person]) -> String {
  people.iter().map(|p| escape(&p.bibtex_name())).collect::<Vec<_>>().join(" and ")
}

/// Escapes characters with special meaning in BibTeX values.
fn escape(value: &str) -> String { value.replace('&', "\\&") }

/// Page ranges use `--` in BibTeX.
fn bibtex_pages(pages: &str) -> String {
  let pages = escape(pages.trim()).replace('\u{2013}', "-");
  if pages.contains("--") {
    pages
  } else {
    pages.replace('-', "--")
  }
}
