//! Template loading and note rendering.
//!
//! Templates are markdown files, one per [`PublicationType`], named
//! `<type>_template.md` inside the templates directory. They contain `{{placeholder}}`
//! tokens which are replaced with values taken from the [`Record`]. Every token is
//! replaced: placeholders whose field is absent from the record, and placeholders the
//! renderer does not know, become empty strings.
//!
//! A token written between double quotes, as in `journal: "{{journal}}"`, is a YAML
//! double-quoted scalar: backslashes, quotes and line breaks in its value are escaped.
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use litnote::{
//!   classify::PublicationType,
//!   record::{Person, Record},
//!   template::{RenderContext, Template},
//! };
//!
//! let template = Template::from_text(
//!   PublicationType::Journal,
//!   "# {{title}}\njournal: {{journal}}\nstatus: {{status}}\n{{nonsense}}",
//! );
//! let record = Record {
//!   title: "MapReduce".into(),
//!   authors: vec![Person { given: "Jeffrey".into(), family: "Dean".into() }],
//!   container_title: Some("CACM".into()),
//!   year: Some(2008),
//!   ..Default::default()
//! };
//! let context = RenderContext {
//!   record:   &record,
//!   kind:     PublicationType::Journal,
//!   pdf_path: None,
//!   imported: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
//! };
//!
//! let note = template.render(&context);
//! assert_eq!(note.alias, "Dean2008");
//! assert_eq!(note.body, "# MapReduce\njournal: CACM\nstatus: NoPDF\n");
//! ```

use std::collections::{BTreeMap, BTreeSet};

use tracing::instrument;

use super::*;
use crate::bibtex::BibtexEntry;

lazy_static! {
  /// `{{name}}` tokens, tolerating whitespace inside the braces, with the double quotes
  /// that may enclose them.
  static ref PLACEHOLDER: Regex =
    Regex::new(r#"(?P<open>"?)\{\{\s*(?P<name>[A-Za-z_][A-Za-z0-9_.-]*)\s*\}\}(?P<close>"?)"#)
      .unwrap();
}

/// Value of `pdf_link` when no PDF was placed.
pub const NO_PDF_LINK: &str = "PDF not available";

/// A note template for one publication type.
#[derive(Debug, Clone)]
pub struct Template {
  /// Publication type this template renders
  pub kind: PublicationType,
  /// Raw template text
  pub text: String,
}

/// Everything the renderer needs besides the template itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
  /// The publication's metadata
  pub record:   &'a Record,
  /// The type the note is rendered as
  pub kind:     PublicationType,
  /// Where the PDF was placed, if one was
  pub pdf_path: Option<&'a Path>,
  /// Date the note is created
  pub imported: NaiveDate,
}

/// A rendered note, not yet written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNote {
  /// Citation key
  pub alias:  String,
  /// File name stem shared with the PDF, `<alias>_<clean title>`
  pub stem:   String,
  /// Markdown text
  pub body:   String,
  /// The BibTeX entry embedded in the note
  pub bibtex: String,
}

impl RenderedNote {
  /// File name of the note, `<stem>.md`.
  pub fn file_name(&self) -> String { format!("{}.md", self.stem) }
}

impl Template {
  /// Builds a template from text already in memory.
  pub fn from_text(kind: PublicationType, text: impl Into<String>) -> Self {
    Self { kind, text: text.into() }
  }

  /// Loads the template for `kind` from `dir`.
  ///
  /// # Errors
  ///
  /// Returns [`LitnoteError::MissingTemplate`] when the file does not exist, and
  /// [`LitnoteError::Path`] when it exists but cannot be read.
  #[instrument(level = "debug", skip(kind), fields(kind = %kind.name()))]
  pub fn load(dir: &Path, kind: PublicationType) -> Result<Self> {
    let path = dir.join(kind.template_file());
    if !path.is_file() {
      return Err(LitnoteError::MissingTemplate { kind: kind.name().to_string(), path });
    }

    let text = std::fs::read_to_string(&path)?;
    debug!("Loaded template {path:?} ({} bytes)", text.len());
    Ok(Self { kind, text })
  }

  /// Names of the placeholders that appear in this template.
  pub fn placeholder_names(&self) -> BTreeSet<String> {
    PLACEHOLDER.captures_iter(&self.text).map(|caps| caps["name"].to_string()).collect()
  }

  /// Renders the note for `context`.
  ///
  /// This is a pure transformation: nothing is read or written.
  #[instrument(
    skip(self, context),
    fields(template = %self.kind.name(), kind = %context.kind.name(), doi = %context.record.doi),
    level = "debug"
  )]
  pub fn render(&self, context: &RenderContext) -> RenderedNote {
    let values = placeholders(context);

    let mut unknown = BTreeSet::new();
    let body = PLACEHOLDER.replace_all(&self.text, |caps: &regex::Captures| {
      let (open, name, close) = (&caps["open"], &caps["name"], &caps["close"]);
      let value = match values.get(name) {
        Some(value) if !open.is_empty() && !close.is_empty() => yaml_escape(value),
        Some(value) => value.clone(),
        None => {
          unknown.insert(name.to_string());
          String::new()
        },
      };
      format!("{open}{value}{close}")
    });

    for name in &unknown {
      warn!(placeholder = %name, "Template placeholder has no value for this type, left blank");
    }

    RenderedNote {
      alias:  context.record.alias(),
      stem:   context.record.file_stem(),
      body:   body.into_owned(),
      bibtex: values.get("bibtex").cloned().unwrap_or_default(),
    }
  }
}

/// Computes every placeholder value available for `context`.
///
/// The common placeholders are always present; the type-specific ones depend on
/// `context.kind`. Absent record fields map to empty strings.
pub fn placeholders(context: &RenderContext) -> BTreeMap<&'static str, String> {
  let record = context.record;
  let alias = record.alias();
  let opt = |value: &Option<String>| value.clone().unwrap_or_default();
  let first = |values: &[String]| values.first().cloned().unwrap_or_default();
  let pages = record.pages.as_deref().map(|p| p.replace("--", "-")).unwrap_or_default();
  let editor_list = yaml_people(&record.editors);

  let mut values = BTreeMap::from([
    ("alias", alias.clone()),
    ("imported_date", context.imported.format("%Y-%m-%d").to_string()),
    ("status", if context.pdf_path.is_some() { "Imported" } else { "NoPDF" }.to_string()),
    ("author_list", yaml_people(&record.authors)),
    ("title", record.title.clone()),
    ("year", record.year.map(|y| y.to_string()).unwrap_or_default()),
    ("doi", record.doi.clone()),
    ("type", context.kind.label().to_string()),
    (
      "pdf_link",
      context.pdf_path.map(|p| p.display().to_string()).unwrap_or_else(|| NO_PDF_LINK.to_string()),
    ),
    ("bibtex", BibtexEntry::new(record, context.kind, alias).to_string()),
  ]);

  let specific: Vec<(&'static str, String)> = match context.kind {
    PublicationType::Conference => vec![
      ("booktitle", opt(&record.container_title)),
      ("month", record.month.map(|m| m.to_string()).unwrap_or_default()),
      ("volume", opt(&record.volume)),
      ("number", opt(&record.number)),
      ("pages", pages),
      ("series", opt(&record.collection_title)),
      ("editor_list", editor_list),
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
      ("booktitle", record.title.clone()),
      ("publisher", opt(&record.publisher)),
      ("address", opt(&record.address)),
      ("isbn", first(&record.isbn)),
      ("edition", opt(&record.edition)),
      ("editor_list", editor_list),
      ("pages", pages),
      ("series", opt(&record.container_title)),
    ],
    PublicationType::Chapter => vec![
      ("booktitle", opt(&record.container_title)),
      ("publisher", opt(&record.publisher)),
      ("address", opt(&record.address)),
      ("pages", pages),
      ("editor_list", editor_list),
      ("isbn", first(&record.isbn)),
      ("series", opt(&record.collection_title)),
      ("edition", opt(&record.edition)),
      ("chapter", opt(&record.chapter)),
    ],
    PublicationType::Misc => Vec::new(),
  };
  values.extend(specific);
  values
}

/// Formats people as YAML list items, one `  - "Given Family"` line each.
fn yaml_people(people: &[record::Person]) -> String {
  people
    .iter()
    .map(|p| format!("  - \"{}\"", yaml_escape(&p.full_name())))
    .collect::<Vec<_>>()
    .join("\n")
}

/// Escapes `value` for use inside a YAML double-quoted scalar.
fn yaml_escape(value: &str) -> String {
  value.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}
