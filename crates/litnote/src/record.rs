//! The canonical bibliographic record.
//!
//! The registry answers DOI lookups with CSL-JSON, a format whose fields are loosely
//! typed: titles may be strings or arrays of strings, volumes may be numbers or strings,
//! and dates are nested `date-parts` arrays whose members may themselves be strings.
//! [`Record`] is the normalised form the rest of the pipeline works with. It is built
//! once from the registry response and never modified afterwards.
//!
//! # Examples
//!
//! ```
//! use litnote::record::Record;
//! use serde_json::json;
//!
//! let csl = json!({
//!   "type": "article-journal",
//!   "DOI": "10.1145/1327452.1327492",
//!   "title": "MapReduce: simplified data processing on large clusters",
//!   "author": [{ "given": "Jeffrey", "family": "Dean" }, { "given": "Sanjay", "family": "Ghemawat" }],
//!   "container-title": "Communications of the ACM",
//!   "volume": 51,
//!   "issue": "1",
//!   "page": "107-113",
//!   "issued": { "date-parts": [[2008, 1]] }
//! });
//!
//! let record = Record::from_csl(&csl).unwrap();
//! assert_eq!(record.authors[0].family, "Dean");
//! assert_eq!(record.volume.as_deref(), Some("51"));
//! assert_eq!(record.year, Some(2008));
//! assert_eq!(record.month, Some(1));
//! ```

use serde_json::Value;

use super::*;

/// Keys that may carry the publication date, in order of preference.
const DATE_KEYS: [&str; 4] = ["issued", "published-print", "published-online", "published"];

/// Normalised bibliographic metadata for one publication.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
  /// The DOI as reported by the registry
  pub doi:                String,
  /// Registry type tag (e.g. `article-journal`, `book-chapter`)
  pub kind:               Option<String>,
  /// Full title, entities decoded and markup removed
  pub title:              String,
  /// Authors in publication order
  pub authors:            Vec<Person>,
  /// Editors in publication order
  pub editors:            Vec<Person>,
  /// Journal, proceedings or book title the work appears in
  pub container_title:    Option<String>,
  /// Series or collection the container belongs to
  pub collection_title:   Option<String>,
  /// Publication year
  pub year:               Option<i32>,
  /// Publication month, 1 through 12
  pub month:              Option<u32>,
  /// Volume
  pub volume:             Option<String>,
  /// Issue number
  pub number:             Option<String>,
  /// Page range as given by the registry
  pub pages:              Option<String>,
  /// Publisher name
  pub publisher:          Option<String>,
  /// Publisher location
  pub address:            Option<String>,
  /// Name of the event for conference papers
  pub organization:       Option<String>,
  /// Edition
  pub edition:            Option<String>,
  /// Chapter number
  pub chapter:            Option<String>,
  /// ISSNs, print and electronic
  pub issn:               Vec<String>,
  /// ISBNs
  pub isbn:               Vec<String>,
  /// Publisher links, used as a PDF fallback
  pub links:              Vec<Link>,
}

/// A contributor (author or editor).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  /// Given names
  pub given:  String,
  /// Family name, or the full name of an institutional contributor
  pub family: String,
}

/// A publisher-provided link to the full text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
  /// Target URL
  pub url:          String,
  /// Declared content type, e.g. `application/pdf`
  pub content_type: Option<String>,
}

impl Person {
  /// Name in reading order, e.g. `Jeffrey Dean`.
  pub fn full_name(&self) -> String { format!("{} {}", self.given, self.family).trim().to_string() }

  /// Name in BibTeX order, e.g. `Dean, Jeffrey`.
  pub fn bibtex_name(&self) -> String {
    if self.given.is_empty() {
      self.family.clone()
    } else {
      format!("{}, {}", self.family, self.given)
    }
  }

  /// Builds a person from a CSL name object, returning `None` for empty entries.
  fn from_csl(value: &Value) -> Option<Self> {
    let given = value.get("given").and_then(Value::as_str).map(format::clean_text).unwrap_or_default();
    let family = value
      .get("family")
      .or_else(|| value.get("literal"))
      .or_else(|| value.get("name"))
      .and_then(Value::as_str)
      .map(format::clean_text)
      .unwrap_or_default();

    if given.is_empty() && family.is_empty() {
      None
    } else {
      Some(Self { given, family })
    }
  }
}

impl Link {
  /// Whether the link declares a PDF body.
  pub fn is_pdf(&self) -> bool {
    self
      .content_type
      .as_deref()
      .and_then(|ct| ct.split(';').next())
      .is_some_and(|ct| ct.trim().eq_ignore_ascii_case("application/pdf"))
  }
}

impl Record {
  /// Builds a record from a CSL-JSON item.
  ///
  /// # Errors
  ///
  /// Returns [`LitnoteError::MalformedResponse`] if the value is not a JSON object.
  /// Missing fields are never an error; they are left empty.
  pub fn from_csl(json: &Value) -> Result<Self> {
    if !json.is_object() {
      return Err(LitnoteError::MalformedResponse(format!(
        "expected a CSL-JSON object, got {}",
        type_name_of_value(json)
      )));
    }

    let (year, month) = extract_date(json);

    let record = Record {
      doi: get_by_path(json, "DOI").unwrap_or_default(),
      kind: get_by_path(json, "type"),
      title: text(json, "title").unwrap_or_default(),
      authors: people(json, "author"),
      editors: people(json, "editor"),
      container_title: text(json, "container-title"),
      collection_title: text(json, "collection-title"),
      year,
      month,
      volume: text(json, "volume"),
      number: text(json, "issue"),
      pages: text(json, "page"),
      publisher: text(json, "publisher"),
      address: text(json, "publisher-location"),
      organization: text(json, "event/name").or_else(|| text(json, "event")),
      edition: text(json, "edition"),
      chapter: text(json, "chapter-number").or_else(|| text(json, "chapter")),
      issn: list(json, "ISSN"),
      isbn: list(json, "ISBN"),
      links: links(json),
    };

    trace!("Built record: {record:?}");
    Ok(record)
  }

  /// First author's family name, or `Unknown` when there are no authors.
  pub fn first_author_family(&self) -> &str {
    self.authors.first().map(|a| a.family.as_str()).filter(|f| !f.is_empty()).unwrap_or("Unknown")
  }

  /// Citation key: first author's family name followed by the publication year.
  ///
  /// Whitespace is removed from the family name so the alias is usable as a BibTeX key
  /// and as a file name prefix.
  pub fn alias(&self) -> String {
    let family: String = self.first_author_family().split_whitespace().collect();
    match self.year {
      Some(year) => format!("{family}{year}"),
      None => family,
    }
  }

  /// Shared stem of the note and PDF file names, `<alias>_<clean title>`.
  pub fn file_stem(&self) -> String {
    let title = format::format_title(&self.title, None);
    if title.is_empty() {
      self.alias()
    } else {
      format!("{}_{}", self.alias(), title)
    }
  }

  /// Publication date as (year, quarter), if both year and month are known.
  pub fn published_quarter(&self) -> Option<(i32, u32)> {
    match (self.year, self.month) {
      (Some(year), Some(month)) if (1..=12).contains(&month) => Some((year, (month - 1) / 3 + 1)),
      _ => None,
    }
  }
}

/// Walks a `/`-separated path through objects and array indices.
fn get_path_value<'a>(json: &'a Value, path: &str) -> Option<&'a Value> {
  let mut current = json;
  for part in path.split('/') {
    current = if let Ok(index) = part.parse::<usize>() {
      current.as_array()?.get(index)?
    } else {
      current.get(part)?
    };
  }
  Some(current)
}

/// Reads a scalar at `path`, taking the first element of arrays and stringifying numbers.
fn get_by_path(json: &Value, path: &str) -> Option<String> {
  let value = get_path_value(json, path)?;
  let value = match value {
    Value::Array(arr) => arr.first()?,
    other => other,
  };
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

/// Like [`get_by_path`], with entities decoded, markup removed, and empty values dropped.
fn text(json: &Value, path: &str) -> Option<String> {
  get_by_path(json, path).map(|s| format::clean_text(&s)).filter(|s| !s.is_empty())
}

/// Reads a string or list of strings as a list.
fn list(json: &Value, path: &str) -> Vec<String> {
  match get_path_value(json, path) {
    Some(Value::Array(arr)) => arr
      .iter()
      .filter_map(|v| match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
      })
      .filter(|s| !s.is_empty())
      .collect(),
    Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
    _ => Vec::new(),
  }
}

/// Reads a CSL name list.
fn people(json: &Value, path: &str) -> Vec<Person> {
  get_path_value(json, path)
    .and_then(Value::as_array)
    .map(|arr| arr.iter().filter_map(Person::from_csl).collect())
    .unwrap_or_default()
}

/// Reads publisher links.
fn links(json: &Value) -> Vec<Link> {
  get_path_value(json, "link")
    .and_then(Value::as_array)
    .map(|arr| {
      arr
        .iter()
        .filter_map(|link| {
          let url = link.get("URL").or_else(|| link.get("url")).and_then(Value::as_str)?;
          let content_type = link.get("content-type").and_then(Value::as_str).map(String::from);
          Some(Link { url: url.to_string(), content_type })
        })
        .collect()
    })
    .unwrap_or_default()
}

/// Reads one member of a `date-parts` row, which may be a number or a numeric string.
fn date_part(value: Option<&Value>) -> Option<i64> {
  match value? {
    Value::Number(n) => n.as_i64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

/// Extracts (year, month) from the first date key that carries a year.
fn extract_date(json: &Value) -> (Option<i32>, Option<u32>) {
  for key in DATE_KEYS {
    let Some(parts) = get_path_value(json, &format!("{key}/date-parts/0")).and_then(Value::as_array)
    else {
      continue;
    };

    let Some(year) = date_part(parts.first()).and_then(|y| i32::try_from(y).ok()) else {
      continue;
    };
    let month = date_part(parts.get(1))
      .and_then(|m| u32::try_from(m).ok())
      .filter(|m| (1..=12).contains(m));

    debug!("Publication date taken from '{key}': {year}-{month:?}");
    return (Some(year), month);
  }
  (None, None)
}

/// Human-readable JSON type name for error messages.
fn type_name_of_value(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn chapter_csl() -> Value {
    json!({
      "type": "chapter",
      "DOI": "10.1007/978-3-030-00001-1_2",
      "title": ["Graph Rewriting &amp; <i>Friends</i>"],
      "author": [{ "given": "Ada", "family": "van der Berg" }, { "literal": "The Working Group" }],
      "editor": [{ "given": "Grace", "family": "Hopper" }],
      "container-title": ["Advances in Rewriting"],
      "collection-title": "Lecture Notes in Computer Science",
      "publisher": "Springer",
      "publisher-location": "Cham",
      "page": "15-38",
      "ISBN": ["9783030000011", "9783030000028"],
      "issued": { "date-parts": [["2019", "11", "3"]] },
      "link": [
        { "URL": "https://example.org/chapter.xml", "content-type": "text/xml" },
        { "URL": "https://example.org/chapter.pdf", "content-type": "application/pdf; charset=binary" }
      ]
    })
  }

  #[test]
  fn test_record_from_csl() {
    let record = Record::from_csl(&chapter_csl()).unwrap();
    assert_eq!(record.kind.as_deref(), Some("chapter"));
    assert_eq!(record.title, "Graph Rewriting & Friends");
    assert_eq!(record.authors.len(), 2);
    assert_eq!(record.authors[1], Person { given: String::new(), family: "The Working Group".into() });
    assert_eq!(record.editors[0].full_name(), "Grace Hopper");
    assert_eq!(record.container_title.as_deref(), Some("Advances in Rewriting"));
    assert_eq!(record.collection_title.as_deref(), Some("Lecture Notes in Computer Science"));
    assert_eq!(record.address.as_deref(), Some("Cham"));
    assert_eq!(record.isbn, vec!["9783030000011", "9783030000028"]);
    assert_eq!(record.year, Some(2019));
    assert_eq!(record.month, Some(11));
    assert!(record.issn.is_empty());
    assert!(record.volume.is_none());
  }

  #[test]
  fn test_alias_and_file_stem() {
    let record = Record::from_csl(&chapter_csl()).unwrap();
    assert_eq!(record.alias(), "vanderBerg2019");
    assert_eq!(record.file_stem(), "vanderBerg2019_Graph_Rewriting_Friends");
  }

  #[test]
  fn test_alias_without_authors_or_year() {
    let record = Record::from_csl(&json!({ "title": "Anonymous Work" })).unwrap();
    assert_eq!(record.alias(), "Unknown");
    assert_eq!(record.file_stem(), "Unknown_Anonymous_Work");
  }

  #[test]
  fn test_person_names() {
    let person = Person { given: "Jeffrey".into(), family: "Dean".into() };
    assert_eq!(person.full_name(), "Jeffrey Dean");
    assert_eq!(person.bibtex_name(), "Dean, Jeffrey");

    let org = Person { given: String::new(), family: "CERN".into() };
    assert_eq!(org.full_name(), "CERN");
    assert_eq!(org.bibtex_name(), "CERN");
  }

  #[test]
  fn test_pdf_links() {
    let record = Record::from_csl(&chapter_csl()).unwrap();
    let pdfs: Vec<_> = record.links.iter().filter(|l| l.is_pdf()).collect();
    assert_eq!(pdfs.len(), 1);
    assert_eq!(pdfs[0].url, "https://example.org/chapter.pdf");
  }

  #[test]
  fn test_date_fallback_and_quarter() {
    let record = Record::from_csl(&json!({
      "issued": { "date-parts": [[null]] },
      "published-online": { "date-parts": [[2021, 8, 30]] }
    }))
    .unwrap();
    assert_eq!(record.year, Some(2021));
    assert_eq!(record.published_quarter(), Some((2021, 3)));

    let year_only = Record::from_csl(&json!({ "issued": { "date-parts": [[1999]] } })).unwrap();
    assert_eq!(year_only.year, Some(1999));
    assert_eq!(year_only.published_quarter(), None);
  }

  #[test]
  fn test_quarter_boundaries() {
    let quarter = |month| Record { year: Some(2020), month: Some(month), ..Default::default() };
    assert_eq!(quarter(1).published_quarter(), Some((2020, 1)));
    assert_eq!(quarter(3).published_quarter(), Some((2020, 1)));
    assert_eq!(quarter(4).published_quarter(), Some((2020, 2)));
    assert_eq!(quarter(9).published_quarter(), Some((2020, 3)));
    assert_eq!(quarter(10).published_quarter(), Some((2020, 4)));
    assert_eq!(quarter(12).published_quarter(), Some((2020, 4)));
  }

  #[test]
  fn test_event_name() {
    let record =
      Record::from_csl(&json!({ "event": { "name": "SOSP '07" }, "volume": "41" })).unwrap();
    assert_eq!(record.organization.as_deref(), Some("SOSP '07"));

    let record = Record::from_csl(&json!({ "event": "OSDI" })).unwrap();
    assert_eq!(record.organization.as_deref(), Some("OSDI"));
  }

  #[test]
  fn test_non_object_is_malformed() {
    assert!(matches!(Record::from_csl(&json!([1, 2])), Err(LitnoteError::MalformedResponse(_))));
  }
}
