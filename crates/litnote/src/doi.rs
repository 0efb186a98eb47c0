//! DOI parsing and normalisation.
//!
//! DOIs arrive in many shapes: bare (`10.1145/1327452.1327492`), as resolver URLs
//! (`https://doi.org/10.1145/1327452.1327492`), or with a textual prefix
//! (`doi:10.1145/...`, `DOI 10.1145/...`). [`Doi`] accepts all of these and keeps only
//! the canonical `10.<registrant>/<suffix>` form.
//!
//! # Examples
//!
//! ```
//! use litnote::doi::Doi;
//!
//! let doi: Doi = "https://doi.org/10.1145/1327452.1327492".parse().unwrap();
//! assert_eq!(doi.as_str(), "10.1145/1327452.1327492");
//!
//! let doi: Doi = "DOI 10.1000/xyz123".parse().unwrap();
//! assert_eq!(doi.to_string(), "10.1000/xyz123");
//! ```

use url::Url;

use super::*;

lazy_static! {
  /// Canonical DOI shape: directory indicator, registrant code, suffix.
  static ref DOI_PATTERN: Regex = Regex::new(r"^10\.\d{4,9}/\S+$").unwrap();
  /// Textual prefixes such as `doi:`, `DOI `, `doi: `.
  static ref DOI_PREFIX: Regex = Regex::new(r"(?i)^doi(\s*:\s*|\s+)").unwrap();
}

/// Hosts that resolve DOIs and carry the DOI as their URL path.
const RESOLVER_HOSTS: [&str; 3] = ["doi.org", "dx.doi.org", "www.doi.org"];

/// A validated Digital Object Identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Doi(String);

impl Doi {
  /// Returns the canonical DOI text.
  pub fn as_str(&self) -> &str { &self.0 }

  /// Returns a filesystem-safe rendering of the DOI, used for scratch directory names.
  pub fn slug(&self) -> String {
    self.0.chars().map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' }).collect()
  }
}

/// Removes a case-insensitive `doi` prefix and surrounding whitespace.
///
/// This is the normalisation the batch driver applies to every input line; it does
/// not validate the remainder.
///
/// ```
/// use litnote::doi::strip_prefix;
///
/// assert_eq!(strip_prefix("  DOI 10.1000/xyz123 "), "10.1000/xyz123");
/// assert_eq!(strip_prefix("doi:10.1000/abc456"), "10.1000/abc456");
/// assert_eq!(strip_prefix("10.1000/abc456"), "10.1000/abc456");
/// ```
pub fn strip_prefix(input: &str) -> &str {
  let trimmed = input.trim();
  match DOI_PREFIX.find(trimmed) {
    Some(m) => trimmed[m.end()..].trim(),
    None => trimmed,
  }
}

/// Extracts the DOI from a resolver URL such as `https://doi.org/10.1145/...`.
fn extract_from_url(url: &Url) -> Option<String> {
  let host = url.host_str()?;
  if !RESOLVER_HOSTS.contains(&host) {
    return None;
  }
  let path = url.path().strip_prefix('/')?;
  // Resolver URLs percent-encode characters such as `<` and `;` in the suffix.
  urlencoding::decode(path).ok().map(|decoded| decoded.into_owned())
}

impl FromStr for Doi {
  type Err = LitnoteError;

  fn from_str(s: &str) -> Result<Self> {
    let stripped = strip_prefix(s);

    let candidate = match Url::parse(stripped) {
      Ok(url) if url.scheme() == "http" || url.scheme() == "https" =>
        extract_from_url(&url).ok_or_else(|| LitnoteError::InvalidIdentifier(stripped.into()))?,
      _ => stripped.to_string(),
    };

    if DOI_PATTERN.is_match(&candidate) {
      trace!("Parsed DOI {candidate} from input {s:?}");
      Ok(Doi(candidate))
    } else {
      Err(LitnoteError::InvalidIdentifier(candidate))
    }
  }
}

impl Display for Doi {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}

impl AsRef<str> for Doi {
  fn as_ref(&self) -> &str { &self.0 }
}
