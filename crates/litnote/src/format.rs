//! Text helpers shared by the renderer, the organizer and the PDF acquirer.

use super::*;

lazy_static! {
  /// Inline markup found in registry titles: HTML formatting tags, `<scp>`, and JATS or
  /// MathML namespaced tags. Attributes must be `name="value"` pairs, so comparisons such
  /// as `a<b and c>d` are left alone.
  static ref TAG: Regex = Regex::new(
    r#"(?i)</?(?:i|b|u|em|strong|sub|sup|sc|scp|span|(?:jats|mml):[a-z][a-z0-9_-]*)(?:\s+[a-z_:][a-z0-9_:.-]*\s*=\s*(?:"[^"]*"|'[^']*'))*\s*/?>"#
  )
  .unwrap();
}

/// Decodes HTML character references in registry text, named (the full HTML5 set) and
/// numeric, in a single pass.
///
/// ```
/// use litnote::format::decode_html_entities;
///
/// assert_eq!(decode_html_entities("Smith &amp; Jones"), "Smith & Jones");
/// assert_eq!(decode_html_entities("pp. 1&#8211;10"), "pp. 1\u{2013}10");
/// assert_eq!(decode_html_entities("Caf&eacute;"), "Caf\u{e9}");
/// ```
pub fn decode_html_entities(value: &str) -> String {
  html_escape::decode_html_entities(value).into_owned()
}

/// Decodes entities and drops inline markup, collapsing runs of whitespace.
///
/// Titles from the registry may contain `<i>Drosophila</i>` or `<scp>` tags which have
/// no place in a note heading or a file name.
pub fn clean_text(value: &str) -> String {
  let without_tags = TAG.replace_all(value, "");
  let decoded = decode_html_entities(&without_tags);
  decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Formats a title for use in a file name.
///
/// Keeps alphanumeric characters and whitespace, drops everything else, and replaces
/// spaces with underscores. When `max_length` is given the result is cut to at most that
/// many characters.
///
/// ```
/// use litnote::format::format_title;
///
/// assert_eq!(format_title("MapReduce: Simplified Data Processing", None), "MapReduce_Simplified_Data_Processing");
/// assert_eq!(format_title("A Very Long Title", Some(6)), "A_Very");
/// ```
pub fn format_title(title: &str, max_length: Option<usize>) -> String {
  let cleaned: String = title
    .chars()
    .filter(|c| c.is_alphanumeric() || c.is_whitespace())
    .collect::<String>()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join("_");

  match max_length {
    Some(max) => cleaned.chars().take(max).collect::<String>().trim_end_matches('_').to_string(),
    None => cleaned,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_decode_named_entities() {
    assert_eq!(decode_html_entities("&lt;test&gt;"), "<test>");
    assert_eq!(decode_html_entities("&quot;quoted&quot;"), "\"quoted\"");
    assert_eq!(decode_html_entities("no entities here"), "no entities here");
  }

  #[test]
  fn test_decode_accented_entities() {
    assert_eq!(decode_html_entities("Caf&eacute; M&uuml;ller"), "Caf\u{e9} M\u{fc}ller");
    assert_eq!(format_title(&clean_text("Caf&eacute; Society"), None), "Caf\u{e9}_Society");
  }

  #[test]
  fn test_decode_does_not_double_decode() {
    assert_eq!(decode_html_entities("&amp;lt;"), "&lt;");
    assert_eq!(decode_html_entities("&#38;amp;"), "&amp;");
    assert_eq!(decode_html_entities("&#x26;lt;"), "&lt;");
  }

  #[test]
  fn test_decode_numeric_entities() {
    assert_eq!(decode_html_entities("it&#39;s"), "it's");
    assert_eq!(decode_html_entities("&#x2014;"), "\u{2014}");
  }

  #[test]
  fn test_clean_text_strips_markup() {
    assert_eq!(
      clean_text("Genetics of <i>Drosophila</i>\n   &amp; <scp>Mus</scp>"),
      "Genetics of Drosophila & Mus"
    );
    assert_eq!(clean_text("x < y and y > z"), "x < y and y > z");
  }

  #[test]
  fn test_clean_text_keeps_comparisons() {
    assert_eq!(clean_text("When a<b and c>d holds"), "When a<b and c>d holds");
    assert_eq!(clean_text("Maps of <K, V> and <T>"), "Maps of <K, V> and <T>");
    assert_eq!(
      clean_text(r#"CO<sub>2</sub> in <jats:italic>vivo</jats:italic> <span class="x">ok</span>"#),
      "CO2 in vivo ok"
    );
  }

  #[test]
  fn test_format_title() {
    assert_eq!(
      format_title("MapReduce: simplified data processing on large clusters", None),
      "MapReduce_simplified_data_processing_on_large_clusters"
    );
    assert_eq!(format_title("  Spaces   everywhere ", None), "Spaces_everywhere");
    assert_eq!(format_title("Überraschung & Co.", None), "Überraschung_Co");
    assert_eq!(format_title("", None), "");
  }

  #[test]
  fn test_format_title_truncates() {
    assert_eq!(format_title("abc def ghi", Some(4)), "abc");
    assert_eq!(format_title("abc def ghi", Some(100)), "abc_def_ghi");
  }
}
