use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// `fixes/closes/resolves #N` with the keyword mandatory; used against PR
/// body text where a bare `#N` is usually a cross-reference, not a fix link.
static RE_KEYWORD: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?i)(?:fixes|closes|resolves)\s+#(\d+)").unwrap());

/// Same shape with the keyword optional; used against commit messages where
/// GitHub's default merge subject is `Merge pull request #N from ...`.
static RE_BARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(?:fixes|closes|resolves)?\s*#(\d+)").unwrap());

/// Placeholder number that appears in issue-template boilerplate; matches
/// against it are noise, not links.
const PLACEHOLDER: &str = "1234";

/// Extract referenced issue numbers from free text.
///
/// With `require_keyword` the match must read `fixes|closes|resolves #N`
/// (case-insensitive) and the literal `1234` placeholder is discarded.
/// Without it a bare `#N` anywhere counts. Results keep first-appearance
/// order with duplicates removed.
pub fn extract_issue_ids(text: &str, require_keyword: bool) -> Vec<u64> {
  let re = if require_keyword { &RE_KEYWORD } else { &RE_BARE };

  let mut seen: HashSet<&str> = HashSet::new();
  let mut out: Vec<u64> = Vec::new();

  for caps in re.captures_iter(text) {
    let digits = caps.get(1).map(|m| m.as_str()).unwrap_or("");

    if require_keyword && digits == PLACEHOLDER {
      continue;
    }

    if seen.insert(digits) {
      if let Ok(n) = digits.parse::<u64>() {
        out.push(n);
      }
    }
  }

  out
}

/// First issue-like reference in the text, keyword optional.
pub fn first_issue_reference(text: &str) -> Option<u64> {
  RE_BARE
    .captures(text)
    .and_then(|caps| caps.get(1))
    .and_then(|m| m.as_str().parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn keyword_gated_extraction_filters_placeholder() {
    assert_eq!(extract_issue_ids("See #1234 and fixes #77", true), vec![77]);
  }

  #[test]
  fn bare_extraction_accepts_plain_reference() {
    assert_eq!(extract_issue_ids("related to #55", false), vec![55]);
  }

  #[test]
  fn keyword_is_case_insensitive() {
    assert_eq!(extract_issue_ids("Closes #8, RESOLVES #9", true), vec![8, 9]);
  }

  #[test]
  fn keyword_mode_ignores_bare_references() {
    assert_eq!(extract_issue_ids("see #42 for background", true), Vec::<u64>::new());
  }

  #[test]
  fn duplicates_collapse_keeping_first_order() {
    assert_eq!(extract_issue_ids("fixes #7, fixes #3, closes #7", true), vec![7, 3]);
  }

  #[test]
  fn placeholder_survives_bare_mode() {
    // The filter is a PR-body concern; commit-message linking keeps 1234.
    assert_eq!(extract_issue_ids("#1234", false), vec![1234]);
  }

  #[test]
  fn first_reference_takes_earliest_match() {
    assert_eq!(first_issue_reference("Merge pull request #6 from owner/1-branch"), Some(6));
    assert_eq!(first_issue_reference("fixes #12 and closes #13"), Some(12));
  }

  #[test]
  fn no_reference_yields_nothing() {
    assert_eq!(first_issue_reference("chore: bump deps"), None);
    assert_eq!(extract_issue_ids("", true), Vec::<u64>::new());
  }

  #[test]
  fn hash_without_digits_does_not_match() {
    assert_eq!(first_issue_reference("see #abc"), None);
  }
}
