// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Define episode records shared by collection, enrichment, and the CSV store
// role: model/types
// outputs: Episode (in-memory), EpisodeRow (one CSV row per merge), ExplodedRow (one CSV row per base commit)
// invariants: CSV column names match the original dataset schema verbatim; list cells hold JSON arrays; additive fields only
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::{Deserialize, Serialize};

/// One bug-fix episode as assembled from git alone. Issue-tracker fields are
/// filled by the enrichment pass after the row has been persisted.
#[derive(Debug, Clone)]
pub struct Episode {
  pub repo_name: String,
  pub base_commit_ids: Vec<String>,
  pub base_commit_dates: Vec<String>,
  pub resolving_commit_id: String,
  pub resolving_commit_date: String,
  /// Extracted from the merge-commit message; GitHub's default merge subject
  /// makes this the PR number in practice.
  pub pr_num: Option<u64>,
  /// Changed-file lists, one per base commit, index-aligned with
  /// `base_commit_ids`.
  pub changed_files: Vec<Vec<String>>,
  pub pr_description: String,
  /// (full, test, non-test) patch triples, index-aligned with
  /// `base_commit_ids`.
  pub full_patches: Vec<String>,
  pub test_patches: Vec<String>,
  pub patches: Vec<String>,
}

/// Wire form of an episode: one CSV row per merge commit. List-valued cells
/// are JSON arrays serialized into the cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRow {
  pub repo_name: String,
  pub base_commit_ids: String,
  pub base_commit_dates: String,
  pub resolving_commit_id: String,
  pub resolving_commit_date: String,
  pub pr_num: Option<u64>,
  pub pr_close_date: Option<String>,
  pub pr_open_date: Option<String>,
  pub num_changed_files: String,
  pub changed_files_list: String,
  pub linked_issue_nums: Option<String>,
  #[serde(rename = "_linked_issue_desc")]
  pub linked_issue_desc: Option<String>,
  #[serde(rename = "_pr_description")]
  pub pr_description: Option<String>,
  pub linked_issue_date_open: Option<String>,
  pub linked_issue_date_closed: Option<String>,
  pub full_patch: String,
  pub test_patch: String,
  pub patch: String,
}

/// One CSV row per base commit: the list columns of `EpisodeRow` replaced by
/// the scalar picked at that base commit's index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplodedRow {
  pub repo_name: String,
  pub base_commit: String,
  pub base_commit_date: Option<String>,
  pub resolving_commit_id: String,
  pub resolving_commit_date: String,
  pub pr_num: Option<u64>,
  pub pr_close_date: Option<String>,
  pub pr_open_date: Option<String>,
  pub num_changed_files: Option<u64>,
  pub changed_files_list: Option<String>,
  pub linked_issue_nums: Option<String>,
  #[serde(rename = "_linked_issue_desc")]
  pub linked_issue_desc: Option<String>,
  #[serde(rename = "_pr_description")]
  pub pr_description: Option<String>,
  pub linked_issue_date_open: Option<String>,
  pub linked_issue_date_closed: Option<String>,
  pub full_patch: Option<String>,
  pub test_patch: Option<String>,
  pub patch: Option<String>,
}

/// Serialize a list into the JSON form stored in a CSV cell.
pub fn json_cell<T: Serialize>(values: &[T]) -> String {
  serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

/// Parse a JSON list cell back into values; a missing or malformed cell
/// reads as empty rather than failing the whole pass.
pub fn parse_json_cell<T: for<'de> Deserialize<'de>>(cell: &str) -> Vec<T> {
  serde_json::from_str(cell).unwrap_or_default()
}

impl From<Episode> for EpisodeRow {
  fn from(ep: Episode) -> Self {
    let num_changed: Vec<u64> = ep.changed_files.iter().map(|f| f.len() as u64).collect();

    EpisodeRow {
      repo_name: ep.repo_name,
      base_commit_ids: json_cell(&ep.base_commit_ids),
      base_commit_dates: json_cell(&ep.base_commit_dates),
      resolving_commit_id: ep.resolving_commit_id,
      resolving_commit_date: ep.resolving_commit_date,
      pr_num: ep.pr_num,
      pr_close_date: None,
      pr_open_date: None,
      num_changed_files: json_cell(&num_changed),
      changed_files_list: json_cell(&ep.changed_files),
      linked_issue_nums: None,
      linked_issue_desc: None,
      pr_description: Some(ep.pr_description),
      linked_issue_date_open: None,
      linked_issue_date_closed: None,
      full_patch: json_cell(&ep.full_patches),
      test_patch: json_cell(&ep.test_patches),
      patch: json_cell(&ep.patches),
    }
  }
}

impl EpisodeRow {
  /// Expand into one row per base commit. Index-aligned list cells pick the
  /// matching element; indices past a shorter list yield empty cells.
  pub fn explode(&self) -> Vec<ExplodedRow> {
    let ids: Vec<String> = parse_json_cell(&self.base_commit_ids);
    let dates: Vec<String> = parse_json_cell(&self.base_commit_dates);
    let counts: Vec<u64> = parse_json_cell(&self.num_changed_files);
    let files: Vec<Vec<String>> = parse_json_cell(&self.changed_files_list);
    let full: Vec<String> = parse_json_cell(&self.full_patch);
    let test: Vec<String> = parse_json_cell(&self.test_patch);
    let non_test: Vec<String> = parse_json_cell(&self.patch);

    ids
      .into_iter()
      .enumerate()
      .map(|(i, base_commit)| ExplodedRow {
        repo_name: self.repo_name.clone(),
        base_commit,
        base_commit_date: dates.get(i).cloned(),
        resolving_commit_id: self.resolving_commit_id.clone(),
        resolving_commit_date: self.resolving_commit_date.clone(),
        pr_num: self.pr_num,
        pr_close_date: self.pr_close_date.clone(),
        pr_open_date: self.pr_open_date.clone(),
        num_changed_files: counts.get(i).copied(),
        changed_files_list: files.get(i).map(|f| json_cell(f)),
        linked_issue_nums: self.linked_issue_nums.clone(),
        linked_issue_desc: self.linked_issue_desc.clone(),
        pr_description: self.pr_description.clone(),
        linked_issue_date_open: self.linked_issue_date_open.clone(),
        linked_issue_date_closed: self.linked_issue_date_closed.clone(),
        full_patch: full.get(i).cloned(),
        test_patch: test.get(i).cloned(),
        patch: non_test.get(i).cloned(),
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn two_parent_episode() -> Episode {
    Episode {
      repo_name: "owner/repo".into(),
      base_commit_ids: vec!["aaa".into(), "bbb".into()],
      base_commit_dates: vec!["2024-05-04 07:03:20 +0530".into(), "2024-05-05 08:00:00 +0530".into()],
      resolving_commit_id: "ccc".into(),
      resolving_commit_date: "2024-05-14 01:22:02 +0530".into(),
      pr_num: Some(6),
      changed_files: vec![
        vec!["src/a.py".into(), "tests/test_a.py".into()],
        vec!["README.md".into()],
      ],
      pr_description: "Merge pull request #6\n\nBug fixes".into(),
      full_patches: vec!["diff --git a/src/a.py b/src/a.py\n+x\n".into(), String::new()],
      test_patches: vec![String::new(), String::new()],
      patches: vec!["diff --git a/src/a.py b/src/a.py\n+x\n".into(), String::new()],
    }
  }

  #[test]
  fn row_conversion_serializes_list_cells_as_json() {
    let row: EpisodeRow = two_parent_episode().into();
    assert_eq!(row.base_commit_ids, r#"["aaa","bbb"]"#);
    assert_eq!(row.num_changed_files, "[2,1]");
    assert!(row.changed_files_list.starts_with("[["));
    assert_eq!(row.pr_num, Some(6));
    assert!(row.pr_open_date.is_none());
  }

  #[test]
  fn explode_yields_one_row_per_base_commit() {
    let row: EpisodeRow = two_parent_episode().into();
    let exploded = row.explode();
    assert_eq!(exploded.len(), 2);
    assert_eq!(exploded[0].base_commit, "aaa");
    assert_eq!(exploded[0].num_changed_files, Some(2));
    assert_eq!(exploded[1].base_commit, "bbb");
    assert_eq!(exploded[1].num_changed_files, Some(1));
    assert_eq!(
      exploded[0].full_patch.as_deref(),
      Some("diff --git a/src/a.py b/src/a.py\n+x\n")
    );
    assert_eq!(exploded[1].full_patch.as_deref(), Some(""));
  }

  #[test]
  fn explode_tolerates_short_companion_lists() {
    let mut row: EpisodeRow = two_parent_episode().into();
    row.base_commit_dates = r#"["only-one"]"#.into();
    let exploded = row.explode();
    assert_eq!(exploded.len(), 2);
    assert_eq!(exploded[1].base_commit_date, None);
  }

  #[test]
  fn malformed_list_cell_reads_as_empty() {
    let parsed: Vec<String> = parse_json_cell("not json");
    assert!(parsed.is_empty());
  }
}
