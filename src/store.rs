// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: CSV-backed record store for episode rows: schema init, append, read-modify-write, explosion output
// role: persistence/store
// inputs: Paths to the per-batch episode CSV and the final exploded CSV; typed rows
// outputs: CSV files with the original dataset's column names; header row written exactly once per file
// side_effects: Creates and rewrites files
// invariants:
// - init is idempotent: an existing file is never truncated by it
// - append never re-emits the header row
// - patch cells round-trip through CSV quoting with embedded newlines intact
// errors: IO and CSV errors bubble with file-path context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::{EpisodeRow, ExplodedRow};

const EPISODE_HEADERS: [&str; 18] = [
  "repo_name",
  "base_commit_ids",
  "base_commit_dates",
  "resolving_commit_id",
  "resolving_commit_date",
  "pr_num",
  "pr_close_date",
  "pr_open_date",
  "num_changed_files",
  "changed_files_list",
  "linked_issue_nums",
  "_linked_issue_desc",
  "_pr_description",
  "linked_issue_date_open",
  "linked_issue_date_closed",
  "full_patch",
  "test_patch",
  "patch",
];

const EXPLODED_HEADERS: [&str; 18] = [
  "repo_name",
  "base_commit",
  "base_commit_date",
  "resolving_commit_id",
  "resolving_commit_date",
  "pr_num",
  "pr_close_date",
  "pr_open_date",
  "num_changed_files",
  "changed_files_list",
  "linked_issue_nums",
  "_linked_issue_desc",
  "_pr_description",
  "linked_issue_date_open",
  "linked_issue_date_closed",
  "full_patch",
  "test_patch",
  "patch",
];

fn init_with_headers(path: &Path, headers: &[&str]) -> Result<()> {
  if path.exists() {
    return Ok(());
  }
  if let Some(parent) = path.parent() {
    if !parent.as_os_str().is_empty() {
      std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
  }

  let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
  writer.write_record(headers)?;
  writer.flush()?;
  Ok(())
}

/// Create the per-merge episode CSV with its header row, if missing.
pub fn init_episode_csv(path: &Path) -> Result<()> {
  init_with_headers(path, &EPISODE_HEADERS)
}

/// Create the final exploded CSV with its header row, if missing.
pub fn init_exploded_csv(path: &Path) -> Result<()> {
  init_with_headers(path, &EXPLODED_HEADERS)
}

fn append_serialized<T: serde::Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> Result<()> {
  init_with_headers(path, headers)?;

  let file = OpenOptions::new()
    .append(true)
    .open(path)
    .with_context(|| format!("opening {} for append", path.display()))?;
  let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

  for row in rows {
    writer.serialize(row)?;
  }
  writer.flush()?;
  Ok(())
}

/// Append episode rows, creating the file (with headers) on first use.
pub fn append_episode_rows(path: &Path, rows: &[EpisodeRow]) -> Result<()> {
  append_serialized(path, &EPISODE_HEADERS, rows)
}

/// Append exploded rows to the final dataset.
pub fn append_exploded_rows(path: &Path, rows: &[ExplodedRow]) -> Result<()> {
  append_serialized(path, &EXPLODED_HEADERS, rows)
}

/// Read every episode row back for the enrichment pass.
pub fn read_episode_rows(path: &Path) -> Result<Vec<EpisodeRow>> {
  let mut reader = csv::Reader::from_path(path).with_context(|| format!("reading {}", path.display()))?;
  let mut rows = Vec::new();

  for record in reader.deserialize::<EpisodeRow>() {
    rows.push(record.with_context(|| format!("parsing row in {}", path.display()))?);
  }
  Ok(rows)
}

/// Rewrite the episode CSV in place after enrichment mutated the rows.
pub fn write_episode_rows(path: &Path, rows: &[EpisodeRow]) -> Result<()> {
  let mut writer = csv::WriterBuilder::new()
    .has_headers(false)
    .from_path(path)
    .with_context(|| format!("rewriting {}", path.display()))?;
  writer.write_record(EPISODE_HEADERS)?;
  for row in rows {
    writer.serialize(row)?;
  }
  writer.flush()?;
  Ok(())
}
