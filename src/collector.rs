// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Assemble one episode row per merge commit: parents, dates, changed files, split patch triples
// role: collection/orchestrator
// inputs: Repo name, CollectorContext (since, remote base, workdir, keep flag), target CSV path
// outputs: Episode rows appended to the per-batch CSV, one per qualifying merge commit
// side_effects: Clones the repository (scoped; removed on drop), reads git, appends CSV rows
// invariants:
// - A merge with N parents yields N index-aligned (full, test, non-test) patch triples
// - Merges without parents or without a #N reference in the message are skipped, not errors
// - Diff text is fetched once per (before, after) pair via a bounded memo
// errors: Per-commit git failures are logged and skipped; clone/CSV failures propagate
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use anyhow::Result;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::diffsplit::split_diff;
use crate::gitio;
use crate::issues::first_issue_reference;
use crate::model::{Episode, EpisodeRow};
use crate::store;
use crate::workdir::ClonedRepo;

pub struct CollectorContext<'a> {
  pub since: Option<&'a str>,
  pub remote_base: &'a str,
  pub workdir: &'a Path,
  pub keep_clones: bool,
}

/// Bounded memo for diff text, keyed by the (before, after) commit pair.
/// One instance is scoped to a single repository checkout, which pins the
/// repository component of the cache key. Oldest entries are evicted first.
pub struct DiffCache {
  capacity: usize,
  map: HashMap<(String, String), String>,
  order: VecDeque<(String, String)>,
}

impl DiffCache {
  pub fn new(capacity: usize) -> Self {
    DiffCache {
      capacity: capacity.max(1),
      map: HashMap::new(),
      order: VecDeque::new(),
    }
  }

  /// Return the cached diff for the pair, or compute it via `fetch` and
  /// remember it.
  pub fn fetch_with<F>(&mut self, before: &str, after: &str, fetch: F) -> Result<String>
  where
    F: FnOnce() -> Result<String>,
  {
    let key = (before.to_string(), after.to_string());

    if let Some(hit) = self.map.get(&key) {
      return Ok(hit.clone());
    }

    let diff = fetch()?;

    if self.map.len() >= self.capacity {
      if let Some(oldest) = self.order.pop_front() {
        self.map.remove(&oldest);
      }
    }
    self.order.push_back(key.clone());
    self.map.insert(key, diff.clone());

    Ok(diff)
  }
}

/// Build the episode for one merge commit, or `None` when the commit does
/// not qualify (no parent pair, or no PR reference in its message).
pub fn collect_episode(
  repo: &str,
  repo_name: &str,
  merge_sha: &str,
  merge_date: &str,
  cache: &mut DiffCache,
) -> Result<Option<Episode>> {
  let parents = gitio::parent_commits(repo, merge_sha)?;
  if parents.is_empty() {
    return Ok(None);
  }

  let message = gitio::commit_message(repo, merge_sha)?;
  let Some(pr_num) = first_issue_reference(&message) else {
    warn!(repo = repo_name, merge = merge_sha, "no issue number found in merge message");
    return Ok(None);
  };

  let base_commit_dates = parents
    .iter()
    .map(|p| gitio::commit_date(repo, p))
    .collect::<Result<Vec<_>>>()?;

  let changed_files = parents
    .iter()
    .map(|p| gitio::changed_files(repo, p, merge_sha))
    .collect::<Result<Vec<_>>>()?;

  let full_patches = parents
    .iter()
    .map(|p| cache.fetch_with(p, merge_sha, || gitio::diff_text(repo, p, merge_sha)))
    .collect::<Result<Vec<_>>>()?;

  // The splitter is pure, so the per-parent fan-out is safe to parallelize;
  // collect() keeps the results index-aligned with the parent list.
  let (test_patches, patches): (Vec<String>, Vec<String>) =
    full_patches.par_iter().map(|diff| split_diff(diff)).unzip();

  Ok(Some(Episode {
    repo_name: repo_name.to_string(),
    base_commit_ids: parents,
    base_commit_dates,
    resolving_commit_id: merge_sha.to_string(),
    resolving_commit_date: merge_date.to_string(),
    pr_num: Some(pr_num),
    changed_files,
    pr_description: message,
    full_patches,
    test_patches,
    patches,
  }))
}

/// Clone a repository, walk its merge commits, and append one row per
/// qualifying merge to `csv_path`. Returns the number of rows written.
pub fn process_repo(repo_name: &str, csv_path: &Path, ctx: &CollectorContext) -> Result<usize> {
  let clone = ClonedRepo::obtain(repo_name, ctx.remote_base, ctx.workdir, ctx.keep_clones)?;
  let repo = clone.path_str();

  let merges = gitio::merge_commits(&repo, ctx.since)?;
  let mut cache = DiffCache::new(128);
  let mut written = 0usize;

  for (i, (merge_sha, merge_date)) in merges.iter().enumerate() {
    info!(repo = repo_name, "processing {}/{}: {}", i + 1, merges.len(), merge_sha);

    match collect_episode(&repo, repo_name, merge_sha, merge_date, &mut cache) {
      Ok(Some(episode)) => {
        let row: EpisodeRow = episode.into();
        store::append_episode_rows(csv_path, &[row])?;
        written += 1;
      }
      Ok(None) => {}
      Err(err) => {
        warn!(repo = repo_name, merge = merge_sha, %err, "skipping merge commit");
      }
    }
  }

  info!(repo = repo_name, rows = written, "repository collected");
  Ok(written)
}
