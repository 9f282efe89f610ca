// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Iterate the collector over many repositories in batches with a per-batch checkpoint into the final CSV
// role: orchestration/batching
// inputs: Repo list, EffectiveConfig, optional IssueTracker backend
// outputs: Final exploded CSV; per-batch temp CSVs created and removed alongside it
// side_effects: Clones repositories, writes/removes CSV files
// invariants:
// - A batch appended to the final CSV is durable before the next batch starts
// - Per-repo failures are logged and never abort the batch
// - Temp batch files are removed after a successful append
// errors: Store-level IO failures propagate; collection failures degrade to skips
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::EffectiveConfig;
use crate::collector::{process_repo, CollectorContext};
use crate::enrichment::github_api::IssueTracker;
use crate::enrichment::issue_data::enrich_rows;
use crate::model::ExplodedRow;
use crate::store;

/// Process every repository in `cfg.repos`, `cfg.batch_size` at a time.
/// Each batch is collected into a temp CSV next to the final output,
/// enriched, exploded, appended to the final CSV, and cleaned up.
pub fn run_batches(cfg: &EffectiveConfig, tracker: Option<&dyn IssueTracker>) -> Result<()> {
  store::init_exploded_csv(&cfg.out)?;

  let total_batches = cfg.repos.len().div_ceil(cfg.batch_size);

  for (index, batch) in cfg.repos.chunks(cfg.batch_size).enumerate() {
    let batch_num = index + 1;
    info!(batch = batch_num, total_batches, repos = batch.len(), "starting batch");

    let temp_csv = cfg.out.with_file_name(format!("temp_batch_{}.csv", batch_num));
    // A stale temp file from an interrupted run would double-count rows.
    if temp_csv.exists() {
      std::fs::remove_file(&temp_csv)?;
    }
    store::init_episode_csv(&temp_csv)?;

    let ctx = CollectorContext {
      since: cfg.since.as_deref(),
      remote_base: &cfg.remote_base,
      workdir: &cfg.workdir,
      keep_clones: cfg.keep_clones,
    };

    for repo_name in batch {
      if let Err(err) = process_repo(repo_name, &temp_csv, &ctx) {
        warn!(repo = repo_name.as_str(), %err, "skipping repository");
      }
    }

    let mut rows = store::read_episode_rows(&temp_csv)?;

    if let Some(tracker) = tracker {
      info!(batch = batch_num, "batch collected; updating PR and issue data");
      enrich_rows(&mut rows, tracker);
      store::write_episode_rows(&temp_csv, &rows)?;
    }

    let exploded: Vec<ExplodedRow> = rows.iter().flat_map(|row| row.explode()).collect();
    store::append_exploded_rows(&cfg.out, &exploded)?;
    std::fs::remove_file(&temp_csv)?;
    info!(batch = batch_num, rows = exploded.len(), "appended and cleaned up batch");
  }

  info!(out = %cfg.out.display(), "all batches processed");
  Ok(())
}
