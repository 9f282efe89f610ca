// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Best-effort enrichment filling PR dates and linked-issue data on collected rows
// role: enrichment/integration
// inputs: &mut [EpisodeRow], an IssueTracker backend
// outputs: Mutated rows: pr_open_date/pr_close_date and the linked_issue_* columns
// side_effects: Tracker calls (network or env fixtures) inside the injected backend
// invariants:
// - Rows without a pr_num are untouched; already-filled fields are not refetched
// - Linked-issue columns are written together, even when extraction finds nothing
// - On tracker failure, rows remain valid; fields stay unfilled
// errors: None propagated (best-effort); enrichment failures are ignored
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use crate::enrichment::github_api::IssueTracker;
use crate::issues::extract_issue_ids;
use crate::model::{json_cell, EpisodeRow};

/// Fill the issue-tracker columns on rows collected from git. Keyword-gated
/// extraction runs over the PR body; each linked issue contributes its
/// open/close dates and a `Issue #N: <desc>` fragment.
pub fn enrich_rows(rows: &mut [EpisodeRow], tracker: &dyn IssueTracker) {
  for row in rows.iter_mut() {
    let Some(pr_num) = row.pr_num else { continue };

    if row.pr_open_date.is_none() {
      if let Some(pull) = tracker.pull_request(&row.repo_name, pr_num) {
        row.pr_open_date = pull.created_at.clone();
        row.pr_close_date = pull.closed_at.clone();
      }
    }

    if row.linked_issue_desc.is_none() {
      let Some(pull) = tracker.pull_request(&row.repo_name, pr_num) else {
        continue;
      };

      let body = pull.body.unwrap_or_default();
      let issue_numbers = extract_issue_ids(&body, true);

      let mut descriptions: Vec<String> = Vec::new();
      let mut open_dates: Vec<String> = Vec::new();
      let mut close_dates: Vec<String> = Vec::new();

      for number in &issue_numbers {
        match tracker.issue(&row.repo_name, *number) {
          Some(issue) => {
            let desc = issue.body.unwrap_or_else(|| "No description".to_string());
            descriptions.push(format!("Issue #{}: {}", number, desc));
            open_dates.push(issue.created_at.unwrap_or_default());
            close_dates.push(issue.closed_at.unwrap_or_default());
          }
          None => {
            descriptions.push(format!("Issue #{}: Fetch failed", number));
            open_dates.push(String::new());
            close_dates.push(String::new());
          }
        }
      }

      row.linked_issue_nums = Some(json_cell(&issue_numbers));
      row.linked_issue_desc = Some(descriptions.join(" | "));
      row.linked_issue_date_open = Some(json_cell(&open_dates));
      row.linked_issue_date_closed = Some(json_cell(&close_dates));
    }
  }
}
