use anyhow::{Context, Result};
use std::path::Path;

use crate::util::run_git;

/// Clone `url` into `dest`. Callers own the destination's lifecycle.
pub fn clone_repo(url: &str, dest: &Path) -> Result<()> {
  let status = std::process::Command::new("git")
    .arg("clone")
    .arg("--quiet")
    .arg(url)
    .arg(dest)
    .status()
    .with_context(|| format!("spawning git clone {}", url))?;

  if !status.success() {
    anyhow::bail!("git clone {} failed", url);
  }
  Ok(())
}

/// List merge commits as (sha, committer date) pairs, newest first, optionally
/// bounded by a start date.
pub fn merge_commits(repo: &str, since: Option<&str>) -> Result<Vec<(String, String)>> {
  let mut args: Vec<String> = vec!["log".into(), "--merges".into(), "--pretty=%H %ci".into()];
  if let Some(date) = since {
    args.insert(1, format!("--since={}", date));
  }

  let out = run_git(repo, &args)?;
  Ok(
    out
      .lines()
      .filter_map(|line| {
        let mut parts = line.split_whitespace();
        let sha = parts.next()?.to_string();
        let date = parts.collect::<Vec<_>>().join(" ");
        Some((sha, date))
      })
      .collect(),
  )
}

/// Parents of a merge commit. A commit with fewer than two parents is not a
/// merge and yields an empty list.
pub fn parent_commits(repo: &str, merge_sha: &str) -> Result<Vec<String>> {
  let args: Vec<String> = vec!["rev-list".into(), "--parents".into(), "-n".into(), "1".into(), merge_sha.into()];
  let out = run_git(repo, &args)?;

  let parts: Vec<&str> = out.split_whitespace().collect();
  if parts.len() > 2 {
    Ok(parts[1..].iter().map(|s| s.to_string()).collect())
  } else {
    Ok(Vec::new())
  }
}

/// Committer date of a commit in git's default `%ci` form.
pub fn commit_date(repo: &str, sha: &str) -> Result<String> {
  let args: Vec<String> = vec!["show".into(), "-s".into(), "--format=%ci".into(), sha.into()];
  Ok(run_git(repo, &args)?.trim().to_string())
}

/// Full commit message (subject and body).
pub fn commit_message(repo: &str, sha: &str) -> Result<String> {
  let args: Vec<String> = vec!["log".into(), "-1".into(), "--pretty=%B".into(), sha.into()];
  Ok(run_git(repo, &args)?.trim().to_string())
}

/// Paths touched between two commits.
pub fn changed_files(repo: &str, before: &str, after: &str) -> Result<Vec<String>> {
  let args: Vec<String> = vec!["diff".into(), "--name-only".into(), format!("{}..{}", before, after)];
  let out = run_git(repo, &args)?;
  Ok(out.lines().filter(|l| !l.is_empty()).map(|l| l.to_string()).collect())
}

/// Raw unified diff between two commits, byte-exact as git emitted it.
pub fn diff_text(repo: &str, before: &str, after: &str) -> Result<String> {
  let args: Vec<String> = vec!["diff".into(), format!("{}..{}", before, after)];
  run_git(repo, &args)
}
