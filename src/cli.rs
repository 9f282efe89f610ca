use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::util;

#[derive(Parser, Debug)]
#[command(
  name = "git-bugfix-dataset",
  version,
  about = "Mine Git merge history into a labeled bug-fix episode dataset (CSV)",
  long_about = None
)]
pub struct Cli {
  /// GitHub repository in owner/name form (repeatable)
  #[arg(long = "repo")]
  pub repos: Vec<String>,

  /// File listing one owner/name per line; blank lines and #-comments are skipped
  #[arg(long)]
  pub repos_file: Option<PathBuf>,

  /// Only consider merge commits at or after this date (YYYY-MM-DD)
  #[arg(long, alias = "start-date")]
  pub since: Option<String>,

  /// Final dataset CSV, one row per base commit
  #[arg(long, default_value = "episodes.csv")]
  pub out: PathBuf,

  /// Repositories per batch between checkpoints into the final CSV
  #[arg(long, default_value_t = 100)]
  pub batch_size: usize,

  /// Directory for temporary clones (default: a directory under the system temp dir)
  #[arg(long)]
  pub workdir: Option<PathBuf>,

  /// Keep clones after processing instead of removing them
  #[arg(long)]
  pub keep_clones: bool,

  /// Skip the issue-tracker enrichment pass
  #[arg(long)]
  pub no_enrich: bool,

  /// Base URL for clone remotes (hidden; tests point it at file:// fixtures)
  #[arg(long, default_value = "https://github.com", hide = true)]
  pub remote_base: String,

  /// Issue-tracker API base URL (hidden; tests point it at a local server)
  #[arg(long, default_value = "https://api.github.com", hide = true)]
  pub api_base: String,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,
}

#[derive(Debug)]
pub struct EffectiveConfig {
  pub repos: Vec<String>,
  pub since: Option<String>,
  pub out: PathBuf,
  pub batch_size: usize,
  pub workdir: PathBuf,
  pub keep_clones: bool,
  pub enrich: bool,
  pub remote_base: String,
  pub api_base: String,
}

fn read_repos_file(path: &PathBuf) -> Result<Vec<String>> {
  let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
  Ok(
    text
      .lines()
      .map(|l| l.trim())
      .filter(|l| !l.is_empty() && !l.starts_with('#'))
      .map(|l| l.to_string())
      .collect(),
  )
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  let mut repos = cli.repos;
  if let Some(path) = &cli.repos_file {
    repos.extend(read_repos_file(path)?);
  }
  if repos.is_empty() {
    bail!("Provide at least one repository via --repo or --repos-file");
  }
  for repo in &repos {
    if repo.splitn(2, '/').count() != 2 || repo.starts_with('/') || repo.ends_with('/') {
      bail!("Repository {:?} is not in owner/name form", repo);
    }
  }

  if let Some(date) = &cli.since {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
      .with_context(|| format!("--since {:?} is not a YYYY-MM-DD date", date))?;
  }

  if cli.batch_size == 0 {
    bail!("--batch-size must be at least 1");
  }

  let workdir = match cli.workdir {
    Some(dir) => {
      std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
      PathBuf::from(util::canonicalize_lossy(dir))
    }
    None => std::env::temp_dir().join("bugfix-episodes"),
  };

  Ok(EffectiveConfig {
    repos,
    since: cli.since,
    out: cli.out,
    batch_size: cli.batch_size,
    workdir,
    keep_clones: cli.keep_clones,
    enrich: !cli.no_enrich,
    remote_base: cli.remote_base,
    api_base: cli.api_base,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn base_cli() -> Cli {
    Cli {
      repos: vec!["owner/repo".into()],
      repos_file: None,
      since: None,
      out: PathBuf::from("episodes.csv"),
      batch_size: 100,
      workdir: None,
      keep_clones: false,
      no_enrich: false,
      remote_base: "https://github.com".into(),
      api_base: "https://api.github.com".into(),
      gen_man: false,
    }
  }

  #[test]
  fn normalize_accepts_minimal_invocation() {
    let cfg = normalize(base_cli()).unwrap();
    assert_eq!(cfg.repos, vec!["owner/repo".to_string()]);
    assert!(cfg.enrich);
    assert!(cfg.workdir.is_absolute());
  }

  #[test]
  fn missing_repos_is_an_error() {
    let mut cli = base_cli();
    cli.repos = vec![];
    assert!(normalize(cli).is_err());
  }

  #[test]
  fn malformed_repo_name_is_rejected() {
    let mut cli = base_cli();
    cli.repos = vec!["not-a-repo".into()];
    assert!(normalize(cli).is_err());
  }

  #[test]
  fn bad_since_date_is_rejected() {
    let mut cli = base_cli();
    cli.since = Some("May 2024".into());
    assert!(normalize(cli).is_err());

    let mut ok = base_cli();
    ok.since = Some("2024-01-01".into());
    assert!(normalize(ok).is_ok());
  }

  #[test]
  fn zero_batch_size_is_rejected() {
    let mut cli = base_cli();
    cli.batch_size = 0;
    assert!(normalize(cli).is_err());
  }

  #[test]
  fn repos_file_entries_are_merged() {
    let dir = tempfile::TempDir::new().unwrap();
    let list = dir.path().join("repos.txt");
    std::fs::write(&list, "# comment\nother/project\n\n").unwrap();

    let mut cli = base_cli();
    cli.repos_file = Some(list);
    let cfg = normalize(cli).unwrap();
    assert_eq!(cfg.repos, vec!["owner/repo".to_string(), "other/project".to_string()]);
  }

  #[test]
  fn no_enrich_disables_enrichment() {
    let mut cli = base_cli();
    cli.no_enrich = true;
    let cfg = normalize(cli).unwrap();
    assert!(!cfg.enrich);
  }
}
