use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::gitio;

/// A cloned repository with a scoped lifetime. The checkout is removed on
/// drop (on every exit path, including failures mid-collection) unless the
/// caller asked to keep it.
pub struct ClonedRepo {
  path: PathBuf,
  keep: bool,
}

impl ClonedRepo {
  /// Clone `owner/name` from `remote_base` into `<base>/<owner>/<name>`.
  /// An existing checkout at that path is reused as-is.
  pub fn obtain(repo_name: &str, remote_base: &str, base: &Path, keep: bool) -> Result<Self> {
    let path = base.join(repo_name);

    if !path.exists() {
      if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
      }
      let url = format!("{}/{}.git", remote_base.trim_end_matches('/'), repo_name);
      info!(repo = repo_name, url, "cloning repository");
      gitio::clone_repo(&url, &path)?;
    }

    Ok(ClonedRepo { path, keep })
  }

  pub fn path_str(&self) -> String {
    self.path.to_string_lossy().to_string()
  }
}

impl Drop for ClonedRepo {
  fn drop(&mut self) {
    if self.keep || !self.path.exists() {
      return;
    }
    match std::fs::remove_dir_all(&self.path) {
      Ok(()) => info!(path = %self.path.display(), "removed cloned repo"),
      Err(err) => warn!(path = %self.path.display(), %err, "failed to remove cloned repo"),
    }
  }
}
