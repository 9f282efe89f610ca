// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Utilities for paths, git subprocess execution, and man page rendering
// role: utilities/helpers
// inputs: Repository paths; git argument vectors; clap CommandFactory
// outputs: Canonicalized paths, raw git stdout, man page text
// side_effects: run_git invokes subprocesses
// invariants:
// - run_git surfaces command + stderr on failure; stdout is returned undecorated
// - canonicalize_lossy always returns an absolute-ish path string, never errors
// errors: run_git surfaces command + stderr; IO errors bubble with context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use clap::CommandFactory;

pub fn canonicalize_lossy<P: AsRef<Path>>(p: P) -> String {
  let p = p.as_ref();
  let pb: PathBuf = match std::fs::canonicalize(p) {
    Ok(x) => x,
    Err(_) => match std::env::current_dir() {
      Ok(cwd) => cwd.join(p),
      Err(_) => PathBuf::from(p),
    },
  };
  pb.to_string_lossy().to_string()
}

/// Run `git -C <repo> <args>` and return stdout as-is. Diff and patch text
/// must not be trimmed or re-encoded here; the splitter depends on byte
/// fidelity.
pub fn run_git(repo: &str, args: &[String]) -> Result<String> {
  let out = Command::new("git")
    .arg("-C")
    .arg(repo)
    .args(args)
    .output()
    .with_context(|| format!("spawning git {:?}", args))?;

  if out.status.success() {
    Ok(String::from_utf8_lossy(&out.stdout).to_string())
  } else {
    let stderr = String::from_utf8_lossy(&out.stderr);
    anyhow::bail!("git {:?} failed: {}", args, stderr)
  }
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
