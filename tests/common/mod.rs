use std::path::Path;
use std::process::Command;

#[allow(dead_code)]
pub fn run(repo: &Path, args: &[&str]) {
  let status = Command::new("git").args(args).current_dir(repo).status().unwrap();
  assert!(status.success(), "git {:?} failed", args);
}

/// Build a local stand-in for a GitHub remote: a working repo under
/// `<dir>/owner/proj` with one PR-style merge commit, plus a bare mirror at
/// `<dir>/owner/proj.git` so `--remote-base file://<dir>` resolves clones.
///
/// The merge brings in a non-test change (`src/lib.py`) and a test change
/// (`tests/test_lib.py`), with the default GitHub merge subject referencing
/// pull request #6.
#[allow(dead_code)]
pub fn fixture_origin() -> tempfile::TempDir {
  let dir = tempfile::TempDir::new().unwrap();
  let p = dir.path().join("owner").join("proj");
  std::fs::create_dir_all(&p).unwrap();

  run(&p, &["init", "-q", "-b", "main"]);
  run(&p, &["config", "user.name", "Fixture Bot"]);
  run(&p, &["config", "user.email", "fixture@example.com"]);
  run(&p, &["config", "commit.gpgsign", "false"]);

  std::fs::create_dir_all(p.join("src")).unwrap();
  std::fs::write(p.join("src/lib.py"), "def f():\n    return 1\n").unwrap();
  run(&p, &["add", "."]);
  run(&p, &["commit", "-q", "-m", "initial import"]);

  run(&p, &["checkout", "-q", "-b", "fix/issue-2"]);
  std::fs::create_dir_all(p.join("tests")).unwrap();
  std::fs::write(p.join("tests/test_lib.py"), "def test_f():\n    assert True\n").unwrap();
  std::fs::write(p.join("src/lib.py"), "def f():\n    return 2\n").unwrap();
  run(&p, &["add", "."]);
  run(&p, &["commit", "-q", "-m", "fix return value"]);

  run(&p, &["checkout", "-q", "main"]);
  run(
    &p,
    &[
      "merge",
      "-q",
      "--no-ff",
      "-m",
      "Merge pull request #6 from owner/fix/issue-2\n\nBug fixes",
      "fix/issue-2",
    ],
  );

  let bare = dir.path().join("owner").join("proj.git");
  let status = Command::new("git")
    .args(["clone", "--quiet", "--bare"])
    .arg(&p)
    .arg(&bare)
    .status()
    .unwrap();
  assert!(status.success());

  dir
}

/// file:// base URL for clones from the fixture.
#[allow(dead_code)]
pub fn remote_base(origin: &tempfile::TempDir) -> String {
  format!("file://{}", origin.path().display())
}
