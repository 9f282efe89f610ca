// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Isolated GitHub API helpers used by enrichment (token discovery, REST calls, rate-limit backoff)
// role: enrichment/github-api
// inputs: repo name (owner/name), PR/issue numbers; env GITHUB_TOKEN; optional `gh` CLI for token fallback
// outputs: Typed PR/issue snapshots behind the IssueTracker trait seam
// side_effects: Network calls to the configured API base; sleeps on rate limit; spawns `gh` subprocess when needed
// invariants:
// - Never panic; return None on failures (best-effort enrichment)
// - Token discovery prefers GITHUB_TOKEN, then GH_TOKEN, then `gh auth token`
// - 403 with x-ratelimit-remaining: 0 sleeps until the advertised reset, then retries
// errors: Swallowed; callers decide whether to surface warnings
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::warn;

/// Credentials and endpoint for the issue tracker, injected at construction.
/// No process-global token state.
#[derive(Debug, Clone)]
pub struct GithubConfig {
  pub token: String,
  pub api_base: String,
}

impl GithubConfig {
  pub fn new(token: String, api_base: String) -> Self {
    GithubConfig { token, api_base }
  }
}

/// Pull-request snapshot: the three fields enrichment reads.
#[derive(Debug, Clone, Deserialize)]
pub struct PullInfo {
  pub created_at: Option<String>,
  pub closed_at: Option<String>,
  pub body: Option<String>,
}

/// Issue snapshot: open/close timestamps and description text.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueInfo {
  pub created_at: Option<String>,
  pub closed_at: Option<String>,
  pub body: Option<String>,
}

// --- Trait seam for the issue tracker ---
pub trait IssueTracker {
  fn pull_request(&self, repo_name: &str, number: u64) -> Option<PullInfo>;
  fn issue(&self, repo_name: &str, number: u64) -> Option<IssueInfo>;
}

/// Discover a GitHub token: env vars first, then `gh auth token` if available.
pub fn get_github_token() -> Option<String> {
  if let Ok(t) = std::env::var("GITHUB_TOKEN") {
    if !t.trim().is_empty() {
      return Some(t);
    }
  }

  if let Ok(gh_token) = std::env::var("GH_TOKEN") {
    if !gh_token.trim().is_empty() {
      return Some(gh_token);
    }
  }

  if let Ok(output) = std::process::Command::new("gh").args(["auth", "token"]).output() {
    if output.status.success() {
      let t = String::from_utf8_lossy(&output.stdout).trim().to_string();

      if !t.is_empty() {
        return Some(t);
      }
    }
  }

  None
}

// --- HTTP backend with rate-limit backoff ---
struct GithubHttpTracker {
  agent: ureq::Agent,
  config: GithubConfig,
}

impl GithubHttpTracker {
  fn new(config: GithubConfig) -> Self {
    GithubHttpTracker {
      agent: ureq::AgentBuilder::new().build(),
      config,
    }
  }

  fn get<T: DeserializeOwned>(&self, url: &str) -> Option<T> {
    loop {
      let resp = self
        .agent
        .get(url)
        .set("Accept", "application/vnd.github.v3+json")
        .set("User-Agent", "git-bugfix-dataset")
        .set("Authorization", &format!("token {}", self.config.token))
        .call();

      return match resp {
        Ok(r) => r.into_json::<T>().ok(),
        Err(ureq::Error::Status(403, r)) if r.header("x-ratelimit-remaining") == Some("0") => {
          let reset: i64 = r
            .header("x-ratelimit-reset")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
          let sleep_seconds = (reset - chrono::Utc::now().timestamp()).max(0) as u64 + 1;
          warn!(url, sleep_seconds, "rate limit exceeded; sleeping");
          std::thread::sleep(std::time::Duration::from_secs(sleep_seconds));
          continue;
        }
        Err(ureq::Error::Status(code, _)) => {
          warn!(url, code, "request failed");
          None
        }
        Err(err) => {
          warn!(url, %err, "transport error");
          None
        }
      };
    }
  }
}

impl IssueTracker for GithubHttpTracker {
  fn pull_request(&self, repo_name: &str, number: u64) -> Option<PullInfo> {
    let url = format!("{}/repos/{}/pulls/{}", self.config.api_base, repo_name, number);
    self.get(&url)
  }

  fn issue(&self, repo_name: &str, number: u64) -> Option<IssueInfo> {
    let url = format!("{}/repos/{}/issues/{}", self.config.api_base, repo_name, number);
    self.get(&url)
  }
}

// --- Env-backed backend for tests and offline runs ---
// Fixtures: GBD_TEST_PULL_JSON_<number> falling back to GBD_TEST_PULL_JSON,
// and the same pair with ISSUE.
struct GithubEnvTracker;

impl GithubEnvTracker {
  fn from_env<T: DeserializeOwned>(prefix: &str, number: u64) -> Option<T> {
    let keyed = format!("{}_{}", prefix, number);
    let raw = std::env::var(keyed).or_else(|_| std::env::var(prefix)).ok()?;
    serde_json::from_str(&raw).ok()
  }
}

impl IssueTracker for GithubEnvTracker {
  fn pull_request(&self, _repo_name: &str, number: u64) -> Option<PullInfo> {
    Self::from_env("GBD_TEST_PULL_JSON", number)
  }

  fn issue(&self, _repo_name: &str, number: u64) -> Option<IssueInfo> {
    Self::from_env("GBD_TEST_ISSUE_JSON", number)
  }
}

// --- Lightweight in-memory caching wrapper ---
// Caches tracker responses per run to avoid duplicate HTTP calls; the
// enrichment pass asks for the same PR twice (dates, then body).
struct GithubCachedTracker {
  inner: Box<dyn IssueTracker>,
  pulls: RefCell<HashMap<String, Option<PullInfo>>>,
  issues: RefCell<HashMap<String, Option<IssueInfo>>>,
}

impl GithubCachedTracker {
  fn new(inner: Box<dyn IssueTracker>) -> Self {
    GithubCachedTracker {
      inner,
      pulls: RefCell::new(HashMap::new()),
      issues: RefCell::new(HashMap::new()),
    }
  }

  #[inline]
  fn key(repo_name: &str, number: u64) -> String {
    format!("{}:{}", repo_name, number)
  }
}

impl IssueTracker for GithubCachedTracker {
  fn pull_request(&self, repo_name: &str, number: u64) -> Option<PullInfo> {
    let key = Self::key(repo_name, number);

    if let Some(v) = self.pulls.borrow().get(&key).cloned() {
      return v;
    }
    let v = self.inner.pull_request(repo_name, number);
    self.pulls.borrow_mut().insert(key, v.clone());

    v
  }

  fn issue(&self, repo_name: &str, number: u64) -> Option<IssueInfo> {
    let key = Self::key(repo_name, number);

    if let Some(v) = self.issues.borrow().get(&key).cloned() {
      return v;
    }
    let v = self.inner.issue(repo_name, number);
    self.issues.borrow_mut().insert(key, v.clone());

    v
  }
}

fn env_wants_mock() -> bool {
  std::env::vars().any(|(k, _)| k.starts_with("GBD_TEST_"))
}

/// Select a tracker backend: env fixtures win, then HTTP with a discovered
/// token, else no tracker (enrichment is skipped by the caller).
pub fn build_tracker(api_base: &str) -> Option<Box<dyn IssueTracker>> {
  let inner: Box<dyn IssueTracker> = if env_wants_mock() {
    Box::new(GithubEnvTracker)
  } else if let Some(token) = get_github_token() {
    Box::new(GithubHttpTracker::new(GithubConfig::new(token, api_base.to_string())))
  } else {
    return None;
  };

  Some(Box::new(GithubCachedTracker::new(inner)))
}

// Public constructors for dependency injection in higher layers/tests.
#[cfg(any(test, feature = "testutil"))]
pub fn make_env_tracker() -> Box<dyn IssueTracker> {
  Box::new(GithubCachedTracker::new(Box::new(GithubEnvTracker)))
}
#[cfg(any(test, feature = "testutil"))]
pub fn make_http_tracker(config: GithubConfig) -> Box<dyn IssueTracker> {
  Box::new(GithubCachedTracker::new(Box::new(GithubHttpTracker::new(config))))
}
