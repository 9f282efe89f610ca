mod common;

use assert_cmd::Command;

fn read_csv(path: &std::path::Path) -> (Vec<String>, Vec<Vec<String>>) {
  let mut reader = csv::Reader::from_path(path).unwrap();
  let headers: Vec<String> = reader.headers().unwrap().iter().map(|h| h.to_string()).collect();
  let rows: Vec<Vec<String>> = reader
    .records()
    .map(|r| r.unwrap().iter().map(|c| c.to_string()).collect())
    .collect();
  (headers, rows)
}

fn cell<'a>(headers: &[String], row: &'a [String], name: &str) -> &'a str {
  let idx = headers.iter().position(|h| h == name).unwrap_or_else(|| panic!("missing column {}", name));
  &row[idx]
}

#[test]
fn env_fixture_backend_fills_pr_and_issue_columns() {
  let origin = common::fixture_origin();
  let outdir = tempfile::TempDir::new().unwrap();
  let workdir = tempfile::TempDir::new().unwrap();
  let out = outdir.path().join("episodes.csv");

  let mut cmd = Command::cargo_bin("git-bugfix-dataset").unwrap();
  cmd.args([
    "--repo",
    "owner/proj",
    "--remote-base",
    &common::remote_base(&origin),
    "--workdir",
    workdir.path().to_str().unwrap(),
    "--out",
    out.to_str().unwrap(),
  ]);
  // Fixture env vars select the env-backed tracker inside the child process;
  // the parent environment stays untouched.
  cmd.env(
    "GBD_TEST_PULL_JSON_6",
    serde_json::json!({
      "created_at": "2024-05-13T19:51:28Z",
      "closed_at": "2024-05-13T19:52:03Z",
      "body": "Bug fixes\r\n\r\nfixes #2 and see #1234"
    })
    .to_string(),
  );
  cmd.env(
    "GBD_TEST_ISSUE_JSON_2",
    serde_json::json!({
      "created_at": "2024-05-07T09:09:17Z",
      "closed_at": "2024-05-13T19:52:23Z",
      "body": "Enable using completions without user_query"
    })
    .to_string(),
  );
  cmd.assert().success();

  let (headers, rows) = read_csv(&out);
  assert_eq!(rows.len(), 2);

  for row in &rows {
    assert_eq!(cell(&headers, row, "pr_open_date"), "2024-05-13T19:51:28Z");
    assert_eq!(cell(&headers, row, "pr_close_date"), "2024-05-13T19:52:03Z");
    assert_eq!(cell(&headers, row, "linked_issue_nums"), "[2]");
    assert_eq!(
      cell(&headers, row, "_linked_issue_desc"),
      "Issue #2: Enable using completions without user_query"
    );
    assert_eq!(cell(&headers, row, "linked_issue_date_open"), r#"["2024-05-07T09:09:17Z"]"#);
    assert_eq!(cell(&headers, row, "linked_issue_date_closed"), r#"["2024-05-13T19:52:23Z"]"#);
  }
}

#[test]
fn missing_fixture_for_issue_leaves_fetch_failed_marker() {
  let origin = common::fixture_origin();
  let outdir = tempfile::TempDir::new().unwrap();
  let workdir = tempfile::TempDir::new().unwrap();
  let out = outdir.path().join("episodes.csv");

  let mut cmd = Command::cargo_bin("git-bugfix-dataset").unwrap();
  cmd.args([
    "--repo",
    "owner/proj",
    "--remote-base",
    &common::remote_base(&origin),
    "--workdir",
    workdir.path().to_str().unwrap(),
    "--out",
    out.to_str().unwrap(),
  ]);
  cmd.env(
    "GBD_TEST_PULL_JSON_6",
    serde_json::json!({
      "created_at": "2024-05-13T19:51:28Z",
      "closed_at": null,
      "body": "closes #9"
    })
    .to_string(),
  );
  cmd.assert().success();

  let (headers, rows) = read_csv(&out);
  assert_eq!(cell(&headers, &rows[0], "linked_issue_nums"), "[9]");
  assert_eq!(cell(&headers, &rows[0], "_linked_issue_desc"), "Issue #9: Fetch failed");
  assert_eq!(cell(&headers, &rows[0], "pr_close_date"), "");
}
