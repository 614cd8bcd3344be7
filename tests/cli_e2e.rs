//! End-to-end tests for the jsfetch binary: exit codes, summary output,
//! and report files.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_url_file(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("urls.txt");
    std::fs::write(&path, content).unwrap();
    path
}

fn jsfetch() -> Command {
    Command::cargo_bin("jsfetch").unwrap()
}

#[test]
fn test_missing_url_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let assert = jsfetch()
        .arg(dir.path().join("does-not-exist.txt"))
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .failure();
    assert_eq!(assert.get_output().status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr);
    assert!(stderr.contains("URL file"), "stderr: {stderr}");
}

#[test]
fn test_malformed_header_flag_is_config_error() {
    let dir = TempDir::new().unwrap();
    let url_file = write_url_file(&dir, "https://example.com/app.js\n");

    let assert = jsfetch()
        .arg(&url_file)
        .arg("-H")
        .arg("NoSeparator")
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .failure();
    // Rejected before any network activity.
    assert_eq!(assert.get_output().status.code(), Some(2));
}

#[test]
fn test_non_http_scheme_in_url_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let url_file = write_url_file(&dir, "ftp://example.com/app.js\n");

    let assert = jsfetch()
        .arg(&url_file)
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .failure();
    assert_eq!(assert.get_output().status.code(), Some(2));
}

#[tokio::test]
async fn test_full_success_run_exits_zero_and_mirrors_tree() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/static/app.js"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"console.log(1);".to_vec()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vendor.js"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"console.log(2);".to_vec()))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let base = mock_server.uri();
    let url_file = write_url_file(
        &dir,
        &format!("# collected assets\n\n{base}/static/app.js\n{base}/vendor.js\n"),
    );
    let out_dir = dir.path().join("out");

    jsfetch()
        .arg(&url_file)
        .arg("-o")
        .arg(&out_dir)
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::contains("Download complete"))
        .stdout(predicate::str::contains("2 succeeded"));

    let addr = mock_server.address();
    let host_dir = out_dir.join(format!("{}_{}", addr.ip(), addr.port()));
    assert_eq!(
        std::fs::read(host_dir.join("static/app.js")).unwrap(),
        b"console.log(1);"
    );
    assert_eq!(
        std::fs::read(host_dir.join("vendor.js")).unwrap(),
        b"console.log(2);"
    );
}

#[tokio::test]
async fn test_partial_failure_exits_one_and_writes_reports() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok.js"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.js"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let base = mock_server.uri();
    let url_file = write_url_file(&dir, &format!("{base}/ok.js\n{base}/gone.js\n"));
    let report_path = dir.path().join("report.json");
    let failed_path = dir.path().join("failed.txt");

    let assert = jsfetch()
        .arg(&url_file)
        .arg("-o")
        .arg(dir.path().join("out"))
        .arg("-q")
        .arg("--report")
        .arg(&report_path)
        .arg("--failed-out")
        .arg(&failed_path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("1 failed"));
    assert_eq!(
        assert.get_output().status.code(),
        Some(1),
        "partial failure must yield exit code 1"
    );

    // Machine-readable report matches the run.
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["attempted"], 2);
    assert_eq!(report["succeeded"], 1);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["failures"][0]["status"], "http_error");
    assert_eq!(report["failures"][0]["http_status"], 404);

    // Failed-URL list can be fed straight back in.
    let failed = std::fs::read_to_string(&failed_path).unwrap();
    assert_eq!(failed.trim(), format!("{base}/gone.js"));
}

#[tokio::test]
async fn test_unique_flag_deduplicates_input() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/app.js"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"once".to_vec()))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let base = mock_server.uri();
    let url_file = write_url_file(&dir, &format!("{base}/app.js\n{base}/app.js\n"));
    let out_dir = dir.path().join("out");

    jsfetch()
        .arg(&url_file)
        .arg("-o")
        .arg(&out_dir)
        .arg("-q")
        .arg("--unique")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 succeeded"));

    let addr = mock_server.address();
    let host_dir = out_dir.join(format!("{}_{}", addr.ip(), addr.port()));
    // Only one file: the duplicate line was dropped, not disambiguated.
    assert!(host_dir.join("app.js").exists());
    assert_eq!(std::fs::read_dir(&host_dir).unwrap().count(), 1);
}

#[test]
fn test_empty_url_file_succeeds_without_output() {
    let dir = TempDir::new().unwrap();
    let url_file = write_url_file(&dir, "# nothing yet\n\n");

    jsfetch()
        .arg(&url_file)
        .arg("-o")
        .arg(dir.path().join("out"))
        .arg("-q")
        .assert()
        .success();
    // The output root is only created once there is something to download.
    assert!(!dir.path().join("out").exists());
}
