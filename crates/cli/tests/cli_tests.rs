//! CLI integration tests
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("blinkpress")
}

fn get_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("../../tests/fixtures/{}", name)).unwrap()
}

async fn mount_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/en/books.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(get_fixture("login_page.html")))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/mickey_mouse/setup"))
        .respond_with(ResponseTemplate::new(200).set_body_string(get_fixture("setup.json")))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/en/nc/login/"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/en/nc/library/"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/en/nc/library/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/en/nc/reader/deep-work-en/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(get_fixture("reader_page.html")))
        .mount(server)
        .await;
}

/// Writes a config file pointing at `server` and returns its path.
fn write_config(dir: &TempDir, server: &MockServer, books: &[&str]) -> std::path::PathBuf {
    let config = serde_json::json!({
        "username": "reader@example.com",
        "password": "secret",
        "books": books,
        "base_url": server.uri(),
        "output_dir": dir.path().join("books"),
        "format": "markdown",
    });
    let path = dir.path().join("config.json");
    std::fs::write(&path, config.to_string()).unwrap();
    path
}

#[test]
fn test_cli_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("blinkpress").and(predicate::str::contains("--fail-fast")));
}

#[test]
fn test_cli_version() {
    cmd().arg("--version").assert().success().stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_cli_completions() {
    cmd()
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_blinkpress"));
}

#[test]
fn test_cli_completions_use_kebab_case_flags() {
    cmd()
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--fail-fast")
                .and(predicate::str::contains("--base-url"))
                .and(predicate::str::contains("--fail_fast").not())
                .and(predicate::str::contains("--base_url").not()),
        );
}

#[test]
fn test_cli_missing_config_file() {
    cmd()
        .args(["--config", "/nonexistent/blinkpress.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config file"));
}

#[test]
fn test_cli_invalid_format() {
    cmd().args(["--format", "docx", "deep-work"]).assert().failure();
}

#[test]
fn test_cli_invalid_config_json() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.json");
    std::fs::write(&path, r#"{"username": "u", "password": "p", "books": ["deep-work"], "colour": "red"}"#).unwrap();

    cmd()
        .args(["--config", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("colour"));
}

#[test]
fn test_cli_invalid_book_argument() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.json");
    std::fs::write(&path, r#"{"username": "u", "password": "p", "books": []}"#).unwrap();

    cmd()
        .args(["--config", path.to_str().unwrap(), "../escape"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid book identifier"));
}

#[test]
fn test_cli_no_books() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.json");
    std::fs::write(&path, r#"{"username": "u", "password": "p", "books": []}"#).unwrap();

    cmd()
        .args(["--config", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No books"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_end_to_end() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let tmp = TempDir::new().unwrap();
    let config = write_config(&tmp, &server, &["deep-work"]);

    cmd()
        .args(["--config", config.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("1 of 1 books completed"));

    let document = tmp.path().join("books").join("deep-work.md");
    let content = std::fs::read_to_string(document).unwrap();
    assert!(content.contains("Key Idea 1"));
    assert!(!tmp.path().join("books").join("deep-work").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_partial_failure_exits_with_error() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let tmp = TempDir::new().unwrap();
    let config = write_config(&tmp, &server, &["missing-book", "deep-work"]);

    cmd()
        .args(["--config", config.to_str().unwrap()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("1 of 2 books completed").and(predicate::str::contains("missing-book")));

    assert!(tmp.path().join("books").join("deep-work.md").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_flags_override_config() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let tmp = TempDir::new().unwrap();
    let config = write_config(&tmp, &server, &["missing-book"]);
    let output = tmp.path().join("elsewhere");

    cmd()
        .args(["--config", config.to_str().unwrap(), "--output", output.to_str().unwrap(), "-j", "1", "deep-work"])
        .assert()
        .success();

    assert!(output.join("deep-work.md").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_credentials_without_config_file() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("out");

    cmd()
        .current_dir(tmp.path())
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path())
        .env("BLINKPRESS_PASSWORD", "secret")
        .args(["--username", "reader@example.com", "--base-url", &server.uri()])
        .args(["--format", "markdown", "--output", output.to_str().unwrap(), "deep-work"])
        .assert()
        .success();

    assert!(output.join("deep-work.md").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_rejected_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/en/books.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><head></head></html>"))
        .mount(&server)
        .await;
    let tmp = TempDir::new().unwrap();
    let config = write_config(&tmp, &server, &["deep-work"]);

    cmd()
        .args(["--config", config.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Login failed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_verbose() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let tmp = TempDir::new().unwrap();
    let config = write_config(&tmp, &server, &["deep-work"]);

    cmd()
        .args(["-v", "--config", config.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("Blinkpress").and(predicate::str::contains("[3/3]")));
}
