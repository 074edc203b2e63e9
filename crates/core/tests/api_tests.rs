//! Library API integration tests
use blinkpress_core::*;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

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
        .and(header("x-csrf-token", "pQ7v3kXb9sL2mN4rT6yU8wE0qA1zC3xV5bN7mK9jH2g="))
        .respond_with(ResponseTemplate::new(200).set_body_string(get_fixture("setup.json")))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/en/nc/login/"))
        .and(body_string_contains("login%5Bemail%5D=reader%40example.com"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/en/nc/library/")
                .insert_header("set-cookie", "_session=signed-in; Path=/"),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/en/nc/library/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>library</html>"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/en/nc/reader/deep-work-en/"))
        .and(header("cookie", "_session=signed-in"))
        .respond_with(ResponseTemplate::new(200).set_body_string(get_fixture("reader_page.html")))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/en/nc/reader/unavailable-book-en/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(get_fixture("empty_reader.html")))
        .mount(server)
        .await;
}

fn config_for(server: &MockServer, output: &TempDir, books: &[&str]) -> Config {
    let mut builder = Config::builder("reader@example.com", "secret")
        .base_url(server.uri())
        .output_dir(output.path())
        .format(DocumentFormat::Markdown);
    for book in books {
        builder = builder.book(book).unwrap();
    }
    builder.build()
}

#[test]
fn test_extract_token_from_fixture() {
    let token = extract_token(&get_fixture("login_page.html")).unwrap();
    assert_eq!(token.as_str(), "pQ7v3kXb9sL2mN4rT6yU8wE0qA1zC3xV5bN7mK9jH2g=");
}

#[test]
fn test_parse_setup_fixture() {
    let token = parse_setup_response(&get_fixture("setup.json")).unwrap();
    assert_eq!(token.as_str(), "Zx8Yw7Vu6Ts5Rq4Po3Nm2Lk1Jh0Gf9Ed8Cb7Aa6==");
}

#[test]
fn test_extract_reader_fixture() {
    let extractor = ContentExtractor::new(ExtractConfig::default(), default_text_converter());
    let sections = extractor.extract(&Item::new("deep-work").unwrap(), &get_fixture("reader_page.html")).unwrap();

    let stems: Vec<_> = sections
        .iter()
        .map(|s| s.path.file_stem().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        stems,
        vec![
            "what_s_in_it_for_me_learn_to_focus_in_a_distracted_world",
            "key_idea_1",
            "key_idea_2",
            "final_summary",
        ]
    );
    assert!(sections.iter().all(|s| s.path.starts_with("books/deep-work")));
}

#[cfg(feature = "markdown")]
#[test]
fn test_extract_reader_fixture_to_markdown() {
    let extractor = ContentExtractor::new(ExtractConfig::default(), Arc::new(HtmdConverter));
    let sections = extractor.extract(&Item::new("deep-work").unwrap(), &get_fixture("reader_page.html")).unwrap();

    assert!(sections[1].content.contains("## Key Idea 1"));
    assert!(sections[1].content.contains("Master hard things quickly."));
    assert!(sections[3].content.contains("## Final Summary"));
}

#[test]
fn test_extract_empty_reader_fixture() {
    let extractor = ContentExtractor::new(ExtractConfig::default(), Arc::new(PlainTextConverter));
    let sections = extractor
        .extract(&Item::new("unavailable-book").unwrap(), &get_fixture("empty_reader.html"))
        .unwrap();
    assert!(sections.is_empty());
}

#[tokio::test]
async fn test_end_to_end_markdown() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    mount_site(&server).await;

    let config = config_for(&server, &output, &["deep-work", "unavailable-book"]);
    let report = Orchestrator::from_config(&config)
        .unwrap()
        .run(&config.books)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.succeeded(), 2);

    let document = output.path().join("deep-work.md");
    let content = std::fs::read_to_string(&document).unwrap();
    let idea_1 = content.find("Key Idea 1").unwrap();
    let idea_2 = content.find("Key Idea 2").unwrap();
    let summary = content.find("Final Summary").unwrap();
    assert!(idea_1 < idea_2 && idea_2 < summary);

    assert!(!output.path().join("deep-work").exists());
    assert_eq!(std::fs::read_to_string(output.path().join("unavailable-book.md")).unwrap(), "");
}

#[cfg(feature = "pdf")]
#[tokio::test]
async fn test_end_to_end_pdf() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    mount_site(&server).await;

    let mut config = config_for(&server, &output, &["deep-work"]);
    config.format = DocumentFormat::Pdf;
    let report = Orchestrator::from_config(&config)
        .unwrap()
        .run(&config.books)
        .await
        .unwrap();

    let document = report.documents().next().unwrap();
    assert_eq!(document.path, output.path().join("deep-work.pdf"));
    assert!(std::fs::read(&document.path).unwrap().starts_with(b"%PDF"));
    assert!(!output.path().join("deep-work").exists());
}

#[tokio::test]
async fn test_rejected_login_aborts_run() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/en/books.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(get_fixture("login_page.html")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/mickey_mouse/setup"))
        .respond_with(ResponseTemplate::new(200).set_body_string(get_fixture("setup.json")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/en/nc/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Invalid email or password</html>"))
        .mount(&server)
        .await;

    let config = config_for(&server, &output, &["deep-work"]);
    let err = Orchestrator::from_config(&config)
        .unwrap()
        .run(&config.books)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(!output.path().join("deep-work.md").exists());
}

#[test]
fn test_config_builder_api() {
    let config = Config::builder("reader@example.com", "secret")
        .book("deep-work")
        .unwrap()
        .language("de")
        .failure_policy(FailurePolicy::CancelRemaining)
        .timeout_secs(30)
        .build();

    assert!(config.validate().is_ok());
    assert_eq!(config.timeout(), Some(std::time::Duration::from_secs(30)));
    assert!(Config::builder("u", "p").book("../etc").is_err());
}
