//! Integration tests for the harvester
//!
//! These tests use wiremock to stand up a fake catalog portal and run the
//! full harvest cycle end-to-end, from listing pages to the JSONL file.

use catalog_harvest::config::{Config, CrawlerConfig};
use catalog_harvest::crawler::{run_harvest, PaginationEnd};
use catalog_harvest::{FetchError, HarvestError, Record};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TAG: &str = "cassini";

/// Creates a test configuration pointing at the mock portal
fn create_test_config(base_url: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            base_url: base_url.to_string(),
            min_interval_ms: 10, // Very short for testing
            request_timeout_secs: 1,
            connect_timeout_secs: 1,
            follow_resources: false,
        },
        ..Config::default()
    }
}

fn listing_page(slugs: &[&str]) -> String {
    let items: String = slugs
        .iter()
        .map(|slug| {
            format!(
                r#"<li class="dataset-item"><h2 class="dataset-heading"><a href="/dataset/{slug}">{slug}</a></h2></li>"#
            )
        })
        .collect();

    format!(
        r#"<html><body>
        <ul class="dataset-list">{items}</ul>
        <a href="/dataset/?tags={TAG}&page=99">Next</a>
        </body></html>"#
    )
}

fn detail_page(title: &str) -> String {
    format!(
        r#"<html><body>
        <h1>  {title}  </h1>
        <div class="notes embedded-content"><p>First paragraph about {title}.</p><p>Second.</p></div>
        <ul class="tag-list"><li><a href="/dataset/?tags=cassini">cassini</a></li><li><a href="/dataset/?tags=saturn">saturn</a></li></ul>
        <section id="dataset-resources">
          <a href="/dataset/{title}/resource/r1">Data</a>
          <a href="https://pds.nasa.gov/{title}.tar">Mirror</a>
        </section>
        <table><tr><th>Landing Page</th><td><a href="https://pds.nasa.gov/{title}">pds</a></td></tr></table>
        </body></html>"#
    )
}

async fn mount_listing(server: &MockServer, page: u32, slugs: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/dataset/"))
        .and(query_param("tags", TAG))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(slugs)))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, slug: &str, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/dataset/{}", slug)))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(slug)))
        .expect(expected_hits)
        .mount(server)
        .await;
}

fn read_records(path: &Path) -> Vec<Record> {
    let content = std::fs::read_to_string(path).expect("Failed to read output");
    content
        .lines()
        .map(|line| serde_json::from_str(line).expect("Line is not a valid record"))
        .collect()
}

#[tokio::test]
async fn test_full_harvest_writes_one_line_per_dataset() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_listing(&server, 1, &["cassini-uvis", "cassini-iss"]).await;
    mount_listing(&server, 2, &["cassini-rss"]).await;
    mount_listing(&server, 3, &[]).await;
    for slug in ["cassini-uvis", "cassini-iss", "cassini-rss"] {
        mount_detail(&server, slug, 1).await;
    }

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let out = temp_dir.path().join("datasets.jsonl");

    let report = run_harvest(&create_test_config(&base), TAG, &out)
        .await
        .expect("Harvest failed");

    assert_eq!(report.listing_pages_fetched, 3);
    assert_eq!(report.records_written, 3);
    assert!(report.detail_failures.is_empty());
    assert_eq!(
        report.pagination_end,
        Some(PaginationEnd::Exhausted { empty_page: 3 })
    );

    let records = read_records(&out);
    assert_eq!(records.len(), 3);

    // Output order follows crawl order
    let urls: Vec<&str> = records.iter().map(|r| r.dataset_url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/dataset/cassini-uvis", base),
            format!("{}/dataset/cassini-iss", base),
            format!("{}/dataset/cassini-rss", base),
        ]
    );

    let first = &records[0];
    assert_eq!(first.title, "cassini-uvis");
    assert_eq!(
        first.description,
        "First paragraph about cassini-uvis.\n\nSecond."
    );
    assert_eq!(first.tags, vec!["cassini", "saturn"]);
    assert_eq!(
        first.resource_links,
        vec![
            format!("{}/dataset/cassini-uvis/resource/r1", base),
            "https://pds.nasa.gov/cassini-uvis.tar".to_string(),
        ]
    );
    assert_eq!(
        first.landing_page.as_deref(),
        Some("https://pds.nasa.gov/cassini-uvis")
    );
    assert_eq!(first.text_sources, vec![first.dataset_url.clone()]);
}

#[tokio::test]
async fn test_duplicates_across_pages_fetched_once() {
    let server = MockServer::start().await;

    mount_listing(&server, 1, &["alpha", "beta"]).await;
    mount_listing(&server, 2, &["beta", "gamma", "alpha"]).await;
    mount_listing(&server, 3, &[]).await;
    // Each detail page must be requested exactly once
    for slug in ["alpha", "beta", "gamma"] {
        mount_detail(&server, slug, 1).await;
    }

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let out = temp_dir.path().join("datasets.jsonl");

    let report = run_harvest(&create_test_config(&server.uri()), TAG, &out)
        .await
        .expect("Harvest failed");

    assert_eq!(report.detail_urls_discovered, 5);
    assert_eq!(report.duplicates_skipped, 2);
    assert_eq!(read_records(&out).len(), 3);
}

#[tokio::test]
async fn test_detail_failures_are_skipped() {
    let server = MockServer::start().await;

    mount_listing(&server, 1, &["ok-1", "broken", "slow", "ok-2"]).await;
    mount_listing(&server, 2, &[]).await;
    mount_detail(&server, "ok-1", 1).await;
    mount_detail(&server, "ok-2", 1).await;

    Mock::given(method("GET"))
        .and(path("/dataset/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dataset/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page("slow"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let out = temp_dir.path().join("datasets.jsonl");

    let report = run_harvest(&create_test_config(&server.uri()), TAG, &out)
        .await
        .expect("Detail failures must not fail the run");

    assert_eq!(report.records_written, 2);
    assert_eq!(report.detail_failures.len(), 2);
    assert_eq!(report.detail_failures[0].error, FetchError::HttpStatus(500));
    assert_eq!(report.detail_failures[1].error, FetchError::Timeout);

    let titles: Vec<String> = read_records(&out).into_iter().map(|r| r.title).collect();
    assert_eq!(titles, vec!["ok-1", "ok-2"]);
}

#[tokio::test]
async fn test_listing_failure_halts_pagination() {
    let server = MockServer::start().await;

    mount_listing(&server, 1, &["first"]).await;
    mount_detail(&server, "first", 1).await;

    Mock::given(method("GET"))
        .and(path("/dataset/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    // Page 3 exists, but pagination must never reach it
    Mock::given(method("GET"))
        .and(path("/dataset/"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["third"])))
        .expect(0)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let out = temp_dir.path().join("datasets.jsonl");

    let report = run_harvest(&create_test_config(&server.uri()), TAG, &out)
        .await
        .expect("A listing failure still ends the run normally");

    assert_eq!(report.records_written, 1);
    assert_eq!(
        report.pagination_end,
        Some(PaginationEnd::ListingFailed {
            page: 2,
            error: FetchError::HttpStatus(500),
        })
    );
    assert_eq!(read_records(&out).len(), 1);
}

#[tokio::test]
async fn test_appends_to_existing_output() {
    let server = MockServer::start().await;

    mount_listing(&server, 1, &["fresh"]).await;
    mount_listing(&server, 2, &[]).await;
    mount_detail(&server, "fresh", 1).await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let out = temp_dir.path().join("datasets.jsonl");

    let mut previous = Record::new("https://data.nasa.gov/dataset/old");
    previous.title = "Old".to_string();
    let existing = format!("{}\n", serde_json::to_string(&previous).unwrap());
    std::fs::write(&out, &existing).expect("Failed to seed output");

    run_harvest(&create_test_config(&server.uri()), TAG, &out)
        .await
        .expect("Harvest failed");

    let content = std::fs::read_to_string(&out).unwrap();
    assert!(content.starts_with(&existing));

    let records = read_records(&out);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], previous);
    assert_eq!(records[1].title, "fresh");
}

#[tokio::test]
async fn test_follow_resources_adds_provenance() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_listing(&server, 1, &["uvis"]).await;
    mount_listing(&server, 2, &[]).await;
    mount_detail(&server, "uvis", 1).await;

    Mock::given(method("GET"))
        .and(path("/dataset/uvis/resource/r1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<p class="text-muted"><a href="https://pds.nasa.gov/uvis/data.csv">URL</a></p>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&base);
    config.crawler.follow_resources = true;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let out = temp_dir.path().join("datasets.jsonl");

    let report = run_harvest(&config, TAG, &out).await.expect("Harvest failed");
    assert_eq!(report.resource_pages_fetched, 1);

    let records = read_records(&out);
    let record = &records[0];
    assert_eq!(
        record.text_sources,
        vec![
            format!("{}/dataset/uvis", base),
            format!("{}/dataset/uvis/resource/r1", base),
        ]
    );
    assert!(record
        .resource_links
        .contains(&"https://pds.nasa.gov/uvis/data.csv".to_string()));
}

#[tokio::test]
async fn test_unwritable_output_is_a_setup_error() {
    let server = MockServer::start().await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let out = temp_dir.path().join("missing-dir").join("datasets.jsonl");

    let result = run_harvest(&create_test_config(&server.uri()), TAG, &out).await;

    assert!(matches!(result, Err(HarvestError::Sink(_))));
    // Nothing was requested before the sink failed to open
    let received = server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}
