//! Integration tests for the search engine
//!
//! These tests use wiremock to stand in for pharmacy websites and run the
//! full fetch → extract → match → merge cycle end-to-end over HTTP.

use medprice::catalog::SourceCatalog;
use medprice::config::Config;
use medprice::scrape::{FetchError, Fetcher, HttpFetcher};
use medprice::{Aggregator, SearchError};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Catalog with three pharmacies on the mock server; "gamma" is disabled
fn catalog_json(base_url: &str) -> String {
    format!(
        r#"{{
            "alpha": {{
                "urlTemplate": "{base}/alpha/search?q={{query}}",
                "nameClass": "product-title",
                "priceClass": "product-price",
                "linkBaseUrl": "{base}",
                "enabled": true
            }},
            "beta": {{
                "urlTemplate": "{base}/beta/find/{{query}}",
                "nameClass": "med-name",
                "priceClass": "med-cost",
                "linkSelector": "a.buy",
                "linkBaseUrl": "https://beta.example",
                "enabled": true
            }},
            "gamma": {{
                "urlTemplate": "{base}/gamma?term={{query}}",
                "nameClass": "name",
                "priceClass": "price",
                "enabled": false
            }}
        }}"#,
        base = base_url
    )
}

const ALPHA_PAGE: &str = r#"<html><body>
    <div class="grid">
        <div class="tile"><a href="/alpha/p/101"><span class="product-title">Paracetamol 500mg Tablet</span></a><span class="product-price">₹ 24.50</span></div>
        <div class="tile"><a href="/alpha/p/102"><span class="product-title">Ibuprofen 400mg</span></a><span class="product-price">₹ 31.00</span></div>
        <div class="tile"><a href="/alpha/p/103"><span class="product-title">Paracetamol Infusion 100ml</span></a><span class="product-price">Rs. 1,150.00</span></div>
    </div>
</body></html>"#;

// Names and prices live in sibling columns here
const BETA_PAGE: &str = r#"<html><body>
    <ul class="names">
        <li><span class="med-name">Paracetmol 650</span><a class="buy" href="/buy/650">Buy</a></li>
        <li><span class="med-name">Cetirizine 10mg</span><a class="buy" href="/buy/cet">Buy</a></li>
    </ul>
    <ul class="prices">
        <li class="med-cost">Rs. 33</li>
        <li class="med-cost">Rs. 18</li>
    </ul>
</body></html>"#;

fn test_config() -> Config {
    let mut config = Config::default();
    config.engine.backoff_unit_ms = 10;
    config.engine.request_timeout_secs = 5;
    config
}

fn build_aggregator(catalog: SourceCatalog) -> Aggregator {
    let config = test_config();
    let fetcher =
        HttpFetcher::new(config.engine.request_timeout()).expect("Failed to build client");
    Aggregator::new(catalog, Arc::new(fetcher), &config)
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .and(header_exists("user-agent"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_search_across_sources() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/alpha/search"))
        .and(query_param("q", "paracetamol"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ALPHA_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/beta/find/paracetamol", BETA_PAGE, 1).await;
    mount_page(&mock_server, "/gamma", "<p class=\"name\">Paracetamol</p>", 0).await;

    let catalog = SourceCatalog::from_json_str(&catalog_json(&base_url));
    let aggregator = build_aggregator(catalog);

    let records = aggregator
        .search("paracetamol")
        .await
        .expect("Search failed");

    assert_eq!(records.len(), 3, "unexpected records: {:?}", records);

    // Alpha first (catalog order), exact containment, page order among ties
    assert_eq!(records[0].source_id, "alpha");
    assert_eq!(records[0].drug_name, "Paracetamol 500mg Tablet");
    assert_eq!(records[0].price, "24.50");
    assert_eq!(
        records[0].link.as_deref(),
        Some(format!("{}/alpha/p/101", base_url).as_str())
    );
    assert_eq!(records[1].drug_name, "Paracetamol Infusion 100ml");
    assert_eq!(records[1].price, "1150.00");

    // Beta: fuzzy match, positional price, link via linkSelector + base URL
    assert_eq!(records[2].source_id, "beta");
    assert_eq!(records[2].drug_name, "Paracetmol 650");
    assert_eq!(records[2].price, "33");
    assert_eq!(
        records[2].link.as_deref(),
        Some("https://beta.example/buy/650")
    );

    assert!(records.iter().all(|r| !r.image_url.is_empty()));
}

#[tokio::test]
async fn test_catalog_loaded_from_file() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/alpha/search", ALPHA_PAGE, 1).await;
    mount_page(&mock_server, "/beta/find/ibuprofen", BETA_PAGE, 1).await;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(catalog_json(&mock_server.uri()).as_bytes())
        .unwrap();
    let catalog = SourceCatalog::load(file.path());
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.enabled_sources().count(), 2);

    let records = build_aggregator(catalog)
        .search("ibuprofen")
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].drug_name, "Ibuprofen 400mg");
    assert_eq!(records[0].price, "31.00");
}

#[tokio::test]
async fn test_repeated_query_served_from_cache() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/alpha/search", ALPHA_PAGE, 1).await;
    mount_page(&mock_server, "/beta/find/paracetamol", BETA_PAGE, 1).await;

    let aggregator =
        build_aggregator(SourceCatalog::from_json_str(&catalog_json(&mock_server.uri())));

    let first = aggregator.search("paracetamol").await.unwrap();
    let second = aggregator.search("PARACETAMOL").await.unwrap();

    assert_eq!(first, second);
    // Mock expectations (one call per source) are verified when the server drops
}

#[tokio::test]
async fn test_failing_source_is_retried_then_isolated() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/alpha/search", ALPHA_PAGE, 1).await;
    Mock::given(method("GET"))
        .and(path("/beta/find/paracetamol"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let aggregator =
        build_aggregator(SourceCatalog::from_json_str(&catalog_json(&mock_server.uri())));

    let records = aggregator.search("paracetamol").await.unwrap();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.source_id == "alpha"));
}

#[tokio::test]
async fn test_no_relevant_listings_is_not_an_error() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/alpha/search", ALPHA_PAGE, 1).await;
    mount_page(&mock_server, "/beta/find/xyz", BETA_PAGE, 1).await;

    let aggregator =
        build_aggregator(SourceCatalog::from_json_str(&catalog_json(&mock_server.uri())));

    assert_eq!(aggregator.search("xyz").await, Ok(Vec::new()));
}

#[tokio::test]
async fn test_blank_query_makes_no_requests() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let aggregator =
        build_aggregator(SourceCatalog::from_json_str(&catalog_json(&mock_server.uri())));

    assert_eq!(aggregator.search("   ").await, Err(SearchError::EmptyQuery));
}

#[tokio::test]
async fn test_missing_catalog_reports_configuration_error() {
    let aggregator = build_aggregator(SourceCatalog::load(std::path::Path::new(
        "/nonexistent/pharmacies.json",
    )));

    let error = aggregator.search("dolo").await.unwrap_err();
    assert!(matches!(error, SearchError::CatalogUnavailable { .. }));
    assert_ne!(error, SearchError::EmptyQuery);
}

#[tokio::test]
async fn test_fetcher_classifies_non_success_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let result = fetcher
        .fetch(&format!("{}/missing", mock_server.uri()))
        .await;

    assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
}

#[tokio::test]
async fn test_fetcher_classifies_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(Duration::from_millis(300)).unwrap();
    let result = fetcher.fetch(&format!("{}/slow", mock_server.uri())).await;

    assert!(matches!(result, Err(FetchError::Timeout { .. })));
}

#[tokio::test]
async fn test_fetcher_classifies_connection_failure() {
    // Bind then drop a listener so the port is known to be closed
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();
    let result = fetcher.fetch(&format!("http://127.0.0.1:{}/", port)).await;

    assert!(matches!(result, Err(FetchError::Connection { .. })));
}
