//! Integration tests for the crawl pipelines
//!
//! These tests use wiremock to stand in for the solver service and test
//! the full session -> crawl -> output cycle end-to-end.

use rental_harvest::config::Config;
use rental_harvest::output::write_links;
use rental_harvest::pipeline::{self, LISTINGS_FILE};
use rental_harvest::{HarvestError, Listing, Property, SolverError};
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SITE: &str = "https://www.example.com";
const LISTING_SEARCH: &str = "https://www.example.com/rent";
const PROPERTY_SEARCH: &str = "https://www.example.com/condo-directory";

/// Creates a test configuration pointing at the mock solver and a temp directory
fn create_test_config(solver_url: &str, output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.solver.endpoint = Some(solver_url.to_string());
    config.solver.max_timeout_ms = 1000;
    config.solver.http_timeout_secs = 5;
    config.crawler.concurrency = 2;
    config.target.site_url = SITE.to_string();
    config.target.listing_search_url = LISTING_SEARCH.to_string();
    config.target.property_search_url = PROPERTY_SEARCH.to_string();
    config.output.directory = output_dir.display().to_string();
    config.output.links_file = output_dir.join("property-links.txt").display().to_string();
    config
}

/// Expects `sessions` create/destroy pairs
async fn mount_session(server: &MockServer, sessions: u64) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"cmd": "sessions.create"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "message": "Session created successfully.",
            "session": "it-session"
        })))
        .expect(sessions)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"cmd": "sessions.destroy", "session": "it-session"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "message": "The session has been removed."
        })))
        .expect(sessions)
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, url: &str, html: String) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "cmd": "request.get",
            "url": url,
            "session": "it-session"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "message": "Challenge not detected!",
            "solution": {"url": url, "status": 200, "response": html, "cookies": []}
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_solver_timeout(server: &MockServer, url: &str) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"cmd": "request.get", "url": url})))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "status": "error",
            "message": "Error: Error solving the challenge. Timeout after 1.0 seconds."
        })))
        .mount(server)
        .await;
}

fn listing_page(ids: &[u32]) -> String {
    let cards: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<div class="listing-card">
                     <div class="header-wrapper"><div class="header-container">
                       <a class="nav-link" href="/property-listing/unit-{id}" title="Unit {id}">Unit {id}</a>
                     </div></div>
                     <p class="listing-location"><span>Jalan Ampang, Kuala Lumpur</span></p>
                     <ul class="listing-features">
                       <li class="list-price"><span class="currency">RM</span><span class="price">3,500</span><span class="period">/mo</span></li>
                       <li class="listing-rooms"><span class="bed" title="2 Beds"></span><span class="bath" title="2 Baths"></span></li>
                       <li class="listing-floorarea">3.50 psf</li>
                       <li class="listing-floorarea">1,000 sqft</li>
                     </ul>
                   </div>"#,
                id = id
            )
        })
        .collect();
    format!(r#"<html><body><div id="listings-container">{}</div></body></html>"#, cards)
}

fn detail_page(name: &str) -> String {
    format!(
        r#"<html><body><div id="wrapper">
             <div class="container"><ol class="breadcrumb">
               <li><a href="/"><span>Home</span></a></li>
               <li><a href="/kl"><span>Kuala Lumpur</span></a></li>
               <li><a href="/kl/ampang"><span>Ampang</span></a></li>
               <li><a href="/p"><span>{name}</span></a></li>
             </ol></div>
             <div class="listing-details-primary"><table><tbody>
               <tr class="property-attr">
                 <td class="label-block"><h4 class="label-block">Project Name</h4></td>
                 <td class="value-block">{name}</td>
               </tr>
             </tbody></table></div>
             <div id="map"><meta itemprop="latitude" content="3.159"><meta itemprop="longitude" content="101.73"></div>
           </div></body></html>"#,
        name = name
    )
}

fn search_page(paths: &[&str]) -> String {
    let items: String = paths
        .iter()
        .map(|p| format!(r#"<div class="header-container"><h3><a class="nav-link" href="{}">x</a></h3></div>"#, p))
        .collect();
    format!(r#"<html><body><div class="main-content">{}</div></body></html>"#, items)
}

fn link(slug: &str) -> String {
    format!("{}/project/{}", SITE, slug)
}

fn written_properties(dir: &Path) -> Vec<Property> {
    let file = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .find(|path| {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            name.starts_with("properties-") && name.ends_with(".json")
        })
        .expect("properties output file");
    serde_json::from_str(&std::fs::read_to_string(file).unwrap()).unwrap()
}

#[tokio::test]
async fn test_listing_pipeline_writes_all_cards() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    mount_session(&server, 1).await;
    mount_page(&server, LISTING_SEARCH, listing_page(&[1, 2])).await;
    mount_page(&server, &format!("{}/2", LISTING_SEARCH), listing_page(&[3])).await;

    let config = create_test_config(&server.uri(), temp_dir.path());
    let listings = pipeline::scrape_listings(&config, 2).await.unwrap();
    assert_eq!(listings.len(), 3);

    let written: Vec<Listing> = serde_json::from_str(
        &std::fs::read_to_string(temp_dir.path().join(LISTINGS_FILE)).unwrap(),
    )
    .unwrap();
    assert_eq!(written.len(), 3);
    for listing in &written {
        assert!(listing.link.starts_with("https://www.example.com/property-listing/unit-"));
        assert_eq!(listing.price, 3500);
        assert_eq!(listing.currency, "RM");
        assert_eq!(listing.psf, 3.5);
        assert_eq!(listing.area, "1,000 sqft");
        assert_eq!(listing.amenities.bedrooms, 2);
        assert_eq!(listing.amenities.bathrooms, 2);
    }
}

#[tokio::test]
async fn test_property_pipeline_skips_timed_out_link() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    mount_session(&server, 1).await;
    mount_page(&server, &link("one"), detail_page("One")).await;
    mount_solver_timeout(&server, &link("two")).await;
    mount_page(&server, &link("three"), detail_page("Three")).await;

    let config = create_test_config(&server.uri(), temp_dir.path());
    let properties = pipeline::scrape_properties(&config, vec![link("one"), link("two"), link("three")])
        .await
        .unwrap();
    assert_eq!(properties.len(), 2);

    let mut written = written_properties(temp_dir.path());
    written.sort_by(|a, b| a.name.cmp(&b.name));
    assert_eq!(written.len(), 2);
    assert_eq!(written[0].name, "One");
    assert_eq!(written[0].region, "Kuala Lumpur");
    assert_eq!(written[0].district, "Ampang");
    assert_eq!(written[1].name, "Three");
    assert_eq!(written[1].link, link("three"));
}

#[tokio::test]
async fn test_link_discovery_then_property_crawl() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    mount_session(&server, 2).await;
    mount_page(&server, &format!("{}/2", PROPERTY_SEARCH), search_page(&["/project/one"])).await;
    mount_page(&server, &format!("{}/3", PROPERTY_SEARCH), search_page(&["/project/two"])).await;
    mount_page(&server, &link("one"), detail_page("One")).await;
    mount_page(&server, &link("two"), detail_page("Two")).await;

    let config = create_test_config(&server.uri(), temp_dir.path());

    let links = pipeline::discover_links(&config, 2, 4).await.unwrap();
    assert_eq!(links, vec![link("one"), link("two")]);

    let link_file = std::fs::read_to_string(&config.output.links_file).unwrap();
    assert_eq!(link_file, format!("{}\n{}\n", link("one"), link("two")));

    let properties = pipeline::scrape_properties_from_file(&config).await.unwrap();
    assert_eq!(properties.len(), 2);
}

#[tokio::test]
async fn test_session_failure_aborts_before_crawling() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"cmd": "sessions.create"})))
        .respond_with(ResponseTemplate::new(500).set_body_string("solver is down"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"cmd": "request.get"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), temp_dir.path());
    let result = pipeline::scrape_listings(&config, 3).await;

    assert!(matches!(
        result,
        Err(HarvestError::Solver(SolverError::Protocol(_)))
    ));
    assert!(!temp_dir.path().join(LISTINGS_FILE).exists());
}

#[tokio::test]
async fn test_unreachable_solver_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config("http://127.0.0.1:1", temp_dir.path());

    let result = pipeline::scrape_listings(&config, 1).await;

    assert!(matches!(
        result,
        Err(HarvestError::Solver(SolverError::Unreachable { .. }))
    ));
}

#[tokio::test]
async fn test_all_pages_failing_still_writes_empty_output() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    mount_session(&server, 1).await;
    mount_solver_timeout(&server, LISTING_SEARCH).await;

    let config = create_test_config(&server.uri(), temp_dir.path());
    let listings = pipeline::scrape_listings(&config, 1).await.unwrap();

    assert!(listings.is_empty());
    let written = std::fs::read_to_string(temp_dir.path().join(LISTINGS_FILE)).unwrap();
    assert_eq!(written.trim(), "[]");
}

#[tokio::test]
async fn test_listing_output_uploaded_to_bucket() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    mount_session(&server, 1).await;
    mount_page(&server, LISTING_SEARCH, listing_page(&[7])).await;

    Mock::given(method("PUT"))
        .and(path("/bucket/listings.json"))
        .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"listings\""))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri(), temp_dir.path());
    config.output.bucket_url = Some(format!("{}/bucket", server.uri()));

    let listings = pipeline::scrape_listings(&config, 1).await.unwrap();
    assert_eq!(listings.len(), 1);
    assert!(!temp_dir.path().join(LISTINGS_FILE).exists());
}

#[tokio::test]
async fn test_property_output_uploaded_and_kept_locally() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    mount_session(&server, 1).await;
    mount_page(&server, &link("one"), detail_page("One")).await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/bucket/properties-\d+\.json$"))
        .respond_with(ResponseTemplate::new(201).insert_header("ETag", "\"properties\""))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri(), temp_dir.path());
    config.output.bucket_url = Some(format!("{}/bucket", server.uri()));

    let properties = pipeline::scrape_properties(&config, vec![link("one")]).await.unwrap();
    assert_eq!(properties.len(), 1);

    let local = written_properties(temp_dir.path());
    assert_eq!(local, properties);
}

#[tokio::test]
async fn test_missing_link_file_fails_before_session() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), temp_dir.path());
    let result = pipeline::scrape_properties_from_file(&config).await;

    assert!(matches!(result, Err(HarvestError::Output(_))));
}

#[tokio::test]
async fn test_link_file_blank_lines_are_ignored() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    mount_session(&server, 1).await;
    mount_page(&server, &link("one"), detail_page("One")).await;

    let config = create_test_config(&server.uri(), temp_dir.path());
    write_links(
        Path::new(&config.output.links_file),
        &[link("one"), String::new(), "   ".to_string(), link("one")],
    )
    .await
    .unwrap();

    let properties = pipeline::scrape_properties_from_file(&config).await.unwrap();
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0].link, link("one"));
}
