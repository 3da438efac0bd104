//! Integration tests for the gallery API client against a mock server.
//!
//! Covers the pagination walk, the failure-truncation policy, and the
//! slice-scoped metadata batching.

use da_export_core::api::{ApiError, Deviation, GalleryClient, fetch_all_pages, fetch_metadata};
use da_export_core::auth::AccessToken;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn deviation_json(id: &str) -> serde_json::Value {
    json!({
        "deviationid": id,
        "title": format!("Work {id}"),
        "content": {"src": format!("https://images.example/{id}.png")}
    })
}

fn client_for(server: &MockServer) -> GalleryClient {
    GalleryClient::with_base_url(AccessToken::new("test-token"), server.uri()).unwrap()
}

async fn mount_page(
    server: &MockServer,
    endpoint: &str,
    offset: u64,
    ids: &[&str],
    has_more: bool,
    next_offset: Option<u64>,
) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .and(query_param("username", "artist"))
        .and(query_param("offset", offset.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": ids.iter().map(|id| deviation_json(id)).collect::<Vec<_>>(),
            "has_more": has_more,
            "next_offset": next_offset,
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_pagination_walks_offsets_until_has_more_false() {
    let server = MockServer::start().await;
    mount_page(&server, "/gallery/all", 0, &["d1", "d2"], true, Some(24)).await;
    mount_page(&server, "/gallery/all", 24, &["d3"], true, Some(48)).await;
    mount_page(&server, "/gallery/all", 48, &["d4"], false, None).await;

    let client = client_for(&server);
    let items = fetch_all_pages(|offset| client.deviations("artist", None, offset)).await;

    let ids: Vec<&str> = items.iter().map(|d| d.deviationid.as_str()).collect();
    assert_eq!(ids, ["d1", "d2", "d3", "d4"]);
}

#[tokio::test]
async fn test_pagination_failure_truncates_without_retry() {
    let server = MockServer::start().await;
    mount_page(&server, "/gallery/all", 0, &["d1", "d2"], true, Some(24)).await;
    Mock::given(method("GET"))
        .and(path("/gallery/all"))
        .and(query_param("offset", "24"))
        .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
        .expect(1) // exactly one attempt: the failed page is not retried
        .mount(&server)
        .await;

    let client = client_for(&server);
    let items = fetch_all_pages(|offset| client.deviations("artist", None, offset)).await;

    let ids: Vec<&str> = items.iter().map(|d| d.deviationid.as_str()).collect();
    assert_eq!(ids, ["d1", "d2"], "items from successful pages are kept");
}

#[tokio::test]
async fn test_deviations_sends_bearer_token_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gallery/all"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("limit", "24"))
        .and(query_param("username", "artist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [deviation_json("d1")],
            "has_more": false,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let page = client.deviations("artist", None, 0).await.unwrap();
    assert_eq!(page.results.len(), 1);
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_deviations_folder_scope_selects_folder_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gallery/f123"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [deviation_json("d9")],
            "has_more": false,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let page = client
        .deviations("artist", Some("f123"), 0)
        .await
        .unwrap();
    assert_eq!(page.results[0].deviationid, "d9");
}

#[tokio::test]
async fn test_request_failed_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gallery/folders"))
        .respond_with(ResponseTemplate::new(404).set_body_string("user not found"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let error = client.folders("artist", 0).await.unwrap_err();

    match error {
        ApiError::RequestFailed { status, body, .. } => {
            assert_eq!(status, 404);
            assert!(body.contains("user not found"));
        }
        other => panic!("expected RequestFailed, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_folders_parse_nested_and_null_subfolders() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gallery/folders"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {
                    "folderid": "f1",
                    "name": "Featured",
                    "has_subfolders": true,
                    "subfolders": [
                        {"folderid": "f2", "name": "Old", "has_subfolders": false, "subfolders": null}
                    ]
                },
                {"folderid": "f3", "name": "Scraps", "has_subfolders": false, "subfolders": null}
            ],
            "has_more": false,
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let page = client.folders("artist", 0).await.unwrap();

    assert_eq!(page.results.len(), 2);
    assert_eq!(page.results[0].subfolders.len(), 1);
    assert_eq!(page.results[0].subfolders[0].folderid, "f2");
    assert!(page.results[1].subfolders.is_empty());
}

// ==================== Metadata Batching Tests ====================

/// Answers a metadata request with one entry per requested id.
struct EchoMetadata;

impl Respond for EchoMetadata {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let entries: Vec<serde_json::Value> = request
            .url
            .query_pairs()
            .filter(|(key, _)| key == "deviationids[]")
            .map(|(_, id)| {
                json!({
                    "deviationid": id,
                    "description": format!("<p>about {id}</p>"),
                })
            })
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({ "metadata": entries }))
    }
}

fn deviations(count: usize) -> Vec<Deviation> {
    (0..count)
        .map(|index| serde_json::from_value(deviation_json(&format!("d{index}"))).unwrap())
        .collect()
}

async fn metadata_request_sizes(server: &MockServer) -> Vec<usize> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == "/deviation/metadata")
        .map(|request| {
            request
                .url
                .query_pairs()
                .filter(|(key, _)| key == "deviationids[]")
                .count()
        })
        .collect()
}

#[tokio::test]
async fn test_metadata_batches_are_slice_scoped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/deviation/metadata"))
        .respond_with(EchoMetadata)
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let items = deviations(120);
    let metadata = fetch_metadata(&client, &items, 50).await;

    // Each request carries only its own chunk's ids.
    assert_eq!(metadata_request_sizes(&server).await, vec![50, 50, 20]);

    // The mapping covers every id present in the combined responses.
    assert_eq!(metadata.len(), 120);
    for item in &items {
        assert!(metadata.contains_key(&item.deviationid));
    }
}

#[tokio::test]
async fn test_metadata_normalizes_descriptions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/deviation/metadata"))
        .respond_with(EchoMetadata)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let items = deviations(1);
    let metadata = fetch_metadata(&client, &items, 50).await;

    let entry = &metadata["d0"];
    assert_eq!(entry.html, "<p>about d0</p>");
    assert_eq!(entry.text, "about d0");
}

#[tokio::test]
async fn test_metadata_failed_batch_is_skipped_not_retried() {
    let server = MockServer::start().await;
    // First chunk (d0, d1) fails; second chunk (d2, d3) succeeds.
    Mock::given(method("GET"))
        .and(path("/deviation/metadata"))
        .and(query_param("deviationids[]", "d0"))
        .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/deviation/metadata"))
        .and(query_param("deviationids[]", "d2"))
        .respond_with(EchoMetadata)
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let items = deviations(4);
    let metadata = fetch_metadata(&client, &items, 2).await;

    assert_eq!(metadata.len(), 2);
    assert!(!metadata.contains_key("d0"));
    assert!(!metadata.contains_key("d1"));
    assert!(metadata.contains_key("d2"));
    assert!(metadata.contains_key("d3"));
}

#[tokio::test]
async fn test_metadata_missing_description_gets_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/deviation/metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metadata": [{"deviationid": "d0"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let items = deviations(1);
    let metadata = fetch_metadata(&client, &items, 50).await;

    assert_eq!(metadata["d0"].html, "No Description");
    assert_eq!(metadata["d0"].text, "No Description");
}
