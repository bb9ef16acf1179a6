//! Tests for the pagination driver

use super::*;
use crate::config::ConnectorConfig;
use crate::resource::{Boards, Record, Resource};
use crate::schema::Schema;
use pretty_assertions::assert_eq;
use serde_json::{json, Map};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(uri: &str) -> ConnectorConfig {
    ConnectorConfig::new("test-token")
        .with_api_url(format!("{uri}/v2"))
        .with_board_limit(2)
}

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        factor: 2,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
    }
}

async fn mount_boards_page(server: &MockServer, page: i64, ids: &[&str]) {
    let rows: Vec<_> = ids
        .iter()
        .map(|id| json!({ "id": id, "items": [] }))
        .collect();
    Mock::given(method("POST"))
        .and(path("/v2"))
        .and(body_partial_json(json!({ "variables": { "page": page } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "boards": rows }
        })))
        .mount(server)
        .await;
}

#[test]
fn test_page_token_sequence() {
    let first = PageToken::first();
    assert_eq!(first.page(), 1);
    assert_eq!(first.next().page(), 2);
    assert_eq!(first.next(), PageToken::first().next());
    assert_ne!(first, first.next());
    assert_eq!(first.to_string(), "1");
}

#[test]
fn test_context_accessors() {
    let context = Context::root().with("board_id", 42);
    assert!(!context.is_root());
    assert!(Context::root().is_root());
    assert_eq!(context.require_i64("board_id").unwrap(), 42);
    assert!(matches!(
        context.require_i64("item_id").unwrap_err(),
        Error::MissingContextKey { ref key } if key == "item_id"
    ));
    assert_eq!(context.get("board_id"), Some(&json!(42)));
}

#[tokio::test]
async fn test_driver_emits_all_pages_in_order() {
    let server = MockServer::start().await;
    mount_boards_page(&server, 1, &["1", "2"]).await;
    mount_boards_page(&server, 2, &["3"]).await;
    mount_boards_page(&server, 3, &[]).await;

    let config = test_config(&server.uri());
    let client = GraphqlClient::new(&config).unwrap();
    let retry = fast_retry(3);
    let driver = PageDriver::new(&client, &retry, &config);

    let records = driver
        .read_records(&Boards, &Context::root())
        .await
        .unwrap();

    let ids: Vec<_> = records.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
}

#[tokio::test]
async fn test_driver_terminates_on_empty_first_page() {
    let server = MockServer::start().await;
    mount_boards_page(&server, 1, &[]).await;

    let config = test_config(&server.uri());
    let client = GraphqlClient::new(&config).unwrap();
    let retry = fast_retry(3);
    let driver = PageDriver::new(&client, &retry, &config);

    let records = driver
        .read_records(&Boards, &Context::root())
        .await
        .unwrap();
    assert!(records.is_empty());

    // Exactly one request: the empty page is processed and the sequence ends.
    assert_eq!(client.cost().snapshot().graphql_calls, 1);
}

#[tokio::test]
async fn test_client_error_is_fatal_without_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let client = GraphqlClient::new(&config).unwrap();
    let retry = fast_retry(5);
    let driver = PageDriver::new(&client, &retry, &config);

    let err = driver
        .read_records(&Boards, &Context::root())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_server_error_retried_then_escalated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let client = GraphqlClient::new(&config).unwrap();
    let retry = fast_retry(3);
    let driver = PageDriver::new(&client, &retry, &config);

    let err = driver
        .read_records(&Boards, &Context::root())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::MaxRetriesExceeded { max_retries: 3, .. }
    ));
}

#[tokio::test]
async fn test_server_error_recovers_within_cap() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_boards_page(&server, 1, &[]).await;

    let config = test_config(&server.uri());
    let client = GraphqlClient::new(&config).unwrap();
    let retry = fast_retry(5);
    let driver = PageDriver::new(&client, &retry, &config);

    let records = driver
        .read_records(&Boards, &Context::root())
        .await
        .unwrap();
    assert!(records.is_empty());
    assert_eq!(client.cost().snapshot().graphql_calls, 3);
}

#[tokio::test]
async fn test_connection_drop_restarts_from_first_page() {
    // Reserve a port, then free it so the first attempts are refused.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ConnectorConfig::new("test-token")
        .with_api_url(format!("http://{addr}/v2"))
        .with_board_limit(2);
    let retry = RetryPolicy {
        max_attempts: 3,
        factor: 2,
        initial_backoff: Duration::from_millis(200),
        max_backoff: Duration::from_millis(400),
    };

    // Bring the API up on the reserved port while the driver is waiting out
    // its restart backoff.
    let server = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let listener = std::net::TcpListener::bind(addr).unwrap();
        let server = MockServer::builder().listener(listener).start().await;
        mount_boards_page(&server, 1, &["1"]).await;
        mount_boards_page(&server, 2, &[]).await;
        server
    });

    let client = GraphqlClient::new(&config).unwrap();
    let driver = PageDriver::new(&client, &retry, &config);
    let records = driver
        .read_records(&Boards, &Context::root())
        .await
        .unwrap();
    let _server = server.await.unwrap();

    let ids: Vec<_> = records.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(1)]);

    // At least one refused attempt preceded the two-page clean pass.
    assert!(client.cost().snapshot().graphql_calls >= 3);
}

/// A resource whose connection drops once while reading the second page.
struct DropsSecondPageOnce {
    dropped: std::sync::atomic::AtomicBool,
}

impl DropsSecondPageOnce {
    fn new() -> Self {
        Self {
            dropped: std::sync::atomic::AtomicBool::new(false),
        }
    }
}

impl Resource for DropsSecondPageOnce {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn query(&self) -> &'static str {
        "query ($page: Int!) { rows { id } }"
    }

    fn schema(&self) -> Schema {
        Schema::builder().build()
    }

    fn request_variables(
        &self,
        _context: &Context,
        token: Option<PageToken>,
        _config: &ConnectorConfig,
    ) -> Result<Map<String, Value>> {
        let mut variables = Map::new();
        variables.insert(
            "page".to_string(),
            json!(token.unwrap_or_else(PageToken::first).page()),
        );
        Ok(variables)
    }

    fn extract_records(&self, payload: &Value) -> Result<Vec<Record>> {
        let rows = payload["data"]["rows"].as_array().cloned().unwrap_or_default();
        let on_second_page = rows.first().and_then(|r| r["id"].as_i64()) == Some(2);
        if on_second_page
            && !self
                .dropped
                .swap(true, std::sync::atomic::Ordering::SeqCst)
        {
            return Err(Error::connection("connection reset by peer"));
        }
        Ok(rows.iter().filter_map(|r| r.as_object().cloned()).collect())
    }

    fn next_page_token(&self, payload: &Value, previous: Option<PageToken>) -> Option<PageToken> {
        let current = previous.unwrap_or_else(PageToken::first);
        let non_empty = payload["data"]["rows"]
            .as_array()
            .is_some_and(|rows| !rows.is_empty());
        non_empty.then(|| current.next())
    }
}

async fn mount_rows_page(server: &MockServer, page: i64, ids: &[i64]) {
    let rows: Vec<_> = ids.iter().map(|id| json!({ "id": id })).collect();
    Mock::given(method("POST"))
        .and(path("/v2"))
        .and(body_partial_json(json!({ "variables": { "page": page } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "rows": rows }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_mid_sequence_drop_discards_partial_records() {
    let server = MockServer::start().await;
    mount_rows_page(&server, 1, &[1]).await;
    mount_rows_page(&server, 2, &[2]).await;
    mount_rows_page(&server, 3, &[]).await;

    let config = test_config(&server.uri());
    let client = GraphqlClient::new(&config).unwrap();
    let retry = fast_retry(3);
    let driver = PageDriver::new(&client, &retry, &config);

    let records = driver
        .read_records(&DropsSecondPageOnce::new(), &Context::root())
        .await
        .unwrap();

    // The first pass dies on page 2; the second pass re-reads page 1, so
    // record 1 appears exactly once.
    let ids: Vec<_> = records.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(2)]);

    // Pass one issues 2 calls, the clean pass issues 3.
    assert_eq!(client.cost().snapshot().graphql_calls, 5);
}

/// A resource whose token computation is stuck on the same page.
struct LoopingResource;

impl Resource for LoopingResource {
    fn name(&self) -> &'static str {
        "looping"
    }

    fn query(&self) -> &'static str {
        "query { rows { id } }"
    }

    fn schema(&self) -> Schema {
        Schema::builder().build()
    }

    fn extract_records(&self, payload: &Value) -> Result<Vec<Record>> {
        Ok(payload["data"]["rows"]
            .as_array()
            .map(|rows| {
                rows.iter()
                    .filter_map(|r| r.as_object().cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn next_page_token(&self, _payload: &Value, _previous: Option<PageToken>) -> Option<PageToken> {
        Some(PageToken::first())
    }
}

#[tokio::test]
async fn test_loop_guard_aborts_on_repeated_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "rows": [{ "id": 1 }] }
        })))
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let client = GraphqlClient::new(&config).unwrap();
    let retry = fast_retry(3);
    let driver = PageDriver::new(&client, &retry, &config);

    let err = driver
        .read_records(&LoopingResource, &Context::root())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::PaginationLoop { ref token } if token == "1"));
    // The first pass has no prior token; the guard trips on the second.
    assert_eq!(client.cost().snapshot().graphql_calls, 2);
}

/// Variables builder failures surface before any request is issued.
struct BrokenVariablesResource;

impl Resource for BrokenVariablesResource {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn query(&self) -> &'static str {
        "query { rows { id } }"
    }

    fn schema(&self) -> Schema {
        Schema::builder().build()
    }

    fn request_variables(
        &self,
        context: &Context,
        _token: Option<PageToken>,
        _config: &ConnectorConfig,
    ) -> Result<Map<String, Value>> {
        context.require_i64("board_id")?;
        Ok(Map::new())
    }

    fn extract_records(&self, _payload: &Value) -> Result<Vec<Record>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_missing_context_key_is_fatal() {
    let server = MockServer::start().await;

    let config = test_config(&server.uri());
    let client = GraphqlClient::new(&config).unwrap();
    let retry = fast_retry(3);
    let driver = PageDriver::new(&client, &retry, &config);

    let err = driver
        .read_records(&BrokenVariablesResource, &Context::root())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingContextKey { .. }));
    assert_eq!(client.cost().snapshot().graphql_calls, 0);
}
