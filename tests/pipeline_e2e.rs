//! End-to-end pipeline tests against stub HTTP servers.
//!
//! Both external collaborators are stubbed with wiremock: the lookup endpoint
//! and the Telegram notification channel. Each test runs the full pipeline
//! through `Pipeline::run` with a real CSV input in a temp directory.

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use rowfetch::config::{FetchConfig, LookupConfig, NotificationConfig, RetryConfig};
use rowfetch::{Config, Pipeline, RunOptions};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOT_TOKEN: &str = "testtoken";
const CHAT_ID: &str = "chat1";

fn test_config(lookup_server: &MockServer, telegram_server: &MockServer) -> Config {
    Config {
        lookup: LookupConfig {
            base_url: format!("{}/lookup", lookup_server.uri()),
            request_timeout: Duration::from_secs(5),
            retry: RetryConfig {
                max_attempts: 1,
                delay: Duration::from_millis(10),
                backoff_multiplier: 1.0,
            },
        },
        fetch: FetchConfig {
            max_concurrent_lookups: 4,
        },
        notification: NotificationConfig {
            bot_token: BOT_TOKEN.to_string(),
            chat_id: CHAT_ID.to_string(),
            api_base: telegram_server.uri(),
            timeout: Duration::from_secs(2),
        },
    }
}

fn write_input(dir: &TempDir, content: &str) -> PathBuf {
    let input = dir.path().join("input.csv");
    fs::write(&input, content).unwrap();
    input
}

async fn mount_lookup(server: &MockServer, id: &str, body: Value, delay: Duration) {
    Mock::given(method("GET"))
        .and(path("/lookup"))
        .and(query_param("id", id))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(body)
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

async fn mount_telegram(server: &MockServer, expected_sends: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/bot{BOT_TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(200))
        .expect(expected_sends)
        .mount(server)
        .await;
}

fn read_output(path: &Path) -> Vec<Value> {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

#[tokio::test]
async fn two_rows_produce_ordered_output_and_one_notification() {
    let lookup = MockServer::start().await;
    let telegram = MockServer::start().await;

    // Row 1 answers slower than row 2: output order must still be input order
    mount_lookup(
        &lookup,
        "1",
        json!({"id": 1, "name": "Test1"}),
        Duration::from_millis(80),
    )
    .await;
    mount_lookup(&lookup, "2", json!({"id": 2, "name": "Test2"}), Duration::ZERO).await;
    mount_telegram(&telegram, 1).await;

    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "id\n1\n2\n");
    let output = dir.path().join("output.json");

    let pipeline = Pipeline::new(test_config(&lookup, &telegram)).unwrap();
    let report = pipeline
        .run(&RunOptions {
            input,
            output: output.clone(),
            dry_run: false,
        })
        .await
        .unwrap();

    assert_eq!(report.rows_loaded, 2);
    assert_eq!(report.rows_written, 2);

    let rows = read_output(&output);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], json!({"id": 1, "name": "Test1"}));
    assert_eq!(rows[1], json!({"id": 2, "name": "Test2"}));

    let sends = telegram.received_requests().await.unwrap();
    assert_eq!(sends.len(), 1, "exactly one notification per run");
    let body = String::from_utf8(sends[0].body.clone()).unwrap();
    assert!(body.contains(&format!("chat_id={CHAT_ID}")));
    assert!(body.contains("completed+successfully"));
}

#[tokio::test]
async fn exhausted_retry_budget_fails_the_run_without_output() {
    let lookup = MockServer::start().await;
    let telegram = MockServer::start().await;

    mount_lookup(&lookup, "1", json!({"id": 1, "name": "Test1"}), Duration::ZERO).await;
    Mock::given(method("GET"))
        .and(path("/lookup"))
        .and(query_param("id", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&lookup)
        .await;
    mount_telegram(&telegram, 1).await;

    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "id\n1\n2\n");
    let output = dir.path().join("output.json");

    let pipeline = Pipeline::new(test_config(&lookup, &telegram)).unwrap();
    let err = pipeline
        .run(&RunOptions {
            input,
            output: output.clone(),
            dry_run: false,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, rowfetch::Error::Lookup(_)));
    assert!(
        !output.exists(),
        "no output file may be produced on a terminal lookup failure"
    );

    // The failing id burned its full budget: initial attempt + 1 retry
    let lookups = lookup.received_requests().await.unwrap();
    let failing_attempts = lookups
        .iter()
        .filter(|r| r.url.query().is_some_and(|q| q.contains("id=2")))
        .count();
    assert_eq!(failing_attempts, 2);

    let sends = telegram.received_requests().await.unwrap();
    assert_eq!(sends.len(), 1, "failure must be notified exactly once");
    let body = String::from_utf8(sends[0].body.clone()).unwrap();
    assert!(body.contains("failed"));
}

#[tokio::test]
async fn late_completions_after_a_failure_add_no_output_rows() {
    let lookup = MockServer::start().await;
    let telegram = MockServer::start().await;

    // Row 1 fails fast; rows 2 and 3 would succeed shortly after the
    // cancellation signal if they were allowed to finish
    Mock::given(method("GET"))
        .and(path("/lookup"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&lookup)
        .await;
    mount_lookup(
        &lookup,
        "2",
        json!({"id": 2, "name": "Late2"}),
        Duration::from_millis(150),
    )
    .await;
    mount_lookup(
        &lookup,
        "3",
        json!({"id": 3, "name": "Late3"}),
        Duration::from_millis(150),
    )
    .await;
    mount_telegram(&telegram, 1).await;

    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "id\n1\n2\n3\n");
    let output = dir.path().join("output.json");

    let mut config = test_config(&lookup, &telegram);
    config.lookup.retry.max_attempts = 0;

    let pipeline = Pipeline::new(config).unwrap();
    let err = pipeline
        .run(&RunOptions {
            input,
            output: output.clone(),
            dry_run: false,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, rowfetch::Error::Lookup(_)));
    assert!(!output.exists());

    // Give the stubbed slow responses time to have fired if anything leaked
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(
        !output.exists(),
        "lookups finishing after cancellation must not produce output"
    );
}

#[tokio::test]
async fn empty_input_writes_an_empty_array_and_notifies_success() {
    let lookup = MockServer::start().await;
    let telegram = MockServer::start().await;
    mount_telegram(&telegram, 1).await;

    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "id,value\n");
    let output = dir.path().join("output.json");

    let pipeline = Pipeline::new(test_config(&lookup, &telegram)).unwrap();
    let report = pipeline
        .run(&RunOptions {
            input,
            output: output.clone(),
            dry_run: false,
        })
        .await
        .unwrap();

    assert_eq!(report.rows_loaded, 0);
    assert_eq!(report.rows_written, 0);
    assert!(read_output(&output).is_empty());

    let lookups = lookup.received_requests().await.unwrap();
    assert!(lookups.is_empty(), "nothing to fetch for an empty input");
}

#[tokio::test]
async fn n_successful_lookups_yield_n_rows_without_duplicates() {
    let lookup = MockServer::start().await;
    let telegram = MockServer::start().await;

    let n: u16 = 10;
    let mut csv = String::from("id\n");
    for i in 1..=n {
        csv.push_str(&format!("{i}\n"));
        mount_lookup(
            &lookup,
            &i.to_string(),
            json!({"id": i, "name": format!("Row{i}")}),
            Duration::from_millis(u64::from(i % 3) * 20),
        )
        .await;
    }
    mount_telegram(&telegram, 1).await;

    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &csv);
    let output = dir.path().join("output.json");

    let pipeline = Pipeline::new(test_config(&lookup, &telegram)).unwrap();
    let report = pipeline
        .run(&RunOptions {
            input,
            output: output.clone(),
            dry_run: false,
        })
        .await
        .unwrap();

    assert_eq!(report.rows_written, usize::from(n));

    let rows = read_output(&output);
    assert_eq!(rows.len(), usize::from(n));
    let ids: Vec<i64> = rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    let unique: HashSet<i64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), usize::from(n), "output ids must be unique");
    let expected: Vec<i64> = (1..=i64::from(n)).collect();
    assert_eq!(ids, expected, "output follows input order");
}

#[tokio::test]
async fn malformed_lookup_body_aborts_the_run() {
    let lookup = MockServer::start().await;
    let telegram = MockServer::start().await;

    mount_lookup(&lookup, "1", json!({"id": 1}), Duration::ZERO).await;
    Mock::given(method("GET"))
        .and(path("/lookup"))
        .and(query_param("id", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&lookup)
        .await;
    mount_telegram(&telegram, 1).await;

    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "id\n1\n2\n");
    let output = dir.path().join("output.json");

    let pipeline = Pipeline::new(test_config(&lookup, &telegram)).unwrap();
    let err = pipeline
        .run(&RunOptions {
            input,
            output: output.clone(),
            dry_run: false,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, rowfetch::Error::Lookup(_)));
    assert!(!output.exists());

    // A malformed success body is terminal: exactly one attempt for that id
    let lookups = lookup.received_requests().await.unwrap();
    let attempts = lookups
        .iter()
        .filter(|r| r.url.query().is_some_and(|q| q.contains("id=2")))
        .count();
    assert_eq!(attempts, 1);
}

#[tokio::test]
async fn extra_input_columns_are_ignored_by_the_fetch_stage() {
    let lookup = MockServer::start().await;
    let telegram = MockServer::start().await;

    mount_lookup(&lookup, "1", json!({"id": 1, "name": "Test"}), Duration::ZERO).await;
    mount_telegram(&telegram, 1).await;

    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "id,value,comment\n1,10,hello\n");
    let output = dir.path().join("output.json");

    let pipeline = Pipeline::new(test_config(&lookup, &telegram)).unwrap();
    pipeline
        .run(&RunOptions {
            input,
            output: output.clone(),
            dry_run: false,
        })
        .await
        .unwrap();

    let rows = read_output(&output);
    assert_eq!(rows, vec![json!({"id": 1, "name": "Test"})]);
}
