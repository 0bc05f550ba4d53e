//! API integration tests for the CSV processing endpoint
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot` against an
//! in-memory blob store and static secrets, so no external services are
//! needed.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use csvsync_server::{
    api::create_router,
    config::Config,
    features::FeatureState,
    secrets::{SecretProvider, StaticSecretProvider},
    storage::{FixedConnector, MemoryBlobStore},
};
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use tower::ServiceExt;

const SECRET_NAME: &str = "storage-key";
const MAPPING_PATH: &str = "Dropbox_TableNames/file_to_table_name_mapping.csv";

// ============================================================================
// Helper Functions
// ============================================================================

fn test_config() -> Config {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("STORAGE_ACCOUNT_NAME", "acct"),
        ("STORAGE_KEY_SECRET_NAME", SECRET_NAME),
        ("SOURCE_CONTAINER", "raw"),
        ("DEST_CONTAINER", "curated"),
        ("SOURCE_PATH", "/inbox/"),
        ("DEST_PATH", "clean"),
    ]);

    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

fn create_test_app(store: Arc<MemoryBlobStore>, secrets: Arc<dyn SecretProvider>) -> Router {
    create_router(FeatureState {
        config: Arc::new(test_config()),
        secrets,
        connector: Arc::new(FixedConnector::new(store)),
    })
}

fn with_key() -> Arc<dyn SecretProvider> {
    Arc::new(StaticSecretProvider::new().with_secret(SECRET_NAME, "key"))
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);

    (status, json)
}

fn output(store: &MemoryBlobStore, path: &str) -> String {
    String::from_utf8(store.get("curated", path).unwrap()).unwrap()
}

// ============================================================================
// Success
// ============================================================================

#[tokio::test]
async fn test_process_csv_success() {
    let store = Arc::new(MemoryBlobStore::new());
    store.insert("raw", "inbox/Sales2023_Jan.csv", "Order ID,Unit-Price\n1,9.99\n");
    store.insert("raw", "inbox/Weird File!!.csv", "a b,c\n1,2\n");
    store.insert("raw", "inbox/readme.txt", "ignored");
    store.insert(
        "curated",
        MAPPING_PATH,
        "filename,schema,tablename\nSales2023,dbo,orders\nsales,dbo,legacy\n",
    );

    let app = create_test_app(store.clone(), with_key());
    let (status, body) = send(&app, "GET", "/api/v1/process_csv").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["processed"], 2);
    assert_eq!(body["data"]["failed"], 0);
    assert_eq!(body["data"]["message"], "Processed 2 CSV files successfully.");
    assert!(body["data"].get("failed_paths").is_none());

    assert_eq!(output(&store, "clean/orders.csv"), "Order_ID,Unit_Price\n1,9.99\n");
    assert_eq!(output(&store, "clean/Weird_File.csv"), "a_b,c\n1,2\n");
    assert!(!store
        .reads()
        .iter()
        .any(|(_, path)| path == "inbox/readme.txt"));
}

#[tokio::test]
async fn test_process_csv_accepts_post() {
    let store = Arc::new(MemoryBlobStore::new());
    store.insert("raw", "inbox/a.csv", "x\n1\n");

    let app = create_test_app(store.clone(), with_key());
    let (status, body) = send(&app, "POST", "/api/v1/process_csv").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["processed"], 1);
    assert_eq!(output(&store, "clean/a.csv"), "x\n1\n");
}

#[tokio::test]
async fn test_process_csv_empty_source() {
    let store = Arc::new(MemoryBlobStore::new());

    let app = create_test_app(store, with_key());
    let (status, body) = send(&app, "GET", "/api/v1/process_csv").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Processed 0 CSV files successfully.");
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_process_csv_partial_failure() {
    let store = Arc::new(MemoryBlobStore::new());
    store.insert("raw", "inbox/a.csv", "x,y\n1,2\n");
    store.insert("raw", "inbox/b.csv", "x,y\n1,2,3\n");
    store.insert("raw", "inbox/c.csv", "x,y\n3,4\n");

    let app = create_test_app(store.clone(), with_key());
    let (status, body) = send(&app, "GET", "/api/v1/process_csv").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "PARTIAL_FAILURE");
    assert_eq!(
        body["error"]["message"],
        "Processed 2 files, failed 1: ['inbox/b.csv']"
    );
    assert_eq!(body["error"]["details"]["failed_paths"][0], "inbox/b.csv");

    assert_eq!(store.paths("curated"), vec!["clean/a.csv", "clean/c.csv"]);
}

#[tokio::test]
async fn test_process_csv_missing_secret() {
    let store = Arc::new(MemoryBlobStore::new());
    store.insert("raw", "inbox/a.csv", "x\n1\n");

    let app = create_test_app(store.clone(), Arc::new(StaticSecretProvider::new()));
    let (status, body) = send(&app, "GET", "/api/v1/process_csv").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "AUTH_ERROR");
    assert_eq!(
        body["error"]["message"],
        format!("Error: Secret '{}' not found", SECRET_NAME)
    );
    assert!(store.paths("curated").is_empty());
}

#[tokio::test]
async fn test_process_csv_broken_mapping_is_not_fatal() {
    let store = Arc::new(MemoryBlobStore::new());
    store.insert("raw", "inbox/Sales2023_Jan.csv", "a\n1\n");
    store.insert("curated", MAPPING_PATH, "filename,tablename\nSales2023,orders\n");

    let app = create_test_app(store.clone(), with_key());
    let (status, _) = send(&app, "GET", "/api/v1/process_csv").await;

    assert_eq!(status, StatusCode::OK);
    assert!(store.get("curated", "clean/Sales2023_Jan.csv").is_some());
    assert!(store.get("curated", "clean/orders.csv").is_none());
}

// ============================================================================
// Service Endpoints
// ============================================================================

#[tokio::test]
async fn test_health_and_root() {
    let app = create_test_app(Arc::new(MemoryBlobStore::new()), with_key());

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = send(&app, "GET", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = create_test_app(Arc::new(MemoryBlobStore::new()), with_key());

    let (status, _) = send(&app, "GET", "/api/v1/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
