//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint, with the oracle
//! replaced by an in-process fake.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use callback_service::{
    api::create_router,
    oracle::StatusOracle,
    records::{MemoryStore, Record, RecordStore},
    AppState, CallbackError, PipelineConfig, Result,
};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

/// Oracle reporting every id in `online` as online and failing on `failing`.
#[derive(Debug, Default)]
struct FakeOracle {
    online: HashSet<i64>,
    failing: HashSet<i64>,
}

#[async_trait]
impl StatusOracle for FakeOracle {
    async fn status(&self, id: i64) -> Result<Record> {
        if self.failing.contains(&id) {
            return Err(CallbackError::OracleTransport {
                id,
                reason: "connection refused".to_string(),
            });
        }
        Ok(Record::new(id, self.online.contains(&id), 0))
    }
}

fn create_test_app(oracle: FakeOracle, pipeline: PipelineConfig) -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(Arc::new(oracle), store.clone(), &pipeline);
    (create_router(state), store)
}

/// Store whose backend cannot be reached; every call fails.
#[derive(Debug)]
struct UnreachableStore;

#[async_trait]
impl RecordStore for UnreachableStore {
    async fn upsert(&self, _records: &[Record]) -> Result<()> {
        Err(CallbackError::Store("connection refused".to_string()))
    }

    async fn delete_stale(&self, _ids: &[i64], _threshold: i64) -> Result<usize> {
        Err(CallbackError::Store("connection refused".to_string()))
    }

    async fn get(&self, _id: i64) -> Result<Option<Record>> {
        Err(CallbackError::Store("connection refused".to_string()))
    }

    async fn list(&self) -> Result<Vec<Record>> {
        Err(CallbackError::Store("connection refused".to_string()))
    }

    async fn count(&self) -> Result<usize> {
        Err(CallbackError::Store("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<()> {
        Err(CallbackError::Store("connection refused".to_string()))
    }
}

fn all_online(ids: &[i64]) -> FakeOracle {
    FakeOracle {
        online: ids.iter().copied().collect(),
        ..FakeOracle::default()
    }
}

fn callback_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/callback")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Polls the store until it holds `expected` records or two seconds pass.
async fn wait_for_count(store: &MemoryStore, expected: usize) -> usize {
    let mut count = 0;
    for _ in 0..100 {
        count = store.count().await.unwrap();
        if count == expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    count
}

// == Callback Endpoint Tests ==

#[tokio::test]
async fn test_callback_deduplicates_and_persists() {
    let (app, store) = create_test_app(all_online(&[91, 10, 78]), PipelineConfig::default());

    let response = app
        .oneshot(callback_request(r#"{"object_ids": [91,10,78,91,10,78]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json, serde_json::json!({}));

    assert_eq!(wait_for_count(&store, 3).await, 3);
    let ids: Vec<i64> = store.list().await.unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![10, 78, 91]);
}

#[tokio::test]
async fn test_callback_invalid_json() {
    let (app, _) = create_test_app(FakeOracle::default(), PipelineConfig::default());

    let response = app
        .oneshot(callback_request("a dalhd lkald fkjahd lfkjasdlf "))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(
        json,
        serde_json::json!({"error": "invalid_json", "message": "provided input cannot be parsed"})
    );
}

#[tokio::test]
async fn test_callback_missing_content_type_is_invalid_json() {
    let (app, _) = create_test_app(FakeOracle::default(), PipelineConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/callback")
                .body(Body::from(r#"{"object_ids": [1]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "invalid_json");
}

#[tokio::test]
async fn test_callback_oversized_batch_not_acceptable() {
    let pipeline = PipelineConfig {
        max_batch_size: 2,
        ..PipelineConfig::default()
    };
    let (app, store) = create_test_app(all_online(&[1, 2, 3]), pipeline);

    let response = app
        .oneshot(callback_request(r#"{"object_ids": [1,2,3]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "not_acceptable");
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_callback_duplicates_count_once_against_limit() {
    let pipeline = PipelineConfig {
        max_batch_size: 2,
        ..PipelineConfig::default()
    };
    let (app, store) = create_test_app(all_online(&[1, 2]), pipeline);

    let response = app
        .oneshot(callback_request(r#"{"object_ids": [1,2,1,2,1]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(wait_for_count(&store, 2).await, 2);
}

#[tokio::test]
async fn test_callback_partial_failure_still_succeeds() {
    let oracle = FakeOracle {
        online: HashSet::from([91, 10, 78]),
        failing: HashSet::from([10]),
    };
    let (app, store) = create_test_app(oracle, PipelineConfig::default());

    let response = app
        .oneshot(callback_request(r#"{"object_ids": [91,10,78]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(wait_for_count(&store, 2).await, 2);
    assert_eq!(store.get(10).await.unwrap(), None);
}

#[tokio::test]
async fn test_callback_offline_objects_not_stored() {
    let (app, store) = create_test_app(all_online(&[1]), PipelineConfig::default());

    let response = app
        .oneshot(callback_request(r#"{"object_ids": [1,2,3]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(wait_for_count(&store, 1).await, 1);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_callback_records_expire_after_ttl() {
    let pipeline = PipelineConfig {
        record_ttl: Duration::from_millis(800),
        ..PipelineConfig::default()
    };
    let (app, store) = create_test_app(all_online(&[91, 10, 78]), pipeline);

    let response = app
        .oneshot(callback_request(r#"{"object_ids": [91,10,78]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(wait_for_count(&store, 3).await, 3);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(store.count().await.unwrap(), 0);
}

// == Health and Stats Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app(FakeOracle::default(), PipelineConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_health_endpoint_store_unreachable() {
    let state = AppState::new(
        Arc::new(FakeOracle::default()),
        Arc::new(UnreachableStore),
        &PipelineConfig::default(),
    );
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "store unreachable");
}

#[tokio::test]
async fn test_stats_after_batch() {
    let (app, store) = create_test_app(all_online(&[1, 2]), PipelineConfig::default());

    let response = app
        .clone()
        .oneshot(callback_request(r#"{"object_ids": [1,2,3,3]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(wait_for_count(&store, 2).await, 2);

    // Offline id 3 is counted after its task finishes
    tokio::time::sleep(Duration::from_millis(100)).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["batches_accepted"], 1);
    assert_eq!(json["ids_dispatched"], 3);
    assert_eq!(json["persisted"], 2);
    assert_eq!(json["offline"], 1);
    assert_eq!(json["records_stored"], 2);
    assert_eq!(json["timers_pending"], 2);
}
