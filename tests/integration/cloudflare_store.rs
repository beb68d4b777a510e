//! Workers KV client against an in-process imitation of the REST API.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use weebcast_gateway::api::{create_router, AppState};
use weebcast_gateway::error::StoreError;
use weebcast_gateway::store::{CloudflareKvStore, SnapshotStore};

use crate::common::send;

const TOKEN: &str = "kv-token";

#[derive(Clone, Default)]
struct FakeKv {
    values: Arc<Mutex<BTreeMap<String, String>>>,
    list_calls: Arc<Mutex<usize>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == format!("Bearer {}", TOKEN))
}

fn api_error(status: StatusCode, code: i64, message: &str) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "errors": [{"code": code, "message": message}],
            "messages": [],
            "result": null
        })),
    )
        .into_response()
}

async fn get_value(
    State(kv): State<FakeKv>,
    Path((_account, _namespace, key)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return api_error(StatusCode::UNAUTHORIZED, 10000, "Authentication error");
    }
    match kv.values.lock().unwrap().get(&key) {
        Some(value) => value.clone().into_response(),
        None => api_error(StatusCode::NOT_FOUND, 10009, "get: 'key not found'"),
    }
}

async fn put_value(
    State(kv): State<FakeKv>,
    Path((_account, _namespace, key)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if !authorized(&headers) {
        return api_error(StatusCode::UNAUTHORIZED, 10000, "Authentication error");
    }
    kv.values.lock().unwrap().insert(key, body);
    Json(json!({"success": true, "errors": [], "messages": [], "result": null})).into_response()
}

async fn list_keys(
    State(kv): State<FakeKv>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return api_error(StatusCode::UNAUTHORIZED, 10000, "Authentication error");
    }
    *kv.list_calls.lock().unwrap() += 1;

    let limit: usize = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(1000);
    let start: usize = params.get("cursor").and_then(|c| c.parse().ok()).unwrap_or(0);
    let keys: Vec<String> = kv.values.lock().unwrap().keys().cloned().collect();

    let page: Vec<Value> = keys
        .iter()
        .skip(start)
        .take(limit)
        .map(|name| json!({"name": name}))
        .collect();
    let next = start + page.len();
    let cursor = if next < keys.len() { next.to_string() } else { String::new() };

    Json(json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": page,
        "result_info": {"count": page.len(), "cursor": cursor}
    }))
    .into_response()
}

async fn spawn_fake_kv() -> (SocketAddr, FakeKv) {
    let kv = FakeKv::default();
    let app = Router::new()
        .route(
            "/client/v4/accounts/:account/storage/kv/namespaces/:namespace/values/:key",
            get(get_value).put(put_value),
        )
        .route(
            "/client/v4/accounts/:account/storage/kv/namespaces/:namespace/keys",
            get(list_keys),
        )
        .with_state(kv.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, kv)
}

fn client(addr: SocketAddr, token: &str, page_size: u32) -> CloudflareKvStore {
    CloudflareKvStore::new(
        &format!("http://{}/client/v4", addr),
        "acct",
        "ns",
        token.to_string(),
        page_size,
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn put_then_get_round_trips() {
    let (addr, kv) = spawn_fake_kv().await;
    let store = client(addr, TOKEN, 1000);

    store
        .put("anime-42", json!({"animeId": 42, "metrics": {"score": 9.1}}))
        .await
        .unwrap();

    assert_eq!(
        store.get("anime-42").await.unwrap(),
        Some(json!({"animeId": 42, "metrics": {"score": 9.1}}))
    );
    assert!(kv.values.lock().unwrap().contains_key("anime-42"));
}

#[tokio::test]
async fn missing_key_is_none() {
    let (addr, _) = spawn_fake_kv().await;
    let store = client(addr, TOKEN, 1000);

    assert_eq!(store.get("anime-404").await.unwrap(), None);
}

#[tokio::test]
async fn listing_pages_through_every_key() {
    let (addr, kv) = spawn_fake_kv().await;
    {
        let mut values = kv.values.lock().unwrap();
        for i in 0..25 {
            values.insert(format!("anime-{:02}", i), "{}".to_string());
        }
    }
    let store = client(addr, TOKEN, 10);

    let keys = store.list().await.unwrap();
    assert_eq!(keys.len(), 25);
    assert_eq!(keys.first().map(String::as_str), Some("anime-00"));
    assert_eq!(keys.last().map(String::as_str), Some("anime-24"));
    assert_eq!(*kv.list_calls.lock().unwrap(), 3);
}

#[tokio::test]
async fn rejected_token_surfaces_api_message() {
    let (addr, _) = spawn_fake_kv().await;
    let store = client(addr, "wrong", 1000);

    let err = store.get("mal-overall").await.unwrap_err();
    match &err {
        StoreError::Api { status, message } => {
            assert_eq!(*status, 401);
            assert!(message.contains("Authentication error"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert!(store.list().await.is_err());
    assert!(store.put("k", json!({})).await.is_err());
}

#[tokio::test]
async fn corrupt_stored_value_is_a_decode_error() {
    let (addr, kv) = spawn_fake_kv().await;
    kv.values
        .lock()
        .unwrap()
        .insert("mal-overall".to_string(), "not json".to_string());
    let store = client(addr, TOKEN, 1000);

    assert!(matches!(
        store.get("mal-overall").await,
        Err(StoreError::Decode(_))
    ));
}

#[tokio::test]
async fn gateway_serves_from_workers_kv() {
    let (addr, _) = spawn_fake_kv().await;
    let app = create_router(AppState::new(Arc::new(client(addr, TOKEN, 10))));

    let body = json!({"key": "anime-9", "animeId": 9, "animeName": "Dandadan"}).to_string();
    let response = send(&app, Method::POST, "/api/sync", Some(&body)).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = send(&app, Method::GET, "/api/anime/9", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["animeName"], "Dandadan");

    let response = send(&app, Method::GET, "/api/activity/all", None).await;
    assert_eq!(response.body["monitors"].as_array().unwrap().len(), 1);
}
