//! Primary/fallback routing for mapped service types.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

mod common;

fn counting_employees(hits: Arc<AtomicU32>, body: Value) -> Router {
    Router::new().route(
        "/v1/employees",
        get(move || {
            let hits = hits.clone();
            let body = body.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(body)
            }
        }),
    )
}

#[tokio::test]
async fn test_primary_healthy_serves_without_fallback() {
    let primary_hits = Arc::new(AtomicU32::new(0));
    let fallback_hits = Arc::new(AtomicU32::new(0));

    let primary = common::spawn_upstream(counting_employees(
        primary_hits.clone(),
        json!([{"id": 1, "name": "Ada"}]),
    ))
    .await;
    let fallback = common::spawn_upstream(counting_employees(
        fallback_hits.clone(),
        json!([{"id": 1, "name": "stale"}]),
    ))
    .await;

    let (gateway, shutdown) =
        common::spawn_gateway(common::failover_config(primary, fallback)).await;

    let res = common::test_client()
        .get(format!("{gateway}/v1/employees"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body[0]["name"], "Ada");
    assert_eq!(primary_hits.load(Ordering::SeqCst), 1);
    assert_eq!(fallback_hits.load(Ordering::SeqCst), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_primary_unreachable_fails_over() {
    let fallback_hits = Arc::new(AtomicU32::new(0));

    let primary = common::dead_addr().await;
    let fallback = common::spawn_upstream(counting_employees(
        fallback_hits.clone(),
        json!([{"id": 7, "name": "from fallback"}]),
    ))
    .await;

    let (gateway, shutdown) =
        common::spawn_gateway(common::failover_config(primary, fallback)).await;

    let res = common::test_client()
        .get(format!("{gateway}/v1/employees"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body[0]["name"], "from fallback");
    assert_eq!(fallback_hits.load(Ordering::SeqCst), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_stalled_primary_fails_over() {
    let fallback_hits = Arc::new(AtomicU32::new(0));

    let primary = common::spawn_upstream(Router::new().route(
        "/v1/employees",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Json(json!([{"id": 1, "name": "too slow"}]))
        }),
    ))
    .await;
    let fallback = common::spawn_upstream(counting_employees(
        fallback_hits.clone(),
        json!([{"id": 1, "name": "from fallback"}]),
    ))
    .await;

    let mut config = common::failover_config(primary, fallback);
    config.timeouts.upstream_secs = 1;

    let (gateway, shutdown) = common::spawn_gateway(config).await;

    let res = common::test_client()
        .get(format!("{gateway}/v1/employees"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body[0]["name"], "from fallback");
    assert_eq!(fallback_hits.load(Ordering::SeqCst), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_stalled_primary_download_fails_over() {
    let primary = common::spawn_upstream(Router::new().route(
        "/v1/employees/export/download",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            "too slow"
        }),
    ))
    .await;
    let fallback = common::spawn_upstream(Router::new().route(
        "/v1/employees/export/download",
        get(|| async {
            (
                [(header::CONTENT_TYPE, "application/pdf")],
                "fallback-bytes",
            )
        }),
    ))
    .await;

    let mut config = common::failover_config(primary, fallback);
    config.timeouts.upstream_secs = 1;

    let (gateway, shutdown) = common::spawn_gateway(config).await;

    // Download paths relay as a stream; a primary that never sends headers
    // must still fail over instead of hanging the request.
    let res = common::test_client()
        .get(format!("{gateway}/v1/employees/export/download"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(res.text().await.unwrap(), "fallback-bytes");

    shutdown.trigger();
}

#[tokio::test]
async fn test_primary_failure_status_triggers_fallback() {
    let primary_hits = Arc::new(AtomicU32::new(0));
    let fallback_hits = Arc::new(AtomicU32::new(0));

    let primary = {
        let hits = primary_hits.clone();
        common::spawn_upstream(Router::new().route(
            "/v1/employees",
            get(move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({"error": "database connection lost"})),
                    )
                }
            }),
        ))
        .await
    };
    let fallback = common::spawn_upstream(counting_employees(
        fallback_hits.clone(),
        json!([{"id": 2, "name": "Grace"}]),
    ))
    .await;

    let (gateway, shutdown) =
        common::spawn_gateway(common::failover_config(primary, fallback)).await;

    let res = common::test_client()
        .get(format!("{gateway}/v1/employees"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body[0]["name"], "Grace");
    assert_eq!(primary_hits.load(Ordering::SeqCst), 1);
    assert_eq!(fallback_hits.load(Ordering::SeqCst), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_fallback_answer_relayed_verbatim_even_on_failure() {
    let primary = common::dead_addr().await;
    let fallback = common::spawn_upstream(Router::new().route(
        "/v1/employees/99",
        get(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "employee not found"})),
            )
        }),
    ))
    .await;

    let (gateway, shutdown) =
        common::spawn_gateway(common::failover_config(primary, fallback)).await;

    let res = common::test_client()
        .get(format!("{gateway}/v1/employees/99"))
        .send()
        .await
        .unwrap();

    // No second retry and no 503 masking: the fallback's own answer wins.
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "employee not found");

    shutdown.trigger();
}

#[tokio::test]
async fn test_both_unavailable_yields_503() {
    let primary = common::dead_addr().await;
    let fallback = common::dead_addr().await;

    let (gateway, shutdown) =
        common::spawn_gateway(common::failover_config(primary, fallback)).await;

    let res = common::test_client()
        .get(format!("{gateway}/v1/employees"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Service Unavailable");
    assert_eq!(
        body["message"],
        "Both primary and fallback services for employees are currently unavailable"
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_unmapped_type_gets_single_attempt() {
    let hits = Arc::new(AtomicU32::new(0));
    let upstream = {
        let hits = hits.clone();
        common::spawn_upstream(Router::new().route(
            "/v1/auth/login",
            post(move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({"error": "bad credentials"})),
                    )
                }
            }),
        ))
        .await
    };

    let (gateway, shutdown) = common::spawn_gateway(common::route_only_config(upstream)).await;

    let res = common::test_client()
        .post(format!("{gateway}/v1/auth/login"))
        .json(&json!({"email": "a@b.c", "password": "nope"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "bad credentials");
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_failover_resends_buffered_post_body() {
    let fallback_hits = Arc::new(AtomicU32::new(0));

    let primary = common::dead_addr().await;
    let fallback = {
        let hits = fallback_hits.clone();
        common::spawn_upstream(Router::new().route(
            "/v1/employees",
            post(move |body: Bytes| {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (
                        StatusCode::CREATED,
                        [(header::CONTENT_TYPE, "application/json")],
                        body,
                    )
                }
            }),
        ))
        .await
    };

    let (gateway, shutdown) =
        common::spawn_gateway(common::failover_config(primary, fallback)).await;

    let payload = r#"{"name":"Linus","department":3}"#;
    let res = common::test_client()
        .post(format!("{gateway}/v1/employees"))
        .header("content-type", "application/json")
        .body(payload)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.text().await.unwrap(), payload);
    assert_eq!(fallback_hits.load(Ordering::SeqCst), 1);

    shutdown.trigger();
}
