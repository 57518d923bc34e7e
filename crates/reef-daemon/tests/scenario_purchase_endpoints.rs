//! Scenario: client-reported purchases append to the log and list per user.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use reef_daemon::{routes, state::AppState};
use reef_testkit::MemStore;
use tower::ServiceExt; // oneshot

fn make_state() -> Arc<AppState> {
    Arc::new(AppState::new(Arc::new(MemStore::new())))
}

async fn call(router: axum::Router, req: Request<axum::body::Body>) -> (StatusCode, bytes::Bytes) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

fn parse_json(b: bytes::Bytes) -> serde_json::Value {
    serde_json::from_slice(&b).expect("body is not valid JSON")
}

fn get(uri: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn record_purchase_returns_stored_row() {
    let st = make_state();

    let (status, body) = call(
        routes::build_router(st),
        post_json(
            "/api/purchases/record",
            serde_json::json!({
                "user_id": "buyer-1",
                "product_id": "coins_100",
                "transaction_id": "txn-1",
                "platform": "ios",
                "amount": 0.99,
                "currency": "USD"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["user_id"], "buyer-1");
    assert_eq!(json["product_id"], "coins_100");
    assert_eq!(json["platform"], "ios");
    assert_eq!(json["amount"], 0.99);
    assert!(json["id"].is_string(), "synthetic id assigned");
    assert!(json["created_at"].is_string());
    assert!(
        json["event_type"].is_null(),
        "client-reported purchases carry no webhook event type"
    );
}

#[tokio::test]
async fn purchases_list_only_this_users_rows() {
    let st = make_state();

    for (user_id, product) in [
        ("buyer-2", "coins_100"),
        ("buyer-2", "coins_500"),
        ("someone-else", "remove_ads"),
    ] {
        let (status, _) = call(
            routes::build_router(Arc::clone(&st)),
            post_json(
                "/api/purchases/record",
                serde_json::json!({
                    "user_id": user_id,
                    "product_id": product,
                    "transaction_id": format!("txn-{product}"),
                    "platform": "android"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = call(routes::build_router(st), get("/api/purchases/buyer-2")).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    let listed = json.as_array().expect("list body");
    assert_eq!(listed.len(), 2);
    for row in listed {
        assert_eq!(row["user_id"], "buyer-2");
    }
}

#[tokio::test]
async fn purchases_for_user_with_none_is_empty_list() {
    let st = make_state();
    let (status, body) = call(routes::build_router(st), get("/api/purchases/nobody")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(body), serde_json::json!([]));
}
