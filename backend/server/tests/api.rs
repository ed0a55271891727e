mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use common::seeded_state;
use serde_json::{Value, json};
use server::app;
use tower::ServiceExt;

async fn send(app: axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_list_menu_in_id_order() {
    let state = seeded_state().await;

    let (status, body) = send(app(state), "GET", "/api/menu-items", None).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    assert_eq!(body[0]["price"], "10");
}

#[tokio::test]
async fn test_create_order() {
    let state = seeded_state().await;

    let (status, body) = send(
        app(state.clone()),
        "POST",
        "/api/order",
        Some(json!({
            "customer_info": {"name": "Mona", "address": "12 Nile St"},
            "items": [{"menu_item_id": 7, "quantity": 2, "unit_price": "50.00"}],
            "total_amount": "100.00"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);

    let id = body["order_id"].as_i64().unwrap();
    let (status, order) = send(app(state), "GET", &format!("/api/order/{id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["total_amount"], "100.00");
    assert_eq!(order["items"][0]["menu_item_id"], 7);
    assert_eq!(order["items"][0]["unit_price"], "50.00");
}

#[tokio::test]
async fn test_create_order_from_cart_payload() {
    let state = seeded_state().await;

    let (status, _) = send(
        app(state),
        "POST",
        "/api/order",
        Some(json!({
            "customer_info": {"name": "Mona"},
            "items": [{"id": 1, "quantity": 3, "price": 10}],
            "total_amount": 30
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_empty_order_is_bad_request() {
    let state = seeded_state().await;

    let (status, body) = send(
        app(state.clone()),
        "POST",
        "/api/order",
        Some(json!({"customer_info": {}, "items": [], "total_amount": 0})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("no items"));
    assert_eq!(state.database.order_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_overflowing_total_is_bad_request() {
    let state = seeded_state().await;

    let (status, body) = send(
        app(state.clone()),
        "POST",
        "/api/order",
        Some(json!({
            "customer_info": {"name": "Mona"},
            "items": [{"menu_item_id": 1, "quantity": 2, "unit_price": "79228162514264337593543950335"}],
            "total_amount": "1"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("overflows"));
    assert_eq!(state.database.order_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_non_numeric_ids_are_bad_request() {
    let state = seeded_state().await;

    let (status, body) = send(app(state.clone()), "GET", "/api/order/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Malformed payload");

    let (status, body) =
        send(app(state), "PUT", "/api/menu-item/koshari", Some(json!({"price": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Malformed payload");
}

#[tokio::test]
async fn test_malformed_order_is_bad_request() {
    let state = seeded_state().await;

    let (status, body) = send(app(state), "POST", "/api/order", Some(json!({"items": "lots"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Malformed payload");
}

#[tokio::test]
async fn test_unknown_menu_item_is_transaction_failure() {
    let state = seeded_state().await;

    let (status, body) = send(
        app(state.clone()),
        "POST",
        "/api/order",
        Some(json!({
            "customer_info": {"name": "Mona"},
            "items": [{"menu_item_id": 77, "quantity": 1, "unit_price": 5}],
            "total_amount": 5
        })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Transaction failed");
    assert_eq!(state.database.order_count().await.unwrap(), 0);
    assert_eq!(state.database.line_item_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_menu_item() {
    let state = seeded_state().await;

    let (status, body) = send(
        app(state),
        "PUT",
        "/api/menu-item/3",
        Some(json!({"price": 75.50, "is_available": false})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["item"]["id"], 3);
    assert_eq!(body["item"]["price"], "75.5");
    assert_eq!(body["item"]["is_available"], false);
    assert_eq!(body["item"]["name"], "Dish 3");
}

#[tokio::test]
async fn test_update_missing_menu_item() {
    let state = seeded_state().await;

    let (status, body) = send(app(state), "PUT", "/api/menu-item/999", Some(json!({"price": 1}))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Item not found");
}

#[tokio::test]
async fn test_missing_order() {
    let state = seeded_state().await;

    let (status, body) = send(app(state), "GET", "/api/order/5", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Order not found");
}
