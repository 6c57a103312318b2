/// Integration tests for the tgshop API
///
/// These tests drive the full router against a real database:
/// - Routing, CORS envelope and identity handling
/// - Registration and referral bonuses
/// - Checkout and balance debits
/// - Profile aggregate and notification acknowledgement

mod common;

use axum::http::{Method, StatusCode};
use common::{unique_category, unique_telegram_id, TestContext};
use serde_json::json;
use tgshop_shared::models::notification::{CreateNotification, Notification, NotificationType};
use tgshop_shared::services::checkout::PricingPolicy;

fn user_id(user: &serde_json::Value) -> i64 {
    user["id"].as_i64().expect("user id")
}

#[tokio::test]
async fn test_preflight_headers() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.send(Method::OPTIONS, "/?action=order", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.raw.is_empty());
    assert_eq!(response.headers["access-control-allow-origin"], "*");
    assert_eq!(
        response.headers["access-control-allow-methods"],
        "GET, POST, PUT, OPTIONS"
    );
    assert_eq!(
        response.headers["access-control-allow-headers"],
        "Content-Type, X-User-Id"
    );
    assert_eq!(response.headers["access-control-max-age"], "86400");
}

#[tokio::test]
async fn test_unknown_action_is_not_found() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.get("/?action=unknown", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json(), json!({ "error": "Not found" }));
    assert_eq!(response.headers["access-control-allow-origin"], "*");
    assert_eq!(response.headers["content-type"], "application/json");

    // method/action pairs outside the table
    let response = ctx.post("/?action=products", None, json!({})).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = ctx.get("/", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_new_user() {
    let ctx = TestContext::new().await.unwrap();
    let telegram_id = unique_telegram_id();

    let response = ctx
        .post(
            "/?action=auth",
            None,
            json!({ "telegram_id": telegram_id, "username": "alice", "first_name": "Alice" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let user = &response.json()["user"];
    assert_eq!(user["telegram_id"], telegram_id);
    assert_eq!(user["balance"], 1000);
    assert_eq!(user["username"], "alice");

    let code = user["referral_code"].as_str().unwrap();
    assert_eq!(code.len(), 8);
    assert!(code
        .chars()
        .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
}

#[tokio::test]
async fn test_register_is_idempotent() {
    let ctx = TestContext::new().await.unwrap();
    let body = json!({ "telegram_id": unique_telegram_id() });

    let first = ctx.post("/?action=auth", None, body.clone()).await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = ctx.post("/?action=auth", None, body).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.json()["user"]["id"], first.json()["user"]["id"]);
    assert_eq!(
        second.json()["user"]["referral_code"],
        first.json()["user"]["referral_code"]
    );
}

#[tokio::test]
async fn test_register_requires_telegram_id() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.post("/?action=auth", None, json!({ "username": "nobody" })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json(), json!({ "error": "telegram_id is required" }));

    let response = ctx.send(Method::POST, "/?action=auth", None, None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .post("/?action=auth", None, json!("not an object"))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_referral_bonus() {
    let ctx = TestContext::new().await.unwrap();

    let referrer = ctx.register(None).await;
    let code = referrer["referral_code"].as_str().unwrap().to_string();

    let referred = ctx.register(Some(&code)).await;
    assert_eq!(referred["referred_by_id"], referrer["id"]);
    assert_eq!(referred["balance"], 1000);

    let profile = ctx.get("/?action=user", Some(user_id(&referrer))).await;
    assert_eq!(profile.status, StatusCode::OK);

    let body = profile.json();
    assert_eq!(body["user"]["balance"], 1100);
    assert_eq!(body["referrals_count"], 1);

    let notifications = body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["title"], "New referral!");
    assert_eq!(notifications[0]["type"], "success");
    assert_eq!(notifications[0]["is_read"], false);
}

#[tokio::test]
async fn test_unknown_referral_code_is_ignored() {
    let ctx = TestContext::new().await.unwrap();

    let user = ctx.register(Some("ZZZZZZZZ")).await;
    assert!(user["referred_by_id"].is_null());
    assert_eq!(user["balance"], 1000);
}

#[tokio::test]
async fn test_profile_requires_identity() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.get("/?action=user", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json(), json!({ "error": "Unauthorized" }));
}

#[tokio::test]
async fn test_profile_unknown_user() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.get("/?action=user", Some(i64::MAX)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json(), json!({ "error": "User not found" }));
}

#[tokio::test]
async fn test_list_products_by_category() {
    let ctx = TestContext::new().await.unwrap();
    let category = unique_category();

    let older = ctx.create_product(&category, 100).await;
    let newer = ctx.create_product(&category, 200).await;
    let sold_out = ctx.create_product_with_stock(&category, 250, false).await;
    ctx.create_product(&unique_category(), 300).await;

    let response = ctx
        .get(&format!("/?action=products&category={}", category), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let products = response.json()["products"].as_array().unwrap().clone();
    let ids: Vec<i64> = products.iter().map(|p| p["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
    assert!(!ids.contains(&sold_out.id));
    assert!(products.iter().all(|p| p["category"] == category.as_str()));

    let all = ctx.get("/?action=products&category=all", None).await;
    let all = all.json()["products"].as_array().unwrap().clone();
    assert!(all.iter().any(|p| p["id"] == newer.id));
    assert!(all.iter().all(|p| p["in_stock"] == true));
    assert!(!all.iter().any(|p| p["id"] == sold_out.id));
}

#[tokio::test]
async fn test_repeated_query_keys() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .send(Method::OPTIONS, "/?action=order&action=auth", None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers["access-control-allow-origin"], "*");
    assert_eq!(response.headers["access-control-max-age"], "86400");

    let response = ctx.get("/?action=products&action=user", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.json()["products"].is_array());
}

#[tokio::test]
async fn test_other_paths_use_envelope() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.get("/api?action=products", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.json()["products"].is_array());
    assert_eq!(response.headers["access-control-allow-origin"], "*");

    let response = ctx.get("/api", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json(), json!({ "error": "Not found" }));
    assert_eq!(response.headers["access-control-allow-origin"], "*");
    assert_eq!(response.headers["content-type"], "application/json");

    let response = ctx.send(Method::OPTIONS, "/api", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers["access-control-allow-methods"],
        "GET, POST, PUT, OPTIONS"
    );

    let response = ctx.send(Method::OPTIONS, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_profile_lists_are_newest_first_and_capped() {
    let ctx = TestContext::new().await.unwrap();
    let product = ctx.create_product(&unique_category(), 100).await;
    let user = ctx.register(None).await;
    let id = user_id(&user);

    let mut order_ids = Vec::new();
    for _ in 0..2 {
        let response = ctx
            .post(
                "/?action=order",
                Some(id),
                json!({ "items": [{ "product_id": product.id, "quantity": 1, "price": 100 }] }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        order_ids.push(response.json()["order"]["id"].as_i64().unwrap());
    }

    for n in 0..25 {
        Notification::create(
            &ctx.db,
            CreateNotification {
                user_id: id,
                title: format!("n{}", n),
                message: "test".to_string(),
                kind: NotificationType::Info,
            },
        )
        .await
        .unwrap();
    }

    let profile = ctx.get("/?action=user", Some(id)).await.json();

    let orders: Vec<i64> = profile["orders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_i64().unwrap())
        .collect();
    assert_eq!(orders, vec![order_ids[1], order_ids[0]]);

    let notifications = profile["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 20);
    assert_eq!(notifications[0]["title"], "n24");
    assert_eq!(notifications[19]["title"], "n5");
    assert_eq!(notifications[0]["type"], "info");
}

#[tokio::test]
async fn test_order_requires_identity() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .post(
            "/?action=order",
            None,
            json!({ "items": [{ "product_id": 1, "quantity": 1, "price": 10 }] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_place_order() {
    let ctx = TestContext::new().await.unwrap();
    let category = unique_category();
    let first = ctx.create_product(&category, 150).await;
    let second = ctx.create_product(&category, 200).await;
    let user = ctx.register(None).await;

    let response = ctx
        .post(
            "/?action=order",
            Some(user_id(&user)),
            json!({ "items": [
                { "product_id": first.id, "quantity": 2, "price": 150 },
                { "product_id": second.id, "quantity": 1, "price": 200 }
            ] }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let order = &response.json()["order"];
    assert_eq!(order["total"], 500);
    assert_eq!(order["status"], "completed");
    assert_eq!(order["user_id"], user["id"]);

    let profile = ctx.get("/?action=user", Some(user_id(&user))).await.json();
    assert_eq!(profile["user"]["balance"], 500);

    let orders = profile["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["items_count"], 2);

    let notifications = profile["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["title"], "Order placed");
}

#[tokio::test]
async fn test_order_insufficient_balance() {
    let ctx = TestContext::new().await.unwrap();
    let product = ctx.create_product(&unique_category(), 1500).await;
    let user = ctx.register(None).await;

    let response = ctx
        .post(
            "/?action=order",
            Some(user_id(&user)),
            json!({ "items": [{ "product_id": product.id, "quantity": 1, "price": 1500 }] }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json(), json!({ "error": "Insufficient balance" }));

    let profile = ctx.get("/?action=user", Some(user_id(&user))).await.json();
    assert_eq!(profile["user"]["balance"], 1000);
    assert!(profile["orders"].as_array().unwrap().is_empty());
    assert!(profile["notifications"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_order_validation() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register(None).await;

    let response = ctx
        .post("/?action=order", Some(user_id(&user)), json!({ "items": [] }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json(), json!({ "error": "No items in order" }));

    let response = ctx
        .post(
            "/?action=order",
            Some(user_id(&user)),
            json!({ "items": [{ "product_id": 1, "quantity": 0, "price": 10 }] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json(), json!({ "error": "Quantity must be at least 1" }));
}

#[tokio::test]
async fn test_order_unknown_user() {
    let ctx = TestContext::new().await.unwrap();
    let product = ctx.create_product(&unique_category(), 10).await;

    let response = ctx
        .post(
            "/?action=order",
            Some(i64::MAX),
            json!({ "items": [{ "product_id": product.id, "quantity": 1, "price": 10 }] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json(), json!({ "error": "User not found" }));
}

#[tokio::test]
async fn test_catalog_pricing_ignores_client_price() {
    let ctx = TestContext::with_pricing(PricingPolicy::Catalog).await.unwrap();
    let product = ctx.create_product(&unique_category(), 400).await;
    let user = ctx.register(None).await;

    let response = ctx
        .post(
            "/?action=order",
            Some(user_id(&user)),
            json!({ "items": [{ "product_id": product.id, "quantity": 1, "price": 1 }] }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json()["order"]["total"], 400);
}

#[tokio::test]
async fn test_acknowledge_notification() {
    let ctx = TestContext::new().await.unwrap();
    let referrer = ctx.register(None).await;
    ctx.register(referrer["referral_code"].as_str()).await;

    let profile = ctx.get("/?action=user", Some(user_id(&referrer))).await.json();
    let notification_id = profile["notifications"][0]["id"].as_i64().unwrap();

    let response = ctx
        .put("/?action=notification", json!({ "notification_id": notification_id }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "success": true }));

    let profile = ctx.get("/?action=user", Some(user_id(&referrer))).await.json();
    assert_eq!(profile["notifications"][0]["is_read"], true);
}

#[tokio::test]
async fn test_acknowledge_unknown_notification() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .put("/?action=notification", json!({ "notification_id": i64::MAX }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "success": true }));

    let response = ctx.put("/?action=notification", json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.get("/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["database"], "connected");
}
