use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::get,
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::Mutex;
use tower::ServiceExt;

use forkful_shared::identity::Role;
use forkful_shared::token::TokenSigner;
use forkful_store::Database;

use super::*;
use crate::config::ServerConfig;
use crate::image_store::ImageStore;
use crate::rate_limit::RateLimiter;

const ADMIN_EMAIL: &str = "admin@forkful.test";

struct Harness {
    router: Router,
    state: AppState,
    _dir: TempDir,
}

async fn harness_with(config: ServerConfig, limiter: RateLimiter) -> Harness {
    let dir = TempDir::new().unwrap();
    let images = ImageStore::new(dir.path().join("uploads"), config.max_image_size)
        .await
        .unwrap();
    let state = AppState {
        db: Arc::new(Mutex::new(Database::open_in_memory().unwrap())),
        tokens: Arc::new(TokenSigner::generate()),
        images: Arc::new(images),
        rate_limiter: limiter,
        config: Arc::new(config),
    };
    Harness {
        router: build_router(state.clone()),
        state,
        _dir: dir,
    }
}

async fn harness() -> Harness {
    let config = ServerConfig {
        admin_email: Some(ADMIN_EMAIL.to_string()),
        ..ServerConfig::default()
    };
    harness_with(config, RateLimiter::new(1.0, 10.0)).await
}

impl Harness {
    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        self.send(req).await
    }

    async fn register_owner(&self, email: &str, restaurant: &str) -> (String, String) {
        let (status, body) = self
            .call(
                "POST",
                "/auth/register",
                None,
                Some(json!({
                    "name": "Olive Owner",
                    "email": email,
                    "password": "secret123",
                    "role": "owner",
                    "restaurantName": restaurant,
                    "restaurantAddress": "12 Market Street",
                    "restaurantDescription": "Wood-fired pizza",
                    "restaurantPhone": "555-123-4567",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let token = body["token"].as_str().unwrap().to_string();
        let restaurant_id = body["user"]["restaurantId"].as_str().unwrap().to_string();
        (token, restaurant_id)
    }

    async fn register_customer(&self, email: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/auth/register",
                None,
                Some(json!({
                    "name": "Casey Customer",
                    "email": email,
                    "password": "secret123",
                    "role": "customer",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_item(&self, token: &str, restaurant_id: &str, name: &str, price: &str, category: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/menu/create-menu",
                Some(token),
                Some(json!({
                    "name": name,
                    "description": "House favourite",
                    "price": price,
                    "category": category,
                    "restaurantId": restaurant_id,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn place_order(&self, token: &str, restaurant_id: &str, item_id: &str, quantity: i64) -> Value {
        let (status, body) = self
            .call(
                "POST",
                "/orders/create-order",
                Some(token),
                Some(json!({
                    "restaurant": restaurant_id,
                    "orderItems": [{ "menuItem": item_id, "quantity": quantity }],
                    "paymentMethod": "Cash",
                    "contactNumber": "555-987-6543",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

#[tokio::test]
async fn test_service_info_at_root_and_api_prefix() {
    let h = harness().await;
    let (status, body) = h.call("GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Forkful");

    let (status, _) = h.call("GET", "/api", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_end_to_end_order_scenario() {
    let h = harness().await;
    h.register_owner("owner@example.com", "Luigi's").await;

    let (status, login) = h
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "OWNER@example.com ", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{login}");
    assert_eq!(login["user"]["role"], "owner");
    let owner_token = login["token"].as_str().unwrap().to_string();
    let restaurant_id = login["user"]["restaurantId"].as_str().unwrap().to_string();

    let item_id = h
        .create_item(&owner_token, &restaurant_id, "Margherita", "9.99", "Main Course")
        .await;

    let customer = h.register_customer("casey@example.com").await;
    let placed = h.place_order(&customer, &restaurant_id, &item_id, 3).await;
    assert_eq!(placed["totalAmount"].as_f64(), Some(29.97));
    assert_eq!(placed["status"], "Pending");
    assert_eq!(placed["totalItems"], 3);
    assert_eq!(placed["orderItems"][0]["name"], "Margherita");

    let order_id = placed["id"].as_str().unwrap();
    let (status, fetched) = h
        .call("GET", &format!("/api/orders/{order_id}"), Some(&customer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["order"]["totalAmount"].as_f64(), Some(29.97));
    assert_eq!(fetched["order"]["status"], "Pending");
    assert_eq!(fetched["order"]["paymentStatus"], "Pending");
}

#[tokio::test]
async fn test_client_prices_are_ignored() {
    let h = harness().await;
    let (owner, rid) = h.register_owner("o@example.com", "Burger Barn").await;
    let item = h.create_item(&owner, &rid, "Cheeseburger", "10.00", "Main Course").await;
    let customer = h.register_customer("c@example.com").await;

    let (status, body) = h
        .call(
            "POST",
            "/orders/create-order",
            Some(&customer),
            Some(json!({
                "restaurant": rid,
                "orderItems": [{
                    "menuItem": item,
                    "quantity": 2,
                    "price": 0.01,
                    "addOns": [{ "name": "Extra Cheese", "price": 1.5 }],
                }],
                "totalAmount": 0.01,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["totalAmount"].as_f64(), Some(23.0));
}

#[tokio::test]
async fn test_order_rejections() {
    let h = harness().await;
    let (owner, rid) = h.register_owner("o@example.com", "Burger Barn").await;
    let item = h.create_item(&owner, &rid, "Cheeseburger", "10.00", "Main Course").await;
    let (_, other_rid) = h.register_owner("o2@example.com", "Taco Stand").await;
    let customer = h.register_customer("c@example.com").await;

    let attempts = [
        json!({ "restaurant": rid, "orderItems": [] }),
        json!({ "restaurant": rid, "orderItems": [{ "menuItem": item, "quantity": 0 }] }),
        json!({ "restaurant": rid, "orderItems": [{ "menuItem": item, "quantity": 1,
                "addOns": [{ "name": "Gold Leaf", "price": 100 }] }] }),
        json!({ "restaurant": other_rid, "orderItems": [{ "menuItem": item, "quantity": 1 }] }),
    ];
    for attempt in attempts {
        let (status, body) = h
            .call("POST", "/orders/create-order", Some(&customer), Some(attempt.clone()))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{attempt} -> {body}");
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    let (status, _) = h
        .call(
            "POST",
            "/orders/create-order",
            Some(&customer),
            Some(json!({ "restaurant": rid, "orderItems": [{ "menuItem": Uuid::new_v4(), "quantity": 1 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = h
        .call(
            "POST",
            "/orders/create-order",
            None,
            Some(json!({ "restaurant": rid, "orderItems": [{ "menuItem": item, "quantity": 1 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn test_oversized_amounts_are_rejected() {
    let h = harness().await;
    let (owner, rid) = h.register_owner("o@example.com", "Burger Barn").await;
    let item = h.create_item(&owner, &rid, "Cheeseburger", "10.00", "Main Course").await;
    let customer = h.register_customer("c@example.com").await;

    let (status, body) = h
        .call(
            "POST",
            "/orders/create-order",
            Some(&customer),
            Some(json!({
                "restaurant": rid,
                "orderItems": [{
                    "menuItem": item,
                    "quantity": 2,
                    "addOns": [{ "name": "Pepperoni", "price": 5.0e16 }],
                }],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["details"][0]["field"], "orderItems[0].addOns[0].price");

    let (status, body) = h
        .call(
            "POST",
            "/menu/create-menu",
            Some(&owner),
            Some(json!({
                "name": "Gold Burger",
                "description": "Very expensive",
                "price": 1.0e15,
                "restaurantId": rid,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["details"][0]["field"], "price");

    let (_, listed) = h.call("GET", "/orders/customer-orders", Some(&customer), None).await;
    assert_eq!(listed["count"], 0);
}

#[tokio::test]
async fn test_admin_email_always_gets_admin_role() {
    let h = harness().await;
    let (status, body) = h
        .call(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "name": "Root",
                "email": "Admin@Forkful.TEST",
                "password": "secret123",
                "role": "customer",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["user"]["email"], ADMIN_EMAIL);
}

#[tokio::test]
async fn test_invalid_role_persists_nothing() {
    let h = harness().await;
    let (status, body) = h
        .call(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "name": "Mallory",
                "email": "mallory@example.com",
                "password": "secret123",
                "role": "admin",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid Role");

    let found = h
        .state
        .db
        .lock()
        .await
        .find_user_by_email("mallory@example.com")
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_owner_registration_needs_restaurant_fields() {
    let h = harness().await;
    let (status, body) = h
        .call(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "name": "Olive",
                "email": "olive@example.com",
                "password": "secret123",
                "role": "owner",
                "restaurantName": "Half Done",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"restaurantAddress"));
    assert!(fields.contains(&"restaurantPhone"));

    // Nothing was written, so the email is still free.
    h.register_owner("olive@example.com", "Fully Done").await;
    let db = h.state.db.lock().await;
    let names: Vec<String> = db
        .list_restaurants()
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["Fully Done"]);
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let h = harness().await;
    h.register_customer("dup@example.com").await;
    let (status, body) = h
        .call(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "name": "Again",
                "email": " DUP@example.com",
                "password": "secret123",
                "role": "customer",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already in use");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let h = harness().await;
    h.register_customer("real@example.com").await;

    let (s1, wrong_pw) = h
        .call(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "real@example.com", "password": "nope-nope" })),
        )
        .await;
    let (s2, unknown) = h
        .call(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "ghost@example.com", "password": "secret123" })),
        )
        .await;
    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw, unknown);
    assert_eq!(wrong_pw["code"], "INVALID_CREDENTIALS");
    assert_eq!(wrong_pw["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_verify_and_token_failures() {
    let h = harness().await;
    let token = h.register_customer("me@example.com").await;

    let (status, me) = h.call("GET", "/auth/verify", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "me@example.com");
    assert!(me.get("passwordHash").is_none());

    let (status, body) = h.call("GET", "/auth/verify", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTH_REQUIRED");

    let (_, body) = h.call("GET", "/auth/verify", Some("garbage"), None).await;
    assert_eq!(body["code"], "INVALID_TOKEN");

    let user_id = me["id"].as_str().unwrap().parse().unwrap();
    let expired = h
        .state
        .tokens
        .issue_at(user_id, Role::Customer, None, Utc::now() - Duration::days(8))
        .unwrap();
    let (status, body) = h.call("GET", "/auth/verify", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "TOKEN_EXPIRED");

    let early = h
        .state
        .tokens
        .issue_at(user_id, Role::Customer, None, Utc::now() + Duration::hours(1))
        .unwrap();
    let (_, body) = h.call("GET", "/auth/verify", Some(&early), None).await;
    assert_eq!(body["code"], "TOKEN_NOT_ACTIVE");

    let ghost = h
        .state
        .tokens
        .issue(Uuid::new_v4(), Role::Customer, None)
        .unwrap();
    let (status, _) = h.call("GET", "/auth/verify", Some(&ghost), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_legacy_header_is_opt_in() {
    let h = harness().await;
    let token = h.register_customer("legacy@example.com").await;
    let req = || {
        Request::builder()
            .uri("/auth/verify")
            .header("x-auth-token", token.as_str())
            .body(Body::empty())
            .unwrap()
    };
    let (status, _) = h.send(req()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let config = ServerConfig {
        legacy_auth_header: true,
        ..ServerConfig::default()
    };
    let mut legacy = harness_with(config, RateLimiter::new(1.0, 10.0)).await;
    legacy.state.db = h.state.db.clone();
    legacy.state.tokens = h.state.tokens.clone();
    legacy.router = build_router(legacy.state.clone());
    let (status, body) = legacy.send(req()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[tokio::test]
async fn test_catalog_requires_owner() {
    let h = harness().await;
    let customer = h.register_customer("c@example.com").await;
    let (status, _) = h
        .call(
            "POST",
            "/restaurants/create-restaurant",
            Some(&customer),
            Some(json!({ "name": "Sneaky Diner" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (owner, _) = h.register_owner("o@example.com", "First").await;
    let (status, created) = h
        .call(
            "POST",
            "/restaurants/create-restaurant",
            Some(&owner),
            Some(json!({ "name": "Second", "phone": "555-000-1111" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");

    let (_, owned) = h.call("GET", "/restaurants/owner", Some(&owner), None).await;
    assert_eq!(owned["success"], true);
    assert_eq!(owned["count"], 2);

    let (_, all) = h.call("GET", "/restaurants", None, None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let id = created["id"].as_str().unwrap();
    let (status, one) = h.call("GET", &format!("/restaurants/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one["name"], "Second");

    let (status, _) = h
        .call("GET", &format!("/restaurants/{}", Uuid::new_v4()), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = h.call("GET", "/restaurants/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_menu_ownership_gate() {
    let h = harness().await;
    let (_, rid_a) = h.register_owner("a@example.com", "A's").await;
    let (owner_b, _) = h.register_owner("b@example.com", "B's").await;

    let (status, body) = h
        .call(
            "POST",
            "/menu/create-menu",
            Some(&owner_b),
            Some(json!({
                "name": "Intruder Special",
                "description": "Should not exist",
                "price": "5.00",
                "restaurantId": rid_a,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let (status, _) = h
        .call(
            "POST",
            "/menu/create-menu",
            Some(&owner_b),
            Some(json!({
                "name": "Phantom Special",
                "description": "No such restaurant",
                "price": "5.00",
                "restaurantId": Uuid::new_v4(),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, menu) = h
        .call("GET", &format!("/menu/restaurant/{rid_a}"), None, None)
        .await;
    assert!(menu.as_array().unwrap().is_empty());

    let (status, _) = h
        .call("GET", &format!("/menu/owner-menu/{rid_a}"), Some(&owner_b), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_owner_menu_grouped_by_category() {
    let h = harness().await;
    let (owner, rid) = h.register_owner("o@example.com", "Cafe").await;
    h.create_item(&owner, &rid, "Bruschetta", "6.50", "Appetizer").await;
    h.create_item(&owner, &rid, "Tiramisu", "7.25", "Dessert").await;
    h.create_item(&owner, &rid, "Panna Cotta", "6.75", "Dessert").await;

    let (status, body) = h
        .call("GET", &format!("/menu/owner-menu/{rid}"), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["restaurant"]["name"], "Cafe");
    assert_eq!(body["menuItems"]["Appetizer"].as_array().unwrap().len(), 1);
    let desserts = body["menuItems"]["Dessert"].as_array().unwrap();
    assert_eq!(desserts[0]["name"], "Panna Cotta");
    assert_eq!(desserts[0]["price"].as_f64(), Some(6.75));
    assert_eq!(desserts[0]["isAvailable"], true);
    assert_eq!(desserts[0]["ratings"]["reviewCount"], 0);
}

#[tokio::test]
async fn test_menu_multipart_with_image() {
    let h = harness().await;
    let (owner, rid) = h.register_owner("o@example.com", "Pizzeria").await;

    let boundary = "forkfulboundary";
    let mut body = Vec::new();
    for (name, value) in [
        ("name", "Quattro Formaggi"),
        ("description", "Four cheeses"),
        ("price", "12.5"),
        ("category", "Main Course"),
        ("restaurantId", rid.as_str()),
    ] {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"pizza.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"\x89PNG-not-really");
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let req = Request::builder()
        .method("POST")
        .uri("/menu/create-menu")
        .header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, created) = h.send(req).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["data"]["price"].as_f64(), Some(12.5));

    let image = created["data"]["image"].as_str().unwrap().to_string();
    assert!(image.starts_with("uploads/") && image.ends_with(".png"));

    let response = h
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/{image}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"\x89PNG-not-really");
}

#[tokio::test]
async fn test_status_lifecycle_and_permissions() {
    let h = harness().await;
    let (owner, rid) = h.register_owner("o@example.com", "Diner").await;
    let (other_owner, _) = h.register_owner("o2@example.com", "Rival").await;
    let item = h.create_item(&owner, &rid, "Pancakes", "8.00", "Main Course").await;
    let customer = h.register_customer("c@example.com").await;
    let order = h.place_order(&customer, &rid, &item, 1).await;
    let uri = format!("/orders/{}/status", order["id"].as_str().unwrap());

    for token in [&customer, &other_owner] {
        let (status, _) = h
            .call("PATCH", &uri, Some(token), Some(json!({ "status": "Confirmed" })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let (status, body) = h
        .call("PATCH", &uri, Some(&owner), Some(json!({ "status": "Confirmed" })))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "Confirmed");

    let (status, _) = h
        .call("PATCH", &uri, Some(&owner), Some(json!({ "status": "Delivered" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = h
        .call("PATCH", &uri, Some(&owner), Some(json!({ "status": "Confirmed" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = h
        .call("PATCH", &uri, Some(&owner), Some(json!({ "status": "Teleported" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = h
        .call("PATCH", &uri, Some(&owner), Some(json!({ "paymentStatus": "Paid" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Confirmed");
    assert_eq!(body["paymentStatus"], "Paid");

    for next in ["Preparing", "Ready"] {
        let (status, _) = h
            .call("PATCH", &uri, Some(&owner), Some(json!({ "status": next })))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    // No delivery address on this order.
    let (status, body) = h
        .call("PATCH", &uri, Some(&owner), Some(json!({ "status": "Out for Delivery" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "deliveryAddress");
}

#[tokio::test]
async fn test_cancel_is_soft_and_terminal() {
    let h = harness().await;
    let (owner, rid) = h.register_owner("o@example.com", "Diner").await;
    let item = h.create_item(&owner, &rid, "Waffles", "7.00", "Main Course").await;
    let customer = h.register_customer("c@example.com").await;
    let stranger = h.register_customer("s@example.com").await;
    let order = h.place_order(&customer, &rid, &item, 2).await;
    let uri = format!("/orders/{}", order["id"].as_str().unwrap());

    let (status, _) = h.call("DELETE", &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = h.call("GET", &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = h.call("DELETE", &uri, Some(&customer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order cancelled successfully");

    let (status, body) = h.call("GET", &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "Cancelled");
    assert_eq!(body["order"]["totalAmount"].as_f64(), Some(14.0));

    let (status, _) = h
        .call("PATCH", &format!("{uri}/status"), Some(&owner), Some(json!({ "status": "Confirmed" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = h.call("DELETE", &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = h
        .call("GET", &format!("/orders/{}", Uuid::new_v4()), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_listings_are_scoped() {
    let h = harness().await;
    let (owner_a, rid_a) = h.register_owner("a@example.com", "A's").await;
    let (owner_b, rid_b) = h.register_owner("b@example.com", "B's").await;
    let item_a = h.create_item(&owner_a, &rid_a, "Soup", "4.00", "Appetizer").await;
    let item_b = h.create_item(&owner_b, &rid_b, "Salad", "5.00", "Appetizer").await;
    let alice = h.register_customer("alice@example.com").await;
    let bob = h.register_customer("bob@example.com").await;

    let first = h.place_order(&alice, &rid_a, &item_a, 1).await;
    let second = h.place_order(&bob, &rid_a, &item_a, 2).await;
    h.place_order(&alice, &rid_b, &item_b, 1).await;

    let (status, listed) = h.call("GET", "/orders", Some(&owner_a), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["count"], 2);
    let orders = listed["orders"].as_array().unwrap();
    assert!(orders.iter().all(|o| o["restaurantId"] == rid_a.as_str()));
    // Newest first.
    assert_eq!(orders[0]["id"], second["id"]);
    assert_eq!(orders[1]["id"], first["id"]);

    let (_, mine) = h.call("GET", "/orders/customer-orders", Some(&alice), None).await;
    assert_eq!(mine["count"], 2);
    let alice_id = first["customerId"].clone();
    assert!(mine["orders"]
        .as_array()
        .unwrap()
        .iter()
        .all(|o| o["customerId"] == alice_id));

    let (status, _) = h.call("GET", "/orders", Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_credential_endpoints_are_rate_limited() {
    let h = harness_with(ServerConfig::default(), RateLimiter::new(0.001, 2.0)).await;
    let attempt = || {
        Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::from(
                json!({ "email": "x@example.com", "password": "whatever" }).to_string(),
            ))
            .unwrap()
    };

    assert_eq!(h.send(attempt()).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(h.send(attempt()).await.0, StatusCode::UNAUTHORIZED);
    let (status, body) = h.send(attempt()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "RATE_LIMITED");

    // Other routes are not throttled.
    let (status, _) = h.call("GET", "/restaurants", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_json_is_a_validation_error() {
    let h = harness().await;
    let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = h.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_development_mode_exposes_internal_detail() {
    async fn boom() -> Result<(), ServerError> {
        Err(ServerError::Internal("database is locked".to_string()))
    }

    let quiet: Router = Router::new().route("/boom", get(boom));
    let response = quiet
        .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body.get("detail").is_none());

    let loud: Router = Router::new()
        .route("/boom", get(boom))
        .layer(middleware::from_fn(expose_internal_detail));
    let response = loud
        .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["detail"], "database is locked");
    assert_eq!(body["message"], "Internal server error");
}
