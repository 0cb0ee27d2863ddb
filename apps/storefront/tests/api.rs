//! HTTP-level tests: the full router over an in-memory database.

use std::sync::Mutex;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use barkas_core::{Product, ProductInput, Role, User};
use barkas_db::{Database, DbConfig};
use barkas_storefront::build_router;
use barkas_storefront::config::AppConfig;
use barkas_storefront::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

const PASSWORD: &str = "rahasia123";

/// One browser: keeps the session cookie between requests.
struct Client {
    router: Router,
    cookie: Mutex<Option<String>>,
}

impl Client {
    fn new(router: Router) -> Self {
        Client {
            router,
            cookie: Mutex::new(None),
        }
    }

    fn has_cookie(&self) -> bool {
        self.cookie.lock().unwrap().is_some()
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send_with_token(method, uri, body, None).await
    }

    async fn send_with_token(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(cookie) = self.cookie.lock().unwrap().clone() {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            *self.cookie.lock().unwrap() = Some(pair.to_string());
        }

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn sign_in(&self, email: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/sign-in",
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["accessToken"].as_str().unwrap().to_string()
    }

    async fn add_to_cart(&self, product: &Product, quantity: i64) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/cart/items",
            Some(json!({ "productId": product.id, "quantity": quantity })),
        )
        .await
    }
}

struct TestApp {
    router: Router,
    state: AppState,
    /// The browser used by `send` and `sign_in`.
    browser: Client,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = AppState::new(db, AppConfig::default());
        let router = build_router(state.clone());
        TestApp {
            browser: Client::new(router.clone()),
            router,
            state,
        }
    }

    /// Another browser with its own cookies.
    fn client(&self) -> Client {
        Client::new(self.router.clone())
    }

    async fn product(&self, name: &str, category: &str, price: i64, stock: i64) -> Product {
        self.state
            .db
            .inner()
            .products()
            .insert(&ProductInput {
                name: name.to_string(),
                category: category.to_string(),
                price,
                stock,
                ..Default::default()
            })
            .await
            .unwrap()
    }

    async fn staff(&self, email: &str, role: Role) -> User {
        self.state
            .session
            .auth()
            .register(email, PASSWORD, "Staf", role)
            .await
            .unwrap()
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.browser.send(method, uri, body).await
    }

    async fn send_with_token(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        self.browser.send_with_token(method, uri, body, token).await
    }

    async fn sign_in(&self, email: &str) -> String {
        self.browser.sign_in(email).await
    }
}

fn checkout_form() -> Value {
    json!({
        "customerName": "Putu Ayu",
        "customerPhone": "081234567890",
        "customerAddress": "Jl. Hanoman 10, Ubud",
        "paymentMethod": "cod"
    })
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_catalog_filter_and_detail() {
    let app = TestApp::new().await;
    let camera = app.product("Kamera Analog", "Elektronik", 650_000, 2).await;
    app.product("Radio Tabung", "Elektronik", 300_000, 4).await;
    app.product("Kursi Rotan", "Furniture", 450_000, 3).await;

    let (status, body) = app.send(Method::GET, "/api/products?search=KAMERA", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["products"][0]["id"], camera.id.as_str());
    assert_eq!(body["categories"], json!(["Elektronik", "Furniture"]));

    let (_, body) = app.send(Method::GET, "/api/products?category=Furniture", None).await;
    assert_eq!(body["total"], 1);

    let (status, body) = app
        .send(Method::GET, &format!("/api/products/{}", camera.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["name"], "Kamera Analog");
    assert_eq!(body["related"].as_array().unwrap().len(), 1);

    let (status, body) = app.send(Method::GET, "/api/products/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_cart_stock_guard() {
    let app = TestApp::new().await;
    let radio = app.product("Radio Tabung", "Elektronik", 300_000, 2).await;

    let (status, body) = app
        .send(Method::POST, "/api/cart/items", Some(json!({ "productId": radio.id })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["itemCount"], 1);

    // 1 in cart + 2 requested > 2 in stock
    let (status, body) = app
        .send(
            Method::POST,
            "/api/cart/items",
            Some(json!({ "productId": radio.id, "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/cart/items",
            Some(json!({ "productId": radio.id, "quantity": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/cart/items/{}", radio.id);
    let (status, body) = app.send(Method::PUT, &uri, Some(json!({ "quantity": 2 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["total"], 600_000);

    let (_, body) = app.send(Method::PUT, &uri, Some(json!({ "quantity": 0 }))).await;
    assert_eq!(body["items"], json!([]));
}

#[tokio::test]
async fn test_checkout() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::POST, "/api/checkout", Some(checkout_form())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "EMPTY_CART");

    let vase = app.product("Vas Keramik", "Dekorasi", 85_000, 5).await;
    app.send(
        Method::POST,
        "/api/cart/items",
        Some(json!({ "productId": vase.id, "quantity": 3 })),
    )
    .await;

    let (status, body) = app.send(Method::POST, "/api/checkout", Some(checkout_form())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["order"]["total"], 255_000);
    assert_eq!(body["items"][0]["quantity"], 3);

    let (_, cart) = app.send(Method::GET, "/api/cart", None).await;
    assert_eq!(cart["summary"]["itemCount"], 0);

    let stored = app.state.db.inner().products().get_by_id(&vase.id).await.unwrap().unwrap();
    assert_eq!(stored.stock, 2);
}

#[tokio::test]
async fn test_checkout_rejects_bad_form_and_keeps_cart() {
    let app = TestApp::new().await;
    let vase = app.product("Vas Keramik", "Dekorasi", 85_000, 5).await;
    app.send(Method::POST, "/api/cart/items", Some(json!({ "productId": vase.id })))
        .await;

    let (status, body) = app
        .send(Method::POST, "/api/checkout", Some(json!({ "customerName": "Putu" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (_, cart) = app.send(Method::GET, "/api/cart", None).await;
    assert_eq!(cart["summary"]["itemCount"], 1);
}

#[tokio::test]
async fn test_admin_requires_sign_in() {
    let app = TestApp::new().await;
    app.staff("admin@barkas.id", Role::Admin).await;

    let (status, body) = app.send(Method::GET, "/api/admin/dashboard", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/sign-in",
            Some(json!({ "email": "admin@barkas.id", "password": "salah-sekali" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (_, body) = app
        .send(
            Method::POST,
            "/api/auth/sign-in",
            Some(json!({ "email": "tidak-ada@barkas.id", "password": PASSWORD })),
        )
        .await;
    assert_eq!(body["message"], "Invalid email or password");

    app.sign_in("admin@barkas.id").await;
    let (status, body) = app.send(Method::GET, "/api/admin/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalProducts"], 0);

    let (_, session) = app.send(Method::GET, "/api/auth/session", None).await;
    assert_eq!(session["user"]["role"], "admin");

    let (status, _) = app.send(Method::POST, "/api/auth/sign-out", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, session) = app.send(Method::GET, "/api/auth/session", None).await;
    assert_eq!(session["user"], Value::Null);
}

#[tokio::test]
async fn test_bearer_token_authenticates_without_cookie() {
    let app = TestApp::new().await;
    app.staff("manager@barkas.id", Role::Manager).await;

    let revoked = app.sign_in("manager@barkas.id").await;
    app.send(Method::POST, "/api/auth/sign-out", None).await;

    let api = app.client();
    let (status, _) = api
        .send_with_token(Method::GET, "/api/admin/profile", None, Some(&revoked))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.sign_in("manager@barkas.id").await;
    let (status, body) = api
        .send_with_token(Method::GET, "/api/admin/profile", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "manager@barkas.id");
    assert!(!api.has_cookie());

    // Signing out by bearer revokes the token for the cookie browser too.
    let (status, _) = api
        .send_with_token(Method::POST, "/api/auth/sign-out", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send(Method::GET, "/api/admin/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (_, session) = app.send(Method::GET, "/api/auth/session", None).await;
    assert_eq!(session["user"], Value::Null);
}

#[tokio::test]
async fn test_sign_in_does_not_leak_to_other_clients() {
    let app = TestApp::new().await;
    app.staff("admin@barkas.id", Role::Admin).await;
    app.sign_in("admin@barkas.id").await;

    let (status, _) = app.send(Method::GET, "/api/admin/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);

    let stranger = app.client();
    let (status, body) = stranger.send(Method::GET, "/api/admin/dashboard", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = stranger
        .send(
            Method::POST,
            "/api/admin/products",
            Some(json!({ "name": "Meja Jati", "price": 1_250_000, "stock": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, session) = stranger.send(Method::GET, "/api/auth/session", None).await;
    assert_eq!(session["user"], Value::Null);

    // A stranger signing out leaves the admin signed in.
    stranger.send(Method::POST, "/api/auth/sign-out", None).await;
    let (status, _) = app.send(Method::GET, "/api/admin/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_shoppers_have_separate_carts() {
    let app = TestApp::new().await;
    let vase = app.product("Vas Keramik", "Dekorasi", 85_000, 5).await;
    let chair = app.product("Kursi Rotan", "Furniture", 450_000, 3).await;

    let ani = app.client();
    let budi = app.client();

    // Looking at an empty cart hands out no cookie.
    let (status, cart) = ani.send(Method::GET, "/api/cart", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["summary"]["itemCount"], 0);
    assert!(!ani.has_cookie());

    ani.add_to_cart(&vase, 2).await;
    budi.add_to_cart(&chair, 1).await;
    assert!(ani.has_cookie());

    let (_, cart) = ani.send(Method::GET, "/api/cart", None).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["summary"]["total"], 170_000);

    let (_, cart) = budi.send(Method::GET, "/api/cart", None).await;
    assert_eq!(cart["summary"]["total"], 450_000);

    let (status, _) = budi.send(Method::POST, "/api/checkout", Some(checkout_form())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, cart) = ani.send(Method::GET, "/api/cart", None).await;
    assert_eq!(cart["summary"]["itemCount"], 2);

    let (status, body) = app
        .client()
        .send(Method::POST, "/api/checkout", Some(checkout_form()))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "EMPTY_CART");
}

#[tokio::test]
async fn test_checkout_is_attributed_to_own_sign_in_only() {
    let app = TestApp::new().await;
    let admin = app.staff("admin@barkas.id", Role::Admin).await;
    let lamp = app.product("Lampu Gantung", "Dekorasi", 275_000, 5).await;
    app.sign_in("admin@barkas.id").await;

    let shopper = app.client();
    shopper.add_to_cart(&lamp, 1).await;
    let (status, placed) = shopper
        .send(Method::POST, "/api/checkout", Some(checkout_form()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{placed}");
    assert_eq!(placed["order"]["createdBy"], Value::Null);

    app.browser.add_to_cart(&lamp, 1).await;
    let (status, placed) = app.send(Method::POST, "/api/checkout", Some(checkout_form())).await;
    assert_eq!(status, StatusCode::CREATED, "{placed}");
    assert_eq!(placed["order"]["createdBy"], admin.id.as_str());

    let (_, activity) = app.send(Method::GET, "/api/admin/activity", None).await;
    let entries = activity.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "create_order");
}

#[tokio::test]
async fn test_cart_rejects_quantity_overflow() {
    let app = TestApp::new().await;
    let radio = app.product("Radio Tabung", "Elektronik", 300_000, 2).await;

    let (status, _) = app.browser.add_to_cart(&radio, 1).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.browser.add_to_cart(&radio, i64::MAX).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");

    let (_, cart) = app.send(Method::GET, "/api/cart", None).await;
    assert_eq!(cart["summary"]["itemCount"], 1);
}

#[tokio::test]
async fn test_order_status_update_is_logged() {
    let app = TestApp::new().await;
    app.staff("admin@barkas.id", Role::Admin).await;
    let lamp = app.product("Lampu Gantung", "Dekorasi", 275_000, 2).await;

    app.send(Method::POST, "/api/cart/items", Some(json!({ "productId": lamp.id })))
        .await;
    let (_, placed) = app.send(Method::POST, "/api/checkout", Some(checkout_form())).await;
    let order_id = placed["order"]["id"].as_str().unwrap().to_string();

    app.sign_in("admin@barkas.id").await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/admin/orders/{}/status", order_id),
            Some(json!({ "status": "shipped" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orderStatus"], "shipped");

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/admin/orders/{}/status", order_id),
            Some(json!({ "status": "lost" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, orders) = app.send(Method::GET, "/api/admin/orders?status=shipped", None).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
    let (_, orders) = app.send(Method::GET, "/api/admin/orders?status=pending", None).await;
    assert_eq!(orders.as_array().unwrap().len(), 0);

    let (_, activity) = app.send(Method::GET, "/api/admin/activity", None).await;
    let entries = activity.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "update_order_status");
    assert_eq!(entries[0]["details"]["new_status"], "shipped");
}

#[tokio::test]
async fn test_employee_sees_only_own_activity() {
    let app = TestApp::new().await;
    app.staff("manager@barkas.id", Role::Manager).await;
    app.staff("staff@barkas.id", Role::Employee).await;

    let manager = app.client();
    manager.sign_in("manager@barkas.id").await;
    let (status, _) = manager
        .send(
            Method::POST,
            "/api/admin/products",
            Some(json!({ "name": "Meja Jati", "price": 1_250_000, "stock": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    app.sign_in("staff@barkas.id").await;
    let (status, body) = app
        .send(
            Method::PUT,
            "/api/admin/profile",
            Some(json!({ "name": "Wayan", "email": "staff@barkas.id" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Wayan");

    // The manager is still signed in elsewhere; the employee's view is
    // decided by the employee's own role.
    let (_, activity) = app.send(Method::GET, "/api/admin/activity", None).await;
    let entries = activity.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "update_profile");
    assert_eq!(entries[0]["details"]["updated_fields"], json!(["name"]));

    let (_, activity) = manager.send(Method::GET, "/api/admin/activity", None).await;
    assert_eq!(activity.as_array().unwrap().len(), 2);

    let (_, session) = app.send(Method::GET, "/api/auth/session", None).await;
    assert_eq!(session["user"]["name"], "Wayan");
    let (_, session) = manager.send(Method::GET, "/api/auth/session", None).await;
    assert_eq!(session["user"]["email"], "manager@barkas.id");
}

#[tokio::test]
async fn test_report_range_validation() {
    let app = TestApp::new().await;
    app.staff("admin@barkas.id", Role::Admin).await;
    app.sign_in("admin@barkas.id").await;

    let (status, body) = app
        .send(Method::GET, "/api/admin/reports?start=2026-03-10&end=2026-03-01", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = app
        .send(Method::GET, "/api/admin/reports?start=10-03-2026", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.send(Method::GET, "/api/admin/reports", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalOrders"], 0);
}

#[tokio::test]
async fn test_stock_adjustment() {
    let app = TestApp::new().await;
    app.staff("admin@barkas.id", Role::Admin).await;
    app.sign_in("admin@barkas.id").await;
    let fan = app.product("Kipas Angin", "Elektronik", 120_000, 3).await;
    let uri = format!("/api/admin/products/{}/stock", fan.id);

    let (status, body) = app.send(Method::POST, &uri, Some(json!({ "delta": 5 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stock"], 8);

    let (status, body) = app.send(Method::POST, &uri, Some(json!({ "delta": -9 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");
}
