//! End-to-end tests: the real router over an in-memory database.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use backoffice_api::{build_router, ApiConfig, AppState};
use celltrack_core::{NewUser, Role, User};
use celltrack_db::{Database, DbConfig};

const IMEI_A: &str = "490154203237518";
const IMEI_B: &str = "356938035643809";

struct TestApp {
    state: Arc<AppState>,
    router: Router,
    admin: String,
    employee: String,
    employee_id: i64,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut config = ApiConfig::default();
        config.auth.jwt_secret = "test-secret".to_string();

        let state = AppState::new(db, config);
        let router = build_router(state.clone());

        let admin = staff(&state, "admin", Role::Admin).await;
        let employee = staff(&state, "empleado1", Role::Employee).await;

        TestApp {
            admin: state.jwt.generate_access_token(&admin).unwrap(),
            employee: state.jwt.generate_access_token(&employee).unwrap(),
            employee_id: employee.id,
            state,
            router,
        }
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    /// Samsung Galaxy S23 at $800.000; returns the model id.
    async fn galaxy(&self) -> i64 {
        let (status, brand) = self.post("/brands", &self.employee, json!({ "name": "Samsung" })).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, model) = self
            .post(
                "/models",
                &self.employee,
                json!({ "brand_id": brand["id"], "name": "Galaxy S23", "base_price_cents": 80_000_000 }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        model["id"].as_i64().unwrap()
    }

    async fn new_phone(&self, model_id: i64, imei: &str) -> Value {
        let (status, phone) = self
            .post(
                "/phones",
                &self.employee,
                json!({ "model_id": model_id, "imei": imei, "condition": "new", "color": "Negro" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{phone}");
        phone
    }

    async fn customer(&self, name: &str) -> i64 {
        let (status, customer) = self
            .post("/customers", &self.employee, json!({ "name": name, "dni": "30111222" }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        customer["id"].as_i64().unwrap()
    }
}

/// Account with a placeholder hash; tests that log in use real hashes.
async fn staff(state: &AppState, username: &str, role: Role) -> User {
    let user = NewUser {
        username: username.to_string(),
        role,
        ..Default::default()
    };
    state.db.users().insert(&user, "$argon2id$placeholder").await.unwrap()
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_protected_routes_require_a_valid_token() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/phones", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, _) = app.get("/phones", "not.a.jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/phones", &app.employee).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_registered_user_can_log_in() {
    let app = TestApp::new().await;

    let (status, created) = app
        .post(
            "/users",
            &app.admin,
            json!({
                "username": "vendedor2",
                "password": "mostrador2024",
                "email": "vendedor2@tienda.com",
                "first_name": "Ana",
                "last_name": "Ruiz"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["role"], "employee");
    assert!(created.get("password_hash").is_none());

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "vendedor2", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "vendedor2", "password": "mostrador2024" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");

    let token = body["access_token"].as_str().unwrap();
    let (status, me) = app.get("/auth/me", token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "vendedor2");
}

#[tokio::test]
async fn test_admin_routes_refuse_employees() {
    let app = TestApp::new().await;

    for uri in ["/reports", "/reports/low-stock", "/users"] {
        let (status, body) = app.get(uri, &app.employee).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body["code"], "forbidden");

        let (status, _) = app.get(uri, &app.admin).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn test_deactivated_user_is_locked_out() {
    let app = TestApp::new().await;

    let uri = format!("/users/{}/deactivate", app.employee_id);
    let (status, user) = app.post(&uri, &app.admin, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["is_active"], false);

    let (status, _) = app.get("/dashboard", &app.employee).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Inventory
// =============================================================================

#[tokio::test]
async fn test_phone_inventory_lifecycle() {
    let app = TestApp::new().await;
    let model_id = app.galaxy().await;

    let phone = app.new_phone(model_id, IMEI_A).await;
    let id = phone["id"].as_str().unwrap().to_string();
    assert_eq!(phone["status"], "available");
    // Price defaults to the model's base price
    assert_eq!(phone["price_cents"], 80_000_000);

    let (status, body) = app
        .post("/phones", &app.employee, json!({ "model_id": model_id, "imei": IMEI_A }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "duplicate");

    let (status, body) = app
        .post("/phones", &app.employee, json!({ "model_id": model_id, "imei": "490154203237519" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (_, list) = app.get("/phones?search=galaxy", &app.employee).await;
    assert_eq!(list["total"], 1);
    // Blank filters from the search form mean "any".
    let (status, list) = app
        .get("/phones?search=&status=&condition=&model_id=", &app.employee)
        .await;
    assert_eq!(status, StatusCode::OK, "{list}");
    assert_eq!(list["total"], 1);
    let (status, _) = app.get("/phones?status=lost", &app.employee).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, used) = app.get("/phones/used", &app.employee).await;
    assert_eq!(used["total"], 0);
    let (_, new) = app.get("/phones/new", &app.employee).await;
    assert_eq!(new["total"], 1);

    let (status, body) = app
        .post(&format!("/phones/{id}/status"), &app.employee, json!({ "status": "service" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "service");

    let (status, body) = app
        .post(&format!("/phones/{id}/status"), &app.employee, json!({ "status": "sold" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "business_rule");

    let (status, _) = app
        .post(&format!("/phones/{id}/comments"), &app.employee, json!({ "comment": "Pantalla rayada" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, detail) = app.get(&format!("/phones/{id}"), &app.employee).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["status_label"], "Servicio técnico");
    let comments = detail["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["comment"], "Pantalla rayada");
    assert!(comments[1]["comment"]
        .as_str()
        .unwrap()
        .starts_with("Estado cambiado de Stock a Servicio técnico"));
    assert!(detail["sale"].is_null());

    let (status, qr) = app.get(&format!("/phones/{id}/qr"), &app.employee).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(qr["payload"], format!("PHONE:{id}:{IMEI_A}:Samsung:Galaxy S23"));

    let (status, _) = app
        .send(Method::DELETE, &format!("/phones/{id}"), Some(&app.employee), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .send(Method::DELETE, &format!("/phones/{id}"), Some(&app.admin), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.get(&format!("/phones/{id}"), &app.employee).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_lookups_by_imei_and_search() {
    let app = TestApp::new().await;
    let model_id = app.galaxy().await;
    let phone = app.new_phone(model_id, IMEI_A).await;

    let (status, found) = app.get("/phones/lookup/49-015420-323751-8", &app.employee).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], phone["id"]);

    let (status, _) = app.get(&format!("/phones/lookup/{IMEI_B}"), &app.employee).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, info) = app.get(&format!("/imei/{IMEI_A}"), &app.employee).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["valid"], true);
    assert_eq!(info["info"]["tac"], "49015420");
    assert_eq!(info["phone"]["id"], phone["id"]);

    let (_, info) = app.get("/imei/123456789012345", &app.employee).await;
    assert_eq!(info["valid"], false);
    assert!(info["info"].is_null());
    assert!(info["phone"].is_null());

    let (_, result) = app.get(&format!("/search?q={IMEI_A}"), &app.employee).await;
    assert_eq!(result["query"]["type"], "imei");
    assert_eq!(result["phones"].as_array().unwrap().len(), 1);

    let (_, result) = app.get("/search?q=negro", &app.employee).await;
    assert_eq!(result["query"]["type"], "text");
    assert_eq!(result["phones"].as_array().unwrap().len(), 1);

    let (_, result) = app.get("/search?q=", &app.employee).await;
    assert!(result["phones"].as_array().unwrap().is_empty());
}

// =============================================================================
// Sales
// =============================================================================

#[tokio::test]
async fn test_sale_with_mixed_payment() {
    let app = TestApp::new().await;
    let model_id = app.galaxy().await;
    let phone = app.new_phone(model_id, IMEI_A).await;
    let phone_id = phone["id"].as_str().unwrap();
    let customer_id = app.customer("Juan Perez").await;

    // US$500 at $1.000 plus $300.000 in pesos covers $800.000
    let request = json!({
        "phone_id": phone_id,
        "customer_id": customer_id,
        "payment_method": "mixed",
        "payments": [
            { "kind": "cash", "currency": "USD", "amount_cents": 50_000, "exchange_rate_cents": 100_000 },
            { "kind": "cash", "currency": "ARS", "amount_cents": 30_000_000 }
        ]
    });
    let (status, sale) = app.post("/sales", &app.employee, request.clone()).await;
    assert_eq!(status, StatusCode::CREATED, "{sale}");
    assert_eq!(sale["payment_method"], "mixed");
    assert_eq!(sale["sold_by_username"], "empleado1");
    assert_eq!(sale["payments"].as_array().unwrap().len(), 2);
    let sale_id = sale["id"].as_str().unwrap().to_string();

    // The phone left the default inventory list
    let (_, list) = app.get("/phones", &app.employee).await;
    assert_eq!(list["total"], 0);

    let (status, body) = app.post("/sales", &app.employee, request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "business_rule");

    let (status, detail) = app.get(&format!("/sales/{sale_id}"), &app.employee).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["customer_name"], "Juan Perez");
    assert_eq!(detail["is_picked_up"], false);

    let (_, first) = app.post(&format!("/sales/{sale_id}/pickup"), &app.employee, json!({})).await;
    assert_eq!(first["is_picked_up"], true);
    assert!(!first["pickup_date"].is_null());
    let (_, second) = app.post(&format!("/sales/{sale_id}/pickup"), &app.employee, json!({})).await;
    assert_eq!(second["pickup_date"], first["pickup_date"]);

    let (_, customer) = app.get(&format!("/customers/{customer_id}"), &app.employee).await;
    assert_eq!(customer["total_purchases"], 1);
    assert_eq!(customer["total_spent_cents"], 80_000_000);
    assert_eq!(customer["purchases"][0]["id"], sale_id.as_str());

    let (_, sales) = app.get("/sales", &app.employee).await;
    assert_eq!(sales["total"], 1);
}

#[tokio::test]
async fn test_sale_payments_must_add_up() {
    let app = TestApp::new().await;
    let model_id = app.galaxy().await;
    let phone = app.new_phone(model_id, IMEI_A).await;
    let customer_id = app.customer("Maria Gomez").await;

    let (status, body) = app
        .post(
            "/sales",
            &app.employee,
            json!({
                "phone_id": phone["id"],
                "customer_id": customer_id,
                "payments": [{ "kind": "card", "amount_cents": 10_000_000, "installments": 6 }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "business_rule");

    // Lines that would wrap around to the price are refused, not summed.
    let (status, body) = app
        .post(
            "/sales",
            &app.employee,
            json!({
                "phone_id": phone["id"],
                "customer_id": customer_id,
                "payment_method": "cash",
                "payments": [
                    { "kind": "cash", "amount_cents": i64::MAX },
                    { "kind": "cash", "amount_cents": i64::MAX },
                    { "kind": "cash", "amount_cents": 80_000_002 }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().contains("out of range"), "{body}");

    // Nothing was written
    let (_, phone) = app.get(&format!("/phones/{}", phone["id"].as_str().unwrap()), &app.employee).await;
    assert_eq!(phone["status"], "available");
    let (_, sales) = app.get("/sales", &app.employee).await;
    assert_eq!(sales["total"], 0);
}

#[tokio::test]
async fn test_sale_with_trade_in_adds_the_received_phone() {
    let app = TestApp::new().await;
    let model_id = app.galaxy().await;
    let phone = app.new_phone(model_id, IMEI_A).await;
    let customer_id = app.customer("Carlos Lopez").await;

    let (status, sale) = app
        .post(
            "/sales",
            &app.employee,
            json!({
                "phone_id": phone["id"],
                "customer_id": customer_id,
                "payment_method": "transfer",
                "trade_in": {
                    "value_cents": 20_000_000,
                    "new_phone": { "model_id": model_id, "imei": IMEI_B, "battery_percentage": 81 }
                }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{sale}");
    assert_eq!(sale["has_trade_in"], true);
    assert_eq!(sale["final_price_cents"], 60_000_000);
    assert_eq!(sale["trade_in_phone"]["imei"], IMEI_B);
    assert_eq!(sale["trade_in_phone"]["condition"], "trade_in");

    let (_, received) = app.get(&format!("/phones/lookup/{IMEI_B}"), &app.employee).await;
    assert_eq!(received["status"], "available");
    assert_eq!(received["acquired_from"], customer_id);
}

// =============================================================================
// Reports & Catalog
// =============================================================================

#[tokio::test]
async fn test_reports_and_dashboard() {
    let app = TestApp::new().await;
    let model_id = app.galaxy().await;
    app.new_phone(model_id, IMEI_A).await;

    let (status, dashboard) = app.get("/dashboard", &app.employee).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["available"], 1);
    assert_eq!(dashboard["recent_phones"].as_array().unwrap().len(), 1);

    let (_, low) = app.get("/reports/low-stock", &app.admin).await;
    assert_eq!(low["threshold"], 5);
    assert_eq!(low["models"].as_array().unwrap().len(), 1);

    let (_, low) = app.get("/reports/low-stock?threshold=0", &app.admin).await;
    assert!(low["models"].as_array().unwrap().is_empty());

    let (status, bundle) = app.get("/reports", &app.admin).await;
    assert_eq!(status, StatusCode::OK);
    assert!(bundle.get("inventory").is_some());
    assert!(bundle.get("monthly_revenue").is_some());
}

#[tokio::test]
async fn test_model_update_replaces_the_form() {
    let app = TestApp::new().await;
    let model_id = app.galaxy().await;

    let (_, brands) = app.get("/brands", &app.employee).await;
    let brand_id = brands[0]["id"].clone();

    let (status, model) = app
        .send(
            Method::PATCH,
            &format!("/models/{model_id}"),
            Some(&app.employee),
            Some(json!({ "brand_id": brand_id, "name": "Galaxy S23 FE", "base_price_cents": 70_000_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(model["name"], "Galaxy S23 FE");
    assert_eq!(model["base_price_cents"], 70_000_000);

    let (status, _) = app
        .send(
            Method::PATCH,
            "/models/9999",
            Some(&app.employee),
            Some(json!({ "brand_id": brand_id, "name": "Nada" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send(Method::POST, "/models", Some(&app.employee), Some(json!({ "name": 5 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn test_customers_are_searchable() {
    let app = TestApp::new().await;
    app.customer("Juan Perez").await;
    app.customer("Maria Gomez").await;

    let (_, page) = app.get("/customers?search=maria", &app.employee).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["name"], "Maria Gomez");

    let (status, body) = app
        .post("/customers", &app.employee, json!({ "name": "Sin Mail", "email": "no-es-un-mail" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (status, _) = app.get("/customers/4242", &app.employee).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // keep the state handle alive for the whole test
    assert!(app.state.db.health_check().await);
}
