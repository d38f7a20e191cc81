//! In-process scenario tests for ssb-daemon HTTP endpoints.
//!
//! Each test builds the router over a MemoryStore and drives it via
//! `tower::ServiceExt::oneshot`. No TCP socket is bound.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use ssb_daemon::{routes, state};
use ssb_inventory::{AccountService, LocalAccountService};
use ssb_store::MemoryStore;
use tower::ServiceExt; // oneshot

const EMAIL: &str = "chef@depot.fr";
const PASSWORD: &str = "secret123";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    state: Arc<state::AppState>,
    store: MemoryStore,
}

async fn harness() -> Harness {
    let store = MemoryStore::new();
    let accounts = Arc::new(LocalAccountService::default().with_hash_cost(4));
    accounts.create_account(EMAIL, PASSWORD).await.unwrap();
    let state = Arc::new(state::AppState::new(
        Arc::new(store.clone()),
        accounts,
        Some("bienvenue1".to_string()),
    ));
    Harness { state, store }
}

impl Harness {
    async fn call(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = routes::build_router(Arc::clone(&self.state))
            .oneshot(req)
            .await
            .expect("oneshot failed");
        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .expect("body collect failed")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body is not valid JSON")
        };
        (status, body)
    }

    async fn token(&self) -> String {
        let (status, body) = self
            .call(json_req("POST", "/v1/auth/login", None, json!({"email": EMAIL, "password": PASSWORD})))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    fn seed_sucre(&self) {
        self.store
            .seed("produits/p1", json!({"designation": "Sucre", "poids_unitaire": 1, "qte_par_lot": 20}))
            .unwrap();
        self.store
            .seed("zone/z1", json!({"zone": "A1", "designation_prod": "sucre", "qte_total_unites": 45, "unite_par_lot": 20, "status_stock": 1}))
            .unwrap();
        self.store
            .seed("zone/z2", json!({"zone": "B2", "designation_prod": "Sucre", "qte_total_unites": 5, "unite_par_lot": 20, "status_stock": 1}))
            .unwrap();
        self.store
            .seed("poids/c1", json!({"prod_sortie": "Sucre", "zone_prod": "A1", "poids": 25}))
            .unwrap();
    }
}

fn req(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        b = b.header("authorization", format!("Bearer {t}"));
    }
    b.body(Body::empty()).unwrap()
}

fn json_req(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut b = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(t) = token {
        b = b.header("authorization", format!("Bearer {t}"));
    }
    b.body(Body::from(body.to_string())).unwrap()
}

// ---------------------------------------------------------------------------
// Health / auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_is_public() {
    let h = harness().await;
    let (status, body) = h.call(req("GET", "/v1/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["service"], "ssb-daemon");
    assert_eq!(body["store_backend"], "memory");
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let h = harness().await;
    let (status, body) = h.call(req("GET", "/v1/products", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "auth");

    let (status, _) = h.call(req("GET", "/v1/synthesis", Some("not-a-token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_failure_returns_french_message_and_code() {
    let h = harness().await;
    let (status, body) = h
        .call(json_req("POST", "/v1/auth/login", None, json!({"email": EMAIL, "password": "nope"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Mot de passe incorrect.");
    assert_eq!(body["code"], "auth/wrong-password");
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let h = harness().await;
    let token = h.token().await;

    let (status, _) = h.call(req("POST", "/v1/auth/logout", Some(&token))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = h.call(req("GET", "/v1/products", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Products / zones
// ---------------------------------------------------------------------------

#[tokio::test]
async fn product_create_list_and_duplicate() {
    let h = harness().await;
    let token = h.token().await;

    let (status, body) = h
        .call(json_req(
            "POST",
            "/v1/products",
            Some(&token),
            json!({"designation": "Farine", "unit_weight": "2", "units_per_lot": 10}),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["designation"], "Farine");
    assert_eq!(body["poids_total"], json!(20.0));
    assert!(body["id"].is_string());

    let (status, body) = h
        .call(json_req(
            "POST",
            "/v1/products",
            Some(&token),
            json!({"designation": " farine", "unit_weight": 1, "units_per_lot": 5}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let (status, body) = h.call(req("GET", "/v1/products", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn zone_quantity_adjust_and_not_found() {
    let h = harness().await;
    h.seed_sucre();
    let token = h.token().await;

    let (status, body) = h
        .call(json_req(
            "POST",
            "/v1/zones/z1/quantity",
            Some(&token),
            json!({"lots": "3", "units": 2}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["qte_total_unites"], 62);
    assert_eq!(body["stock_label"], "3 lot(s) 2 unité(s)");

    let (status, body) = h
        .call(json_req("POST", "/v1/zones/ghost/quantity", Some(&token), json!({"lots": 1})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn zone_labels_are_sorted_and_distinct() {
    let h = harness().await;
    h.seed_sucre();
    h.store
        .seed("zone/z3", json!({"zone": "A1", "designation_prod": "Sel", "qte_total_unites": 1}))
        .unwrap();
    let token = h.token().await;

    let (status, body) = h.call(req("GET", "/v1/zones/labels", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["zones"], json!(["A1", "B2"]));
}

// ---------------------------------------------------------------------------
// Synthesis / reset
// ---------------------------------------------------------------------------

#[tokio::test]
async fn synthesis_rows_carry_display_labels() {
    let h = harness().await;
    h.seed_sucre();
    let token = h.token().await;

    let (status, body) = h.call(req("GET", "/v1/synthesis?zone=A1", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["zone_filter"], "A1");
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["consumed_units"], 25);
    assert_eq!(rows[0]["initial_label"], "2 lot(s) 5 unité(s)");
    assert_eq!(rows[0]["consumed_label"], "1 lot(s) 5 unité(s)");
    assert_eq!(rows[0]["remaining_label"], "1 lot(s)");
    assert_eq!(rows[0]["status"], "IN_STOCK");
    assert_eq!(rows[0]["status_label"], "En stock");

    let (_, body) = h.call(req("GET", "/v1/synthesis", Some(&token))).await;
    assert_eq!(body["rows"].as_array().unwrap().len(), 2);
    assert!(body["zone_filter"].is_null());
}

#[tokio::test]
async fn reset_reports_count_and_clears_consumption() {
    let h = harness().await;
    h.seed_sucre();
    let token = h.token().await;

    let (status, body) = h
        .call(json_req(
            "POST",
            "/v1/synthesis/reset",
            Some(&token),
            json!({"product": "sucre", "zone": "a1"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);

    let (_, body) = h.call(req("GET", "/v1/consumption", Some(&token))).await;
    assert!(body.as_array().unwrap().is_empty());

    let (_, body) = h.call(req("GET", "/v1/synthesis?zone=A1", Some(&token))).await;
    assert_eq!(body["rows"][0]["consumed_units"], 0);
}

#[tokio::test]
async fn reset_without_arguments_is_a_validation_error() {
    let h = harness().await;
    let token = h.token().await;
    let (status, body) = h
        .call(json_req("POST", "/v1/synthesis/reset", Some(&token), json!({"product": "Sucre"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Veuillez spécifier un produit et une zone.");
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn users_create_with_initial_password_then_delete() {
    let h = harness().await;
    let token = h.token().await;

    let (status, body) = h
        .call(json_req("POST", "/v1/users", Some(&token), json!({"email": "aide@depot.fr"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "user");
    let uid = body["id"].as_str().unwrap().to_string();

    // The new account signs in with the configured initial password.
    let (status, _) = h
        .call(json_req(
            "POST",
            "/v1/auth/login",
            None,
            json!({"email": "aide@depot.fr", "password": "bienvenue1"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = h.call(req("GET", "/v1/users", Some(&token))).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = h.call(req("DELETE", &format!("/v1/users/{uid}"), Some(&token))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = h.call(req("DELETE", &format!("/v1/users/{uid}"), Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_user_email_is_rejected() {
    let h = harness().await;
    let token = h.token().await;
    let (status, body) = h
        .call(json_req("POST", "/v1/users", Some(&token), json!({"email": EMAIL, "password": "abcdef"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "auth/email-already-in-use");
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[tokio::test]
async fn admin_bootstrap_is_idempotent_across_restarts() {
    let store = MemoryStore::new();
    let mut last = None;
    for _ in 0..3 {
        // Each start brings a fresh in-memory account service.
        let st = Arc::new(state::AppState::new(
            Arc::new(store.clone()),
            Arc::new(LocalAccountService::default().with_hash_cost(4)),
            None,
        ));
        st.bootstrap_admin("admin@depot.fr", "admin-secret").await.unwrap();
        last = Some(st);
    }

    let users = ssb_inventory::list_users(&store).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users.values().next().unwrap().role, "admin");

    let h = Harness { state: last.unwrap(), store };
    let (status, _) = h
        .call(json_req(
            "POST",
            "/v1/auth/login",
            None,
            json!({"email": "admin@depot.fr", "password": "admin-secret"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}
