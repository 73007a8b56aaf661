//! Shared harness for the integration suite: a router over the in-memory
//! store, plus helpers to seed accounts and fire JSON requests at it.
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use launchpad_api_rust::app::app;
use launchpad_api_rust::auth::password::hash_password;
use launchpad_api_rust::auth::{self, USERS_COLLECTION};
use launchpad_api_rust::config::{
    AppConfig, DatabaseConfig, Environment, SecurityConfig, ServerConfig, StoreBackend,
};
use launchpad_api_rust::state::AppState;
use launchpad_api_rust::store::{Document, DocumentStore, MemStore};

pub const JWT_SECRET: &str = "integration-test-secret";
pub const ADMIN_EMAIL: &str = "admin@launchpad.test";
pub const ADMIN_PASSWORD: &str = "rocket-stage-one";

/// The router under test plus a direct handle on its backing store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemStore>,
}

/// Fresh router over an empty in-memory store.
pub fn test_app() -> TestApp {
    let store = Arc::new(MemStore::new());
    let state = AppState::new(store.clone(), test_config());
    TestApp { router: app(state), store }
}

fn test_config() -> AppConfig {
    AppConfig {
        environment: Environment::Development,
        server: ServerConfig { host: "127.0.0.1".to_string(), port: 0 },
        database: DatabaseConfig {
            backend: StoreBackend::Memory,
            url: None,
            max_connections: 1,
            connection_timeout_secs: 5,
        },
        security: SecurityConfig {
            jwt_secret: JWT_SECRET.to_string(),
            jwt_expiry_hours: 1,
            cors_origins: Vec::new(),
            bootstrap_admin_name: "Administrator".to_string(),
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
        },
    }
}

/// Insert an account straight into the store and mint a matching token.
pub async fn seed_account(
    app: &TestApp,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
    active: bool,
) -> Result<(Uuid, String)> {
    let hash = hash_password(password).map_err(|e| anyhow::anyhow!("hash_password: {e}"))?;
    let mut doc = Document::new();
    doc.insert("name".to_string(), json!(name));
    doc.insert("email".to_string(), json!(email));
    doc.insert("password".to_string(), json!(hash));
    doc.insert("role".to_string(), json!(role));
    doc.insert("isActive".to_string(), json!(active));
    let stored = app.store.insert(USERS_COLLECTION, doc).await?;

    let id: Uuid = stored
        .get("id")
        .and_then(Value::as_str)
        .context("seeded account has no id")?
        .parse()?;
    let token = auth::generate_token(id, role, JWT_SECRET, 1)?;
    Ok((id, token))
}

/// The admin fixture most tests start from.
pub async fn seed_admin(app: &TestApp) -> Result<(Uuid, String)> {
    seed_account(app, "Test Admin", ADMIN_EMAIL, ADMIN_PASSWORD, "admin", true).await
}

/// Fire one request at the router and decode the JSON response body.
pub async fn send(
    app: &TestApp,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .with_context(|| format!("non-JSON body for {method} {path}"))?
    };
    Ok((status, value))
}

pub async fn get(app: &TestApp, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
    send(app, "GET", path, token, None).await
}

pub async fn post(
    app: &TestApp,
    path: &str,
    token: Option<&str>,
    body: &Value,
) -> Result<(StatusCode, Value)> {
    send(app, "POST", path, token, Some(body)).await
}

pub async fn put(
    app: &TestApp,
    path: &str,
    token: Option<&str>,
    body: &Value,
) -> Result<(StatusCode, Value)> {
    send(app, "PUT", path, token, Some(body)).await
}

pub async fn delete(app: &TestApp, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
    send(app, "DELETE", path, token, None).await
}

/// The `data.items` array of a list envelope.
pub fn items(body: &Value) -> &Vec<Value> {
    body["data"]["items"].as_array().expect("items array in list body")
}
