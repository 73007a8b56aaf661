//! Router assembly.
//!
//! `app()` builds the complete service from an [`AppState`], shared between
//! `main` and the integration tests. Resource routes are mounted from the
//! static definitions: each resource gets the generic handler set plus
//! whichever extras (stats, public views, status toggle) its definition
//! declares, with the definition itself installed as a request extension.

use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode, Uri};
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::handlers;
use crate::resources::{self, ResourceDef};
use crate::state::AppState;
use crate::store::now_timestamp;

pub fn app(state: AppState) -> Router {
    let mut api = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/me", get(handlers::auth::me))
        .nest("/admin", admin_routes());

    for def in resources::ALL.iter().copied() {
        api = api.nest(&format!("/{}", def.name), resource_routes(def));
    }

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .nest("/api", api)
        .fallback(not_found)
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn resource_routes(def: &'static ResourceDef) -> Router<AppState> {
    use handlers::resource as h;

    let create = if def.public_create { post(h::submit) } else { post(h::create) };

    let mut router = Router::new()
        .route("/", create.get(h::list))
        .route("/:id", get(h::get_by_id).put(h::update).delete(h::remove));

    if let Some(stats) = &def.stats {
        router = router.route(stats.route, get(h::stats));
    }
    if def.public_view.is_some() {
        router = router.route("/public/list", get(h::public_list));
    }
    if def.upcoming.is_some() {
        router = router.route("/public/upcoming", get(h::public_upcoming));
    }
    if def.toggle_noun.is_some() {
        router = router.route("/:id/status", put(h::set_active));
    }

    router.layer(Extension(def))
}

fn admin_routes() -> Router<AppState> {
    use handlers::admin as h;

    Router::new()
        .route("/add-admin", post(h::add_admin))
        .route("/admins", get(h::list_admins))
        .route("/admin/:id/status", put(h::set_admin_status))
        .route("/change-password", put(h::change_password))
}

/// GET / - service name, version and endpoint index
async fn index() -> Json<Value> {
    let mut endpoints = serde_json::Map::new();
    endpoints.insert("health".to_string(), json!("/health"));
    endpoints.insert("auth".to_string(), json!("/api/auth"));
    endpoints.insert("admin".to_string(), json!("/api/admin"));
    for def in resources::ALL {
        endpoints.insert(camel(def.name), json!(format!("/api/{}", def.name)));
    }

    Json(json!({
        "message": "Welcome to the LaunchPad Incubation Centre API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": endpoints,
    }))
}

/// GET /health - liveness plus a store round-trip
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let store_up = state.store.health().await.is_ok();
    let status = if store_up { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        status,
        Json(json!({
            "status": if store_up { "OK" } else { "degraded" },
            "message": "LaunchPad backend is running",
            "timestamp": now_timestamp(),
            "environment": state.config.environment.as_str(),
            "store": if store_up { "up" } else { "down" },
        })),
    )
}

async fn not_found(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "Route not found",
            "path": uri.path(),
        })),
    )
}

/// Permissive in development; an explicit origin list once one is configured.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

/// `pre-incubation` -> `preIncubation`, for the endpoint index.
fn camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '-' || c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_names_camel_case_for_the_index() {
        assert_eq!(camel("pre-incubation"), "preIncubation");
        assert_eq!(camel("blog"), "blog");
    }
}
