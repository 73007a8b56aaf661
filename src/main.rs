use std::sync::Arc;

use serde_json::Value;
use tracing_subscriber::EnvFilter;

use launchpad_api_rust::app::app;
use launchpad_api_rust::auth::{password, USERS_COLLECTION};
use launchpad_api_rust::config::{AppConfig, StoreBackend};
use launchpad_api_rust::resources;
use launchpad_api_rust::state::AppState;
use launchpad_api_rust::store::{Document, DocumentStore, FilterSet, MemStore, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "launchpad_api_rust=info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    config.validate()?;

    let store: Arc<dyn DocumentStore> = match config.database.backend {
        StoreBackend::Postgres => {
            let store = PgStore::connect(&config.database).await?;
            store.ensure_collections(&resources::collections()).await?;
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store, data will not survive a restart");
            Arc::new(MemStore::new())
        }
    };

    bootstrap_admin(store.as_ref(), &config).await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let environment = config.environment.as_str();
    let router = app(AppState::new(store.clone(), config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    println!("🚀 LaunchPad API listening on http://{}", addr);
    tracing::info!("environment: {}", environment);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    Ok(())
}

/// First-run account: when no users exist and bootstrap credentials are
/// configured, create the initial super admin so login is possible at all.
async fn bootstrap_admin(store: &dyn DocumentStore, config: &AppConfig) -> anyhow::Result<()> {
    let existing = store.count(USERS_COLLECTION, &FilterSet::new()).await?;
    if existing > 0 {
        return Ok(());
    }

    let (Some(email), Some(pass)) = (
        &config.security.bootstrap_admin_email,
        &config.security.bootstrap_admin_password,
    ) else {
        tracing::warn!("no accounts exist and no bootstrap admin is configured, logins will fail");
        return Ok(());
    };

    let hash = password::hash_password(pass.trim())
        .map_err(|err| anyhow::anyhow!("bootstrap admin password hash failed: {err}"))?;

    let mut doc = Document::new();
    doc.insert("name".to_string(), Value::String(config.security.bootstrap_admin_name.clone()));
    doc.insert("email".to_string(), Value::String(email.trim().to_lowercase()));
    doc.insert("password".to_string(), Value::String(hash));
    doc.insert("role".to_string(), Value::String("super_admin".to_string()));
    doc.insert("isActive".to_string(), Value::Bool(true));
    store.insert(USERS_COLLECTION, doc).await?;

    tracing::info!("bootstrap admin account created");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
    }
}
