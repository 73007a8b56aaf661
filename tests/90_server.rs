//! Spawns the real binary on the in-memory backend and smokes the public
//! surface over actual HTTP: health, the endpoint index, the 404 fallback
//! and a bootstrap-admin login.

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

const BOOTSTRAP_EMAIL: &str = "bootstrap@launchpad.test";
const BOOTSTRAP_PASSWORD: &str = "orbital-insertion";

struct TestServer {
    base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let child = Command::new(env!("CARGO_BIN_EXE_launchpad-api-rust"))
            .env("PORT", port.to_string())
            .env("HOST", "127.0.0.1")
            .env("STORE_BACKEND", "memory")
            .env("BOOTSTRAP_ADMIN_EMAIL", BOOTSTRAP_EMAIL)
            .env("BOOTSTRAP_ADMIN_PASSWORD", BOOTSTRAP_PASSWORD)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("failed to spawn server binary")?;

        Ok(Self { base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[tokio::test]
async fn server_smoke() -> Result<()> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;
    let client = reqwest::Client::new();

    // Health reports the store round-trip.
    let resp = client.get(format!("{}/health", server.base_url)).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["status"], json!("OK"));
    assert_eq!(body["store"], json!("up"));
    assert!(body["timestamp"].is_string());

    // Index lists the mounted route families.
    let resp = client.get(&server.base_url).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["endpoints"]["announcement"], json!("/api/announcement"));
    assert_eq!(body["endpoints"]["preIncubation"], json!("/api/pre-incubation"));

    // Unknown paths hit the fallback with the path echoed back.
    let resp = client.get(format!("{}/api/nope", server.base_url)).send().await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await?;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["path"], json!("/api/nope"));

    // The bootstrap admin seeded at startup can log in.
    let resp = client
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&json!({ "email": BOOTSTRAP_EMAIL, "password": BOOTSTRAP_PASSWORD }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    let token = body["token"].as_str().context("login token")?.to_string();
    assert!(!token.is_empty());
    assert_eq!(body["user"]["role"], json!("super_admin"));
    assert!(body["user"].get("password").is_none());

    // An admin-gated list requires the credential end to end.
    let resp = client.get(format!("{}/api/blog", server.base_url)).send().await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = client
        .get(format!("{}/api/blog", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["data"]["pagination"]["totalItems"], json!(0));

    Ok(())
}
