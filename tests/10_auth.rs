//! Login, session tokens and the role gate.

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use launchpad_api_rust::auth::generate_token;
use serde_json::json;
use uuid::Uuid;

use common::{
    get, post, seed_account, seed_admin, test_app, ADMIN_EMAIL, ADMIN_PASSWORD, JWT_SECRET,
};

#[tokio::test]
async fn login_returns_a_token_and_profile() -> Result<()> {
    let app = test_app();
    seed_admin(&app).await?;

    let (status, body) = post(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Login successful"));
    assert_eq!(body["expiresIn"], json!(3600));
    assert_eq!(body["user"]["email"], json!(ADMIN_EMAIL));
    assert_eq!(body["user"]["role"], json!("admin"));
    assert!(body["user"].get("password").is_none());

    // The issued token works on the profile endpoint
    let token = body["token"].as_str().expect("token").to_string();
    let (status, body) = get(&app, "/api/auth/me", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], json!(ADMIN_EMAIL));
    assert!(body["data"].get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn login_email_is_case_insensitive() -> Result<()> {
    let app = test_app();
    seed_admin(&app).await?;

    let (status, _) = post(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": "Admin@Launchpad.Test", "password": ADMIN_PASSWORD }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn unknown_email_and_wrong_password_answer_identically() -> Result<()> {
    let app = test_app();
    seed_admin(&app).await?;

    let (status, body) = post(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": "ghost@launchpad.test", "password": "whatever-here" }),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], json!("Invalid credentials"));

    let (status, body) = post(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": ADMIN_EMAIL, "password": "not-the-password" }),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Invalid credentials"));
    Ok(())
}

#[tokio::test]
async fn deactivated_accounts_cannot_log_in() -> Result<()> {
    let app = test_app();
    seed_account(&app, "Parked Admin", "parked@launchpad.test", ADMIN_PASSWORD, "admin", false)
        .await?;

    let (status, body) = post(
        &app,
        "/api/auth/login",
        None,
        &json!({ "email": "parked@launchpad.test", "password": ADMIN_PASSWORD }),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], json!("Account is deactivated"));
    Ok(())
}

#[tokio::test]
async fn login_requires_both_fields() -> Result<()> {
    let app = test_app();

    let (status, body) = post(&app, "/api/auth/login", None, &json!({ "email": "x" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Validation error"));
    let errors = body["errors"].as_array().expect("errors");
    assert!(errors.contains(&json!("Email must be a valid email address")));
    assert!(errors.contains(&json!("Password is required")));
    Ok(())
}

#[tokio::test]
async fn protected_routes_demand_a_valid_token() -> Result<()> {
    let app = test_app();
    seed_admin(&app).await?;

    let (status, body) = get(&app, "/api/announcement", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], json!("No token, authorization denied"));

    let (status, body) = get(&app, "/api/announcement", Some("not-a-jwt")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], json!("Token is not valid"));

    // Signed with the wrong secret
    let forged = generate_token(Uuid::new_v4(), "admin", "some-other-secret", 1)?;
    let (status, body) = get(&app, "/api/announcement", Some(&forged)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], json!("Token is not valid"));

    // Valid signature, but no matching account
    let orphan = generate_token(Uuid::new_v4(), "admin", JWT_SECRET, 1)?;
    let (status, body) = get(&app, "/api/announcement", Some(&orphan)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], json!("Token is not valid"));
    Ok(())
}

#[tokio::test]
async fn admin_gate_refuses_other_roles() -> Result<()> {
    let app = test_app();
    let (_, token) =
        seed_account(&app, "Review Panel", "panel@launchpad.test", "panel-pass-123", "reviewer", true)
            .await?;

    let (status, body) = get(&app, "/api/announcement", Some(&token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], json!("Access denied. Admin role required."));

    // The profile endpoint only needs authentication
    let (status, _) = get(&app, "/api/auth/me", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn health_index_and_fallback() -> Result<()> {
    let app = test_app();

    let (status, body) = get(&app, "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("OK"));
    assert_eq!(body["store"], json!("up"));

    let (status, body) = get(&app, "/", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"]["auth"], json!("/api/auth"));
    assert_eq!(body["endpoints"]["preIncubation"], json!("/api/pre-incubation"));

    let (status, body) = get(&app, "/api/not-a-thing", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Route not found"));
    assert_eq!(body["path"], json!("/api/not-a-thing"));
    Ok(())
}
