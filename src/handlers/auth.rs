//! Login and the authenticated profile endpoint.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::auth::password::verify_password;
use crate::auth::{generate_token, USERS_COLLECTION};
use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::state::AppState;
use crate::validation::{validate_create, FieldSpec};

use super::ok_data;

const LOGIN_FIELDS: &[FieldSpec] = &[
    FieldSpec::email("email", None).required(),
    FieldSpec::text("password", None, None).required(),
];

/// POST /api/auth/login - exchange credentials for a session token
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let fields = validate_create(LOGIN_FIELDS, &payload).map_err(ApiError::validation)?;
    let email = fields.get("email").cloned().unwrap_or(Value::Null);
    let password = fields.get("password").and_then(Value::as_str).unwrap_or_default();

    // A missing account and a wrong password answer identically.
    let user = state
        .store
        .find_one(USERS_COLLECTION, "email", &email)
        .await?
        .ok_or_else(|| ApiError::auth("Invalid credentials"))?;

    let hash = user.get("password").and_then(Value::as_str).unwrap_or_default();
    let valid = match verify_password(password, hash) {
        Ok(valid) => valid,
        Err(err) => {
            tracing::warn!("stored password hash unreadable: {}", err);
            false
        }
    };
    if !valid {
        return Err(ApiError::auth("Invalid credentials"));
    }

    if user.get("isActive").and_then(Value::as_bool) == Some(false) {
        return Err(ApiError::auth("Account is deactivated"));
    }

    let id: uuid::Uuid = user
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .parse()
        .map_err(|_| ApiError::internal("Server error"))?;
    let role = user.get("role").and_then(Value::as_str).unwrap_or_default();

    let expiry_hours = state.config.security.jwt_expiry_hours as i64;
    let token = generate_token(id, role, &state.config.security.jwt_secret, expiry_hours)
        .map_err(|err| {
            tracing::error!("token generation failed: {}", err);
            ApiError::internal("Server error")
        })?;

    let field = |name: &str| user.get(name).cloned().unwrap_or(Value::Null);
    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "token": token,
        "expiresIn": expiry_hours * 3600,
        "user": {
            "id": field("id"),
            "name": field("name"),
            "email": field("email"),
            "role": field("role"),
        },
    })))
}

/// GET /api/auth/me - the caller's own profile
pub async fn me(auth: AuthUser) -> Json<Value> {
    ok_data(Value::Object(auth.user))
}
