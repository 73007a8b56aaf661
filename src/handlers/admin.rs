//! Admin account management.
//!
//! Accounts live in the `users` collection next to everything else but get
//! bespoke handlers: password hashing, the self-deactivation guard and the
//! admin-tier listing do not fit the generic resource path.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{strip_password, ADMIN_ROLES, USERS_COLLECTION};
use crate::error::ApiError;
use crate::extract::{AuthUser, RequireAdmin};
use crate::listing::{page_payload, parse_params, ListRules, Pagination};
use crate::state::AppState;
use crate::store::Document;
use crate::validation::{validate_create, FieldSpec};

use super::{created, ok_data, ok_message, ok_message_data, parse_id, populate_refs};

const ADMIN_NOT_FOUND: &str = "Admin user not found";

const ADD_ADMIN_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name", Some(2), Some(100)).required(),
    FieldSpec::email("email", None).required(),
    FieldSpec::text("password", Some(8), None).required(),
    FieldSpec::enumeration("role", ADMIN_ROLES).default_text("admin"),
];

const CHANGE_PASSWORD_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("currentPassword", None, None).required(),
    FieldSpec::text("newPassword", Some(8), None).required(),
];

const LIST_RULES: ListRules =
    ListRules::new(&["name", "email"], &["createdAt"], "createdAt", 10);

fn hash_error(err: argon2::password_hash::Error) -> ApiError {
    tracing::error!("password hash error: {}", err);
    ApiError::internal("Server error")
}

/// POST /api/admin/add-admin - create an admin account
pub async fn add_admin(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut doc = validate_create(ADD_ADMIN_FIELDS, &payload).map_err(ApiError::validation)?;

    let email = doc.get("email").cloned().unwrap_or(Value::Null);
    if state
        .store
        .find_one(USERS_COLLECTION, "email", &email)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("User with this email already exists"));
    }

    let plain = doc
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let hash = hash_password(&plain).map_err(hash_error)?;
    doc.insert("password".to_string(), Value::String(hash));
    doc.insert("isActive".to_string(), Value::Bool(true));
    doc.insert("createdBy".to_string(), Value::String(admin.id.to_string()));

    let stored = state.store.insert(USERS_COLLECTION, doc).await?;

    // Answer with the account profile, never the stored document.
    let field = |name: &str| stored.get(name).cloned().unwrap_or(Value::Null);
    let data = json!({
        "id": field("id"),
        "name": field("name"),
        "email": field("email"),
        "role": field("role"),
        "isActive": field("isActive"),
        "createdAt": field("createdAt"),
    });
    Ok(created("Admin user created successfully", data))
}

/// GET /api/admin/admins - paginated admin-tier account listing
pub async fn list_admins(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let parsed = parse_params(&LIST_RULES, &params).map_err(ApiError::invalid_query)?;

    let mut query = parsed.query;
    query.filter = query.filter.any_of(
        "role",
        ADMIN_ROLES.iter().map(|role| Value::String((*role).to_string())).collect(),
    );

    let (admins, total) = tokio::try_join!(
        state.store.find(USERS_COLLECTION, &query),
        state.store.count(USERS_COLLECTION, &query.filter),
    )?;

    let mut admins: Vec<Document> = admins.into_iter().map(strip_password).collect();
    populate_refs(state.store.as_ref(), &mut admins, &["createdBy", "updatedBy"]).await?;

    let pagination = Pagination::new(parsed.page, parsed.limit, total);
    Ok(ok_data(page_payload(admins, pagination)))
}

/// PUT /api/admin/admin/:id/status - activate or deactivate an account
pub async fn set_admin_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id, ADMIN_NOT_FOUND)?;
    // Self-lockout guard, whichever direction the flag points.
    if id == admin.id {
        return Err(ApiError::bad_request("You cannot deactivate your own account"));
    }

    let Some(active) = payload.get("isActive").and_then(Value::as_bool) else {
        return Err(ApiError::validation(vec![
            "isActive must be a boolean value".to_string(),
        ]));
    };

    let mut patch = Document::new();
    patch.insert("isActive".to_string(), Value::Bool(active));
    patch.insert("updatedBy".to_string(), Value::String(admin.id.to_string()));

    let updated = state
        .store
        .update(USERS_COLLECTION, id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found(ADMIN_NOT_FOUND))?;

    let verb = if active { "activated" } else { "deactivated" };
    Ok(ok_message_data(
        &format!("Admin {verb} successfully"),
        Value::Object(strip_password(updated)),
    ))
}

/// PUT /api/admin/change-password - change the caller's own password
pub async fn change_password(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let fields =
        validate_create(CHANGE_PASSWORD_FIELDS, &payload).map_err(ApiError::validation)?;
    let current = fields.get("currentPassword").and_then(Value::as_str).unwrap_or_default();
    let update = fields.get("newPassword").and_then(Value::as_str).unwrap_or_default();

    // Reload the account: the extractor strips the stored hash.
    let user = state
        .store
        .find_by_id(USERS_COLLECTION, auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let hash = user.get("password").and_then(Value::as_str).unwrap_or_default();

    if !verify_password(current, hash).map_err(hash_error)? {
        return Err(ApiError::bad_request("Current password is incorrect"));
    }

    let mut patch = Document::new();
    patch.insert(
        "password".to_string(),
        Value::String(hash_password(update).map_err(hash_error)?),
    );
    patch.insert("updatedBy".to_string(), Value::String(auth.id.to_string()));
    state.store.update(USERS_COLLECTION, auth.id, patch).await?;

    Ok(ok_message("Password changed successfully"))
}
