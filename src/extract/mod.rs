//! Authentication extractors.
//!
//! `AuthUser` reads the `Authorization` header, verifies the JWT, and loads
//! the account from the store, so a deleted account is locked out the moment
//! it is removed even if its token has not expired. `RequireAdmin` adds the
//! admin-tier role check on top.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::{self, USERS_COLLECTION};
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::Document;

const NO_TOKEN: &str = "No token, authorization denied";
const BAD_TOKEN: &str = "Token is not valid";

/// Authenticated account extracted from a Bearer token.
///
/// `user` is the stored account document with the password hash removed;
/// `role` is taken from the document, not the token, so a role change takes
/// effect on the next request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: String,
    pub user: Document,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::auth(NO_TOKEN))?;

        // A bare token without the Bearer prefix is accepted and will fail
        // verification on its own if it is not a JWT.
        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
        if token.is_empty() {
            return Err(ApiError::auth(NO_TOKEN));
        }

        let claims = auth::verify_token(token, &state.config.security.jwt_secret)
            .map_err(|_| ApiError::auth(BAD_TOKEN))?;
        let id: Uuid = claims.sub.parse().map_err(|_| ApiError::auth(BAD_TOKEN))?;

        let user = state
            .store
            .find_by_id(USERS_COLLECTION, id)
            .await?
            .ok_or_else(|| ApiError::auth(BAD_TOKEN))?;

        let role = user
            .get("role")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(AuthUser { id, role, user: auth::strip_password(user) })
    }
}

/// [`AuthUser`] plus the admin-tier role gate.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !auth::is_admin_role(&user.role) {
            return Err(ApiError::permission("Access denied. Admin role required."));
        }
        Ok(RequireAdmin(user))
    }
}
