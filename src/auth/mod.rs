//! JWT session tokens and role definitions.
//!
//! Tokens are HS256-signed JWTs carrying a [`Claims`] payload. There is no
//! refresh flow: a token is valid until its `exp` passes, and the extractor
//! re-checks the user against the store on every request.

pub mod password;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::store::Document;

/// Collection holding admin/user accounts.
pub const USERS_COLLECTION: &str = "users";

/// Every role an account can hold.
pub const ROLES: &[&str] = &["admin", "super_admin", "reviewer", "applicant"];

/// Roles allowed through the admin gate.
pub const ADMIN_ROLES: &[&str] = &["admin", "super_admin"];

pub fn is_admin_role(role: &str) -> bool {
    ADMIN_ROLES.contains(&role)
}

/// JWT claims embedded in every session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject, the user's id.
    pub sub: String,
    /// The user's role at issue time.
    pub role: String,
    /// Issued-at (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration (UTC Unix timestamp).
    pub exp: i64,
}

/// Sign a session token for the given user.
pub fn generate_token(
    user_id: Uuid,
    role: &str,
    secret: &str,
    expiry_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        iat: now,
        exp: now + expiry_hours * 3600,
    };
    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate signature and expiry, returning the embedded [`Claims`].
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(data.claims)
}

/// The user document as returned by the API: everything but the password hash.
pub fn strip_password(mut user: Document) -> Document {
    user.remove("password");
    user
}

/// The compact identity block embedded in login responses and populated
/// reference fields.
pub fn identity_view(user: &Document) -> Value {
    let field = |name: &str| user.get(name).cloned().unwrap_or(Value::Null);
    serde_json::json!({
        "id": field("id"),
        "name": field("name"),
        "email": field("email"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

    #[test]
    fn token_roundtrip_preserves_identity() {
        let id = Uuid::new_v4();
        let token = generate_token(id, "admin", SECRET, 24).expect("token should sign");
        let claims = verify_token(&token, SECRET).expect("token should verify");
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_token(Uuid::new_v4(), "admin", SECRET, 24).expect("token should sign");
        assert!(verify_token(&token, "different-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token =
            generate_token(Uuid::new_v4(), "admin", SECRET, -1).expect("token should sign");
        assert!(verify_token(&token, SECRET).is_err());
    }

    #[test]
    fn admin_tier_is_exactly_two_roles() {
        assert!(is_admin_role("admin"));
        assert!(is_admin_role("super_admin"));
        assert!(!is_admin_role("reviewer"));
        assert!(!is_admin_role("applicant"));
    }

    #[test]
    fn strip_password_removes_only_the_hash() {
        let mut user = Document::new();
        user.insert("email".to_string(), serde_json::json!("a@b.co"));
        user.insert("password".to_string(), serde_json::json!("$argon2id$..."));
        let public = strip_password(user);
        assert!(!public.contains_key("password"));
        assert!(public.contains_key("email"));
    }
}
