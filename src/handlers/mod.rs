//! HTTP handlers, organized by gate:
//!
//! - `auth`: public login plus the authenticated profile endpoint
//! - `admin`: admin account management (admin gate, except change-password)
//! - `resource`: the generic content/intake handlers, driven by a
//!   [`ResourceDef`](crate::resources::ResourceDef) request extension

pub mod admin;
pub mod auth;
pub mod resource;

use std::collections::HashMap;

use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{identity_view, USERS_COLLECTION};
use crate::error::ApiError;
use crate::store::{Document, DocumentStore};

/// `{success: true, data}`
pub(crate) fn ok_data(data: Value) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

/// `{success: true, message}`
pub(crate) fn ok_message(message: &str) -> Json<Value> {
    Json(json!({ "success": true, "message": message }))
}

/// `{success: true, message, data}`
pub(crate) fn ok_message_data(message: &str, data: Value) -> Json<Value> {
    Json(json!({ "success": true, "message": message, "data": data }))
}

/// 201 variant of [`ok_message_data`].
pub(crate) fn created(message: &str, data: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, ok_message_data(message, data))
}

/// Path ids that do not parse answer with the resource's not-found message,
/// the same as a well-formed id that matches nothing.
pub(crate) fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found(not_found))
}

/// Replace admin-reference fields (`createdBy`, `updatedBy`, `respondedBy`)
/// with `{id, name, email}` blocks, resolved in one batch fetch across the
/// whole page. A reference to a deleted account stays a raw id string.
pub(crate) async fn populate_refs(
    store: &dyn DocumentStore,
    docs: &mut [Document],
    fields: &[&str],
) -> Result<(), ApiError> {
    if fields.is_empty() || docs.is_empty() {
        return Ok(());
    }

    let mut ids: Vec<Uuid> = Vec::new();
    for doc in docs.iter() {
        for field in fields {
            if let Some(Value::String(raw)) = doc.get(*field) {
                if let Ok(id) = raw.parse::<Uuid>() {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
        }
    }
    if ids.is_empty() {
        return Ok(());
    }

    let users = store.find_by_ids(USERS_COLLECTION, &ids).await?;
    let by_id: HashMap<String, Value> = users
        .iter()
        .filter_map(|user| {
            let id = user.get("id")?.as_str()?.to_string();
            Some((id, identity_view(user)))
        })
        .collect();

    for doc in docs.iter_mut() {
        for field in fields {
            let resolved = match doc.get(*field) {
                Some(Value::String(raw)) => by_id.get(raw.as_str()).cloned(),
                _ => None,
            };
            if let Some(view) = resolved {
                doc.insert(field.to_string(), view);
            }
        }
    }
    Ok(())
}

/// Single-document convenience over [`populate_refs`].
pub(crate) async fn populate_one(
    store: &dyn DocumentStore,
    doc: Document,
    fields: &[&str],
) -> Result<Document, ApiError> {
    let mut docs = [doc];
    populate_refs(store, &mut docs, fields).await?;
    let [doc] = docs;
    Ok(doc)
}
