//! Generic resource handlers.
//!
//! Every content and intake resource shares this handler set; the
//! [`ResourceDef`] arrives as a request extension installed by the router.
//! Which handlers are actually mounted per resource (public create, stats,
//! public views, the status toggle) is decided at mount time from the
//! definition, so a missing definition piece here is a plain 404.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::extract::{AuthUser, RequireAdmin};
use crate::listing::{page_payload, parse_params, Pagination, MAX_LIMIT};
use crate::resources::ResourceDef;
use crate::state::AppState;
use crate::store::{now_timestamp, Document, FilterSet, ListQuery, SortOrder};
use crate::validation::{label, validate_create, validate_update};

use super::{created, ok_data, ok_message, ok_message_data, parse_id, populate_one, populate_refs};

/// Documents returned in a stats `recent` sample.
const RECENT_LIMIT: i64 = 5;

/// POST /api/:resource - create a document (admin)
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    Extension(def): Extension<&'static ResourceDef>,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    insert_document(def, &state, &payload, Some(&admin)).await
}

/// POST /api/:resource - public intake (contact, applications)
pub async fn submit(
    Extension(def): Extension<&'static ResourceDef>,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    insert_document(def, &state, &payload, None).await
}

async fn insert_document(
    def: &'static ResourceDef,
    state: &AppState,
    payload: &Value,
    actor: Option<&AuthUser>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut doc = validate_create(def.create_fields, payload).map_err(ApiError::validation)?;

    if let Some(rule) = &def.unique {
        if let Some(value) = doc.get(rule.field) {
            if state
                .store
                .find_one(def.collection, rule.field, value)
                .await?
                .is_some()
            {
                return Err(ApiError::conflict(rule.message));
            }
        }
    }

    // Created directly in the published state counts as a publish transition.
    if let Some(rule) = &def.publish {
        if doc.get(rule.status_field).and_then(Value::as_str) == Some(rule.published_value) {
            doc.insert(rule.stamp_field.to_string(), Value::String(now_timestamp()));
        }
    }

    if let Some(hook) = def.create_hook {
        hook(&mut doc);
    }

    if def.audit {
        if let Some(actor) = actor {
            doc.insert("createdBy".to_string(), Value::String(actor.id.to_string()));
        }
    }

    let stored = state.store.insert(def.collection, doc).await?;
    let stored = populate_one(state.store.as_ref(), stored, def.populate).await?;
    Ok(created(def.messages.created, Value::Object(stored)))
}

/// GET /api/:resource - filtered, paginated listing (admin)
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    Extension(def): Extension<&'static ResourceDef>,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let parsed = parse_params(&def.list, &params).map_err(ApiError::invalid_query)?;

    // Window fetch and total count go out together.
    let (mut items, total) = tokio::try_join!(
        state.store.find(def.collection, &parsed.query),
        state.store.count(def.collection, &parsed.query.filter),
    )?;
    populate_refs(state.store.as_ref(), &mut items, def.populate).await?;

    let pagination = Pagination::new(parsed.page, parsed.limit, total);
    Ok(ok_data(page_payload(items, pagination)))
}

/// GET /api/:resource/:id (admin)
pub async fn get_by_id(
    RequireAdmin(_admin): RequireAdmin,
    Extension(def): Extension<&'static ResourceDef>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id, def.messages.not_found)?;
    let doc = state
        .store
        .find_by_id(def.collection, id)
        .await?
        .ok_or_else(|| ApiError::not_found(def.messages.not_found))?;
    let doc = populate_one(state.store.as_ref(), doc, def.populate).await?;
    Ok(ok_data(Value::Object(doc)))
}

/// PUT /api/:resource/:id - partial update (admin)
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    Extension(def): Extension<&'static ResourceDef>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id, def.messages.not_found)?;
    let mut patch =
        validate_update(&def.update_tables(), &payload).map_err(ApiError::validation)?;

    let existing = state
        .store
        .find_by_id(def.collection, id)
        .await?
        .ok_or_else(|| ApiError::not_found(def.messages.not_found))?;

    // Unique check, excluding the document being updated.
    if let Some(rule) = &def.unique {
        if let Some(value) = patch.get(rule.field) {
            if let Some(found) = state
                .store
                .find_one(def.collection, rule.field, value)
                .await?
            {
                let own_id = id.to_string();
                if found.get("id").and_then(Value::as_str) != Some(own_id.as_str()) {
                    return Err(ApiError::conflict(rule.message));
                }
            }
        }
    }

    // Entering the published state stamps the publish timestamp; staying
    // published or leaving it does not touch it.
    if let Some(rule) = &def.publish {
        let entering =
            patch.get(rule.status_field).and_then(Value::as_str) == Some(rule.published_value);
        let already =
            existing.get(rule.status_field).and_then(Value::as_str) == Some(rule.published_value);
        if entering && !already {
            patch.insert(rule.stamp_field.to_string(), Value::String(now_timestamp()));
        }
    }

    if let Some(hook) = def.update_hook {
        let actor_id = admin.id.to_string();
        hook(&mut patch, &actor_id);
    }

    if def.audit {
        patch.insert("updatedBy".to_string(), Value::String(admin.id.to_string()));
    }

    let updated = state
        .store
        .update(def.collection, id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found(def.messages.not_found))?;
    let updated = populate_one(state.store.as_ref(), updated, def.populate).await?;
    Ok(ok_message_data(def.messages.updated, Value::Object(updated)))
}

/// DELETE /api/:resource/:id - hard delete (admin)
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    Extension(def): Extension<&'static ResourceDef>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id, def.messages.not_found)?;
    if !state.store.delete(def.collection, id).await? {
        return Err(ApiError::not_found(def.messages.not_found));
    }
    Ok(ok_message(def.messages.deleted))
}

/// GET stats route - dashboard overview (admin)
pub async fn stats(
    RequireAdmin(_admin): RequireAdmin,
    Extension(def): Extension<&'static ResourceDef>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let Some(spec) = &def.stats else {
        return Err(ApiError::not_found("Route not found"));
    };
    let store = state.store.as_ref();

    let total = store.count(def.collection, &FilterSet::new()).await?;

    // One aggregate pass per categorical field, zero-filled from the enum.
    let grouped = store.count_grouped(def.collection, spec.status_field).await?;
    let mut by_status = serde_json::Map::new();
    for value in spec.status_values {
        by_status.insert(value.to_string(), json!(0));
    }
    for group in &grouped {
        by_status.insert(group.value.clone(), json!(group.count));
    }

    let mut data = serde_json::Map::new();
    data.insert("total".to_string(), json!(total));
    data.insert("byStatus".to_string(), Value::Object(by_status));

    if spec.active_count {
        let active = store
            .count(def.collection, &FilterSet::new().eq("isActive", Value::Bool(true)))
            .await?;
        data.insert("active".to_string(), json!(active));
    }

    if spec.newsletter_count {
        let subscribers = store
            .count(
                def.collection,
                &FilterSet::new().eq("subscribeNewsletter", Value::Bool(true)),
            )
            .await?;
        data.insert("newsletterSubscribers".to_string(), json!(subscribers));
    }

    let mut recent_query =
        ListQuery::new(spec.recent.sort_by, SortOrder::Desc, RECENT_LIMIT, 0);
    recent_query.filter =
        require_pairs(recent_query.filter, spec.recent.require, spec.recent.require_active);
    let recent = store.find(def.collection, &recent_query).await?;
    data.insert("recent".to_string(), json!(recent));

    let mut distributions = serde_json::Map::new();
    for field in spec.distributions {
        let groups = store.count_grouped(def.collection, field).await?;
        distributions.insert(field.to_string(), json!(groups));
    }
    data.insert("distributions".to_string(), Value::Object(distributions));

    Ok(ok_data(Value::Object(data)))
}

/// GET /api/:resource/public/list - unauthenticated read view
pub async fn public_list(
    Extension(def): Extension<&'static ResourceDef>,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let Some(view) = &def.public_view else {
        return Err(ApiError::not_found("Route not found"));
    };
    let mut errors = Vec::new();

    let limit = parse_limit(&params, view.default_limit, &mut errors);
    let order = if view.ascending { SortOrder::Asc } else { SortOrder::Desc };
    let mut query = ListQuery::new(view.sort_by, order, limit, 0);
    query.filter = require_pairs(query.filter, view.require, view.require_active);

    for filter in view.optional_filters {
        let Some(raw) = params.get(filter.param).map(|s| s.trim()) else {
            continue;
        };
        if raw.is_empty() || raw == "all" {
            continue;
        }
        if !filter.values.is_empty() && !filter.values.contains(&raw) {
            errors.push(format!(
                "{} filter must be one of: {}",
                label(filter.param),
                filter.values.join(", ")
            ));
            continue;
        }
        query.filter = query.filter.eq(filter.param, Value::String(raw.to_string()));
    }

    if let Some(term) = params.get("search").map(|s| s.trim()) {
        if term.chars().count() > 200 {
            errors.push("Search term cannot exceed 200 characters".to_string());
        } else if !term.is_empty() && !view.search_fields.is_empty() {
            query.filter = query.filter.search(view.search_fields, term);
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::invalid_query(errors));
    }

    let mut items = state.store.find(def.collection, &query).await?;
    for doc in &mut items {
        for field in view.exclude {
            doc.remove(*field);
        }
    }
    Ok(ok_data(json!(items)))
}

/// GET /api/:resource/public/upcoming - future-dated documents, soonest first
pub async fn public_upcoming(
    Extension(def): Extension<&'static ResourceDef>,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let Some(view) = &def.upcoming else {
        return Err(ApiError::not_found("Route not found"));
    };
    let mut errors = Vec::new();
    let limit = parse_limit(&params, view.default_limit, &mut errors);
    if !errors.is_empty() {
        return Err(ApiError::invalid_query(errors));
    }

    let mut query = ListQuery::new(view.date_field, SortOrder::Asc, limit, 0);
    query.filter = require_pairs(query.filter, view.require, true);
    query.filter = query.filter.range(view.date_field, Some(now_timestamp()), None);

    let items = state.store.find(def.collection, &query).await?;
    Ok(ok_data(json!(items)))
}

/// PUT /api/:resource/:id/status - set the active flag (admin)
pub async fn set_active(
    RequireAdmin(admin): RequireAdmin,
    Extension(def): Extension<&'static ResourceDef>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let Some(noun) = def.toggle_noun else {
        return Err(ApiError::not_found("Route not found"));
    };
    let id = parse_id(&id, def.messages.not_found)?;

    let Some(active) = payload.get("isActive").and_then(Value::as_bool) else {
        return Err(ApiError::validation(vec![
            "isActive must be a boolean value".to_string(),
        ]));
    };

    let mut patch = Document::new();
    patch.insert("isActive".to_string(), Value::Bool(active));
    if def.audit {
        patch.insert("updatedBy".to_string(), Value::String(admin.id.to_string()));
    }

    let updated = state
        .store
        .update(def.collection, id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found(def.messages.not_found))?;
    let updated = populate_one(state.store.as_ref(), updated, def.populate).await?;

    let verb = if active { "activated" } else { "deactivated" };
    Ok(ok_message_data(
        &format!("{noun} {verb} successfully"),
        Value::Object(updated),
    ))
}

fn parse_limit(
    params: &HashMap<String, String>,
    default_limit: i64,
    errors: &mut Vec<String>,
) -> i64 {
    match params.get("limit").map(String::as_str) {
        None | Some("") => default_limit,
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if (1..=MAX_LIMIT).contains(&n) => n,
            _ => {
                errors.push(format!("Limit must be between 1 and {MAX_LIMIT}"));
                default_limit
            }
        },
    }
}

/// Fold fixed field requirements (and the public active-only rule) into a
/// filter.
fn require_pairs(mut filter: FilterSet, pairs: &[(&str, &str)], active: bool) -> FilterSet {
    for (field, value) in pairs {
        filter = filter.eq(field, Value::String((*value).to_string()));
    }
    if active {
        filter = filter.eq("isActive", Value::Bool(true));
    }
    filter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Condition;

    #[test]
    fn fixed_requirements_fold_into_the_filter() {
        let filter = require_pairs(FilterSet::new(), &[("status", "published")], true);
        assert_eq!(filter.conditions.len(), 2);
        assert!(matches!(
            &filter.conditions[1],
            Condition::Eq { field, value } if field == "isActive" && value == &Value::Bool(true)
        ));
    }

    #[test]
    fn limit_outside_bounds_keeps_default_and_reports() {
        let mut errors = Vec::new();
        let params: HashMap<String, String> =
            [("limit".to_string(), "500".to_string())].into_iter().collect();
        assert_eq!(parse_limit(&params, 50, &mut errors), 50);
        assert_eq!(errors, vec!["Limit must be between 1 and 100".to_string()]);

        let none: HashMap<String, String> = HashMap::new();
        let mut errors = Vec::new();
        assert_eq!(parse_limit(&none, 10, &mut errors), 10);
        assert!(errors.is_empty());
    }
}
