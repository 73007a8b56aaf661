//! Postgres store backend.
//!
//! One table per collection: `id UUID PRIMARY KEY, doc JSONB, created_at,
//! updated_at`. The document itself carries `id`/`createdAt`/`updatedAt` as
//! well, so reads return wire-ready JSON without row mapping. Filtering uses
//! JSONB containment (`doc @> ...`) for typed equality and `doc->>'field'`
//! text extraction for substring and range matching.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::config::DatabaseConfig;

use super::{
    is_valid_name, now_timestamp, Condition, Document, DocumentStore, FilterSet, GroupCount,
    ListQuery, StoreError,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Connection("DATABASE_URL is not set".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create any missing collection tables. Runs at startup, before the
    /// first request is served.
    pub async fn ensure_collections(&self, collections: &[&str]) -> Result<(), StoreError> {
        for name in collections {
            checked_name(name)?;
            let ddl = format!(
                "CREATE TABLE IF NOT EXISTS \"{name}\" (\
                 id UUID PRIMARY KEY, \
                 doc JSONB NOT NULL, \
                 created_at TIMESTAMPTZ NOT NULL, \
                 updated_at TIMESTAMPTZ NOT NULL)"
            );
            sqlx::query(&ddl).execute(&self.pool).await?;

            let index = format!(
                "CREATE INDEX IF NOT EXISTS \"idx_{name}_doc\" \
                 ON \"{name}\" USING GIN (doc jsonb_path_ops)"
            );
            sqlx::query(&index).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn insert(&self, collection: &str, mut doc: Document) -> Result<Document, StoreError> {
        checked_name(collection)?;
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();
        let stamp = super::timestamp(now);
        doc.insert("id".to_string(), Value::String(id.to_string()));
        doc.insert("createdAt".to_string(), Value::String(stamp.clone()));
        doc.insert("updatedAt".to_string(), Value::String(stamp));

        let sql = format!(
            "INSERT INTO \"{collection}\" (id, doc, created_at, updated_at) \
             VALUES ($1, $2, $3, $3)"
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(Value::Object(doc.clone()))
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(doc)
    }

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        checked_name(collection)?;
        let sql = format!("SELECT doc FROM \"{collection}\" WHERE id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(|r| r.try_get::<Value, _>("doc")).transpose()?.and_then(into_document))
    }

    async fn find_by_ids(
        &self,
        collection: &str,
        ids: &[Uuid],
    ) -> Result<Vec<Document>, StoreError> {
        checked_name(collection)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT doc FROM \"{collection}\" WHERE id = ANY($1)");
        let rows = sqlx::query(&sql).bind(ids.to_vec()).fetch_all(&self.pool).await?;
        collect_documents(rows)
    }

    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>, StoreError> {
        checked_name(collection)?;
        checked_name(field)?;
        let sql = format!("SELECT doc FROM \"{collection}\" WHERE doc @> $1 LIMIT 1");
        let row = sqlx::query(&sql)
            .bind(json!({ field: value }))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.try_get::<Value, _>("doc")).transpose()?.and_then(into_document))
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        mut patch: Document,
    ) -> Result<Option<Document>, StoreError> {
        checked_name(collection)?;
        let now = chrono::Utc::now();
        patch.insert("updatedAt".to_string(), Value::String(super::timestamp(now)));

        let sql = format!(
            "UPDATE \"{collection}\" SET doc = doc || $2, updated_at = $3 \
             WHERE id = $1 RETURNING doc"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(Value::Object(patch))
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.try_get::<Value, _>("doc")).transpose()?.and_then(into_document))
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        checked_name(collection)?;
        let sql = format!("DELETE FROM \"{collection}\" WHERE id = $1");
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, collection: &str, query: &ListQuery) -> Result<Vec<Document>, StoreError> {
        checked_name(collection)?;
        checked_name(&query.sort_by)?;
        let (where_clause, params) = build_where(&query.filter, 0)?;

        let sql = format!(
            "SELECT doc FROM \"{collection}\" WHERE {where_clause} \
             ORDER BY doc->>'{sort}' {order} NULLS LAST \
             LIMIT {limit} OFFSET {offset}",
            sort = query.sort_by,
            order = query.order.as_sql(),
            limit = query.limit.max(0),
            offset = query.offset.max(0),
        );

        let mut q = sqlx::query(&sql);
        for param in &params {
            q = bind_value(q, param);
        }
        collect_documents(q.fetch_all(&self.pool).await?)
    }

    async fn count(&self, collection: &str, filter: &FilterSet) -> Result<u64, StoreError> {
        checked_name(collection)?;
        let (where_clause, params) = build_where(filter, 0)?;
        let sql = format!("SELECT COUNT(*) AS count FROM \"{collection}\" WHERE {where_clause}");

        let mut q = sqlx::query(&sql);
        for param in &params {
            q = bind_value(q, param);
        }
        let row = q.fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn count_grouped(
        &self,
        collection: &str,
        field: &str,
    ) -> Result<Vec<GroupCount>, StoreError> {
        checked_name(collection)?;
        checked_name(field)?;
        let sql = format!(
            "SELECT doc->>$1 AS value, COUNT(*) AS count FROM \"{collection}\" \
             WHERE doc->>$1 IS NOT NULL GROUP BY 1 ORDER BY 2 DESC, 1 ASC"
        );
        let rows = sqlx::query(&sql).bind(field).fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| {
                let value: String = row.try_get("value")?;
                let count: i64 = row.try_get("count")?;
                Ok(GroupCount { value, count: count.max(0) as u64 })
            })
            .collect()
    }

    async fn health(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn checked_name(name: &str) -> Result<(), StoreError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

fn into_document(value: Value) -> Option<Document> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn collect_documents(rows: Vec<sqlx::postgres::PgRow>) -> Result<Vec<Document>, StoreError> {
    rows.into_iter()
        .map(|row| {
            let doc: Value = row.try_get("doc")?;
            Ok(into_document(doc).unwrap_or_default())
        })
        .collect()
}

/// Translate a [`FilterSet`] into a WHERE clause with `$N` placeholders,
/// returning the parameter values in placeholder order. `start_index` is the
/// number of placeholders already consumed by the surrounding statement.
fn build_where(filter: &FilterSet, start_index: usize) -> Result<(String, Vec<Value>), StoreError> {
    let mut params: Vec<Value> = Vec::new();
    let mut index = start_index;
    let mut push = |params: &mut Vec<Value>, value: Value| -> String {
        params.push(value);
        index += 1;
        format!("${index}")
    };

    let mut clauses: Vec<String> = Vec::new();
    for condition in &filter.conditions {
        match condition {
            Condition::Eq { field, value } => {
                checked_name(field)?;
                let placeholder = push(&mut params, json!({ field.clone(): value.clone() }));
                clauses.push(format!("doc @> {placeholder}"));
            }
            Condition::In { field, values } => {
                checked_name(field)?;
                if values.is_empty() {
                    clauses.push("1=0".to_string());
                    continue;
                }
                let parts: Vec<String> = values
                    .iter()
                    .map(|value| {
                        let placeholder =
                            push(&mut params, json!({ field.clone(): value.clone() }));
                        format!("doc @> {placeholder}")
                    })
                    .collect();
                clauses.push(format!("({})", parts.join(" OR ")));
            }
            Condition::Search { fields, term } => {
                if term.is_empty() {
                    continue;
                }
                let pattern = format!("%{}%", escape_like(term));
                let parts: Vec<String> = fields
                    .iter()
                    .map(|field| {
                        checked_name(field)?;
                        let placeholder = push(&mut params, Value::String(pattern.clone()));
                        Ok(format!("doc->>'{field}' ILIKE {placeholder}"))
                    })
                    .collect::<Result<_, StoreError>>()?;
                clauses.push(format!("({})", parts.join(" OR ")));
            }
            Condition::Range { field, from, to } => {
                checked_name(field)?;
                if let Some(from) = from {
                    let placeholder = push(&mut params, Value::String(from.clone()));
                    clauses.push(format!("doc->>'{field}' >= {placeholder}"));
                }
                if let Some(to) = to {
                    let placeholder = push(&mut params, Value::String(to.clone()));
                    clauses.push(format!("doc->>'{field}' <= {placeholder}"));
                }
            }
        }
    }

    let where_clause = if clauses.is_empty() { "1=1".to_string() } else { clauses.join(" AND ") };
    Ok((where_clause, params))
}

/// Escape LIKE wildcards so a search term matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn bind_value<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        // Objects and arrays bind as JSONB (containment params)
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_is_always_true() {
        let (sql, params) = build_where(&FilterSet::new(), 0).unwrap();
        assert_eq!(sql, "1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn conditions_are_conjoined_with_sequential_placeholders() {
        let filter = FilterSet::new()
            .eq("status", json!("published"))
            .eq("isActive", json!(true))
            .search(&["title", "description"], "rust")
            .range("date", Some("2025-01-01".to_string()), Some("2025-12-31".to_string()));

        let (sql, params) = build_where(&filter, 0).unwrap();
        assert_eq!(
            sql,
            "doc @> $1 AND doc @> $2 AND \
             (doc->>'title' ILIKE $3 OR doc->>'description' ILIKE $4) AND \
             doc->>'date' >= $5 AND doc->>'date' <= $6"
        );
        assert_eq!(params.len(), 6);
        assert_eq!(params[0], json!({"status": "published"}));
        assert_eq!(params[1], json!({"isActive": true}));
        assert_eq!(params[2], json!("%rust%"));
        assert_eq!(params[5], json!("2025-12-31"));
    }

    #[test]
    fn in_expands_to_containment_alternatives() {
        let filter =
            FilterSet::new().any_of("role", vec![json!("admin"), json!("super_admin")]);
        let (sql, params) = build_where(&filter, 0).unwrap();
        assert_eq!(sql, "(doc @> $1 OR doc @> $2)");
        assert_eq!(params[1], json!({"role": "super_admin"}));
    }

    #[test]
    fn empty_in_matches_nothing() {
        let filter = FilterSet::new().any_of("role", Vec::new());
        let (sql, params) = build_where(&filter, 0).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn start_index_offsets_placeholders() {
        let filter = FilterSet::new().eq("status", json!("new"));
        let (sql, _) = build_where(&filter, 2).unwrap();
        assert_eq!(sql, "doc @> $3");
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
    }

    #[test]
    fn hostile_field_names_are_rejected() {
        let filter = FilterSet::new().eq("status'; DROP TABLE users; --", json!("x"));
        assert!(build_where(&filter, 0).is_err());
    }
}
