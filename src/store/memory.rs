//! In-memory store backend, for tests and running without a database.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::{
    now_timestamp, Condition, Document, DocumentStore, FilterSet, GroupCount, ListQuery,
    SortOrder, StoreError,
};

/// Thread-safe map of collection name to insertion-ordered documents.
#[derive(Clone, Default)]
pub struct MemStore {
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Vec<Document>>>, StoreError> {
        self.collections.read().map_err(|e| StoreError::Lock(e.to_string()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Vec<Document>>>, StoreError> {
        self.collections.write().map_err(|e| StoreError::Lock(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for MemStore {
    async fn insert(&self, collection: &str, mut doc: Document) -> Result<Document, StoreError> {
        let now = now_timestamp();
        doc.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        doc.insert("createdAt".to_string(), Value::String(now.clone()));
        doc.insert("updatedAt".to_string(), Value::String(now));

        let mut collections = self.write()?;
        collections.entry(collection.to_string()).or_default().push(doc.clone());
        Ok(doc)
    }

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| doc_id(d) == Some(id)))
            .cloned())
    }

    async fn find_by_ids(
        &self,
        collection: &str,
        ids: &[Uuid],
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| doc_id(d).is_some_and(|id| ids.contains(&id)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.get(field) == Some(value)))
            .cloned())
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        patch: Document,
    ) -> Result<Option<Document>, StoreError> {
        let mut collections = self.write()?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(doc) = docs.iter_mut().find(|d| doc_id(d) == Some(id)) else {
            return Ok(None);
        };
        for (key, value) in patch {
            doc.insert(key, value);
        }
        doc.insert("updatedAt".to_string(), Value::String(now_timestamp()));
        Ok(Some(doc.clone()))
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut collections = self.write()?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| doc_id(d) != Some(id));
        Ok(docs.len() < before)
    }

    async fn find(&self, collection: &str, query: &ListQuery) -> Result<Vec<Document>, StoreError> {
        let collections = self.read()?;
        let mut matching: Vec<Document> = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches(d, &query.filter)).cloned().collect())
            .unwrap_or_default();

        // Stable sort keeps insertion order for ties
        matching.sort_by(|a, b| compare_by_field(a, b, &query.sort_by, query.order));

        Ok(matching
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect())
    }

    async fn count(&self, collection: &str, filter: &FilterSet) -> Result<u64, StoreError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches(d, filter)).count() as u64)
            .unwrap_or(0))
    }

    async fn count_grouped(
        &self,
        collection: &str,
        field: &str,
    ) -> Result<Vec<GroupCount>, StoreError> {
        let collections = self.read()?;
        let mut buckets: HashMap<String, u64> = HashMap::new();
        if let Some(docs) = collections.get(collection) {
            for doc in docs {
                if let Some(key) = group_key(doc.get(field)) {
                    *buckets.entry(key).or_insert(0) += 1;
                }
            }
        }
        let mut groups: Vec<GroupCount> =
            buckets.into_iter().map(|(value, count)| GroupCount { value, count }).collect();
        groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        Ok(groups)
    }

    async fn health(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) {}
}

fn doc_id(doc: &Document) -> Option<Uuid> {
    doc.get("id").and_then(Value::as_str).and_then(|s| Uuid::parse_str(s).ok())
}

fn matches(doc: &Document, filter: &FilterSet) -> bool {
    filter.conditions.iter().all(|condition| match condition {
        Condition::Eq { field, value } => doc.get(field) == Some(value),
        Condition::In { field, values } => {
            values.iter().any(|value| doc.get(field) == Some(value))
        }
        Condition::Search { fields, term } => {
            if term.is_empty() {
                return true;
            }
            let needle = term.to_lowercase();
            fields
                .iter()
                .any(|f| search_text(doc.get(f)).to_lowercase().contains(&needle))
        }
        Condition::Range { field, from, to } => {
            let Some(value) = doc.get(field).and_then(Value::as_str) else {
                return false;
            };
            from.as_deref().is_none_or(|f| value >= f)
                && to.as_deref().is_none_or(|t| value <= t)
        }
    })
}

fn search_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => {
            items.iter().map(|v| search_text(Some(v))).collect::<Vec<_>>().join(" ")
        }
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn group_key(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}

/// Missing/null sort fields sink to the end in either direction, matching
/// the Postgres backend's NULLS LAST ordering.
fn compare_by_field(a: &Document, b: &Document, field: &str, order: SortOrder) -> Ordering {
    match (sort_key(a.get(field)), sort_key(b.get(field))) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(ka), Some(kb)) => {
            let ordering = ka.compare(&kb);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        }
    }
}

enum SortKey {
    Num(f64),
    Text(String),
}

impl SortKey {
    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Num(a), SortKey::Num(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Num(a), SortKey::Text(b)) => a.to_string().cmp(b),
            (SortKey::Text(a), SortKey::Num(b)) => a.cmp(&b.to_string()),
        }
    }
}

fn sort_key(value: Option<&Value>) -> Option<SortKey> {
    match value {
        Some(Value::String(s)) => Some(SortKey::Text(s.clone())),
        Some(Value::Number(n)) => n.as_f64().map(SortKey::Num),
        Some(Value::Bool(b)) => Some(SortKey::Text(b.to_string())),
        Some(Value::Null) | None => None,
        Some(other) => Some(SortKey::Text(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(pairs: Value) -> Document {
        pairs.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_system_fields() {
        let store = MemStore::new();
        let created = store
            .insert("announcements", doc(json!({"title": "Hello"})))
            .await
            .unwrap();

        let id = created.get("id").and_then(Value::as_str).unwrap();
        assert!(Uuid::parse_str(id).is_ok());
        assert!(created.get("createdAt").and_then(Value::as_str).unwrap().ends_with('Z'));
        assert_eq!(created.get("createdAt"), created.get("updatedAt"));
    }

    #[tokio::test]
    async fn find_filters_sorts_and_windows() {
        let store = MemStore::new();
        for (title, status) in [
            ("alpha", "draft"),
            ("bravo", "published"),
            ("charlie", "published"),
            ("delta", "published"),
        ] {
            store
                .insert("blogs", doc(json!({"title": title, "status": status})))
                .await
                .unwrap();
        }

        let query = ListQuery {
            filter: FilterSet::new().eq("status", json!("published")),
            sort_by: "title".to_string(),
            order: SortOrder::Desc,
            limit: 2,
            offset: 1,
        };
        let page = store.find("blogs", &query).await.unwrap();
        let titles: Vec<_> =
            page.iter().map(|d| d.get("title").and_then(Value::as_str).unwrap()).collect();
        assert_eq!(titles, vec!["charlie", "bravo"]);

        let total = store.count("blogs", &query.filter).await.unwrap();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_covers_arrays() {
        let store = MemStore::new();
        store
            .insert(
                "mentors",
                doc(json!({"name": "Asha Rao", "expertise": ["Machine Learning", "IoT"]})),
            )
            .await
            .unwrap();
        store
            .insert("mentors", doc(json!({"name": "Brian Lee", "expertise": ["Finance"]})))
            .await
            .unwrap();

        let query = ListQuery {
            filter: FilterSet::new().search(&["name", "expertise"], "machine"),
            sort_by: "createdAt".to_string(),
            order: SortOrder::Desc,
            limit: 10,
            offset: 0,
        };
        let hits = store.find("mentors", &query).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].get("name"), Some(&json!("Asha Rao")));
    }

    #[tokio::test]
    async fn update_merges_and_bumps_updated_at() {
        let store = MemStore::new();
        let created = store
            .insert("programs", doc(json!({"title": "Bootcamp", "isActive": true})))
            .await
            .unwrap();
        let id = doc_id(&created).unwrap();
        let before = created.get("updatedAt").cloned();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let updated = store
            .update("programs", id, doc(json!({"isActive": false})))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.get("title"), Some(&json!("Bootcamp")));
        assert_eq!(updated.get("isActive"), Some(&json!(false)));
        assert_ne!(updated.get("updatedAt").cloned(), before);

        let missing = store.update("programs", Uuid::new_v4(), Document::new()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn delete_removes_exactly_one() {
        let store = MemStore::new();
        let created = store.insert("events", doc(json!({"title": "Demo Day"}))).await.unwrap();
        let id = doc_id(&created).unwrap();

        assert!(store.delete("events", id).await.unwrap());
        assert!(!store.delete("events", id).await.unwrap());
        assert!(store.find_by_id("events", id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn grouped_counts_skip_missing_values() {
        let store = MemStore::new();
        for status in ["new", "new", "responded"] {
            store.insert("contacts", doc(json!({"status": status}))).await.unwrap();
        }
        store.insert("contacts", doc(json!({"subject": "no status"}))).await.unwrap();

        let groups = store.count_grouped("contacts", "status").await.unwrap();
        assert_eq!(
            groups,
            vec![
                GroupCount { value: "new".to_string(), count: 2 },
                GroupCount { value: "responded".to_string(), count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn missing_sort_field_sinks_to_the_end() {
        let store = MemStore::new();
        store.insert("announcements", doc(json!({"title": "draft only"}))).await.unwrap();
        store
            .insert(
                "announcements",
                doc(json!({"title": "published", "publishedAt": "2025-06-01T00:00:00.000Z"})),
            )
            .await
            .unwrap();

        let query = ListQuery {
            filter: FilterSet::new(),
            sort_by: "publishedAt".to_string(),
            order: SortOrder::Desc,
            limit: 10,
            offset: 0,
        };
        let docs = store.find("announcements", &query).await.unwrap();
        assert_eq!(docs[0].get("title"), Some(&json!("published")));
        assert_eq!(docs[1].get("title"), Some(&json!("draft only")));
    }

    #[tokio::test]
    async fn empty_in_matches_nothing() {
        let store = MemStore::new();
        store.insert("users", doc(json!({"role": "admin"}))).await.unwrap();
        let count = store
            .count("users", &FilterSet::new().any_of("role", Vec::new()))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
