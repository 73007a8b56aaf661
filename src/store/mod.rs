// Document store abstraction
//
// Every resource is a JSON document (camelCase fields, matching the wire
// format) living in a named collection. The store owns the system fields:
// `id` is assigned on insert, `createdAt`/`updatedAt` are maintained on
// insert/update. Two backends exist: Postgres (JSONB column per collection)
// and an in-memory map for tests and store-less development.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

pub use memory::MemStore;
pub use postgres::PgStore;

/// A stored document. Field names are camelCase end to end.
pub type Document = serde_json::Map<String, Value>;

/// Timestamp format used inside documents: fixed-width RFC 3339 UTC with
/// millisecond precision, so lexicographic order is chronological order.
pub fn timestamp(t: chrono::DateTime<chrono::Utc>) -> String {
    t.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn now_timestamp() -> String {
    timestamp(chrono::Utc::now())
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("invalid collection or field name: {0}")]
    InvalidName(String),

    #[error("lock poisoned: {0}")]
    Lock(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// One conjunct of a document filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Exact match on a top-level field (typed: strings, bools, numbers).
    Eq { field: String, value: Value },
    /// Field value is one of the given values. Empty list matches nothing.
    In { field: String, values: Vec<Value> },
    /// Case-insensitive substring match, OR-ed across the given fields.
    /// Array-valued fields match against their serialized items.
    Search { fields: Vec<String>, term: String },
    /// Inclusive range over a date-valued field (RFC 3339 string compare).
    Range { field: String, from: Option<String>, to: Option<String> },
}

/// Conjunctive filter: all conditions must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    pub conditions: Vec<Condition>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: Value) -> Self {
        self.conditions.push(Condition::Eq { field: field.to_string(), value });
        self
    }

    pub fn any_of(mut self, field: &str, values: Vec<Value>) -> Self {
        self.conditions.push(Condition::In { field: field.to_string(), values });
        self
    }

    pub fn search(mut self, fields: &[&str], term: &str) -> Self {
        self.conditions.push(Condition::Search {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            term: term.to_string(),
        });
        self
    }

    pub fn range(mut self, field: &str, from: Option<String>, to: Option<String>) -> Self {
        self.conditions.push(Condition::Range { field: field.to_string(), from, to });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A windowed, sorted, filtered fetch. Documents with a missing/null sort
/// field always sort last, in either direction.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub filter: FilterSet,
    pub sort_by: String,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

impl ListQuery {
    pub fn new(sort_by: impl Into<String>, order: SortOrder, limit: i64, offset: i64) -> Self {
        Self { filter: FilterSet::new(), sort_by: sort_by.into(), order, limit, offset }
    }
}

/// One bucket of a grouped count.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupCount {
    pub value: String,
    pub count: u64,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document, assigning `id`, `createdAt` and `updatedAt`.
    /// Returns the document as stored.
    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError>;

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// Batch fetch, used to resolve `createdBy`/`updatedBy` references.
    /// Order of the result is unspecified; missing ids are simply absent.
    async fn find_by_ids(&self, collection: &str, ids: &[Uuid]) -> Result<Vec<Document>, StoreError>;

    /// First document whose top-level field equals the given value.
    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>, StoreError>;

    /// Merge-patch the document's top-level fields and bump `updatedAt`.
    /// Returns the updated document, or None when the id does not exist.
    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        patch: Document,
    ) -> Result<Option<Document>, StoreError>;

    /// Hard delete. Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError>;

    async fn find(&self, collection: &str, query: &ListQuery) -> Result<Vec<Document>, StoreError>;

    async fn count(&self, collection: &str, filter: &FilterSet) -> Result<u64, StoreError>;

    /// Count documents grouped by a top-level field value, in one pass.
    /// Documents missing the field are not counted.
    async fn count_grouped(
        &self,
        collection: &str,
        field: &str,
    ) -> Result<Vec<GroupCount>, StoreError>;

    async fn health(&self) -> Result<(), StoreError>;

    async fn close(&self);
}

/// Collection and field names reach SQL identifiers and JSONB path
/// expressions, so they are restricted to word characters.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
