//! Declarative payload validation.
//!
//! Each resource declares its fields as a const table of [`FieldSpec`]s.
//! Validating a payload walks the table once and either returns a normalized
//! document (strings trimmed, emails lowercased, dates canonicalized,
//! defaults applied, unknown fields stripped) or every violation message at
//! once. Update validation reuses the create table with every field optional
//! and no defaults, so the two schemas cannot drift apart.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use url::Url;

use crate::store::{timestamp, Document};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Text { min: Option<usize>, max: Option<usize> },
    Email { max: Option<usize> },
    Url { allow_empty: bool },
    Enum { values: &'static [&'static str] },
    Bool,
    Number { min: Option<f64>, max: Option<f64>, integer: bool },
    Date,
    TextArray { min_items: usize, item_min: Option<usize>, item_max: Option<usize> },
    ObjectArray { min_items: usize, fields: &'static [FieldSpec] },
}

#[derive(Debug, Clone, Copy)]
pub enum FieldDefault {
    None,
    Bool(bool),
    Text(&'static str),
    Int(i64),
    EmptyArray,
    /// Current time in the store timestamp format.
    Now,
}

/// One field of a resource schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: FieldDefault,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: false, default: FieldDefault::None }
    }

    pub const fn text(name: &'static str, min: Option<usize>, max: Option<usize>) -> Self {
        Self::new(name, FieldKind::Text { min, max })
    }

    pub const fn email(name: &'static str, max: Option<usize>) -> Self {
        Self::new(name, FieldKind::Email { max })
    }

    pub const fn url(name: &'static str, allow_empty: bool) -> Self {
        Self::new(name, FieldKind::Url { allow_empty })
    }

    pub const fn enumeration(name: &'static str, values: &'static [&'static str]) -> Self {
        Self::new(name, FieldKind::Enum { values })
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub const fn number(name: &'static str, min: Option<f64>, max: Option<f64>) -> Self {
        Self::new(name, FieldKind::Number { min, max, integer: false })
    }

    pub const fn integer(name: &'static str, min: Option<f64>, max: Option<f64>) -> Self {
        Self::new(name, FieldKind::Number { min, max, integer: true })
    }

    pub const fn date(name: &'static str) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub const fn text_array(
        name: &'static str,
        min_items: usize,
        item_min: Option<usize>,
        item_max: Option<usize>,
    ) -> Self {
        Self::new(name, FieldKind::TextArray { min_items, item_min, item_max })
    }

    pub const fn object_array(
        name: &'static str,
        min_items: usize,
        fields: &'static [FieldSpec],
    ) -> Self {
        Self::new(name, FieldKind::ObjectArray { min_items, fields })
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn default_bool(mut self, value: bool) -> Self {
        self.default = FieldDefault::Bool(value);
        self
    }

    pub const fn default_text(mut self, value: &'static str) -> Self {
        self.default = FieldDefault::Text(value);
        self
    }

    pub const fn default_int(mut self, value: i64) -> Self {
        self.default = FieldDefault::Int(value);
        self
    }

    pub const fn default_empty_array(mut self) -> Self {
        self.default = FieldDefault::EmptyArray;
        self
    }

    pub const fn default_now(mut self) -> Self {
        self.default = FieldDefault::Now;
        self
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Create,
    Update,
}

/// Validate a creation payload against a schema table. Returns the normalized
/// document or every violation found.
pub fn validate_create(fields: &[FieldSpec], payload: &Value) -> Result<Document, Vec<String>> {
    let body = require_object(payload)?;
    let mut doc = Map::new();
    let mut errors = Vec::new();
    for spec in fields {
        apply_field(spec, body, Mode::Create, &mut doc, &mut errors);
    }
    if errors.is_empty() {
        Ok(doc)
    } else {
        Err(errors)
    }
}

/// Validate an update payload. Every field across the given tables is
/// optional and defaults are not applied; at least one known field must
/// survive normalization.
pub fn validate_update(tables: &[&[FieldSpec]], payload: &Value) -> Result<Document, Vec<String>> {
    let body = require_object(payload)?;
    let mut doc = Map::new();
    let mut errors = Vec::new();
    for table in tables {
        for spec in *table {
            apply_field(spec, body, Mode::Update, &mut doc, &mut errors);
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }
    if doc.is_empty() {
        return Err(vec!["At least one field must be provided for update".to_string()]);
    }
    Ok(doc)
}

fn require_object(payload: &Value) -> Result<&Map<String, Value>, Vec<String>> {
    payload
        .as_object()
        .ok_or_else(|| vec!["Request body must be a JSON object".to_string()])
}

fn apply_field(
    spec: &FieldSpec,
    body: &Map<String, Value>,
    mode: Mode,
    doc: &mut Document,
    errors: &mut Vec<String>,
) {
    let raw = body.get(spec.name).filter(|v| !v.is_null());
    match raw {
        Some(value) => match check_value(spec, value) {
            Ok(Some(normalized)) => {
                doc.insert(spec.name.to_string(), normalized);
            }
            Ok(None) => {
                // value normalized away (e.g. optional empty string)
                if mode == Mode::Create && spec.required {
                    errors.push(format!("{} is required", label(spec.name)));
                } else if mode == Mode::Create {
                    fill_default(spec, doc);
                }
            }
            Err(mut field_errors) => errors.append(&mut field_errors),
        },
        None => {
            if mode == Mode::Update {
                return;
            }
            if spec.required {
                errors.push(format!("{} is required", label(spec.name)));
            } else {
                fill_default(spec, doc);
            }
        }
    }
}

fn fill_default(spec: &FieldSpec, doc: &mut Document) {
    let value = match spec.default {
        FieldDefault::None => return,
        FieldDefault::Bool(b) => Value::Bool(b),
        FieldDefault::Text(s) => Value::String(s.to_string()),
        FieldDefault::Int(i) => Value::Number(i.into()),
        FieldDefault::EmptyArray => Value::Array(Vec::new()),
        FieldDefault::Now => Value::String(timestamp(Utc::now())),
    };
    doc.insert(spec.name.to_string(), value);
}

/// Check and normalize one provided value. `Ok(None)` means the value
/// normalized to nothing and the field should be treated as absent.
fn check_value(spec: &FieldSpec, value: &Value) -> Result<Option<Value>, Vec<String>> {
    let name = label(spec.name);
    match &spec.kind {
        FieldKind::Text { min, max } => {
            let Some(s) = value.as_str() else {
                return Err(vec![format!("{name} must be a string")]);
            };
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            let mut errors = Vec::new();
            check_length(&name, trimmed, *min, *max, &mut errors);
            if errors.is_empty() {
                Ok(Some(Value::String(trimmed.to_string())))
            } else {
                Err(errors)
            }
        }
        FieldKind::Email { max } => {
            let Some(s) = value.as_str() else {
                return Err(vec![format!("{name} must be a string")]);
            };
            let normalized = s.trim().to_lowercase();
            if normalized.is_empty() {
                return Ok(None);
            }
            let mut errors = Vec::new();
            if !EMAIL_RE.is_match(&normalized) {
                errors.push(format!("{name} must be a valid email address"));
            }
            if let Some(max) = max {
                if normalized.chars().count() > *max {
                    errors.push(format!("{name} cannot exceed {max} characters"));
                }
            }
            if errors.is_empty() {
                Ok(Some(Value::String(normalized)))
            } else {
                Err(errors)
            }
        }
        FieldKind::Url { allow_empty } => {
            let Some(s) = value.as_str() else {
                return Err(vec![format!("{name} must be a string")]);
            };
            let trimmed = s.trim();
            if trimmed.is_empty() {
                if *allow_empty {
                    return Ok(Some(Value::String(String::new())));
                }
                return Ok(None);
            }
            let valid = Url::parse(trimmed)
                .map(|u| matches!(u.scheme(), "http" | "https"))
                .unwrap_or(false);
            if valid {
                Ok(Some(Value::String(trimmed.to_string())))
            } else {
                Err(vec![format!("{name} must be a valid URL")])
            }
        }
        FieldKind::Enum { values } => {
            let Some(s) = value.as_str() else {
                return Err(vec![format!("{name} must be a string")]);
            };
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            if values.contains(&trimmed) {
                Ok(Some(Value::String(trimmed.to_string())))
            } else {
                Err(vec![format!("{name} must be one of: {}", values.join(", "))])
            }
        }
        FieldKind::Bool => match value {
            Value::Bool(_) => Ok(Some(value.clone())),
            _ => Err(vec![format!("{name} must be a boolean")]),
        },
        FieldKind::Number { min, max, integer } => {
            let Some(n) = value.as_f64() else {
                return Err(vec![format!("{name} must be a number")]);
            };
            let mut errors = Vec::new();
            if *integer && value.as_i64().is_none() {
                errors.push(format!("{name} must be a whole number"));
            }
            if let Some(min) = min {
                if n < *min {
                    errors.push(format!("{name} cannot be less than {min}"));
                }
            }
            if let Some(max) = max {
                if n > *max {
                    errors.push(format!("{name} cannot exceed {max}"));
                }
            }
            if errors.is_empty() {
                Ok(Some(value.clone()))
            } else {
                Err(errors)
            }
        }
        FieldKind::Date => {
            let Some(s) = value.as_str() else {
                return Err(vec![format!("{name} must be a valid date")]);
            };
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            match parse_date(trimmed) {
                Some(dt) => Ok(Some(Value::String(timestamp(dt)))),
                None => Err(vec![format!("{name} must be a valid date")]),
            }
        }
        FieldKind::TextArray { min_items, item_min, item_max } => {
            let Some(items) = value.as_array() else {
                return Err(vec![format!("{name} must be an array")]);
            };
            let mut errors = Vec::new();
            let mut normalized = Vec::new();
            for item in items {
                let Some(s) = item.as_str() else {
                    push_once(&mut errors, format!("{name} must contain only strings"));
                    continue;
                };
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    push_once(&mut errors, format!("{name} entries cannot be empty"));
                    continue;
                }
                if let Some(min) = item_min {
                    if trimmed.chars().count() < *min {
                        push_once(
                            &mut errors,
                            format!("{name} entries must be at least {min} characters long"),
                        );
                        continue;
                    }
                }
                if let Some(max) = item_max {
                    if trimmed.chars().count() > *max {
                        push_once(
                            &mut errors,
                            format!("{name} entries cannot exceed {max} characters"),
                        );
                        continue;
                    }
                }
                normalized.push(Value::String(trimmed.to_string()));
            }
            if errors.is_empty() && normalized.len() < *min_items {
                let noun = if *min_items == 1 { "item" } else { "items" };
                errors.push(format!("{name} must contain at least {min_items} {noun}"));
            }
            if errors.is_empty() {
                Ok(Some(Value::Array(normalized)))
            } else {
                Err(errors)
            }
        }
        FieldKind::ObjectArray { min_items, fields } => {
            let Some(items) = value.as_array() else {
                return Err(vec![format!("{name} must be an array")]);
            };
            let mut errors = Vec::new();
            let mut normalized = Vec::new();
            for (i, item) in items.iter().enumerate() {
                match validate_create(fields, item) {
                    Ok(entry) => normalized.push(Value::Object(entry)),
                    Err(entry_errors) => {
                        for message in entry_errors {
                            errors.push(format!("{name} entry {}: {message}", i + 1));
                        }
                    }
                }
            }
            if errors.is_empty() && normalized.len() < *min_items {
                let noun = if *min_items == 1 { "item" } else { "items" };
                errors.push(format!("{name} must contain at least {min_items} {noun}"));
            }
            if errors.is_empty() {
                Ok(Some(Value::Array(normalized)))
            } else {
                Err(errors)
            }
        }
    }
}

fn check_length(
    name: &str,
    value: &str,
    min: Option<usize>,
    max: Option<usize>,
    errors: &mut Vec<String>,
) {
    let len = value.chars().count();
    if let Some(min) = min {
        if len < min {
            errors.push(format!("{name} must be at least {min} characters long"));
        }
    }
    if let Some(max) = max {
        if len > max {
            errors.push(format!("{name} cannot exceed {max} characters"));
        }
    }
}

fn push_once(errors: &mut Vec<String>, message: String) {
    if !errors.contains(&message) {
        errors.push(message);
    }
}

/// Accepts RFC 3339 or bare `YYYY-MM-DD` (midnight UTC).
pub(crate) fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Turn a camelCase field name into a human-readable label: `applicantName`
/// becomes "Applicant name", `hasFiledITReturn` becomes "Has filed IT return".
pub(crate) fn label(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && !current.is_empty() {
            let prev_lower = chars[i - 1].is_lowercase();
            let next_lower = i + 1 < chars.len() && chars[i + 1].is_lowercase();
            if prev_lower || next_lower {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let acronym = word.len() > 1 && word.chars().all(|c| c.is_uppercase());
        if i == 0 {
            let mut cs = word.chars();
            if let Some(first) = cs.next() {
                out.extend(first.to_uppercase());
                out.push_str(&cs.as_str().to_lowercase());
            }
        } else if acronym {
            out.push_str(word);
        } else {
            out.push_str(&word.to_lowercase());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::text("title", Some(5), Some(200)).required(),
        FieldSpec::text("description", Some(10), Some(1000)).required(),
        FieldSpec::url("link", false).required(),
        FieldSpec::enumeration("status", &["draft", "published", "archived"])
            .default_text("draft"),
        FieldSpec::boolean("isActive").default_bool(true),
        FieldSpec::date("expiresAt"),
        FieldSpec::email("contactEmail", Some(100)),
    ];

    const TEAM: &[FieldSpec] = &[
        FieldSpec::text("name", Some(1), Some(100)).required(),
        FieldSpec::text("contact", Some(1), Some(200)).required(),
    ];

    #[test]
    fn create_normalizes_and_applies_defaults() {
        let doc = validate_create(
            FIELDS,
            &json!({
                "title": "  Demo day  ",
                "description": "Annual demo day for cohort startups",
                "link": "https://example.org/demo",
                "contactEmail": "  Admin@Example.ORG ",
                "ignoredField": "dropped"
            }),
        )
        .unwrap();

        assert_eq!(doc["title"], json!("Demo day"));
        assert_eq!(doc["status"], json!("draft"));
        assert_eq!(doc["isActive"], json!(true));
        assert_eq!(doc["contactEmail"], json!("admin@example.org"));
        assert!(!doc.contains_key("ignoredField"));
        assert!(!doc.contains_key("expiresAt"));
    }

    #[test]
    fn create_collects_every_violation() {
        let errors = validate_create(
            FIELDS,
            &json!({
                "title": "hey",
                "link": "not a url",
                "status": "live"
            }),
        )
        .unwrap_err();

        assert!(errors.contains(&"Title must be at least 5 characters long".to_string()));
        assert!(errors.contains(&"Description is required".to_string()));
        assert!(errors.contains(&"Link must be a valid URL".to_string()));
        assert!(errors
            .contains(&"Status must be one of: draft, published, archived".to_string()));
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let errors = validate_create(
            FIELDS,
            &json!({
                "title": "   ",
                "description": "long enough description",
                "link": "https://example.org"
            }),
        )
        .unwrap_err();
        assert_eq!(errors, vec!["Title is required".to_string()]);
    }

    #[test]
    fn dates_canonicalize_to_utc() {
        let doc = validate_create(
            &[FieldSpec::date("expiresAt")],
            &json!({ "expiresAt": "2026-03-01" }),
        )
        .unwrap();
        assert_eq!(doc["expiresAt"], json!("2026-03-01T00:00:00.000Z"));

        let doc = validate_create(
            &[FieldSpec::date("expiresAt")],
            &json!({ "expiresAt": "2026-03-01T10:30:00+05:30" }),
        )
        .unwrap();
        assert_eq!(doc["expiresAt"], json!("2026-03-01T05:00:00.000Z"));
    }

    #[test]
    fn text_arrays_check_items() {
        let spec = &[FieldSpec::text_array("expertise", 1, Some(2), Some(50)).required()];
        let errors =
            validate_create(spec, &json!({ "expertise": ["ai", "x", "y"] })).unwrap_err();
        assert_eq!(
            errors,
            vec!["Expertise entries must be at least 2 characters long".to_string()]
        );

        let errors = validate_create(spec, &json!({ "expertise": [] })).unwrap_err();
        assert_eq!(errors, vec!["Expertise must contain at least 1 item".to_string()]);
    }

    #[test]
    fn object_array_errors_are_prefixed_per_entry() {
        let spec = &[FieldSpec::object_array("foundingTeam", 1, TEAM)];
        let errors = validate_create(
            spec,
            &json!({ "foundingTeam": [{ "name": "Ada" }, { "contact": "a@b.co" }] }),
        )
        .unwrap_err();

        assert!(errors.contains(&"Founding team entry 1: Contact is required".to_string()));
        assert!(errors.contains(&"Founding team entry 2: Name is required".to_string()));
    }

    #[test]
    fn update_ignores_required_and_defaults() {
        let doc = validate_update(&[FIELDS], &json!({ "title": "Renamed event" })).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc["title"], json!("Renamed event"));
    }

    #[test]
    fn update_rejects_empty_patches() {
        let errors = validate_update(&[FIELDS], &json!({ "unknown": 1 })).unwrap_err();
        assert_eq!(errors, vec!["At least one field must be provided for update".to_string()]);
    }

    #[test]
    fn update_still_validates_provided_values() {
        let errors = validate_update(&[FIELDS], &json!({ "status": "live" })).unwrap_err();
        assert_eq!(
            errors,
            vec!["Status must be one of: draft, published, archived".to_string()]
        );
    }

    #[test]
    fn body_must_be_an_object() {
        let errors = validate_create(FIELDS, &json!([1, 2, 3])).unwrap_err();
        assert_eq!(errors, vec!["Request body must be a JSON object".to_string()]);
    }

    #[test]
    fn numbers_enforce_bounds_and_integrality() {
        let spec = &[
            FieldSpec::integer("employees", Some(0.0), None),
            FieldSpec::number("percentage", Some(0.0), Some(100.0)),
        ];
        let errors = validate_create(
            spec,
            &json!({ "employees": 2.5, "percentage": 120 }),
        )
        .unwrap_err();
        assert!(errors.contains(&"Employees must be a whole number".to_string()));
        assert!(errors.contains(&"Percentage cannot exceed 100".to_string()));

        let doc = validate_create(spec, &json!({ "employees": 4 })).unwrap();
        assert_eq!(doc["employees"], json!(4));
    }

    #[test]
    fn labels_read_naturally() {
        assert_eq!(label("title"), "Title");
        assert_eq!(label("applicantName"), "Applicant name");
        assert_eq!(label("hasFiledITReturn"), "Has filed IT return");
        assert_eq!(label("pan"), "Pan");
    }
}
