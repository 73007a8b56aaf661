//! Contact form submissions. The form itself is public; triage (status,
//! priority, response) is an admin concern, so the update schema is an
//! explicit narrow table rather than the derived one.

use chrono::Utc;
use serde_json::Value;

use crate::listing::{DateRange, EnumFilter, ListRules};
use crate::store::{timestamp, Document};
use crate::validation::FieldSpec;

use super::{Messages, RecentRule, ResourceDef, StatsDef, UpdateSchema};

pub const STATUSES: &[&str] = &["new", "in-progress", "responded", "closed"];
pub const PRIORITIES: &[&str] = &["low", "medium", "high", "urgent"];
pub const SOURCES: &[&str] = &["website", "email", "phone", "referral", "other"];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::text("firstName", Some(1), Some(50)).required(),
    FieldSpec::text("lastName", Some(1), Some(50)).required(),
    FieldSpec::email("email", Some(100)).required(),
    FieldSpec::text("phone", None, Some(20)),
    FieldSpec::text("organization", None, Some(100)),
    FieldSpec::text("subject", Some(5), Some(200)).required(),
    FieldSpec::text("message", Some(10), Some(2000)).required(),
    FieldSpec::boolean("subscribeNewsletter").default_bool(false),
    FieldSpec::enumeration("source", SOURCES).default_text("website"),
    FieldSpec::text("referrer", None, Some(200)),
];

const UPDATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::enumeration("status", STATUSES),
    FieldSpec::enumeration("priority", PRIORITIES),
    FieldSpec::text("response", Some(1), Some(2000)),
];

fn on_create(doc: &mut Document) {
    let now = timestamp(Utc::now());
    doc.insert("status".to_string(), Value::String("new".to_string()));
    doc.insert("priority".to_string(), Value::String("medium".to_string()));
    doc.insert("submittedAt".to_string(), Value::String(now.clone()));
    doc.insert("lastActivityAt".to_string(), Value::String(now));
}

/// Providing a response stamps who answered and when, and moves the
/// submission to `responded` unless the patch sets a status itself.
fn on_update(patch: &mut Document, actor: &str) {
    let has_response = patch
        .get("response")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty());
    if has_response {
        patch.insert("respondedBy".to_string(), Value::String(actor.to_string()));
        patch.insert("respondedAt".to_string(), Value::String(timestamp(Utc::now())));
        if !patch.contains_key("status") {
            patch.insert("status".to_string(), Value::String("responded".to_string()));
        }
    }
    patch.insert("lastActivityAt".to_string(), Value::String(timestamp(Utc::now())));
}

pub static DEF: ResourceDef = ResourceDef {
    name: "contact",
    collection: "contacts",
    create_fields: FIELDS,
    update_schema: UpdateSchema::Explicit(UPDATE_FIELDS),
    list: ListRules::new(
        &["firstName", "lastName", "email", "subject", "message"],
        &["submittedAt", "firstName", "lastName", "email", "status", "priority"],
        "submittedAt",
        10,
    )
    .enum_filters(&[
        EnumFilter { param: "status", values: STATUSES },
        EnumFilter { param: "priority", values: PRIORITIES },
        EnumFilter { param: "source", values: SOURCES },
    ])
    .date_range(DateRange {
        field: "submittedAt",
        from_param: "dateFrom",
        to_param: "dateTo",
    }),
    messages: Messages {
        created: "Contact form submitted successfully",
        updated: "Contact submission updated successfully",
        deleted: "Contact submission deleted successfully",
        not_found: "Contact submission not found",
    },
    public_create: true,
    audit: false,
    populate: &["respondedBy"],
    unique: None,
    publish: None,
    create_hook: Some(on_create),
    update_hook: Some(on_update),
    public_view: None,
    upcoming: None,
    stats: Some(StatsDef {
        route: "/stats",
        status_field: "status",
        status_values: STATUSES,
        active_count: false,
        newsletter_count: true,
        distributions: &["status", "priority"],
        recent: RecentRule { require: &[], require_active: false, sort_by: "submittedAt" },
    }),
    toggle_noun: None,
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_stamps_triage_fields() {
        let mut patch = serde_json::Map::new();
        patch.insert("response".to_string(), json!("Thanks, we will call you."));
        on_update(&mut patch, "admin-id");

        assert_eq!(patch["respondedBy"], json!("admin-id"));
        assert_eq!(patch["status"], json!("responded"));
        assert!(patch.contains_key("respondedAt"));
        assert!(patch.contains_key("lastActivityAt"));
    }

    #[test]
    fn explicit_status_wins_over_the_responded_default() {
        let mut patch = serde_json::Map::new();
        patch.insert("response".to_string(), json!("Handled offline"));
        patch.insert("status".to_string(), json!("closed"));
        on_update(&mut patch, "admin-id");
        assert_eq!(patch["status"], json!("closed"));
    }

    #[test]
    fn plain_triage_updates_only_touch_activity() {
        let mut patch = serde_json::Map::new();
        patch.insert("priority".to_string(), json!("high"));
        on_update(&mut patch, "admin-id");
        assert!(!patch.contains_key("respondedBy"));
        assert!(!patch.contains_key("status"));
        assert!(patch.contains_key("lastActivityAt"));
    }
}
