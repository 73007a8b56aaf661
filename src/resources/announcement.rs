//! Announcements: short notices with a link, publishable.

use crate::listing::{EnumFilter, ListRules};
use crate::validation::FieldSpec;

use super::{Messages, PublishRule, PublicView, RecentRule, ResourceDef, StatsDef, UpdateSchema};

pub const STATUSES: &[&str] = &["draft", "published", "archived"];
pub const PRIORITIES: &[&str] = &["low", "medium", "high", "urgent"];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::text("title", Some(5), Some(200)).required(),
    FieldSpec::text("description", Some(10), Some(1000)).required(),
    FieldSpec::url("link", false).required(),
    FieldSpec::enumeration("status", STATUSES).default_text("draft"),
    FieldSpec::enumeration("priority", PRIORITIES).default_text("medium"),
    FieldSpec::boolean("isActive").default_bool(true),
    FieldSpec::date("expiresAt"),
];

pub static DEF: ResourceDef = ResourceDef {
    name: "announcement",
    collection: "announcements",
    create_fields: FIELDS,
    update_schema: UpdateSchema::Derived,
    list: ListRules::new(
        &["title", "description"],
        &["title", "createdAt", "publishedAt", "priority", "status"],
        "createdAt",
        10,
    )
    .enum_filters(&[
        EnumFilter { param: "status", values: STATUSES },
        EnumFilter { param: "priority", values: PRIORITIES },
    ])
    .bool_filters(&["isActive"]),
    messages: Messages {
        created: "Announcement created successfully",
        updated: "Announcement updated successfully",
        deleted: "Announcement deleted successfully",
        not_found: "Announcement not found",
    },
    public_create: false,
    audit: true,
    populate: &["createdBy", "updatedBy"],
    unique: None,
    publish: Some(PublishRule {
        status_field: "status",
        published_value: "published",
        stamp_field: "publishedAt",
    }),
    create_hook: None,
    update_hook: None,
    public_view: Some(PublicView {
        require: &[("status", "published")],
        require_active: true,
        optional_filters: &[],
        search_fields: &[],
        sort_by: "publishedAt",
        ascending: false,
        default_limit: 50,
        exclude: &[],
    }),
    upcoming: None,
    stats: Some(StatsDef {
        route: "/stats/overview",
        status_field: "status",
        status_values: STATUSES,
        active_count: true,
        newsletter_count: false,
        distributions: &["status", "priority"],
        recent: RecentRule {
            require: &[("status", "published")],
            require_active: true,
            sort_by: "publishedAt",
        },
    }),
    toggle_noun: None,
};
