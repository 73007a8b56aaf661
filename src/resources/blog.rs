//! Blog posts, publishable.

use crate::listing::{EnumFilter, ListRules};
use crate::validation::FieldSpec;

use super::{Messages, PublishRule, PublicView, ResourceDef, UpdateSchema};

pub const STATUSES: &[&str] = &["draft", "published"];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::text("title", Some(1), Some(200)).required(),
    FieldSpec::text("content", Some(1), None).required(),
    FieldSpec::url("coverImage", true),
    FieldSpec::text_array("tags", 0, None, None).default_empty_array(),
    FieldSpec::enumeration("status", STATUSES).default_text("draft"),
    FieldSpec::boolean("isActive").default_bool(true),
];

pub static DEF: ResourceDef = ResourceDef {
    name: "blog",
    collection: "blogs",
    create_fields: FIELDS,
    update_schema: UpdateSchema::Derived,
    list: ListRules::new(
        &["title", "content"],
        &["publishedAt", "createdAt", "title"],
        "createdAt",
        10,
    )
    .enum_filters(&[EnumFilter { param: "status", values: STATUSES }])
    .bool_filters(&["isActive"]),
    messages: Messages {
        created: "Blog created",
        updated: "Blog updated",
        deleted: "Blog deleted",
        not_found: "Blog not found",
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
        default_limit: 10,
        exclude: &[],
    }),
    upcoming: None,
    stats: None,
    toggle_noun: None,
};
