//! Incubation programmes shown on the site, described by bullet points.

use crate::listing::ListRules;
use crate::validation::FieldSpec;

use super::{Messages, PublicView, ResourceDef, UpdateSchema};

const FIELDS: &[FieldSpec] = &[
    FieldSpec::text("title", Some(1), Some(200)).required(),
    FieldSpec::text("duration", None, Some(100)),
    FieldSpec::text_array("bullets", 1, None, None).required(),
    FieldSpec::boolean("isActive").default_bool(true),
];

pub static DEF: ResourceDef = ResourceDef {
    name: "program",
    collection: "programs",
    create_fields: FIELDS,
    update_schema: UpdateSchema::Derived,
    list: ListRules::new(&["title"], &["createdAt", "title"], "createdAt", 50)
        .bool_filters(&["isActive"]),
    messages: Messages {
        created: "Program created",
        updated: "Program updated",
        deleted: "Program deleted",
        not_found: "Program not found",
    },
    public_create: false,
    audit: true,
    populate: &["createdBy", "updatedBy"],
    unique: None,
    publish: None,
    create_hook: None,
    update_hook: None,
    public_view: Some(PublicView {
        require: &[],
        require_active: true,
        optional_filters: &[],
        search_fields: &[],
        sort_by: "createdAt",
        ascending: false,
        default_limit: 50,
        exclude: &[],
    }),
    upcoming: None,
    stats: None,
    toggle_noun: None,
};
