//! Mentor directory. The public view hides contact details.

use crate::listing::ListRules;
use crate::validation::FieldSpec;

use super::{Messages, PublicView, ResourceDef, UniqueRule, UpdateSchema};

const FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name", Some(2), Some(100)).required(),
    FieldSpec::email("email", None).required(),
    FieldSpec::text("phone", Some(1), Some(20)).required(),
    FieldSpec::text("designation", Some(2), Some(100)).required(),
    FieldSpec::text("company", Some(2), Some(100)).required(),
    FieldSpec::text_array("expertise", 1, Some(2), Some(50)).required(),
    FieldSpec::text("bio", Some(10), Some(1000)).required(),
    FieldSpec::url("profileImage", true),
    FieldSpec::url("linkedinProfile", true),
    FieldSpec::boolean("isActive").default_bool(true),
];

pub static DEF: ResourceDef = ResourceDef {
    name: "mentor",
    collection: "mentors",
    create_fields: FIELDS,
    update_schema: UpdateSchema::Derived,
    list: ListRules::new(
        &["name", "email", "designation", "company", "expertise"],
        &["createdAt"],
        "createdAt",
        10,
    )
    .bool_filters(&["isActive"]),
    messages: Messages {
        created: "Mentor created successfully",
        updated: "Mentor updated successfully",
        deleted: "Mentor deleted successfully",
        not_found: "Mentor not found",
    },
    public_create: false,
    audit: true,
    populate: &["createdBy", "updatedBy"],
    unique: Some(UniqueRule {
        field: "email",
        message: "Mentor with this email already exists",
    }),
    publish: None,
    create_hook: None,
    update_hook: None,
    public_view: Some(PublicView {
        require: &[],
        require_active: true,
        optional_filters: &[],
        search_fields: &["name", "designation", "company", "expertise"],
        sort_by: "createdAt",
        ascending: false,
        default_limit: 10,
        exclude: &["email", "phone", "createdBy", "updatedBy"],
    }),
    upcoming: None,
    stats: None,
    toggle_noun: Some("Mentor"),
};
