//! Events: scheduled activities with a type taxonomy and a lot of optional
//! descriptive fields, most of which only apply to some event types.

use crate::listing::{DateRange, EnumFilter, ListRules};
use crate::validation::FieldSpec;

use super::{
    Messages, PublicView, RecentRule, ResourceDef, StatsDef, UpcomingView, UpdateSchema,
};

pub const TYPES: &[&str] = &[
    "workshop",
    "seminar",
    "webinar",
    "outreach",
    "collaboration",
    "hackathon",
    "capacity-building",
    "calendar-event",
    "past-event",
];
pub const STATUSES: &[&str] = &["upcoming", "ongoing", "completed", "cancelled"];
pub const MODES: &[&str] = &["In-person", "Online", "Hybrid"];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::text("title", Some(1), Some(200)).required(),
    FieldSpec::text("description", Some(1), Some(2000)).required(),
    FieldSpec::date("date").required(),
    FieldSpec::enumeration("type", TYPES).required(),
    FieldSpec::text("venue", None, Some(200)),
    FieldSpec::text("speaker", None, Some(200)),
    FieldSpec::enumeration("mode", MODES).default_text("In-person"),
    FieldSpec::text("audience", None, Some(200)),
    FieldSpec::text("participants", None, Some(100)),
    FieldSpec::text("focus", None, Some(500)),
    FieldSpec::text("partners", None, Some(500)),
    FieldSpec::text("objective", None, Some(1000)),
    FieldSpec::text("theme", None, Some(200)),
    FieldSpec::text("prizes", None, Some(200)),
    FieldSpec::text("teams", None, Some(100)),
    FieldSpec::text("duration", None, Some(100)),
    FieldSpec::text("sessions", None, Some(100)),
    FieldSpec::text("certification", None, Some(200)),
    FieldSpec::text("eligibility", None, Some(500)),
    FieldSpec::text("modules", None, Some(1000)),
    FieldSpec::text("highlight", None, Some(500)),
    FieldSpec::enumeration("status", STATUSES).default_text("upcoming"),
    FieldSpec::boolean("isActive").default_bool(true),
];

pub static DEF: ResourceDef = ResourceDef {
    name: "event",
    collection: "events",
    create_fields: FIELDS,
    update_schema: UpdateSchema::Derived,
    list: ListRules::new(
        &["title", "description"],
        &["title", "date", "type", "status", "createdAt", "updatedAt"],
        "createdAt",
        10,
    )
    .enum_filters(&[
        EnumFilter { param: "type", values: TYPES },
        EnumFilter { param: "status", values: STATUSES },
    ])
    .bool_filters(&["isActive"])
    .date_range(DateRange { field: "date", from_param: "startDate", to_param: "endDate" }),
    messages: Messages {
        created: "Event created successfully",
        updated: "Event updated successfully",
        deleted: "Event deleted successfully",
        not_found: "Event not found",
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
        optional_filters: &[
            EnumFilter { param: "type", values: TYPES },
            EnumFilter { param: "status", values: STATUSES },
        ],
        search_fields: &[],
        sort_by: "date",
        ascending: false,
        default_limit: 50,
        exclude: &[],
    }),
    upcoming: Some(UpcomingView {
        date_field: "date",
        require: &[("status", "upcoming")],
        default_limit: 10,
    }),
    stats: Some(StatsDef {
        route: "/stats/overview",
        status_field: "status",
        status_values: STATUSES,
        active_count: true,
        newsletter_count: false,
        distributions: &["type"],
        recent: RecentRule { require: &[], require_active: true, sort_by: "createdAt" },
    }),
    toggle_noun: None,
};
