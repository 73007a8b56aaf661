//! Pre-incubation applications: the long intake form for teams applying to
//! the pre-incubation programme. Submission is public; review is admin work.

use chrono::Utc;
use serde_json::Value;

use crate::listing::{EnumFilter, ListRules};
use crate::store::{timestamp, Document};
use crate::validation::FieldSpec;

use super::{Messages, RecentRule, ResourceDef, StatsDef, UpdateSchema};

pub const APPLICATION_STATUSES: &[&str] = &[
    "submitted",
    "under-review",
    "approved",
    "rejected",
    "incubated",
    "graduated",
    "exited",
];
pub const STAGES: &[&str] = &["pre-incubation", "incubation", "graduated", "exited"];
pub const STATUSES: &[&str] = &["active", "inactive", "graduated", "exited"];
pub const TECHNOLOGY_CATEGORIES: &[&str] =
    &["to-be-developed", "self-developed", "acquired", "licensed", "off-the-shelf"];

const TEAM_MEMBER: &[FieldSpec] = &[
    FieldSpec::text("name", Some(1), Some(100)).required(),
    FieldSpec::text("address", Some(1), Some(500)).required(),
    FieldSpec::text("contact", Some(1), Some(200)).required(),
];

const SHAREHOLDER: &[FieldSpec] = &[
    FieldSpec::text("name", Some(1), Some(100)).required(),
    FieldSpec::integer("shares", Some(0.0), None).required(),
    FieldSpec::number("percentage", Some(0.0), Some(100.0)).required(),
    FieldSpec::text("designation", Some(1), Some(100)).required(),
];

const FIELDS: &[FieldSpec] = &[
    // A. Applicant details
    FieldSpec::text("applicantName", Some(1), Some(100)).required(),
    FieldSpec::text("applicantBackground", None, None),
    FieldSpec::text("companyName", Some(1), Some(200)).required(),
    FieldSpec::object_array("foundingTeam", 1, TEAM_MEMBER),
    FieldSpec::object_array("shareholdingStructure", 1, SHAREHOLDER),
    FieldSpec::text("partnershipDetails", None, None),
    FieldSpec::boolean("hasFiledITReturn").default_bool(false),
    FieldSpec::text("registrationNo", None, None),
    FieldSpec::text("registrationDate", None, None),
    FieldSpec::text("registeringAuthority", None, None),
    FieldSpec::text("pan", None, None),
    FieldSpec::text("tan", None, None),
    // B. Background
    FieldSpec::text("problemAddressed", Some(50), Some(1000)).required(),
    FieldSpec::text("proposedSolution", Some(50), Some(1000)).required(),
    // C. Business details
    FieldSpec::text("productServiceDetails", Some(100), Some(2000)).required(),
    FieldSpec::text("targetCustomer", Some(100), Some(2000)).required(),
    FieldSpec::text("businessPlan", Some(100), Some(2000)).required(),
    FieldSpec::text("marketSize", Some(100), Some(2000)).required(),
    FieldSpec::text("goToMarketStrategy", Some(100), Some(2000)).required(),
    FieldSpec::text("revenueModel", Some(100), Some(2000)).required(),
    FieldSpec::text("competitors", Some(100), Some(2000)).required(),
    FieldSpec::text("fundingInvestment", Some(100), Some(2000)).required(),
    FieldSpec::text("swotAnalysis", Some(100), Some(2000)).required(),
    FieldSpec::text("otherDetails", None, None),
    // D. Technology
    FieldSpec::enumeration("technologyCategory", TECHNOLOGY_CATEGORIES).required(),
    FieldSpec::text("technologyDetails", Some(50), Some(1000)).required(),
    FieldSpec::boolean("canBePatented").default_bool(false),
    FieldSpec::boolean("conductedPatentSearch").default_bool(false),
    FieldSpec::boolean("appliedForPatent").default_bool(false),
    FieldSpec::text("patentDetails", None, None),
    FieldSpec::text("otherIPRProtection", None, None),
    // E. Incubation requirement
    FieldSpec::text("infrastructureFacilities", Some(50), Some(1000)).required(),
    FieldSpec::text("mentors", Some(20), Some(500)).required(),
    FieldSpec::text("manpower", Some(20), Some(500)).required(),
    // Review state and progress tracking
    FieldSpec::enumeration("applicationStatus", APPLICATION_STATUSES).default_text("submitted"),
    FieldSpec::enumeration("currentStage", STAGES).default_text("pre-incubation"),
    FieldSpec::enumeration("status", STATUSES).default_text("active"),
    FieldSpec::number("fundingReceived", Some(0.0), None).default_int(0),
    FieldSpec::integer("employees", Some(0.0), None).default_int(0),
    FieldSpec::text_array("achievements", 0, None, None).default_empty_array(),
    FieldSpec::text_array("milestones", 0, None, None).default_empty_array(),
];

/// Review milestone dates, settable on update only.
pub(super) const REVIEW_DATES: &[FieldSpec] = &[
    FieldSpec::date("reviewedAt"),
    FieldSpec::date("approvedAt"),
    FieldSpec::date("startDate"),
    FieldSpec::date("endDate"),
];

pub(super) fn stamp_submitted_at(doc: &mut Document) {
    doc.insert("submittedAt".to_string(), Value::String(timestamp(Utc::now())));
}

pub static DEF: ResourceDef = ResourceDef {
    name: "pre-incubation",
    collection: "pre_incubation_applications",
    create_fields: FIELDS,
    update_schema: UpdateSchema::DerivedPlus(REVIEW_DATES),
    list: ListRules::new(
        &["applicantName", "companyName"],
        &["submittedAt", "applicantName", "companyName", "applicationStatus"],
        "submittedAt",
        10,
    )
    .enum_filters(&[
        EnumFilter { param: "applicationStatus", values: APPLICATION_STATUSES },
        EnumFilter { param: "currentStage", values: STAGES },
        EnumFilter { param: "status", values: STATUSES },
    ]),
    messages: Messages {
        created: "Pre-incubation application submitted successfully",
        updated: "Pre-incubation application updated successfully",
        deleted: "Pre-incubation application deleted successfully",
        not_found: "Pre-incubation application not found",
    },
    public_create: true,
    audit: false,
    populate: &[],
    unique: None,
    publish: None,
    create_hook: Some(stamp_submitted_at),
    update_hook: None,
    public_view: None,
    upcoming: None,
    stats: Some(StatsDef {
        route: "/stats/overview",
        status_field: "applicationStatus",
        status_values: APPLICATION_STATUSES,
        active_count: false,
        newsletter_count: false,
        distributions: &["applicationStatus", "currentStage"],
        recent: RecentRule { require: &[], require_active: false, sort_by: "submittedAt" },
    }),
    toggle_noun: None,
};
