//! Incubation applications: the intake form for ventures applying to move
//! into the incubator. Shares its review-state model with pre-incubation.

use crate::listing::{EnumFilter, ListRules};
use crate::validation::FieldSpec;

use super::pre_incubation::{APPLICATION_STATUSES, STAGES, STATUSES};
use super::{Messages, RecentRule, ResourceDef, StatsDef, UpdateSchema};

pub const ENTITY_TYPES: &[&str] = &["startup", "individual"];
pub const CATEGORIES: &[&str] = &["Process", "Product", "New Application", "Other"];

const FIELDS: &[FieldSpec] = &[
    // Applicant details
    FieldSpec::text("applicantName", Some(1), Some(100)).required(),
    FieldSpec::email("applicantEmail", None).required(),
    FieldSpec::text("dateOfBirth", Some(1), None).required(),
    FieldSpec::text("qualification", Some(1), Some(200)).required(),
    FieldSpec::text("contactDetails", Some(50), Some(1000)).required(),
    FieldSpec::enumeration("entityType", ENTITY_TYPES).required(),
    FieldSpec::text("companyRegistrationDetails", None, None),
    // Innovation details
    FieldSpec::text("innovationTitle", Some(1), Some(200)).required(),
    FieldSpec::text("prototypeTime", Some(1), Some(100)).required(),
    FieldSpec::enumeration("category", CATEGORIES).required(),
    FieldSpec::text("innovationDescription", Some(100), Some(2000)).required(),
    FieldSpec::text("applications", Some(50), Some(1000)).required(),
    FieldSpec::text("novelty", Some(50), Some(1000)).required(),
    FieldSpec::text("businessModel", Some(50), Some(1000)).required(),
    FieldSpec::text("rndStatus", Some(50), Some(1000)).required(),
    FieldSpec::text("trlStatus", Some(50), Some(1000)).required(),
    // Team and IP
    FieldSpec::text("teamMembers", Some(50), Some(1000)).required(),
    FieldSpec::text("patents", None, None),
    FieldSpec::text("awards", None, None),
    // Incubation requirements
    FieldSpec::text("requestedPeriod", Some(1), Some(100)).required(),
    FieldSpec::text("spaceRequested", Some(1), Some(200)).required(),
    FieldSpec::text("equipmentRequired", Some(50), Some(1000)).required(),
    FieldSpec::text("otherIncubator", None, None),
    // Compliance
    FieldSpec::text("clinicalSamples", None, None),
    FieldSpec::text("biosafetyClearance", None, None),
    FieldSpec::integer("employeesOnsite", Some(0.0), None).default_int(0),
    // Financials and support
    FieldSpec::text("fundRaised", Some(20), Some(500)).required(),
    FieldSpec::text("annualTurnover", Some(20), Some(500)).required(),
    FieldSpec::text("incubationHelp", Some(50), Some(1000)).required(),
    FieldSpec::text("documents", Some(20), Some(1000)).required(),
    // Support requested
    FieldSpec::boolean("isStudent").default_bool(false),
    FieldSpec::boolean("ideationMentorship").default_bool(false),
    FieldSpec::boolean("labAccess").default_bool(false),
    FieldSpec::boolean("prototypeSupport").default_bool(false),
    FieldSpec::boolean("businessPlanning").default_bool(false),
    FieldSpec::boolean("ecosystemExposure").default_bool(false),
    FieldSpec::boolean("priorFunding").default_bool(false),
    FieldSpec::text("fundingDetails", None, None),
    FieldSpec::boolean("collaborationRequired").default_bool(false),
    FieldSpec::text("collaborationDept", None, None),
    FieldSpec::text("futureVision", Some(50), Some(1000)).required(),
    // Review state and progress tracking
    FieldSpec::enumeration("applicationStatus", APPLICATION_STATUSES).default_text("submitted"),
    FieldSpec::enumeration("currentStage", STAGES).default_text("incubation"),
    FieldSpec::enumeration("status", STATUSES).default_text("active"),
    FieldSpec::number("fundingReceived", Some(0.0), None).default_int(0),
    FieldSpec::integer("employees", Some(0.0), None).default_int(0),
    FieldSpec::text_array("achievements", 0, None, None).default_empty_array(),
    FieldSpec::text_array("milestones", 0, None, None).default_empty_array(),
];

pub static DEF: ResourceDef = ResourceDef {
    name: "incubation",
    collection: "incubation_applications",
    create_fields: FIELDS,
    update_schema: UpdateSchema::DerivedPlus(super::pre_incubation::REVIEW_DATES),
    list: ListRules::new(
        &["applicantName", "innovationTitle"],
        &["submittedAt", "applicantName", "innovationTitle", "applicationStatus"],
        "submittedAt",
        10,
    )
    .enum_filters(&[
        EnumFilter { param: "applicationStatus", values: APPLICATION_STATUSES },
        EnumFilter { param: "currentStage", values: STAGES },
        EnumFilter { param: "status", values: STATUSES },
    ]),
    messages: Messages {
        created: "Incubation application submitted successfully",
        updated: "Incubation application updated successfully",
        deleted: "Incubation application deleted successfully",
        not_found: "Incubation application not found",
    },
    public_create: true,
    audit: false,
    populate: &[],
    unique: None,
    publish: None,
    create_hook: Some(super::pre_incubation::stamp_submitted_at),
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
