//! Static resource definitions.
//!
//! Every content and intake resource is described by one [`ResourceDef`]
//! const: its collection, validation schema, listing rules, response
//! messages and lifecycle wiring. The generic handlers in
//! `handlers::resource` read the definition from a request extension, so
//! adding a resource means writing a definition and mounting routes, not
//! writing handlers.

pub mod announcement;
pub mod blog;
pub mod contact;
pub mod event;
pub mod incubation;
pub mod mentor;
pub mod pre_incubation;
pub mod program;

use crate::listing::{EnumFilter, ListRules};
use crate::store::Document;
use crate::validation::FieldSpec;

/// Response message set. The wording is part of the published API.
#[derive(Debug, Clone, Copy)]
pub struct Messages {
    pub created: &'static str,
    pub updated: &'static str,
    pub deleted: &'static str,
    pub not_found: &'static str,
}

/// How the update schema relates to the create schema.
#[derive(Debug, Clone, Copy)]
pub enum UpdateSchema {
    /// Create fields, every one optional.
    Derived,
    /// Create fields plus extra admin-only fields, every one optional.
    DerivedPlus(&'static [FieldSpec]),
    /// An explicit table replacing the derived one.
    Explicit(&'static [FieldSpec]),
}

/// Pre-insert uniqueness check on one field.
#[derive(Debug, Clone, Copy)]
pub struct UniqueRule {
    pub field: &'static str,
    pub message: &'static str,
}

/// Publishable lifecycle: entering `published_value` stamps `stamp_field`.
#[derive(Debug, Clone, Copy)]
pub struct PublishRule {
    pub status_field: &'static str,
    pub published_value: &'static str,
    pub stamp_field: &'static str,
}

/// Unauthenticated read view of a resource.
#[derive(Debug, Clone, Copy)]
pub struct PublicView {
    /// Fixed field requirements, e.g. `status = published`.
    pub require: &'static [(&'static str, &'static str)],
    pub require_active: bool,
    /// Enum filters the caller may pass (event type/status).
    pub optional_filters: &'static [EnumFilter],
    /// Search fields the caller may use (mentor directory).
    pub search_fields: &'static [&'static str],
    pub sort_by: &'static str,
    pub ascending: bool,
    pub default_limit: i64,
    /// Fields stripped from every returned document.
    pub exclude: &'static [&'static str],
}

/// Public "what's next" view: future-dated documents in a fixed state,
/// soonest first.
#[derive(Debug, Clone, Copy)]
pub struct UpcomingView {
    pub date_field: &'static str,
    pub require: &'static [(&'static str, &'static str)],
    pub default_limit: i64,
}

/// Which documents the stats `recent` sample draws from.
#[derive(Debug, Clone, Copy)]
pub struct RecentRule {
    pub require: &'static [(&'static str, &'static str)],
    pub require_active: bool,
    pub sort_by: &'static str,
}

/// Overview statistics layout.
#[derive(Debug, Clone, Copy)]
pub struct StatsDef {
    /// Route below the resource root, `/stats` or `/stats/overview`.
    pub route: &'static str,
    /// Field behind `byStatus`, with the members to zero-fill.
    pub status_field: &'static str,
    pub status_values: &'static [&'static str],
    /// Include an `active` count (`isActive = true`).
    pub active_count: bool,
    /// Include a `newsletterSubscribers` count.
    pub newsletter_count: bool,
    /// Categorical fields summarized under `distributions`.
    pub distributions: &'static [&'static str],
    pub recent: RecentRule,
}

/// Mutates a freshly validated document before insert.
pub type CreateHook = fn(&mut Document);

/// Mutates a validated update patch; receives the acting admin's id.
pub type UpdateHook = fn(&mut Document, &str);

/// Everything the generic handlers need to know about one resource.
pub struct ResourceDef {
    pub name: &'static str,
    pub collection: &'static str,
    pub create_fields: &'static [FieldSpec],
    pub update_schema: UpdateSchema,
    pub list: ListRules,
    pub messages: Messages,
    /// The create endpoint is open intake rather than admin-gated.
    pub public_create: bool,
    /// Stamp `createdBy`/`updatedBy` with the acting admin.
    pub audit: bool,
    /// Admin-identity reference fields to resolve into `{id, name, email}`.
    pub populate: &'static [&'static str],
    pub unique: Option<UniqueRule>,
    pub publish: Option<PublishRule>,
    pub create_hook: Option<CreateHook>,
    pub update_hook: Option<UpdateHook>,
    pub public_view: Option<PublicView>,
    pub upcoming: Option<UpcomingView>,
    pub stats: Option<StatsDef>,
    /// Noun for the activate/deactivate endpoint, when the resource has one.
    pub toggle_noun: Option<&'static str>,
}

impl ResourceDef {
    /// Schema tables that apply to an update payload.
    pub fn update_tables(&self) -> Vec<&'static [FieldSpec]> {
        match self.update_schema {
            UpdateSchema::Derived => vec![self.create_fields],
            UpdateSchema::DerivedPlus(extra) => vec![self.create_fields, extra],
            UpdateSchema::Explicit(table) => vec![table],
        }
    }
}

/// Every resource served by the API, in route order.
pub static ALL: &[&ResourceDef] = &[
    &announcement::DEF,
    &blog::DEF,
    &event::DEF,
    &program::DEF,
    &mentor::DEF,
    &contact::DEF,
    &pre_incubation::DEF,
    &incubation::DEF,
];

/// Collections the store must provide, including the admin user collection.
pub fn collections() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = ALL.iter().map(|def| def.collection).collect();
    names.push(crate::auth::USERS_COLLECTION);
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions_are_internally_consistent() {
        for def in ALL {
            assert!(!def.collection.is_empty(), "{} has no collection", def.name);
            assert!(!def.create_fields.is_empty(), "{} has no schema", def.name);
            assert!(
                def.list.sort_fields.contains(&def.list.default_sort),
                "{}: default sort {} is not in the allow-list",
                def.name,
                def.list.default_sort
            );
            if let Some(publish) = &def.publish {
                let status = def
                    .create_fields
                    .iter()
                    .find(|f| f.name == publish.status_field);
                assert!(status.is_some(), "{}: publish status field missing", def.name);
            }
        }
    }

    #[test]
    fn collections_include_users() {
        let names = collections();
        assert!(names.contains(&"users"));
        assert_eq!(names.len(), ALL.len() + 1);
    }
}
