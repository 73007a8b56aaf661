//! Query-string handling for list endpoints.
//!
//! Raw query parameters are checked against the resource's declared
//! allow-lists and turned into a store [`ListQuery`] plus the page window.
//! Every violation is reported, not just the first.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{json, Value};

use crate::store::{timestamp, Document, ListQuery, SortOrder};
use crate::validation::{label, parse_date};

pub const MAX_LIMIT: i64 = 100;

/// Enum-valued filter parameter. An empty `values` slice accepts any string.
#[derive(Debug, Clone, Copy)]
pub struct EnumFilter {
    pub param: &'static str,
    pub values: &'static [&'static str],
}

/// Inclusive date-range filter over one document field.
#[derive(Debug, Clone, Copy)]
pub struct DateRange {
    pub field: &'static str,
    pub from_param: &'static str,
    pub to_param: &'static str,
}

/// Per-resource listing rules: which parameters exist and what they accept.
#[derive(Debug, Clone, Copy)]
pub struct ListRules {
    pub search_fields: &'static [&'static str],
    pub sort_fields: &'static [&'static str],
    pub default_sort: &'static str,
    pub default_limit: i64,
    pub enum_filters: &'static [EnumFilter],
    pub bool_filters: &'static [&'static str],
    pub date_range: Option<DateRange>,
}

impl ListRules {
    pub const fn new(
        search_fields: &'static [&'static str],
        sort_fields: &'static [&'static str],
        default_sort: &'static str,
        default_limit: i64,
    ) -> Self {
        Self {
            search_fields,
            sort_fields,
            default_sort,
            default_limit,
            enum_filters: &[],
            bool_filters: &[],
            date_range: None,
        }
    }

    pub const fn enum_filters(mut self, filters: &'static [EnumFilter]) -> Self {
        self.enum_filters = filters;
        self
    }

    pub const fn bool_filters(mut self, filters: &'static [&'static str]) -> Self {
        self.bool_filters = filters;
        self
    }

    pub const fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }
}

/// A validated list request: the page window plus the store query.
#[derive(Debug)]
pub struct ListParams {
    pub page: i64,
    pub limit: i64,
    pub query: ListQuery,
}

/// Validate raw query parameters against the rules. Unknown parameters are
/// ignored; the filter value `all` means "no filter" on enum parameters.
pub fn parse_params(
    rules: &ListRules,
    params: &HashMap<String, String>,
) -> Result<ListParams, Vec<String>> {
    let mut errors = Vec::new();

    let page = match params.get("page").map(String::as_str) {
        None | Some("") => 1,
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if n >= 1 => n,
            _ => {
                errors.push("Page must be a positive integer".to_string());
                1
            }
        },
    };

    let limit = match params.get("limit").map(String::as_str) {
        None | Some("") => rules.default_limit,
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if (1..=MAX_LIMIT).contains(&n) => n,
            _ => {
                errors.push(format!("Limit must be between 1 and {MAX_LIMIT}"));
                rules.default_limit
            }
        },
    };

    let sort_by = match params.get("sortBy").map(|s| s.trim()) {
        None | Some("") => rules.default_sort,
        Some(raw) => {
            if let Some(field) = rules.sort_fields.iter().copied().find(|f| *f == raw) {
                field
            } else {
                errors.push(format!(
                    "Sort field must be one of: {}",
                    rules.sort_fields.join(", ")
                ));
                rules.default_sort
            }
        }
    };

    let order = match params.get("sortOrder").map(|s| s.trim()) {
        None | Some("") => SortOrder::Desc,
        Some("asc") => SortOrder::Asc,
        Some("desc") => SortOrder::Desc,
        Some(_) => {
            errors.push("Sort order must be asc or desc".to_string());
            SortOrder::Desc
        }
    };

    // Saturating: an absurdly large page must not overflow the offset.
    let offset = (page - 1).saturating_mul(limit);
    let mut query = ListQuery::new(sort_by, order, limit, offset);

    if let Some(term) = params.get("search").map(|s| s.trim()) {
        if term.chars().count() > 200 {
            errors.push("Search term cannot exceed 200 characters".to_string());
        } else if !term.is_empty() && !rules.search_fields.is_empty() {
            query.filter = query.filter.search(rules.search_fields, term);
        }
    }

    for filter in rules.enum_filters {
        let Some(raw) = params.get(filter.param).map(|s| s.trim()) else {
            continue;
        };
        if raw.is_empty() || raw == "all" {
            continue;
        }
        if !filter.values.is_empty() && !filter.values.contains(&raw) {
            errors.push(format!(
                "{} filter must be one of: {}",
                label(filter.param),
                filter.values.join(", ")
            ));
            continue;
        }
        query.filter = query.filter.eq(filter.param, Value::String(raw.to_string()));
    }

    for field in rules.bool_filters {
        let Some(raw) = params.get(*field).map(|s| s.trim()) else {
            continue;
        };
        match raw {
            "" => {}
            "true" => query.filter = query.filter.eq(field, Value::Bool(true)),
            "false" => query.filter = query.filter.eq(field, Value::Bool(false)),
            _ => errors.push(format!("{} filter must be true or false", label(field))),
        }
    }

    if let Some(range) = &rules.date_range {
        let mut bound = |param: &str| -> Option<String> {
            let raw = params.get(param).map(|s| s.trim()).filter(|s| !s.is_empty())?;
            match parse_date(raw) {
                Some(dt) => Some(timestamp(dt)),
                None => {
                    errors.push(format!("{} must be a valid date", label(param)));
                    None
                }
            }
        };
        let from = bound(range.from_param);
        let to = bound(range.to_param);
        if let (Some(from), Some(to)) = (&from, &to) {
            if to < from {
                errors.push(format!(
                    "{} must be after {}",
                    label(range.to_param),
                    label(range.from_param)
                ));
            }
        }
        if from.is_some() || to.is_some() {
            query.filter = query.filter.range(range.field, from, to);
        }
    }

    if errors.is_empty() {
        Ok(ListParams { page, limit, query })
    } else {
        Err(errors)
    }
}

/// The pagination block every list response carries.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: u64,
    pub items_per_page: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: u64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total as i64 + limit - 1) / limit };
        Self {
            current_page: page,
            total_pages,
            total_items: total,
            items_per_page: limit,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

/// Shape a page of documents into the list payload.
pub fn page_payload(items: Vec<Document>, pagination: Pagination) -> Value {
    json!({ "items": items, "pagination": pagination })
}
