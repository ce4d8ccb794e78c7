//! Write-verb parameter grammars: insert, update, delete.

use super::{parse_filter, parse_projection, truthy, Filter};
use crate::schema::TableDescriptor;

/// What to do when an insert hits the conflict target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictAction {
    /// `ON CONFLICT ... DO NOTHING`.
    Nothing,
    /// `ON CONFLICT ... DO UPDATE SET <col> = EXCLUDED.<col>, ...`
    Update(Vec<String>),
}

/// Parsed `on_conflict` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnConflict {
    /// Conflict target column.
    pub column: String,
    /// Action on conflict.
    pub action: ConflictAction,
}

/// Parsed insert parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedInsert {
    pub returning:   Option<Vec<String>>,
    pub on_conflict: Option<OnConflict>,
}

/// Parsed update parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedUpdate {
    pub filters:   Vec<Filter>,
    pub returning: Option<Vec<String>>,
}

/// Parsed delete parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedDelete {
    pub filters:     Vec<Filter>,
    pub returning:   Option<Vec<String>>,
    pub hard_delete: bool,
}

/// Parse insert parameters.
///
/// `returning` behaves like `select` (unknown fields dropped, empty means
/// absent). An unknown conflict column drops the whole `on_conflict`
/// clause; `on_conflict_update` with no valid column falls back to
/// `DO NOTHING`.
#[must_use]
pub fn parse_insert_params(
    descriptor: &TableDescriptor,
    pairs: &[(String, String)],
) -> ParsedInsert {
    let mut parsed = ParsedInsert::default();
    let mut conflict_column: Option<String> = None;
    let mut update_columns: Option<Vec<String>> = None;

    for (key, value) in pairs {
        match key.as_str() {
            "returning" => parsed.returning = parse_projection(descriptor, value),
            "on_conflict" => conflict_column = Some(value.clone()),
            "on_conflict_update" => update_columns = parse_projection(descriptor, value),
            // "on_conflict_action=nothing" is the default action; any other
            // value is ignored rather than rejected.
            "on_conflict_action" => {}
            _ => {}
        }
    }

    if let Some(column) = conflict_column {
        if descriptor.has_column(&column) {
            let action = update_columns.map_or(ConflictAction::Nothing, ConflictAction::Update);
            parsed.on_conflict = Some(OnConflict { column, action });
        }
    }

    parsed
}

/// Parse update parameters: `returning` plus filters from the remaining
/// non-reserved keys.
#[must_use]
pub fn parse_update_params(
    descriptor: &TableDescriptor,
    pairs: &[(String, String)],
) -> ParsedUpdate {
    let mut parsed = ParsedUpdate::default();

    for (key, value) in pairs {
        match key.as_str() {
            "returning" => parsed.returning = parse_projection(descriptor, value),
            "order_by" | "limit" | "offset" | "select" => {}
            _ => {
                if let Some(filter) = parse_filter(descriptor, key, value) {
                    parsed.filters.push(filter);
                }
            }
        }
    }

    parsed
}

/// Parse delete parameters: `returning`, `hard_delete`, and filters.
#[must_use]
pub fn parse_delete_params(
    descriptor: &TableDescriptor,
    pairs: &[(String, String)],
) -> ParsedDelete {
    let mut parsed = ParsedDelete::default();

    for (key, value) in pairs {
        match key.as_str() {
            "returning" => parsed.returning = parse_projection(descriptor, value),
            "hard_delete" => parsed.hard_delete = truthy(value),
            "order_by" | "limit" | "offset" | "select" => {}
            _ => {
                if let Some(filter) = parse_filter(descriptor, key, value) {
                    parsed.filters.push(filter);
                }
            }
        }
    }

    parsed
}
