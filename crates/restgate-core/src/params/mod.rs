//! Query-string grammar.
//!
//! A single query string parses into one of [`ParsedQuery`],
//! [`ParsedInsert`], [`ParsedUpdate`], or [`ParsedDelete`] depending on the
//! request verb. Parsing is pure (no I/O) and takes the owning table
//! descriptor: any filter, sort, or projection field that is not a column
//! of the table is dropped silently, which is what quietly discards
//! garbage keys.
//!
//! Filter keys follow `field[__op]`; a bare field means `eq`. A key whose
//! suffix is not a recognized operator is treated as a whole (likely
//! unknown) field name, so `name__foo=x` is dropped rather than rejected.

mod write;

pub use write::{parse_delete_params, parse_insert_params, parse_update_params};
pub use write::{ConflictAction, OnConflict, ParsedDelete, ParsedInsert, ParsedUpdate};

use serde_json::Value;

use crate::schema::{SqlType, TableDescriptor};

/// Filter operators accepted in query strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    In,
    IsNull,
}

impl FilterOp {
    /// Parse a `__op` suffix.
    #[must_use]
    pub fn parse_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "eq" => Some(Self::Eq),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "like" => Some(Self::Like),
            "ilike" => Some(Self::Ilike),
            "in" => Some(Self::In),
            "isnull" => Some(Self::IsNull),
            _ => None,
        }
    }

    /// The suffix spelling, used by fingerprints and serialization.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Like => "like",
            Self::Ilike => "ilike",
            Self::In => "in",
            Self::IsNull => "isnull",
        }
    }

    /// All operators, in grammar order.
    pub const ALL: [Self; 9] = [
        Self::Eq,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Like,
        Self::Ilike,
        Self::In,
        Self::IsNull,
    ];
}

/// One parsed filter. `field` is always a column of the owning table.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op:    FilterOp,
    pub value: Value,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One `order_by` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct SortDirective {
    pub field:     String,
    pub direction: SortDirection,
}

/// Parsed list/read parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedQuery {
    pub filters: Vec<Filter>,
    pub sort:    Vec<SortDirective>,
    pub limit:   Option<u64>,
    pub offset:  Option<u64>,
    pub select:  Option<Vec<String>>,
}

/// Parameter names never treated as filters, on any verb.
pub const RESERVED_ALWAYS: [&str; 4] = ["order_by", "limit", "offset", "select"];

/// Split a raw query string into percent-decoded key/value pairs.
///
/// `+` decodes to a space, as in form encoding. Pairs without `=` carry
/// an empty value.
#[must_use]
pub fn parse_pairs(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map_or(spaced.clone(), |cow| cow.into_owned())
}

/// Parse list/read parameters against a table descriptor.
#[must_use]
pub fn parse_query(descriptor: &TableDescriptor, pairs: &[(String, String)]) -> ParsedQuery {
    let mut parsed = ParsedQuery::default();

    for (key, value) in pairs {
        match key.as_str() {
            "order_by" => parsed.sort = parse_order_by(descriptor, value),
            "limit" => parsed.limit = parse_limit(value),
            "offset" => parsed.offset = parse_offset(value),
            "select" => parsed.select = parse_projection(descriptor, value),
            _ => {
                if let Some(filter) = parse_filter(descriptor, key, value) {
                    parsed.filters.push(filter);
                }
            }
        }
    }

    parsed
}

/// Parse one non-reserved key as a filter. `None` when the field is not a
/// column of the table.
pub(crate) fn parse_filter(
    descriptor: &TableDescriptor,
    key: &str,
    raw: &str,
) -> Option<Filter> {
    let (field, op) = match key.rsplit_once("__") {
        Some((field, suffix)) => match FilterOp::parse_suffix(suffix) {
            Some(op) => (field, op),
            // Unrecognized suffix: the whole key is the field name.
            None => (key, FilterOp::Eq),
        },
        None => (key, FilterOp::Eq),
    };

    let column = descriptor.column(field)?;
    let value = match op {
        FilterOp::In => Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| coerce_value(&column.sql_type, part))
                .collect(),
        ),
        FilterOp::IsNull => Value::Bool(truthy(raw)),
        _ => coerce_value(&column.sql_type, raw),
    };

    Some(Filter {
        field: field.to_string(),
        op,
        value,
    })
}

/// Coerce a raw string according to the column's type.
///
/// Integer columns get a numeric parse; on failure the raw string is kept
/// so the database reports the type error. Booleans follow the `"true"` /
/// `"1"` rule. Everything else stays a string.
pub(crate) fn coerce_value(sql_type: &SqlType, raw: &str) -> Value {
    match sql_type {
        SqlType::Integer => raw
            .parse::<i64>()
            .map_or_else(|_| Value::String(raw.to_string()), Value::from),
        SqlType::Boolean => Value::Bool(truthy(raw)),
        _ => Value::String(raw.to_string()),
    }
}

pub(crate) fn truthy(raw: &str) -> bool {
    raw == "true" || raw == "1"
}

fn parse_order_by(descriptor: &TableDescriptor, raw: &str) -> Vec<SortDirective> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            let (field, direction) = token.strip_prefix('-').map_or(
                (token, SortDirection::Asc),
                |rest| (rest, SortDirection::Desc),
            );
            descriptor.has_column(field).then(|| SortDirective {
                field: field.to_string(),
                direction,
            })
        })
        .collect()
}

fn parse_limit(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().filter(|n| *n > 0)
}

fn parse_offset(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok()
}

/// Parse a comma-separated field list, dropping unknown fields. An empty
/// result means absent.
pub(crate) fn parse_projection(
    descriptor: &TableDescriptor,
    raw: &str,
) -> Option<Vec<String>> {
    let fields: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty() && descriptor.has_column(field))
        .map(ToString::to_string)
        .collect();
    (!fields.is_empty()).then_some(fields)
}

impl ParsedQuery {
    /// Serialize back into a canonical query string.
    ///
    /// `eq` filters serialize as bare field names; values are
    /// percent-encoded. `parse_query(parse_pairs(q.to_query_string()))`
    /// reproduces `q` for queries whose values match their column types.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        for filter in &self.filters {
            let key = match filter.op {
                FilterOp::Eq => filter.field.clone(),
                op => format!("{}__{}", filter.field, op.suffix()),
            };
            parts.push(format!(
                "{}={}",
                urlencoding::encode(&key),
                urlencoding::encode(&plain_value(&filter.value))
            ));
        }

        if !self.sort.is_empty() {
            let order: Vec<String> = self
                .sort
                .iter()
                .map(|s| match s.direction {
                    SortDirection::Asc => s.field.clone(),
                    SortDirection::Desc => format!("-{}", s.field),
                })
                .collect();
            parts.push(format!("order_by={}", urlencoding::encode(&order.join(","))));
        }

        if let Some(limit) = self.limit {
            parts.push(format!("limit={limit}"));
        }
        if let Some(offset) = self.offset {
            parts.push(format!("offset={offset}"));
        }
        if let Some(select) = &self.select {
            parts.push(format!("select={}", urlencoding::encode(&select.join(","))));
        }

        parts.join("&")
    }
}

/// Render a coerced value back to its query-string spelling.
pub(crate) fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(plain_value)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
