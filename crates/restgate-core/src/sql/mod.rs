//! SQL synthesis from parsed parameters.
//!
//! The synthesizer is the only place SQL text is produced. Every statement
//! is wrapped so rows come back as single JSON documents: reads as
//! `SELECT row_to_json(t) FROM (...) t`, writes as
//! `WITH w AS (<dml> RETURNING ...) SELECT row_to_json(w) FROM w`.
//!
//! Values render through one literal printer (strings with doubled single
//! quotes, JSON values as `::jsonb` literals); identifiers through one
//! double-quote printer. The synthesizer is the final authority on field
//! validity: a filter or projection naming an unknown column is skipped
//! here even if a caller hands one in directly.

use serde_json::{Map, Value};

use crate::params::{
    ConflictAction, Filter, FilterOp, ParsedDelete, ParsedInsert, ParsedQuery, SortDirection,
};
use crate::schema::TableDescriptor;

/// Quote a PostgreSQL identifier. Interior double quotes are doubled.
#[inline]
#[must_use]
pub fn quote_ident(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Render a JSON value as a SQL literal.
///
/// Arrays and objects become `::jsonb` literals; everything else maps to
/// the obvious scalar spelling. Type mismatches are left for the database
/// to report.
#[must_use]
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote_str(s),
        Value::Array(_) | Value::Object(_) => {
            format!("{}::jsonb", quote_str(&value.to_string()))
        }
    }
}

fn quote_str(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Render one filter as a predicate. `None` when the field is not a column
/// of the table or an `in` list is empty.
fn predicate(descriptor: &TableDescriptor, filter: &Filter) -> Option<String> {
    if !descriptor.has_column(&filter.field) {
        return None;
    }
    let column = quote_ident(&filter.field);

    let sql = match filter.op {
        FilterOp::Eq => format!("{column} = {}", literal(&filter.value)),
        FilterOp::Gt => format!("{column} > {}", literal(&filter.value)),
        FilterOp::Gte => format!("{column} >= {}", literal(&filter.value)),
        FilterOp::Lt => format!("{column} < {}", literal(&filter.value)),
        FilterOp::Lte => format!("{column} <= {}", literal(&filter.value)),
        FilterOp::Like => format!("{column} LIKE {}", literal(&filter.value)),
        FilterOp::Ilike => format!("{column} ILIKE {}", literal(&filter.value)),
        FilterOp::In => {
            let items = filter.value.as_array()?;
            if items.is_empty() {
                return None;
            }
            let rendered: Vec<String> = items.iter().map(literal).collect();
            format!("{column} IN ({})", rendered.join(", "))
        }
        FilterOp::IsNull => {
            if filter.value.as_bool().unwrap_or(true) {
                format!("{column} IS NULL")
            } else {
                format!("{column} IS NOT NULL")
            }
        }
    };

    Some(sql)
}

/// Combine filters with `AND`. `None` when nothing survives.
#[must_use]
pub fn where_sql(descriptor: &TableDescriptor, filters: &[Filter]) -> Option<String> {
    let parts: Vec<String> = filters
        .iter()
        .filter_map(|f| predicate(descriptor, f))
        .collect();
    (!parts.is_empty()).then(|| parts.join(" AND "))
}

fn projection_sql(descriptor: &TableDescriptor, select: Option<&[String]>) -> String {
    let columns: Vec<String> = select
        .unwrap_or_default()
        .iter()
        .filter(|field| descriptor.has_column(field))
        .map(|field| quote_ident(field))
        .collect();
    if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(", ")
    }
}

fn returning_sql(descriptor: &TableDescriptor, returning: Option<&[String]>) -> String {
    projection_sql(descriptor, returning)
}

/// Synthesize a list SELECT.
#[must_use]
pub fn synthesize_select(descriptor: &TableDescriptor, query: &ParsedQuery) -> String {
    let mut inner = format!(
        "SELECT {} FROM {}",
        projection_sql(descriptor, query.select.as_deref()),
        quote_ident(&descriptor.name)
    );

    if let Some(clause) = where_sql(descriptor, &query.filters) {
        inner.push_str(" WHERE ");
        inner.push_str(&clause);
    }

    let directives: Vec<String> = query
        .sort
        .iter()
        .filter(|s| descriptor.has_column(&s.field))
        .map(|s| {
            let direction = match s.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            format!("{} {direction}", quote_ident(&s.field))
        })
        .collect();
    if !directives.is_empty() {
        inner.push_str(" ORDER BY ");
        inner.push_str(&directives.join(", "));
    }

    if let Some(limit) = query.limit {
        inner.push_str(&format!(" LIMIT {limit}"));
    }
    if let Some(offset) = query.offset {
        inner.push_str(&format!(" OFFSET {offset}"));
    }

    format!("SELECT row_to_json(t) AS row FROM ({inner}) t")
}

/// Synthesize an INSERT. `None` when the body carries no known column, in
/// which case no SQL should be issued.
#[must_use]
pub fn synthesize_insert(
    descriptor: &TableDescriptor,
    body: &Map<String, Value>,
    params: &ParsedInsert,
) -> Option<String> {
    // Columns in ordinal order keep the statement deterministic for a
    // given body, whatever the JSON key order was.
    let present: Vec<(&str, &Value)> = descriptor
        .columns
        .iter()
        .filter_map(|c| body.get(&c.name).map(|v| (c.name.as_str(), v)))
        .collect();
    if present.is_empty() {
        return None;
    }

    let columns: Vec<String> = present.iter().map(|(name, _)| quote_ident(name)).collect();
    let values: Vec<String> = present.iter().map(|(_, value)| literal(value)).collect();

    let mut stmt = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(&descriptor.name),
        columns.join(", "),
        values.join(", ")
    );

    if let Some(conflict) = &params.on_conflict {
        if descriptor.has_column(&conflict.column) {
            stmt.push_str(&format!(" ON CONFLICT ({})", quote_ident(&conflict.column)));
            match &conflict.action {
                ConflictAction::Nothing => stmt.push_str(" DO NOTHING"),
                ConflictAction::Update(columns) => {
                    let assignments: Vec<String> = columns
                        .iter()
                        .filter(|c| descriptor.has_column(c))
                        .map(|c| format!("{} = EXCLUDED.{}", quote_ident(c), quote_ident(c)))
                        .collect();
                    if assignments.is_empty() {
                        stmt.push_str(" DO NOTHING");
                    } else {
                        stmt.push_str(&format!(" DO UPDATE SET {}", assignments.join(", ")));
                    }
                }
            }
        }
    }

    stmt.push_str(&format!(
        " RETURNING {}",
        returning_sql(descriptor, params.returning.as_deref())
    ));

    Some(wrap_dml(&stmt))
}

/// Synthesize an UPDATE.
///
/// The set list excludes the primary key and unknown keys; when nothing
/// remains, `None` is returned and the caller reports an empty result
/// without touching the database.
#[must_use]
pub fn synthesize_update(
    descriptor: &TableDescriptor,
    body: &Map<String, Value>,
    filters: &[Filter],
    returning: Option<&[String]>,
) -> Option<String> {
    let assignments: Vec<String> = descriptor
        .columns
        .iter()
        .filter(|c| c.name != descriptor.primary_key)
        .filter_map(|c| {
            body.get(&c.name)
                .map(|v| format!("{} = {}", quote_ident(&c.name), literal(v)))
        })
        .collect();
    if assignments.is_empty() {
        return None;
    }

    let mut stmt = format!(
        "UPDATE {} SET {}",
        quote_ident(&descriptor.name),
        assignments.join(", ")
    );
    if let Some(clause) = where_sql(descriptor, filters) {
        stmt.push_str(" WHERE ");
        stmt.push_str(&clause);
    }
    stmt.push_str(&format!(" RETURNING {}", returning_sql(descriptor, returning)));

    Some(wrap_dml(&stmt))
}

/// Synthesize a DELETE.
///
/// When the table has a soft-delete column and `hard_delete` was not
/// requested, the statement is an UPDATE stamping that column instead.
#[must_use]
pub fn synthesize_delete(descriptor: &TableDescriptor, params: &ParsedDelete) -> String {
    let mut stmt = match (&descriptor.soft_delete_column, params.hard_delete) {
        (Some(column), false) => format!(
            "UPDATE {} SET {} = NOW()",
            quote_ident(&descriptor.name),
            quote_ident(column)
        ),
        _ => format!("DELETE FROM {}", quote_ident(&descriptor.name)),
    };

    if let Some(clause) = where_sql(descriptor, &params.filters) {
        stmt.push_str(" WHERE ");
        stmt.push_str(&clause);
    }
    stmt.push_str(&format!(
        " RETURNING {}",
        returning_sql(descriptor, params.returning.as_deref())
    ));

    wrap_dml(&stmt)
}

/// Build the single `eq` filter used by `/{id}` endpoints. A string id is
/// coerced to a number when the parse succeeds, otherwise kept as-is.
#[must_use]
pub fn pk_filter(descriptor: &TableDescriptor, raw_id: &str) -> Filter {
    let value = raw_id
        .parse::<i64>()
        .map_or_else(|_| Value::String(raw_id.to_string()), Value::from);
    Filter {
        field: descriptor.primary_key.clone(),
        op:    FilterOp::Eq,
        value,
    }
}

fn wrap_dml(stmt: &str) -> String {
    format!("WITH w AS ({stmt}) SELECT row_to_json(w) AS row FROM w")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::OnConflict;
    use crate::schema::users_descriptor;
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().expect("object literal").clone()
    }

    #[test]
    fn test_plain_select() {
        let desc = users_descriptor();
        let sql = synthesize_select(&desc, &ParsedQuery::default());
        assert_eq!(sql, r#"SELECT row_to_json(t) AS row FROM (SELECT * FROM "users") t"#);
    }

    #[test]
    fn test_select_full_grammar() {
        let desc = users_descriptor();
        let query = ParsedQuery {
            filters: vec![Filter {
                field: "is_active".to_string(),
                op:    FilterOp::Eq,
                value: json!(true),
            }],
            sort:    vec![crate::params::SortDirective {
                field:     "created_at".to_string(),
                direction: SortDirection::Desc,
            }],
            limit:   Some(2),
            offset:  None,
            select:  Some(vec!["id".to_string(), "name".to_string()]),
        };
        let sql = synthesize_select(&desc, &query);
        assert_eq!(
            sql,
            "SELECT row_to_json(t) AS row FROM (SELECT \"id\", \"name\" FROM \"users\" \
             WHERE \"is_active\" = true ORDER BY \"created_at\" DESC LIMIT 2) t"
        );
    }

    #[test]
    fn test_filters_join_with_and() {
        let desc = users_descriptor();
        let clause = where_sql(
            &desc,
            &[
                Filter {
                    field: "age".to_string(),
                    op:    FilterOp::Gte,
                    value: json!(18),
                },
                Filter {
                    field: "name".to_string(),
                    op:    FilterOp::Ilike,
                    value: json!("%al%"),
                },
            ],
        );
        assert_eq!(
            clause.as_deref(),
            Some("\"age\" >= 18 AND \"name\" ILIKE '%al%'")
        );
    }

    #[test]
    fn test_unknown_filter_field_skipped() {
        let desc = users_descriptor();
        let clause = where_sql(
            &desc,
            &[Filter {
                field: "ghost".to_string(),
                op:    FilterOp::Eq,
                value: json!(1),
            }],
        );
        assert_eq!(clause, None);
    }

    #[test]
    fn test_empty_in_list_dropped() {
        let desc = users_descriptor();
        let clause = where_sql(
            &desc,
            &[Filter {
                field: "age".to_string(),
                op:    FilterOp::In,
                value: json!([]),
            }],
        );
        assert_eq!(clause, None);
    }

    #[test]
    fn test_in_list_rendering() {
        let desc = users_descriptor();
        let clause = where_sql(
            &desc,
            &[Filter {
                field: "age".to_string(),
                op:    FilterOp::In,
                value: json!([1, 2, "x"]),
            }],
        );
        assert_eq!(clause.as_deref(), Some("\"age\" IN (1, 2, 'x')"));
    }

    #[test]
    fn test_isnull_directions() {
        let desc = users_descriptor();
        let is_null = where_sql(
            &desc,
            &[Filter {
                field: "age".to_string(),
                op:    FilterOp::IsNull,
                value: json!(true),
            }],
        );
        assert_eq!(is_null.as_deref(), Some("\"age\" IS NULL"));

        let not_null = where_sql(
            &desc,
            &[Filter {
                field: "age".to_string(),
                op:    FilterOp::IsNull,
                value: json!(false),
            }],
        );
        assert_eq!(not_null.as_deref(), Some("\"age\" IS NOT NULL"));
    }

    #[test]
    fn test_sql_injection_quoting() {
        let desc = users_descriptor();
        let clause = where_sql(
            &desc,
            &[Filter {
                field: "name".to_string(),
                op:    FilterOp::Eq,
                value: json!("'; DROP TABLE users; --"),
            }],
        );
        assert_eq!(
            clause.as_deref(),
            Some("\"name\" = '''; DROP TABLE users; --'")
        );
    }

    #[test]
    fn test_insert_basic() {
        let desc = users_descriptor();
        let sql = synthesize_insert(
            &desc,
            &body(json!({"name": "A", "email": "a@x"})),
            &ParsedInsert::default(),
        )
        .expect("valid columns present");
        assert_eq!(
            sql,
            "WITH w AS (INSERT INTO \"users\" (\"name\", \"email\") VALUES ('A', 'a@x') \
             RETURNING *) SELECT row_to_json(w) AS row FROM w"
        );
    }

    #[test]
    fn test_insert_upsert_do_nothing() {
        let desc = users_descriptor();
        let params = ParsedInsert {
            returning:   None,
            on_conflict: Some(OnConflict {
                column: "email".to_string(),
                action: ConflictAction::Nothing,
            }),
        };
        let sql = synthesize_insert(&desc, &body(json!({"email": "a@x"})), &params)
            .expect("valid columns present");
        assert!(sql.contains("ON CONFLICT (\"email\") DO NOTHING"));
    }

    #[test]
    fn test_insert_upsert_do_update() {
        let desc = users_descriptor();
        let params = ParsedInsert {
            returning:   Some(vec!["id".to_string(), "name".to_string()]),
            on_conflict: Some(OnConflict {
                column: "email".to_string(),
                action: ConflictAction::Update(vec!["name".to_string()]),
            }),
        };
        let sql = synthesize_insert(&desc, &body(json!({"email": "a@x", "name": "B"})), &params)
            .expect("valid columns present");
        assert!(sql.contains("ON CONFLICT (\"email\") DO UPDATE SET \"name\" = EXCLUDED.\"name\""));
        assert!(sql.contains("RETURNING \"id\", \"name\""));
    }

    #[test]
    fn test_insert_unknown_keys_dropped() {
        let desc = users_descriptor();
        let sql = synthesize_insert(
            &desc,
            &body(json!({"name": "A", "phone": "555"})),
            &ParsedInsert::default(),
        )
        .expect("one valid column");
        assert!(!sql.contains("phone"));
    }

    #[test]
    fn test_insert_no_valid_columns() {
        let desc = users_descriptor();
        let sql = synthesize_insert(&desc, &body(json!({"phone": "555"})), &ParsedInsert::default());
        assert_eq!(sql, None);
    }

    #[test]
    fn test_update_excludes_primary_key() {
        let desc = users_descriptor();
        let sql = synthesize_update(
            &desc,
            &body(json!({"id": 7, "name": "B"})),
            &[],
            None,
        )
        .expect("name remains");
        assert!(!sql.contains("\"id\" ="));
        assert!(sql.contains("SET \"name\" = 'B'"));
    }

    #[test]
    fn test_update_empty_set_list_yields_none() {
        let desc = users_descriptor();
        assert_eq!(
            synthesize_update(&desc, &body(json!({"id": 7, "ghost": 1})), &[], None),
            None
        );
    }

    #[test]
    fn test_update_with_filters_and_returning() {
        let desc = users_descriptor();
        let sql = synthesize_update(
            &desc,
            &body(json!({"is_active": false})),
            &[pk_filter(&desc, "9")],
            Some(&["id".to_string()]),
        )
        .expect("set list non-empty");
        assert_eq!(
            sql,
            "WITH w AS (UPDATE \"users\" SET \"is_active\" = false WHERE \"id\" = 9 \
             RETURNING \"id\") SELECT row_to_json(w) AS row FROM w"
        );
    }

    #[test]
    fn test_hard_delete() {
        let desc = users_descriptor();
        let params = ParsedDelete {
            filters:     vec![pk_filter(&desc, "1")],
            returning:   Some(vec!["id".to_string()]),
            hard_delete: true,
        };
        let sql = synthesize_delete(&desc, &params);
        assert_eq!(
            sql,
            "WITH w AS (DELETE FROM \"users\" WHERE \"id\" = 1 RETURNING \"id\") \
             SELECT row_to_json(w) AS row FROM w"
        );
    }

    #[test]
    fn test_delete_without_soft_column_is_hard() {
        let desc = users_descriptor();
        let params = ParsedDelete::default();
        let sql = synthesize_delete(&desc, &params);
        assert!(sql.contains("DELETE FROM \"users\""));
    }

    #[test]
    fn test_soft_delete_stamps_marker_column() {
        use crate::schema::{ColumnDescriptor, SchemaConventions, SqlType, TableDescriptor};
        let desc = TableDescriptor::build(
            "posts",
            vec![
                ColumnDescriptor::new("id", SqlType::Integer, false),
                ColumnDescriptor::new("title", SqlType::Text, false),
                ColumnDescriptor::new("deleted_at", SqlType::Timestamp, true),
            ],
            &SchemaConventions::default(),
        );
        let params = ParsedDelete {
            filters:     vec![pk_filter(&desc, "3")],
            returning:   None,
            hard_delete: false,
        };
        let sql = synthesize_delete(&desc, &params);
        assert!(sql.contains("UPDATE \"posts\" SET \"deleted_at\" = NOW() WHERE \"id\" = 3"));

        // hard_delete bypasses the marker column.
        let hard = ParsedDelete {
            hard_delete: true,
            ..params
        };
        assert!(synthesize_delete(&desc, &hard).contains("DELETE FROM \"posts\""));
    }

    #[test]
    fn test_pk_filter_coercion() {
        let desc = users_descriptor();
        assert_eq!(pk_filter(&desc, "42").value, json!(42));
        assert_eq!(pk_filter(&desc, "abc").value, json!("abc"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // The UPDATE set list never contains the primary key or a key
            // outside the descriptor, whatever the body holds.
            #[test]
            fn update_set_list_excludes_pk_and_unknown(
                keys in proptest::collection::vec("[a-z_]{1,12}", 1..8),
            ) {
                let desc = users_descriptor();
                let mut map = Map::new();
                for key in keys {
                    map.insert(key, json!("v"));
                }
                if let Some(sql) = synthesize_update(&desc, &map, &[], None) {
                    prop_assert!(!sql.contains("\"id\" = "));
                    let set_clause = sql
                        .split(" SET ")
                        .nth(1)
                        .and_then(|rest| rest.split(" RETURNING").next())
                        .unwrap_or_default();
                    for assignment in set_clause.split(", ") {
                        let column = assignment
                            .trim_start_matches('"')
                            .split('"')
                            .next()
                            .unwrap_or_default();
                        prop_assert!(desc.has_column(column), "unexpected column {column}");
                        prop_assert!(column != desc.primary_key);
                    }
                }
            }
        }
    }
}
