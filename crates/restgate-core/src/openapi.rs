//! Runtime OpenAPI 3 document assembly.
//!
//! Route shapes only exist after introspection, so the document is built
//! as plain JSON at runtime rather than through compile-time derive
//! machinery. Per-column filter parameters are gated by operator
//! applicability: range operators only on orderable columns, pattern
//! operators only on textual columns, `isnull` only on nullable columns.

use serde_json::{json, Map, Value};

use crate::schema::{ColumnDescriptor, SqlType, TableDescriptor};

/// One route of a table's CRUD surface, as mounted by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescription {
    /// HTTP method, upper case.
    pub method:       &'static str,
    /// Path pattern relative to the API root.
    pub path:         String,
    /// OpenAPI operation id.
    pub operation_id: String,
    /// One-line summary.
    pub summary:      String,
}

/// The eight routes of one table's CRUD surface.
#[must_use]
pub fn route_descriptions(descriptor: &TableDescriptor) -> Vec<RouteDescription> {
    let table = &descriptor.name;
    let collection = format!("/api/{table}/");
    let item = format!("/api/{table}/{{id}}");

    vec![
        route("GET", &collection, format!("list_{table}"), format!("List {table}")),
        route("POST", &collection, format!("insert_{table}"), format!("Insert into {table}")),
        route("PUT", &item, format!("replace_{table}_by_id"), format!("Replace one {table} row")),
        route("PATCH", &item, format!("update_{table}_by_id"), format!("Update one {table} row")),
        route("PUT", &collection, format!("replace_{table}"), format!("Bulk replace {table}")),
        route("PATCH", &collection, format!("update_{table}"), format!("Bulk update {table}")),
        route("DELETE", &item, format!("delete_{table}_by_id"), format!("Delete one {table} row")),
        route("DELETE", &collection, format!("delete_{table}"), format!("Bulk delete {table}")),
    ]
}

fn route(
    method: &'static str,
    path: &str,
    operation_id: String,
    summary: String,
) -> RouteDescription {
    RouteDescription {
        method,
        path: path.to_string(),
        operation_id,
        summary,
    }
}

/// Assemble the merged OpenAPI document for a set of tables.
///
/// `server_url` is the request origin; the caller derives it from the
/// incoming request so the document is valid wherever the gateway is
/// reachable.
#[must_use]
pub fn document<'a, I>(tables: I, server_url: &str) -> Value
where
    I: IntoIterator<Item = &'a TableDescriptor>,
{
    let mut paths = Map::new();
    let mut schemas = Map::new();

    for descriptor in tables {
        if let Value::Object(entries) = table_paths(descriptor) {
            paths.extend(entries);
        }
        schemas.insert(
            format!("{}Select", type_name(&descriptor.name)),
            row_schema(descriptor, true),
        );
        schemas.insert(
            format!("{}Insert", type_name(&descriptor.name)),
            row_schema(descriptor, false),
        );
    }

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "restgate",
            "description": "Auto-generated REST gateway over PostgreSQL",
            "version": crate::VERSION,
        },
        "servers": [{"url": server_url}],
        "paths": Value::Object(paths),
        "components": {"schemas": Value::Object(schemas)},
    })
}

/// The two path items of one table.
#[must_use]
pub fn table_paths(descriptor: &TableDescriptor) -> Value {
    let table = &descriptor.name;
    let select_ref = format!("#/components/schemas/{}Select", type_name(table));
    let insert_ref = format!("#/components/schemas/{}Insert", type_name(table));

    let list_parameters: Vec<Value> = filter_parameters(descriptor)
        .into_iter()
        .chain(list_control_parameters(descriptor))
        .collect();

    let write_parameters: Vec<Value> = filter_parameters(descriptor)
        .into_iter()
        .chain([returning_parameter(descriptor)])
        .collect();

    let row_response = json!({
        "200": {
            "description": "Affected row(s)",
            "content": {"application/json": {"schema": {"$ref": select_ref.clone()}}}
        },
        "204": {"description": "No content"},
        "404": {"description": "Record not found"}
    });

    let body = json!({
        "required": true,
        "content": {"application/json": {"schema": {"$ref": insert_ref}}}
    });

    let collection = json!({
        "get": {
            "operationId": format!("list_{table}"),
            "summary": format!("List {table}"),
            "tags": [table],
            "parameters": list_parameters,
            "responses": {
                "200": {
                    "description": "Matching rows",
                    "content": {"application/json": {"schema": {
                        "type": "array",
                        "items": {"$ref": select_ref.clone()}
                    }}}
                }
            }
        },
        "post": {
            "operationId": format!("insert_{table}"),
            "summary": format!("Insert into {table}"),
            "tags": [table],
            "parameters": insert_parameters(descriptor),
            "requestBody": body.clone(),
            "responses": {
                "201": {
                    "description": "Inserted row",
                    "content": {"application/json": {"schema": {"$ref": select_ref.clone()}}}
                },
                "204": {"description": "Conflict target hit, row skipped"}
            }
        },
        "put": {
            "operationId": format!("replace_{table}"),
            "summary": format!("Bulk replace {table}"),
            "tags": [table],
            "parameters": write_parameters.clone(),
            "requestBody": body.clone(),
            "responses": row_response.clone(),
        },
        "patch": {
            "operationId": format!("update_{table}"),
            "summary": format!("Bulk update {table}"),
            "tags": [table],
            "parameters": write_parameters,
            "requestBody": body.clone(),
            "responses": row_response.clone(),
        },
        "delete": {
            "operationId": format!("delete_{table}"),
            "summary": format!("Bulk delete {table}"),
            "tags": [table],
            "parameters": delete_parameters(descriptor),
            "responses": row_response.clone(),
        }
    });

    let item = json!({
        "put": {
            "operationId": format!("replace_{table}_by_id"),
            "summary": format!("Replace one {table} row"),
            "tags": [table],
            "parameters": item_parameters(descriptor),
            "requestBody": body.clone(),
            "responses": row_response.clone(),
        },
        "patch": {
            "operationId": format!("update_{table}_by_id"),
            "summary": format!("Update one {table} row"),
            "tags": [table],
            "parameters": item_parameters(descriptor),
            "requestBody": body,
            "responses": row_response.clone(),
        },
        "delete": {
            "operationId": format!("delete_{table}_by_id"),
            "summary": format!("Delete one {table} row"),
            "tags": [table],
            "parameters": item_delete_parameters(descriptor),
            "responses": row_response,
        }
    });

    let mut paths = Map::new();
    paths.insert(format!("/api/{table}/"), collection);
    paths.insert(format!("/api/{table}/{{id}}"), item);
    Value::Object(paths)
}

/// Filter parameters for every column, gated by operator applicability.
fn filter_parameters(descriptor: &TableDescriptor) -> Vec<Value> {
    let mut parameters = Vec::new();

    for column in &descriptor.columns {
        parameters.push(query_parameter(
            &column.name,
            json_type(&column.sql_type),
            format!("Filter: {} equals", column.name),
        ));
        parameters.push(query_parameter(
            &format!("{}__in", column.name),
            "string",
            format!("Filter: {} in comma-separated list", column.name),
        ));

        if column.sql_type.is_orderable() {
            for op in ["gt", "gte", "lt", "lte"] {
                parameters.push(query_parameter(
                    &format!("{}__{op}", column.name),
                    json_type(&column.sql_type),
                    format!("Filter: {} {op}", column.name),
                ));
            }
        }
        if column.sql_type.is_textual() {
            for op in ["like", "ilike"] {
                parameters.push(query_parameter(
                    &format!("{}__{op}", column.name),
                    "string",
                    format!("Filter: {} {op} pattern", column.name),
                ));
            }
        }
        if column.nullable {
            parameters.push(query_parameter(
                &format!("{}__isnull", column.name),
                "boolean",
                format!("Filter: {} is null", column.name),
            ));
        }
    }

    parameters
}

fn list_control_parameters(descriptor: &TableDescriptor) -> Vec<Value> {
    let columns = descriptor.column_names().join(", ");
    vec![
        query_parameter(
            "order_by",
            "string",
            format!("Comma-separated sort fields; prefix with - for descending. Columns: {columns}"),
        ),
        query_parameter("limit", "integer", "Maximum rows to return".to_string()),
        query_parameter("offset", "integer", "Rows to skip".to_string()),
        query_parameter(
            "select",
            "string",
            format!("Comma-separated projection. Columns: {columns}"),
        ),
    ]
}

fn returning_parameter(descriptor: &TableDescriptor) -> Value {
    let columns = descriptor.column_names().join(", ");
    query_parameter(
        "returning",
        "string",
        format!("Comma-separated fields to return. Columns: {columns}"),
    )
}

fn insert_parameters(descriptor: &TableDescriptor) -> Vec<Value> {
    vec![
        returning_parameter(descriptor),
        query_parameter("on_conflict", "string", "Conflict target column".to_string()),
        query_parameter(
            "on_conflict_action",
            "string",
            "Set to 'nothing' to skip conflicting rows".to_string(),
        ),
        query_parameter(
            "on_conflict_update",
            "string",
            "Comma-separated columns to overwrite on conflict".to_string(),
        ),
    ]
}

fn delete_parameters(descriptor: &TableDescriptor) -> Vec<Value> {
    filter_parameters(descriptor)
        .into_iter()
        .chain([
            returning_parameter(descriptor),
            query_parameter(
                "hard_delete",
                "boolean",
                "Bypass the soft-delete column and remove rows".to_string(),
            ),
        ])
        .collect()
}

fn item_parameters(descriptor: &TableDescriptor) -> Vec<Value> {
    vec![id_parameter(descriptor), returning_parameter(descriptor)]
}

fn item_delete_parameters(descriptor: &TableDescriptor) -> Vec<Value> {
    vec![
        id_parameter(descriptor),
        returning_parameter(descriptor),
        query_parameter(
            "hard_delete",
            "boolean",
            "Bypass the soft-delete column and remove the row".to_string(),
        ),
    ]
}

fn id_parameter(descriptor: &TableDescriptor) -> Value {
    let pk_type = descriptor
        .column(&descriptor.primary_key)
        .map_or("string", |c| json_type(&c.sql_type));
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "description": format!("Primary key ({})", descriptor.primary_key),
        "schema": {"type": pk_type}
    })
}

fn query_parameter(name: &str, json_type: &str, description: String) -> Value {
    json!({
        "name": name,
        "in": "query",
        "required": false,
        "description": description,
        "schema": {"type": json_type}
    })
}

/// JSON object schema of a row. The select variant includes every column
/// and marks nullable ones; the insert variant omits the primary key and
/// requires the non-nullable rest.
fn row_schema(descriptor: &TableDescriptor, select: bool) -> Value {
    let mut properties = Map::new();
    let mut required: Vec<Value> = Vec::new();

    for column in &descriptor.columns {
        if !select && column.name == descriptor.primary_key {
            continue;
        }
        properties.insert(column.name.clone(), column_schema(column, select));
        if !select && !column.nullable {
            required.push(Value::String(column.name.clone()));
        }
    }

    let mut schema = json!({
        "type": "object",
        "properties": Value::Object(properties),
    });
    if !select && !required.is_empty() {
        schema["required"] = Value::Array(required);
    }
    schema
}

fn column_schema(column: &ColumnDescriptor, select: bool) -> Value {
    let mut schema = json!({"type": json_type(&column.sql_type)});
    if matches!(column.sql_type, SqlType::Timestamp) {
        schema["format"] = Value::String("date-time".to_string());
    }
    if select && column.nullable {
        schema["nullable"] = Value::Bool(true);
    }
    schema
}

const fn json_type(sql_type: &SqlType) -> &'static str {
    match sql_type {
        SqlType::Integer | SqlType::Numeric | SqlType::Real | SqlType::DoublePrecision => "number",
        SqlType::Boolean => "boolean",
        SqlType::Text | SqlType::Varchar | SqlType::Timestamp | SqlType::Other(_) => "string",
    }
}

fn type_name(table: &str) -> String {
    let mut name = String::with_capacity(table.len());
    let mut upper_next = true;
    for ch in table.chars() {
        if ch == '_' || ch == '-' {
            upper_next = true;
        } else if upper_next {
            name.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            name.push(ch);
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::users_descriptor;

    fn parameter_names(parameters: &[Value]) -> Vec<&str> {
        parameters
            .iter()
            .filter_map(|p| p.get("name").and_then(Value::as_str))
            .collect()
    }

    #[test]
    fn test_route_descriptions_cover_crud_surface() {
        let routes = route_descriptions(&users_descriptor());
        assert_eq!(routes.len(), 8);
        assert!(routes
            .iter()
            .any(|r| r.method == "GET" && r.path == "/api/users/"));
        assert!(routes
            .iter()
            .any(|r| r.method == "DELETE" && r.path == "/api/users/{id}"));
    }

    #[test]
    fn test_range_operators_only_on_orderable_columns() {
        let names = filter_parameters(&users_descriptor())
            .iter()
            .filter_map(|p| p.get("name").and_then(Value::as_str).map(String::from))
            .collect::<Vec<_>>();
        assert!(names.contains(&"age__gte".to_string()));
        assert!(names.contains(&"created_at__lt".to_string()));
        assert!(!names.contains(&"name__gte".to_string()));
        assert!(!names.contains(&"is_active__lt".to_string()));
    }

    #[test]
    fn test_pattern_operators_only_on_textual_columns() {
        let parameters = filter_parameters(&users_descriptor());
        let names = parameter_names(&parameters);
        assert!(names.contains(&"name__ilike"));
        assert!(names.contains(&"email__like"));
        assert!(!names.contains(&"age__like"));
        assert!(!names.contains(&"created_at__ilike"));
    }

    #[test]
    fn test_isnull_only_on_nullable_columns() {
        let parameters = filter_parameters(&users_descriptor());
        let names = parameter_names(&parameters);
        assert!(names.contains(&"age__isnull"));
        assert!(!names.contains(&"name__isnull"));
    }

    #[test]
    fn test_insert_schema_omits_primary_key() {
        let schema = row_schema(&users_descriptor(), false);
        let properties = schema["properties"].as_object().expect("object");
        assert!(!properties.contains_key("id"));
        assert!(properties.contains_key("email"));

        let required: Vec<&str> = schema["required"]
            .as_array()
            .expect("required list")
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(required.contains(&"email"));
        assert!(!required.contains(&"age"));
    }

    #[test]
    fn test_select_schema_marks_nullable() {
        let schema = row_schema(&users_descriptor(), true);
        assert_eq!(schema["properties"]["age"]["nullable"], Value::Bool(true));
        assert!(schema["properties"]["name"].get("nullable").is_none());
        assert_eq!(
            schema["properties"]["created_at"]["format"],
            Value::String("date-time".to_string())
        );
    }

    #[test]
    fn test_document_merges_tables() {
        let users = users_descriptor();
        let doc = document([&users], "http://localhost:8000");
        assert_eq!(doc["openapi"], "3.0.3");
        assert_eq!(doc["servers"][0]["url"], "http://localhost:8000");
        assert!(doc["paths"].get("/api/users/").is_some());
        assert!(doc["paths"].get("/api/users/{id}").is_some());
        assert!(doc["components"]["schemas"].get("UsersSelect").is_some());
        assert!(doc["components"]["schemas"].get("UsersInsert").is_some());
    }

    #[test]
    fn test_type_name_camel_cases() {
        assert_eq!(type_name("users"), "Users");
        assert_eq!(type_name("order_items"), "OrderItems");
    }
}
