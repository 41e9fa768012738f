//! Dialect-specific SQL.
//!
//! Identifier quoting, placeholders, catalog type inference and the SELECT
//! statements issued by model handles.

use common::errors::{AppError, AppResult};
use common::models::{
    ColumnDescriptor, ColumnType, DbType, Direction, Filter, SchemaDescriptor,
};
use serde_json::Value;

/// Quotes an identifier for the dialect.
pub(crate) fn quote_ident(db_type: DbType, ident: &str) -> String {
    match db_type {
        DbType::MySQL => format!("`{}`", ident.replace('`', "``")),
        DbType::Postgres | DbType::SQLite => format!("\"{}\"", ident.replace('"', "\"\"")),
    }
}

/// Returns `namespace.table`, both quoted.
pub(crate) fn qualified_table(db_type: DbType, namespace: &str, table: &str) -> String {
    format!(
        "{}.{}",
        quote_ident(db_type, namespace),
        quote_ident(db_type, table)
    )
}

/// Returns the bind placeholder for the `n`-th parameter (1-based).
pub(crate) fn placeholder(db_type: DbType, n: usize) -> String {
    match db_type {
        DbType::Postgres => format!("${}", n),
        DbType::MySQL | DbType::SQLite => "?".to_string(),
    }
}

// ============== Type inference ==============

/// Infers the semantic type of a catalog column.
///
/// `full_type` is the complete column type where the dialect reports one
/// (MySQL `COLUMN_TYPE`, e.g. `tinyint(1)`); it may equal `data_type`.
pub(crate) fn infer_column_type(db_type: DbType, data_type: &str, full_type: &str) -> ColumnType {
    let data_type = data_type.trim().to_lowercase();
    match db_type {
        DbType::Postgres => infer_postgres(&data_type),
        DbType::MySQL => infer_mysql(&data_type, &full_type.trim().to_lowercase()),
        DbType::SQLite => infer_sqlite(&data_type),
    }
}

fn infer_postgres(data_type: &str) -> ColumnType {
    match data_type {
        "smallint" | "integer" | "bigint" | "int2" | "int4" | "int8" | "oid" => ColumnType::Integer,
        "numeric" | "decimal" | "real" | "double precision" | "float4" | "float8" => {
            ColumnType::Number
        }
        "boolean" | "bool" => ColumnType::Boolean,
        "character varying" | "varchar" | "character" | "char" | "bpchar" | "text" | "name"
        | "citext" | "uuid" | "inet" | "cidr" | "macaddr" | "xml" | "interval" | "money" => {
            ColumnType::String
        }
        "json" | "jsonb" => ColumnType::Json,
        "bytea" => ColumnType::Buffer,
        "date" => ColumnType::Date,
        t if t.starts_with("timestamp") || t.starts_with("time") => ColumnType::Date,
        _ => ColumnType::Unknown,
    }
}

fn infer_mysql(data_type: &str, full_type: &str) -> ColumnType {
    match data_type {
        "tinyint" if full_type.starts_with("tinyint(1)") => ColumnType::Boolean,
        "bit" if full_type == "bit(1)" => ColumnType::Boolean,
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "year" => {
            ColumnType::Integer
        }
        "decimal" | "numeric" | "float" | "double" | "real" => ColumnType::Number,
        "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" | "enum" | "set" => {
            ColumnType::String
        }
        "date" | "datetime" | "timestamp" | "time" => ColumnType::Date,
        "json" => ColumnType::Json,
        "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" | "bit" => {
            ColumnType::Buffer
        }
        _ => ColumnType::Unknown,
    }
}

/// SQLite declares types freely; follows the column affinity rules, with
/// boolean, date and JSON names recognised first.
fn infer_sqlite(declared: &str) -> ColumnType {
    if declared.is_empty() {
        ColumnType::String
    } else if declared.contains("bool") {
        ColumnType::Boolean
    } else if declared.contains("date") || declared.contains("time") {
        ColumnType::Date
    } else if declared.contains("json") {
        ColumnType::Json
    } else if declared.contains("int") {
        ColumnType::Integer
    } else if declared.contains("char") || declared.contains("clob") || declared.contains("text") {
        ColumnType::String
    } else if declared.contains("blob") {
        ColumnType::Buffer
    } else {
        ColumnType::Number
    }
}

// ============== Row projection ==============

/// How a projected column comes back from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wire {
    /// 64-bit integer.
    Integer,
    /// Text holding an integer that may exceed `i64`.
    IntegerText,
    /// Native boolean.
    Boolean,
    /// Integer where non-zero means true.
    IntegerBoolean,
    /// Text holding a decimal number.
    NumberText,
    /// Text holding a JSON document.
    JsonText,
    /// Plain text.
    Text,
}

/// Returns how a column is read back.
pub(crate) fn wire(db_type: DbType, column: &ColumnDescriptor) -> Wire {
    match column.column_type {
        ColumnType::Integer if is_mysql_unsigned(db_type, column) => Wire::IntegerText,
        ColumnType::Integer => Wire::Integer,
        ColumnType::Number => Wire::NumberText,
        ColumnType::Boolean if db_type == DbType::Postgres => Wire::Boolean,
        ColumnType::Boolean => Wire::IntegerBoolean,
        ColumnType::Json => Wire::JsonText,
        ColumnType::String | ColumnType::Date | ColumnType::Buffer | ColumnType::Unknown => {
            Wire::Text
        }
    }
}

/// MySQL reports the full column type, e.g. `bigint(20) unsigned`.
fn is_mysql_unsigned(db_type: DbType, column: &ColumnDescriptor) -> bool {
    db_type == DbType::MySQL && column.data_type.to_lowercase().contains("unsigned")
}

/// PostgreSQL types inferred as strings that have no `= text` operator.
/// Filter values are cast to the column type instead.
const PG_CAST_PARAM_TYPES: &[&str] = &["uuid", "inet", "cidr", "macaddr", "interval", "money"];

/// Returns the SELECT expression that normalises a column for decoding.
fn projection_expr(db_type: DbType, column: &ColumnDescriptor) -> String {
    let c = quote_ident(db_type, &column.name);
    match (db_type, column.column_type) {
        (DbType::Postgres, ColumnType::Integer) => format!("{}::int8", c),
        (DbType::Postgres, ColumnType::Boolean) => c,
        (DbType::Postgres, ColumnType::Buffer) => format!("encode({}, 'hex')", c),
        (DbType::Postgres, _) => format!("{}::text", c),

        (DbType::MySQL, ColumnType::Integer) if is_mysql_unsigned(db_type, column) => {
            format!("CAST({} AS CHAR)", c)
        }
        (DbType::MySQL, ColumnType::Integer | ColumnType::Boolean) => {
            format!("CAST({} AS SIGNED)", c)
        }
        (DbType::MySQL, ColumnType::Buffer) => format!("LOWER(HEX({}))", c),
        (DbType::MySQL, _) => format!("CAST({} AS CHAR)", c),

        (DbType::SQLite, ColumnType::Integer | ColumnType::Boolean | ColumnType::String) => c,
        (DbType::SQLite, ColumnType::Buffer) => format!("lower(hex({}))", c),
        (DbType::SQLite, _) => format!("CAST({} AS TEXT)", c),
    }
}

/// Returns the expression a filter value is compared against.
fn predicate_expr(db_type: DbType, column: &ColumnDescriptor) -> String {
    match column.column_type {
        // `xml` has no equality operator at all.
        ColumnType::String if db_type == DbType::Postgres && column.data_type == "xml" => {
            projection_expr(db_type, column)
        }
        ColumnType::Integer | ColumnType::Number | ColumnType::Boolean | ColumnType::String => {
            quote_ident(db_type, &column.name)
        }
        _ => projection_expr(db_type, column),
    }
}

/// Returns the placeholder for the `n`-th parameter, cast where the column
/// cannot be compared with text.
fn param_expr(db_type: DbType, column: &ColumnDescriptor, n: usize) -> String {
    let p = placeholder(db_type, n);
    let data_type = column.data_type.to_lowercase();
    if db_type == DbType::Postgres
        && column.column_type == ColumnType::String
        && PG_CAST_PARAM_TYPES.contains(&data_type.as_str())
    {
        format!("{}::{}", p, data_type)
    } else {
        p
    }
}

// ============== Parameters ==============

/// A bound query parameter.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SqlParam {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

/// Converts a filter value into a parameter matching the column type.
fn coerce(column: &ColumnDescriptor, value: &Value) -> AppResult<SqlParam> {
    let invalid = || {
        AppError::Validation(format!(
            "value {} does not match the {:?} column `{}`",
            value, column.column_type, column.name
        ))
    };
    match column.column_type {
        // Values past `i64` only fit unsigned columns; MySQL compares them as text.
        ColumnType::Integer => match value {
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Ok(SqlParam::Int(i)),
                (None, Some(u)) => Ok(SqlParam::Text(u.to_string())),
                _ => Err(invalid()),
            },
            Value::String(s) => {
                let s = s.trim();
                match (s.parse::<i64>(), s.parse::<u64>()) {
                    (Ok(i), _) => Ok(SqlParam::Int(i)),
                    (Err(_), Ok(u)) => Ok(SqlParam::Text(u.to_string())),
                    _ => Err(invalid()),
                }
            }
            _ => Err(invalid()),
        },
        ColumnType::Number => match value {
            Value::Number(n) => n.as_f64().map(SqlParam::Float).ok_or_else(invalid),
            Value::String(s) => s.trim().parse().map(SqlParam::Float).map_err(|_| invalid()),
            _ => Err(invalid()),
        },
        ColumnType::Boolean => match value {
            Value::Bool(b) => Ok(SqlParam::Bool(*b)),
            Value::Number(n) if n.as_i64() == Some(0) => Ok(SqlParam::Bool(false)),
            Value::Number(n) if n.as_i64() == Some(1) => Ok(SqlParam::Bool(true)),
            Value::String(s) => match s.to_lowercase().as_str() {
                "true" => Ok(SqlParam::Bool(true)),
                "false" => Ok(SqlParam::Bool(false)),
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        },
        ColumnType::Buffer => match value {
            Value::String(s) => Ok(SqlParam::Text(s.to_lowercase())),
            _ => Err(invalid()),
        },
        _ => match value {
            Value::String(s) => Ok(SqlParam::Text(s.clone())),
            other => Ok(SqlParam::Text(other.to_string())),
        },
    }
}

// ============== Statements ==============

/// A statement ready to bind and run.
#[derive(Debug)]
pub(crate) struct SelectPlan {
    pub sql: String,
    pub params: Vec<SqlParam>,
    /// Columns in projection order.
    pub columns: Vec<ColumnDescriptor>,
}

fn lookup<'a>(schema: &'a SchemaDescriptor, name: &str) -> AppResult<&'a ColumnDescriptor> {
    schema.column(name).ok_or_else(|| {
        AppError::Validation(format!(
            "unknown column `{}` on model `{}`",
            name, schema.name
        ))
    })
}

fn where_clause(
    schema: &SchemaDescriptor,
    filter: &Filter,
    params: &mut Vec<SqlParam>,
) -> AppResult<String> {
    let db_type = schema.db_type;
    let mut predicates = Vec::with_capacity(filter.conditions.len());
    for (name, value) in &filter.conditions {
        let column = lookup(schema, name)?;
        let expr = predicate_expr(db_type, column);
        if value.is_null() {
            predicates.push(format!("{} IS NULL", expr));
        } else {
            params.push(coerce(column, value)?);
            predicates.push(format!("{} = {}", expr, param_expr(db_type, column, params.len())));
        }
    }
    if predicates.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!(" WHERE {}", predicates.join(" AND ")))
    }
}

fn order_clause(schema: &SchemaDescriptor, filter: &Filter) -> AppResult<String> {
    let order = filter.parsed_order().map_err(AppError::Validation)?;
    if order.is_empty() {
        return Ok(String::new());
    }
    let mut terms = Vec::with_capacity(order.len());
    for (name, direction) in order {
        let column = lookup(schema, name)?;
        let direction = match direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        terms.push(format!("{} {}", quote_ident(schema.db_type, &column.name), direction));
    }
    Ok(format!(" ORDER BY {}", terms.join(", ")))
}

fn limit_clause(db_type: DbType, filter: &Filter) -> String {
    match (filter.limit, filter.skip) {
        (Some(limit), Some(skip)) => format!(" LIMIT {} OFFSET {}", limit, skip),
        (Some(limit), None) => format!(" LIMIT {}", limit),
        (None, Some(skip)) => match db_type {
            DbType::Postgres => format!(" OFFSET {}", skip),
            DbType::MySQL => format!(" LIMIT 18446744073709551615 OFFSET {}", skip),
            DbType::SQLite => format!(" LIMIT -1 OFFSET {}", skip),
        },
        (None, None) => String::new(),
    }
}

fn selected_columns(
    schema: &SchemaDescriptor,
    filter: Option<&Filter>,
) -> AppResult<Vec<ColumnDescriptor>> {
    match filter.and_then(|f| f.fields.as_ref()) {
        None => Ok(schema.columns.clone()),
        Some(fields) if fields.is_empty() => Err(AppError::Validation(
            "fields must name at least one column".into(),
        )),
        Some(fields) => {
            let mut columns: Vec<ColumnDescriptor> = Vec::with_capacity(fields.len());
            for name in fields {
                let column = lookup(schema, name)?;
                if !columns.iter().any(|c| c.name == column.name) {
                    columns.push(column.clone());
                }
            }
            Ok(columns)
        }
    }
}

/// Builds the SELECT issued by `find`.
pub(crate) fn build_select(
    schema: &SchemaDescriptor,
    filter: Option<&Filter>,
) -> AppResult<SelectPlan> {
    let db_type = schema.db_type;
    let columns = selected_columns(schema, filter)?;
    let projection = columns
        .iter()
        .map(|c| format!("{} AS {}", projection_expr(db_type, c), quote_ident(db_type, &c.name)))
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!(
        "SELECT {} FROM {}",
        projection,
        qualified_table(db_type, &schema.namespace, &schema.table)
    );
    let mut params = Vec::new();
    if let Some(filter) = filter {
        sql.push_str(&where_clause(schema, filter, &mut params)?);
        sql.push_str(&order_clause(schema, filter)?);
        sql.push_str(&limit_clause(db_type, filter));
    }

    Ok(SelectPlan {
        sql,
        params,
        columns,
    })
}

/// Builds the `SELECT COUNT(*)` issued by `count`. Only `where` applies.
pub(crate) fn build_count(
    schema: &SchemaDescriptor,
    filter: Option<&Filter>,
) -> AppResult<SelectPlan> {
    let db_type = schema.db_type;
    let mut sql = format!(
        "SELECT COUNT(*) AS {} FROM {}",
        quote_ident(db_type, "count"),
        qualified_table(db_type, &schema.namespace, &schema.table)
    );
    let mut params = Vec::new();
    if let Some(filter) = filter {
        sql.push_str(&where_clause(schema, filter, &mut params)?);
    }
    Ok(SelectPlan {
        sql,
        params,
        columns: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::KeyRole;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn account(db_type: DbType) -> SchemaDescriptor {
        let mut id = ColumnDescriptor::new("id", "integer", ColumnType::Integer, false);
        id.key = KeyRole::Primary;
        SchemaDescriptor {
            name: "Account".into(),
            table: "account".into(),
            namespace: "public".into(),
            db_type,
            columns: vec![
                id,
                ColumnDescriptor::new("owner", "text", ColumnType::String, true),
                ColumnDescriptor::new("balance", "numeric", ColumnType::Number, true),
                ColumnDescriptor::new("opened_at", "date", ColumnType::Date, true),
            ],
        }
    }

    #[test]
    fn test_quote_ident_escapes() {
        assert_eq!(quote_ident(DbType::Postgres, "we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_ident(DbType::MySQL, "we`ird"), "`we``ird`");
        assert_eq!(qualified_table(DbType::SQLite, "main", "account"), "\"main\".\"account\"");
    }

    #[test]
    fn test_postgres_inference() {
        assert_eq!(infer_column_type(DbType::Postgres, "integer", "integer"), ColumnType::Integer);
        assert_eq!(infer_column_type(DbType::Postgres, "numeric", "numeric"), ColumnType::Number);
        assert_eq!(
            infer_column_type(DbType::Postgres, "timestamp with time zone", ""),
            ColumnType::Date
        );
        assert_eq!(infer_column_type(DbType::Postgres, "jsonb", ""), ColumnType::Json);
        assert_eq!(infer_column_type(DbType::Postgres, "ARRAY", ""), ColumnType::Unknown);
    }

    #[test]
    fn test_mysql_inference() {
        assert_eq!(infer_column_type(DbType::MySQL, "tinyint", "tinyint(1)"), ColumnType::Boolean);
        assert_eq!(infer_column_type(DbType::MySQL, "tinyint", "tinyint(4)"), ColumnType::Integer);
        assert_eq!(infer_column_type(DbType::MySQL, "decimal", "decimal(10,2)"), ColumnType::Number);
        assert_eq!(infer_column_type(DbType::MySQL, "varchar", "varchar(64)"), ColumnType::String);
        assert_eq!(infer_column_type(DbType::MySQL, "geometry", "geometry"), ColumnType::Unknown);
    }

    #[test]
    fn test_sqlite_affinity() {
        assert_eq!(infer_column_type(DbType::SQLite, "INTEGER", "INTEGER"), ColumnType::Integer);
        assert_eq!(infer_column_type(DbType::SQLite, "VARCHAR(20)", ""), ColumnType::String);
        assert_eq!(infer_column_type(DbType::SQLite, "NUMERIC", ""), ColumnType::Number);
        assert_eq!(infer_column_type(DbType::SQLite, "DOUBLE", ""), ColumnType::Number);
        assert_eq!(infer_column_type(DbType::SQLite, "DATETIME", ""), ColumnType::Date);
        assert_eq!(infer_column_type(DbType::SQLite, "BOOLEAN", ""), ColumnType::Boolean);
        assert_eq!(infer_column_type(DbType::SQLite, "BLOB", ""), ColumnType::Buffer);
        assert_eq!(infer_column_type(DbType::SQLite, "", ""), ColumnType::String);
    }

    #[test]
    fn test_unfiltered_select_projects_every_column() {
        let plan = build_select(&account(DbType::Postgres), None).unwrap();
        assert_eq!(
            plan.sql,
            "SELECT \"id\"::int8 AS \"id\", \"owner\"::text AS \"owner\", \
             \"balance\"::text AS \"balance\", \"opened_at\"::text AS \"opened_at\" \
             FROM \"public\".\"account\""
        );
        assert!(plan.params.is_empty());
        assert_eq!(plan.columns.len(), 4);
    }

    #[test]
    fn test_filtered_select_postgres() {
        let filter = Filter::default()
            .where_eq("owner", "alice")
            .where_eq("balance", json!(null))
            .order_by("id DESC")
            .limit(10)
            .skip(20)
            .fields(["id", "owner"]);
        let plan = build_select(&account(DbType::Postgres), Some(&filter)).unwrap();
        assert_eq!(
            plan.sql,
            "SELECT \"id\"::int8 AS \"id\", \"owner\"::text AS \"owner\" FROM \"public\".\"account\" \
             WHERE \"balance\" IS NULL AND \"owner\" = $1 ORDER BY \"id\" DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(plan.params, vec![SqlParam::Text("alice".into())]);
    }

    #[test]
    fn test_filtered_select_mysql_placeholders() {
        let filter = Filter::default().where_eq("id", 1).where_eq("opened_at", "2024-01-01");
        let plan = build_select(&account(DbType::MySQL), Some(&filter)).unwrap();
        assert!(plan.sql.ends_with(
            "WHERE `id` = ? AND CAST(`opened_at` AS CHAR) = ?"
        ));
        assert_eq!(
            plan.params,
            vec![SqlParam::Int(1), SqlParam::Text("2024-01-01".into())]
        );
    }

    #[test]
    fn test_skip_without_limit() {
        let filter = Filter::default().skip(5);
        let sqlite = build_select(&account(DbType::SQLite), Some(&filter)).unwrap();
        assert!(sqlite.sql.ends_with(" LIMIT -1 OFFSET 5"));
        let pg = build_select(&account(DbType::Postgres), Some(&filter)).unwrap();
        assert!(pg.sql.ends_with("\"account\" OFFSET 5"));
    }

    #[test]
    fn test_unknown_columns_are_rejected() {
        let schema = account(DbType::SQLite);
        for filter in [
            Filter::default().where_eq("nope", 1),
            Filter::default().order_by("nope"),
            Filter::default().fields(["nope"]),
        ] {
            let err = build_select(&schema, Some(&filter)).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_values_are_coerced_to_column_type() {
        let schema = account(DbType::SQLite);
        let plan = build_select(
            &schema,
            Some(&Filter::default().where_eq("id", "7").where_eq("balance", 2)),
        )
        .unwrap();
        assert_eq!(plan.params, vec![SqlParam::Float(2.0), SqlParam::Int(7)]);

        let err = build_select(&schema, Some(&Filter::default().where_eq("id", "seven")));
        assert!(matches!(err, Err(AppError::Validation(_))));
    }

    fn token() -> SchemaDescriptor {
        let mut id = ColumnDescriptor::new("id", "uuid", ColumnType::String, false);
        id.key = KeyRole::Primary;
        SchemaDescriptor {
            name: "Token".into(),
            table: "token".into(),
            namespace: "public".into(),
            db_type: DbType::Postgres,
            columns: vec![
                id,
                ColumnDescriptor::new("label", "text", ColumnType::String, true),
                ColumnDescriptor::new("client", "inet", ColumnType::String, true),
                ColumnDescriptor::new("body", "xml", ColumnType::String, true),
            ],
        }
    }

    #[test]
    fn test_postgres_non_text_strings_are_cast() {
        let filter = Filter::default()
            .where_eq("id", "11111111-1111-1111-1111-111111111111")
            .where_eq("label", "a")
            .where_eq("client", "10.0.0.1")
            .where_eq("body", "<a/>");
        let plan = build_select(&token(), Some(&filter)).unwrap();
        assert!(
            plan.sql.ends_with(
                "WHERE \"body\"::text = $1 AND \"client\" = $2::inet \
                 AND \"id\" = $3::uuid AND \"label\" = $4"
            ),
            "{}",
            plan.sql
        );
        assert_eq!(plan.params.len(), 4);
    }

    #[test]
    fn test_mysql_unsigned_integers_are_read_as_text() {
        let mut id = ColumnDescriptor::new("id", "bigint(20) unsigned", ColumnType::Integer, false);
        id.key = KeyRole::Primary;
        let signed = ColumnDescriptor::new("delta", "bigint(20)", ColumnType::Integer, true);
        assert_eq!(wire(DbType::MySQL, &id), Wire::IntegerText);
        assert_eq!(wire(DbType::MySQL, &signed), Wire::Integer);
        assert_eq!(wire(DbType::Postgres, &signed), Wire::Integer);

        let schema = SchemaDescriptor {
            name: "Counter".into(),
            table: "counter".into(),
            namespace: "app".into(),
            db_type: DbType::MySQL,
            columns: vec![id, signed],
        };
        let filter = Filter::default().where_eq("id", json!(18446744073709551615u64));
        let plan = build_select(&schema, Some(&filter)).unwrap();
        assert!(plan.sql.starts_with(
            "SELECT CAST(`id` AS CHAR) AS `id`, CAST(`delta` AS SIGNED) AS `delta`"
        ));
        assert_eq!(
            plan.params,
            vec![SqlParam::Text("18446744073709551615".into())]
        );
    }

    #[test]
    fn test_count_ignores_paging() {
        let filter = Filter::default().where_eq("owner", "alice").limit(1);
        let plan = build_count(&account(DbType::SQLite), Some(&filter)).unwrap();
        assert_eq!(
            plan.sql,
            "SELECT COUNT(*) AS \"count\" FROM \"public\".\"account\" WHERE \"owner\" = ?"
        );
        assert_eq!(plan.params, vec![SqlParam::Text("alice".into())]);
    }
}
