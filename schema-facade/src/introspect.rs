//! Catalog introspection.
//!
//! Reads one table's columns and keys from `information_schema` (PostgreSQL,
//! MySQL) or the table-valued pragmas (SQLite).

use std::collections::HashMap;

use common::errors::{AppError, AppResult};
use common::models::{ColumnDescriptor, DbType, ForeignKeyRef, KeyRole, SchemaDescriptor};
use common::utils::model_name;
use sqlx::{MySqlPool, PgPool, Row, SqlitePool};

use crate::dialect::infer_column_type;
use crate::facade::DatabasePool;

/// Catalog rows for one table before keys are applied.
#[derive(Debug, Default)]
struct CatalogTable {
    columns: Vec<ColumnDescriptor>,
    primary: Vec<String>,
    foreign: Vec<(String, ForeignKeyRef)>,
}

impl CatalogTable {
    /// Records a foreign key, pairing each local column with the referenced
    /// column at the same position.
    fn add_foreign_key(
        &mut self,
        columns: Vec<String>,
        namespace: &str,
        table: &str,
        ref_columns: Vec<String>,
    ) {
        for (column, ref_column) in columns.into_iter().zip(ref_columns) {
            self.foreign.push((
                column,
                ForeignKeyRef {
                    namespace: namespace.to_string(),
                    table: table.to_string(),
                    column: ref_column,
                },
            ));
        }
    }
}

/// Discovers `table` in `namespace`, or in the dialect's default namespace.
pub(crate) async fn discover(
    pool: &DatabasePool,
    table: &str,
    namespace: Option<&str>,
) -> AppResult<SchemaDescriptor> {
    let (db_type, namespace, catalog) = match pool {
        DatabasePool::MySQL(p) => {
            let ns = mysql_namespace(p, namespace).await?;
            let catalog = mysql_table(p, &ns, table).await?;
            (DbType::MySQL, ns, catalog)
        }
        DatabasePool::Postgres(p) => {
            let ns = postgres_namespace(p, namespace).await?;
            let catalog = postgres_table(p, &ns, table).await?;
            (DbType::Postgres, ns, catalog)
        }
        DatabasePool::SQLite(p) => {
            let ns = namespace.unwrap_or("main").to_string();
            let catalog = sqlite_table(p, &ns, table).await?;
            (DbType::SQLite, ns, catalog)
        }
    };

    if catalog.columns.is_empty() {
        return Err(AppError::table_not_found(table, &namespace));
    }

    Ok(SchemaDescriptor {
        name: model_name(table),
        table: table.to_string(),
        namespace,
        db_type,
        columns: apply_keys(catalog),
    })
}

/// Marks key columns. Primary key membership wins over a foreign key.
fn apply_keys(catalog: CatalogTable) -> Vec<ColumnDescriptor> {
    let CatalogTable {
        mut columns,
        primary,
        foreign,
    } = catalog;
    let mut foreign: HashMap<String, ForeignKeyRef> = foreign.into_iter().collect();
    for column in &mut columns {
        if let Some(references) = foreign.remove(&column.name) {
            column.key = KeyRole::Foreign;
            column.references = Some(references);
        }
        if primary.iter().any(|p| p == &column.name) {
            column.key = KeyRole::Primary;
            column.nullable = false;
        }
    }
    columns
}

// ---- PostgreSQL ----

async fn postgres_namespace(pool: &PgPool, requested: Option<&str>) -> AppResult<String> {
    if let Some(ns) = requested {
        return Ok(ns.to_string());
    }
    let row = sqlx::query("SELECT current_schema()::text AS ns")
        .fetch_one(pool)
        .await
        .map_err(AppError::from_discovery)?;
    row.try_get::<Option<String>, _>("ns")
        .map_err(AppError::from_discovery)?
        .ok_or_else(|| AppError::Discovery("no current schema; set a schema qualifier".into()))
}

async fn postgres_table(pool: &PgPool, namespace: &str, table: &str) -> AppResult<CatalogTable> {
    let rows = sqlx::query(
        "SELECT c.column_name::text AS column_name,
                c.data_type::text AS data_type,
                c.udt_name::text AS udt_name,
                c.is_nullable::text AS is_nullable,
                c.character_maximum_length::int8 AS length,
                c.numeric_precision::int8 AS numeric_precision,
                c.numeric_scale::int8 AS numeric_scale
         FROM information_schema.columns c
         WHERE c.table_schema::text = $1 AND c.table_name::text = $2
         ORDER BY c.ordinal_position",
    )
    .bind(namespace)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(AppError::from_discovery)?;

    let mut catalog = CatalogTable::default();
    for row in &rows {
        let mut data_type: String = row.try_get("data_type").map_err(AppError::from_discovery)?;
        if data_type == "USER-DEFINED" {
            data_type = row.try_get("udt_name").map_err(AppError::from_discovery)?;
        }
        let is_nullable: String = row.try_get("is_nullable").map_err(AppError::from_discovery)?;
        let mut column = ColumnDescriptor::new(
            row.try_get::<String, _>("column_name")
                .map_err(AppError::from_discovery)?,
            data_type.clone(),
            infer_column_type(DbType::Postgres, &data_type, &data_type),
            is_nullable.eq_ignore_ascii_case("YES"),
        );
        column.length = row.try_get("length").map_err(AppError::from_discovery)?;
        column.precision = row.try_get("numeric_precision").map_err(AppError::from_discovery)?;
        column.scale = row.try_get("numeric_scale").map_err(AppError::from_discovery)?;
        catalog.columns.push(column);
    }
    if catalog.columns.is_empty() {
        return Ok(catalog);
    }

    // One row per constraint; `conkey` and `confkey` list the local and
    // referenced columns in matching order.
    let keys = sqlx::query(
        "SELECT con.contype::text AS kind,
                rn.nspname::text AS ref_schema,
                rc.relname::text AS ref_table,
                ARRAY(SELECT a.attname::text
                      FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, pos)
                      JOIN pg_catalog.pg_attribute a
                        ON a.attrelid = con.conrelid AND a.attnum = k.attnum
                      ORDER BY k.pos) AS columns,
                ARRAY(SELECT a.attname::text
                      FROM unnest(con.confkey) WITH ORDINALITY AS k(attnum, pos)
                      JOIN pg_catalog.pg_attribute a
                        ON a.attrelid = con.confrelid AND a.attnum = k.attnum
                      ORDER BY k.pos) AS ref_columns
         FROM pg_catalog.pg_constraint con
         JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
         JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
         LEFT JOIN pg_catalog.pg_class rc ON rc.oid = con.confrelid
         LEFT JOIN pg_catalog.pg_namespace rn ON rn.oid = rc.relnamespace
         WHERE n.nspname::text = $1 AND c.relname::text = $2
           AND con.contype IN ('p', 'f')
         ORDER BY con.contype DESC, con.conname::text",
    )
    .bind(namespace)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(AppError::from_discovery)?;

    for row in &keys {
        let kind: String = row.try_get("kind").map_err(AppError::from_discovery)?;
        let columns: Vec<String> = row.try_get("columns").map_err(AppError::from_discovery)?;
        if kind == "p" {
            catalog.primary.extend(columns);
            continue;
        }
        let ref_schema: Option<String> = row.try_get("ref_schema").map_err(AppError::from_discovery)?;
        let ref_table: Option<String> = row.try_get("ref_table").map_err(AppError::from_discovery)?;
        let ref_columns: Vec<String> = row.try_get("ref_columns").map_err(AppError::from_discovery)?;
        if let (Some(schema), Some(table)) = (ref_schema, ref_table) {
            catalog.add_foreign_key(columns, &schema, &table, ref_columns);
        }
    }
    Ok(catalog)
}

// ---- MySQL ----

async fn mysql_namespace(pool: &MySqlPool, requested: Option<&str>) -> AppResult<String> {
    if let Some(ns) = requested {
        return Ok(ns.to_string());
    }
    let row = sqlx::query("SELECT CAST(DATABASE() AS CHAR) AS ns")
        .fetch_one(pool)
        .await
        .map_err(AppError::from_discovery)?;
    row.try_get::<Option<String>, _>("ns")
        .map_err(AppError::from_discovery)?
        .ok_or_else(|| AppError::Discovery("no database selected; set a schema qualifier".into()))
}

async fn mysql_table(pool: &MySqlPool, namespace: &str, table: &str) -> AppResult<CatalogTable> {
    let rows = sqlx::query(
        "SELECT CAST(COLUMN_NAME AS CHAR) AS column_name,
                CAST(DATA_TYPE AS CHAR) AS data_type,
                CAST(COLUMN_TYPE AS CHAR) AS column_type,
                CAST(IS_NULLABLE AS CHAR) AS is_nullable,
                CAST(CHARACTER_MAXIMUM_LENGTH AS SIGNED) AS length,
                CAST(NUMERIC_PRECISION AS SIGNED) AS numeric_precision,
                CAST(NUMERIC_SCALE AS SIGNED) AS numeric_scale
         FROM information_schema.COLUMNS
         WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
         ORDER BY ORDINAL_POSITION",
    )
    .bind(namespace)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(AppError::from_discovery)?;

    let mut catalog = CatalogTable::default();
    for row in &rows {
        let data_type: String = row.try_get("data_type").map_err(AppError::from_discovery)?;
        let column_type: String = row.try_get("column_type").map_err(AppError::from_discovery)?;
        let is_nullable: String = row.try_get("is_nullable").map_err(AppError::from_discovery)?;
        let mut column = ColumnDescriptor::new(
            row.try_get::<String, _>("column_name")
                .map_err(AppError::from_discovery)?,
            column_type.clone(),
            infer_column_type(DbType::MySQL, &data_type, &column_type),
            is_nullable.eq_ignore_ascii_case("YES"),
        );
        column.length = row.try_get("length").map_err(AppError::from_discovery)?;
        column.precision = row.try_get("numeric_precision").map_err(AppError::from_discovery)?;
        column.scale = row.try_get("numeric_scale").map_err(AppError::from_discovery)?;
        catalog.columns.push(column);
    }
    if catalog.columns.is_empty() {
        return Ok(catalog);
    }

    let keys = sqlx::query(
        "SELECT CAST(COLUMN_NAME AS CHAR) AS column_name,
                CAST(CONSTRAINT_NAME AS CHAR) AS constraint_name,
                CAST(REFERENCED_TABLE_SCHEMA AS CHAR) AS ref_schema,
                CAST(REFERENCED_TABLE_NAME AS CHAR) AS ref_table,
                CAST(REFERENCED_COLUMN_NAME AS CHAR) AS ref_column
         FROM information_schema.KEY_COLUMN_USAGE
         WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
         ORDER BY ORDINAL_POSITION",
    )
    .bind(namespace)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(AppError::from_discovery)?;

    for row in &keys {
        let column: String = row.try_get("column_name").map_err(AppError::from_discovery)?;
        let constraint: String = row.try_get("constraint_name").map_err(AppError::from_discovery)?;
        if constraint == "PRIMARY" {
            catalog.primary.push(column);
            continue;
        }
        let ref_schema: Option<String> = row.try_get("ref_schema").map_err(AppError::from_discovery)?;
        let ref_table: Option<String> = row.try_get("ref_table").map_err(AppError::from_discovery)?;
        let ref_column: Option<String> = row.try_get("ref_column").map_err(AppError::from_discovery)?;
        if let (Some(schema), Some(table), Some(ref_column)) = (ref_schema, ref_table, ref_column) {
            catalog.foreign.push((
                column,
                ForeignKeyRef {
                    namespace: schema,
                    table,
                    column: ref_column,
                },
            ));
        }
    }
    Ok(catalog)
}

// ---- SQLite ----

async fn sqlite_table(pool: &SqlitePool, namespace: &str, table: &str) -> AppResult<CatalogTable> {
    let rows = sqlx::query(
        "SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1, ?2) ORDER BY cid",
    )
    .bind(table)
    .bind(namespace)
    .fetch_all(pool)
    .await
    .map_err(AppError::from_discovery)?;

    let mut catalog = CatalogTable::default();
    let mut pk_positions: Vec<(i64, String)> = Vec::new();
    for row in &rows {
        let name: String = row.try_get_unchecked("name").map_err(AppError::from_discovery)?;
        let declared: String = row
            .try_get_unchecked::<Option<String>, _>("type")
            .map_err(AppError::from_discovery)?
            .unwrap_or_default();
        let not_null: i64 = row.try_get_unchecked("notnull").map_err(AppError::from_discovery)?;
        let pk: i64 = row.try_get_unchecked("pk").map_err(AppError::from_discovery)?;
        if pk > 0 {
            pk_positions.push((pk, name.clone()));
        }
        catalog.columns.push(ColumnDescriptor::new(
            name,
            declared.clone(),
            infer_column_type(DbType::SQLite, &declared, &declared),
            not_null == 0,
        ));
    }
    if catalog.columns.is_empty() {
        return Ok(catalog);
    }
    pk_positions.sort();
    catalog.primary = pk_positions.into_iter().map(|(_, name)| name).collect();

    let keys = sqlx::query(
        "SELECT \"table\" AS ref_table, \"from\" AS from_column, \"to\" AS to_column
         FROM pragma_foreign_key_list(?1, ?2)
         ORDER BY id, seq",
    )
    .bind(table)
    .bind(namespace)
    .fetch_all(pool)
    .await
    .map_err(AppError::from_discovery)?;

    for row in &keys {
        let ref_table: String = row.try_get_unchecked("ref_table").map_err(AppError::from_discovery)?;
        let column: String = row.try_get_unchecked("from_column").map_err(AppError::from_discovery)?;
        let to_column: Option<String> = row
            .try_get_unchecked("to_column")
            .map_err(AppError::from_discovery)?;
        // A foreign key without a column list references the primary key.
        let ref_column = match to_column {
            Some(c) => c,
            None => sqlite_primary_key(pool, namespace, &ref_table)
                .await?
                .unwrap_or_else(|| "rowid".to_string()),
        };
        catalog.foreign.push((
            column,
            ForeignKeyRef {
                namespace: namespace.to_string(),
                table: ref_table,
                column: ref_column,
            },
        ));
    }
    Ok(catalog)
}

async fn sqlite_primary_key(
    pool: &SqlitePool,
    namespace: &str,
    table: &str,
) -> AppResult<Option<String>> {
    let row = sqlx::query("SELECT name FROM pragma_table_info(?1, ?2) WHERE pk = 1")
        .bind(table)
        .bind(namespace)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from_discovery)?;
    match row {
        Some(row) => Ok(Some(
            row.try_get_unchecked("name").map_err(AppError::from_discovery)?,
        )),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::ColumnType;

    fn catalog() -> CatalogTable {
        CatalogTable {
            columns: vec![
                ColumnDescriptor::new("id", "integer", ColumnType::Integer, true),
                ColumnDescriptor::new("customer_id", "integer", ColumnType::Integer, true),
                ColumnDescriptor::new("note", "text", ColumnType::String, true),
            ],
            primary: vec!["id".into()],
            foreign: vec![
                (
                    "customer_id".into(),
                    ForeignKeyRef {
                        namespace: "public".into(),
                        table: "customer".into(),
                        column: "id".into(),
                    },
                ),
                (
                    "id".into(),
                    ForeignKeyRef {
                        namespace: "public".into(),
                        table: "account_root".into(),
                        column: "id".into(),
                    },
                ),
            ],
        }
    }

    #[test]
    fn test_apply_keys() {
        let columns = apply_keys(catalog());
        assert_eq!(columns[0].key, KeyRole::Primary);
        assert!(!columns[0].nullable);
        assert_eq!(columns[1].key, KeyRole::Foreign);
        assert_eq!(columns[1].references.as_ref().map(|r| r.table.as_str()), Some("customer"));
        assert_eq!(columns[2].key, KeyRole::None);
        assert!(columns[2].references.is_none());
    }

    #[test]
    fn test_composite_foreign_key_pairs_columns_by_position() {
        let mut catalog = CatalogTable {
            columns: vec![
                ColumnDescriptor::new("pa", "integer", ColumnType::Integer, true),
                ColumnDescriptor::new("pb", "integer", ColumnType::Integer, true),
            ],
            ..Default::default()
        };
        catalog.add_foreign_key(
            vec!["pa".into(), "pb".into()],
            "public",
            "parent",
            vec!["a".into(), "b".into()],
        );
        let columns = apply_keys(catalog);
        let refs: Vec<_> = columns
            .iter()
            .map(|c| c.references.as_ref().map(|r| (r.table.as_str(), r.column.as_str())))
            .collect();
        assert_eq!(refs, vec![Some(("parent", "a")), Some(("parent", "b"))]);
    }

    #[test]
    fn test_primary_key_wins_over_foreign_key() {
        let columns = apply_keys(catalog());
        assert_eq!(columns[0].key, KeyRole::Primary);
        // The reference is still reported for association discovery.
        assert_eq!(
            columns[0].references.as_ref().map(|r| r.table.as_str()),
            Some("account_root")
        );
    }
}
