//! Discovered schema models.
//!
//! A [`SchemaDescriptor`] is the structure of one table as read from the
//! data source's catalog.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::connection::DbType;

/// Semantic column type inferred from the catalog type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Whole numbers.
    Integer,
    /// Fixed or floating point numbers.
    Number,
    /// Character data.
    String,
    /// True/false.
    Boolean,
    /// Dates, times and timestamps.
    Date,
    /// JSON documents.
    Json,
    /// Binary data.
    Buffer,
    /// A catalog type with no mapping.
    Unknown,
}

/// Referenced side of a foreign key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ForeignKeyRef {
    /// Namespace of the referenced table.
    pub namespace: String,
    /// Referenced table.
    pub table: String,
    /// Referenced column.
    pub column: String,
}

/// Key role of a column.
///
/// A column that is part of the primary key and also references another
/// table reports `Primary`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    /// Part of the primary key.
    Primary,
    /// References another table.
    Foreign,
    /// Not a key column.
    #[default]
    None,
}

/// One column of a discovered table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Catalog data type, as reported by the data source.
    pub data_type: String,
    /// Inferred semantic type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Key role.
    pub key: KeyRole,
    /// Referenced column, for foreign keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<ForeignKeyRef>,
    /// Maximum character length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
    /// Numeric precision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<i64>,
    /// Numeric scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<i64>,
}

impl ColumnDescriptor {
    /// Creates a non-key column with no size information.
    pub fn new(
        name: impl Into<String>,
        data_type: impl Into<String>,
        column_type: ColumnType,
        nullable: bool,
    ) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            column_type,
            nullable,
            key: KeyRole::None,
            references: None,
            length: None,
            precision: None,
            scale: None,
        }
    }

    pub fn is_primary_key(&self) -> bool {
        matches!(self.key, KeyRole::Primary)
    }
}

/// Discovered structure of one table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct SchemaDescriptor {
    /// Model name derived from the table name.
    pub name: String,
    /// Table name.
    pub table: String,
    /// Resolved namespace (schema or database).
    pub namespace: String,
    /// Dialect the table was discovered on.
    pub db_type: DbType,
    /// Columns in ordinal order.
    pub columns: Vec<ColumnDescriptor>,
}

impl SchemaDescriptor {
    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the primary key columns in ordinal order.
    pub fn primary_key(&self) -> Vec<&ColumnDescriptor> {
        self.columns.iter().filter(|c| c.is_primary_key()).collect()
    }

    /// Returns the distinct tables referenced by foreign keys.
    pub fn referenced_tables(&self) -> Vec<&ForeignKeyRef> {
        let mut refs: Vec<&ForeignKeyRef> = Vec::new();
        for column in &self.columns {
            if let Some(references) = &column.references {
                if !refs
                    .iter()
                    .any(|r| r.namespace == references.namespace && r.table == references.table)
                {
                    refs.push(references);
                }
            }
        }
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fk(column: &mut ColumnDescriptor, table: &str) {
        column.key = KeyRole::Foreign;
        column.references = Some(ForeignKeyRef {
            namespace: "public".into(),
            table: table.into(),
            column: "id".into(),
        });
    }

    fn descriptor() -> SchemaDescriptor {
        let mut id = ColumnDescriptor::new("id", "integer", ColumnType::Integer, false);
        id.key = KeyRole::Primary;
        let mut owner_id = ColumnDescriptor::new("owner_id", "integer", ColumnType::Integer, true);
        fk(&mut owner_id, "customer");
        let mut branch_id = ColumnDescriptor::new("branch_id", "integer", ColumnType::Integer, true);
        fk(&mut branch_id, "branch");
        let mut backup_owner = ColumnDescriptor::new("backup_owner", "integer", ColumnType::Integer, true);
        fk(&mut backup_owner, "customer");
        SchemaDescriptor {
            name: "Account".into(),
            table: "account".into(),
            namespace: "public".into(),
            db_type: DbType::Postgres,
            columns: vec![id, owner_id, branch_id, backup_owner],
        }
    }

    #[test]
    fn test_primary_key_lookup() {
        let d = descriptor();
        let pk: Vec<&str> = d.primary_key().into_iter().map(|c| c.name.as_str()).collect();
        assert_eq!(pk, vec!["id"]);
        assert!(d.column("owner_id").is_some());
        assert!(d.column("missing").is_none());
    }

    #[test]
    fn test_referenced_tables_are_distinct() {
        let d = descriptor();
        let tables: Vec<&str> = d.referenced_tables().into_iter().map(|r| r.table.as_str()).collect();
        assert_eq!(tables, vec!["customer", "branch"]);
    }

    #[test]
    fn test_foreign_key_serialization() {
        let d = descriptor();
        let json = serde_json::to_value(&d.columns[1]).unwrap();
        assert_eq!(json["key"], "foreign");
        assert_eq!(
            json["references"],
            serde_json::json!({"namespace": "public", "table": "customer", "column": "id"})
        );
        let json = serde_json::to_value(&d.columns[0]).unwrap();
        assert_eq!(json["key"], "primary");
        assert!(json.get("references").is_none());
    }

    #[test]
    fn test_column_serializes_semantic_type_as_type() {
        let column = ColumnDescriptor::new("balance", "numeric", ColumnType::Number, true);
        let json = serde_json::to_value(&column).unwrap();
        assert_eq!(json["type"], "number");
        assert_eq!(json["data_type"], "numeric");
        assert!(json.get("length").is_none());
    }
}
