//! Model query models.
//!
//! Contains the filter accepted by `find`, the record type it returns and the
//! request/response bodies of the HTTP surface.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::connection::Qualifier;

/// One row returned by a query, keyed by column name.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Maximum number of rows a single `find` may request.
pub const MAX_LIMIT: u32 = 10_000;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Filter for `find` and `count`.
///
/// `where` holds equality predicates joined with AND; a `null` value matches
/// SQL NULL. `order` entries are `"column"` or `"column ASC|DESC"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct Filter {
    /// Equality predicates.
    #[serde(rename = "where", skip_serializing_if = "BTreeMap::is_empty")]
    #[schema(value_type = Object)]
    pub conditions: BTreeMap<String, serde_json::Value>,

    /// Sort order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<String>,

    /// Maximum number of rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 10000, message = "limit must be between 1 and 10000"))]
    pub limit: Option<u32>,

    /// Number of rows to skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,

    /// Columns to return; all columns when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

impl Filter {
    /// Adds an equality predicate.
    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.conditions.insert(column.into(), value.into());
        self
    }

    /// Appends an order clause.
    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order.push(clause.into());
        self
    }

    /// Sets the row limit.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of rows to skip.
    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Restricts the returned columns.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Splits each order clause into column and direction.
    pub fn parsed_order(&self) -> Result<Vec<(&str, Direction)>, String> {
        self.order
            .iter()
            .map(|clause| {
                let mut parts = clause.split_whitespace();
                let column = parts
                    .next()
                    .ok_or_else(|| "empty order clause".to_string())?;
                let direction = match parts.next().map(|d| d.to_uppercase()) {
                    None => Direction::Asc,
                    Some(d) if d == "ASC" => Direction::Asc,
                    Some(d) if d == "DESC" => Direction::Desc,
                    Some(d) => return Err(format!("invalid sort direction `{}`", d)),
                };
                if parts.next().is_some() {
                    return Err(format!("invalid order clause `{}`", clause));
                }
                Ok((column, direction))
            })
            .collect()
    }
}

/// Request body for `POST /api/models/{table}/find`.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct FindRequest {
    /// Namespace qualifier; the data source default applies when absent.
    #[validate(nested)]
    pub qualifier: Qualifier,
    /// Row filter.
    #[validate(nested)]
    pub filter: Option<Filter>,
}

/// Result of a `find` call.
#[derive(Debug, Serialize, ToSchema)]
pub struct FindResult {
    /// Model the rows were read through.
    pub model: String,
    /// Matched rows.
    #[schema(value_type = Vec<Object>)]
    pub records: Vec<Record>,
    /// Number of rows returned.
    pub row_count: usize,
    /// Query execution time in milliseconds.
    pub execution_time_ms: u64,
}

/// Summary of one built model.
#[derive(Debug, Serialize, ToSchema)]
pub struct ModelSummary {
    /// Model name.
    pub name: String,
    /// Backing table.
    pub table: String,
    /// Namespace of the backing table.
    pub namespace: String,
    /// Primary key columns.
    pub primary_key: Vec<String>,
    /// Number of columns.
    pub column_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_deserializes_where() {
        let filter: Filter = serde_json::from_value(json!({
            "where": {"owner": "alice", "closed_at": null},
            "order": ["balance DESC"],
            "limit": 10
        }))
        .unwrap();
        assert_eq!(filter.conditions.len(), 2);
        assert_eq!(filter.conditions["closed_at"], serde_json::Value::Null);
        assert_eq!(filter.limit, Some(10));
        assert!(filter.skip.is_none());
    }

    #[test]
    fn test_parsed_order() {
        let filter = Filter::default().order_by("balance desc").order_by("id");
        let order = filter.parsed_order().unwrap();
        assert_eq!(order, vec![("balance", Direction::Desc), ("id", Direction::Asc)]);
    }

    #[test]
    fn test_parsed_order_rejects_garbage() {
        assert!(Filter::default().order_by("balance sideways").parsed_order().is_err());
        assert!(Filter::default().order_by("a b c").parsed_order().is_err());
        assert!(Filter::default().order_by("  ").parsed_order().is_err());
    }

    #[test]
    fn test_limit_is_validated() {
        assert!(Filter::default().limit(0).validate().is_err());
        assert!(Filter::default().limit(MAX_LIMIT + 1).validate().is_err());
        assert!(Filter::default().limit(50).validate().is_ok());
    }

    #[test]
    fn test_find_request_defaults() {
        let req: FindRequest = serde_json::from_str("{}").unwrap();
        assert!(req.qualifier.is_empty());
        assert!(req.filter.is_none());
    }
}
