//! Parameter binding and row decoding shared by every driver.

use common::errors::{AppError, AppResult};
use common::models::{ColumnDescriptor, DbType, Record};
use serde_json::Value;
use sqlx::query::Query;
use sqlx::{ColumnIndex, Database, Decode, Encode, Row, Type};

use crate::dialect::{self, SqlParam, Wire};

/// Binds parameters in order.
pub(crate) fn bind_params<'q, DB>(
    mut query: Query<'q, DB, <DB as Database>::Arguments<'q>>,
    params: Vec<SqlParam>,
) -> Query<'q, DB, <DB as Database>::Arguments<'q>>
where
    DB: Database,
    i64: Encode<'q, DB> + Type<DB>,
    f64: Encode<'q, DB> + Type<DB>,
    bool: Encode<'q, DB> + Type<DB>,
    String: Encode<'q, DB> + Type<DB>,
{
    for param in params {
        query = match param {
            SqlParam::Int(v) => query.bind(v),
            SqlParam::Float(v) => query.bind(v),
            SqlParam::Bool(v) => query.bind(v),
            SqlParam::Text(v) => query.bind(v),
        };
    }
    query
}

/// Decodes a projected row into a [`Record`].
///
/// `columns` must be in projection order; the SELECT built by
/// [`dialect::build_select`] casts each column to the representation named by
/// [`dialect::wire`], so the unchecked reads below see the expected type.
pub(crate) fn decode_row<R>(row: &R, columns: &[ColumnDescriptor], db_type: DbType) -> AppResult<Record>
where
    R: Row,
    usize: ColumnIndex<R>,
    for<'r> i64: Decode<'r, R::Database>,
    for<'r> bool: Decode<'r, R::Database>,
    for<'r> String: Decode<'r, R::Database>,
{
    let mut record = Record::new();
    for (idx, column) in columns.iter().enumerate() {
        let decoded = match dialect::wire(db_type, column) {
            Wire::Integer => row
                .try_get_unchecked::<Option<i64>, _>(idx)
                .map(|v| v.map(Value::from)),
            Wire::IntegerText => row
                .try_get_unchecked::<Option<String>, _>(idx)
                .map(|v| v.map(|s| integer_value(&s))),
            Wire::Boolean => row
                .try_get_unchecked::<Option<bool>, _>(idx)
                .map(|v| v.map(Value::Bool)),
            Wire::IntegerBoolean => row
                .try_get_unchecked::<Option<i64>, _>(idx)
                .map(|v| v.map(|i| Value::Bool(i != 0))),
            Wire::NumberText => row
                .try_get_unchecked::<Option<String>, _>(idx)
                .map(|v| v.map(|s| number_value(&s))),
            Wire::JsonText => row
                .try_get_unchecked::<Option<String>, _>(idx)
                .map(|v| v.map(|s| serde_json::from_str(&s).unwrap_or(Value::String(s)))),
            Wire::Text => row
                .try_get_unchecked::<Option<String>, _>(idx)
                .map(|v| v.map(Value::String)),
        };
        let value = decoded.map_err(|e| {
            AppError::Query(format!("failed to decode column `{}`: {}", column.name, e))
        })?;
        record.insert(column.name.clone(), value.unwrap_or(Value::Null));
    }
    Ok(record)
}

/// Reads the single `COUNT(*)` column.
pub(crate) fn decode_count<R>(row: &R) -> AppResult<u64>
where
    R: Row,
    usize: ColumnIndex<R>,
    for<'r> i64: Decode<'r, R::Database>,
{
    let count: i64 = row
        .try_get_unchecked(0usize)
        .map_err(|e| AppError::Query(format!("failed to decode count: {}", e)))?;
    Ok(count.max(0) as u64)
}

/// Parses a decimal rendered as text. Values that are not finite numbers
/// (e.g. `NaN`) become `null`.
fn number_value(text: &str) -> Value {
    text.trim()
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Parses an integer rendered as text, keeping values past `i64::MAX` exact.
fn integer_value(text: &str) -> Value {
    let text = text.trim();
    match (text.parse::<i64>(), text.parse::<u64>()) {
        (Ok(i), _) => Value::from(i),
        (Err(_), Ok(u)) => Value::from(u),
        _ => Value::String(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_value() {
        assert_eq!(integer_value("42"), serde_json::json!(42));
        assert_eq!(
            integer_value("18446744073709551615"),
            serde_json::json!(18446744073709551615u64)
        );
        assert_eq!(integer_value("-3"), serde_json::json!(-3));
    }

    #[test]
    fn test_number_value() {
        assert_eq!(number_value("100"), serde_json::json!(100.0));
        assert_eq!(number_value(" 12.50 "), serde_json::json!(12.5));
        assert_eq!(number_value("NaN"), Value::Null);
        assert_eq!(number_value("abc"), Value::Null);
    }
}
