//! Row to JSON conversion.
//!
//! Each column is first classified by its declared type name into a
//! [`TypeCategory`], then a dialect-specific decoder extracts the value.
//! Numbers stay numbers and strings stay strings; timestamps become RFC 3339
//! strings and binary values become base64 strings.
//!
//! The gateway's statement carries no bind parameters, so PostgreSQL answers
//! over the simple query protocol and MySQL over the text protocol: every
//! value arrives as text. Decoders that read text use unchecked access for
//! that reason.

use crate::models::{DatabaseType, Record};
use serde_json::Value as JsonValue;
use sqlx::mysql::MySqlRow;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, ColumnIndex, Decode, Row, Type, TypeInfo, ValueRef};
use tracing::warn;

/// Logical category of a column's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Json,
    Uuid,
    Timestamp,
    TimestampTz,
    Date,
    Time,
    Unknown,
}

/// Classify a declared type name.
pub fn categorize_type(type_name: &str, db: DatabaseType) -> TypeCategory {
    let lower = type_name.to_lowercase();
    let name = lower.as_str();

    match name {
        // SQLite NUMERIC affinity stores floats
        "numeric" if db == DatabaseType::SQLite => TypeCategory::Float,
        _ if name.contains("decimal") || name.contains("numeric") => TypeCategory::Decimal,
        "timestamptz" | "timestamp with time zone" => TypeCategory::TimestampTz,
        "datetime" => TypeCategory::Timestamp,
        _ if name.starts_with("timestamp") => TypeCategory::Timestamp,
        "date" => TypeCategory::Date,
        "time" | "time without time zone" => TypeCategory::Time,
        "bool" | "boolean" => TypeCategory::Boolean,
        "real" | "float4" | "float8" => TypeCategory::Float,
        "json" | "jsonb" => TypeCategory::Json,
        "uuid" => TypeCategory::Uuid,
        "bytea" => TypeCategory::Binary,
        // Contain "int" without being integers
        "interval" | "point" => TypeCategory::Text,
        _ if name.contains("int") || name.contains("serial") => TypeCategory::Integer,
        _ if name.contains("float") || name.contains("double") => TypeCategory::Float,
        _ if name.contains("blob") || name.contains("binary") => TypeCategory::Binary,
        _ if name.contains("char") || name.contains("text") || name == "name" => {
            TypeCategory::Text
        }
        _ => TypeCategory::Unknown,
    }
}

/// Encode binary data as a base64 JSON string.
pub fn encode_binary(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    JsonValue::String(STANDARD.encode(bytes))
}

/// Convert a float to JSON, falling back to a string for NaN/infinity.
fn float_value(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

fn utc_value(v: chrono::DateTime<chrono::Utc>) -> JsonValue {
    JsonValue::String(v.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true))
}

fn naive_value(v: chrono::NaiveDateTime) -> JsonValue {
    JsonValue::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

/// Typed read of a nullable column. NULL and type mismatches are both `None`.
fn column_value<'r, R, T>(row: &'r R, idx: usize) -> Option<T>
where
    R: Row,
    usize: ColumnIndex<R>,
    T: Decode<'r, R::Database> + Type<R::Database>,
{
    row.try_get::<Option<T>, _>(idx).ok().flatten()
}

/// Read a column's wire text regardless of its declared type.
///
/// Text that is not valid UTF-8 is read as raw bytes with the invalid
/// sequences replaced by U+FFFD, and a warning is logged.
fn column_text<'r, R>(row: &'r R, idx: usize) -> Option<String>
where
    R: Row,
    usize: ColumnIndex<R>,
    String: Decode<'r, R::Database> + Type<R::Database>,
    Vec<u8>: Decode<'r, R::Database> + Type<R::Database>,
{
    match row.try_get_unchecked::<Option<String>, _>(idx) {
        Ok(text) => text,
        Err(e) => {
            let bytes = row
                .try_get_unchecked::<Option<Vec<u8>>, _>(idx)
                .ok()
                .flatten();
            warn!(
                column = idx,
                error = %e,
                recovered = bytes.is_some(),
                "Column text is not valid UTF-8, replacing invalid bytes"
            );
            bytes.map(|b| String::from_utf8_lossy(&b).into_owned())
        }
    }
}

fn text_or_null(text: Option<String>) -> JsonValue {
    text.map(JsonValue::String).unwrap_or(JsonValue::Null)
}

/// Conversion of a driver row into a [`Record`], keyed by column name in
/// column order.
pub trait RowToJson {
    fn to_record(&self) -> Record;
}

macro_rules! impl_row_to_json {
    ($row:ty, $db:expr, $decoder:path) => {
        impl RowToJson for $row {
            fn to_record(&self) -> Record {
                self.columns()
                    .iter()
                    .enumerate()
                    .map(|(idx, col)| {
                        let category = categorize_type(col.type_info().name(), $db);
                        (col.name().to_string(), $decoder(self, idx, category))
                    })
                    .collect()
            }
        }
    };
}

impl_row_to_json!(MySqlRow, DatabaseType::MySQL, mysql::decode_column);
impl_row_to_json!(PgRow, DatabaseType::PostgreSQL, postgres::decode_column);
impl_row_to_json!(SqliteRow, DatabaseType::SQLite, sqlite::decode_column);

mod mysql {
    use super::*;

    pub fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> JsonValue {
        let value = match category {
            // Signed first; BIGINT UNSIGNED only fits u64
            TypeCategory::Integer => column_value::<_, i64>(row, idx)
                .map(JsonValue::from)
                .or_else(|| column_value::<_, u64>(row, idx).map(JsonValue::from)),
            TypeCategory::Boolean => column_value::<_, bool>(row, idx).map(JsonValue::Bool),
            TypeCategory::Float => column_value::<_, f64>(row, idx)
                .or_else(|| column_value::<_, f32>(row, idx).map(f64::from))
                .map(float_value),
            TypeCategory::Binary => column_value::<_, Vec<u8>>(row, idx).map(|b| encode_binary(&b)),
            TypeCategory::Json => column_value::<_, JsonValue>(row, idx),
            TypeCategory::Timestamp | TypeCategory::TimestampTz => decode_datetime(row, idx),
            TypeCategory::Date => column_value::<_, chrono::NaiveDate>(row, idx)
                .map(|d| JsonValue::String(d.to_string())),
            // DECIMAL travels as its exact decimal text
            _ => column_text(row, idx).map(JsonValue::String),
        };

        value.unwrap_or_else(|| text_or_null(column_text(row, idx)))
    }

    /// DATETIME has no zone and stays naive; TIMESTAMP is stored as UTC.
    fn decode_datetime(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
        let naive = || column_value::<_, chrono::NaiveDateTime>(row, idx).map(naive_value);
        if is_zoneless(row.column(idx).type_info().name()) {
            return naive();
        }
        column_value::<_, chrono::DateTime<chrono::Utc>>(row, idx)
            .map(utc_value)
            .or_else(naive)
    }

    pub(super) fn is_zoneless(type_name: &str) -> bool {
        type_name.eq_ignore_ascii_case("datetime")
    }
}

mod postgres {
    use super::*;

    pub fn decode_column(row: &PgRow, idx: usize, category: TypeCategory) -> JsonValue {
        let value = match category {
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => column_value::<_, bool>(row, idx).map(JsonValue::Bool),
            TypeCategory::Float => column_value::<_, f64>(row, idx)
                .or_else(|| column_value::<_, f32>(row, idx).map(f64::from))
                .map(float_value),
            TypeCategory::Binary => column_value::<_, Vec<u8>>(row, idx).map(|b| encode_binary(&b)),
            TypeCategory::Json => column_value::<_, JsonValue>(row, idx),
            TypeCategory::Uuid => decode_uuid(row, idx),
            TypeCategory::TimestampTz => {
                column_value::<_, chrono::DateTime<chrono::Utc>>(row, idx).map(utc_value)
            }
            TypeCategory::Timestamp => {
                column_value::<_, chrono::NaiveDateTime>(row, idx).map(naive_value)
            }
            TypeCategory::Date => column_value::<_, chrono::NaiveDate>(row, idx)
                .map(|d| JsonValue::String(d.to_string())),
            TypeCategory::Time => column_value::<_, chrono::NaiveTime>(row, idx)
                .map(|t| JsonValue::String(t.to_string())),
            // NUMERIC keeps its exact text, never rounded through f64
            _ => column_text(row, idx).map(JsonValue::String),
        };

        value.unwrap_or_else(|| text_or_null(column_text(row, idx)))
    }

    /// Postgres integer decoding is width-exact.
    fn decode_integer(row: &PgRow, idx: usize) -> Option<JsonValue> {
        match row.column(idx).type_info().name() {
            "INT2" => column_value::<_, i16>(row, idx).map(JsonValue::from),
            "INT4" => column_value::<_, i32>(row, idx).map(JsonValue::from),
            _ => column_value::<_, i64>(row, idx).map(JsonValue::from),
        }
    }

    fn decode_uuid(row: &PgRow, idx: usize) -> Option<JsonValue> {
        // Text protocol already yields the canonical form
        let text = row.try_get_unchecked::<Option<String>, _>(idx).ok().flatten();
        if let Some(s) = text.filter(|s| s.len() == 36) {
            return Some(JsonValue::String(s));
        }
        // Binary protocol yields the raw 16 bytes
        let bytes = row
            .try_get_unchecked::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .filter(|b| b.len() == 16)?;
        let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        Some(JsonValue::String(format!(
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        )))
    }
}

mod sqlite {
    use super::*;

    /// SQLite is dynamically typed: the declared column type is only a hint,
    /// so dispatch on the storage class of the value actually stored.
    pub fn decode_column(row: &SqliteRow, idx: usize, category: TypeCategory) -> JsonValue {
        let storage = match row.try_get_raw(idx) {
            Ok(raw) if raw.is_null() => return JsonValue::Null,
            Ok(raw) => raw.type_info().name().to_uppercase(),
            Err(e) => {
                tracing::error!(column = idx, error = %e, "Failed to read column");
                return JsonValue::Null;
            }
        };

        match storage.as_str() {
            "INTEGER" => match row.try_get_unchecked::<i64, _>(idx) {
                Ok(v) if category == TypeCategory::Boolean => JsonValue::Bool(v != 0),
                Ok(v) => JsonValue::Number(v.into()),
                Err(_) => JsonValue::Null,
            },
            "REAL" => row
                .try_get_unchecked::<f64, _>(idx)
                .map(float_value)
                .unwrap_or(JsonValue::Null),
            "BLOB" => row
                .try_get_unchecked::<Vec<u8>, _>(idx)
                .map(|v| encode_binary(&v))
                .unwrap_or(JsonValue::Null),
            _ => decode_text(row, idx, category),
        }
    }

    fn decode_text(row: &SqliteRow, idx: usize, category: TypeCategory) -> JsonValue {
        match column_text(row, idx) {
            Some(v) if category == TypeCategory::Json => {
                serde_json::from_str::<JsonValue>(&v).unwrap_or(JsonValue::String(v))
            }
            Some(v) => JsonValue::String(v),
            None => JsonValue::Null,
        }
    }
}
