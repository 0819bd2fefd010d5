//! Column decoding helpers shared by the row mappers.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use uuid::Uuid;

/// Timestamps are stored as fixed-width RFC 3339 (microseconds, `Z`) so that
/// `ORDER BY created_at` sorts chronologically.
pub(crate) fn ts(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion(idx: usize, err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

pub(crate) fn uuid_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion(idx, e))
}

pub(crate) fn opt_uuid_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| Uuid::parse_str(&s))
        .transpose()
        .map_err(|e| conversion(idx, e))
}

pub(crate) fn ts_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion(idx, e))
}

/// Parse a text enum column through its `FromStr` impl.
pub(crate) fn enum_at<T: FromStr>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|_| conversion(idx, format!("unexpected value {raw:?}")))
}

pub(crate) fn opt_enum_at<T: FromStr>(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        s.parse::<T>()
            .map_err(|_| conversion(idx, format!("unexpected value {s:?}")))
    })
    .transpose()
}
