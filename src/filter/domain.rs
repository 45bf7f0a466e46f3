use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::str::FromStr;

use super::types::FilterType;

/// A range endpoint parsed into the domain of its filter type.
///
/// Bounds of different domains never compare; resolution guarantees both
/// sides of a comparison come from the same `FilterType`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound {
    Text(String),
    Number(Decimal),
    Date(DateTime<Utc>),
}

impl PartialOrd for Bound {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Bound::Text(a), Bound::Text(b)) => Some(a.cmp(b)),
            (Bound::Number(a), Bound::Number(b)) => Some(a.cmp(b)),
            (Bound::Date(a), Bound::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl FilterType {
    /// Parse a raw bound in this type's domain. `None` when it does not parse.
    pub fn parse_bound(&self, raw: &str) -> Option<Bound> {
        match self {
            FilterType::StringRange => Some(Bound::Text(raw.to_string())),
            FilterType::NumberRange => Decimal::from_str(raw.trim()).ok().map(Bound::Number),
            FilterType::DateRange => parse_date(raw.trim()).map(Bound::Date),
        }
    }
}

/// RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC)
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
