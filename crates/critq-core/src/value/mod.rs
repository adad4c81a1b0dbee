
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::ser::{Serialize, Serializer};
use std::fmt;

///
/// Value
///
/// Literal values carried by criteria leaves and schema enum sets.
///
/// The numeric side is deliberately narrow: `Int` and `Float` cover what a
/// filter literal can express, and both belong to the same `Numeric` family
/// so that list-uniformity checks treat `1` and `1.5` as one type.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    DateTime(DateTime<Utc>),
    Float(f64),
    Int(i64),
    Text(String),
}

impl Value {
    /// Coarse classification used by list-uniformity checks.
    #[must_use]
    pub const fn family(&self) -> ValueFamily {
        match self {
            Self::Bool(_) => ValueFamily::Bool,
            Self::DateTime(_) => ValueFamily::DateTime,
            Self::Float(_) | Self::Int(_) => ValueFamily::Numeric,
            Self::Text(_) => ValueFamily::Textual,
        }
    }

    /// Whether this value may appear in a schema enum set.
    #[must_use]
    pub const fn is_enum_literal(&self) -> bool {
        matches!(self, Self::Float(_) | Self::Int(_) | Self::Text(_))
    }

    /// Parse a numeric literal, preferring integer identity.
    ///
    /// Non-finite results (`NaN`, `inf`) are rejected rather than produced.
    #[must_use]
    pub fn parse_number(raw: &str) -> Option<Self> {
        let mut chars = raw.chars();
        let first = chars.next()?;
        if !(first.is_ascii_digit() || matches!(first, '-' | '+' | '.')) {
            return None;
        }

        if let Ok(int) = raw.parse::<i64>() {
            return Some(Self::Int(int));
        }

        raw.parse::<f64>()
            .ok()
            .filter(|float| float.is_finite())
            .map(Self::Float)
    }

    /// Parse a datetime literal.
    ///
    /// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS`, or a bare date
    /// (interpreted as midnight UTC).
    #[must_use]
    pub fn parse_datetime(raw: &str) -> Option<Self> {
        if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self::DateTime(datetime.with_timezone(&Utc)));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
            return Some(Self::DateTime(naive.and_utc()));
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            let midnight = date.and_hms_opt(0, 0, 0)?;
            return Some(Self::DateTime(midnight.and_utc()));
        }

        None
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

// Datetimes serialize as RFC 3339 text; everything else keeps its native
// JSON shape.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::DateTime(v) => serializer.serialize_str(&v.to_rfc3339()),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Text(v) => serializer.serialize_str(v),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

///
/// ValueFamily
///
/// Coarse value classification used for list-uniformity checks and
/// diagnostics. It does not define casting behavior.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueFamily {
    Bool,
    DateTime,
    Numeric,
    Textual,
}

impl ValueFamily {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::DateTime => "datetime",
            Self::Numeric => "number",
            Self::Textual => "string",
        }
    }
}

impl fmt::Display for ValueFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
