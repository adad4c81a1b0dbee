use crate::value::Value;
use derive_more::{Deref, DerefMut};
use std::{collections::BTreeMap, fmt};
use thiserror::Error as ThisError;

///
/// ScalarType
///
/// The scalar types a schema field may declare.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScalarType {
    Bool,
    DateTime,
    Number,
    String,
}

impl ScalarType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::DateTime => "datetime",
            Self::Number => "number",
            Self::String => "string",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

///
/// FieldDef
///
/// Caller-facing field definition. This is a closed sum: every accepted
/// schema shape is one of these variants, and normalization rejects anything
/// that does not conform instead of guessing.
///

#[derive(Clone, Debug, PartialEq)]
pub enum FieldDef {
    /// Scalar shorthand, e.g. `age: number`.
    Scalar(ScalarType),
    /// Enum shorthand as a list of allowed literals, e.g. `[OPEN, CLOSED]`.
    Values(Vec<Value>),
    /// Enum-object shape: variant name → literal value, the way a
    /// source-language enum type arrives as a schema entry.
    Members(BTreeMap<String, Value>),
    /// Explicit enum configuration; `name` is carried through for error
    /// messages only.
    Enum {
        values: EnumSource,
        name: Option<String>,
    },
}

impl FieldDef {
    /// Canonicalize this definition into one of the two normalized shapes.
    pub fn normalize(&self, field: &str) -> Result<FieldConfig, SchemaError> {
        match self {
            Self::Scalar(scalar) => Ok(FieldConfig::Scalar(*scalar)),
            Self::Values(values) => enum_config(field, values.clone(), None),
            Self::Members(members) => enum_config(field, member_values(members), None),
            Self::Enum { values, name } => {
                let literals = match values {
                    EnumSource::Values(values) => values.clone(),
                    EnumSource::Members(members) => member_values(members),
                };
                enum_config(field, literals, name.clone())
            }
        }
    }
}

impl From<ScalarType> for FieldDef {
    fn from(scalar: ScalarType) -> Self {
        Self::Scalar(scalar)
    }
}

impl From<Vec<Value>> for FieldDef {
    fn from(values: Vec<Value>) -> Self {
        Self::Values(values)
    }
}

impl<const N: usize> From<[&str; N]> for FieldDef {
    fn from(values: [&str; N]) -> Self {
        Self::Values(values.iter().map(|v| Value::from(*v)).collect())
    }
}

///
/// EnumSource
///
/// The two shapes the explicit enum form accepts for its `values`.
///

#[derive(Clone, Debug, PartialEq)]
pub enum EnumSource {
    Values(Vec<Value>),
    Members(BTreeMap<String, Value>),
}

///
/// FieldConfig
///
/// Normalized field configuration. Invariant: every schema field normalizes
/// to exactly one of these two shapes.
///

#[derive(Clone, Debug, PartialEq)]
pub enum FieldConfig {
    Scalar(ScalarType),
    Enum {
        values: Vec<Value>,
        name: Option<String>,
    },
}

impl FieldConfig {
    /// Short label for operator-mismatch diagnostics.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Scalar(scalar) => scalar.as_str(),
            Self::Enum { .. } => "enum",
        }
    }
}

fn member_values(members: &BTreeMap<String, Value>) -> Vec<Value> {
    members.values().cloned().collect()
}

fn enum_config(
    field: &str,
    values: Vec<Value>,
    name: Option<String>,
) -> Result<FieldConfig, SchemaError> {
    if values.is_empty() {
        return Err(SchemaError::InvalidFieldDefinition {
            field: field.to_string(),
            reason: "enum has no values".to_string(),
        });
    }

    if let Some(bad) = values.iter().find(|value| !value.is_enum_literal()) {
        return Err(SchemaError::InvalidFieldDefinition {
            field: field.to_string(),
            reason: format!("enum value '{bad}' is not a string or number"),
        });
    }

    Ok(FieldConfig::Enum { values, name })
}

///
/// Schema
///
/// Immutable map of allowed field names to definitions. Built once, read
/// only, and safe to share across concurrent compiles.
///

#[derive(Clone, Debug, Default, Deref, DerefMut, PartialEq)]
pub struct Schema(BTreeMap<String, FieldDef>);

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, def: impl Into<FieldDef>) -> Self {
        self.0.insert(name.into(), def.into());
        self
    }

    /// Normalized configuration for a field, or `None` when the field is not
    /// part of this schema.
    pub fn config(&self, field: &str) -> Option<Result<FieldConfig, SchemaError>> {
        self.0.get(field).map(|def| def.normalize(field))
    }
}

impl FromIterator<(String, FieldDef)> for Schema {
    fn from_iter<I: IntoIterator<Item = (String, FieldDef)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

///
/// SchemaError
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum SchemaError {
    #[error("invalid field definition for '{field}': {reason}")]
    InvalidFieldDefinition { field: String, reason: String },
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn values(items: &[&str]) -> Vec<Value> {
        items.iter().map(|v| Value::from(*v)).collect()
    }

    #[test]
    fn scalar_shorthand_passes_through() {
        let def = FieldDef::Scalar(ScalarType::Number);
        assert_eq!(
            def.normalize("age").unwrap(),
            FieldConfig::Scalar(ScalarType::Number)
        );
    }

    #[test]
    fn value_list_becomes_enum() {
        let def = FieldDef::Values(values(&["OPEN", "CLOSED"]));
        assert_eq!(
            def.normalize("status").unwrap(),
            FieldConfig::Enum {
                values: values(&["OPEN", "CLOSED"]),
                name: None,
            }
        );
    }

    #[test]
    fn enum_object_members_become_enum_values() {
        let members: BTreeMap<String, Value> = [
            ("ADMIN".to_string(), Value::from("ADMIN")),
            ("USER".to_string(), Value::from("USER")),
        ]
        .into_iter()
        .collect();

        let def = FieldDef::Members(members);
        let FieldConfig::Enum { values, name } = def.normalize("role").unwrap() else {
            panic!("expected enum config");
        };
        assert_eq!(values, vec![Value::from("ADMIN"), Value::from("USER")]);
        assert_eq!(name, None);
    }

    #[test]
    fn explicit_enum_carries_name() {
        let def = FieldDef::Enum {
            values: EnumSource::Values(values(&["A", "B"])),
            name: Some("Letters".to_string()),
        };
        let FieldConfig::Enum { name, .. } = def.normalize("letter").unwrap() else {
            panic!("expected enum config");
        };
        assert_eq!(name.as_deref(), Some("Letters"));
    }

    #[test]
    fn mixed_string_and_numeric_members_are_allowed() {
        let def = FieldDef::Values(vec![Value::from("LOW"), Value::from(1_i64)]);
        assert!(def.normalize("level").is_ok());
    }

    #[test]
    fn empty_enum_is_rejected() {
        let def = FieldDef::Values(Vec::new());
        let err = def.normalize("status").unwrap_err();
        assert!(err.to_string().contains("status"));
    }

    #[test]
    fn non_literal_enum_value_is_rejected_loudly() {
        let def = FieldDef::Values(vec![Value::from("OPEN"), Value::Bool(true)]);
        let err = def.normalize("status").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidFieldDefinition { .. }));
    }

    #[test]
    fn schema_lookup_distinguishes_unknown_fields() {
        let schema = Schema::new().field("age", ScalarType::Number);
        assert!(schema.config("age").is_some());
        assert!(schema.config("salary").is_none());
    }
}
