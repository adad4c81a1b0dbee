use crate::{
    criteria::CompareOp,
    error::{Error, ErrorKind},
    parse::{Literal, LiteralKind},
    schema::{FieldConfig, ScalarType, Schema},
    value::Value,
};
use thiserror::Error as ThisError;

///
/// ValidateError
///
/// Schema-aware validation and casting failures. Every message names the
/// offending field and, where relevant, the allowed type or set, so the web
/// layer can surface it verbatim.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum ValidateError {
    #[error("field '{field}' is not allowed")]
    FieldNotAllowed { field: String },

    #[error("operator '{op}' is not valid for {kind} field '{field}'")]
    OperatorTypeMismatch {
        field: String,
        op: CompareOp,
        kind: &'static str,
    },

    #[error("'{value}' is not a valid {expected} for field '{field}'")]
    TypeCast {
        field: String,
        value: String,
        expected: ScalarType,
    },

    #[error(
        "value '{value}' is not allowed for field '{field}'{}; allowed: [{}]",
        name_suffix(.name),
        join_values(.allowed)
    )]
    EnumValueNotAllowed {
        field: String,
        value: String,
        allowed: Vec<Value>,
        name: Option<String>,
    },

    #[error("list items for field '{field}' must all share one type")]
    MixedListTypes { field: String },
}

impl ValidateError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::FieldNotAllowed { .. } => ErrorKind::FieldNotAllowed,
            Self::OperatorTypeMismatch { .. } => ErrorKind::OperatorTypeMismatch,
            Self::TypeCast { .. } => ErrorKind::TypeCast,
            Self::EnumValueNotAllowed { .. } => ErrorKind::EnumValueNotAllowed,
            Self::MixedListTypes { .. } => ErrorKind::MixedListType,
        }
    }
}

fn name_suffix(name: &Option<String>) -> String {
    name.as_ref()
        .map(|name| format!(" ({name})"))
        .unwrap_or_default()
}

fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve a field against the schema, if one is present.
///
/// `Ok(None)` means permissive mode: no schema was supplied and the caller
/// trusts its own input.
pub(crate) fn resolve_config(
    schema: Option<&Schema>,
    field: &str,
) -> Result<Option<FieldConfig>, Error> {
    let Some(schema) = schema else {
        return Ok(None);
    };

    match schema.config(field) {
        None => Err(ValidateError::FieldNotAllowed {
            field: field.to_string(),
        }
        .into()),
        Some(config) => Ok(Some(config?)),
    }
}

/// Type-check the operator and cast one literal for the given field.
pub(crate) fn validate_and_cast(
    field: &str,
    op: CompareOp,
    literal: &Literal,
    config: Option<&FieldConfig>,
) -> Result<Value, Error> {
    let Some(config) = config else {
        return Ok(lexical_value(literal));
    };

    check_operator(field, op, config)?;
    cast_single(field, &literal.raw, config)
}

/// Cast every list element independently, preserving order. Family
/// uniformity was enforced when the list was resolved.
pub(crate) fn validate_and_cast_list(
    field: &str,
    op: CompareOp,
    items: &[Literal],
    config: Option<&FieldConfig>,
) -> Result<Vec<Value>, Error> {
    items
        .iter()
        .map(|literal| validate_and_cast(field, op, literal, config))
        .collect()
}

// String-content operators make no sense against enums or booleans.
fn check_operator(field: &str, op: CompareOp, config: &FieldConfig) -> Result<(), Error> {
    let incompatible = op.is_text()
        && matches!(
            config,
            FieldConfig::Enum { .. } | FieldConfig::Scalar(ScalarType::Bool)
        );

    if incompatible {
        return Err(ValidateError::OperatorTypeMismatch {
            field: field.to_string(),
            op,
            kind: config.kind_label(),
        }
        .into());
    }

    Ok(())
}

fn cast_single(field: &str, raw: &str, config: &FieldConfig) -> Result<Value, Error> {
    match config {
        FieldConfig::Scalar(scalar) => cast_scalar(field, raw, *scalar),
        FieldConfig::Enum { values, name } => cast_enum(field, raw, values, name.as_deref()),
    }
}

// Membership tries the numerically-coerced form first (enums may mix string
// and numeric members), then the raw text. The matched set member is
// returned, so its original identity survives the coercion attempt.
fn cast_enum(
    field: &str,
    raw: &str,
    values: &[Value],
    name: Option<&str>,
) -> Result<Value, Error> {
    if let Some(coerced) = Value::parse_number(raw) {
        if let Some(member) = values.iter().find(|member| **member == coerced) {
            return Ok(member.clone());
        }
    }

    if let Some(member) = values
        .iter()
        .find(|member| matches!(member, Value::Text(text) if text == raw))
    {
        return Ok(member.clone());
    }

    Err(ValidateError::EnumValueNotAllowed {
        field: field.to_string(),
        value: raw.to_string(),
        allowed: values.to_vec(),
        name: name.map(ToString::to_string),
    }
    .into())
}

fn cast_scalar(field: &str, raw: &str, scalar: ScalarType) -> Result<Value, Error> {
    let cast = match scalar {
        ScalarType::Number => Value::parse_number(raw),
        ScalarType::Bool => match raw {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        ScalarType::DateTime => Value::parse_datetime(raw),
        ScalarType::String => Some(Value::Text(raw.to_string())),
    };

    cast.ok_or_else(|| {
        ValidateError::TypeCast {
            field: field.to_string(),
            value: raw.to_string(),
            expected: scalar,
        }
        .into()
    })
}

// Permissive mode: the literal's lexical class decides its type.
fn lexical_value(literal: &Literal) -> Value {
    match literal.kind {
        LiteralKind::Number => Value::parse_number(&literal.raw)
            .unwrap_or_else(|| Value::Text(literal.raw.clone())),
        LiteralKind::DateTime => Value::parse_datetime(&literal.raw)
            .unwrap_or_else(|| Value::Text(literal.raw.clone())),
        LiteralKind::String => Value::Text(literal.raw.clone()),
        LiteralKind::Word => match literal.raw.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Text(literal.raw.clone()),
        },
    }
}
