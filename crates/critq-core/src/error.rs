use crate::{compile::ValidateError, parse::ParseError, schema::SchemaError};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Top-level compile error. Each variant wraps one pipeline stage's error
/// type; `kind` exposes the stable machine-readable classification the web
/// layer maps to its own envelope. Messages are end-user-ready: they name
/// the offending field and the allowed type or set where relevant.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Validate(#[from] ValidateError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(_) => ErrorKind::MalformedExpression,
            Self::Schema(_) => ErrorKind::InvalidFieldDefinition,
            Self::Validate(err) => err.kind(),
            Self::Internal(_) => ErrorKind::InternalConsistency,
        }
    }
}

///
/// ErrorKind
///
/// Stable classification for compile failures. Compilation is pure and
/// deterministic, so no kind is retryable.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    MalformedExpression,
    InvalidFieldDefinition,
    FieldNotAllowed,
    OperatorTypeMismatch,
    TypeCast,
    EnumValueNotAllowed,
    MixedListType,
    InternalConsistency,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::MalformedExpression => "malformed_expression",
            Self::InvalidFieldDefinition => "invalid_field_definition",
            Self::FieldNotAllowed => "field_not_allowed",
            Self::OperatorTypeMismatch => "operator_type_mismatch",
            Self::TypeCast => "type_cast",
            Self::EnumValueNotAllowed => "enum_value_not_allowed",
            Self::MixedListType => "mixed_list_type",
            Self::InternalConsistency => "internal_consistency",
        };
        write!(f, "{label}")
    }
}

///
/// InternalError
///
/// An internal-consistency breach: a compiler bug surfaced loudly, never a
/// user-input failure.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
#[error("internal consistency violation: {message}")]
pub struct InternalError {
    pub message: String,
}

impl InternalError {
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
