
use crate::value::Value;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::{
    collections::BTreeMap,
    fmt,
    ops::{BitAnd, BitOr, Not},
};

///
/// CompareOp
///
/// The fixed leaf-operator vocabulary the external query engine consumes.
/// Serialization never emits anything outside `key()`.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    NotIn,
    Contains,
    StartsWith,
    EndsWith,
}

impl CompareOp {
    pub const ALL: [Self; 11] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Ge,
        Self::Lt,
        Self::Le,
        Self::In,
        Self::NotIn,
        Self::Contains,
        Self::StartsWith,
        Self::EndsWith,
    ];

    /// Canonical key emitted on the wire.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::In => "in",
            Self::NotIn => "notIn",
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
        }
    }

    /// Operators that only make sense against string content.
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Contains | Self::StartsWith | Self::EndsWith)
    }

    /// Operators whose payload is a list rather than a scalar.
    #[must_use]
    pub const fn takes_list(self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

///
/// OpValue
///
/// Payload of one operator entry: scalars for comparisons, lists for
/// membership.
///

#[derive(Clone, Debug, PartialEq)]
pub enum OpValue {
    Scalar(Value),
    List(Vec<Value>),
}

impl Serialize for OpValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Scalar(value) => value.serialize(serializer),
            Self::List(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
        }
    }
}

///
/// FieldPredicate
///
/// Everything a criteria node says about one field: either a bare value
/// (implicit equality) or an operator map such as `{gt: 18, lt: 30}`.
///

#[derive(Clone, Debug, PartialEq)]
pub enum FieldPredicate {
    Value(Value),
    Ops(BTreeMap<CompareOp, OpValue>),
}

impl FieldPredicate {
    /// Single-operator map.
    #[must_use]
    pub fn op(op: CompareOp, value: OpValue) -> Self {
        Self::Ops(BTreeMap::from([(op, value)]))
    }
}

impl Serialize for FieldPredicate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Value(value) => value.serialize(serializer),
            Self::Ops(ops) => {
                let mut map = serializer.serialize_map(Some(ops.len()))?;
                for (op, value) in ops {
                    map.serialize_entry(op.key(), value)?;
                }
                map.end()
            }
        }
    }
}

///
/// Criteria
///
/// One node of the compiled criteria tree: the canonical logical slots
/// (`AND` / `OR` / `NOT`) plus a per-field predicate map. The compiler emits
/// single-slot nodes; compaction may splice merged fields alongside a
/// surviving logical slot, so all slots coexist on one node.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Criteria {
    pub and: Vec<Criteria>,
    pub or: Vec<Criteria>,
    pub not: Option<Box<Criteria>>,
    pub fields: BTreeMap<String, FieldPredicate>,
}

impl Criteria {
    // --- Composition ---

    #[must_use]
    pub fn and(children: Vec<Self>) -> Self {
        Self {
            and: children,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn or(children: Vec<Self>) -> Self {
        Self {
            or: children,
            ..Self::default()
        }
    }

    #[expect(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(inner: Self) -> Self {
        Self {
            not: Some(Box::new(inner)),
            ..Self::default()
        }
    }

    /// Leaf carrying one field predicate.
    #[must_use]
    pub fn field(name: impl Into<String>, predicate: FieldPredicate) -> Self {
        Self {
            fields: BTreeMap::from([(name.into(), predicate)]),
            ..Self::default()
        }
    }

    // --- Comparison helpers ---

    /// Bare equality, the implicit-`eq` form.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, FieldPredicate::Value(value.into()))
    }

    #[must_use]
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::op(field, CompareOp::Ne, value)
    }

    #[must_use]
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::op(field, CompareOp::Gt, value)
    }

    #[must_use]
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::op(field, CompareOp::Ge, value)
    }

    #[must_use]
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::op(field, CompareOp::Lt, value)
    }

    #[must_use]
    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::op(field, CompareOp::Le, value)
    }

    #[must_use]
    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::op(field, CompareOp::Contains, value)
    }

    #[must_use]
    pub fn starts_with(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::op(field, CompareOp::StartsWith, value)
    }

    #[must_use]
    pub fn ends_with(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::op(field, CompareOp::EndsWith, value)
    }

    // --- Membership ---

    #[must_use]
    pub fn in_iter<I>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self::field(
            field,
            FieldPredicate::op(
                CompareOp::In,
                OpValue::List(values.into_iter().map(Into::into).collect()),
            ),
        )
    }

    #[must_use]
    pub fn not_in_iter<I>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self::field(
            field,
            FieldPredicate::op(
                CompareOp::NotIn,
                OpValue::List(values.into_iter().map(Into::into).collect()),
            ),
        )
    }

    fn op(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::field(field, FieldPredicate::op(op, OpValue::Scalar(value.into())))
    }

    // --- Shape queries ---

    /// A node carrying nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.and.is_empty() && self.or.is_empty() && self.not.is_none() && self.fields.is_empty()
    }

    /// A plain field-operator map: fields only, no logical slots.
    #[must_use]
    pub fn is_field_map(&self) -> bool {
        !self.fields.is_empty()
            && self.and.is_empty()
            && self.or.is_empty()
            && self.not.is_none()
    }

    /// Canonical JSON rendering, the shape handed to query engines.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("criteria serialization is infallible")
    }
}

impl Serialize for Criteria {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = usize::from(!self.and.is_empty())
            + usize::from(!self.or.is_empty())
            + usize::from(self.not.is_some())
            + self.fields.len();

        let mut map = serializer.serialize_map(Some(len))?;
        if !self.and.is_empty() {
            map.serialize_entry("AND", &self.and)?;
        }
        if !self.or.is_empty() {
            map.serialize_entry("OR", &self.or)?;
        }
        if let Some(not) = &self.not {
            map.serialize_entry("NOT", not)?;
        }
        for (field, predicate) in &self.fields {
            map.serialize_entry(field, predicate)?;
        }
        map.end()
    }
}

impl BitAnd for Criteria {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::and(vec![self, rhs])
    }
}

impl BitOr for Criteria {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::or(vec![self, rhs])
    }
}

impl Not for Criteria {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self {
            not: Some(Box::new(self)),
            ..Self::default()
        }
    }
}
