use crate::value::{Value, ValueFamily};

///
/// Surface AST
///
/// Pure syntactic representation of a parsed filter. No schema knowledge
/// and no casting: literals keep their raw text until lowering resolves the
/// target field's type. Parenthesized groups never appear here — the parser
/// unwraps them in place.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Compare {
        field: String,
        op: CompareToken,
        value: Literal,
    },
    In {
        field: String,
        negated: bool,
        items: Vec<Literal>,
    },
    Call {
        function: StringFn,
        field: String,
        arg: Literal,
    },
}

///
/// CompareToken
///
/// Relational surface operators, already folded across spellings
/// (`==`/`eq`, `>=`/`=ge=`/`ge`, …).
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareToken {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

///
/// StringFn
///
/// Named substring-search functions.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StringFn {
    Contains,
    StartsWith,
    EndsWith,
}

impl StringFn {
    /// Function names match case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("contains") {
            Some(Self::Contains)
        } else if name.eq_ignore_ascii_case("startswith") {
            Some(Self::StartsWith)
        } else if name.eq_ignore_ascii_case("endswith") {
            Some(Self::EndsWith)
        } else {
            None
        }
    }
}

///
/// Literal
///
/// A raw literal token plus its lexical classification.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Literal {
    pub raw: String,
    pub kind: LiteralKind,
}

impl Literal {
    /// Classify a bare word by shape.
    #[must_use]
    pub fn word(raw: String) -> Self {
        let kind = if Value::parse_number(&raw).is_some() {
            LiteralKind::Number
        } else if is_datetime_shaped(&raw) {
            LiteralKind::DateTime
        } else {
            LiteralKind::Word
        };
        Self { raw, kind }
    }

    /// A quoted string with the quotes already stripped.
    #[must_use]
    pub const fn quoted(raw: String) -> Self {
        Self {
            raw,
            kind: LiteralKind::String,
        }
    }

    /// The value family this literal would carry without a schema.
    #[must_use]
    pub const fn family(&self) -> ValueFamily {
        match self.kind {
            LiteralKind::DateTime => ValueFamily::DateTime,
            LiteralKind::Number => ValueFamily::Numeric,
            LiteralKind::String | LiteralKind::Word => ValueFamily::Textual,
        }
    }
}

///
/// LiteralKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LiteralKind {
    DateTime,
    Number,
    String,
    Word,
}

// `YYYY-MM-DD`, optionally followed by a `T...` time part. Full validation
// happens when the literal is cast.
fn is_datetime_shaped(raw: &str) -> bool {
    let b = raw.as_bytes();
    b.len() >= 10
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[7] == b'-'
        && b[8..10].iter().all(u8::is_ascii_digit)
        && (b.len() == 10 || b[10] == b'T')
}
