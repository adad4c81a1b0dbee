use crate::{
    compile::cast,
    criteria::{CompareOp, Criteria, FieldPredicate, OpValue},
    error::{Error, InternalError},
    parse::{CompareToken, Expr, Literal, LiteralKind, StringFn},
    schema::{ScalarType, Schema},
    value::ValueFamily,
};

///
/// Lowering
///
/// One synchronous recursive pass over the owned surface tree. The
/// evaluation stack of the original listener design is the call structure
/// here, so every invocation is independently reentrant. Fail-fast: the
/// first error aborts the compile with no partial result.
///

pub(crate) fn lower(expr: &Expr, schema: Option<&Schema>) -> Result<Criteria, Error> {
    match expr {
        Expr::And(children) => Ok(Criteria::and(lower_children(children, schema)?)),
        Expr::Or(children) => Ok(Criteria::or(lower_children(children, schema)?)),
        Expr::Not(inner) => Ok(Criteria::not(lower(inner, schema)?)),
        Expr::Compare { field, op, value } => lower_compare(field, *op, value, schema),
        Expr::In {
            field,
            negated,
            items,
        } => lower_membership(field, *negated, items, schema),
        Expr::Call {
            function,
            field,
            arg,
        } => lower_call(*function, field, arg, schema),
    }
}

fn lower_children(children: &[Expr], schema: Option<&Schema>) -> Result<Vec<Criteria>, Error> {
    children.iter().map(|child| lower(child, schema)).collect()
}

fn lower_compare(
    field: &str,
    op: CompareToken,
    value: &Literal,
    schema: Option<&Schema>,
) -> Result<Criteria, Error> {
    // Identifier resolution fails before the operator or value are examined.
    let config = cast::resolve_config(schema, field)?;

    // Wildcard markers refine bare-word equality into substring matching.
    if op == CompareToken::Eq && value.kind == LiteralKind::Word {
        if let Some((text_op, stripped)) = wildcard(&value.raw) {
            let literal = Literal {
                raw: stripped.to_string(),
                kind: LiteralKind::Word,
            };
            let value = cast::validate_and_cast(field, text_op, &literal, config.as_ref())?;
            return Ok(Criteria::field(
                field,
                FieldPredicate::op(text_op, OpValue::Scalar(value)),
            ));
        }
    }

    let cmp = canonical(op);
    let value = cast::validate_and_cast(field, cmp, value, config.as_ref())?;

    // Not-equal has one canonical encoding: a NOT-wrapped equality.
    if op == CompareToken::Ne {
        return Ok(Criteria::not(Criteria::field(
            field,
            FieldPredicate::op(CompareOp::Eq, OpValue::Scalar(value)),
        )));
    }

    Ok(Criteria::field(
        field,
        FieldPredicate::op(cmp, OpValue::Scalar(value)),
    ))
}

fn lower_membership(
    field: &str,
    negated: bool,
    items: &[Literal],
    schema: Option<&Schema>,
) -> Result<Criteria, Error> {
    let config = cast::resolve_config(schema, field)?;

    let Some(first) = items.first() else {
        // The grammar requires at least one element; an empty list reaching
        // this point is a compiler bug, not a user error.
        return Err(InternalError::invariant("membership list lowered with no items").into());
    };

    let family = first.family();
    if items.iter().any(|item| item.family() != family) {
        return Err(cast::ValidateError::MixedListTypes {
            field: field.to_string(),
        }
        .into());
    }

    let op = if negated {
        CompareOp::NotIn
    } else {
        CompareOp::In
    };
    let values = cast::validate_and_cast_list(field, op, items, config.as_ref())?;

    Ok(Criteria::field(
        field,
        FieldPredicate::op(op, OpValue::List(values)),
    ))
}

fn lower_call(
    function: StringFn,
    field: &str,
    arg: &Literal,
    schema: Option<&Schema>,
) -> Result<Criteria, Error> {
    let config = cast::resolve_config(schema, field)?;

    // Substring functions take string content only.
    if arg.family() != ValueFamily::Textual {
        return Err(cast::ValidateError::TypeCast {
            field: field.to_string(),
            value: arg.raw.clone(),
            expected: ScalarType::String,
        }
        .into());
    }

    let op = match function {
        StringFn::Contains => CompareOp::Contains,
        StringFn::StartsWith => CompareOp::StartsWith,
        StringFn::EndsWith => CompareOp::EndsWith,
    };
    let value = cast::validate_and_cast(field, op, arg, config.as_ref())?;

    Ok(Criteria::field(
        field,
        FieldPredicate::op(op, OpValue::Scalar(value)),
    ))
}

const fn canonical(op: CompareToken) -> CompareOp {
    match op {
        CompareToken::Eq => CompareOp::Eq,
        CompareToken::Ne => CompareOp::Ne,
        CompareToken::Gt => CompareOp::Gt,
        CompareToken::Ge => CompareOp::Ge,
        CompareToken::Lt => CompareOp::Lt,
        CompareToken::Le => CompareOp::Le,
    }
}

// Marker-adjacent wildcard detection: both markers mean contains, a leading
// marker means ends-with, a trailing one starts-with. A lone `*` is literal.
fn wildcard(raw: &str) -> Option<(CompareOp, &str)> {
    let prefix = raw.starts_with('*');
    let suffix = raw.ends_with('*');

    if raw.len() > 1 && prefix && suffix {
        Some((CompareOp::Contains, &raw[1..raw.len() - 1]))
    } else if raw.len() > 1 && prefix {
        Some((CompareOp::EndsWith, &raw[1..]))
    } else if raw.len() > 1 && suffix {
        Some((CompareOp::StartsWith, &raw[..raw.len() - 1]))
    } else {
        None
    }
}
