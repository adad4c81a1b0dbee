use crate::criteria::{CompareOp, Criteria, FieldPredicate, OpValue};
use std::collections::{BTreeMap, btree_map::Entry};

///
/// Compact a criteria tree into its canonical, minimal form.
///
/// Depth-first, children before parents:
/// - an operator map that is exactly `{eq: V}` collapses to the bare value
/// - redundant AND nesting is hoisted
/// - AND children that are plain field maps are deep-merged field-by-field,
///   so `age>18 AND age<30` becomes `{age: {gt: 18, lt: 30}}`
/// - OR nodes are never flattened; every alternative stays distinct
///
/// The pass is idempotent: compacting a compacted tree changes nothing.
///
#[must_use]
pub fn compact(node: Criteria) -> Criteria {
    let Criteria {
        and,
        or,
        not,
        fields,
    } = node;

    let node = Criteria {
        and: and.into_iter().map(compact).collect(),
        or: or.into_iter().map(compact).collect(),
        not: not.map(|inner| Box::new(compact(*inner))),
        fields: fields
            .into_iter()
            .map(|(name, predicate)| (name, simplify_equals(predicate)))
            .collect(),
    };

    flatten_and(node)
}

// `{eq: V}` is just V.
fn simplify_equals(predicate: FieldPredicate) -> FieldPredicate {
    if let FieldPredicate::Ops(ops) = &predicate {
        let only = ops.first_key_value().map(|(op, value)| (*op, value));
        if ops.len() == 1 {
            if let Some((CompareOp::Eq, OpValue::Scalar(value))) = only {
                return FieldPredicate::Value(value.clone());
            }
        }
    }

    predicate
}

fn flatten_and(mut node: Criteria) -> Criteria {
    if node.and.is_empty() {
        return node;
    }

    // Hoist nested AND-only children in place, preserving order.
    let mut children = std::mem::take(&mut node.and);
    let mut i = 0;
    while i < children.len() {
        if is_and_only(&children[i]) {
            let child = children.remove(i);
            children.splice(i..i, child.and);
        } else {
            i += 1;
        }
    }

    // Merge what can move into this node without a logical-slot collision;
    // everything else survives under AND. Field merges are right-biased,
    // key-wise, matching the original deep merge.
    let mut residual = Vec::new();
    for child in children {
        let or_fits = child.or.is_empty() || node.or.is_empty();
        let not_fits = child.not.is_none() || node.not.is_none();

        if child.and.is_empty() && or_fits && not_fits {
            if !child.or.is_empty() {
                node.or = child.or;
            }
            if child.not.is_some() {
                node.not = child.not;
            }
            merge_fields(&mut node.fields, child.fields);
        } else {
            residual.push(child);
        }
    }
    node.and = residual;

    // A pure single-child AND is the child.
    if node.and.len() == 1 && node.or.is_empty() && node.not.is_none() && node.fields.is_empty() {
        return node.and.pop().expect("single AND child");
    }

    node
}

fn is_and_only(node: &Criteria) -> bool {
    !node.and.is_empty() && node.or.is_empty() && node.not.is_none() && node.fields.is_empty()
}

fn merge_fields(
    target: &mut BTreeMap<String, FieldPredicate>,
    incoming: BTreeMap<String, FieldPredicate>,
) {
    for (name, predicate) in incoming {
        match target.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(predicate);
            }
            Entry::Occupied(mut slot) => match (slot.get_mut(), predicate) {
                (FieldPredicate::Ops(existing), FieldPredicate::Ops(ops)) => {
                    existing.extend(ops);
                }
                (slot, predicate) => *slot = predicate,
            },
        }
    }
}
