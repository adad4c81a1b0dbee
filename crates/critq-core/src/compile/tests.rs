use crate::{
    compile::{Compiler, compact, compile},
    criteria::{CompareOp, Criteria, FieldPredicate, OpValue},
    error::ErrorKind,
    schema::{EnumSource, FieldDef, ScalarType, Schema},
    trace::{TraceEvent, TraceSink},
    value::Value,
};
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Mutex;

// ---- helpers -----------------------------------------------------------

fn role_members() -> FieldDef {
    let members: BTreeMap<String, Value> = [
        ("ADMIN".to_string(), Value::from("ADMIN")),
        ("USER".to_string(), Value::from("USER")),
        ("GUEST".to_string(), Value::from("GUEST")),
    ]
    .into_iter()
    .collect();
    FieldDef::Members(members)
}

fn test_schema() -> Schema {
    Schema::new()
        .field("name", ScalarType::String)
        .field("age", ScalarType::Number)
        .field("isActive", ScalarType::Bool)
        .field("createdAt", ScalarType::DateTime)
        .field("role", role_members())
        .field("status", ["OPEN", "CLOSED"])
}

fn json_of(input: &str) -> serde_json::Value {
    compile(input, Some(&test_schema())).unwrap().to_json()
}

fn kind_of(input: &str) -> ErrorKind {
    compile(input, Some(&test_schema())).unwrap_err().kind()
}

// --- casting ---

#[test]
fn casts_numbers() {
    assert_eq!(json_of("age==25"), json!({"age": 25}));
}

#[test]
fn casts_floats() {
    assert_eq!(json_of("age==18.5"), json!({"age": 18.5}));
}

#[test]
fn casts_booleans() {
    assert_eq!(json_of("isActive==true"), json!({"isActive": true}));
    assert_eq!(json_of("isActive==false"), json!({"isActive": false}));
}

#[test]
fn boolean_words_are_case_sensitive() {
    assert_eq!(kind_of("isActive==True"), ErrorKind::TypeCast);
}

#[test]
fn casts_datetimes_to_midnight_utc() {
    assert_eq!(
        json_of("createdAt==2023-01-01"),
        json!({"createdAt": "2023-01-01T00:00:00+00:00"})
    );
}

#[test]
fn number_cast_failure_names_the_field() {
    let err = compile("age==veinte", Some(&test_schema())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeCast);
    let message = err.to_string();
    assert!(message.contains("veinte"), "{message}");
    assert!(message.contains("age"), "{message}");
    assert!(message.contains("number"), "{message}");
}

// --- enums ---

#[test]
fn enum_object_members_validate() {
    assert_eq!(json_of("role==ADMIN"), json!({"role": "ADMIN"}));
}

#[test]
fn enum_shorthand_validates() {
    assert_eq!(json_of("status==OPEN"), json!({"status": "OPEN"}));
}

#[test]
fn enum_rejects_unknown_member_listing_the_set() {
    let err = compile("role==SUPERMAN", Some(&test_schema())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EnumValueNotAllowed);
    let message = err.to_string();
    assert!(message.contains("SUPERMAN"), "{message}");
    assert!(message.contains("ADMIN"), "{message}");
}

#[test]
fn numeric_enum_members_match_through_coercion() {
    let schema = Schema::new().field("level", FieldDef::Values(vec![
        Value::Int(1),
        Value::Int(2),
        Value::from("LOW"),
    ]));
    let criteria = compile("level==1", Some(&schema)).unwrap();
    assert_eq!(criteria.to_json(), json!({"level": 1}));

    let criteria = compile("level==LOW", Some(&schema)).unwrap();
    assert_eq!(criteria.to_json(), json!({"level": "LOW"}));
}

#[test]
fn string_members_spelled_like_numbers_stay_reachable() {
    let schema = Schema::new().field("code", FieldDef::Values(vec![Value::from("1")]));
    let criteria = compile("code==1", Some(&schema)).unwrap();
    // The matched member keeps its string identity.
    assert_eq!(criteria.to_json(), json!({"code": "1"}));
}

#[test]
fn explicit_enum_name_appears_in_the_message() {
    let schema = Schema::new().field(
        "role",
        FieldDef::Enum {
            values: EnumSource::Values(vec![Value::from("ADMIN")]),
            name: Some("UserRole".to_string()),
        },
    );
    let message = compile("role==NOPE", Some(&schema)).unwrap_err().to_string();
    assert!(message.contains("UserRole"), "{message}");
}

#[test]
fn invalid_definition_surfaces_during_compile() {
    let schema = Schema::new().field("status", FieldDef::Values(Vec::new()));
    let err = compile("status==OPEN", Some(&schema)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFieldDefinition);
}

// --- wildcards and string functions ---

#[test]
fn wildcard_both_sides_is_contains() {
    assert_eq!(json_of("name==*ann*"), json!({"name": {"contains": "ann"}}));
}

#[test]
fn wildcard_leading_is_ends_with() {
    assert_eq!(json_of("name==*bar"), json!({"name": {"endsWith": "bar"}}));
}

#[test]
fn wildcard_trailing_is_starts_with() {
    assert_eq!(json_of("name==foo*"), json!({"name": {"startsWith": "foo"}}));
}

#[test]
fn lone_star_is_a_literal() {
    assert_eq!(json_of("name==*"), json!({"name": "*"}));
}

#[test]
fn quoted_strings_are_never_wildcards() {
    assert_eq!(json_of("name=='*ann*'"), json!({"name": "*ann*"}));
}

#[test]
fn string_functions_compile_directly() {
    assert_eq!(
        json_of("contains(name,'oh')"),
        json!({"name": {"contains": "oh"}})
    );
    assert_eq!(
        json_of("startswith(name,'Jo')"),
        json!({"name": {"startsWith": "Jo"}})
    );
    assert_eq!(
        json_of("endswith(name,'hn')"),
        json!({"name": {"endsWith": "hn"}})
    );
}

#[test]
fn string_functions_reject_non_string_arguments() {
    assert_eq!(kind_of("contains(name,5)"), ErrorKind::TypeCast);
}

#[test]
fn string_operators_reject_enum_fields() {
    assert_eq!(kind_of("status==*OP*"), ErrorKind::OperatorTypeMismatch);
    assert_eq!(kind_of("contains(status,'OP')"), ErrorKind::OperatorTypeMismatch);
}

#[test]
fn string_operators_reject_boolean_fields() {
    assert_eq!(kind_of("isActive==*tr*"), ErrorKind::OperatorTypeMismatch);
}

// --- relational operators ---

#[test]
fn relational_operators_use_canonical_keys() {
    assert_eq!(json_of("age>18"), json!({"age": {"gt": 18}}));
    assert_eq!(json_of("age>=18"), json!({"age": {"ge": 18}}));
    assert_eq!(json_of("age<30"), json!({"age": {"lt": 30}}));
    assert_eq!(json_of("age<=30"), json!({"age": {"le": 30}}));
}

#[test]
fn not_equal_lowers_to_a_not_wrapper() {
    assert_eq!(json_of("age!=30"), json!({"NOT": {"age": 30}}));
    assert_eq!(json_of("name ne 'John'"), json!({"NOT": {"name": "John"}}));
}

// --- membership ---

#[test]
fn in_list_validates_each_member() {
    assert_eq!(
        json_of("status=in=(OPEN,CLOSED)"),
        json!({"status": {"in": ["OPEN", "CLOSED"]}})
    );
}

#[test]
fn in_list_rejects_a_bad_member() {
    assert_eq!(kind_of("status=in=(OPEN,BAD)"), ErrorKind::EnumValueNotAllowed);
}

#[test]
fn out_list_is_not_in() {
    assert_eq!(
        json_of("status=out=(CLOSED)"),
        json!({"status": {"notIn": ["CLOSED"]}})
    );
}

#[test]
fn word_in_casts_elements() {
    assert_eq!(json_of("age in (1,2,3)"), json!({"age": {"in": [1, 2, 3]}}));
}

#[test]
fn mixed_list_types_are_rejected_before_casting() {
    let err = compile("id in (1,'x')", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MixedListType);
    assert!(err.to_string().contains("id"));
}

#[test]
fn numeric_list_members_share_one_family() {
    // Int and float literals are both numbers, as in the source language.
    assert_eq!(
        json_of("age in (1,2.5)"),
        json!({"age": {"in": [1, 2.5]}})
    );
}

// --- logic and compaction ---

#[test]
fn and_of_distinct_fields_compacts_flat() {
    assert_eq!(json_of("age==1;isActive==true"), json!({"age": 1, "isActive": true}));
}

#[test]
fn and_merges_constraints_on_one_field() {
    assert_eq!(json_of("age>18;age<30"), json!({"age": {"gt": 18, "lt": 30}}));
    assert_eq!(json_of("age>=18;age<=30"), json!({"age": {"ge": 18, "le": 30}}));
}

#[test]
fn or_is_never_compacted() {
    assert_eq!(
        json_of("age==1,isActive==true"),
        json!({"OR": [{"age": 1}, {"isActive": true}]})
    );
}

#[test]
fn or_chain_stays_n_ary() {
    assert_eq!(
        json_of("status==OPEN,status==CLOSED,age==1"),
        json!({"OR": [{"status": "OPEN"}, {"status": "CLOSED"}, {"age": 1}]})
    );
}

#[test]
fn grouped_or_splices_beside_merged_fields() {
    assert_eq!(
        json_of("(age==1,age==2);isActive==true"),
        json!({"OR": [{"age": 1}, {"age": 2}], "isActive": true})
    );
}

#[test]
fn nested_and_nesting_is_hoisted() {
    assert_eq!(
        json_of("(age>18;age<30);isActive==true"),
        json!({"age": {"gt": 18, "lt": 30}, "isActive": true})
    );
}

#[test]
fn not_wraps_compacted_children() {
    assert_eq!(
        json_of("not (age==1;isActive==true)"),
        json!({"NOT": {"age": 1, "isActive": true}})
    );
}

#[test]
fn word_surface_matches_symbolic_surface() {
    assert_eq!(
        json_of("age gt 30 and (name eq 'John' or name eq 'Jane')"),
        json!({"age": {"gt": 30}, "OR": [{"name": "John"}, {"name": "Jane"}]})
    );
}

#[test]
fn same_field_equality_is_right_biased() {
    // The original deep merge let the right branch win on a key collision.
    assert_eq!(json_of("age==1;age==2"), json!({"age": 2}));
}

// --- schema gate ---

#[test]
fn unknown_fields_fail_fast() {
    let err = compile("salary==1000", Some(&test_schema())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FieldNotAllowed);
    assert!(err.to_string().contains("salary"));
}

#[test]
fn unknown_field_fails_even_with_a_bad_value() {
    // Identifier resolution precedes value handling.
    assert_eq!(kind_of("salary==veinte"), ErrorKind::FieldNotAllowed);
}

// --- permissive mode ---

#[test]
fn without_a_schema_literals_keep_their_lexical_types() {
    let criteria = compile("age==25;name=='x';flag==true", None).unwrap();
    assert_eq!(
        criteria.to_json(),
        json!({"age": 25, "name": "x", "flag": true})
    );
}

#[test]
fn without_a_schema_any_field_is_accepted() {
    assert!(compile("anything==atAll", None).is_ok());
}

// --- malformed input ---

#[test]
fn parser_failures_surface_as_malformed_expression() {
    assert_eq!(kind_of("age=="), ErrorKind::MalformedExpression);
    assert_eq!(kind_of("(age==1"), ErrorKind::MalformedExpression);
    assert_eq!(kind_of(""), ErrorKind::MalformedExpression);
}

// --- compiler handle ---

#[test]
fn compiler_reuses_its_schema_across_calls() {
    let compiler = Compiler::with_schema(test_schema());
    assert_eq!(compiler.compile("age==1").unwrap().to_json(), json!({"age": 1}));
    assert_eq!(
        compiler.compile("status==OPEN").unwrap().to_json(),
        json!({"status": "OPEN"})
    );
    assert!(compiler.schema().is_some());
}

#[test]
fn compiler_without_schema_is_permissive() {
    let compiler = Compiler::new();
    assert!(compiler.compile("anything==1").is_ok());
}

// --- tracing ---

struct RecordingSink(Mutex<Vec<TraceEvent>>);

impl TraceSink for RecordingSink {
    fn on_event(&self, event: TraceEvent) {
        self.0.lock().unwrap().push(event);
    }
}

static OK_SINK: RecordingSink = RecordingSink(Mutex::new(Vec::new()));
static ERR_SINK: RecordingSink = RecordingSink(Mutex::new(Vec::new()));

#[test]
fn trace_events_fire_in_pipeline_order() {
    let compiler = Compiler::with_schema(test_schema()).with_trace(&OK_SINK);
    compiler.compile("age==1").unwrap();

    let events = OK_SINK.0.lock().unwrap();
    assert_eq!(
        *events,
        vec![TraceEvent::Parsed, TraceEvent::Lowered, TraceEvent::Compacted]
    );
}

#[test]
fn trace_reports_failures_with_their_kind() {
    let compiler = Compiler::with_schema(test_schema()).with_trace(&ERR_SINK);
    compiler.compile("salary==1").unwrap_err();

    let events = ERR_SINK.0.lock().unwrap();
    assert_eq!(
        events.last(),
        Some(&TraceEvent::Failed {
            kind: ErrorKind::FieldNotAllowed
        })
    );
}

// --- vocabulary invariant ---

const FIELDS: [&str; 4] = ["a", "b", "c", "d"];

fn assert_canonical_keys(value: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let known = matches!(key.as_str(), "AND" | "OR" | "NOT")
                    || FIELDS.contains(&key.as_str())
                    || CompareOp::ALL.iter().any(|op| op.key() == key);
                assert!(known, "leaked key: {key}");
                assert_canonical_keys(child);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                assert_canonical_keys(item);
            }
        }
        _ => {}
    }
}

#[test]
fn compiled_leaves_use_only_the_fixed_vocabulary() {
    let schema = Schema::new()
        .field("a", ScalarType::Number)
        .field("b", ScalarType::String)
        .field("c", ScalarType::Bool)
        .field("d", ["X", "Y"]);

    for input in [
        "a==1;b=='x'",
        "a!=1,not c==true",
        "d=in=(X,Y);a>5",
        "b==*mid*,b==pre*,b==*suf",
        "contains(b,'q') and a le 9",
    ] {
        let criteria = compile(input, Some(&schema)).unwrap();
        assert_canonical_keys(&criteria.to_json());
    }
}

// --- property tests ---

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        (-1000i64..1000).prop_map(|n| Value::Float(n as f64 / 4.0)),
        "[a-z]{0,6}".prop_map(Value::Text),
    ]
}

fn arb_op_value() -> impl Strategy<Value = OpValue> {
    prop_oneof![
        arb_value().prop_map(OpValue::Scalar),
        prop::collection::vec(arb_value(), 0..3).prop_map(OpValue::List),
    ]
}

fn arb_predicate() -> impl Strategy<Value = FieldPredicate> {
    prop_oneof![
        arb_value().prop_map(FieldPredicate::Value),
        prop::collection::btree_map(
            prop::sample::select(CompareOp::ALL.to_vec()),
            arb_op_value(),
            1..3
        )
        .prop_map(FieldPredicate::Ops),
    ]
}

fn arb_field() -> impl Strategy<Value = String> {
    prop::sample::select(FIELDS.to_vec()).prop_map(str::to_string)
}

fn arb_fields() -> impl Strategy<Value = BTreeMap<String, FieldPredicate>> {
    prop::collection::btree_map(arb_field(), arb_predicate(), 0..3)
}

fn arb_criteria() -> impl Strategy<Value = Criteria> {
    let leaf = arb_fields().prop_map(|fields| Criteria {
        fields,
        ..Criteria::default()
    });

    leaf.prop_recursive(3, 24, 3, |inner| {
        (
            prop::collection::vec(inner.clone(), 0..3),
            prop::collection::vec(inner.clone(), 0..3),
            prop::option::of(inner),
            arb_fields(),
        )
            .prop_map(|(and, or, not, fields)| Criteria {
                and,
                or,
                not: not.map(Box::new),
                fields,
            })
    })
}

proptest! {
    #[test]
    fn compaction_is_idempotent(criteria in arb_criteria()) {
        let once = compact(criteria);
        let twice = compact(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn compaction_never_invents_keys(criteria in arb_criteria()) {
        assert_canonical_keys(&compact(criteria).to_json());
    }

    #[test]
    fn compaction_preserves_or_alternative_count(children in prop::collection::vec(arb_criteria(), 2..4)) {
        let or = Criteria::or(children.clone());
        let compacted = compact(or);
        // OR is never flattened; each alternative stays distinct.
        prop_assert_eq!(compacted.or.len(), children.len());
    }
}
