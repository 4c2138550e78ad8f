use deepcompare as dc;
use deepcompare::{Compare, CompareError, CompareOptions, Decimal, TypeKey, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

fn report(first: Value, second: Value) -> String {
    match dc::compare(first, second) {
        Err(CompareError::NotEqual { message }) => message,
        other => panic!("expected a difference, got {other:?}"),
    }
}

fn dec(s: &str) -> Value {
    Value::Decimal(s.parse::<Decimal>().unwrap())
}

#[test]
fn test_sets_list_members_on_each_side() {
    let out = report(Value::set([1, 2]), Value::set([2, 3]));
    assert_eq!(
        out,
        "set not as expected:\n\n\
         in first but not second:\n[1]\n\n\
         in second but not first:\n[3]"
    );
}

#[test]
fn test_sequences_show_common_prefix_then_tails() {
    let out = report(Value::from(json!([1, 2, 3])), Value::from(json!([1, 2, 4])));
    assert_eq!(
        out,
        "sequence not as expected:\n\n\
         same:\n[1, 2]\n\n\
         first:\n[3]\n\n\
         second:\n[4]"
    );
}

#[test]
fn test_maps_partition_keys() {
    let out = report(
        Value::from(json!({"x": 1, "y": 2, "a": 4})),
        Value::from(json!({"x": 1, "z": 3, "a": 5})),
    );
    assert_eq!(
        out,
        "map not as expected:\n\n\
         same:\n['x']\n\n\
         in first but not second:\n'y': 2\n\n\
         in second but not first:\n'z': 3\n\n\
         values differ:\n'a': 4 != 5"
    );
}

#[test]
fn test_multiline_text_gets_unified_diff() {
    let out = report(
        Value::text("line one\nline two\nline three"),
        Value::text("line one\nline 2\nline three"),
    );
    assert_eq!(
        out,
        "\n--- first\n+++ second\n@@ -1,3 +1,3 @@\n line one\n-line two\n+line 2\n line three"
    );
}

#[test]
fn test_round_comparison_matches_within_precision() {
    dc::compare(dc::RoundComparison::new(1234.5678, 2), 1234.5681).unwrap();
    assert!(dc::compare(dc::RoundComparison::new(1234.5678, 2), 1234.5).is_err());
}

#[test]
fn test_decimals_compare_exactly_by_default() {
    let out = report(dec("2.001"), dec("2.009"));
    assert_eq!(out, "Decimal('2.001') != Decimal('2.009')");
}

#[test]
fn test_rounding_comparer_reads_precision_option() {
    let cmp = Compare::new().comparer(TypeKey::Decimal, dc::comparers::builtins::compare_rounded);
    let out = cmp.describe(&dec("2.001"), &dec("2.009")).unwrap();
    assert_eq!(
        out.as_deref(),
        Some("Decimal('2.001') != Decimal('2.009') when rounded to 2 decimal places")
    );
    assert_eq!(cmp.describe(&dec("2.001"), &dec("2.004")).unwrap(), None);
    let coarse = cmp.precision(1);
    assert_eq!(coarse.describe(&dec("2.001"), &dec("2.009")).unwrap(), None);
}

#[test]
fn test_nested_paths_are_reported() {
    let out = report(
        Value::from(json!([{"text": "a"}, {"text": "b", "n": 1}])),
        Value::from(json!([{"text": "a"}, {"text": "c", "n": 1}])),
    );
    assert_eq!(
        out,
        "sequence not as expected:\n\n\
         same:\n[{'text': 'a'}]\n\n\
         first:\n[{'n': 1, 'text': 'b'}]\n\n\
         second:\n[{'n': 1, 'text': 'c'}]\n\n\
         While comparing [1]: map not as expected:\n\n\
         same:\n['n']\n\n\
         values differ:\n'text': 'b' != 'c'\n\n\
         While comparing [1]['text']: 'b' != 'c'"
    );
}

#[test]
fn test_recursive_off_drops_nested_blocks() {
    let out = Compare::new()
        .recursive(false)
        .describe(
            &Value::from(json!([{"text": "a"}])),
            &Value::from(json!([{"text": "b"}])),
        )
        .unwrap()
        .unwrap();
    assert!(!out.contains("While comparing"));
    assert!(out.starts_with("sequence not as expected:"));
}

#[test]
fn test_objects_compare_attributes() {
    let out = report(
        Value::object("Person", [("name", Value::text("Alice")), ("age", Value::Int(30))]),
        Value::object(
            "Person",
            [
                ("name", Value::text("Alice")),
                ("age", Value::Int(31)),
                ("email", Value::text("x")),
            ],
        ),
    );
    assert_eq!(
        out,
        "Person not as expected:\n\n\
         attributes same:\n['name']\n\n\
         attributes in second but not first:\n'email': 'x'\n\n\
         attributes differ:\n'age': 30 != 31"
    );
}

#[test]
fn test_nested_objects_use_attribute_paths() {
    let home = |city: &str| Value::object("Address", [("city", city)]);
    let out = report(
        Value::object("Person", [("home", home("Paris"))]),
        Value::object("Person", [("home", home("Rome"))]),
    );
    assert!(out.contains("\n\nWhile comparing .home: Address not as expected:"), "{out}");
    assert!(out.contains("\n\nWhile comparing .home.city: 'Paris' != 'Rome'"), "{out}");
}

#[test]
fn test_objects_of_different_types_fall_back_to_repr() {
    let out = report(
        Value::object("Cat", [("name", "Tom")]),
        Value::object("Dog", [("name", "Tom")]),
    );
    assert_eq!(out, "<Cat name='Tom'> != <Dog name='Tom'>");
}

#[test]
fn test_records_compare_fields() {
    let out = report(
        Value::record("Point", [("x", 1), ("y", 2)]),
        Value::record("Point", [("x", 1), ("y", 3)]),
    );
    assert_eq!(
        out,
        "Point not as expected:\n\nsame:\n['x']\n\nvalues differ:\n'y': 2 != 3"
    );
}

#[test]
fn test_records_with_different_fields_fall_back_to_repr() {
    let out = report(
        Value::record("Point", [("x", 1), ("y", 2)]),
        Value::record("Point", [("x", 1), ("z", 2)]),
    );
    assert_eq!(out, "Point(x=1, y=2) != Point(x=1, z=2)");
}

#[test]
fn test_generators_are_materialised_before_comparing() {
    let lazy = Value::generator((1..=3).map(Value::Int));
    dc::compare(lazy, Value::list([1, 2, 3])).unwrap();

    let out = report(
        Value::generator((1..=3).map(Value::Int)),
        Value::generator([1, 2, 5].into_iter().map(Value::Int)),
    );
    assert!(out.starts_with("sequence not as expected:\n\nsame:\n[1, 2]"), "{out}");
}

#[test]
fn test_strict_descends_into_containers() {
    let out = Compare::new()
        .strict(true)
        .describe(&Value::list([1]), &Value::list([1.0]))
        .unwrap()
        .unwrap();
    assert_eq!(
        out,
        "sequence not as expected:\n\n\
         same:\n[]\n\n\
         first:\n[1]\n\n\
         second:\n[1.0]\n\n\
         While comparing [0]: 1 (int) != 1.0 (float)"
    );
}

#[test]
fn test_expected_actual_labels_sections_and_values() {
    let err = Compare::new()
        .expected(json!({"a": 4, "b": 1}))
        .actual(json!({"a": 5, "c": 1}))
        .check()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "map not as expected:\n\n\
         in expected but not actual:\n'b': 1\n\n\
         in actual but not expected:\n'c': 1\n\n\
         values differ:\n'a': 4 (expected) != 5 (actual)"
    );
}

#[test]
fn test_unequal_values_with_identical_repr() {
    let out = report(Value::Float(f64::NAN), Value::Float(f64::NAN));
    assert_eq!(out, "Both first and second appear as NaN, but are not equal!");
}

#[test]
fn test_null_only_equals_null() {
    dc::compare(Value::Null, Value::Null).unwrap();
    assert_eq!(report(Value::Null, Value::Int(0)), "null != 0");
}

#[test]
fn test_options_loaded_from_json() {
    let options = CompareOptions::from_json(r#"{"strict": true}"#).unwrap();
    let err = dc::compare_with(1, 1.0, options).unwrap_err();
    assert_eq!(err.to_string(), "1 (int) != 1.0 (float)");
}

#[test]
fn test_reflexive_on_deep_copies() {
    let v = Value::from(json!({
        "headers": {"method": "GET", "tags": ["a", "b"]},
        "body": [1, 2.5, null, true, {"x": "y"}]
    }));
    dc::compare(v.clone(), v).unwrap();
}

fn nested(depth: usize, leaf: i64) -> Value {
    (0..depth).fold(Value::Int(leaf), |inner, _| Value::list([inner]))
}

#[test]
fn test_deep_nesting_hits_depth_limit() {
    let err = dc::compare(nested(3000, 1), nested(3000, 2)).unwrap_err();
    assert!(matches!(err, CompareError::TooDeep { depth: 256, .. }), "{err:?}");

    let err = dc::compare(nested(3000, 1), nested(3000, 1)).unwrap_err();
    assert!(matches!(err, CompareError::TooDeep { depth: 256, .. }), "{err:?}");
}

#[test]
fn test_nesting_within_depth_limit_compares_normally() {
    dc::compare(nested(200, 1), nested(200, 1)).unwrap();
    let out = report(nested(200, 1), nested(200, 2));
    assert!(out.starts_with("sequence not as expected:"), "{out}");
}

#[test]
fn test_sets_of_partly_orderable_members() {
    let first = Value::set([
        Value::list([Value::Int(1), Value::text("a")]),
        Value::list([0]),
        Value::list([1, 2]),
    ]);
    let out = report(first, Value::set([99]));
    assert!(out.starts_with("set not as expected:"), "{out}");
    assert!(out.ends_with("in second but not first:\n[99]"), "{out}");
}

#[test]
fn test_strict_shows_types_only_for_equal_values() {
    let out = Compare::new()
        .strict(true)
        .describe(&Value::list([1]), &Value::tuple([1, 2]))
        .unwrap()
        .unwrap();
    assert_eq!(out, "[1] != (1, 2)");

    let err = dc::compare_with(1, 2.0, CompareOptions::from_json(r#"{"strict": true}"#).unwrap())
        .unwrap_err();
    assert_eq!(err.to_string(), "1 != 2.0");
}

#[test]
fn test_decimal_equals_float_through_f64() {
    dc::compare(dec("0.1"), 0.1).unwrap();
    dc::compare(dec("2.50"), 2.5).unwrap();
    assert_eq!(report(dec("0.3333"), Value::Float(1.0 / 3.0)), "Decimal('0.3333') != 0.3333333333333333");
}
