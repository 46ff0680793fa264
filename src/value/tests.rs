use super::*;
use serde_json::json;

#[test]
fn test_dotted_and_bracket_paths_are_equivalent() {
    let root = json!({"a": {"b": [0, 1, 2, {"c": "deep"}]}});
    assert_eq!(resolve_path(&root, "a.b[3].c"), Some(&json!("deep")));
    assert_eq!(resolve_path(&root, "a.b.3.c"), Some(&json!("deep")));
}

#[test]
fn test_resolve_array_item_field() {
    let attributes = json!({"items": [{"name": "x"}]});
    assert_eq!(resolve_path(&attributes, "items[0].name"), Some(&json!("x")));
}

#[test]
fn test_missing_intermediate_is_absent() {
    let attributes = json!({"items": [{"name": "x"}]});
    assert_eq!(resolve_path(&attributes, "missing.x"), None);
    assert_eq!(resolve_path(&attributes, "items[5].name"), None);
    assert_eq!(resolve_path(&attributes, "items[0].name.deeper"), None);
}

#[test]
fn test_unparsable_path_is_absent() {
    let attributes = json!({"items": [1, 2]});
    assert_eq!(parse_path("items[1"), None);
    assert_eq!(parse_path("items]"), None);
    assert_eq!(resolve_path(&attributes, "items[1"), None);
}

#[test]
fn test_empty_segments_are_skipped() {
    assert_eq!(
        parse_path("a..b."),
        Some(vec![Segment::Key("a".to_string()), Segment::Key("b".to_string())])
    );
}

#[test]
fn test_quoted_bracket_key() {
    let root = json!({"map": {"living room": 21}});
    assert_eq!(resolve_path(&root, "map['living room']"), Some(&json!(21)));
}

#[test]
fn test_coerce_number_is_permissive() {
    assert_eq!(coerce_number(&json!(7)), Some(7.0));
    assert_eq!(coerce_number(&json!("21,5")), Some(21.5));
    assert_eq!(coerce_number(&json!("21.5 °C")), Some(21.5));
    assert_eq!(coerce_number(&json!(" -3 ")), Some(-3.0));
    assert_eq!(coerce_number(&json!(".5")), Some(0.5));
    assert_eq!(coerce_number(&json!("1e3W")), Some(1000.0));
    assert_eq!(coerce_number(&json!(true)), Some(1.0));
}

#[test]
fn test_coerce_number_rejects_non_numeric() {
    assert_eq!(coerce_number(&json!("on")), None);
    assert_eq!(coerce_number(&json!("")), None);
    assert_eq!(coerce_number(&json!("-")), None);
    assert_eq!(coerce_number(&json!(null)), None);
    assert_eq!(coerce_number(&json!({"a": 1})), None);
}

#[test]
fn test_strict_number() {
    assert_eq!(strict_number(&json!("21.50")), Some(21.5));
    assert_eq!(strict_number(&json!(" 4 ")), Some(4.0));
    assert_eq!(strict_number(&json!("1e2")), Some(100.0));
    assert_eq!(strict_number(&json!("21.5 °C")), None);
    assert_eq!(strict_number(&json!("inf")), None);
    assert_eq!(strict_number(&json!("NaN")), None);
    assert_eq!(strict_number(&json!("")), None);
    assert_eq!(strict_number(&json!(true)), None);
}

#[test]
fn test_display_string() {
    assert_eq!(display_string(&json!("on")), "on");
    assert_eq!(display_string(&json!(10)), "10");
    assert_eq!(display_string(&json!(10.0)), "10");
    assert_eq!(display_string(&json!(2.5)), "2.5");
    assert_eq!(display_string(&json!(false)), "false");
    assert_eq!(display_string(&json!({"a": 1})), r#"{"a":1}"#);
    assert_eq!(display_string(&json!([1, "b"])), r#"[1,"b"]"#);
}
