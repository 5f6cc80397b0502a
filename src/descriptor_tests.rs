use super::*;
use serde_json::json;

fn read_text(name: &str, contents: &str) -> Result<ParsedDescriptor, ReadError> {
    let temp = tempfile::tempdir().expect("create temp dir");
    let path = temp.path().join(name);
    fs::write(&path, contents).expect("write descriptor");
    let fields = FieldNames::default();
    DescriptorReader::new(&fields).read(&path)
}

fn from_json(value: Value) -> Result<ParsedDescriptor, ReadError> {
    let fields = FieldNames::default();
    DescriptorReader::new(&fields).parse_value(Path::new("resources/price.json"), value)
}

#[test]
fn reads_all_declared_fields() {
    let parsed = read_text(
        "a.json",
        r#"{"target_field":"price_kg","source_fields":["qty","unit"],"title":"Price","extra":1}"#,
    )
    .expect("read");
    assert_eq!(parsed.target_field, "price_kg");
    assert_eq!(parsed.source_fields, vec!["qty", "unit"]);
    assert_eq!(parsed.title, "Price");
    assert!(parsed.channels.is_empty());
}

#[test]
fn missing_keys_fall_back_to_defaults() {
    let parsed = from_json(json!({})).expect("parse");
    assert_eq!(parsed.target_field, "");
    assert!(!parsed.has_target());
    assert!(parsed.source_fields.is_empty());
    assert_eq!(parsed.title, "price");
}

#[test]
fn missing_source_fields_is_an_empty_list() {
    let parsed = from_json(json!({"target_field": "weight", "title": "W"})).expect("parse");
    assert!(parsed.source_fields.is_empty());
}

#[test]
fn singular_source_field_alias_is_accepted() {
    let parsed = from_json(json!({"target_field": "t", "source_field": "only"})).expect("parse");
    assert_eq!(parsed.source_fields, vec!["only"]);

    let parsed =
        from_json(json!({"target_field": "t", "source_field": ["a", "b"]})).expect("parse");
    assert_eq!(parsed.source_fields, vec!["a", "b"]);
}

#[test]
fn primary_source_key_wins_over_alias() {
    let parsed = from_json(json!({
        "target_field": "t",
        "source_fields": ["primary"],
        "source_field": "legacy"
    }))
    .expect("parse");
    assert_eq!(parsed.source_fields, vec!["primary"]);
}

#[test]
fn custom_field_names_are_honored() {
    let fields = FieldNames {
        target_field: "output".to_string(),
        source_fields: "inputs".to_string(),
        source_field_aliases: Vec::new(),
        title: "name".to_string(),
        channels: "markets".to_string(),
    };
    let parsed = DescriptorReader::new(&fields)
        .parse_value(
            Path::new("x.json"),
            json!({"output": "o", "inputs": ["i"], "name": "N", "markets": ["de"]}),
        )
        .expect("parse");
    assert_eq!(parsed.target_field, "o");
    assert_eq!(parsed.source_fields, vec!["i"]);
    assert_eq!(parsed.title, "N");
    assert!(parsed.is_member_of("DE"));
}

#[test]
fn syntax_error_is_a_parse_error_with_path() {
    let err = read_text("broken.json", "{not json").expect_err("syntax error");
    assert!(matches!(err, ReadError::Parse { .. }));
    assert!(err.path().ends_with("broken.json"));
}

#[test]
fn missing_file_is_an_io_error() {
    let fields = FieldNames::default();
    let err = DescriptorReader::new(&fields)
        .read(Path::new("/definitely/not/here.json"))
        .expect_err("missing file");
    assert!(matches!(err, ReadError::Io { .. }));
}

#[test]
fn wrong_types_are_malformed() {
    assert!(matches!(
        from_json(json!(["not", "an", "object"])),
        Err(ReadError::Malformed { .. })
    ));
    assert!(matches!(
        from_json(json!({"target_field": 3})),
        Err(ReadError::Malformed { .. })
    ));
    assert!(matches!(
        from_json(json!({"target_field": "t", "source_fields": ["ok", 1]})),
        Err(ReadError::Malformed { .. })
    ));
    assert!(matches!(
        from_json(json!({"target_field": "t", "channels": "DE"})),
        Err(ReadError::Malformed { .. })
    ));
}

#[test]
fn null_title_defaults_to_file_stem() {
    let parsed = from_json(json!({"target_field": "t", "title": null})).expect("parse");
    assert_eq!(parsed.title, "price");
}
