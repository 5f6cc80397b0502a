use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directory");
    }
    fs::write(path, contents).expect("write file");
}

fn extraction_tree() -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_file(
        temp.path(),
        "extract/resources/a.json",
        r#"{"target_field":"price_kg","source_fields":["qty","unit"],"title":"Price"}"#,
    );
    write_file(
        temp.path(),
        "extract/resources_DE/b.json",
        r#"{"target_field":"price_kg","source_fields":["weight"],"title":"Price"}"#,
    );
    write_file(
        temp.path(),
        "extract/resources_ES/nested/c.json",
        r#"{"target_field":"volume_l","source_field":"litres"}"#,
    );
    write_file(temp.path(), "extract/resources_ES/broken.json", "{");
    temp
}

fn tfx(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tfx"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("run tfx")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn audit_all_json_merges_channels() {
    let temp = extraction_tree();
    let root = temp.path().join("extract");
    let output = tfx(&[
        "audit",
        "--root",
        root.to_str().expect("utf-8 path"),
        "--channel",
        "all",
        "--json",
    ]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        stdout_json(&output),
        serde_json::json!({
            "price_kg": {
                "Price": {"source_fields": ["weight"], "file_name": "resources_DE/b.json"}
            },
            "volume_l": {
                "c": {"source_fields": ["litres"], "file_name": "resources_ES/nested/c.json"}
            }
        })
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("broken.json"), "skipped file not reported: {stderr}");
}

#[test]
fn find_prints_text_summary() {
    let temp = extraction_tree();
    let root = temp.path().join("extract");
    let output = tfx(&[
        "find",
        "--root",
        root.to_str().expect("utf-8 path"),
        "--target-field",
        "price_kg",
        "--channel",
        "global,DE",
    ]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("channels: global, DE"));
    assert!(stdout.contains("  - Price [DE, global]"));
    assert!(stdout.contains("file: resources/a.json"));
}

#[test]
fn find_without_match_exits_with_not_found_status() {
    let temp = extraction_tree();
    let root = temp.path().join("extract");
    let output = tfx(&[
        "find",
        "--root",
        root.to_str().expect("utf-8 path"),
        "--target-field",
        "nonexistent_field",
    ]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nonexistent_field"));
}

#[test]
fn file_output_is_byte_identical_across_runs() {
    let temp = extraction_tree();
    let root = temp.path().join("extract");
    let out_dir = temp.path().join("reports");
    let args = [
        "audit",
        "--root",
        root.to_str().expect("utf-8 path"),
        "--channel",
        "all",
        "--output",
        "file",
        "--out-dir",
        out_dir.to_str().expect("utf-8 path"),
    ];
    let mapping = out_dir.join("target_fields_mapping_all.json");

    assert!(tfx(&args).status.success());
    let first = fs::read(&mapping).expect("read first mapping");
    assert!(tfx(&args).status.success());
    let second = fs::read(&mapping).expect("read second mapping");
    assert_eq!(first, second);

    let parsed: serde_json::Value = serde_json::from_slice(&first).expect("mapping is JSON");
    assert!(parsed.get("price_kg").is_some());
}

#[test]
fn config_file_changes_field_names_and_aliases() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_file(
        temp.path(),
        "extract/resources/a.json",
        r#"{"output":"total","inputs":["x"],"title":"Total"}"#,
    );
    write_file(
        temp.path(),
        "config.json",
        r#"{
            "channels": [
                {"name": "global", "directory": "resources"},
                {"name": "AT", "alias_of": "global"}
            ],
            "fields": {"target_field": "output", "source_fields": "inputs"}
        }"#,
    );
    let root = temp.path().join("extract");
    let config = temp.path().join("config.json");
    let output = tfx(&[
        "find",
        "--root",
        root.to_str().expect("utf-8 path"),
        "--target-field",
        "total",
        "--channel",
        "at",
        "--config",
        config.to_str().expect("utf-8 path"),
        "--json",
    ]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        stdout_json(&output)["total"]["Total"]["source_fields"],
        serde_json::json!(["x"])
    );
}

#[test]
fn missing_root_is_fatal() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path().join("absent");
    let output = tfx(&["audit", "--root", root.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(1));
}
