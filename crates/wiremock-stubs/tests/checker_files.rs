//! Mapping files on disk: checking, normalizing and bundling.

use std::fs;
use std::path::Path;

use serde_json::json;
use tempfile::tempdir;
use wiremock_stubs::document::{mapping_files, mappings_in, normalize_document, read_document};
use wiremock_stubs::stubbing::StubImportBuilder;
use wiremock_stubs::{check_directory, check_file, normalize, CheckOptions, Severity};

const CLEAN: &str = r#"{
  "request": {"method": "GET", "urlPath": "/health"},
  "response": {"status": 200, "body": "ok"}
}"#;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn codes(result: &wiremock_stubs::CheckResult) -> Vec<&str> {
    result.issues.iter().map(|i| i.code.as_str()).collect()
}

#[test]
fn clean_directory_passes() {
    let dir = tempdir().unwrap();
    write(dir.path(), "health.json", CLEAN);
    write(
        dir.path(),
        "nested/orders.yaml",
        "request:\n  method: POST\n  url: /orders\nresponse:\n  status: 201\n",
    );
    write(dir.path(), "README.txt", "not a mapping");

    let result = check_directory(dir.path(), &CheckOptions::default());
    assert!(result.is_valid(), "issues: {:?}", result.issues);
    assert_eq!(result.files_checked, 2);
    assert_eq!(result.mappings_checked, 2);
}

#[test]
fn syntax_and_model_errors_are_reported_per_file() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a_broken.json", "{ \"request\": ");
    write(
        dir.path(),
        "b_ambiguous.json",
        r#"{"request": {"method": "GET", "url": "/a", "urlPattern": "/a.*"}, "response": {}}"#,
    );
    write(
        dir.path(),
        "c_no_method.json",
        r#"{"request": {"url": "/a"}, "response": {"status": 200}}"#,
    );

    let result = check_directory(dir.path(), &CheckOptions::default());
    assert_eq!(result.errors, 3);
    assert_eq!(codes(&result), vec!["E002", "E004", "E003"]);
    assert!(result.issues[2]
        .suggestion
        .as_deref()
        .is_some_and(|s| s.contains("ANY")));
}

#[test]
fn duplicate_ids_across_files_warn() {
    let dir = tempdir().unwrap();
    let id = "5b1f6f2e-9a53-4c43-8d3f-7c1c1a0f1b2a";
    let mapping = json!({
        "id": id,
        "request": {"method": "GET", "url": "/a"},
        "response": {"status": 200}
    });
    write(dir.path(), "one.json", &mapping.to_string());
    write(
        dir.path(),
        "two.json",
        &json!({"mappings": [mapping]}).to_string(),
    );

    let result = check_directory(dir.path(), &CheckOptions::default());
    assert_eq!(codes(&result), vec!["W002"]);
    let issue = &result.issues[0];
    assert_eq!(issue.severity, Severity::Warning);
    assert_eq!(issue.location.as_deref(), Some("mappings[0]"));
    assert!(issue.message.contains("one.json"));
}

#[test]
fn drift_is_reported_unless_allowed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drift.json");
    fs::write(
        &path,
        r#"{"request": {"method": "GET", "url": "/a", "headers": {}}, "response": {}, "uuid": "x"}"#,
    )
    .unwrap();

    let result = check_file(&path, &CheckOptions::default());
    assert_eq!(codes(&result), vec!["W001"]);
    assert!(!result.has_errors());

    let allowed = CheckOptions {
        report_normalization_drift: false,
    };
    assert!(check_file(&path, &allowed).is_valid());
}

#[test]
fn missing_path_is_a_read_error() {
    let dir = tempdir().unwrap();
    let result = check_file(&dir.path().join("absent.json"), &CheckOptions::default());
    assert_eq!(codes(&result), vec!["E001"]);
}

#[test]
fn normalized_yaml_file_passes_the_check() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stub.yml");
    fs::write(
        &path,
        "request:\n  method: GET\n  url: /a\n  cookies: {}\nresponse:\n  headers:\n    Vary: [Accept]\n",
    )
    .unwrap();

    let normalized = normalize_document(read_document(&path).unwrap()).unwrap();
    assert_eq!(
        normalized,
        json!({
            "request": {"method": "GET", "url": "/a"},
            "response": {"status": 200, "headers": {"Vary": ["Accept"]}}
        })
    );

    fs::write(&path, serde_yaml::to_string(&normalized).unwrap()).unwrap();
    assert!(check_file(&path, &CheckOptions::default()).is_valid());
}

#[test]
fn directory_bundles_into_one_import() {
    let dir = tempdir().unwrap();
    write(dir.path(), "b.json", CLEAN);
    write(
        dir.path(),
        "a.json",
        r#"{"mappings": [
            {"request": {"method": "PUT", "url": "/x"}, "response": {"status": 204}},
            {"request": {"method": "DELETE", "url": "/x"}, "response": {"status": 204}}
        ]}"#,
    );

    let files = mapping_files(dir.path()).unwrap();
    assert_eq!(files.len(), 2);

    let mut builder = StubImportBuilder::new().delete_all_existing_stubs_not_in_import();
    for file in &files {
        for mapping in mappings_in(read_document(file).unwrap()).unwrap() {
            builder = builder.stub_mapping(mapping);
        }
    }
    let wire = normalize(&builder.build().unwrap()).unwrap();

    let methods: Vec<&str> = wire["mappings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["request"]["method"].as_str().unwrap())
        .collect();
    assert_eq!(methods, vec!["PUT", "DELETE", "GET"]);
    assert_eq!(
        wire["importOptions"],
        json!({"duplicatePolicy": "OVERWRITE", "deleteAllNotInImport": true})
    );
}
