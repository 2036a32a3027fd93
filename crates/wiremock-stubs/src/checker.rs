//! Checks mapping files against the model before they reach a server.
//!
//! Every mapping is loaded through the normalization engine exactly as a
//! client would load it. Load failures become errors, and mappings that load
//! but would be written back differently become warnings.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::document::{self, DocumentError, DocumentShape};
use crate::error::MappingError;
use crate::normalizer::{denormalize, normalize};
use crate::stubbing::{StubImportOptions, StubMapping};
use crate::types::{CheckIssue, CheckOptions, CheckResult};

/// Where each mapping id was first seen.
type SeenIds = HashMap<Uuid, (PathBuf, Option<String>)>;

fn error_code(error: &MappingError) -> &'static str {
    match error {
        MappingError::MalformedStructure { .. } | MappingError::Json(_) => "E003",
        MappingError::AmbiguousMatchingType { .. } => "E004",
        MappingError::UnsupportedBodyRepresentation { .. } => "E005",
    }
}

fn suggestion_for(error: &MappingError) -> Option<&'static str> {
    match error {
        MappingError::MalformedStructure { reason, .. } if reason.contains("'method'") => {
            Some("Set \"method\": \"ANY\" to match every method")
        }
        MappingError::AmbiguousMatchingType { .. } => {
            Some("Keep a single matching key, or combine matchers with \"and\"/\"or\"")
        }
        MappingError::UnsupportedBodyRepresentation { .. } => {
            Some("Use only one of \"body\", \"base64Body\" and \"bodyFileName\"")
        }
        _ => None,
    }
}

fn document_issue(path: &Path, error: &DocumentError) -> CheckIssue {
    match error {
        DocumentError::Read { .. } => {
            CheckIssue::error("E001", error.to_string(), path.to_path_buf())
        }
        DocumentError::Json(_) | DocumentError::Yaml(_) => {
            CheckIssue::error("E002", error.to_string(), path.to_path_buf())
                .with_suggestion("Check the file for syntax errors")
        }
    }
}

fn check_mapping(
    path: &Path,
    entry: &Value,
    location: Option<String>,
    options: &CheckOptions,
    seen: &mut SeenIds,
    result: &mut CheckResult,
) {
    let locate = |issue: CheckIssue| match &location {
        Some(location) => issue.with_location(location.clone()),
        None => issue,
    };

    let mapping: StubMapping = match denormalize(entry.clone()) {
        Ok(mapping) => mapping,
        Err(e) => {
            debug!("Rejected mapping in {}: {}", path.display(), e);
            let mut issue = locate(CheckIssue::error(
                error_code(&e),
                e.to_string(),
                path.to_path_buf(),
            ));
            if let Some(suggestion) = suggestion_for(&e) {
                issue = issue.with_suggestion(suggestion);
            }
            result.add_issue(issue);
            return;
        }
    };
    result.mappings_checked += 1;

    if let Some(id) = mapping.id() {
        if let Some((first_file, first_location)) = seen.get(&id) {
            let first = match first_location {
                Some(l) => format!("{} [{}]", first_file.display(), l),
                None => first_file.display().to_string(),
            };
            result.add_issue(
                locate(CheckIssue::warning(
                    "W002",
                    format!("Mapping id {id} is also used by {first}"),
                    path.to_path_buf(),
                ))
                .with_suggestion("Give each mapping a unique id, or drop the id"),
            );
        } else {
            seen.insert(id, (path.to_path_buf(), location.clone()));
        }
    }

    if options.report_normalization_drift {
        match normalize(&mapping) {
            Ok(normalized) if normalized != *entry => {
                result.add_issue(
                    locate(CheckIssue::warning(
                        "W001",
                        "Mapping differs from its normalized form (null, empty, defaulted or unknown fields)",
                        path.to_path_buf(),
                    ))
                    .with_suggestion("Run `wiremock-stubs normalize` on this file"),
                );
            }
            Ok(_) => {}
            Err(e) => warn!("Could not normalize mapping in {}: {}", path.display(), e),
        }
    }
}

fn check_document(
    path: &Path,
    value: &Value,
    options: &CheckOptions,
    seen: &mut SeenIds,
    result: &mut CheckResult,
) {
    match DocumentShape::detect(value) {
        Some(DocumentShape::Single) => check_mapping(path, value, None, options, seen, result),
        Some(shape) => {
            if shape == DocumentShape::Import {
                if let Some(import_options) = value.get("importOptions") {
                    if let Err(e) =
                        serde_json::from_value::<StubImportOptions>(import_options.clone())
                    {
                        result.add_issue(
                            CheckIssue::error(
                                "E003",
                                format!("Malformed StubImport: invalid field 'importOptions': {e}"),
                                path.to_path_buf(),
                            )
                            .with_location("importOptions"),
                        );
                    }
                }
            }
            let entries = value
                .get("mappings")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for (index, entry) in entries.iter().enumerate() {
                check_mapping(
                    path,
                    entry,
                    Some(format!("mappings[{index}]")),
                    options,
                    seen,
                    result,
                );
            }
        }
        None => result.add_issue(
            CheckIssue::error(
                "E003",
                "Document is neither a stub mapping nor a list of mappings",
                path.to_path_buf(),
            )
            .with_suggestion("Expected an object with \"request\"/\"response\", or with \"mappings\""),
        ),
    }
}

fn check_file_into(path: &Path, options: &CheckOptions, seen: &mut SeenIds) -> CheckResult {
    let mut result = CheckResult::new();
    result.files_checked = 1;
    match document::read_document(path) {
        Ok(value) => check_document(path, &value, options, seen, &mut result),
        Err(e) => result.add_issue(document_issue(path, &e)),
    }
    result
}

/// Check a single mapping file (JSON or YAML, by extension).
pub fn check_file(path: &Path, options: &CheckOptions) -> CheckResult {
    check_file_into(path, options, &mut SeenIds::new())
}

/// Check every mapping file under `path`, recursively. Duplicate ids are
/// detected across files.
pub fn check_directory(path: &Path, options: &CheckOptions) -> CheckResult {
    let mut result = CheckResult::new();
    let files = match document::mapping_files(path) {
        Ok(files) => files,
        Err(e) => {
            result.add_issue(CheckIssue::error(
                "E001",
                format!("Failed to read directory: {e}"),
                path.to_path_buf(),
            ));
            return result;
        }
    };

    let mut seen = SeenIds::new();
    for file in files {
        result.merge(check_file_into(&file, options, &mut seen));
    }
    result
}

/// Check a JSON string directly.
pub fn check_json(json: &str, source_name: &str, options: &CheckOptions) -> CheckResult {
    let path = Path::new(source_name);
    match document::parse_document(json, false) {
        Ok(value) => check_value(&value, source_name, options),
        Err(e) => {
            let mut result = CheckResult::new();
            result.files_checked = 1;
            result.add_issue(document_issue(path, &e));
            result
        }
    }
}

/// Check an already parsed document.
pub fn check_value(value: &Value, source_name: &str, options: &CheckOptions) -> CheckResult {
    let mut result = CheckResult::new();
    result.files_checked = 1;
    check_document(
        Path::new(source_name),
        value,
        options,
        &mut SeenIds::new(),
        &mut result,
    );
    result
}
