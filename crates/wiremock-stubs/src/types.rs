//! Report types produced by the mapping checker.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Severity level of a check issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The mapping cannot be loaded by the server.
    Error,
    /// The mapping loads, but not in the form written.
    Warning,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// A single issue found in a mapping file.
#[derive(Debug, Clone, Serialize)]
pub struct CheckIssue {
    pub severity: Severity,
    /// Issue code, e.g. "E003" or "W001".
    pub code: String,
    pub message: String,
    #[serde(serialize_with = "serialize_path")]
    pub file: PathBuf,
    /// Location within the document, e.g. "mappings[2]".
    pub location: Option<String>,
    pub suggestion: Option<String>,
}

fn serialize_path<S>(path: &Path, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&path.to_string_lossy())
}

impl CheckIssue {
    pub fn error(code: impl Into<String>, message: impl Into<String>, file: PathBuf) -> Self {
        Self {
            severity: Severity::Error,
            code: code.into(),
            message: message.into(),
            file,
            location: None,
            suggestion: None,
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>, file: PathBuf) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.into(),
            message: message.into(),
            file,
            location: None,
            suggestion: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Result of checking one or more mapping files.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub issues: Vec<CheckIssue>,
    pub files_checked: usize,
    /// Stub mappings that loaded successfully.
    pub mappings_checked: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl CheckResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(&mut self, issue: CheckIssue) {
        match issue.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
        }
        self.issues.push(issue);
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings > 0
    }

    /// No errors; warnings are allowed.
    pub fn is_valid(&self) -> bool {
        self.errors == 0
    }

    pub fn merge(&mut self, other: CheckResult) {
        self.issues.extend(other.issues);
        self.files_checked += other.files_checked;
        self.mappings_checked += other.mappings_checked;
        self.errors += other.errors;
        self.warnings += other.warnings;
    }
}

/// Options for checking.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Report mappings whose normalized form differs from the file (W001).
    pub report_normalization_drift: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            report_normalization_drift: true,
        }
    }
}
