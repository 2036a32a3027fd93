//! Mapping files on disk: discovery, JSON/YAML parsing and document shapes.

use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::MappingError;
use crate::normalizer::{denormalize, normalize};
use crate::stubbing::{StubImport, StubMapping};

const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// The three accepted layouts of a mapping file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    /// One stub mapping object.
    Single,
    /// `{ "mappings": [...] }`, as the server stores them.
    List,
    /// `{ "mappings": [...], "importOptions": {...} }`.
    Import,
}

impl DocumentShape {
    /// `None` when the value is none of the accepted layouts.
    pub fn detect(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        if fields.get("mappings").is_some_and(Value::is_array) {
            if fields.contains_key("importOptions") {
                Some(DocumentShape::Import)
            } else {
                Some(DocumentShape::List)
            }
        } else if fields.contains_key("request") || fields.contains_key("response") {
            Some(DocumentShape::Single)
        } else {
            None
        }
    }
}

pub fn is_yaml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml")
}

pub fn is_mapping_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext))
}

/// Parse document text; `yaml` selects the YAML parser.
pub fn parse_document(content: &str, yaml: bool) -> Result<Value, DocumentError> {
    if yaml {
        Ok(serde_yaml::from_str(content)?)
    } else {
        Ok(serde_json::from_str(content)?)
    }
}

pub fn read_document(path: &Path) -> Result<Value, DocumentError> {
    let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&content, is_yaml(path))
}

/// Mapping files under `path`, recursively, in a stable order. A file path
/// is returned as is.
pub fn mapping_files(path: &Path) -> io::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    let mut pending = vec![path.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry_path = entry?.path();
            if entry_path.is_dir() {
                pending.push(entry_path);
            } else if is_mapping_file(&entry_path) {
                files.push(entry_path);
            }
        }
    }
    files.sort();
    debug!("Found {} mapping file(s) under {}", files.len(), path.display());
    Ok(files)
}

/// Every stub mapping in a document of any accepted shape.
pub fn mappings_in(value: Value) -> Result<Vec<StubMapping>, MappingError> {
    match DocumentShape::detect(&value) {
        Some(DocumentShape::Single) => Ok(vec![denormalize(value)?]),
        Some(DocumentShape::Import) => {
            let import: StubImport = denormalize(value)?;
            Ok(import.mappings().to_vec())
        }
        Some(DocumentShape::List) => {
            let mut value = value;
            let entries = match value.get_mut("mappings").map(Value::take) {
                Some(Value::Array(entries)) => entries,
                _ => Vec::new(),
            };
            entries.into_iter().map(denormalize).collect()
        }
        None => Err(MappingError::malformed(
            "StubMapping",
            "document is neither a stub mapping nor a list of mappings",
        )),
    }
}

/// Rewrite a document in normalized form, keeping its shape.
pub fn normalize_document(value: Value) -> Result<Value, MappingError> {
    match DocumentShape::detect(&value) {
        Some(DocumentShape::Import) => normalize(&denormalize::<StubImport>(value)?),
        Some(DocumentShape::Single) => normalize(&denormalize::<StubMapping>(value)?),
        Some(DocumentShape::List) | None => {
            let mappings = mappings_in(value)?;
            let mut document = serde_json::Map::new();
            document.insert("mappings".to_string(), normalize(&mappings)?);
            Ok(Value::Object(document))
        }
    }
}
