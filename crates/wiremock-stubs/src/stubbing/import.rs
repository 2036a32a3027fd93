use serde::{Deserialize, Serialize};

use crate::error::MappingError;
use crate::normalizer::{deserialize_via_denormalize, Denormalize, FieldReader, Structure};
use crate::stubbing::{MappingBuilder, StubMapping};

/// What the server does with an imported mapping whose id already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DuplicatePolicy {
    #[default]
    Overwrite,
    Ignore,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StubImportOptions {
    pub duplicate_policy: DuplicatePolicy,
    pub delete_all_not_in_import: bool,
}

/// Body of `POST /__admin/mappings/import`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StubImport {
    mappings: Vec<StubMapping>,
    import_options: StubImportOptions,
}

impl StubImport {
    pub fn new(mappings: Vec<StubMapping>, import_options: StubImportOptions) -> Self {
        Self {
            mappings,
            import_options,
        }
    }

    pub fn mappings(&self) -> &[StubMapping] {
        &self.mappings
    }

    pub fn import_options(&self) -> StubImportOptions {
        self.import_options
    }
}

impl Denormalize for StubImport {
    const ENTITY: &'static str = "StubImport";

    fn from_structure(structure: Structure) -> Result<Self, MappingError> {
        let mut fields = FieldReader::new(Self::ENTITY, structure);
        let import = StubImport {
            mappings: fields.entity_list("mappings")?.unwrap_or_default(),
            import_options: fields.optional("importOptions")?.unwrap_or_default(),
        };
        fields.finish();
        Ok(import)
    }
}

deserialize_via_denormalize!(StubImport);

#[derive(Debug, Clone)]
enum ImportEntry {
    Builder(MappingBuilder),
    Built(StubMapping),
}

/// Collects mappings for a bulk import, in the order they are added.
/// Defaults to overwriting duplicates and keeping stubs that are not part of
/// the import.
#[derive(Debug, Clone, Default)]
pub struct StubImportBuilder {
    entries: Vec<ImportEntry>,
    options: StubImportOptions,
}

impl StubImportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stub(mut self, mapping: MappingBuilder) -> Self {
        self.entries.push(ImportEntry::Builder(mapping));
        self
    }

    /// Add an already built mapping, e.g. one read from a file.
    pub fn stub_mapping(mut self, mapping: StubMapping) -> Self {
        self.entries.push(ImportEntry::Built(mapping));
        self
    }

    pub fn ignore_existing(mut self) -> Self {
        self.options.duplicate_policy = DuplicatePolicy::Ignore;
        self
    }

    pub fn overwrite_existing(mut self) -> Self {
        self.options.duplicate_policy = DuplicatePolicy::Overwrite;
        self
    }

    pub fn delete_all_existing_stubs_not_in_import(mut self) -> Self {
        self.options.delete_all_not_in_import = true;
        self
    }

    pub fn do_not_delete_existing_stubs(mut self) -> Self {
        self.options.delete_all_not_in_import = false;
        self
    }

    pub fn build(self) -> Result<StubImport, MappingError> {
        let mappings = self
            .entries
            .into_iter()
            .map(|entry| match entry {
                ImportEntry::Builder(builder) => builder.build(),
                ImportEntry::Built(mapping) => Ok(mapping),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StubImport::new(mappings, self.options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{RequestPatternBuilder, UrlMatchingStrategy, UrlMatchingType};
    use crate::normalizer::{denormalize, normalize};
    use serde_json::json;

    fn url(path: &str) -> UrlMatchingStrategy {
        UrlMatchingStrategy::new(UrlMatchingType::Url, path)
    }

    #[test]
    fn test_default_options() {
        let import = StubImportBuilder::new().build().unwrap();
        assert_eq!(
            normalize(&import).unwrap(),
            json!({
                "mappings": [],
                "importOptions": {"duplicatePolicy": "OVERWRITE", "deleteAllNotInImport": false}
            })
        );
    }

    #[test]
    fn test_document_shape_and_round_trip() {
        let import = StubImportBuilder::new()
            .stub(MappingBuilder::new(
                RequestPatternBuilder::any_request().with_method("DELETE"),
            ))
            .ignore_existing()
            .delete_all_existing_stubs_not_in_import()
            .build()
            .unwrap();
        let wire = normalize(&import).unwrap();
        assert_eq!(
            wire,
            json!({
                "mappings": [{"request": {"method": "DELETE"}, "response": {"status": 200}}],
                "importOptions": {"duplicatePolicy": "IGNORE", "deleteAllNotInImport": true}
            })
        );
        assert_eq!(denormalize::<StubImport>(wire).unwrap(), import);
    }

    #[test]
    fn test_mixed_entries_keep_insertion_order() {
        let loaded = MappingBuilder::new(RequestPatternBuilder::new("GET", url("/loaded")))
            .build()
            .unwrap();
        let import = StubImportBuilder::new()
            .stub(MappingBuilder::new(RequestPatternBuilder::new("GET", url("/first"))))
            .stub_mapping(loaded)
            .stub(MappingBuilder::new(RequestPatternBuilder::new("GET", url("/last"))))
            .build()
            .unwrap();

        let urls: Vec<&str> = import
            .mappings()
            .iter()
            .filter_map(|m| m.request().url_matching_strategy())
            .map(|strategy| strategy.matching_value())
            .collect();
        assert_eq!(urls, vec!["/first", "/loaded", "/last"]);
    }

    #[test]
    fn test_unknown_policy_is_malformed() {
        let err = denormalize::<StubImport>(json!({
            "mappings": [],
            "importOptions": {"duplicatePolicy": "MERGE", "deleteAllNotInImport": false}
        }))
        .unwrap_err();
        assert!(matches!(err, MappingError::MalformedStructure { .. }));
    }
}
