use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::MappingError;
use crate::matching::value::{Matcher, ValueMatchingStrategy};
use crate::normalizer::{deserialize_via_denormalize, Denormalize, FieldReader, Structure};

/// Whether any or all parts of a multipart body must match the group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MultipartMatchingType {
    #[default]
    Any,
    All,
}

/// Header and body matchers that all apply to one section of a multipart body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipartValuePattern {
    matching_type: MultipartMatchingType,
    #[serde(skip_serializing_if = "Option::is_none")]
    headers: Option<BTreeMap<String, ValueMatchingStrategy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body_patterns: Option<Vec<ValueMatchingStrategy>>,
}

impl MultipartValuePattern {
    pub fn matching_type(&self) -> MultipartMatchingType {
        self.matching_type
    }

    pub fn headers(&self) -> Option<&BTreeMap<String, ValueMatchingStrategy>> {
        self.headers.as_ref()
    }

    pub fn body_patterns(&self) -> Option<&[ValueMatchingStrategy]> {
        self.body_patterns.as_deref()
    }
}

impl Denormalize for MultipartValuePattern {
    const ENTITY: &'static str = "MultipartValuePattern";

    fn from_structure(structure: Structure) -> Result<Self, MappingError> {
        let mut fields = FieldReader::new(Self::ENTITY, structure);
        let pattern = MultipartValuePattern {
            matching_type: fields.optional("matchingType")?.unwrap_or_default(),
            headers: fields.entity_map("headers")?,
            body_patterns: fields.entity_list("bodyPatterns")?,
        };
        fields.finish();
        Ok(pattern)
    }
}

deserialize_via_denormalize!(MultipartValuePattern);

/// Accumulates a [`MultipartValuePattern`].
#[derive(Debug, Clone, Default)]
pub struct MultipartValuePatternBuilder {
    matching_type: MultipartMatchingType,
    headers: BTreeMap<String, ValueMatchingStrategy>,
    body_patterns: Vec<ValueMatchingStrategy>,
}

impl MultipartValuePatternBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match the part whose `Content-Disposition` names this form field.
    pub fn with_name(self, name: &str) -> Self {
        self.with_header(
            "Content-Disposition",
            ValueMatchingStrategy::new(Matcher::Contains(format!("name=\"{name}\""))),
        )
    }

    pub fn with_header(mut self, name: &str, strategy: ValueMatchingStrategy) -> Self {
        self.headers.insert(name.to_string(), strategy);
        self
    }

    pub fn with_body(mut self, strategy: ValueMatchingStrategy) -> Self {
        self.body_patterns.push(strategy);
        self
    }

    pub fn matching_type(mut self, matching_type: MultipartMatchingType) -> Self {
        self.matching_type = matching_type;
        self
    }

    pub fn matching_all(self) -> Self {
        self.matching_type(MultipartMatchingType::All)
    }

    pub fn matching_any(self) -> Self {
        self.matching_type(MultipartMatchingType::Any)
    }

    pub fn build(self) -> MultipartValuePattern {
        MultipartValuePattern {
            matching_type: self.matching_type,
            headers: (!self.headers.is_empty()).then_some(self.headers),
            body_patterns: (!self.body_patterns.is_empty()).then_some(self.body_patterns),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::{denormalize, normalize};
    use serde_json::json;

    #[test]
    fn test_builder_shape() {
        let pattern = MultipartValuePatternBuilder::new()
            .with_name("info")
            .with_body(ValueMatchingStrategy::new(Matcher::EqualToJson(json!({"a": 1}))))
            .matching_all()
            .build();
        assert_eq!(
            normalize(&pattern).unwrap(),
            json!({
                "matchingType": "ALL",
                "headers": {"Content-Disposition": {"contains": "name=\"info\""}},
                "bodyPatterns": [{"equalToJson": {"a": 1}}]
            })
        );
    }

    #[test]
    fn test_empty_groups_omitted() {
        let pattern = MultipartValuePatternBuilder::new().build();
        assert_eq!(normalize(&pattern).unwrap(), json!({"matchingType": "ANY"}));
    }

    #[test]
    fn test_denormalize_defaults_to_any() {
        let pattern: MultipartValuePattern =
            denormalize(json!({"bodyPatterns": [{"contains": "x"}]})).unwrap();
        assert_eq!(pattern.matching_type(), MultipartMatchingType::Any);
        assert_eq!(pattern.body_patterns().map(|p| p.len()), Some(1));
    }

    #[test]
    fn test_unknown_matching_type_is_malformed() {
        let err = denormalize::<MultipartValuePattern>(json!({"matchingType": "SOME"}))
            .unwrap_err();
        assert!(matches!(err, MappingError::MalformedStructure { .. }));
    }
}
