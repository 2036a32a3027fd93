use serde::Serialize;

use crate::error::MappingError;
use crate::normalizer::{deserialize_via_denormalize, Denormalize, FieldReader, Structure};

/// A server-side extension matcher, referenced by name. The parameters are
/// passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomMatcherDefinition {
    name: String,
    #[serde(skip_serializing_if = "Structure::is_empty")]
    parameters: Structure,
}

impl CustomMatcherDefinition {
    pub fn new(name: impl Into<String>, parameters: Structure) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &Structure {
        &self.parameters
    }
}

impl Denormalize for CustomMatcherDefinition {
    const ENTITY: &'static str = "CustomMatcherDefinition";

    fn from_structure(structure: Structure) -> Result<Self, MappingError> {
        let mut fields = FieldReader::new(Self::ENTITY, structure);
        let definition = CustomMatcherDefinition {
            name: fields.required("name")?,
            parameters: fields.object("parameters")?.unwrap_or_default(),
        };
        fields.finish();
        Ok(definition)
    }
}

deserialize_via_denormalize!(CustomMatcherDefinition);
