//! URL matching strategy: the matching type becomes the JSON key.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::MappingError;
use crate::normalizer::{
    denormalize_amended, deserialize_via_denormalize, serialize_amended, AmendsDeserialization,
    AmendsSerialization, Denormalize, FieldReader, Structure,
};

/// The four ways a request URL can be matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UrlMatchingType {
    /// Path and query, exact.
    Url,
    /// Path and query, regex.
    UrlPattern,
    /// Path only, exact.
    UrlPath,
    /// Path only, regex.
    UrlPathPattern,
}

impl UrlMatchingType {
    /// Candidate keys, in the order the server checks them.
    pub const ALL: [UrlMatchingType; 4] = [
        UrlMatchingType::Url,
        UrlMatchingType::UrlPattern,
        UrlMatchingType::UrlPath,
        UrlMatchingType::UrlPathPattern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UrlMatchingType::Url => "url",
            UrlMatchingType::UrlPattern => "urlPattern",
            UrlMatchingType::UrlPath => "urlPath",
            UrlMatchingType::UrlPathPattern => "urlPathPattern",
        }
    }
}

/// How the request URL must match, serialized as `{ <type>: <value> }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMatchingStrategy {
    matching_type: UrlMatchingType,
    matching_value: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UrlMatchingStrategyDefault<'a> {
    matching_type: UrlMatchingType,
    matching_value: &'a str,
}

impl UrlMatchingStrategy {
    pub fn new(matching_type: UrlMatchingType, matching_value: impl Into<String>) -> Self {
        Self {
            matching_type,
            matching_value: matching_value.into(),
        }
    }

    pub fn matching_type(&self) -> UrlMatchingType {
        self.matching_type
    }

    pub fn matching_value(&self) -> &str {
        &self.matching_value
    }

    /// Which candidate keys of `structure` hold a URL strategy.
    fn candidates(structure: &Structure) -> Vec<UrlMatchingType> {
        UrlMatchingType::ALL
            .into_iter()
            .filter(|candidate| {
                structure
                    .get(candidate.as_str())
                    .is_some_and(|value| !value.is_null())
            })
            .collect()
    }

    /// Extract the strategy from a structure that may hold one of the
    /// candidate keys among other fields. `Ok(None)` when none is present.
    pub fn from_structure_keys(structure: &Structure) -> Result<Option<Self>, MappingError> {
        let candidates = Self::candidates(structure);
        match candidates.as_slice() {
            [] => Ok(None),
            [single] => {
                let mut wire = Structure::new();
                if let Some(value) = structure.get(single.as_str()) {
                    wire.insert(single.as_str().to_string(), value.clone());
                }
                Self::denormalize(Value::Object(wire)).map(Some)
            }
            _ => Err(ambiguous(&candidates)),
        }
    }
}

fn ambiguous(candidates: &[UrlMatchingType]) -> MappingError {
    MappingError::AmbiguousMatchingType {
        entity: UrlMatchingStrategy::ENTITY,
        candidates: candidates.iter().map(|c| c.as_str().to_string()).collect(),
    }
}

impl AmendsSerialization for UrlMatchingStrategy {
    fn amend_post_normalization(_normalized: Structure, source: &Self) -> Structure {
        let mut amended = Structure::new();
        amended.insert(
            source.matching_type.as_str().to_string(),
            Value::String(source.matching_value.clone()),
        );
        amended
    }
}

impl AmendsDeserialization for UrlMatchingStrategy {
    fn amend_pre_denormalization(mut normalized: Structure) -> Result<Structure, MappingError> {
        let candidates = Self::candidates(&normalized);
        let matching_type = match candidates.as_slice() {
            [single] => *single,
            [] => {
                return Err(MappingError::malformed(
                    Self::ENTITY,
                    "none of 'url', 'urlPattern', 'urlPath', 'urlPathPattern' is present",
                ))
            }
            _ => return Err(ambiguous(&candidates)),
        };

        let mut canonical = Structure::new();
        canonical.insert(
            "matchingType".to_string(),
            Value::String(matching_type.as_str().to_string()),
        );
        if let Some(value) = normalized.remove(matching_type.as_str()) {
            canonical.insert("matchingValue".to_string(), value);
        }
        Ok(canonical)
    }
}

impl Serialize for UrlMatchingStrategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let default = UrlMatchingStrategyDefault {
            matching_type: self.matching_type,
            matching_value: &self.matching_value,
        };
        serialize_amended(self, &default, serializer)
    }
}

impl Denormalize for UrlMatchingStrategy {
    const ENTITY: &'static str = "UrlMatchingStrategy";

    fn from_structure(structure: Structure) -> Result<Self, MappingError> {
        let mut fields = FieldReader::new(Self::ENTITY, structure);
        let strategy = UrlMatchingStrategy {
            matching_type: fields.required("matchingType")?,
            matching_value: fields.required("matchingValue")?,
        };
        fields.finish();
        Ok(strategy)
    }

    fn denormalize(value: Value) -> Result<Self, MappingError> {
        denormalize_amended(value)
    }
}

deserialize_via_denormalize!(UrlMatchingStrategy);
