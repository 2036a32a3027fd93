//! Error types raised while converting entities to and from their wire form.

use std::fmt;

/// Errors raised by the normalization engine and the builders.
///
/// Every variant is detected eagerly; an entity is either fully valid or
/// construction fails.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// A required field is missing, has the wrong JSON type, or violates an
    /// invariant of the entity being built.
    #[error("Malformed {entity}: {reason}")]
    MalformedStructure { entity: &'static str, reason: String },

    /// More than one matching-type key is populated on a type-tagged structure.
    #[error("Ambiguous matching type on {entity}: found {}", Candidates(.candidates))]
    AmbiguousMatchingType {
        entity: &'static str,
        candidates: Vec<String>,
    },

    /// More than one body representation is populated on a response definition.
    #[error("Response definition has more than one body: {}", Candidates(.representations))]
    UnsupportedBodyRepresentation { representations: Vec<String> },

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl MappingError {
    pub fn malformed(entity: &'static str, reason: impl Into<String>) -> Self {
        MappingError::MalformedStructure {
            entity,
            reason: reason.into(),
        }
    }

    /// Short machine-readable kind, used by the checker to pick issue codes.
    pub fn kind(&self) -> &'static str {
        match self {
            MappingError::MalformedStructure { .. } => "malformed-structure",
            MappingError::AmbiguousMatchingType { .. } => "ambiguous-matching-type",
            MappingError::UnsupportedBodyRepresentation { .. } => {
                "unsupported-body-representation"
            }
            MappingError::Json(_) => "json",
        }
    }
}

struct Candidates<'a>(&'a [String]);

impl fmt::Display for Candidates<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self.0.iter().map(|c| format!("'{c}'")).collect();
        f.write_str(&quoted.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_message_lists_candidates() {
        let err = MappingError::AmbiguousMatchingType {
            entity: "ValueMatchingStrategy",
            candidates: vec!["equalTo".to_string(), "contains".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Ambiguous matching type on ValueMatchingStrategy: found 'equalTo', 'contains'"
        );
        assert_eq!(err.kind(), "ambiguous-matching-type");
    }

    #[test]
    fn test_malformed_message() {
        let err = MappingError::malformed("RequestPattern", "missing field 'method'");
        assert_eq!(
            err.to_string(),
            "Malformed RequestPattern: missing field 'method'"
        );
    }
}
