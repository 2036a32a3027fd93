//! Value matching strategies for headers, cookies, query parameters and bodies.
//!
//! On the wire a strategy is a flat object whose single matching-type key
//! carries the expected value, next to optional modifiers:
//!
//! ```json
//! { "equalTo": "text/plain", "caseInsensitive": true }
//! { "matchesJsonPath": { "expression": "$.name", "contains": "bob" } }
//! { "and": [ { "contains": "a" }, { "doesNotContain": "b" } ] }
//! ```

use std::collections::BTreeMap;

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::trace;

use crate::error::MappingError;
use crate::normalizer::{
    denormalize_amended, deserialize_via_denormalize, into_structure, json_type, normalize,
    serialize_amended, AmendsDeserialization, AmendsSerialization, Denormalize, FieldReader,
    Structure,
};

/// Closed vocabulary of matching types understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchingType {
    EqualTo,
    BinaryEqualTo,
    Contains,
    DoesNotContain,
    Matches,
    DoesNotMatch,
    Absent,
    EqualToJson,
    MatchesJsonPath,
    EqualToXml,
    MatchesXPath,
    Before,
    After,
    EqualToDateTime,
    And,
    Or,
}

impl MatchingType {
    pub const ALL: [MatchingType; 16] = [
        MatchingType::EqualTo,
        MatchingType::BinaryEqualTo,
        MatchingType::Contains,
        MatchingType::DoesNotContain,
        MatchingType::Matches,
        MatchingType::DoesNotMatch,
        MatchingType::Absent,
        MatchingType::EqualToJson,
        MatchingType::MatchesJsonPath,
        MatchingType::EqualToXml,
        MatchingType::MatchesXPath,
        MatchingType::Before,
        MatchingType::After,
        MatchingType::EqualToDateTime,
        MatchingType::And,
        MatchingType::Or,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchingType::EqualTo => "equalTo",
            MatchingType::BinaryEqualTo => "binaryEqualTo",
            MatchingType::Contains => "contains",
            MatchingType::DoesNotContain => "doesNotContain",
            MatchingType::Matches => "matches",
            MatchingType::DoesNotMatch => "doesNotMatch",
            MatchingType::Absent => "absent",
            MatchingType::EqualToJson => "equalToJson",
            MatchingType::MatchesJsonPath => "matchesJsonPath",
            MatchingType::EqualToXml => "equalToXml",
            MatchingType::MatchesXPath => "matchesXPath",
            MatchingType::Before => "before",
            MatchingType::After => "after",
            MatchingType::EqualToDateTime => "equalToDateTime",
            MatchingType::And => "and",
            MatchingType::Or => "or",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == key)
    }
}

/// A matching type together with its expected value.
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    EqualTo(String),
    /// Base64 of the expected bytes.
    BinaryEqualTo(String),
    Contains(String),
    DoesNotContain(String),
    Matches(String),
    DoesNotMatch(String),
    Absent,
    /// Expected JSON, either as a document string or as structured JSON.
    EqualToJson(Value),
    MatchesJsonPath(PathExpression),
    EqualToXml(String),
    MatchesXPath(PathExpression),
    Before(String),
    After(String),
    EqualToDateTime(String),
    And(Vec<ValueMatchingStrategy>),
    Or(Vec<ValueMatchingStrategy>),
}

impl Matcher {
    pub fn matching_type(&self) -> MatchingType {
        match self {
            Matcher::EqualTo(_) => MatchingType::EqualTo,
            Matcher::BinaryEqualTo(_) => MatchingType::BinaryEqualTo,
            Matcher::Contains(_) => MatchingType::Contains,
            Matcher::DoesNotContain(_) => MatchingType::DoesNotContain,
            Matcher::Matches(_) => MatchingType::Matches,
            Matcher::DoesNotMatch(_) => MatchingType::DoesNotMatch,
            Matcher::Absent => MatchingType::Absent,
            Matcher::EqualToJson(_) => MatchingType::EqualToJson,
            Matcher::MatchesJsonPath(_) => MatchingType::MatchesJsonPath,
            Matcher::EqualToXml(_) => MatchingType::EqualToXml,
            Matcher::MatchesXPath(_) => MatchingType::MatchesXPath,
            Matcher::Before(_) => MatchingType::Before,
            Matcher::After(_) => MatchingType::After,
            Matcher::EqualToDateTime(_) => MatchingType::EqualToDateTime,
            Matcher::And(_) => MatchingType::And,
            Matcher::Or(_) => MatchingType::Or,
        }
    }

    /// Wire value stored under the matching-type key.
    pub fn matching_value(&self) -> Result<Value, MappingError> {
        let value = match self {
            Matcher::EqualTo(s)
            | Matcher::BinaryEqualTo(s)
            | Matcher::Contains(s)
            | Matcher::DoesNotContain(s)
            | Matcher::Matches(s)
            | Matcher::DoesNotMatch(s)
            | Matcher::EqualToXml(s)
            | Matcher::Before(s)
            | Matcher::After(s)
            | Matcher::EqualToDateTime(s) => Value::String(s.clone()),
            Matcher::Absent => Value::Bool(true),
            Matcher::EqualToJson(json) => json.clone(),
            Matcher::MatchesJsonPath(path) | Matcher::MatchesXPath(path) => normalize(path)?,
            Matcher::And(operands) | Matcher::Or(operands) => normalize(operands)?,
        };
        Ok(value)
    }

    /// Rebuild a matcher from its wire pieces, checking the value shape the
    /// matching type calls for.
    pub fn from_parts(matching_type: MatchingType, value: Value) -> Result<Self, MappingError> {
        let text = |value: Value| match value {
            Value::String(s) => Ok(s),
            other => Err(MappingError::malformed(
                ValueMatchingStrategy::ENTITY,
                format!(
                    "'{}' expects a string, got {}",
                    matching_type.as_str(),
                    json_type(&other)
                ),
            )),
        };
        let operands = |value: Value| match value {
            Value::Array(items) => items
                .into_iter()
                .map(ValueMatchingStrategy::denormalize)
                .collect::<Result<Vec<_>, _>>(),
            other => Err(MappingError::malformed(
                ValueMatchingStrategy::ENTITY,
                format!(
                    "'{}' expects an array of matchers, got {}",
                    matching_type.as_str(),
                    json_type(&other)
                ),
            )),
        };

        let matcher = match matching_type {
            MatchingType::EqualTo => Matcher::EqualTo(text(value)?),
            MatchingType::BinaryEqualTo => Matcher::BinaryEqualTo(text(value)?),
            MatchingType::Contains => Matcher::Contains(text(value)?),
            MatchingType::DoesNotContain => Matcher::DoesNotContain(text(value)?),
            MatchingType::Matches => Matcher::Matches(text(value)?),
            MatchingType::DoesNotMatch => Matcher::DoesNotMatch(text(value)?),
            MatchingType::Absent => match value {
                Value::Bool(true) => Matcher::Absent,
                other => {
                    return Err(MappingError::malformed(
                        ValueMatchingStrategy::ENTITY,
                        format!("'absent' must be true, got {other}"),
                    ))
                }
            },
            MatchingType::EqualToJson => Matcher::EqualToJson(value),
            MatchingType::MatchesJsonPath => {
                Matcher::MatchesJsonPath(PathExpression::denormalize(value)?)
            }
            MatchingType::EqualToXml => Matcher::EqualToXml(text(value)?),
            MatchingType::MatchesXPath => Matcher::MatchesXPath(PathExpression::denormalize(value)?),
            MatchingType::Before => Matcher::Before(text(value)?),
            MatchingType::After => Matcher::After(text(value)?),
            MatchingType::EqualToDateTime => Matcher::EqualToDateTime(text(value)?),
            MatchingType::And => Matcher::And(operands(value)?),
            MatchingType::Or => Matcher::Or(operands(value)?),
        };
        Ok(matcher)
    }
}

/// Modifiers that sit next to the matching-type key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_insensitive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_array_order: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_extra_elements: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_placeholders: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder_opening_delimiter_regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder_closing_delimiter_regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_path_namespaces: Option<BTreeMap<String, String>>,
    /// Date-time matchers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncate_expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncate_actual: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_offset_unit: Option<String>,
}

/// A JSONPath or XPath expression, optionally with a matcher applied to
/// whatever the expression selects.
#[derive(Debug, Clone, PartialEq)]
pub enum PathExpression {
    Expression(String),
    Matching {
        expression: String,
        matcher: Box<ValueMatchingStrategy>,
    },
}

impl PathExpression {
    pub fn expression(&self) -> &str {
        match self {
            PathExpression::Expression(expression) => expression,
            PathExpression::Matching { expression, .. } => expression,
        }
    }
}

impl Serialize for PathExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PathExpression::Expression(expression) => serializer.serialize_str(expression),
            PathExpression::Matching {
                expression,
                matcher,
            } => {
                let nested = normalize(matcher.as_ref()).map_err(S::Error::custom)?;
                let mut structure = Structure::new();
                structure.insert("expression".to_string(), Value::String(expression.clone()));
                if let Value::Object(fields) = nested {
                    structure.extend(fields);
                }
                structure.serialize(serializer)
            }
        }
    }
}

impl Denormalize for PathExpression {
    const ENTITY: &'static str = "PathExpression";

    fn from_structure(mut structure: Structure) -> Result<Self, MappingError> {
        let expression = match structure.remove("expression") {
            Some(Value::String(expression)) => expression,
            Some(other) => {
                return Err(MappingError::malformed(
                    Self::ENTITY,
                    format!("'expression' must be a string, got {}", json_type(&other)),
                ))
            }
            None => return Err(MappingError::malformed(Self::ENTITY, "missing field 'expression'")),
        };
        if ValueMatchingStrategy::candidates(&structure).is_empty() {
            if !structure.is_empty() {
                let ignored: Vec<&String> = structure.keys().collect();
                trace!(entity = Self::ENTITY, ?ignored, "ignoring unrecognized fields");
            }
            return Ok(PathExpression::Expression(expression));
        }
        let matcher = ValueMatchingStrategy::denormalize(Value::Object(structure))?;
        Ok(PathExpression::Matching {
            expression,
            matcher: Box::new(matcher),
        })
    }

    fn denormalize(value: Value) -> Result<Self, MappingError> {
        match value {
            Value::String(expression) => Ok(PathExpression::Expression(expression)),
            other => Self::from_structure(into_structure(other, Self::ENTITY)?),
        }
    }
}

/// A single-field match rule: exactly one matcher plus its modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueMatchingStrategy {
    matcher: Matcher,
    options: MatchOptions,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueMatchingStrategyDefault<'a> {
    matching_type: MatchingType,
    matching_value: Value,
    #[serde(flatten)]
    options: &'a MatchOptions,
}

impl ValueMatchingStrategy {
    pub fn new(matcher: Matcher) -> Self {
        Self {
            matcher,
            options: MatchOptions::default(),
        }
    }

    pub fn with_options(matcher: Matcher, options: MatchOptions) -> Self {
        Self { matcher, options }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    pub fn matching_type(&self) -> MatchingType {
        self.matcher.matching_type()
    }

    pub fn ignoring_case(mut self) -> Self {
        self.options.case_insensitive = Some(true);
        self
    }

    pub fn ignoring_array_order(mut self, ignore: bool) -> Self {
        self.options.ignore_array_order = Some(ignore);
        self
    }

    pub fn ignoring_extra_elements(mut self, ignore: bool) -> Self {
        self.options.ignore_extra_elements = Some(ignore);
        self
    }

    /// Enable `${xmlunit.*}` placeholders, optionally with custom delimiters.
    pub fn with_placeholders(mut self, opening: Option<&str>, closing: Option<&str>) -> Self {
        self.options.enable_placeholders = Some(true);
        self.options.placeholder_opening_delimiter_regex = opening.map(str::to_string);
        self.options.placeholder_closing_delimiter_regex = closing.map(str::to_string);
        self
    }

    pub fn with_x_path_namespace(mut self, prefix: &str, uri: &str) -> Self {
        self.options
            .x_path_namespaces
            .get_or_insert_with(BTreeMap::new)
            .insert(prefix.to_string(), uri.to_string());
        self
    }

    pub fn with_actual_format(mut self, format: &str) -> Self {
        self.options.actual_format = Some(format.to_string());
        self
    }

    pub fn truncate_expected(mut self, truncation: &str) -> Self {
        self.options.truncate_expected = Some(truncation.to_string());
        self
    }

    pub fn truncate_actual(mut self, truncation: &str) -> Self {
        self.options.truncate_actual = Some(truncation.to_string());
        self
    }

    pub fn with_expected_offset(mut self, amount: i64, unit: &str) -> Self {
        self.options.expected_offset = Some(amount);
        self.options.expected_offset_unit = Some(unit.to_string());
        self
    }

    /// Matching-type keys populated on a raw structure.
    fn candidates(structure: &Structure) -> Vec<MatchingType> {
        structure
            .iter()
            .filter(|(_, value)| !value.is_null())
            .filter_map(|(key, _)| MatchingType::from_key(key))
            .collect()
    }
}

impl AmendsSerialization for ValueMatchingStrategy {
    fn amend_post_normalization(mut normalized: Structure, source: &Self) -> Structure {
        normalized.remove("matchingType");
        let value = normalized.remove("matchingValue").unwrap_or(Value::Null);

        let mut amended = Structure::new();
        amended.insert(source.matching_type().as_str().to_string(), value);
        amended.extend(normalized);
        amended
    }
}

impl AmendsDeserialization for ValueMatchingStrategy {
    fn amend_pre_denormalization(mut normalized: Structure) -> Result<Structure, MappingError> {
        let candidates = Self::candidates(&normalized);
        let matching_type = match candidates.as_slice() {
            [single] => *single,
            [] => {
                return Err(MappingError::malformed(
                    Self::ENTITY,
                    "no matching type present",
                ))
            }
            _ => {
                return Err(MappingError::AmbiguousMatchingType {
                    entity: Self::ENTITY,
                    candidates: candidates.iter().map(|c| c.as_str().to_string()).collect(),
                })
            }
        };

        let mut canonical = Structure::new();
        canonical.insert(
            "matchingType".to_string(),
            Value::String(matching_type.as_str().to_string()),
        );
        if let Some(value) = normalized.remove(matching_type.as_str()) {
            canonical.insert("matchingValue".to_string(), value);
        }
        canonical.extend(normalized);
        Ok(canonical)
    }
}

impl Serialize for ValueMatchingStrategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let default = ValueMatchingStrategyDefault {
            matching_type: self.matching_type(),
            matching_value: self.matcher.matching_value().map_err(S::Error::custom)?,
            options: &self.options,
        };
        serialize_amended(self, &default, serializer)
    }
}

impl Denormalize for ValueMatchingStrategy {
    const ENTITY: &'static str = "ValueMatchingStrategy";

    fn from_structure(structure: Structure) -> Result<Self, MappingError> {
        let mut fields = FieldReader::new(Self::ENTITY, structure);
        let matching_type: MatchingType = fields.required("matchingType")?;
        let value = fields.raw("matchingValue").ok_or_else(|| {
            MappingError::malformed(
                Self::ENTITY,
                format!("'{}' has no value", matching_type.as_str()),
            )
        })?;
        let matcher = Matcher::from_parts(matching_type, value)?;
        let options: MatchOptions = serde_json::from_value(Value::Object(fields.into_rest()))
            .map_err(|e| MappingError::malformed(Self::ENTITY, format!("invalid modifier: {e}")))?;
        Ok(ValueMatchingStrategy { matcher, options })
    }

    fn denormalize(value: Value) -> Result<Self, MappingError> {
        denormalize_amended(value)
    }
}

deserialize_via_denormalize!(ValueMatchingStrategy, PathExpression);
