//! Request pattern: everything a request must satisfy for a stub to apply.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::MappingError;
use crate::matching::credentials::BasicCredentials;
use crate::matching::custom::CustomMatcherDefinition;
use crate::matching::multipart::MultipartValuePattern;
use crate::matching::url::UrlMatchingStrategy;
use crate::matching::value::{Matcher, ValueMatchingStrategy};
use crate::normalizer::{
    denormalize_amended, deserialize_via_denormalize, normalize, rename_key, serialize_amended,
    AmendsDeserialization, AmendsSerialization, Denormalize, FieldReader, Structure,
};

/// Canonical field name to wire field name.
const WIRE_RENAMES: [(&str, &str); 3] = [
    ("basicCredentials", "basicAuthCredentials"),
    ("customMatcherDefinition", "customMatcher"),
    ("hostPattern", "host"),
];

const URL_STRATEGY_FIELD: &str = "urlMatchingStrategy";

/// The request side of a stub mapping.
///
/// A pattern without a method matches any method; the server reports such
/// patterns back with `"method": "ANY"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestPattern {
    method: Option<String>,
    url_matching_strategy: Option<UrlMatchingStrategy>,
    headers: Option<BTreeMap<String, ValueMatchingStrategy>>,
    cookies: Option<BTreeMap<String, ValueMatchingStrategy>>,
    query_parameters: Option<BTreeMap<String, ValueMatchingStrategy>>,
    body_patterns: Option<Vec<ValueMatchingStrategy>>,
    multipart_patterns: Option<Vec<MultipartValuePattern>>,
    basic_credentials: Option<BasicCredentials>,
    custom_matcher_definition: Option<CustomMatcherDefinition>,
    host_pattern: Option<ValueMatchingStrategy>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestPatternDefault<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url_matching_strategy: Option<&'a UrlMatchingStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    headers: Option<&'a BTreeMap<String, ValueMatchingStrategy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cookies: Option<&'a BTreeMap<String, ValueMatchingStrategy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_parameters: Option<&'a BTreeMap<String, ValueMatchingStrategy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body_patterns: Option<&'a [ValueMatchingStrategy]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    multipart_patterns: Option<&'a [MultipartValuePattern]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    basic_credentials: Option<&'a BasicCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_matcher_definition: Option<&'a CustomMatcherDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    host_pattern: Option<&'a ValueMatchingStrategy>,
}

impl RequestPattern {
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn url_matching_strategy(&self) -> Option<&UrlMatchingStrategy> {
        self.url_matching_strategy.as_ref()
    }

    pub fn headers(&self) -> Option<&BTreeMap<String, ValueMatchingStrategy>> {
        self.headers.as_ref()
    }

    pub fn cookies(&self) -> Option<&BTreeMap<String, ValueMatchingStrategy>> {
        self.cookies.as_ref()
    }

    pub fn query_parameters(&self) -> Option<&BTreeMap<String, ValueMatchingStrategy>> {
        self.query_parameters.as_ref()
    }

    pub fn body_patterns(&self) -> Option<&[ValueMatchingStrategy]> {
        self.body_patterns.as_deref()
    }

    pub fn multipart_patterns(&self) -> Option<&[MultipartValuePattern]> {
        self.multipart_patterns.as_deref()
    }

    pub fn basic_credentials(&self) -> Option<&BasicCredentials> {
        self.basic_credentials.as_ref()
    }

    pub fn custom_matcher_definition(&self) -> Option<&CustomMatcherDefinition> {
        self.custom_matcher_definition.as_ref()
    }

    pub fn host_pattern(&self) -> Option<&ValueMatchingStrategy> {
        self.host_pattern.as_ref()
    }
}

impl AmendsSerialization for RequestPattern {
    fn amend_post_normalization(normalized: Structure, _source: &Self) -> Structure {
        let renamed = WIRE_RENAMES
            .iter()
            .fold(normalized, |structure, (canonical, wire)| {
                rename_key(structure, canonical, wire)
            });

        // The URL strategy's own structure is merged into the pattern.
        let mut amended = Structure::new();
        for (key, value) in renamed {
            match (key.as_str(), value) {
                (URL_STRATEGY_FIELD, Value::Object(url_fields)) => amended.extend(url_fields),
                (_, value) => {
                    amended.insert(key, value);
                }
            }
        }
        amended
    }
}

impl AmendsDeserialization for RequestPattern {
    fn amend_pre_denormalization(normalized: Structure) -> Result<Structure, MappingError> {
        let renamed = WIRE_RENAMES
            .iter()
            .fold(normalized, |structure, (canonical, wire)| {
                rename_key(structure, wire, canonical)
            });

        let Some(strategy) = UrlMatchingStrategy::from_structure_keys(&renamed)? else {
            return Ok(renamed);
        };

        let url_key = strategy.matching_type().as_str();
        let mut nested = Some(normalize(&strategy)?);
        let mut canonical = Structure::new();
        for (key, value) in renamed {
            if key == url_key {
                if let Some(nested) = nested.take() {
                    canonical.insert(URL_STRATEGY_FIELD.to_string(), nested);
                }
            } else {
                canonical.insert(key, value);
            }
        }
        Ok(canonical)
    }
}

impl Serialize for RequestPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let default = RequestPatternDefault {
            method: self.method.as_deref(),
            url_matching_strategy: self.url_matching_strategy.as_ref(),
            headers: self.headers.as_ref(),
            cookies: self.cookies.as_ref(),
            query_parameters: self.query_parameters.as_ref(),
            body_patterns: self.body_patterns.as_deref(),
            multipart_patterns: self.multipart_patterns.as_deref(),
            basic_credentials: self.basic_credentials.as_ref(),
            custom_matcher_definition: self.custom_matcher_definition.as_ref(),
            host_pattern: self.host_pattern.as_ref(),
        };
        serialize_amended(self, &default, serializer)
    }
}

impl Denormalize for RequestPattern {
    const ENTITY: &'static str = "RequestPattern";

    fn from_structure(structure: Structure) -> Result<Self, MappingError> {
        let mut fields = FieldReader::new(Self::ENTITY, structure);
        let pattern = RequestPattern {
            method: Some(fields.required("method")?),
            url_matching_strategy: fields.entity(URL_STRATEGY_FIELD)?,
            headers: fields.entity_map("headers")?,
            cookies: fields.entity_map("cookies")?,
            query_parameters: fields.entity_map("queryParameters")?,
            body_patterns: fields.entity_list("bodyPatterns")?,
            multipart_patterns: fields.entity_list("multipartPatterns")?,
            basic_credentials: fields.entity("basicCredentials")?,
            custom_matcher_definition: fields.entity("customMatcherDefinition")?,
            host_pattern: fields.entity("hostPattern")?,
        };
        fields.finish();
        Ok(pattern)
    }

    fn denormalize(value: Value) -> Result<Self, MappingError> {
        denormalize_amended(value)
    }
}

deserialize_via_denormalize!(RequestPattern);

/// Accumulates a [`RequestPattern`].
#[derive(Debug, Clone, Default)]
pub struct RequestPatternBuilder {
    method: Option<String>,
    url_matching_strategy: Option<UrlMatchingStrategy>,
    headers: BTreeMap<String, ValueMatchingStrategy>,
    cookies: BTreeMap<String, ValueMatchingStrategy>,
    query_parameters: BTreeMap<String, ValueMatchingStrategy>,
    body_patterns: Vec<ValueMatchingStrategy>,
    multipart_patterns: Vec<MultipartValuePattern>,
    basic_credentials: Option<BasicCredentials>,
    custom_matcher_definition: Option<CustomMatcherDefinition>,
    host_pattern: Option<ValueMatchingStrategy>,
}

impl RequestPatternBuilder {
    pub fn new(method: impl Into<String>, url: UrlMatchingStrategy) -> Self {
        Self {
            method: Some(method.into()),
            url_matching_strategy: Some(url),
            ..Default::default()
        }
    }

    /// A pattern with neither method nor URL constraint.
    pub fn any_request() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_url(mut self, url: UrlMatchingStrategy) -> Self {
        self.url_matching_strategy = Some(url);
        self
    }

    pub fn with_header(mut self, name: &str, strategy: ValueMatchingStrategy) -> Self {
        self.headers.insert(name.to_string(), strategy);
        self
    }

    pub fn without_header(self, name: &str) -> Self {
        self.with_header(name, ValueMatchingStrategy::new(Matcher::Absent))
    }

    pub fn with_cookie(mut self, name: &str, strategy: ValueMatchingStrategy) -> Self {
        self.cookies.insert(name.to_string(), strategy);
        self
    }

    pub fn with_query_param(mut self, name: &str, strategy: ValueMatchingStrategy) -> Self {
        self.query_parameters.insert(name.to_string(), strategy);
        self
    }

    pub fn with_request_body(mut self, strategy: ValueMatchingStrategy) -> Self {
        self.body_patterns.push(strategy);
        self
    }

    pub fn with_multipart_request_body(mut self, pattern: MultipartValuePattern) -> Self {
        self.multipart_patterns.push(pattern);
        self
    }

    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        self.basic_credentials = Some(BasicCredentials::new(username, password));
        self
    }

    pub fn with_custom_matcher(mut self, name: &str, parameters: Structure) -> Self {
        self.custom_matcher_definition = Some(CustomMatcherDefinition::new(name, parameters));
        self
    }

    pub fn with_host(mut self, strategy: ValueMatchingStrategy) -> Self {
        self.host_pattern = Some(strategy);
        self
    }

    pub fn build(self) -> RequestPattern {
        RequestPattern {
            method: self.method,
            url_matching_strategy: self.url_matching_strategy,
            headers: (!self.headers.is_empty()).then_some(self.headers),
            cookies: (!self.cookies.is_empty()).then_some(self.cookies),
            query_parameters: (!self.query_parameters.is_empty()).then_some(self.query_parameters),
            body_patterns: (!self.body_patterns.is_empty()).then_some(self.body_patterns),
            multipart_patterns: (!self.multipart_patterns.is_empty())
                .then_some(self.multipart_patterns),
            basic_credentials: self.basic_credentials,
            custom_matcher_definition: self.custom_matcher_definition,
            host_pattern: self.host_pattern,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::url::UrlMatchingType;
    use crate::normalizer::{denormalize, normalize};
    use serde_json::json;

    fn equal_to(value: &str) -> ValueMatchingStrategy {
        ValueMatchingStrategy::new(Matcher::EqualTo(value.to_string()))
    }

    #[test]
    fn test_url_strategy_is_flattened_into_pattern() {
        let pattern = RequestPatternBuilder::new(
            "GET",
            UrlMatchingStrategy::new(UrlMatchingType::UrlPath, "/foo"),
        )
        .build();
        assert_eq!(
            normalize(&pattern).unwrap(),
            json!({"method": "GET", "urlPath": "/foo"})
        );
    }

    #[test]
    fn test_wire_renames() {
        let mut parameters = Structure::new();
        parameters.insert("limit".to_string(), json!(3));
        let pattern = RequestPatternBuilder::new(
            "POST",
            UrlMatchingStrategy::new(UrlMatchingType::Url, "/login"),
        )
        .with_basic_auth("user", "pass")
        .with_custom_matcher("rate", parameters)
        .with_host(equal_to("example.com"))
        .build();

        let wire = normalize(&pattern).unwrap();
        assert_eq!(
            wire,
            json!({
                "method": "POST",
                "url": "/login",
                "basicAuthCredentials": {"username": "user", "password": "pass"},
                "customMatcher": {"name": "rate", "parameters": {"limit": 3}},
                "host": {"equalTo": "example.com"}
            })
        );
        assert_eq!(denormalize::<RequestPattern>(wire).unwrap(), pattern);
    }

    #[test]
    fn test_unset_fields_are_omitted() {
        let pattern = RequestPatternBuilder::any_request().build();
        assert_eq!(normalize(&pattern).unwrap(), json!({}));
    }

    #[test]
    fn test_collections_round_trip() {
        let pattern = RequestPatternBuilder::new(
            "PUT",
            UrlMatchingStrategy::new(UrlMatchingType::UrlPathPattern, "/items/.*"),
        )
        .with_header("Accept", equal_to("application/json"))
        .without_header("X-Debug")
        .with_cookie("session", ValueMatchingStrategy::new(Matcher::Matches(".+".to_string())))
        .with_query_param("page", equal_to("2"))
        .with_request_body(ValueMatchingStrategy::new(Matcher::Contains("a".to_string())))
        .with_request_body(ValueMatchingStrategy::new(Matcher::Contains("b".to_string())))
        .build();

        let wire = normalize(&pattern).unwrap();
        assert_eq!(wire["headers"]["X-Debug"], json!({"absent": true}));
        assert_eq!(
            wire["bodyPatterns"],
            json!([{"contains": "a"}, {"contains": "b"}])
        );
        let back: RequestPattern = denormalize(wire.clone()).unwrap();
        assert_eq!(back, pattern);
        assert_eq!(normalize(&back).unwrap(), wire);
    }

    #[test]
    fn test_missing_method_is_malformed() {
        let err = denormalize::<RequestPattern>(json!({"url": "/a"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed RequestPattern: missing field 'method'"
        );
    }

    #[test]
    fn test_two_url_keys_are_ambiguous() {
        let err = denormalize::<RequestPattern>(
            json!({"method": "GET", "url": "/a", "urlPathPattern": "/a.*"}),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MappingError::AmbiguousMatchingType {
                entity: "UrlMatchingStrategy",
                ..
            }
        ));
    }

    #[test]
    fn test_wire_name_wins_over_canonical_name() {
        let pattern: RequestPattern = denormalize(json!({
            "method": "GET",
            "host": {"equalTo": "a"},
            "hostPattern": {"equalTo": "b"},
            "basicCredentials": {"username": "stale", "password": "x"},
            "basicAuthCredentials": {"username": "user", "password": "pass"}
        }))
        .unwrap();
        assert_eq!(pattern.host_pattern(), Some(&equal_to("a")));
        assert_eq!(
            normalize(&pattern).unwrap(),
            json!({
                "method": "GET",
                "basicAuthCredentials": {"username": "user", "password": "pass"},
                "host": {"equalTo": "a"}
            })
        );
    }

    #[test]
    fn test_url_key_before_method_is_read() {
        let pattern: RequestPattern =
            denormalize(json!({"urlPath": "/a", "method": "GET"})).unwrap();
        assert_eq!(
            pattern.url_matching_strategy(),
            Some(&UrlMatchingStrategy::new(UrlMatchingType::UrlPath, "/a"))
        );
    }

    #[test]
    fn test_no_url_key_means_no_url_strategy() {
        let pattern: RequestPattern = denormalize(json!({"method": "ANY"})).unwrap();
        assert_eq!(pattern.method(), Some("ANY"));
        assert!(pattern.url_matching_strategy().is_none());
    }

    #[test]
    fn test_unrecognized_fields_are_ignored() {
        let pattern: RequestPattern =
            denormalize(json!({"method": "GET", "url": "/a", "formParameters": {}})).unwrap();
        assert_eq!(normalize(&pattern).unwrap(), json!({"method": "GET", "url": "/a"}));
    }

    #[test]
    fn test_nested_ambiguity_in_header_surfaces() {
        let err = denormalize::<RequestPattern>(json!({
            "method": "GET",
            "headers": {"Accept": {"equalTo": "a", "contains": "b"}}
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            MappingError::AmbiguousMatchingType {
                entity: "ValueMatchingStrategy",
                ..
            }
        ));
    }
}
