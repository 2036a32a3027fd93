//! Free functions for building stubs in a readable, chained style.
//!
//! ```
//! use wiremock_stubs::dsl::*;
//!
//! let mapping = get(url_path_equal_to("/orders"))
//!     .with_header("Accept", containing("json"))
//!     .with_query_param("page", equal_to("1"))
//!     .will_return(a_response().with_status(200).with_body("[]"))
//!     .build()
//!     .unwrap();
//! assert_eq!(mapping.request().method(), Some("GET"));
//! ```

use serde_json::Value;

use crate::matching::{
    Matcher, MultipartValuePatternBuilder, PathExpression, RequestPatternBuilder,
    UrlMatchingStrategy, UrlMatchingType, ValueMatchingStrategy,
};
use crate::response::ResponseDefinitionBuilder;
use crate::stubbing::{MappingBuilder, StubImportBuilder, WebhookDefinition};

fn request(method: &str, url: UrlMatchingStrategy) -> MappingBuilder {
    MappingBuilder::new(RequestPatternBuilder::new(method, url))
}

pub fn get(url: UrlMatchingStrategy) -> MappingBuilder {
    request("GET", url)
}

pub fn post(url: UrlMatchingStrategy) -> MappingBuilder {
    request("POST", url)
}

pub fn put(url: UrlMatchingStrategy) -> MappingBuilder {
    request("PUT", url)
}

pub fn delete(url: UrlMatchingStrategy) -> MappingBuilder {
    request("DELETE", url)
}

pub fn patch(url: UrlMatchingStrategy) -> MappingBuilder {
    request("PATCH", url)
}

pub fn head(url: UrlMatchingStrategy) -> MappingBuilder {
    request("HEAD", url)
}

pub fn options(url: UrlMatchingStrategy) -> MappingBuilder {
    request("OPTIONS", url)
}

pub fn trace(url: UrlMatchingStrategy) -> MappingBuilder {
    request("TRACE", url)
}

/// Explicit `ANY` method.
pub fn any(url: UrlMatchingStrategy) -> MappingBuilder {
    request("ANY", url)
}

/// No method and no URL constraint; the server treats the method as `ANY`.
pub fn any_request() -> MappingBuilder {
    MappingBuilder::new(RequestPatternBuilder::any_request())
}

pub fn url_equal_to(url: &str) -> UrlMatchingStrategy {
    UrlMatchingStrategy::new(UrlMatchingType::Url, url)
}

pub fn url_matching(regex: &str) -> UrlMatchingStrategy {
    UrlMatchingStrategy::new(UrlMatchingType::UrlPattern, regex)
}

pub fn url_path_equal_to(path: &str) -> UrlMatchingStrategy {
    UrlMatchingStrategy::new(UrlMatchingType::UrlPath, path)
}

pub fn url_path_matching(regex: &str) -> UrlMatchingStrategy {
    UrlMatchingStrategy::new(UrlMatchingType::UrlPathPattern, regex)
}

pub fn any_url() -> UrlMatchingStrategy {
    url_matching(".*")
}

fn strategy(matcher: Matcher) -> ValueMatchingStrategy {
    ValueMatchingStrategy::new(matcher)
}

pub fn equal_to(value: &str) -> ValueMatchingStrategy {
    strategy(Matcher::EqualTo(value.to_string()))
}

pub fn equal_to_ignore_case(value: &str) -> ValueMatchingStrategy {
    equal_to(value).ignoring_case()
}

/// `value` is the base64 encoding of the expected bytes.
pub fn binary_equal_to(value: &str) -> ValueMatchingStrategy {
    strategy(Matcher::BinaryEqualTo(value.to_string()))
}

pub fn containing(value: &str) -> ValueMatchingStrategy {
    strategy(Matcher::Contains(value.to_string()))
}

pub fn not_containing(value: &str) -> ValueMatchingStrategy {
    strategy(Matcher::DoesNotContain(value.to_string()))
}

pub fn matching(regex: &str) -> ValueMatchingStrategy {
    strategy(Matcher::Matches(regex.to_string()))
}

pub fn not_matching(regex: &str) -> ValueMatchingStrategy {
    strategy(Matcher::DoesNotMatch(regex.to_string()))
}

pub fn absent() -> ValueMatchingStrategy {
    strategy(Matcher::Absent)
}

/// Accepts a JSON document string or structured JSON.
pub fn equal_to_json(json: impl Into<Value>) -> ValueMatchingStrategy {
    strategy(Matcher::EqualToJson(json.into()))
}

pub fn matching_json_path(expression: &str) -> ValueMatchingStrategy {
    strategy(Matcher::MatchesJsonPath(PathExpression::Expression(
        expression.to_string(),
    )))
}

/// JSONPath whose selection must also satisfy `matcher`.
pub fn matching_json_path_with(expression: &str, matcher: ValueMatchingStrategy) -> ValueMatchingStrategy {
    strategy(Matcher::MatchesJsonPath(PathExpression::Matching {
        expression: expression.to_string(),
        matcher: Box::new(matcher),
    }))
}

pub fn equal_to_xml(xml: &str) -> ValueMatchingStrategy {
    strategy(Matcher::EqualToXml(xml.to_string()))
}

pub fn matching_xpath(expression: &str) -> ValueMatchingStrategy {
    strategy(Matcher::MatchesXPath(PathExpression::Expression(
        expression.to_string(),
    )))
}

pub fn matching_xpath_with(expression: &str, matcher: ValueMatchingStrategy) -> ValueMatchingStrategy {
    strategy(Matcher::MatchesXPath(PathExpression::Matching {
        expression: expression.to_string(),
        matcher: Box::new(matcher),
    }))
}

/// Date-time strictly before `date_time` (ISO-8601 or `now +3 days` style).
pub fn before(date_time: &str) -> ValueMatchingStrategy {
    strategy(Matcher::Before(date_time.to_string()))
}

pub fn after(date_time: &str) -> ValueMatchingStrategy {
    strategy(Matcher::After(date_time.to_string()))
}

pub fn equal_to_date_time(date_time: &str) -> ValueMatchingStrategy {
    strategy(Matcher::EqualToDateTime(date_time.to_string()))
}

pub fn before_now() -> ValueMatchingStrategy {
    before("now")
}

pub fn after_now() -> ValueMatchingStrategy {
    after("now")
}

pub fn is_now() -> ValueMatchingStrategy {
    equal_to_date_time("now")
}

pub fn and(strategies: impl IntoIterator<Item = ValueMatchingStrategy>) -> ValueMatchingStrategy {
    strategy(Matcher::And(strategies.into_iter().collect()))
}

pub fn or(strategies: impl IntoIterator<Item = ValueMatchingStrategy>) -> ValueMatchingStrategy {
    strategy(Matcher::Or(strategies.into_iter().collect()))
}

pub fn a_response() -> ResponseDefinitionBuilder {
    ResponseDefinitionBuilder::new()
}

/// `200 OK` with a JSON body and content type.
pub fn ok_json(body: &str) -> ResponseDefinitionBuilder {
    a_response()
        .with_header("Content-Type", "application/json")
        .with_body(body)
}

pub fn a_multipart() -> MultipartValuePatternBuilder {
    MultipartValuePatternBuilder::new()
}

pub fn webhook() -> WebhookDefinition {
    WebhookDefinition::new()
}

pub fn stub_import() -> StubImportBuilder {
    StubImportBuilder::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use serde_json::json;

    #[test]
    fn test_methods() {
        for (builder, method) in [
            (put(any_url()), "PUT"),
            (delete(any_url()), "DELETE"),
            (any(any_url()), "ANY"),
            (trace(any_url()), "TRACE"),
        ] {
            let mapping = builder.build().unwrap();
            assert_eq!(mapping.request().method(), Some(method));
        }
        assert_eq!(any_request().build().unwrap().request().method(), None);
    }

    #[test]
    fn test_url_helpers() {
        assert_eq!(
            normalize(&url_path_matching("/a/.*")).unwrap(),
            json!({"urlPathPattern": "/a/.*"})
        );
        assert_eq!(normalize(&any_url()).unwrap(), json!({"urlPattern": ".*"}));
    }

    #[test]
    fn test_value_helpers() {
        assert_eq!(
            normalize(&equal_to_ignore_case("Bob")).unwrap(),
            json!({"equalTo": "Bob", "caseInsensitive": true})
        );
        assert_eq!(normalize(&absent()).unwrap(), json!({"absent": true}));
        assert_eq!(
            normalize(&matching_json_path_with("$.name", equal_to("bob"))).unwrap(),
            json!({"matchesJsonPath": {"expression": "$.name", "equalTo": "bob"}})
        );
        assert_eq!(
            normalize(&or([containing("a"), not_matching("b.*")])).unwrap(),
            json!({"or": [{"contains": "a"}, {"doesNotMatch": "b.*"}]})
        );
        assert_eq!(
            normalize(&equal_to_json(json!({"a": [1, 2]})).ignoring_array_order(true)).unwrap(),
            json!({"equalToJson": {"a": [1, 2]}, "ignoreArrayOrder": true})
        );
    }

    #[test]
    fn test_ok_json() {
        let response = ok_json("{}").build().unwrap();
        assert_eq!(
            normalize(&response).unwrap(),
            json!({"status": 200, "body": "{}", "headers": {"Content-Type": "application/json"}})
        );
    }
}
