use uuid::Uuid;

use crate::error::MappingError;
use crate::matching::{MultipartValuePatternBuilder, RequestPatternBuilder, ValueMatchingStrategy};
use crate::normalizer::Structure;
use crate::response::ResponseDefinitionBuilder;
use crate::stubbing::{PostServeAction, ScenarioMappingDefinition, StubMapping, WebhookDefinition};

/// Fluent construction of a [`StubMapping`]. Everything is validated in
/// [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct MappingBuilder {
    id: Option<Uuid>,
    name: Option<String>,
    request: RequestPatternBuilder,
    response: Option<ResponseDefinitionBuilder>,
    priority: Option<u32>,
    scenario_name: Option<String>,
    required_scenario_state: Option<String>,
    new_scenario_state: Option<String>,
    metadata: Option<Structure>,
    persistent: Option<bool>,
    post_serve_actions: Vec<PostServeAction>,
}

impl MappingBuilder {
    pub fn new(request: RequestPatternBuilder) -> Self {
        Self {
            id: None,
            name: None,
            request,
            response: None,
            priority: None,
            scenario_name: None,
            required_scenario_state: None,
            new_scenario_state: None,
            metadata: None,
            persistent: None,
            post_serve_actions: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn will_return(mut self, response: ResponseDefinitionBuilder) -> Self {
        self.response = Some(response);
        self
    }

    /// Lower numbers win when several mappings match.
    pub fn at_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_header(mut self, name: &str, strategy: ValueMatchingStrategy) -> Self {
        self.request = self.request.with_header(name, strategy);
        self
    }

    pub fn with_query_param(mut self, name: &str, strategy: ValueMatchingStrategy) -> Self {
        self.request = self.request.with_query_param(name, strategy);
        self
    }

    pub fn with_cookie(mut self, name: &str, strategy: ValueMatchingStrategy) -> Self {
        self.request = self.request.with_cookie(name, strategy);
        self
    }

    pub fn with_request_body(mut self, strategy: ValueMatchingStrategy) -> Self {
        self.request = self.request.with_request_body(strategy);
        self
    }

    pub fn with_multipart_request_body(mut self, multipart: MultipartValuePatternBuilder) -> Self {
        self.request = self.request.with_multipart_request_body(multipart.build());
        self
    }

    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        self.request = self.request.with_basic_auth(username, password);
        self
    }

    pub fn with_host(mut self, strategy: ValueMatchingStrategy) -> Self {
        self.request = self.request.with_host(strategy);
        self
    }

    pub fn in_scenario(mut self, scenario_name: impl Into<String>) -> Self {
        self.scenario_name = Some(scenario_name.into());
        self
    }

    pub fn when_scenario_state_is(mut self, state: impl Into<String>) -> Self {
        self.required_scenario_state = Some(state.into());
        self
    }

    pub fn will_set_state_to(mut self, state: impl Into<String>) -> Self {
        self.new_scenario_state = Some(state.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Structure) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attach a server-side custom matcher.
    pub fn and_matching(mut self, matcher_name: &str, parameters: Structure) -> Self {
        self.request = self.request.with_custom_matcher(matcher_name, parameters);
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = Some(true);
        self
    }

    pub fn with_post_serve_action(mut self, name: &str, webhook: WebhookDefinition) -> Self {
        self.post_serve_actions
            .push(PostServeAction::new(name, webhook));
        self
    }

    pub fn build(self) -> Result<StubMapping, MappingError> {
        let response = self.response.unwrap_or_default().build()?;
        let scenario = ScenarioMappingDefinition::from_parts(
            self.scenario_name,
            self.required_scenario_state,
            self.new_scenario_state,
        )?;
        Ok(StubMapping {
            id: self.id,
            name: self.name,
            request: self.request.build(),
            response,
            priority: self.priority,
            scenario,
            metadata: self.metadata.filter(|metadata| !metadata.is_empty()),
            persistent: self.persistent,
            post_serve_actions: (!self.post_serve_actions.is_empty())
                .then_some(self.post_serve_actions),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{Matcher, UrlMatchingStrategy, UrlMatchingType};
    use crate::normalizer::normalize;
    use serde_json::json;

    fn get(url: &str) -> MappingBuilder {
        MappingBuilder::new(RequestPatternBuilder::new(
            "GET",
            UrlMatchingStrategy::new(UrlMatchingType::Url, url),
        ))
    }

    #[test]
    fn test_without_response_uses_default() {
        let mapping = get("/a").build().unwrap();
        assert_eq!(
            normalize(&mapping).unwrap(),
            json!({"request": {"method": "GET", "url": "/a"}, "response": {"status": 200}})
        );
    }

    #[test]
    fn test_everything_set() {
        let id = Uuid::parse_str("5c8e6c58-1a35-4e8f-a4f2-1dd0b1c7f0aa").unwrap();
        let mut metadata = Structure::new();
        metadata.insert("team".to_string(), json!({"name": "payments"}));

        let mapping = get("/pay")
            .with_id(id)
            .with_name("pay")
            .at_priority(3)
            .with_header(
                "Accept",
                ValueMatchingStrategy::new(Matcher::Contains("json".to_string())),
            )
            .in_scenario("checkout")
            .when_scenario_state_is("Started")
            .will_set_state_to("Paid")
            .with_metadata(metadata)
            .persistent()
            .with_post_serve_action(
                "webhook",
                WebhookDefinition::new().with_url("http://hook"),
            )
            .will_return(ResponseDefinitionBuilder::new().with_status(201))
            .build()
            .unwrap();

        assert_eq!(
            normalize(&mapping).unwrap(),
            json!({
                "id": "5c8e6c58-1a35-4e8f-a4f2-1dd0b1c7f0aa",
                "name": "pay",
                "request": {
                    "method": "GET",
                    "url": "/pay",
                    "headers": {"Accept": {"contains": "json"}}
                },
                "response": {"status": 201},
                "priority": 3,
                "scenarioName": "checkout",
                "requiredScenarioState": "Started",
                "newScenarioState": "Paid",
                "metadata": {"team": {"name": "payments"}},
                "persistent": true,
                "postServeActions": [{"name": "webhook", "parameters": {"url": "http://hook"}}]
            })
        );
    }

    #[test]
    fn test_state_without_scenario_fails() {
        let err = get("/a").will_set_state_to("Paid").build().unwrap_err();
        assert!(matches!(err, MappingError::MalformedStructure { .. }));
    }

    #[test]
    fn test_body_conflict_surfaces_from_mapping_build() {
        let err = get("/a")
            .will_return(
                ResponseDefinitionBuilder::new()
                    .with_body("a")
                    .with_body_data([1u8, 2]),
            )
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            MappingError::UnsupportedBodyRepresentation { .. }
        ));
    }
}
