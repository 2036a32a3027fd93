//! Stub mappings: the aggregate root, scenarios, post-serve actions and
//! bulk import documents.

mod builder;
mod comparison;
mod import;
mod post_serve;

pub use builder::MappingBuilder;
pub use comparison::matches_server_copy;
pub use import::{DuplicatePolicy, StubImport, StubImportBuilder, StubImportOptions};
pub use post_serve::{PostServeAction, WebhookDefinition, WebhookDelay};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MappingError;
use crate::matching::RequestPattern;
use crate::normalizer::{deserialize_via_denormalize, Denormalize, FieldReader, Structure};
use crate::response::ResponseDefinition;

/// Scenario state machine fields, flattened into the mapping's top level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioMappingDefinition {
    scenario_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    required_scenario_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_scenario_state: Option<String>,
}

impl ScenarioMappingDefinition {
    pub fn new(
        scenario_name: impl Into<String>,
        required_scenario_state: Option<String>,
        new_scenario_state: Option<String>,
    ) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            required_scenario_state,
            new_scenario_state,
        }
    }

    /// Assemble from optional parts; a state without a scenario name is
    /// rejected, and no fields at all means no scenario.
    pub(crate) fn from_parts(
        scenario_name: Option<String>,
        required_scenario_state: Option<String>,
        new_scenario_state: Option<String>,
    ) -> Result<Option<Self>, MappingError> {
        match scenario_name {
            Some(name) => Ok(Some(Self::new(
                name,
                required_scenario_state,
                new_scenario_state,
            ))),
            None if required_scenario_state.is_some() || new_scenario_state.is_some() => {
                Err(MappingError::malformed(
                    "ScenarioMappingDefinition",
                    "scenario state set without 'scenarioName'",
                ))
            }
            None => Ok(None),
        }
    }

    pub fn scenario_name(&self) -> &str {
        &self.scenario_name
    }

    pub fn required_scenario_state(&self) -> Option<&str> {
        self.required_scenario_state.as_deref()
    }

    pub fn new_scenario_state(&self) -> Option<&str> {
        self.new_scenario_state.as_deref()
    }
}

/// A request pattern paired with the response to serve for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StubMapping {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    request: RequestPattern,
    response: ResponseDefinition,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u32>,
    #[serde(flatten)]
    scenario: Option<ScenarioMappingDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Structure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    persistent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    post_serve_actions: Option<Vec<PostServeAction>>,
}

impl StubMapping {
    pub fn new(request: RequestPattern, response: ResponseDefinition) -> Self {
        Self {
            id: None,
            name: None,
            request,
            response,
            priority: None,
            scenario: None,
            metadata: None,
            persistent: None,
            post_serve_actions: None,
        }
    }

    /// The same mapping under another id, as assigned by the server.
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn request(&self) -> &RequestPattern {
        &self.request
    }

    pub fn response(&self) -> &ResponseDefinition {
        &self.response
    }

    pub fn priority(&self) -> Option<u32> {
        self.priority
    }

    pub fn scenario(&self) -> Option<&ScenarioMappingDefinition> {
        self.scenario.as_ref()
    }

    pub fn metadata(&self) -> Option<&Structure> {
        self.metadata.as_ref()
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent.unwrap_or(false)
    }

    pub fn post_serve_actions(&self) -> Option<&[PostServeAction]> {
        self.post_serve_actions.as_deref()
    }
}

impl Denormalize for StubMapping {
    const ENTITY: &'static str = "StubMapping";

    fn from_structure(structure: Structure) -> Result<Self, MappingError> {
        let mut fields = FieldReader::new(Self::ENTITY, structure);
        let scenario = ScenarioMappingDefinition::from_parts(
            fields.optional("scenarioName")?,
            fields.optional("requiredScenarioState")?,
            fields.optional("newScenarioState")?,
        )?;
        let mapping = StubMapping {
            id: fields.optional("id")?,
            name: fields.optional("name")?,
            request: fields.required_entity("request")?,
            response: fields.required_entity("response")?,
            priority: fields.optional("priority")?,
            scenario,
            metadata: fields.object("metadata")?,
            persistent: fields.optional("persistent")?,
            post_serve_actions: fields.entity_list("postServeActions")?,
        };
        fields.finish();
        Ok(mapping)
    }
}

/// Page metadata returned with a mapping listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    pub total: u64,
}

/// Body of `GET /__admin/mappings`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListStubMappingsResult {
    mappings: Vec<StubMapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<ListMeta>,
}

impl ListStubMappingsResult {
    pub fn new(mappings: Vec<StubMapping>) -> Self {
        let total = mappings.len() as u64;
        Self {
            mappings,
            meta: Some(ListMeta { total }),
        }
    }

    pub fn mappings(&self) -> &[StubMapping] {
        &self.mappings
    }

    pub fn into_mappings(self) -> Vec<StubMapping> {
        self.mappings
    }

    pub fn meta(&self) -> Option<ListMeta> {
        self.meta
    }
}

impl Denormalize for ListStubMappingsResult {
    const ENTITY: &'static str = "ListStubMappingsResult";

    fn from_structure(structure: Structure) -> Result<Self, MappingError> {
        let mut fields = FieldReader::new(Self::ENTITY, structure);
        let result = ListStubMappingsResult {
            mappings: fields.entity_list("mappings")?.unwrap_or_default(),
            meta: fields.optional("meta")?,
        };
        fields.finish();
        Ok(result)
    }
}

deserialize_via_denormalize!(StubMapping, ListStubMappingsResult);
