use serde::{Deserialize, Serialize};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::MappingError;
use crate::normalizer::{deserialize_via_denormalize, Denormalize, FieldReader, Structure};
use crate::response::HttpHeaders;

/// Delay before a webhook fires, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WebhookDelay {
    Fixed { milliseconds: u64 },
    Uniform { lower: u64, upper: u64 },
}

/// Outbound request the server sends after serving a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "HttpHeaders::is_empty")]
    headers: HttpHeaders,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base64_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delay: Option<WebhookDelay>,
}

impl WebhookDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_body_data(mut self, data: impl AsRef<[u8]>) -> Self {
        self.base64_body = Some(STANDARD.encode(data));
        self
    }

    pub fn with_fixed_delay(mut self, milliseconds: u64) -> Self {
        self.delay = Some(WebhookDelay::Fixed { milliseconds });
        self
    }

    pub fn with_random_delay(mut self, lower: u64, upper: u64) -> Self {
        self.delay = Some(WebhookDelay::Uniform { lower, upper });
        self
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn base64_body(&self) -> Option<&str> {
        self.base64_body.as_deref()
    }

    pub fn delay(&self) -> Option<WebhookDelay> {
        self.delay
    }
}

impl Denormalize for WebhookDefinition {
    const ENTITY: &'static str = "WebhookDefinition";

    fn from_structure(structure: Structure) -> Result<Self, MappingError> {
        let mut fields = FieldReader::new(Self::ENTITY, structure);
        let webhook = WebhookDefinition {
            method: fields.optional("method")?,
            url: fields.optional("url")?,
            headers: fields.optional("headers")?.unwrap_or_default(),
            body: fields.optional("body")?,
            base64_body: fields.optional("base64Body")?,
            delay: fields.optional("delay")?,
        };
        fields.finish();
        Ok(webhook)
    }
}

/// A named side effect run after the response is served.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostServeAction {
    name: String,
    parameters: WebhookDefinition,
}

impl PostServeAction {
    pub fn new(name: impl Into<String>, parameters: WebhookDefinition) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }

    /// The standard `webhook` action.
    pub fn webhook(parameters: WebhookDefinition) -> Self {
        Self::new("webhook", parameters)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &WebhookDefinition {
        &self.parameters
    }
}

impl Denormalize for PostServeAction {
    const ENTITY: &'static str = "PostServeAction";

    fn from_structure(structure: Structure) -> Result<Self, MappingError> {
        let mut fields = FieldReader::new(Self::ENTITY, structure);
        let action = PostServeAction {
            name: fields.required("name")?,
            parameters: fields.entity("parameters")?.unwrap_or_default(),
        };
        fields.finish();
        Ok(action)
    }
}

deserialize_via_denormalize!(WebhookDefinition, PostServeAction);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::{denormalize, normalize};
    use serde_json::json;

    #[test]
    fn test_webhook_shape() {
        let action = PostServeAction::webhook(
            WebhookDefinition::new()
                .with_method("POST")
                .with_url("http://localhost:9999/callback")
                .with_header("Content-Type", "application/json")
                .with_body("{\"ok\":true}")
                .with_fixed_delay(250),
        );
        let wire = normalize(&action).unwrap();
        assert_eq!(
            wire,
            json!({
                "name": "webhook",
                "parameters": {
                    "method": "POST",
                    "url": "http://localhost:9999/callback",
                    "headers": {"Content-Type": "application/json"},
                    "body": "{\"ok\":true}",
                    "delay": {"type": "fixed", "milliseconds": 250}
                }
            })
        );
        assert_eq!(denormalize::<PostServeAction>(wire).unwrap(), action);
    }

    #[test]
    fn test_empty_webhook_omits_everything() {
        let wire = normalize(&WebhookDefinition::new()).unwrap();
        assert_eq!(wire, json!({}));
    }

    #[test]
    fn test_unknown_delay_type_is_malformed() {
        let err = denormalize::<WebhookDefinition>(json!({"delay": {"type": "gaussian"}}))
            .unwrap_err();
        assert!(matches!(err, MappingError::MalformedStructure { .. }));
    }
}
