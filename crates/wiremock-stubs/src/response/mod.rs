//! Response side of a stub mapping.

mod delay;
mod fault;
mod headers;

pub use delay::{ChunkedDribbleDelay, DelayDistribution};
pub use fault::Fault;
pub use headers::{HeaderValue, HttpHeaders};

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::MappingError;
use crate::normalizer::{deserialize_via_denormalize, Denormalize, FieldReader, Structure};

pub const DEFAULT_STATUS: u16 = 200;

const BODY_KEYS: [&str; 3] = ["body", "base64Body", "bodyFileName"];

/// The body a stub responds with. Only one representation can be set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Text(String),
    /// Base64 of the body bytes.
    Base64(String),
    /// Path relative to the server's `__files` directory.
    File(String),
}

impl ResponseBody {
    fn wire_key(&self) -> &'static str {
        match self {
            ResponseBody::Text(_) => "body",
            ResponseBody::Base64(_) => "base64Body",
            ResponseBody::File(_) => "bodyFileName",
        }
    }

    fn content(&self) -> &str {
        match self {
            ResponseBody::Text(content)
            | ResponseBody::Base64(content)
            | ResponseBody::File(content) => content,
        }
    }
}

/// What the server sends back for a matched request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDefinition {
    status: u16,
    status_message: Option<String>,
    body: Option<ResponseBody>,
    headers: Option<HttpHeaders>,
    proxy_base_url: Option<String>,
    additional_proxy_request_headers: Option<BTreeMap<String, String>>,
    proxy_url_prefix_to_remove: Option<String>,
    fixed_delay_milliseconds: Option<u64>,
    delay_distribution: Option<DelayDistribution>,
    chunked_dribble_delay: Option<ChunkedDribbleDelay>,
    fault: Option<Fault>,
    transformers: Option<Vec<String>>,
    transformer_parameters: Option<Structure>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResponseDefinitionWire<'a> {
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base64_body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body_file_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    headers: Option<&'a HttpHeaders>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxy_base_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    additional_proxy_request_headers: Option<&'a BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxy_url_prefix_to_remove: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fixed_delay_milliseconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delay_distribution: Option<&'a DelayDistribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chunked_dribble_delay: Option<&'a ChunkedDribbleDelay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fault: Option<Fault>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transformers: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transformer_parameters: Option<&'a Structure>,
}

impl Default for ResponseDefinition {
    fn default() -> Self {
        Self {
            status: DEFAULT_STATUS,
            status_message: None,
            body: None,
            headers: None,
            proxy_base_url: None,
            additional_proxy_request_headers: None,
            proxy_url_prefix_to_remove: None,
            fixed_delay_milliseconds: None,
            delay_distribution: None,
            chunked_dribble_delay: None,
            fault: None,
            transformers: None,
            transformer_parameters: None,
        }
    }
}

impl ResponseDefinition {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn body(&self) -> Option<&ResponseBody> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> Option<&HttpHeaders> {
        self.headers.as_ref()
    }

    pub fn proxy_base_url(&self) -> Option<&str> {
        self.proxy_base_url.as_deref()
    }

    pub fn additional_proxy_request_headers(&self) -> Option<&BTreeMap<String, String>> {
        self.additional_proxy_request_headers.as_ref()
    }

    pub fn proxy_url_prefix_to_remove(&self) -> Option<&str> {
        self.proxy_url_prefix_to_remove.as_deref()
    }

    pub fn fixed_delay_milliseconds(&self) -> Option<u64> {
        self.fixed_delay_milliseconds
    }

    pub fn delay_distribution(&self) -> Option<&DelayDistribution> {
        self.delay_distribution.as_ref()
    }

    pub fn chunked_dribble_delay(&self) -> Option<&ChunkedDribbleDelay> {
        self.chunked_dribble_delay.as_ref()
    }

    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    pub fn transformers(&self) -> Option<&[String]> {
        self.transformers.as_deref()
    }

    pub fn transformer_parameters(&self) -> Option<&Structure> {
        self.transformer_parameters.as_ref()
    }

    fn body_as(&self, key: &str) -> Option<&str> {
        self.body
            .as_ref()
            .filter(|body| body.wire_key() == key)
            .map(ResponseBody::content)
    }
}

impl Serialize for ResponseDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ResponseDefinitionWire {
            status: self.status,
            status_message: self.status_message.as_deref(),
            body: self.body_as("body"),
            base64_body: self.body_as("base64Body"),
            body_file_name: self.body_as("bodyFileName"),
            headers: self.headers.as_ref(),
            proxy_base_url: self.proxy_base_url.as_deref(),
            additional_proxy_request_headers: self.additional_proxy_request_headers.as_ref(),
            proxy_url_prefix_to_remove: self.proxy_url_prefix_to_remove.as_deref(),
            fixed_delay_milliseconds: self.fixed_delay_milliseconds,
            delay_distribution: self.delay_distribution.as_ref(),
            chunked_dribble_delay: self.chunked_dribble_delay.as_ref(),
            fault: self.fault,
            transformers: self.transformers.as_deref(),
            transformer_parameters: self.transformer_parameters.as_ref(),
        }
        .serialize(serializer)
    }
}

/// Pick the single body representation, failing when several are set.
fn single_body(
    text: Option<String>,
    base64: Option<String>,
    file: Option<String>,
) -> Result<Option<ResponseBody>, MappingError> {
    let present: Vec<ResponseBody> = [
        text.map(ResponseBody::Text),
        base64.map(ResponseBody::Base64),
        file.map(ResponseBody::File),
    ]
    .into_iter()
    .flatten()
    .collect();

    if present.len() > 1 {
        return Err(MappingError::UnsupportedBodyRepresentation {
            representations: present.iter().map(|b| b.wire_key().to_string()).collect(),
        });
    }
    Ok(present.into_iter().next())
}

impl Denormalize for ResponseDefinition {
    const ENTITY: &'static str = "ResponseDefinition";

    fn from_structure(structure: Structure) -> Result<Self, MappingError> {
        let mut fields = FieldReader::new(Self::ENTITY, structure);
        let [text, base64, file] = BODY_KEYS;
        let body = single_body(
            fields.optional(text)?,
            fields.optional(base64)?,
            fields.optional(file)?,
        )?;
        let response = ResponseDefinition {
            status: fields.optional("status")?.unwrap_or(DEFAULT_STATUS),
            status_message: fields.optional("statusMessage")?,
            body,
            headers: fields.optional("headers")?,
            proxy_base_url: fields.optional("proxyBaseUrl")?,
            additional_proxy_request_headers: fields.optional("additionalProxyRequestHeaders")?,
            proxy_url_prefix_to_remove: fields.optional("proxyUrlPrefixToRemove")?,
            fixed_delay_milliseconds: fields.optional("fixedDelayMilliseconds")?,
            delay_distribution: fields.optional("delayDistribution")?,
            chunked_dribble_delay: fields.entity("chunkedDribbleDelay")?,
            fault: fields.optional("fault")?,
            transformers: fields.optional("transformers")?,
            transformer_parameters: fields.object("transformerParameters")?,
        };
        fields.finish();
        Ok(response)
    }
}

deserialize_via_denormalize!(ResponseDefinition);

/// Accumulates a [`ResponseDefinition`]; body conflicts are reported by
/// [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct ResponseDefinitionBuilder {
    status: u16,
    status_message: Option<String>,
    body: Option<String>,
    base64_body: Option<String>,
    body_file_name: Option<String>,
    headers: HttpHeaders,
    proxy_base_url: Option<String>,
    additional_proxy_request_headers: BTreeMap<String, String>,
    proxy_url_prefix_to_remove: Option<String>,
    fixed_delay_milliseconds: Option<u64>,
    delay_distribution: Option<DelayDistribution>,
    chunked_dribble_delay: Option<ChunkedDribbleDelay>,
    fault: Option<Fault>,
    transformers: Vec<String>,
    transformer_parameters: Structure,
}

impl Default for ResponseDefinitionBuilder {
    fn default() -> Self {
        Self {
            status: DEFAULT_STATUS,
            status_message: None,
            body: None,
            base64_body: None,
            body_file_name: None,
            headers: HttpHeaders::new(),
            proxy_base_url: None,
            additional_proxy_request_headers: BTreeMap::new(),
            proxy_url_prefix_to_remove: None,
            fixed_delay_milliseconds: None,
            delay_distribution: None,
            chunked_dribble_delay: None,
            fault: None,
            transformers: Vec::new(),
            transformer_parameters: Structure::new(),
        }
    }
}

impl ResponseDefinitionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_status_message(mut self, message: impl Into<String>) -> Self {
        self.status_message = Some(message.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Binary body; stored base64-encoded.
    pub fn with_body_data(mut self, data: impl AsRef<[u8]>) -> Self {
        self.base64_body = Some(STANDARD.encode(data));
        self
    }

    pub fn with_body_file(mut self, file_name: impl Into<String>) -> Self {
        self.body_file_name = Some(file_name.into());
        self
    }

    /// Repeated calls with the same name accumulate values.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn proxied_from(mut self, base_url: impl Into<String>) -> Self {
        self.proxy_base_url = Some(base_url.into());
        self
    }

    pub fn with_additional_request_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.additional_proxy_request_headers
            .insert(name.to_string(), value.into());
        self
    }

    pub fn with_proxy_url_prefix_to_remove(mut self, prefix: impl Into<String>) -> Self {
        self.proxy_url_prefix_to_remove = Some(prefix.into());
        self
    }

    pub fn with_fixed_delay(mut self, milliseconds: u64) -> Self {
        self.fixed_delay_milliseconds = Some(milliseconds);
        self
    }

    pub fn with_uniform_random_delay(mut self, lower: u64, upper: u64) -> Self {
        self.delay_distribution = Some(DelayDistribution::Uniform { lower, upper });
        self
    }

    pub fn with_log_normal_random_delay(mut self, median: f64, sigma: f64) -> Self {
        self.delay_distribution = Some(DelayDistribution::LogNormal { median, sigma });
        self
    }

    pub fn with_chunked_dribble_delay(mut self, chunks: u32, total_duration_millis: u64) -> Self {
        self.chunked_dribble_delay = Some(ChunkedDribbleDelay::new(chunks, total_duration_millis));
        self
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }

    pub fn with_transformers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transformers.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_transformer_parameter(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.transformer_parameters
            .insert(name.to_string(), value.into());
        self
    }

    pub fn build(self) -> Result<ResponseDefinition, MappingError> {
        let body = single_body(self.body, self.base64_body, self.body_file_name)?;
        Ok(ResponseDefinition {
            status: self.status,
            status_message: self.status_message,
            body,
            headers: (!self.headers.is_empty()).then_some(self.headers),
            proxy_base_url: self.proxy_base_url,
            additional_proxy_request_headers: (!self.additional_proxy_request_headers.is_empty())
                .then_some(self.additional_proxy_request_headers),
            proxy_url_prefix_to_remove: self.proxy_url_prefix_to_remove,
            fixed_delay_milliseconds: self.fixed_delay_milliseconds,
            delay_distribution: self.delay_distribution,
            chunked_dribble_delay: self.chunked_dribble_delay,
            fault: self.fault,
            transformers: (!self.transformers.is_empty()).then_some(self.transformers),
            transformer_parameters: (!self.transformer_parameters.is_empty())
                .then_some(self.transformer_parameters),
        })
    }
}
