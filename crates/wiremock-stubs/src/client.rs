//! Admin API facade over a caller-supplied transport.
//!
//! The client owns the mapping between operations and admin endpoints, and
//! the conversion of entities to and from wire JSON. Moving bytes over the
//! network is the transport's job.

use std::fmt;

use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::MappingError;
use crate::matching::ValueMatchingStrategy;
use crate::normalizer::{denormalize, normalize, Denormalize};
use crate::stubbing::{
    ListStubMappingsResult, MappingBuilder, StubImport, StubImportBuilder, StubMapping,
};

pub const MAPPINGS_PATH: &str = "/__admin/mappings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl AdminMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminMethod::Get => "GET",
            AdminMethod::Post => "POST",
            AdminMethod::Put => "PUT",
            AdminMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for AdminMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures reported by a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Admin API returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Admin API unreachable: {0}")]
    Unreachable(String),
    #[error("Admin API returned invalid JSON: {0}")]
    InvalidJson(String),
}

/// Sends one admin request and returns the decoded JSON reply, if any.
pub trait AdminTransport {
    fn exchange(
        &self,
        method: AdminMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, TransportError>;
}

impl<T: AdminTransport + ?Sized> AdminTransport for &T {
    fn exchange(
        &self,
        method: AdminMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, TransportError> {
        (**self).exchange(method, path, body)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error("{method} {path} returned no body")]
    MissingBody { method: AdminMethod, path: String },
}

/// Stub management operations against a mock server's admin API.
#[derive(Debug, Clone)]
pub struct AdminClient<T> {
    transport: T,
}

impl<T: AdminTransport> AdminClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn send(
        &self,
        method: AdminMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, ClientError> {
        debug!("Admin request: {} {}", method, path);
        Ok(self.transport.exchange(method, path, body)?)
    }

    fn send_for<R: Denormalize>(
        &self,
        method: AdminMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<R, ClientError> {
        let reply = self
            .send(method, path, body)?
            .ok_or_else(|| ClientError::MissingBody {
                method,
                path: path.to_string(),
            })?;
        Ok(denormalize(reply)?)
    }

    /// Register a stub. The returned mapping carries the id the server
    /// assigned to it.
    pub fn stub_for(&self, mapping: MappingBuilder) -> Result<StubMapping, ClientError> {
        self.add_stub_mapping(mapping.build()?)
    }

    pub fn add_stub_mapping(&self, mapping: StubMapping) -> Result<StubMapping, ClientError> {
        let body = normalize(&mapping)?;
        let created: StubMapping = self.send_for(AdminMethod::Post, MAPPINGS_PATH, Some(&body))?;
        match created.id() {
            Some(id) => {
                info!("Created stub mapping {}", id);
                Ok(mapping.with_id(id))
            }
            None => Ok(mapping),
        }
    }

    /// Replace an existing stub; the mapping must carry an id.
    pub fn edit_stub(&self, mapping: MappingBuilder) -> Result<StubMapping, ClientError> {
        let mapping = mapping.build()?;
        let id = mapping.id().ok_or_else(|| {
            MappingError::malformed("StubMapping", "editing a stub requires an id")
        })?;
        let body = normalize(&mapping)?;
        self.send(AdminMethod::Put, &mapping_path(id), Some(&body))?;
        Ok(mapping)
    }

    pub fn remove_stub(&self, id: Uuid) -> Result<(), ClientError> {
        self.send(AdminMethod::Delete, &mapping_path(id), None)?;
        info!("Removed stub mapping {}", id);
        Ok(())
    }

    pub fn remove_stub_mapping(&self, mapping: &StubMapping) -> Result<(), ClientError> {
        let id = mapping.id().ok_or_else(|| {
            MappingError::malformed("StubMapping", "removing a stub requires an id")
        })?;
        self.remove_stub(id)
    }

    pub fn list_all_stub_mappings(&self) -> Result<ListStubMappingsResult, ClientError> {
        self.send_for(AdminMethod::Get, MAPPINGS_PATH, None)
    }

    pub fn get_single_stub_mapping(&self, id: Uuid) -> Result<StubMapping, ClientError> {
        self.send_for(AdminMethod::Get, &mapping_path(id), None)
    }

    pub fn import_stubs(&self, import: StubImportBuilder) -> Result<(), ClientError> {
        self.import(&import.build()?)
    }

    pub fn import(&self, import: &StubImport) -> Result<(), ClientError> {
        let body = normalize(import)?;
        self.send(
            AdminMethod::Post,
            &format!("{MAPPINGS_PATH}/import"),
            Some(&body),
        )?;
        info!("Imported {} stub mappings", import.mappings().len());
        Ok(())
    }

    /// Persist every stub currently registered on the server.
    pub fn save_all_mappings(&self) -> Result<(), ClientError> {
        self.send(AdminMethod::Post, &format!("{MAPPINGS_PATH}/save"), None)?;
        Ok(())
    }

    pub fn reset_to_default_mappings(&self) -> Result<(), ClientError> {
        self.send(AdminMethod::Post, &format!("{MAPPINGS_PATH}/reset"), None)?;
        Ok(())
    }

    /// Stubs whose metadata satisfies `pattern`.
    pub fn find_stubs_by_metadata(
        &self,
        pattern: &ValueMatchingStrategy,
    ) -> Result<Vec<StubMapping>, ClientError> {
        let body = normalize(pattern)?;
        let result: ListStubMappingsResult = self.send_for(
            AdminMethod::Post,
            &format!("{MAPPINGS_PATH}/find-by-metadata"),
            Some(&body),
        )?;
        Ok(result.into_mappings())
    }

    pub fn remove_stubs_by_metadata(
        &self,
        pattern: &ValueMatchingStrategy,
    ) -> Result<(), ClientError> {
        let body = normalize(pattern)?;
        self.send(
            AdminMethod::Post,
            &format!("{MAPPINGS_PATH}/remove-by-metadata"),
            Some(&body),
        )?;
        Ok(())
    }
}

fn mapping_path(id: Uuid) -> String {
    format!("{MAPPINGS_PATH}/{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::*;
    use serde_json::json;
    use std::cell::RefCell;

    /// In-memory stand-in for the server's admin API.
    #[derive(Default)]
    struct FakeServer {
        mappings: RefCell<Vec<Value>>,
        calls: RefCell<Vec<(AdminMethod, String, Option<Value>)>>,
    }

    impl FakeServer {
        fn store(&self, mut mapping: Value) -> Value {
            if mapping.get("id").is_none() {
                mapping["id"] = json!(Uuid::new_v4().to_string());
            }
            if mapping["request"].get("method").is_none() {
                mapping["request"]["method"] = json!("ANY");
            }
            self.mappings.borrow_mut().push(mapping.clone());
            mapping
        }

        fn position(&self, id: &str) -> Option<usize> {
            self.mappings
                .borrow()
                .iter()
                .position(|m| m["id"] == json!(id))
        }
    }

    impl AdminTransport for FakeServer {
        fn exchange(
            &self,
            method: AdminMethod,
            path: &str,
            body: Option<&Value>,
        ) -> Result<Option<Value>, TransportError> {
            self.calls
                .borrow_mut()
                .push((method, path.to_string(), body.cloned()));
            let id = path.strip_prefix("/__admin/mappings/").unwrap_or_default();
            match (method, path) {
                (AdminMethod::Post, MAPPINGS_PATH) => Ok(Some(self.store(body.cloned().unwrap()))),
                (AdminMethod::Get, MAPPINGS_PATH) => {
                    let mappings = self.mappings.borrow().clone();
                    let total = mappings.len();
                    Ok(Some(json!({"mappings": mappings, "meta": {"total": total}})))
                }
                (AdminMethod::Post, "/__admin/mappings/import")
                | (AdminMethod::Post, "/__admin/mappings/save")
                | (AdminMethod::Post, "/__admin/mappings/reset") => Ok(None),
                (AdminMethod::Post, "/__admin/mappings/find-by-metadata") => {
                    Ok(Some(json!({"mappings": []})))
                }
                (AdminMethod::Get, _) => match self.position(id) {
                    Some(index) => Ok(Some(self.mappings.borrow()[index].clone())),
                    None => Err(TransportError::Status {
                        status: 404,
                        body: String::new(),
                    }),
                },
                (AdminMethod::Delete, _) => {
                    if let Some(index) = self.position(id) {
                        self.mappings.borrow_mut().remove(index);
                    }
                    Ok(None)
                }
                _ => Ok(None),
            }
        }
    }

    #[test]
    fn test_stub_for_adopts_server_id() {
        let server = FakeServer::default();
        let client = AdminClient::new(&server);

        let mapping = client
            .stub_for(get(url_equal_to("/some/url")).will_return(a_response().with_status(204)))
            .unwrap();

        let id = mapping.id().expect("server assigns an id");
        let stored = client.get_single_stub_mapping(id).unwrap();
        assert_eq!(stored, mapping);
    }

    #[test]
    fn test_list_and_remove() {
        let server = FakeServer::default();
        let client = AdminClient::new(&server);
        let first = client.stub_for(get(url_equal_to("/a"))).unwrap();
        client.stub_for(post(url_equal_to("/b"))).unwrap();

        let listed = client.list_all_stub_mappings().unwrap();
        assert_eq!(listed.mappings().len(), 2);

        client.remove_stub_mapping(&first).unwrap();
        assert_eq!(client.list_all_stub_mappings().unwrap().mappings().len(), 1);
    }

    #[test]
    fn test_method_less_stub_round_trips_through_server() {
        let server = FakeServer::default();
        let client = AdminClient::new(&server);
        let local = client.stub_for(any_request()).unwrap();

        let listed = client.list_all_stub_mappings().unwrap();
        let server_copy = normalize(&listed.mappings()[0]).unwrap();
        assert_eq!(server_copy["request"]["method"], json!("ANY"));
        assert!(crate::stubbing::matches_server_copy(&local, &server_copy, false).unwrap());
    }

    #[test]
    fn test_import_sends_document() {
        let server = FakeServer::default();
        let client = AdminClient::new(&server);
        client
            .import_stubs(stub_import().stub(get(url_equal_to("/x"))).ignore_existing())
            .unwrap();

        let calls = server.calls.borrow();
        let (method, path, body) = &calls[0];
        assert_eq!(*method, AdminMethod::Post);
        assert_eq!(path, "/__admin/mappings/import");
        assert_eq!(
            body.as_ref().unwrap()["importOptions"],
            json!({"duplicatePolicy": "IGNORE", "deleteAllNotInImport": false})
        );
    }

    #[test]
    fn test_metadata_endpoints_send_pattern() {
        let server = FakeServer::default();
        let client = AdminClient::new(&server);
        let pattern = matching_json_path_with("$.team", equal_to("payments"));

        assert!(client.find_stubs_by_metadata(&pattern).unwrap().is_empty());
        client.remove_stubs_by_metadata(&pattern).unwrap();

        let calls = server.calls.borrow();
        assert_eq!(calls[1].1, "/__admin/mappings/remove-by-metadata");
        assert_eq!(
            calls[1].2,
            Some(json!({"matchesJsonPath": {"expression": "$.team", "equalTo": "payments"}}))
        );
    }

    #[test]
    fn test_edit_requires_id() {
        let client = AdminClient::new(FakeServer::default());
        let err = client.edit_stub(get(url_equal_to("/a"))).unwrap_err();
        assert!(matches!(err, ClientError::Mapping(_)));
    }

    #[test]
    fn test_missing_reply_body() {
        struct Silent;
        impl AdminTransport for Silent {
            fn exchange(
                &self,
                _method: AdminMethod,
                _path: &str,
                _body: Option<&Value>,
            ) -> Result<Option<Value>, TransportError> {
                Ok(None)
            }
        }
        let err = AdminClient::new(Silent).list_all_stub_mappings().unwrap_err();
        assert_eq!(err.to_string(), "GET /__admin/mappings returned no body");
    }

    #[test]
    fn test_transport_error_propagates() {
        let client = AdminClient::new(FakeServer::default());
        let err = client.get_single_stub_mapping(Uuid::new_v4()).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Transport(TransportError::Status { status: 404, .. })
        ));
    }
}
