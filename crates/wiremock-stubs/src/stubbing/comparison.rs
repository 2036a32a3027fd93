use serde_json::Value;
use tracing::debug;

use crate::error::MappingError;
use crate::normalizer::{denormalize, normalize};
use crate::stubbing::StubMapping;

/// Whether `server` (a mapping as reported by the admin API) is the same stub
/// as `local`.
///
/// The server copy goes through the model first, so fields the model does
/// not know are ignored. A local pattern without a method matches the
/// server's `ANY`. When `persisted` is set the server copy is expected to
/// carry `persistent: true` even if the local one does not.
pub fn matches_server_copy(
    local: &StubMapping,
    server: &Value,
    persisted: bool,
) -> Result<bool, MappingError> {
    let server_mapping: StubMapping = denormalize(server.clone())?;
    let mut server_structure = normalize(&server_mapping)?;
    let mut local_structure = normalize(local)?;

    if local.request().method().is_none() {
        if let Some(request) = server_structure
            .get_mut("request")
            .and_then(Value::as_object_mut)
        {
            request.remove("method");
        }
    }
    if persisted {
        if let Some(fields) = local_structure.as_object_mut() {
            fields.insert("persistent".to_string(), Value::Bool(true));
        }
    }

    let equal = server_structure == local_structure;
    if !equal {
        debug!(local = %local_structure, server = %server_structure, "server copy differs");
    }
    Ok(equal)
}
