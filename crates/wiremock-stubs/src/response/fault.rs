use serde::{Deserialize, Serialize};

/// Connection-level failure the server simulates instead of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Fault {
    EmptyResponse,
    MalformedResponseChunk,
    RandomDataThenClose,
    ConnectionResetByPeer,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_literals() {
        assert_eq!(
            serde_json::to_value(Fault::MalformedResponseChunk).unwrap(),
            json!("MALFORMED_RESPONSE_CHUNK")
        );
        let fault: Fault = serde_json::from_value(json!("CONNECTION_RESET_BY_PEER")).unwrap();
        assert_eq!(fault, Fault::ConnectionResetByPeer);
    }
}
