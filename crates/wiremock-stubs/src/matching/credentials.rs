use serde::Serialize;

use crate::error::MappingError;
use crate::normalizer::{deserialize_via_denormalize, Denormalize, FieldReader, Structure};

/// Basic-auth credentials a request must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasicCredentials {
    username: String,
    password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl Denormalize for BasicCredentials {
    const ENTITY: &'static str = "BasicCredentials";

    fn from_structure(structure: Structure) -> Result<Self, MappingError> {
        let mut fields = FieldReader::new(Self::ENTITY, structure);
        let credentials = BasicCredentials {
            username: fields.required("username")?,
            password: fields.required("password")?,
        };
        fields.finish();
        Ok(credentials)
    }
}

deserialize_via_denormalize!(BasicCredentials);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::{denormalize, normalize};
    use serde_json::json;

    #[test]
    fn test_round_trip() {
        let credentials = BasicCredentials::new("user", "pass");
        let wire = normalize(&credentials).unwrap();
        assert_eq!(wire, json!({"username": "user", "password": "pass"}));
        assert_eq!(denormalize::<BasicCredentials>(wire).unwrap(), credentials);
    }

    #[test]
    fn test_missing_password() {
        let err = denormalize::<BasicCredentials>(json!({"username": "user"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed BasicCredentials: missing field 'password'"
        );
    }
}
