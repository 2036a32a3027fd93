//! Normalization engine: converts entities to and from the wire JSON structure.
//!
//! Serialization goes through serde. Most entities derive `Serialize` with
//! `skip_serializing_if` on every optional field, which gives the
//! omit-if-absent behaviour for free. The handful of entities whose wire shape
//! is irregular implement [`AmendsSerialization`]: their derived "default"
//! structure is produced first, then handed to the hook together with the
//! source value, and the hook's replacement is emitted verbatim.
//!
//! Deserialization goes through [`Denormalize`], which keeps the error
//! taxonomy typed all the way down (serde's own errors would flatten
//! everything into strings). Entities implementing [`AmendsDeserialization`]
//! get their raw structure rewritten back to canonical field names before the
//! fields are read. Every public entity also implements `serde::Deserialize`
//! by delegating to [`Denormalize`].

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::MappingError;

/// Generic nested wire structure: a JSON object.
pub type Structure = Map<String, Value>;

/// Capability for entities whose wire shape differs from their default
/// field-by-field structure.
pub trait AmendsSerialization {
    /// Receives the default structure and the source entity, returns the
    /// structure that goes on the wire.
    fn amend_post_normalization(normalized: Structure, source: &Self) -> Structure;
}

/// Inverse of [`AmendsSerialization`]: restores canonical field names on a
/// raw wire structure before the fields are read.
pub trait AmendsDeserialization {
    fn amend_pre_denormalization(normalized: Structure) -> Result<Structure, MappingError>;
}

/// Typed construction of an entity from its wire structure.
pub trait Denormalize: Sized {
    /// Entity name used in error messages.
    const ENTITY: &'static str;

    /// Build the entity from a structure whose field names are canonical.
    fn from_structure(structure: Structure) -> Result<Self, MappingError>;

    /// Build the entity from any JSON value.
    fn denormalize(value: Value) -> Result<Self, MappingError> {
        Self::from_structure(into_structure(value, Self::ENTITY)?)
    }
}

/// Serialize any entity to its wire structure.
pub fn normalize<T: Serialize + ?Sized>(entity: &T) -> Result<Value, MappingError> {
    Ok(serde_json::to_value(entity)?)
}

/// Reconstruct an entity from its wire structure.
pub fn denormalize<T: Denormalize>(value: Value) -> Result<T, MappingError> {
    trace!(entity = T::ENTITY, "denormalizing");
    T::denormalize(value)
}

/// `Denormalize::denormalize` body for entities that opt into
/// [`AmendsDeserialization`].
pub(crate) fn denormalize_amended<T>(value: Value) -> Result<T, MappingError>
where
    T: Denormalize + AmendsDeserialization,
{
    let structure = into_structure(value, T::ENTITY)?;
    T::from_structure(T::amend_pre_denormalization(structure)?)
}

/// `Serialize::serialize` body for entities that opt into
/// [`AmendsSerialization`]. `default` is the entity's field-by-field form.
pub(crate) fn serialize_amended<T, W, S>(
    source: &T,
    default: &W,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    T: AmendsSerialization,
    W: Serialize,
    S: Serializer,
{
    let structure = match serde_json::to_value(default).map_err(S::Error::custom)? {
        Value::Object(structure) => structure,
        other => {
            return Err(S::Error::custom(format!(
                "default structure must be an object, got {}",
                json_type(&other)
            )))
        }
    };
    T::amend_post_normalization(structure, source).serialize(serializer)
}

pub(crate) fn into_structure(value: Value, entity: &'static str) -> Result<Structure, MappingError> {
    match value {
        Value::Object(structure) => Ok(structure),
        other => Err(MappingError::malformed(
            entity,
            format!("expected a JSON object, got {}", json_type(&other)),
        )),
    }
}

/// Rename a key in place, keeping its position. No-op when `from` is absent.
/// An entry already stored under `to` is dropped in favour of `from`.
pub fn rename_key(structure: Structure, from: &str, to: &str) -> Structure {
    if !structure.contains_key(from) {
        return structure;
    }
    if structure.contains_key(to) {
        trace!(from, to, "dropping '{}' shadowed by '{}'", to, from);
    }
    structure
        .into_iter()
        .filter(|(key, _)| key != to)
        .map(|(key, value)| {
            if key == from {
                (to.to_string(), value)
            } else {
                (key, value)
            }
        })
        .collect()
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Reads canonical fields out of a structure, one key at a time.
///
/// `null` and empty collections read as absent, matching the omission rule on
/// the way out. Keys never read are ignored.
pub(crate) struct FieldReader {
    entity: &'static str,
    structure: Structure,
}

impl FieldReader {
    pub(crate) fn new(entity: &'static str, structure: Structure) -> Self {
        Self { entity, structure }
    }

    fn take(&mut self, key: &str) -> Option<Value> {
        match self.structure.remove(key) {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) if items.is_empty() => None,
            Some(Value::Object(fields)) if fields.is_empty() => None,
            Some(value) => Some(value),
        }
    }

    fn missing(&self, key: &str) -> MappingError {
        MappingError::malformed(self.entity, format!("missing field '{key}'"))
    }

    /// Read a plain serde value (string, number, enum literal, ...).
    pub(crate) fn optional<T: DeserializeOwned>(
        &mut self,
        key: &str,
    ) -> Result<Option<T>, MappingError> {
        let entity = self.entity;
        self.take(key)
            .map(|value| {
                serde_json::from_value(value).map_err(|e| {
                    MappingError::malformed(entity, format!("invalid field '{key}': {e}"))
                })
            })
            .transpose()
    }

    pub(crate) fn required<T: DeserializeOwned>(&mut self, key: &str) -> Result<T, MappingError> {
        self.optional(key)?.ok_or_else(|| self.missing(key))
    }

    /// Read a raw JSON value, keeping falsy and empty values as they are.
    pub(crate) fn raw(&mut self, key: &str) -> Option<Value> {
        self.structure.remove(key).filter(|value| !value.is_null())
    }

    pub(crate) fn object(&mut self, key: &str) -> Result<Option<Structure>, MappingError> {
        self.take(key)
            .map(|value| into_structure(value, self.entity))
            .transpose()
    }

    pub(crate) fn entity<T: Denormalize>(&mut self, key: &str) -> Result<Option<T>, MappingError> {
        self.take(key).map(T::denormalize).transpose()
    }

    /// Unlike optional reads, an empty object is present here: `"response": {}`
    /// is a complete entity made of defaults.
    pub(crate) fn required_entity<T: Denormalize>(&mut self, key: &str) -> Result<T, MappingError> {
        match self.raw(key) {
            Some(value) => T::denormalize(value),
            None => Err(self.missing(key)),
        }
    }

    pub(crate) fn entity_list<T: Denormalize>(
        &mut self,
        key: &str,
    ) -> Result<Option<Vec<T>>, MappingError> {
        let Some(value) = self.take(key) else {
            return Ok(None);
        };
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(T::denormalize)
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            other => Err(MappingError::malformed(
                self.entity,
                format!("field '{key}' must be an array, got {}", json_type(&other)),
            )),
        }
    }

    pub(crate) fn entity_map<T: Denormalize>(
        &mut self,
        key: &str,
    ) -> Result<Option<BTreeMap<String, T>>, MappingError> {
        let Some(fields) = self.object(key)? else {
            return Ok(None);
        };
        fields
            .into_iter()
            .map(|(name, value)| T::denormalize(value).map(|entity| (name, entity)))
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Some)
    }

    /// Whatever was not read, for entities that pass the rest through.
    pub(crate) fn into_rest(self) -> Structure {
        self.structure
    }

    pub(crate) fn finish(self) {
        if !self.structure.is_empty() {
            let ignored: Vec<&String> = self.structure.keys().collect();
            trace!(entity = self.entity, ?ignored, "ignoring unrecognized fields");
        }
    }
}

/// Implements `serde::Deserialize` for entities by delegating to
/// [`Denormalize`].
macro_rules! deserialize_via_denormalize {
    ($($ty:ty),+ $(,)?) => {$(
        impl<'de> ::serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let value = <::serde_json::Value as ::serde::Deserialize>::deserialize(deserializer)?;
                <$ty as $crate::normalizer::Denormalize>::denormalize(value)
                    .map_err(::serde::de::Error::custom)
            }
        }
    )+};
}

pub(crate) use deserialize_via_denormalize;
