//! Response delays: random distributions and chunked dribbling.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::MappingError;
use crate::normalizer::{
    denormalize_amended, deserialize_via_denormalize, rename_key, serialize_amended,
    AmendsDeserialization, AmendsSerialization, Denormalize, FieldReader, Structure,
};

/// Random delay added before the response is sent, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DelayDistribution {
    Uniform { lower: u64, upper: u64 },
    #[serde(rename = "lognormal")]
    LogNormal { median: f64, sigma: f64 },
}

/// Sends the body in `number_of_chunks` pieces spread over the total duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkedDribbleDelay {
    number_of_chunks: u32,
    total_duration_millis: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChunkedDribbleDelayDefault {
    number_of_chunks: u32,
    total_duration_millis: u64,
}

impl ChunkedDribbleDelay {
    pub fn new(number_of_chunks: u32, total_duration_millis: u64) -> Self {
        Self {
            number_of_chunks,
            total_duration_millis,
        }
    }

    pub fn number_of_chunks(&self) -> u32 {
        self.number_of_chunks
    }

    pub fn total_duration_millis(&self) -> u64 {
        self.total_duration_millis
    }
}

impl AmendsSerialization for ChunkedDribbleDelay {
    fn amend_post_normalization(normalized: Structure, _source: &Self) -> Structure {
        rename_key(normalized, "totalDurationMillis", "totalDuration")
    }
}

impl AmendsDeserialization for ChunkedDribbleDelay {
    fn amend_pre_denormalization(normalized: Structure) -> Result<Structure, MappingError> {
        Ok(rename_key(normalized, "totalDuration", "totalDurationMillis"))
    }
}

impl Serialize for ChunkedDribbleDelay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let default = ChunkedDribbleDelayDefault {
            number_of_chunks: self.number_of_chunks,
            total_duration_millis: self.total_duration_millis,
        };
        serialize_amended(self, &default, serializer)
    }
}

impl Denormalize for ChunkedDribbleDelay {
    const ENTITY: &'static str = "ChunkedDribbleDelay";

    fn from_structure(structure: Structure) -> Result<Self, MappingError> {
        let mut fields = FieldReader::new(Self::ENTITY, structure);
        let delay = ChunkedDribbleDelay {
            number_of_chunks: fields.required("numberOfChunks")?,
            total_duration_millis: fields.required("totalDurationMillis")?,
        };
        fields.finish();
        Ok(delay)
    }

    fn denormalize(value: Value) -> Result<Self, MappingError> {
        denormalize_amended(value)
    }
}

deserialize_via_denormalize!(ChunkedDribbleDelay);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::{denormalize, normalize};
    use serde_json::json;

    #[test]
    fn test_total_duration_renamed_on_the_wire() {
        let delay = ChunkedDribbleDelay::new(5, 1000);
        let wire = normalize(&delay).unwrap();
        assert_eq!(wire, json!({"numberOfChunks": 5, "totalDuration": 1000}));
        assert!(wire.get("totalDurationMillis").is_none());
        assert_eq!(denormalize::<ChunkedDribbleDelay>(wire).unwrap(), delay);
    }

    #[test]
    fn test_canonical_name_is_also_read() {
        let delay: ChunkedDribbleDelay =
            denormalize(json!({"numberOfChunks": 5, "totalDurationMillis": 1000})).unwrap();
        assert_eq!(delay.total_duration_millis(), 1000);
    }

    #[test]
    fn test_distribution_shapes() {
        assert_eq!(
            serde_json::to_value(DelayDistribution::Uniform {
                lower: 10,
                upper: 20
            })
            .unwrap(),
            json!({"type": "uniform", "lower": 10, "upper": 20})
        );
        assert_eq!(
            serde_json::to_value(DelayDistribution::LogNormal {
                median: 80.0,
                sigma: 0.4
            })
            .unwrap(),
            json!({"type": "lognormal", "median": 80.0, "sigma": 0.4})
        );
    }
}
