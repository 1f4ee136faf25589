//! JSON codec.

use serde_json::Value;

use super::{Codec, CodecError, MIME_TYPE_JSON};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn content_type(&self) -> &'static str {
        MIME_TYPE_JSON
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn default_extension(&self) -> &'static str {
        ".json"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Encode {
            format: "json",
            message: e.to_string(),
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed {
            format: "json",
            message: e.to_string(),
        })
    }
}
