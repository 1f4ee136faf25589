//! YAML codec placeholder.
//!
//! Registered so YAML routes and `application/yaml` requests resolve, but it
//! fails closed on every encode and decode.

use serde_json::Value;

use super::{Codec, CodecError, MIME_TYPE_YAML};

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl Codec for YamlCodec {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn content_type(&self) -> &'static str {
        MIME_TYPE_YAML
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["yaml", "yml"]
    }

    fn default_extension(&self) -> &'static str {
        ".yml"
    }

    fn encode(&self, _value: &Value) -> Result<Vec<u8>, CodecError> {
        Err(CodecError::Unsupported {
            format: "yaml",
            operation: "encode",
        })
    }

    fn decode(&self, _bytes: &[u8]) -> Result<Value, CodecError> {
        Err(CodecError::Unsupported {
            format: "yaml",
            operation: "decode",
        })
    }
}
