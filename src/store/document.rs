//! On-disk document layout.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use crate::codec::{value_kind, Codec, CodecError};
use crate::routing::Action;

/// The unit stored in one route's backing file.
///
/// ```text
/// {
///   "post_response": {...},   // optional override for write/append
///   "del_response":  {...},   // optional override for delete
///   "datum":  {...},          // single-object routes
///   "data":   [ {...}, ... ]  // collection routes
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Map::is_empty")]
    pub post_response: Map<String, Value>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Map::is_empty")]
    pub del_response: Map<String, Value>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Map::is_empty")]
    pub datum: Map<String, Value>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Document {
    /// Decode file content; blank content is an empty document.
    pub fn decode(bytes: &[u8], codec: &dyn Codec) -> Result<Self, CodecError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let value = codec.decode(bytes)?;
        if !value.is_object() {
            return Err(CodecError::Shape {
                expected: "document object",
                actual: value_kind(&value),
            });
        }
        serde_json::from_value(value).map_err(|e| CodecError::Malformed {
            format: codec.name(),
            message: e.to_string(),
        })
    }

    pub fn encode(&self, codec: &dyn Codec) -> Result<Vec<u8>, CodecError> {
        let value = serde_json::to_value(self).map_err(|e| CodecError::Encode {
            format: codec.name(),
            message: e.to_string(),
        })?;
        codec.encode(&value)
    }

    /// Body returned after a successful mutation.
    ///
    /// Delete uses `del_response`, every other action `post_response`; an
    /// empty override falls back to `{"success": true}`.
    pub fn response_for(&self, action: Action) -> Value {
        let canned = match action {
            Action::Delete => &self.del_response,
            _ => &self.post_response,
        };
        if canned.is_empty() {
            json!({ "success": true })
        } else {
            Value::Object(canned.clone())
        }
    }
}
