//! Serialization formats for documents and response bodies.
//!
//! # Data Flow
//! ```text
//! bytes (file on disk, request body)
//!     → Codec::decode → serde_json::Value
//!     → Document / field mapping
//!     → Codec::encode → bytes (file on disk, response body)
//! ```
//!
//! # Design Decisions
//! - Every format shares one generic value model (`serde_json::Value`)
//! - A codec that cannot handle an operation yet returns `CodecError::Unsupported`
//!   instead of producing empty output
//! - The registry is built once at startup and passed around by reference

pub mod json;
pub mod yaml;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

pub use json::JsonCodec;
pub use yaml::YamlCodec;

pub const MIME_TYPE_JSON: &str = "application/json";
pub const MIME_TYPE_YAML: &str = "application/yaml";

/// Errors raised while translating between bytes and values.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Input bytes are not valid for the format.
    #[error("Malformed {format} content: {message}")]
    Malformed { format: &'static str, message: String },

    /// Value could not be serialized.
    #[error("Failed to encode {format}: {message}")]
    Encode { format: &'static str, message: String },

    /// The codec does not implement this operation.
    #[error("{format} codec does not support {operation}")]
    Unsupported {
        format: &'static str,
        operation: &'static str,
    },

    /// Content decoded fine but has the wrong structure.
    #[error("Expected {expected}, got {actual}")]
    Shape {
        expected: &'static str,
        actual: &'static str,
    },
}

/// An encode/decode pair for one wire format.
pub trait Codec: fmt::Debug + Send + Sync {
    /// Short format name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Media type sent in the `Content-Type` header.
    fn content_type(&self) -> &'static str;

    /// File extensions (without the dot) handled by this codec.
    fn extensions(&self) -> &'static [&'static str];

    /// Extension (with the dot) appended to extension-less document paths.
    fn default_extension(&self) -> &'static str;

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError>;
}

/// Name of a value's variant, for shape errors.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Extract the bare media type from a `Content-Type` header value.
///
/// Parameters such as `charset=` are dropped. A missing or empty header
/// negotiates to JSON.
pub fn media_type(header: Option<&str>) -> String {
    match header.map(str::trim) {
        None | Some("") => MIME_TYPE_JSON.to_string(),
        Some(value) => value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase(),
    }
}

/// Lookup of codecs by media type and by file extension.
#[derive(Clone)]
pub struct CodecRegistry {
    by_media_type: HashMap<&'static str, Arc<dyn Codec>>,
    by_extension: HashMap<&'static str, Arc<dyn Codec>>,
    fallback: Arc<dyn Codec>,
}

impl CodecRegistry {
    /// Create a registry whose fallback (and first entry) is `fallback`.
    pub fn new(fallback: Arc<dyn Codec>) -> Self {
        let mut registry = Self {
            by_media_type: HashMap::new(),
            by_extension: HashMap::new(),
            fallback: fallback.clone(),
        };
        registry.register(fallback);
        registry
    }

    /// Register a codec under its media type and all of its extensions.
    pub fn register(&mut self, codec: Arc<dyn Codec>) {
        self.by_media_type.insert(codec.content_type(), codec.clone());
        for ext in codec.extensions() {
            self.by_extension.insert(*ext, codec.clone());
        }
    }

    /// Negotiate a codec from a request's `Content-Type` header.
    pub fn for_content_type(&self, header: Option<&str>) -> Option<Arc<dyn Codec>> {
        let mime = media_type(header);
        self.by_media_type.get(mime.as_str()).cloned()
    }

    /// Find the codec for a file extension; a leading dot is ignored.
    pub fn for_extension(&self, ext: &str) -> Option<Arc<dyn Codec>> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.by_extension.get(ext.as_str()).cloned()
    }

    /// Codec used when a route declares neither extension nor format.
    pub fn fallback(&self) -> Arc<dyn Codec> {
        self.fallback.clone()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        let mut registry = Self::new(Arc::new(JsonCodec));
        registry.register(Arc::new(YamlCodec));
        registry
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut media_types: Vec<_> = self.by_media_type.keys().collect();
        media_types.sort();
        f.debug_struct("CodecRegistry")
            .field("media_types", &media_types)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}
