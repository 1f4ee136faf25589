//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the mock server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the mock server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MockConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Document root and dynamic routing.
    pub storage: StorageConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Config hot reload.
    pub reload: ReloadConfig,

    /// Static route definitions.
    pub routes: Vec<RouteConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Document storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the backing documents.
    pub db_root: String,

    /// Synthesize a route for requests that match no configured route.
    pub dynamic_route: bool,

    /// Log filesystem changes under `db_root`.
    pub watch_documents: bool,
}

pub const DEFAULT_DB_ROOT: &str = "http-server-root";

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_root: DEFAULT_DB_ROOT.to_string(),
            dynamic_route: true,
            watch_documents: false,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Hot reload of the route table when the config file changes.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ReloadConfig {
    pub enabled: bool,
}

/// One configured endpoint, before resolution against the document root.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouteConfig {
    /// Route identifier for logging.
    pub name: Option<String>,

    /// Request path; may contain `{name}` template segments.
    pub path: String,

    /// HTTP method, GET when empty.
    pub method: String,

    /// `read`, `write`, `append`, `delete` (or `r`, `w`, `a`, `d`).
    pub action: String,

    /// Format used when the file has no extension (`json`, `yaml`, `yml`).
    pub format: String,

    /// Backing file relative to the document root. Derived from `path` when empty.
    pub file: String,

    /// Document holds one object instead of a collection.
    pub single: bool,

    /// Fields forming the uniqueness key for appends.
    pub id: Vec<String>,

    /// Projection allow-list for reads.
    pub fields: Vec<String>,

    /// Return a lone matching record instead of a one-element list.
    pub unique_not_list: bool,
}
