//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//! - Resolve every route once to catch unknown methods and formats
//! - Detect duplicate `(path, method)` pairs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MockConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;

use crate::codec::CodecRegistry;
use crate::config::schema::MockConfig;
use crate::routing::{Route, RouteTableError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid listener.bind_address '{0}'")]
    BindAddress(String),

    #[error("invalid observability.metrics_address '{0}'")]
    MetricsAddress(String),

    #[error("storage.db_root must not be empty")]
    EmptyRoot,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("limits.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("route {route}: {source}")]
    Route {
        route: String,
        #[source]
        source: RouteTableError,
    },

    #[error("route {route}: empty name in {list}")]
    EmptyField { route: String, list: &'static str },

    #[error("duplicate route {method} {path}")]
    DuplicateRoute { path: String, method: String },
}

pub fn validate_config(config: &MockConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if config.storage.db_root.trim().is_empty() {
        errors.push(ValidationError::EmptyRoot);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let codecs = CodecRegistry::default();
    let root = Path::new(&config.storage.db_root);
    let mut seen = HashSet::new();

    for route_config in &config.routes {
        let label = route_config
            .name
            .clone()
            .unwrap_or_else(|| route_config.path.clone());

        for (list, names) in [("id", &route_config.id), ("fields", &route_config.fields)] {
            if names.iter().any(|n| n.trim().is_empty()) {
                errors.push(ValidationError::EmptyField {
                    route: label.clone(),
                    list,
                });
            }
        }

        match Route::from_config(route_config, root, &codecs) {
            Ok(route) => {
                if !seen.insert(route.key()) {
                    errors.push(ValidationError::DuplicateRoute {
                        path: route.path,
                        method: route.method.to_string(),
                    });
                }
            }
            Err(source) => errors.push(ValidationError::Route { route: label, source }),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
