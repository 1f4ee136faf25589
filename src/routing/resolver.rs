//! Request-to-route resolution.
//!
//! # Responsibilities
//! - Exact `(path, method)` lookup
//! - `{name}` template matching
//! - Positional path-variable inference
//! - Dynamic route synthesis when nothing configured matches
//!
//! # Design Decisions
//! - Exact literal routes always win, then templates, then inference
//! - Inferred and template parameters are merged into the request query
//! - The resolver is an immutable value; reloads swap the whole resolver

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::actions::query::Query;
use crate::codec::{media_type, CodecRegistry};
use crate::config::MockConfig;
use crate::routing::route::{Method, Route};
use crate::routing::table::{RouteTable, RouteTableError};

/// Why a request could not be routed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("No route for {method} {path}")]
    NotFound { method: String, path: String },

    #[error("Method not supported: {0}")]
    MethodNotAllowed(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
}

/// A route selected for a request, with its effective query.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub route: Arc<Route>,
    pub query: Query,
    /// The route was synthesized rather than configured.
    pub dynamic: bool,
}

#[derive(Debug)]
pub struct Resolver {
    table: RouteTable,
    codecs: Arc<CodecRegistry>,
    /// Document root for synthesized routes; `None` disables dynamic routing.
    dynamic_root: Option<PathBuf>,
}

impl Resolver {
    pub fn new(table: RouteTable, codecs: Arc<CodecRegistry>, dynamic_root: Option<PathBuf>) -> Self {
        Self {
            table,
            codecs,
            dynamic_root,
        }
    }

    /// Build the route table and resolver described by `config`.
    pub fn from_config(config: &MockConfig, codecs: Arc<CodecRegistry>) -> Result<Self, RouteTableError> {
        let root = PathBuf::from(&config.storage.db_root);
        let table = RouteTable::from_config(&config.routes, &root, &codecs)?;
        let dynamic_root = config.storage.dynamic_route.then_some(root);
        Ok(Self::new(table, codecs, dynamic_root))
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn dynamic_enabled(&self) -> bool {
        self.dynamic_root.is_some()
    }

    /// Find the route for a request, synthesizing one when allowed.
    pub fn resolve(
        &self,
        path: &str,
        method: &str,
        content_type: Option<&str>,
        query: Query,
    ) -> Result<Resolved, RouteError> {
        let query = match self.match_route(path, method, query) {
            Ok((route, query)) => {
                return Ok(Resolved {
                    route,
                    query,
                    dynamic: false,
                })
            }
            Err(query) => query,
        };

        let Some(root) = &self.dynamic_root else {
            return Err(RouteError::NotFound {
                method: method.to_string(),
                path: path.to_string(),
            });
        };

        let method: Method = method
            .parse()
            .map_err(|_| RouteError::MethodNotAllowed(method.to_string()))?;

        let codec = self
            .codecs
            .for_content_type(content_type)
            .ok_or_else(|| RouteError::UnsupportedMediaType(media_type(content_type)))?;

        if escapes_root(path) {
            return Err(RouteError::NotFound {
                method: method.to_string(),
                path: path.to_string(),
            });
        }

        let route = Route::dynamic(path, method, codec, root);
        tracing::debug!(
            path = %path,
            method = %method,
            file = ?route.file,
            "Synthesized dynamic route"
        );

        Ok(Resolved {
            route: Arc::new(route),
            query,
            dynamic: true,
        })
    }

    /// Match against configured routes only.
    ///
    /// On success returns the route and the query augmented with any bound
    /// path variables; on failure hands the untouched query back.
    pub fn match_route(&self, path: &str, method: &str, mut query: Query) -> Result<(Arc<Route>, Query), Query> {
        if let Some(route) = self.table.get(path, method) {
            return Ok((route, query));
        }

        if let Ok(m) = method.parse::<Method>() {
            if let Some((route, params)) = self.table.find_template(path, m) {
                for (name, value) in params {
                    query.add(name, value);
                }
                return Ok((route, query));
            }
        }

        match self.infer_path_variables(path, method) {
            Some((route, inferred)) => {
                for (name, value) in inferred {
                    query.add(name, value);
                }
                Ok((route, query))
            }
            None => Err(query),
        }
    }

    /// Positional inference: peel `(name, value)` segment pairs off the tail
    /// until the remaining prefix is a configured route.
    fn infer_path_variables(&self, path: &str, method: &str) -> Option<(Arc<Route>, Vec<(String, String)>)> {
        if path.ends_with('/') {
            return None;
        }

        let segments: Vec<&str> = path.strip_prefix('/').unwrap_or(path).split('/').collect();
        if segments.len() < 2 {
            return None;
        }

        if segments.len() == 2 {
            if let Some(route) = self.table.get("/", method) {
                return Some((route, vec![(segments[0].to_string(), segments[1].to_string())]));
            }
        }

        let mut inferred: Vec<(String, String)> = Vec::new();
        let mut remaining = &segments[..];
        while let [prefix @ .., name, value] = remaining {
            bind(&mut inferred, name, value);
            remaining = prefix;

            let candidate = format!("/{}", remaining.join("/"));
            if let Some(route) = self.table.get(&candidate, method) {
                return Some((route, inferred));
            }
        }

        None
    }
}

/// Record an inferred pair; a name peeled again (closer to the root) replaces
/// the earlier binding.
fn bind(inferred: &mut Vec<(String, String)>, name: &str, value: &str) {
    match inferred.iter_mut().find(|(n, _)| n == name) {
        Some(existing) => existing.1 = value.to_string(),
        None => inferred.push((name.to_string(), value.to_string())),
    }
}

/// Whether a request path would leave the document root.
fn escapes_root(path: &str) -> bool {
    Path::new(path.trim_start_matches('/'))
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
}
