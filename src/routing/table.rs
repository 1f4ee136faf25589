//! Route table: the immutable set of configured routes.
//!
//! # Responsibilities
//! - Store resolved routes keyed by `path + "_" + method`
//! - Compile `{name}` template routes into one radix tree per method
//! - Reject duplicate `(path, method)` pairs at construction
//!
//! # Design Decisions
//! - Immutable after construction (shared across handlers without locks)
//! - Literal and template routes live in separate indexes so a literal
//!   path can never be shadowed by a template

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::codec::CodecRegistry;
use crate::config::RouteConfig;
use crate::routing::route::{is_template, route_key, Method, Route};

/// Errors raised while building the route table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTableError {
    #[error("Unsupported method '{method}' for route {path}")]
    UnknownMethod { path: String, method: String },

    #[error("Unknown file format '{format}' for route {path}")]
    UnknownFormat { path: String, format: String },

    #[error("Duplicate route: {method} {path}")]
    DuplicateRoute { path: String, method: String },

    #[error("Invalid route template {path}: {message}")]
    InvalidTemplate { path: String, message: String },
}

/// Parameters bound by a template match, in path order.
pub type TemplateParams = Vec<(String, String)>;

#[derive(Default)]
pub struct RouteTable {
    exact: HashMap<String, Arc<Route>>,
    templates: HashMap<Method, matchit::Router<Arc<Route>>>,
    template_count: usize,
}

impl RouteTable {
    /// Build the table from resolved routes.
    pub fn new(routes: Vec<Route>) -> Result<Self, RouteTableError> {
        let mut table = Self::default();
        let mut seen = HashSet::new();

        for route in routes {
            let key = route.key();
            if !seen.insert(key.clone()) {
                return Err(RouteTableError::DuplicateRoute {
                    path: route.path.clone(),
                    method: route.method.to_string(),
                });
            }

            let route = Arc::new(route);
            if is_template(&route.path) {
                table
                    .templates
                    .entry(route.method)
                    .or_default()
                    .insert(route.path.clone(), route.clone())
                    .map_err(|e| RouteTableError::InvalidTemplate {
                        path: route.path.clone(),
                        message: e.to_string(),
                    })?;
                table.template_count += 1;
            } else {
                table.exact.insert(key, route);
            }
        }

        Ok(table)
    }

    /// Resolve every configured route against `root` and build the table.
    pub fn from_config(
        configs: &[RouteConfig],
        root: &Path,
        codecs: &CodecRegistry,
    ) -> Result<Self, RouteTableError> {
        let routes = configs
            .iter()
            .map(|config| Route::from_config(config, root, codecs))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(routes)
    }

    /// Exact lookup by literal path and raw method name.
    pub fn get(&self, path: &str, method: &str) -> Option<Arc<Route>> {
        self.exact.get(&route_key(path, method)).cloned()
    }

    /// Match a path against the template routes of `method`.
    pub fn find_template(&self, path: &str, method: Method) -> Option<(Arc<Route>, TemplateParams)> {
        let tree = self.templates.get(&method)?;
        let matched = tree.at(path).ok()?;
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Some((matched.value.clone(), params))
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.template_count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Literal routes, in no particular order.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.exact.values()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.exact.keys().collect();
        keys.sort();
        f.debug_struct("RouteTable")
            .field("exact", &keys)
            .field("templates", &self.template_count)
            .finish()
    }
}
