//! Resolved endpoint descriptors.
//!
//! A [`Route`] binds a `(path, method)` pair to an action, a backing document
//! and the codec used to read and write it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::codec::{Codec, CodecRegistry};
use crate::config::RouteConfig;
use crate::routing::table::RouteTableError;

/// Field used as uniqueness key on dynamic routes.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Returned when a method name is not one of GET, POST, PUT, DELETE.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported method: {0}")]
pub struct UnsupportedMethod(pub String);

/// HTTP methods a route can be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Action performed when the route does not name one.
    pub fn default_action(self) -> Action {
        match self {
            Method::Get => Action::Read,
            Method::Post | Method::Put => Action::Append,
            Method::Delete => Action::Delete,
        }
    }

    /// POST and PUT carry new fields in the body; GET and DELETE in the query.
    pub fn carries_body(self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl FromStr for Method {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(UnsupportedMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic operation a route performs on its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Write,
    Append,
    Delete,
}

impl Action {
    /// Parse a configured action by name or one-letter code, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "r" | "read" => Some(Action::Read),
            "w" | "write" => Some(Action::Write),
            "a" | "append" => Some(Action::Append),
            "d" | "delete" => Some(Action::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Append => "append",
            Action::Delete => "delete",
        }
    }

    pub fn is_mutation(self) -> bool {
        !matches!(self, Action::Read)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup key of the route table: `path + "_" + method`.
pub fn route_key(path: &str, method: &str) -> String {
    format!("{}_{}", path, method)
}

/// Path with a leading slash.
pub fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Whether the path declares `{name}` segments.
pub fn is_template(path: &str) -> bool {
    path.contains('{')
}

/// The part of a path before its first template segment.
///
/// `/users/{id}` yields `/users`, a path without templates is returned as is.
pub fn literal_prefix(path: &str) -> &str {
    match path.find("/{") {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => path,
    }
}

/// A resolved endpoint descriptor.
#[derive(Debug, Clone)]
pub struct Route {
    /// Label from the configuration, if any.
    pub name: Option<String>,
    /// Normalized request path, always prefixed with `/`.
    pub path: String,
    pub method: Method,
    pub action: Action,
    /// Backing document.
    pub file: PathBuf,
    pub codec: Arc<dyn Codec>,
    /// Document holds a single `datum` instead of a `data` collection.
    pub single: bool,
    /// Uniqueness key checked on append.
    pub id_fields: Vec<String>,
    /// Projection allow-list for reads; empty keeps every field.
    pub fields: Vec<String>,
    /// Return a lone matching record instead of a one-element list.
    pub collapse_singleton: bool,
}

impl Route {
    /// Resolve a configured route against the document root.
    pub fn from_config(
        config: &RouteConfig,
        root: &Path,
        codecs: &CodecRegistry,
    ) -> Result<Self, RouteTableError> {
        let path = normalize_path(&config.path);

        let method_name = match config.method.trim() {
            "" => "GET".to_string(),
            m => m.to_uppercase(),
        };
        let method: Method = method_name
            .parse()
            .map_err(|_| RouteTableError::UnknownMethod {
                path: path.clone(),
                method: method_name.clone(),
            })?;

        let action = if config.action.trim().is_empty() {
            method.default_action()
        } else {
            match Action::parse(&config.action) {
                Some(action) => action,
                None => {
                    tracing::warn!(
                        path = %path,
                        action = %config.action,
                        "Unknown action, using method default"
                    );
                    method.default_action()
                }
            }
        };

        let format = config.format.trim().trim_start_matches('.').to_lowercase();
        let file = if config.file.trim().is_empty() {
            root.join(default_file_name(&path, &format))
        } else {
            root.join(config.file.trim().trim_start_matches('/'))
        };

        let codec = match file.extension().and_then(|e| e.to_str()) {
            Some(ext) => codecs.for_extension(ext),
            None if format.is_empty() => Some(codecs.fallback()),
            None => codecs.for_extension(&format),
        };
        let codec = codec.ok_or_else(|| RouteTableError::UnknownFormat {
            path: path.clone(),
            format: file
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_string)
                .unwrap_or(format.clone()),
        })?;

        Ok(Self {
            name: config.name.clone(),
            path,
            method,
            action,
            file,
            codec,
            single: config.single,
            id_fields: config.id.clone(),
            fields: config.fields.clone(),
            collapse_singleton: config.unique_not_list,
        })
    }

    /// Synthesize a route for a request that matched nothing configured.
    pub fn dynamic(path: &str, method: Method, codec: Arc<dyn Codec>, root: &Path) -> Self {
        let mut relative = path.trim_start_matches('/').to_string();
        if relative.is_empty() || relative.ends_with('/') {
            relative.push_str("index");
        }
        if Path::new(&relative).extension().is_none() {
            relative.push_str(codec.default_extension());
        }

        Self {
            name: None,
            path: normalize_path(path),
            method,
            action: method.default_action(),
            file: root.join(relative),
            codec,
            single: false,
            id_fields: vec![DEFAULT_ID_FIELD.to_string()],
            fields: Vec::new(),
            collapse_singleton: false,
        }
    }

    pub fn key(&self) -> String {
        route_key(&self.path, self.method.as_str())
    }

    /// Name for logs: the configured label, else the path.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.path)
    }
}

/// Document file derived from a route path when none is configured.
fn default_file_name(path: &str, format: &str) -> String {
    let relative = literal_prefix(path).trim_start_matches('/');
    if Path::new(relative).extension().is_some() {
        return relative.to_string();
    }

    let mut name = relative.to_string();
    if name.is_empty() || name.ends_with('/') {
        name.push_str("index");
    }
    if format.is_empty() {
        name.push_str(".json");
    } else {
        name.push('.');
        name.push_str(format);
    }
    name
}
