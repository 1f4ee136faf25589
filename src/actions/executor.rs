//! Read, write, append and delete against a route's document.
//!
//! # State Machine (per request)
//! ```text
//! Dispatch → { Read | Write | Append | Delete } → Respond
//! ```
//! Any error short-circuits to the response; the document is rewritten only
//! after the whole in-memory mutation succeeded.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::actions::query::{conflicts, project, Query};
use crate::codec::{value_kind, CodecError};
use crate::observability::metrics;
use crate::routing::{Action, Route};
use crate::store::{DocumentStore, StoreError};

/// Failures of a single action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Read of a document that does not exist.
    #[error("Document not found")]
    NotFound,

    /// Append would duplicate an existing record's id fields.
    #[error("Record with the same {fields:?} already exists")]
    Conflict { fields: Vec<String> },

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Request body or response could not be encoded/decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Encoded response body for a successful action.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub body: Vec<u8>,
    pub content_type: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct Executor {
    store: DocumentStore,
}

impl Executor {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Run the route's action and encode the result with the route's codec.
    ///
    /// The file lock is held until the reply is encoded.
    pub async fn execute(&self, route: &Route, query: &Query, body: &[u8]) -> Result<Reply, ActionError> {
        let _guard = self.store.lock(route, route.action.is_mutation()).await;

        let value = match route.action {
            Action::Read => self.read(route, query).await?,
            Action::Write => self.write(route, query, body).await?,
            Action::Append => self.append(route, query, body).await?,
            Action::Delete => self.delete(route, query).await?,
        };

        Ok(Reply {
            body: route.codec.encode(&value)?,
            content_type: route.codec.content_type(),
        })
    }

    async fn read(&self, route: &Route, query: &Query) -> Result<Value, ActionError> {
        if !self.store.exists(route).await? {
            return Err(ActionError::NotFound);
        }
        let document = self.store.load(route).await?;

        if route.single {
            return Ok(Value::Object(document.datum));
        }

        let mut records: Vec<Value> = document
            .data
            .into_iter()
            .filter(|record| query.matches(record))
            .map(|record| project(record, &route.fields))
            .collect();

        if route.collapse_singleton && records.len() == 1 {
            return Ok(records.remove(0));
        }
        Ok(Value::Array(records))
    }

    async fn write(&self, route: &Route, query: &Query, body: &[u8]) -> Result<Value, ActionError> {
        let mut document = self.store.load_or_create(route).await?;

        if route.single {
            document.datum = new_record(route, query, body)?;
        } else {
            document.data = new_records(route, query, body)?;
        }

        self.store.replace(route, &document).await?;
        Ok(document.response_for(route.action))
    }

    async fn append(&self, route: &Route, query: &Query, body: &[u8]) -> Result<Value, ActionError> {
        let mut document = self.store.load_or_create(route).await?;
        let record = new_record(route, query, body)?;

        if !route.id_fields.is_empty()
            && document
                .data
                .iter()
                .any(|existing| conflicts(existing, &record, &route.id_fields))
        {
            metrics::record_conflict(&route.path);
            return Err(ActionError::Conflict {
                fields: route.id_fields.clone(),
            });
        }

        document.data.push(Value::Object(record));
        self.store.replace(route, &document).await?;
        Ok(document.response_for(route.action))
    }

    async fn delete(&self, route: &Route, query: &Query) -> Result<Value, ActionError> {
        let mut document = self.store.load_or_create(route).await?;

        // Without a predicate nothing is removed.
        if query.is_empty() {
            return Ok(document.response_for(route.action));
        }

        let before = document.data.len();
        document.data.retain(|record| !query.matches(record));
        tracing::debug!(
            route = %route.label(),
            removed = before - document.data.len(),
            "Deleted records"
        );

        self.store.replace(route, &document).await?;
        Ok(document.response_for(route.action))
    }
}

/// Fields of a new record: from the query for GET/DELETE, from the body for
/// POST/PUT.
fn new_record(route: &Route, query: &Query, body: &[u8]) -> Result<Map<String, Value>, CodecError> {
    if !route.method.carries_body() {
        return Ok(query.to_record());
    }
    match route.codec.decode(body)? {
        Value::Object(map) => Ok(map),
        other => Err(CodecError::Shape {
            expected: "object",
            actual: value_kind(&other),
        }),
    }
}

/// Replacement `data` for a write on a collection route; a list body replaces
/// the collection as is.
fn new_records(route: &Route, query: &Query, body: &[u8]) -> Result<Vec<Value>, CodecError> {
    if !route.method.carries_body() {
        return Ok(vec![Value::Object(query.to_record())]);
    }
    match route.codec.decode(body)? {
        Value::Array(records) => Ok(records),
        Value::Object(map) => Ok(vec![Value::Object(map)]),
        other => Err(CodecError::Shape {
            expected: "object or list",
            actual: value_kind(&other),
        }),
    }
}
