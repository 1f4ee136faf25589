//! Query predicates, projection and record building.
//!
//! # Matching rules
//! - A record matches when, for every query key, at least one of the key's
//!   values equals the record's same-named field (AND across keys, OR across
//!   repeated values)
//! - Only textual fields take part; numbers, booleans, lists and objects
//!   never match
//! - Non-object records only match the empty query

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Multi-valued query parameters, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(BTreeMap<String, Vec<String>>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string; repeated keys accumulate values.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.map(|raw| url::form_urlencoded::parse(raw.as_bytes()).into_owned().collect())
            .unwrap_or_default()
    }

    /// Append a value to `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    /// Evaluate the query as a predicate over one record.
    pub fn matches(&self, record: &Value) -> bool {
        let Some(fields) = record.as_object() else {
            return self.is_empty();
        };

        self.0.iter().all(|(key, values)| match fields.get(key) {
            Some(Value::String(actual)) => values.iter().any(|v| v == actual),
            _ => false,
        })
    }

    /// Build a record from the query: one value gives a text field, several
    /// give a list of texts.
    pub fn to_record(&self) -> Map<String, Value> {
        self.0
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(key, values)| {
                let value = match values.as_slice() {
                    [single] => Value::String(single.clone()),
                    many => Value::Array(many.iter().cloned().map(Value::String).collect()),
                };
                (key.clone(), value)
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = Query::new();
        for (key, value) in iter {
            query.add(key, value);
        }
        query
    }
}

/// Keep only the allow-listed fields of an object record.
///
/// An empty allow-list and non-object records pass through untouched.
pub fn project(record: Value, fields: &[String]) -> Value {
    if fields.is_empty() {
        return record;
    }
    match record {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| fields.iter().any(|f| f == key))
                .collect(),
        ),
        other => other,
    }
}

/// Whether `existing` collides with `candidate` on every id field.
///
/// Both sides must hold the field as text with equal content; a missing or
/// non-textual field on either side means no collision.
pub fn conflicts(existing: &Value, candidate: &Map<String, Value>, id_fields: &[String]) -> bool {
    let Some(existing) = existing.as_object() else {
        return false;
    };

    id_fields.iter().all(|field| match (existing.get(field), candidate.get(field)) {
        (Some(Value::String(a)), Some(Value::String(b))) => a == b,
        _ => false,
    })
}
