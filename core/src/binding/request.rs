#![deny(missing_docs)]

//! # Request Structure
//!
//! The HTTP boundary seen by the binder. Any server can fill a
//! [`RequestParts`] (query, params, body) and a [`ResponseLocals`] (values
//! injected by earlier middleware); [`RequestStructure`] maps each logical
//! [`Source`] onto those and reports keys no model field claims.

use crate::binding::error::BindError;
use crate::binding::lookup::{resolve_key, NamingMask};
use crate::binding::metadata::{flatten_compositions, FieldMetadata, Source};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// The parts of an incoming request the binder reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParts {
    /// Decoded query string.
    pub query: Map<String, Value>,
    /// Route path parameters.
    pub params: Map<String, Value>,
    /// Parsed JSON body; `Null` when the request had none.
    pub body: Value,
}

impl RequestParts {
    /// An empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Sets one query value.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Sets one path parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Decodes a raw `a=1&b=2&b=3` query string. Repeated keys become arrays.
    pub fn with_query_string(mut self, raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            let value = Value::String(value.into_owned());
            match self.query.get_mut(key.as_ref()) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    self.query.insert(key.into_owned(), value);
                }
            }
        }
        self
    }
}

/// Values attached to the response by earlier middleware.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseLocals {
    /// Injected values, read by `Source::Services` fields.
    pub locals: Map<String, Value>,
}

impl ResponseLocals {
    /// Empty locals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one local value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.locals.insert(key.into(), value.into());
        self
    }
}

/// Stateless adapter from [`Source`] to request data.
#[derive(Debug, Clone, Copy)]
pub struct RequestStructure<'r> {
    request: &'r RequestParts,
    locals: &'r ResponseLocals,
}

impl<'r> RequestStructure<'r> {
    /// Wraps a request and its locals.
    pub fn new(request: &'r RequestParts, locals: &'r ResponseLocals) -> Self {
        Self { request, locals }
    }

    /// The raw body.
    pub fn body(&self) -> &'r Value {
        &self.request.body
    }

    /// The key/value block backing `source`.
    ///
    /// An absent body yields `Ok(None)`. A body that is not a JSON object
    /// cannot hold named fields and yields an error message.
    pub fn scope(&self, source: Source) -> Result<Option<&'r Map<String, Value>>, String> {
        match source {
            Source::Body => match &self.request.body {
                Value::Object(map) => Ok(Some(map)),
                Value::Null => Ok(None),
                _ => Err("request body must be a JSON object".to_string()),
            },
            Source::Query => Ok(Some(&self.request.query)),
            Source::Params => Ok(Some(&self.request.params)),
            Source::Services => Ok(Some(&self.locals.locals)),
        }
    }

    /// Reports every key of `scope` that none of `fields` resolves to.
    pub fn report_unrecognized(
        &self,
        location: &str,
        scope: &Map<String, Value>,
        fields: &[FieldMetadata],
        mask: NamingMask,
        errors: &mut Vec<BindError>,
    ) {
        let claimed: HashSet<&str> = flatten_compositions(fields)
            .into_iter()
            .filter_map(|field| resolve_key(scope, &field.name, mask))
            .collect();

        for key in scope.keys() {
            if !claimed.contains(key.as_str()) {
                errors.push(BindError::structure(
                    format!("`{key}` is not a recognized field"),
                    location,
                ));
            }
        }
    }
}
