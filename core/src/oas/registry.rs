#![deny(missing_docs)]

//! # Route Registry
//!
//! The explicit table of metadata-described routes that the definitions and
//! paths generators walk. Each route pairs a verb and Express-style path with
//! the request model's [`MetadataWrapper`] and any runtime response samples.

use crate::binding::{MetadataWrapper, ModelRef};
use http::Method;
use indexmap::IndexMap;
use serde_json::Value;

/// A sample response body recorded against a status code.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSample {
    /// HTTP status code.
    pub status: u16,
    /// Captured body. `None` documents a status without a body.
    pub sample: Option<Value>,
    /// Overrides the canonical reason phrase.
    pub description: Option<String>,
}

/// One registered endpoint.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    /// HTTP verb.
    pub method: Method,
    /// Express-style path (`/wells/:id`).
    pub path: String,
    /// Request model snapshot.
    pub request: MetadataWrapper,
    /// Status-indexed samples, in registration order.
    pub responses: Vec<ResponseSample>,
    /// Operation summary.
    pub summary: Option<String>,
    /// Operation tags.
    pub tags: Vec<String>,
    /// Extra vendor extensions copied onto the operation.
    pub extensions: IndexMap<String, Value>,
}

impl RouteSpec {
    /// A route without samples.
    pub fn new(method: Method, path: impl Into<String>, request: ModelRef) -> Self {
        Self {
            method,
            path: path.into(),
            request: MetadataWrapper::new(request),
            responses: Vec::new(),
            summary: None,
            tags: Vec::new(),
            extensions: IndexMap::new(),
        }
    }

    /// Records a response body sample.
    pub fn respond(mut self, status: u16, sample: Value) -> Self {
        self.responses.push(ResponseSample {
            status,
            sample: Some(sample),
            description: None,
        });
        self
    }

    /// Records a body-less status.
    pub fn respond_empty(mut self, status: u16, description: impl Into<String>) -> Self {
        self.responses.push(ResponseSample {
            status,
            sample: None,
            description: Some(description.into()),
        });
        self
    }

    /// Sets the summary.
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Adds a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Adds a vendor extension.
    pub fn extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }
}

/// Routes of one resource sharing an operation id prefix.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    /// Prefix inserted into every operation id.
    pub id_prefix: String,
    /// Registered routes.
    pub routes: Vec<RouteSpec>,
}

impl RouteRegistry {
    /// An empty registry.
    pub fn new(id_prefix: impl Into<String>) -> Self {
        Self {
            id_prefix: id_prefix.into(),
            routes: Vec::new(),
        }
    }

    /// Registers a route.
    pub fn route(mut self, route: RouteSpec) -> Self {
        self.routes.push(route);
        self
    }
}
