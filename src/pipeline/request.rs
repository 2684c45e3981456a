use std::collections::HashMap;
use std::sync::Arc;

use http::{Extensions, Method};
use serde_json::Value;
use smallvec::SmallVec;

use crate::ids::RequestId;

/// Maximum number of path/query parameters before heap allocation.
/// Most mounted pipelines carry ≤4 params (e.g. `/{tenant}/{channel}/...`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` because they come from patterns compiled at startup;
/// values are per-request data taken from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Stack-allocated header storage for the hot path
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// A request travelling through a [`Pipeline`](super::Pipeline).
///
/// `path` is the routing path as seen by the current layer. Mounted layers strip
/// their prefix from it and channel routers temporarily rewrite it; both put it back
/// before control leaves them. `original_path` never changes.
///
/// Request-scoped state attached by handlers (such as the channel candidate list)
/// lives in [`extensions`](Request::extensions).
#[derive(Debug, Clone)]
pub struct Request {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Routing path relative to the current mount point, without query string
    pub path: String,
    /// Path exactly as received, without query string
    pub original_path: String,
    /// Path parameters collected from mount prefixes and routes
    pub path_params: ParamVec,
    /// Query string parameters
    pub query_params: ParamVec,
    /// HTTP headers (lowercase names)
    pub headers: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
    extensions: Extensions,
}

impl Request {
    /// Build a request from a method and a request target such as `/alpha/stack?x=1`.
    ///
    /// The query string is split off and decoded into `query_params`. An empty target
    /// is treated as `/`.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        let path = if path.is_empty() { "/" } else { path };

        let mut query_params = ParamVec::new();
        if let Some(query) = query {
            for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
                query_params.push((Arc::from(k.as_ref()), v.into_owned()));
            }
        }

        Self {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            original_path: path.to_string(),
            path_params: ParamVec::new(),
            query_params,
            headers: HeaderVec::new(),
            body: None,
            extensions: Extensions::new(),
        }
    }

    /// Shorthand for a `GET` request
    #[must_use]
    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    /// Add a header, lowercasing its name
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .push((Arc::from(name.to_ascii_lowercase()), value.into()));
        self
    }

    /// Attach a JSON body
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Replace the generated request id (e.g. with one propagated from a proxy)
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics: a parameter captured by an inner mount
    /// shadows one with the same name captured further out.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name (last occurrence wins)
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Request-scoped typed state
    #[inline]
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable request-scoped typed state
    #[inline]
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Convert path_params to HashMap for diagnostics
    /// Note: This allocates - use get_path_param() in hot paths
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}
