use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use http::Method;
use tracing::{debug, error, info, trace};

use super::handler::{endpoint, BoxedHandler, Handler, HandlerResult, Next};
use super::path::PathPattern;
use super::request::Request;
use super::response::Response;

/// Ordered stack of layers: plain handlers, prefix mounts and routes.
///
/// A `Pipeline` is itself a [`Handler`], so pipelines nest: mounting one pipeline
/// inside another gives it a path relative to the mount point, and falling off its
/// end continues with whatever follows the mount in the parent.
///
/// Layers are frozen into a shared slice as they are added; cloning a pipeline is
/// an `Arc` bump.
#[derive(Clone)]
pub struct Pipeline {
    layers: Arc<[BoxedHandler]>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Create an empty pipeline. Requests fall straight through it.
    #[must_use]
    pub fn new() -> Self {
        Self {
            layers: Arc::from(Vec::new()),
        }
    }

    fn push(self, layer: BoxedHandler) -> Self {
        let mut layers = self.layers.to_vec();
        layers.push(layer);
        Self {
            layers: layers.into(),
        }
    }

    /// Append a handler that sees every request reaching this point
    #[must_use]
    pub fn layer(self, handler: impl Handler) -> Self {
        self.push(Arc::new(handler))
    }

    /// Append a handler that only sees requests under `prefix`.
    ///
    /// Inside the mount the request path is relative to the prefix and any
    /// parameters captured by the prefix are visible. Both are undone if the
    /// mounted handler passes the request on.
    #[must_use]
    pub fn mount(self, prefix: &str, handler: impl Handler) -> Self {
        self.push(Arc::new(Mount {
            pattern: PathPattern::parse(prefix),
            inner: Arc::new(handler),
        }))
    }

    /// Append a handler for `method` requests whose path is exactly `path`
    #[must_use]
    pub fn route(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.push(Arc::new(Route {
            method,
            pattern: PathPattern::parse(path),
            handler: Arc::new(handler),
        }))
    }

    /// Append a `GET` endpoint
    #[must_use]
    pub fn get<F>(self, path: &str, responder: F) -> Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.route(Method::GET, path, endpoint(responder))
    }

    /// Number of layers
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the pipeline has no layers
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Run a request through the pipeline as the outermost stage.
    ///
    /// Requests nobody answers get a `404`; handler errors and panics are logged
    /// and turned into a `500` carrying the error message.
    pub async fn handle(&self, req: Request) -> Response {
        let request_id = req.request_id;
        let method = req.method.clone();
        let path = req.original_path.clone();

        // P1: Request entering pipeline
        debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            layers = self.layers.len(),
            "Request entering pipeline"
        );

        let chain = Next::chain(Arc::clone(&self.layers), Next::end());
        let outcome = AssertUnwindSafe(async move { chain.run(req).await })
            .catch_unwind()
            .await;
        let result = match outcome {
            Ok(result) => result,
            Err(panic) => {
                // P4: Handler panic caught - CRITICAL
                let panic_message = panic_message(panic.as_ref());
                error!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    panic_message = %panic_message,
                    "Handler panicked"
                );
                return Response::error(500, &format!("Handler panicked: {panic_message}"));
            }
        };

        match result {
            Ok(response) => {
                // P2: Response produced
                info!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    status = response.status,
                    "Request completed"
                );
                response
            }
            Err(err) => {
                // P3: Error path - CRITICAL
                error!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    error = %format!("{err:#}"),
                    "Request failed"
                );
                Response::error(500, &format!("{err:#}"))
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl Handler for Pipeline {
    fn call(&self, req: Request, next: Next) -> BoxFuture<'_, HandlerResult> {
        Next::chain(Arc::clone(&self.layers), next).run(req)
    }
}

struct Mount {
    pattern: PathPattern,
    inner: BoxedHandler,
}

impl Handler for Mount {
    fn call(&self, mut req: Request, next: Next) -> BoxFuture<'_, HandlerResult> {
        let Some(matched) = self.pattern.match_prefix(&req.path) else {
            return next.run(req);
        };

        trace!(
            request_id = %req.request_id,
            prefix = %self.pattern,
            path = %req.path,
            rest = %matched.rest,
            "Mount matched"
        );

        let saved_path = std::mem::replace(&mut req.path, matched.rest);
        let saved_params = req.path_params.len();
        req.path_params.extend(matched.params);

        let next = next.on_exit(move |req| {
            req.path = saved_path;
            req.path_params.truncate(saved_params);
        });
        self.inner.call(req, next)
    }
}

struct Route {
    method: Method,
    pattern: PathPattern,
    handler: BoxedHandler,
}

impl Route {
    fn accepts(&self, method: &Method) -> bool {
        self.method == *method || (self.method == Method::GET && *method == Method::HEAD)
    }
}

impl Handler for Route {
    fn call(&self, mut req: Request, next: Next) -> BoxFuture<'_, HandlerResult> {
        if !self.accepts(&req.method) {
            return next.run(req);
        }
        let Some(params) = self.pattern.match_exact(&req.path) else {
            return next.run(req);
        };

        trace!(
            request_id = %req.request_id,
            route = %self.pattern,
            method = %req.method,
            "Route matched"
        );

        let saved_params = req.path_params.len();
        req.path_params.extend(params);
        let next = next.on_exit(move |req| req.path_params.truncate(saved_params));
        self.handler.call(req, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::handler_fn;
    use futures::executor::block_on;

    #[test]
    fn test_get_route_answers() {
        let app = Pipeline::new().get("/original", |_req| Response::text("Original Content"));
        let res = block_on(app.handle(Request::get("/original")));
        assert_eq!(res.status, 200);
        assert_eq!(res.body_text(), Some("Original Content"));
    }

    #[test]
    fn test_unmatched_is_not_found() {
        let app = Pipeline::new().get("/original", |_req| Response::text("Original Content"));
        let res = block_on(app.handle(Request::get("/missing")));
        assert_eq!(res.status, 404);
        let res = block_on(app.handle(Request::new(Method::POST, "/original")));
        assert_eq!(res.status, 404);
    }

    #[test]
    fn test_head_is_served_by_get_route() {
        let app = Pipeline::new().get("/x", |_req| Response::text("x"));
        let res = block_on(app.handle(Request::new(Method::HEAD, "/x")));
        assert_eq!(res.status, 200);
    }

    #[test]
    fn test_mount_strips_prefix_and_exposes_params() {
        let inner = Pipeline::new().get("/beta", |req| {
            Response::text(format!(
                "{} {}",
                req.get_path_param("channel").unwrap_or("-"),
                req.path
            ))
        });
        let app = Pipeline::new().mount("/{channel}/router", inner);
        let res = block_on(app.handle(Request::get("/beta/router/beta")));
        assert_eq!(res.body_text(), Some("beta /beta"));
    }

    #[test]
    fn test_mount_restores_path_when_inner_declines() {
        let app = Pipeline::new()
            .mount("/stack", Pipeline::new().get("/alpha", |_req| Response::text("a")))
            .layer(endpoint(|req: &Request| {
                Response::text(format!("{}|{}", req.path, req.path_params.len()))
            }));
        let res = block_on(app.handle(Request::get("/stack/original")));
        assert_eq!(res.body_text(), Some("/stack/original|0"));
    }

    #[test]
    fn test_errors_become_500() {
        let app = Pipeline::new().layer(handler_fn(|_req, _next: Next| async {
            Err::<Response, _>(anyhow::anyhow!("boom"))
        }));
        let res = block_on(app.handle(Request::get("/")));
        assert_eq!(res.status, 500);
        assert_eq!(res.body["error"], "boom");
    }

    #[test]
    fn test_panicking_handler_becomes_500() {
        let app = Pipeline::new()
            .get("/sync", |_req: &Request| -> Response { panic!("content exploded") })
            .layer(handler_fn(|req: Request, next: Next| async move {
                if req.path == "/async" {
                    panic!("async content exploded: {}", req.path);
                }
                next.run(req).await
            }));

        let res = block_on(app.handle(Request::get("/sync")));
        assert_eq!(res.status, 500);
        assert_eq!(res.body["error"], "Handler panicked: content exploded");

        let res = block_on(app.handle(Request::get("/async")));
        assert_eq!(res.status, 500);
        assert_eq!(
            res.body["error"],
            "Handler panicked: async content exploded: /async"
        );

        // Requests after a panic are unaffected
        let res = block_on(app.handle(Request::get("/missing")));
        assert_eq!(res.status, 404);
    }

    #[test]
    fn test_clone_shares_layers() {
        let app = Pipeline::new().get("/a", |_req| Response::text("a"));
        let copy = app.clone();
        assert_eq!(copy.len(), 1);
        assert!(!copy.is_empty());
        assert!(Pipeline::default().is_empty());
    }
}
