use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};

use super::request::Request;
use super::response::Response;

/// Result of running a handler: a response, or an error for the pipeline's error path
pub type HandlerResult = anyhow::Result<Response>;

/// Shared, type-erased handler
pub type BoxedHandler = Arc<dyn Handler>;

type ExitHook = Box<dyn FnOnce(&mut Request) + Send>;

/// A stage in a request pipeline.
///
/// A handler either answers the request by returning a [`Response`], passes it on by
/// running `next`, or fails by returning an error. Errors travel straight back up the
/// chain; no later stage sees the request.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request, next: Next) -> BoxFuture<'_, HandlerResult>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn call(&self, req: Request, next: Next) -> BoxFuture<'_, HandlerResult> {
        (**self).call(req, next)
    }
}

/// The continuation handed to every [`Handler`].
///
/// Running it invokes the next handler of the current chain. Once a chain is
/// exhausted control moves to the enclosing chain, running any exit hooks registered
/// on the way out. Falling off the outermost chain yields a `404`.
pub struct Next {
    step: Step,
}

enum Step {
    Chain {
        layers: Arc<[BoxedHandler]>,
        cursor: usize,
        then: Box<Next>,
    },
    Exit {
        hook: ExitHook,
        then: Box<Next>,
    },
    End,
}

impl Next {
    /// Continuation of the outermost pipeline
    #[must_use]
    pub fn end() -> Self {
        Self { step: Step::End }
    }

    /// Run `layers` in order, then continue with `then`
    #[must_use]
    pub fn chain(layers: Arc<[BoxedHandler]>, then: Next) -> Self {
        Self {
            step: Step::Chain {
                layers,
                cursor: 0,
                then: Box::new(then),
            },
        }
    }

    /// Run `hook` on the request when control passes through this continuation.
    ///
    /// Used by layers that rewrite request state for their subtree and must undo the
    /// rewrite if the subtree declines the request.
    #[must_use]
    pub fn on_exit<F>(self, hook: F) -> Self
    where
        F: FnOnce(&mut Request) + Send + 'static,
    {
        Self {
            step: Step::Exit {
                hook: Box::new(hook),
                then: Box::new(self),
            },
        }
    }

    /// Pass the request to the next stage
    pub fn run(self, mut req: Request) -> BoxFuture<'static, HandlerResult> {
        match self.step {
            Step::Chain {
                layers,
                cursor,
                then,
            } => match layers.get(cursor).map(Arc::clone) {
                Some(handler) => {
                    let next = Next {
                        step: Step::Chain {
                            layers,
                            cursor: cursor + 1,
                            then,
                        },
                    };
                    async move { handler.call(req, next).await }.boxed()
                }
                None => then.run(req),
            },
            Step::Exit { hook, then } => {
                hook(&mut req);
                then.run(req)
            }
            Step::End => {
                future::ready(Ok(Response::not_found(&req.method, &req.original_path))).boxed()
            }
        }
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.step {
            Step::Chain {
                layers,
                cursor,
                then,
            } => f
                .debug_struct("Next::Chain")
                .field("remaining", &layers.len().saturating_sub(*cursor))
                .field("then", then)
                .finish(),
            Step::Exit { then, .. } => f.debug_struct("Next::Exit").field("then", then).finish(),
            Step::End => f.write_str("Next::End"),
        }
    }
}

/// Handler built from an async closure taking the request and its continuation
pub struct HandlerFn<F>(F);

/// Wrap `f` as a [`Handler`]
///
/// ```rust,ignore
/// let passthrough = handler_fn(|req, next: Next| next.run(req));
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    HandlerFn(f)
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture<'_, HandlerResult> {
        (self.0)(req, next).boxed()
    }
}

/// Terminal handler that always answers
pub struct Endpoint<F>(F);

/// Wrap a synchronous responder as a terminal [`Handler`]
pub fn endpoint<F>(f: F) -> Endpoint<F>
where
    F: Fn(&Request) -> Response + Send + Sync + 'static,
{
    Endpoint(f)
}

impl<F> Handler for Endpoint<F>
where
    F: Fn(&Request) -> Response + Send + Sync + 'static,
{
    fn call(&self, req: Request, _next: Next) -> BoxFuture<'_, HandlerResult> {
        future::ready(Ok((self.0)(&req))).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: Arc<AtomicUsize>) -> BoxedHandler {
        Arc::new(handler_fn(move |req, next: Next| {
            counter.fetch_add(1, Ordering::SeqCst);
            next.run(req)
        }))
    }

    #[test]
    fn test_end_answers_not_found() {
        let res = block_on(Next::end().run(Request::get("/nowhere"))).unwrap();
        assert_eq!(res.status, 404);
    }

    #[test]
    fn test_chain_runs_in_order_then_parent() {
        let counter = Arc::new(AtomicUsize::new(0));
        let layers: Arc<[BoxedHandler]> = Arc::from(vec![
            counting(Arc::clone(&counter)),
            counting(Arc::clone(&counter)),
        ]);
        let inner = Next::chain(layers, Next::end());
        let res = block_on(inner.run(Request::get("/"))).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(res.status, 404);
    }

    #[test]
    fn test_exit_hook_runs_before_parent() {
        let seen = Arc::new(std::sync::Mutex::new(String::new()));
        let seen_by_parent = Arc::clone(&seen);
        let parent_layers: Arc<[BoxedHandler]> = Arc::from(vec![Arc::new(endpoint(
            move |req: &Request| {
                *seen_by_parent.lock().unwrap() = req.path.clone();
                Response::text("parent")
            },
        )) as BoxedHandler]);
        let next = Next::chain(parent_layers, Next::end()).on_exit(|req| {
            req.path = "/restored".to_string();
        });

        let mut req = Request::get("/original");
        req.path = "/rewritten".to_string();
        let res = block_on(next.run(req)).unwrap();

        assert_eq!(res.body_text(), Some("parent"));
        assert_eq!(seen.lock().unwrap().as_str(), "/restored");
    }

    #[test]
    fn test_endpoint_does_not_continue() {
        let counter = Arc::new(AtomicUsize::new(0));
        let layers: Arc<[BoxedHandler]> = Arc::from(vec![
            Arc::new(endpoint(|_req: &Request| Response::text("done"))) as BoxedHandler,
            counting(Arc::clone(&counter)),
        ]);
        let res = block_on(Next::chain(layers, Next::end()).run(Request::get("/"))).unwrap();
        assert_eq!(res.body_text(), Some("done"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
