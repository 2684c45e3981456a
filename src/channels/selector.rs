use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};

use crate::pipeline::Request;

/// Future produced by every selector shape
pub type SelectorFuture = BoxFuture<'static, anyhow::Result<Option<String>>>;

type SelectFn = dyn Fn(&Request) -> SelectorFuture + Send + Sync;

/// Chooses the channel for a request.
///
/// Constant values, synchronous functions and asynchronous functions are all
/// normalised to one future-returning contract, so the resolver never branches on
/// the selector's shape. `None` or an empty string means "no channel".
#[derive(Clone)]
pub struct Selector {
    select: Arc<SelectFn>,
}

impl Selector {
    /// Always select `channel`
    pub fn fixed(channel: impl Into<String>) -> Self {
        let channel = channel.into();
        Self::from_fn(move |_req| Some(channel.clone()))
    }

    /// Never select a channel
    #[must_use]
    pub fn none() -> Self {
        Self::from_fn(|_req| None)
    }

    /// Select with a synchronous function of the request
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Request) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            select: Arc::new(move |req: &Request| -> SelectorFuture {
                future::ready(Ok::<_, anyhow::Error>(f(req))).boxed()
            }),
        }
    }

    /// Select with an asynchronous function of the request.
    ///
    /// The function receives the request by reference and must copy out whatever
    /// its future needs. An `Err` from the future fails the request.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(&Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Option<String>>> + Send + 'static,
    {
        Self {
            select: Arc::new(move |req: &Request| -> SelectorFuture { f(req).boxed() }),
        }
    }

    /// Evaluate the selector for `req`. Empty strings are reported as `None`.
    pub fn select(&self, req: &Request) -> SelectorFuture {
        (self.select)(req)
            .map(|selected| selected.map(|channel| channel.filter(|c| !c.is_empty())))
            .boxed()
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Selector(..)")
    }
}

impl From<&str> for Selector {
    fn from(channel: &str) -> Self {
        Selector::fixed(channel)
    }
}

impl From<String> for Selector {
    fn from(channel: String) -> Self {
        Selector::fixed(channel)
    }
}

impl From<Option<String>> for Selector {
    fn from(channel: Option<String>) -> Self {
        match channel {
            Some(channel) => Selector::fixed(channel),
            None => Selector::none(),
        }
    }
}
