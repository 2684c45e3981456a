//! # brrtchannels
//!
//! **brrtchannels** is per-request *channel* selection for a request pipeline. A channel
//! is a named variant of application content, such as a release train (`alpha`, `beta`,
//! `stable`) or a customer flavour. Each request resolves to an ordered list of
//! candidate channels, and dispatchers use that list to decide which content serves it.
//!
//! ## Architecture
//!
//! - **[`channels`]** - the resolver middleware, the stack and router dispatchers, and
//!   the channel registry they share
//! - **[`pipeline`]** - the request/response types, the continuation-passing
//!   [`Handler`](pipeline::Handler) trait and the [`Pipeline`](pipeline::Pipeline) that
//!   mounts handlers under path prefixes
//! - **[`config`]** - channel lists loaded from YAML, TOML or the environment
//! - **[`error`]** - the [`ChannelError`] taxonomy
//! - **[`demo`]** - the sample application used by the `brrtchannels-demo` binary
//! - **[`server`]** - a `may_minihttp` front end serving a pipeline over HTTP
//! - **[`otel`]** - structured logging set-up
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant P as Pipeline
//!     participant R as ChannelResolver
//!     participant S as Selector
//!     participant D as Stack / Router
//!     participant C as Channel content
//!
//!     P->>R: call(req, next)
//!     R->>S: select(&req)
//!     S-->>R: Some("bravo")
//!     R->>R: registry suffix from "bravo"
//!     R->>D: next.run(req + CandidateList)
//!     D->>C: first mapped candidate (router)<br/>or every mapped candidate (stack)
//!     C-->>P: Response
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use brrtchannels::channels::{ChannelResolver, ContentMap, ResolverOptions, Selector, StackDispatcher};
//! use brrtchannels::pipeline::{Pipeline, Request, Response};
//!
//! let resolver = ChannelResolver::new(
//!     ResolverOptions::new(["alpha", "beta"])
//!         .selector(Selector::from_fn(|req| req.get_query_param("channel").map(str::to_string))),
//! )?;
//! let content = ContentMap::new()
//!     .with("alpha", Pipeline::new().get("/alpha", |_req| Response::text("OK Alpha")))?
//!     .with("beta", Pipeline::new().get("/beta", |_req| Response::text("OK Beta")))?;
//! let original = Pipeline::new().get("/original", |_req| Response::text("Original Content"));
//!
//! let app = Pipeline::new()
//!     .layer(resolver)
//!     .layer(StackDispatcher::new(content, original));
//!
//! let res = futures::executor::block_on(app.handle(Request::get("/beta?channel=alpha")));
//! assert_eq!(res.body_text(), Some("OK Beta"));
//! ```
//!
//! ## Error Handling
//!
//! Construction problems are returned from constructors as
//! [`ChannelError::InvalidConfiguration`]. Per-request problems (an unknown channel, a
//! failing selector, a router without a resolver) travel as `Err` through the handler
//! chain and are answered with `500` by [`Pipeline::handle`](pipeline::Pipeline::handle).
//!
//! ## Logging
//!
//! Every component emits `tracing` events carrying the request id. Install a
//! subscriber with [`otel::init_logging_with_config`].

pub mod channels;
pub mod config;
pub mod demo;
pub mod error;
pub mod ids;
pub mod otel;
pub mod pipeline;
pub mod server;

pub use channels::{
    CandidateList, ChannelRequestExt, ChannelResolver, ChannelRouter, ContentMap,
    ResolverOptions, RouterOptions, Selector, StackDispatcher,
};
pub use config::ChannelConfig;
pub use error::{ChannelError, ConfigIssue};
pub use ids::RequestId;
pub use pipeline::{Handler, Next, Pipeline, Request, Response};
