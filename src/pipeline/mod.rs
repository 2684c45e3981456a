//! # Pipeline Module
//!
//! The pipeline module is the request-processing substrate the channel handlers plug
//! into: a request/response pair, a continuation-passing [`Handler`] trait, and a
//! [`Pipeline`] that stacks handlers, prefix mounts and routes.
//!
//! ## Overview
//!
//! Every stage receives the [`Request`] by value together with a [`Next`]
//! continuation and does exactly one of three things:
//!
//! - returns a [`Response`], which ends processing for the request
//! - runs `next.run(req)`, handing the request to the following stage
//! - returns an error, which unwinds straight to [`Pipeline::handle`]
//!
//! ## Mounting
//!
//! ```rust,ignore
//! use brrtchannels::pipeline::{Pipeline, Request, Response};
//!
//! let alpha = Pipeline::new().get("/alpha", |_req| Response::text("OK Alpha"));
//! let app = Pipeline::new().mount("/{channel}/stack", alpha);
//!
//! let res = futures::executor::block_on(app.handle(Request::get("/alpha/stack/alpha")));
//! assert_eq!(res.body_text(), Some("OK Alpha"));
//! ```
//!
//! Mounts match whole path segments and strip their prefix for the mounted handler.
//! If the mounted handler passes the request on, the prefix and any captured
//! parameters are put back before the next sibling runs.
//!
//! ## Error Handling
//!
//! - Requests nobody answers get a `404` from the end of the outermost chain
//! - Handler errors are logged with the request id and returned as `500`

mod core;
mod handler;
mod path;
mod request;
mod response;

pub use self::core::Pipeline;
pub use handler::{
    endpoint, handler_fn, BoxedHandler, Endpoint, Handler, HandlerFn, HandlerResult, Next,
};
pub use path::{PathPattern, PrefixMatch};
pub use request::{HeaderVec, ParamVec, Request, MAX_INLINE_HEADERS, MAX_INLINE_PARAMS};
pub use response::Response;
