//! # Channels Module
//!
//! Channel selection for a request pipeline. A *channel* is a named variant of
//! application content (a release train, a tenant flavour, a beta programme); the
//! registered channels form a precedence list, highest first.
//!
//! ## Components
//!
//! - [`ChannelResolver`] - middleware that evaluates a [`Selector`] and attaches a
//!   [`CandidateList`] to the request
//! - [`StackDispatcher`] - runs every candidate's content in order, then the default
//! - [`ChannelRouter`] - runs exactly one of the channel contents or the default
//!
//! ## Cascading
//!
//! With cascading enabled, selecting a channel also makes every lower-precedence
//! channel a candidate:
//!
//! ```text
//! channels: [alpha, bravo, charlie]
//! selected: bravo   cascade: true   ->  [bravo, charlie]
//! selected: bravo   cascade: false  ->  [bravo]
//! selected: none                    ->  []
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use brrtchannels::channels::{ChannelResolver, ChannelRouter, ContentMap, ResolverOptions, Selector};
//! use brrtchannels::pipeline::{Pipeline, Response};
//!
//! let resolver = ChannelResolver::new(
//!     ResolverOptions::new(["alpha", "bravo"])
//!         .selector(Selector::from_fn(|req| req.get_header("x-channel").map(str::to_string))),
//! )?;
//! let content = ContentMap::new()
//!     .with("bravo", Pipeline::new().get("/", |_req| Response::text("bravo home")))?;
//! let router = ChannelRouter::builder()
//!     .content(content)
//!     .default_content(Pipeline::new().get("/", |_req| Response::text("home")))
//!     .build()?;
//!
//! let app = Pipeline::new().layer(resolver).layer(router);
//! ```

mod content;
mod registry;
mod resolver;
mod router;
mod selector;
mod stack;

pub use content::ContentMap;
pub use registry::{CandidateList, ChannelId, ChannelRegistry};
pub use resolver::{ChannelResolver, ResolverOptions};
pub use router::{route_segment, ChannelRouter, ChannelRouterBuilder, ResolvedChannel, RouterOptions};
pub use selector::{Selector, SelectorFuture};
pub use stack::{StackDispatcher, StackDispatcherBuilder};

use crate::pipeline::Request;

/// Read channel state that earlier stages attached to a request
pub trait ChannelRequestExt {
    /// Candidates attached by a [`ChannelResolver`]
    fn candidates(&self) -> Option<&CandidateList>;

    /// Outcome chosen by the innermost [`ChannelRouter`] whose content is handling
    /// the request
    fn resolved_channel(&self) -> Option<&ResolvedChannel>;
}

impl ChannelRequestExt for Request {
    fn candidates(&self) -> Option<&CandidateList> {
        self.extensions().get::<CandidateList>()
    }

    fn resolved_channel(&self) -> Option<&ResolvedChannel> {
        self.extensions().get::<ResolvedChannel>()
    }
}
