use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, info};

use super::content::{require, ContentMap};
use super::registry::CandidateList;
use crate::error::{ChannelError, ConfigIssue};
use crate::pipeline::{BoxedHandler, Handler, HandlerResult, Next, Request};

/// Linear fallthrough over the request's candidates.
///
/// For each request the dispatcher runs the mapped content of every candidate in
/// candidate order, then the default content. A stage that answers ends the
/// request; a stage that runs its continuation hands the request to the next stage
/// in that order, and the default's continuation leads back into the surrounding
/// pipeline. Errors abort the remaining stages.
///
/// Channel content here is additive: a request on `alpha` can reach everything the
/// `alpha`, lower-precedence and default content serve. Use
/// [`ChannelRouter`](super::ChannelRouter) when content must be exclusive.
#[derive(Clone)]
pub struct StackDispatcher {
    content: ContentMap,
    fallback: BoxedHandler,
}

impl StackDispatcher {
    #[must_use]
    pub fn new(content: ContentMap, default: impl Handler) -> Self {
        info!(
            channels = ?content,
            "Channel stack configured"
        );
        Self {
            content,
            fallback: Arc::new(default),
        }
    }

    #[must_use]
    pub fn builder() -> StackDispatcherBuilder {
        StackDispatcherBuilder::default()
    }

    /// Stages that will run for `candidates`, default last
    #[must_use]
    pub fn sequence_for(&self, candidates: Option<&CandidateList>) -> Vec<BoxedHandler> {
        let mut sequence: Vec<BoxedHandler> = candidates
            .into_iter()
            .flat_map(|list| list.iter())
            .filter_map(|channel| self.content.get(channel.as_str()).map(Arc::clone))
            .collect();
        sequence.push(Arc::clone(&self.fallback));
        sequence
    }
}

impl Handler for StackDispatcher {
    fn call(&self, req: Request, next: Next) -> BoxFuture<'_, HandlerResult> {
        let candidates = req.extensions().get::<CandidateList>();
        if candidates.is_none() {
            debug!(
                request_id = %req.request_id,
                "No channel candidates on request - only default content is reachable"
            );
        }
        let sequence = self.sequence_for(candidates);

        // S1: Stack assembled
        debug!(
            request_id = %req.request_id,
            candidates = ?candidates,
            stages = sequence.len(),
            "Channel stack dispatch"
        );

        Next::chain(sequence.into(), next).run(req)
    }
}

/// Builder that reports missing parts as configuration errors
#[derive(Default)]
pub struct StackDispatcherBuilder {
    content: Option<ContentMap>,
    default: Option<BoxedHandler>,
}

impl StackDispatcherBuilder {
    #[must_use]
    pub fn content(mut self, content: ContentMap) -> Self {
        self.content = Some(content);
        self
    }

    #[must_use]
    pub fn default_content(mut self, handler: impl Handler) -> Self {
        self.default = Some(Arc::new(handler));
        self
    }

    /// # Errors
    ///
    /// `InvalidConfiguration` with `MissingContentMapping` or `MissingDefaultContent`.
    pub fn build(self) -> Result<StackDispatcher, ChannelError> {
        let content = require(self.content, ConfigIssue::MissingContentMapping)?;
        let default = require(self.default, ConfigIssue::MissingDefaultContent)?;
        Ok(StackDispatcher::new(content, default))
    }
}
