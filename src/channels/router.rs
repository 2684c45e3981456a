use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tracing::{debug, info, warn};

use super::content::{require, ContentMap};
use super::registry::{CandidateList, ChannelId};
use crate::error::{ChannelError, ConfigIssue};
use crate::pipeline::{BoxedHandler, Handler, HandlerResult, Next, Pipeline, Request};

/// Reserved path segment under which the content for `channel` is mounted.
///
/// `None` gives the segment of the default content. Segments are the uppercased
/// key wrapped in double underscores (`alpha` -> `/__ALPHA__`, default -> `/____`).
/// A `/` inside a key is escaped so every segment stays a single path segment.
#[must_use]
pub fn route_segment(channel: Option<&str>) -> String {
    let key = channel.unwrap_or_default().to_uppercase().replace('/', "%2F");
    format!("/__{key}__")
}

/// Options for [`ChannelRouter`]
///
/// Independent of [`ResolverOptions::cascade`](super::ResolverOptions::cascade):
/// the resolver decides how many candidates a request carries, the router decides
/// whether to look past the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterOptions {
    /// Fall through unmapped candidates to the next one (default `true`)
    pub cascade: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self { cascade: true }
    }
}

impl RouterOptions {
    #[must_use]
    pub fn cascade(mut self, cascade: bool) -> Self {
        self.cascade = cascade;
        self
    }
}

/// The channel whose content a [`ChannelRouter`] chose for the request.
///
/// `None` means the default content was chosen. Present only while the request
/// is inside the router's content; a router that passes the request on puts back
/// whatever an enclosing router recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChannel(pub Option<ChannelId>);

/// Request state a rewrite stage replaced
#[derive(Debug, Clone)]
struct SavedRoute {
    path: String,
    resolved: Option<ResolvedChannel>,
}

/// Saved by rewrite stages, innermost last
#[derive(Debug, Clone, Default)]
struct SavedRoutes(Vec<SavedRoute>);

/// Mutually exclusive dispatch between channel content and default content.
///
/// Each channel's content and the default content are mounted under their own
/// [`route_segment`]. Per request the router picks one outcome, prefixes the path
/// with that outcome's segment, and so makes exactly one subtree reachable, even
/// when the subtrees declare overlapping routes. If the subtree passes the request
/// on, the original path and any enclosing router's [`ResolvedChannel`] are
/// restored before anything after the router sees it.
///
/// Requires a [`ChannelResolver`](super::ChannelResolver) earlier in the pipeline;
/// without one every request fails with `ResolverNotRegistered`.
#[derive(Clone)]
pub struct ChannelRouter {
    pipeline: Pipeline,
    content: Arc<ContentMap>,
    options: RouterOptions,
}

impl ChannelRouter {
    /// Build the router.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if two channel keys produce the same route segment
    /// (for example `beta` and `BETA`).
    pub fn new(
        default: impl Handler,
        content: ContentMap,
        options: RouterOptions,
    ) -> Result<Self, ChannelError> {
        let mut segments: HashMap<String, &ChannelId> = HashMap::with_capacity(content.len());
        for channel in content.channels() {
            if let Some(first) = segments.insert(route_segment(Some(channel.as_str())), channel) {
                return Err(ConfigIssue::SegmentCollision {
                    first: first.to_string(),
                    second: channel.to_string(),
                }
                .into());
            }
        }

        let content = Arc::new(content);
        let mut pipeline = Pipeline::new().layer(Guard).layer(Rewrite {
            content: Arc::clone(&content),
            cascade: options.cascade,
        });
        for (channel, handler) in content.iter() {
            pipeline = pipeline.mount(&route_segment(Some(channel.as_str())), Arc::clone(handler));
        }
        let pipeline = pipeline.mount(&route_segment(None), default).layer(Restore);

        info!(
            channels = ?content,
            cascade = options.cascade,
            "Channel router configured"
        );

        Ok(Self {
            pipeline,
            content,
            options,
        })
    }

    #[must_use]
    pub fn builder() -> ChannelRouterBuilder {
        ChannelRouterBuilder::default()
    }

    /// The channel whose content serves `candidates`, or `None` for the default
    #[must_use]
    pub fn resolve(&self, candidates: &CandidateList) -> Option<ChannelId> {
        resolve_outcome(&self.content, Some(candidates), self.options.cascade)
    }

    #[must_use]
    pub fn options(&self) -> RouterOptions {
        self.options
    }
}

impl Handler for ChannelRouter {
    fn call(&self, req: Request, next: Next) -> BoxFuture<'_, HandlerResult> {
        self.pipeline.call(req, next)
    }
}

fn resolve_outcome(
    content: &ContentMap,
    candidates: Option<&CandidateList>,
    cascade: bool,
) -> Option<ChannelId> {
    let candidates = candidates?;
    if cascade {
        candidates
            .iter()
            .find(|channel| content.contains(channel.as_str()))
            .cloned()
    } else {
        candidates
            .first()
            .filter(|channel| content.contains(channel.as_str()))
            .cloned()
    }
}

struct Guard;

impl Handler for Guard {
    fn call(&self, req: Request, next: Next) -> BoxFuture<'_, HandlerResult> {
        if req.extensions().get::<CandidateList>().is_none() {
            // CR1: Composition error
            warn!(
                request_id = %req.request_id,
                path = %req.original_path,
                "Channel router reached without a channel resolver"
            );
            return future::ready(Err(ChannelError::ResolverNotRegistered.into())).boxed();
        }
        next.run(req)
    }
}

struct Rewrite {
    content: Arc<ContentMap>,
    cascade: bool,
}

impl Handler for Rewrite {
    fn call(&self, mut req: Request, next: Next) -> BoxFuture<'_, HandlerResult> {
        let resolved = resolve_outcome(
            &self.content,
            req.extensions().get::<CandidateList>(),
            self.cascade,
        );

        let original = req.path.clone();
        let mut rewritten = route_segment(resolved.as_ref().map(ChannelId::as_str));
        if !original.starts_with('/') {
            rewritten.push('/');
        }
        rewritten.push_str(&original);

        // CR2: Path rewritten for outcome
        debug!(
            request_id = %req.request_id,
            channel = ?resolved,
            path = %original,
            rewritten = %rewritten,
            "Channel router outcome"
        );

        req.path = rewritten;
        let saved = SavedRoute {
            path: original,
            resolved: req.extensions_mut().insert(ResolvedChannel(resolved)),
        };
        match req.extensions_mut().get_mut::<SavedRoutes>() {
            Some(routes) => routes.0.push(saved),
            None => {
                req.extensions_mut().insert(SavedRoutes(vec![saved]));
            }
        }

        next.run(req)
    }
}

struct Restore;

impl Handler for Restore {
    fn call(&self, mut req: Request, next: Next) -> BoxFuture<'_, HandlerResult> {
        let saved = req
            .extensions_mut()
            .get_mut::<SavedRoutes>()
            .and_then(|routes| routes.0.pop());
        if let Some(saved) = saved {
            debug!(
                request_id = %req.request_id,
                path = %saved.path,
                "Channel content declined - path restored"
            );
            req.path = saved.path;
            match saved.resolved {
                Some(outer) => {
                    req.extensions_mut().insert(outer);
                }
                None => {
                    req.extensions_mut().remove::<ResolvedChannel>();
                }
            }
        }
        next.run(req)
    }
}

/// Builder that reports missing parts as configuration errors
#[derive(Default)]
pub struct ChannelRouterBuilder {
    default: Option<BoxedHandler>,
    content: Option<ContentMap>,
    options: RouterOptions,
}

impl ChannelRouterBuilder {
    #[must_use]
    pub fn default_content(mut self, handler: impl Handler) -> Self {
        self.default = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn content(mut self, content: ContentMap) -> Self {
        self.content = Some(content);
        self
    }

    #[must_use]
    pub fn cascade(mut self, cascade: bool) -> Self {
        self.options.cascade = cascade;
        self
    }

    /// # Errors
    ///
    /// `InvalidConfiguration` for a missing part or colliding segments.
    pub fn build(self) -> Result<ChannelRouter, ChannelError> {
        let content = require(self.content, ConfigIssue::MissingContentMapping)?;
        let default = require(self.default, ConfigIssue::MissingDefaultContent)?;
        ChannelRouter::new(default, content, self.options)
    }
}
