use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, info, warn};

use super::registry::{CandidateList, ChannelRegistry};
use super::selector::Selector;
use crate::error::{ChannelError, ConfigIssue};
use crate::pipeline::{Handler, HandlerResult, Next, Request};

/// Options for [`ChannelResolver`]
///
/// ```rust,ignore
/// let options = ResolverOptions::new(["alpha", "beta"])
///     .selector(Selector::from_fn(|req| req.get_header("x-channel").map(str::to_string)))
///     .cascade(true);
/// ```
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    channels: Vec<String>,
    selector: Option<Selector>,
    cascade: bool,
    default_channel: Option<String>,
}

impl ResolverOptions {
    /// Start from the registered channels, highest precedence first.
    ///
    /// Defaults: cascading enabled, no selector and no default channel (so every
    /// request resolves to an empty candidate list until a selector is set).
    pub fn new<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            channels: channels.into_iter().map(Into::into).collect(),
            selector: None,
            cascade: true,
            default_channel: None,
        }
    }

    /// Selector evaluated once per request
    #[must_use]
    pub fn selector(mut self, selector: impl Into<Selector>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Whether lower-precedence channels follow the selected one in the candidate list
    #[must_use]
    pub fn cascade(mut self, cascade: bool) -> Self {
        self.cascade = cascade;
        self
    }

    /// Channel selected when no selector is configured
    #[must_use]
    pub fn default_channel(mut self, channel: impl Into<String>) -> Self {
        self.default_channel = Some(channel.into());
        self
    }

    #[must_use]
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    #[must_use]
    pub fn is_cascade(&self) -> bool {
        self.cascade
    }
}

/// Middleware that attaches the request's [`CandidateList`].
///
/// Must run before any [`StackDispatcher`](super::StackDispatcher) or
/// [`ChannelRouter`](super::ChannelRouter) in the same pipeline. The selector is
/// awaited to completion before the request moves on.
#[derive(Debug, Clone)]
pub struct ChannelResolver {
    registry: ChannelRegistry,
    selector: Selector,
    cascade: bool,
}

impl ChannelResolver {
    /// Validate `options` and build the resolver.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` when the channel list is empty, contains an empty or
    /// repeated name, or the default channel is not registered.
    pub fn new(options: ResolverOptions) -> Result<Self, ChannelError> {
        let registry = ChannelRegistry::new(&options.channels)?;

        let selector = match (options.selector, options.default_channel) {
            (Some(selector), _) => selector,
            (None, Some(default)) => {
                if !registry.contains(&default) {
                    return Err(ConfigIssue::UnknownDefaultChannel { channel: default }.into());
                }
                Selector::fixed(default)
            }
            (None, None) => Selector::none(),
        };

        info!(
            channels = ?registry,
            cascade = options.cascade,
            "Channel resolver configured"
        );

        Ok(Self {
            registry,
            selector,
            cascade: options.cascade,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Compute the candidate list for `req` without attaching it
    pub async fn resolve(&self, req: &Request) -> Result<CandidateList, ChannelError> {
        let selected = self
            .selector
            .select(req)
            .await
            .map_err(ChannelError::SelectorFailure)?;

        let Some(channel) = selected else {
            return Ok(CandidateList::empty());
        };

        self.registry
            .candidates_for(&channel, self.cascade)
            .ok_or_else(|| ChannelError::UnknownChannel {
                channel,
                channels: self.registry.names(),
            })
    }
}

impl Handler for ChannelResolver {
    fn call(&self, mut req: Request, next: Next) -> BoxFuture<'_, HandlerResult> {
        async move {
            let candidates = match self.resolve(&req).await {
                Ok(candidates) => candidates,
                Err(err) => {
                    // C2: Selection rejected
                    warn!(
                        request_id = %req.request_id,
                        path = %req.original_path,
                        kind = err.kind(),
                        error = %err,
                        "Channel selection failed"
                    );
                    return Err(err.into());
                }
            };

            // C1: Candidates attached
            debug!(
                request_id = %req.request_id,
                candidates = ?candidates,
                cascade = self.cascade,
                "Channel candidates resolved"
            );

            req.extensions_mut().insert(candidates);
            next.run(req).await
        }
        .boxed()
    }
}
