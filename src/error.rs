use std::fmt;

/// What is wrong with a channel resolver or dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    /// `channels` was not supplied or is empty
    MissingChannels,
    /// A channel identifier is the empty string
    EmptyChannelId,
    /// The same identifier appears twice in the channel list
    DuplicateChannel {
        /// The repeated identifier
        channel: String,
    },
    /// The default channel is not one of the registered channels
    UnknownDefaultChannel {
        /// The configured default
        channel: String,
    },
    /// A dispatcher was built without its channel content mapping
    MissingContentMapping,
    /// A dispatcher was built without its default content
    MissingDefaultContent,
    /// Two channel keys map to the same synthetic route segment
    SegmentCollision {
        /// The key registered first
        first: String,
        /// The key that collides with it
        second: String,
    },
    /// A configuration source could not be parsed
    Parse {
        /// Parser error message
        message: String,
    },
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigIssue::MissingChannels => {
                write!(f, "option `channels` must be a list of at least one channel")
            }
            ConfigIssue::EmptyChannelId => write!(f, "channel identifiers must not be empty"),
            ConfigIssue::DuplicateChannel { channel } => {
                write!(f, "channel `{channel}` is listed more than once")
            }
            ConfigIssue::UnknownDefaultChannel { channel } => {
                write!(f, "default channel `{channel}` is not in the list of channels")
            }
            ConfigIssue::MissingContentMapping => {
                write!(f, "a mapping of channel-specific content is required")
            }
            ConfigIssue::MissingDefaultContent => {
                write!(f, "default content for non-channel requests is required")
            }
            ConfigIssue::SegmentCollision { first, second } => write!(
                f,
                "channels `{first}` and `{second}` resolve to the same route segment"
            ),
            ConfigIssue::Parse { message } => write!(f, "invalid channel configuration: {message}"),
        }
    }
}

/// Errors raised by channel resolution and dispatch.
///
/// `InvalidConfiguration` is returned from constructors. The remaining variants
/// occur per request and travel through the handler chain as the request's error
/// (recover them with `anyhow::Error::downcast_ref::<ChannelError>()`).
#[derive(Debug)]
pub enum ChannelError {
    /// Construction-time programmer error
    InvalidConfiguration(ConfigIssue),
    /// The selector chose a channel that is not registered
    UnknownChannel {
        /// The selected value
        channel: String,
        /// The registered channels, in precedence order
        channels: Vec<String>,
    },
    /// A channel router ran before any resolver attached a candidate list
    ResolverNotRegistered,
    /// The selector itself failed
    SelectorFailure(anyhow::Error),
}

impl ChannelError {
    /// Short, stable name of the error class, used as a log field
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ChannelError::InvalidConfiguration(_) => "invalid_configuration",
            ChannelError::UnknownChannel { .. } => "unknown_channel",
            ChannelError::ResolverNotRegistered => "resolver_not_registered",
            ChannelError::SelectorFailure(_) => "selector_failure",
        }
    }
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::InvalidConfiguration(issue) => write!(f, "{issue}"),
            ChannelError::UnknownChannel { channel, channels } => write!(
                f,
                "channel `{channel}` not found in list of channels: {}",
                channels.join(",")
            ),
            ChannelError::ResolverNotRegistered => write!(
                f,
                "the channel resolver must be registered before the channel router"
            ),
            ChannelError::SelectorFailure(_) => write!(f, "channel selector failed"),
        }
    }
}

impl std::error::Error for ChannelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChannelError::SelectorFailure(source) => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<ConfigIssue> for ChannelError {
    fn from(issue: ConfigIssue) -> Self {
        ChannelError::InvalidConfiguration(issue)
    }
}
