//! Declarative channel configuration.
//!
//! A [`ChannelConfig`] describes the registry side of a resolver (the channel list,
//! cascading and an optional default channel) in a file or the environment. The
//! selector itself is code and is attached to the resulting [`ResolverOptions`].
//!
//! ```yaml
//! channels: [alpha, beta, stable]
//! cascade: true
//! default: stable
//! ```

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::channels::ResolverOptions;
use crate::error::{ChannelError, ConfigIssue};

/// Environment variable holding the comma-separated channel list
pub const ENV_CHANNELS: &str = "BRRTCH_CHANNELS";
/// Environment variable overriding `cascade`
pub const ENV_CASCADE: &str = "BRRTCH_CASCADE";
/// Environment variable naming the default channel
pub const ENV_DEFAULT_CHANNEL: &str = "BRRTCH_DEFAULT_CHANNEL";

fn default_cascade() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Registered channels, highest precedence first
    pub channels: Vec<String>,
    #[serde(default = "default_cascade")]
    pub cascade: bool,
    /// Channel selected when the application supplies no selector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ChannelConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self, ChannelError> {
        serde_yaml::from_str(raw).map_err(|e| parse_issue("yaml", e))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ChannelError> {
        toml::from_str(raw).map_err(|e| parse_issue("toml", e))
    }

    /// Load from a `.yaml`/`.yml` or `.toml` file.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` with `ConfigIssue::Parse` when the file cannot be read,
    /// has another extension, or does not deserialize.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ChannelError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ChannelError::from(ConfigIssue::Parse {
                message: format!("{}: {e}", path.display()),
            })
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&raw),
            Some("toml") => Self::from_toml_str(&raw),
            other => Err(ConfigIssue::Parse {
                message: format!(
                    "{}: unsupported config extension {:?}",
                    path.display(),
                    other.unwrap_or_default()
                ),
            }
            .into()),
        }
    }

    /// Read `BRRTCH_CHANNELS`, `BRRTCH_CASCADE` and `BRRTCH_DEFAULT_CHANNEL`.
    ///
    /// Returns `Ok(None)` when `BRRTCH_CHANNELS` is unset.
    pub fn from_env() -> Result<Option<Self>, ChannelError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ChannelError> {
        let Some(raw_channels) = lookup(ENV_CHANNELS) else {
            return Ok(None);
        };
        let channels = raw_channels
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        let cascade = match lookup(ENV_CASCADE) {
            None => true,
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigIssue::Parse {
                        message: format!("{ENV_CASCADE}: expected a boolean, got `{raw}`"),
                    }
                    .into())
                }
            },
        };

        let default = lookup(ENV_DEFAULT_CHANNEL)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Ok(Some(Self {
            channels,
            cascade,
            default,
        }))
    }

    /// Resolver options for this configuration; attach a selector before use
    #[must_use]
    pub fn into_options(self) -> ResolverOptions {
        let options = ResolverOptions::new(self.channels).cascade(self.cascade);
        match self.default {
            Some(default) => options.default_channel(default),
            None => options,
        }
    }
}

fn parse_issue(format: &str, err: impl std::fmt::Display) -> ChannelError {
    ConfigIssue::Parse {
        message: format!("{format}: {err}"),
    }
    .into()
}
