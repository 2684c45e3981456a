use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::registry::ChannelId;
use crate::error::{ChannelError, ConfigIssue};
use crate::pipeline::{BoxedHandler, Handler};

/// Channel-specific content: one handler (often a whole [`Pipeline`](crate::pipeline::Pipeline))
/// per channel.
///
/// Channels without an entry are skipped during resolution. Keys are kept in
/// insertion order for mounting and logging.
#[derive(Clone, Default)]
pub struct ContentMap {
    order: Vec<ChannelId>,
    handlers: HashMap<ChannelId, BoxedHandler>,
}

impl ContentMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the content for `channel`.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if `channel` is empty.
    pub fn insert(
        &mut self,
        channel: impl AsRef<str>,
        handler: impl Handler,
    ) -> Result<&mut Self, ChannelError> {
        let id = ChannelId::new(channel)?;
        if self.handlers.insert(id.clone(), Arc::new(handler)).is_none() {
            self.order.push(id);
        }
        Ok(self)
    }

    /// Builder form of [`insert`](Self::insert)
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if `channel` is empty.
    pub fn with(mut self, channel: impl AsRef<str>, handler: impl Handler) -> Result<Self, ChannelError> {
        self.insert(channel, handler)?;
        Ok(self)
    }

    #[must_use]
    pub fn get(&self, channel: &str) -> Option<&BoxedHandler> {
        self.handlers.get(channel)
    }

    #[must_use]
    pub fn contains(&self, channel: &str) -> bool {
        self.handlers.contains_key(channel)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&ChannelId, &BoxedHandler)> {
        self.order
            .iter()
            .filter_map(|id| self.handlers.get(id).map(|handler| (id, handler)))
    }

    #[must_use]
    pub fn channels(&self) -> &[ChannelId] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Debug for ContentMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.order.iter()).finish()
    }
}

pub(crate) fn require<T>(value: Option<T>, issue: ConfigIssue) -> Result<T, ChannelError> {
    value.ok_or(ChannelError::InvalidConfiguration(issue))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Pipeline, Response};

    #[test]
    fn test_keeps_insertion_order_and_replaces() {
        let mut map = ContentMap::new();
        map.insert("charlie", Pipeline::new()).unwrap();
        map.insert("alpha", Pipeline::new()).unwrap();
        map.insert("charlie", Pipeline::new().get("/", |_req| Response::text("c")))
            .unwrap();
        let keys: Vec<&str> = map.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(keys, vec!["charlie", "alpha"]);
        assert_eq!(map.len(), 2);
        assert!(map.contains("alpha"));
        assert!(map.get("bravo").is_none());
    }

    #[test]
    fn test_rejects_empty_key() {
        assert!(ContentMap::new().with("", Pipeline::new()).is_err());
    }
}
