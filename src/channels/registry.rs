use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::error::{ChannelError, ConfigIssue};

/// Opaque, non-empty channel key
///
/// Backed by `Arc<str>` so candidate lists and content maps share one allocation per
/// channel for the lifetime of the process.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(Arc<str>);

impl ChannelId {
    /// Create an identifier, rejecting the empty string
    pub fn new(id: impl AsRef<str>) -> Result<Self, ChannelError> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(ConfigIssue::EmptyChannelId.into());
        }
        Ok(Self(Arc::from(id)))
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ChannelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ChannelId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ChannelId {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for ChannelId {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl Serialize for ChannelId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Ordered, immutable set of channels; earlier entries take precedence.
#[derive(Clone, PartialEq, Eq)]
pub struct ChannelRegistry {
    channels: Arc<[ChannelId]>,
}

impl ChannelRegistry {
    /// Build a registry from channel names in precedence order.
    ///
    /// Fails when the list is empty, contains an empty name, or repeats a name.
    pub fn new<I, S>(channels: I) -> Result<Self, ChannelError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for name in channels {
            let id = ChannelId::new(name)?;
            if !seen.insert(id.clone()) {
                return Err(ConfigIssue::DuplicateChannel {
                    channel: id.to_string(),
                }
                .into());
            }
            ids.push(id);
        }
        if ids.is_empty() {
            return Err(ConfigIssue::MissingChannels.into());
        }
        Ok(Self {
            channels: ids.into(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Always false; kept for API symmetry with `len`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Precedence position of `channel`, if registered
    #[must_use]
    pub fn position(&self, channel: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.as_str() == channel)
    }

    #[must_use]
    pub fn contains(&self, channel: &str) -> bool {
        self.position(channel).is_some()
    }

    /// Look up the registered identifier for `channel`
    #[must_use]
    pub fn get(&self, channel: &str) -> Option<&ChannelId> {
        self.channels.iter().find(|c| c.as_str() == channel)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelId> {
        self.channels.iter()
    }

    /// Registered channel names, in precedence order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.channels.iter().map(ToString::to_string).collect()
    }

    /// Candidate list for a selection of `channel`.
    ///
    /// With `cascade` the list runs from `channel` to the lowest-precedence entry;
    /// without it the list holds `channel` alone. `None` if `channel` is unknown.
    #[must_use]
    pub fn candidates_for(&self, channel: &str, cascade: bool) -> Option<CandidateList> {
        let start = self.position(channel)?;
        let end = if cascade {
            self.channels.len()
        } else {
            start + 1
        };
        Some(CandidateList {
            channels: Arc::clone(&self.channels),
            range: start..end,
        })
    }
}

impl fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.channels.iter()).finish()
    }
}

/// Ordered channels to try for one request, highest precedence first.
///
/// A view into the registry's shared slice, so building one per request does not
/// allocate. Empty when no channel was selected.
#[derive(Clone)]
pub struct CandidateList {
    channels: Arc<[ChannelId]>,
    range: Range<usize>,
}

impl CandidateList {
    /// The list for a request with no channel selected
    #[must_use]
    pub fn empty() -> Self {
        Self {
            channels: Arc::from(Vec::new()),
            range: 0..0,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[ChannelId] {
        &self.channels[self.range.clone()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelId> {
        self.as_slice().iter()
    }

    /// The selected channel
    #[must_use]
    pub fn first(&self) -> Option<&ChannelId> {
        self.as_slice().first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Candidate names, for logging and diagnostics
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(ChannelId::as_str).collect()
    }
}

impl PartialEq for CandidateList {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for CandidateList {}

impl fmt::Debug for CandidateList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl Serialize for CandidateList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for channel in self.iter() {
            seq.serialize_element(channel)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ChannelRegistry {
        ChannelRegistry::new(["alpha", "bravo", "charlie"]).unwrap()
    }

    #[test]
    fn test_rejects_empty_list() {
        let err = ChannelRegistry::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(
            err,
            ChannelError::InvalidConfiguration(ConfigIssue::MissingChannels)
        ));
    }

    #[test]
    fn test_rejects_empty_and_duplicate_ids() {
        assert!(matches!(
            ChannelRegistry::new(["alpha", ""]).unwrap_err(),
            ChannelError::InvalidConfiguration(ConfigIssue::EmptyChannelId)
        ));
        match ChannelRegistry::new(["alpha", "bravo", "alpha"]).unwrap_err() {
            ChannelError::InvalidConfiguration(ConfigIssue::DuplicateChannel { channel }) => {
                assert_eq!(channel, "alpha")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cascade_is_registry_suffix() {
        let registry = registry();
        let names: Vec<String> = registry.names();
        for (i, name) in names.iter().enumerate() {
            let list = registry.candidates_for(name, true).unwrap();
            assert_eq!(list.names(), names[i..].iter().map(String::as_str).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_no_cascade_is_singleton() {
        let list = registry().candidates_for("alpha", false).unwrap();
        assert_eq!(list.names(), vec!["alpha"]);
        assert_eq!(list.first().map(ChannelId::as_str), Some("alpha"));
    }

    #[test]
    fn test_unknown_channel_has_no_candidates() {
        assert!(registry().candidates_for("delta", true).is_none());
    }

    #[test]
    fn test_candidates_serialize_as_names() {
        let list = registry().candidates_for("bravo", true).unwrap();
        assert_eq!(
            serde_json::to_value(&list).unwrap(),
            serde_json::json!(["bravo", "charlie"])
        );
        assert_eq!(serde_json::to_value(CandidateList::empty()).unwrap(), serde_json::json!([]));
    }

    #[test]
    fn test_channel_id_borrows_as_str() {
        let mut map = std::collections::HashMap::new();
        map.insert(ChannelId::new("alpha").unwrap(), 1);
        assert_eq!(map.get("alpha"), Some(&1));
        assert!(ChannelId::new("alpha").unwrap() == "alpha");
    }
}
