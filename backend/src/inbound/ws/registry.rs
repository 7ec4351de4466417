//! Which channel follows which user.

use std::collections::HashMap;
use std::fmt;

use crate::domain::UserId;

/// Process-unique identifier of one open WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u64);

impl ChannelId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Channel to followed-user mapping.
///
/// A channel follows at most one user; a later join replaces the earlier one.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    follows: HashMap<ChannelId, UserId>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow `user_id`, returning the user previously followed.
    pub fn join(&mut self, channel: ChannelId, user_id: UserId) -> Option<UserId> {
        self.follows.insert(channel, user_id)
    }

    /// Stop following; a no-op for channels that follow nobody.
    pub fn leave(&mut self, channel: ChannelId) -> Option<UserId> {
        self.follows.remove(&channel)
    }

    pub fn lookup(&self, channel: ChannelId) -> Option<UserId> {
        self.follows.get(&channel).copied()
    }

    /// Whether `channel` is in the room of `user_id`.
    pub fn follows(&self, channel: ChannelId, user_id: UserId) -> bool {
        self.lookup(channel) == Some(user_id)
    }
}
