//! Deduplicated, bounded message feed.

use std::collections::VecDeque;
use std::time::Duration;

use indexmap::IndexSet;

use hamlet_core::{PostedMessage, SenderId};

use crate::config::FeedConfig;

/// A message as held by the feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedMessage {
    /// Author.
    pub sender: SenderId,
    /// Body.
    pub text: String,
    /// Server timestamp, verbatim.
    pub timestamp: String,
    /// Local arrival time; speech age is measured from here.
    pub received_at: Duration,
    /// Delivered as roster backlog rather than live.
    pub backfill: bool,
}

type FeedKey = (String, SenderId, String);

/// Recent messages, oldest first.
///
/// Messages are deduplicated on `(timestamp, sender, text)` so
/// at-least-once delivery shows each message once. The dedupe memory
/// outlives the window so a late redelivery of an evicted message is
/// still recognised.
#[derive(Clone, Debug)]
pub struct MessageFeed {
    entries: VecDeque<FeedMessage>,
    seen: IndexSet<FeedKey>,
    window: usize,
    memory: usize,
    bulletin: usize,
}

impl MessageFeed {
    /// Empty feed with the configured bounds.
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.window),
            seen: IndexSet::with_capacity(config.dedupe_memory),
            window: config.window.max(1),
            memory: config.dedupe_memory.max(config.window),
            bulletin: config.bulletin,
        }
    }

    /// Append `message` unless already seen. Returns whether it was added.
    pub fn push(&mut self, message: PostedMessage, received_at: Duration, backfill: bool) -> bool {
        let key = (
            message.timestamp.clone(),
            message.sender.clone(),
            message.text.clone(),
        );
        if !self.seen.insert(key) {
            return false;
        }
        if self.seen.len() > self.memory {
            self.seen.shift_remove_index(0);
        }
        self.entries.push_back(FeedMessage {
            sender: message.sender,
            text: message.text,
            timestamp: message.timestamp,
            received_at,
            backfill,
        });
        if self.entries.len() > self.window {
            self.entries.pop_front();
        }
        true
    }

    /// Newest live message from `sender` younger than `display`.
    pub fn latest_from(
        &self,
        sender: &SenderId,
        now: Duration,
        display: Duration,
    ) -> Option<&FeedMessage> {
        let latest = self
            .entries
            .iter()
            .rev()
            .find(|m| !m.backfill && &m.sender == sender)?;
        (now.saturating_sub(latest.received_at) < display).then_some(latest)
    }

    /// The bulletin: the most recent messages, oldest first.
    pub fn bulletin(&self) -> impl Iterator<Item = &FeedMessage> {
        let skip = self.entries.len().saturating_sub(self.bulletin);
        self.entries.iter().skip(skip)
    }

    /// All retained messages, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &FeedMessage> {
        self.entries.iter()
    }

    /// Number of retained messages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no messages are retained.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every message and dedupe key.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.seen.clear();
    }
}
