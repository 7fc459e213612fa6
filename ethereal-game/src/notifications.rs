//! One-shot notices for the presentation layer.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::dice::RollOutcome;
use crate::items::LootItem;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Notification {
    /// The fixed verdict of an action, available before the generator answers.
    DiceRoll(RollOutcome),
    /// A newly acquired item.
    Reward(LootItem),
    /// Transient message, e.g. a generator failure.
    Notice(String),
}

/// FIFO of pending notifications. A second reward queues behind the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationQueue {
    pending: VecDeque<Notification>,
}

impl NotificationQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notification: Notification) {
        self.pending.push_back(notification);
    }

    /// The notification currently on display.
    #[must_use]
    pub fn front(&self) -> Option<&Notification> {
        self.pending.front()
    }

    /// Clear the front notification, revealing the next.
    pub fn acknowledge(&mut self) -> Option<Notification> {
        self.pending.pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.pending.iter()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
