use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::models::notification::{Notification, Severity};

/// Newest-first list of transient messages, bounded to `capacity` entries.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    entries: VecDeque<Notification>,
    capacity: usize,
    last_id: u64,
}

impl NotificationQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            last_id: 0,
        }
    }

    pub fn push(
        &mut self,
        message: impl Into<String>,
        severity: Severity,
        now: DateTime<Utc>,
    ) -> &Notification {
        self.last_id += 1;
        self.entries.push_front(Notification {
            id: self.last_id,
            message: message.into(),
            severity,
            created_at: now,
        });
        self.entries.truncate(self.capacity);
        &self.entries[0]
    }

    /// The notification currently on screen: always the newest.
    pub fn latest(&self) -> Option<&Notification> {
        self.entries.front()
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    /// Entries added after `id`, oldest first.
    pub fn since(&self, id: u64) -> Vec<Notification> {
        self.entries
            .iter()
            .rev()
            .filter(|entry| entry.id > id)
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
