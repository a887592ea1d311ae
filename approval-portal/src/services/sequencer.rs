//! Per-field request tickets used to drop stale responses.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

/// A claim on a field, valid until a newer ticket is taken for the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    key: K,
    seq: u64,
}

impl<K> Ticket<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Hands out monotonically increasing tickets per key.
pub struct Sequencer<K: Eq + Hash> {
    next: AtomicU64,
    latest: DashMap<K, u64>,
}

impl<K: Eq + Hash + Clone> Sequencer<K> {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            latest: DashMap::new(),
        }
    }

    /// Take a ticket, superseding every earlier ticket for `key`.
    pub fn issue(&self, key: K) -> Ticket<K> {
        let seq = self.next.fetch_add(1, Ordering::SeqCst);
        self.latest.insert(key.clone(), seq);
        Ticket { key, seq }
    }

    pub fn is_current(&self, ticket: &Ticket<K>) -> bool {
        self.latest
            .get(&ticket.key)
            .map(|latest| *latest == ticket.seq)
            .unwrap_or(false)
    }
}

impl<K: Eq + Hash + Clone> Default for Sequencer<K> {
    fn default() -> Self {
        Self::new()
    }
}
