//! Per-process reward idempotency.
//!
//! A resubmitted drawing inside the window gets the transaction id issued the
//! first time instead of a second transfer. The first submission claims the
//! drawing before paying, so concurrent duplicates see it in flight rather
//! than paying twice. Entries live in memory only, so a restart forgets them.

use alloy::primitives::{keccak256, B256};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum Slot {
    /// A reward for this drawing is being sent.
    Pending(Instant),
    Issued(Instant, String),
}

impl Slot {
    fn since(&self) -> Instant {
        match self {
            Slot::Pending(at) | Slot::Issued(at, _) => *at,
        }
    }
}

/// Result of [`RewardDedupe::claim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// The caller owns the reward and must `complete` or `release` it.
    Acquired,
    /// Another submission of the same drawing is paying right now.
    InFlight,
    /// Already paid within the window.
    Issued(String),
}

#[derive(Debug, Clone)]
pub struct RewardDedupe {
    inner: Arc<DashMap<B256, Slot>>,
    window: Duration,
}

impl RewardDedupe {
    /// A zero window disables deduplication.
    pub fn new(window: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            window,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.window.is_zero()
    }

    pub fn key(image: &str) -> B256 {
        keccak256(image.as_bytes())
    }

    /// Atomically check for an earlier reward and, if there is none, mark
    /// `key` as being paid.
    pub fn claim(&self, key: B256) -> Claim {
        if !self.is_enabled() {
            return Claim::Acquired;
        }
        match self.inner.entry(key) {
            Entry::Occupied(mut entry) if entry.get().since().elapsed() >= self.window => {
                entry.insert(Slot::Pending(Instant::now()));
                Claim::Acquired
            }
            Entry::Occupied(entry) => match entry.get() {
                Slot::Pending(_) => Claim::InFlight,
                Slot::Issued(_, tx_id) => Claim::Issued(tx_id.clone()),
            },
            Entry::Vacant(entry) => {
                entry.insert(Slot::Pending(Instant::now()));
                Claim::Acquired
            }
        }
    }

    /// Store the transaction id for a claimed drawing.
    pub fn complete(&self, key: B256, tx_id: String) {
        if !self.is_enabled() {
            return;
        }
        self.inner.insert(key, Slot::Issued(Instant::now(), tx_id));
        self.purge();
    }

    /// Give up a claim after a failed reward so the next submission may retry.
    pub fn release(&self, key: &B256) {
        self.inner.remove_if(key, |_, slot| matches!(slot, Slot::Pending(_)));
    }

    /// Drop expired entries.
    pub fn purge(&self) {
        let window = self.window;
        self.inner.retain(|_, slot| slot.since().elapsed() < window);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
