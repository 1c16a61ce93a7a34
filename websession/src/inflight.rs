//! In-flight request registry.
//!
//! Serializes concurrent requests for the same [`RequestKey`] into one
//! underlying network call. The first caller for a key becomes the *owner*
//! and performs the call; later callers *attach* and wait. When the owner
//! completes, every attached waiter receives a clone of the outcome in
//! attach order and the entry is gone.
//!
//! `begin_or_attach` and `complete` for one key are linearized by the
//! map's shard lock: a caller can never slip past an in-progress completion
//! into a dropped notification, and a live entry can never gain a second
//! owner. Both operations are synchronous and never suspend.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::oneshot;
use websession_core::RequestKey;

/// What `begin_or_attach` decided for this caller.
#[derive(Debug)]
pub(crate) enum Flight<R> {
    /// No call is in flight for the key: this caller must perform the
    /// network call and then [`complete`](OwnerPermit::complete) the permit.
    Owner(OwnerPermit<R>),
    /// A call is already in flight: await the receiver. A closed channel
    /// means the owner was dropped before completing.
    Attached(oneshot::Receiver<R>),
}

struct FlightEntry<R> {
    /// Attach-ordered; fan-out walks this front to back.
    waiters: Vec<oneshot::Sender<R>>,
}

pub(crate) struct InFlightRegistry<R> {
    entries: Arc<DashMap<RequestKey, FlightEntry<R>>>,
}

impl<R: Clone> InFlightRegistry<R> {
    pub(crate) fn new() -> Self {
        InFlightRegistry {
            entries: Arc::new(DashMap::new()),
        }
    }

    pub(crate) fn begin_or_attach(&self, key: &RequestKey) -> Flight<R> {
        match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let (tx, rx) = oneshot::channel();
                occupied.get_mut().waiters.push(tx);
                Flight::Attached(rx)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(FlightEntry {
                    waiters: Vec::new(),
                });
                Flight::Owner(OwnerPermit {
                    key: key.clone(),
                    entries: Arc::clone(&self.entries),
                    completed: false,
                })
            }
        }
    }

    #[cfg(test)]
    fn in_flight(&self, key: &RequestKey) -> bool {
        self.entries.contains_key(key)
    }
}

/// Exclusive right (and obligation) to perform the network call for a key.
///
/// Dropping the permit without completing removes the entry; stranded
/// waiters observe their channel closing instead of hanging forever.
pub(crate) struct OwnerPermit<R> {
    key: RequestKey,
    entries: Arc<DashMap<RequestKey, FlightEntry<R>>>,
    completed: bool,
}

impl<R> std::fmt::Debug for OwnerPermit<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnerPermit")
            .field("key", &self.key)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

impl<R: Clone> OwnerPermit<R> {
    /// Removes the entry, fans `outcome` out to every waiter in attach
    /// order, and hands the outcome back to the owner.
    ///
    /// Waiters that stopped listening are skipped; everyone else receives
    /// exactly this outcome, exactly once.
    pub(crate) fn complete(mut self, outcome: R) -> R {
        self.completed = true;
        if let Some((_, entry)) = self.entries.remove(&self.key) {
            for waiter in entry.waiters {
                let _ = waiter.send(outcome.clone());
            }
        }
        outcome
    }
}

impl<R> Drop for OwnerPermit<R> {
    fn drop(&mut self) {
        if !self.completed {
            self.entries.remove(&self.key);
        }
    }
}
