//! Keyed snapshot cache and scheduled refresh.
//!
//! Aggregator results live in [`SnapshotCell`]s owned by an explicit
//! [`QueryCache`] handed through the application, never a module-level
//! singleton. Two correctness rules apply that plain poll-and-overwrite does
//! not give:
//!
//! * every fetch carries a monotonic sequence number, and a response is
//!   applied only if it is newer than the last applied one, so a slow
//!   late-arriving poll can never overwrite fresher data;
//! * write dispatches invalidate affected cells immediately instead of
//!   waiting for the next poll tick.

use std::{
    collections::HashMap,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use alloy::primitives::Address;

use crate::error::ClientError;

/// Observed refresh cadence of the platform views.
pub const BALANCE_REFRESH: Duration = Duration::from_secs(10);
pub const ROUND_STATS_REFRESH: Duration = Duration::from_secs(15);
pub const PORTFOLIO_REFRESH: Duration = Duration::from_secs(30);
pub const HISTORY_REFRESH: Duration = Duration::from_secs(60);

/// Identity of a cached fetch: operation, observed account, chain.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub operation: &'static str,
    pub account: Option<Address>,
    pub chain_id: u64,
}

impl QueryKey {
    pub fn new(operation: &'static str, account: Option<Address>, chain_id: u64) -> Self {
        Self {
            operation,
            account,
            chain_id,
        }
    }
}

struct CellState<T> {
    value: Option<T>,
    error: Option<String>,
    loading: bool,
    stale: bool,
    last_applied: u64,
}

/// Point-in-time copy of a cell for the presentation side.
#[derive(Clone, Debug)]
pub struct Snapshot<T> {
    pub value: Option<T>,
    /// Last fetch error, if the most recent completed fetch failed.
    pub error: Option<String>,
    /// True until the first fetch (successful or failed) completes.
    pub loading: bool,
    /// Set by invalidation; cleared by the next applied fetch.
    pub stale: bool,
}

/// Holder for the most recent result of one keyed fetch.
pub struct SnapshotCell<T> {
    seq: AtomicU64,
    state: Mutex<CellState<T>>,
}

impl<T: Clone> SnapshotCell<T> {
    pub fn new() -> Self {
        Self {
            seq: AtomicU64::new(0),
            state: Mutex::new(CellState {
                value: None,
                error: None,
                loading: true,
                stale: false,
                last_applied: 0,
            }),
        }
    }

    /// Reserve a sequence number for a fetch that is about to start.
    pub fn begin_fetch(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Apply a completed fetch. Returns false (and changes nothing) when a
    /// newer response has already been applied.
    pub fn apply(&self, seq: u64, result: Result<T, String>) -> bool {
        let mut state = self.state.lock().expect("cell poisoned");
        if seq <= state.last_applied {
            return false;
        }
        state.last_applied = seq;
        state.loading = false;
        state.stale = false;
        match result {
            Ok(value) => {
                state.value = Some(value);
                state.error = None;
            }
            Err(error) => state.error = Some(error),
        }
        true
    }

    /// Flag the held value as stale without discarding it.
    pub fn mark_stale(&self) {
        self.state.lock().expect("cell poisoned").stale = true;
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        let state = self.state.lock().expect("cell poisoned");
        Snapshot {
            value: state.value.clone(),
            error: state.error.clone(),
            loading: state.loading,
            stale: state.stale,
        }
    }
}

impl<T: Clone> Default for SnapshotCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

trait Invalidate: Send + Sync {
    fn mark_stale(&self);
}

impl<T: Clone + Send + Sync> Invalidate for SnapshotCell<T> {
    fn mark_stale(&self) {
        SnapshotCell::mark_stale(self)
    }
}

/// Registry of live cells, keyed by `(operation, account, chain)`.
#[derive(Default)]
pub struct QueryCache {
    cells: Mutex<HashMap<QueryKey, Arc<dyn Invalidate>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Clone + Send + Sync + 'static>(
        &self,
        key: QueryKey,
        cell: Arc<SnapshotCell<T>>,
    ) {
        self.cells
            .lock()
            .expect("cache poisoned")
            .insert(key, cell);
    }

    /// Mark every fetch observing `account` stale, plus account-independent
    /// fetches — a write from any account also moves global round state.
    pub fn invalidate_account(&self, account: Address) {
        for (key, cell) in self.cells.lock().expect("cache poisoned").iter() {
            if key.account == Some(account) || key.account.is_none() {
                cell.mark_stale();
            }
        }
    }
}

/// Handle for a background poll task; dropping it cancels the poll, so a
/// response in flight at teardown can never touch the cell afterwards.
pub struct PollHandle {
    task: tokio::task::JoinHandle<()>,
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Refresh `cell` through `fetch` on a fixed interval, first tick immediate.
///
/// There is no retry or backoff: a failed tick surfaces its error in the cell
/// and the next tick tries again.
pub fn spawn_poll<T, F, Fut>(
    cell: Arc<SnapshotCell<T>>,
    interval: Duration,
    fetch: F,
) -> PollHandle
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, ClientError>> + Send,
{
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let seq = cell.begin_fetch();
            let result = fetch().await.map_err(|e| e.to_string());
            cell.apply(seq, result);
        }
    });
    PollHandle { task }
}
