//! Per-call sync-cost accounting
//!
//! The client owns a [`SyncCost`] accumulator and bumps it once for every
//! outbound call it actually makes, retried attempts included. A higher-level
//! reporter reads a [`CostSnapshot`] after the run. Execution is strictly
//! sequential, so plain atomics keep the accumulator `Sync` without a lock.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// The kind of outbound API call being accounted for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    /// Plain REST call
    Rest,
    /// GraphQL query
    Graphql,
    /// Search API call
    Search,
}

/// Accumulated call counts for one sync run
#[derive(Debug, Default)]
pub struct SyncCost {
    rest: AtomicU64,
    graphql: AtomicU64,
    search: AtomicU64,
}

impl SyncCost {
    /// Create a zeroed accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one outbound call of the given type
    pub fn record(&self, call: CallType) {
        let counter = match call {
            CallType::Rest => &self.rest,
            CallType::Graphql => &self.graphql,
            CallType::Search => &self.search,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read the current counts
    pub fn snapshot(&self) -> CostSnapshot {
        CostSnapshot {
            rest_calls: self.rest.load(Ordering::Relaxed),
            graphql_calls: self.graphql.load(Ordering::Relaxed),
            search_calls: self.search.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the accumulated call counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CostSnapshot {
    /// Number of REST calls made
    pub rest_calls: u64,
    /// Number of GraphQL calls made
    pub graphql_calls: u64,
    /// Number of search calls made
    pub search_calls: u64,
}

impl CostSnapshot {
    /// Total calls across all types
    pub fn total(&self) -> u64 {
        self.rest_calls + self.graphql_calls + self.search_calls
    }
}
