//! # tap-monday
//!
//! A Rust connector that extracts workspaces, boards, views, groups, and items
//! from the monday.com GraphQL API and emits them as an ordered record stream
//! for downstream ingestion.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_monday::{ConnectorConfig, SyncEngine, MemorySink, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ConnectorConfig::new("my-api-token");
//!     let mut engine = SyncEngine::new(config)?;
//!
//!     let mut sink = MemorySink::new();
//!     let stats = engine.sync(&mut sink).await?;
//!
//!     println!("synced {} records", stats.records_synced);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        SyncEngine                             │
//! │  catalog order: workspaces → boards → views/groups/items      │
//! └───────────────────────────────┬───────────────────────────────┘
//!                                 │
//! ┌───────────┬───────────┬───────┴───────┬───────────┬───────────┐
//! │ Resource  │ PageDriver│ RetryPolicy   │ GraphQL   │   Sink    │
//! ├───────────┼───────────┼───────────────┼───────────┼───────────┤
//! │ query     │ token loop│ exponential   │ headers   │ JSON lines│
//! │ schema    │ loop guard│ backoff       │ classify  │ in-memory │
//! │ normalize │ restart   │ 20 attempts   │ sync cost │           │
//! └───────────┴───────────┴───────────────┴───────────┴───────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

/// Error types for the connector
pub mod error;

/// Connector configuration
pub mod config;

/// Per-call sync-cost accounting
pub mod cost;

/// GraphQL request issuer
pub mod client;

/// Composable retry policy with exponential backoff
pub mod retry;

/// Page tokens, contexts, and the pagination driver
pub mod pagination;

/// Declarative record schemas
pub mod schema;

/// Resource capability trait and the monday.com catalog
pub mod resource;

/// Record sink boundary
pub mod sink;

/// Sync orchestration engine
pub mod engine;

/// Command-line interface
pub mod cli;

pub use client::GraphqlClient;
pub use config::ConnectorConfig;
pub use cost::{CallType, CostSnapshot, SyncCost};
pub use engine::{SyncEngine, SyncStats};
pub use error::{Error, Result};
pub use pagination::{Context, PageDriver, PageToken};
pub use resource::{catalog, Record, Resource};
pub use retry::RetryPolicy;
pub use sink::{JsonLinesSink, MemorySink, RecordSink};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
