//! Sync orchestration engine
//!
//! Walks the resource catalog in its fixed declaration order. Top-level
//! resources sync against the root context; each child resource then syncs
//! once per context derived from every record of its parent's completed
//! sync. Execution is strictly sequential: one resource/context pair finishes
//! before the next begins, so records arrive in a deterministic order.

mod types;


pub use types::SyncStats;

use crate::client::GraphqlClient;
use crate::config::ConnectorConfig;
use crate::cost::CostSnapshot;
use crate::error::{Error, Result};
use crate::pagination::{Context, PageDriver};
use crate::resource::{catalog, Record, Resource};
use crate::retry::RetryPolicy;
use crate::sink::RecordSink;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, info};

/// Probe query used by the connection check
const CHECK_QUERY: &str = "query { boards (limit: 1) { id } }";

/// Orchestrates a full extraction run over the resource catalog
pub struct SyncEngine {
    config: ConnectorConfig,
    client: GraphqlClient,
    retry: RetryPolicy,
    stats: SyncStats,
}

impl SyncEngine {
    /// Build an engine from validated configuration
    pub fn new(config: ConnectorConfig) -> Result<Self> {
        let client = GraphqlClient::new(&config)?;
        let retry = RetryPolicy::from_config(&config);
        Ok(Self {
            config,
            client,
            retry,
            stats: SyncStats::new(),
        })
    }

    /// Statistics from the last sync
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Accumulated call counts
    pub fn cost(&self) -> CostSnapshot {
        self.client.cost().snapshot()
    }

    /// Issue a one-page probe to verify the endpoint and credentials
    pub async fn check(&self) -> Result<()> {
        self.client
            .execute(CHECK_QUERY, serde_json::Map::new())
            .await?;
        Ok(())
    }

    /// Sync every resource in the catalog
    pub async fn sync(&mut self, sink: &mut dyn RecordSink) -> Result<SyncStats> {
        self.sync_streams(None, sink).await
    }

    /// Sync the selected streams (all when `only` is `None`).
    ///
    /// A selected child drags its parent into the fetch plan so contexts can
    /// be derived, but only selected streams are emitted.
    pub async fn sync_streams(
        &mut self,
        only: Option<&[&str]>,
        sink: &mut dyn RecordSink,
    ) -> Result<SyncStats> {
        let start = Instant::now();
        self.stats = SyncStats::new();

        let resources = catalog();
        let plan = fetch_plan(&resources, only)?;
        let by_name: HashMap<&str, &dyn Resource> =
            resources.iter().map(|r| (r.name(), r.as_ref())).collect();

        let mut parent_records: HashMap<&'static str, Vec<Record>> = HashMap::new();
        let needed_as_parent: HashSet<&str> = resources.iter().filter_map(|r| r.parent()).collect();

        for resource in &resources {
            let name = resource.name();
            if !plan.fetch.contains(name) {
                continue;
            }
            let emit = plan.emit.contains(name);
            info!(stream = name, emit, "starting sync");

            let contexts = match resource.parent() {
                None => vec![Context::root()],
                Some(parent_name) => {
                    let parent = by_name.get(parent_name).copied().ok_or_else(|| {
                        Error::StreamNotFound {
                            stream: parent_name.to_string(),
                        }
                    })?;
                    parent_records
                        .get(parent_name)
                        .map(Vec::as_slice)
                        .unwrap_or(&[])
                        .iter()
                        .filter_map(|record| parent.child_context(record))
                        .collect()
                }
            };

            let schema = resource.schema();
            let driver = PageDriver::new(&self.client, &self.retry, &self.config);
            let mut stream_records = Vec::new();

            for context in contexts {
                debug!(stream = name, ?context, "syncing context");
                let records = driver.read_records(resource.as_ref(), &context).await?;
                for record in records {
                    schema
                        .validate(&record)
                        .map_err(|message| Error::schema(name, message))?;
                    if emit {
                        sink.write_record(name, &record)?;
                        self.stats.add_records(1);
                    }
                    stream_records.push(record);
                }
                self.stats.add_context();
            }

            if emit {
                if let Some(key) = resource.replication_key() {
                    if let Some(cursor) = extract_max_cursor(&stream_records, key) {
                        sink.write_state(name, &json!(cursor))?;
                    }
                }
                self.stats.add_stream();
            }

            info!(
                stream = name,
                records = stream_records.len(),
                "completed sync"
            );
            if needed_as_parent.contains(name) {
                parent_records.insert(name, stream_records);
            }
        }

        sink.flush()?;
        self.stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            records = self.stats.records_synced,
            streams = self.stats.streams_synced,
            graphql_calls = self.cost().graphql_calls,
            "sync finished"
        );
        Ok(self.stats)
    }
}

/// Which streams to fetch and which of those to emit
struct FetchPlan {
    fetch: HashSet<&'static str>,
    emit: HashSet<&'static str>,
}

fn fetch_plan(resources: &[Box<dyn Resource>], only: Option<&[&str]>) -> Result<FetchPlan> {
    let all: HashSet<&'static str> = resources.iter().map(|r| r.name()).collect();

    let Some(selected) = only else {
        return Ok(FetchPlan {
            fetch: all.clone(),
            emit: all,
        });
    };

    let mut emit = HashSet::new();
    for name in selected {
        let resource = resources
            .iter()
            .find(|r| r.name() == *name)
            .ok_or_else(|| Error::StreamNotFound {
                stream: (*name).to_string(),
            })?;
        emit.insert(resource.name());
    }

    // Parent chains are one level deep; a selected child needs its parent
    // fetched for contexts even when the parent itself is not emitted.
    let mut fetch = emit.clone();
    for resource in resources {
        if emit.contains(resource.name()) {
            if let Some(parent) = resource.parent() {
                fetch.insert(parent);
            }
        }
    }

    Ok(FetchPlan { fetch, emit })
}

/// Maximum replication-key value across a stream's records, compared as
/// strings (RFC 3339 timestamps order correctly this way).
fn extract_max_cursor(records: &[Record], key: &str) -> Option<String> {
    records
        .iter()
        .filter_map(|record| match record.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .max()
}
