//! Node state and the handlers behind each command.
//!
//! Graph work is synchronous and runs on the blocking pool; only `addPeer`
//! awaits network I/O.

pub mod admission;
pub mod broadcast;
pub mod peers;
pub mod search;
pub mod tips;
pub mod traversal;

use crate::domain::config::{ConfigError, NodeConfig};
use crate::domain::error::{ApiError, ApiResult};
use crate::domain::milestone::{MilestoneTracker, Snapshot};
use crate::domain::requests::Request;
use crate::domain::responses::*;
use crate::domain::scratchpad::VisitedScratchpad;
use crate::ports::outbound::PeerProber;
use admission::AdmissionPipeline;
use broadcast::BroadcastQueue;
use chrono::{DateTime, Utc};
use peers::PeerRegistry;
use search::IndexSearch;
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tangle_pow::PowEngine;
use tangle_storage::GraphStore;
use tangle_types::Transaction;
use tips::TipSelector;
use tracing::{debug, warn};
use traversal::DagTraversal;

/// Application name reported by `getNodeInfo`.
pub const APP_NAME: &str = "tangle-node";

/// Everything a command handler can reach.
pub struct NodeContext {
    pub store: Arc<dyn GraphStore>,
    pub milestones: Arc<MilestoneTracker>,
    pub snapshot: Snapshot,
    pub scratchpad: VisitedScratchpad,
    pub admission: AdmissionPipeline,
    pub peers: PeerRegistry,
    pub broadcast: BroadcastQueue,
    started_at: DateTime<Utc>,
}

impl NodeContext {
    /// Assemble the node state. Configured milestone sources that fail to
    /// parse are logged and skipped.
    pub fn new(
        config: &NodeConfig,
        store: Arc<dyn GraphStore>,
        milestones: Arc<MilestoneTracker>,
        pow: Arc<dyn PowEngine>,
        prober: Arc<dyn PeerProber>,
    ) -> Result<Self, ConfigError> {
        let snapshot = Snapshot::from_entries(&config.snapshot.balances)
            .map_err(|e| ConfigError::InvalidSnapshot(e.to_string()))?;

        let peers = PeerRegistry::new(
            prober,
            config.peers.max_peers,
            config.peers.probe_port,
            config.peers.probe_timeout,
        );
        for uri in &config.peers.milestone_sources {
            if let Err(e) = peers.add_milestone_source(uri) {
                warn!(%uri, error = %e, "ignoring milestone source");
            }
        }

        Ok(Self {
            store,
            milestones,
            snapshot,
            scratchpad: VisitedScratchpad::new(),
            admission: AdmissionPipeline::new(pow),
            peers,
            broadcast: BroadcastQueue::new(config.peers.broadcast_queue_capacity),
            started_at: Utc::now(),
        })
    }

    /// Run one parsed request for a caller at `origin`.
    pub async fn execute(self: &Arc<Self>, request: Request, origin: SocketAddr) -> ApiResult<Value> {
        match request {
            Request::Ping => to_value(PingResponse {
                ip: origin.ip().to_canonical().to_string(),
            }),
            Request::AddPeer(params) => {
                let outcome = self
                    .peers
                    .add_peer(&params.uri, params.transport, origin.ip())
                    .await?;
                to_value(AddPeerResponse {
                    added_peers: outcome.code(),
                })
            }
            other => {
                let context = Arc::clone(self);
                tokio::task::spawn_blocking(move || context.execute_blocking(other))
                    .await
                    .map_err(|e| ApiError::internal(format!("handler task failed: {}", e)))?
            }
        }
    }

    /// Handlers that touch the graph or the proof-of-work engine.
    pub fn execute_blocking(&self, request: Request) -> ApiResult<Value> {
        match request {
            Request::Ping | Request::AddPeer(_) => {
                Err(ApiError::internal("command must not run on the blocking pool"))
            }
            Request::GetPeerAddresses => to_value(GetPeerAddressesResponse {
                peers: self.peers.addresses(),
            }),
            Request::AttachToMesh(p) => {
                let trytes = self.admission.attach(
                    p.trunk_transaction,
                    p.branch_transaction,
                    p.min_weight_magnitude,
                    &p.trytes,
                )?;
                to_value(TrytesResponse { trytes })
            }
            Request::BroadcastTransactions(p) => {
                let transactions = parse_payloads(&p.trytes)?;
                self.broadcast.enqueue(transactions);
                to_value(EmptyResponse {})
            }
            Request::FindTransactions(p) => {
                let hashes = IndexSearch::new(self.store.as_ref()).find(&p)?;
                to_value(HashesResponse { hashes })
            }
            Request::GetBalances(p) => {
                let milestone = self.milestones.latest_solid();
                let report = self.traversal().balances(
                    &p.addresses,
                    p.threshold,
                    milestone,
                    &self.snapshot,
                )?;
                to_value(GetBalancesResponse {
                    balances: report.balances.iter().map(i64::to_string).collect(),
                    milestone: report.milestone.hash,
                    milestone_index: report.milestone.index,
                })
            }
            Request::GetInclusionStates(p) => {
                let states = self.traversal().inclusion_states(&p.transactions, &p.tips)?;
                to_value(GetInclusionStatesResponse { states })
            }
            Request::GetNodeInfo => to_value(self.node_info()),
            Request::GetTips => to_value(HashesResponse {
                hashes: self.store.tips(),
            }),
            Request::GetTransactionsToApprove(p) => {
                let pair = TipSelector::new(self.store.as_ref()).select(
                    self.milestones.latest_solid(),
                    p.depth,
                    &mut rand::thread_rng(),
                )?;
                to_value(GetTransactionsToApproveResponse {
                    trunk_transaction: pair.trunk,
                    branch_transaction: pair.branch,
                })
            }
            Request::GetTrytes(p) => {
                let mut trytes = Vec::with_capacity(p.hashes.len());
                for hash in &p.hashes {
                    match self.store.load_by_hash(hash)? {
                        Some(record) => match record.trytes() {
                            Some(t) => trytes.push(t.to_string()),
                            None => debug!(%hash, "no payload held"),
                        },
                        None => debug!(%hash, "unknown hash"),
                    }
                }
                to_value(TrytesResponse { trytes })
            }
            Request::InterruptAttachingToMesh => {
                self.admission.interrupt();
                to_value(EmptyResponse {})
            }
            Request::StoreTransactions(p) => {
                let transactions = parse_payloads(&p.trytes)?;
                let mut inserted = 0usize;
                for transaction in transactions {
                    if self.store.store(transaction)?.is_new() {
                        inserted += 1;
                    }
                }
                debug!(submitted = p.trytes.len(), inserted, "storeTransactions");
                to_value(EmptyResponse {})
            }
        }
    }

    fn traversal(&self) -> DagTraversal<'_> {
        DagTraversal::new(self.store.as_ref(), &self.scratchpad)
    }

    /// Runtime summary for `getNodeInfo`.
    pub fn node_info(&self) -> GetNodeInfoResponse {
        let latest = self.milestones.latest();
        let solid = self.milestones.latest_solid();
        let now = Utc::now();
        GetNodeInfoResponse {
            app_name: APP_NAME.to_string(),
            app_version: crate::VERSION.to_string(),
            available_processors: num_cpus::get(),
            pow_engine: self.admission.engine_name().to_string(),
            latest_milestone: latest.hash,
            latest_milestone_index: latest.index,
            latest_solid_submesh_milestone: solid.hash,
            latest_solid_submesh_milestone_index: solid.index,
            peers: self.peers.len(),
            queued_transactions: self.broadcast.len(),
            time: now.timestamp_millis(),
            tips: self.store.tips().len(),
            transactions_to_request: self.store.placeholder_count(),
            uptime_seconds: (now - self.started_at).num_seconds(),
        }
    }
}

/// Parse every payload before acting on any of them.
fn parse_payloads(trytes: &[String]) -> ApiResult<Vec<Transaction>> {
    trytes
        .iter()
        .enumerate()
        .map(|(i, t)| {
            Transaction::from_trytes(t)
                .map_err(|e| ApiError::invalid_parameter(format!("trytes[{}]: {}", i, e)))
        })
        .collect()
}

fn to_value<T: Serialize>(response: T) -> ApiResult<Value> {
    serde_json::to_value(response)
        .map_err(|e| ApiError::internal(format!("response serialization failed: {}", e)))
}
