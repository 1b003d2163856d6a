//! # Tangle API
//!
//! The command surface of a tangle node: a single JSON endpoint that reads
//! and extends a DAG of transactions.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         TANGLE API                               │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   POST /  ──►  ApiServer (axum, body limit, trace)               │
//! │                    │                                             │
//! │                    ▼                                             │
//! │            CommandDispatcher  parse, access, solidity guard      │
//! │                    │                                             │
//! │      ┌─────────────┼──────────────┬──────────────┐               │
//! │      ▼             ▼              ▼              ▼               │
//! │  DagTraversal  AdmissionPipeline  IndexSearch  PeerRegistry      │
//! │  (scratchpad)  (PowEngine)        (indices)    (PeerProber)      │
//! │      └─────────────┴──────┬───────┘                              │
//! │                           ▼                                      │
//! │                      GraphStore                                  │
//! │                                                                  │
//! │   outcome ──► ResponseTransport ──► DrainBody (chunked write)    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use tangle_api::{ApiServer, NodeConfig, NodeContext};
//!
//! let context = Arc::new(NodeContext::new(&config, store, milestones, pow, prober)?);
//! let server = ApiServer::new(&config, context)?;
//! server.run(shutdown_rx).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod dispatcher;
pub mod domain;
pub mod node;
pub mod ports;
pub mod server;
pub mod transport;

pub use dispatcher::CommandDispatcher;
pub use domain::access::AccessPolicy;
pub use domain::commands::Command;
pub use domain::config::{ConfigError, NodeConfig};
pub use domain::error::{ApiError, ApiResult, ErrorKind};
pub use domain::milestone::{MilestoneRef, MilestoneTracker, Snapshot};
pub use node::NodeContext;
pub use ports::outbound::{PeerProber, TcpPeerProber};
pub use server::{ApiServer, ServerError};
pub use transport::{DrainBody, DrainState, ResponseTransport};

/// Crate version, reported by `getNodeInfo` and `/health`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
