//! Typed request parameters.
//!
//! The whole request object deserializes into [`Request`], keyed by its
//! `command` field. Hash fields are validated during deserialization; payload
//! trytes are validated by the component that consumes them.

use serde::Deserialize;
use tangle_types::Hash;

/// One parsed request.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Request {
    Ping,
    AddPeer(AddPeerParams),
    GetPeerAddresses,
    AttachToMesh(AttachToMeshParams),
    BroadcastTransactions(TrytesParams),
    FindTransactions(FindTransactionsParams),
    GetBalances(GetBalancesParams),
    GetInclusionStates(GetInclusionStatesParams),
    GetNodeInfo,
    GetTips,
    GetTransactionsToApprove(GetTransactionsToApproveParams),
    GetTrytes(GetTrytesParams),
    InterruptAttachingToMesh,
    StoreTransactions(TrytesParams),
}

/// Transport named by the `type` field of `addPeer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PeerTransport {
    #[default]
    Tcp,
    Udp,
}

impl PeerTransport {
    pub fn scheme(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddPeerParams {
    pub uri: String,
    #[serde(rename = "type", default)]
    pub transport: Option<PeerTransport>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AttachToMeshParams {
    pub trunk_transaction: Hash,
    pub branch_transaction: Hash,
    pub min_weight_magnitude: u8,
    pub trytes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrytesParams {
    pub trytes: Vec<String>,
}

/// Predicate lists for `findTransactions`. Absent and empty lists are
/// equivalent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindTransactionsParams {
    #[serde(default)]
    pub bundles: Option<Vec<Hash>>,
    #[serde(default)]
    pub addresses: Option<Vec<Hash>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub approvees: Option<Vec<Hash>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetBalancesParams {
    pub addresses: Vec<Hash>,
    pub threshold: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetInclusionStatesParams {
    pub transactions: Vec<Hash>,
    pub tips: Vec<Hash>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetTransactionsToApproveParams {
    pub depth: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetTrytesParams {
    pub hashes: Vec<Hash>,
}
