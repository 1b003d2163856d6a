//! Response bodies, one per command.
//!
//! The transport adds `duration` to every body on the way out.

use serde::Serialize;
use tangle_types::Hash;

#[derive(Debug, Clone, Serialize)]
pub struct PingResponse {
    pub ip: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPeerResponse {
    /// 1 added, 0 already present, -1 capacity exceeded
    pub added_peers: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetPeerAddressesResponse {
    pub peers: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrytesResponse {
    pub trytes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HashesResponse {
    pub hashes: Vec<Hash>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBalancesResponse {
    /// Decimal strings, one per requested address
    pub balances: Vec<String>,
    pub milestone: Hash,
    pub milestone_index: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetInclusionStatesResponse {
    pub states: Vec<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionsToApproveResponse {
    pub trunk_transaction: Hash,
    pub branch_transaction: Hash,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetNodeInfoResponse {
    pub app_name: String,
    pub app_version: String,
    pub available_processors: usize,
    pub pow_engine: String,
    pub latest_milestone: Hash,
    pub latest_milestone_index: u64,
    pub latest_solid_submesh_milestone: Hash,
    pub latest_solid_submesh_milestone_index: u64,
    pub peers: usize,
    pub queued_transactions: usize,
    /// Milliseconds since the Unix epoch
    pub time: i64,
    pub tips: usize,
    pub transactions_to_request: usize,
    pub uptime_seconds: i64,
}

/// `{}` for commands with nothing to report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmptyResponse {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_names() {
        let value = serde_json::to_value(GetBalancesResponse {
            balances: vec!["10".into()],
            milestone: tangle_types::NULL_HASH,
            milestone_index: 3,
        })
        .unwrap();
        assert_eq!(value["balances"], json!(["10"]));
        assert_eq!(value["milestoneIndex"], json!(3));

        let value = serde_json::to_value(AddPeerResponse { added_peers: -1 }).unwrap();
        assert_eq!(value, json!({"addedPeers": -1}));

        assert_eq!(serde_json::to_value(EmptyResponse {}).unwrap(), json!({}));
    }
}
