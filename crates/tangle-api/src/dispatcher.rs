//! Command dispatch.
//!
//! Turns a raw request body into a handler call: parse, look up the
//! command, check access and solidity, then run it.

use crate::domain::access::{is_loopback, AccessPolicy};
use crate::domain::commands::Command;
use crate::domain::error::{ApiError, ApiResult, ErrorKind};
use crate::domain::requests::Request;
use crate::node::NodeContext;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct CommandDispatcher {
    context: Arc<NodeContext>,
    access: AccessPolicy,
    counter: AtomicU64,
}

impl CommandDispatcher {
    pub fn new(context: Arc<NodeContext>, access: AccessPolicy) -> Self {
        Self {
            context,
            access,
            counter: AtomicU64::new(0),
        }
    }

    pub fn context(&self) -> &Arc<NodeContext> {
        &self.context
    }

    /// Requests accepted for execution so far.
    pub fn request_count(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    /// Handle one request body from `origin`.
    pub async fn dispatch(&self, payload: &[u8], origin: SocketAddr) -> ApiResult<Value> {
        let result = self.dispatch_inner(payload, origin).await;
        if let Err(e) = &result {
            match e.kind {
                ErrorKind::AccessDenied | ErrorKind::PeerRejected => {
                    warn!(%origin, kind = %e.kind, message = %e.message, "request refused")
                }
                ErrorKind::InternalException => {
                    error!(%origin, message = %e.message, "request failed")
                }
                _ => debug!(%origin, kind = %e.kind, message = %e.message, "request rejected"),
            }
        }
        result
    }

    async fn dispatch_inner(&self, payload: &[u8], origin: SocketAddr) -> ApiResult<Value> {
        let body: Value = serde_json::from_slice(payload)
            .map_err(|e| ApiError::malformed_request(e.to_string()))?;
        let Some(fields) = body.as_object() else {
            return Err(ApiError::malformed_request("expected a JSON object"));
        };

        let name = match fields.get("command") {
            None | Some(Value::Null) => return Err(ApiError::missing_command()),
            Some(Value::String(name)) => name.clone(),
            Some(_) => return Err(ApiError::invalid_parameter("'command' must be a string")),
        };

        let command = Command::from_name(&name);
        if let Some(command) = command {
            if !self.access.permits(command, origin.ip()) {
                return Err(ApiError::access_denied(&name));
            }
        }

        let number = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            request = number,
            command = %name,
            loopback = is_loopback(origin.ip()),
            "requesting command"
        );

        let command = command.ok_or_else(|| ApiError::unknown_command(&name))?;

        let request: Request = serde_json::from_value(body)
            .map_err(|e| ApiError::invalid_parameter(format!("{}: {}", command, e)))?;
        debug!(
            %command,
            description = command.info().description,
            ?request,
            "parsed request"
        );

        if command.requires_solid() && !self.context.milestones.is_solid() {
            return Err(ApiError::not_solid());
        }

        self.context.execute(request, origin).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::NodeConfig;
    use crate::domain::milestone::{MilestoneRef, MilestoneTracker};
    use crate::ports::outbound::TcpPeerProber;
    use serde_json::json;
    use tangle_pow::test_utils::AlwaysSucceedPow;
    use tangle_storage::InMemoryGraphStore;
    use tangle_types::NULL_HASH;

    fn dispatcher() -> CommandDispatcher {
        let config = NodeConfig::default();
        let context = NodeContext::new(
            &config,
            Arc::new(InMemoryGraphStore::new()),
            Arc::new(MilestoneTracker::new()),
            Arc::new(AlwaysSucceedPow::default()),
            Arc::new(TcpPeerProber),
        )
        .unwrap();
        CommandDispatcher::new(Arc::new(context), AccessPolicy::from_config(&config.access))
    }

    fn local() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    fn remote() -> SocketAddr {
        "203.0.113.7:50000".parse().unwrap()
    }

    async fn kind(d: &CommandDispatcher, body: &str, origin: SocketAddr) -> ErrorKind {
        d.dispatch(body.as_bytes(), origin).await.unwrap_err().kind
    }

    #[tokio::test]
    async fn test_envelope_errors() {
        let d = dispatcher();
        assert_eq!(kind(&d, "{not json", local()).await, ErrorKind::MalformedRequest);
        assert_eq!(kind(&d, "[1,2]", local()).await, ErrorKind::MalformedRequest);
        assert_eq!(kind(&d, "{}", local()).await, ErrorKind::MissingCommand);
        assert_eq!(
            kind(&d, r#"{"command":7}"#, local()).await,
            ErrorKind::InvalidParameter
        );
        assert_eq!(
            kind(&d, r#"{"command":"fooBar"}"#, local()).await,
            ErrorKind::UnknownCommand
        );
    }

    #[tokio::test]
    async fn test_remote_restrictions() {
        let d = dispatcher();
        assert_eq!(
            kind(&d, r#"{"command":"getTips"}"#, remote()).await,
            ErrorKind::AccessDenied
        );
        assert_eq!(
            kind(&d, r#"{"command":"fooBar"}"#, remote()).await,
            ErrorKind::UnknownCommand
        );
        let pong = d
            .dispatch(br#"{"command":"ping"}"#, remote())
            .await
            .unwrap();
        assert_eq!(pong, json!({"ip": "203.0.113.7"}));
        assert!(d.dispatch(br#"{"command":"getTips"}"#, local()).await.is_ok());
    }

    #[tokio::test]
    async fn test_solidity_guard() {
        let d = dispatcher();
        let body = format!(
            r#"{{"command":"getInclusionStates","transactions":["{0}"],"tips":["{0}"]}}"#,
            NULL_HASH
        );
        assert_eq!(kind(&d, &body, local()).await, ErrorKind::NotSolid);

        d.context()
            .milestones
            .update_solid(MilestoneRef { hash: NULL_HASH, index: 1 });
        let value = d.dispatch(body.as_bytes(), local()).await.unwrap();
        assert_eq!(value, json!({"states": [true]}));
    }

    #[tokio::test]
    async fn test_bad_parameters() {
        let d = dispatcher();
        assert_eq!(
            kind(&d, r#"{"command":"getTrytes","hashes":["ABC"]}"#, local()).await,
            ErrorKind::InvalidParameter
        );
        assert_eq!(
            kind(&d, r#"{"command":"getBalances","addresses":[]}"#, local()).await,
            ErrorKind::InvalidParameter
        );
    }

    #[tokio::test]
    async fn test_counter_counts_accepted_requests() {
        let d = dispatcher();
        let _ = d.dispatch(b"{}", local()).await;
        let _ = d.dispatch(br#"{"command":"getTips"}"#, remote()).await;
        let _ = d.dispatch(br#"{"command":"ping"}"#, local()).await;
        let _ = d.dispatch(br#"{"command":"getNodeInfo"}"#, local()).await;
        assert_eq!(d.request_count(), 2);
    }
}
