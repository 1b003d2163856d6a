//! Shared fixtures for the HTTP-level tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use http_body::Frame;
use http_body_util::BodyExt;
use serde_json::Value;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tangle_api::{ApiServer, MilestoneTracker, NodeConfig, NodeContext, TcpPeerProber};
use tangle_pow::PowEngine;
use tangle_storage::{GraphStore, InMemoryGraphStore};
use tangle_types::{Hash, Transaction, TransactionBuilder, HASH_SIZE};
use tower::ServiceExt;

pub const LOCAL: &str = "127.0.0.1:40000";
pub const REMOTE: &str = "203.0.113.20:40000";

/// A node wired to in-memory collaborators, reachable through its router.
pub struct TestNode {
    pub store: Arc<InMemoryGraphStore>,
    pub milestones: Arc<MilestoneTracker>,
    pub context: Arc<NodeContext>,
    pub router: Router,
}

impl TestNode {
    pub fn new(pow: Arc<dyn PowEngine>) -> Self {
        Self::with_config(NodeConfig::default(), pow)
    }

    pub fn with_config(config: NodeConfig, pow: Arc<dyn PowEngine>) -> Self {
        let store = Arc::new(InMemoryGraphStore::new());
        let milestones = Arc::new(MilestoneTracker::new());
        let context = Arc::new(
            NodeContext::new(
                &config,
                store.clone() as Arc<dyn GraphStore>,
                milestones.clone(),
                pow,
                Arc::new(TcpPeerProber),
            )
            .expect("context"),
        );
        let router = ApiServer::new(&config, context.clone())
            .expect("server")
            .router();
        Self {
            store,
            milestones,
            context,
            router,
        }
    }

    /// POST `body` from `origin`; returns status and parsed JSON.
    pub async fn call(&self, origin: &str, body: Value) -> (StatusCode, Value) {
        self.call_raw(origin, body.to_string()).await
    }

    pub async fn call_raw(&self, origin: &str, body: impl Into<Body>) -> (StatusCode, Value) {
        let origin: SocketAddr = origin.parse().expect("origin");
        let mut request = Request::builder()
            .method(Method::POST)
            .uri("/")
            .header("content-type", "application/json")
            .body(body.into())
            .expect("request");
        request.extensions_mut().insert(ConnectInfo(origin));

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// Store a payload directly and return its hash.
    pub fn put(&self, transaction: Transaction) -> Hash {
        let hash = transaction.hash();
        self.store.store(transaction).expect("store");
        hash
    }
}

pub fn hash(c: char) -> Hash {
    c.to_string().repeat(HASH_SIZE).parse().expect("hash")
}

pub fn tx(address: char, value: i64, trunk: Hash, branch: Hash) -> Transaction {
    TransactionBuilder::new()
        .address(hash(address))
        .value(value)
        .trunk(trunk)
        .branch(branch)
        .build()
        .expect("transaction")
}

/// Request body that yields its bytes only after `delay`.
pub struct SlowBody {
    delay: Pin<Box<tokio::time::Sleep>>,
    data: Option<Bytes>,
}

impl SlowBody {
    pub fn new(delay: Duration, data: impl Into<Bytes>) -> Self {
        Self {
            delay: Box::pin(tokio::time::sleep(delay)),
            data: Some(data.into()),
        }
    }
}

impl http_body::Body for SlowBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, Infallible>>> {
        let this = self.get_mut();
        if this.delay.as_mut().poll(cx).is_pending() {
            return Poll::Pending;
        }
        Poll::Ready(this.data.take().map(|data| Ok(Frame::data(data))))
    }
}
