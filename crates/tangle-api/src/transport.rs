//! Response rendering and the chunked write body.
//!
//! [`ResponseTransport`] turns a dispatch outcome into an HTTP response with
//! `duration` stamped into the JSON. The body is a [`DrainBody`]: the
//! connection polls it whenever it can take more bytes, and each poll hands
//! over the next chunk of the serialized buffer.

use crate::domain::config::{ApiConfig, ConfigError};
use crate::domain::error::{ApiError, ApiResult};
use axum::http::header::{HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use axum::http::{Response, StatusCode};
use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tracing::{debug, error, trace};

const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");

/// Write progress of a [`DrainBody`].
///
/// A body dropped before reaching `Complete` lost its connection; the
/// exchange ends there and nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainState {
    /// Nothing written yet.
    AwaitingWritable,
    /// `offset` bytes handed to the connection.
    Draining { offset: usize },
    /// Every byte handed over.
    Complete,
}

/// Response body that drains a fixed buffer in chunks.
#[derive(Debug)]
pub struct DrainBody {
    buffer: Bytes,
    chunk_size: usize,
    state: DrainState,
}

impl DrainBody {
    pub fn new(buffer: Bytes, chunk_size: usize) -> Self {
        let state = if buffer.is_empty() {
            DrainState::Complete
        } else {
            DrainState::AwaitingWritable
        };
        Self {
            buffer,
            chunk_size: chunk_size.max(1),
            state,
        }
    }

    pub fn state(&self) -> DrainState {
        self.state
    }

    fn remaining(&self) -> usize {
        match self.state {
            DrainState::AwaitingWritable => self.buffer.len(),
            DrainState::Draining { offset } => self.buffer.len() - offset,
            DrainState::Complete => 0,
        }
    }
}

impl Body for DrainBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let offset = match this.state {
            DrainState::AwaitingWritable => 0,
            DrainState::Draining { offset } => offset,
            DrainState::Complete => return Poll::Ready(None),
        };

        let end = (offset + this.chunk_size).min(this.buffer.len());
        let chunk = this.buffer.slice(offset..end);
        this.state = if end == this.buffer.len() {
            DrainState::Complete
        } else {
            DrainState::Draining { offset: end }
        };
        trace!(offset, len = chunk.len(), total = this.buffer.len(), "response chunk");
        Poll::Ready(Some(Ok(Frame::data(chunk))))
    }

    fn is_end_stream(&self) -> bool {
        self.state == DrainState::Complete
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.remaining() as u64)
    }
}

impl Drop for DrainBody {
    fn drop(&mut self) {
        if self.state != DrainState::Complete {
            debug!(
                state = ?self.state,
                unsent = self.remaining(),
                total = self.buffer.len(),
                "response abandoned before drained"
            );
        }
    }
}

/// Renders dispatch outcomes into responses.
#[derive(Debug, Clone)]
pub struct ResponseTransport {
    cors_origin: HeaderValue,
    keep_alive: HeaderValue,
    chunk_size: usize,
}

impl ResponseTransport {
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        let header = |name: &str, value: &str| {
            HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeader(name.to_string()))
        };
        Ok(Self {
            cors_origin: header("cors_allowed_origin", &config.cors_allowed_origin)?,
            keep_alive: header("keep_alive", &config.keep_alive)?,
            chunk_size: config.response_chunk_size,
        })
    }

    /// Build the response for `outcome`, timing from `received`.
    pub fn respond(&self, outcome: ApiResult<Value>, received: Instant) -> Response<DrainBody> {
        let duration = received.elapsed().as_millis() as u64;
        let (status, body) = match outcome {
            Ok(Value::Object(mut fields)) => {
                fields.insert("duration".into(), duration.into());
                (StatusCode::OK, Value::Object(fields))
            }
            Ok(other) => {
                error!(value = %other, "handler produced a non-object response");
                error_body(&ApiError::internal("malformed response"), duration)
            }
            Err(e) => error_body(&e, duration),
        };

        let buffer = match serde_json::to_vec(&body) {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => {
                error!(error = %e, "response serialization failed");
                Bytes::from_static(br#"{"exception":"response serialization failed"}"#)
            }
        };

        let mut response = Response::new(DrainBody::new(buffer, self.chunk_size));
        *response.status_mut() = status;
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.cors_origin.clone());
        headers.insert(KEEP_ALIVE, self.keep_alive.clone());
        response
    }
}

fn error_body(error: &ApiError, duration: u64) -> (StatusCode, Value) {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let key = if error.kind.is_exception() {
        "exception"
    } else {
        "error"
    };
    let mut fields = Map::new();
    fields.insert(key.into(), error.message.clone().into());
    fields.insert("duration".into(), duration.into());
    (status, Value::Object(fields))
}
