//! API error types.
//!
//! Every failure below the dispatcher becomes an [`ApiError`]. The kind picks
//! the HTTP status and whether the message is rendered under `error` or
//! `exception`.

use std::fmt;
use tangle_storage::StoreError;
use tangle_types::{CodecError, Hash};

/// Failure classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Payload is not a JSON object
    MalformedRequest,
    /// No `command` field
    MissingCommand,
    /// `command` names nothing in the registry
    UnknownCommand,
    /// Restricted command from a remote caller
    AccessDenied,
    /// Solid milestone has not advanced yet
    NotSolid,
    /// Balance threshold outside `(0, 100]`
    InvalidThreshold,
    /// A reference tip is not in the store
    TipNotFound,
    /// A walk reached a placeholder
    IncompleteSubgraph,
    /// `addPeer` preconditions failed
    PeerRejected,
    /// Parameters missing, ill-typed or malformed
    InvalidParameter,
    /// Anything else
    InternalException,
}

impl ErrorKind {
    /// HTTP status for this class.
    pub fn status_code(self) -> u16 {
        match self {
            Self::AccessDenied => 401,
            Self::InternalException => 500,
            _ => 400,
        }
    }

    /// Whether the message is rendered under `exception` rather than `error`.
    pub fn is_exception(self) -> bool {
        self == Self::InternalException
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MalformedRequest => "MalformedRequest",
            Self::MissingCommand => "MissingCommand",
            Self::UnknownCommand => "UnknownCommand",
            Self::AccessDenied => "AccessDenied",
            Self::NotSolid => "NotSolid",
            Self::InvalidThreshold => "InvalidThreshold",
            Self::TipNotFound => "TipNotFound",
            Self::IncompleteSubgraph => "IncompleteSubgraph",
            Self::PeerRejected => "PeerRejected",
            Self::InvalidParameter => "InvalidParameter",
            Self::InternalException => "InternalException",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API error with its failure class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn malformed_request(details: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::MalformedRequest,
            format!("Invalid JSON request: {}", details.into()),
        )
    }

    pub fn missing_command() -> Self {
        Self::new(
            ErrorKind::MissingCommand,
            "COMMAND parameter has not been specified in the request.",
        )
    }

    pub fn unknown_command(command: &str) -> Self {
        Self::new(
            ErrorKind::UnknownCommand,
            format!("Command [{}] is unknown", command),
        )
    }

    pub fn access_denied(command: &str) -> Self {
        Self::new(
            ErrorKind::AccessDenied,
            format!("COMMAND {} is not available on this node", command),
        )
    }

    pub fn not_solid() -> Self {
        Self::new(
            ErrorKind::NotSolid,
            "This operation cannot be executed: the subgraph is not solid yet",
        )
    }

    pub fn invalid_threshold(threshold: i64) -> Self {
        Self::new(
            ErrorKind::InvalidThreshold,
            format!("Illegal 'threshold': {} (expected 1..=100)", threshold),
        )
    }

    pub fn tip_not_found(tip: &Hash) -> Self {
        Self::new(ErrorKind::TipNotFound, format!("Tip not found: {}", tip))
    }

    pub fn incomplete_subgraph(hash: &Hash) -> Self {
        Self::new(
            ErrorKind::IncompleteSubgraph,
            format!("The subgraph is not solid: {} has not been received", hash),
        )
    }

    pub fn peer_rejected(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::PeerRejected,
            format!("Peer rejected: {}", reason.into()),
        )
    }

    pub fn invalid_parameter(details: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::InvalidParameter,
            format!("Invalid parameters: {}", details.into()),
        )
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalException, details)
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

// Conversions from lower layers

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::internal(format!("storage failure: {}", e))
    }
}

impl From<CodecError> for ApiError {
    fn from(e: CodecError) -> Self {
        ApiError::invalid_parameter(e.to_string())
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::access_denied("getTips").status_code(), 401);
        assert_eq!(ApiError::internal("boom").status_code(), 500);
        for err in [
            ApiError::malformed_request("x"),
            ApiError::missing_command(),
            ApiError::unknown_command("nope"),
            ApiError::not_solid(),
            ApiError::invalid_threshold(0),
            ApiError::tip_not_found(&tangle_types::NULL_HASH),
            ApiError::incomplete_subgraph(&tangle_types::NULL_HASH),
            ApiError::peer_rejected("x"),
            ApiError::invalid_parameter("x"),
        ] {
            assert_eq!(err.status_code(), 400, "{}", err);
            assert!(!err.kind.is_exception());
        }
        assert!(ApiError::internal("boom").kind.is_exception());
    }

    #[test]
    fn test_unknown_command_names_command() {
        let err = ApiError::unknown_command("fooBar");
        assert_eq!(err.kind, ErrorKind::UnknownCommand);
        assert!(err.message.contains("fooBar"));
    }

    #[test]
    fn test_from_lower_layers() {
        let err: ApiError = StoreError::NullPointer.into();
        assert_eq!(err.kind, ErrorKind::InternalException);

        let err: ApiError = CodecError::TagTooLong { actual: 30, max: 27 }.into();
        assert_eq!(err.kind, ErrorKind::InvalidParameter);
    }
}
