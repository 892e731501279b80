//! Error types for AMPLIQC operations

use crate::SessionToken;
use thiserror::Error;

/// Transport-layer failures from backend calls.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Gateway/timeout-class failure. The only class eligible for retry.
    #[error("Gateway timeout from {endpoint}")]
    GatewayTimeout { endpoint: String },

    #[error("Connection to {endpoint} failed: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("Gateway timeout persisted after {attempts} attempts to {endpoint}")]
    RetriesExhausted { endpoint: String, attempts: u32 },
}

impl TransportError {
    /// Whether this failure class may be retried.
    /// Only gateway/timeout-class failures qualify; `RetriesExhausted` is
    /// the terminal report of such a retry loop and never retries again.
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::GatewayTimeout { .. })
    }
}

/// Service-level failures: the backend answered, but unusably.
/// Never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{endpoint} rejected the request with status {status}: {message}")]
    Rejected {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("{tool} is not installed for genome {genome}")]
    ToolUnavailable { tool: String, genome: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Session lifecycle errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session {token} has been superseded by a newer design run")]
    Superseded { token: SessionToken },
}

/// Master error type for all AMPLIQC errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AmpliqcError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl AmpliqcError {
    /// Whether the underlying failure is timeout-class and eligible for
    /// retry by a retrying request.
    pub fn is_transient(&self) -> bool {
        matches!(self, AmpliqcError::Transport(t) if t.is_transient())
    }
}

/// Result type alias for AMPLIQC operations.
pub type AmpliqcResult<T> = Result<T, AmpliqcError>;

// =============================================================================
// TESTS
// =============================================================================
