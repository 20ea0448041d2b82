//! Error types for Interactive Brokers integration.

use thiserror::Error;

/// Errors that can occur when talking to IB Gateway/TWS.
#[derive(Debug, Error)]
pub enum IbError {
    /// Could not establish a session.
    #[error("connection failed after {attempts} attempt(s): {message}")]
    Connection {
        /// Attempts made before giving up.
        attempts: u32,
        /// Last error reported by the client library.
        message: String,
    },

    /// Error surfaced by the `ibapi` client.
    #[error("IB API error: {0}")]
    Api(String),

    /// Descriptor is missing fields required for its security type.
    #[error("invalid contract: {0}")]
    InvalidContract(String),

    /// Qualification found no contract.
    #[error("qualification failed: no contract matched {description}")]
    Qualification {
        /// Human-readable descriptor.
        description: String,
    },

    /// Qualification found more than one contract.
    #[error("{description} matched {matches} contracts")]
    Ambiguous {
        /// Human-readable descriptor.
        description: String,
        /// Number of matches returned.
        matches: usize,
    },

    /// Combo legs are inconsistent.
    #[error("invalid combo: {0}")]
    InvalidCombo(String),

    /// The broker returned nothing usable.
    #[error("no market data for {0}")]
    NoData(String),

    /// A bounded wait elapsed.
    #[error("timed out waiting for {0}")]
    Timeout(String),

    /// Order was refused by the broker.
    #[error("order rejected: {0}")]
    OrderRejected(String),

    /// The session was opened read-only.
    #[error("session is read-only, refusing to {0}")]
    ReadOnly(String),
}

impl IbError {
    /// Creates a qualification error for a descriptor with no match.
    pub fn qualification(description: impl Into<String>) -> Self {
        Self::Qualification {
            description: description.into(),
        }
    }

    /// Creates an ambiguous-match error.
    pub fn ambiguous(description: impl Into<String>, matches: usize) -> Self {
        Self::Ambiguous {
            description: description.into(),
            matches,
        }
    }

    /// Returns true if repeating the request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Timeout(_) | Self::NoData(_)
        )
    }
}

impl From<ibapi::Error> for IbError {
    fn from(err: ibapi::Error) -> Self {
        Self::Api(err.to_string())
    }
}

/// Result alias for IB operations.
pub type Result<T> = std::result::Result<T, IbError>;
