//! Error types for chain interaction.
//!
//! [`RpcError`] classifies a single failed round trip (transient or not).
//! [`ChainError`] is what the verification and submission pipeline reports
//! to its caller, so callers can branch on the failure kind instead of
//! parsing messages.

use alloy::primitives::{Address, B256, U256};
use alloy::rpc::json_rpc::RpcError as TransportRpcError;
use alloy::transports::TransportError;
use std::time::Duration;
use thiserror::Error;

/// JSON-RPC error codes that nodes use for rate limiting.
const RATE_LIMIT_CODES: [i64; 2] = [-32005, 429];

/// A failed RPC round trip.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// Connection, HTTP or other transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error (revert, bad nonce, ...).
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// No response within the per-call timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl RpcError {
    /// Whether repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Rpc { code, .. } => RATE_LIMIT_CODES.contains(code),
            Self::Decode(_) => false,
        }
    }
}

impl From<TransportError> for RpcError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportRpcError::ErrorResp(payload) => Self::Rpc {
                code: payload.code,
                message: payload.message.to_string(),
            },
            TransportRpcError::Transport(kind) => Self::Transport(kind.to_string()),
            other => Self::Decode(other.to_string()),
        }
    }
}

impl From<alloy::contract::Error> for RpcError {
    fn from(err: alloy::contract::Error) -> Self {
        match err {
            alloy::contract::Error::TransportError(inner) => inner.into(),
            other => Self::Decode(other.to_string()),
        }
    }
}

/// Pipeline failure reported to the caller of the verifier or submitter.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("oracle prices out of sync for {token}: aggregator {aggregator_price}, oracle {oracle_price}")]
    OraclesOutOfSync {
        token: Address,
        aggregator_price: U256,
        oracle_price: U256,
    },

    #[error("price unavailable for {token}: {reason}")]
    PriceUnavailable { token: Address, reason: String },

    #[error("network failure during {operation}: {source}")]
    Network {
        operation: &'static str,
        #[source]
        source: RpcError,
    },

    #[error("gas estimation failed for {method}: {source}")]
    GasEstimation {
        method: String,
        #[source]
        source: RpcError,
    },

    #[error("error sending {method} transaction: {source}")]
    Submission {
        method: String,
        #[source]
        source: RpcError,
    },

    #[error("cannot encode {method}: {reason}")]
    Encoding { method: String, reason: String },

    #[error("cannot sign {method} transaction: {reason}")]
    Signing { method: String, reason: String },

    #[error("{method} transaction {hash} reverted")]
    Reverted { method: String, hash: B256 },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("no admin signer configured")]
    NoSigner,

    #[error("admin key controls {actual}, expected {expected}")]
    SignerMismatch { expected: Address, actual: Address },

    #[error("invalid admin private key: {0}")]
    InvalidKey(String),
}

impl ChainError {
    /// Wrap a failed read with the operation it belongs to.
    pub fn network(operation: &'static str) -> impl FnOnce(RpcError) -> Self {
        move |source| Self::Network { operation, source }
    }

    /// Whether the caller may safely retry the whole operation later.
    ///
    /// Only transient network failures qualify. Desynchronized oracles,
    /// reverts and rejected submissions must not be retried blindly.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { source, .. } | Self::GasEstimation { source, .. } => {
                source.is_transient()
            }
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}
