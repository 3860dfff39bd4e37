//! Error types for soroban-probe.
//!
//! # Error Hierarchy
//!
//! - [`Error`](enum@Error) - Main error type, returned by most operations
//!   - [`EncodingError`] - A parameter (or contract id) that cannot become a wire value
//!   - [`InvocationError`] - Session state is missing something a call needs
//!   - [`RpcError`] - Transport failures talking to the Soroban RPC endpoint
//!
//! Decoding has no error type: values the codec does not model degrade to a
//! placeholder string instead of failing.
//!
//! # Example
//!
//! ```rust,no_run
//! use soroban_probe::*;
//!
//! # async fn example(simulator: CallSimulator) {
//! match simulator
//!     .simulate("0xaa", "balance_of", &["{bad json".into()], "GABC", Some(&TESTNET))
//!     .await
//! {
//!     Ok(outcome) => println!("{outcome:?}"),
//!     Err(Error::Encoding { index, source }) => println!("argument {index}: {source}"),
//!     Err(Error::Invocation(e)) if e.is_missing_prerequisite() => println!("not ready: {e}"),
//!     Err(e) => println!("failed: {e}"),
//! }
//! # }
//! ```

use std::time::Duration;

use thiserror::Error;

// ============================================================================
// Encoding Errors
// ============================================================================

/// Error turning user input into a wire value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("unsupported key type: {0} (map keys must be text)")]
    UnsupportedKeyType(String),

    #[error("fractional amounts unsupported: '{0}'")]
    FractionalAmount(String),

    #[error("malformed structured literal '{literal}': {message}")]
    MalformedStructuredLiteral { literal: String, message: String },

    #[error("invalid hex in address '{0}'")]
    InvalidHex(String),

    #[error("integer '{0}' does not fit in 128 bits")]
    IntegerOutOfRange(String),

    #[error("unsupported value: {0}")]
    UnsupportedValue(String),

    #[error("invalid contract id '{0}': expected 0x-prefixed hex or a C... strkey")]
    InvalidContractId(String),

    #[error("value cannot be represented on the wire: {0}")]
    Xdr(String),
}

// ============================================================================
// Invocation Errors
// ============================================================================

/// Session state that must exist before a call can be assembled.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum InvocationError {
    #[error("missing prerequisite: no network selected")]
    MissingNetwork,

    #[error("missing prerequisite: no contract id set")]
    MissingContract,

    #[error("missing prerequisite: no source account set")]
    MissingAccount,

    #[error("another operation is already in progress")]
    Busy,
}

impl InvocationError {
    /// Returns true for the three "missing prerequisite" variants.
    pub fn is_missing_prerequisite(&self) -> bool {
        !matches!(self, InvocationError::Busy)
    }
}

// ============================================================================
// RPC Errors
// ============================================================================

/// Errors from the Soroban RPC gateway.
///
/// A successful HTTP exchange whose payload reports an application failure
/// (for example a simulation `error` field) is *not* an `RpcError`; callers
/// interpret those payloads themselves.
#[derive(Debug, Error)]
pub enum RpcError {
    // ─── Network/Transport ───
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network error: {message}")]
    Network {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // ─── Generic RPC Error ───
    #[error("RPC error: {message} (code: {code})")]
    Rpc {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    // ─── Ledger Errors ───
    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    #[error("Ledger entry not found: {0}")]
    NotFound(String),

    #[error("XDR error: {0}")]
    Xdr(String),
}

impl RpcError {
    /// Create a network error.
    pub fn network(message: impl Into<String>, status_code: Option<u16>) -> Self {
        RpcError::Network {
            message: message.into(),
            status_code,
        }
    }

    /// Returns true if the request never produced a usable HTTP exchange.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RpcError::Http(_) | RpcError::Network { .. } | RpcError::Timeout(_)
        )
    }

    /// Returns true if the requested ledger entry does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RpcError::NotFound(_))
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// Main error type for soroban-probe operations.
#[derive(Debug, Error)]
pub enum Error {
    // ─── Configuration ───
    #[error("Invalid configuration: {0}")]
    Config(String),

    // ─── Encoding ───
    #[error("argument {index}: {source}")]
    Encoding {
        index: usize,
        #[source]
        source: EncodingError,
    },

    #[error(transparent)]
    Value(#[from] EncodingError),

    // ─── Invocation ───
    #[error(transparent)]
    Invocation(#[from] InvocationError),

    // ─── RPC ───
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl Error {
    /// Returns the encoding error behind this error, if any.
    pub fn encoding(&self) -> Option<&EncodingError> {
        match self {
            Error::Encoding { source, .. } => Some(source),
            Error::Value(source) => Some(source),
            _ => None,
        }
    }
}
