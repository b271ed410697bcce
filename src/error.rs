//! Error types for notation parsing, ABI encoding and transaction handling.
//!
//! Every public operation returns one of three typed errors:
//!
//! - [`NotationError`]: the argument notation could not be parsed. Local and
//!   never worth retrying.
//! - [`CodecError`]: the interface description, function lookup, arity or
//!   types did not line up, or the ABI codec itself refused the values.
//! - [`TxError`]: anything on the transaction path (keys, signing, RPC,
//!   confirmation timeout).
//!
//! RPC failures additionally carry an [`RpcErrorKind`] obtained by matching
//! the node's error message. The manager never retries on its own; the kind
//! exists so callers can decide whether a resubmission with a fresh nonce or
//! a higher gas price makes sense.

use std::{borrow::Cow, time::Duration};

use alloy::{
    primitives::{Bytes, B256},
    signers::local::LocalSignerError,
    transports::{RpcError, TransportError},
};
use thiserror::Error;

use crate::notation::ArgType;

// ============================================================================
// Notation errors
// ============================================================================

/// Rejection of a notation string. No partial result is ever produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    /// A segment did not split into exactly `type` and `value` on `:`.
    #[error("malformed argument entry '{0}': expected <type>:<value>")]
    MalformedEntry(String),

    /// The type tag is not one of the supported notation tags.
    #[error("unsupported argument type '{0}'")]
    UnsupportedType(String),

    /// A `uint256` literal was not plain decimal or did not fit an `i64`.
    #[error("uint256 value format error: '{0}'")]
    NumericFormat(String),

    /// A hex literal had odd length or contained a non-hex character.
    #[error("hex value format error: '{0}'")]
    HexFormat(String),

    /// A `bytes32` literal was longer than 32 bytes.
    #[error("bytes32 value greater than 32 bytes: '{0}'")]
    FixedBytesOverflow(String),
}

// ============================================================================
// Codec errors
// ============================================================================

/// Failure while binding arguments to, or results from, a contract function.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Notation(#[from] NotationError),

    /// The interface description is not a valid JSON ABI.
    #[error("invalid contract interface: {0}")]
    Interface(#[source] serde_json::Error),

    #[error("function '{0}' not found in interface")]
    UnknownFunction(String),

    /// The function declares a parameter or output type the notation cannot express.
    #[error("function '{function}' uses unsupported type '{ty}'")]
    UnsupportedType { function: String, ty: String },

    #[error("function '{function}' expects {expected} arguments, got {found}")]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("function '{function}' argument {index}: expected {expected}, got {found}")]
    TypeMismatch {
        function: String,
        index: usize,
        expected: String,
        found: ArgType,
    },

    #[error("encoding '{function}' failed: {source}")]
    Encode {
        function: String,
        #[source]
        source: alloy::dyn_abi::Error,
    },

    #[error("decoding '{function}' failed: {source}")]
    Decode {
        function: String,
        #[source]
        source: alloy::dyn_abi::Error,
    },

    /// Return data handed over as a hex string could not be decoded.
    #[error("return data is not valid hex: {0}")]
    ReturnData(String),
}

impl CodecError {
    /// Name of the function the failed operation targeted, if known.
    pub fn function(&self) -> Option<&str> {
        match self {
            CodecError::UnknownFunction(function)
            | CodecError::UnsupportedType { function, .. }
            | CodecError::ArityMismatch { function, .. }
            | CodecError::TypeMismatch { function, .. }
            | CodecError::Encode { function, .. }
            | CodecError::Decode { function, .. } => Some(function),
            _ => None,
        }
    }
}

// ============================================================================
// Transaction errors
// ============================================================================

/// Failure on the transaction path.
#[derive(Debug, Error)]
pub enum TxError {
    /// The sender key is not a valid secp256k1 private key.
    #[error("invalid private key: {0}")]
    Key(#[source] LocalSignerError),

    #[error("keystore error: {0}")]
    Keystore(#[source] LocalSignerError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("failed to sign transaction: {0}")]
    Signing(#[source] alloy::signers::Error),

    #[error("invalid rpc endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// An RPC call failed. `op` names the chain operation that was attempted.
    #[error("{op} failed: {source}")]
    Network {
        op: &'static str,
        #[source]
        source: TransportError,
    },

    /// The receipt did not show up before the deadline. The transaction may
    /// still be pending; it is not known to have failed.
    #[error("transaction {hash} not mined after {waited:?}")]
    Timeout { hash: B256, waited: Duration },
}

impl TxError {
    pub(crate) fn network(op: &'static str, source: TransportError) -> Self {
        TxError::Network {
            op,
            source: pretty_rpc_error(source),
        }
    }

    /// Classification of the underlying RPC failure, for network errors only.
    pub fn rpc_kind(&self) -> Option<RpcErrorKind> {
        match self {
            TxError::Network { source, .. } => Some(classify_rpc_error(source)),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TxError::Timeout { .. })
    }
}

// ============================================================================
// RPC error classification
// ============================================================================

/// Coarse classification of node-side rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcErrorKind {
    /// Nonce already used on chain
    NonceTooLow,
    /// Nonce leaves a gap after the account's pending nonce
    NonceTooHigh,
    /// Gas price below what the node or the replaced transaction requires
    Underpriced,
    InsufficientFunds,
    /// Gas limit below the intrinsic cost of the transaction
    IntrinsicGasTooLow,
    /// Same transaction already sitting in the mempool
    AlreadyKnown,
    /// Node refused a transaction without replay protection
    ReplayProtectionRequired,
    /// Connection level problem, the request may not have reached the node
    Network,
    Unknown,
}

impl RpcErrorKind {
    /// Whether resubmitting can succeed without the caller changing anything
    /// but nonce or gas parameters.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RpcErrorKind::NonceTooLow
                | RpcErrorKind::Underpriced
                | RpcErrorKind::IntrinsicGasTooLow
                | RpcErrorKind::Network
        )
    }

    /// A resubmission needs a freshly queried nonce.
    pub fn needs_fresh_nonce(&self) -> bool {
        matches!(self, RpcErrorKind::NonceTooLow | RpcErrorKind::NonceTooHigh)
    }

    /// A resubmission needs a higher gas price.
    pub fn needs_higher_gas_price(&self) -> bool {
        matches!(self, RpcErrorKind::Underpriced)
    }
}

/// Classify an RPC error by matching well-known node messages.
///
/// Providers word their errors differently, so several patterns are checked
/// per kind.
pub fn classify_rpc_error<E: std::fmt::Display>(error: &RpcError<E>) -> RpcErrorKind {
    classify_message(&error.to_string())
}

pub(crate) fn classify_message(message: &str) -> RpcErrorKind {
    let msg = message.to_lowercase();

    if msg.contains("nonce too low")
        || msg.contains("nonce is too low")
        || (msg.contains("invalid nonce") && (msg.contains("too low") || msg.contains("expected")))
    {
        return RpcErrorKind::NonceTooLow;
    }

    if msg.contains("nonce too high") || msg.contains("nonce is too high") || msg.contains("nonce gap")
    {
        return RpcErrorKind::NonceTooHigh;
    }

    if msg.contains("underpriced")
        || msg.contains("gas price too low")
        || msg.contains("max fee per gas less than block base fee")
    {
        return RpcErrorKind::Underpriced;
    }

    if msg.contains("insufficient funds")
        || msg.contains("insufficient balance")
        || msg.contains("exceeds balance")
    {
        return RpcErrorKind::InsufficientFunds;
    }

    if msg.contains("intrinsic gas too low") || msg.contains("gas limit too low") {
        return RpcErrorKind::IntrinsicGasTooLow;
    }

    if msg.contains("already known")
        || msg.contains("known transaction")
        || msg.contains("already imported")
    {
        return RpcErrorKind::AlreadyKnown;
    }

    if msg.contains("only replay-protected") || msg.contains("eip-155") || msg.contains("eip155") {
        return RpcErrorKind::ReplayProtectionRequired;
    }

    if msg.contains("connection")
        || msg.contains("timeout")
        || msg.contains("timed out")
        || msg.contains("transport")
        || msg.contains("broken pipe")
        || msg.contains("eof")
    {
        return RpcErrorKind::Network;
    }

    RpcErrorKind::Unknown
}

/// JSON-RPC code for a method the node does not serve.
const METHOD_NOT_FOUND: i64 = -32601;

/// Whether a receipt lookup failed only because the node does not know the
/// transaction yet. Some nodes report this as an error instead of `null`.
pub(crate) fn is_receipt_not_found<E: std::fmt::Display>(error: &RpcError<E>) -> bool {
    if let RpcError::ErrorResp(payload) = error {
        if payload.code == METHOD_NOT_FOUND {
            return false;
        }
    }
    let msg = error.to_string().to_lowercase();
    if msg.contains("method not found") || msg.contains("does not exist/is not available") {
        return false;
    }
    msg.contains("transaction not found")
        || msg.contains("receipt not found")
        || msg.contains("unknown transaction")
}

// ============================================================================
// Revert reasons
// ============================================================================

/// Append the decoded revert reason to a node error response, when the
/// response carries `Error(string)` / `Panic(uint256)` revert data.
pub fn pretty_rpc_error(err: TransportError) -> TransportError {
    match err {
        RpcError::ErrorResp(payload) => {
            let mut new_payload = payload.clone();
            if let Some(data) = &payload.data {
                if let Ok(data) = serde_json::from_str::<Bytes>(data.get()) {
                    if let Some(reason) = alloy::sol_types::decode_revert_reason(&data) {
                        new_payload.message =
                            new_payload.message.clone() + Cow::Owned(format!(", reason: {reason}"));
                    }
                }
            }
            RpcError::ErrorResp(new_payload)
        }
        err => err,
    }
}
