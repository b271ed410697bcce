//! # alloy-txm
//!
//! Contract calls from a human-typeable argument notation, and a transaction
//! manager that submits legacy transactions and waits for their receipts.
//!
//! ## Core Features
//!
//! - **Argument Notation**: `<type>:<value>;<type>:<value>` strings parsed into typed values
//! - **ABI Binding**: notation arguments checked against a JSON ABI and encoded through alloy
//! - **Transaction Lifecycle**: nonce/gas defaults, EIP-155 or unprotected signing, submission
//! - **Confirmation Polling**: receipt polling under a timeout and poll interval policy
//! - **RPC Error Classification**: node rejections categorised so callers can decide on retries
//!
//! ## Usage
//!
//! ```ignore
//! use alloy_txm::txm::*;
//!
//! let manager = TransactionManager::connect(ManagerConfig::new(rpc_url)).await?;
//! let call = CallDescriptor::parse("transfer", "address:0xd69c...46a0;uint256:3")?;
//! let receipt = manager
//!     .write_contract_sync(key, token, abi, &call, U256::ZERO, TxOptions::default())
//!     .await?;
//! ```

// ============================================================================
// Internal Module Declarations
// ============================================================================

/// Function binding between notation arguments and JSON ABIs
mod abi;

/// Key generation, hex import and keystore export
mod account;

/// Chain client trait and its alloy provider implementation
mod chain;

/// Manager configuration with defaults and JSON loading
mod config;

/// Pluggable decoders for scalar notation literals
mod decoder;

/// Typed errors and RPC error classification
mod error;

/// Gas defaults and resolution
mod gas;

/// Transaction manager: submission, confirmation and contract helpers
mod manager;

/// Argument notation parser and typed values
mod notation;

/// Retry-with-timeout polling primitive
mod poll;

/// Private key parsing and legacy transaction signing
mod signer;

/// Transaction requests and signing stages
mod tx;

/// Test harness module (compiled only in test mode)
#[cfg(test)]
pub mod test_harness;

// ============================================================================
// Public Exports
// ============================================================================

/// Re-export all public APIs from the alloy crate.
pub use alloy::*;

/// All public types and operations of this crate:
///
/// - `TransactionManager` - Submission and confirmation of transactions
/// - `ArgumentSpec` / `parse` - Notation parsing
/// - `Interface` / `encode` / `decode` - ABI binding
/// - `poll_until` - Retry-with-timeout primitive
/// - `TxError` / `RpcErrorKind` - Errors and their classification
pub mod txm {
    pub use super::abi::*;
    pub use super::account::*;
    pub use super::chain::*;
    pub use super::config::*;
    pub use super::decoder::*;
    pub use super::error::*;
    pub use super::gas::*;
    pub use super::manager::*;
    pub use super::notation::*;
    pub use super::poll::*;
    pub use super::signer::*;
    pub use super::tx::*;
}
