//! Transaction requests and their progression from built to signed.
//!
//! ```text
//! TxRequest ──resolve defaults──► UnsignedTx ──sign──► SignedTx ──submit──► hash
//!                                                                    │
//!                                                     wait_for_receipt
//!                                                                    ▼
//!                                                   Confirmed | TimedOut
//! ```

use std::fmt;

use alloy::{
    consensus::{Transaction, TxEnvelope, TxLegacy},
    eips::eip2718::Encodable2718,
    primitives::{Address, Bytes, TxKind, B256, U256},
    signers::local::PrivateKeySigner,
};

use crate::{
    error::TxError,
    gas::TxGas,
    signer::{sign_legacy, SigningMode},
};

// ============================================================================
// Request
// ============================================================================

/// Per-transaction overrides. Zero means "use the default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOptions {
    /// Gas price in wei (0: manager default)
    pub gas_price: u128,
    /// Sender nonce (0: pending nonce from the chain)
    pub nonce: u64,
    /// Gas limit (0: manager default)
    pub gas_limit: u64,
}

impl TxOptions {
    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }
}

/// Everything needed to build one transaction.
///
/// A missing recipient makes it a contract creation with `data` as init code.
#[derive(Clone, PartialEq, Eq)]
pub struct TxRequest {
    /// Hex encoded private key of the sender
    pub sender_key: String,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub options: TxOptions,
}

impl TxRequest {
    pub fn call(sender_key: impl Into<String>, to: Address, data: Bytes) -> Self {
        Self {
            sender_key: sender_key.into(),
            to: Some(to),
            value: U256::ZERO,
            data,
            options: TxOptions::default(),
        }
    }

    pub fn create(sender_key: impl Into<String>, init_code: Bytes) -> Self {
        Self {
            sender_key: sender_key.into(),
            to: None,
            value: U256::ZERO,
            data: init_code,
            options: TxOptions::default(),
        }
    }

    pub fn transfer(sender_key: impl Into<String>, to: Address, value: U256) -> Self {
        Self {
            sender_key: sender_key.into(),
            to: Some(to),
            value,
            data: Bytes::new(),
            options: TxOptions::default(),
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_options(mut self, options: TxOptions) -> Self {
        self.options = options;
        self
    }

    pub fn is_creation(&self) -> bool {
        self.to.is_none()
    }
}

impl fmt::Debug for TxRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxRequest")
            .field("to", &self.to)
            .field("value", &self.value)
            .field("data_len", &self.data.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Stages
// ============================================================================

/// Lifecycle stage of a transaction, as reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStage {
    Built,
    Signed,
    Submitted,
    /// Waiting for the receipt
    Pending,
    Confirmed,
    TimedOut,
}

impl TxStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStage::Built => "built",
            TxStage::Signed => "signed",
            TxStage::Submitted => "submitted",
            TxStage::Pending => "pending",
            TxStage::Confirmed => "confirmed",
            TxStage::TimedOut => "timed_out",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, TxStage::Confirmed | TxStage::TimedOut)
    }
}

impl fmt::Display for TxStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved legacy transaction awaiting its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTx {
    tx: TxLegacy,
}

impl UnsignedTx {
    pub fn new(to: Option<Address>, value: U256, data: Bytes, nonce: u64, gas: TxGas) -> Self {
        Self {
            tx: TxLegacy {
                chain_id: None,
                nonce,
                gas_price: gas.gas_price,
                gas_limit: gas.gas_limit,
                to: to.map_or(TxKind::Create, TxKind::Call),
                value,
                input: data,
            },
        }
    }

    pub fn inner(&self) -> &TxLegacy {
        &self.tx
    }

    pub fn is_creation(&self) -> bool {
        self.tx.to.is_create()
    }

    pub fn sign(self, signer: &PrivateKeySigner, mode: SigningMode) -> Result<SignedTx, TxError> {
        let envelope = sign_legacy(signer, self.tx, mode)?;
        Ok(SignedTx { envelope })
    }
}

/// A signed transaction ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    envelope: TxEnvelope,
}

impl SignedTx {
    /// Locally computed transaction hash.
    pub fn hash(&self) -> B256 {
        *self.envelope.tx_hash()
    }

    pub fn nonce(&self) -> u64 {
        self.envelope.nonce()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.envelope.chain_id()
    }

    pub fn envelope(&self) -> &TxEnvelope {
        &self.envelope
    }

    /// Raw EIP-2718 encoding for `eth_sendRawTransaction`.
    pub fn encoded(&self) -> Vec<u8> {
        self.envelope.encoded_2718()
    }
}
