//! Key parsing and legacy transaction signing.

use std::str::FromStr;

use alloy::{
    consensus::{SignableTransaction, TxEnvelope, TxLegacy},
    network::TxSignerSync,
    signers::local::PrivateKeySigner,
};

use crate::error::TxError;

/// Parse a hex encoded secp256k1 private key, with or without `0x`.
pub fn parse_private_key(key: &str) -> Result<PrivateKeySigner, TxError> {
    PrivateKeySigner::from_str(key.trim()).map_err(TxError::Key)
}

/// Which signature scheme a legacy transaction is signed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningMode {
    /// Replay protected: the chain id is folded into the signature.
    Eip155 { chain_id: u64 },
    /// Pre-EIP-155 signature, valid on any chain.
    Unprotected,
}

impl SigningMode {
    pub fn new(chain_id: u64, replay_protection: bool) -> Self {
        if replay_protection {
            SigningMode::Eip155 { chain_id }
        } else {
            SigningMode::Unprotected
        }
    }

    pub fn chain_id(&self) -> Option<u64> {
        match self {
            SigningMode::Eip155 { chain_id } => Some(*chain_id),
            SigningMode::Unprotected => None,
        }
    }
}

/// Sign `tx` under `mode`. The transaction's own chain id is overwritten.
pub fn sign_legacy(
    signer: &PrivateKeySigner,
    mut tx: TxLegacy,
    mode: SigningMode,
) -> Result<TxEnvelope, TxError> {
    tx.chain_id = mode.chain_id();
    let signature = signer
        .sign_transaction_sync(&mut tx)
        .map_err(TxError::Signing)?;
    Ok(TxEnvelope::Legacy(tx.into_signed(signature)))
}
