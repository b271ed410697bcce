//! Chain client seam.
//!
//! The manager talks to the chain only through [`ChainClient`], a narrow
//! async trait covering the handful of RPC calls it needs. [`RpcClient`]
//! implements it on top of any alloy `Provider`; tests substitute a scripted
//! in-memory chain.

use std::{str::FromStr, time::Duration};

use alloy::{
    eips::BlockId,
    network::{Ethereum, ReceiptResponse},
    primitives::{Address, Bytes, B256, U256},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::{client::BuiltInConnectionString, types::TransactionRequest},
    transports::{TransportErrorKind, TransportResult},
};

use crate::error::{pretty_rpc_error, TxError};

// ============================================================================
// Receipt
// ============================================================================

/// The parts of a transaction receipt the manager reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: B256,
    /// Address of the created contract, for creation transactions
    pub contract_address: Option<Address>,
    pub gas_used: u64,
    pub block_number: Option<u64>,
    /// Execution status (`true` = success)
    pub status: bool,
}

impl Receipt {
    pub fn from_response<R: ReceiptResponse>(receipt: &R) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash(),
            contract_address: receipt.contract_address(),
            gas_used: receipt.gas_used(),
            block_number: receipt.block_number(),
            status: receipt.status(),
        }
    }

    /// Whether the receipt belongs to a transaction included in a block.
    pub fn mined(&self) -> bool {
        self.block_number.is_some()
    }
}

// ============================================================================
// ChainClient
// ============================================================================

/// Chain operations used by the transaction manager.
///
/// Implementations must be safe for concurrent use; the manager shares one
/// client between all in-flight calls.
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> TransportResult<u64>;

    /// Suggested legacy gas price in wei.
    async fn gas_price(&self) -> TransportResult<u128>;

    /// Next nonce for `address`, counting pending transactions.
    async fn pending_nonce(&self, address: Address) -> TransportResult<u64>;

    async fn balance(&self, address: Address, block: BlockId) -> TransportResult<U256>;

    /// `Ok(None)` while the transaction is unknown or not yet mined.
    async fn transaction_receipt(&self, hash: B256) -> TransportResult<Option<Receipt>>;

    /// Submit a signed, EIP-2718 encoded transaction and return the hash the
    /// node reports for it.
    async fn send_raw_transaction(&self, raw: &[u8]) -> TransportResult<B256>;

    /// Execute a read-only call against `block`.
    async fn call(&self, to: Address, data: Bytes, block: BlockId) -> TransportResult<Bytes>;
}

// ============================================================================
// RpcClient
// ============================================================================

/// [`ChainClient`] backed by an alloy provider.
#[derive(Debug, Clone)]
pub struct RpcClient<P = RootProvider<Ethereum>> {
    provider: P,
}

impl RpcClient {
    /// Connect to `url` (http, ws or ipc), giving up after `dial_timeout`.
    pub async fn dial(url: &str, dial_timeout: Duration) -> Result<Self, TxError> {
        BuiltInConnectionString::from_str(url).map_err(|e| TxError::InvalidEndpoint {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let connect = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect(url);

        let provider = match tokio::time::timeout(dial_timeout, connect).await {
            Ok(Ok(provider)) => provider,
            Ok(Err(e)) => return Err(TxError::network("dial", e)),
            Err(_) => {
                return Err(TxError::network(
                    "dial",
                    TransportErrorKind::custom_str(&format!(
                        "connection timed out after {dial_timeout:?}"
                    )),
                ))
            }
        };

        tracing::debug!(url, "connected to rpc endpoint");
        Ok(Self { provider })
    }
}

impl<P: Provider<Ethereum>> RpcClient<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait::async_trait]
impl<P: Provider<Ethereum>> ChainClient for RpcClient<P> {
    async fn chain_id(&self) -> TransportResult<u64> {
        self.provider.get_chain_id().await
    }

    async fn gas_price(&self) -> TransportResult<u128> {
        self.provider.get_gas_price().await
    }

    async fn pending_nonce(&self, address: Address) -> TransportResult<u64> {
        self.provider.get_transaction_count(address).pending().await
    }

    async fn balance(&self, address: Address, block: BlockId) -> TransportResult<U256> {
        self.provider.get_balance(address).block_id(block).await
    }

    async fn transaction_receipt(&self, hash: B256) -> TransportResult<Option<Receipt>> {
        let receipt = self.provider.get_transaction_receipt(hash).await?;
        Ok(receipt.as_ref().map(Receipt::from_response))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> TransportResult<B256> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(pretty_rpc_error)?;
        Ok(*pending.tx_hash())
    }

    async fn call(&self, to: Address, data: Bytes, block: BlockId) -> TransportResult<Bytes> {
        let tx = TransactionRequest::default().to(to).input(data.into());
        self.provider
            .call(tx)
            .block(block)
            .await
            .map_err(pretty_rpc_error)
    }
}
