//! Transaction lifecycle manager.
//!
//! `TransactionManager` turns a signing key, an optional recipient and a
//! payload into a submitted legacy transaction, and optionally waits until it
//! is mined.
//!
//! ## Lifecycle
//!
//! ```text
//! Built ──► Signed ──► Submitted ──► Pending ──┬──► Confirmed
//!                                              └──► TimedOut
//! ```
//!
//! - Nonce, gas price and gas limit left at zero in [`TxOptions`] are replaced
//!   by the pending nonce from the chain and the manager defaults.
//! - Transactions are signed with EIP-155 replay protection keyed on the
//!   manager chain id unless it was disabled with
//!   [`disable_eip155`](TransactionManager::disable_eip155).
//! - Submission failures are returned as they are. Nothing is ever retried or
//!   resubmitted; [`TxError::rpc_kind`] tells the caller whether a retry with a
//!   fresh nonce or a higher gas price is worth it.
//! - Waiting polls for the receipt every `poll_interval` until `timeout`
//!   elapses (see [`poll_until`]).
//!
//! ## Concurrency
//!
//! All operations take `&self`; the manager can be shared behind an `Arc` and
//! used by concurrent callers. The two mutators take `&mut self` and are
//! meant for the setup window before the manager is shared.
//!
//! ```ignore
//! let mut manager = TransactionManager::connect(ManagerConfig::new(url)).await?;
//! manager.disable_eip155();
//!
//! let call = CallDescriptor::parse("transfer", "address:0x...;uint256:3")?;
//! let receipt = manager
//!     .write_contract_sync(key, token, abi, &call, U256::ZERO, TxOptions::default())
//!     .await?;
//! ```

use std::time::Duration;

use alloy::{
    eips::BlockId,
    primitives::{Address, Bytes, B256, U256},
};

use crate::{
    abi::{encode_notation, CallDescriptor, Interface},
    chain::{ChainClient, Receipt, RpcClient},
    config::ManagerConfig,
    error::{is_receipt_not_found, TxError},
    gas::{transfer_gas_with_data, TxGas, TRANSFER_GAS},
    notation::ReturnValue,
    poll::{poll_until, PollError, PollPolicy},
    signer::{parse_private_key, SigningMode},
    tx::{SignedTx, TxOptions, TxRequest, TxStage, UnsignedTx},
};

/// Submits transactions and waits for their receipts.
#[derive(Debug)]
pub struct TransactionManager<C = RpcClient> {
    client: C,
    rpc_url: String,
    gas_price: u128,
    gas_limit: u64,
    policy: PollPolicy,
    chain_id: u64,
    replay_protection: bool,
}

impl TransactionManager {
    /// Dial `config.rpc_url` and build a manager on top of it.
    ///
    /// Fails when the endpoint cannot be reached, or when the gas price or
    /// chain id has to be discovered and the node does not answer.
    pub async fn connect(config: ManagerConfig) -> Result<Self, TxError> {
        let config = config.normalized();
        let client = RpcClient::dial(&config.rpc_url, config.dial_timeout).await?;
        Self::with_client(client, config).await
    }
}

impl<C: ChainClient> TransactionManager<C> {
    /// Build a manager on an existing chain client.
    pub async fn with_client(client: C, config: ManagerConfig) -> Result<Self, TxError> {
        let config = config.normalized();

        let gas_price = match config.gas_price {
            0 => client
                .gas_price()
                .await
                .map_err(|e| TxError::network("eth_gasPrice", e))?,
            price => price,
        };

        let chain_id = match config.chain_id {
            Some(id) => id,
            None => client
                .chain_id()
                .await
                .map_err(|e| TxError::network("eth_chainId", e))?,
        };

        tracing::info!(
            rpc_url = %config.rpc_url,
            chain_id,
            gas_price,
            gas_limit = config.gas_limit,
            timeout = ?config.timeout,
            poll_interval = ?config.poll_interval,
            replay_protection = config.replay_protection,
            "transaction manager ready"
        );

        let policy = config.poll_policy();
        Ok(Self {
            client,
            rpc_url: config.rpc_url,
            gas_price,
            gas_limit: config.gas_limit,
            policy,
            chain_id,
            replay_protection: config.replay_protection,
        })
    }

    // ------------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------------

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Default gas price in wei
    pub fn gas_price(&self) -> u128 {
        self.gas_price
    }

    /// Default gas limit for calls and creations
    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn timeout(&self) -> Duration {
        self.policy.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.policy.interval
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn replay_protection(&self) -> bool {
        self.replay_protection
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Override the chain id used for EIP-155 signatures.
    pub fn set_chain_id(&mut self, chain_id: u64) {
        tracing::debug!(old = self.chain_id, new = chain_id, "chain id changed");
        self.chain_id = chain_id;
    }

    /// Sign subsequent transactions without replay protection.
    pub fn disable_eip155(&mut self) {
        tracing::debug!(chain_id = self.chain_id, "eip-155 signing disabled");
        self.replay_protection = false;
    }

    /// Release the connection.
    pub fn close(self) {
        tracing::debug!(rpc_url = %self.rpc_url, "transaction manager closed");
    }

    fn signing_mode(&self) -> SigningMode {
        SigningMode::new(self.chain_id, self.replay_protection)
    }

    // ------------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------------

    /// Sign and submit `request`, returning the hash reported by the node.
    pub async fn submit(&self, request: TxRequest) -> Result<B256, TxError> {
        self.submit_with_default_limit(request, self.gas_limit).await
    }

    /// Submit `request` and wait for its receipt.
    pub async fn submit_and_wait(&self, request: TxRequest) -> Result<Receipt, TxError> {
        let hash = self.submit(request).await?;
        self.wait_for_receipt(hash).await
    }

    async fn submit_with_default_limit(
        &self,
        request: TxRequest,
        default_gas_limit: u64,
    ) -> Result<B256, TxError> {
        let signed = self.sign(request, default_gas_limit).await?;
        self.send(&signed).await
    }

    async fn sign(&self, request: TxRequest, default_gas_limit: u64) -> Result<SignedTx, TxError> {
        let signer = parse_private_key(&request.sender_key)?;
        let from = signer.address();

        let nonce = match request.options.nonce {
            0 => self
                .client
                .pending_nonce(from)
                .await
                .map_err(|e| TxError::network("eth_getTransactionCount", e))?,
            nonce => nonce,
        };

        let gas = TxGas::resolve(
            request.options.gas_price,
            request.options.gas_limit,
            TxGas {
                gas_price: self.gas_price,
                gas_limit: default_gas_limit,
            },
        );

        let unsigned = UnsignedTx::new(request.to, request.value, request.data, nonce, gas);
        tracing::debug!(
            %from,
            to = ?request.to,
            nonce,
            gas_price = gas.gas_price,
            gas_limit = gas.gas_limit,
            stage = %TxStage::Built,
            "transaction built"
        );

        let mode = self.signing_mode();
        let signed = unsigned.sign(&signer, mode)?;
        tracing::debug!(
            %from,
            nonce,
            tx_hash = %signed.hash(),
            chain_id = ?mode.chain_id(),
            stage = %TxStage::Signed,
            "transaction signed"
        );

        Ok(signed)
    }

    async fn send(&self, signed: &SignedTx) -> Result<B256, TxError> {
        let hash = match self.client.send_raw_transaction(&signed.encoded()).await {
            Ok(hash) => hash,
            Err(e) => {
                let err = TxError::network("eth_sendRawTransaction", e);
                tracing::warn!(
                    nonce = signed.nonce(),
                    tx_hash = %signed.hash(),
                    error = %err,
                    kind = ?err.rpc_kind(),
                    "transaction rejected"
                );
                return Err(err);
            }
        };

        if hash != signed.hash() {
            tracing::warn!(local = %signed.hash(), node = %hash, "node reported a different hash");
        }
        tracing::debug!(tx_hash = %hash, stage = %TxStage::Submitted, "transaction submitted");
        Ok(hash)
    }

    // ------------------------------------------------------------------------
    // Waiting
    // ------------------------------------------------------------------------

    /// Poll for the receipt of `hash` until it is mined or the timeout elapses.
    ///
    /// A receipt that has not shown up yet is retried silently; any other
    /// lookup failure ends the wait. A timeout does not mean the transaction
    /// failed, it may still be mined later.
    pub async fn wait_for_receipt(&self, hash: B256) -> Result<Receipt, TxError> {
        tracing::debug!(tx_hash = %hash, stage = %TxStage::Pending, "waiting for receipt");

        let client = &self.client;
        let result = poll_until(
            self.policy,
            || async move {
                // receipts of pending blocks do not count as mined
                client
                    .transaction_receipt(hash)
                    .await
                    .map(|receipt| receipt.filter(Receipt::mined))
            },
            is_receipt_not_found,
        )
        .await;

        match result {
            Ok(receipt) => {
                tracing::info!(
                    tx_hash = %hash,
                    block = ?receipt.block_number,
                    gas_used = receipt.gas_used,
                    status = receipt.status,
                    stage = %TxStage::Confirmed,
                    "transaction confirmed"
                );
                Ok(receipt)
            }
            Err(PollError::TimedOut { waited, attempts }) => {
                tracing::warn!(
                    tx_hash = %hash,
                    ?waited,
                    attempts,
                    stage = %TxStage::TimedOut,
                    "transaction not mined before deadline"
                );
                Err(TxError::Timeout { hash, waited })
            }
            Err(PollError::Failed(e)) => {
                let err = TxError::network("eth_getTransactionReceipt", e);
                tracing::warn!(tx_hash = %hash, error = %err, "receipt lookup failed");
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Contracts
    // ------------------------------------------------------------------------

    /// Submit a contract creation with `init_code` (bytecode plus encoded
    /// constructor arguments, see [`Interface::deploy_data`]).
    pub async fn create_contract(
        &self,
        sender_key: &str,
        init_code: Bytes,
        options: TxOptions,
    ) -> Result<B256, TxError> {
        self.submit(TxRequest::create(sender_key, init_code).with_options(options))
            .await
    }

    /// Like [`create_contract`](Self::create_contract), then wait. The
    /// receipt carries the new contract address.
    pub async fn create_contract_sync(
        &self,
        sender_key: &str,
        init_code: Bytes,
        options: TxOptions,
    ) -> Result<Receipt, TxError> {
        let hash = self.create_contract(sender_key, init_code, options).await?;
        self.wait_for_receipt(hash).await
    }

    /// Encode `call` against `abi` and submit it to `contract`.
    pub async fn write_contract(
        &self,
        sender_key: &str,
        contract: Address,
        abi: &str,
        call: &CallDescriptor,
        value: U256,
        options: TxOptions,
    ) -> Result<B256, TxError> {
        let data = Interface::parse(abi)?.encode_call(call)?;
        tracing::debug!(%contract, function = %call.function, "writing contract");
        self.submit(
            TxRequest::call(sender_key, contract, data)
                .with_value(value)
                .with_options(options),
        )
        .await
    }

    pub async fn write_contract_sync(
        &self,
        sender_key: &str,
        contract: Address,
        abi: &str,
        call: &CallDescriptor,
        value: U256,
        options: TxOptions,
    ) -> Result<Receipt, TxError> {
        let hash = self
            .write_contract(sender_key, contract, abi, call, value, options)
            .await?;
        self.wait_for_receipt(hash).await
    }

    /// Simulate a call to `function` with arguments in notation form and
    /// return the raw output. `block` defaults to the latest block.
    pub async fn read_contract(
        &self,
        contract: Address,
        abi: &str,
        function: &str,
        args: &str,
        block: Option<BlockId>,
    ) -> Result<Bytes, TxError> {
        let data = encode_notation(abi, function, args)?;
        self.call(contract, data, block).await
    }

    /// [`read_contract`](Self::read_contract) followed by decoding the output
    /// against the declared return types.
    pub async fn read_contract_decoded(
        &self,
        contract: Address,
        abi: &str,
        function: &str,
        args: &str,
        block: Option<BlockId>,
    ) -> Result<Vec<ReturnValue>, TxError> {
        let iface = Interface::parse(abi)?;
        let call = CallDescriptor::parse(function, args)?;
        let output = self.call(contract, iface.encode_call(&call)?, block).await?;
        Ok(iface.decode_labeled(function, &output)?)
    }

    async fn call(
        &self,
        contract: Address,
        data: Bytes,
        block: Option<BlockId>,
    ) -> Result<Bytes, TxError> {
        let block = block.unwrap_or_else(BlockId::latest);
        self.client
            .call(contract, data, block)
            .await
            .map_err(|e| TxError::network("eth_call", e))
    }

    // ------------------------------------------------------------------------
    // Transfers
    // ------------------------------------------------------------------------

    /// Send `value` wei to `to`. The gas limit defaults to a plain transfer's
    /// 21 000.
    pub async fn transfer_eth(
        &self,
        sender_key: &str,
        to: Address,
        value: U256,
        options: TxOptions,
    ) -> Result<B256, TxError> {
        self.submit_with_default_limit(
            TxRequest::transfer(sender_key, to, value).with_options(options),
            TRANSFER_GAS,
        )
        .await
    }

    pub async fn transfer_eth_sync(
        &self,
        sender_key: &str,
        to: Address,
        value: U256,
        options: TxOptions,
    ) -> Result<Receipt, TxError> {
        let hash = self.transfer_eth(sender_key, to, value, options).await?;
        self.wait_for_receipt(hash).await
    }

    /// Send `value` wei to `to` with an arbitrary payload. The default gas
    /// limit covers the transfer plus the payload's calldata cost.
    pub async fn transfer_eth_with_data(
        &self,
        sender_key: &str,
        to: Address,
        value: U256,
        data: Bytes,
        options: TxOptions,
    ) -> Result<B256, TxError> {
        let default_limit = transfer_gas_with_data(&data);
        let request = TxRequest::call(sender_key, to, data)
            .with_value(value)
            .with_options(options);
        self.submit_with_default_limit(request, default_limit).await
    }

    pub async fn transfer_eth_with_data_sync(
        &self,
        sender_key: &str,
        to: Address,
        value: U256,
        data: Bytes,
        options: TxOptions,
    ) -> Result<Receipt, TxError> {
        let hash = self
            .transfer_eth_with_data(sender_key, to, value, data, options)
            .await?;
        self.wait_for_receipt(hash).await
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Balance of `address` in wei at `block` (latest by default).
    pub async fn get_balance(
        &self,
        address: Address,
        block: Option<BlockId>,
    ) -> Result<U256, TxError> {
        self.client
            .balance(address, block.unwrap_or_else(BlockId::latest))
            .await
            .map_err(|e| TxError::network("eth_getBalance", e))
    }

    /// Receipt of `hash` if it is already available, without waiting.
    pub async fn get_receipt(&self, hash: B256) -> Result<Option<Receipt>, TxError> {
        self.client
            .transaction_receipt(hash)
            .await
            .map_err(|e| TxError::network("eth_getTransactionReceipt", e))
    }

    /// Address created by transaction `hash`, without waiting. `None` while
    /// the receipt is unavailable or when the transaction created nothing.
    pub async fn get_contract_address(&self, hash: B256) -> Result<Option<Address>, TxError> {
        Ok(self
            .get_receipt(hash)
            .await?
            .and_then(|r| r.contract_address))
    }

    /// Wait for transaction `hash` and return the address it created.
    pub async fn get_contract_address_sync(&self, hash: B256) -> Result<Option<Address>, TxError> {
        Ok(self.wait_for_receipt(hash).await?.contract_address)
    }

    /// Gas used by transaction `hash`, if it has been mined.
    pub async fn get_transaction_gas_used(&self, hash: B256) -> Result<Option<u64>, TxError> {
        Ok(self.get_receipt(hash).await?.map(|r| r.gas_used))
    }
}
