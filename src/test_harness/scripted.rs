//! Scripted in-memory chain for exercising the manager without a node.
//!
//! `ScriptedChain` answers every [`ChainClient`] call from fixed values and
//! records what it was asked. Receipts appear after a configurable number of
//! lookups, which makes the polling behaviour observable tick by tick.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use alloy::{
    consensus::{transaction::SignerRecoverable, Transaction, TxEnvelope},
    eips::{eip2718::Decodable2718, BlockId},
    primitives::{Address, Bytes, B256, U256},
    transports::{TransportErrorKind, TransportResult},
};

use crate::chain::{ChainClient, Receipt};

/// Gas reported in every scripted receipt
pub const SCRIPTED_GAS_USED: u64 = 21_000;

#[derive(Debug)]
pub struct ScriptedChain {
    chain_id: u64,
    gas_price: u128,
    pending_nonce: u64,
    balance: U256,
    call_output: Bytes,
    /// Lookups answered with "not found" before the receipt shows up
    receipt_after: Option<usize>,
    /// Error returned by `transaction_receipt` instead of a result
    receipt_error: Option<String>,
    send_error: Option<String>,
    chain_id_error: Option<String>,
    gas_price_error: Option<String>,

    sent: Mutex<Vec<TxEnvelope>>,
    calls: Mutex<Vec<(Address, Bytes, BlockId)>>,
    receipt_lookups: AtomicUsize,
    nonce_queries: AtomicUsize,
    gas_price_queries: AtomicUsize,
    chain_id_queries: AtomicUsize,
}

impl Default for ScriptedChain {
    fn default() -> Self {
        Self {
            chain_id: 31337,
            gas_price: 1_000_000_000,
            pending_nonce: 0,
            balance: U256::ZERO,
            call_output: Bytes::new(),
            receipt_after: Some(0),
            receipt_error: None,
            send_error: None,
            chain_id_error: None,
            gas_price_error: None,
            sent: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            receipt_lookups: AtomicUsize::new(0),
            nonce_queries: AtomicUsize::new(0),
            gas_price_queries: AtomicUsize::new(0),
            chain_id_queries: AtomicUsize::new(0),
        }
    }
}

impl ScriptedChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn with_pending_nonce(mut self, nonce: u64) -> Self {
        self.pending_nonce = nonce;
        self
    }

    pub fn with_balance(mut self, balance: U256) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_call_output(mut self, output: impl Into<Bytes>) -> Self {
        self.call_output = output.into();
        self
    }

    /// Report "not found" for the first `misses` receipt lookups.
    pub fn receipt_after(mut self, misses: usize) -> Self {
        self.receipt_after = Some(misses);
        self
    }

    /// Never produce a receipt.
    pub fn never_mined(mut self) -> Self {
        self.receipt_after = None;
        self
    }

    pub fn failing_receipts(mut self, message: &str) -> Self {
        self.receipt_error = Some(message.to_string());
        self
    }

    pub fn failing_sends(mut self, message: &str) -> Self {
        self.send_error = Some(message.to_string());
        self
    }

    pub fn failing_chain_id(mut self, message: &str) -> Self {
        self.chain_id_error = Some(message.to_string());
        self
    }

    pub fn failing_gas_price(mut self, message: &str) -> Self {
        self.gas_price_error = Some(message.to_string());
        self
    }

    /// Transactions accepted so far, in submission order.
    pub fn sent(&self) -> Vec<TxEnvelope> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_sent(&self) -> TxEnvelope {
        self.sent().pop().expect("no transaction was sent")
    }

    pub fn calls(&self) -> Vec<(Address, Bytes, BlockId)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn receipt_lookups(&self) -> usize {
        self.receipt_lookups.load(Ordering::SeqCst)
    }

    pub fn nonce_queries(&self) -> usize {
        self.nonce_queries.load(Ordering::SeqCst)
    }

    pub fn gas_price_queries(&self) -> usize {
        self.gas_price_queries.load(Ordering::SeqCst)
    }

    pub fn chain_id_queries(&self) -> usize {
        self.chain_id_queries.load(Ordering::SeqCst)
    }

    fn receipt_for(&self, hash: B256) -> Option<Receipt> {
        let sent = self.sent.lock().unwrap();
        let tx = sent.iter().find(|tx| *tx.tx_hash() == hash)?;

        let contract_address = if tx.kind().is_create() {
            let sender = tx.recover_signer().ok()?;
            Some(sender.create(tx.nonce()))
        } else {
            None
        };

        Some(Receipt {
            transaction_hash: hash,
            contract_address,
            gas_used: SCRIPTED_GAS_USED,
            block_number: Some(1),
            status: true,
        })
    }
}

fn scripted_error<T>(message: &Option<String>) -> Option<TransportResult<T>> {
    message
        .as_deref()
        .map(|m| Err(TransportErrorKind::custom_str(m)))
}

#[async_trait::async_trait]
impl ChainClient for ScriptedChain {
    async fn chain_id(&self) -> TransportResult<u64> {
        self.chain_id_queries.fetch_add(1, Ordering::SeqCst);
        scripted_error(&self.chain_id_error).unwrap_or(Ok(self.chain_id))
    }

    async fn gas_price(&self) -> TransportResult<u128> {
        self.gas_price_queries.fetch_add(1, Ordering::SeqCst);
        scripted_error(&self.gas_price_error).unwrap_or(Ok(self.gas_price))
    }

    async fn pending_nonce(&self, _address: Address) -> TransportResult<u64> {
        self.nonce_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.pending_nonce)
    }

    async fn balance(&self, _address: Address, _block: BlockId) -> TransportResult<U256> {
        Ok(self.balance)
    }

    async fn transaction_receipt(&self, hash: B256) -> TransportResult<Option<Receipt>> {
        let lookup = self.receipt_lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = scripted_error(&self.receipt_error) {
            return err;
        }
        match self.receipt_after {
            Some(misses) if lookup >= misses => Ok(self.receipt_for(hash)),
            _ => Ok(None),
        }
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> TransportResult<B256> {
        if let Some(err) = scripted_error(&self.send_error) {
            return err;
        }
        let tx = TxEnvelope::decode_2718(&mut &raw[..])
            .map_err(|e| TransportErrorKind::custom_str(&e.to_string()))?;
        let hash = *tx.tx_hash();
        self.sent.lock().unwrap().push(tx);
        Ok(hash)
    }

    async fn call(&self, to: Address, data: Bytes, block: BlockId) -> TransportResult<Bytes> {
        self.calls.lock().unwrap().push((to, data, block));
        Ok(self.call_output.clone())
    }
}
