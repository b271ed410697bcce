//! Test harnesses for the transaction manager.
//!
//! - [`ScriptedChain`]: in-memory [`ChainClient`](crate::chain::ChainClient)
//!   with scripted answers, used by the unit tests.
//! - [`AnvilTestHarness`]: spawns a local Anvil node for end-to-end tests.
//!   Those tests are ignored by default and need `anvil` on `PATH`:
//!
//! ```text
//! cargo test -- --ignored
//! ```

mod scripted;
#[cfg(test)]
mod tests;

pub use scripted::*;

use std::time::Duration;

use alloy::{
    hex,
    node_bindings::{Anvil, AnvilInstance},
    primitives::{Address, B256, U256},
    providers::{ext::AnvilApi, Provider, ProviderBuilder, RootProvider},
    signers::local::PrivateKeySigner,
};
use anyhow::Result;

use crate::{config::ManagerConfig, manager::TransactionManager};

/// Creation code of a contract whose runtime returns `uint256(42)` for any call.
pub const ANSWER_INIT_CODE: &str = "0x600a600c600039600a6000f3602a60005260206000f3";

/// Snapshot id returned by Anvil
#[derive(Debug, Clone, Copy)]
pub struct SnapshotId(pub U256);

/// A local Anvil node with its pre-funded accounts.
pub struct AnvilTestHarness {
    instance: AnvilInstance,
    provider: RootProvider,
    keys: Vec<PrivateKeySigner>,
    chain_id: u64,
}

impl AnvilTestHarness {
    pub async fn new() -> Result<Self> {
        Self::with_config(|anvil| anvil).await
    }

    /// Spawn Anvil with a customised command line.
    pub async fn with_config<F>(config: F) -> Result<Self>
    where
        F: FnOnce(Anvil) -> Anvil,
    {
        let instance = config(Anvil::new()).try_spawn()?;
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(instance.endpoint_url());

        let keys = instance.keys().iter().map(|k| k.clone().into()).collect();
        let chain_id = provider.get_chain_id().await?;

        Ok(Self {
            instance,
            provider,
            keys,
            chain_id,
        })
    }

    /// Spawn Anvil without auto-mining; blocks are produced by [`Self::mine_block`].
    pub async fn with_manual_mining() -> Result<Self> {
        Self::with_config(|anvil| anvil.arg("--no-mining")).await
    }

    pub fn endpoint(&self) -> String {
        self.instance.endpoint()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn address(&self, index: usize) -> Address {
        self.keys[index].address()
    }

    /// Hex encoded private key of a pre-funded account.
    pub fn key(&self, index: usize) -> String {
        hex::encode_prefixed(self.keys[index].to_bytes())
    }

    pub fn alice(&self) -> Address {
        self.address(0)
    }

    pub fn bob(&self) -> Address {
        self.address(1)
    }

    /// Manager configuration pointing at this node with fast polling.
    pub fn config(&self) -> ManagerConfig {
        ManagerConfig::new(self.endpoint())
            .with_poll_interval(Duration::from_millis(100))
            .with_timeout(Duration::from_secs(10))
    }

    pub async fn manager(&self) -> Result<TransactionManager> {
        Ok(TransactionManager::connect(self.config()).await?)
    }

    pub async fn snapshot(&self) -> Result<SnapshotId> {
        Ok(SnapshotId(self.provider.anvil_snapshot().await?))
    }

    pub async fn revert(&self, snapshot: SnapshotId) -> Result<bool> {
        Ok(self.provider.anvil_revert(snapshot.0).await?)
    }

    pub async fn set_nonce(&self, address: Address, nonce: u64) -> Result<()> {
        self.provider.anvil_set_nonce(address, nonce).await?;
        Ok(())
    }

    pub async fn get_balance(&self, address: Address) -> Result<U256> {
        Ok(self.provider.get_balance(address).await?)
    }

    pub async fn mine_block(&self) -> Result<()> {
        self.provider.anvil_mine(Some(1), None).await?;
        Ok(())
    }

    pub async fn drop_transaction(&self, tx_hash: B256) -> Result<Option<B256>> {
        Ok(self.provider.anvil_drop_transaction(tx_hash).await?)
    }
}
