use super::*;
use crate::{
    abi::{tests::TOKEN_ABI, CallDescriptor},
    account::generate_account,
    error::{RpcErrorKind, TxError},
    gas::TRANSFER_GAS,
    notation::ArgValue,
    tx::{TxOptions, TxRequest},
};
use alloy::primitives::Bytes;

fn answer_init_code() -> Bytes {
    hex::decode(ANSWER_INIT_CODE).unwrap().into()
}

#[tokio::test]
#[ignore = "requires anvil on PATH"]
async fn test_manager_discovers_chain_settings() {
    let harness = AnvilTestHarness::new().await.unwrap();
    let manager = harness.manager().await.unwrap();

    assert_eq!(manager.chain_id(), harness.chain_id());
    assert!(manager.gas_price() > 0);
    assert!(manager.replay_protection());
}

#[test_log::test(tokio::test)]
#[ignore = "requires anvil on PATH"]
async fn test_transfer_eth_sync() {
    let harness = AnvilTestHarness::new().await.unwrap();
    let manager = harness.manager().await.unwrap();
    let bob = harness.bob();
    let before = harness.get_balance(bob).await.unwrap();

    let value = U256::from(1_000_000_000_000_000u64);
    let receipt = manager
        .transfer_eth_sync(&harness.key(0), bob, value, TxOptions::default())
        .await
        .unwrap();

    assert!(receipt.status);
    assert_eq!(receipt.gas_used, TRANSFER_GAS);
    assert_eq!(harness.get_balance(bob).await.unwrap(), before + value);
    assert_eq!(
        manager.get_balance(bob, None).await.unwrap(),
        before + value
    );
}

#[tokio::test]
#[ignore = "requires anvil on PATH"]
async fn test_deploy_write_and_read() {
    let harness = AnvilTestHarness::new().await.unwrap();
    let manager = harness.manager().await.unwrap();
    let key = harness.key(0);

    let receipt = manager
        .create_contract_sync(&key, answer_init_code(), TxOptions::default())
        .await
        .unwrap();
    let contract = receipt.contract_address.unwrap();
    assert_eq!(
        manager
            .get_contract_address(receipt.transaction_hash)
            .await
            .unwrap(),
        Some(contract)
    );

    let decoded = manager
        .read_contract_decoded(contract, TOKEN_ABI, "totalSupply", "", None)
        .await
        .unwrap();
    assert_eq!(decoded[0].value, ArgValue::Uint(U256::from(42)));

    let call = CallDescriptor::parse(
        "transfer",
        &format!("address:{};uint256:3", harness.bob()),
    )
    .unwrap();
    let receipt = manager
        .write_contract_sync(&key, contract, TOKEN_ABI, &call, U256::ZERO, TxOptions::default())
        .await
        .unwrap();
    assert!(receipt.status);
    assert_eq!(
        manager
            .get_transaction_gas_used(receipt.transaction_hash)
            .await
            .unwrap(),
        Some(receipt.gas_used)
    );
}

#[tokio::test]
#[ignore = "requires anvil on PATH"]
async fn test_unmined_transaction_times_out() {
    let harness = AnvilTestHarness::with_manual_mining().await.unwrap();
    let manager = TransactionManager::connect(
        harness
            .config()
            .with_timeout(Duration::from_secs(1))
            .with_poll_interval(Duration::from_millis(200)),
    )
    .await
    .unwrap();

    let err = manager
        .submit_and_wait(TxRequest::transfer(
            harness.key(0),
            harness.bob(),
            U256::from(1),
        ))
        .await
        .unwrap_err();
    let (hash, waited) = match err {
        TxError::Timeout { hash, waited } => (hash, waited),
        other => panic!("expected timeout, got {other:?}"),
    };
    assert!(waited >= Duration::from_secs(1));

    // still pending, so mining it afterwards confirms it
    assert_eq!(manager.get_transaction_gas_used(hash).await.unwrap(), None);
    harness.mine_block().await.unwrap();
    let receipt = manager.wait_for_receipt(hash).await.unwrap();
    assert!(receipt.status);
}

#[tokio::test]
#[ignore = "requires anvil on PATH"]
async fn test_stale_nonce_is_classified() {
    let harness = AnvilTestHarness::new().await.unwrap();
    let manager = harness.manager().await.unwrap();
    harness.set_nonce(harness.alice(), 5).await.unwrap();

    let err = manager
        .transfer_eth(
            &harness.key(0),
            harness.bob(),
            U256::from(1),
            TxOptions::default().with_nonce(2),
        )
        .await
        .unwrap_err();

    assert_eq!(err.rpc_kind(), Some(RpcErrorKind::NonceTooLow));
    assert!(err.rpc_kind().unwrap().needs_fresh_nonce());
}

#[tokio::test]
#[ignore = "requires anvil on PATH"]
async fn test_unfunded_sender_is_classified() {
    let harness = AnvilTestHarness::new().await.unwrap();
    let manager = harness.manager().await.unwrap();
    let empty = generate_account();

    let err = manager
        .transfer_eth(
            &empty.private_key().to_string(),
            harness.bob(),
            U256::from(1),
            TxOptions::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.rpc_kind(), Some(RpcErrorKind::InsufficientFunds));
    assert!(!err.rpc_kind().unwrap().is_retryable());
}

#[tokio::test]
#[ignore = "requires anvil on PATH"]
async fn test_snapshot_restores_balances() {
    let harness = AnvilTestHarness::new().await.unwrap();
    let manager = harness.manager().await.unwrap();
    let bob = harness.bob();
    let before = harness.get_balance(bob).await.unwrap();

    let snapshot = harness.snapshot().await.unwrap();
    manager
        .transfer_eth_with_data_sync(
            &harness.key(0),
            bob,
            U256::from(7),
            Bytes::from_static(b"memo"),
            TxOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(harness.get_balance(bob).await.unwrap(), before + U256::from(7));

    assert!(harness.revert(snapshot).await.unwrap());
    assert_eq!(harness.get_balance(bob).await.unwrap(), before);
}

#[tokio::test]
#[ignore = "requires anvil on PATH"]
async fn test_dropped_transaction_is_reported_as_timeout() {
    let harness = AnvilTestHarness::with_manual_mining().await.unwrap();
    let manager = TransactionManager::connect(
        harness.config().with_timeout(Duration::from_secs(1)),
    )
    .await
    .unwrap();

    let hash = manager
        .transfer_eth(&harness.key(0), harness.bob(), U256::from(1), TxOptions::default())
        .await
        .unwrap();
    assert_eq!(harness.drop_transaction(hash).await.unwrap(), Some(hash));
    harness.mine_block().await.unwrap();

    let err = manager.wait_for_receipt(hash).await.unwrap_err();
    assert!(err.is_timeout());
}
