//! Snapshot and restore of the persisted schema

mod common;

use common::*;
use router_config::VaultConfig;
use router_types::{AssetId, StrategyId};
use rust_decimal::Decimal;
use std::sync::Arc;
use vault_engine::sim::LedgerTreasury;
use vault_engine::{StateError, VaultEngine, VaultError, SCHEMA_VERSION};

#[test]
fn test_restore_rolls_back_ledgers() {
    let mut h = Harness::new();
    let pair = h.single_pair();
    let (strategy, _) = h.strategy(pair, "aave", 450);
    h.vault.deposit_and_deploy(ALICE, pair, 1_000, 50).unwrap();
    h.vault.set_protocol_fee(OWNER, 300).unwrap();

    let snapshot = h.vault.snapshot().unwrap();
    let before = h.vault.storage().clone();

    h.vault.deposit(BOB, pair, 500).unwrap();
    h.vault.set_protocol_fee(OWNER, 100).unwrap();
    assert_ne!(h.vault.storage(), &before);

    h.vault.restore(&snapshot).unwrap();
    assert_eq!(h.vault.storage(), &before);
    assert_eq!(h.vault.user_shares(pair, BOB), 0);
    assert_eq!(h.vault.protocol_fee_bps(), 300);
    assert_eq!(h.vault.strategy_principal(pair, strategy), 1_000);
    assert_eq!(h.vault.pair_snapshot(pair).unwrap().strategies.len(), 1);
}

#[test]
fn test_restore_requires_registered_strategies() {
    let mut h = Harness::new();
    let pair = h.single_pair();
    h.strategy(pair, "aave", 450);
    let snapshot = h.vault.snapshot().unwrap();

    let mut fresh = VaultEngine::new(
        OWNER,
        &VaultConfig::default(),
        h.clock.clone(),
        Arc::new(LedgerTreasury::new(TREASURY)),
    )
    .unwrap();
    let err = fresh.restore(&snapshot).unwrap_err();
    assert!(matches!(err, VaultError::State(StateError::ValidationFailed { .. })));
    assert_eq!(fresh.next_pair_id().inner(), 0);
}

#[test]
fn test_restore_rejects_other_schema_versions_and_garbage() {
    let mut h = Harness::new();
    h.single_pair();
    let future = bincode::serialize(&(SCHEMA_VERSION + 1, h.vault.storage())).unwrap();
    assert!(matches!(
        h.vault.restore(&future),
        Err(VaultError::State(StateError::SchemaVersion { .. }))
    ));
    assert!(matches!(
        h.vault.restore(&[0xde, 0xad]),
        Err(VaultError::State(_))
    ));
    assert_eq!(h.vault.next_pair_id().inner(), 1);
}

#[test]
fn test_pair_snapshot_serializes() {
    let mut h = Harness::new();
    let pair = h.single_pair();
    let (_, pool) = h.strategy(pair, "aave", 450);
    h.vault.deposit_and_deploy(ALICE, pair, 1_000, 50).unwrap();
    pool.accrue(500);

    let snapshot = h.vault.pair_snapshot(pair).unwrap();
    assert_eq!(snapshot.vault_value, 1_500);
    assert_eq!(snapshot.share_price, Some(Decimal::new(15, 1)));
    assert_eq!(snapshot.strategies[0].name, "aave");
    assert_eq!(snapshot.strategies[0].apy_percent, Decimal::new(450, 2));
    assert_eq!(snapshot.liquidity_receipt, None);

    let json: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
    assert_eq!(json["strategies"][0]["apy"], 450);
    assert_eq!(json["total_shares"], 1_000);
}

#[test]
fn test_liquidity_receipt_is_reported_and_persisted() {
    let mut h = Harness::new();
    let pair = h.single_pair();
    let receipt = AssetId::from_low_u64(0x1b);

    assert!(matches!(
        h.vault.set_liquidity_receipt(ALICE, pair, receipt),
        Err(VaultError::NotOwner(_))
    ));
    h.vault.set_liquidity_receipt(OWNER, pair, receipt).unwrap();
    assert_eq!(h.vault.pair_snapshot(pair).unwrap().liquidity_receipt, Some(receipt));

    let saved = h.vault.snapshot().unwrap();
    let mut restored = Harness::new();
    restored.single_pair();
    restored.vault.restore(&saved).unwrap();
    assert_eq!(
        restored.vault.pair_snapshot(pair).unwrap().liquidity_receipt,
        Some(receipt)
    );
}

#[test]
fn test_snapshot_survives_a_file_round_trip() {
    let mut h = Harness::new();
    let pair = h.single_pair();
    h.strategy(pair, "aave", 450);
    h.vault.deposit_and_deploy(ALICE, pair, 2_500, 50).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.state");
    std::fs::write(&path, h.vault.snapshot().unwrap()).unwrap();

    h.vault.withdraw_from_strategy(KEEPER, pair, StrategyId::new(0), 2_500).unwrap();
    h.vault.withdraw(ALICE, pair, 2_500).unwrap();
    assert_eq!(h.vault.pair(pair).unwrap().total_shares, 0);

    let bytes = std::fs::read(&path).unwrap();
    h.vault.restore(&bytes).unwrap();
    assert_eq!(h.vault.user_shares(pair, ALICE), 2_500);
    assert_eq!(h.vault.strategy_principal(pair, StrategyId::new(0)), 2_500);
}
