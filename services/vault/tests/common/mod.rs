//! Common test utilities for the vault engine
//!
//! A [`Harness`] wires an engine to simulated strategies, a manual clock, a
//! booking treasury and a recording sink.

#![allow(dead_code)]

use router_config::VaultConfig;
use router_types::{Address, AssetId, Bps, ManualClock, PairId, StrategyId};
use std::sync::Arc;
use vault_engine::sim::{LedgerTreasury, SimulatedStrategy, SimulatedVenue};
use vault_engine::{RecordingSink, VaultEngine};

pub const OWNER: Address = Address::new([0x01; 20]);
pub const KEEPER: Address = Address::new([0x0b; 20]);
pub const ALICE: Address = Address::new([0xa1; 20]);
pub const BOB: Address = Address::new([0xb0; 20]);
pub const TREASURY: Address = Address::new([0x7e; 20]);

pub const START: u64 = 1_700_000_000;

/// Route engine logs through the test writer; `RUST_LOG` selects the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Harness {
    pub vault: VaultEngine,
    pub clock: Arc<ManualClock>,
    pub treasury: Arc<LedgerTreasury>,
    pub events: Arc<RecordingSink>,
    pub usdc: AssetId,
    pub weth: AssetId,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(VaultConfig::default())
    }

    pub fn with_config(config: VaultConfig) -> Self {
        init_tracing();
        let clock = Arc::new(ManualClock::new(START));
        let treasury = Arc::new(LedgerTreasury::new(TREASURY));
        let events = Arc::new(RecordingSink::new());
        let mut vault = VaultEngine::new(OWNER, &config, clock.clone(), treasury.clone())
            .expect("valid config")
            .with_sink(events.clone());
        vault.set_keeper(OWNER, KEEPER, true).expect("owner grants keeper");

        Self {
            vault,
            clock,
            treasury,
            events,
            usdc: AssetId::from_low_u64(0x05dc),
            weth: AssetId::from_low_u64(0xeeee),
        }
    }

    /// USDC/USDC pair
    pub fn single_pair(&mut self) -> PairId {
        self.vault.add_pair(OWNER, self.usdc, self.usdc).expect("owner adds pair")
    }

    /// WETH/USDC pair with a par venue charging `fee_bps`
    pub fn two_asset_pair(&mut self, fee_bps: Bps) -> (PairId, Arc<SimulatedVenue>) {
        let venue = Arc::new(SimulatedVenue::par(fee_bps, self.clock.clone()));
        self.vault.set_router(OWNER, venue.clone()).expect("owner sets router");
        let pair = self.vault.add_pair(OWNER, self.weth, self.usdc).expect("owner adds pair");
        (pair, venue)
    }

    pub fn strategy(&mut self, pair: PairId, name: &str, apy: Bps) -> (StrategyId, Arc<SimulatedStrategy>) {
        let adapter = Arc::new(SimulatedStrategy::new(name, apy));
        let id = self
            .vault
            .add_strategy(OWNER, pair, adapter.clone())
            .expect("owner adds strategy");
        (id, adapter)
    }

    /// Fee paid to the treasury in USDC so far
    pub fn treasury_usdc(&self) -> u128 {
        use vault_engine::Treasury;
        self.treasury.balance(self.usdc)
    }
}
