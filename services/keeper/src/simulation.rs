//! Simulated vault the keeper drives
//!
//! Three strategies whose APYs drift on a fixed schedule so leadership
//! changes every few ticks, one single-asset pair deployed into them and a
//! two-asset pair funded through the par venue. Each tick advances simulated
//! time, accrues yield and then runs the same upkeep cycle a production
//! scheduler would.

use anyhow::{Context, Result};
use router_config::VaultConfig;
use router_types::{Address, AssetId, Bps, ManualClock, PairId, StrategyId};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vault_engine::sim::{LedgerTreasury, SimulatedStrategy, SimulatedVenue};
use vault_engine::{log_metrics, StrategyAdapter, Treasury, VaultEngine};

const OWNER: Address = Address::new([0x0a; 20]);
const DEFAULT_KEEPER: Address = Address::new([0x0b; 20]);
const DEPOSITORS: [Address; 3] = [
    Address::new([0xd1; 20]),
    Address::new([0xd2; 20]),
    Address::new([0xd3; 20]),
];

/// Starting simulated time, 2024-01-01T00:00:00Z
const GENESIS: u64 = 1_704_067_200;

/// APY each strategy reports per phase; the phase advances every tick
const APY_SCHEDULE: [[Bps; 3]; 4] = [
    [420, 380, 350],
    [410, 460, 350],
    [400, 455, 520],
    [480, 430, 360],
];

pub struct SimulatedVault {
    pub engine: VaultEngine,
    pub clock: Arc<ManualClock>,
    pub treasury: Arc<LedgerTreasury>,
    pub keeper: Address,
    pub pairs: Vec<PairId>,
    strategies: Vec<(StrategyId, Arc<SimulatedStrategy>)>,
    boosted: StrategyId,
    usdc: AssetId,
    tick: u64,
}

impl SimulatedVault {
    pub fn bootstrap(config: &VaultConfig) -> Result<Self> {
        let clock = Arc::new(ManualClock::new(GENESIS));
        let treasury = Arc::new(LedgerTreasury::new(
            config.treasury_address().context("Invalid treasury")?,
        ));
        let mut engine = VaultEngine::new(OWNER, config, clock.clone(), treasury.clone())
            .context("Failed to build vault engine")?
            .with_venue(Arc::new(SimulatedVenue::par(30, clock.clone())));

        let keeper = config
            .keeper_addresses()?
            .first()
            .copied()
            .unwrap_or(DEFAULT_KEEPER);
        engine.set_keeper(OWNER, keeper, true)?;

        let usdc = AssetId::from_low_u64(0x05dc);
        let weth = AssetId::from_low_u64(0xeeee);
        let stable = engine.add_pair(OWNER, usdc, usdc)?;
        let volatile = engine.add_pair(OWNER, weth, usdc)?;

        let mut strategies = Vec::new();
        for (name, apy) in [("lending", 420), ("amm-lp", 380), ("staking", 350)] {
            let adapter = Arc::new(SimulatedStrategy::new(name, apy));
            let id = engine.add_strategy(OWNER, stable, adapter.clone())?;
            strategies.push((id, adapter));
        }
        let boosted = strategies[2].0;
        engine.set_flash_strategy_whitelist(OWNER, boosted, true)?;

        for (depositor, amount) in DEPOSITORS.iter().zip([5_000_000u128, 2_500_000, 1_250_000]) {
            let receipt = engine.deposit_and_deploy(*depositor, stable, amount, 50)?;
            debug!(depositor = %depositor, shares = %receipt.shares, "Seed deposit");
        }
        engine.deposit(DEPOSITORS[0], volatile, 1_000_000)?;

        info!(
            pairs = 2,
            strategies = strategies.len(),
            keeper = %keeper,
            policy = engine.policy_name(),
            "Simulated vault ready"
        );
        Ok(Self {
            engine,
            clock,
            treasury,
            keeper,
            pairs: vec![stable, volatile],
            strategies,
            boosted,
            usdc,
            tick: 0,
        })
    }

    /// Advance simulated time by `elapsed_secs`, accrue yield and drift APYs
    pub fn advance(&mut self, elapsed_secs: u64) {
        self.tick += 1;
        self.clock.advance(elapsed_secs);
        let phase = APY_SCHEDULE[(self.tick as usize) % APY_SCHEDULE.len()];
        for ((id, strategy), apy) in self.strategies.iter().zip(phase) {
            let earned = strategy.accrue_for(elapsed_secs);
            strategy.set_apy(apy);
            debug!(strategy = %id, earned = %earned, apy = apy, "Strategy accrued");
        }
    }

    /// One keeper cycle: an occasional boost, then upkeep on every pair.
    /// Returns how many upkeep actions ran.
    pub fn run_cycle(&mut self) -> Result<usize> {
        let stable = self.pairs[0];
        if self.tick % 5 == 0 && self.engine.is_flash_boost_allowed(stable, self.boosted, 10) {
            match self
                .engine
                .trigger_flash_boost(self.keeper, stable, self.boosted, 10)
            {
                Ok(moved) => info!(pair = %stable, moved = %moved, "Flash boost triggered"),
                Err(e) => warn!(pair = %stable, error = %e, "Flash boost not started"),
            }
        }

        let mut performed = 0;
        for &pair in &self.pairs {
            let (needed, payload) = self
                .engine
                .check_upkeep(pair)
                .with_context(|| format!("check_upkeep failed for {}", pair))?;
            if !needed {
                continue;
            }
            match self.engine.perform_upkeep(self.keeper, &payload) {
                Ok(Some(action)) => {
                    performed += 1;
                    info!(pair = %pair, action = ?action, "Upkeep performed");
                }
                Ok(None) => debug!(pair = %pair, "Upkeep no longer needed"),
                Err(e) => warn!(pair = %pair, error = %e, "Upkeep failed"),
            }
        }
        Ok(performed)
    }

    /// Log each pair's state at info, with the full snapshot at debug
    pub fn report(&self) -> Result<()> {
        for &pair in &self.pairs {
            let snapshot = self.engine.pair_snapshot(pair)?;
            info!(
                pair = %pair,
                vault_value = %snapshot.vault_value,
                total_shares = %snapshot.total_shares,
                share_price = ?snapshot.share_price,
                boosted = snapshot.flash_boost.is_some(),
                "Pair state"
            );
            debug!(pair = %pair, "{}", snapshot.to_json()?);
        }
        log_metrics!(
            "Tick {}: {} fees collected, treasury holds {}",
            self.tick,
            self.engine.total_fees_collected(),
            self.treasury.balance(self.usdc)
        );
        Ok(())
    }

    pub fn strategy_balances(&self) -> Vec<u128> {
        self.strategies
            .iter()
            .map(|(_, strategy)| strategy.current_balance())
            .collect()
    }
}
