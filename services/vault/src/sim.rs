//! In-memory collaborators
//!
//! Deterministic stand-ins for strategies, the swap venue and the treasury.
//! The keeper service runs its simulated vault on these, and the tests use
//! them to drive every engine path including adapter failures.

use crate::adapters::{StrategyAdapter, SwapVenue, Treasury};
use crate::errors::{StrategyError, SwapError};
use parking_lot::Mutex;
use router_math::{mul_div, V2Math, V2PoolState};
use router_types::{Address, Amount, AssetId, Bps, Clock, BPS_DENOMINATOR};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
struct StrategyState {
    balance: Amount,
    apy: Bps,
}

/// A strategy whose balance only changes when told to
#[derive(Debug)]
pub struct SimulatedStrategy {
    name: String,
    state: Mutex<StrategyState>,
    reject_deposits: AtomicBool,
    reject_withdrawals: AtomicBool,
}

impl SimulatedStrategy {
    pub fn new(name: impl Into<String>, apy: Bps) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(StrategyState { balance: 0, apy }),
            reject_deposits: AtomicBool::new(false),
            reject_withdrawals: AtomicBool::new(false),
        }
    }

    pub fn set_apy(&self, apy: Bps) {
        self.state.lock().apy = apy;
    }

    /// Credit yield directly, as an external reward transfer would
    pub fn accrue(&self, amount: Amount) {
        let mut state = self.state.lock();
        state.balance = state.balance.saturating_add(amount);
    }

    /// Accrue `elapsed_secs` worth of the current APY, simple interest
    pub fn accrue_for(&self, elapsed_secs: u64) -> Amount {
        const SECS_PER_YEAR: u128 = 365 * 24 * 60 * 60;
        let mut state = self.state.lock();
        let earned = state
            .balance
            .checked_mul(state.apy as u128)
            .and_then(|v| v.checked_mul(elapsed_secs as u128))
            .map(|v| v / (BPS_DENOMINATOR * SECS_PER_YEAR))
            .unwrap_or(0);
        state.balance = state.balance.saturating_add(earned);
        earned
    }

    /// Remove value without the vault withdrawing it, e.g. an exploit or slashing
    pub fn lose(&self, amount: Amount) {
        let mut state = self.state.lock();
        state.balance = state.balance.saturating_sub(amount);
    }

    pub fn reject_deposits(&self, reject: bool) {
        self.reject_deposits.store(reject, Ordering::Relaxed);
    }

    pub fn reject_withdrawals(&self, reject: bool) {
        self.reject_withdrawals.store(reject, Ordering::Relaxed);
    }
}

impl StrategyAdapter for SimulatedStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn deposit(&self, amount: Amount) -> Result<(), StrategyError> {
        if self.reject_deposits.load(Ordering::Relaxed) {
            return Err(StrategyError::DepositRejected(self.name.clone()));
        }
        let mut state = self.state.lock();
        state.balance = state.balance.saturating_add(amount);
        Ok(())
    }

    fn withdraw(&self, amount: Amount) -> Result<Amount, StrategyError> {
        if self.reject_withdrawals.load(Ordering::Relaxed) {
            return Err(StrategyError::Unavailable(self.name.clone()));
        }
        let mut state = self.state.lock();
        if amount > state.balance {
            return Err(StrategyError::InsufficientBalance {
                requested: amount,
                available: state.balance,
            });
        }
        state.balance -= amount;
        Ok(amount)
    }

    fn current_balance(&self) -> Amount {
        self.state.lock().balance
    }

    fn current_apy(&self) -> Bps {
        self.state.lock().apy
    }
}

/// Pricing model of the simulated venue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenuePricing {
    /// 1:1 minus a fee
    Par { fee_bps: Bps },
    /// Constant product over reserves quoted token0 -> token1
    ConstantProduct(V2PoolState),
}

/// Single-hop swap venue with a settable price model
pub struct SimulatedVenue {
    pricing: Mutex<VenuePricing>,
    clock: Arc<dyn Clock>,
}

impl SimulatedVenue {
    pub fn new(pricing: VenuePricing, clock: Arc<dyn Clock>) -> Self {
        Self {
            pricing: Mutex::new(pricing),
            clock,
        }
    }

    pub fn par(fee_bps: Bps, clock: Arc<dyn Clock>) -> Self {
        Self::new(VenuePricing::Par { fee_bps }, clock)
    }

    pub fn set_pricing(&self, pricing: VenuePricing) {
        *self.pricing.lock() = pricing;
    }

    pub fn pricing(&self) -> VenuePricing {
        *self.pricing.lock()
    }
}

impl SwapVenue for SimulatedVenue {
    fn swap_exact_input(
        &self,
        amount_in: Amount,
        min_amount_out: Amount,
        path: &[AssetId],
        recipient: Address,
        deadline: u64,
    ) -> Result<Vec<Amount>, SwapError> {
        if path.len() != 2 {
            return Err(SwapError::InvalidPath(path.len()));
        }
        let now = self.clock.now_secs();
        if now > deadline {
            return Err(SwapError::Expired { deadline, now });
        }

        let mut pricing = self.pricing.lock();
        let amount_out = match &mut *pricing {
            VenuePricing::Par { fee_bps } => mul_div(
                amount_in,
                BPS_DENOMINATOR.saturating_sub(*fee_bps as Amount),
                BPS_DENOMINATOR,
            )
            .map_err(|e| SwapError::Venue(e.to_string()))?,
            VenuePricing::ConstantProduct(pool) => {
                V2Math::get_amount_out(amount_in, pool).map_err(|e| SwapError::Venue(e.to_string()))?
            }
        };
        if amount_out < min_amount_out {
            return Err(SwapError::InsufficientOutput {
                minimum: min_amount_out,
                actual: amount_out,
            });
        }
        if let VenuePricing::ConstantProduct(pool) = &mut *pricing {
            pool.reserve_in = pool.reserve_in.saturating_add(amount_in);
            pool.reserve_out = pool.reserve_out.saturating_sub(amount_out);
        }

        debug!(
            amount_in = %amount_in,
            amount_out = %amount_out,
            recipient = %recipient,
            "Simulated swap settled"
        );
        Ok(vec![amount_in, amount_out])
    }
}

/// Treasury that books fees per asset
#[derive(Debug)]
pub struct LedgerTreasury {
    address: Address,
    balances: Mutex<HashMap<AssetId, Amount>>,
}

impl LedgerTreasury {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balances: Mutex::new(HashMap::new()),
        }
    }

    /// Sum across all assets
    pub fn total(&self) -> Amount {
        self.balances.lock().values().sum()
    }
}

impl Treasury for LedgerTreasury {
    fn address(&self) -> Address {
        self.address
    }

    fn receive(&self, asset: AssetId, amount: Amount) {
        let mut balances = self.balances.lock();
        let entry = balances.entry(asset).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    fn balance(&self, asset: AssetId) -> Amount {
        self.balances.lock().get(&asset).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use router_types::ManualClock;

    #[test]
    fn test_strategy_balance_flow() {
        let strategy = SimulatedStrategy::new("aave", 500);
        strategy.deposit(1_000).unwrap();
        strategy.accrue(100);
        assert_eq!(strategy.current_balance(), 1_100);
        assert_eq!(strategy.withdraw(600).unwrap(), 600);
        assert!(matches!(
            strategy.withdraw(501),
            Err(StrategyError::InsufficientBalance { available: 500, .. })
        ));
    }

    #[test]
    fn test_strategy_rejections() {
        let strategy = SimulatedStrategy::new("flaky", 0);
        strategy.reject_deposits(true);
        assert!(strategy.deposit(1).is_err());
        strategy.reject_deposits(false);
        strategy.deposit(1).unwrap();
        strategy.reject_withdrawals(true);
        assert!(strategy.withdraw(1).is_err());
    }

    #[test]
    fn test_accrue_for_one_year() {
        let strategy = SimulatedStrategy::new("s", 1_000);
        strategy.deposit(10_000).unwrap();
        assert_eq!(strategy.accrue_for(365 * 24 * 60 * 60), 1_000);
        assert_eq!(strategy.current_balance(), 11_000);
    }

    #[test]
    fn test_par_venue() {
        let clock = Arc::new(ManualClock::new(100));
        let venue = SimulatedVenue::par(30, clock.clone());
        let path = [AssetId::from_low_u64(1), AssetId::from_low_u64(2)];
        let amounts = venue
            .swap_exact_input(1_000, 990, &path, Address::ZERO, 100)
            .unwrap();
        assert_eq!(amounts, vec![1_000, 997]);

        assert!(matches!(
            venue.swap_exact_input(1_000, 998, &path, Address::ZERO, 100),
            Err(SwapError::InsufficientOutput { actual: 997, .. })
        ));

        clock.advance(1);
        assert!(matches!(
            venue.swap_exact_input(1_000, 0, &path, Address::ZERO, 100),
            Err(SwapError::Expired { .. })
        ));
    }

    #[test]
    fn test_constant_product_venue_moves_reserves() {
        let clock = Arc::new(ManualClock::new(0));
        let venue = SimulatedVenue::new(
            VenuePricing::ConstantProduct(V2PoolState::new(1_000, 1_000, 0)),
            clock,
        );
        let path = [AssetId::from_low_u64(1), AssetId::from_low_u64(2)];
        let amounts = venue
            .swap_exact_input(1_000, 0, &path, Address::ZERO, 10)
            .unwrap();
        assert_eq!(amounts[1], 500);
        assert_eq!(
            venue.pricing(),
            VenuePricing::ConstantProduct(V2PoolState::new(2_000, 500, 0))
        );
    }

    #[test]
    fn test_treasury_books_per_asset() {
        let treasury = LedgerTreasury::new(Address::from_low_u64(7));
        treasury.receive(AssetId::from_low_u64(1), 2);
        treasury.receive(AssetId::from_low_u64(1), 3);
        treasury.receive(AssetId::from_low_u64(2), 1);
        assert_eq!(treasury.balance(AssetId::from_low_u64(1)), 5);
        assert_eq!(treasury.total(), 6);
    }
}
