//! Capability interfaces the engine consumes
//!
//! Strategies, the swap venue and the treasury are behaviour objects held as
//! `Arc<dyn Trait>`. The engine never stores them in its persisted schema, so
//! any implementation can be swapped without touching recorded state.
//! Methods take `&self`; implementations that hold balances use interior
//! mutability.

use crate::errors::{StrategyError, SwapError};
use router_types::{Address, Amount, AssetId, Bps};

/// A yield source. The engine never calls `deposit` or `withdraw` with zero.
pub trait StrategyAdapter: Send + Sync {
    /// Human-readable name for logs and snapshots
    fn name(&self) -> &str;

    /// Accept `amount` of the pair's base asset from the vault
    fn deposit(&self, amount: Amount) -> Result<(), StrategyError>;

    /// Return up to `amount` to the vault; the result is what was actually sent
    fn withdraw(&self, amount: Amount) -> Result<Amount, StrategyError>;

    /// Value currently held for the vault, including unrealized yield
    fn current_balance(&self) -> Amount;

    /// Current annualized yield in basis points
    fn current_apy(&self) -> Bps;
}

/// External exchange used to convert single-sided deposits
pub trait SwapVenue: Send + Sync {
    /// Swap exactly `amount_in` of `path[0]` along `path`, delivering at least
    /// `min_amount_out` of the last asset to `recipient` before `deadline`.
    /// Returns the amount at every hop, input first.
    fn swap_exact_input(
        &self,
        amount_in: Amount,
        min_amount_out: Amount,
        path: &[AssetId],
        recipient: Address,
        deadline: u64,
    ) -> Result<Vec<Amount>, SwapError>;
}

/// Fee recipient
pub trait Treasury: Send + Sync {
    fn address(&self) -> Address;

    /// Accept a fee transfer
    fn receive(&self, asset: AssetId, amount: Amount);

    fn balance(&self, asset: AssetId) -> Amount;
}
