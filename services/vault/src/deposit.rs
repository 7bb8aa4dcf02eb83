//! Deposit and withdraw engine
//!
//! User value enters and leaves through the pair's idle balances. A
//! single-sided deposit into a two-asset pair converts part of the amount
//! through the swap venue before any share is minted; withdrawals pay out of
//! idle only and never pull from strategies on their own. Keeper calls move
//! capital between idle and strategies.

use crate::engine::VaultEngine;
use crate::errors::{VaultError, VaultResult};
use crate::fees::Skim;
use crate::logging::LogEmoji;
use crate::rebalance::Pulled;
use crate::{log_execution, log_profit, log_success, log_warning};
use router_math::{mul_div, FeeMath, MathError};
use router_types::{Address, Amount, AssetId, Bps, PairId, StrategyId, BPS_DENOMINATOR};
use serde::Serialize;
use tracing::debug;

/// Caller controls for a deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositOptions {
    /// Portion of the amount converted to token1 on a two-asset pair
    pub swap_split_bps: Bps,
    /// Explicit floor on the converted output
    pub min_amount_out: Option<Amount>,
    /// Floor as a tolerance on the par quote, used when no explicit floor is given
    pub slippage_bps: Option<Bps>,
}

impl Default for DepositOptions {
    fn default() -> Self {
        Self {
            swap_split_bps: 5_000,
            min_amount_out: None,
            slippage_bps: None,
        }
    }
}

impl DepositOptions {
    pub fn with_split(mut self, swap_split_bps: Bps) -> Self {
        self.swap_split_bps = swap_split_bps;
        self
    }

    pub fn with_min_amount_out(mut self, min_amount_out: Amount) -> Self {
        self.min_amount_out = Some(min_amount_out);
        self
    }

    pub fn with_slippage(mut self, slippage_bps: Bps) -> Self {
        self.slippage_bps = Some(slippage_bps);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DepositReceipt {
    pub shares: Amount,
    /// Combined value the shares were minted on
    pub value: Amount,
    pub token0: Amount,
    pub token1: Amount,
    /// Strategy the value was placed into, for deposit-and-deploy
    pub deployed_to: Option<StrategyId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WithdrawReceipt {
    pub shares_burned: Amount,
    /// Value released before the fee
    pub gross: Amount,
    pub fee: Amount,
    /// Net paid out per asset
    pub token0: Amount,
    pub token1: Amount,
}

/// Deposit priced against the pair before any external call
struct DepositQuote {
    total_shares: Amount,
    value_before: Amount,
    swap_in: Amount,
    min_out: Amount,
    token0: AssetId,
    token1: AssetId,
}

impl DepositQuote {
    fn keep0(&self, amount: Amount) -> Amount {
        amount - self.swap_in
    }
}

impl VaultEngine {
    /// Deposit `amount` of the pair's base asset with the default half split
    pub fn deposit(&mut self, caller: Address, pair: PairId, amount: Amount) -> VaultResult<DepositReceipt> {
        self.deposit_with(caller, pair, amount, DepositOptions::default())
    }

    pub fn deposit_with(
        &mut self,
        caller: Address,
        pair: PairId,
        amount: Amount,
        options: DepositOptions,
    ) -> VaultResult<DepositReceipt> {
        self.ensure_not_paused()?;
        let quote = self.quote_deposit(pair, amount, &options)?;
        let received = self.convert(&quote)?;
        self.commit_deposit(caller, pair, amount, &quote, received, None)
    }

    /// Deposit and place the whole contribution into the best strategy of the
    /// pair in one step. The boosted strategy of an active flash boost is
    /// never the target.
    ///
    /// If the strategy refuses the capital after a conversion already
    /// settled, the deposit still completes into idle and the receipt reports
    /// no deployment.
    pub fn deposit_and_deploy(
        &mut self,
        caller: Address,
        pair: PairId,
        amount: Amount,
        slippage_bps: Bps,
    ) -> VaultResult<DepositReceipt> {
        self.ensure_not_paused()?;
        let options = DepositOptions::default().with_slippage(slippage_bps);
        let quote = self.quote_deposit(pair, amount, &options)?;
        let target = self.deploy_target(pair)?;
        let adapter = self.pair_adapter(pair, target)?;

        let received = self.convert(&quote)?;
        let value = quote
            .keep0(amount)
            .checked_add(received)
            .ok_or(MathError::Overflow)?;

        match adapter.deposit(value) {
            Ok(()) => {
                let receipt = self.commit_deposit(caller, pair, amount, &quote, received, Some(target))?;
                self.storage.add_principal(pair, target, value);
                let now = self.now();
                self.storage.pair_mut(pair)?.last_rebalance = now;
                log_execution!("Deployed {} of {} into {}", value, pair, target);
                Ok(receipt)
            }
            Err(e) if quote.swap_in == 0 => Err(e.into()),
            Err(e) => {
                log_warning!("{} refused {} ({}); deposit kept idle on {}", target, value, e, pair);
                self.commit_deposit(caller, pair, amount, &quote, received, None)
            }
        }
    }

    fn quote_deposit(
        &self,
        pair: PairId,
        amount: Amount,
        options: &DepositOptions,
    ) -> VaultResult<DepositQuote> {
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }
        let record = self.storage.pair(pair)?;
        let value_before = self.vault_value(pair)?;

        let (swap_in, min_out) = if record.is_single_asset() {
            (0, 0)
        } else {
            if options.swap_split_bps as Amount > BPS_DENOMINATOR {
                return Err(VaultError::InvalidAmount);
            }
            let swap_in = FeeMath::bps_of(amount, options.swap_split_bps)?;
            let min_out = if swap_in == 0 {
                0
            } else {
                if self.venue.is_none() {
                    return Err(VaultError::RouterNotSet);
                }
                match options.min_amount_out {
                    Some(min_out) => min_out,
                    None => FeeMath::min_amount_out(
                        swap_in,
                        options
                            .slippage_bps
                            .unwrap_or(self.storage.settings.default_slippage_bps),
                    )?,
                }
            };
            (swap_in, min_out)
        };

        let quote = DepositQuote {
            total_shares: record.total_shares,
            value_before,
            swap_in,
            min_out,
            token0: record.token0,
            token1: record.token1,
        };
        // the guaranteed value must already mint shares
        let guaranteed = quote.keep0(amount).saturating_add(min_out);
        self.mint_quote(pair, guaranteed, quote.total_shares, quote.value_before)?;
        Ok(quote)
    }

    /// Run the conversion leg, returning token1 received
    fn convert(&self, quote: &DepositQuote) -> VaultResult<Amount> {
        if quote.swap_in == 0 {
            return Ok(0);
        }
        let venue = self.venue.as_ref().ok_or(VaultError::RouterNotSet)?;
        let deadline = self
            .now()
            .saturating_add(self.storage.settings.swap_deadline_secs);
        let amounts = venue.swap_exact_input(
            quote.swap_in,
            quote.min_out,
            &[quote.token0, quote.token1],
            self.address,
            deadline,
        )?;
        let received = amounts.last().copied().unwrap_or(0);
        if received < quote.min_out {
            return Err(VaultError::SlippageExceeded {
                minimum: quote.min_out,
                received,
            });
        }
        debug!(
            "{} {} {} -> {} {}",
            LogEmoji::SWAP,
            quote.swap_in,
            quote.token0,
            received,
            quote.token1
        );
        Ok(received)
    }

    fn commit_deposit(
        &mut self,
        caller: Address,
        pair: PairId,
        amount: Amount,
        quote: &DepositQuote,
        received: Amount,
        deployed_to: Option<StrategyId>,
    ) -> VaultResult<DepositReceipt> {
        let keep0 = quote.keep0(amount);
        let value = keep0.checked_add(received).ok_or(MathError::Overflow)?;
        let shares = self.mint_quote(pair, value, quote.total_shares, quote.value_before)?;

        if deployed_to.is_none() {
            let record = self.storage.pair_mut(pair)?;
            record.idle.token0 = record.idle.token0.checked_add(keep0).ok_or(MathError::Overflow)?;
            record.idle.token1 = record
                .idle
                .token1
                .checked_add(received)
                .ok_or(MathError::Overflow)?;
        }
        self.credit_shares(pair, caller, shares)?;

        log_success!("Deposit of {} into {} minted {} shares for {}", value, pair, shares, caller);
        Ok(DepositReceipt {
            shares,
            value,
            token0: keep0,
            token1: received,
            deployed_to,
        })
    }

    /// Burn `shares` and pay their value out of idle.
    ///
    /// The payout carries a pro-rata part of the pair's pending yield, and
    /// only that part is charged.
    pub fn withdraw(&mut self, caller: Address, pair: PairId, shares: Amount) -> VaultResult<WithdrawReceipt> {
        self.ensure_not_paused()?;
        let held = self.storage.shares_of(pair, caller);
        let record = self.storage.pair(pair)?;
        if shares == 0 || shares > held {
            return Err(VaultError::InsufficientShares {
                requested: shares,
                held,
            });
        }

        let gross = self.preview_burn(pair, shares)?;
        let idle = record.idle;
        let idle_total = idle.total();
        if gross > idle_total {
            return Err(VaultError::InsufficientLiquidity {
                needed: gross,
                available: idle_total,
            });
        }

        let yield_part = if idle_total == 0 {
            0
        } else {
            mul_div(gross, record.pending_yield, idle_total)?.min(record.pending_yield)
        };
        let skim = self.quote_yield_fee(gross, yield_part)?;
        let (out0, out1) = idle.split(gross)?;
        let fee0 = if gross == 0 { 0 } else { mul_div(skim.fee, out0, gross)? };
        let fee1 = skim.fee - fee0;
        let (token0, token1) = (record.token0, record.token1);

        // commit
        let record = self.storage.pair_mut(pair)?;
        record.idle.token0 -= out0;
        record.idle.token1 -= out1;
        record.pending_yield -= yield_part;
        self.debit_shares(pair, caller, shares)?;
        if token0 == token1 {
            self.pay_fee(pair, token0, skim.fee);
        } else {
            self.pay_fee_legs(pair, &[(token0, fee0), (token1, fee1)]);
        }

        log_success!(
            "Withdrawal of {} shares from {} paid {} (fee {}) to {}",
            shares,
            pair,
            skim.net,
            skim.fee,
            caller
        );
        Ok(WithdrawReceipt {
            shares_burned: shares,
            gross,
            fee: skim.fee,
            token0: out0 - fee0,
            token1: out1 - fee1,
        })
    }

    /// Place idle value into a strategy of the pair. Owner or keeper.
    pub fn deposit_to_strategy(
        &mut self,
        caller: Address,
        pair: PairId,
        strategy: StrategyId,
        amount: Amount,
    ) -> VaultResult<()> {
        self.ensure_not_paused()?;
        self.ensure_operator(caller)?;
        let adapter = self.pair_adapter(pair, strategy)?;
        self.ensure_not_boosted(pair, strategy)?;
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }
        let available = self.storage.pair(pair)?.idle.total();
        if amount > available {
            return Err(VaultError::InsufficientLiquidity {
                needed: amount,
                available,
            });
        }

        adapter.deposit(amount)?;

        self.storage.pair_mut(pair)?.idle.draw(amount)?;
        self.storage.add_principal(pair, strategy, amount);
        log_execution!("Placed {} of {} idle into {}", amount, pair, strategy);
        Ok(())
    }

    /// Pull `amount` from a strategy back to idle so withdrawals can be paid.
    /// Owner or keeper. The yield part of the pull is charged immediately.
    pub fn withdraw_from_strategy(
        &mut self,
        caller: Address,
        pair: PairId,
        strategy: StrategyId,
        amount: Amount,
    ) -> VaultResult<Skim> {
        self.ensure_not_paused()?;
        self.ensure_operator(caller)?;
        let adapter = self.pair_adapter(pair, strategy)?;
        self.ensure_not_boosted(pair, strategy)?;
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }
        let balance = adapter.current_balance();
        if amount > balance {
            return Err(VaultError::InsufficientLiquidity {
                needed: amount,
                available: balance,
            });
        }
        let principal = self.storage.principal_of(pair, strategy);

        let received = adapter.withdraw(amount)?;
        let priced = FeeMath::split_pull(received, balance, principal)
            .map_err(VaultError::from)
            .and_then(|split| Ok((split, self.quote_yield_fee(received, split.yield_amount)?)));
        let (split, skim) = match priced {
            Ok(priced) => priced,
            Err(e) => {
                let leg = Pulled {
                    strategy,
                    adapter,
                    amount: received,
                };
                self.return_pulled(pair, &[leg]);
                return Err(e);
            }
        };

        // commit
        self.storage.reduce_principal(pair, strategy, split.principal);
        let record = self.storage.pair_mut(pair)?;
        record.idle.token0 = record.idle.token0.saturating_add(skim.net);
        let base = record.token0;
        self.pay_fee(pair, base, skim.fee);

        log_execution!(
            "Pulled {} from {} to idle on {} (yield {}, fee {})",
            received,
            strategy,
            pair,
            split.yield_amount,
            skim.fee
        );
        Ok(skim)
    }

    /// Record reward value delivered straight into idle. It is realized yield
    /// not yet charged; withdrawals charge it as they carry it out.
    pub fn credit_idle_yield(
        &mut self,
        caller: Address,
        pair: PairId,
        asset: AssetId,
        amount: Amount,
    ) -> VaultResult<()> {
        self.ensure_not_paused()?;
        self.ensure_operator(caller)?;
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }
        let record = self.storage.pair_mut(pair)?;
        if asset == record.token0 {
            record.idle.token0 = record.idle.token0.checked_add(amount).ok_or(MathError::Overflow)?;
        } else if asset == record.token1 {
            record.idle.token1 = record.idle.token1.checked_add(amount).ok_or(MathError::Overflow)?;
        } else {
            return Err(VaultError::InvalidAmount);
        }
        record.pending_yield = record.pending_yield.saturating_add(amount);
        log_profit!("Credited {} of yield to idle on {}", amount, pair);
        Ok(())
    }

    /// The boosted strategy is off limits to manual moves until the boost ends
    fn ensure_not_boosted(&self, pair: PairId, strategy: StrategyId) -> VaultResult<()> {
        match self.storage.flash_boosts.get(&pair) {
            Some(boost) if boost.strategy == strategy => Err(VaultError::FlashBoostActive(pair)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{LedgerTreasury, SimulatedStrategy, SimulatedVenue};
    use router_config::VaultConfig;
    use router_types::ManualClock;
    use std::sync::Arc;

    const OWNER: Address = Address::new([1; 20]);
    const ALICE: Address = Address::new([2; 20]);

    fn engine() -> (VaultEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let engine = VaultEngine::new(
            OWNER,
            &VaultConfig::default(),
            clock.clone(),
            Arc::new(LedgerTreasury::new(Address::from_low_u64(9))),
        )
        .unwrap();
        (engine, clock)
    }

    #[test]
    fn test_single_asset_deposit_and_withdraw() {
        let (mut engine, _) = engine();
        let usdc = AssetId::from_low_u64(10);
        let pair = engine.add_pair(OWNER, usdc, usdc).unwrap();

        let receipt = engine.deposit(ALICE, pair, 1_000).unwrap();
        assert_eq!(receipt.shares, 1_000);
        assert_eq!(engine.pair(pair).unwrap().idle.token0, 1_000);

        let out = engine.withdraw(ALICE, pair, 400).unwrap();
        assert_eq!(out.gross, 400);
        assert_eq!(out.fee, 0);
        assert_eq!(engine.user_shares(pair, ALICE), 600);
    }

    #[test]
    fn test_zero_deposit_rejected() {
        let (mut engine, _) = engine();
        let usdc = AssetId::from_low_u64(10);
        let pair = engine.add_pair(OWNER, usdc, usdc).unwrap();
        assert!(matches!(
            engine.deposit(ALICE, pair, 0),
            Err(VaultError::InvalidAmount)
        ));
    }

    #[test]
    fn test_two_asset_deposit_needs_router() {
        let (mut engine, _) = engine();
        let pair = engine
            .add_pair(OWNER, AssetId::from_low_u64(10), AssetId::from_low_u64(11))
            .unwrap();
        assert!(matches!(
            engine.deposit(ALICE, pair, 1_000),
            Err(VaultError::RouterNotSet)
        ));
        // nothing converted means no venue is needed
        let receipt = engine
            .deposit_with(ALICE, pair, 1_000, DepositOptions::default().with_split(0))
            .unwrap();
        assert_eq!(receipt.token1, 0);
    }

    #[test]
    fn test_two_asset_deposit_swaps_half() {
        let (mut engine, clock) = engine();
        engine = engine.with_venue(Arc::new(SimulatedVenue::par(30, clock)));
        let (weth, usdc) = (AssetId::from_low_u64(10), AssetId::from_low_u64(11));
        let pair = engine.add_pair(OWNER, weth, usdc).unwrap();

        let receipt = engine.deposit(ALICE, pair, 1_000).unwrap();
        assert_eq!(receipt.token0, 500);
        assert_eq!(receipt.token1, 498);
        assert_eq!(receipt.shares, 998);
        let idle = engine.pair(pair).unwrap().idle;
        assert_eq!((idle.token0, idle.token1), (500, 498));
    }

    #[test]
    fn test_withdraw_needs_idle() {
        let (mut engine, _) = engine();
        let usdc = AssetId::from_low_u64(10);
        let pair = engine.add_pair(OWNER, usdc, usdc).unwrap();
        let strategy = engine
            .add_strategy(OWNER, pair, Arc::new(SimulatedStrategy::new("s", 500)))
            .unwrap();
        engine.deposit(ALICE, pair, 1_000).unwrap();
        engine.deposit_to_strategy(OWNER, pair, strategy, 800).unwrap();

        assert!(matches!(
            engine.withdraw(ALICE, pair, 500),
            Err(VaultError::InsufficientLiquidity {
                needed: 500,
                available: 200
            })
        ));
        assert_eq!(engine.user_shares(pair, ALICE), 1_000);
    }

    #[test]
    fn test_deposit_to_strategy_requires_operator() {
        let (mut engine, _) = engine();
        let usdc = AssetId::from_low_u64(10);
        let pair = engine.add_pair(OWNER, usdc, usdc).unwrap();
        let strategy = engine
            .add_strategy(OWNER, pair, Arc::new(SimulatedStrategy::new("s", 500)))
            .unwrap();
        engine.deposit(ALICE, pair, 1_000).unwrap();
        assert!(matches!(
            engine.deposit_to_strategy(ALICE, pair, strategy, 100),
            Err(VaultError::NotKeeper(_))
        ));
    }
}
