//! Rebalancing engine
//!
//! `Idle → Evaluating → Moving → Idle`. A [`RebalancePolicy`] looks at a
//! read-only [`RebalanceContext`] and either declines or returns a
//! [`RebalancePlan`]; the engine then executes the plan as one operation.
//! Evaluation never mutates, which is what lets `check_upkeep` share it.

use crate::adapters::StrategyAdapter;
use crate::engine::VaultEngine;
use crate::errors::{VaultError, VaultResult};
use crate::fees::Skim;
use crate::{log_execution, log_search, log_warning};
use router_math::ApyMath;
use router_types::{Address, Amount, Bps, PairId, StrategyId, VaultEvent};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// What the engine knows about one strategy at evaluation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrategyView {
    pub id: StrategyId,
    pub apy: Bps,
    pub balance: Amount,
    pub principal: Amount,
}

/// Inputs of a rebalance decision
#[derive(Debug, Clone, Copy)]
pub struct RebalanceContext<'a> {
    pub pair: PairId,
    /// In registration order
    pub strategies: &'a [StrategyView],
    pub now: u64,
    pub last_rebalance: u64,
    pub min_interval_secs: u64,
    pub improvement_threshold_bps: Bps,
}

impl RebalanceContext<'_> {
    pub fn elapsed(&self) -> u64 {
        self.now.saturating_sub(self.last_rebalance)
    }
}

/// A move the policy wants: drain `sources` into `target`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebalancePlan {
    pub target: StrategyId,
    /// Dominant non-target position the gates were evaluated against
    pub holder: StrategyId,
    pub sources: Vec<StrategyId>,
}

/// Decides whether and where a pair's capital should move
pub trait RebalancePolicy: Send + Sync {
    fn name(&self) -> &str;

    fn plan(&self, ctx: &RebalanceContext<'_>) -> Option<RebalancePlan>;
}

/// Move everything to the highest-APY strategy.
///
/// With an interval configured the move also waits out the interval and
/// requires the target to beat the holder by the relative improvement
/// threshold. Without one, any strictly better target triggers a move.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApyHysteresisPolicy;

impl RebalancePolicy for ApyHysteresisPolicy {
    fn name(&self) -> &str {
        "apy-hysteresis"
    }

    fn plan(&self, ctx: &RebalanceContext<'_>) -> Option<RebalancePlan> {
        let target = best_strategy(ctx.strategies.iter())?;
        let holder = dominant_holder(ctx.strategies, target.id)?;
        if ApyMath::improvement(target.apy, holder.apy) == 0 {
            return None;
        }

        if ctx.min_interval_secs > 0 {
            if ctx.elapsed() < ctx.min_interval_secs {
                return None;
            }
            if !ApyMath::exceeds_threshold(target.apy, holder.apy, ctx.improvement_threshold_bps) {
                return None;
            }
        }

        let sources = ctx
            .strategies
            .iter()
            .filter(|view| view.id != target.id && view.balance > 0)
            .map(|view| view.id)
            .collect();
        Some(RebalancePlan {
            target: target.id,
            holder: holder.id,
            sources,
        })
    }
}

/// Strictly highest APY; ties go to the earliest registered
pub fn best_strategy<'a>(views: impl Iterator<Item = &'a StrategyView>) -> Option<&'a StrategyView> {
    views.fold(None, |best: Option<&StrategyView>, view| match best {
        Some(current) if view.apy <= current.apy => Some(current),
        _ => Some(view),
    })
}

/// Largest non-target position by principal, then balance. Only capital the
/// vault placed counts: a strategy holding nothing but unsolicited transfers
/// is never a holder.
fn dominant_holder(views: &[StrategyView], target: StrategyId) -> Option<&StrategyView> {
    views
        .iter()
        .filter(|view| view.id != target && view.principal > 0 && view.balance > 0)
        .fold(None, |best: Option<&StrategyView>, view| match best {
            Some(current) if (view.principal, view.balance) <= (current.principal, current.balance) => {
                Some(current)
            }
            _ => Some(view),
        })
}

/// Result of an executed rebalance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebalanceOutcome {
    pub from: Vec<StrategyId>,
    pub to: StrategyId,
    /// Total pulled from the sources
    pub gross: Amount,
    pub fee: Amount,
    /// Placed into the target
    pub deposited: Amount,
}

/// Capital already withdrawn from a strategy during an operation
pub(crate) struct Pulled {
    pub strategy: StrategyId,
    pub adapter: Arc<dyn StrategyAdapter>,
    pub amount: Amount,
}

impl VaultEngine {
    /// Evaluate `pair` without moving anything. `None` while a flash boost is
    /// active or when the policy declines.
    pub fn plan_rebalance(&self, pair: PairId) -> VaultResult<Option<RebalancePlan>> {
        let record = self.storage.pair(pair)?;
        if self.storage.flash_boosts.contains_key(&pair) {
            return Ok(None);
        }
        let views = self.strategy_views(pair)?;
        let settings = &self.storage.settings;
        let ctx = RebalanceContext {
            pair,
            strategies: &views,
            now: self.now(),
            last_rebalance: record.last_rebalance,
            min_interval_secs: settings.min_rebalance_interval_secs,
            improvement_threshold_bps: settings.improvement_threshold_bps,
        };
        Ok(self.policy.plan(&ctx))
    }

    /// Move the pair's capital to its best strategy if the policy asks for it.
    /// Returns `None` when nothing needed to move.
    pub fn rebalance(&mut self, caller: Address, pair: PairId) -> VaultResult<Option<RebalanceOutcome>> {
        self.ensure_not_paused()?;
        self.ensure_automation(caller)?;

        let Some(plan) = self.plan_rebalance(pair)? else {
            log_search!("No rebalance needed on {}", pair);
            return Ok(None);
        };
        self.execute_rebalance(pair, plan).map(Some)
    }

    pub(crate) fn execute_rebalance(
        &mut self,
        pair: PairId,
        plan: RebalancePlan,
    ) -> VaultResult<RebalanceOutcome> {
        let target = self.pair_adapter(pair, plan.target)?;
        let sources = plan
            .sources
            .iter()
            .filter(|&&id| id != plan.target)
            .map(|&id| Ok((id, self.pair_adapter(pair, id)?)))
            .collect::<VaultResult<Vec<_>>>()?;

        let mut pulled: Vec<Pulled> = Vec::with_capacity(sources.len());
        for (strategy, adapter) in sources {
            let balance = adapter.current_balance();
            if balance == 0 {
                continue;
            }
            match adapter.withdraw(balance) {
                Ok(amount) => pulled.push(Pulled {
                    strategy,
                    adapter,
                    amount,
                }),
                Err(e) => {
                    self.return_pulled(pair, &pulled);
                    return Err(e.into());
                }
            }
        }

        let mut gross: Amount = 0;
        let mut total = Skim::default();
        for leg in &pulled {
            let principal = self.storage.principal_of(pair, leg.strategy);
            match self.quote_skim(leg.amount, principal) {
                Ok(skim) => {
                    gross = gross.saturating_add(leg.amount);
                    total = total.combine(skim);
                }
                Err(e) => {
                    self.return_pulled(pair, &pulled);
                    return Err(e);
                }
            }
        }

        if total.net > 0 {
            if let Err(e) = target.deposit(total.net) {
                self.return_pulled(pair, &pulled);
                return Err(e.into());
            }
        }

        // every external call has returned; commit
        let from: Vec<StrategyId> = pulled.iter().map(|leg| leg.strategy).collect();
        for &strategy in &from {
            self.storage.set_principal(pair, strategy, 0);
        }
        self.storage.add_principal(pair, plan.target, total.net);
        let base = self.storage.pair(pair)?.token0;
        self.pay_fee(pair, base, total.fee);
        let now = self.now();
        self.storage.pair_mut(pair)?.last_rebalance = now;

        log_execution!(
            "Rebalanced {}: {} from {:?} into {} (fee {})",
            pair,
            gross,
            from,
            plan.target,
            total.fee
        );
        self.emit(VaultEvent::StrategyRebalanced {
            pair,
            from: from.clone(),
            to: plan.target,
            amount: total.net,
            fee: total.fee,
        });

        Ok(RebalanceOutcome {
            from,
            to: plan.target,
            gross,
            fee: total.fee,
            deposited: total.net,
        })
    }

    /// Put withdrawn capital back where it came from after a failed step.
    ///
    /// A strategy that refuses its own capital back leaves the value parked in
    /// the pair's idle base balance. Its principal moves with it and any yield
    /// part is recorded as pending so the withdrawal path still charges it.
    pub(crate) fn return_pulled(&mut self, pair: PairId, pulled: &[Pulled]) {
        for leg in pulled.iter().filter(|leg| leg.amount > 0) {
            match leg.adapter.deposit(leg.amount) {
                Ok(()) => debug!(strategy = %leg.strategy, amount = %leg.amount, "Returned pulled capital"),
                Err(e) => {
                    let principal = self.storage.principal_of(pair, leg.strategy);
                    let yield_part = leg.amount.saturating_sub(principal);
                    self.storage.reduce_principal(pair, leg.strategy, leg.amount);
                    if let Ok(record) = self.storage.pair_mut(pair) {
                        record.idle.token0 = record.idle.token0.saturating_add(leg.amount);
                        record.pending_yield = record.pending_yield.saturating_add(yield_part);
                    }
                    log_warning!(
                        "{} refused {} back ({}); parked in idle on {}",
                        leg.strategy,
                        leg.amount,
                        e,
                        pair
                    );
                }
            }
        }
    }

    /// Highest-APY strategy of `pair` that may receive new capital
    pub(crate) fn deploy_target(&self, pair: PairId) -> VaultResult<StrategyId> {
        let views = self.strategy_views(pair)?;
        let boosted = self.storage.flash_boosts.get(&pair).map(|boost| boost.strategy);
        best_strategy(views.iter().filter(|view| Some(view.id) != boosted))
            .map(|view| view.id)
            .ok_or(VaultError::NoStrategies(pair))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: u32, apy: Bps, balance: Amount, principal: Amount) -> StrategyView {
        StrategyView {
            id: StrategyId::new(id),
            apy,
            balance,
            principal,
        }
    }

    fn ctx<'a>(views: &'a [StrategyView], interval: u64, elapsed: u64) -> RebalanceContext<'a> {
        RebalanceContext {
            pair: PairId::new(0),
            strategies: views,
            now: 1_000 + elapsed,
            last_rebalance: 1_000,
            min_interval_secs: interval,
            improvement_threshold_bps: 300,
        }
    }

    #[test]
    fn test_best_strategy_tie_goes_to_first() {
        let views = [view(0, 500, 0, 0), view(1, 700, 0, 0), view(2, 700, 0, 0)];
        assert_eq!(best_strategy(views.iter()).unwrap().id, StrategyId::new(1));
        let empty: [StrategyView; 0] = [];
        assert!(best_strategy(empty.iter()).is_none());
    }

    #[test]
    fn test_moves_to_better_strategy_without_interval() {
        let views = [view(0, 400, 1_100, 1_000), view(1, 410, 0, 0)];
        let plan = ApyHysteresisPolicy.plan(&ctx(&views, 0, 0)).unwrap();
        assert_eq!(plan.target, StrategyId::new(1));
        assert_eq!(plan.holder, StrategyId::new(0));
        assert_eq!(plan.sources, vec![StrategyId::new(0)]);
    }

    #[test]
    fn test_equal_apy_does_not_move() {
        let views = [view(0, 500, 1_000, 1_000), view(1, 500, 0, 0)];
        assert!(ApyHysteresisPolicy.plan(&ctx(&views, 0, 0)).is_none());
    }

    #[test]
    fn test_already_in_best_strategy() {
        let views = [view(0, 400, 0, 0), view(1, 600, 1_000, 1_000)];
        assert!(ApyHysteresisPolicy.plan(&ctx(&views, 0, 0)).is_none());
    }

    #[test]
    fn test_interval_and_threshold_gates() {
        let views = [view(0, 400, 1_000, 1_000), view(1, 610, 0, 0)];
        // interval not elapsed
        assert!(ApyHysteresisPolicy.plan(&ctx(&views, 3_600, 3_599)).is_none());
        // elapsed and 610 clears 400 * 1.03
        assert!(ApyHysteresisPolicy.plan(&ctx(&views, 3_600, 3_600)).is_some());

        let marginal = [view(0, 400, 1_000, 1_000), view(1, 412, 0, 0)];
        assert!(ApyHysteresisPolicy.plan(&ctx(&marginal, 3_600, 7_200)).is_none());
    }

    #[test]
    fn test_unplaced_balance_is_not_a_holder() {
        // only dust sent straight to the lower strategy, nothing placed
        let views = [view(0, 400, 1, 0), view(1, 600, 0, 0)];
        assert!(ApyHysteresisPolicy.plan(&ctx(&views, 0, 0)).is_none());

        // a written-off position has nothing left to move
        let lost = [view(0, 400, 0, 1_000), view(1, 600, 0, 0)];
        assert!(ApyHysteresisPolicy.plan(&ctx(&lost, 0, 0)).is_none());
    }

    #[test]
    fn test_consolidates_every_funded_source() {
        let views = [
            view(0, 300, 500, 500),
            view(1, 400, 800, 700),
            view(2, 900, 100, 100),
            view(3, 200, 0, 0),
        ];
        let plan = ApyHysteresisPolicy.plan(&ctx(&views, 0, 0)).unwrap();
        assert_eq!(plan.target, StrategyId::new(2));
        assert_eq!(plan.holder, StrategyId::new(1));
        assert_eq!(plan.sources, vec![StrategyId::new(0), StrategyId::new(1)]);
    }
}
