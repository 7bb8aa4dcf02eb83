//! Flash boost controller
//!
//! A keeper temporarily concentrates a capped percentage of a pair's deployed
//! principal into one whitelisted strategy. The boosted strategy's principal
//! right after the move is recorded as the snapshot; when the boost ends its
//! whole balance comes back, the growth over the snapshot is charged, and
//! the net is returned to the strategies that funded the boost in proportion
//! to what each gave.
//!
//! Only one boost per pair can be active, and no rebalance runs while it is.

use crate::engine::VaultEngine;
use crate::errors::{VaultError, VaultResult};
use crate::rebalance::Pulled;
use crate::storage::FlashBoostState;
use crate::{log_boost, log_warning};
use router_math::{mul_div, FeeMath, MathError, YieldSplit};
use router_types::{Address, Amount, PairId, StrategyId, VaultEvent};
use serde::Serialize;
use tracing::debug;

/// Result of an ended boost
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoostSettlement {
    pub strategy: StrategyId,
    /// Withdrawn from the boosted strategy
    pub gross: Amount,
    pub fee: Amount,
    /// Returned to the sources
    pub returned: Amount,
    /// Left in idle because a source refused it
    pub parked: Amount,
}

impl VaultEngine {
    /// Whether a boost of `percent` into `strategy` could start now, ignoring
    /// who would trigger it
    pub fn is_flash_boost_allowed(&self, pair: PairId, strategy: StrategyId, percent: u8) -> bool {
        !self.is_paused() && self.check_flash_boost(pair, strategy, percent).is_ok()
    }

    fn check_flash_boost(&self, pair: PairId, strategy: StrategyId, percent: u8) -> VaultResult<()> {
        let settings = &self.storage.settings;
        if !settings.flash_boost_enabled {
            return Err(VaultError::FlashBoostDisabled);
        }
        if !settings.flash_whitelist.contains(&strategy) {
            return Err(VaultError::NotWhitelisted(strategy));
        }
        if percent > settings.flash_boost_max_percent {
            return Err(VaultError::OverCap {
                requested: percent,
                cap: settings.flash_boost_max_percent,
            });
        }
        if !self.storage.pair(pair)?.holds_strategy(strategy) {
            return Err(VaultError::StrategyNotRegistered { pair, strategy });
        }
        if self.storage.flash_boosts.contains_key(&pair) {
            return Err(VaultError::FlashBoostActive(pair));
        }
        if percent == 0 {
            return Err(VaultError::InvalidAmount);
        }
        Ok(())
    }

    /// Move `percent` of the pair's principal deployed elsewhere into
    /// `strategy`. Keeper only. Returns the amount moved.
    ///
    /// Sources are drawn largest principal first. Yield carried along with
    /// the moved capital is not charged here; it is charged when the boost
    /// ends.
    pub fn trigger_flash_boost(
        &mut self,
        caller: Address,
        pair: PairId,
        strategy: StrategyId,
        percent: u8,
    ) -> VaultResult<Amount> {
        self.ensure_not_paused()?;
        self.ensure_keeper(caller)?;
        self.check_flash_boost(pair, strategy, percent)?;
        let boosted = self.pair_adapter(pair, strategy)?;

        let deployed = self.storage.deployed_principal(pair, Some(strategy));
        let amount = FeeMath::percent_of(deployed, percent)?;
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }

        let mut sources: Vec<(StrategyId, Amount)> = self
            .storage
            .pair(pair)?
            .strategies
            .iter()
            .filter(|&&id| id != strategy)
            .map(|&id| (id, self.storage.principal_of(pair, id)))
            .filter(|(_, principal)| *principal > 0)
            .collect();
        sources.sort_by(|a, b| b.1.cmp(&a.1));

        let mut pulled: Vec<Pulled> = Vec::new();
        let mut splits: Vec<YieldSplit> = Vec::new();
        let mut remaining = amount;
        for (id, principal) in sources {
            if remaining == 0 {
                break;
            }
            let adapter = self.pair_adapter(pair, id)?;
            let balance = adapter.current_balance();
            let take = remaining.min(balance);
            if take == 0 {
                continue;
            }
            let received = match adapter.withdraw(take) {
                Ok(received) => received,
                Err(e) => {
                    self.return_pulled(pair, &pulled);
                    return Err(e.into());
                }
            };
            let leg = Pulled {
                strategy: id,
                adapter,
                amount: received,
            };
            match FeeMath::split_pull(received, balance, principal) {
                Ok(split) => splits.push(split),
                Err(e) => {
                    pulled.push(leg);
                    self.return_pulled(pair, &pulled);
                    return Err(e.into());
                }
            }
            pulled.push(leg);
            remaining = remaining.saturating_sub(received);
        }

        let moved: Amount = pulled.iter().map(|leg| leg.amount).sum();
        if moved == 0 {
            return Err(VaultError::InvalidAmount);
        }
        if let Err(e) = boosted.deposit(moved) {
            self.return_pulled(pair, &pulled);
            return Err(e.into());
        }

        // commit
        let mut moved_principal: Amount = 0;
        for (leg, split) in pulled.iter().zip(&splits) {
            self.storage.reduce_principal(pair, leg.strategy, split.principal);
            moved_principal = moved_principal.saturating_add(split.principal);
        }
        self.storage.add_principal(pair, strategy, moved_principal);
        let boost = FlashBoostState {
            strategy,
            percent,
            principal_snapshot: self.storage.principal_of(pair, strategy),
            started_at: self.now(),
            sources: pulled.iter().map(|leg| (leg.strategy, leg.amount)).collect(),
        };
        self.storage.flash_boosts.insert(pair, boost);

        log_boost!("Flash boost {}% on {}: {} moved into {}", percent, pair, moved, strategy);
        self.emit(VaultEvent::FlashBoostStarted {
            pair,
            strategy,
            percent,
            amount: moved,
        });
        Ok(moved)
    }

    /// End the active boost on `pair`. Keeper only.
    pub fn end_flash_boost(&mut self, caller: Address, pair: PairId) -> VaultResult<BoostSettlement> {
        self.ensure_not_paused()?;
        self.ensure_keeper(caller)?;
        self.unwind_flash_boost(pair)
    }

    /// True once the active boost has run for the configured maximum duration
    pub fn is_flash_boost_expired(&self, pair: PairId) -> bool {
        let max = self.storage.settings.flash_boost_max_duration_secs;
        match self.storage.flash_boosts.get(&pair) {
            Some(boost) if max > 0 => self.now().saturating_sub(boost.started_at) >= max,
            _ => false,
        }
    }

    pub(crate) fn unwind_flash_boost(&mut self, pair: PairId) -> VaultResult<BoostSettlement> {
        self.storage.pair(pair)?;
        let boost = self
            .storage
            .flash_boosts
            .get(&pair)
            .cloned()
            .ok_or(VaultError::NoActiveBoost(pair))?;
        let boosted = self.pair_adapter(pair, boost.strategy)?;
        let sources = boost
            .sources
            .iter()
            .map(|&(id, given)| Ok((id, given, self.pair_adapter(pair, id)?)))
            .collect::<VaultResult<Vec<_>>>()?;

        let balance = boosted.current_balance();
        let gross = if balance > 0 { boosted.withdraw(balance)? } else { 0 };
        let priced = self.quote_skim(gross, boost.principal_snapshot).and_then(|skim| {
            let given: Vec<Amount> = sources.iter().map(|(_, given, _)| *given).collect();
            Ok((skim, settlement_portions(skim.net, &given)?))
        });
        let (skim, portions) = match priced {
            Ok(priced) => priced,
            Err(e) => {
                let leg = Pulled {
                    strategy: boost.strategy,
                    adapter: boosted,
                    amount: gross,
                };
                self.return_pulled(pair, &[leg]);
                return Err(e);
            }
        };

        // external redeposits; a refusal parks that share in idle
        let mut returned: Amount = 0;
        let mut parked: Amount = 0;
        let mut placed: Vec<(StrategyId, Amount)> = Vec::with_capacity(sources.len());
        for ((id, _, adapter), share) in sources.iter().zip(portions) {
            if share == 0 {
                continue;
            }
            match adapter.deposit(share) {
                Ok(()) => {
                    returned = returned.saturating_add(share);
                    placed.push((*id, share));
                }
                Err(e) => {
                    log_warning!("{} refused {} from boost unwind ({}); parked in idle", id, share, e);
                    parked = parked.saturating_add(share);
                }
            }
        }
        if sources.is_empty() {
            parked = skim.net;
        }

        // commit
        for (id, share) in placed {
            self.storage.add_principal(pair, id, share);
        }
        self.storage.set_principal(pair, boost.strategy, 0);
        if parked > 0 {
            let record = self.storage.pair_mut(pair)?;
            record.idle.token0 = record.idle.token0.saturating_add(parked);
        }
        let base = self.storage.pair(pair)?.token0;
        self.pay_fee(pair, base, skim.fee);
        self.storage.flash_boosts.remove(&pair);

        debug!(pair = %pair, gross = %gross, yield_amount = %skim.yield_amount, "Flash boost settled");
        log_boost!(
            "Flash boost on {} ended: {} returned, fee {}",
            pair,
            skim.net,
            skim.fee
        );
        self.emit(VaultEvent::FlashBoostEnded {
            pair,
            strategy: boost.strategy,
            returned: skim.net,
            fee: skim.fee,
        });

        Ok(BoostSettlement {
            strategy: boost.strategy,
            gross,
            fee: skim.fee,
            returned,
            parked,
        })
    }
}

/// Split `net` across sources in proportion to what each gave. The last
/// source takes the rounding remainder.
fn settlement_portions(net: Amount, given: &[Amount]) -> Result<Vec<Amount>, MathError> {
    let total: Amount = given.iter().sum();
    let mut portions = Vec::with_capacity(given.len());
    let mut assigned: Amount = 0;
    for (index, part) in given.iter().enumerate() {
        let portion = if index + 1 == given.len() {
            net - assigned
        } else {
            mul_div(net, *part, total)?
        };
        assigned += portion;
        portions.push(portion);
    }
    Ok(portions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{LedgerTreasury, SimulatedStrategy};
    use router_config::VaultConfig;
    use router_types::{AssetId, ManualClock};
    use std::sync::Arc;

    const OWNER: Address = Address::new([1; 20]);
    const KEEPER: Address = Address::new([3; 20]);

    struct Fixture {
        engine: VaultEngine,
        clock: Arc<ManualClock>,
        pair: PairId,
        base: StrategyId,
        flash: StrategyId,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(10_000));
        let mut engine = VaultEngine::new(
            OWNER,
            &VaultConfig::default(),
            clock.clone(),
            Arc::new(LedgerTreasury::new(Address::from_low_u64(9))),
        )
        .unwrap();
        let usdc = AssetId::from_low_u64(10);
        let pair = engine.add_pair(OWNER, usdc, usdc).unwrap();
        let base = engine
            .add_strategy(OWNER, pair, Arc::new(SimulatedStrategy::new("base", 400)))
            .unwrap();
        let flash = engine
            .add_strategy(OWNER, pair, Arc::new(SimulatedStrategy::new("flash", 900)))
            .unwrap();
        engine.set_keeper(OWNER, KEEPER, true).unwrap();
        engine.set_flash_strategy_whitelist(OWNER, flash, true).unwrap();
        engine.deposit(OWNER, pair, 1_000).unwrap();
        engine.deposit_to_strategy(KEEPER, pair, base, 1_000).unwrap();
        Fixture {
            engine,
            clock,
            pair,
            base,
            flash,
        }
    }

    #[test]
    fn test_settlement_portions() {
        assert_eq!(settlement_portions(297, &[200]).unwrap(), vec![297]);
        assert_eq!(settlement_portions(100, &[1, 1, 1]).unwrap(), vec![33, 33, 34]);
        assert!(settlement_portions(5, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_allowed_predicate() {
        let mut f = fixture();
        assert!(f.engine.is_flash_boost_allowed(f.pair, f.flash, 20));
        assert!(!f.engine.is_flash_boost_allowed(f.pair, f.flash, 30));
        assert!(!f.engine.is_flash_boost_allowed(f.pair, f.base, 20));
        f.engine.set_flash_boost_enabled(OWNER, false).unwrap();
        assert!(!f.engine.is_flash_boost_allowed(f.pair, f.flash, 20));
    }

    #[test]
    fn test_trigger_moves_percent_of_principal() {
        let mut f = fixture();
        let moved = f.engine.trigger_flash_boost(KEEPER, f.pair, f.flash, 20).unwrap();
        assert_eq!(moved, 200);
        assert_eq!(f.engine.strategy_principal(f.pair, f.base), 800);
        assert_eq!(f.engine.strategy_principal(f.pair, f.flash), 200);
        let boost = f.engine.flash_boost(f.pair).unwrap();
        assert_eq!(boost.principal_snapshot, 200);
        assert_eq!(boost.sources, vec![(f.base, 200)]);

        assert!(matches!(
            f.engine.trigger_flash_boost(KEEPER, f.pair, f.flash, 10),
            Err(VaultError::FlashBoostActive(_))
        ));
    }

    #[test]
    fn test_owner_is_not_keeper_for_boost() {
        let mut f = fixture();
        assert!(matches!(
            f.engine.trigger_flash_boost(OWNER, f.pair, f.flash, 20),
            Err(VaultError::NotKeeper(_))
        ));
    }

    #[test]
    fn test_end_without_boost() {
        let mut f = fixture();
        assert!(matches!(
            f.engine.end_flash_boost(KEEPER, f.pair),
            Err(VaultError::NoActiveBoost(_))
        ));
    }

    #[test]
    fn test_expiry() {
        let mut f = fixture();
        f.engine.trigger_flash_boost(KEEPER, f.pair, f.flash, 20).unwrap();
        assert!(!f.engine.is_flash_boost_expired(f.pair));
        f.clock.advance(3_600);
        assert!(f.engine.is_flash_boost_expired(f.pair));
    }
}
