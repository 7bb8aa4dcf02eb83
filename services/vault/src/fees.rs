//! Fee engine
//!
//! A fee is charged only on yield measured against tracked principal, at two
//! call sites: when capital comes back from a strategy (rebalance, flash boost
//! unwind, keeper top-up) and when a withdrawal pays out realized yield that
//! was credited to idle. Pricing a skim and paying it are separate steps so an
//! operation can price every leg before any value leaves the vault.

use crate::engine::VaultEngine;
use crate::errors::VaultResult;
use crate::log_profit;
use router_math::FeeMath;
use router_types::{Amount, AssetId, PairId, VaultEvent};

/// A priced skim of capital pulled back from a position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Skim {
    pub yield_amount: Amount,
    pub fee: Amount,
    /// What the vault keeps: `gross - fee`
    pub net: Amount,
}

impl Skim {
    pub fn combine(self, other: Skim) -> Skim {
        Skim {
            yield_amount: self.yield_amount.saturating_add(other.yield_amount),
            fee: self.fee.saturating_add(other.fee),
            net: self.net.saturating_add(other.net),
        }
    }
}

impl VaultEngine {
    /// Price the fee on `gross` returned from a position holding `principal`
    pub fn quote_skim(&self, gross: Amount, principal: Amount) -> VaultResult<Skim> {
        let fee = FeeMath::skim_amount(gross, principal, self.storage.fees.protocol_fee_bps)?;
        Ok(Skim {
            yield_amount: FeeMath::yield_component(gross, principal),
            fee,
            net: gross.saturating_sub(fee),
        })
    }

    /// Price the fee when `yield_amount` of `gross` is already known to be yield
    pub(crate) fn quote_yield_fee(&self, gross: Amount, yield_amount: Amount) -> VaultResult<Skim> {
        let fee = FeeMath::fee_on_yield(yield_amount, self.storage.fees.protocol_fee_bps)?;
        Ok(Skim {
            yield_amount,
            fee,
            net: gross.saturating_sub(fee),
        })
    }

    /// Transfer `fee` of `asset` to the treasury and count it
    pub(crate) fn pay_fee(&mut self, pair: PairId, asset: AssetId, fee: Amount) {
        self.pay_fee_legs(pair, &[(asset, fee)]);
    }

    /// Transfer one fee made of several asset legs, announced as a single collection
    pub(crate) fn pay_fee_legs(&mut self, pair: PairId, legs: &[(AssetId, Amount)]) {
        let fee: Amount = legs.iter().map(|(_, amount)| *amount).sum();
        if fee == 0 {
            return;
        }
        for &(asset, amount) in legs.iter().filter(|(_, amount)| *amount > 0) {
            self.treasury.receive(asset, amount);
        }
        let fees = &mut self.storage.fees;
        fees.total_fees_collected = fees.total_fees_collected.saturating_add(fee);
        let total_fees = fees.total_fees_collected;

        log_profit!("Fee {} collected on {} (total {})", fee, pair, total_fees);
        self.emit(VaultEvent::FeeCollected {
            pair,
            amount: fee,
            total_fees,
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::adapters::Treasury;
    use crate::engine::VaultEngine;
    use crate::events::RecordingSink;
    use crate::sim::LedgerTreasury;
    use router_config::VaultConfig;
    use router_types::{Address, AssetId, ManualClock};
    use std::sync::Arc;

    #[test]
    fn test_quoted_skim_paid_to_treasury_and_counted() {
        let owner = Address::from_low_u64(1);
        let treasury = Arc::new(LedgerTreasury::new(Address::from_low_u64(9)));
        let sink = Arc::new(RecordingSink::new());
        let mut engine = VaultEngine::new(
            owner,
            &VaultConfig::default(),
            Arc::new(ManualClock::new(0)),
            treasury.clone(),
        )
        .unwrap()
        .with_sink(sink.clone());
        let usdc = AssetId::from_low_u64(10);
        let pair = engine.add_pair(owner, usdc, usdc).unwrap();

        // default 200 bps on 100 yield
        let skim = engine.quote_skim(1_100, 1_000).unwrap();
        assert_eq!(skim.yield_amount, 100);
        assert_eq!(skim.fee, 2);
        assert_eq!(skim.net, 1_098);
        assert_eq!(treasury.balance(usdc), 0);
        engine.pay_fee(pair, usdc, skim.fee);
        assert_eq!(treasury.balance(usdc), 2);
        assert_eq!(engine.total_fees_collected(), 2);
        assert_eq!(sink.count("FeeCollected"), 1);

        // no yield, no fee, no event
        let skim = engine.quote_skim(900, 1_000).unwrap();
        assert_eq!(skim.fee, 0);
        assert_eq!(skim.net, 900);
        engine.pay_fee(pair, usdc, skim.fee);
        assert_eq!(treasury.balance(usdc), 2);
        assert_eq!(engine.total_fees_collected(), 2);
        assert_eq!(sink.count("FeeCollected"), 1);
    }
}
