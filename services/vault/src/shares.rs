//! Share accounting
//!
//! `total_shares` of a pair always equals the sum of its holders' shares.
//! Prices are never stored: mint and burn both value the pair with
//! [`VaultEngine::vault_value`] at the moment of the call.

use crate::engine::VaultEngine;
use crate::errors::{VaultError, VaultResult};
use crate::logging::LogEmoji;
use router_math::ShareMath;
use router_types::{Address, Amount, PairId, VaultEvent};
use tracing::debug;

impl VaultEngine {
    /// Shares a deposit worth `deposit_value` would mint right now
    pub fn preview_mint(&self, pair: PairId, deposit_value: Amount) -> VaultResult<Amount> {
        let total_shares = self.storage.pair(pair)?.total_shares;
        let value = self.vault_value(pair)?;
        self.mint_quote(pair, deposit_value, total_shares, value)
    }

    /// Value `shares` would release right now, before any fee
    pub fn preview_burn(&self, pair: PairId, shares: Amount) -> VaultResult<Amount> {
        let total_shares = self.storage.pair(pair)?.total_shares;
        if shares == 0 || shares > total_shares {
            return Err(VaultError::InsufficientShares {
                requested: shares,
                held: total_shares,
            });
        }
        Ok(ShareMath::value_for_shares(
            shares,
            total_shares,
            self.vault_value(pair)?,
        )?)
    }

    pub(crate) fn mint_quote(
        &self,
        pair: PairId,
        deposit_value: Amount,
        total_shares: Amount,
        value_before: Amount,
    ) -> VaultResult<Amount> {
        if deposit_value == 0 {
            return Err(VaultError::InvalidAmount);
        }
        if total_shares > 0 && value_before == 0 {
            return Err(VaultError::ZeroVaultValue(pair));
        }
        let shares = ShareMath::shares_for_deposit(deposit_value, total_shares, value_before)?;
        if shares == 0 {
            return Err(VaultError::InvalidAmount);
        }
        Ok(shares)
    }

    /// Add `shares` to `account` and the pair total, then announce the new balance
    pub(crate) fn credit_shares(
        &mut self,
        pair: PairId,
        account: Address,
        shares: Amount,
    ) -> VaultResult<()> {
        let record = self.storage.pair_mut(pair)?;
        record.total_shares = record
            .total_shares
            .checked_add(shares)
            .ok_or(router_math::MathError::Overflow)?;
        let total_shares = record.total_shares;

        let balance = self.storage.user_shares.entry((pair, account)).or_insert(0);
        *balance += shares;
        let balance = *balance;

        debug!("{} {} shares to {} on {}", LogEmoji::MINT, shares, account, pair);
        self.emit(VaultEvent::XpUpdated {
            pair,
            account,
            shares: balance,
            total_shares,
        });
        Ok(())
    }

    /// Remove `shares` from `account` and the pair total. The caller has
    /// already checked the balance.
    pub(crate) fn debit_shares(
        &mut self,
        pair: PairId,
        account: Address,
        shares: Amount,
    ) -> VaultResult<()> {
        let held = self.storage.shares_of(pair, account);
        if shares == 0 || shares > held {
            return Err(VaultError::InsufficientShares {
                requested: shares,
                held,
            });
        }
        let record = self.storage.pair_mut(pair)?;
        record.total_shares -= shares;
        let total_shares = record.total_shares;

        let remaining = held - shares;
        if remaining == 0 {
            self.storage.user_shares.remove(&(pair, account));
        } else {
            self.storage.user_shares.insert((pair, account), remaining);
        }

        debug!("{} {} shares from {} on {}", LogEmoji::BURN, shares, account, pair);
        self.emit(VaultEvent::XpUpdated {
            pair,
            account,
            shares: remaining,
            total_shares,
        });
        Ok(())
    }
}
