//! Vault error taxonomy
//!
//! Every public operation returns [`VaultResult`]. A returned error means the
//! ledgers are exactly as they were before the call.

use router_math::MathError;
use router_types::{Address, Amount, PairId, StrategyId};
use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

/// Failure reported by a strategy adapter
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StrategyError {
    #[error("Strategy rejected deposit: {0}")]
    DepositRejected(String),

    #[error("Insufficient strategy balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Amount, available: Amount },

    #[error("Strategy unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by the swap venue
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("Output {actual} below minimum {minimum}")]
    InsufficientOutput { minimum: Amount, actual: Amount },

    #[error("Swap deadline {deadline} passed at {now}")]
    Expired { deadline: u64, now: u64 },

    #[error("Invalid swap path of length {0}")]
    InvalidPath(usize),

    #[error("Swap venue failure: {0}")]
    Venue(String),
}

/// Snapshot and restore failures
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Unsupported schema version {found}, expected {expected}")]
    SchemaVersion { expected: u16, found: u16 },

    #[error("State validation failed: {reason}")]
    ValidationFailed { reason: String },
}

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Amount must be positive and mint at least one share")]
    InvalidAmount,

    #[error("Insufficient shares: requested {requested}, held {held}")]
    InsufficientShares { requested: Amount, held: Amount },

    #[error("Insufficient idle liquidity: need {needed}, idle {available}")]
    InsufficientLiquidity { needed: Amount, available: Amount },

    #[error("Slippage exceeded: received {received}, minimum {minimum}")]
    SlippageExceeded { minimum: Amount, received: Amount },

    #[error("Caller {0} is not a keeper")]
    NotKeeper(Address),

    #[error("Caller {0} is not the owner")]
    NotOwner(Address),

    #[error("Paused")]
    Paused,

    #[error("Flash boost disabled")]
    FlashBoostDisabled,

    #[error("{0} is not whitelisted for flash boost")]
    NotWhitelisted(StrategyId),

    #[error("Flash boost of {requested}% over cap {cap}%")]
    OverCap { requested: u8, cap: u8 },

    #[error("No active flash boost on {0}")]
    NoActiveBoost(PairId),

    #[error("Flash boost already active on {0}")]
    FlashBoostActive(PairId),

    #[error("{strategy} not registered on {pair}")]
    StrategyNotRegistered { pair: PairId, strategy: StrategyId },

    #[error("Strategy already registered")]
    StrategyAlreadyRegistered,

    #[error("{pair} already holds the maximum of {max} strategies")]
    TooManyStrategies { pair: PairId, max: usize },

    #[error("{0} still holds principal or balance")]
    StrategyNotEmpty(StrategyId),

    #[error("{0} not found")]
    PairNotFound(PairId),

    #[error("{0} has no strategies")]
    NoStrategies(PairId),

    #[error("Protocol fee {requested} bps above ceiling {max} bps")]
    FeeTooHigh { requested: u32, max: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Shares outstanding on {0} but vault value is zero")]
    ZeroVaultValue(PairId),

    #[error("Swap router not set")]
    RouterNotSet,

    #[error("Swap deadline expired")]
    DeadlineExpired,

    #[error("Invalid upkeep payload: {0}")]
    InvalidPayload(String),

    #[error("Math error: {0}")]
    MathOverflow(#[from] MathError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Swap error: {0}")]
    Swap(SwapError),

    #[error("State error: {0}")]
    State(#[from] StateError),
}

impl From<SwapError> for VaultError {
    fn from(err: SwapError) -> Self {
        match err {
            SwapError::InsufficientOutput { minimum, actual } => VaultError::SlippageExceeded {
                minimum,
                received: actual,
            },
            SwapError::Expired { .. } => VaultError::DeadlineExpired,
            other => VaultError::Swap(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_errors_map_to_vault_taxonomy() {
        let err: VaultError = SwapError::InsufficientOutput {
            minimum: 10,
            actual: 9,
        }
        .into();
        assert!(matches!(
            err,
            VaultError::SlippageExceeded {
                minimum: 10,
                received: 9
            }
        ));

        let err: VaultError = SwapError::Expired {
            deadline: 1,
            now: 2,
        }
        .into();
        assert!(matches!(err, VaultError::DeadlineExpired));

        let err: VaultError = SwapError::InvalidPath(1).into();
        assert!(matches!(err, VaultError::Swap(SwapError::InvalidPath(1))));
    }

    #[test]
    fn test_display() {
        assert_eq!(VaultError::Paused.to_string(), "Paused");
        assert_eq!(
            VaultError::PairNotFound(PairId::new(4)).to_string(),
            "PairId(4) not found"
        );
    }
}
