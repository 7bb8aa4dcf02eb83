//! Protocol constants and defaults
//!
//! Hard limits enforced by the engine regardless of configuration, plus the
//! defaults `VaultConfig::default()` is built from.

/// Fee limits
pub mod fees {
    /// Hard ceiling on the protocol fee (5%)
    pub const MAX_PROTOCOL_FEE_BPS: u32 = 500;

    /// Default protocol fee (2%)
    pub const DEFAULT_PROTOCOL_FEE_BPS: u32 = 200;
}

/// Rebalancing defaults
pub mod rebalance {
    /// No interval gate until the owner configures one
    pub const DEFAULT_MIN_INTERVAL_SECS: u64 = 0;

    /// Relative APY improvement required once an interval gate is active (3%)
    pub const DEFAULT_IMPROVEMENT_THRESHOLD_BPS: u32 = 300;

    /// Strategies a single pair may register
    pub const DEFAULT_MAX_STRATEGIES_PER_PAIR: usize = 8;

    /// Upper bound accepted by validation
    pub const MAX_STRATEGIES_PER_PAIR: usize = 32;
}

/// Flash boost defaults
pub mod flash_boost {
    /// Largest share of deployed principal a boost may move
    pub const DEFAULT_MAX_PERCENT: u8 = 25;

    /// Boost lifetime before automation unwinds it (1 hour)
    pub const DEFAULT_MAX_DURATION_SECS: u64 = 3_600;
}

/// Deposit conversion defaults
pub mod deposit {
    /// Slippage tolerance applied by deposit-and-deploy (0.5%)
    pub const DEFAULT_SLIPPAGE_BPS: u32 = 50;

    /// Swap deadline offset from the current time
    pub const DEFAULT_SWAP_DEADLINE_SECS: u64 = 300;
}

/// Keeper service defaults
pub mod keeper {
    /// Upkeep polling interval
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

    /// Environment variable prefix for configuration overrides
    pub const ENV_PREFIX: &str = "YIELD_ROUTER";
}
