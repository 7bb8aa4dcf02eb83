//! # Yield Router Configuration
//!
//! Centralized configuration and protocol constants for the vault engine and
//! the keeper service.
//!
//! ## Features
//!
//! - **Protocol Constants**: fee ceiling, boost cap, strategy bounds
//! - **Vault Configuration**: TOML files with per-environment overrides and
//!   `YIELD_ROUTER_*` environment variables, validated before use
//!
//! ## Usage
//!
//! ```rust
//! use router_config::{constants, VaultConfig};
//!
//! let config = VaultConfig::default();
//! assert!(config.fees.protocol_fee_bps <= constants::fees::MAX_PROTOCOL_FEE_BPS);
//! config.validate().unwrap();
//! ```

pub mod constants;
pub mod vault_config;

pub use vault_config::{
    DepositConfig, FeeConfig, FlashBoostConfig, KeeperConfig, LoggingConfig, RebalanceConfig,
    VaultConfig,
};
