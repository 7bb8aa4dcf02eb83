//! Vault Configuration Module
//!
//! Loads the engine's initial settings from TOML files with
//! environment-specific overrides and `YIELD_ROUTER_*` variables on top.

use crate::constants::{deposit, fees, flash_boost, keeper, rebalance};
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Complete vault configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct VaultConfig {
    pub fees: FeeConfig,
    pub rebalance: RebalanceConfig,
    pub flash_boost: FlashBoostConfig,
    pub deposit: DepositConfig,
    pub keeper: KeeperConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Fee charged on realized yield, in basis points
    pub protocol_fee_bps: u32,
    /// Treasury address as 0x-prefixed hex; unset routes fees to the zero address
    pub treasury: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RebalanceConfig {
    /// Minimum seconds between rebalances of one pair; 0 disables the gate
    pub min_interval_secs: u64,
    /// Relative APY improvement the target must exceed when gated
    pub improvement_threshold_bps: u32,
    /// Allow any caller to run rebalance and upkeep
    pub permissionless: bool,
    pub max_strategies_per_pair: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FlashBoostConfig {
    pub enabled: bool,
    pub max_percent: u8,
    pub max_duration_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DepositConfig {
    pub default_slippage_bps: u32,
    pub swap_deadline_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct KeeperConfig {
    pub poll_interval_secs: u64,
    /// Keeper addresses granted at startup, 0x-prefixed hex
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            protocol_fee_bps: fees::DEFAULT_PROTOCOL_FEE_BPS,
            treasury: None,
        }
    }
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: rebalance::DEFAULT_MIN_INTERVAL_SECS,
            improvement_threshold_bps: rebalance::DEFAULT_IMPROVEMENT_THRESHOLD_BPS,
            permissionless: true,
            max_strategies_per_pair: rebalance::DEFAULT_MAX_STRATEGIES_PER_PAIR,
        }
    }
}

impl Default for FlashBoostConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_percent: flash_boost::DEFAULT_MAX_PERCENT,
            max_duration_secs: flash_boost::DEFAULT_MAX_DURATION_SECS,
        }
    }
}

impl Default for DepositConfig {
    fn default() -> Self {
        Self {
            default_slippage_bps: deposit::DEFAULT_SLIPPAGE_BPS,
            swap_deadline_secs: deposit::DEFAULT_SWAP_DEADLINE_SECS,
        }
    }
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: keeper::DEFAULT_POLL_INTERVAL_SECS,
            addresses: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl VaultConfig {
    /// Load configuration from files with environment overrides
    ///
    /// Layers, lowest precedence first: built-in defaults, the base file
    /// (`config/vault.toml` unless given), `environments/<env>.toml` next to
    /// the base file, then `YIELD_ROUTER_<SECTION>__<KEY>` variables. An
    /// explicitly given base file must exist.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new("config/vault.toml"));

        let mut builder =
            Config::builder().add_source(File::from(base).required(base_path.is_some()));

        if let Some(env) = environment {
            let env_file = base
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default()
                .join("environments")
                .join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(keeper::ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: VaultConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        debug!(?config, "Vault configuration loaded");
        Ok(config)
    }

    /// Reject settings the engine would refuse at runtime
    pub fn validate(&self) -> Result<()> {
        if self.fees.protocol_fee_bps > fees::MAX_PROTOCOL_FEE_BPS {
            bail!(
                "protocol_fee_bps {} exceeds ceiling {}",
                self.fees.protocol_fee_bps,
                fees::MAX_PROTOCOL_FEE_BPS
            );
        }
        if self.flash_boost.max_percent > 100 {
            bail!("flash_boost.max_percent {} exceeds 100", self.flash_boost.max_percent);
        }
        if self.rebalance.max_strategies_per_pair == 0
            || self.rebalance.max_strategies_per_pair > rebalance::MAX_STRATEGIES_PER_PAIR
        {
            bail!(
                "max_strategies_per_pair must be within 1..={}",
                rebalance::MAX_STRATEGIES_PER_PAIR
            );
        }
        if self.deposit.default_slippage_bps > 10_000 {
            bail!("default_slippage_bps {} exceeds 10000", self.deposit.default_slippage_bps);
        }
        if self.keeper.poll_interval_secs == 0 {
            bail!("keeper.poll_interval_secs must be positive");
        }
        if let Some(treasury) = &self.fees.treasury {
            treasury
                .parse::<router_types::Address>()
                .with_context(|| format!("Invalid treasury address {}", treasury))?;
        }
        for address in &self.keeper.addresses {
            address
                .parse::<router_types::Address>()
                .with_context(|| format!("Invalid keeper address {}", address))?;
        }
        Ok(())
    }

    /// Treasury address, zero when unset
    pub fn treasury_address(&self) -> Result<router_types::Address> {
        match &self.fees.treasury {
            Some(hex) => hex
                .parse()
                .with_context(|| format!("Invalid treasury address {}", hex)),
            None => Ok(router_types::Address::ZERO),
        }
    }

    /// Keeper addresses granted at startup
    pub fn keeper_addresses(&self) -> Result<Vec<router_types::Address>> {
        self.keeper
            .addresses
            .iter()
            .map(|hex| {
                hex.parse()
                    .with_context(|| format!("Invalid keeper address {}", hex))
            })
            .collect()
    }

    /// Render as TOML, e.g. to seed a new config file
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Write as TOML to `path`
    pub fn save(&self, path: &Path) -> Result<PathBuf> {
        std::fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write configuration to {:?}", path))?;
        Ok(path.to_path_buf())
    }
}
