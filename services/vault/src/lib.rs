//! # Vault Engine - Multi-Strategy Yield Routing
//!
//! ## Purpose
//!
//! Pools user deposits per asset pair, issues proportional shares, places the
//! pooled capital into external yield strategies and keeps it in the best one
//! by APY. Fees are charged only on yield measured against the principal the
//! vault knowingly placed.
//!
//! ## Integration Points
//!
//! - **Strategies**: [`StrategyAdapter`] behaviour objects held in a
//!   [`StrategyRegistry`] arena with stable [`StrategyId`](router_types::StrategyId) handles
//! - **Conversions**: a [`SwapVenue`] for single-sided deposits into two-asset pairs
//! - **Fees**: a [`Treasury`] receiving every skim
//! - **Automation**: `check_upkeep` / `perform_upkeep` for an external scheduler
//! - **Observability**: [`EventSink`]s plus `tracing` with the [`logging`] emoji set
//! - **Persistence**: [`VaultStorage`] snapshot/restore through [`Stateful`]
//!
//! ## Architecture Role
//!
//! ```text
//! deposit ─► idle ─► deposit_to_strategy / deposit_and_deploy ─► strategies
//!   ▲                                                                │
//!   └── withdraw ◄── idle ◄── withdraw_from_strategy / rebalance ◄───┘
//!                              (fee on yield only → treasury)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use router_config::VaultConfig;
//! use router_types::{Address, AssetId, ManualClock};
//! use vault_engine::sim::{LedgerTreasury, SimulatedStrategy};
//! use vault_engine::VaultEngine;
//!
//! let owner = Address::from_low_u64(1);
//! let mut vault = VaultEngine::new(
//!     owner,
//!     &VaultConfig::default(),
//!     Arc::new(ManualClock::new(0)),
//!     Arc::new(LedgerTreasury::new(Address::from_low_u64(2))),
//! )?;
//! let usdc = AssetId::from_low_u64(10);
//! let pair = vault.add_pair(owner, usdc, usdc)?;
//! vault.add_strategy(owner, pair, Arc::new(SimulatedStrategy::new("lending", 450)))?;
//!
//! let receipt = vault.deposit_and_deploy(owner, pair, 1_000, 50)?;
//! assert_eq!(receipt.shares, 1_000);
//! assert_eq!(vault.vault_value(pair)?, 1_000);
//! # Ok::<(), vault_engine::VaultError>(())
//! ```

#[macro_use]
pub mod logging;

pub mod access;
pub mod adapters;
pub mod automation;
pub mod deposit;
pub mod engine;
pub mod errors;
pub mod events;
pub mod fees;
pub mod flash_boost;
pub mod ledger;
pub mod rebalance;
pub mod registry;
pub mod shares;
pub mod sim;
pub mod storage;

pub use adapters::{StrategyAdapter, SwapVenue, Treasury};
pub use automation::{UpkeepAction, UpkeepPayload};
pub use deposit::{DepositOptions, DepositReceipt, WithdrawReceipt};
pub use engine::{PairSnapshot, StrategySnapshot, VaultEngine, DEFAULT_VAULT_ADDRESS};
pub use errors::{StateError, StrategyError, SwapError, VaultError, VaultResult};
pub use events::{EventSink, RecordingSink, TracingSink};
pub use fees::Skim;
pub use flash_boost::BoostSettlement;
pub use ledger::IdleBalances;
pub use rebalance::{
    ApyHysteresisPolicy, RebalanceContext, RebalanceOutcome, RebalancePlan, RebalancePolicy,
    StrategyView,
};
pub use registry::StrategyRegistry;
pub use storage::{FlashBoostState, PairRecord, Stateful, VaultStorage, SCHEMA_VERSION};
