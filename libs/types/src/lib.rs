//! # Yield Router Shared Types
//!
//! Common vocabulary for every crate in the yield router workspace.
//!
//! ## Design Philosophy
//!
//! - **Typed Identifiers**: pairs, strategies, accounts and assets are distinct
//!   newtypes so a `PairId` can never be passed where a `StrategyId` is expected
//! - **Integer Amounts**: all value is carried as [`Amount`] (`u128` base units),
//!   rounding is always explicit and always downwards
//! - **Serializable Events**: every notification the vault emits is a
//!   [`VaultEvent`] that round-trips through serde for sinks and logs
//! - **Injectable Time**: engine code never reads the wall clock directly, it
//!   asks a [`Clock`] so automation gates can be tested deterministically
//!
//! ## Quick Start
//!
//! ```rust
//! use router_types::{Address, AssetId, PairId, VaultEvent};
//!
//! let usdc = AssetId::from_low_u64(1);
//! let user = Address::from_low_u64(42);
//! let event = VaultEvent::XpUpdated {
//!     pair: PairId::new(0),
//!     account: user,
//!     shares: 1_000,
//!     total_shares: 1_000,
//! };
//! assert_eq!(event.name(), "XPUpdated");
//! # let _ = usdc;
//! ```

pub mod clock;
pub mod errors;
pub mod events;
pub mod ids;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::IdParseError;
pub use events::VaultEvent;
pub use ids::{Address, AssetId, PairId, StrategyId};

/// Base-unit amount of pooled value (token smallest units).
pub type Amount = u128;

/// Basis points, 10_000 = 100%.
pub type Bps = u32;

/// Denominator for all basis-point arithmetic.
pub const BPS_DENOMINATOR: u128 = 10_000;
