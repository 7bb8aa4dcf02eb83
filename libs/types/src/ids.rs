//! Typed identifiers for accounts, assets, pairs and strategies
//!
//! Accounts and assets are 20-byte addresses rendered as `0x`-prefixed hex.
//! Pairs and strategies are dense numeric handles allocated by the vault.

use crate::errors::IdParseError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Define a 20-byte address newtype with hex display and parsing
macro_rules! define_address_type {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        pub struct $name(pub [u8; 20]);

        impl $name {
            /// The all-zero address
            pub const ZERO: Self = Self([0u8; 20]);

            #[inline(always)]
            pub const fn new(bytes: [u8; 20]) -> Self {
                Self(bytes)
            }

            /// Build an address whose trailing 8 bytes hold `value` (big-endian).
            /// Handy for fixtures and simulations.
            pub fn from_low_u64(value: u64) -> Self {
                let mut bytes = [0u8; 20];
                bytes[12..].copy_from_slice(&value.to_be_bytes());
                Self(bytes)
            }

            #[inline(always)]
            pub fn as_bytes(&self) -> &[u8; 20] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 20]
            }

            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "0x")?;
                for byte in &self.0 {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let clean = s.strip_prefix("0x").unwrap_or(s);
                let raw = hex::decode(clean).map_err(|e| IdParseError::InvalidHex(e.to_string()))?;
                let bytes: [u8; 20] = raw.as_slice().try_into().map_err(|_| {
                    IdParseError::InvalidLength {
                        expected: 20,
                        actual: raw.len(),
                    }
                })?;
                Ok(Self(bytes))
            }
        }

        impl From<[u8; 20]> for $name {
            fn from(bytes: [u8; 20]) -> Self {
                Self(bytes)
            }
        }
    };
}

/// Define a dense numeric handle
macro_rules! define_numeric_id {
    (
        $(#[$meta:meta])*
        $name:ident, $inner:ty
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        pub struct $name(pub $inner);

        impl $name {
            #[inline(always)]
            pub const fn new(id: $inner) -> Self {
                Self(id)
            }

            #[inline(always)]
            pub const fn inner(&self) -> $inner {
                self.0
            }

            /// Generate next sequential id
            #[inline(always)]
            pub fn next(&self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(id: $inner) -> Self {
                Self(id)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> $inner {
                id.0
            }
        }
    };
}

define_address_type!(
    /// Account that calls into the vault (users, owner, keepers)
    Address
);

define_address_type!(
    /// Underlying value type (token) held by a pair
    AssetId
);

define_numeric_id!(
    /// Pooled vault handle, allocated sequentially from zero
    PairId, u64
);

define_numeric_id!(
    /// Stable handle into the strategy arena
    StrategyId, u32
);

impl StrategyId {
    /// Arena slot for this handle
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}
