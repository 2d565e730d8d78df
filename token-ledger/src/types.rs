//! Core types for the token ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Wrap-free arithmetic (u64 amounts with checked operations)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of an account address in bytes
pub const ADDRESS_LEN: usize = 20;

/// Opaque fixed-width account address
///
/// The all-zero address is reserved: it is rejected as a transfer source or
/// destination, mint recipient, approval spender, and ownership candidate.
/// Mint and burn records use it as the null counterparty.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The reserved all-zero address
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// Create from raw bytes
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Whether this is the reserved all-zero address
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Parse from a hex string, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.len() != ADDRESS_LEN * 2 {
            return None;
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Structured record emitted by a successful mutation
///
/// Record order within one operation is contractual: mint emits `Mint` then
/// `Transfer` from the zero address, burn emits `Burn` then `Transfer` to the
/// zero address. Downstream observers rely on uniform `Transfer` handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenRecord {
    /// Tokens created for a recipient
    Mint {
        /// Recipient of the minted tokens
        to: Address,
        /// Amount minted
        amount: u64,
    },

    /// Tokens destroyed from a holder's balance
    Burn {
        /// Holder whose balance was reduced
        from: Address,
        /// Amount burned
        amount: u64,
    },

    /// Tokens moved between accounts
    ///
    /// `from == Address::ZERO` marks a mint, `to == Address::ZERO` a burn.
    Transfer {
        /// Source account (zero for mint)
        from: Address,
        /// Destination account (zero for burn)
        to: Address,
        /// Amount moved
        amount: u64,
    },

    /// Allowance set to a new absolute value
    Approval {
        /// Account whose funds may be spent
        owner: Address,
        /// Account authorized to spend
        spender: Address,
        /// Resulting absolute allowance
        amount: u64,
    },

    /// Ownership changed after a two-phase handoff
    OwnerUpdate {
        /// Previous owner
        previous: Address,
        /// New owner
        current: Address,
    },

    /// The minting-finished latch was set
    MintFinished,

    /// The transfers-enabled latch was set (or re-asserted)
    TransfersEnabled,
}

/// Record as persisted in the append-only log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencedRecord {
    /// Position in the log, starting at 0, gapless
    pub sequence: u64,

    /// The emitted record
    pub record: TokenRecord,

    /// Commit timestamp
    pub emitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[ADDRESS_LEN - 1] = last;
        Address::from_bytes(bytes)
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert!(!addr(1).is_zero());
    }

    #[test]
    fn test_address_hex_round_trip() {
        let address = addr(0xab);
        let parsed = Address::from_hex(&address.to_string()).unwrap();
        assert_eq!(parsed, address);
    }

    #[test]
    fn test_address_hex_rejects_bad_input() {
        assert!(Address::from_hex("0x1234").is_none());
        assert!(Address::from_hex(&"zz".repeat(ADDRESS_LEN)).is_none());
    }

    #[test]
    fn test_address_display_has_prefix() {
        let rendered = addr(7).to_string();
        assert!(rendered.starts_with("0x"));
        assert_eq!(rendered.len(), 2 + ADDRESS_LEN * 2);
    }
}
