//! Error types for the token ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
///
/// Domain rejections and infrastructure failures share one enum: every
/// failing operation aborts atomically and surfaces exactly one of these.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller lacks the required privilege
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Zero/invalid account or malformed input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation blocked by the minting-finished latch
    #[error("Minting is finished")]
    Finalized,

    /// Redundant finalize attempt
    #[error("Minting is already finished")]
    AlreadyFinalized,

    /// Mint would push total supply over the cap
    #[error("Cap exceeded: supply {supply} + amount {amount} > cap {cap}")]
    CapExceeded {
        /// Current total supply
        supply: u64,
        /// Requested mint amount
        amount: u64,
        /// Immutable supply cap
        cap: u64,
    },

    /// Arithmetic would leave the unsigned integer domain (high side)
    #[error("Arithmetic overflow")]
    Overflow,

    /// Arithmetic would leave the unsigned integer domain (low side)
    #[error("Arithmetic underflow")]
    Underflow,

    /// Sender balance is smaller than the requested amount
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance {
        /// Current balance
        have: u64,
        /// Requested amount
        need: u64,
    },

    /// Allowance is smaller than the requested amount
    #[error("Insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance {
        /// Current allowance
        have: u64,
        /// Requested amount
        need: u64,
    },

    /// Approval requested while the existing allowance is non-zero
    #[error("Allowance not zero: reset the existing allowance of {0} first")]
    AllowanceNotZero(u64),

    /// Transfers are globally disabled and the mover is not the owner
    #[error("Transfers are disabled")]
    TransfersDisabled,

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
