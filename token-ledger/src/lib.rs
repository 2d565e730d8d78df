//! GreenLedger Token Ledger
//!
//! Fungible-token ledger with owner-gated supply control: balances,
//! delegated-spending allowances, a capped mutable supply, one-way
//! minting-finished and transfers-enabled latches, and a two-phase
//! ownership handoff gating every privileged operation.
//!
//! # Architecture
//!
//! - **Pure state machine**: all transitions validate fully before mutating
//! - **Single Writer**: one actor task serializes every mutation
//! - **Record log**: each commit appends ordered records for observers
//! - **Durable snapshots**: state and log persist in RocksDB across restarts
//!
//! # Invariants
//!
//! - Conservation: Σ(balances) == total_supply <= cap for all time
//! - No wrap-around: checked arithmetic everywhere, failures are typed
//! - Latches are monotone: Open → Finished, Frozen → Enabled, never back
//! - Atomicity: a failed operation leaves no observable state change

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod state;
pub mod storage;
pub mod types;

// Re-exports
pub use actor::{LedgerHandle, LedgerSummary};
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::TokenLedger;
pub use state::{MintingPhase, TokenOp, TokenState, TransferPhase};
pub use storage::Storage;
pub use types::{Address, SequencedRecord, TokenRecord};
