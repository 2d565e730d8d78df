//! Actor-based concurrency for the ledger
//!
//! The execution environment must impose a total order over mutating calls.
//! This module implements that boundary with the single-writer pattern using
//! Tokio actors: one task owns the `TokenState`, callers talk to it through
//! a bounded mailbox, and each message is handled to completion before the
//! next one starts. Under true parallelism every operation is still one
//! atomic step.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends messages to actor mailbox               │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │   validate → stage on a copy → Storage::commit()      │
//! │   → swap in the staged state → answer the caller      │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::{
    metrics::Metrics,
    state::{TokenOp, TokenState},
    types::{Address, SequencedRecord},
    Error, Result, Storage,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Read-only view of the scalar ledger state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSummary {
    /// Current owner
    pub owner: Address,
    /// Pending owner candidate
    pub new_owner_candidate: Option<Address>,
    /// Immutable supply cap
    pub cap: u64,
    /// Current total supply
    pub total_supply: u64,
    /// Minting-finished latch
    pub minting_finished: bool,
    /// Transfers-enabled latch
    pub transfers_enabled: bool,
}

/// Message sent to the ledger actor
pub enum LedgerMessage {
    /// Execute a mutating operation on behalf of a caller
    Apply {
        /// Authenticated caller identity
        caller: Address,
        /// Operation to execute
        op: TokenOp,
        /// Emitted records on success
        response: oneshot::Sender<Result<Vec<SequencedRecord>>>,
    },

    /// Get the balance of an account
    BalanceOf {
        /// Queried account
        account: Address,
        /// Balance (zero if never credited)
        response: oneshot::Sender<u64>,
    },

    /// Get an allowance
    Allowance {
        /// Account whose funds may be spent
        owner: Address,
        /// Authorized spender
        spender: Address,
        /// Allowance (zero if never approved)
        response: oneshot::Sender<u64>,
    },

    /// Get the scalar state view
    Summary {
        /// Current summary
        response: oneshot::Sender<LedgerSummary>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns the token state and processes messages serially
pub struct LedgerActor {
    /// The single authoritative state
    state: TokenState,

    /// Storage backend
    storage: Arc<Storage>,

    /// Metrics collector
    metrics: Metrics,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(
        state: TokenState,
        storage: Arc<Storage>,
        metrics: Metrics,
        mailbox: mpsc::Receiver<LedgerMessage>,
    ) -> Self {
        Self {
            state,
            storage,
            metrics,
            mailbox,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                LedgerMessage::Shutdown => break,
                msg => self.handle_message(msg),
            }
        }

        tracing::info!("Ledger actor stopped");
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::Apply {
                caller,
                op,
                response,
            } => {
                let _ = response.send(self.apply(caller, op));
            }

            LedgerMessage::BalanceOf { account, response } => {
                let _ = response.send(self.state.balance_of(account));
            }

            LedgerMessage::Allowance {
                owner,
                spender,
                response,
            } => {
                let _ = response.send(self.state.allowance(owner, spender));
            }

            LedgerMessage::Summary { response } => {
                let _ = response.send(LedgerSummary {
                    owner: self.state.owner(),
                    new_owner_candidate: self.state.new_owner_candidate(),
                    cap: self.state.cap(),
                    total_supply: self.state.total_supply(),
                    minting_finished: self.state.minting_finished(),
                    transfers_enabled: self.state.allow_transfers(),
                });
            }

            LedgerMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    /// Execute one operation all-or-nothing
    ///
    /// The transition is staged on a copy of the state so that a failed
    /// storage commit leaves memory and disk in agreement.
    fn apply(&mut self, caller: Address, op: TokenOp) -> Result<Vec<SequencedRecord>> {
        let mut staged = self.state.clone();

        let records = match staged.execute(caller, op) {
            Ok(records) => records,
            Err(e) => {
                self.metrics.record_rejection();
                tracing::debug!(caller = %caller, error = %e, "Operation rejected");
                return Err(e);
            }
        };

        let sequenced = self.storage.commit(&staged, &records)?;
        self.state = staged;
        self.metrics
            .record_commit(&records, self.state.total_supply());

        Ok(sequenced)
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    /// Execute a mutating operation
    pub async fn apply(&self, caller: Address, op: TokenOp) -> Result<Vec<SequencedRecord>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::Apply {
                caller,
                op,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Get the balance of an account
    pub async fn balance_of(&self, account: Address) -> Result<u64> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::BalanceOf {
                account,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Get an allowance
    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<u64> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::Allowance {
                owner,
                spender,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Get the scalar state view
    pub async fn summary(&self) -> Result<LedgerSummary> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::Summary { response: tx })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(
    state: TokenState,
    storage: Arc<Storage>,
    metrics: Metrics,
) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(1000); // Bounded channel for backpressure
    let actor = LedgerActor::new(state, storage, metrics, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}
