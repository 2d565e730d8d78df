//! Main ledger orchestration layer
//!
//! This module ties together storage, the state machine, and the actor into
//! a high-level API. Callers are identified by address on every mutating
//! call; the host transport is expected to have authenticated them.
//!
//! # Example
//!
//! ```no_run
//! use token_ledger::{Config, TokenLedger};
//!
//! #[tokio::main]
//! async fn main() -> token_ledger::Result<()> {
//!     let config = Config::default();
//!     let owner = config.genesis.owner_address()?;
//!     let ledger = TokenLedger::open(config).await?;
//!
//!     ledger.mint(owner, owner, 1_000).await?;
//!     assert_eq!(ledger.balance_of(owner).await?, 1_000);
//!
//!     ledger.shutdown().await?;
//!     Ok(())
//! }
//! ```

use crate::{
    actor::{spawn_ledger_actor, LedgerHandle, LedgerSummary},
    metrics::Metrics,
    state::{TokenOp, TokenState},
    types::{Address, SequencedRecord},
    Config, Result, Storage,
};
use std::sync::Arc;

/// Main ledger interface
pub struct TokenLedger {
    /// Actor handle for serialized mutations and state queries
    handle: LedgerHandle,

    /// Direct storage access (for record-log reads)
    storage: Arc<Storage>,

    /// Metrics collector
    metrics: Metrics,
}

impl TokenLedger {
    /// Open the ledger with configuration
    ///
    /// Restores the persisted state if the data dir holds one, otherwise
    /// creates the genesis state from the config's cap and owner.
    pub async fn open(config: Config) -> Result<Self> {
        let storage = Arc::new(Storage::open(&config)?);

        let state = match storage.load_state()? {
            Some(state) => {
                tracing::info!(
                    owner = %state.owner(),
                    total_supply = state.total_supply(),
                    "Restored ledger state"
                );
                state
            }
            None => {
                let state = TokenState::new(config.genesis.owner_address()?, config.genesis.cap)?;
                storage.init_state(&state)?;
                state
            }
        };

        let metrics = Metrics::new()
            .map_err(|e| crate::Error::Config(format!("metrics registry: {}", e)))?;
        metrics.total_supply.set(state.total_supply() as i64);

        let handle = spawn_ledger_actor(state, storage.clone(), metrics.clone());

        Ok(Self {
            handle,
            storage,
            metrics,
        })
    }

    // Mutations (full contracts on TokenState)

    /// Propose `candidate` as the next owner
    pub async fn transfer_ownership(
        &self,
        caller: Address,
        candidate: Address,
    ) -> Result<Vec<SequencedRecord>> {
        self.handle
            .apply(caller, TokenOp::TransferOwnership { candidate })
            .await
    }

    /// Accept a pending ownership handoff
    pub async fn accept_ownership(&self, caller: Address) -> Result<Vec<SequencedRecord>> {
        self.handle.apply(caller, TokenOp::AcceptOwnership).await
    }

    /// Mint `amount` tokens for `to`
    pub async fn mint(
        &self,
        caller: Address,
        to: Address,
        amount: u64,
    ) -> Result<Vec<SequencedRecord>> {
        self.handle
            .apply(caller, TokenOp::Mint { to, amount })
            .await
    }

    /// Permanently disable mint and burn
    pub async fn finish_minting(&self, caller: Address) -> Result<Vec<SequencedRecord>> {
        self.handle.apply(caller, TokenOp::FinishMinting).await
    }

    /// Burn `amount` tokens from `from`
    pub async fn burn(
        &self,
        caller: Address,
        from: Address,
        amount: u64,
    ) -> Result<Vec<SequencedRecord>> {
        self.handle
            .apply(caller, TokenOp::Burn { from, amount })
            .await
    }

    /// Enable transfers for everyone
    pub async fn enable_transfers(&self, caller: Address) -> Result<Vec<SequencedRecord>> {
        self.handle.apply(caller, TokenOp::EnableTransfers).await
    }

    /// Move the caller's own funds
    pub async fn transfer(
        &self,
        caller: Address,
        to: Address,
        amount: u64,
    ) -> Result<Vec<SequencedRecord>> {
        self.handle
            .apply(caller, TokenOp::Transfer { to, amount })
            .await
    }

    /// Set an allowance from zero (or back to zero)
    pub async fn approve(
        &self,
        caller: Address,
        spender: Address,
        amount: u64,
    ) -> Result<Vec<SequencedRecord>> {
        self.handle
            .apply(caller, TokenOp::Approve { spender, amount })
            .await
    }

    /// Raise an existing allowance
    pub async fn increase_allowance(
        &self,
        caller: Address,
        spender: Address,
        delta: u64,
    ) -> Result<Vec<SequencedRecord>> {
        self.handle
            .apply(caller, TokenOp::IncreaseAllowance { spender, delta })
            .await
    }

    /// Lower an existing allowance
    pub async fn decrease_allowance(
        &self,
        caller: Address,
        spender: Address,
        delta: u64,
    ) -> Result<Vec<SequencedRecord>> {
        self.handle
            .apply(caller, TokenOp::DecreaseAllowance { spender, delta })
            .await
    }

    /// Move funds out of another account against the caller's allowance
    pub async fn transfer_from(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Result<Vec<SequencedRecord>> {
        self.handle
            .apply(caller, TokenOp::TransferFrom { from, to, amount })
            .await
    }

    // Queries

    /// Balance of an account
    pub async fn balance_of(&self, account: Address) -> Result<u64> {
        self.handle.balance_of(account).await
    }

    /// Allowance granted by `owner` to `spender`
    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<u64> {
        self.handle.allowance(owner, spender).await
    }

    /// Scalar state view (owner, candidate, cap, supply, latches)
    pub async fn summary(&self) -> Result<LedgerSummary> {
        self.handle.summary().await
    }

    /// Current owner
    pub async fn owner(&self) -> Result<Address> {
        Ok(self.summary().await?.owner)
    }

    /// Pending owner candidate, if a handoff is in progress
    pub async fn new_owner_candidate(&self) -> Result<Option<Address>> {
        Ok(self.summary().await?.new_owner_candidate)
    }

    /// Immutable supply cap
    pub async fn cap(&self) -> Result<u64> {
        Ok(self.summary().await?.cap)
    }

    /// Current total supply
    pub async fn total_supply(&self) -> Result<u64> {
        Ok(self.summary().await?.total_supply)
    }

    /// Whether the minting-finished latch is set
    pub async fn minting_finished(&self) -> Result<bool> {
        Ok(self.summary().await?.minting_finished)
    }

    /// Whether the transfers-enabled latch is set
    pub async fn allow_transfers(&self) -> Result<bool> {
        Ok(self.summary().await?.transfers_enabled)
    }

    /// Replay the record log from a sequence number (inclusive)
    pub fn records_from(&self, sequence: u64) -> Result<Vec<SequencedRecord>> {
        self.storage.records_from(sequence)
    }

    /// Metrics collector (for scrape endpoints)
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Shutdown ledger
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TokenRecord, ADDRESS_LEN};
    use crate::Error;

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[ADDRESS_LEN - 1] = last;
        Address::from_bytes(bytes)
    }

    fn owner() -> Address {
        addr(1)
    }

    fn test_config(dir: &tempfile::TempDir) -> Config {
        let mut config = Config::default();
        config.data_dir = dir.path().to_path_buf();
        config.genesis.owner = owner().to_string();
        config.genesis.cap = 1_000_000;
        config
    }

    async fn create_test_ledger() -> (TokenLedger, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = test_config(&temp_dir);
        (TokenLedger::open(config).await.unwrap(), temp_dir)
    }

    #[tokio::test]
    async fn test_ledger_open() {
        let (ledger, _temp) = create_test_ledger().await;

        let summary = ledger.summary().await.unwrap();
        assert_eq!(summary.owner, owner());
        assert_eq!(summary.cap, 1_000_000);
        assert_eq!(summary.total_supply, 0);

        assert_eq!(ledger.owner().await.unwrap(), owner());
        assert_eq!(ledger.new_owner_candidate().await.unwrap(), None);
        assert!(!ledger.minting_finished().await.unwrap());
        assert!(!ledger.allow_transfers().await.unwrap());

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_mint_transfer_and_records() {
        let (ledger, _temp) = create_test_ledger().await;

        ledger.mint(owner(), owner(), 200).await.unwrap();
        ledger.enable_transfers(owner()).await.unwrap();
        ledger.transfer(owner(), addr(2), 100).await.unwrap();

        assert_eq!(ledger.balance_of(owner()).await.unwrap(), 100);
        assert_eq!(ledger.balance_of(addr(2)).await.unwrap(), 100);

        let records = ledger.records_from(0).unwrap();
        let kinds: Vec<&TokenRecord> = records.iter().map(|r| &r.record).collect();
        assert_eq!(records.len(), 4);
        assert!(matches!(kinds[0], TokenRecord::Mint { .. }));
        assert!(matches!(
            kinds[1],
            TokenRecord::Transfer { from, .. } if from.is_zero()
        ));
        assert!(matches!(kinds[2], TokenRecord::TransfersEnabled));
        assert!(matches!(kinds[3], TokenRecord::Transfer { .. }));

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_delegated_spending_round() {
        let (ledger, _temp) = create_test_ledger().await;

        ledger.mint(owner(), owner(), 200).await.unwrap();
        ledger.enable_transfers(owner()).await.unwrap();
        ledger.approve(owner(), addr(3), 50).await.unwrap();
        ledger
            .transfer_from(addr(3), owner(), addr(2), 25)
            .await
            .unwrap();

        assert_eq!(ledger.balance_of(owner()).await.unwrap(), 175);
        assert_eq!(ledger.balance_of(addr(2)).await.unwrap(), 25);
        assert_eq!(ledger.allowance(owner(), addr(3)).await.unwrap(), 25);

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_ownership_handoff() {
        let (ledger, _temp) = create_test_ledger().await;

        ledger.transfer_ownership(owner(), addr(2)).await.unwrap();
        let summary = ledger.summary().await.unwrap();
        assert_eq!(summary.owner, owner());
        assert_eq!(summary.new_owner_candidate, Some(addr(2)));

        let records = ledger.accept_ownership(addr(2)).await.unwrap();
        assert!(matches!(
            records[0].record,
            TokenRecord::OwnerUpdate { .. }
        ));

        let summary = ledger.summary().await.unwrap();
        assert_eq!(summary.owner, addr(2));
        assert_eq!(summary.new_owner_candidate, None);

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_state_restored_across_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();

        {
            let ledger = TokenLedger::open(test_config(&temp_dir)).await.unwrap();
            ledger.mint(owner(), addr(2), 400).await.unwrap();
            ledger.finish_minting(owner()).await.unwrap();
            ledger.shutdown().await.unwrap();
        }

        let ledger = TokenLedger::open(test_config(&temp_dir)).await.unwrap();
        assert_eq!(ledger.balance_of(addr(2)).await.unwrap(), 400);

        let summary = ledger.summary().await.unwrap();
        assert!(summary.minting_finished);
        assert!(matches!(
            ledger.mint(owner(), addr(2), 1).await,
            Err(Error::Finalized)
        ));

        // The record log continues where it left off
        assert_eq!(ledger.records_from(0).unwrap().len(), 3);

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_metrics_track_commits() {
        let (ledger, _temp) = create_test_ledger().await;

        ledger.mint(owner(), owner(), 100).await.unwrap();
        let _ = ledger.mint(addr(9), addr(9), 1).await;

        assert_eq!(ledger.metrics().mints_total.get(), 1);
        assert_eq!(ledger.metrics().rejected_total.get(), 1);
        assert_eq!(ledger.metrics().total_supply.get(), 100);

        ledger.shutdown().await.unwrap();
    }
}
