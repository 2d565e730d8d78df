//! Token ledger state machine
//!
//! This module is the bookkeeping core: balances, allowances, total supply,
//! the two one-way latches, and the two-phase ownership handoff. Every
//! operation validates fully against current state before mutating anything,
//! so a returned error guarantees no state change. Successful operations
//! return the records they emit, in emission order.
//!
//! # Invariants
//!
//! - Conservation: Σ(balances) == total_supply <= cap at all times
//! - No wrap-around: every arithmetic step is checked
//! - Latches only move forward: Open → Finished, Frozen → Enabled
//! - Owner is never the zero address; candidate is cleared on acceptance

use crate::{
    error::{Error, Result},
    types::{Address, TokenRecord},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minting latch, monotone Open → Finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MintingPhase {
    /// Mint and burn are available to the owner
    Open,
    /// Mint and burn are permanently disabled
    Finished,
}

/// Global transfer latch, monotone Frozen → Enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferPhase {
    /// Only the owner may move its own funds
    Frozen,
    /// Anyone may move their funds
    Enabled,
}

/// A single mutating operation against the ledger
///
/// The caller identity travels separately: the host authenticates callers
/// and the state machine only checks them against its authorization state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOp {
    /// Propose a new owner candidate (phase one of the handoff)
    TransferOwnership {
        /// Proposed owner
        candidate: Address,
    },
    /// Confirm a proposed handoff (phase two, called by the candidate)
    AcceptOwnership,
    /// Create tokens for a recipient
    Mint {
        /// Recipient account
        to: Address,
        /// Amount to mint
        amount: u64,
    },
    /// Permanently disable mint and burn
    FinishMinting,
    /// Destroy tokens from a holder's balance
    Burn {
        /// Holder account
        from: Address,
        /// Amount to burn
        amount: u64,
    },
    /// Enable transfers for everyone
    EnableTransfers,
    /// Move the caller's own funds
    Transfer {
        /// Destination account
        to: Address,
        /// Amount to move
        amount: u64,
    },
    /// Set an allowance from zero (or back to zero)
    Approve {
        /// Authorized spender
        spender: Address,
        /// Absolute allowance
        amount: u64,
    },
    /// Raise an existing allowance
    IncreaseAllowance {
        /// Authorized spender
        spender: Address,
        /// Amount to add
        delta: u64,
    },
    /// Lower an existing allowance
    DecreaseAllowance {
        /// Authorized spender
        spender: Address,
        /// Amount to subtract
        delta: u64,
    },
    /// Move funds out of another account against an allowance
    TransferFrom {
        /// Source account
        from: Address,
        /// Destination account
        to: Address,
        /// Amount to move
        amount: u64,
    },
}

/// Complete ledger state
///
/// BTreeMap keeps snapshot bytes deterministic under bincode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    owner: Address,
    new_owner_candidate: Option<Address>,
    cap: u64,
    total_supply: u64,
    minting: MintingPhase,
    transfers: TransferPhase,
    balances: BTreeMap<Address, u64>,
    allowances: BTreeMap<(Address, Address), u64>,
}

impl TokenState {
    /// Create the genesis state: supply zero, both latches unset
    pub fn new(owner: Address, cap: u64) -> Result<Self> {
        if owner.is_zero() {
            return Err(Error::InvalidArgument(
                "owner must not be the zero address".to_string(),
            ));
        }

        Ok(Self {
            owner,
            new_owner_candidate: None,
            cap,
            total_supply: 0,
            minting: MintingPhase::Open,
            transfers: TransferPhase::Frozen,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        })
    }

    // Queries

    /// Current owner
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Pending owner candidate, if a handoff is in progress
    pub fn new_owner_candidate(&self) -> Option<Address> {
        self.new_owner_candidate
    }

    /// Immutable supply cap
    pub fn cap(&self) -> u64 {
        self.cap
    }

    /// Current total supply
    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    /// Balance of an account (zero if never credited)
    pub fn balance_of(&self, account: Address) -> u64 {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    /// Allowance granted by `owner` to `spender` (zero if never approved)
    pub fn allowance(&self, owner: Address, spender: Address) -> u64 {
        self.allowances.get(&(owner, spender)).copied().unwrap_or(0)
    }

    /// Whether the minting-finished latch is set
    pub fn minting_finished(&self) -> bool {
        self.minting == MintingPhase::Finished
    }

    /// Whether the transfers-enabled latch is set
    pub fn allow_transfers(&self) -> bool {
        self.transfers == TransferPhase::Enabled
    }

    // Operations

    /// Dispatch a single operation on behalf of `caller`
    pub fn execute(&mut self, caller: Address, op: TokenOp) -> Result<Vec<TokenRecord>> {
        match op {
            TokenOp::TransferOwnership { candidate } => self.transfer_ownership(caller, candidate),
            TokenOp::AcceptOwnership => self.accept_ownership(caller),
            TokenOp::Mint { to, amount } => self.mint(caller, to, amount),
            TokenOp::FinishMinting => self.finish_minting(caller),
            TokenOp::Burn { from, amount } => self.burn(caller, from, amount),
            TokenOp::EnableTransfers => self.enable_transfers(caller),
            TokenOp::Transfer { to, amount } => self.transfer(caller, to, amount),
            TokenOp::Approve { spender, amount } => self.approve(caller, spender, amount),
            TokenOp::IncreaseAllowance { spender, delta } => {
                self.increase_allowance(caller, spender, delta)
            }
            TokenOp::DecreaseAllowance { spender, delta } => {
                self.decrease_allowance(caller, spender, delta)
            }
            TokenOp::TransferFrom { from, to, amount } => {
                self.transfer_from(caller, from, to, amount)
            }
        }
    }

    /// Propose a new owner candidate; the owner is unchanged until acceptance
    ///
    /// Re-proposing overwrites the pending candidate. No record is emitted.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        candidate: Address,
    ) -> Result<Vec<TokenRecord>> {
        self.require_owner(caller)?;
        if candidate.is_zero() {
            return Err(Error::InvalidArgument(
                "ownership candidate must not be the zero address".to_string(),
            ));
        }

        self.new_owner_candidate = Some(candidate);
        Ok(Vec::new())
    }

    /// Commit a pending handoff; only the candidate may call this
    pub fn accept_ownership(&mut self, caller: Address) -> Result<Vec<TokenRecord>> {
        match self.new_owner_candidate {
            Some(candidate) if candidate == caller => {
                let previous = self.owner;
                self.owner = candidate;
                self.new_owner_candidate = None;
                Ok(vec![TokenRecord::OwnerUpdate {
                    previous,
                    current: candidate,
                }])
            }
            _ => Err(Error::Unauthorized(
                "caller is not the pending owner candidate".to_string(),
            )),
        }
    }

    /// Mint `amount` tokens for `to`
    ///
    /// Preconditions in order, first failure wins: owner, minting open,
    /// non-zero recipient, cap.
    pub fn mint(&mut self, caller: Address, to: Address, amount: u64) -> Result<Vec<TokenRecord>> {
        self.require_owner(caller)?;
        self.require_minting_open()?;
        if to.is_zero() {
            return Err(Error::InvalidArgument(
                "mint recipient must not be the zero address".to_string(),
            ));
        }
        // total_supply <= cap is an invariant, so the subtraction is safe;
        // an amount that would overflow u64 necessarily exceeds the cap too.
        if amount > self.cap - self.total_supply {
            return Err(Error::CapExceeded {
                supply: self.total_supply,
                amount,
                cap: self.cap,
            });
        }
        let new_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(Error::Overflow)?;

        self.set_balance(to, new_balance);
        self.total_supply = new_supply;

        Ok(vec![
            TokenRecord::Mint { to, amount },
            TokenRecord::Transfer {
                from: Address::ZERO,
                to,
                amount,
            },
        ])
    }

    /// Set the minting-finished latch; repeats are rejected, never silent
    pub fn finish_minting(&mut self, caller: Address) -> Result<Vec<TokenRecord>> {
        self.require_owner(caller)?;
        if self.minting == MintingPhase::Finished {
            return Err(Error::AlreadyFinalized);
        }

        self.minting = MintingPhase::Finished;
        Ok(vec![TokenRecord::MintFinished])
    }

    /// Burn `amount` tokens from `from`'s balance
    ///
    /// Burn authority is the owner, not the holder, and burn is disabled
    /// once minting is finished.
    pub fn burn(&mut self, caller: Address, from: Address, amount: u64) -> Result<Vec<TokenRecord>> {
        self.require_owner(caller)?;
        self.require_minting_open()?;
        let balance = self.balance_of(from);
        let new_balance = balance
            .checked_sub(amount)
            .ok_or(Error::InsufficientBalance {
                have: balance,
                need: amount,
            })?;
        let new_supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or(Error::Underflow)?;

        self.set_balance(from, new_balance);
        self.total_supply = new_supply;

        Ok(vec![
            TokenRecord::Burn { from, amount },
            TokenRecord::Transfer {
                from,
                to: Address::ZERO,
                amount,
            },
        ])
    }

    /// Set the transfers-enabled latch
    ///
    /// Repeats are accepted as a no-op re-assertion and emit another record.
    pub fn enable_transfers(&mut self, caller: Address) -> Result<Vec<TokenRecord>> {
        self.require_owner(caller)?;

        self.transfers = TransferPhase::Enabled;
        Ok(vec![TokenRecord::TransfersEnabled])
    }

    /// Move `amount` of the caller's own funds to `to`
    pub fn transfer(&mut self, caller: Address, to: Address, amount: u64) -> Result<Vec<TokenRecord>> {
        self.require_valid_endpoints(caller, to)?;
        self.require_movable(caller)?;

        self.move_balance(caller, to, amount)?;

        Ok(vec![TokenRecord::Transfer {
            from: caller,
            to,
            amount,
        }])
    }

    /// Set the allowance for `spender` over the caller's funds
    ///
    /// The existing allowance must be zero unless the new amount is zero.
    /// Raising a live allowance goes through `increase_allowance` instead,
    /// which closes the read-then-approve race.
    pub fn approve(
        &mut self,
        caller: Address,
        spender: Address,
        amount: u64,
    ) -> Result<Vec<TokenRecord>> {
        if spender.is_zero() {
            return Err(Error::InvalidArgument(
                "approval spender must not be the zero address".to_string(),
            ));
        }
        let existing = self.allowance(caller, spender);
        if existing != 0 && amount != 0 {
            return Err(Error::AllowanceNotZero(existing));
        }

        self.set_allowance(caller, spender, amount);

        Ok(vec![TokenRecord::Approval {
            owner: caller,
            spender,
            amount,
        }])
    }

    /// Raise the allowance for `spender` by `delta`
    pub fn increase_allowance(
        &mut self,
        caller: Address,
        spender: Address,
        delta: u64,
    ) -> Result<Vec<TokenRecord>> {
        if spender.is_zero() {
            return Err(Error::InvalidArgument(
                "approval spender must not be the zero address".to_string(),
            ));
        }
        let new_amount = self
            .allowance(caller, spender)
            .checked_add(delta)
            .ok_or(Error::Overflow)?;

        self.set_allowance(caller, spender, new_amount);

        Ok(vec![TokenRecord::Approval {
            owner: caller,
            spender,
            amount: new_amount,
        }])
    }

    /// Lower the allowance for `spender` by `delta`; underflow hard-fails
    pub fn decrease_allowance(
        &mut self,
        caller: Address,
        spender: Address,
        delta: u64,
    ) -> Result<Vec<TokenRecord>> {
        if spender.is_zero() {
            return Err(Error::InvalidArgument(
                "approval spender must not be the zero address".to_string(),
            ));
        }
        let existing = self.allowance(caller, spender);
        let new_amount = existing
            .checked_sub(delta)
            .ok_or(Error::InsufficientAllowance {
                have: existing,
                need: delta,
            })?;

        self.set_allowance(caller, spender, new_amount);

        Ok(vec![TokenRecord::Approval {
            owner: caller,
            spender,
            amount: new_amount,
        }])
    }

    /// Move `amount` from `from` to `to` against the caller's allowance
    ///
    /// While transfers are frozen the gate applies to the `from` account:
    /// only the owner's funds may move, regardless of who the caller is.
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Result<Vec<TokenRecord>> {
        self.require_valid_endpoints(from, to)?;
        self.require_movable(from)?;

        let allowed = self.allowance(from, caller);
        let remaining = allowed
            .checked_sub(amount)
            .ok_or(Error::InsufficientAllowance {
                have: allowed,
                need: amount,
            })?;

        self.move_balance(from, to, amount)?;
        self.set_allowance(from, caller, remaining);

        Ok(vec![TokenRecord::Transfer { from, to, amount }])
    }

    // Internal helpers

    fn require_owner(&self, caller: Address) -> Result<()> {
        if caller != self.owner {
            return Err(Error::Unauthorized(format!(
                "caller {} is not the owner",
                caller
            )));
        }
        Ok(())
    }

    fn require_minting_open(&self) -> Result<()> {
        if self.minting == MintingPhase::Finished {
            return Err(Error::Finalized);
        }
        Ok(())
    }

    /// Both endpoints of a transfer must be non-zero addresses
    fn require_valid_endpoints(&self, from: Address, to: Address) -> Result<()> {
        if from.is_zero() {
            return Err(Error::InvalidArgument(
                "transfer source must not be the zero address".to_string(),
            ));
        }
        if to.is_zero() {
            return Err(Error::InvalidArgument(
                "transfer destination must not be the zero address".to_string(),
            ));
        }
        Ok(())
    }

    /// While frozen, only the owner's funds may move
    fn require_movable(&self, from: Address) -> Result<()> {
        if self.transfers == TransferPhase::Frozen && from != self.owner {
            return Err(Error::TransfersDisabled);
        }
        Ok(())
    }

    /// Debit `from`, credit `to`; total supply is untouched (conservation)
    fn move_balance(&mut self, from: Address, to: Address, amount: u64) -> Result<()> {
        let from_balance = self.balance_of(from);
        let new_from = from_balance
            .checked_sub(amount)
            .ok_or(Error::InsufficientBalance {
                have: from_balance,
                need: amount,
            })?;

        if from == to {
            return Ok(());
        }

        // Balances are bounded by total_supply <= cap, so the credit side
        // cannot overflow once the debit side succeeded.
        let new_to = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;

        self.set_balance(from, new_from);
        self.set_balance(to, new_to);
        Ok(())
    }

    fn set_balance(&mut self, account: Address, amount: u64) {
        if amount == 0 {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, amount);
        }
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, amount: u64) {
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    /// Sum of all balances; equals total_supply by the conservation invariant
    pub fn balances_total(&self) -> u64 {
        self.balances.values().sum()
    }
}
