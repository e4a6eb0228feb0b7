//! Value movement between accounts.
//!
//! The ledger never touches balances directly. It asks a [`ValueTransferService`]
//! to move funds while it still holds the item lock, and only commits the state
//! change if the transfer succeeded.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use supplychain_core::{AccountId, DomainError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("insufficient funds in {account}: available {available}, required {required}")]
    InsufficientFunds {
        account: AccountId,
        available: u64,
        required: u64,
    },

    #[error("balance of {account} would overflow")]
    BalanceOverflow { account: AccountId },

    #[error("transfer service unavailable: {0}")]
    Unavailable(String),
}

impl From<TransferError> for DomainError {
    fn from(value: TransferError) -> Self {
        DomainError::transfer_failed(value.to_string())
    }
}

/// Moves value between accounts, all-or-nothing.
pub trait ValueTransferService: Send + Sync {
    /// Move `amount` from `from` to `to`. On error no balance has changed.
    fn transfer(&self, from: AccountId, to: AccountId, amount: u64) -> Result<(), TransferError>;
}

impl<T> ValueTransferService for Arc<T>
where
    T: ValueTransferService + ?Sized,
{
    fn transfer(&self, from: AccountId, to: AccountId, amount: u64) -> Result<(), TransferError> {
        (**self).transfer(from, to, amount)
    }
}

/// In-memory account book.
///
/// Unknown accounts have a balance of zero.
#[derive(Debug, Default)]
pub struct InMemoryAccounts {
    balances: Mutex<HashMap<AccountId, u64>>,
}

impl InMemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` to `account`, returning the new balance.
    pub fn deposit(&self, account: AccountId, amount: u64) -> Result<u64, TransferError> {
        let mut balances = self.lock()?;
        let balance = balances.entry(account).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(TransferError::BalanceOverflow { account })?;
        Ok(*balance)
    }

    /// Current balance of `account`; zero for accounts never credited.
    pub fn balance_of(&self, account: AccountId) -> Result<u64, TransferError> {
        Ok(self.lock()?.get(&account).copied().unwrap_or(0))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<AccountId, u64>>, TransferError> {
        self.balances
            .lock()
            .map_err(|_| TransferError::Unavailable("account book lock poisoned".to_string()))
    }
}

impl ValueTransferService for InMemoryAccounts {
    fn transfer(&self, from: AccountId, to: AccountId, amount: u64) -> Result<(), TransferError> {
        let mut balances = self.lock()?;

        let available = balances.get(&from).copied().unwrap_or(0);
        if available < amount {
            return Err(TransferError::InsufficientFunds {
                account: from,
                available,
                required: amount,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }

        let credited = balances
            .get(&to)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(TransferError::BalanceOverflow { account: to })?;

        balances.insert(from, available - amount);
        balances.insert(to, credited);

        tracing::debug!(%from, %to, amount, "transferred value");
        Ok(())
    }
}
