//! Monitored account registry
//!
//! The registry is a plain ordered collection. It is shared behind a
//! `tokio::sync::RwLock` by the [`Archiver`](crate::Archiver); the scheduler only ever
//! works on cloned snapshots, so a user removing an account while a cycle is checking it
//! simply makes the later bookkeeping calls no-ops.

use crate::error::{Error, Result};
use crate::types::{Account, AccountId, AccountStatus};
use chrono::{DateTime, Utc};

/// Ordered set of monitored accounts
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: Vec<Account>,
    next_id: u64,
}

/// Strip leading `@`s and surrounding whitespace from a user-entered handle
///
/// Returns [`Error::InvalidHandle`] when nothing is left.
pub fn normalize_handle(raw: &str) -> Result<String> {
    let handle = raw.trim().trim_start_matches('@').trim();
    if handle.is_empty() {
        return Err(Error::InvalidHandle(raw.to_string()));
    }
    Ok(handle.to_string())
}

impl AccountRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account in the Active state
    pub fn add(&mut self, raw_handle: &str) -> Result<Account> {
        let handle = normalize_handle(raw_handle)?;

        self.next_id += 1;
        let account = Account {
            id: AccountId(self.next_id),
            handle,
            status: AccountStatus::Active,
            last_checked_at: None,
            last_error: None,
            added_at: Utc::now(),
        };
        self.accounts.push(account.clone());

        tracing::debug!(account_id = %account.id, handle = %account.handle, "Account added");
        Ok(account)
    }

    /// Add every valid handle, skipping (and warning about) invalid ones
    pub fn seed<S: AsRef<str>>(&mut self, handles: &[S]) -> Vec<Account> {
        handles
            .iter()
            .filter_map(|raw| match self.add(raw.as_ref()) {
                Ok(account) => Some(account),
                Err(e) => {
                    tracing::warn!(handle = raw.as_ref(), error = %e, "Skipping configured account");
                    None
                }
            })
            .collect()
    }

    /// Remove an account; removing an unknown id is a no-op
    pub fn remove(&mut self, id: AccountId) -> Option<Account> {
        let index = self.accounts.iter().position(|a| a.id == id)?;
        Some(self.accounts.remove(index))
    }

    /// Change an account's status
    ///
    /// Setting [`AccountStatus::Active`] also clears the last recorded error.
    pub fn set_status(&mut self, id: AccountId, status: AccountStatus) -> Result<Account> {
        let account = self
            .accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(Error::AccountNotFound(id))?;

        account.status = status;
        if status == AccountStatus::Active {
            account.last_error = None;
        }
        Ok(account.clone())
    }

    /// Record that a check attempt finished; returns false if the account is gone
    pub fn mark_checked(&mut self, id: AccountId, at: DateTime<Utc>) -> bool {
        match self.find_mut(id) {
            Some(account) => {
                account.last_checked_at = Some(at);
                true
            }
            None => false,
        }
    }

    /// Forget the last error after a successful check
    pub fn clear_error(&mut self, id: AccountId) {
        if let Some(account) = self.find_mut(id) {
            account.last_error = None;
        }
    }

    /// Store a failure message and optionally move the account to a new status
    ///
    /// Returns false if the account is gone.
    pub fn record_failure(
        &mut self,
        id: AccountId,
        message: impl Into<String>,
        status: Option<AccountStatus>,
    ) -> bool {
        match self.find_mut(id) {
            Some(account) => {
                account.last_error = Some(message.into());
                if let Some(status) = status {
                    account.status = status;
                }
                true
            }
            None => false,
        }
    }

    /// Snapshot of all accounts in insertion order
    pub fn list(&self) -> Vec<Account> {
        self.accounts.clone()
    }

    /// Snapshot of the Active accounts in insertion order
    pub fn active(&self) -> Vec<Account> {
        self.accounts
            .iter()
            .filter(|a| a.is_active())
            .cloned()
            .collect()
    }

    /// Look up one account
    pub fn get(&self, id: AccountId) -> Option<Account> {
        self.accounts.iter().find(|a| a.id == id).cloned()
    }

    /// Whether the account is still registered
    pub fn contains(&self, id: AccountId) -> bool {
        self.accounts.iter().any(|a| a.id == id)
    }

    /// Number of accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn find_mut(&mut self, id: AccountId) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| a.id == id)
    }
}
