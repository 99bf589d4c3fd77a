//! Adding, removing and toggling monitored accounts.

use crate::error::{Error, Result};
use crate::types::{Account, AccountId, AccountStatus, Event, LogAction, Severity};

use super::Archiver;

impl Archiver {
    /// Start monitoring a handle (leading `@` and surrounding whitespace are stripped)
    ///
    /// The new account is Active and is picked up by the next cycle.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidHandle`] if nothing is left after normalization,
    /// [`Error::ShuttingDown`] after shutdown.
    pub async fn add_account(&self, handle: &str) -> Result<Account> {
        if self.is_shutting_down() {
            return Err(Error::ShuttingDown);
        }

        let account = self.registry.write().await.add(handle)?;
        tracing::info!(account_id = %account.id, handle = %account.handle, "Account added");
        self.log
            .record(
                &account.handle,
                LogAction::AccountAdded,
                Severity::Info,
                "Added to monitoring list",
            )
            .await;
        self.emit_event(Event::AccountAdded {
            account: account.clone(),
        });
        Ok(account)
    }

    /// Stop monitoring an account
    ///
    /// Idempotent; returns whether something was removed. A check already running for
    /// the account finishes, and what it archived stays archived.
    pub async fn remove_account(&self, id: AccountId) -> bool {
        let Some(account) = self.registry.write().await.remove(id) else {
            return false;
        };

        tracing::info!(account_id = %id, handle = %account.handle, "Account removed");
        self.log
            .record(
                &account.handle,
                LogAction::AccountRemoved,
                Severity::Info,
                "Removed from monitoring list",
            )
            .await;
        self.emit_event(Event::AccountRemoved { id });
        true
    }

    /// Pause, resume or park an account
    ///
    /// Setting [`AccountStatus::Active`] also clears the last recorded error, which is how
    /// an account parked in [`AccountStatus::Error`] is re-enabled.
    pub async fn set_account_status(&self, id: AccountId, status: AccountStatus) -> Result<Account> {
        let account = self.registry.write().await.set_status(id, status)?;

        tracing::info!(account_id = %id, handle = %account.handle, %status, "Account status changed");
        self.emit_event(Event::AccountStatusChanged { id, status });
        Ok(account)
    }

    /// Look up one account
    pub async fn get_account(&self, id: AccountId) -> Option<Account> {
        self.registry.read().await.get(id)
    }
}
