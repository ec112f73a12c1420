use async_trait::async_trait;

use crate::domain::account::errors::AccountError;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::LoginCommand;
use crate::domain::account::models::Session;
use crate::domain::account::models::Username;

/// Port for authentication operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Authenticate an account and issue a session token.
    ///
    /// Looks the identifier up as a username first and falls back to an
    /// email lookup. The lockout policy is consulted before any password
    /// comparison, failed attempts bump the stored counter, and a
    /// successful login resets it.
    ///
    /// # Arguments
    /// * `command` - Login identifier and plain text password
    ///
    /// # Returns
    /// Session carrying the account and a freshly issued token
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown identifier, wrong password, or locked
    ///   account; indistinguishable from the outside
    /// * `DatabaseError` - Database operation failed
    async fn login(&self, command: LoginCommand) -> Result<Session, AccountError>;
}

/// Persistence operations backing the login flow.
///
/// Lookups are case-sensitive exact matches restricted to active accounts;
/// inactive accounts cannot authenticate and are reported as absent.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Retrieve an active account by username.
    ///
    /// # Arguments
    /// * `username` - Username to search for
    ///
    /// # Returns
    /// Optional account entity (None if not found or not active)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_active_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Account>, AccountError>;

    /// Retrieve an active account by email address.
    ///
    /// # Arguments
    /// * `email` - Email address to search for
    ///
    /// # Returns
    /// Optional account entity (None if not found or not active)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_active_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountError>;

    /// Add 1 to the stored failed-attempt counter.
    ///
    /// Must be a single atomic update at the storage layer so concurrent
    /// failed logins against the same account never lose an increment.
    ///
    /// # Arguments
    /// * `id` - Account to penalize
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn increment_failed_attempts(&self, id: AccountId) -> Result<(), AccountError>;

    /// Set the failed-attempt counter to 0 and stamp the last access time.
    ///
    /// # Arguments
    /// * `id` - Account that authenticated successfully
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn reset_failed_attempts(&self, id: AccountId) -> Result<(), AccountError>;
}
