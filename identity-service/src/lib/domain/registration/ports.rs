use async_trait::async_trait;

use crate::domain::account::errors::AccountError;
use crate::domain::account::models::Account;
use crate::domain::account::models::Role;
use crate::domain::account::models::RoleId;
use crate::domain::account::models::Session;
use crate::domain::registration::models::CustomerProfile;
use crate::domain::registration::models::NewAccount;
use crate::domain::registration::models::NewCustomerProfile;
use crate::domain::registration::models::RegisterCustomerCommand;
use crate::domain::registration::models::RegisterInternalCommand;
use crate::domain::registration::models::RegistrationOutcome;

/// Port for account provisioning operations.
#[async_trait]
pub trait RegistrationServicePort: Send + Sync + 'static {
    /// Register an account on behalf of an authenticated caller.
    ///
    /// # Arguments
    /// * `command` - Validated internal registration command
    ///
    /// # Returns
    /// A session for the newly created account
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is taken
    /// * `EmailAlreadyExists` - Email is taken
    /// * `RoleNotFound` - Requested role does not exist
    async fn register_internal(
        &self,
        command: RegisterInternalCommand,
    ) -> Result<Session, AccountError>;

    /// Self-register a customer together with their profile.
    ///
    /// # Arguments
    /// * `command` - Validated customer registration command
    ///
    /// # Returns
    /// The created account and profile, with a token for person customers
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is taken
    /// * `DocumentAlreadyExists` - Document already registered for the company
    async fn register_customer(
        &self,
        command: RegisterCustomerCommand,
    ) -> Result<RegistrationOutcome, AccountError>;
}

/// Port for the account and profile persistence used by registration.
#[async_trait]
pub trait RegistrationStore: Send + Sync + 'static {
    /// Look up a role by its identifier.
    ///
    /// # Arguments
    /// * `id` - Role identifier
    ///
    /// # Returns
    /// The role, or `None` when no such role exists
    async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>, AccountError>;

    /// Look up a role by its unique name.
    ///
    /// # Arguments
    /// * `name` - Role name
    ///
    /// # Returns
    /// The role, or `None` when no such role exists
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AccountError>;

    /// Persist a new account.
    ///
    /// # Arguments
    /// * `account` - Write model for the account row
    ///
    /// # Returns
    /// The persisted account
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is taken
    /// * `EmailAlreadyExists` - Email is taken
    async fn create_account(&self, account: NewAccount) -> Result<Account, AccountError>;

    /// Persist a new account and its customer profile as one atomic unit.
    ///
    /// Either both rows exist afterwards or neither does. Uniqueness of the
    /// email and of the (document, company) pair is enforced inside the same
    /// transaction.
    ///
    /// # Arguments
    /// * `account` - Write model for the account row
    /// * `profile` - Write model for the profile row
    ///
    /// # Returns
    /// The persisted account and profile
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is taken
    /// * `DocumentAlreadyExists` - Document already registered for the company
    async fn create_customer(
        &self,
        account: NewAccount,
        profile: NewCustomerProfile,
    ) -> Result<(Account, CustomerProfile), AccountError>;
}
