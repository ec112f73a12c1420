use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::account::errors::AccountError;
use crate::domain::account::errors::DenialReason;
use crate::domain::account::models::Account;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::LoginCommand;
use crate::domain::account::models::Session;
use crate::domain::account::ports::AuthServicePort;
use crate::domain::account::ports::CredentialStore;
use crate::domain::token::TokenIssuer;

/// Domain service implementation for authentication.
///
/// Composes the credential store, the lockout policy, the password hasher,
/// and the token issuer into the login flow. All durable state lives behind
/// the store; this service holds only read-only collaborators.
pub struct AuthService<CS>
where
    CS: CredentialStore,
{
    store: Arc<CS>,
    token_issuer: Arc<TokenIssuer>,
    password_hasher: auth::PasswordHasher,
}

impl<CS> AuthService<CS>
where
    CS: CredentialStore,
{
    /// Create a new authentication service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Credential persistence implementation
    /// * `token_issuer` - Signed token issuance
    ///
    /// # Returns
    /// Configured authentication service instance
    pub fn new(store: Arc<CS>, token_issuer: Arc<TokenIssuer>) -> Self {
        Self {
            store,
            token_issuer,
            password_hasher: auth::PasswordHasher::new(),
        }
    }

    async fn find_account(&self, command: &LoginCommand) -> Result<Option<Account>, AccountError> {
        if let Some(account) = self
            .store
            .find_active_by_username(&command.username)
            .await?
        {
            return Ok(Some(account));
        }

        // Self-registered customers sign in with their email address
        match EmailAddress::new(command.username.as_str().to_string()) {
            Ok(email) => self.store.find_active_by_email(&email).await,
            Err(_) => Ok(None),
        }
    }

    fn deny(&self, command: &LoginCommand, reason: DenialReason) -> AccountError {
        tracing::warn!(identifier = %command.username, reason = ?reason, "Login denied");
        AccountError::InvalidCredentials(reason)
    }
}

#[async_trait]
impl<CS> AuthServicePort for AuthService<CS>
where
    CS: CredentialStore,
{
    async fn login(&self, command: LoginCommand) -> Result<Session, AccountError> {
        let account = match self.find_account(&command).await? {
            Some(account) => account,
            None => return Err(self.deny(&command, DenialReason::UnknownAccount)),
        };

        // Lockout is evaluated strictly before the hash comparison
        if auth::lockout::is_locked(account.failed_attempts) {
            return Err(self.deny(&command, DenialReason::Locked));
        }

        if !self
            .password_hasher
            .verify(&command.password, &account.password_hash)
        {
            self.store.increment_failed_attempts(account.id).await?;
            return Err(self.deny(&command, DenialReason::WrongPassword));
        }

        self.store.reset_failed_attempts(account.id).await?;

        let token = self.token_issuer.issue(&account)?;

        tracing::info!(account_id = %account.id, "Login succeeded");

        Ok(Session { account, token })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicI32;
    use std::sync::atomic::Ordering;

    use chrono::Utc;
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::domain::account::models::AccountId;
    use crate::domain::account::models::AccountStatus;
    use crate::domain::account::models::Activation;
    use crate::domain::account::models::Role;
    use crate::domain::account::models::RoleId;
    use crate::domain::account::models::Username;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";

    // Define mocks in the test module using mockall
    mock! {
        pub TestCredentialStore {}

        #[async_trait]
        impl CredentialStore for TestCredentialStore {
            async fn find_active_by_username(&self, username: &Username) -> Result<Option<Account>, AccountError>;
            async fn find_active_by_email(&self, email: &EmailAddress) -> Result<Option<Account>, AccountError>;
            async fn increment_failed_attempts(&self, id: AccountId) -> Result<(), AccountError>;
            async fn reset_failed_attempts(&self, id: AccountId) -> Result<(), AccountError>;
        }
    }

    fn test_issuer() -> Arc<TokenIssuer> {
        Arc::new(
            TokenIssuer::new(TEST_SECRET, "rental-backend-test", "rental-clients-test", 60)
                .expect("Failed to build token issuer"),
        )
    }

    fn hash_of(password: &str) -> String {
        auth::PasswordHasher::new()
            .hash(password)
            .expect("Failed to hash password")
    }

    fn sample_account(failed_attempts: i32, password_hash: String) -> Account {
        Account {
            id: AccountId(42),
            username: Username::new("renter".to_string()).unwrap(),
            email: EmailAddress::new("renter@example.com".to_string()).unwrap(),
            password_hash,
            name: "Renter Example".to_string(),
            phone: None,
            avatar: None,
            role: Role {
                id: RoleId(3),
                name: "customer".to_string(),
                access_level: 10,
            },
            company_id: None,
            failed_attempts,
            activation: Activation::Active,
            must_change_password: false,
            two_factor_enabled: false,
            last_access_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn login_as(username: &str, password: &str) -> LoginCommand {
        LoginCommand::new(
            Username::new(username.to_string()).unwrap(),
            password.to_string(),
        )
    }

    #[tokio::test]
    async fn test_login_success_resets_counter_and_issues_token() {
        let mut store = MockTestCredentialStore::new();

        let account = sample_account(2, hash_of("correct_horse"));
        let returned_account = account.clone();
        store
            .expect_find_active_by_username()
            .withf(|username| username.as_str() == "renter")
            .times(1)
            .returning(move |_| Ok(Some(returned_account.clone())));

        store
            .expect_reset_failed_attempts()
            .withf(|id| *id == AccountId(42))
            .times(1)
            .returning(|_| Ok(()));

        store.expect_increment_failed_attempts().times(0);

        let issuer = test_issuer();
        let service = AuthService::new(Arc::new(store), Arc::clone(&issuer));

        let result = service.login(login_as("renter", "correct_horse")).await;
        assert!(result.is_ok());

        let session = result.unwrap();
        assert_eq!(session.account.id, AccountId(42));
        assert!(issuer.verify(&session.token.access_token));
        assert!(!session.token.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn test_login_wrong_password_increments_counter() {
        let mut store = MockTestCredentialStore::new();

        let account = sample_account(0, hash_of("correct_horse"));
        let returned_account = account.clone();
        store
            .expect_find_active_by_username()
            .times(1)
            .returning(move |_| Ok(Some(returned_account.clone())));

        store
            .expect_increment_failed_attempts()
            .withf(|id| *id == AccountId(42))
            .times(1)
            .returning(|_| Ok(()));

        store.expect_reset_failed_attempts().times(0);

        let service = AuthService::new(Arc::new(store), test_issuer());

        let result = service.login(login_as("renter", "wrong_password")).await;
        assert!(matches!(
            result,
            Err(AccountError::InvalidCredentials(
                DenialReason::WrongPassword
            ))
        ));
    }

    #[tokio::test]
    async fn test_login_unknown_identifier_denied() {
        let mut store = MockTestCredentialStore::new();

        store
            .expect_find_active_by_username()
            .times(1)
            .returning(|_| Ok(None));

        // "ghost_user" is not an email, so no email fallback happens
        store.expect_find_active_by_email().times(0);
        store.expect_increment_failed_attempts().times(0);

        let service = AuthService::new(Arc::new(store), test_issuer());

        let result = service.login(login_as("ghost_user", "whatever")).await;
        assert!(matches!(
            result,
            Err(AccountError::InvalidCredentials(
                DenialReason::UnknownAccount
            ))
        ));
    }

    #[tokio::test]
    async fn test_login_with_email_identifier_falls_back() {
        let mut store = MockTestCredentialStore::new();

        let account = sample_account(0, hash_of("correct_horse"));
        let returned_account = account.clone();

        store
            .expect_find_active_by_username()
            .withf(|username| username.as_str() == "renter@example.com")
            .times(1)
            .returning(|_| Ok(None));

        store
            .expect_find_active_by_email()
            .withf(|email| email.as_str() == "renter@example.com")
            .times(1)
            .returning(move |_| Ok(Some(returned_account.clone())));

        store.expect_reset_failed_attempts().times(1).returning(|_| Ok(()));

        let service = AuthService::new(Arc::new(store), test_issuer());

        let result = service
            .login(login_as("renter@example.com", "correct_horse"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_login_locked_account_denied_before_password_check() {
        let mut store = MockTestCredentialStore::new();

        // Digest is garbage: if the password were compared it would fail as
        // a wrong password and increment. Locked denial must happen first.
        let account = sample_account(5, "not-a-digest".to_string());
        let returned_account = account.clone();
        store
            .expect_find_active_by_username()
            .times(1)
            .returning(move |_| Ok(Some(returned_account.clone())));

        store.expect_increment_failed_attempts().times(0);
        store.expect_reset_failed_attempts().times(0);

        let service = AuthService::new(Arc::new(store), test_issuer());

        let result = service.login(login_as("renter", "correct_horse")).await;
        assert!(matches!(
            result,
            Err(AccountError::InvalidCredentials(DenialReason::Locked))
        ));
    }

    #[tokio::test]
    async fn test_login_below_threshold_still_checks_password() {
        let mut store = MockTestCredentialStore::new();

        let account = sample_account(4, hash_of("correct_horse"));
        let returned_account = account.clone();
        store
            .expect_find_active_by_username()
            .times(1)
            .returning(move |_| Ok(Some(returned_account.clone())));

        // The attempt that reaches the threshold is still a password failure
        store
            .expect_increment_failed_attempts()
            .times(1)
            .returning(|_| Ok(()));

        let service = AuthService::new(Arc::new(store), test_issuer());

        let result = service.login(login_as("renter", "wrong_password")).await;
        assert!(matches!(
            result,
            Err(AccountError::InvalidCredentials(
                DenialReason::WrongPassword
            ))
        ));
    }

    #[tokio::test]
    async fn test_denial_is_uniform_across_causes() {
        let causes = [
            AccountError::InvalidCredentials(DenialReason::UnknownAccount),
            AccountError::InvalidCredentials(DenialReason::WrongPassword),
            AccountError::InvalidCredentials(DenialReason::Locked),
        ];

        for cause in causes {
            assert_eq!(cause.to_string(), "Invalid credentials");
        }
    }

    #[tokio::test]
    async fn test_concurrent_failed_logins_each_increment_counter() {
        let mut store = MockTestCredentialStore::new();

        let account = sample_account(0, hash_of("correct_horse"));
        let returned_account = account.clone();
        store
            .expect_find_active_by_username()
            .returning(move |_| Ok(Some(returned_account.clone())));

        let increments = Arc::new(AtomicI32::new(0));
        let observed = Arc::clone(&increments);
        store
            .expect_increment_failed_attempts()
            .times(8)
            .returning(move |_| {
                observed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });

        let service = Arc::new(AuthService::new(Arc::new(store), test_issuer()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service.login(login_as("renter", "wrong_password")).await
            }));
        }

        for handle in handles {
            let result = handle.await.expect("Login task panicked");
            assert!(matches!(result, Err(AccountError::InvalidCredentials(_))));
        }

        assert_eq!(increments.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_blocked_status_is_derived_from_counter() {
        let account = sample_account(4, "$argon2id$test_hash".to_string());
        assert_eq!(account.status(), AccountStatus::Active);

        let account = sample_account(5, "$argon2id$test_hash".to_string());
        assert_eq!(account.status(), AccountStatus::Blocked);

        let mut account = sample_account(5, "$argon2id$test_hash".to_string());
        account.activation = Activation::Inactive;
        assert_eq!(account.status(), AccountStatus::Inactive);

        // Resetting the counter unblocks without touching activation
        let mut account = sample_account(5, "$argon2id$test_hash".to_string());
        account.failed_attempts = 0;
        assert_eq!(account.status(), AccountStatus::Active);
    }
}
