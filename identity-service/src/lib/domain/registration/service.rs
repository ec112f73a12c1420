use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::account::errors::AccountError;
use crate::domain::account::models::Activation;
use crate::domain::account::models::Role;
use crate::domain::account::models::Session;
use crate::domain::account::models::Username;
use crate::domain::account::models::CUSTOMER_ROLE;
use crate::domain::registration::models::CustomerKind;
use crate::domain::registration::models::NewAccount;
use crate::domain::registration::models::NewCustomerProfile;
use crate::domain::registration::models::RegisterCustomerCommand;
use crate::domain::registration::models::RegisterInternalCommand;
use crate::domain::registration::models::RegistrationOutcome;
use crate::domain::registration::models::PENDING_ACTIVATION_MESSAGE;
use crate::domain::registration::models::REGISTRATION_SUCCESSFUL_MESSAGE;
use crate::domain::registration::ports::RegistrationServicePort;
use crate::domain::registration::ports::RegistrationStore;
use crate::domain::token::TokenIssuer;

/// Domain service implementation for account provisioning.
///
/// Resolves roles, hashes passwords, and delegates persistence to the store.
/// Tokens are only issued for accounts that are active once persisted.
pub struct RegistrationService<RS>
where
    RS: RegistrationStore,
{
    store: Arc<RS>,
    token_issuer: Arc<TokenIssuer>,
    password_hasher: auth::PasswordHasher,
}

impl<RS> RegistrationService<RS>
where
    RS: RegistrationStore,
{
    /// Create a new registration service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Account and profile persistence implementation
    /// * `token_issuer` - Signed token issuance
    ///
    /// # Returns
    /// Configured registration service instance
    pub fn new(store: Arc<RS>, token_issuer: Arc<TokenIssuer>) -> Self {
        Self {
            store,
            token_issuer,
            password_hasher: auth::PasswordHasher::new(),
        }
    }

    async fn customer_role(&self) -> Result<Role, AccountError> {
        match self.store.find_role_by_name(CUSTOMER_ROLE).await? {
            Some(role) => Ok(role),
            // The customer role is seeded by migration; its absence is a
            // deployment fault, not a caller mistake
            None => Err(AccountError::Unknown(format!(
                "Role {CUSTOMER_ROLE} is not provisioned"
            ))),
        }
    }

    fn hash_password(&self, password: &str) -> Result<String, AccountError> {
        self.password_hasher
            .hash(password)
            .map_err(|e| AccountError::Unknown(format!("Failed to hash password: {e}")))
    }
}

#[async_trait]
impl<RS> RegistrationServicePort for RegistrationService<RS>
where
    RS: RegistrationStore,
{
    async fn register_internal(
        &self,
        command: RegisterInternalCommand,
    ) -> Result<Session, AccountError> {
        let role = match command.role_id {
            Some(role_id) => self
                .store
                .find_role_by_id(role_id)
                .await?
                .ok_or_else(|| AccountError::RoleNotFound(role_id.to_string()))?,
            None => self.customer_role().await?,
        };

        let password_hash = self.hash_password(&command.password)?;

        let account = self
            .store
            .create_account(NewAccount {
                username: command.username,
                email: command.email,
                password_hash,
                name: command.name,
                phone: command.phone,
                company_id: command.company_id,
                role,
                activation: Activation::Active,
            })
            .await?;

        let token = self.token_issuer.issue(&account)?;

        tracing::info!(account_id = %account.id, "Account registered");

        Ok(Session { account, token })
    }

    async fn register_customer(
        &self,
        command: RegisterCustomerCommand,
    ) -> Result<RegistrationOutcome, AccountError> {
        let role = self.customer_role().await?;
        let password_hash = self.hash_password(&command.password)?;

        // Person customers go live immediately; legal entities wait for
        // administrative approval
        let activation = match command.customer_kind {
            CustomerKind::Person => Activation::Active,
            CustomerKind::Company => Activation::Inactive,
        };

        // The email doubles as the login username
        let username = Username::new(command.email.as_str().to_string())?;

        let (account, profile) = self
            .store
            .create_customer(
                NewAccount {
                    username,
                    email: command.email,
                    password_hash,
                    name: command.name,
                    phone: command.phone,
                    company_id: Some(command.company_id),
                    role,
                    activation,
                },
                NewCustomerProfile {
                    company_id: command.company_id,
                    customer_kind: command.customer_kind,
                    document: command.document,
                    document_type: command.document_type,
                    address: command.address,
                    city: command.city,
                    // The pending gate is the account; the profile row itself
                    // starts active either way
                    activation: Activation::Active,
                },
            )
            .await?;

        // Only issued once the account and profile are durably committed
        let (token, message) = match command.customer_kind {
            CustomerKind::Person => (
                Some(self.token_issuer.issue(&account)?),
                REGISTRATION_SUCCESSFUL_MESSAGE,
            ),
            CustomerKind::Company => (None, PENDING_ACTIVATION_MESSAGE),
        };

        tracing::info!(
            account_id = %account.id,
            customer_kind = %command.customer_kind,
            "Customer registered"
        );

        Ok(RegistrationOutcome {
            account,
            profile,
            token,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;

    use chrono::Utc;
    use mockall::mock;
    use mockall::predicate::*;
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::account::models::Account;
    use crate::domain::account::models::AccountId;
    use crate::domain::account::models::CompanyId;
    use crate::domain::account::models::EmailAddress;
    use crate::domain::account::models::RoleId;
    use crate::domain::registration::models::CustomerProfile;
    use crate::domain::registration::models::CustomerProfileId;
    use crate::domain::registration::models::Document;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";

    // Define mocks in the test module using mockall
    mock! {
        pub TestRegistrationStore {}

        #[async_trait]
        impl RegistrationStore for TestRegistrationStore {
            async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>, AccountError>;
            async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AccountError>;
            async fn create_account(&self, account: NewAccount) -> Result<Account, AccountError>;
            async fn create_customer(
                &self,
                account: NewAccount,
                profile: NewCustomerProfile,
            ) -> Result<(Account, CustomerProfile), AccountError>;
        }
    }

    fn test_issuer() -> Arc<TokenIssuer> {
        Arc::new(
            TokenIssuer::new(TEST_SECRET, "rental-backend-test", "rental-clients-test", 60)
                .expect("Failed to build token issuer"),
        )
    }

    fn customer_role() -> Role {
        Role {
            id: RoleId(3),
            name: "customer".to_string(),
            access_level: 10,
        }
    }

    fn persisted(account: &NewAccount) -> Account {
        Account {
            id: AccountId(7),
            username: account.username.clone(),
            email: account.email.clone(),
            password_hash: account.password_hash.clone(),
            name: account.name.clone(),
            phone: account.phone.clone(),
            avatar: None,
            role: account.role.clone(),
            company_id: account.company_id,
            failed_attempts: 0,
            activation: account.activation,
            must_change_password: false,
            two_factor_enabled: false,
            last_access_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn persisted_profile(profile: &NewCustomerProfile, account_id: AccountId) -> CustomerProfile {
        CustomerProfile {
            id: CustomerProfileId(11),
            company_id: profile.company_id,
            account_id,
            customer_kind: profile.customer_kind,
            document: profile.document.as_str().to_string(),
            document_type: profile.document_type.clone(),
            address: profile.address.clone(),
            city: profile.city.clone(),
            rating: Decimal::new(50, 1),
            rental_count: 0,
            damage_count: 0,
            activation: profile.activation,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn internal_command(role_id: Option<RoleId>) -> RegisterInternalCommand {
        RegisterInternalCommand {
            username: Username::new("backoffice_clerk".to_string()).unwrap(),
            email: EmailAddress::new("clerk@example.com".to_string()).unwrap(),
            password: "S3cure!pass".to_string(),
            name: "Clerk Example".to_string(),
            phone: Some("+15550100".to_string()),
            company_id: Some(CompanyId(5)),
            role_id,
        }
    }

    fn customer_command(kind: CustomerKind) -> RegisterCustomerCommand {
        RegisterCustomerCommand {
            name: "Maria Renter".to_string(),
            email: EmailAddress::new("maria@example.com".to_string()).unwrap(),
            password: "S3cure!pass".to_string(),
            phone: None,
            company_id: CompanyId(5),
            customer_kind: kind,
            document: Document::new("NID-12345678".to_string()).unwrap(),
            document_type: "national_id".to_string(),
            address: Some("100 Main Street".to_string()),
            city: Some("Springfield".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_internal_defaults_to_customer_role() {
        let mut store = MockTestRegistrationStore::new();

        store
            .expect_find_role_by_name()
            .withf(|name| name == "customer")
            .times(1)
            .returning(|_| Ok(Some(customer_role())));

        store.expect_find_role_by_id().times(0);

        store
            .expect_create_account()
            .withf(|account| {
                account.username.as_str() == "backoffice_clerk"
                    && account.role.name == "customer"
                    && account.activation == Activation::Active
            })
            .times(1)
            .returning(|account| Ok(persisted(&account)));

        let issuer = test_issuer();
        let service = RegistrationService::new(Arc::new(store), Arc::clone(&issuer));

        let result = service.register_internal(internal_command(None)).await;
        assert!(result.is_ok());

        let session = result.unwrap();
        assert_eq!(session.account.id, AccountId(7));
        assert!(issuer.verify(&session.token.access_token));
    }

    #[tokio::test]
    async fn test_register_internal_with_explicit_role() {
        let mut store = MockTestRegistrationStore::new();

        store
            .expect_find_role_by_id()
            .withf(|id| *id == RoleId(1))
            .times(1)
            .returning(|_| {
                Ok(Some(Role {
                    id: RoleId(1),
                    name: "administrator".to_string(),
                    access_level: 100,
                }))
            });

        store.expect_find_role_by_name().times(0);

        store
            .expect_create_account()
            .withf(|account| account.role.access_level == 100)
            .times(1)
            .returning(|account| Ok(persisted(&account)));

        let issuer = test_issuer();
        let service = RegistrationService::new(Arc::new(store), Arc::clone(&issuer));

        let result = service
            .register_internal(internal_command(Some(RoleId(1))))
            .await;
        assert!(result.is_ok());

        let claims = issuer
            .decode(&result.unwrap().token.access_token)
            .expect("Failed to decode issued token");
        assert_eq!(claims.role, "administrator");
        assert_eq!(claims.access_level, 100);
    }

    #[tokio::test]
    async fn test_register_internal_unknown_role_rejected() {
        let mut store = MockTestRegistrationStore::new();

        store
            .expect_find_role_by_id()
            .times(1)
            .returning(|_| Ok(None));

        store.expect_create_account().times(0);

        let service = RegistrationService::new(Arc::new(store), test_issuer());

        let result = service
            .register_internal(internal_command(Some(RoleId(99))))
            .await;
        assert!(matches!(result, Err(AccountError::RoleNotFound(_))));
    }

    #[tokio::test]
    async fn test_register_internal_stores_hash_not_password() {
        let mut store = MockTestRegistrationStore::new();

        store
            .expect_find_role_by_name()
            .returning(|_| Ok(Some(customer_role())));

        store
            .expect_create_account()
            .withf(|account| {
                account.password_hash != "S3cure!pass"
                    && account.password_hash.starts_with("$argon2")
            })
            .times(1)
            .returning(|account| Ok(persisted(&account)));

        let service = RegistrationService::new(Arc::new(store), test_issuer());

        let result = service.register_internal(internal_command(None)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_register_internal_duplicate_username_conflict() {
        let mut store = MockTestRegistrationStore::new();

        store
            .expect_find_role_by_name()
            .returning(|_| Ok(Some(customer_role())));

        store
            .expect_create_account()
            .times(1)
            .returning(|account| {
                Err(AccountError::UsernameAlreadyExists(
                    account.username.to_string(),
                ))
            });

        let service = RegistrationService::new(Arc::new(store), test_issuer());

        let result = service.register_internal(internal_command(None)).await;
        assert!(matches!(
            result,
            Err(AccountError::UsernameAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_register_customer_person_gets_immediate_session() {
        let mut store = MockTestRegistrationStore::new();

        store
            .expect_find_role_by_name()
            .returning(|_| Ok(Some(customer_role())));

        store
            .expect_create_customer()
            .withf(|account, profile| {
                account.username.as_str() == "maria@example.com"
                    && account.activation == Activation::Active
                    && account.company_id == Some(CompanyId(5))
                    && profile.activation == Activation::Active
                    && profile.customer_kind == CustomerKind::Person
            })
            .times(1)
            .returning(|account, profile| {
                let account = persisted(&account);
                let profile = persisted_profile(&profile, account.id);
                Ok((account, profile))
            });

        let issuer = test_issuer();
        let service = RegistrationService::new(Arc::new(store), Arc::clone(&issuer));

        let result = service
            .register_customer(customer_command(CustomerKind::Person))
            .await;
        assert!(result.is_ok());

        let outcome = result.unwrap();
        assert_eq!(outcome.message, REGISTRATION_SUCCESSFUL_MESSAGE);
        assert_eq!(outcome.profile.account_id, outcome.account.id);

        let token = outcome.token.expect("Person registration must carry a token");
        let claims = issuer
            .decode(&token.access_token)
            .expect("Failed to decode issued token");
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.username, "maria@example.com");
        assert_eq!(claims.company_id, "5");
    }

    #[tokio::test]
    async fn test_register_customer_company_awaits_activation() {
        let mut store = MockTestRegistrationStore::new();

        store
            .expect_find_role_by_name()
            .returning(|_| Ok(Some(customer_role())));

        store
            .expect_create_customer()
            .withf(|account, profile| {
                account.activation == Activation::Inactive
                    && profile.activation == Activation::Active
            })
            .times(1)
            .returning(|account, profile| {
                let account = persisted(&account);
                let profile = persisted_profile(&profile, account.id);
                Ok((account, profile))
            });

        let service = RegistrationService::new(Arc::new(store), test_issuer());

        let result = service
            .register_customer(customer_command(CustomerKind::Company))
            .await;
        assert!(result.is_ok());

        let outcome = result.unwrap();
        assert!(outcome.token.is_none());
        assert_eq!(outcome.message, PENDING_ACTIVATION_MESSAGE);
    }

    #[tokio::test]
    async fn test_register_customer_duplicate_document_conflict() {
        let mut store = MockTestRegistrationStore::new();

        store
            .expect_find_role_by_name()
            .returning(|_| Ok(Some(customer_role())));

        store
            .expect_create_customer()
            .times(1)
            .returning(|_, profile| {
                Err(AccountError::DocumentAlreadyExists(
                    profile.document.as_str().to_string(),
                ))
            });

        let service = RegistrationService::new(Arc::new(store), test_issuer());

        let result = service
            .register_customer(customer_command(CustomerKind::Person))
            .await;
        assert!(matches!(
            result,
            Err(AccountError::DocumentAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_register_customer_missing_seeded_role_is_internal_error() {
        let mut store = MockTestRegistrationStore::new();

        store
            .expect_find_role_by_name()
            .times(1)
            .returning(|_| Ok(None));

        store.expect_create_customer().times(0);

        let service = RegistrationService::new(Arc::new(store), test_issuer());

        let result = service
            .register_customer(customer_command(CustomerKind::Person))
            .await;
        assert!(matches!(result, Err(AccountError::Unknown(_))));
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_registration_single_success() {
        let mut store = MockTestRegistrationStore::new();

        store
            .expect_find_role_by_name()
            .returning(|_| Ok(Some(customer_role())));

        // The store decides the winner: first insert commits, the loser
        // surfaces the email conflict
        let first = Arc::new(AtomicBool::new(true));
        store
            .expect_create_customer()
            .times(2)
            .returning(move |account, profile| {
                if first.swap(false, Ordering::SeqCst) {
                    let account = persisted(&account);
                    let profile = persisted_profile(&profile, account.id);
                    Ok((account, profile))
                } else {
                    Err(AccountError::EmailAlreadyExists(
                        account.email.as_str().to_string(),
                    ))
                }
            });

        let service = Arc::new(RegistrationService::new(Arc::new(store), test_issuer()));

        let first_attempt = {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .register_customer(customer_command(CustomerKind::Person))
                    .await
            })
        };
        let second_attempt = {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .register_customer(customer_command(CustomerKind::Person))
                    .await
            })
        };

        let results = [
            first_attempt.await.expect("Registration task panicked"),
            second_attempt.await.expect("Registration task panicked"),
        ];

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(AccountError::EmailAlreadyExists(_))
        )));
    }
}
