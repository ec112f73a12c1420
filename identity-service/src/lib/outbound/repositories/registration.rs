use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;

use crate::domain::account::errors::AccountError;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::Activation;
use crate::domain::account::models::CompanyId;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::Role;
use crate::domain::account::models::RoleId;
use crate::domain::account::models::Username;
use crate::domain::registration::models::CustomerKind;
use crate::domain::registration::models::CustomerProfile;
use crate::domain::registration::models::CustomerProfileId;
use crate::domain::registration::models::NewAccount;
use crate::domain::registration::models::NewCustomerProfile;
use crate::domain::registration::ports::RegistrationStore;

const INSERT_ACCOUNT: &str = r#"
    INSERT INTO accounts (username, email, password_hash, name, phone, role_id, company_id, status)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    RETURNING id, username, email, password_hash, name, phone, avatar, company_id,
              failed_attempts, status, must_change_password, two_factor_enabled,
              last_access_at, created_at, updated_at
"#;

const INSERT_PROFILE: &str = r#"
    INSERT INTO customer_profiles (company_id, account_id, customer_kind, document,
                                   document_type, address, city, status)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    RETURNING id, company_id, account_id, customer_kind, document, document_type,
              address, city, rating, rental_count, damage_count, status,
              created_at, updated_at
"#;

pub struct PostgresRegistrationRepository {
    pool: PgPool,
}

impl PostgresRegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn activation_from(status: &str) -> Result<Activation, AccountError> {
        match status {
            "active" => Ok(Activation::Active),
            "inactive" => Ok(Activation::Inactive),
            other => Err(AccountError::DatabaseError(format!(
                "Unexpected status: {other}"
            ))),
        }
    }

    fn row_to_account(row: &PgRow, role: Role) -> Result<Account, AccountError> {
        Ok(Account {
            id: AccountId(row.get("id")),
            username: Username::new(row.get("username"))?,
            email: EmailAddress::new(row.get("email"))?,
            password_hash: row.get("password_hash"),
            name: row.get("name"),
            phone: row.get("phone"),
            avatar: row.get("avatar"),
            role,
            company_id: row.get::<Option<i64>, _>("company_id").map(CompanyId),
            failed_attempts: row.get("failed_attempts"),
            activation: Self::activation_from(row.get::<String, _>("status").as_str())?,
            must_change_password: row.get("must_change_password"),
            two_factor_enabled: row.get("two_factor_enabled"),
            last_access_at: row.get("last_access_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn row_to_profile(row: &PgRow) -> Result<CustomerProfile, AccountError> {
        Ok(CustomerProfile {
            id: CustomerProfileId(row.get("id")),
            company_id: CompanyId(row.get("company_id")),
            account_id: AccountId(row.get("account_id")),
            customer_kind: CustomerKind::new(row.get::<String, _>("customer_kind").as_str())?,
            document: row.get("document"),
            document_type: row.get("document_type"),
            address: row.get("address"),
            city: row.get("city"),
            rating: row.get("rating"),
            rental_count: row.get("rental_count"),
            damage_count: row.get("damage_count"),
            activation: Self::activation_from(row.get::<String, _>("status").as_str())?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn account_insert_error(e: sqlx::Error, account: &NewAccount) -> AccountError {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                if db_err.constraint() == Some("accounts_username_key") {
                    return AccountError::UsernameAlreadyExists(
                        account.username.as_str().to_string(),
                    );
                }
                if db_err.constraint() == Some("accounts_email_key") {
                    return AccountError::EmailAlreadyExists(account.email.as_str().to_string());
                }
            }
        }
        AccountError::DatabaseError(e.to_string())
    }

    fn profile_insert_error(e: sqlx::Error, profile: &NewCustomerProfile) -> AccountError {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation()
                && db_err.constraint() == Some("customer_profiles_document_company_key")
            {
                return AccountError::DocumentAlreadyExists(profile.document.as_str().to_string());
            }
        }
        AccountError::DatabaseError(e.to_string())
    }
}

#[async_trait]
impl RegistrationStore for PostgresRegistrationRepository {
    async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>, AccountError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, access_level
            FROM roles
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(row.map(|r| Role {
            id: RoleId(r.get("id")),
            name: r.get("name"),
            access_level: r.get("access_level"),
        }))
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AccountError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, access_level
            FROM roles
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(row.map(|r| Role {
            id: RoleId(r.get("id")),
            name: r.get("name"),
            access_level: r.get("access_level"),
        }))
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account, AccountError> {
        let row = sqlx::query(INSERT_ACCOUNT)
            .bind(account.username.as_str())
            .bind(account.email.as_str())
            .bind(&account.password_hash)
            .bind(&account.name)
            .bind(&account.phone)
            .bind(account.role.id.0)
            .bind(account.company_id.map(|id| id.0))
            .bind(account.activation.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Self::account_insert_error(e, &account))?;

        Self::row_to_account(&row, account.role)
    }

    async fn create_customer(
        &self,
        account: NewAccount,
        profile: NewCustomerProfile,
    ) -> Result<(Account, CustomerProfile), AccountError> {
        // Every early return drops the transaction, rolling both inserts back
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let email_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1)")
                .bind(account.email.as_str())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        if email_taken {
            return Err(AccountError::EmailAlreadyExists(
                account.email.as_str().to_string(),
            ));
        }

        let document_taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM customer_profiles WHERE document = $1 AND company_id = $2)",
        )
        .bind(profile.document.as_str())
        .bind(profile.company_id.0)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        if document_taken {
            return Err(AccountError::DocumentAlreadyExists(
                profile.document.as_str().to_string(),
            ));
        }

        let account_row = sqlx::query(INSERT_ACCOUNT)
            .bind(account.username.as_str())
            .bind(account.email.as_str())
            .bind(&account.password_hash)
            .bind(&account.name)
            .bind(&account.phone)
            .bind(account.role.id.0)
            .bind(account.company_id.map(|id| id.0))
            .bind(account.activation.as_str())
            .fetch_one(&mut *tx)
            .await
            // The unique indexes still backstop a race that slips past the checks
            .map_err(|e| Self::account_insert_error(e, &account))?;

        let persisted_account = Self::row_to_account(&account_row, account.role.clone())?;

        let profile_row = sqlx::query(INSERT_PROFILE)
            .bind(profile.company_id.0)
            .bind(persisted_account.id.0)
            .bind(profile.customer_kind.as_str())
            .bind(profile.document.as_str())
            .bind(&profile.document_type)
            .bind(&profile.address)
            .bind(&profile.city)
            .bind(profile.activation.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| Self::profile_insert_error(e, &profile))?;

        let persisted_profile = Self::row_to_profile(&profile_row)?;

        tx.commit()
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok((persisted_account, persisted_profile))
    }
}
