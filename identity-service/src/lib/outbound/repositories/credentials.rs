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
use crate::domain::account::ports::CredentialStore;

const ACTIVE_ACCOUNT_COLUMNS: &str = r#"
    SELECT a.id, a.username, a.email, a.password_hash, a.name, a.phone, a.avatar,
           a.company_id, a.failed_attempts, a.status, a.must_change_password,
           a.two_factor_enabled, a.last_access_at, a.created_at, a.updated_at,
           r.id AS role_id, r.name AS role_name, r.access_level
    FROM accounts a
    JOIN roles r ON r.id = a.role_id
"#;

pub struct PostgresCredentialRepository {
    pool: PgPool,
}

impl PostgresCredentialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_account(row: &PgRow) -> Result<Account, AccountError> {
        let activation = match row.get::<String, _>("status").as_str() {
            "active" => Activation::Active,
            "inactive" => Activation::Inactive,
            other => {
                return Err(AccountError::DatabaseError(format!(
                    "Unexpected account status: {other}"
                )))
            }
        };

        Ok(Account {
            id: AccountId(row.get("id")),
            username: Username::new(row.get("username"))?,
            email: EmailAddress::new(row.get("email"))?,
            password_hash: row.get("password_hash"),
            name: row.get("name"),
            phone: row.get("phone"),
            avatar: row.get("avatar"),
            role: Role {
                id: RoleId(row.get("role_id")),
                name: row.get("role_name"),
                access_level: row.get("access_level"),
            },
            company_id: row.get::<Option<i64>, _>("company_id").map(CompanyId),
            failed_attempts: row.get("failed_attempts"),
            activation,
            must_change_password: row.get("must_change_password"),
            two_factor_enabled: row.get("two_factor_enabled"),
            last_access_at: row.get("last_access_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialRepository {
    async fn find_active_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Account>, AccountError> {
        // Exact, case-sensitive match; inactive accounts are invisible here
        let query = format!("{ACTIVE_ACCOUNT_COLUMNS} WHERE a.username = $1 AND a.status = 'active'");

        let row = sqlx::query(&query)
            .bind(username.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_account(&r)?)),
            None => Ok(None),
        }
    }

    async fn find_active_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountError> {
        let query = format!("{ACTIVE_ACCOUNT_COLUMNS} WHERE a.email = $1 AND a.status = 'active'");

        let row = sqlx::query(&query)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_account(&r)?)),
            None => Ok(None),
        }
    }

    async fn increment_failed_attempts(&self, id: AccountId) -> Result<(), AccountError> {
        // Single statement so concurrent failures never lose an increment
        sqlx::query(
            r#"
            UPDATE accounts
            SET failed_attempts = failed_attempts + 1, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn reset_failed_attempts(&self, id: AccountId) -> Result<(), AccountError> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET failed_attempts = 0, last_access_at = now(), updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
