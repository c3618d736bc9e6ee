use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::account::errors::AccountError;
use crate::account::errors::USER_ALREADY_EXISTS;
use crate::account::errors::USER_NOT_FOUND;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::PasswordResetRequest;
use crate::domain::account::models::ResetToken;
use crate::domain::account::models::Role;
use crate::domain::account::ports::AccountRepository;

const ACCOUNT_COLUMNS: &str = "id, email, password_hash, role, created_at";
const RESET_REQUEST_COLUMNS: &str = "id, email, token, created_at, expires_at, consumed_at";

#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = AccountError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: AccountId(row.id),
            email: EmailAddress::new(row.email)?,
            password_hash: row.password_hash,
            role: row.role.parse()?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ResetRequestRow {
    id: Uuid,
    email: String,
    token: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    consumed_at: Option<DateTime<Utc>>,
}

impl TryFrom<ResetRequestRow> for PasswordResetRequest {
    type Error = AccountError;

    fn try_from(row: ResetRequestRow) -> Result<Self, Self::Error> {
        Ok(PasswordResetRequest {
            id: row.id,
            email: EmailAddress::new(row.email)?,
            token: ResetToken::from(row.token),
            created_at: row.created_at,
            expires_at: row.expires_at,
            consumed_at: row.consumed_at,
        })
    }
}

fn store_error(operation: &str, e: sqlx::Error) -> AccountError {
    AccountError::Store(format!("{operation}: {e}"))
}

pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn find_account_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountError> {
        sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("select account by email", e))?
        .map(Account::try_from)
        .transpose()
    }

    async fn find_account_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError> {
        sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("select account by id", e))?
        .map(Account::try_from)
        .transpose()
    }

    async fn count_accounts_by_email(&self, email: &EmailAddress) -> Result<i64, AccountError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts WHERE email = $1")
            .bind(email.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error("count accounts by email", e))
    }

    async fn create_account(&self, account: Account) -> Result<Account, AccountError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(account.id.0)
        .bind(account.email.as_str())
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some("accounts_email_key")
                {
                    return AccountError::Conflict(USER_ALREADY_EXISTS.to_string());
                }
            }
            store_error("insert account", e)
        })?;

        Ok(account)
    }

    async fn update_role(&self, id: &AccountId, role: Role) -> Result<Account, AccountError> {
        sqlx::query_as::<_, AccountRow>(&format!(
            "UPDATE accounts SET role = $2 WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(id.0)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("update account role", e))?
        .ok_or_else(|| AccountError::NotFound(USER_NOT_FOUND.to_string()))
        .and_then(Account::try_from)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, AccountError> {
        sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("list accounts", e))?
        .into_iter()
        .map(Account::try_from)
        .collect()
    }

    async fn find_reset_request_by_token(
        &self,
        token: &ResetToken,
    ) -> Result<Option<PasswordResetRequest>, AccountError> {
        sqlx::query_as::<_, ResetRequestRow>(&format!(
            "SELECT {RESET_REQUEST_COLUMNS} FROM password_reset_requests WHERE token = $1"
        ))
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("select reset request by token", e))?
        .map(PasswordResetRequest::try_from)
        .transpose()
    }

    async fn create_reset_request(
        &self,
        request: PasswordResetRequest,
    ) -> Result<PasswordResetRequest, AccountError> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_requests (id, email, token, created_at, expires_at, consumed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(request.id)
        .bind(request.email.as_str())
        .bind(request.token.as_str())
        .bind(request.created_at)
        .bind(request.expires_at)
        .bind(request.consumed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("insert reset request", e))?;

        Ok(request)
    }

    async fn complete_password_reset(
        &self,
        request_id: &Uuid,
        account_id: &AccountId,
        password_hash: String,
        consumed_at: DateTime<Utc>,
    ) -> Result<Option<Account>, AccountError> {
        // Dropping the transaction without commit rolls both writes back.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("begin password reset", e))?;

        let consumed = sqlx::query(
            r#"
            UPDATE password_reset_requests
            SET consumed_at = $2
            WHERE id = $1 AND consumed_at IS NULL
            "#,
        )
        .bind(request_id)
        .bind(consumed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("consume reset request", e))?;

        if consumed.rows_affected() == 0 {
            return Ok(None);
        }

        let account = sqlx::query_as::<_, AccountRow>(&format!(
            "UPDATE accounts SET password_hash = $2 WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(account_id.0)
        .bind(&password_hash)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| store_error("update password hash", e))?
        .ok_or_else(|| AccountError::NotFound(USER_NOT_FOUND.to_string()))
        .and_then(Account::try_from)?;

        tx.commit()
            .await
            .map_err(|e| store_error("commit password reset", e))?;

        Ok(Some(account))
    }
}
