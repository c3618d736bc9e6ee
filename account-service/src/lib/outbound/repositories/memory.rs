use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;
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

/// Process-local credential store.
///
/// Each write takes the lock for its whole check-and-mutate step, which gives
/// the same uniqueness and single-consumption guarantees as the Postgres
/// constraints.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<AccountId, Account>>,
    reset_requests: RwLock<HashMap<Uuid, PasswordResetRequest>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_account_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| &a.email == email).cloned())
    }

    async fn find_account_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn count_accounts_by_email(&self, email: &EmailAddress) -> Result<i64, AccountError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().filter(|a| &a.email == email).count() as i64)
    }

    async fn create_account(&self, account: Account) -> Result<Account, AccountError> {
        let mut accounts = self.accounts.write().await;

        if accounts.values().any(|a| a.email == account.email) {
            return Err(AccountError::Conflict(USER_ALREADY_EXISTS.to_string()));
        }

        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_role(&self, id: &AccountId, role: Role) -> Result<Account, AccountError> {
        let mut accounts = self.accounts.write().await;

        let stored = accounts
            .get_mut(id)
            .ok_or_else(|| AccountError::NotFound(USER_NOT_FOUND.to_string()))?;
        stored.role = role;
        Ok(stored.clone())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, AccountError> {
        let mut accounts: Vec<Account> = self.accounts.read().await.values().cloned().collect();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(accounts)
    }

    async fn find_reset_request_by_token(
        &self,
        token: &ResetToken,
    ) -> Result<Option<PasswordResetRequest>, AccountError> {
        let requests = self.reset_requests.read().await;
        Ok(requests.values().find(|r| &r.token == token).cloned())
    }

    async fn create_reset_request(
        &self,
        request: PasswordResetRequest,
    ) -> Result<PasswordResetRequest, AccountError> {
        self.reset_requests
            .write()
            .await
            .insert(request.id, request.clone());
        Ok(request)
    }

    async fn complete_password_reset(
        &self,
        request_id: &Uuid,
        account_id: &AccountId,
        password_hash: String,
        consumed_at: DateTime<Utc>,
    ) -> Result<Option<Account>, AccountError> {
        // Lock order: reset requests, then accounts.
        let mut requests = self.reset_requests.write().await;
        let mut accounts = self.accounts.write().await;

        let request = match requests.get_mut(request_id) {
            Some(request) if request.consumed_at.is_none() => request,
            _ => return Ok(None),
        };
        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| AccountError::NotFound(USER_NOT_FOUND.to_string()))?;

        request.consumed_at = Some(consumed_at);
        account.password_hash = password_hash;
        Ok(Some(account.clone()))
    }
}
