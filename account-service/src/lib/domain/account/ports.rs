use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::account::errors::AccountError;
use crate::account::errors::EventPublisherError;
use crate::domain::account::events::AccountCreatedEvent;
use crate::domain::account::events::PasswordChangedEvent;
use crate::domain::account::events::PasswordResetRequestedEvent;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::CreateAccountCommand;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::LoginCommand;
use crate::domain::account::models::LoginOutcome;
use crate::domain::account::models::PasswordResetRequest;
use crate::domain::account::models::ResetPasswordCommand;
use crate::domain::account::models::ResetToken;
use crate::domain::account::models::Role;

/// Port for the authentication service operations.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Verify credentials and issue an access/refresh token pair.
    ///
    /// # Errors
    /// * `Authentication` - Unknown email or wrong password
    /// * `Signing` - Token issuance failed
    /// * `Store` - Store operation failed
    async fn login(&self, command: LoginCommand) -> Result<LoginOutcome, AccountError>;

    /// Register a new account with role `member`.
    ///
    /// # Errors
    /// * `Conflict` - Email is already registered
    /// * `Hashing` - Password hashing failed
    /// * `Store` - Store operation failed
    async fn create_account(&self, command: CreateAccountCommand)
        -> Result<Account, AccountError>;

    /// Open a password reset for an existing account and hand the token to
    /// the delivery channel.
    ///
    /// # Returns
    /// The stored reset request. Transports must not echo its token.
    ///
    /// # Errors
    /// * `NotFound` - No account with this email
    /// * `Delivery` - The token could not be handed to the delivery channel
    /// * `Store` - Store operation failed
    async fn forgot_password(
        &self,
        email: &EmailAddress,
    ) -> Result<PasswordResetRequest, AccountError>;

    /// Replace an account password using a one-time reset token.
    ///
    /// # Errors
    /// * `InvalidToken` - Token unknown, expired or already used
    /// * `Authentication` - The token's account no longer exists
    /// * `Store` - Store operation failed
    async fn reset_password(&self, command: ResetPasswordCommand)
        -> Result<Account, AccountError>;

    /// Exchange a refresh token for a new token pair.
    ///
    /// # Errors
    /// * `InvalidToken` - Refresh token invalid or expired
    /// * `Authentication` - Subject account no longer exists
    async fn refresh(&self, refresh_token: &str) -> Result<LoginOutcome, AccountError>;

    /// Retrieve an account by identifier.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    async fn get_account(&self, id: &AccountId) -> Result<Account, AccountError>;

    /// Retrieve all accounts, newest first.
    async fn list_accounts(&self) -> Result<Vec<Account>, AccountError>;

    /// Assign a new role to an account.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    async fn change_role(&self, id: &AccountId, role: Role) -> Result<Account, AccountError>;
}

/// Credential store contract.
///
/// Implementations must enforce email uniqueness themselves (reporting a
/// violation as `Conflict`) and make `complete_password_reset` atomic.
///
/// Writes touch only the columns they name; no operation writes back a
/// whole account row.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Retrieve account by email address (exact match).
    async fn find_account_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountError>;

    /// Retrieve account by identifier.
    async fn find_account_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError>;

    /// Number of accounts registered with this email.
    async fn count_accounts_by_email(&self, email: &EmailAddress) -> Result<i64, AccountError>;

    /// Persist new account.
    ///
    /// # Errors
    /// * `Conflict` - Email is already registered
    /// * `Store` - Store operation failed
    async fn create_account(&self, account: Account) -> Result<Account, AccountError>;

    /// Set the role of an existing account, leaving every other column as
    /// stored.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `Store` - Store operation failed
    async fn update_role(&self, id: &AccountId, role: Role) -> Result<Account, AccountError>;

    /// Retrieve all accounts, newest first.
    async fn list_accounts(&self) -> Result<Vec<Account>, AccountError>;

    /// Retrieve a reset request by its token.
    async fn find_reset_request_by_token(
        &self,
        token: &ResetToken,
    ) -> Result<Option<PasswordResetRequest>, AccountError>;

    /// Persist a new reset request.
    async fn create_reset_request(
        &self,
        request: PasswordResetRequest,
    ) -> Result<PasswordResetRequest, AccountError>;

    /// Consume a reset request and set the account's password hash as one
    /// unit. Either both writes land or neither does.
    ///
    /// # Returns
    /// The updated account, or `None` if the request was already consumed
    /// (or does not exist), in which case nothing is written
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist; the request stays unconsumed
    /// * `Store` - Store operation failed; the request stays unconsumed
    async fn complete_password_reset(
        &self,
        request_id: &Uuid,
        account_id: &AccountId,
        password_hash: String,
        consumed_at: DateTime<Utc>,
    ) -> Result<Option<Account>, AccountError>;
}

/// Event publishing for domain events.
#[async_trait]
pub trait EventPublisher: Send + Sync + 'static {
    async fn publish_account_created(
        &self,
        event: &AccountCreatedEvent,
    ) -> Result<(), EventPublisherError>;

    /// Hand a reset token to the out-of-band delivery channel.
    async fn publish_password_reset_requested(
        &self,
        event: &PasswordResetRequestedEvent,
    ) -> Result<(), EventPublisherError>;

    async fn publish_password_changed(
        &self,
        event: &PasswordChangedEvent,
    ) -> Result<(), EventPublisherError>;
}
