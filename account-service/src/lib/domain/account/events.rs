use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::account::models::Account;
use crate::domain::account::models::PasswordResetRequest;

/// Domain event published when a new account is created.
#[derive(Debug, Clone)]
pub struct AccountCreatedEvent {
    pub event_id: String,
    pub account_id: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl AccountCreatedEvent {
    pub fn new(account: &Account) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            account_id: account.id.to_string(),
            email: account.email.as_str().to_string(),
            role: account.role.as_str().to_string(),
            created_at: account.created_at,
        }
    }
}

/// Domain event carrying a reset token to the out-of-band delivery channel.
///
/// This is the only place the token leaves the service. Consumers (the mail
/// sender) must treat the payload as a credential.
#[derive(Debug, Clone)]
pub struct PasswordResetRequestedEvent {
    pub event_id: String,
    pub account_id: String,
    pub email: String,
    pub reset_token: String,
    pub expires_at: DateTime<Utc>,
}

impl PasswordResetRequestedEvent {
    /// Create the event for a freshly stored reset request.
    ///
    /// # Arguments
    /// * `account` - Account the reset is for
    /// * `request` - Stored reset request holding the token
    pub fn new(account: &Account, request: &PasswordResetRequest) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            account_id: account.id.to_string(),
            email: request.email.as_str().to_string(),
            reset_token: request.token.as_str().to_string(),
            expires_at: request.expires_at,
        }
    }
}

/// Domain event published after a password was replaced through a reset.
#[derive(Debug, Clone)]
pub struct PasswordChangedEvent {
    pub event_id: String,
    pub account_id: String,
    pub email: String,
    pub changed_at: DateTime<Utc>,
}

impl PasswordChangedEvent {
    pub fn new(account: &Account) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            account_id: account.id.to_string(),
            email: account.email.as_str().to_string(),
            changed_at: Utc::now(),
        }
    }
}
