use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::account::events::AccountCreatedEvent;
use crate::domain::account::events::PasswordChangedEvent;
use crate::domain::account::events::PasswordResetRequestedEvent;

/// Serializable envelope for all account-related events.
///
/// Infrastructure representation for event publishing (Kafka, etc.).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AccountEventMessage {
    AccountCreated(AccountCreatedMessage),
    PasswordResetRequested(PasswordResetRequestedMessage),
    PasswordChanged(PasswordChangedMessage),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountCreatedMessage {
    pub event_id: String,
    pub account_id: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<&AccountCreatedEvent> for AccountEventMessage {
    fn from(event: &AccountCreatedEvent) -> Self {
        AccountEventMessage::AccountCreated(AccountCreatedMessage {
            event_id: event.event_id.clone(),
            account_id: event.account_id.clone(),
            email: event.email.clone(),
            role: event.role.clone(),
            created_at: event.created_at,
        })
    }
}

/// Consumed by the mail sender; `reset_token` is a live credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetRequestedMessage {
    pub event_id: String,
    pub account_id: String,
    pub email: String,
    pub reset_token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&PasswordResetRequestedEvent> for AccountEventMessage {
    fn from(event: &PasswordResetRequestedEvent) -> Self {
        AccountEventMessage::PasswordResetRequested(PasswordResetRequestedMessage {
            event_id: event.event_id.clone(),
            account_id: event.account_id.clone(),
            email: event.email.clone(),
            reset_token: event.reset_token.clone(),
            expires_at: event.expires_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordChangedMessage {
    pub event_id: String,
    pub account_id: String,
    pub email: String,
    pub changed_at: DateTime<Utc>,
}

impl From<&PasswordChangedEvent> for AccountEventMessage {
    fn from(event: &PasswordChangedEvent) -> Self {
        AccountEventMessage::PasswordChanged(PasswordChangedMessage {
            event_id: event.event_id.clone(),
            account_id: event.account_id.clone(),
            email: event.email.clone(),
            changed_at: event.changed_at,
        })
    }
}
