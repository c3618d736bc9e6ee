use thiserror::Error;

pub const USER_NOT_FOUND: &str = "user not found";
pub const PASSWORD_NOT_MATCHED: &str = "password not matched";
pub const USER_ALREADY_EXISTS: &str = "user already exists";
pub const RESET_TOKEN_NOT_MATCHED: &str = "reset token not matched";
pub const RESET_TOKEN_EXPIRED: &str = "reset token expired";
pub const RESET_TOKEN_CONSUMED: &str = "reset token already used";

/// Error for AccountId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccountIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for Role parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("Unknown role: {0}")]
    Unknown(String),
}

/// Error for event publishing operations
#[derive(Debug, Clone, Error)]
pub enum EventPublisherError {
    #[error("Failed to serialize event: {0}")]
    SerializationFailed(String),

    #[error("Failed to publish event to broker: {0}")]
    PublishFailed(String),
}

/// Top-level error for all account operations.
#[derive(Debug, Clone, Error)]
pub enum AccountError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid account ID: {0}")]
    InvalidAccountId(#[from] AccountIdError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid role: {0}")]
    InvalidRole(#[from] RoleError),

    // Domain-level errors
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidToken(String),

    // Infrastructure errors
    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Reset token delivery failed: {0}")]
    Delivery(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl AccountError {
    /// Whether the error comes from infrastructure rather than the caller's
    /// input. Transports never show these messages to remote callers.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AccountError::Signing(_)
                | AccountError::Hashing(_)
                | AccountError::Delivery(_)
                | AccountError::Store(_)
        )
    }
}
