use thiserror::Error;

/// Error for policy rules that cannot be loaded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Invalid resource pattern '{0}': must start with '/'")]
    InvalidPattern(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Unknown effect: {0}")]
    UnknownEffect(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

/// Reasons a request is turned away by the authorization gate.
#[derive(Debug, Clone, Error)]
pub enum AuthorizationError {
    #[error("authentication required: {0}")]
    Unauthenticated(String),

    #[error("unknown subject: {0}")]
    UnknownSubject(String),

    #[error("access denied: {0}")]
    Denied(String),

    #[error("Store error: {0}")]
    Store(String),
}
