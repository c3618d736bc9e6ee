use tonic::Status;

use crate::account::errors::AccountError;
use crate::domain::account::models::Account;
use crate::domain::account::models::LoginOutcome;
use crate::domain::authorization::errors::AuthorizationError;

pub mod create_account;
pub mod forgot_password;
pub mod get_account;
pub mod login;
pub mod refresh_token;
pub mod reset_password;

impl From<Account> for crate::proto::Account {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.to_string(),
            email: account.email.as_str().to_string(),
            role: account.role.as_str().to_string(),
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

impl From<LoginOutcome> for crate::proto::LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            id: outcome.account.id.to_string(),
            email: outcome.account.email.as_str().to_string(),
            access_expires_at: outcome.grant.access.expires_at().to_rfc3339(),
            refresh_expires_at: outcome.grant.refresh.expires_at().to_rfc3339(),
            access_token: outcome.grant.access.token,
            refresh_token: outcome.grant.refresh.token,
        }
    }
}

impl From<AccountError> for Status {
    fn from(err: AccountError) -> Self {
        if err.is_internal() {
            tracing::error!(error = %err, "Call failed");
            return Status::internal("internal error");
        }

        match err {
            AccountError::NotFound(_) => Status::not_found(err.to_string()),
            AccountError::Authentication(_) => Status::unauthenticated(err.to_string()),
            AccountError::Conflict(_) => Status::already_exists(err.to_string()),
            AccountError::InvalidToken(_)
            | AccountError::InvalidAccountId(_)
            | AccountError::InvalidEmail(_)
            | AccountError::InvalidRole(_) => Status::invalid_argument(err.to_string()),
            AccountError::Signing(_)
            | AccountError::Hashing(_)
            | AccountError::Delivery(_)
            | AccountError::Store(_) => Status::internal("internal error"),
        }
    }
}

impl From<AuthorizationError> for Status {
    fn from(err: AuthorizationError) -> Self {
        match err {
            AuthorizationError::Unauthenticated(_) | AuthorizationError::UnknownSubject(_) => {
                Status::unauthenticated("invalid or missing access token")
            }
            AuthorizationError::Denied(_) => Status::permission_denied("access denied"),
            AuthorizationError::Store(_) => {
                tracing::error!(error = %err, "Authorization failed");
                Status::internal("internal error")
            }
        }
    }
}
