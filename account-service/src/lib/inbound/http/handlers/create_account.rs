use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use thiserror::Error;

use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use crate::account::errors::EmailError;
use crate::domain::account::models::CreateAccountCommand;
use crate::domain::account::models::EmailAddress;
use crate::inbound::http::router::AppState;

pub async fn create_account(
    State(state): State<AppState>,
    Json(body): Json<CreateAccountRequest>,
) -> Result<ApiSuccess<AccountData>, ApiError> {
    state
        .account_service
        .create_account(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref account| ApiSuccess::new(StatusCode::CREATED, account.into()))
}

/// HTTP request body for creating an account (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateAccountRequest {
    email: String,
    password: String,
}

#[derive(Debug, Clone, Error)]
enum ParseCreateAccountRequestError {
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Password must not be empty")]
    EmptyPassword,
}

impl CreateAccountRequest {
    fn try_into_command(self) -> Result<CreateAccountCommand, ParseCreateAccountRequestError> {
        let email = EmailAddress::new(self.email)?;
        if self.password.is_empty() {
            return Err(ParseCreateAccountRequestError::EmptyPassword);
        }
        Ok(CreateAccountCommand::new(email, self.password))
    }
}

impl From<ParseCreateAccountRequestError> for ApiError {
    fn from(err: ParseCreateAccountRequestError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}
