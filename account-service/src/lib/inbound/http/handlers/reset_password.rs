use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::domain::account::models::ResetPasswordCommand;
use crate::domain::account::models::ResetToken;
use crate::inbound::http::router::AppState;

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequestBody>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    if body.password.is_empty() {
        return Err(ApiError::UnprocessableEntity(
            "Password must not be empty".to_string(),
        ));
    }

    state
        .account_service
        .reset_password(ResetPasswordCommand {
            token: ResetToken::from(body.reset_token),
            password: body.password,
        })
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData {
            message: "password updated".to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetPasswordRequestBody {
    reset_token: String,
    password: String,
}
