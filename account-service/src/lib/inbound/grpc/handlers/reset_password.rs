use std::sync::Arc;

use tonic::Status;

use crate::domain::account::models::ResetPasswordCommand;
use crate::domain::account::models::ResetToken;
use crate::domain::account::ports::AccountServicePort;
use crate::proto::ResetPasswordRequest;
use crate::proto::ResetPasswordResponse;

pub async fn reset_password(
    service: Arc<dyn AccountServicePort>,
    request: ResetPasswordRequest,
) -> Result<ResetPasswordResponse, Status> {
    if request.password.is_empty() {
        return Err(Status::invalid_argument("Password must not be empty"));
    }

    service
        .reset_password(ResetPasswordCommand {
            token: ResetToken::from(request.reset_token),
            password: request.password,
        })
        .await?;

    Ok(ResetPasswordResponse {
        message: "password updated".to_string(),
    })
}
