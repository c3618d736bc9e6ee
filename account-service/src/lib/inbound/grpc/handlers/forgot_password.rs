use std::sync::Arc;

use tonic::Status;

use crate::domain::account::models::EmailAddress;
use crate::domain::account::ports::AccountServicePort;
use crate::proto::ForgotPasswordRequest;
use crate::proto::ForgotPasswordResponse;

pub async fn forgot_password(
    service: Arc<dyn AccountServicePort>,
    request: ForgotPasswordRequest,
) -> Result<ForgotPasswordResponse, Status> {
    let email = EmailAddress::new(request.email)
        .map_err(|e| Status::invalid_argument(format!("Invalid email: {}", e)))?;

    service.forgot_password(&email).await?;

    Ok(ForgotPasswordResponse {
        message: "password reset instructions sent".to_string(),
    })
}
