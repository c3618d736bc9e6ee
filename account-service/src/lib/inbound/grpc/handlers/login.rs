use std::sync::Arc;

use tonic::Status;

use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::LoginCommand;
use crate::domain::account::ports::AccountServicePort;
use crate::proto::LoginRequest;
use crate::proto::LoginResponse;

pub async fn login(
    service: Arc<dyn AccountServicePort>,
    request: LoginRequest,
) -> Result<LoginResponse, Status> {
    let email = EmailAddress::new(request.email)
        .map_err(|e| Status::invalid_argument(format!("Invalid email: {}", e)))?;

    let outcome = service
        .login(LoginCommand {
            email,
            password: request.password,
        })
        .await?;

    Ok(outcome.into())
}
