use std::sync::Arc;

use tonic::Status;

use crate::domain::account::models::CreateAccountCommand;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::ports::AccountServicePort;
use crate::proto::CreateAccountRequest;
use crate::proto::CreateAccountResponse;

pub async fn create_account(
    service: Arc<dyn AccountServicePort>,
    request: CreateAccountRequest,
) -> Result<CreateAccountResponse, Status> {
    let email = EmailAddress::new(request.email)
        .map_err(|e| Status::invalid_argument(format!("Invalid email: {}", e)))?;
    if request.password.is_empty() {
        return Err(Status::invalid_argument("Password must not be empty"));
    }

    let account = service
        .create_account(CreateAccountCommand::new(email, request.password))
        .await?;

    Ok(CreateAccountResponse {
        account: Some(account.into()),
    })
}
