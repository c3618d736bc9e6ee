use std::sync::Arc;

use tonic::Status;

use crate::domain::account::models::AccountId;
use crate::domain::account::ports::AccountServicePort;
use crate::proto::GetAccountRequest;
use crate::proto::GetAccountResponse;

pub async fn get_account(
    service: Arc<dyn AccountServicePort>,
    request: GetAccountRequest,
) -> Result<GetAccountResponse, Status> {
    let account_id = AccountId::from_string(&request.account_id)
        .map_err(|e| Status::invalid_argument(format!("Invalid account ID: {}", e)))?;

    let account = service.get_account(&account_id).await?;

    Ok(GetAccountResponse {
        account: Some(account.into()),
    })
}
