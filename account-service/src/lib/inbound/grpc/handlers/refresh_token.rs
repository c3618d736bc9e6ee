use std::sync::Arc;

use tonic::Status;

use crate::domain::account::ports::AccountServicePort;
use crate::proto::LoginResponse;
use crate::proto::RefreshTokenRequest;

pub async fn refresh_token(
    service: Arc<dyn AccountServicePort>,
    request: RefreshTokenRequest,
) -> Result<LoginResponse, Status> {
    Ok(service.refresh(&request.refresh_token).await?.into())
}
