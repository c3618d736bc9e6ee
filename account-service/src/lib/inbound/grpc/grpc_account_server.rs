use std::sync::Arc;

use tonic::Request;
use tonic::Response;
use tonic::Status;

use super::handlers::create_account;
use super::handlers::forgot_password;
use super::handlers::get_account;
use super::handlers::login;
use super::handlers::refresh_token;
use super::handlers::reset_password;
use crate::domain::account::ports::AccountServicePort;
use crate::domain::authorization::gate::AuthorizationPort;
use crate::domain::authorization::models::Action;
use crate::inbound::bearer_token;
use crate::proto::account_service_server::AccountService as AccountServiceProto;
use crate::proto::CreateAccountRequest;
use crate::proto::CreateAccountResponse;
use crate::proto::ForgotPasswordRequest;
use crate::proto::ForgotPasswordResponse;
use crate::proto::GetAccountRequest;
use crate::proto::GetAccountResponse;
use crate::proto::LoginRequest;
use crate::proto::LoginResponse;
use crate::proto::RefreshTokenRequest;
use crate::proto::ResetPasswordRequest;
use crate::proto::ResetPasswordResponse;

/// Resource path the gate sees for `GetAccount` calls.
pub const GET_ACCOUNT_PATH: &str = "/account.AccountService/GetAccount";

pub struct AccountGrpcService {
    service: Arc<dyn AccountServicePort>,
    gate: Arc<dyn AuthorizationPort>,
}

impl AccountGrpcService {
    pub fn new(service: Arc<dyn AccountServicePort>, gate: Arc<dyn AuthorizationPort>) -> Self {
        Self { service, gate }
    }

    async fn authorize<T>(
        &self,
        request: &Request<T>,
        path: &str,
        action: Action,
    ) -> Result<(), Status> {
        let token = request
            .metadata()
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .map(str::to_owned);

        self.gate
            .admit(token.as_deref(), path, action)
            .await
            .map(|_| ())
            .map_err(|e| {
                tracing::warn!(path, action = %action, "Call rejected: {}", e);
                Status::from(e)
            })
    }
}

#[tonic::async_trait]
impl AccountServiceProto for AccountGrpcService {
    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let response = login::login(self.service.clone(), request.into_inner()).await?;
        Ok(Response::new(response))
    }

    async fn create_account(
        &self,
        request: Request<CreateAccountRequest>,
    ) -> Result<Response<CreateAccountResponse>, Status> {
        let response =
            create_account::create_account(self.service.clone(), request.into_inner()).await?;
        Ok(Response::new(response))
    }

    async fn forgot_password(
        &self,
        request: Request<ForgotPasswordRequest>,
    ) -> Result<Response<ForgotPasswordResponse>, Status> {
        let response =
            forgot_password::forgot_password(self.service.clone(), request.into_inner()).await?;
        Ok(Response::new(response))
    }

    async fn reset_password(
        &self,
        request: Request<ResetPasswordRequest>,
    ) -> Result<Response<ResetPasswordResponse>, Status> {
        let response =
            reset_password::reset_password(self.service.clone(), request.into_inner()).await?;
        Ok(Response::new(response))
    }

    async fn refresh_token(
        &self,
        request: Request<RefreshTokenRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let response =
            refresh_token::refresh_token(self.service.clone(), request.into_inner()).await?;
        Ok(Response::new(response))
    }

    async fn get_account(
        &self,
        request: Request<GetAccountRequest>,
    ) -> Result<Response<GetAccountResponse>, Status> {
        self.authorize(&request, GET_ACCOUNT_PATH, Action::Read)
            .await?;

        let response = get_account::get_account(self.service.clone(), request.into_inner()).await?;
        Ok(Response::new(response))
    }
}
