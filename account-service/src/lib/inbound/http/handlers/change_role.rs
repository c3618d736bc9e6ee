use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::Role;
use crate::inbound::http::middleware::AuthenticatedAccount;
use crate::inbound::http::router::AppState;

pub async fn change_role(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedAccount>,
    Path(account_id): Path<String>,
    Json(body): Json<ChangeRoleRequestBody>,
) -> Result<ApiSuccess<AccountData>, ApiError> {
    let account_id =
        AccountId::from_string(&account_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let role = body
        .role
        .parse::<Role>()
        .map_err(|e| ApiError::UnprocessableEntity(e.to_string()))?;

    let account = state
        .account_service
        .change_role(&account_id, role)
        .await
        .map_err(ApiError::from)?;

    tracing::info!(
        changed_by = %caller.account_id,
        account_id = %account.id,
        role = %account.role,
        "Role assignment updated"
    );

    Ok(ApiSuccess::new(StatusCode::OK, (&account).into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangeRoleRequestBody {
    role: String,
}
