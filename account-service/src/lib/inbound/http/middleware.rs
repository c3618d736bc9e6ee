use axum::extract::Request;
use axum::extract::State;
use axum::middleware::Next;
use axum::response::Response;
use http::header::AUTHORIZATION;
use http::Method;

use crate::domain::account::models::AccountId;
use crate::domain::account::models::Role;
use crate::domain::authorization::models::Action;
use crate::inbound::bearer_token;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Extension type carrying the caller admitted by the gate
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account_id: AccountId,
    pub role: Role,
}

/// Middleware that runs every protected request through the authorization
/// gate before the handler is invoked.
pub async fn authorize(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_owned);

    let action = action_for(req.method());
    let path = req.uri().path().to_string();

    let account = state
        .gate
        .admit(token.as_deref(), &path, action)
        .await
        .map_err(|e| {
            tracing::warn!(path = %path, action = %action, "Request rejected: {}", e);
            ApiError::from(e)
        })?;

    req.extensions_mut().insert(AuthenticatedAccount {
        account_id: account.id,
        role: account.role,
    });

    Ok(next.run(req).await)
}

/// Map an HTTP method onto the policy action it performs.
pub fn action_for(method: &Method) -> Action {
    match *method {
        Method::GET | Method::HEAD | Method::OPTIONS => Action::Read,
        Method::POST => Action::Create,
        Method::PUT | Method::PATCH => Action::Update,
        Method::DELETE => Action::Delete,
        // Only wildcard rules grant unrecognised verbs.
        _ => Action::Any,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_for_method() {
        assert_eq!(action_for(&Method::GET), Action::Read);
        assert_eq!(action_for(&Method::POST), Action::Create);
        assert_eq!(action_for(&Method::PUT), Action::Update);
        assert_eq!(action_for(&Method::PATCH), Action::Update);
        assert_eq!(action_for(&Method::DELETE), Action::Delete);
    }
}
