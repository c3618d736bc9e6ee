use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;

use crate::account::ports::AccountRepository;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::Role;
use crate::domain::authorization::errors::AuthorizationError;
use crate::domain::authorization::models::Action;
use crate::domain::authorization::models::Decision;
use crate::domain::authorization::policy::PolicyTable;

/// Port for admitting requests to protected operations.
#[async_trait]
pub trait AuthorizationPort: Send + Sync + 'static {
    /// Decide whether the bearer of `access_token` may perform `action` on
    /// `path`.
    ///
    /// # Returns
    /// The authenticated account when admitted
    ///
    /// # Errors
    /// * `Unauthenticated` - Missing, malformed, expired or foreign token
    /// * `UnknownSubject` - Token subject has no account
    /// * `Denied` - Policy rejects the request
    /// * `Store` - Subject lookup failed
    async fn admit(
        &self,
        access_token: Option<&str>,
        path: &str,
        action: Action,
    ) -> Result<Account, AuthorizationError>;
}

/// Authorization gate: verified identity plus a role-keyed policy table.
pub struct AuthorizationGate<AR>
where
    AR: AccountRepository,
{
    authenticator: Arc<Authenticator>,
    repository: Arc<AR>,
    policy: Arc<PolicyTable>,
}

impl<AR> AuthorizationGate<AR>
where
    AR: AccountRepository,
{
    pub fn new(
        authenticator: Arc<Authenticator>,
        repository: Arc<AR>,
        policy: Arc<PolicyTable>,
    ) -> Self {
        Self {
            authenticator,
            repository,
            policy,
        }
    }

    /// Pure policy check, no identity involved.
    pub fn enforce(&self, role: Role, path: &str, action: Action) -> Decision {
        self.policy.enforce(role, path, action)
    }
}

#[async_trait]
impl<AR> AuthorizationPort for AuthorizationGate<AR>
where
    AR: AccountRepository,
{
    async fn admit(
        &self,
        access_token: Option<&str>,
        path: &str,
        action: Action,
    ) -> Result<Account, AuthorizationError> {
        let token = access_token
            .ok_or_else(|| AuthorizationError::Unauthenticated("missing token".to_string()))?;

        let claims = self
            .authenticator
            .validate_access_token(token)
            .map_err(|e| AuthorizationError::Unauthenticated(e.to_string()))?;

        let account_id = AccountId::from_string(&claims.sub)
            .map_err(|e| AuthorizationError::Unauthenticated(e.to_string()))?;

        let account = self
            .repository
            .find_account_by_id(&account_id)
            .await
            .map_err(|e| AuthorizationError::Store(e.to_string()))?
            .ok_or_else(|| AuthorizationError::UnknownSubject(account_id.to_string()))?;

        match self.enforce(account.role, path, action) {
            Decision::Allow => Ok(account),
            Decision::Deny => {
                tracing::info!(
                    account_id = %account.id,
                    role = %account.role,
                    path,
                    action = %action,
                    "Request denied by policy"
                );
                Err(AuthorizationError::Denied(format!(
                    "{} may not {} {}",
                    account.role, action, path
                )))
            }
        }
    }
}
