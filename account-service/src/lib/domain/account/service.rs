use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use chrono::Duration;
use chrono::Utc;

use crate::account::errors::AccountError;
use crate::account::errors::PASSWORD_NOT_MATCHED;
use crate::account::errors::RESET_TOKEN_CONSUMED;
use crate::account::errors::RESET_TOKEN_EXPIRED;
use crate::account::errors::RESET_TOKEN_NOT_MATCHED;
use crate::account::errors::USER_ALREADY_EXISTS;
use crate::account::errors::USER_NOT_FOUND;
use crate::account::ports::AccountRepository;
use crate::account::ports::AccountServicePort;
use crate::account::ports::EventPublisher;
use crate::domain::account::events::AccountCreatedEvent;
use crate::domain::account::events::PasswordChangedEvent;
use crate::domain::account::events::PasswordResetRequestedEvent;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::CreateAccountCommand;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::LoginCommand;
use crate::domain::account::models::LoginOutcome;
use crate::domain::account::models::PasswordResetRequest;
use crate::domain::account::models::ResetPasswordCommand;
use crate::domain::account::models::Role;

/// Default lifetime of a password reset token.
pub const DEFAULT_RESET_TOKEN_TTL_MINUTES: i64 = 30;

/// Authentication service: login, account creation and the password reset
/// handshake.
///
/// Holds no per-request state; everything mutable lives in the repository.
/// Argon2 work is moved to the blocking pool so it never stalls the async
/// workers.
pub struct AccountService<AR, EP>
where
    AR: AccountRepository,
    EP: EventPublisher,
{
    repository: Arc<AR>,
    event_publisher: Arc<EP>,
    authenticator: Arc<Authenticator>,
    reset_token_ttl: Duration,
}

impl<AR, EP> AccountService<AR, EP>
where
    AR: AccountRepository,
    EP: EventPublisher,
{
    /// Create a new account service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Credential store implementation
    /// * `event_publisher` - Domain event publishing implementation
    /// * `authenticator` - Password hasher and token issuer
    /// * `reset_token_ttl` - How long a reset token stays usable
    pub fn new(
        repository: Arc<AR>,
        event_publisher: Arc<EP>,
        authenticator: Arc<Authenticator>,
        reset_token_ttl: Duration,
    ) -> Self {
        Self {
            repository,
            event_publisher,
            authenticator,
            reset_token_ttl,
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, AccountError> {
        let authenticator = Arc::clone(&self.authenticator);

        tokio::task::spawn_blocking(move || authenticator.hash_password(&password))
            .await
            .map_err(|e| AccountError::Hashing(e.to_string()))?
            .map_err(|e| AccountError::Hashing(e.to_string()))
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Account>, AccountError> {
        self.repository.find_account_by_email(email).await
    }

    fn issue_grant(&self, account: Account) -> Result<LoginOutcome, AccountError> {
        let grant = self
            .authenticator
            .issue_grant(&account.id.to_string())
            .map_err(|e| AccountError::Signing(e.to_string()))?;

        Ok(LoginOutcome { account, grant })
    }
}

#[async_trait]
impl<AR, EP> AccountServicePort for AccountService<AR, EP>
where
    AR: AccountRepository,
    EP: EventPublisher,
{
    async fn login(&self, command: LoginCommand) -> Result<LoginOutcome, AccountError> {
        let account = self
            .find_by_email(&command.email)
            .await?
            .ok_or_else(|| AccountError::Authentication(USER_NOT_FOUND.to_string()))?;

        let authenticator = Arc::clone(&self.authenticator);
        let stored_hash = account.password_hash.clone();
        let subject = account.id.to_string();
        let password = command.password;

        let grant = tokio::task::spawn_blocking(move || {
            authenticator.authenticate(&password, &stored_hash, &subject)
        })
        .await
        .map_err(|e| AccountError::Hashing(e.to_string()))?
        .map_err(|e| match e {
            AuthenticationError::InvalidCredentials => {
                tracing::info!(account_id = %account.id, "Login rejected: password mismatch");
                AccountError::Authentication(PASSWORD_NOT_MATCHED.to_string())
            }
            AuthenticationError::JwtError(err) => AccountError::Signing(err.to_string()),
        })?;

        tracing::info!(account_id = %account.id, "Login succeeded");

        Ok(LoginOutcome { account, grant })
    }

    async fn create_account(
        &self,
        command: CreateAccountCommand,
    ) -> Result<Account, AccountError> {
        let password_hash = self.hash_password(command.password).await?;

        // Fast path only: the store's unique index is what actually closes
        // the race between two concurrent registrations.
        if self.repository.count_accounts_by_email(&command.email).await? > 0 {
            return Err(AccountError::Conflict(USER_ALREADY_EXISTS.to_string()));
        }

        let account = Account {
            id: AccountId::new(),
            email: command.email,
            password_hash,
            role: Role::Member,
            created_at: Utc::now(),
        };

        let created_account = self.repository.create_account(account).await?;
        tracing::info!(account_id = %created_account.id, "Account created");

        let event = AccountCreatedEvent::new(&created_account);
        if let Err(e) = self.event_publisher.publish_account_created(&event).await {
            tracing::error!(
                "Failed to publish AccountCreated event for account {}: {}",
                created_account.id,
                e
            );
        }

        Ok(created_account)
    }

    async fn forgot_password(
        &self,
        email: &EmailAddress,
    ) -> Result<PasswordResetRequest, AccountError> {
        let account = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| AccountError::NotFound(USER_NOT_FOUND.to_string()))?;

        let request = PasswordResetRequest::issue(
            account.email.clone(),
            Utc::now(),
            self.reset_token_ttl,
        );
        let request = self.repository.create_reset_request(request).await?;

        let event = PasswordResetRequestedEvent::new(&account, &request);
        self.event_publisher
            .publish_password_reset_requested(&event)
            .await
            .map_err(|e| AccountError::Delivery(e.to_string()))?;

        tracing::info!(
            account_id = %account.id,
            expires_at = %request.expires_at,
            "Password reset requested"
        );

        Ok(request)
    }

    async fn reset_password(
        &self,
        command: ResetPasswordCommand,
    ) -> Result<Account, AccountError> {
        let request = self
            .repository
            .find_reset_request_by_token(&command.token)
            .await?
            .ok_or_else(|| AccountError::InvalidToken(RESET_TOKEN_NOT_MATCHED.to_string()))?;

        if request.token != command.token {
            return Err(AccountError::InvalidToken(
                RESET_TOKEN_NOT_MATCHED.to_string(),
            ));
        }

        let now = Utc::now();
        if request.is_consumed() {
            return Err(AccountError::InvalidToken(RESET_TOKEN_CONSUMED.to_string()));
        }
        if request.is_expired(now) {
            return Err(AccountError::InvalidToken(RESET_TOKEN_EXPIRED.to_string()));
        }

        let account = self
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AccountError::Authentication(USER_NOT_FOUND.to_string()))?;

        let password_hash = self.hash_password(command.password).await?;

        // None means a concurrent reset claimed the token first.
        let updated_account = self
            .repository
            .complete_password_reset(&request.id, &account.id, password_hash, now)
            .await?
            .ok_or_else(|| AccountError::InvalidToken(RESET_TOKEN_CONSUMED.to_string()))?;
        tracing::info!(account_id = %updated_account.id, "Password reset completed");

        let event = PasswordChangedEvent::new(&updated_account);
        if let Err(e) = self.event_publisher.publish_password_changed(&event).await {
            tracing::error!(
                "Failed to publish PasswordChanged event for account {}: {}",
                updated_account.id,
                e
            );
        }

        Ok(updated_account)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<LoginOutcome, AccountError> {
        let claims = self
            .authenticator
            .validate_refresh_token(refresh_token)
            .map_err(|e| AccountError::InvalidToken(e.to_string()))?;

        let account_id = AccountId::from_string(&claims.sub)
            .map_err(|e| AccountError::InvalidToken(e.to_string()))?;

        let account = self
            .repository
            .find_account_by_id(&account_id)
            .await?
            .ok_or_else(|| AccountError::Authentication(USER_NOT_FOUND.to_string()))?;

        self.issue_grant(account)
    }

    async fn get_account(&self, id: &AccountId) -> Result<Account, AccountError> {
        self.repository
            .find_account_by_id(id)
            .await?
            .ok_or_else(|| AccountError::NotFound(USER_NOT_FOUND.to_string()))
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, AccountError> {
        self.repository.list_accounts().await
    }

    async fn change_role(&self, id: &AccountId, role: Role) -> Result<Account, AccountError> {
        let updated_account = self.repository.update_role(id, role).await?;
        tracing::info!(account_id = %updated_account.id, role = %role, "Role changed");

        Ok(updated_account)
    }
}

#[cfg(test)]
mod tests {
    use auth::PasswordHasher;
    use auth::TokenIssuer;
    use auth::WorkFactor;
    use chrono::DateTime;
    use mockall::mock;
    use uuid::Uuid;

    use super::*;
    use crate::account::errors::EventPublisherError;
    use crate::domain::account::events::AccountCreatedEvent;
    use crate::domain::account::events::PasswordChangedEvent;
    use crate::domain::account::events::PasswordResetRequestedEvent;
    use crate::domain::account::models::ResetToken;

    mock! {
        pub TestAccountRepository {}

        #[async_trait]
        impl AccountRepository for TestAccountRepository {
            async fn find_account_by_email(&self, email: &EmailAddress) -> Result<Option<Account>, AccountError>;
            async fn find_account_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError>;
            async fn count_accounts_by_email(&self, email: &EmailAddress) -> Result<i64, AccountError>;
            async fn create_account(&self, account: Account) -> Result<Account, AccountError>;
            async fn update_role(&self, id: &AccountId, role: Role) -> Result<Account, AccountError>;
            async fn list_accounts(&self) -> Result<Vec<Account>, AccountError>;
            async fn find_reset_request_by_token(&self, token: &ResetToken) -> Result<Option<PasswordResetRequest>, AccountError>;
            async fn create_reset_request(&self, request: PasswordResetRequest) -> Result<PasswordResetRequest, AccountError>;
            async fn complete_password_reset(&self, request_id: &Uuid, account_id: &AccountId, password_hash: String, consumed_at: DateTime<Utc>) -> Result<Option<Account>, AccountError>;
        }
    }

    mock! {
        pub TestEventPublisher {}

        #[async_trait]
        impl EventPublisher for TestEventPublisher {
            async fn publish_account_created(&self, event: &AccountCreatedEvent) -> Result<(), EventPublisherError>;
            async fn publish_password_reset_requested(&self, event: &PasswordResetRequestedEvent) -> Result<(), EventPublisherError>;
            async fn publish_password_changed(&self, event: &PasswordChangedEvent) -> Result<(), EventPublisherError>;
        }
    }

    fn hasher() -> PasswordHasher {
        PasswordHasher::with_work_factor(WorkFactor {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    fn authenticator() -> Arc<Authenticator> {
        let issuer =
            TokenIssuer::with_default_lifetimes(b"test_secret_key_at_least_32_bytes!", "test")
                .unwrap();
        Arc::new(Authenticator::new(hasher(), issuer))
    }

    fn service(
        repository: MockTestAccountRepository,
        event_publisher: MockTestEventPublisher,
    ) -> AccountService<MockTestAccountRepository, MockTestEventPublisher> {
        AccountService::new(
            Arc::new(repository),
            Arc::new(event_publisher),
            authenticator(),
            Duration::minutes(DEFAULT_RESET_TOKEN_TTL_MINUTES),
        )
    }

    fn email(raw: &str) -> EmailAddress {
        EmailAddress::new(raw.to_string()).unwrap()
    }

    fn account_with_password(password: &str) -> Account {
        Account {
            id: AccountId::new(),
            email: email("a@x.com"),
            password_hash: hasher().hash(password).unwrap(),
            role: Role::Member,
            created_at: Utc::now(),
        }
    }

    fn pending_request(token: ResetToken) -> PasswordResetRequest {
        let now = Utc::now();
        PasswordResetRequest {
            id: Uuid::new_v4(),
            email: email("a@x.com"),
            token,
            created_at: now,
            expires_at: now + Duration::minutes(30),
            consumed_at: None,
        }
    }

    #[tokio::test]
    async fn test_login_success_issues_bound_tokens() {
        let mut repository = MockTestAccountRepository::new();
        let account = account_with_password("secret1");
        let account_id = account.id;

        let returned = account.clone();
        repository
            .expect_find_account_by_email()
            .withf(|email| email.as_str() == "a@x.com")
            .times(1)
            .returning(move |_| Ok(Some(returned.clone())));

        let service = service(repository, MockTestEventPublisher::new());
        let before = Utc::now();

        let outcome = service
            .login(LoginCommand {
                email: email("a@x.com"),
                password: "secret1".to_string(),
            })
            .await
            .expect("login failed");

        assert_eq!(outcome.account.id, account_id);
        assert_eq!(outcome.grant.access.claims.sub, account_id.to_string());
        assert_eq!(outcome.grant.refresh.claims.sub, account_id.to_string());

        let access_drift = outcome.grant.access.expires_at() - (before + Duration::hours(1));
        let refresh_drift = outcome.grant.refresh.expires_at() - (before + Duration::days(7));
        assert!(access_drift.num_seconds().abs() <= 5);
        assert!(refresh_drift.num_seconds().abs() <= 5);
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_account_by_email()
            .times(1)
            .returning(|_| Ok(None));

        let service = service(repository, MockTestEventPublisher::new());

        let result = service
            .login(LoginCommand {
                email: email("nobody@x.com"),
                password: "secret1".to_string(),
            })
            .await;

        assert!(matches!(
            result,
            Err(AccountError::Authentication(ref msg)) if msg == USER_NOT_FOUND
        ));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let mut repository = MockTestAccountRepository::new();
        let account = account_with_password("secret1");
        repository
            .expect_find_account_by_email()
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));

        let service = service(repository, MockTestEventPublisher::new());

        let result = service
            .login(LoginCommand {
                email: email("a@x.com"),
                password: "wrong".to_string(),
            })
            .await;

        assert!(matches!(
            result,
            Err(AccountError::Authentication(ref msg)) if msg == PASSWORD_NOT_MATCHED
        ));
    }

    #[tokio::test]
    async fn test_create_account_success() {
        let mut repository = MockTestAccountRepository::new();
        let mut event_publisher = MockTestEventPublisher::new();

        repository
            .expect_count_accounts_by_email()
            .times(1)
            .returning(|_| Ok(0));
        repository
            .expect_create_account()
            .withf(|account| {
                account.email.as_str() == "a@x.com"
                    && account.role == Role::Member
                    && account.password_hash.starts_with("$argon2id")
            })
            .times(1)
            .returning(|account| Ok(account));
        event_publisher
            .expect_publish_account_created()
            .withf(|event| event.email == "a@x.com" && event.role == "member")
            .times(1)
            .returning(|_| Ok(()));

        let service = service(repository, event_publisher);

        let account = service
            .create_account(CreateAccountCommand::new(
                email("a@x.com"),
                "secret1".to_string(),
            ))
            .await
            .expect("create failed");

        assert_eq!(account.role, Role::Member);
        assert!(hasher().verify("secret1", &account.password_hash));
    }

    #[tokio::test]
    async fn test_create_account_existing_email() {
        let mut repository = MockTestAccountRepository::new();
        let mut event_publisher = MockTestEventPublisher::new();

        repository
            .expect_count_accounts_by_email()
            .times(1)
            .returning(|_| Ok(1));
        repository.expect_create_account().times(0);
        event_publisher.expect_publish_account_created().times(0);

        let service = service(repository, event_publisher);

        let result = service
            .create_account(CreateAccountCommand::new(
                email("a@x.com"),
                "secret2".to_string(),
            ))
            .await;

        assert!(matches!(
            result,
            Err(AccountError::Conflict(ref msg)) if msg == USER_ALREADY_EXISTS
        ));
    }

    #[tokio::test]
    async fn test_create_account_unique_violation_from_store() {
        let mut repository = MockTestAccountRepository::new();
        let mut event_publisher = MockTestEventPublisher::new();

        // Lost the race: count said free, insert hit the unique index.
        repository
            .expect_count_accounts_by_email()
            .times(1)
            .returning(|_| Ok(0));
        repository
            .expect_create_account()
            .times(1)
            .returning(|_| Err(AccountError::Conflict(USER_ALREADY_EXISTS.to_string())));
        event_publisher.expect_publish_account_created().times(0);

        let service = service(repository, event_publisher);

        let result = service
            .create_account(CreateAccountCommand::new(
                email("a@x.com"),
                "secret1".to_string(),
            ))
            .await;

        assert!(matches!(result, Err(AccountError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_account_survives_publish_failure() {
        let mut repository = MockTestAccountRepository::new();
        let mut event_publisher = MockTestEventPublisher::new();

        repository
            .expect_count_accounts_by_email()
            .returning(|_| Ok(0));
        repository
            .expect_create_account()
            .returning(|account| Ok(account));
        event_publisher
            .expect_publish_account_created()
            .times(1)
            .returning(|_| Err(EventPublisherError::PublishFailed("down".to_string())));

        let service = service(repository, event_publisher);

        let result = service
            .create_account(CreateAccountCommand::new(
                email("a@x.com"),
                "secret1".to_string(),
            ))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email_persists_nothing() {
        let mut repository = MockTestAccountRepository::new();
        let mut event_publisher = MockTestEventPublisher::new();

        repository
            .expect_find_account_by_email()
            .times(1)
            .returning(|_| Ok(None));
        repository.expect_create_reset_request().times(0);
        event_publisher
            .expect_publish_password_reset_requested()
            .times(0);

        let service = service(repository, event_publisher);

        let result = service.forgot_password(&email("nobody@x.com")).await;
        assert!(matches!(result, Err(AccountError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_forgot_password_delivers_token_out_of_band() {
        let mut repository = MockTestAccountRepository::new();
        let mut event_publisher = MockTestEventPublisher::new();

        let account = account_with_password("secret1");
        let account_id = account.id.to_string();
        repository
            .expect_find_account_by_email()
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));
        repository
            .expect_create_reset_request()
            .withf(|request| request.email.as_str() == "a@x.com" && !request.is_consumed())
            .times(1)
            .returning(|request| Ok(request));
        event_publisher
            .expect_publish_password_reset_requested()
            .withf(move |event| event.account_id == account_id && event.reset_token.len() == 43)
            .times(1)
            .returning(|_| Ok(()));

        let service = service(repository, event_publisher);
        let before = Utc::now();

        let request = service
            .forgot_password(&email("a@x.com"))
            .await
            .expect("forgot password failed");

        let drift = request.expires_at - (before + Duration::minutes(30));
        assert!(drift.num_seconds().abs() <= 5);
    }

    #[tokio::test]
    async fn test_forgot_password_delivery_failure() {
        let mut repository = MockTestAccountRepository::new();
        let mut event_publisher = MockTestEventPublisher::new();

        let account = account_with_password("secret1");
        repository
            .expect_find_account_by_email()
            .returning(move |_| Ok(Some(account.clone())));
        repository
            .expect_create_reset_request()
            .returning(|request| Ok(request));
        event_publisher
            .expect_publish_password_reset_requested()
            .returning(|_| Err(EventPublisherError::PublishFailed("down".to_string())));

        let service = service(repository, event_publisher);

        let result = service.forgot_password(&email("a@x.com")).await;
        assert!(matches!(result, Err(AccountError::Delivery(_))));
    }

    #[tokio::test]
    async fn test_reset_password_unknown_token_mutates_nothing() {
        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_reset_request_by_token()
            .times(1)
            .returning(|_| Ok(None));
        repository.expect_complete_password_reset().times(0);

        let service = service(repository, MockTestEventPublisher::new());

        let result = service
            .reset_password(ResetPasswordCommand {
                token: ResetToken::from("123456789".to_string()),
                password: "newpw".to_string(),
            })
            .await;

        assert!(matches!(
            result,
            Err(AccountError::InvalidToken(ref msg)) if msg == RESET_TOKEN_NOT_MATCHED
        ));
    }

    #[tokio::test]
    async fn test_reset_password_success_replaces_hash() {
        let mut repository = MockTestAccountRepository::new();
        let mut event_publisher = MockTestEventPublisher::new();

        let token = ResetToken::generate();
        let request = pending_request(token.clone());
        let request_id = request.id;
        let account = account_with_password("oldpw");
        let account_id = account.id;
        let stored = account.clone();

        repository
            .expect_find_reset_request_by_token()
            .times(1)
            .returning(move |_| Ok(Some(request.clone())));
        repository
            .expect_find_account_by_email()
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));
        repository
            .expect_complete_password_reset()
            .withf(move |id, owner, password_hash, _| {
                let hasher = hasher();
                *id == request_id
                    && *owner == account_id
                    && hasher.verify("newpw", password_hash)
                    && !hasher.verify("oldpw", password_hash)
            })
            .times(1)
            .returning(move |_, _, password_hash, _| {
                let mut updated = stored.clone();
                updated.password_hash = password_hash;
                Ok(Some(updated))
            });
        event_publisher
            .expect_publish_password_changed()
            .times(1)
            .returning(|_| Ok(()));

        let service = service(repository, event_publisher);

        let result = service
            .reset_password(ResetPasswordCommand {
                token,
                password: "newpw".to_string(),
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_reset_password_expired_token() {
        let mut repository = MockTestAccountRepository::new();

        let token = ResetToken::generate();
        let mut request = pending_request(token.clone());
        request.expires_at = Utc::now() - Duration::minutes(1);

        repository
            .expect_find_reset_request_by_token()
            .returning(move |_| Ok(Some(request.clone())));
        repository.expect_complete_password_reset().times(0);

        let service = service(repository, MockTestEventPublisher::new());

        let result = service
            .reset_password(ResetPasswordCommand {
                token,
                password: "newpw".to_string(),
            })
            .await;

        assert!(matches!(
            result,
            Err(AccountError::InvalidToken(ref msg)) if msg == RESET_TOKEN_EXPIRED
        ));
    }

    #[tokio::test]
    async fn test_reset_password_consumed_token() {
        let mut repository = MockTestAccountRepository::new();

        let token = ResetToken::generate();
        let mut request = pending_request(token.clone());
        request.consumed_at = Some(Utc::now());

        repository
            .expect_find_reset_request_by_token()
            .returning(move |_| Ok(Some(request.clone())));
        repository.expect_complete_password_reset().times(0);

        let service = service(repository, MockTestEventPublisher::new());

        let result = service
            .reset_password(ResetPasswordCommand {
                token,
                password: "newpw".to_string(),
            })
            .await;

        assert!(matches!(
            result,
            Err(AccountError::InvalidToken(ref msg)) if msg == RESET_TOKEN_CONSUMED
        ));
    }

    #[tokio::test]
    async fn test_reset_password_lost_consume_race() {
        let mut repository = MockTestAccountRepository::new();

        let token = ResetToken::generate();
        let request = pending_request(token.clone());
        let account = account_with_password("oldpw");

        repository
            .expect_find_reset_request_by_token()
            .returning(move |_| Ok(Some(request.clone())));
        repository
            .expect_find_account_by_email()
            .returning(move |_| Ok(Some(account.clone())));
        repository
            .expect_complete_password_reset()
            .times(1)
            .returning(|_, _, _, _| Ok(None));

        let service = service(repository, MockTestEventPublisher::new());

        let result = service
            .reset_password(ResetPasswordCommand {
                token,
                password: "newpw".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AccountError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_reset_password_account_gone() {
        let mut repository = MockTestAccountRepository::new();

        let token = ResetToken::generate();
        let request = pending_request(token.clone());

        repository
            .expect_find_reset_request_by_token()
            .returning(move |_| Ok(Some(request.clone())));
        repository
            .expect_find_account_by_email()
            .returning(|_| Ok(None));
        repository.expect_complete_password_reset().times(0);

        let service = service(repository, MockTestEventPublisher::new());

        let result = service
            .reset_password(ResetPasswordCommand {
                token,
                password: "newpw".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AccountError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_refresh_issues_new_grant() {
        let mut repository = MockTestAccountRepository::new();
        let account = account_with_password("secret1");
        let account_id = account.id;

        repository
            .expect_find_account_by_id()
            .withf(move |id| *id == account_id)
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));

        let authenticator = authenticator();
        let grant = authenticator.issue_grant(&account_id.to_string()).unwrap();

        let service = AccountService::new(
            Arc::new(repository),
            Arc::new(MockTestEventPublisher::new()),
            authenticator,
            Duration::minutes(30),
        );

        let outcome = service
            .refresh(&grant.refresh.token)
            .await
            .expect("refresh failed");
        assert_eq!(outcome.grant.access.claims.sub, account_id.to_string());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let mut repository = MockTestAccountRepository::new();
        repository.expect_find_account_by_id().times(0);

        let authenticator = authenticator();
        let grant = authenticator.issue_grant(&AccountId::new().to_string()).unwrap();

        let service = AccountService::new(
            Arc::new(repository),
            Arc::new(MockTestEventPublisher::new()),
            authenticator,
            Duration::minutes(30),
        );

        let result = service.refresh(&grant.access.token).await;
        assert!(matches!(result, Err(AccountError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_get_account_not_found() {
        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_account_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = service(repository, MockTestEventPublisher::new());

        let result = service.get_account(&AccountId::new()).await;
        assert!(matches!(result, Err(AccountError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_change_role() {
        let mut repository = MockTestAccountRepository::new();
        let account = account_with_password("secret1");
        let account_id = account.id;

        repository.expect_find_account_by_id().times(0);
        repository
            .expect_update_role()
            .withf(move |id, role| *id == account_id && *role == Role::Admin)
            .times(1)
            .returning(move |_, role| {
                let mut updated = account.clone();
                updated.role = role;
                Ok(updated)
            });

        let service = service(repository, MockTestEventPublisher::new());

        let updated = service
            .change_role(&account_id, Role::Admin)
            .await
            .expect("change role failed");
        assert_eq!(updated.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_change_role_missing_account() {
        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_update_role()
            .times(1)
            .returning(|_, _| Err(AccountError::NotFound(USER_NOT_FOUND.to_string())));

        let service = service(repository, MockTestEventPublisher::new());

        let result = service.change_role(&AccountId::new(), Role::Admin).await;
        assert!(matches!(result, Err(AccountError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reset_password_store_failure_keeps_token_usable() {
        let mut repository = MockTestAccountRepository::new();
        let mut event_publisher = MockTestEventPublisher::new();

        let token = ResetToken::generate();
        let request = pending_request(token.clone());
        let account = account_with_password("oldpw");
        let stored = account.clone();

        // The store reports the request unconsumed on both attempts because
        // the failed attempt rolled back.
        repository
            .expect_find_reset_request_by_token()
            .times(2)
            .returning(move |_| Ok(Some(request.clone())));
        repository
            .expect_find_account_by_email()
            .times(2)
            .returning(move |_| Ok(Some(account.clone())));

        let mut sequence = mockall::Sequence::new();
        repository
            .expect_complete_password_reset()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _, _, _| Err(AccountError::Store("connection reset".to_string())));
        repository
            .expect_complete_password_reset()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(move |_, _, password_hash, _| {
                let mut updated = stored.clone();
                updated.password_hash = password_hash;
                Ok(Some(updated))
            });
        event_publisher
            .expect_publish_password_changed()
            .times(1)
            .returning(|_| Ok(()));

        let service = service(repository, event_publisher);
        let command = || ResetPasswordCommand {
            token: token.clone(),
            password: "newpw".to_string(),
        };

        let failed = service.reset_password(command()).await;
        assert!(matches!(failed, Err(AccountError::Store(_))));

        let retried = service
            .reset_password(command())
            .await
            .expect("retry after store failure failed");
        assert!(hasher().verify("newpw", &retried.password_hash));
    }
}
