#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use account_service::account::errors::EventPublisherError;
use account_service::account::ports::AccountRepository;
use account_service::account::ports::EventPublisher;
use account_service::domain::account::events::AccountCreatedEvent;
use account_service::domain::account::events::PasswordChangedEvent;
use account_service::domain::account::events::PasswordResetRequestedEvent;
use account_service::domain::account::models::AccountId;
use account_service::domain::account::models::Role;
use account_service::domain::account::service::AccountService;
use account_service::domain::authorization::gate::AuthorizationGate;
use account_service::domain::authorization::policy::PolicyTable;
use account_service::inbound::grpc::AccountGrpcService;
use account_service::inbound::http::router::create_router;
use account_service::outbound::repositories::InMemoryAccountRepository;
use account_service::proto::account_service_client::AccountServiceClient;
use account_service::server;
use async_trait::async_trait;
use auth::Authenticator;
use auth::PasswordHasher;
use auth::TokenIssuer;
use auth::WorkFactor;
use chrono::Duration;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const JWT_ISSUER: &str = "account-service-test";
pub const PASSWORD: &str = "pass_word!";

/// Event publisher that keeps everything it is handed, standing in for the
/// broker and the mail sender behind it.
#[derive(Default)]
pub struct RecordingEventPublisher {
    pub created: Mutex<Vec<AccountCreatedEvent>>,
    pub reset_requests: Mutex<Vec<PasswordResetRequestedEvent>>,
    pub password_changes: Mutex<Vec<PasswordChangedEvent>>,
}

impl RecordingEventPublisher {
    /// Most recent reset token delivered for `email`.
    pub async fn reset_token_for(&self, email: &str) -> Option<String> {
        self.reset_requests
            .lock()
            .await
            .iter()
            .rev()
            .find(|event| event.email == email)
            .map(|event| event.reset_token.clone())
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish_account_created(
        &self,
        event: &AccountCreatedEvent,
    ) -> Result<(), EventPublisherError> {
        self.created.lock().await.push(event.clone());
        Ok(())
    }

    async fn publish_password_reset_requested(
        &self,
        event: &PasswordResetRequestedEvent,
    ) -> Result<(), EventPublisherError> {
        self.reset_requests.lock().await.push(event.clone());
        Ok(())
    }

    async fn publish_password_changed(
        &self,
        event: &PasswordChangedEvent,
    ) -> Result<(), EventPublisherError> {
        self.password_changes.lock().await.push(event.clone());
        Ok(())
    }
}

/// Test application serving HTTP and gRPC on random ports
pub struct TestApp {
    pub address: String,
    pub grpc_address: SocketAddr,
    pub api_client: reqwest::Client,
    pub repository: Arc<InMemoryAccountRepository>,
    pub events: Arc<RecordingEventPublisher>,
    pub token_issuer: TokenIssuer,
    pub shutdown: CancellationToken,
    pub server: JoinHandle<Result<(), server::ServerError>>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        Self::spawn_with_reset_ttl(Duration::minutes(30)).await
    }

    pub async fn spawn_with_reset_ttl(reset_ttl: Duration) -> Self {
        let http_listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let grpc_listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");

        let address = format!("http://{}", http_listener.local_addr().unwrap());
        let grpc_address = grpc_listener.local_addr().unwrap();

        let repository = Arc::new(InMemoryAccountRepository::new());
        let events = Arc::new(RecordingEventPublisher::default());

        let password_hasher = PasswordHasher::with_work_factor(WorkFactor {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
        .expect("Failed to build password hasher");
        let authenticator = Arc::new(Authenticator::new(password_hasher, token_issuer()));

        let account_service = Arc::new(AccountService::new(
            Arc::clone(&repository),
            Arc::clone(&events),
            Arc::clone(&authenticator),
            reset_ttl,
        ));
        let gate = Arc::new(AuthorizationGate::new(
            authenticator,
            Arc::clone(&repository),
            Arc::new(PolicyTable::default()),
        ));

        let router = create_router(account_service.clone(), gate.clone());
        let grpc_service = AccountGrpcService::new(account_service, gate);

        let shutdown = CancellationToken::new();
        let server = tokio::spawn(server::serve(
            http_listener,
            router,
            grpc_listener,
            grpc_service,
            shutdown.clone(),
        ));

        Self {
            address,
            grpc_address,
            api_client: reqwest::Client::new(),
            repository,
            events,
            token_issuer: token_issuer(),
            shutdown,
            server,
        }
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make PUT request with Bearer token
    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .put(format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    pub async fn grpc_client(&self) -> AccountServiceClient<Channel> {
        AccountServiceClient::connect(format!("http://{}", self.grpc_address))
            .await
            .expect("Failed to connect gRPC client")
    }

    /// Create an account over HTTP and return its id.
    pub async fn create_account(&self, email: &str) -> String {
        let response = self
            .post("/api/accounts")
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Log in over HTTP and return the response body.
    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/api/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Log in and return the access token.
    pub async fn access_token(&self, email: &str) -> String {
        let body: serde_json::Value = self
            .login(email, PASSWORD)
            .await
            .json()
            .await
            .expect("Failed to parse response");
        body["data"]["access_token"].as_str().unwrap().to_string()
    }

    /// Create an account and give it the admin role directly in the store.
    pub async fn create_admin(&self, email: &str) -> String {
        let id = self.create_account(email).await;
        let account_id = AccountId::from_string(&id).unwrap();

        self.repository
            .update_role(&account_id, Role::Admin)
            .await
            .unwrap();

        id
    }
}

pub fn token_issuer() -> TokenIssuer {
    TokenIssuer::with_default_lifetimes(JWT_SECRET, JWT_ISSUER).expect("Failed to build issuer")
}
