use std::sync::Arc;

use account_service::config::Config;
use account_service::domain::account::service::AccountService;
use account_service::domain::authorization::gate::AuthorizationGate;
use account_service::inbound::grpc::AccountGrpcService;
use account_service::inbound::http::router::create_router;
use account_service::outbound::events::KafkaEventProducer;
use account_service::outbound::repositories::PostgresAccountRepository;
use account_service::server;
use auth::Authenticator;
use auth::PasswordHasher;
use auth::TokenIssuer;
use chrono::Duration;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "account-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        grpc_port = config.server.grpc_port,
        jwt_issuer = %config.jwt.issuer,
        kafka_brokers = %config.kafka.brokers,
        kafka_topic = %config.kafka.topic,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let password_hasher = PasswordHasher::with_work_factor(config.password.work_factor())?;
    let token_issuer = TokenIssuer::new(
        config.jwt.secret.as_bytes(),
        config.jwt.issuer.clone(),
        Duration::minutes(config.jwt.access_ttl_minutes),
        Duration::days(config.jwt.refresh_ttl_days),
    )?;
    let authenticator = Arc::new(Authenticator::new(password_hasher, token_issuer));

    let policy = Arc::new(config.policy.table()?);
    tracing::info!(rules = policy.len(), "Authorization policy loaded");

    let account_repository = Arc::new(PostgresAccountRepository::new(pg_pool));
    let event_producer = Arc::new(KafkaEventProducer::new(&config.kafka)?);

    let account_service = Arc::new(AccountService::new(
        Arc::clone(&account_repository),
        event_producer,
        Arc::clone(&authenticator),
        Duration::minutes(config.reset.ttl_minutes),
    ));
    let gate = Arc::new(AuthorizationGate::new(
        authenticator,
        account_repository,
        policy,
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let grpc_address = format!("0.0.0.0:{}", config.server.grpc_port);
    let grpc_listener = tokio::net::TcpListener::bind(&grpc_address).await?;
    tracing::info!(
        address = %grpc_address,
        port = config.server.grpc_port,
        protocol = "grpc",
        "gRpc server listening"
    );

    let http_application = create_router(account_service.clone(), gate.clone());
    let grpc_service = AccountGrpcService::new(account_service, gate);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                signal.cancel();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    server::serve(
        http_listener,
        http_application,
        grpc_listener,
        grpc_service,
        shutdown,
    )
    .await?;

    tracing::info!("Servers exited successfully");

    Ok(())
}
