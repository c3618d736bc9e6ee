use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tonic::transport::server::TcpIncoming;
use tonic::transport::Server;

use crate::inbound::grpc::AccountGrpcService;
use crate::proto::account_service_server::AccountServiceServer;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("HTTP server failed: {0}")]
    Http(#[from] std::io::Error),

    #[error("gRPC server failed: {0}")]
    Grpc(#[from] tonic::transport::Error),

    #[error("gRPC listener setup failed: {0}")]
    GrpcListener(String),

    #[error("Server task aborted: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Run the HTTP and gRPC listeners until `shutdown` is cancelled.
///
/// The two listeners share the token: whichever stops first, cleanly or
/// not, cancels it and the other drains in-flight requests and returns.
/// The first error observed is reported.
pub async fn serve(
    http_listener: TcpListener,
    router: Router,
    grpc_listener: TcpListener,
    grpc_service: AccountGrpcService,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let http_token = shutdown.clone();
    let http_server = tokio::spawn(async move {
        let signal = http_token.clone();
        let result = axum::serve(http_listener, router)
            .with_graceful_shutdown(async move { signal.cancelled().await })
            .await;

        http_token.cancel();
        tracing::info!(protocol = "http", "Server stopped");
        result.map_err(ServerError::from)
    });

    let grpc_token = shutdown.clone();
    let grpc_server = tokio::spawn(async move {
        let incoming = match TcpIncoming::from_listener(grpc_listener, true, None) {
            Ok(incoming) => incoming,
            Err(e) => {
                grpc_token.cancel();
                return Err(ServerError::GrpcListener(e.to_string()));
            }
        };

        let signal = grpc_token.clone();
        let result = Server::builder()
            .add_service(AccountServiceServer::new(grpc_service))
            .serve_with_incoming_shutdown(incoming, async move { signal.cancelled().await })
            .await;

        grpc_token.cancel();
        tracing::info!(protocol = "grpc", "Server stopped");
        result.map_err(ServerError::from)
    });

    let (http_result, grpc_result) = tokio::join!(http_server, grpc_server);

    let results = [http_result, grpc_result];
    for result in results {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Server error");
                return Err(e);
            }
            Err(e) => {
                tracing::error!(error = %e, "Server task failed");
                return Err(ServerError::from(e));
            }
        }
    }

    Ok(())
}
