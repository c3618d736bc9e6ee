use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::change_role::change_role;
use super::handlers::create_account::create_account;
use super::handlers::forgot_password::forgot_password;
use super::handlers::get_account::get_account;
use super::handlers::list_accounts::list_accounts;
use super::handlers::login::login;
use super::handlers::refresh_token::refresh_token;
use super::handlers::reset_password::reset_password;
use super::middleware::authorize;
use crate::domain::account::ports::AccountServicePort;
use crate::domain::authorization::gate::AuthorizationPort;

#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<dyn AccountServicePort>,
    pub gate: Arc<dyn AuthorizationPort>,
}

pub fn create_router(
    account_service: Arc<dyn AccountServicePort>,
    gate: Arc<dyn AuthorizationPort>,
) -> Router {
    let state = AppState {
        account_service,
        gate,
    };

    let public_routes = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh_token))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/accounts", post(create_account));

    let protected_routes = Router::new()
        .route("/api/accounts", get(list_accounts))
        .route("/api/accounts/:account_id", get(get_account))
        .route("/api/accounts/:account_id/role", put(change_role))
        .route_layer(middleware::from_fn_with_state(state.clone(), authorize));

    // No headers in the span: they carry bearer tokens.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(trace_layer)
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
