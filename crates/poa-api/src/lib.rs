//! # poa-api — Proof-of-Action Receipt Service
//!
//! Axum HTTP service over the receipt store:
//!
//! | Method | Path | Module | Auth |
//! |--------|------|--------|------|
//! | `POST` | `/api/webhook/proof` | [`routes::webhook`] | bearer secret |
//! | `GET`  | `/receipt/:id` | [`routes::receipts`] | — |
//! | `GET`  | `/api/receipt/by-txid` | [`routes::receipts`] | — |
//! | `GET`  | `/api/receipts/by-user` | [`routes::receipts`] | — |
//! | `GET`  | `/api/verify` | [`routes::receipts`] | — |
//! | `GET`  | `/health` | here | — |
//! | `GET`  | `/openapi.json` | [`openapi`] | — |
//!
//! Middleware stack (outermost → innermost):
//!
//! ```text
//! TraceLayer → [OPTIONS → 204] → CorsLayer → [AuthMiddleware, webhook only] → Handler
//! ```
//!
//! CORS is permissive (`*` origin) on every response — the receipt pages
//! and verification lookups are meant to be fetched from any frontend.
//! `OPTIONS` requests are answered `204 No Content` with the CORS headers.
//! Only the webhook is authenticated; query endpoints serve public data.

pub mod auth;
pub mod config;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::middleware::{from_fn, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Assemble the full application router.
///
/// The auth middleware wraps only the webhook router, so it rejects
/// unauthenticated notifications before any body handling, while the
/// query endpoints stay public.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.webhook_secret.clone(),
    };

    let webhook = routes::webhook::router()
        .layer(from_fn(auth::auth_middleware))
        .layer(axum::Extension(auth_config));

    Router::new()
        .merge(webhook)
        .merge(routes::receipts::router())
        .merge(openapi::router())
        .route("/health", get(health))
        .fallback(unknown_route)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(from_fn(preflight_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `CorsLayer` answers `OPTIONS` with `200 OK`; this API answers `204 No
/// Content`. Runs outside the CORS layer and rewrites only the status, so
/// the CORS headers pass through untouched.
async fn preflight_status(request: Request, next: Next) -> Response {
    let is_options = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;
    if is_options && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}

/// GET /health — liveness probe.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "timestamp": Utc::now(),
        })),
    )
}

/// Unknown routes get the same JSON error body as everything else.
async fn unknown_route() -> AppError {
    AppError::NotFound("Not found".to_string())
}
