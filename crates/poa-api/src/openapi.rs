//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into a single spec served at
//! `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the webhook bearer-token security scheme to the spec.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "Shared webhook secret. Set via WEBHOOK_SECRET env var.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Assembled OpenAPI spec for the receipt service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PoA Receipt Service",
        description = "Proof-of-action receipt backend: ingests chain-indexer \
                       notifications of proof-submitted contract events and serves \
                       the resulting receipts.\n\nOnly the webhook requires \
                       authentication (`Authorization: Bearer <secret>`); all query \
                       endpoints are public.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:3001", description = "Local development server"),
    ),
    paths(
        crate::routes::webhook::ingest_notification,
        crate::routes::receipts::receipt_detail,
        crate::routes::receipts::receipt_by_txid,
        crate::routes::receipts::receipts_by_user,
        crate::routes::receipts::verify_proof,
    ),
    components(schemas(
        crate::routes::webhook::WebhookAck,
        crate::routes::receipts::ReceiptDetail,
        crate::routes::receipts::ReceiptListResponse,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "webhook", description = "Chain-indexer notification ingestion"),
        (name = "receipts", description = "Read-only receipt lookups"),
    )
)]
pub struct ApiDoc;

/// Serve the spec.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_covers_every_route() {
        let spec = ApiDoc::openapi();
        let paths: Vec<&String> = spec.paths.paths.keys().collect();
        for expected in [
            "/api/webhook/proof",
            "/receipt/{id}",
            "/api/receipt/by-txid",
            "/api/receipts/by-user",
            "/api/verify",
        ] {
            assert!(
                paths.iter().any(|p| *p == expected),
                "missing {expected} in {paths:?}"
            );
        }
    }

    #[test]
    fn spec_declares_bearer_scheme() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
