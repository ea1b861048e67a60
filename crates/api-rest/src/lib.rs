//! # CCR REST API
//!
//! REST adapter for the clinical case review workflow.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, actor headers)
//! - Background delivery of rejection notices
//!
//! Workflow rules live in `ccr-core`; this crate only translates the wire.
//! The server binary is the workspace-root `ccr-run` package.

#![warn(rust_2018_idioms)]

pub mod dto;
pub mod error;
pub mod handlers;
pub mod notify_worker;

pub use error::ApiError;
pub use notify_worker::{notification_channel, spawn_notification_worker, QueueSink};

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use ccr_core::{CoreConfig, ReviewService};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub service: Arc<ReviewService>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_cases,
        handlers::ingest_case,
        handlers::get_case_for_review,
        handlers::get_raw_payload,
        handlers::export_case,
        handlers::get_audit_trail,
        handlers::save_draft,
        handlers::submit_decision,
        handlers::purge_case,
    ),
    components(schemas(
        api_shared::health::HealthRes,
        api_shared::dto::ErrorBody,
        ccr_core::DraftCase,
        ccr_core::ClinicalCase,
        ccr_core::CaseSummary,
        ccr_core::CaseStatus,
        ccr_core::Difficulty,
        ccr_core::DecisionNote,
        ccr_core::AuditRecord,
        ccr_core::AuditAction,
        dto::IngestCaseRes,
        dto::ListCasesRes,
        dto::CaseRes,
        dto::SaveDraftReq,
        dto::SubmitDecisionReq,
        dto::InProgressPayload,
        dto::ValidatePayload,
        dto::RejectPayload,
        dto::DecisionRes,
        dto::AuditTrailRes,
    ))
)]
struct ApiDoc;

/// Builds the complete HTTP surface over already-wired state.
///
/// Interactive docs are served at `/swagger-ui`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/cases", get(handlers::list_cases))
        .route("/cases", post(handlers::ingest_case))
        .route("/cases/:id/review", get(handlers::get_case_for_review))
        .route("/cases/:id/raw", get(handlers::get_raw_payload))
        .route("/cases/:id/export", get(handlers::export_case))
        .route("/cases/:id/audit", get(handlers::get_audit_trail))
        .route("/cases/:id/draft", put(handlers::save_draft))
        .route("/cases/:id/decision", post(handlers::submit_decision))
        .route("/cases/:id", delete(handlers::purge_case))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
