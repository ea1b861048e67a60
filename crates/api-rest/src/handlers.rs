//! HTTP handlers for the review API.
//!
//! Handlers translate the wire into engine calls and nothing else: actor
//! headers are parsed first, path ids next, then the engine decides.
//! Transient store failures are retried here with a bounded linear backoff
//! before surfacing as 503.

use axum::{
    extract::{Path as AxumPath, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use std::collections::BTreeSet;
use std::time::Duration;

use api_shared::auth::{
    self, actor_context, ActorRole, AuthError, ACTOR_DOMAIN_HEADER, ACTOR_ID_HEADER,
    ACTOR_ROLE_HEADER, API_KEY_HEADER,
};
use api_shared::health::{HealthRes, HealthService};
use ccr_core::{
    Actor, CaseError, CaseId, CaseResult, DraftCase, EditableFields, EmailAddress, Role,
};

use crate::dto::{
    AuditTrailRes, CaseRes, Decision, DecisionRes, IngestCaseRes, ListCasesRes, SaveDraftReq,
    SubmitDecisionReq,
};
use crate::error::ApiError;
use crate::AppState;

/// Audit identity recorded for drafts arriving through the ingest boundary.
const INGEST_ACTOR: &str = "case-generation";

/// Store retries before a 503: attempts 1..=3 with 50ms linear backoff.
const STORE_ATTEMPTS: u32 = 3;
const STORE_RETRY_STEP: Duration = Duration::from_millis(50);

fn header_str<'a>(
    headers: &'a HeaderMap,
    name: &'static str,
) -> Result<Option<&'a str>, ApiError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| AuthError::InvalidHeader(name).into()),
    }
}

/// Establishes the calling actor from the session-layer identity headers.
fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
    let id = header_str(headers, ACTOR_ID_HEADER)?;
    let role = header_str(headers, ACTOR_ROLE_HEADER)?;
    let domain = header_str(headers, ACTOR_DOMAIN_HEADER)?;

    let ctx = actor_context(id, role, domain)?;
    let role = match ctx.role {
        ActorRole::Learner => Role::Learner,
        ActorRole::Expert => Role::Expert,
        ActorRole::Admin => Role::Admin,
    };
    Ok(Actor::new(ctx.id, role, ctx.domain))
}

/// Runs a store-backed operation, retrying transient store failures.
///
/// Only [`CaseError::StoreUnavailable`] is retried; every other kind is a
/// caller error or a final answer. The store commits atomically, so a
/// failed attempt never half-applied anything.
fn with_store_retry<T>(mut op: impl FnMut() -> CaseResult<T>) -> CaseResult<T> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op() {
            Err(CaseError::StoreUnavailable(err)) if attempt < STORE_ATTEMPTS => {
                tracing::warn!(
                    "store attempt {} failed: {}; retrying",
                    attempt,
                    err
                );
                std::thread::sleep(STORE_RETRY_STEP * attempt);
            }
            other => return other,
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Returns the current health status of the CCR review service. This
/// endpoint is used for monitoring and load balancer health checks.
///
/// # Returns
/// * `Json<HealthRes>` - Health status response containing service status
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/cases",
    responses(
        (status = 200, description = "Case summaries visible to the caller", body = ListCasesRes),
        (status = 401, description = "Missing or invalid actor headers", body = ErrorBody),
        (status = 503, description = "Case store unavailable", body = ErrorBody)
    )
)]
/// Lists the cases visible to the calling actor
///
/// Learners receive only `VALIDATED` cases; experts and admins receive
/// every case regardless of status. Publication is exactly this filter —
/// validating a case is what makes it appear here for learners.
///
/// # Returns
/// * `Ok(Json<ListCasesRes>)` - Case summaries, oldest first
/// * `Err(ApiError)` - `401` without valid actor headers
#[axum::debug_handler]
pub async fn list_cases(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListCasesRes>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let cases = with_store_retry(|| state.service.list_cases(&actor))?;
    Ok(Json(ListCasesRes { cases }))
}

#[utoipa::path(
    post,
    path = "/cases",
    request_body = DraftCase,
    responses(
        (status = 201, description = "Case ingested", body = IngestCaseRes),
        (status = 401, description = "Missing or invalid API key", body = ErrorBody),
        (status = 422, description = "Malformed draft or duplicate id", body = ErrorBody)
    )
)]
/// Accepts a draft case from the generation pipeline
///
/// The ingest boundary is authenticated by the shared `x-api-key` header,
/// not by actor headers: the caller is the case-generation collaborator,
/// not a reviewer. Drafts may only enter as `DRAFT_AI` (default) or
/// `IN_REVIEW`.
#[axum::debug_handler]
pub async fn ingest_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<DraftCase>,
) -> Result<(StatusCode, Json<IngestCaseRes>), ApiError> {
    let provided = header_str(&headers, API_KEY_HEADER)?;
    auth::validate_api_key(provided, state.cfg.ingest_api_key())?;

    let case = with_store_retry(|| state.service.ingest(INGEST_ACTOR, draft.clone()))?;
    Ok((StatusCode::CREATED, Json(IngestCaseRes { case })))
}

#[utoipa::path(
    get,
    path = "/cases/{id}/review",
    responses(
        (status = 200, description = "Full case with review metadata", body = CaseRes),
        (status = 404, description = "Unknown case", body = ErrorBody)
    )
)]
/// Fetches the full case record for the review screen
#[axum::debug_handler]
pub async fn get_case_for_review(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    headers: HeaderMap,
) -> Result<Json<CaseRes>, ApiError> {
    actor_from_headers(&headers)?;
    let id = CaseId::parse(&id)?;

    let case = with_store_retry(|| state.service.get_case(&id))?;
    Ok(Json(CaseRes { case }))
}

#[utoipa::path(
    get,
    path = "/cases/{id}/raw",
    responses(
        (status = 200, description = "Opaque structured clinical payload"),
        (status = 404, description = "Unknown case", body = ErrorBody)
    )
)]
/// Fetches the raw clinical payload, untouched by the workflow
#[axum::debug_handler]
pub async fn get_raw_payload(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    actor_from_headers(&headers)?;
    let id = CaseId::parse(&id)?;

    let case = with_store_retry(|| state.service.get_case(&id))?;
    Ok(Json(case.payload))
}

#[utoipa::path(
    get,
    path = "/cases/{id}/export",
    responses(
        (status = 200, description = "Full JSON snapshot of the stored record"),
        (status = 404, description = "Unknown case", body = ErrorBody)
    )
)]
/// Exports the record exactly as stored
///
/// The snapshot round-trips: re-ingesting it as a draft (decision fields
/// are ignored at the ingest boundary) reproduces an equivalent case.
#[axum::debug_handler]
pub async fn export_case(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    actor_from_headers(&headers)?;
    let id = CaseId::parse(&id)?;

    let snapshot = with_store_retry(|| state.service.export_case(&id))?;
    Ok(Json(snapshot))
}

#[utoipa::path(
    get,
    path = "/cases/{id}/audit",
    responses(
        (status = 200, description = "Audit trail, oldest first", body = AuditTrailRes),
        (status = 404, description = "Unknown case", body = ErrorBody)
    )
)]
/// Reads the case's audit trail
#[axum::debug_handler]
pub async fn get_audit_trail(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    headers: HeaderMap,
) -> Result<Json<AuditTrailRes>, ApiError> {
    actor_from_headers(&headers)?;
    let id = CaseId::parse(&id)?;

    let records = with_store_retry(|| state.service.audit_trail(&id))?;
    Ok(Json(AuditTrailRes { records }))
}

#[utoipa::path(
    put,
    path = "/cases/{id}/draft",
    request_body = SaveDraftReq,
    responses(
        (status = 200, description = "Updated case", body = CaseRes),
        (status = 403, description = "Capability gate failed", body = ErrorBody),
        (status = 409, description = "Case is terminal", body = ErrorBody)
    )
)]
/// Saves an edit of the editable fields without changing status
#[axum::debug_handler]
pub async fn save_draft(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    headers: HeaderMap,
    Json(req): Json<SaveDraftReq>,
) -> Result<Json<CaseRes>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let id = CaseId::parse(&id)?;
    let fields = EditableFields::from(req);

    let case = with_store_retry(|| state.service.save_draft(&actor, &id, &fields))?;
    Ok(Json(CaseRes { case }))
}

#[utoipa::path(
    post,
    path = "/cases/{id}/decision",
    request_body = SubmitDecisionReq,
    responses(
        (status = 200, description = "Decision committed", body = DecisionRes),
        (status = 400, description = "Zero or several decision verbs", body = ErrorBody),
        (status = 403, description = "Capability gate failed", body = ErrorBody),
        (status = 409, description = "Terminal case or lost race", body = ErrorBody),
        (status = 422, description = "Business-rule violation", body = ErrorBody)
    )
)]
/// Submits a single review decision
///
/// The body must carry exactly one of `mark_in_progress`, `validate` or
/// `reject`. A lost race against a concurrent decision answers `409` with
/// kind `STALE_STATE`; the caller must re-fetch and decide again.
#[axum::debug_handler]
pub async fn submit_decision(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    headers: HeaderMap,
    Json(req): Json<SubmitDecisionReq>,
) -> Result<Json<DecisionRes>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let id = CaseId::parse(&id)?;
    let decision = req.into_decision()?;

    let case = match decision {
        Decision::MarkInProgress(payload) => with_store_retry(|| {
            state
                .service
                .mark_in_progress(&actor, &id, payload.note.clone())
        })?,
        Decision::Validate(payload) => {
            with_store_retry(|| state.service.validate(&actor, &id, payload.note.clone()))?
        }
        Decision::Reject(payload) => {
            let notification_email = match &payload.notification_email {
                Some(raw) => Some(EmailAddress::parse(raw).map_err(|err| {
                    CaseError::Validation(format!("invalid notification email: {}", err))
                })?),
                None => None,
            };
            let sections: BTreeSet<String> = payload.affected_sections.iter().cloned().collect();

            with_store_retry(|| {
                state.service.reject(
                    &actor,
                    &id,
                    &payload.reason,
                    sections.clone(),
                    notification_email.clone(),
                )
            })?
        }
    };

    Ok(Json(DecisionRes {
        status: case.status,
        case,
    }))
}

#[utoipa::path(
    delete,
    path = "/cases/{id}",
    responses(
        (status = 204, description = "Case removed"),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 404, description = "Unknown case", body = ErrorBody)
    )
)]
/// Administrative purge of a case and its audit trail
#[axum::debug_handler]
pub async fn purge_case(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let id = CaseId::parse(&id)?;

    with_store_retry(|| state.service.purge(&actor, &id))?;
    Ok(StatusCode::NO_CONTENT)
}
