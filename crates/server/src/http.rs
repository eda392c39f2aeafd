//! HTTP Endpoints
//!
//! REST API for chat sessions, the listing catalog and lead administration.

use axum::{
    extract::{Json, Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use roy_agent::{match_listings, CallOutcome, SessionSnapshot, TurnOutcome};
use roy_core::{export, LeadFilter, LeadRecord, LeadStats, LeadStatus, LeadUpdate, Listing, StoredLead};

use crate::auth::auth_middleware;
use crate::metrics::{self as telemetry, metrics_handler};
use crate::registry::SessionHandle;
use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.settings.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let timeout = Duration::from_secs(server.timeout_seconds);

    Router::new()
        // Sessions
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/messages", post(send_message))
        .route("/api/sessions/:id/call", post(request_call))
        .route("/api/sessions/:id/lead-form", post(submit_lead_form))
        .route("/api/sessions/:id/listings", get(session_listings))
        .route("/api/sessions/:id/transcript", get(session_transcript))
        // Listing catalog
        .route("/api/listings", get(list_listings))
        .route("/api/listings/export.csv", get(export_listings))
        // Lead administration
        .route("/api/leads", get(list_leads))
        .route("/api/leads/stats", get(lead_stats))
        .route("/api/leads/export.csv", get(export_leads))
        .route(
            "/api/leads/:id",
            get(get_lead).patch(update_lead).delete(delete_lead),
        )
        // Operational
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - `enabled == false`: permissive (development only)
/// - no origins configured: localhost:3000
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin = %origin, "Invalid CORS origin");
                None
            })
        })
        .collect();

    if parsed.is_empty() {
        tracing::info!("No valid CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static("http://localhost:3000"))
            .allow_methods(methods)
            .allow_headers(Any);
    }

    tracing::info!(origins = parsed.len(), "CORS configured");
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(methods)
        .allow_headers(Any)
}

fn session_handle(state: &AppState, id: &str) -> Result<SessionHandle, ServerError> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| ServerError::NotFound(format!("session {}", id)))
}

fn attachment(content_type: &str, filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

// =============================================================================
// Sessions
// =============================================================================

/// POST /api/sessions
async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionSnapshot>), ServerError> {
    let (id, handle) = state.sessions.create(
        state.agent_config().clone(),
        state.extractor.clone(),
        state.collaborators.clone(),
    );
    let mut session = handle.lock().await;
    session.open()?;

    telemetry::record_session_opened();
    telemetry::record_message("assistant", 1);
    tracing::info!(session_id = %id, active = state.sessions.count(), "Session created");

    Ok((StatusCode::CREATED, Json(session.snapshot())))
}

/// GET /api/sessions/:id
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ServerError> {
    let handle = session_handle(&state, &id)?;
    let session = handle.lock().await;
    Ok(Json(session.snapshot()))
}

/// DELETE /api/sessions/:id
async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state
        .sessions
        .remove(&id)
        .ok_or_else(|| ServerError::NotFound(format!("session {}", id)))?;
    tracing::info!(session_id = %id, "Session closed");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct SendMessageRequest {
    content: String,
}

/// POST /api/sessions/:id/messages
///
/// A send while the previous turn is still running is rejected with 409.
async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<TurnOutcome>, ServerError> {
    let handle = session_handle(&state, &id)?;
    let mut session = handle.try_lock().map_err(|_| ServerError::Busy)?;

    let outcome = session.send(&request.content).await?;

    telemetry::record_message("user", 1);
    telemetry::record_message("assistant", outcome.replies.len() as u64);
    if outcome.reply_failed {
        telemetry::record_reply_failure();
    }
    telemetry::record_lead_score(outcome.score);

    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
struct CallRequest {
    phone: String,
}

/// POST /api/sessions/:id/call
async fn request_call(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CallRequest>,
) -> Result<Json<CallOutcome>, ServerError> {
    let handle = session_handle(&state, &id)?;
    let mut session = handle.try_lock().map_err(|_| ServerError::Busy)?;

    let outcome = session.request_call(&request.phone).await?;
    telemetry::record_call(outcome.placed);

    Ok(Json(outcome))
}

/// POST /api/sessions/:id/lead-form
async fn submit_lead_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<LeadRecord>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let handle = session_handle(&state, &id)?;
    let mut session = handle.try_lock().map_err(|_| ServerError::Busy)?;

    let lead = session.submit_lead_form(&form).await?;
    telemetry::record_lead_score(session.score());

    Ok(Json(serde_json::json!({
        "lead": lead,
        "score": session.score(),
        "leadId": session.lead_id(),
    })))
}

/// GET /api/sessions/:id/listings
async fn session_listings(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Listing>>, ServerError> {
    let handle = session_handle(&state, &id)?;
    let session = handle.lock().await;
    Ok(Json(match_listings(
        session.lead(),
        state.catalog.listings(),
        state.agent_config().max_listing_results,
    )))
}

#[derive(Debug, Default, Deserialize)]
struct TranscriptQuery {
    #[serde(default)]
    format: Option<String>,
}

/// GET /api/sessions/:id/transcript?format=text|csv
async fn session_transcript(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TranscriptQuery>,
) -> Result<Response, ServerError> {
    let handle = session_handle(&state, &id)?;
    let session = handle.lock().await;
    let transcript = session.transcript();

    match query.format.as_deref() {
        None | Some("json") => Ok(Json(transcript.messages().to_vec()).into_response()),
        Some("text") => Ok(attachment(
            "text/plain; charset=utf-8",
            &format!("roy-conversation-{}.txt", id),
            export::transcript_text(transcript),
        )),
        Some("csv") => Ok(attachment(
            "text/csv; charset=utf-8",
            &format!("roy-conversation-{}.csv", id),
            export::transcript_csv(transcript),
        )),
        Some(other) => Err(ServerError::InvalidRequest(format!(
            "unsupported transcript format: {}",
            other
        ))),
    }
}

// =============================================================================
// Listings
// =============================================================================

/// GET /api/listings
async fn list_listings(State(state): State<AppState>) -> Json<Vec<Listing>> {
    Json(state.catalog.listings().to_vec())
}

/// GET /api/listings/export.csv
async fn export_listings(State(state): State<AppState>) -> Response {
    attachment(
        "text/csv; charset=utf-8",
        "listings.csv",
        export::listings_csv(state.catalog.listings()),
    )
}

// =============================================================================
// Leads
// =============================================================================

/// GET /api/leads?search=&status=&score=
async fn list_leads(
    State(state): State<AppState>,
    Query(filter): Query<LeadFilter>,
) -> Result<Json<Vec<StoredLead>>, ServerError> {
    Ok(Json(state.collaborators.store.list(&filter).await?))
}

/// GET /api/leads/stats
async fn lead_stats(State(state): State<AppState>) -> Result<Json<LeadStats>, ServerError> {
    let leads = state.collaborators.store.list(&LeadFilter::default()).await?;
    Ok(Json(LeadStats::from_leads(&leads)))
}

/// GET /api/leads/export.csv
async fn export_leads(
    State(state): State<AppState>,
    Query(filter): Query<LeadFilter>,
) -> Result<Response, ServerError> {
    let leads = state.collaborators.store.list(&filter).await?;
    Ok(attachment(
        "text/csv; charset=utf-8",
        "leads.csv",
        export::leads_csv(&leads),
    ))
}

/// GET /api/leads/:id
async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredLead>, ServerError> {
    Ok(Json(state.collaborators.store.get(&id).await?))
}

#[derive(Debug, Deserialize)]
struct LeadPatch {
    #[serde(default)]
    status: Option<LeadStatus>,
    #[serde(default)]
    notes: Option<String>,
}

/// PATCH /api/leads/:id
async fn update_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<LeadPatch>,
) -> Result<Json<StoredLead>, ServerError> {
    if patch.status.is_none() && patch.notes.is_none() {
        return Err(ServerError::InvalidRequest(
            "expected status and/or notes".to_string(),
        ));
    }

    let mut update = LeadUpdate::new();
    if let Some(status) = patch.status {
        update = update.with_status(status);
    }
    if let Some(notes) = patch.notes {
        update = update.with_notes(notes);
    }

    let store = &state.collaborators.store;
    store.update(&id, &update).await?;
    tracing::info!(lead_id = %id, status = ?patch.status, "Lead updated");
    Ok(Json(store.get(&id).await?))
}

/// DELETE /api/leads/:id
async fn delete_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.collaborators.store.delete(&id).await?;
    tracing::info!(lead_id = %id, "Lead deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Operational
// =============================================================================

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let collaborators = &state.collaborators;
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.sessions.count(),
        "listings": state.catalog.len(),
        "collaborators": {
            "replies": collaborators.replies.name(),
            "calls": collaborators.calls.name(),
            "store": collaborators.store.name(),
        }
    }))
}

/// GET /ready
///
/// Ready once the lead store answers.
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let store_ok = state.collaborators.store.health_check().await;
    let status = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if store_ok { "ready" } else { "not_ready" },
            "checks": {
                "store": if store_ok { "ok" } else { "unreachable" },
            }
        })),
    )
}
