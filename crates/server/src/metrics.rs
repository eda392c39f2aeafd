//! Prometheus metrics
//!
//! Recording is a no-op until [`init_metrics`] installs the recorder.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

/// Install the global Prometheus recorder
///
/// Returns `None` if a recorder is already installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder");
            None
        },
    }
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

pub fn record_session_opened() {
    ::metrics::counter!("roy_sessions_opened_total").increment(1);
}

pub fn record_message(role: &'static str, count: u64) {
    ::metrics::counter!("roy_messages_total", "role" => role).increment(count);
}

pub fn record_reply_failure() {
    ::metrics::counter!("roy_reply_failures_total").increment(1);
}

pub fn record_call(placed: bool) {
    let outcome = if placed { "placed" } else { "failed" };
    ::metrics::counter!("roy_calls_total", "outcome" => outcome).increment(1);
}

pub fn record_lead_score(score: u8) {
    ::metrics::histogram!("roy_lead_score").record(f64::from(score));
}

pub fn record_request() {
    ::metrics::counter!("roy_http_requests_total").increment(1);
}
