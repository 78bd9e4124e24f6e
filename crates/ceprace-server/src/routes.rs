//! HTTP surface: one provider race per inbound lookup.
//!
//! | Method | Path | Reply |
//! |--------|------|-------|
//! | `GET` | `/?cep=<key>` | Address plus `provider`, or `{"message": ...}` |
//!
//! Status codes follow the race outcome: 200 found, 400 invalid key, 502 a
//! provider failed first, 504 deadline.
//!
//! When `cep` is repeated the first value is raced. A query string that cannot
//! be read at all is treated as a missing key.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use ceprace_core::{RaceCoordinator, RaceResult, Report, ResolutionErrorKind};
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(coordinator: Arc<RaceCoordinator>) -> Router {
    Router::new()
        .route("/", get(lookup))
        .layer(TraceLayer::new_for_http())
        .with_state(coordinator)
}

async fn lookup(
    State(coordinator): State<Arc<RaceCoordinator>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> impl IntoResponse {
    let request_id = Uuid::new_v4();
    let raw = first_cep(query);
    let span = tracing::info_span!("lookup", %request_id, cep = %raw);

    let result = coordinator.resolve(&raw).instrument(span).await;
    let status = status_for(&result);
    let report = Report::from(result);
    tracing::debug!(
        %request_id,
        status = status.as_u16(),
        found = report.is_found(),
        "lookup answered"
    );

    (
        status,
        [(REQUEST_ID_HEADER, request_id.to_string())],
        Json(report),
    )
}

fn first_cep(query: Result<Query<Vec<(String, String)>>, QueryRejection>) -> String {
    match query {
        Ok(Query(pairs)) => pairs
            .into_iter()
            .find_map(|(name, value)| (name == "cep").then_some(value))
            .unwrap_or_default(),
        Err(rejection) => {
            tracing::debug!(%rejection, "unreadable query string");
            String::new()
        }
    }
}

fn status_for(result: &RaceResult) -> StatusCode {
    match result {
        Ok(_) => StatusCode::OK,
        Err(failure) => match failure.error.kind() {
            ResolutionErrorKind::InvalidCep => StatusCode::BAD_REQUEST,
            ResolutionErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ResolutionErrorKind::Transport
            | ResolutionErrorKind::Status
            | ResolutionErrorKind::Parse
            | ResolutionErrorKind::Payload => StatusCode::BAD_GATEWAY,
        },
    }
}
