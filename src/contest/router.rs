use std::fmt;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::error::AppError;

use super::domain::VoteCategory;
use super::export::ExportScope;
use super::service::{ContestService, SortMode, SubmissionError, SubmissionRequest, VoteError};
use super::store::StoreError;

/// Router builder exposing the intake, voting, listing, and export endpoints.
pub fn contest_router(service: Arc<ContestService>) -> Router {
    Router::new()
        .route("/api/meta", get(meta_handler))
        .route("/api/list", get(list_handler))
        .route("/api/submissions", post(submit_handler))
        .route("/api/vote", post(vote_handler))
        .route("/api/export/all", get(export_all_handler))
        .route("/api/export/top", get(export_top_handler))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct VotePayload {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    category: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    sort: Option<SortMode>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExportQuery {
    #[serde(default)]
    pin: Option<String>,
}

pub(crate) async fn submit_handler(
    State(service): State<Arc<ContestService>>,
    headers: HeaderMap,
    Json(mut request): Json<SubmissionRequest>,
) -> Response {
    request.origin = client_origin(&headers);

    match service.submit(request) {
        Ok(receipt) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "filename": receipt.filename })),
        )
            .into_response(),
        Err(err @ SubmissionError::RegistrationClosed { .. }) => {
            reject(StatusCode::FORBIDDEN, &err)
        }
        Err(
            err @ (SubmissionError::TooManyParticipants { .. } | SubmissionError::InvalidFile(_)),
        ) => reject(StatusCode::BAD_REQUEST, &err),
        Err(SubmissionError::Store(StoreError::Duplicate(filename))) => {
            // Should not happen given the filename generation scheme; fail
            // loudly rather than overwrite.
            error!(%filename, "stored filename collided with an existing submission");
            reject_generic()
        }
        Err(SubmissionError::Store(err)) => {
            error!(%err, "submission could not be persisted");
            reject_generic()
        }
    }
}

pub(crate) async fn vote_handler(
    State(service): State<Arc<ContestService>>,
    Json(payload): Json<VotePayload>,
) -> Response {
    match service.vote(&payload.filename, &payload.category) {
        Ok(receipt) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "votes": receipt.votes, "total": receipt.total })),
        )
            .into_response(),
        Err(err @ VoteError::InvalidCategory(_)) => reject(StatusCode::BAD_REQUEST, &err),
        Err(err @ VoteError::NotFound(_)) => reject(StatusCode::NOT_FOUND, &err),
        Err(VoteError::Store(err)) => {
            error!(%err, "vote could not be persisted");
            reject_generic()
        }
    }
}

pub(crate) async fn list_handler(
    State(service): State<Arc<ContestService>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    if let Some(sort) = query.sort {
        let items = service.list(sort, query.limit)?;
        return Ok(Json(json!({
            "ok": true,
            "items": items,
            "categories": VoteCategory::ordered().map(VoteCategory::label),
        })));
    }

    let gallery = service.gallery()?;
    Ok(Json(json!({
        "ok": true,
        "items": gallery.items,
        "top5": gallery.top5,
        "categories": gallery.categories,
    })))
}

pub(crate) async fn meta_handler(
    State(service): State<Arc<ContestService>>,
) -> Json<serde_json::Value> {
    let meta = service.meta();
    Json(json!({
        "ok": true,
        "state": meta.state.label(),
        "open": meta.open,
        "close": meta.close,
        "event": meta.event,
        "max_team": meta.max_team,
        "service_email": meta.service_email,
        "service_exts": meta.service_exts,
    }))
}

pub(crate) async fn export_all_handler(
    State(service): State<Arc<ContestService>>,
    Query(query): Query<ExportQuery>,
) -> Response {
    export_response(&service, query, ExportScope::All, "submissions.csv")
}

pub(crate) async fn export_top_handler(
    State(service): State<Arc<ContestService>>,
    Query(query): Query<ExportQuery>,
) -> Response {
    export_response(&service, query, ExportScope::Top, "top5.csv")
}

fn export_response(
    service: &ContestService,
    query: ExportQuery,
    scope: ExportScope,
    attachment: &str,
) -> Response {
    let authorized = query
        .pin
        .as_deref()
        .map(|pin| service.verify_export_pin(pin))
        .unwrap_or(false);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "ok": false, "error": "No autorizado. Agrega ?pin=TU_PIN" })),
        )
            .into_response();
    }

    match service.export(scope) {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={attachment}"),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(err) => {
            error!(%err, "export could not be rendered");
            reject_generic()
        }
    }
}

/// First address in `X-Forwarded-For`, or `-` when the transport gives none.
fn client_origin(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("-")
        .to_string()
}

fn reject(status: StatusCode, reason: &dyn fmt::Display) -> Response {
    (
        status,
        Json(json!({ "ok": false, "error": reason.to_string() })),
    )
        .into_response()
}

fn reject_generic() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "ok": false, "error": "Error interno" })),
    )
        .into_response()
}
