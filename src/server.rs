//! HTTP surface for the browser UI.
//!
//! Thin JSON endpoints over the application state: the four views, the
//! upload workflow, and the write actions. DOM construction stays in the
//! browser — this layer only serves view models and relays edits.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::error::{EditError, GatewayError, UploadError};
use crate::poller::Poller;
use crate::roster::VenueFilter;
use crate::state::AppState;
use crate::types::{InterviewEntry, PersonRecord, Venue};
use crate::util;

/// Shared context passed to all handlers.
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<AppState>,
    pub poller: Arc<Poller>,
}

/// JSON error payload with a meaningful status. The remote store itself
/// never varies its HTTP status — this surface does, so the browser can
/// branch without parsing.
pub struct ApiFailure {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl ApiFailure {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<GatewayError> for ApiFailure {
    fn from(err: GatewayError) -> Self {
        let status = match &err {
            GatewayError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::Network(_) | GatewayError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
            GatewayError::BadUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<UploadError> for ApiFailure {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Ingest(e) => Self::bad_request(e.to_string()),
            UploadError::Gateway(e) => e.into(),
        }
    }
}

impl From<EditError> for ApiFailure {
    fn from(err: EditError) -> Self {
        match err {
            EditError::Validation(e) => Self::bad_request(e.to_string()),
            EditError::Gateway(e) => e.into(),
        }
    }
}

pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/today", get(today))
        .route("/api/roster", get(roster))
        .route("/api/followups", get(followups))
        .route("/api/links", get(links))
        .route("/api/shift-date", get(shift_date).post(set_shift_date))
        .route("/api/upload", post(upload))
        .route("/api/refresh", post(refresh))
        .route("/api/people", post(add_person).put(update_person))
        .route("/api/people/:name", delete(delete_person))
        .route("/api/people/:name/sign-off", post(sign_off))
        .route("/api/sign-offs/reset", post(reset_sign_offs))
        .route("/api/mark-worked", post(mark_worked))
        .route("/api/interviews/:name", get(interview_log))
        .route(
            "/api/interviews",
            post(add_interview).put(update_interview).delete(delete_interview),
        )
        .route("/api/poller/start", post(poller_start))
        .route("/api/poller/stop", post(poller_stop))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

/// Bind and serve until the process exits.
pub async fn serve(ctx: AppContext, port: u16) -> Result<(), String> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind {addr}: {e}"))?;
    log::info!("Serving view-model API on http://{addr}");
    axum::serve(listener, create_router(ctx))
        .await
        .map_err(|e| format!("Server error: {e}"))
}

#[derive(Debug, Deserialize)]
struct ViewParams {
    venue: Option<String>,
}

impl ViewParams {
    fn filter(&self) -> VenueFilter {
        VenueFilter::from_wire(self.venue.as_deref())
    }
}

async fn status(State(ctx): State<AppContext>) -> impl IntoResponse {
    let mut value = serde_json::to_value(ctx.state.status()).unwrap_or_default();
    if let Some(obj) = value.as_object_mut() {
        obj.insert("pollerRunning".to_string(), json!(ctx.poller.is_running()));
    }
    Json(value)
}

async fn today(State(ctx): State<AppContext>, Query(params): Query<ViewParams>) -> impl IntoResponse {
    Json(ctx.state.today_view(params.filter()))
}

async fn roster(
    State(ctx): State<AppContext>,
    Query(params): Query<ViewParams>,
) -> impl IntoResponse {
    Json(ctx.state.roster_view(params.filter()))
}

async fn followups(
    State(ctx): State<AppContext>,
    Query(params): Query<ViewParams>,
) -> impl IntoResponse {
    Json(ctx.state.followup_view(params.filter()))
}

async fn links(State(ctx): State<AppContext>, Query(params): Query<ViewParams>) -> impl IntoResponse {
    Json(ctx.state.links_view(params.filter()))
}

async fn shift_date(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(json!({ "shiftDate": ctx.state.shift_date_display() }))
}

#[derive(Debug, Deserialize)]
struct DateBody {
    date: String,
}

async fn set_shift_date(
    State(ctx): State<AppContext>,
    Json(body): Json<DateBody>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let date = util::parse_wire_date(&body.date)
        .ok_or_else(|| ApiFailure::bad_request(format!("unparseable date: {:?}", body.date)))?;
    let message = ctx.state.set_shift_date(date).await?;
    Ok(Json(json!({ "message": message })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadParams {
    file_name: Option<String>,
}

async fn upload(
    State(ctx): State<AppContext>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiFailure> {
    let file_name = params.file_name.unwrap_or_default();
    let outcome = ctx.state.upload_workbook(body.to_vec(), &file_name).await?;
    Ok(Json(outcome))
}

async fn refresh(State(ctx): State<AppContext>) -> impl IntoResponse {
    ctx.state.load_all().await;
    Json(ctx.state.status())
}

async fn add_person(
    State(ctx): State<AppContext>,
    Json(person): Json<PersonRecord>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let message = ctx.state.save_person(person, true).await?;
    Ok(Json(json!({ "message": message })))
}

async fn update_person(
    State(ctx): State<AppContext>,
    Json(person): Json<PersonRecord>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let message = ctx.state.save_person(person, false).await?;
    Ok(Json(json!({ "message": message })))
}

async fn delete_person(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let message = ctx.state.delete_person(&name).await?;
    Ok(Json(json!({ "message": message })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignOffBody {
    venue: String,
    signed_off: bool,
}

async fn sign_off(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
    Json(body): Json<SignOffBody>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let venue = Venue::from_wire(&body.venue)
        .ok_or_else(|| ApiFailure::bad_request(format!("unknown venue: {:?}", body.venue)))?;
    ctx.state.toggle_sign_off(&name, venue, body.signed_off).await?;
    Ok(Json(json!({ "message": "ok" })))
}

async fn reset_sign_offs(
    State(ctx): State<AppContext>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let message = ctx.state.reset_sign_offs().await?;
    Ok(Json(json!({ "message": message })))
}

#[derive(Debug, Deserialize)]
struct MarkWorkedBody {
    date: Option<String>,
}

async fn mark_worked(
    State(ctx): State<AppContext>,
    Json(body): Json<MarkWorkedBody>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let date = body.date.as_deref().and_then(util::parse_wire_date);
    let message = ctx.state.mark_worked(date).await?;
    Ok(Json(json!({ "message": message })))
}

async fn interview_log(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    Json(ctx.state.interview_log(&name))
}

async fn add_interview(
    State(ctx): State<AppContext>,
    Json(entry): Json<InterviewEntry>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let message = ctx.state.add_interview(entry).await?;
    Ok(Json(json!({ "message": message })))
}

async fn update_interview(
    State(ctx): State<AppContext>,
    Json(entry): Json<InterviewEntry>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let message = ctx.state.update_interview(entry).await?;
    Ok(Json(json!({ "message": message })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteInterviewBody {
    row_index: i64,
    name: String,
}

async fn delete_interview(
    State(ctx): State<AppContext>,
    Json(body): Json<DeleteInterviewBody>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let message = ctx.state.delete_interview(body.row_index, &body.name).await?;
    Ok(Json(json!({ "message": message })))
}

async fn poller_start(State(ctx): State<AppContext>) -> impl IntoResponse {
    let interval = Duration::from_secs(ctx.state.config.poll_interval_minutes.max(1) * 60);
    let started = ctx.poller.start(ctx.state.clone(), interval);
    Json(json!({ "started": started, "running": ctx.poller.is_running() }))
}

async fn poller_stop(State(ctx): State<AppContext>) -> impl IntoResponse {
    let stopped = ctx.poller.stop();
    Json(json!({ "stopped": stopped, "running": ctx.poller.is_running() }))
}
