use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::history::{parse_day, AuditRecord, RequestContext, VisitRecord, DAY_FORMAT};
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::provider::{AnalysisRequest, AnalysisResult};

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub providers: Vec<String>,
}

/// Optional body of `POST /visit`.
#[derive(Debug, Default, Deserialize)]
pub struct VisitPayload {
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VisitAccepted {
    pub trace_id: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        providers: state.providers.as_ref().clone(),
    })
}

/// `POST /api/v1/analyze`
pub async fn analyze(
    State(state): State<AppState>,
    context: RequestContext,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return Err(state.orchestrator.reject(&context, rejection.body_text()).into());
        }
    };

    let result = state.orchestrator.handle(context, request).await?;
    Ok(Json(result))
}

/// `POST /visit`
pub async fn record_visit(
    State(state): State<AppState>,
    context: RequestContext,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        VisitPayload::default()
    } else {
        serde_json::from_slice::<VisitPayload>(&body)
            .map_err(|e| ApiError::bad_request(format!("invalid visit body: {}", e)))?
    };

    let trace_id = context.trace_id.clone();
    tracing::debug!(trace_id = %trace_id, ip = %context.ip, "Visit recorded");
    state.history.record_visit(VisitRecord::new(&context, payload.page));

    Ok((StatusCode::ACCEPTED, Json(VisitAccepted { trace_id })))
}

/// `GET /visits/{date}`
pub async fn visits_for_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<Vec<VisitRecord>>, ApiError> {
    let day = parse_day(&date)?;
    Ok(Json(state.history.visit_log().read_day(day).await?))
}

/// `GET /visits/dates`
pub async fn visit_dates(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let days = state.history.visit_log().list_days().await?;
    Ok(Json(days.iter().map(|d| d.format(DAY_FORMAT).to_string()).collect()))
}

/// `GET /history/{date}`
pub async fn history_for_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<Vec<AuditRecord>>, ApiError> {
    let day = parse_day(&date)?;
    Ok(Json(state.history.audit_log().read_day(day).await?))
}

/// `GET /history/dates`
pub async fn history_dates(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let days = state.history.audit_log().list_days().await?;
    Ok(Json(days.iter().map(|d| d.format(DAY_FORMAT).to_string()).collect()))
}
