use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use holdings_pipeline::{
    bucket, format_exposure, positions_to_csv_string, select_range, top_positions, RankRange,
};
use models::{
    ConsolidatedPosition, Dimension, DistributionBucket, Kpis, ParseWarning, ReportMetadata,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    session::{AuthenticatedSession, SessionContext},
    state::AppState,
    Result,
};

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "holdings-api"
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub access_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub session_id: String,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/login
/// A wrong code answers 401 with a session id the client can retry under.
/// Only a successful login behind a configured code stores the session.
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LoginResponse>)> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadQuery(rejection.body_text()))?;
    let access_code = request
        .access_code
        .ok_or_else(|| ApiError::BadQuery("access_code is required".to_string()))?;

    let session = state.sessions.resolve(request.session_id.as_deref()).await;

    if !state.gate.verify(&access_code) {
        tracing::warn!(session_id = %session.session_id, "rejected access code");
        let body = LoginResponse {
            session_id: session.session_id,
            authenticated: false,
            error: Some("Invalid access code".to_string()),
        };
        return Ok((StatusCode::UNAUTHORIZED, Json(body)));
    }

    // Without a code the gate never consults the store.
    let session = if state.gate.is_open() {
        SessionContext {
            authenticated: true,
            ..session
        }
    } else {
        state.sessions.authenticate(&session.session_id).await
    };
    tracing::info!(session_id = %session.session_id, "session authenticated");

    let body = LoginResponse {
        session_id: session.session_id,
        authenticated: true,
        error: None,
    };
    Ok((StatusCode::OK, Json(body)))
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub metadata: ReportMetadata,
    pub kpis: Kpis,
    pub total_exposure_label: String,
    pub countries: Vec<DistributionBucket>,
    pub sectors: Vec<DistributionBucket>,
    pub top_positions: Vec<ConsolidatedPosition>,
    pub warning_count: usize,
}

/// GET /api/dashboard
/// KPIs, both distributions and the top positions in one payload
pub async fn get_dashboard(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
) -> Result<impl IntoResponse> {
    let report = state.repo.fetch_report().await?;

    Ok(Json(DashboardResponse {
        metadata: report.metadata.clone(),
        kpis: report.kpis.clone(),
        total_exposure_label: format_exposure(&report.kpis),
        countries: report.countries.clone(),
        sectors: report.sectors.clone(),
        top_positions: top_positions(&report.ranked, state.view.top_positions),
        warning_count: report.warnings.len(),
    }))
}

/// GET /api/positions
/// Full ranking, heaviest first
pub async fn get_positions(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
) -> Result<impl IntoResponse> {
    let report = state.repo.fetch_report().await?;
    Ok(Json(report.ranked.clone()))
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RangeResponse {
    pub start: usize,
    pub end: usize,
    pub total: usize,
    pub positions: Vec<ConsolidatedPosition>,
}

/// GET /api/positions/range?start=&end=
/// Bounds are clamped to the ranking; positions come back lightest first
pub async fn get_positions_range(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse> {
    let report = state.repo.fetch_report().await?;
    let total = report.ranked.len();
    let (default_start, default_end) = state.view.default_range;
    let requested = RankRange::new(
        query.start.unwrap_or(default_start),
        query.end.unwrap_or(default_end),
    );

    let response = match requested.clamped(total) {
        Some(range) => RangeResponse {
            start: range.start,
            end: range.end,
            total,
            positions: select_range(&report.ranked, range.start, range.end),
        },
        None => RangeResponse {
            start: 0,
            end: 0,
            total,
            positions: Vec::new(),
        },
    };

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct DistributionQuery {
    pub threshold: Option<f64>,
}

/// GET /api/distribution/:dimension?threshold=
pub async fn get_distribution(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
    Path(dimension): Path<String>,
    Query(query): Query<DistributionQuery>,
) -> Result<impl IntoResponse> {
    let dimension: Dimension = dimension.parse().map_err(ApiError::BadQuery)?;
    let threshold = query.threshold.unwrap_or(state.view.threshold);
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(ApiError::BadQuery(format!(
            "threshold must be a non-negative number, got {}",
            threshold
        )));
    }

    let report = state.repo.fetch_report().await?;
    let buckets = bucket(&report.ranked, dimension, threshold);

    Ok(Json(serde_json::json!({
        "dimension": dimension.to_string(),
        "threshold": threshold,
        "buckets": buckets,
    })))
}

/// GET /api/warnings
pub async fn get_warnings(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
) -> Result<impl IntoResponse> {
    let report = state.repo.fetch_report().await?;
    let warnings: Vec<ParseWarning> = report.warnings.clone();
    Ok(Json(warnings))
}

/// GET /api/export.csv
/// Ranked positions as a CSV download
pub async fn export_csv(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
) -> Result<impl IntoResponse> {
    let report = state.repo.fetch_report().await?;
    let body = positions_to_csv_string(&report.ranked)
        .map_err(|e| ApiError::Internal(format!("CSV export failed: {}", e)))?;

    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/csv; charset=utf-8"),
        ),
        (
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment; filename=\"positions.csv\""),
        ),
    ];

    Ok((StatusCode::OK, headers, body))
}

/// POST /api/cache/invalidate
/// Forces the next request to fetch and rebuild the report
pub async fn invalidate_cache(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
) -> impl IntoResponse {
    state.repo.invalidate_cache().await;

    Json(serde_json::json!({
        "status": "success",
        "message": "Cache invalidated. Fresh data will be loaded on next request."
    }))
}
