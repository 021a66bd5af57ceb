// HTTP request handlers
use crate::application::dashboard_service::NewTile;
use crate::application::settings_service::SettingsUpdate;
use crate::domain::dashboard::{GridRect, LayoutEntry, Tile};
use crate::domain::error::DashboardError;
use crate::domain::gesture::TileDetails;
use crate::infrastructure::chunked_json::stream_from_watch;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Error response. For mutations, `applied` tells the client the local change stands.
pub struct ApiError {
    error: DashboardError,
    applied: bool,
}

impl ApiError {
    fn mutation(error: DashboardError) -> Self {
        let applied = matches!(error, DashboardError::Persistence(_));
        Self { error, applied }
    }
}

impl From<DashboardError> for ApiError {
    fn from(error: DashboardError) -> Self {
        Self {
            error,
            applied: false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.error {
            DashboardError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
            DashboardError::DuplicateId(_) => StatusCode::CONFLICT,
            DashboardError::Persistence(_) => StatusCode::BAD_GATEWAY,
        };
        let body = json!({
            "error": self.error.to_string(),
            "applied": self.applied,
        });
        (status, Json(body)).into_response()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTileRequest {
    pub id: Option<String>,
    pub title: String,
    pub sensor_type: String,
    pub layout: Option<GridRect>,
}

#[derive(Deserialize)]
pub struct PointerRequest {
    pub x: f64,
    pub y: f64,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DrawEndRequest {
    pub title: Option<String>,
    pub sensor_type: Option<String>,
}

#[derive(Serialize)]
pub struct DrawEndResponse {
    pub tile: Option<Tile>,
}

#[derive(Deserialize)]
pub struct ChartQuery {
    pub scale: Option<f64>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Reachability of the sensor backend
pub async fn backend_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.backend.health_check().await {
        Ok(body) => (StatusCode::OK, Json(json!({"backend": "ok", "details": body}))),
        Err(e) => {
            tracing::warn!("Backend health check failed: {:#}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({"backend": "unreachable", "error": e.to_string()})),
            )
        }
    }
}

/// All tiles with their latest data
pub async fn list_tiles(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let tiles = state.dashboard.tiles().await;
    match json_response(StatusCode::OK, &tiles, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Stream a snapshot of the tiles on every change, until shutdown
pub async fn stream_tiles(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);
    stream_from_watch(state.dashboard.subscribe(), state.shutdown.clone(), compress).await
}

pub async fn add_tile(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddTileRequest>,
) -> Result<(StatusCode, Json<Tile>), ApiError> {
    let tile = state
        .dashboard
        .add_tile(NewTile {
            id: request.id,
            title: request.title,
            sensor_type: request.sensor_type,
            layout: request.layout,
        })
        .await
        .map_err(ApiError::mutation)?;

    Ok((StatusCode::CREATED, Json(tile)))
}

pub async fn delete_tile(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let removed = state
        .dashboard
        .delete_tile(&id)
        .await
        .map_err(ApiError::mutation)?;
    Ok(Json(json!({ "removed": removed })))
}

/// Apply drag/resize results reported by the grid
pub async fn apply_layout(
    State(state): State<Arc<AppState>>,
    Json(entries): Json<Vec<LayoutEntry>>,
) -> Result<Json<Value>, ApiError> {
    let applied = state
        .dashboard
        .apply_layout(&entries)
        .await
        .map_err(ApiError::mutation)?;
    Ok(Json(json!({ "applied": applied })))
}

pub async fn draw_start(
    State(state): State<Arc<AppState>>,
    Json(pointer): Json<PointerRequest>,
) -> Result<Json<GridRect>, ApiError> {
    Ok(Json(state.dashboard.begin_draw(pointer.x, pointer.y).await?))
}

/// Current rectangle, or null when no draw gesture is in progress
pub async fn draw_move(
    State(state): State<Arc<AppState>>,
    Json(pointer): Json<PointerRequest>,
) -> Result<Json<Option<GridRect>>, ApiError> {
    Ok(Json(state.dashboard.update_draw(pointer.x, pointer.y).await?))
}

pub async fn draw_end(
    State(state): State<Arc<AppState>>,
    body: Option<Json<DrawEndRequest>>,
) -> Result<Json<DrawEndResponse>, ApiError> {
    let Json(request) = body.unwrap_or_default();
    let details = match (request.title, request.sensor_type) {
        (Some(title), Some(sensor_type)) => Some(TileDetails { title, sensor_type }),
        _ => None,
    };

    let tile = state
        .dashboard
        .finish_draw(details)
        .await
        .map_err(ApiError::mutation)?;
    Ok(Json(DrawEndResponse { tile }))
}

pub async fn draw_cancel(State(state): State<Arc<AppState>>) -> StatusCode {
    state.dashboard.cancel_draw().await;
    StatusCode::NO_CONTENT
}

/// Full-size chart for one tile with every configured rolling average
pub async fn tile_chart(
    Path(id): Path<String>,
    Query(query): Query<ChartQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let view = state.charts.chart(&id, query.scale).await?;
    Ok(
        match json_response(StatusCode::OK, &view, accepts_brotli(&headers)).await {
            Ok(response) => response,
            Err(status) => status.into_response(),
        },
    )
}

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    Ok(Json(state.settings.get().await?))
}

pub async fn patch_settings(
    State(state): State<Arc<AppState>>,
    Json(edited): Json<Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    let body = match state.settings.update(edited).await? {
        SettingsUpdate::Unchanged => json!({ "status": "no changes" }),
        SettingsUpdate::Updated(settings) => json!({ "status": "updated", "settings": settings }),
    };
    Ok(Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    async fn render(error: ApiError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_error_status_mapping() {
        let cases = [
            (DashboardError::InvalidArgument("bad".into()), StatusCode::BAD_REQUEST),
            (DashboardError::NotFound("a".into()), StatusCode::NOT_FOUND),
            (DashboardError::DuplicateId("a".into()), StatusCode::CONFLICT),
            (DashboardError::Persistence(anyhow!("down")), StatusCode::BAD_GATEWAY),
        ];

        for (error, expected) in cases {
            let message = error.to_string();
            let (status, body) = render(ApiError::from(error)).await;
            assert_eq!(status, expected);
            assert_eq!(body["error"], message.as_str());
            assert_eq!(body["applied"], false);
        }
    }

    #[tokio::test]
    async fn test_only_failed_saves_report_applied() {
        let (status, body) =
            render(ApiError::mutation(DashboardError::Persistence(anyhow!("down")))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["applied"], true);

        let (status, body) =
            render(ApiError::mutation(DashboardError::DuplicateId("a".into()))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["applied"], false);

        let (status, body) =
            render(ApiError::mutation(DashboardError::InvalidArgument("blank".into()))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["applied"], false);
    }
}
