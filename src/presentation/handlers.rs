// HTTP request handlers
use crate::application::history_service::{ChartView, Summary};
use crate::domain::channel::Channel;
use crate::domain::viewport::{DragPhase, IndexWindow};
use crate::infrastructure::export::{export_file_name, ExportDocument};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_WIDTH: f64 = 1200.0;
const DEFAULT_HEIGHT: f64 = 400.0;

#[derive(Deserialize)]
pub struct ChartQuery {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Deserialize)]
pub struct ZoomRequest {
    pub delta_y: f64,
}

#[derive(Deserialize)]
pub struct DragRequest {
    pub phase: DragPhase,
    #[serde(default)]
    pub x: f64,
}

#[derive(Serialize)]
pub struct ViewportResponse {
    pub window: Option<IndexWindow>,
    pub visible_count: usize,
    pub position_offset: i64,
    pub dragging: bool,
}

#[derive(Serialize)]
pub struct ChannelState {
    pub index: usize,
    pub label: &'static str,
    pub visible: bool,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Window, axis bounds and label layout for one redraw
pub async fn chart_view(
    Query(query): Query<ChartQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<ChartView> {
    let width = query.width.filter(|w| *w > 0.0).unwrap_or(DEFAULT_WIDTH);
    let height = query.height.filter(|h| *h > 0.0).unwrap_or(DEFAULT_HEIGHT);
    Json(state.history.with(|h| h.chart_view(width, height)))
}

pub async fn zoom(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ZoomRequest>,
) -> Json<ViewportResponse> {
    Json(state.history.with(|h| {
        let window = h.zoom(request.delta_y);
        ViewportResponse {
            window,
            visible_count: h.viewport().visible_count(),
            position_offset: h.viewport().position_offset(),
            dragging: h.viewport().is_dragging(),
        }
    }))
}

pub async fn drag(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DragRequest>,
) -> Json<ViewportResponse> {
    Json(state.history.with(|h| {
        let window = h.drag(request.phase, request.x);
        ViewportResponse {
            window,
            visible_count: h.viewport().visible_count(),
            position_offset: h.viewport().position_offset(),
            dragging: h.viewport().is_dragging(),
        }
    }))
}

pub async fn list_channels(State(state): State<Arc<AppState>>) -> Json<Vec<ChannelState>> {
    Json(state.history.with(|h| {
        Channel::ALL
            .iter()
            .map(|&channel| ChannelState {
                index: channel.index(),
                label: channel.label(),
                visible: h.visibility().is_visible(channel),
            })
            .collect()
    }))
}

/// Flip one channel's visibility and persist it
pub async fn toggle_channel(
    Path(index): Path<usize>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let toggled = state.history.with(|h| {
        h.toggle_channel(index)
            .map(|visible| (visible, h.visibility().flags().to_vec()))
    });

    match (toggled, Channel::from_index(index)) {
        (Some((visible, flags)), Some(channel)) => {
            state.visibility_store.persist(flags).await;
            Json(ChannelState {
                index,
                label: channel.label(),
                visible,
            })
            .into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Called by the renderer once it can apply visibility flags
pub async fn renderer_ready(State(state): State<Arc<AppState>>) -> StatusCode {
    if !state.readiness.is_ready() {
        tracing::info!("Renderer ready");
        state.readiness.mark_ready();
    }
    StatusCode::NO_CONTENT
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<Summary> {
    Json(state.history.with(|h| h.summary()))
}

/// Download the full history as JSON
pub async fn export(State(state): State<Arc<AppState>>) -> Response {
    let now = chrono::Utc::now();
    let document = state
        .history
        .with(|h| ExportDocument::from_buffer(h.buffer(), now));

    match document.to_json() {
        Ok(json) => (
            [
                (header::CONTENT_TYPE, "application/json".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", export_file_name(now)),
                ),
            ],
            json,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Export serialization error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
