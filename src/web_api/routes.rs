//! API Routes

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::Result;
use crate::grid::SplitMode;
use crate::live_view::LiveViewSnapshot;
use crate::models::{ApiResponse, LabeledLiveView};
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(super::health_check))
        // Live view
        .route("/api/live-view", get(get_live_view))
        .route("/api/live-view/devices/:id/select", post(select_device))
        .route("/api/live-view/devices/:id", delete(deselect_device))
        .route("/api/live-view/devices/:id/pin", put(pin_device))
        .route("/api/live-view/devices/:id/pin", delete(unpin_device))
        .route(
            "/api/live-view/devices/:id/fix-selection",
            post(begin_fix_selection),
        )
        .route("/api/live-view/fix-selection", delete(cancel_fix_selection))
        .route("/api/live-view/split-mode", put(set_split_mode))
        .route("/api/live-view/page", put(set_page))
        .route("/api/live-view/page/next", post(next_page))
        .route("/api/live-view/page/prev", post(prev_page))
        .route("/api/live-view/autoplay", put(set_autoplay))
        .route("/api/live-view/autoplay/interval", put(set_autoplay_interval))
        // WebSocket
        .route("/api/ws", get(websocket_handler))
        .with_state(state)
}

// ========================================
// Live View Handlers
// ========================================

async fn get_live_view(State(state): State<AppState>) -> impl IntoResponse {
    let view = state.engine.view().await;
    let labeled = label_view(&state, view).await;
    Json(ApiResponse::success(labeled))
}

/// Attach display names to a snapshot. A failed lookup leaves the slots
/// unlabeled rather than failing the request.
async fn label_view(state: &AppState, view: LiveViewSnapshot) -> LabeledLiveView {
    let ids: Vec<String> = view
        .selected_devices
        .iter()
        .map(|d| d.device_id.clone())
        .collect();

    let device_names = match state.directory.get_devices_metadata(&ids).await {
        Ok(metadata) => metadata.into_iter().map(|m| (m.device_id, m.name)).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Device metadata lookup failed");
            HashMap::new()
        }
    };

    LabeledLiveView { view, device_names }
}

async fn select_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let view = state.engine.select_device(&id).await;
    Json(ApiResponse::success(view))
}

async fn deselect_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let view = state.engine.deselect_device(&id).await;
    Json(ApiResponse::success(view))
}

#[derive(Debug, Deserialize)]
struct PinRequest {
    slot_index: usize,
}

async fn pin_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PinRequest>,
) -> Result<Json<ApiResponse<LiveViewSnapshot>>> {
    let view = state.engine.pin_device(&id, req.slot_index).await?;
    Ok(Json(ApiResponse::success(view)))
}

async fn unpin_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<LiveViewSnapshot>>> {
    let view = state.engine.unpin_device(&id).await?;
    Ok(Json(ApiResponse::success(view)))
}

async fn begin_fix_selection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<LiveViewSnapshot>>> {
    let view = state.engine.begin_fix_selection(&id).await?;
    Ok(Json(ApiResponse::success(view)))
}

async fn cancel_fix_selection(State(state): State<AppState>) -> impl IntoResponse {
    let view = state.engine.cancel_fix_selection().await;
    Json(ApiResponse::success(view))
}

#[derive(Debug, Deserialize)]
struct SplitModeRequest {
    split_mode: SplitMode,
}

async fn set_split_mode(
    State(state): State<AppState>,
    Json(req): Json<SplitModeRequest>,
) -> impl IntoResponse {
    let view = state.engine.set_split_mode(req.split_mode).await;
    Json(ApiResponse::success(view))
}

#[derive(Debug, Deserialize)]
struct PageRequest {
    page: usize,
}

async fn set_page(
    State(state): State<AppState>,
    Json(req): Json<PageRequest>,
) -> impl IntoResponse {
    let view = state.engine.set_page(req.page).await;
    Json(ApiResponse::success(view))
}

async fn next_page(State(state): State<AppState>) -> impl IntoResponse {
    let view = state.engine.next_page().await;
    Json(ApiResponse::success(view))
}

async fn prev_page(State(state): State<AppState>) -> impl IntoResponse {
    let view = state.engine.prev_page().await;
    Json(ApiResponse::success(view))
}

#[derive(Debug, Deserialize)]
struct AutoplayRequest {
    enabled: bool,
}

async fn set_autoplay(
    State(state): State<AppState>,
    Json(req): Json<AutoplayRequest>,
) -> impl IntoResponse {
    let view = state.engine.set_autoplay(req.enabled).await;
    Json(ApiResponse::success(view))
}

#[derive(Debug, Deserialize)]
struct IntervalRequest {
    seconds: u64,
}

async fn set_autoplay_interval(
    State(state): State<AppState>,
    Json(req): Json<IntervalRequest>,
) -> Result<Json<ApiResponse<LiveViewSnapshot>>> {
    let view = state.engine.set_autoplay_in_seconds(req.seconds).await?;
    Ok(Json(ApiResponse::success(view)))
}

// ========================================
// WebSocket
// ========================================

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Handle WebSocket connection
async fn handle_websocket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let (conn_id, mut rx) = state.realtime.register().await;
    tracing::info!(connection_id = %conn_id, "WebSocket client connected");

    // Forward hub messages to the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // Drain incoming frames until the client goes away
    let recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => {
                    tracing::info!(connection_id = %conn_id, "WebSocket client disconnected");
                    break;
                }
                Err(e) => {
                    tracing::warn!(connection_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
        conn_id
    });

    let conn_id = tokio::select! {
        _ = send_task => conn_id,
        result = recv_task => result.unwrap_or(conn_id),
    };

    state.realtime.unregister(&conn_id).await;
}
