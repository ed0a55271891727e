use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::{
    channel::Subscription,
    error::AppError,
    menu::{list_menu, update_menu_item},
    models::{MenuItem, MenuItemPatch, MenuItemUpdated, NewOrder, Order, OrderCreated},
    orders::{get_order, place_order},
    state::AppState,
};

pub async fn menu_items_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MenuItem>>, AppError> {
    Ok(Json(list_menu(&state).await?))
}

pub async fn order_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewOrder>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(order) = payload.map_err(|e| {
        debug!(error = %e, "Rejected order payload");
        AppError::MalformedPayload
    })?;

    let placed = place_order(&state, order).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderCreated {
            success: true,
            order_id: placed.id,
        }),
    ))
}

pub async fn get_order_handler(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Order>, AppError> {
    let Path(id) = id.map_err(|_| AppError::MalformedPayload)?;

    Ok(Json(get_order(&state, id).await?))
}

pub async fn menu_item_handler(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<MenuItemPatch>, JsonRejection>,
) -> Result<Json<MenuItemUpdated>, AppError> {
    let Path(id) = id.map_err(|_| AppError::MalformedPayload)?;
    let Json(patch) = payload.map_err(|_| AppError::MalformedPayload)?;

    let item = update_menu_item(&state, id, patch).await?;

    Ok(Json(MenuItemUpdated {
        success: true,
        item,
    }))
}

/// Attaches before the upgrade completes so nothing published after the
/// handshake is missed.
pub async fn live_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let subscription = state.hub.subscribe()?;

    Ok(ws.on_upgrade(move |socket| forward_events(socket, subscription)))
}

async fn forward_events(mut socket: WebSocket, mut subscription: Subscription) {
    let id = subscription.id();

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else { break };

                let text = match serde_json::to_string(&*event) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(subscriber = id, error = %e, "Failed to encode event");
                        continue;
                    }
                };

                if let Err(e) = socket.send(Message::Text(text.into())).await {
                    debug!(subscriber = id, error = %e, "Dashboard send failed");
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!(subscriber = id, "Dashboard disconnected");
}
