//! # Order Intake
//!
//! 1. Validate the request, storage untouched on failure
//! 2. Header and line items written in one transaction
//! 3. `new_order` published only once the commit has returned
//!
//! A failed transaction is reported as is, never retried here.
use tracing::{info, warn};

use crate::{
    error::AppError,
    models::{LiveEvent, NewOrder, Order},
    state::AppState,
    utils::validate_order,
};

pub async fn place_order(state: &AppState, order: NewOrder) -> Result<Order, AppError> {
    validate_order(&order)?;

    let items = order.items.len();
    let placed = state.database.insert_order(order).await.map_err(|e| {
        warn!(error = %e, items, "Order rolled back");
        AppError::TransactionFailed(e)
    })?;

    info!(order = placed.id, items, total = %placed.total_amount, "Order placed");

    state.hub.publish(LiveEvent::NewOrder(placed.clone()));

    Ok(placed)
}

pub async fn get_order(state: &AppState, id: i64) -> Result<Order, AppError> {
    state
        .database
        .find_order(id)
        .await?
        .ok_or(AppError::OrderNotFound)
}
