//! # Menu
//!
//! Catalog reads, in-place updates and the startup seed.
//!
//! ## Seed
//! - Same shape as the storefront's `content/menu.json`
//! - Only applied to an empty `menu_items` table
//! - Missing file is skipped, unreadable JSON aborts startup
use std::{fs::read_to_string, io::ErrorKind};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::{
    database::Database,
    error::AppError,
    models::{LiveEvent, MenuItem, MenuItemPatch, MenuSeed},
    state::AppState,
    utils::{validate_patch, validate_seed_item},
};

pub async fn list_menu(state: &AppState) -> Result<Vec<MenuItem>, AppError> {
    Ok(state.database.list_menu_items().await?)
}

pub async fn update_menu_item(
    state: &AppState,
    id: i64,
    patch: MenuItemPatch,
) -> Result<MenuItem, AppError> {
    validate_patch(&patch)?;

    let item = state
        .database
        .update_menu_item(id, patch)
        .await
        .map_err(AppError::UpdateFailed)?
        .ok_or(AppError::ItemNotFound)?;

    info!(item = item.id, price = %item.price, available = item.is_available, "Menu item updated");

    state.hub.publish(LiveEvent::MenuUpdate(item.clone()));

    Ok(item)
}

pub async fn load_seed(database: &Database, path: &str) -> Result<usize> {
    if path.is_empty() {
        return Ok(0);
    }

    let contents = match read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Menu seed {path} not found, skipping");
            return Ok(0);
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to read menu seed {path}")),
    };

    let seed: MenuSeed =
        serde_json::from_str(&contents).with_context(|| format!("Malformed menu seed {path}"))?;

    for item in &seed.menu_items {
        validate_seed_item(item).with_context(|| format!("Invalid menu seed {path}"))?;
    }

    let seeded = database.seed_menu(seed.menu_items).await?;
    if seeded > 0 {
        info!("Seeded {seeded} menu items from {path}");
    }

    Ok(seeded)
}
