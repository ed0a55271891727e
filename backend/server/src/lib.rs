//! Order intake backend for the Fresh Bites restaurant storefront.
//!
//!
//!
//! # General Infrastructure
//! - Static storefront (menu page + cart widget) posts orders to this server
//! - Kitchen dashboards keep a WebSocket open on `/api/live`
//! - SQLite file next to the binary, three tables: menu items, orders, order details
//! - Single process, no reverse proxy assumptions beyond CORS
//!
//!
//!
//! # Routes
//!
//! | Method | Path                    | Result                                   |
//! |--------|-------------------------|------------------------------------------|
//! | GET    | `/api/menu-items`       | every menu item, ascending id            |
//! | POST   | `/api/order`            | `201 {"success": true, "order_id": n}`   |
//! | GET    | `/api/order/{id}`       | order header with its line items         |
//! | PUT    | `/api/menu-item/{id}`   | `{"success": true, "item": {...}}`       |
//! | GET    | `/api/live`             | WebSocket upgrade, JSON events           |
//!
//! Errors are `{"error": "..."}` with 400, 404, 500 or 503.
//!
//!
//!
//! # Live Events
//!
//! ```json
//! {"event": "new_order", "data": {"id": 1, "items": [...], "status": "pending", ...}}
//! {"event": "menu_update", "data": {"id": 3, "price": "75.50", ...}}
//! ```
//!
//! Published only after the write they describe has committed. No backlog on connect.
//!
//!
//!
//! # Notes
//!
//! ## Totals
//! The cart computes `total_amount` client side. We recompute it from the line items
//! and reject the order when they disagree, before any write.
//!
//! ## Unit Price
//! Line items keep the price the customer saw. Later menu price changes never touch them.
//!
//!
//!
//! # Setup
//!
//! Run with logs.
//! ```sh
//! RUST_LOG=info cargo run -p storefront
//! ```
//!
//! Environment (all optional).
//! ```sh
//! RUST_PORT=3000 DATABASE_PATH=restaurant.db MENU_SEED_PATH=content/menu.json \
//! CHANNEL_CAPACITY=64 MAX_SUBSCRIBERS=256 cargo run -p storefront
//! ```
use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post, put},
};
use signal::ctrl_c;
#[cfg(unix)]
use signal::unix::{SignalKind, signal};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod channel;
pub mod config;
pub mod database;
pub mod error;
pub mod menu;
pub mod models;
pub mod orders;
pub mod routes;
pub mod state;
pub mod utils;

use config::Config;
use routes::{
    get_order_handler, live_handler, menu_item_handler, menu_items_handler, order_handler,
};
use state::AppState;

pub async fn start_server() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::new(config).await?;

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/menu-items", get(menu_items_handler))
        .route("/api/menu-item/{id}", put(menu_item_handler))
        .route("/api/order", post(order_handler))
        .route("/api/order/{id}", get(get_order_handler))
        .route("/api/live", get(live_handler))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
