#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use server::{
    config::Config,
    models::{NewLineItem, NewOrder, SeedItem},
    state::AppState,
};

/// Fresh in-memory state with menu items 1..=8, item `n` priced at `n * 10`.
pub async fn seeded_state() -> Arc<AppState> {
    let state = AppState::new(Config::in_memory()).await.unwrap();

    let items = (1..=8)
        .map(|n| SeedItem {
            name: format!("Dish {n}"),
            description: format!("House dish number {n}"),
            price: Decimal::from(n * 10),
            category: (if n % 2 == 0 { "mains" } else { "desserts" }).to_string(),
            is_available: true,
            image: None,
        })
        .collect();
    state.database.seed_menu(items).await.unwrap();

    state
}

pub fn single_item_order(menu_item_id: i64, quantity: u32, unit_price: Decimal) -> NewOrder {
    NewOrder {
        customer_info: json!({"name": "Mona", "phone": "01000000000", "address": "12 Nile St"}),
        items: vec![NewLineItem {
            menu_item_id,
            quantity,
            unit_price,
        }],
        total_amount: unit_price * Decimal::from(quantity),
    }
}

pub fn scenario_order() -> NewOrder {
    single_item_order(7, 2, dec!(50.00))
}
