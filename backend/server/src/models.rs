//! # Payloads
//!
//! Records persisted in the three tables and the request/event shapes that
//! travel between the storefront frontend, the kitchen dashboard and this server.
//!
//! ## Money
//! - Prices and totals are [`Decimal`], serialized as strings (`"50.00"`)
//! - Requests may send either JSON numbers or strings
//!
//! ## Line Items
//! - `unit_price` is a snapshot taken when the order is placed
//! - Never joined back to the live menu price
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub is_available: bool,
    pub category: String,
    pub image: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a [`MenuItem`]. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuItemPatch {
    pub price: Option<Decimal>,
    pub is_available: Option<bool>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            other => Err(format!("unknown order status {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// A committed order header together with its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_info: Value,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderLineItem>,
}

/// Line item as sent by the cart. The cart widget historically posted
/// `{id, quantity, price}`, so those names are still accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLineItem {
    #[serde(alias = "id")]
    pub menu_item_id: i64,
    pub quantity: u32,
    #[serde(alias = "price")]
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_info: Value,
    pub items: Vec<NewLineItem>,
    pub total_amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OrderCreated {
    pub success: bool,
    pub order_id: i64,
}

#[derive(Debug, Serialize)]
pub struct MenuItemUpdated {
    pub success: bool,
    pub item: MenuItem,
}

/// Pushed to every attached dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum LiveEvent {
    NewOrder(Order),
    MenuUpdate(MenuItem),
}

impl LiveEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            LiveEvent::NewOrder(_) => "new_order",
            LiveEvent::MenuUpdate(_) => "menu_update",
        }
    }
}

/// Shape of the storefront's `content/menu.json`, used to seed an empty catalog.
#[derive(Debug, Deserialize)]
pub struct MenuSeed {
    pub menu_items: Vec<SeedItem>,
}

#[derive(Debug, Deserialize)]
pub struct SeedItem {
    #[serde(alias = "name_en")]
    pub name: String,
    #[serde(default, alias = "desc_en")]
    pub description: String,
    pub price: Decimal,
    pub category: String,
    #[serde(default = "available")]
    pub is_available: bool,
    #[serde(default)]
    pub image: Option<String>,
}

fn available() -> bool {
    true
}
