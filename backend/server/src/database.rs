//! # SQLite
//!
//! Relational store for the menu and placed orders.
//!
//! ## Tables
//!
//! - `menu_items`: the catalog, updated in place, never deleted
//! - `orders`: one header row per placed order, status starts at `pending`
//! - `order_details`: line items, foreign keys into both tables above
//!
//! ## Implementation
//!
//! - One connection behind `Arc<Mutex<_>>`, checked out per call on the blocking pool
//! - The guard is the checkout, dropping it on any exit path releases the connection
//! - Order placement runs inside a `rusqlite::Transaction`, rolled back on drop unless committed
//! - Decimals stored as text to keep scale exact, timestamps as RFC 3339 text
use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params, types::Type};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::task::{self, JoinError};
use tracing::{debug, info};

use crate::models::{
    MenuItem, MenuItemPatch, NewOrder, Order, OrderLineItem, OrderStatus, SeedItem,
};

const SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS menu_items (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        name         TEXT    NOT NULL,
        description  TEXT    NOT NULL DEFAULT '',
        price        TEXT    NOT NULL,
        is_available INTEGER NOT NULL DEFAULT 1,
        category     TEXT    NOT NULL,
        image        TEXT,
        updated_at   TEXT    NOT NULL
    );

    CREATE TABLE IF NOT EXISTS orders (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_info TEXT    NOT NULL,
        total_amount  TEXT    NOT NULL,
        status        TEXT    NOT NULL DEFAULT 'pending',
        created_at    TEXT    NOT NULL
    );

    CREATE TABLE IF NOT EXISTS order_details (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        order_id     INTEGER NOT NULL REFERENCES orders(id),
        menu_item_id INTEGER NOT NULL REFERENCES menu_items(id),
        quantity     INTEGER NOT NULL CHECK (quantity > 0),
        unit_price   TEXT    NOT NULL
    );

    CREATE INDEX IF NOT EXISTS order_details_order_id ON order_details(order_id);
"#;

const MENU_ITEM_COLUMNS: &str =
    "id, name, description, price, is_available, category, image, updated_at";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection lock poisoned")]
    Poisoned,

    #[error("Blocking task failed: {0}")]
    Join(#[from] JoinError),
}

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

pub fn init_database(path: &str) -> Result<Database, DatabaseError> {
    let conn = if path == ":memory:" {
        Connection::open_in_memory()?
    } else {
        Connection::open(Path::new(path))?
    };

    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch(SCHEMA)?;

    info!("Database ready at {path}");

    Ok(Database {
        conn: Arc::new(Mutex::new(conn)),
    })
}

impl Database {
    /// Checks out the connection on the blocking pool and runs `f` with it.
    async fn with_connection<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&mut Connection) -> Result<T, DatabaseError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| DatabaseError::Poisoned)?;
            f(&mut *guard)
        })
        .await?
    }

    pub async fn list_menu_items(&self) -> Result<Vec<MenuItem>, DatabaseError> {
        self.with_connection(|conn| {
            let mut statement = conn.prepare(&format!(
                "SELECT {MENU_ITEM_COLUMNS} FROM menu_items ORDER BY id ASC"
            ))?;

            let items = statement
                .query_map([], menu_item_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(items)
        })
        .await
    }

    /// Single `UPDATE … RETURNING`. `None` means no row carries `id`.
    pub async fn update_menu_item(
        &self,
        id: i64,
        patch: MenuItemPatch,
    ) -> Result<Option<MenuItem>, DatabaseError> {
        self.with_connection(move |conn| {
            let item = conn
                .query_row(
                    &format!(
                        "UPDATE menu_items
                         SET price = COALESCE(?1, price),
                             is_available = COALESCE(?2, is_available),
                             name = COALESCE(?3, name),
                             description = COALESCE(?4, description),
                             updated_at = ?5
                         WHERE id = ?6
                         RETURNING {MENU_ITEM_COLUMNS}"
                    ),
                    params![
                        patch.price.map(|price| price.to_string()),
                        patch.is_available,
                        patch.name,
                        patch.description,
                        timestamp(Utc::now()),
                        id,
                    ],
                    menu_item_from_row,
                )
                .optional()?;

            Ok(item)
        })
        .await
    }

    /// Inserts `items` only when the catalog is empty. Returns how many rows were written.
    pub async fn seed_menu(&self, items: Vec<SeedItem>) -> Result<usize, DatabaseError> {
        self.with_connection(move |conn| {
            let tx = conn.transaction()?;

            let existing: i64 = tx.query_row("SELECT COUNT(*) FROM menu_items", [], |row| row.get(0))?;
            if existing > 0 {
                debug!("Menu already holds {existing} items, skipping seed");
                return Ok(0);
            }

            let now = timestamp(Utc::now());
            {
                let mut statement = tx.prepare(
                    "INSERT INTO menu_items (name, description, price, is_available, category, image, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )?;

                for item in &items {
                    statement.execute(params![
                        item.name,
                        item.description,
                        item.price.to_string(),
                        item.is_available,
                        item.category,
                        item.image,
                        now,
                    ])?;
                }
            }

            tx.commit()?;

            Ok(items.len())
        })
        .await
    }

    /// Writes the header and every line item in one transaction.
    ///
    /// Any failing insert drops the transaction, rolling back the header and
    /// all items written before it.
    pub async fn insert_order(&self, order: NewOrder) -> Result<Order, DatabaseError> {
        self.with_connection(move |conn| {
            let tx = conn.transaction()?;
            let created_at = Utc::now();
            let status = OrderStatus::Pending;

            tx.execute(
                "INSERT INTO orders (customer_info, total_amount, status, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    serde_json::to_string(&order.customer_info)?,
                    order.total_amount.to_string(),
                    status.as_str(),
                    timestamp(created_at),
                ],
            )?;
            let order_id = tx.last_insert_rowid();

            let items = insert_line_items(&tx, order_id, &order)?;

            tx.commit()?;

            Ok(Order {
                id: order_id,
                customer_info: order.customer_info,
                total_amount: order.total_amount,
                status,
                created_at,
                items,
            })
        })
        .await
    }

    pub async fn find_order(&self, id: i64) -> Result<Option<Order>, DatabaseError> {
        self.with_connection(move |conn| {
            let header = conn
                .query_row(
                    "SELECT id, customer_info, total_amount, status, created_at
                     FROM orders WHERE id = ?1",
                    [id],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            decimal_column(row, 2)?,
                            status_column(row, 3)?,
                            timestamp_column(row, 4)?,
                        ))
                    },
                )
                .optional()?;

            let Some((id, customer_info, total_amount, status, created_at)) = header else {
                return Ok(None);
            };

            let mut statement = conn.prepare(
                "SELECT id, order_id, menu_item_id, quantity, unit_price
                 FROM order_details WHERE order_id = ?1 ORDER BY id ASC",
            )?;
            let items = statement
                .query_map([id], line_item_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Some(Order {
                id,
                customer_info: serde_json::from_str(&customer_info)?,
                total_amount,
                status,
                created_at,
                items,
            }))
        })
        .await
    }

    pub async fn order_count(&self) -> Result<i64, DatabaseError> {
        self.count("orders").await
    }

    pub async fn line_item_count(&self) -> Result<i64, DatabaseError> {
        self.count("order_details").await
    }

    async fn count(&self, table: &'static str) -> Result<i64, DatabaseError> {
        self.with_connection(move |conn| {
            let count = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(count)
        })
        .await
    }
}

fn insert_line_items(
    tx: &Transaction<'_>,
    order_id: i64,
    order: &NewOrder,
) -> Result<Vec<OrderLineItem>, DatabaseError> {
    let mut statement = tx.prepare(
        "INSERT INTO order_details (order_id, menu_item_id, quantity, unit_price)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    let mut items = Vec::with_capacity(order.items.len());
    for item in &order.items {
        let id = statement.insert(params![
            order_id,
            item.menu_item_id,
            item.quantity,
            item.unit_price.to_string(),
        ])?;

        items.push(OrderLineItem {
            id,
            order_id,
            menu_item_id: item.menu_item_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        });
    }

    Ok(items)
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn conversion_error<E>(index: usize, error: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
}

fn decimal_column(row: &Row<'_>, index: usize) -> rusqlite::Result<Decimal> {
    row.get::<_, String>(index)?
        .parse::<Decimal>()
        .map_err(|e| conversion_error(index, e))
}

fn timestamp_column(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&row.get::<_, String>(index)?)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| conversion_error(index, e))
}

fn status_column(row: &Row<'_>, index: usize) -> rusqlite::Result<OrderStatus> {
    row.get::<_, String>(index)?.parse::<OrderStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, e.into())
    })
}

fn menu_item_from_row(row: &Row<'_>) -> rusqlite::Result<MenuItem> {
    Ok(MenuItem {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: decimal_column(row, 3)?,
        is_available: row.get(4)?,
        category: row.get(5)?,
        image: row.get(6)?,
        updated_at: timestamp_column(row, 7)?,
    })
}

fn line_item_from_row(row: &Row<'_>) -> rusqlite::Result<OrderLineItem> {
    Ok(OrderLineItem {
        id: row.get(0)?,
        order_id: row.get(1)?,
        menu_item_id: row.get(2)?,
        quantity: row.get(3)?,
        unit_price: decimal_column(row, 4)?,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;
    use crate::models::NewLineItem;

    fn seed_item(name: &str, price: Decimal) -> SeedItem {
        SeedItem {
            name: name.to_string(),
            description: format!("{name} description"),
            price,
            category: "mains".to_string(),
            is_available: true,
            image: None,
        }
    }

    async fn seeded() -> Database {
        let database = init_database(":memory:").unwrap();
        database
            .seed_menu(vec![seed_item("Koshari", dec!(60.00)), seed_item("Falafel", dec!(20.00))])
            .await
            .unwrap();
        database
    }

    #[tokio::test]
    async fn test_seed_only_into_empty_menu() {
        let database = seeded().await;

        let again = database.seed_menu(vec![seed_item("Hawawshi", dec!(45))]).await.unwrap();

        assert_eq!(again, 0);
        assert_eq!(database.list_menu_items().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_menu_listed_by_id() {
        let database = seeded().await;

        let items = database.list_menu_items().await.unwrap();

        assert_eq!(items.iter().map(|item| item.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(items[0].price, dec!(60.00));
        assert_eq!(items[0].price.to_string(), "60.00");
    }

    #[tokio::test]
    async fn test_insert_and_find_order() {
        let database = seeded().await;

        let order = database
            .insert_order(NewOrder {
                customer_info: json!({"name": "Mona", "phone": "0100"}),
                items: vec![
                    NewLineItem { menu_item_id: 1, quantity: 1, unit_price: dec!(60.00) },
                    NewLineItem { menu_item_id: 2, quantity: 3, unit_price: dec!(20.00) },
                ],
                total_amount: dec!(120.00),
            })
            .await
            .unwrap();

        let found = database.find_order(order.id).await.unwrap().unwrap();

        assert_eq!(found, order);
        assert_eq!(found.items.len(), 2);
        assert!(found.items.iter().all(|item| item.order_id == order.id));
        assert_eq!(found.items[1].menu_item_id, 2);
    }

    #[tokio::test]
    async fn test_unknown_menu_item_rolls_back() {
        let database = seeded().await;

        let result = database
            .insert_order(NewOrder {
                customer_info: json!({"name": "Mona"}),
                items: vec![
                    NewLineItem { menu_item_id: 1, quantity: 1, unit_price: dec!(60.00) },
                    NewLineItem { menu_item_id: 999, quantity: 1, unit_price: dec!(10.00) },
                ],
                total_amount: dec!(70.00),
            })
            .await;

        assert!(matches!(result, Err(DatabaseError::Sqlite(_))));
        assert_eq!(database.order_count().await.unwrap(), 0);
        assert_eq!(database.line_item_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_zero_quantity_rejected_by_schema() {
        let database = seeded().await;

        let result = database
            .insert_order(NewOrder {
                customer_info: json!({}),
                items: vec![NewLineItem { menu_item_id: 1, quantity: 0, unit_price: dec!(60.00) }],
                total_amount: dec!(0),
            })
            .await;

        assert!(result.is_err());
        assert_eq!(database.order_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_patch_keeps_unspecified_fields() {
        let database = seeded().await;
        let before = database.list_menu_items().await.unwrap().remove(0);

        let after = database
            .update_menu_item(
                before.id,
                MenuItemPatch { is_available: Some(false), ..Default::default() },
            )
            .await
            .unwrap()
            .unwrap();

        assert!(!after.is_available);
        assert_eq!(after.name, before.name);
        assert_eq!(after.description, before.description);
        assert_eq!(after.price, before.price);
        assert_eq!(after.category, before.category);
        assert!(after.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn test_patch_missing_item() {
        let database = seeded().await;

        let result = database
            .update_menu_item(42, MenuItemPatch { price: Some(dec!(1)), ..Default::default() })
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_missing_order() {
        let database = seeded().await;

        assert!(database.find_order(1).await.unwrap().is_none());
    }
}
