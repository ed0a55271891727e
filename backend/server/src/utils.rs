use rust_decimal::Decimal;

use crate::{
    error::AppError::{self, Validation},
    models::{MenuItemPatch, NewOrder, SeedItem},
};

/// Sum of `unit_price × quantity` over every line, `None` once it leaves `Decimal` range.
pub fn line_total(order: &NewOrder) -> Option<Decimal> {
    order.items.iter().try_fold(Decimal::ZERO, |total, item| {
        item.unit_price
            .checked_mul(Decimal::from(item.quantity))
            .and_then(|line| total.checked_add(line))
    })
}

/// Everything checkable without touching storage.
pub fn validate_order(order: &NewOrder) -> Result<(), AppError> {
    if order.items.is_empty() {
        return Err(Validation("order has no items".to_string()));
    }

    if order.customer_info.is_null() {
        return Err(Validation("customer_info is required".to_string()));
    }

    for (index, item) in order.items.iter().enumerate() {
        if item.quantity == 0 {
            return Err(Validation(format!("item {index} has zero quantity")));
        }

        if item.unit_price.is_sign_negative() {
            return Err(Validation(format!("item {index} has a negative price")));
        }
    }

    if order.total_amount.is_sign_negative() {
        return Err(Validation("total_amount is negative".to_string()));
    }

    let expected =
        line_total(order).ok_or_else(|| Validation("items total overflows".to_string()))?;
    if expected != order.total_amount {
        return Err(Validation(format!(
            "total_amount {} does not match items total {expected}",
            order.total_amount
        )));
    }

    Ok(())
}

pub fn validate_patch(patch: &MenuItemPatch) -> Result<(), AppError> {
    if patch.price.is_some_and(|price| price.is_sign_negative()) {
        return Err(Validation("price is negative".to_string()));
    }

    if patch.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(Validation("name is blank".to_string()));
    }

    Ok(())
}

pub fn validate_seed_item(item: &SeedItem) -> Result<(), AppError> {
    if item.price.is_sign_negative() {
        return Err(Validation(format!("{} has a negative price", item.name)));
    }

    if item.name.trim().is_empty() {
        return Err(Validation("seed item name is blank".to_string()));
    }

    Ok(())
}
