use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::order::{Order, OrderLineRow};
use crate::schema::{order_products, orders};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub account_id: String,
    pub created_at: DateTime<Utc>,
    pub total_price: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow<'a> {
    pub id: Uuid,
    pub account_id: &'a str,
    pub created_at: DateTime<Utc>,
    pub total_price: &'a BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Associations)]
#[diesel(table_name = order_products)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderProductRow {
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: String,
    pub quantity: i32,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_products)]
pub struct NewOrderProductRow<'a> {
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: &'a str,
    pub quantity: i32,
    pub name: &'a str,
    pub description: &'a str,
    pub price: &'a BigDecimal,
}

impl<'a> NewOrderRow<'a> {
    pub fn from_order(order: &'a Order) -> Self {
        Self {
            id: order.id,
            account_id: &order.account_id,
            created_at: order.created_at,
            total_price: &order.total_price,
        }
    }
}

impl<'a> NewOrderProductRow<'a> {
    /// Snapshot rows for every line item, numbered in request order.
    pub fn from_order(order: &'a Order) -> Vec<Self> {
        order
            .line_items
            .iter()
            .enumerate()
            .map(|(position, item)| Self {
                order_id: order.id,
                position: position as i32,
                product_id: &item.product_id,
                quantity: item.quantity,
                name: &item.name,
                description: &item.description,
                price: &item.price_at_order_time,
            })
            .collect()
    }
}

impl From<(OrderRow, OrderProductRow)> for OrderLineRow {
    fn from((order, line): (OrderRow, OrderProductRow)) -> Self {
        Self {
            order_id: order.id,
            account_id: order.account_id,
            created_at: order.created_at,
            total_price: order.total_price,
            position: line.position,
            product_id: line.product_id,
            quantity: line.quantity,
            name: line.name,
            description: line.description,
            price: line.price,
        }
    }
}
