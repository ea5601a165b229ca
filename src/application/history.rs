//! Rebuilds nested orders from the store's flattened join rows and overlays
//! live catalog data onto their line items.

use std::collections::{BTreeSet, HashMap};

use crate::domain::order::{LineItem, Order, OrderLineRow, Product};

/// Groups rows into orders with a single pass over rows sorted by order id.
///
/// Rows that are not contiguous per order are stable-sorted first, so line
/// positions within an order keep their relative order.
pub fn group_rows(mut rows: Vec<OrderLineRow>) -> Vec<Order> {
    if !is_grouped(&rows) {
        log::warn!("order rows arrived out of order, sorting before grouping");
        rows.sort_by_key(|r| r.order_id);
    }

    let mut orders = Vec::new();
    let mut current: Option<Order> = None;

    for row in rows {
        let starts_new = current.as_ref().map_or(true, |o| o.id != row.order_id);
        if starts_new {
            if let Some(done) = current.take() {
                orders.push(done);
            }
            current = Some(Order {
                id: row.order_id,
                account_id: row.account_id,
                created_at: row.created_at,
                total_price: row.total_price,
                line_items: Vec::new(),
            });
        }

        if let Some(order) = current.as_mut() {
            order.line_items.push(LineItem {
                product_id: row.product_id,
                quantity: row.quantity,
                price_at_order_time: row.price,
                name: row.name,
                description: row.description,
                live: None,
            });
        }
    }

    if let Some(done) = current {
        orders.push(done);
    }
    orders
}

fn is_grouped(rows: &[OrderLineRow]) -> bool {
    rows.windows(2).all(|w| w[0].order_id <= w[1].order_id)
}

/// Distinct product ids referenced anywhere in `orders`, sorted.
pub fn referenced_product_ids(orders: &[Order]) -> Vec<String> {
    orders
        .iter()
        .flat_map(|o| o.line_items.iter().map(|i| i.product_id.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Attaches the live product to every line item that resolved. Unresolved
/// line items keep only their snapshot. Returns how many items were left
/// without a live record.
pub fn apply_live_products(orders: &mut [Order], products: Vec<Product>) -> usize {
    let by_id: HashMap<String, Product> =
        products.into_iter().map(|p| (p.id.clone(), p)).collect();

    let mut unresolved = 0;
    for item in orders.iter_mut().flat_map(|o| o.line_items.iter_mut()) {
        match by_id.get(&item.product_id) {
            Some(product) => item.live = Some(product.clone()),
            None => unresolved += 1,
        }
    }
    unresolved
}
