use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Largest page the catalog hands out for listing and search queries.
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub name: String,
}

/// Product record as owned by the catalog. The order domain only ever holds
/// short-lived copies of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
}

/// One `(product, quantity)` pair of a create-order request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedItem {
    pub product_id: String,
    pub quantity: i32,
}

impl RequestedItem {
    pub fn new(product_id: impl Into<String>, quantity: i32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub product_id: String,
    pub quantity: i32,
    /// Snapshot taken from the catalog when the order was created.
    pub price_at_order_time: BigDecimal,
    pub name: String,
    pub description: String,
    /// Current catalog record, filled in on read for display only. Never persisted.
    pub live: Option<Product>,
}

impl LineItem {
    pub fn from_snapshot(product: &Product, quantity: i32) -> Self {
        Self {
            product_id: product.id.clone(),
            quantity,
            price_at_order_time: product.price.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            live: None,
        }
    }

    pub fn line_total(&self) -> BigDecimal {
        &self.price_at_order_time * BigDecimal::from(self.quantity)
    }

    pub fn display_name(&self) -> &str {
        self.live.as_ref().map_or(&self.name, |p| &p.name)
    }

    pub fn display_description(&self) -> &str {
        self.live.as_ref().map_or(&self.description, |p| &p.description)
    }

    pub fn current_price(&self) -> &BigDecimal {
        self.live
            .as_ref()
            .map_or(&self.price_at_order_time, |p| &p.price)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub account_id: String,
    pub created_at: DateTime<Utc>,
    pub total_price: BigDecimal,
    pub line_items: Vec<LineItem>,
}

/// Sum of `price_at_order_time * quantity` over all line items.
pub fn total_of(items: &[LineItem]) -> BigDecimal {
    items
        .iter()
        .fold(BigDecimal::from(0), |acc, item| acc + item.line_total())
}

/// One row of the order/line-item join as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineRow {
    pub order_id: Uuid,
    pub account_id: String,
    pub created_at: DateTime<Utc>,
    pub total_price: BigDecimal,
    pub position: i32,
    pub product_id: String,
    pub quantity: i32,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
}

/// Parameters of a catalog lookup.
///
/// With `ids` set the catalog resolves exactly those products (the resolvable
/// subset, in no particular order). Otherwise it lists or searches with
/// `skip`/`take` pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub ids: Vec<String>,
    pub query: Option<String>,
    pub skip: u64,
    pub take: u64,
}

impl ProductQuery {
    pub fn by_ids(ids: Vec<String>) -> Self {
        Self {
            ids,
            ..Self::default()
        }
    }

    pub fn search(query: Option<String>, skip: u64, take: u64) -> Self {
        Self {
            ids: Vec::new(),
            query: query.filter(|q| !q.trim().is_empty()),
            skip,
            take,
        }
    }

    /// Page size actually served: capped at [`MAX_PAGE_SIZE`], and defaulting
    /// to it when no pagination was given at all.
    pub fn effective_take(&self) -> u64 {
        if self.take > MAX_PAGE_SIZE || (self.skip == 0 && self.take == 0) {
            MAX_PAGE_SIZE
        } else {
            self.take
        }
    }
}
