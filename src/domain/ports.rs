use async_trait::async_trait;

use super::errors::{LookupError, StoreError};
use super::order::{Account, Order, OrderLineRow, Product, ProductQuery};

/// Durable order storage. Implementations are synchronous and are driven from
/// a blocking task.
pub trait OrderRepository: Send + Sync + 'static {
    /// Writes the order header and all of its line items in one transaction.
    fn put_order(&self, order: &Order) -> Result<(), StoreError>;

    /// Flattened (order x line item) rows for an account, ordered by order id
    /// and then line position.
    fn list_rows_for_account(&self, account_id: &str) -> Result<Vec<OrderLineRow>, StoreError>;
}

#[async_trait]
pub trait AccountLookup: Send + Sync {
    /// `Ok(None)` when the account does not exist.
    async fn get_account(&self, id: &str) -> Result<Option<Account>, LookupError>;
}

#[async_trait]
pub trait ProductLookup: Send + Sync {
    async fn get_products(&self, query: ProductQuery) -> Result<Vec<Product>, LookupError>;
}
