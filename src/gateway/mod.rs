//! Aggregation layer in front of the account, catalog and order services.
//!
//! Each field is resolved under its own fixed timeout, independent of the
//! inbound request's deadline. Nested fields are only fetched when asked for,
//! and a failing nested field is reported next to the data instead of failing
//! the whole response.
//!
//! Order creation is the exception: its timeout is handed to the order
//! backend as a deadline rather than enforced by dropping the call, so a
//! write that has already started is never reported as timed out.

pub mod nodes;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;

use crate::application::order_service::OrderService;
use crate::domain::errors::{DomainError, LookupError};
use crate::domain::order::{Order, ProductQuery, RequestedItem};
use crate::domain::ports::{AccountLookup, ProductLookup};

use nodes::{AccountNode, FieldError, GatewayResponse, OrderInput, OrderNode, ProductNode};

pub const DEFAULT_FIELD_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{field} timed out after {after:?}")]
    Timeout { field: String, after: Duration },
    #[error("upstream error: {0}")]
    Upstream(#[from] LookupError),
    #[error(transparent)]
    Order(#[from] DomainError),
}

/// Order operations the gateway aggregates over.
#[async_trait]
pub trait OrderBackend: Send + Sync {
    /// Must fail with `DomainError::DeadlineExceeded`, storing nothing, if
    /// `deadline` passes before the order is written.
    async fn create_order(
        &self,
        account_id: &str,
        items: Vec<RequestedItem>,
        deadline: Instant,
    ) -> Result<Order, DomainError>;

    async fn orders_for_account(&self, account_id: &str) -> Result<Vec<Order>, DomainError>;
}

#[async_trait]
impl OrderBackend for OrderService {
    async fn create_order(
        &self,
        account_id: &str,
        items: Vec<RequestedItem>,
        deadline: Instant,
    ) -> Result<Order, DomainError> {
        self.create_order_within(account_id, items, deadline).await
    }

    async fn orders_for_account(&self, account_id: &str) -> Result<Vec<Order>, DomainError> {
        self.get_orders_for_account(account_id).await
    }
}

#[derive(Clone)]
pub struct Gateway {
    accounts: Arc<dyn AccountLookup>,
    catalog: Arc<dyn ProductLookup>,
    orders: Arc<dyn OrderBackend>,
    field_timeout: Duration,
}

impl Gateway {
    pub fn new(
        accounts: Arc<dyn AccountLookup>,
        catalog: Arc<dyn ProductLookup>,
        orders: Arc<dyn OrderBackend>,
    ) -> Self {
        Self {
            accounts,
            catalog,
            orders,
            field_timeout: DEFAULT_FIELD_TIMEOUT,
        }
    }

    /// Gateway over an in-process order service, sharing its lookup clients.
    pub fn over(service: OrderService) -> Self {
        let accounts = Arc::clone(service.accounts());
        let catalog = Arc::clone(service.catalog());
        Self::new(accounts, catalog, Arc::new(service))
    }

    pub fn with_field_timeout(mut self, timeout: Duration) -> Self {
        self.field_timeout = timeout;
        self
    }

    /// Resolves an account. Its `orders` field is fetched only when
    /// `with_orders` is set; if that fetch fails the field is `null` and the
    /// failure is listed in `errors`.
    pub async fn account(
        &self,
        id: &str,
        with_orders: bool,
    ) -> Result<GatewayResponse<AccountNode>, GatewayError> {
        let account = self
            .resolve("account", async {
                Ok::<_, GatewayError>(self.accounts.get_account(id).await?)
            })
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("account {id}")))?;

        let mut errors = Vec::new();
        let orders = if with_orders {
            let fetched = self
                .resolve("account.orders", async {
                    Ok::<_, GatewayError>(self.orders.orders_for_account(&account.id).await?)
                })
                .await;
            match fetched {
                Ok(list) => Some(Some(list.iter().map(OrderNode::from).collect())),
                Err(e) => {
                    log::warn!("account {} orders unresolved: {}", account.id, e);
                    errors.push(FieldError {
                        path: "account.orders".to_string(),
                        message: e.to_string(),
                    });
                    Some(None)
                }
            }
        } else {
            None
        };

        let data = AccountNode {
            id: account.id,
            name: account.name,
            orders,
        };
        if errors.is_empty() {
            return Ok(GatewayResponse::complete(data));
        }
        Ok(GatewayResponse { data, errors })
    }

    /// A single product by id, or a catalog page (optionally filtered by a
    /// free-text query).
    pub async fn products(
        &self,
        id: Option<String>,
        query: Option<String>,
        skip: u64,
        take: u64,
    ) -> Result<Vec<ProductNode>, GatewayError> {
        let lookup = match id {
            Some(id) if !id.trim().is_empty() => ProductQuery::by_ids(vec![id]),
            Some(_) => return Err(GatewayError::InvalidParameter("id must not be blank".into())),
            None => ProductQuery::search(query, skip, take),
        };
        let by_id = !lookup.ids.is_empty();
        let wanted = lookup.ids.first().cloned();

        let products = self
            .resolve("products", async {
                Ok::<_, GatewayError>(self.catalog.get_products(lookup).await?)
            })
            .await?;

        if by_id && products.is_empty() {
            return Err(GatewayError::NotFound(format!(
                "product {}",
                wanted.unwrap_or_default()
            )));
        }
        Ok(products.into_iter().map(ProductNode::from).collect())
    }

    /// Creates an order. Quantities are checked here so that an obviously
    /// bad request never reaches the order service.
    pub async fn create_order(&self, input: OrderInput) -> Result<OrderNode, GatewayError> {
        let mut items = Vec::with_capacity(input.products.len());
        for p in input.products {
            if p.quantity <= 0 {
                return Err(GatewayError::InvalidParameter(format!(
                    "quantity for product {} must be positive",
                    p.id
                )));
            }
            items.push(RequestedItem::new(p.id, p.quantity));
        }

        let deadline = Instant::now() + self.field_timeout;
        let order = self
            .orders
            .create_order(&input.account_id, items, deadline)
            .await
            .map_err(|e| match e {
                DomainError::DeadlineExceeded(stage) => {
                    log::warn!("createOrder timed out during {}", stage);
                    GatewayError::Timeout {
                        field: "createOrder".to_string(),
                        after: self.field_timeout,
                    }
                }
                other => GatewayError::Order(other),
            })?;
        Ok(OrderNode::from(&order))
    }

    async fn resolve<T, F>(&self, field: &str, fut: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, GatewayError>>,
    {
        match tokio::time::timeout(self.field_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout {
                field: field.to_string(),
                after: self.field_timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::nodes::OrderProductInput;
    use super::*;
    use crate::domain::order::Product;
    use crate::infrastructure::memory::{InMemoryAccounts, InMemoryCatalog, InMemoryOrderRepository};

    /// Order backend that never answers in time.
    struct StalledOrders;

    #[async_trait]
    impl OrderBackend for StalledOrders {
        async fn create_order(
            &self,
            _account_id: &str,
            _items: Vec<RequestedItem>,
            _deadline: Instant,
        ) -> Result<Order, DomainError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(DomainError::StoreUnavailable("stalled".into()))
        }

        async fn orders_for_account(&self, _account_id: &str) -> Result<Vec<Order>, DomainError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }
    }

    fn catalog() -> Arc<InMemoryCatalog> {
        Arc::new(
            InMemoryCatalog::new()
                .with_product(Product {
                    id: "P1".into(),
                    name: "Kettle".into(),
                    description: "boils water".into(),
                    price: BigDecimal::from_str("10.00").unwrap(),
                })
                .with_product(Product {
                    id: "P2".into(),
                    name: "Mug".into(),
                    description: "holds tea".into(),
                    price: BigDecimal::from_str("5.00").unwrap(),
                }),
        )
    }

    fn accounts() -> Arc<InMemoryAccounts> {
        Arc::new(InMemoryAccounts::new().with_account("A1", "Alice"))
    }

    fn gateway() -> Gateway {
        gateway_over(Arc::new(InMemoryOrderRepository::new()), catalog())
    }

    fn gateway_over(repo: Arc<InMemoryOrderRepository>, catalog: Arc<InMemoryCatalog>) -> Gateway {
        Gateway::over(OrderService::new(repo, accounts(), catalog))
    }

    fn input(account_id: &str, products: &[(&str, i32)]) -> OrderInput {
        OrderInput {
            account_id: account_id.to_string(),
            products: products
                .iter()
                .map(|(id, quantity)| OrderProductInput {
                    id: id.to_string(),
                    quantity: *quantity,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn create_then_read_account_with_orders() {
        let gw = gateway();

        let created = gw
            .create_order(input("A1", &[("P1", 2), ("P2", 1)]))
            .await
            .unwrap();
        let response = gw.account("A1", true).await.unwrap();

        assert_eq!(created.total_price, "25.00");
        assert!(response.errors.is_empty());
        let orders = response.data.orders.flatten().expect("orders resolved");
        assert_eq!(orders, vec![created]);
        assert_eq!(orders[0].products[0].name, "Kettle");
    }

    #[tokio::test]
    async fn orders_are_not_fetched_unless_requested() {
        let catalog = catalog();
        let gw = Gateway::new(accounts(), catalog.clone(), Arc::new(StalledOrders))
            .with_field_timeout(Duration::from_millis(50));

        let response = gw.account("A1", false).await.unwrap();

        assert_eq!(response.data.name, "Alice");
        assert!(response.data.orders.is_none());
        assert!(response.errors.is_empty());
    }

    #[tokio::test]
    async fn slow_orders_field_yields_partial_response() {
        let gw = Gateway::new(accounts(), catalog(), Arc::new(StalledOrders))
            .with_field_timeout(Duration::from_millis(50));

        let response = gw.account("A1", true).await.unwrap();

        assert_eq!(response.data.id, "A1");
        assert_eq!(response.data.orders, Some(None));
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].path, "account.orders");
        assert!(response.errors[0].message.contains("timed out"));
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let err = gateway().account("ghost", true).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn non_positive_quantity_is_rejected_before_ordering() {
        let gw = Gateway::new(accounts(), catalog(), Arc::new(StalledOrders))
            .with_field_timeout(Duration::from_millis(50));

        let err = gw.create_order(input("A1", &[("P1", 0)])).await.unwrap_err();

        assert!(matches!(err, GatewayError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn create_order_surfaces_domain_errors() {
        let err = gateway()
            .create_order(input("A1", &[("P404", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Order(DomainError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn slow_catalog_times_out_create_order_without_writing() {
        let repo = Arc::new(InMemoryOrderRepository::new());
        let catalog = catalog();
        catalog.set_delay(Some(Duration::from_millis(300)));
        let gw = gateway_over(repo.clone(), catalog).with_field_timeout(Duration::from_millis(50));

        let err = gw.create_order(input("A1", &[("P1", 1)])).await.unwrap_err();

        assert!(matches!(err, GatewayError::Timeout { ref field, .. } if field == "createOrder"));
        assert_eq!(repo.write_count(), 0);
    }

    #[tokio::test]
    async fn slow_write_is_reported_as_created() {
        let repo = Arc::new(InMemoryOrderRepository::new());
        repo.set_latency(Some(Duration::from_millis(300)));
        let gw = gateway_over(repo.clone(), catalog()).with_field_timeout(Duration::from_millis(100));

        let result = gw.create_order(input("A1", &[("P1", 1)])).await;
        tokio::time::sleep(Duration::from_millis(400)).await;

        let stored = repo.stored_orders();
        match result {
            Ok(created) => {
                assert_eq!(stored.len(), 1);
                assert_eq!(stored[0].id.to_string(), created.id);
            }
            Err(GatewayError::Timeout { .. }) => assert!(stored.is_empty()),
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn products_by_id_and_by_search() {
        let gw = gateway();

        let one = gw.products(Some("P2".into()), None, 0, 0).await.unwrap();
        let found = gw.products(None, Some("water".into()), 0, 0).await.unwrap();
        let missing = gw.products(Some("P9".into()), None, 0, 0).await.unwrap_err();

        assert_eq!(one.len(), 1);
        assert_eq!(one[0].name, "Mug");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "P1");
        assert!(matches!(missing, GatewayError::NotFound(_)));
    }
}
