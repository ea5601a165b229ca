use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::domain::errors::{Dependency, DomainError, LookupError};
use crate::domain::order::{total_of, LineItem, Order, Product, ProductQuery, RequestedItem};
use crate::domain::ports::{AccountLookup, OrderRepository, ProductLookup};

use super::history;

#[derive(Debug, Clone, Copy)]
pub struct ServiceTimeouts {
    /// Upper bound for a single account or catalog call.
    pub lookup: Duration,
    /// Budget for a whole request, checked before each stage.
    pub request: Duration,
}

impl Default for ServiceTimeouts {
    fn default() -> Self {
        Self {
            lookup: Duration::from_secs(2),
            request: Duration::from_secs(5),
        }
    }
}

/// Creates orders and rebuilds order history. Holds no per-request state, so
/// one instance is shared by every in-flight request.
#[derive(Clone)]
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    accounts: Arc<dyn AccountLookup>,
    catalog: Arc<dyn ProductLookup>,
    timeouts: ServiceTimeouts,
}

impl OrderService {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        accounts: Arc<dyn AccountLookup>,
        catalog: Arc<dyn ProductLookup>,
    ) -> Self {
        Self {
            repo,
            accounts,
            catalog,
            timeouts: ServiceTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: ServiceTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Validates the account, snapshots the requested products from the
    /// catalog and stores the order with its line items in one transaction.
    ///
    /// Stages run strictly in sequence: account check, product resolution,
    /// persistence. A failure at any stage leaves the store untouched.
    pub async fn create_order(
        &self,
        account_id: &str,
        items: Vec<RequestedItem>,
    ) -> Result<Order, DomainError> {
        self.create_order_within(account_id, items, Instant::now() + self.timeouts.request)
            .await
    }

    /// Same as [`create_order`](Self::create_order), but also bounded by a
    /// caller's own deadline. If the deadline passes before the write starts
    /// the call fails with `DeadlineExceeded` and nothing is stored; once the
    /// write has started it runs to completion.
    pub async fn create_order_within(
        &self,
        account_id: &str,
        items: Vec<RequestedItem>,
        caller_deadline: Instant,
    ) -> Result<Order, DomainError> {
        let deadline = caller_deadline.min(Instant::now() + self.timeouts.request);
        validate_request(account_id, &items)?;

        log::debug!("checking account {}", account_id);
        let account = self
            .bounded(deadline, Dependency::Account, self.accounts.get_account(account_id))
            .await?;
        if account.is_none() {
            log::warn!("rejecting order: account {} does not exist", account_id);
            return Err(DomainError::AccountNotFound(account_id.to_string()));
        }

        let ids = distinct_product_ids(&items);
        log::debug!("resolving {} distinct products", ids.len());
        let products = self
            .bounded(
                deadline,
                Dependency::Catalog,
                self.catalog.get_products(ProductQuery::by_ids(ids.clone())),
            )
            .await?;
        let line_items = snapshot_line_items(&items, &ids, products)?;

        let order = Order {
            id: Uuid::now_v7(),
            account_id: account_id.to_string(),
            created_at: Utc::now(),
            total_price: total_of(&line_items),
            line_items,
        };

        // Past this point the write is never abandoned, so the budget is
        // checked once up front.
        if Instant::now() >= deadline {
            return Err(DomainError::DeadlineExceeded("persisting the order"));
        }
        let repo = Arc::clone(&self.repo);
        let to_store = order.clone();
        tokio::task::spawn_blocking(move || repo.put_order(&to_store))
            .await
            .map_err(|e| DomainError::StoreWriteFailed(e.to_string()))??;

        log::info!(
            "created order {} for account {} ({} line items, total {})",
            order.id,
            order.account_id,
            order.line_items.len(),
            order.total_price
        );
        Ok(order)
    }

    /// Every order of the account, ascending by id, with line items overlaid
    /// with current catalog data where the catalog still knows the product.
    pub async fn get_orders_for_account(&self, account_id: &str) -> Result<Vec<Order>, DomainError> {
        if account_id.trim().is_empty() {
            return Err(DomainError::InvalidArgument(
                "account_id is required".to_string(),
            ));
        }

        let deadline = Instant::now() + self.timeouts.request;
        let repo = Arc::clone(&self.repo);
        let owner = account_id.to_string();
        let read = tokio::task::spawn_blocking(move || repo.list_rows_for_account(&owner));
        let rows = tokio::time::timeout_at(deadline, read)
            .await
            .map_err(|_| {
                log::warn!("order rows for account {} not loaded in time", account_id);
                DomainError::DeadlineExceeded("loading order rows")
            })?
            .map_err(|e| DomainError::StoreUnavailable(e.to_string()))??;

        let mut orders = history::group_rows(rows);
        self.enrich(&mut orders, deadline).await;

        log::debug!("loaded {} orders for account {}", orders.len(), account_id);
        Ok(orders)
    }

    /// One catalog call for the whole history. Any failure here degrades to
    /// the stored snapshot instead of failing the read.
    async fn enrich(&self, orders: &mut [Order], deadline: Instant) {
        let ids = history::referenced_product_ids(orders);
        if ids.is_empty() {
            return;
        }

        let lookup = self.catalog.get_products(ProductQuery::by_ids(ids));
        match self.bounded(deadline, Dependency::Catalog, lookup).await {
            Ok(products) => {
                let unresolved = history::apply_live_products(orders, products);
                if unresolved > 0 {
                    log::warn!(
                        "{} line items reference products missing from the catalog, serving snapshots",
                        unresolved
                    );
                }
            }
            Err(e) => log::warn!("order enrichment skipped, serving snapshots: {}", e),
        }
    }

    pub(crate) fn accounts(&self) -> &Arc<dyn AccountLookup> {
        &self.accounts
    }

    pub(crate) fn catalog(&self) -> &Arc<dyn ProductLookup> {
        &self.catalog
    }

    /// Runs a remote call bounded by both the per-call timeout and whatever
    /// remains of the request budget.
    async fn bounded<T, F>(
        &self,
        deadline: Instant,
        dependency: Dependency,
        call: F,
    ) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, LookupError>>,
    {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(DomainError::DeadlineExceeded(stage_name(dependency)));
        }
        let budget = remaining.min(self.timeouts.lookup);

        match tokio::time::timeout(budget, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                log::warn!("{} call failed: {}", dependency, e);
                Err(DomainError::lookup(dependency, e))
            }
            Err(_) if budget < self.timeouts.lookup => {
                log::warn!("request deadline reached during {}", stage_name(dependency));
                Err(DomainError::DeadlineExceeded(stage_name(dependency)))
            }
            Err(_) => {
                log::warn!("{} call timed out after {:?}", dependency, budget);
                Err(DomainError::lookup(
                    dependency,
                    LookupError::Timeout(budget.as_millis()),
                ))
            }
        }
    }
}

fn stage_name(dependency: Dependency) -> &'static str {
    match dependency {
        Dependency::Account => "account validation",
        Dependency::Catalog => "product resolution",
    }
}

fn validate_request(account_id: &str, items: &[RequestedItem]) -> Result<(), DomainError> {
    if account_id.trim().is_empty() {
        return Err(DomainError::InvalidArgument(
            "account_id is required".to_string(),
        ));
    }
    if items.is_empty() {
        return Err(DomainError::InvalidArgument(
            "at least one product is required".to_string(),
        ));
    }
    for item in items {
        if item.product_id.trim().is_empty() {
            return Err(DomainError::InvalidArgument(
                "product_id is required".to_string(),
            ));
        }
        if item.quantity <= 0 {
            return Err(DomainError::InvalidArgument(format!(
                "quantity for product {} must be positive, got {}",
                item.product_id, item.quantity
            )));
        }
    }
    Ok(())
}

/// Requested product ids without duplicates, in first-seen order.
fn distinct_product_ids(items: &[RequestedItem]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items
        .iter()
        .filter(|i| seen.insert(i.product_id.as_str()))
        .map(|i| i.product_id.clone())
        .collect()
}

/// One line item per requested pair, priced from the resolved products.
/// Fails with the sorted set of ids the catalog did not return.
fn snapshot_line_items(
    items: &[RequestedItem],
    requested: &[String],
    resolved: Vec<Product>,
) -> Result<Vec<LineItem>, DomainError> {
    let by_id: HashMap<String, Product> = resolved
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();

    let mut missing: Vec<String> = requested
        .iter()
        .filter(|id| !by_id.contains_key(*id))
        .cloned()
        .collect();
    if !missing.is_empty() {
        missing.sort();
        log::warn!("rejecting order: unknown products {:?}", missing);
        return Err(DomainError::ProductNotFound(missing));
    }

    items
        .iter()
        .map(|item| {
            by_id
                .get(&item.product_id)
                .map(|p| LineItem::from_snapshot(p, item.quantity))
                .ok_or_else(|| DomainError::ProductNotFound(vec![item.product_id.clone()]))
        })
        .collect()
}
