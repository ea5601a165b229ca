//! In-memory implementations of the order ports, used for local runs without
//! the remote services and as substitutes in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::errors::{LookupError, StoreError};
use crate::domain::order::{Account, Order, OrderLineRow, Product, ProductQuery};
use crate::domain::ports::{AccountLookup, OrderRepository, ProductLookup};

// ── Order store ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<Vec<Order>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    latency: Mutex<Option<Duration>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `put_order` fail without storing anything.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Blocks the calling thread before every read and write, like a
    /// stalled database connection.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    fn stall(&self) {
        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(latency) = latency {
            std::thread::sleep(latency);
        }
    }

    /// Number of `put_order` calls, successful or not.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn stored_orders(&self) -> Vec<Order> {
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn put_order(&self, order: &Order) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.stall();
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed("write rejected".to_string()));
        }

        let mut stored = order.clone();
        for item in &mut stored.line_items {
            item.live = None;
        }
        self.orders
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .push(stored);
        Ok(())
    }

    fn list_rows_for_account(&self, account_id: &str) -> Result<Vec<OrderLineRow>, StoreError> {
        self.stall();
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("read rejected".to_string()));
        }

        let orders = self
            .orders
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let mut matching: Vec<&Order> = orders
            .iter()
            .filter(|o| o.account_id == account_id)
            .collect();
        matching.sort_by_key(|o| o.id);

        Ok(matching
            .into_iter()
            .flat_map(|o| {
                o.line_items
                    .iter()
                    .enumerate()
                    .map(move |(position, item)| OrderLineRow {
                        order_id: o.id,
                        account_id: o.account_id.clone(),
                        created_at: o.created_at,
                        total_price: o.total_price.clone(),
                        position: position as i32,
                        product_id: item.product_id.clone(),
                        quantity: item.quantity,
                        name: item.name.clone(),
                        description: item.description.clone(),
                        price: item.price_at_order_time.clone(),
                    })
            })
            .collect())
    }
}

// ── Account lookup ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryAccounts {
    accounts: RwLock<HashMap<String, Account>>,
    calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, id: &str, name: &str) -> Self {
        self.insert(Account {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn insert(&self, account: Account) {
        self.accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(account.id.clone(), account);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountLookup for InMemoryAccounts {
    async fn get_account(&self, id: &str) -> Result<Option<Account>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LookupError::Transport("connection refused".to_string()));
        }
        let accounts = self
            .accounts
            .read()
            .map_err(|e| LookupError::Transport(e.to_string()))?;
        Ok(accounts.get(id).cloned())
    }
}

// ── Catalog ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<Vec<Product>>,
    calls: AtomicUsize,
    unavailable: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(self, product: Product) -> Self {
        self.upsert(product);
        self
    }

    pub fn upsert(&self, product: Product) {
        let mut products = self
            .products
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => products.push(product),
        }
    }

    pub fn remove(&self, id: &str) {
        self.products
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|p| p.id != id);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delays every answer, to exercise caller-side timeouts.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap_or_else(PoisonError::into_inner) = delay;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn matches(product: &Product, needle: &str) -> bool {
        product.name.to_lowercase().contains(needle)
            || product.description.to_lowercase().contains(needle)
    }
}

#[async_trait]
impl ProductLookup for InMemoryCatalog {
    async fn get_products(&self, query: ProductQuery) -> Result<Vec<Product>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LookupError::Transport("connection refused".to_string()));
        }

        let products = self
            .products
            .read()
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        if !query.ids.is_empty() {
            return Ok(products
                .iter()
                .filter(|p| query.ids.contains(&p.id))
                .cloned()
                .collect());
        }

        let needle = query.query.as_deref().map(str::to_lowercase);
        Ok(products
            .iter()
            .filter(|p| needle.as_deref().map_or(true, |n| Self::matches(p, n)))
            .skip(query.skip as usize)
            .take(query.effective_take() as usize)
            .cloned()
            .collect())
    }
}
