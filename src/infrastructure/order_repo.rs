use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::StoreError;
use crate::domain::order::{Order, OrderLineRow};
use crate::domain::ports::OrderRepository;
use crate::schema::{order_products, orders};

use super::models::{NewOrderProductRow, NewOrderRow, OrderProductRow, OrderRow};

impl From<r2d2::Error> for StoreError {
    fn from(e: r2d2::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn put_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::insert_into(orders::table)
                .values(&NewOrderRow::from_order(order))
                .execute(conn)?;

            diesel::insert_into(order_products::table)
                .values(&NewOrderProductRow::from_order(order))
                .execute(conn)?;

            Ok(())
        })
        .map_err(|e| StoreError::WriteFailed(e.to_string()))
    }

    fn list_rows_for_account(&self, account_id: &str) -> Result<Vec<OrderLineRow>, StoreError> {
        let mut conn = self.pool.get()?;

        let rows = order_products::table
            .inner_join(orders::table)
            .filter(orders::account_id.eq(account_id))
            .order((orders::id.asc(), order_products::position.asc()))
            .select((OrderRow::as_select(), OrderProductRow::as_select()))
            .load::<(OrderRow, OrderProductRow)>(&mut conn)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(rows.into_iter().map(OrderLineRow::from).collect())
    }
}
