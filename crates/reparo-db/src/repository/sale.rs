//! # Sale Repository
//!
//! Sales are header + lines. The lines matter beyond display: edit and
//! delete replay reads them back to restore the stock they consumed, so
//! `inventory_id` is persisted on every line that came from inventory.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{page_bounds, Page};
use reparo_core::{Sale, SaleItem, Tenant};

/// Repository for sales and their line items.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Writes (injected connection)
    // =========================================================================

    /// Inserts a sale header with its lines.
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        sale: &Sale,
        items: &[SaleItem],
    ) -> DbResult<()> {
        debug!(id = %sale.id, lines = items.len(), "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales
                (id, owner_id, store_id, customer_name, customer_id, subtotal_cents,
                 discount_type, discount_value, discount_amount_cents, total_cents,
                 payment_method, cash_account_id, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.owner_id)
        .bind(&sale.store_id)
        .bind(&sale.customer_name)
        .bind(&sale.customer_id)
        .bind(sale.subtotal_cents)
        .bind(sale.discount_type)
        .bind(sale.discount_value)
        .bind(sale.discount_amount_cents)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(&sale.cash_account_id)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO sale_items
                    (id, sale_id, inventory_id, name, qty, price_cents,
                     buy_price_cents, category)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.inventory_id)
            .bind(&item.name)
            .bind(item.qty)
            .bind(item.price_cents)
            .bind(item.buy_price_cents)
            .bind(&item.category)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Deletes a sale (lines cascade).
    pub async fn delete(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        id: &str,
    ) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM sales WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(&tenant.owner_id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }
        Ok(())
    }

    /// Fetches a sale with its lines inside a transaction.
    ///
    /// Edit/delete replay needs the OLD lines under the same snapshot that
    /// will restore their stock.
    pub async fn find_tx(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        id: &str,
    ) -> DbResult<(Sale, Vec<SaleItem>)> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(&tenant.owner_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        let items =
            sqlx::query_as::<_, SaleItem>("SELECT * FROM sale_items WHERE sale_id = ? ORDER BY id")
                .bind(id)
                .fetch_all(conn)
                .await?;

        Ok((sale, items))
    }

    // =========================================================================
    // Reads (pool)
    // =========================================================================

    /// Fetches a sale with its lines.
    pub async fn find(&self, tenant: &Tenant, id: &str) -> DbResult<(Sale, Vec<SaleItem>)> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(&tenant.owner_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        let items =
            sqlx::query_as::<_, SaleItem>("SELECT * FROM sale_items WHERE sale_id = ? ORDER BY id")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;

        Ok((sale, items))
    }

    /// Lists sales for a tenant, newest first.
    pub async fn list(&self, tenant: &Tenant, page: u32, per_page: u32) -> DbResult<Page<Sale>> {
        let (limit, offset) = page_bounds(page, per_page);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM sales
            WHERE owner_id = ? AND (? IS NULL OR store_id = ?)
            "#,
        )
        .bind(&tenant.owner_id)
        .bind(&tenant.store_id)
        .bind(&tenant.store_id)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, Sale>(
            r#"
            SELECT * FROM sales
            WHERE owner_id = ? AND (? IS NULL OR store_id = ?)
            ORDER BY created_at DESC, id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&tenant.owner_id)
        .bind(&tenant.store_id)
        .bind(&tenant.store_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            items,
            total,
            page: page.max(1),
            per_page: limit as u32,
        })
    }
}
