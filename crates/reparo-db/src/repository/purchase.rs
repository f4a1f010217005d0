//! # Purchase Repository
//!
//! Mirror image of the sale repository: header + lines, with lines read
//! back during edit/delete replay to reverse the stock they added.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{page_bounds, Page};
use reparo_core::{Purchase, PurchaseItem, Tenant};

/// Repository for purchases and their line items.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    // =========================================================================
    // Writes (injected connection)
    // =========================================================================

    /// Inserts a purchase header with its lines.
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        purchase: &Purchase,
        items: &[PurchaseItem],
    ) -> DbResult<()> {
        debug!(id = %purchase.id, lines = items.len(), "Inserting purchase");

        sqlx::query(
            r#"
            INSERT INTO purchases
                (id, owner_id, store_id, supplier_id, supplier_name, total_cents,
                 payment_method, cash_account_id, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.owner_id)
        .bind(&purchase.store_id)
        .bind(&purchase.supplier_id)
        .bind(&purchase.supplier_name)
        .bind(purchase.total_cents)
        .bind(purchase.payment_method)
        .bind(&purchase.cash_account_id)
        .bind(&purchase.notes)
        .bind(purchase.created_at)
        .execute(&mut *conn)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO purchase_items
                    (id, purchase_id, inventory_id, name, qty, buy_price_cents)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.id)
            .bind(&item.purchase_id)
            .bind(&item.inventory_id)
            .bind(&item.name)
            .bind(item.qty)
            .bind(item.buy_price_cents)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Deletes a purchase (lines cascade).
    pub async fn delete(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        id: &str,
    ) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM purchases WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(&tenant.owner_id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Purchase", id));
        }
        Ok(())
    }

    /// Fetches a purchase with its lines inside a transaction.
    pub async fn find_tx(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        id: &str,
    ) -> DbResult<(Purchase, Vec<PurchaseItem>)> {
        let purchase =
            sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE id = ? AND owner_id = ?")
                .bind(id)
                .bind(&tenant.owner_id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| DbError::not_found("Purchase", id))?;

        let items = sqlx::query_as::<_, PurchaseItem>(
            "SELECT * FROM purchase_items WHERE purchase_id = ? ORDER BY id",
        )
        .bind(id)
        .fetch_all(conn)
        .await?;

        Ok((purchase, items))
    }

    // =========================================================================
    // Reads (pool)
    // =========================================================================

    /// Fetches a purchase with its lines.
    pub async fn find(&self, tenant: &Tenant, id: &str) -> DbResult<(Purchase, Vec<PurchaseItem>)> {
        let purchase =
            sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE id = ? AND owner_id = ?")
                .bind(id)
                .bind(&tenant.owner_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| DbError::not_found("Purchase", id))?;

        let items = sqlx::query_as::<_, PurchaseItem>(
            "SELECT * FROM purchase_items WHERE purchase_id = ? ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok((purchase, items))
    }

    /// Lists purchases for a tenant, newest first.
    pub async fn list(&self, tenant: &Tenant, page: u32, per_page: u32) -> DbResult<Page<Purchase>> {
        let (limit, offset) = page_bounds(page, per_page);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM purchases
            WHERE owner_id = ? AND (? IS NULL OR store_id = ?)
            "#,
        )
        .bind(&tenant.owner_id)
        .bind(&tenant.store_id)
        .bind(&tenant.store_id)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, Purchase>(
            r#"
            SELECT * FROM purchases
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
