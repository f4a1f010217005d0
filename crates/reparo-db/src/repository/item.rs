//! # Inventory Item Repository
//!
//! Stock is the load-bearing column here, and the rules around it are
//! strict:
//!
//! ## Delta-Based Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Why Deltas, Not Absolute Writes                         │
//! │                                                                         │
//! │  WRONG (read-modify-write):                                            │
//! │    stock = read()           ← another writer lands here                │
//! │    write(stock - 2)         ← and their change is silently lost        │
//! │                                                                         │
//! │  RIGHT (relative, in SQL):                                             │
//! │    UPDATE ... SET stock = stock + ?                                    │
//! │                                                                         │
//! │  The only exception is stock opname: an explicit, audited              │
//! │  set-to-counted-value that exists precisely to override history.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Non-negativity is NOT enforced here: the orchestrator checks it for
//! negative deltas (where it can name the item in the error) and allows
//! transient dips during edit replay.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{page_bounds, Page};
use reparo_core::{InventoryItem, StockOpnameEntry, Tenant};

/// Aggregate value of the stock on hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockValuation {
    pub item_count: i64,
    pub unit_count: i64,
    pub buy_value_cents: i64,
    pub sell_value_cents: i64,
}

/// Repository for inventory items and the stock-opname audit trail.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    // =========================================================================
    // Writes (injected connection)
    // =========================================================================

    /// Inserts a new inventory item.
    pub async fn insert(&self, conn: &mut SqliteConnection, item: &InventoryItem) -> DbResult<()> {
        debug!(id = %item.id, name = %item.name, "Inserting inventory item");

        sqlx::query(
            r#"
            INSERT INTO inventory_items
                (id, owner_id, store_id, name, category, brand, stock, min_stock,
                 buy_price_cents, sell_price_cents, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.id)
        .bind(&item.owner_id)
        .bind(&item.store_id)
        .bind(&item.name)
        .bind(&item.category)
        .bind(&item.brand)
        .bind(item.stock)
        .bind(item.min_stock)
        .bind(item.buy_price_cents)
        .bind(item.sell_price_cents)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Updates the catalog fields of an item (never `stock`).
    pub async fn update(&self, conn: &mut SqliteConnection, item: &InventoryItem) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_items
            SET name = ?, category = ?, brand = ?, min_stock = ?,
                buy_price_cents = ?, sell_price_cents = ?, updated_at = ?
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(&item.name)
        .bind(&item.category)
        .bind(&item.brand)
        .bind(item.min_stock)
        .bind(item.buy_price_cents)
        .bind(item.sell_price_cents)
        .bind(Utc::now())
        .bind(&item.id)
        .bind(&item.owner_id)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InventoryItem", &item.id));
        }
        Ok(())
    }

    /// Deletes an item.
    pub async fn delete(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        id: &str,
    ) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(&tenant.owner_id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InventoryItem", id));
        }
        Ok(())
    }

    /// Applies a relative stock delta (`stock = stock + delta`).
    ///
    /// The update happens in SQL so concurrent writers can never lose each
    /// other's deltas. Zero rows affected means wrong id or wrong owner.
    pub async fn adjust_stock(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        item_id: &str,
        delta: i64,
    ) -> DbResult<()> {
        debug!(item_id = %item_id, delta, "Adjusting stock");

        let result = sqlx::query(
            r#"
            UPDATE inventory_items
            SET stock = stock + ?, updated_at = ?
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(delta)
        .bind(Utc::now())
        .bind(item_id)
        .bind(&tenant.owner_id)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InventoryItem", item_id));
        }
        Ok(())
    }

    /// Sets stock to an absolute value (stock opname only).
    pub async fn set_stock(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        item_id: &str,
        new_stock: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_items
            SET stock = ?, updated_at = ?
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(new_stock)
        .bind(Utc::now())
        .bind(item_id)
        .bind(&tenant.owner_id)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InventoryItem", item_id));
        }
        Ok(())
    }

    /// Records one immutable stock-opname audit row.
    pub async fn insert_opname(
        &self,
        conn: &mut SqliteConnection,
        entry: &StockOpnameEntry,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_opname_history
                (id, owner_id, store_id, item_id, item_name, old_stock, new_stock,
                 difference, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.owner_id)
        .bind(&entry.store_id)
        .bind(&entry.item_id)
        .bind(&entry.item_name)
        .bind(entry.old_stock)
        .bind(entry.new_stock)
        .bind(entry.difference)
        .bind(&entry.notes)
        .bind(entry.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Fetches an item inside a transaction.
    ///
    /// Used by orchestrators that need a consistent snapshot (current
    /// stock, price snapshots) as part of a unit of work.
    pub async fn find_tx(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        id: &str,
    ) -> DbResult<InventoryItem> {
        sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items WHERE id = ? AND owner_id = ?",
        )
        .bind(id)
        .bind(&tenant.owner_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DbError::not_found("InventoryItem", id))
    }

    // =========================================================================
    // Reads (pool)
    // =========================================================================

    /// Fetches an item by id.
    pub async fn find(&self, tenant: &Tenant, id: &str) -> DbResult<InventoryItem> {
        sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items WHERE id = ? AND owner_id = ?",
        )
        .bind(id)
        .bind(&tenant.owner_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("InventoryItem", id))
    }

    /// Lists items for a tenant, newest first, with optional name search.
    pub async fn list(
        &self,
        tenant: &Tenant,
        search: Option<&str>,
        page: u32,
        per_page: u32,
    ) -> DbResult<Page<InventoryItem>> {
        let (limit, offset) = page_bounds(page, per_page);
        let pattern = search.map(|s| format!("%{}%", s.trim()));

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM inventory_items
            WHERE owner_id = ?
              AND (? IS NULL OR store_id = ?)
              AND (? IS NULL OR name LIKE ?)
            "#,
        )
        .bind(&tenant.owner_id)
        .bind(&tenant.store_id)
        .bind(&tenant.store_id)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT * FROM inventory_items
            WHERE owner_id = ?
              AND (? IS NULL OR store_id = ?)
              AND (? IS NULL OR name LIKE ?)
            ORDER BY created_at DESC, id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&tenant.owner_id)
        .bind(&tenant.store_id)
        .bind(&tenant.store_id)
        .bind(&pattern)
        .bind(&pattern)
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

    /// Lists items at or below their minimum stock threshold.
    ///
    /// A threshold of zero means "no threshold": those items are never
    /// flagged, whatever their stock.
    pub async fn low_stock(&self, tenant: &Tenant) -> DbResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT * FROM inventory_items
            WHERE owner_id = ?
              AND (? IS NULL OR store_id = ?)
              AND min_stock > 0
              AND stock <= min_stock
            ORDER BY stock ASC, name
            "#,
        )
        .bind(&tenant.owner_id)
        .bind(&tenant.store_id)
        .bind(&tenant.store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Computes the aggregate value of stock on hand.
    ///
    /// Negative-stock rows (possible mid-replay, never at rest) are
    /// included as-is; the sums are over whatever the ledger says.
    pub async fn stock_valuation(&self, tenant: &Tenant) -> DbResult<StockValuation> {
        let row: (i64, Option<i64>, Option<i64>, Option<i64>) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                SUM(stock),
                SUM(stock * buy_price_cents),
                SUM(stock * sell_price_cents)
            FROM inventory_items
            WHERE owner_id = ?
              AND (? IS NULL OR store_id = ?)
            "#,
        )
        .bind(&tenant.owner_id)
        .bind(&tenant.store_id)
        .bind(&tenant.store_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(StockValuation {
            item_count: row.0,
            unit_count: row.1.unwrap_or(0),
            buy_value_cents: row.2.unwrap_or(0),
            sell_value_cents: row.3.unwrap_or(0),
        })
    }

    /// Lists stock-opname history, newest first.
    pub async fn opname_history(
        &self,
        tenant: &Tenant,
        page: u32,
        per_page: u32,
    ) -> DbResult<Page<StockOpnameEntry>> {
        let (limit, offset) = page_bounds(page, per_page);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM stock_opname_history WHERE owner_id = ?",
        )
        .bind(&tenant.owner_id)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, StockOpnameEntry>(
            r#"
            SELECT * FROM stock_opname_history
            WHERE owner_id = ?
            ORDER BY created_at DESC, id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&tenant.owner_id)
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

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::new_id;

    fn item(tenant: &Tenant, name: &str, stock: i64) -> InventoryItem {
        let now = Utc::now();
        InventoryItem {
            id: new_id(),
            owner_id: tenant.owner_id.clone(),
            store_id: tenant.store_id.clone(),
            name: name.to_string(),
            category: "Parts".into(),
            brand: "".into(),
            stock,
            min_stock: 2,
            buy_price_cents: 10_000,
            sell_price_cents: 15_000,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let tenant = Tenant::new("o1");
        let it = item(&tenant, "LCD Panel", 5);

        let mut tx = db.begin().await.unwrap();
        db.items().insert(&mut tx, &it).await.unwrap();
        tx.commit().await.unwrap();

        let found = db.items().find(&tenant, &it.id).await.unwrap();
        assert_eq!(found.name, "LCD Panel");
        assert_eq!(found.stock, 5);
    }

    #[tokio::test]
    async fn test_adjust_stock_is_relative() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let tenant = Tenant::new("o1");
        let it = item(&tenant, "Battery", 10);

        let mut tx = db.begin().await.unwrap();
        db.items().insert(&mut tx, &it).await.unwrap();
        db.items().adjust_stock(&mut tx, &tenant, &it.id, -3).await.unwrap();
        db.items().adjust_stock(&mut tx, &tenant, &it.id, 1).await.unwrap();
        tx.commit().await.unwrap();

        let found = db.items().find(&tenant, &it.id).await.unwrap();
        assert_eq!(found.stock, 8);
    }

    #[tokio::test]
    async fn test_adjust_stock_wrong_owner_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let tenant = Tenant::new("o1");
        let other = Tenant::new("o2");
        let it = item(&tenant, "Battery", 10);

        let mut tx = db.begin().await.unwrap();
        db.items().insert(&mut tx, &it).await.unwrap();
        let err = db
            .items()
            .adjust_stock(&mut tx, &other, &it.id, -1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_low_stock_threshold() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let tenant = Tenant::new("o1");

        let low = item(&tenant, "Low", 2); // min_stock = 2, inclusive
        let ok = item(&tenant, "Fine", 9);
        let mut unthresholded = item(&tenant, "NoThreshold", 0);
        unthresholded.min_stock = 0;

        let mut tx = db.begin().await.unwrap();
        db.items().insert(&mut tx, &low).await.unwrap();
        db.items().insert(&mut tx, &ok).await.unwrap();
        db.items().insert(&mut tx, &unthresholded).await.unwrap();
        tx.commit().await.unwrap();

        // min_stock = 0 is "no threshold": never flagged, even at zero stock
        let flagged = db.items().low_stock(&tenant).await.unwrap();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].name, "Low");
    }

    #[tokio::test]
    async fn test_stock_valuation() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let tenant = Tenant::new("o1");

        let mut a = item(&tenant, "A", 2); // 2 * 10000 buy, 2 * 15000 sell
        a.buy_price_cents = 10_000;
        a.sell_price_cents = 15_000;
        let mut b = item(&tenant, "B", 3); // 3 * 1000 buy, 3 * 2000 sell
        b.buy_price_cents = 1_000;
        b.sell_price_cents = 2_000;

        let mut tx = db.begin().await.unwrap();
        db.items().insert(&mut tx, &a).await.unwrap();
        db.items().insert(&mut tx, &b).await.unwrap();
        tx.commit().await.unwrap();

        let valuation = db.items().stock_valuation(&tenant).await.unwrap();
        assert_eq!(valuation.item_count, 2);
        assert_eq!(valuation.unit_count, 5);
        assert_eq!(valuation.buy_value_cents, 23_000);
        assert_eq!(valuation.sell_value_cents, 36_000);
    }

    #[tokio::test]
    async fn test_list_is_tenant_scoped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let t1 = Tenant::new("o1");
        let t2 = Tenant::new("o2");

        let mut tx = db.begin().await.unwrap();
        db.items().insert(&mut tx, &item(&t1, "Mine", 1)).await.unwrap();
        db.items().insert(&mut tx, &item(&t2, "Theirs", 1)).await.unwrap();
        tx.commit().await.unwrap();

        let page = db.items().list(&t1, None, 1, 20).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Mine");
    }

    #[tokio::test]
    async fn test_list_search_filter() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let tenant = Tenant::new("o1");

        let mut tx = db.begin().await.unwrap();
        db.items().insert(&mut tx, &item(&tenant, "LCD Panel", 1)).await.unwrap();
        db.items().insert(&mut tx, &item(&tenant, "Battery", 1)).await.unwrap();
        tx.commit().await.unwrap();

        let page = db.items().list(&tenant, Some("lcd"), 1, 20).await.unwrap();
        // SQLite LIKE is case-insensitive for ASCII
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "LCD Panel");
    }

    #[tokio::test]
    async fn test_opname_trail() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let tenant = Tenant::new("o1");
        let it = item(&tenant, "Counted", 10);

        let mut tx = db.begin().await.unwrap();
        db.items().insert(&mut tx, &it).await.unwrap();
        db.items().set_stock(&mut tx, &tenant, &it.id, 7).await.unwrap();
        db.items()
            .insert_opname(
                &mut tx,
                &StockOpnameEntry {
                    id: new_id(),
                    owner_id: tenant.owner_id.clone(),
                    store_id: None,
                    item_id: Some(it.id.clone()),
                    item_name: it.name.clone(),
                    old_stock: 10,
                    new_stock: 7,
                    difference: -3,
                    notes: "annual count".into(),
                    created_at: Utc::now(),
                },
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(db.items().find(&tenant, &it.id).await.unwrap().stock, 7);

        let history = db.items().opname_history(&tenant, 1, 20).await.unwrap();
        assert_eq!(history.total, 1);
        assert_eq!(history.items[0].difference, -3);
    }

    #[tokio::test]
    async fn test_opname_trail_survives_item_deletion() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let tenant = Tenant::new("o1");
        let it = item(&tenant, "Short-lived", 4);

        let mut tx = db.begin().await.unwrap();
        db.items().insert(&mut tx, &it).await.unwrap();
        db.items()
            .insert_opname(
                &mut tx,
                &StockOpnameEntry {
                    id: new_id(),
                    owner_id: tenant.owner_id.clone(),
                    store_id: None,
                    item_id: Some(it.id.clone()),
                    item_name: it.name.clone(),
                    old_stock: 4,
                    new_stock: 4,
                    difference: 0,
                    notes: "".into(),
                    created_at: Utc::now(),
                },
            )
            .await
            .unwrap();
        db.items().delete(&mut tx, &tenant, &it.id).await.unwrap();
        tx.commit().await.unwrap();

        // the audit row outlives the item; only the link goes NULL
        let history = db.items().opname_history(&tenant, 1, 20).await.unwrap();
        assert_eq!(history.total, 1);
        assert_eq!(history.items[0].item_id, None);
        assert_eq!(history.items[0].item_name, "Short-lived");
    }
}
