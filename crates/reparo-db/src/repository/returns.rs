//! # Return Repository
//!
//! Sale returns and purchase returns share one table pair; the `kind`
//! column discriminates. The orchestrator decides the stock direction and
//! ledger entries, this repository just persists what it is handed.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{page_bounds, Page};
use reparo_core::{Return, ReturnItem, ReturnKind, Tenant};

/// Repository for returns (both directions).
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    // =========================================================================
    // Writes (injected connection)
    // =========================================================================

    /// Inserts a return header with its lines.
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        ret: &Return,
        items: &[ReturnItem],
    ) -> DbResult<()> {
        debug!(id = %ret.id, kind = ?ret.kind, lines = items.len(), "Inserting return");

        sqlx::query(
            r#"
            INSERT INTO returns
                (id, owner_id, store_id, kind, parent_id, total_cents, reason,
                 compensation_cents, cash_account_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&ret.id)
        .bind(&ret.owner_id)
        .bind(&ret.store_id)
        .bind(ret.kind)
        .bind(&ret.parent_id)
        .bind(ret.total_cents)
        .bind(&ret.reason)
        .bind(ret.compensation_cents)
        .bind(&ret.cash_account_id)
        .bind(ret.created_at)
        .execute(&mut *conn)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO return_items
                    (id, return_id, inventory_id, name, qty, price_cents)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.id)
            .bind(&item.return_id)
            .bind(&item.inventory_id)
            .bind(&item.name)
            .bind(item.qty)
            .bind(item.price_cents)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Deletes a return (lines cascade).
    pub async fn delete(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        id: &str,
    ) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM returns WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(&tenant.owner_id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Return", id));
        }
        Ok(())
    }

    /// Fetches a return with its lines inside a transaction.
    pub async fn find_tx(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        id: &str,
    ) -> DbResult<(Return, Vec<ReturnItem>)> {
        let ret = sqlx::query_as::<_, Return>("SELECT * FROM returns WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(&tenant.owner_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("Return", id))?;

        let items = sqlx::query_as::<_, ReturnItem>(
            "SELECT * FROM return_items WHERE return_id = ? ORDER BY id",
        )
        .bind(id)
        .fetch_all(conn)
        .await?;

        Ok((ret, items))
    }

    // =========================================================================
    // Reads (pool)
    // =========================================================================

    /// Fetches a return with its lines.
    pub async fn find(&self, tenant: &Tenant, id: &str) -> DbResult<(Return, Vec<ReturnItem>)> {
        let ret = sqlx::query_as::<_, Return>("SELECT * FROM returns WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(&tenant.owner_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Return", id))?;

        let items = sqlx::query_as::<_, ReturnItem>(
            "SELECT * FROM return_items WHERE return_id = ? ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok((ret, items))
    }

    /// Lists returns of one kind for a tenant, newest first.
    pub async fn list(
        &self,
        tenant: &Tenant,
        kind: ReturnKind,
        page: u32,
        per_page: u32,
    ) -> DbResult<Page<Return>> {
        let (limit, offset) = page_bounds(page, per_page);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM returns WHERE owner_id = ? AND kind = ?",
        )
        .bind(&tenant.owner_id)
        .bind(kind)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, Return>(
            r#"
            SELECT * FROM returns
            WHERE owner_id = ? AND kind = ?
            ORDER BY created_at DESC, id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&tenant.owner_id)
        .bind(kind)
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
