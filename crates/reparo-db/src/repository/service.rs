//! # Service Order Repository
//!
//! Service orders own three child collections (parts, QC checklist,
//! completeness checklist). The children are replaced wholesale on every
//! edit rather than diffed: the orchestrator restores the stock consumed
//! by the old parts, deletes them, and re-applies the new set. Diffing
//! would save a few rows at the cost of a second stock-accounting code
//! path that could drift from the first.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{page_bounds, Page};
use reparo_core::{ChecklistEntry, ServiceOrder, ServicePart, ServiceStatus, Tenant};

/// A service order with all child collections loaded.
#[derive(Debug, Clone)]
pub struct ServiceDetail {
    pub order: ServiceOrder,
    pub parts: Vec<ServicePart>,
    pub qc: Vec<ChecklistEntry>,
    pub completeness: Vec<ChecklistEntry>,
}

/// Repository for service orders and their child collections.
#[derive(Debug, Clone)]
pub struct ServiceRepository {
    pool: SqlitePool,
}

impl ServiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ServiceRepository { pool }
    }

    // =========================================================================
    // Writes (injected connection)
    // =========================================================================

    /// Inserts a service order header.
    pub async fn insert(&self, conn: &mut SqliteConnection, order: &ServiceOrder) -> DbResult<()> {
        debug!(id = %order.id, token = %order.token, "Inserting service order");

        sqlx::query(
            r#"
            INSERT INTO service_orders
                (id, owner_id, store_id, token, customer_name, customer_id, phone,
                 device_model, complaint, status, cost_estimate_cents, down_payment_cents,
                 service_fee_cents, warranty, technician, payment_status, payment_method,
                 cash_account_id, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&order.id)
        .bind(&order.owner_id)
        .bind(&order.store_id)
        .bind(&order.token)
        .bind(&order.customer_name)
        .bind(&order.customer_id)
        .bind(&order.phone)
        .bind(&order.device_model)
        .bind(&order.complaint)
        .bind(order.status)
        .bind(order.cost_estimate_cents)
        .bind(order.down_payment_cents)
        .bind(order.service_fee_cents)
        .bind(&order.warranty)
        .bind(&order.technician)
        .bind(order.payment_status)
        .bind(&order.payment_method)
        .bind(&order.cash_account_id)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Updates the header fields of a service order.
    ///
    /// `status` and `token` are deliberately NOT touched here: the token
    /// is immutable and status only moves through the transition path.
    pub async fn update_header(
        &self,
        conn: &mut SqliteConnection,
        order: &ServiceOrder,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE service_orders
            SET customer_name = ?, customer_id = ?, phone = ?, device_model = ?,
                complaint = ?, cost_estimate_cents = ?, down_payment_cents = ?,
                service_fee_cents = ?, warranty = ?, technician = ?, payment_status = ?,
                payment_method = ?, cash_account_id = ?, notes = ?, updated_at = ?
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(&order.customer_name)
        .bind(&order.customer_id)
        .bind(&order.phone)
        .bind(&order.device_model)
        .bind(&order.complaint)
        .bind(order.cost_estimate_cents)
        .bind(order.down_payment_cents)
        .bind(order.service_fee_cents)
        .bind(&order.warranty)
        .bind(&order.technician)
        .bind(order.payment_status)
        .bind(&order.payment_method)
        .bind(&order.cash_account_id)
        .bind(&order.notes)
        .bind(order.updated_at)
        .bind(&order.id)
        .bind(&order.owner_id)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ServiceOrder", &order.id));
        }
        Ok(())
    }

    /// Moves a service order to a new status.
    ///
    /// Transition legality is checked by the orchestrator before calling;
    /// this just records the outcome.
    pub async fn update_status(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        id: &str,
        status: ServiceStatus,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE service_orders
            SET status = ?, updated_at = ?
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(status)
        .bind(chrono::Utc::now())
        .bind(id)
        .bind(&tenant.owner_id)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ServiceOrder", id));
        }
        Ok(())
    }

    /// Deletes a service order (children cascade).
    pub async fn delete(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        id: &str,
    ) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM service_orders WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(&tenant.owner_id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ServiceOrder", id));
        }
        Ok(())
    }

    /// Checks whether a token is already taken.
    ///
    /// Global, not tenant-scoped: the UNIQUE index spans owners because
    /// the token is the public lookup key.
    pub async fn token_exists(&self, conn: &mut SqliteConnection, token: &str) -> DbResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM service_orders WHERE token = ?")
                .bind(token)
                .fetch_one(conn)
                .await?;

        Ok(count > 0)
    }

    /// Inserts part lines for a service order.
    pub async fn insert_parts(
        &self,
        conn: &mut SqliteConnection,
        parts: &[ServicePart],
    ) -> DbResult<()> {
        for part in parts {
            sqlx::query(
                r#"
                INSERT INTO service_parts
                    (id, service_id, inventory_id, name, qty, buy_price_cents, sell_price_cents)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&part.id)
            .bind(&part.service_id)
            .bind(&part.inventory_id)
            .bind(&part.name)
            .bind(part.qty)
            .bind(part.buy_price_cents)
            .bind(part.sell_price_cents)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Deletes all part lines of a service order.
    pub async fn delete_parts(
        &self,
        conn: &mut SqliteConnection,
        service_id: &str,
    ) -> DbResult<()> {
        sqlx::query("DELETE FROM service_parts WHERE service_id = ?")
            .bind(service_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Fetches the part lines of a service order inside a transaction.
    pub async fn parts_tx(
        &self,
        conn: &mut SqliteConnection,
        service_id: &str,
    ) -> DbResult<Vec<ServicePart>> {
        let parts = sqlx::query_as::<_, ServicePart>(
            "SELECT * FROM service_parts WHERE service_id = ? ORDER BY id",
        )
        .bind(service_id)
        .fetch_all(conn)
        .await?;

        Ok(parts)
    }

    /// Replaces a checklist (`service_qc` or `service_completeness`).
    async fn replace_checklist(
        conn: &mut SqliteConnection,
        table: &str,
        service_id: &str,
        entries: &[ChecklistEntry],
    ) -> DbResult<()> {
        // Table name comes from the two constants below, never from input.
        sqlx::query(&format!("DELETE FROM {table} WHERE service_id = ?"))
            .bind(service_id)
            .execute(&mut *conn)
            .await?;

        for entry in entries {
            sqlx::query(&format!(
                "INSERT INTO {table} (id, service_id, name, checked) VALUES (?, ?, ?, ?)"
            ))
            .bind(&entry.id)
            .bind(&entry.service_id)
            .bind(&entry.name)
            .bind(entry.checked)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Replaces the QC checklist of a service order.
    pub async fn replace_qc(
        &self,
        conn: &mut SqliteConnection,
        service_id: &str,
        entries: &[ChecklistEntry],
    ) -> DbResult<()> {
        Self::replace_checklist(conn, "service_qc", service_id, entries).await
    }

    /// Replaces the completeness checklist of a service order.
    pub async fn replace_completeness(
        &self,
        conn: &mut SqliteConnection,
        service_id: &str,
        entries: &[ChecklistEntry],
    ) -> DbResult<()> {
        Self::replace_checklist(conn, "service_completeness", service_id, entries).await
    }

    /// Fetches a service order header inside a transaction.
    pub async fn find_tx(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        id: &str,
    ) -> DbResult<ServiceOrder> {
        sqlx::query_as::<_, ServiceOrder>(
            "SELECT * FROM service_orders WHERE id = ? AND owner_id = ?",
        )
        .bind(id)
        .bind(&tenant.owner_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DbError::not_found("ServiceOrder", id))
    }

    // =========================================================================
    // Reads (pool)
    // =========================================================================

    /// Fetches a service order with all child collections.
    pub async fn find(&self, tenant: &Tenant, id: &str) -> DbResult<ServiceDetail> {
        let order = sqlx::query_as::<_, ServiceOrder>(
            "SELECT * FROM service_orders WHERE id = ? AND owner_id = ?",
        )
        .bind(id)
        .bind(&tenant.owner_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("ServiceOrder", id))?;

        self.load_detail(order).await
    }

    /// Looks up a service order by its public tracking token.
    ///
    /// Tokens are globally unique (the UNIQUE index spans owners), so
    /// this is the one lookup that is not tenant-scoped: it backs the
    /// customer-facing "where is my repair" page.
    pub async fn find_by_token(&self, token: &str) -> DbResult<ServiceDetail> {
        let order =
            sqlx::query_as::<_, ServiceOrder>("SELECT * FROM service_orders WHERE token = ?")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| DbError::not_found("ServiceOrder", token))?;

        self.load_detail(order).await
    }

    async fn load_detail(&self, order: ServiceOrder) -> DbResult<ServiceDetail> {
        let parts = sqlx::query_as::<_, ServicePart>(
            "SELECT * FROM service_parts WHERE service_id = ? ORDER BY id",
        )
        .bind(&order.id)
        .fetch_all(&self.pool)
        .await?;

        let qc = sqlx::query_as::<_, ChecklistEntry>(
            "SELECT * FROM service_qc WHERE service_id = ? ORDER BY id",
        )
        .bind(&order.id)
        .fetch_all(&self.pool)
        .await?;

        let completeness = sqlx::query_as::<_, ChecklistEntry>(
            "SELECT * FROM service_completeness WHERE service_id = ? ORDER BY id",
        )
        .bind(&order.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ServiceDetail {
            order,
            parts,
            qc,
            completeness,
        })
    }

    /// Lists service orders, newest first, with optional status filter and
    /// customer/device search.
    pub async fn list(
        &self,
        tenant: &Tenant,
        status: Option<ServiceStatus>,
        search: Option<&str>,
        page: u32,
        per_page: u32,
    ) -> DbResult<Page<ServiceOrder>> {
        let (limit, offset) = page_bounds(page, per_page);
        let pattern = search.map(|s| format!("%{}%", s.trim()));

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM service_orders
            WHERE owner_id = ?
              AND (? IS NULL OR store_id = ?)
              AND (? IS NULL OR status = ?)
              AND (? IS NULL OR customer_name LIKE ? OR device_model LIKE ? OR token LIKE ?)
            "#,
        )
        .bind(&tenant.owner_id)
        .bind(&tenant.store_id)
        .bind(&tenant.store_id)
        .bind(status)
        .bind(status)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, ServiceOrder>(
            r#"
            SELECT * FROM service_orders
            WHERE owner_id = ?
              AND (? IS NULL OR store_id = ?)
              AND (? IS NULL OR status = ?)
              AND (? IS NULL OR customer_name LIKE ? OR device_model LIKE ? OR token LIKE ?)
            ORDER BY created_at DESC, id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&tenant.owner_id)
        .bind(&tenant.store_id)
        .bind(&tenant.store_id)
        .bind(status)
        .bind(status)
        .bind(&pattern)
        .bind(&pattern)
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
}
