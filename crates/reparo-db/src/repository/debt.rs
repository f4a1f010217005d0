//! # Debt Repository
//!
//! Debts carry derived columns (`paid_cents`, `remaining_cents`,
//! `status`) that are always recomputed from the payment trail inside the
//! payment transaction. Nothing ever increments them in place; the trail
//! is the source of truth and the columns are a materialization of it.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{page_bounds, Page};
use reparo_core::{Debt, DebtKind, DebtPayment, DebtStatus, ReferenceType, Tenant};

/// Repository for debts and their payments.
#[derive(Debug, Clone)]
pub struct DebtRepository {
    pool: SqlitePool,
}

impl DebtRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DebtRepository { pool }
    }

    // =========================================================================
    // Writes (injected connection)
    // =========================================================================

    /// Inserts a new debt.
    pub async fn insert(&self, conn: &mut SqliteConnection, debt: &Debt) -> DbResult<()> {
        debug!(id = %debt.id, kind = ?debt.kind, amount = debt.amount_cents, "Inserting debt");

        sqlx::query(
            r#"
            INSERT INTO debts
                (id, owner_id, store_id, kind, party_name, amount_cents, paid_cents,
                 remaining_cents, status, reference_type, reference_id, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&debt.id)
        .bind(&debt.owner_id)
        .bind(&debt.store_id)
        .bind(debt.kind)
        .bind(&debt.party_name)
        .bind(debt.amount_cents)
        .bind(debt.paid_cents)
        .bind(debt.remaining_cents)
        .bind(debt.status)
        .bind(debt.reference_type)
        .bind(&debt.reference_id)
        .bind(&debt.notes)
        .bind(debt.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Records one payment against a debt.
    pub async fn insert_payment(
        &self,
        conn: &mut SqliteConnection,
        payment: &DebtPayment,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO debt_payments
                (id, debt_id, amount_cents, cash_account_id, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.debt_id)
        .bind(payment.amount_cents)
        .bind(&payment.cash_account_id)
        .bind(&payment.notes)
        .bind(payment.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Sums the payment trail of a debt.
    pub async fn total_paid(&self, conn: &mut SqliteConnection, debt_id: &str) -> DbResult<i64> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT SUM(amount_cents) FROM debt_payments WHERE debt_id = ?")
                .bind(debt_id)
                .fetch_one(conn)
                .await?;

        Ok(total.unwrap_or(0))
    }

    /// Writes the recomputed derived columns back onto the debt.
    pub async fn update_totals(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        debt_id: &str,
        paid_cents: i64,
        remaining_cents: i64,
        status: DebtStatus,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE debts
            SET paid_cents = ?, remaining_cents = ?, status = ?
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(paid_cents)
        .bind(remaining_cents)
        .bind(status)
        .bind(debt_id)
        .bind(&tenant.owner_id)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Debt", debt_id));
        }
        Ok(())
    }

    /// Deletes the debts opened by one business record (payments cascade).
    pub async fn delete_by_reference(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM debts
            WHERE owner_id = ? AND reference_type = ? AND reference_id = ?
            "#,
        )
        .bind(&tenant.owner_id)
        .bind(reference_type)
        .bind(reference_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Fetches a debt inside a transaction.
    pub async fn find_tx(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        id: &str,
    ) -> DbResult<Debt> {
        sqlx::query_as::<_, Debt>("SELECT * FROM debts WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(&tenant.owner_id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DbError::not_found("Debt", id))
    }

    // =========================================================================
    // Reads (pool)
    // =========================================================================

    /// Fetches a debt by id.
    pub async fn find(&self, tenant: &Tenant, id: &str) -> DbResult<Debt> {
        sqlx::query_as::<_, Debt>("SELECT * FROM debts WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(&tenant.owner_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Debt", id))
    }

    /// Lists a debt's payments, oldest first.
    pub async fn payments(&self, debt_id: &str) -> DbResult<Vec<DebtPayment>> {
        let rows = sqlx::query_as::<_, DebtPayment>(
            "SELECT * FROM debt_payments WHERE debt_id = ? ORDER BY created_at, id",
        )
        .bind(debt_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Lists debts for a tenant, optionally filtered by kind, newest first.
    pub async fn list(
        &self,
        tenant: &Tenant,
        kind: Option<DebtKind>,
        page: u32,
        per_page: u32,
    ) -> DbResult<Page<Debt>> {
        let (limit, offset) = page_bounds(page, per_page);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM debts
            WHERE owner_id = ? AND (? IS NULL OR kind = ?)
            "#,
        )
        .bind(&tenant.owner_id)
        .bind(kind)
        .bind(kind)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, Debt>(
            r#"
            SELECT * FROM debts
            WHERE owner_id = ? AND (? IS NULL OR kind = ?)
            ORDER BY created_at DESC, id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&tenant.owner_id)
        .bind(kind)
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
