//! # Financial Ledger Repository
//!
//! The ledger is append-only from the business's point of view: rows are
//! inserted when operations happen and removed only as a whole group when
//! the operation that produced them is edited or deleted. That group
//! delete is `delete_by_reference`, driven by the back-pointer every row
//! carries.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{page_bounds, Page};
use reparo_core::{FinanceSummary, FinancialTransaction, ReferenceType, Tenant};

/// Repository for financial ledger rows.
#[derive(Debug, Clone)]
pub struct FinanceRepository {
    pool: SqlitePool,
}

impl FinanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        FinanceRepository { pool }
    }

    // =========================================================================
    // Writes (injected connection)
    // =========================================================================

    /// Inserts one ledger row.
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        entry: &FinancialTransaction,
    ) -> DbResult<()> {
        debug!(
            id = %entry.id,
            kind = ?entry.kind,
            category = %entry.category,
            amount = entry.amount_cents,
            "Inserting ledger entry"
        );

        sqlx::query(
            r#"
            INSERT INTO financial_transactions
                (id, owner_id, store_id, kind, category, amount_cents, description,
                 cash_account_id, reference_type, reference_id, date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.owner_id)
        .bind(&entry.store_id)
        .bind(entry.kind)
        .bind(&entry.category)
        .bind(entry.amount_cents)
        .bind(&entry.description)
        .bind(&entry.cash_account_id)
        .bind(entry.reference_type)
        .bind(&entry.reference_id)
        .bind(entry.date)
        .bind(entry.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Deletes every ledger row produced by one business record.
    ///
    /// Returns the number of rows removed. Zero is fine: not every record
    /// produces ledger rows (an unpaid service, a credit sale).
    pub async fn delete_by_reference(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM financial_transactions
            WHERE owner_id = ? AND reference_type = ? AND reference_id = ?
            "#,
        )
        .bind(&tenant.owner_id)
        .bind(reference_type)
        .bind(reference_id)
        .execute(conn)
        .await?;

        debug!(
            reference_type = ?reference_type,
            reference_id = %reference_id,
            removed = result.rows_affected(),
            "Removed ledger entries by reference"
        );
        Ok(result.rows_affected())
    }

    // =========================================================================
    // Reads (pool)
    // =========================================================================

    /// Lists the ledger rows produced by one business record.
    pub async fn list_by_reference(
        &self,
        tenant: &Tenant,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> DbResult<Vec<FinancialTransaction>> {
        let rows = sqlx::query_as::<_, FinancialTransaction>(
            r#"
            SELECT * FROM financial_transactions
            WHERE owner_id = ? AND reference_type = ? AND reference_id = ?
            ORDER BY created_at, id
            "#,
        )
        .bind(&tenant.owner_id)
        .bind(reference_type)
        .bind(reference_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Lists ledger rows in a date range, newest first.
    pub async fn list_by_date_range(
        &self,
        tenant: &Tenant,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        page: u32,
        per_page: u32,
    ) -> DbResult<Page<FinancialTransaction>> {
        let (limit, offset) = page_bounds(page, per_page);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM financial_transactions
            WHERE owner_id = ?
              AND (? IS NULL OR store_id = ?)
              AND (? IS NULL OR date >= ?)
              AND (? IS NULL OR date <= ?)
            "#,
        )
        .bind(&tenant.owner_id)
        .bind(&tenant.store_id)
        .bind(&tenant.store_id)
        .bind(from)
        .bind(from)
        .bind(to)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, FinancialTransaction>(
            r#"
            SELECT * FROM financial_transactions
            WHERE owner_id = ?
              AND (? IS NULL OR store_id = ?)
              AND (? IS NULL OR date >= ?)
              AND (? IS NULL OR date <= ?)
            ORDER BY date DESC, id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&tenant.owner_id)
        .bind(&tenant.store_id)
        .bind(&tenant.store_id)
        .bind(from)
        .bind(from)
        .bind(to)
        .bind(to)
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

    /// Sums the ledger per kind for a tenant, optionally date-bounded.
    ///
    /// Net position = income - expense + profit - loss; the caller gets
    /// the four sums and derives whatever view it needs.
    pub async fn summary(
        &self,
        tenant: &Tenant,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> DbResult<FinanceSummary> {
        let row: (Option<i64>, Option<i64>, Option<i64>, Option<i64>) = sqlx::query_as(
            r#"
            SELECT
                SUM(CASE WHEN kind = 'income' THEN amount_cents ELSE 0 END),
                SUM(CASE WHEN kind = 'expense' THEN amount_cents ELSE 0 END),
                SUM(CASE WHEN kind = 'profit' THEN amount_cents ELSE 0 END),
                SUM(CASE WHEN kind = 'loss' THEN amount_cents ELSE 0 END)
            FROM financial_transactions
            WHERE owner_id = ?
              AND (? IS NULL OR store_id = ?)
              AND (? IS NULL OR date >= ?)
              AND (? IS NULL OR date <= ?)
            "#,
        )
        .bind(&tenant.owner_id)
        .bind(&tenant.store_id)
        .bind(&tenant.store_id)
        .bind(from)
        .bind(from)
        .bind(to)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(FinanceSummary {
            income_cents: row.0.unwrap_or(0),
            expense_cents: row.1.unwrap_or(0),
            profit_cents: row.2.unwrap_or(0),
            loss_cents: row.3.unwrap_or(0),
        })
    }
}
