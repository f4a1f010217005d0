//! # Financial Ledger Operations
//!
//! Reads over the ledger plus the one manual write path (operational
//! expenses). Everything else in `financial_transactions` is written by
//! the orchestrators as a side effect of business operations.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::EngineResult;
use crate::input::OperationalExpenseInput;
use crate::Engine;
use reparo_core::lifecycle::categories;
use reparo_core::{
    validation, FinanceSummary, FinancialTransaction, ReferenceType, Tenant, TransactionKind,
};
use reparo_db::repository::new_id;
use reparo_db::Page;

/// Builds a ledger row for a tenant. Orchestrators use this for every
/// entry they record, so the invariants (non-negative amount, owner
/// stamped, timestamps set) hold in one place.
pub(crate) fn ledger_entry(
    tenant: &Tenant,
    kind: TransactionKind,
    category: &str,
    amount_cents: i64,
    description: String,
    cash_account_id: Option<String>,
    reference: Option<(ReferenceType, String)>,
) -> FinancialTransaction {
    debug_assert!(amount_cents >= 0, "ledger amounts are unsigned by invariant");

    let now = Utc::now();
    let (reference_type, reference_id) = match reference {
        Some((t, id)) => (Some(t), Some(id)),
        None => (None, None),
    };

    FinancialTransaction {
        id: new_id(),
        owner_id: tenant.owner_id.clone(),
        store_id: tenant.store_id.clone(),
        kind,
        category: category.to_string(),
        amount_cents,
        description,
        cash_account_id,
        reference_type,
        reference_id,
        date: now,
        created_at: now,
    }
}

impl Engine {
    /// Records a manual operational expense (rent, utilities, wages).
    pub async fn record_operational_expense(
        &self,
        tenant: &Tenant,
        input: OperationalExpenseInput,
    ) -> EngineResult<FinancialTransaction> {
        validation::positive("amount_cents", input.amount_cents)?;

        let category = if input.category.trim().is_empty() {
            categories::OPERATIONAL.to_string()
        } else {
            input.category.trim().to_string()
        };

        let mut entry = ledger_entry(
            tenant,
            TransactionKind::Expense,
            &category,
            input.amount_cents,
            input.description,
            input.cash_account_id,
            None,
        );
        if let Some(date) = input.date {
            entry.date = date;
        }

        let mut tx = self.db().begin().await?;
        self.db().finance().insert(&mut tx, &entry).await?;
        tx.commit().await?;

        info!(category = %entry.category, amount = entry.amount_cents, "Operational expense recorded");
        Ok(entry)
    }

    /// Sums the ledger per kind, optionally bounded to a date range.
    pub async fn finance_summary(
        &self,
        tenant: &Tenant,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> EngineResult<FinanceSummary> {
        Ok(self.db().finance().summary(tenant, from, to).await?)
    }

    /// Pages through ledger rows in a date range, newest first.
    pub async fn list_transactions(
        &self,
        tenant: &Tenant,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        page: u32,
        per_page: u32,
    ) -> EngineResult<Page<FinancialTransaction>> {
        Ok(self
            .db()
            .finance()
            .list_by_date_range(tenant, from, to, page, per_page)
            .await?)
    }

    /// Lists the ledger rows one business record produced.
    pub async fn transactions_for(
        &self,
        tenant: &Tenant,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> EngineResult<Vec<FinancialTransaction>> {
        Ok(self
            .db()
            .finance()
            .list_by_reference(tenant, reference_type, reference_id)
            .await?)
    }
}
