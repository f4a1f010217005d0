//! # Debt Operations
//!
//! Debts come from two places: credit sales/purchases open them as a
//! side effect (see `open_debt`), and callers can record free-standing
//! ones. Payments are the interesting part — the derived columns are
//! recomputed from the full payment trail on every payment, so they can
//! never drift from it.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::info;

use crate::error::EngineResult;
use crate::finance::ledger_entry;
use crate::input::{CreateDebtInput, PayDebtInput};
use crate::Engine;
use reparo_core::lifecycle::categories;
use reparo_core::{
    validation, Debt, DebtKind, DebtPayment, DebtStatus, ReferenceType, Tenant, TransactionKind,
    ValidationError,
};
use reparo_db::repository::new_id;
use reparo_db::Page;

/// Opens a debt inside an existing transaction.
///
/// Used by the credit paths of sales and purchases; the debt shares the
/// caller's unit of work and points back at the record that caused it.
pub(crate) async fn open_debt(
    engine: &Engine,
    conn: &mut SqliteConnection,
    tenant: &Tenant,
    kind: DebtKind,
    party_name: String,
    amount_cents: i64,
    reference_type: ReferenceType,
    reference_id: &str,
) -> EngineResult<Debt> {
    let debt = Debt {
        id: new_id(),
        owner_id: tenant.owner_id.clone(),
        store_id: tenant.store_id.clone(),
        kind,
        party_name,
        amount_cents,
        paid_cents: 0,
        remaining_cents: amount_cents,
        status: DebtStatus::Outstanding,
        reference_type: Some(reference_type),
        reference_id: Some(reference_id.to_string()),
        notes: String::new(),
        created_at: Utc::now(),
    };
    engine.db().debts().insert(conn, &debt).await?;
    Ok(debt)
}

impl Engine {
    /// Records a free-standing debt (one not tied to a credit sale or
    /// purchase — a cash loan to a regular, an old balance carried in).
    pub async fn create_debt(&self, tenant: &Tenant, input: CreateDebtInput) -> EngineResult<Debt> {
        let party_name = validation::required_text("party_name", &input.party_name)?;
        validation::positive("amount_cents", input.amount_cents)?;

        let debt = Debt {
            id: new_id(),
            owner_id: tenant.owner_id.clone(),
            store_id: tenant.store_id.clone(),
            kind: input.kind,
            party_name,
            amount_cents: input.amount_cents,
            paid_cents: 0,
            remaining_cents: input.amount_cents,
            status: DebtStatus::Outstanding,
            reference_type: None,
            reference_id: None,
            notes: input.notes,
            created_at: Utc::now(),
        };

        let mut tx = self.db().begin().await?;
        self.db().debts().insert(&mut tx, &debt).await?;
        tx.commit().await?;

        info!(id = %debt.id, kind = ?debt.kind, amount = debt.amount_cents, "Debt recorded");
        Ok(debt)
    }

    /// Records a payment against a debt.
    ///
    /// In one transaction: append the payment, recompute paid/remaining
    /// from the trail, flip to settled when nothing remains, and write
    /// the cash-flow ledger entry (expense for payables we pay off,
    /// income for receivables paid to us).
    pub async fn pay_debt(
        &self,
        tenant: &Tenant,
        debt_id: &str,
        input: PayDebtInput,
    ) -> EngineResult<Debt> {
        validation::positive("amount_cents", input.amount_cents)?;

        let mut tx = self.db().begin().await?;
        let mut debt = self.db().debts().find_tx(&mut tx, tenant, debt_id).await?;

        if input.amount_cents > debt.remaining_cents {
            return Err(ValidationError::ExcessivePayment {
                remaining: debt.remaining_cents,
            }
            .into());
        }

        let payment = DebtPayment {
            id: new_id(),
            debt_id: debt.id.clone(),
            amount_cents: input.amount_cents,
            cash_account_id: input.cash_account_id.clone(),
            notes: input.notes,
            created_at: Utc::now(),
        };
        self.db().debts().insert_payment(&mut tx, &payment).await?;

        // Recompute from the trail, never increment in place.
        let paid = self.db().debts().total_paid(&mut tx, &debt.id).await?;
        let remaining = debt.amount_cents - paid;
        let status = if remaining <= 0 {
            DebtStatus::Settled
        } else {
            DebtStatus::Outstanding
        };
        self.db()
            .debts()
            .update_totals(&mut tx, tenant, &debt.id, paid, remaining, status)
            .await?;

        let (kind, category) = match debt.kind {
            DebtKind::Payable => (TransactionKind::Expense, categories::DEBT_PAYMENT),
            DebtKind::Receivable => (TransactionKind::Income, categories::RECEIVABLE_PAYMENT),
        };
        let entry = ledger_entry(
            tenant,
            kind,
            category,
            input.amount_cents,
            format!("Payment on debt to/from {}", debt.party_name),
            input.cash_account_id,
            Some((ReferenceType::Debt, debt.id.clone())),
        );
        self.db().finance().insert(&mut tx, &entry).await?;

        tx.commit().await?;

        debt.paid_cents = paid;
        debt.remaining_cents = remaining;
        debt.status = status;

        info!(
            id = %debt.id,
            paid,
            remaining,
            status = ?status,
            "Debt payment recorded"
        );
        Ok(debt)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetches a debt by id.
    pub async fn get_debt(&self, tenant: &Tenant, id: &str) -> EngineResult<Debt> {
        Ok(self.db().debts().find(tenant, id).await?)
    }

    /// Lists a debt's payment trail, oldest first.
    pub async fn list_debt_payments(
        &self,
        tenant: &Tenant,
        debt_id: &str,
    ) -> EngineResult<Vec<DebtPayment>> {
        // Ownership check first: payments themselves carry no owner.
        self.db().debts().find(tenant, debt_id).await?;
        Ok(self.db().debts().payments(debt_id).await?)
    }

    /// Pages through debts, optionally one kind only.
    pub async fn list_debts(
        &self,
        tenant: &Tenant,
        kind: Option<DebtKind>,
        page: u32,
        per_page: u32,
    ) -> EngineResult<Page<Debt>> {
        Ok(self.db().debts().list(tenant, kind, page, per_page).await?)
    }
}
