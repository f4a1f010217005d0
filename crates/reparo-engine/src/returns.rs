//! # Return Operations
//!
//! Two directions, symmetric effects:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   SALE RETURN (customer brings goods back)                              │
//! │     stock  +qty          ledger: Expense "Sale Return" (income undone) │
//! │     compensation > 0  →  ledger: Expense "Sale Return Compensation"    │
//! │                                                                         │
//! │   PURCHASE RETURN (goods go back to the supplier)                       │
//! │     stock  -qty (checked) ledger: Income "Purchase Return"              │
//! │     compensation > 0  →   ledger: Income "Purchase Return Compensation" │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::info;

use crate::error::EngineResult;
use crate::finance::ledger_entry;
use crate::input::CreateReturnInput;
use crate::stock::{apply_deltas, StockDelta};
use crate::Engine;
use reparo_core::lifecycle::categories;
use reparo_core::{
    validation, ReferenceType, Return, ReturnItem, ReturnKind, Tenant, TransactionKind,
    ValidationError,
};
use reparo_db::repository::new_id;
use reparo_db::Page;

impl Engine {
    /// Records a return in either direction.
    pub async fn create_return(
        &self,
        tenant: &Tenant,
        input: CreateReturnInput,
    ) -> EngineResult<(Return, Vec<ReturnItem>)> {
        validation::line_items(&input.items)?;
        validation::non_negative("compensation_cents", input.compensation_cents)?;
        for line in &input.items {
            validation::line_qty(line.qty)?;
            validation::non_negative("price_cents", line.price_cents)?;
        }

        let return_id = new_id();
        let mut tx = self.db().begin().await?;

        let sign = match input.kind {
            ReturnKind::Sale => 1,     // goods come back
            ReturnKind::Purchase => -1, // goods leave, checked
        };

        let mut items = Vec::with_capacity(input.items.len());
        let mut deltas = Vec::new();
        for line in &input.items {
            let name = match (&line.inventory_id, &line.name) {
                (Some(inventory_id), _) => {
                    let item = self.db().items().find_tx(&mut tx, tenant, inventory_id).await?;
                    deltas.push(StockDelta::new(inventory_id.clone(), sign * line.qty));
                    item.name
                }
                (None, Some(name)) => validation::required_text("name", name)?,
                (None, None) => {
                    return Err(ValidationError::Required {
                        field: "name".to_string(),
                    }
                    .into())
                }
            };
            items.push(ReturnItem {
                id: new_id(),
                return_id: return_id.clone(),
                inventory_id: line.inventory_id.clone(),
                name,
                qty: line.qty,
                price_cents: line.price_cents,
            });
        }

        apply_deltas(&self.db().items(), &mut tx, tenant, &deltas).await?;

        let total: i64 = items.iter().map(|i| i.price_cents * i.qty).sum();
        let ret = Return {
            id: return_id.clone(),
            owner_id: tenant.owner_id.clone(),
            store_id: tenant.store_id.clone(),
            kind: input.kind,
            parent_id: input.parent_id,
            total_cents: total,
            reason: input.reason,
            compensation_cents: input.compensation_cents,
            cash_account_id: input.cash_account_id.clone(),
            created_at: Utc::now(),
        };
        self.db().returns().insert(&mut tx, &ret, &items).await?;

        let (entry_kind, category, comp_category, reference_type) = match input.kind {
            ReturnKind::Sale => (
                TransactionKind::Expense,
                categories::SALE_RETURN,
                categories::SALE_RETURN_COMPENSATION,
                ReferenceType::SaleReturn,
            ),
            ReturnKind::Purchase => (
                TransactionKind::Income,
                categories::PURCHASE_RETURN,
                categories::PURCHASE_RETURN_COMPENSATION,
                ReferenceType::PurchaseReturn,
            ),
        };

        if total > 0 {
            let entry = ledger_entry(
                tenant,
                entry_kind,
                category,
                total,
                format!("Return {return_id}"),
                input.cash_account_id.clone(),
                Some((reference_type, return_id.clone())),
            );
            self.db().finance().insert(&mut tx, &entry).await?;
        }
        if input.compensation_cents > 0 {
            let entry = ledger_entry(
                tenant,
                entry_kind,
                comp_category,
                input.compensation_cents,
                format!("Compensation on return {return_id}"),
                input.cash_account_id,
                Some((reference_type, return_id.clone())),
            );
            self.db().finance().insert(&mut tx, &entry).await?;
        }

        tx.commit().await?;

        info!(id = %ret.id, kind = ?ret.kind, total, "Return recorded");
        Ok((ret, items))
    }

    /// Deletes a return, reversing its stock and ledger effects.
    pub async fn delete_return(&self, tenant: &Tenant, id: &str) -> EngineResult<()> {
        let mut tx = self.db().begin().await?;
        let (ret, items) = self.db().returns().find_tx(&mut tx, tenant, id).await?;

        // Undo is the opposite sign of creation.
        let sign = match ret.kind {
            ReturnKind::Sale => -1,
            ReturnKind::Purchase => 1,
        };
        let deltas: Vec<StockDelta> = items
            .iter()
            .filter_map(|i| {
                i.inventory_id
                    .as_ref()
                    .map(|inv| StockDelta::new(inv.clone(), sign * i.qty))
            })
            .collect();
        apply_deltas(&self.db().items(), &mut tx, tenant, &deltas).await?;

        let reference_type = match ret.kind {
            ReturnKind::Sale => ReferenceType::SaleReturn,
            ReturnKind::Purchase => ReferenceType::PurchaseReturn,
        };
        self.db()
            .finance()
            .delete_by_reference(&mut tx, tenant, reference_type, id)
            .await?;
        self.db().returns().delete(&mut tx, tenant, id).await?;
        tx.commit().await?;

        info!(id = %id, "Return deleted and effects reversed");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetches a return with its lines.
    pub async fn get_return(
        &self,
        tenant: &Tenant,
        id: &str,
    ) -> EngineResult<(Return, Vec<ReturnItem>)> {
        Ok(self.db().returns().find(tenant, id).await?)
    }

    /// Pages through returns of one kind, newest first.
    pub async fn list_returns(
        &self,
        tenant: &Tenant,
        kind: ReturnKind,
        page: u32,
        per_page: u32,
    ) -> EngineResult<Page<Return>> {
        Ok(self.db().returns().list(tenant, kind, page, per_page).await?)
    }
}
