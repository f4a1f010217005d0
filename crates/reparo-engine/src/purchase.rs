//! # Purchase Operations
//!
//! The mirror of sales: stock goes up, money goes out. A credit purchase
//! additionally opens a payable tracking what the supplier is owed.
//! Deleting a
//! purchase reverses its stock — and is allowed to fail: if the units
//! were already sold on, the reversal would drive stock negative and the
//! whole delete aborts.

use chrono::Utc;
use tracing::info;

use crate::error::EngineResult;
use crate::finance::ledger_entry;
use crate::input::CreatePurchaseInput;
use crate::stock::{apply_deltas, StockDelta};
use crate::Engine;
use reparo_core::lifecycle::categories;
use reparo_core::{
    validation, DebtKind, PaymentMethod, Purchase, PurchaseItem, ReferenceType, Tenant,
    TransactionKind,
};
use reparo_db::repository::new_id;
use reparo_db::Page;

impl Engine {
    /// Creates a purchase: increment stock, refresh each item's buy
    /// price to what was just paid, record the purchase with its expense
    /// entry, and open a payable when bought on credit.
    pub async fn create_purchase(
        &self,
        tenant: &Tenant,
        input: CreatePurchaseInput,
    ) -> EngineResult<(Purchase, Vec<PurchaseItem>)> {
        validation::line_items(&input.items)?;
        for line in &input.items {
            validation::line_qty(line.qty)?;
            validation::non_negative("buy_price_cents", line.buy_price_cents)?;
        }

        let purchase_id = new_id();
        let mut tx = self.db().begin().await?;

        let mut items = Vec::with_capacity(input.items.len());
        let mut deltas = Vec::with_capacity(input.items.len());
        for line in &input.items {
            // Every line must name a real item; name snapshot comes from
            // the catalog, and the catalog's buy price follows the latest
            // purchase.
            let mut item = self.db().items().find_tx(&mut tx, tenant, &line.inventory_id).await?;
            if item.buy_price_cents != line.buy_price_cents {
                item.buy_price_cents = line.buy_price_cents;
                self.db().items().update(&mut tx, &item).await?;
            }

            deltas.push(StockDelta::new(line.inventory_id.clone(), line.qty));
            items.push(PurchaseItem {
                id: new_id(),
                purchase_id: purchase_id.clone(),
                inventory_id: Some(line.inventory_id.clone()),
                name: item.name,
                qty: line.qty,
                buy_price_cents: line.buy_price_cents,
            });
        }

        apply_deltas(&self.db().items(), &mut tx, tenant, &deltas).await?;

        let total: i64 = items.iter().map(|i| i.buy_price_cents * i.qty).sum();
        let purchase = Purchase {
            id: purchase_id.clone(),
            owner_id: tenant.owner_id.clone(),
            store_id: tenant.store_id.clone(),
            supplier_id: input.supplier_id,
            supplier_name: input.supplier_name,
            total_cents: total,
            payment_method: input.payment_method,
            cash_account_id: input.cash_account_id.clone(),
            notes: input.notes,
            created_at: Utc::now(),
        };
        self.db().purchases().insert(&mut tx, &purchase, &items).await?;

        let supplier = if purchase.supplier_name.trim().is_empty() {
            "supplier".to_string()
        } else {
            purchase.supplier_name.trim().to_string()
        };
        let entry = ledger_entry(
            tenant,
            TransactionKind::Expense,
            categories::PURCHASE,
            total,
            format!("Purchase from {supplier}"),
            input.cash_account_id,
            Some((ReferenceType::Purchase, purchase_id.clone())),
        );
        self.db().finance().insert(&mut tx, &entry).await?;

        if input.payment_method == PaymentMethod::Credit {
            crate::debt::open_debt(
                self,
                &mut tx,
                tenant,
                DebtKind::Payable,
                supplier,
                total,
                ReferenceType::Purchase,
                &purchase_id,
            )
            .await?;
        }

        tx.commit().await?;

        info!(id = %purchase.id, total, method = ?purchase.payment_method, "Purchase created");
        Ok((purchase, items))
    }

    /// Deletes a purchase, reversing its stock and financial effects.
    ///
    /// Fails with insufficient stock when the purchased units have since
    /// been sold — reversing would drive the items below zero.
    pub async fn delete_purchase(&self, tenant: &Tenant, id: &str) -> EngineResult<()> {
        let mut tx = self.db().begin().await?;
        let (_, items) = self.db().purchases().find_tx(&mut tx, tenant, id).await?;

        let deltas: Vec<StockDelta> = items
            .iter()
            .filter_map(|i| {
                i.inventory_id
                    .as_ref()
                    .map(|inv| StockDelta::new(inv.clone(), -i.qty))
            })
            .collect();
        apply_deltas(&self.db().items(), &mut tx, tenant, &deltas).await?;

        self.db()
            .finance()
            .delete_by_reference(&mut tx, tenant, ReferenceType::Purchase, id)
            .await?;
        self.db()
            .debts()
            .delete_by_reference(&mut tx, tenant, ReferenceType::Purchase, id)
            .await?;
        self.db().purchases().delete(&mut tx, tenant, id).await?;
        tx.commit().await?;

        info!(id = %id, "Purchase deleted and effects reversed");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetches a purchase with its lines.
    pub async fn get_purchase(
        &self,
        tenant: &Tenant,
        id: &str,
    ) -> EngineResult<(Purchase, Vec<PurchaseItem>)> {
        Ok(self.db().purchases().find(tenant, id).await?)
    }

    /// Pages through purchases, newest first.
    pub async fn list_purchases(
        &self,
        tenant: &Tenant,
        page: u32,
        per_page: u32,
    ) -> EngineResult<Page<Purchase>> {
        Ok(self.db().purchases().list(tenant, page, per_page).await?)
    }
}
