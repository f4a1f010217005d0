//! # Sale Operations
//!
//! A sale touches four tables atomically: inventory (stock down), the
//! sale record itself, the financial ledger (exactly one income entry of
//! the total), and — for credit sales — the debt book. Deleting a sale
//! replays all of that in reverse.

use chrono::Utc;
use tracing::info;

use crate::error::EngineResult;
use crate::finance::ledger_entry;
use crate::input::{CreateSaleInput, SaleLineInput};
use crate::stock::{apply_deltas, StockDelta};
use crate::Engine;
use reparo_core::lifecycle::categories;
use reparo_core::{
    validation, DebtKind, DiscountType, Money, PaymentMethod, ReferenceType, Sale, SaleItem,
    Tenant, TransactionKind, ValidationError,
};
use reparo_db::repository::new_id;
use reparo_db::Page;

impl Engine {
    /// Creates a sale: decrement stock, record the sale, write its
    /// income entry, and open a receivable when sold on credit. One
    /// transaction; insufficient stock on any line aborts everything.
    pub async fn create_sale(
        &self,
        tenant: &Tenant,
        input: CreateSaleInput,
    ) -> EngineResult<(Sale, Vec<SaleItem>)> {
        validation::line_items(&input.items)?;
        validation::non_negative("discount_value", input.discount_value)?;
        for line in &input.items {
            validation::line_qty(line.qty)?;
        }

        let sale_id = new_id();
        let mut tx = self.db().begin().await?;

        // Resolve lines: inventory lines get snapshots and move stock,
        // free-form lines are charges with no stock effect.
        let mut items = Vec::with_capacity(input.items.len());
        let mut deltas = Vec::new();
        for line in &input.items {
            let resolved = match &line.inventory_id {
                Some(inventory_id) => {
                    let item = self.db().items().find_tx(&mut tx, tenant, inventory_id).await?;
                    deltas.push(StockDelta::new(inventory_id.clone(), -line.qty));
                    SaleItem {
                        id: new_id(),
                        sale_id: sale_id.clone(),
                        inventory_id: Some(inventory_id.clone()),
                        name: item.name,
                        qty: line.qty,
                        price_cents: line.price_cents.unwrap_or(item.sell_price_cents),
                        buy_price_cents: item.buy_price_cents,
                        category: item.category,
                    }
                }
                None => free_form_line(&sale_id, line)?,
            };
            validation::non_negative("price_cents", resolved.price_cents)?;
            items.push(resolved);
        }

        apply_deltas(&self.db().items(), &mut tx, tenant, &deltas).await?;

        // Discount math in integer cents; percent discounts are basis
        // points of the subtotal. A nominal discount larger than the
        // subtotal is clamped, never a negative total.
        let subtotal: i64 = items.iter().map(|i| i.price_cents * i.qty).sum();
        let discount_amount = match input.discount_type {
            DiscountType::Nominal => input.discount_value.min(subtotal),
            DiscountType::Percent => Money::from_cents(subtotal)
                .percentage(input.discount_value as u32)
                .cents()
                .min(subtotal),
        };
        let total = subtotal - discount_amount;

        let sale = Sale {
            id: sale_id.clone(),
            owner_id: tenant.owner_id.clone(),
            store_id: tenant.store_id.clone(),
            customer_name: input.customer_name,
            customer_id: input.customer_id,
            subtotal_cents: subtotal,
            discount_type: input.discount_type,
            discount_value: input.discount_value,
            discount_amount_cents: discount_amount,
            total_cents: total,
            payment_method: input.payment_method,
            cash_account_id: input.cash_account_id.clone(),
            notes: input.notes,
            created_at: Utc::now(),
        };
        self.db().sales().insert(&mut tx, &sale, &items).await?;

        // Income is booked at the point of sale regardless of payment
        // method; a credit sale additionally opens a receivable to track
        // the money still owed.
        let entry = ledger_entry(
            tenant,
            TransactionKind::Income,
            categories::SALE,
            total,
            format!("Sale to {}", display_party(&sale.customer_name)),
            input.cash_account_id.clone(),
            Some((ReferenceType::Sale, sale_id.clone())),
        );
        self.db().finance().insert(&mut tx, &entry).await?;

        if input.payment_method == PaymentMethod::Credit {
            crate::debt::open_debt(
                self,
                &mut tx,
                tenant,
                DebtKind::Receivable,
                display_party(&sale.customer_name),
                total,
                ReferenceType::Sale,
                &sale_id,
            )
            .await?;
        }

        tx.commit().await?;

        info!(id = %sale.id, total = sale.total_cents, method = ?sale.payment_method, "Sale created");
        Ok((sale, items))
    }

    /// Deletes a sale and replays its effects in reverse: restore the
    /// stock its lines consumed, drop the ledger rows and any debt it
    /// opened, then remove the record.
    pub async fn delete_sale(&self, tenant: &Tenant, id: &str) -> EngineResult<()> {
        let mut tx = self.db().begin().await?;
        let (_, items) = self.db().sales().find_tx(&mut tx, tenant, id).await?;

        let deltas: Vec<StockDelta> = items
            .iter()
            .filter_map(|i| i.inventory_id.as_ref().map(|inv| StockDelta::new(inv.clone(), i.qty)))
            .collect();
        apply_deltas(&self.db().items(), &mut tx, tenant, &deltas).await?;

        self.db()
            .finance()
            .delete_by_reference(&mut tx, tenant, ReferenceType::Sale, id)
            .await?;
        self.db()
            .debts()
            .delete_by_reference(&mut tx, tenant, ReferenceType::Sale, id)
            .await?;
        self.db().sales().delete(&mut tx, tenant, id).await?;
        tx.commit().await?;

        info!(id = %id, "Sale deleted and effects reversed");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetches a sale with its lines.
    pub async fn get_sale(&self, tenant: &Tenant, id: &str) -> EngineResult<(Sale, Vec<SaleItem>)> {
        Ok(self.db().sales().find(tenant, id).await?)
    }

    /// Pages through sales, newest first.
    pub async fn list_sales(
        &self,
        tenant: &Tenant,
        page: u32,
        per_page: u32,
    ) -> EngineResult<Page<Sale>> {
        Ok(self.db().sales().list(tenant, page, per_page).await?)
    }
}

fn free_form_line(sale_id: &str, line: &SaleLineInput) -> EngineResult<SaleItem> {
    let name = match &line.name {
        Some(name) => validation::required_text("name", name)?,
        None => {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            }
            .into())
        }
    };
    let price = line.price_cents.ok_or(ValidationError::Required {
        field: "price_cents".to_string(),
    })?;

    Ok(SaleItem {
        id: new_id(),
        sale_id: sale_id.to_string(),
        inventory_id: None,
        name,
        qty: line.qty,
        price_cents: price,
        buy_price_cents: 0,
        category: String::new(),
    })
}

/// Walk-in customers have no name; the ledger still needs one.
fn display_party(name: &str) -> String {
    if name.trim().is_empty() {
        "customer".to_string()
    } else {
        name.trim().to_string()
    }
}
