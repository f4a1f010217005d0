//! # Service Order Operations
//!
//! The full repair lifecycle: intake (with down payment and stock
//! consumption for parts), wholesale edit with stock replay, status
//! transitions through the state machine, settlement on completion, and
//! reversible deletion.
//!
//! ## Edit Replay
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              update_service_order, inside ONE transaction               │
//! │                                                                         │
//! │   1. restore stock of OLD part lines      (+qty, unchecked)            │
//! │   2. delete old parts                                                  │
//! │   3. apply stock for NEW part lines       (-qty, checked)              │
//! │   4. insert new parts, replace checklists                              │
//! │   5. rewrite the down-payment ledger row from scratch                  │
//! │   6. update the header (status untouched)                              │
//! │                                                                         │
//! │   Replay instead of diffing: one code path accounts for stock,         │
//! │   and the intermediate dip in step 1-3 is invisible outside the        │
//! │   transaction.                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::info;

use crate::error::EngineResult;
use crate::finance::ledger_entry;
use crate::input::{ChecklistItemInput, ServiceOrderInput, ServicePartInput};
use crate::stock::{apply_deltas, StockDelta};
use crate::Engine;
use reparo_core::lifecycle::{categories, check_transition, completion_entries};
use reparo_core::token::generate_token;
use reparo_core::{
    validation, ChecklistEntry, ReferenceType, ServiceOrder, ServicePart, ServiceStatus, Tenant,
    TransactionKind, ValidationError,
};
use reparo_db::repository::new_id;
use reparo_db::repository::service::ServiceDetail;
use reparo_db::{DbError, Page};

/// Token generation attempts before giving up. With 36^6 combinations a
/// collision retry is already rare; five in a row means something else
/// is wrong.
const TOKEN_ATTEMPTS: u32 = 5;

impl Engine {
    /// Creates a service order.
    ///
    /// In one transaction: mint a unique tracking token, consume stock
    /// for inventory-sourced parts, persist the order with its child
    /// collections, and book the down payment as income when present.
    pub async fn create_service(
        &self,
        tenant: &Tenant,
        input: ServiceOrderInput,
    ) -> EngineResult<ServiceDetail> {
        let customer_name = validate_header(&input)?;

        let service_id = new_id();
        let mut tx = self.db().begin().await?;

        let mut token = generate_token();
        let mut attempts = 1;
        while self.db().services().token_exists(&mut tx, &token).await? {
            if attempts >= TOKEN_ATTEMPTS {
                return Err(DbError::duplicate("token", &token).into());
            }
            token = generate_token();
            attempts += 1;
        }

        let (parts, deltas) = self
            .resolve_parts(&mut tx, tenant, &service_id, &input.parts)
            .await?;
        apply_deltas(&self.db().items(), &mut tx, tenant, &deltas).await?;

        let now = Utc::now();
        let order = ServiceOrder {
            id: service_id.clone(),
            owner_id: tenant.owner_id.clone(),
            store_id: tenant.store_id.clone(),
            token,
            customer_name,
            customer_id: input.customer_id,
            phone: input.phone,
            device_model: input.device_model,
            complaint: input.complaint,
            status: ServiceStatus::Received,
            cost_estimate_cents: input.cost_estimate_cents,
            down_payment_cents: input.down_payment_cents,
            service_fee_cents: input.service_fee_cents,
            warranty: input.warranty,
            technician: input.technician,
            payment_status: input.payment_status,
            payment_method: input.payment_method,
            cash_account_id: input.cash_account_id,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };

        self.db().services().insert(&mut tx, &order).await?;
        self.db().services().insert_parts(&mut tx, &parts).await?;
        let qc = checklist_rows(&service_id, &input.qc);
        let completeness = checklist_rows(&service_id, &input.completeness);
        self.db().services().replace_qc(&mut tx, &service_id, &qc).await?;
        self.db()
            .services()
            .replace_completeness(&mut tx, &service_id, &completeness)
            .await?;

        self.book_down_payment(&mut tx, tenant, &order).await?;

        tx.commit().await?;

        info!(id = %order.id, token = %order.token, "Service order created");
        Ok(ServiceDetail {
            order,
            parts,
            qc,
            completeness,
        })
    }

    /// Replaces a service order's header fields and child collections.
    ///
    /// Status never changes here; terminal orders reject edits outright
    /// because their settlement is already on the ledger.
    pub async fn update_service_order(
        &self,
        tenant: &Tenant,
        id: &str,
        input: ServiceOrderInput,
    ) -> EngineResult<ServiceDetail> {
        let customer_name = validate_header(&input)?;

        let mut tx = self.db().begin().await?;
        let mut order = self.db().services().find_tx(&mut tx, tenant, id).await?;

        if order.status.is_terminal() {
            return Err(ValidationError::OrderClosed {
                status: order.status,
            }
            .into());
        }

        // Stock replay: restore the old lines, then burn the new ones.
        let old_parts = self.db().services().parts_tx(&mut tx, id).await?;
        let restore: Vec<StockDelta> = old_parts
            .iter()
            .filter_map(|p| {
                p.inventory_id
                    .as_ref()
                    .map(|inv| StockDelta::new(inv.clone(), p.qty))
            })
            .collect();
        apply_deltas(&self.db().items(), &mut tx, tenant, &restore).await?;
        self.db().services().delete_parts(&mut tx, id).await?;

        let (parts, deltas) = self.resolve_parts(&mut tx, tenant, id, &input.parts).await?;
        apply_deltas(&self.db().items(), &mut tx, tenant, &deltas).await?;
        self.db().services().insert_parts(&mut tx, &parts).await?;

        let qc = checklist_rows(id, &input.qc);
        let completeness = checklist_rows(id, &input.completeness);
        self.db().services().replace_qc(&mut tx, id, &qc).await?;
        self.db()
            .services()
            .replace_completeness(&mut tx, id, &completeness)
            .await?;

        order.customer_name = customer_name;
        order.customer_id = input.customer_id;
        order.phone = input.phone;
        order.device_model = input.device_model;
        order.complaint = input.complaint;
        order.cost_estimate_cents = input.cost_estimate_cents;
        order.down_payment_cents = input.down_payment_cents;
        order.service_fee_cents = input.service_fee_cents;
        order.warranty = input.warranty;
        order.technician = input.technician;
        order.payment_status = input.payment_status;
        order.payment_method = input.payment_method;
        order.cash_account_id = input.cash_account_id;
        order.notes = input.notes;
        order.updated_at = Utc::now();
        self.db().services().update_header(&mut tx, &order).await?;

        // Ledger replay: a non-terminal order's only ledger row is the
        // down payment, so drop-and-rewrite keeps it in sync with
        // whatever the edit did to the amount.
        self.db()
            .finance()
            .delete_by_reference(&mut tx, tenant, ReferenceType::Service, id)
            .await?;
        self.book_down_payment(&mut tx, tenant, &order).await?;

        tx.commit().await?;

        info!(id = %id, "Service order updated");
        Ok(ServiceDetail {
            order,
            parts,
            qc,
            completeness,
        })
    }

    /// Moves a service order to a new status.
    ///
    /// Completion is the transition with teeth: the settlement entries
    /// derived from the order land on the ledger in the same transaction
    /// that flips the status. Completed being terminal guarantees they
    /// land exactly once.
    pub async fn transition_service_status(
        &self,
        tenant: &Tenant,
        id: &str,
        to: ServiceStatus,
    ) -> EngineResult<ServiceOrder> {
        let mut tx = self.db().begin().await?;
        let mut order = self.db().services().find_tx(&mut tx, tenant, id).await?;

        check_transition(order.status, to)?;
        self.db().services().update_status(&mut tx, tenant, id, to).await?;

        if to == ServiceStatus::Completed {
            let parts = self.db().services().parts_tx(&mut tx, id).await?;
            for line in completion_entries(&order, &parts) {
                let entry = ledger_entry(
                    tenant,
                    line.kind,
                    line.category,
                    line.amount_cents,
                    line.description,
                    order.cash_account_id.clone(),
                    Some((ReferenceType::Service, id.to_string())),
                );
                self.db().finance().insert(&mut tx, &entry).await?;
            }
        }

        tx.commit().await?;

        info!(id = %id, from = ?order.status, to = ?to, "Service status changed");
        order.status = to;
        order.updated_at = Utc::now();
        Ok(order)
    }

    /// Deletes a service order and reverses its effects: parts go back
    /// to stock, and every ledger row the order produced (down payment
    /// AND settlement) is removed.
    pub async fn delete_service(&self, tenant: &Tenant, id: &str) -> EngineResult<()> {
        let mut tx = self.db().begin().await?;
        self.db().services().find_tx(&mut tx, tenant, id).await?;

        let parts = self.db().services().parts_tx(&mut tx, id).await?;
        let restore: Vec<StockDelta> = parts
            .iter()
            .filter_map(|p| {
                p.inventory_id
                    .as_ref()
                    .map(|inv| StockDelta::new(inv.clone(), p.qty))
            })
            .collect();
        apply_deltas(&self.db().items(), &mut tx, tenant, &restore).await?;

        self.db()
            .finance()
            .delete_by_reference(&mut tx, tenant, ReferenceType::Service, id)
            .await?;
        self.db().services().delete(&mut tx, tenant, id).await?;
        tx.commit().await?;

        info!(id = %id, "Service order deleted and effects reversed");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetches a service order with all child collections.
    pub async fn get_service(&self, tenant: &Tenant, id: &str) -> EngineResult<ServiceDetail> {
        Ok(self.db().services().find(tenant, id).await?)
    }

    /// Public tracking lookup by token. Not tenant-scoped: the token IS
    /// the credential.
    pub async fn find_service_by_token(&self, token: &str) -> EngineResult<ServiceDetail> {
        Ok(self.db().services().find_by_token(token.trim()).await?)
    }

    /// Pages through service orders with optional status filter and
    /// customer/device/token search.
    pub async fn list_services(
        &self,
        tenant: &Tenant,
        status: Option<ServiceStatus>,
        search: Option<&str>,
        page: u32,
        per_page: u32,
    ) -> EngineResult<Page<ServiceOrder>> {
        Ok(self
            .db()
            .services()
            .list(tenant, status, search, page, per_page)
            .await?)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Turns part inputs into persisted rows plus their stock deltas.
    ///
    /// Inventory-sourced parts snapshot the catalog prices (overridable)
    /// and consume stock; outside parts need a name and move nothing.
    async fn resolve_parts(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        service_id: &str,
        inputs: &[ServicePartInput],
    ) -> EngineResult<(Vec<ServicePart>, Vec<StockDelta>)> {
        let mut parts = Vec::with_capacity(inputs.len());
        let mut deltas = Vec::new();

        for part in inputs {
            validation::line_qty(part.qty)?;

            let resolved = match &part.inventory_id {
                Some(inventory_id) => {
                    let item = self.db().items().find_tx(&mut *conn, tenant, inventory_id).await?;
                    deltas.push(StockDelta::new(inventory_id.clone(), -part.qty));
                    ServicePart {
                        id: new_id(),
                        service_id: service_id.to_string(),
                        inventory_id: Some(inventory_id.clone()),
                        name: part.name.clone().unwrap_or(item.name),
                        qty: part.qty,
                        buy_price_cents: part.buy_price_cents.unwrap_or(item.buy_price_cents),
                        sell_price_cents: part.sell_price_cents.unwrap_or(item.sell_price_cents),
                    }
                }
                None => {
                    let name = match &part.name {
                        Some(name) => validation::required_text("name", name)?,
                        None => {
                            return Err(ValidationError::Required {
                                field: "name".to_string(),
                            }
                            .into())
                        }
                    };
                    ServicePart {
                        id: new_id(),
                        service_id: service_id.to_string(),
                        inventory_id: None,
                        name,
                        qty: part.qty,
                        buy_price_cents: part.buy_price_cents.unwrap_or(0),
                        sell_price_cents: part.sell_price_cents.unwrap_or(0),
                    }
                }
            };
            validation::non_negative("buy_price_cents", resolved.buy_price_cents)?;
            validation::non_negative("sell_price_cents", resolved.sell_price_cents)?;
            parts.push(resolved);
        }

        Ok((parts, deltas))
    }

    /// Books the intake down payment as income, when there is one.
    async fn book_down_payment(
        &self,
        conn: &mut SqliteConnection,
        tenant: &Tenant,
        order: &ServiceOrder,
    ) -> EngineResult<()> {
        if order.down_payment_cents > 0 {
            let entry = ledger_entry(
                tenant,
                TransactionKind::Income,
                categories::SERVICE_DOWN_PAYMENT,
                order.down_payment_cents,
                format!("Down payment for service {}", order.token),
                order.cash_account_id.clone(),
                Some((ReferenceType::Service, order.id.clone())),
            );
            self.db().finance().insert(conn, &entry).await?;
        }
        Ok(())
    }
}

fn validate_header(input: &ServiceOrderInput) -> EngineResult<String> {
    let customer_name = validation::required_text("customer_name", &input.customer_name)?;
    validation::non_negative("cost_estimate_cents", input.cost_estimate_cents)?;
    validation::non_negative("down_payment_cents", input.down_payment_cents)?;
    validation::non_negative("service_fee_cents", input.service_fee_cents)?;
    Ok(customer_name)
}

fn checklist_rows(service_id: &str, inputs: &[ChecklistItemInput]) -> Vec<ChecklistEntry> {
    inputs
        .iter()
        .map(|c| ChecklistEntry {
            id: new_id(),
            service_id: service_id.to_string(),
            name: c.name.clone(),
            checked: c.checked,
        })
        .collect()
}
