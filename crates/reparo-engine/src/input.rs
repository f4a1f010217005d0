//! # Input DTOs
//!
//! The shapes callers hand to mutating operations. Deliberately separate
//! from the stored entities: inputs carry only what the caller decides,
//! everything derived (ids, totals, snapshots, timestamps) is filled in
//! by the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reparo_core::{DebtKind, DiscountType, PaymentMethod, PaymentStatus, ReturnKind};

// =============================================================================
// Sales
// =============================================================================

/// One line of a sale.
///
/// With `inventory_id` set, name and prices are snapshotted from the item
/// and stock is decremented; `price_cents` may override the catalog sell
/// price (haggling happens). Without it, the line is a free-form charge:
/// `name` and `price_cents` are required and no stock moves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleLineInput {
    pub inventory_id: Option<String>,
    pub name: Option<String>,
    pub qty: i64,
    pub price_cents: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSaleInput {
    #[serde(default)]
    pub customer_name: String,
    pub customer_id: Option<String>,
    pub discount_type: DiscountType,
    /// Cents for nominal discounts, basis points for percent discounts.
    #[serde(default)]
    pub discount_value: i64,
    pub payment_method: PaymentMethod,
    pub cash_account_id: Option<String>,
    #[serde(default)]
    pub notes: String,
    pub items: Vec<SaleLineInput>,
}

// =============================================================================
// Purchases
// =============================================================================

/// One line of a purchase. Purchases always land in inventory, so the
/// item reference is mandatory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseLineInput {
    pub inventory_id: String,
    pub qty: i64,
    pub buy_price_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePurchaseInput {
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub supplier_name: String,
    pub payment_method: PaymentMethod,
    pub cash_account_id: Option<String>,
    #[serde(default)]
    pub notes: String,
    pub items: Vec<PurchaseLineInput>,
}

// =============================================================================
// Returns
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnLineInput {
    pub inventory_id: Option<String>,
    pub name: Option<String>,
    pub qty: i64,
    pub price_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReturnInput {
    pub kind: ReturnKind,
    /// The sale/purchase this reverses, when known.
    pub parent_id: Option<String>,
    #[serde(default)]
    pub reason: String,
    /// Extra cash handed over on top of the goods value.
    #[serde(default)]
    pub compensation_cents: i64,
    pub cash_account_id: Option<String>,
    pub items: Vec<ReturnLineInput>,
}

// =============================================================================
// Service Orders
// =============================================================================

/// One part line of a service order.
///
/// With `inventory_id`, name and prices default to snapshots from the
/// item (overridable); without it, the part came from outside inventory
/// and `name` plus both prices must be supplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicePartInput {
    pub inventory_id: Option<String>,
    pub name: Option<String>,
    pub qty: i64,
    pub buy_price_cents: Option<i64>,
    pub sell_price_cents: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChecklistItemInput {
    pub name: String,
    #[serde(default)]
    pub checked: bool,
}

/// Full service-order payload, used for both create and update. Updates
/// replace the header fields and all child collections wholesale; status
/// is NOT here — it only moves through the transition operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOrderInput {
    pub customer_name: String,
    pub customer_id: Option<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub device_model: String,
    #[serde(default)]
    pub complaint: String,
    #[serde(default)]
    pub cost_estimate_cents: i64,
    #[serde(default)]
    pub down_payment_cents: i64,
    #[serde(default)]
    pub service_fee_cents: i64,
    #[serde(default)]
    pub warranty: String,
    #[serde(default)]
    pub technician: String,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub cash_account_id: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub parts: Vec<ServicePartInput>,
    #[serde(default)]
    pub qc: Vec<ChecklistItemInput>,
    #[serde(default)]
    pub completeness: Vec<ChecklistItemInput>,
}

// =============================================================================
// Debts
// =============================================================================

/// A manually-opened debt (one not created by a credit sale/purchase).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDebtInput {
    pub kind: DebtKind,
    pub party_name: String,
    pub amount_cents: i64,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayDebtInput {
    pub amount_cents: i64,
    pub cash_account_id: Option<String>,
    #[serde(default)]
    pub notes: String,
}

// =============================================================================
// Inventory
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemInput {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    /// Opening stock; ignored on update (stock moves via deltas/opname).
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub min_stock: i64,
    #[serde(default)]
    pub buy_price_cents: i64,
    #[serde(default)]
    pub sell_price_cents: i64,
}

/// A manual stock count (opname): stock is SET to the counted value and
/// the difference is recorded in the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockOpnameInput {
    pub item_id: String,
    pub counted_stock: i64,
    #[serde(default)]
    pub notes: String,
}

// =============================================================================
// Finance
// =============================================================================

/// A manual operational expense (rent, utilities, wages).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationalExpenseInput {
    /// Defaults to "Operational" when empty.
    #[serde(default)]
    pub category: String,
    pub amount_cents: i64,
    #[serde(default)]
    pub description: String,
    pub cash_account_id: Option<String>,
    /// Business date; defaults to now.
    pub date: Option<DateTime<Utc>>,
}
