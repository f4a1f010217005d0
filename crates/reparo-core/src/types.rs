//! # Core Domain Types
//!
//! All domain entities for the repair-shop engine. These types mirror the
//! SQLite schema one-to-one and double as the rows the storage layer reads
//! back (`FromRow` behind the `sqlx` feature) and as JSON transfer objects
//! (serde on everything).
//!
//! ## Conventions
//! - IDs are TEXT UUIDs generated in Rust, never by the database
//! - Monetary fields are integer cents, suffixed `_cents`
//! - Enum columns serialize as snake_case strings on both the wire and disk
//! - Every tenant-owned entity carries `owner_id` plus an optional
//!   `store_id` partition (a filter, not an ownership boundary)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Tenant Scope
// =============================================================================

/// Identifies whose data an operation touches.
///
/// `owner_id` is the hard isolation boundary: every query is scoped by it
/// and crossing it is impossible by construction. `store_id` narrows reads
/// within an owner but never widens them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub owner_id: String,
    pub store_id: Option<String>,
}

impl Tenant {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Tenant {
            owner_id: owner_id.into(),
            store_id: None,
        }
    }

    pub fn with_store(owner_id: impl Into<String>, store_id: impl Into<String>) -> Self {
        Tenant {
            owner_id: owner_id.into(),
            store_id: Some(store_id.into()),
        }
    }
}

// =============================================================================
// Status Enums
// =============================================================================

/// Service order lifecycle status.
///
/// The full transition rules live in [`crate::lifecycle`]; the enum itself
/// only knows which states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
pub enum ServiceStatus {
    Received,
    Diagnosing,
    AwaitingParts,
    Completed,
    Cancelled,
}

/// How much of the service bill the customer has paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
pub enum PaymentStatus {
    Paid,
    PartiallyPaid,
    Unpaid,
}

/// Payment method for sales and purchases.
///
/// `Credit` is the interesting one: the cash ledger entry is still
/// booked, and a debt is opened on top to track the outstanding balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Credit,
}

/// Sale discount semantics: a fixed amount or a percentage of the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
pub enum DiscountType {
    /// `discount_value` is cents, applied directly.
    Nominal,
    /// `discount_value` is basis points of the subtotal (1000 = 10%).
    Percent,
}

/// Which way a return flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
pub enum ReturnKind {
    /// Customer brings goods back: stock up, income reversed.
    Sale,
    /// Goods go back to a supplier: stock down, expense reversed.
    Purchase,
}

/// Financial ledger entry classification.
///
/// `Income`/`Expense` track cash movement; `Profit`/`Loss` track margin.
/// The two axes are recorded independently so the summary can report both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
pub enum TransactionKind {
    Income,
    Expense,
    Profit,
    Loss,
}

/// Debt direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
pub enum DebtKind {
    /// We owe money (credit purchase).
    Payable,
    /// Money is owed to us (credit sale).
    Receivable,
}

/// Debt settlement state, recomputed from the payment trail on every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
pub enum DebtStatus {
    Outstanding,
    Settled,
}

/// What a ledger row or debt points back at.
///
/// Used for cleanup during edit/delete replay: "remove every ledger entry
/// referencing sale X" is a single indexed delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
pub enum ReferenceType {
    Sale,
    Purchase,
    Service,
    Debt,
    SaleReturn,
    PurchaseReturn,
}

// =============================================================================
// Inventory
// =============================================================================

/// A stocked item. `stock` is the single source of truth for on-hand
/// quantity and is only ever changed via relative deltas (or an explicit
/// stock-opname set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryItem {
    pub id: String,
    pub owner_id: String,
    pub store_id: Option<String>,
    pub name: String,
    pub category: String,
    pub brand: String,
    pub stock: i64,
    pub min_stock: i64,
    pub buy_price_cents: i64,
    pub sell_price_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// An item is low on stock when at or below its configured threshold.
    /// A threshold of zero means no threshold at all.
    pub fn is_low_stock(&self) -> bool {
        self.min_stock > 0 && self.stock <= self.min_stock
    }
}

/// One immutable audit row per manual stock count (stock opname).
///
/// `item_id` goes `None` when the counted item is later deleted; the row
/// itself is never removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockOpnameEntry {
    pub id: String,
    pub owner_id: String,
    pub store_id: Option<String>,
    pub item_id: Option<String>,
    pub item_name: String,
    pub old_stock: i64,
    pub new_stock: i64,
    pub difference: i64,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Service Orders
// =============================================================================

/// A repair job from intake to hand-back.
///
/// The money fields interact at completion time:
/// - `cost_estimate_cents` minus `down_payment_cents` is the final bill
/// - `service_fee_cents` feeds the margin entries
/// See [`crate::lifecycle::completion_entries`] for the exact derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ServiceOrder {
    pub id: String,
    pub owner_id: String,
    pub store_id: Option<String>,
    /// Public tracking token customers use to check progress.
    pub token: String,
    pub customer_name: String,
    pub customer_id: Option<String>,
    pub phone: String,
    pub device_model: String,
    pub complaint: String,
    pub status: ServiceStatus,
    pub cost_estimate_cents: i64,
    pub down_payment_cents: i64,
    pub service_fee_cents: i64,
    pub warranty: String,
    pub technician: String,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub cash_account_id: Option<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A part consumed by a service order. Prices are snapshots taken when the
/// part was attached, so later catalog edits cannot rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ServicePart {
    pub id: String,
    pub service_id: String,
    /// None for parts sourced outside the inventory (no stock movement).
    pub inventory_id: Option<String>,
    pub name: String,
    pub qty: i64,
    pub buy_price_cents: i64,
    pub sell_price_cents: i64,
}

impl ServicePart {
    pub fn buy_total_cents(&self) -> i64 {
        self.buy_price_cents * self.qty
    }

    pub fn sell_total_cents(&self) -> i64 {
        self.sell_price_cents * self.qty
    }
}

/// A QC or completeness checklist line. Opaque pass-through data; the
/// engine stores and returns it without interpreting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ChecklistEntry {
    pub id: String,
    pub service_id: String,
    pub name: String,
    pub checked: bool,
}

// =============================================================================
// Sales
// =============================================================================

/// A completed point-of-sale transaction (header).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub owner_id: String,
    pub store_id: Option<String>,
    pub customer_name: String,
    pub customer_id: Option<String>,
    pub subtotal_cents: i64,
    pub discount_type: DiscountType,
    /// Cents for nominal discounts, basis points for percent discounts.
    pub discount_value: i64,
    pub discount_amount_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub cash_account_id: Option<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// One sold line. `buy_price_cents` is snapshotted for margin reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub inventory_id: Option<String>,
    pub name: String,
    pub qty: i64,
    pub price_cents: i64,
    pub buy_price_cents: i64,
    pub category: String,
}

// =============================================================================
// Purchases
// =============================================================================

/// A stock purchase from a supplier (header).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Purchase {
    pub id: String,
    pub owner_id: String,
    pub store_id: Option<String>,
    pub supplier_id: Option<String>,
    pub supplier_name: String,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub cash_account_id: Option<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseItem {
    pub id: String,
    pub purchase_id: String,
    pub inventory_id: Option<String>,
    pub name: String,
    pub qty: i64,
    pub buy_price_cents: i64,
}

// =============================================================================
// Returns
// =============================================================================

/// A return in either direction; `kind` discriminates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Return {
    pub id: String,
    pub owner_id: String,
    pub store_id: Option<String>,
    pub kind: ReturnKind,
    /// The originating sale/purchase, if the return is linked to one.
    pub parent_id: Option<String>,
    pub total_cents: i64,
    pub reason: String,
    /// Extra cash compensation on top of reversing the goods value.
    pub compensation_cents: i64,
    pub cash_account_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReturnItem {
    pub id: String,
    pub return_id: String,
    pub inventory_id: Option<String>,
    pub name: String,
    pub qty: i64,
    pub price_cents: i64,
}

// =============================================================================
// Financial Ledger
// =============================================================================

/// One immutable ledger row. Amounts are always non-negative; direction
/// lives in `kind`. `reference_type`/`reference_id` point back at the
/// business record that produced the row so edits can clean up after
/// themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FinancialTransaction {
    pub id: String,
    pub owner_id: String,
    pub store_id: Option<String>,
    pub kind: TransactionKind,
    pub category: String,
    pub amount_cents: i64,
    pub description: String,
    pub cash_account_id: Option<String>,
    pub reference_type: Option<ReferenceType>,
    pub reference_id: Option<String>,
    /// Business date of the entry (may differ from `created_at`).
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Aggregated ledger totals for a tenant (optionally date-bounded).
///
/// Net position is `income - expense + profit - loss`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinanceSummary {
    pub income_cents: i64,
    pub expense_cents: i64,
    pub profit_cents: i64,
    pub loss_cents: i64,
}

impl FinanceSummary {
    pub fn net_cents(&self) -> i64 {
        self.income_cents - self.expense_cents + self.profit_cents - self.loss_cents
    }
}

// =============================================================================
// Debts
// =============================================================================

/// A payable or receivable. `paid_cents`, `remaining_cents` and `status`
/// are derived from the payment trail and recomputed on every payment,
/// never adjusted incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Debt {
    pub id: String,
    pub owner_id: String,
    pub store_id: Option<String>,
    pub kind: DebtKind,
    pub party_name: String,
    pub amount_cents: i64,
    pub paid_cents: i64,
    pub remaining_cents: i64,
    pub status: DebtStatus,
    pub reference_type: Option<ReferenceType>,
    pub reference_id: Option<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DebtPayment {
    pub id: String,
    pub debt_id: String,
    pub amount_cents: i64,
    pub cash_account_id: Option<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_serialization() {
        // snake_case on the wire, matching the SQL CHECK constraints
        assert_eq!(
            serde_json::to_string(&ServiceStatus::AwaitingParts).unwrap(),
            "\"awaiting_parts\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::PartiallyPaid).unwrap(),
            "\"partially_paid\""
        );
        assert_eq!(
            serde_json::to_string(&ReferenceType::SaleReturn).unwrap(),
            "\"sale_return\""
        );
    }

    #[test]
    fn test_enum_deserialization() {
        let status: ServiceStatus = serde_json::from_str("\"received\"").unwrap();
        assert_eq!(status, ServiceStatus::Received);

        let kind: DebtKind = serde_json::from_str("\"payable\"").unwrap();
        assert_eq!(kind, DebtKind::Payable);
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        let mut item = InventoryItem {
            id: "i1".into(),
            owner_id: "o1".into(),
            store_id: None,
            name: "LCD Panel".into(),
            category: "Parts".into(),
            brand: "".into(),
            stock: 5,
            min_stock: 5,
            buy_price_cents: 100_000,
            sell_price_cents: 150_000,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(item.is_low_stock());

        item.stock = 6;
        assert!(!item.is_low_stock());

        // a zero threshold disables the flag entirely
        item.stock = 0;
        item.min_stock = 0;
        assert!(!item.is_low_stock());
    }

    #[test]
    fn test_service_part_totals() {
        let part = ServicePart {
            id: "p1".into(),
            service_id: "s1".into(),
            inventory_id: Some("i1".into()),
            name: "Battery".into(),
            qty: 2,
            buy_price_cents: 10_000,
            sell_price_cents: 15_000,
        };
        assert_eq!(part.buy_total_cents(), 20_000);
        assert_eq!(part.sell_total_cents(), 30_000);
    }

    #[test]
    fn test_finance_summary_net() {
        let summary = FinanceSummary {
            income_cents: 50_000,
            expense_cents: 20_000,
            profit_cents: 10_000,
            loss_cents: 5_000,
        };
        assert_eq!(summary.net_cents(), 35_000);
    }

    #[test]
    fn test_tenant_constructors() {
        let t = Tenant::new("owner-1");
        assert_eq!(t.owner_id, "owner-1");
        assert!(t.store_id.is_none());

        let t = Tenant::with_store("owner-1", "store-a");
        assert_eq!(t.store_id.as_deref(), Some("store-a"));
    }
}
