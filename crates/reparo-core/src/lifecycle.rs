//! # Service Lifecycle
//!
//! The service-order state machine and the settlement entries derived when
//! an order completes.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                                                                     │
//! │   Received ──▶ Diagnosing ──▶ AwaitingParts ──▶ Completed ✦        │
//! │       │             │               │                               │
//! │       │   (forward skips allowed:   │                               │
//! │       └──▶ Received → Completed is fine)                            │
//! │       │             │               │                               │
//! │       ▼             ▼               ▼                               │
//! │                 Cancelled ✦                                         │
//! │                                                                     │
//! │   ✦ = terminal: no transitions out, ever                           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Backward moves are rejected: the progression is a customer-visible
//! promise, and the financial side effects of completion must fire exactly
//! once. Completed being terminal is what makes settlement idempotent.

use crate::error::InvalidTransition;
use crate::types::{PaymentStatus, ServiceOrder, ServicePart, ServiceStatus, TransactionKind};

// =============================================================================
// Ledger Categories
// =============================================================================

/// Well-known ledger entry categories.
///
/// These strings are part of the stored data. Reports group by them, so
/// they are constants here rather than ad-hoc literals in orchestrators.
pub mod categories {
    pub const SERVICE_DOWN_PAYMENT: &str = "Service Down Payment";
    pub const FINAL_SETTLEMENT: &str = "Final Settlement";
    pub const PARTS_COST: &str = "Parts Cost";
    pub const SPAREPART_MARGIN: &str = "Sparepart Margin";
    pub const SPAREPART_LOSS: &str = "Sparepart Loss";
    pub const SERVICE_MARGIN: &str = "Service Margin";

    pub const SALE: &str = "Sale";
    pub const PURCHASE: &str = "Purchase";

    pub const SALE_RETURN: &str = "Sale Return";
    pub const SALE_RETURN_COMPENSATION: &str = "Sale Return Compensation";
    pub const PURCHASE_RETURN: &str = "Purchase Return";
    pub const PURCHASE_RETURN_COMPENSATION: &str = "Purchase Return Compensation";

    pub const DEBT_PAYMENT: &str = "Debt Payment";
    pub const RECEIVABLE_PAYMENT: &str = "Receivable Payment";
    pub const OPERATIONAL: &str = "Operational";
}

// =============================================================================
// State Machine
// =============================================================================

impl ServiceStatus {
    /// Position in the forward progression. `Cancelled` sits outside it.
    fn rank(self) -> Option<u8> {
        match self {
            ServiceStatus::Received => Some(0),
            ServiceStatus::Diagnosing => Some(1),
            ServiceStatus::AwaitingParts => Some(2),
            ServiceStatus::Completed => Some(3),
            ServiceStatus::Cancelled => None,
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, ServiceStatus::Completed | ServiceStatus::Cancelled)
    }

    /// Whether the state machine permits moving from `self` to `to`.
    ///
    /// Rules:
    /// - terminal states go nowhere (including to themselves)
    /// - self-transitions are rejected (they would re-fire side effects)
    /// - `Cancelled` is reachable from any non-terminal state
    /// - otherwise only strictly-forward moves, skips allowed
    pub fn can_transition_to(self, to: ServiceStatus) -> bool {
        if self.is_terminal() || self == to {
            return false;
        }
        if to == ServiceStatus::Cancelled {
            return true;
        }
        match (self.rank(), to.rank()) {
            (Some(from_rank), Some(to_rank)) => to_rank > from_rank,
            _ => false,
        }
    }
}

/// Checks a proposed transition, returning the typed error on rejection.
pub fn check_transition(
    from: ServiceStatus,
    to: ServiceStatus,
) -> Result<(), InvalidTransition> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(InvalidTransition { from, to })
    }
}

// =============================================================================
// Completion Settlement
// =============================================================================

/// One financial entry the completion of a service order produces.
///
/// A pure description; the orchestrator turns each line into a ledger row
/// inside the completion transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerLine {
    pub kind: TransactionKind,
    pub category: &'static str,
    pub amount_cents: i64,
    pub description: String,
}

/// Derives the settlement entries for a completing service order.
///
/// Deterministic: same order + parts always yields the same lines, in the
/// same sequence. The derivation is:
///
/// 1. **Final settlement income**: `cost_estimate - down_payment`, recorded
///    only when positive and the order is not marked unpaid. The down
///    payment was already booked at intake; this is the remainder.
/// 2. **Parts cost expense**: total buy value of consumed parts, when any.
/// 3. **Parts margin**: `sell - buy` over all parts. Positive → profit,
///    negative → loss (absolute value), zero → no entry.
/// 4. **Service margin profit**: `service_fee - parts_sell`, recorded only
///    when strictly positive. A fee that does not clear the parts' sell
///    value produces no entry; the shortfall already shows up in the parts
///    figures and double-booking it as a loss would overstate it.
pub fn completion_entries(order: &ServiceOrder, parts: &[ServicePart]) -> Vec<LedgerLine> {
    let parts_buy: i64 = parts.iter().map(ServicePart::buy_total_cents).sum();
    let parts_sell: i64 = parts.iter().map(ServicePart::sell_total_cents).sum();

    let mut lines = Vec::new();

    let final_due = order.cost_estimate_cents - order.down_payment_cents;
    if final_due > 0 && order.payment_status != PaymentStatus::Unpaid {
        lines.push(LedgerLine {
            kind: TransactionKind::Income,
            category: categories::FINAL_SETTLEMENT,
            amount_cents: final_due,
            description: format!("Final settlement for service {}", order.token),
        });
    }

    if parts_buy > 0 {
        lines.push(LedgerLine {
            kind: TransactionKind::Expense,
            category: categories::PARTS_COST,
            amount_cents: parts_buy,
            description: format!("Parts cost for service {}", order.token),
        });
    }

    let parts_margin = parts_sell - parts_buy;
    if parts_margin > 0 {
        lines.push(LedgerLine {
            kind: TransactionKind::Profit,
            category: categories::SPAREPART_MARGIN,
            amount_cents: parts_margin,
            description: format!("Sparepart margin for service {}", order.token),
        });
    } else if parts_margin < 0 {
        lines.push(LedgerLine {
            kind: TransactionKind::Loss,
            category: categories::SPAREPART_LOSS,
            amount_cents: -parts_margin,
            description: format!("Sparepart loss for service {}", order.token),
        });
    }

    let service_margin = order.service_fee_cents - parts_sell;
    if service_margin > 0 {
        lines.push(LedgerLine {
            kind: TransactionKind::Profit,
            category: categories::SERVICE_MARGIN,
            amount_cents: service_margin,
            description: format!("Service margin for service {}", order.token),
        });
    }

    lines
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn order(
        status: ServiceStatus,
        estimate: i64,
        down_payment: i64,
        fee: i64,
        payment_status: PaymentStatus,
    ) -> ServiceOrder {
        ServiceOrder {
            id: "s1".into(),
            owner_id: "o1".into(),
            store_id: None,
            token: "AB12CD".into(),
            customer_name: "Budi".into(),
            customer_id: None,
            phone: "".into(),
            device_model: "Phone X".into(),
            complaint: "cracked screen".into(),
            status,
            cost_estimate_cents: estimate,
            down_payment_cents: down_payment,
            service_fee_cents: fee,
            warranty: "".into(),
            technician: "".into(),
            payment_status,
            payment_method: None,
            cash_account_id: None,
            notes: "".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn part(qty: i64, buy: i64, sell: i64) -> ServicePart {
        ServicePart {
            id: "p1".into(),
            service_id: "s1".into(),
            inventory_id: Some("i1".into()),
            name: "Part".into(),
            qty,
            buy_price_cents: buy,
            sell_price_cents: sell,
        }
    }

    // ------------------------------------------------------------------
    // State machine
    // ------------------------------------------------------------------

    #[test]
    fn test_forward_transitions_allowed() {
        use ServiceStatus::*;
        assert!(Received.can_transition_to(Diagnosing));
        assert!(Diagnosing.can_transition_to(AwaitingParts));
        assert!(AwaitingParts.can_transition_to(Completed));
        // skips
        assert!(Received.can_transition_to(Completed));
        assert!(Received.can_transition_to(AwaitingParts));
        assert!(Diagnosing.can_transition_to(Completed));
    }

    #[test]
    fn test_backward_transitions_rejected() {
        use ServiceStatus::*;
        assert!(!Diagnosing.can_transition_to(Received));
        assert!(!Completed.can_transition_to(AwaitingParts));
        assert!(!AwaitingParts.can_transition_to(Diagnosing));
    }

    #[test]
    fn test_self_transitions_rejected() {
        use ServiceStatus::*;
        for status in [Received, Diagnosing, AwaitingParts, Completed, Cancelled] {
            assert!(!status.can_transition_to(status), "{status:?} -> {status:?}");
        }
    }

    #[test]
    fn test_cancel_from_any_non_terminal() {
        use ServiceStatus::*;
        assert!(Received.can_transition_to(Cancelled));
        assert!(Diagnosing.can_transition_to(Cancelled));
        assert!(AwaitingParts.can_transition_to(Cancelled));
        // terminal states stay terminal
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Received));
        assert!(!Cancelled.can_transition_to(Completed));
    }

    #[test]
    fn test_check_transition_error_carries_states() {
        let err = check_transition(ServiceStatus::Completed, ServiceStatus::Diagnosing)
            .unwrap_err();
        assert_eq!(err.from, ServiceStatus::Completed);
        assert_eq!(err.to, ServiceStatus::Diagnosing);
    }

    // ------------------------------------------------------------------
    // Completion settlement
    // ------------------------------------------------------------------

    #[test]
    fn test_completion_full_scenario() {
        // fee 50000, parts bought 20000 sold 30000, no remaining bill
        let order = order(
            ServiceStatus::AwaitingParts,
            0,
            0,
            50_000,
            PaymentStatus::Paid,
        );
        let parts = vec![part(2, 10_000, 15_000)];

        let lines = completion_entries(&order, &parts);
        assert_eq!(lines.len(), 3);

        assert_eq!(lines[0].kind, TransactionKind::Expense);
        assert_eq!(lines[0].category, categories::PARTS_COST);
        assert_eq!(lines[0].amount_cents, 20_000);

        assert_eq!(lines[1].kind, TransactionKind::Profit);
        assert_eq!(lines[1].category, categories::SPAREPART_MARGIN);
        assert_eq!(lines[1].amount_cents, 10_000);

        assert_eq!(lines[2].kind, TransactionKind::Profit);
        assert_eq!(lines[2].category, categories::SERVICE_MARGIN);
        assert_eq!(lines[2].amount_cents, 20_000);
    }

    #[test]
    fn test_completion_final_settlement_when_paid() {
        // estimate 80000, DP 30000 → 50000 remaining income
        let order = order(
            ServiceStatus::Diagnosing,
            80_000,
            30_000,
            0,
            PaymentStatus::Paid,
        );
        let lines = completion_entries(&order, &[]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].kind, TransactionKind::Income);
        assert_eq!(lines[0].category, categories::FINAL_SETTLEMENT);
        assert_eq!(lines[0].amount_cents, 50_000);
    }

    #[test]
    fn test_completion_no_settlement_when_unpaid() {
        let order = order(
            ServiceStatus::Diagnosing,
            80_000,
            30_000,
            0,
            PaymentStatus::Unpaid,
        );
        let lines = completion_entries(&order, &[]);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_completion_sparepart_loss() {
        // sold below cost: buy 20000, sell 12000 → loss 8000
        let order = order(ServiceStatus::Received, 0, 0, 0, PaymentStatus::Paid);
        let parts = vec![part(1, 20_000, 12_000)];
        let lines = completion_entries(&order, &parts);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].category, categories::PARTS_COST);
        assert_eq!(lines[1].kind, TransactionKind::Loss);
        assert_eq!(lines[1].category, categories::SPAREPART_LOSS);
        assert_eq!(lines[1].amount_cents, 8_000);
    }

    #[test]
    fn test_completion_no_service_margin_when_fee_below_parts_sell() {
        // fee 10000 < parts sell 30000: no service-margin entry, no loss
        let order = order(ServiceStatus::Received, 0, 0, 10_000, PaymentStatus::Paid);
        let parts = vec![part(2, 10_000, 15_000)];
        let lines = completion_entries(&order, &parts);

        assert!(lines
            .iter()
            .all(|l| l.category != categories::SERVICE_MARGIN));
    }

    #[test]
    fn test_completion_zero_margin_skipped() {
        // buy == sell: neither margin nor loss entry
        let order = order(ServiceStatus::Received, 0, 0, 0, PaymentStatus::Paid);
        let parts = vec![part(3, 5_000, 5_000)];
        let lines = completion_entries(&order, &parts);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].category, categories::PARTS_COST);
    }

    #[test]
    fn test_completion_is_deterministic() {
        let order = order(
            ServiceStatus::AwaitingParts,
            100_000,
            40_000,
            60_000,
            PaymentStatus::PartiallyPaid,
        );
        let parts = vec![part(1, 25_000, 35_000), part(2, 5_000, 8_000)];

        let first = completion_entries(&order, &parts);
        let second = completion_entries(&order, &parts);
        assert_eq!(first, second);
    }
}
