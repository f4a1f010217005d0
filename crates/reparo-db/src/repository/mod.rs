//! # Repository Module
//!
//! One repository per entity family, each a thin tenant-scoped wrapper
//! over SQL.
//!
//! ## The Write Convention
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Injected Connections for Atomicity                      │
//! │                                                                         │
//! │  Orchestrator (reparo-engine)                                          │
//! │       │                                                                 │
//! │       │  let mut tx = db.begin().await?;                               │
//! │       │                                                                 │
//! │       ├──► items.adjust_stock(&mut *tx, ...)     ┐                     │
//! │       ├──► sales.insert(&mut *tx, ...)           │ one unit of work    │
//! │       ├──► finance.insert(&mut *tx, ...)         ┘                     │
//! │       │                                                                 │
//! │       └──► tx.commit().await?    (or drop → rollback)                  │
//! │                                                                         │
//! │  Write methods take `conn: &mut SqliteConnection` so the SAME          │
//! │  transaction flows through every step. Reads use the pool directly.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`item::ItemRepository`] - Inventory items, stock deltas, opname trail
//! - [`service::ServiceRepository`] - Service orders and child collections
//! - [`sale::SaleRepository`] - Sales and sale lines
//! - [`purchase::PurchaseRepository`] - Purchases and purchase lines
//! - [`returns::ReturnRepository`] - Sale/purchase returns
//! - [`finance::FinanceRepository`] - Financial ledger rows and summaries
//! - [`debt::DebtRepository`] - Debts and payment trails

pub mod debt;
pub mod finance;
pub mod item;
pub mod purchase;
pub mod returns;
pub mod sale;
pub mod service;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a fresh entity ID (UUID v4, text form).
///
/// IDs are always generated in Rust so inserts can reference their own
/// children before any round trip.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matching rows across all pages.
    pub total: i64,
    /// 1-based page number this slice came from.
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        ((self.total as u64).div_ceil(self.per_page as u64)) as u32
    }
}

/// Clamps pagination input and converts it to an SQL (limit, offset) pair.
pub(crate) fn page_bounds(page: u32, per_page: u32) -> (i64, i64) {
    let page = page.max(1);
    let per_page = per_page.clamp(1, 200);
    let offset = (page as i64 - 1) * per_page as i64;
    (per_page as i64, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds_clamps() {
        assert_eq!(page_bounds(0, 0), (1, 0));
        assert_eq!(page_bounds(1, 20), (20, 0));
        assert_eq!(page_bounds(3, 20), (20, 40));
        assert_eq!(page_bounds(1, 1000), (200, 0));
    }

    #[test]
    fn test_total_pages() {
        let page: Page<i32> = Page {
            items: vec![],
            total: 41,
            page: 1,
            per_page: 20,
        };
        assert_eq!(page.total_pages(), 3);
    }

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }
}
