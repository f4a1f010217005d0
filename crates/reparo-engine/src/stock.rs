//! # Stock Delta Application
//!
//! The single place stock moves through. Every orchestrator that touches
//! inventory expresses its effect as a list of signed deltas and applies
//! them here, inside its transaction.
//!
//! The non-negativity rule is one-sided on purpose:
//!
//! - Negative deltas check the outcome and abort the transaction when the
//!   item would go below zero. You cannot sell what is not there.
//! - Positive deltas apply unchecked. Edit replay first restores the old
//!   lines (+) and then re-applies the new ones (-); the intermediate
//!   state may dip through odd values, and only the final picture has to
//!   be valid.

use sqlx::SqliteConnection;

use crate::error::EngineResult;
use reparo_core::{Tenant, ValidationError};
use reparo_db::repository::item::ItemRepository;

/// One signed stock movement.
#[derive(Debug, Clone)]
pub(crate) struct StockDelta {
    pub item_id: String,
    pub delta: i64,
}

impl StockDelta {
    pub fn new(item_id: impl Into<String>, delta: i64) -> Self {
        StockDelta {
            item_id: item_id.into(),
            delta,
        }
    }
}

/// Applies deltas in order, enforcing non-negativity on decrements.
///
/// Checks run sequentially against in-transaction state, so several
/// lines draining the same item are accounted cumulatively.
pub(crate) async fn apply_deltas(
    items: &ItemRepository,
    conn: &mut SqliteConnection,
    tenant: &Tenant,
    deltas: &[StockDelta],
) -> EngineResult<()> {
    for d in deltas {
        if d.delta < 0 {
            let item = items.find_tx(&mut *conn, tenant, &d.item_id).await?;
            if item.stock + d.delta < 0 {
                return Err(ValidationError::InsufficientStock {
                    item: item.name,
                    available: item.stock,
                    requested: -d.delta,
                }
                .into());
            }
        }
        items.adjust_stock(&mut *conn, tenant, &d.item_id, d.delta).await?;
    }
    Ok(())
}
