//! # reparo-engine: Orchestration Layer for Reparo
//!
//! The operations callers invoke. Every mutating operation here is one
//! unit of work: validate first, then open a single transaction, thread
//! it through the repositories, commit at the end. An error anywhere
//! unwinds everything — stock, ledger, and business record move together
//! or not at all.
//!
//! ## Anatomy of an Operation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      create_sale, step by step                          │
//! │                                                                         │
//! │  1. VALIDATE (reparo-core, no I/O)                                     │
//! │     lines non-empty, quantities in range, amounts non-negative         │
//! │                                                                         │
//! │  2. BEGIN TRANSACTION                                                  │
//! │     ├── snapshot item prices, check stock sufficiency                  │
//! │     ├── stock -= qty per line            (inventory_items)             │
//! │     ├── insert header + lines            (sales, sale_items)           │
//! │     ├── insert the income entry          (financial_transactions)      │
//! │     └── credit? open a receivable        (debts)                       │
//! │                                                                         │
//! │  3. COMMIT — or any `?` above rolls all of it back                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`inventory`] - Item CRUD, manual adjustments, stock opname, valuations
//! - [`sale`] - Sale creation and reversible deletion
//! - [`purchase`] - Purchase creation and reversible deletion
//! - [`returns`] - Sale/purchase returns
//! - [`service`] - Service order lifecycle, from intake to settlement
//! - [`debt`] - Debts and payments
//! - [`finance`] - Ledger reads and manual entries
//! - [`input`] - Input DTOs for the mutating operations
//! - [`error`] - The error taxonomy callers see

// =============================================================================
// Module Declarations
// =============================================================================

pub mod debt;
pub mod error;
pub mod finance;
pub mod input;
pub mod inventory;
pub mod purchase;
pub mod returns;
pub mod sale;
pub mod service;

mod stock;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{EngineError, EngineResult};

use reparo_db::Database;

/// The engine facade: one handle exposing every operation.
///
/// Cheap to clone; all state lives in the database pool.
#[derive(Debug, Clone)]
pub struct Engine {
    db: Database,
}

impl Engine {
    /// Wraps an already-connected database.
    pub fn new(db: Database) -> Self {
        Engine { db }
    }

    /// Returns the underlying database handle.
    pub fn db(&self) -> &Database {
        &self.db
    }
}
