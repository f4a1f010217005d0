//! # reparo-db: Storage Layer for Reparo
//!
//! SQLite persistence for the repair-shop engine: connection pool,
//! embedded migrations, and per-entity repositories.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Reparo Data Flow                                 │
//! │                                                                         │
//! │  reparo-engine orchestrator (create_sale, complete_service, ...)       │
//! │       │                                                                 │
//! │       │  let mut tx = db.begin().await?;                               │
//! │       │  db.items().adjust_stock(&mut *tx, ...).await?;               │
//! │       │  db.finance().insert(&mut *tx, ...).await?;                   │
//! │       │  tx.commit().await?;                                          │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     reparo-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (item, sale,  │    │  (embedded)  │  │   │
//! │  │   │               │    │  service, ...)│    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ tenant-scoped │    │ 001_init.sql │  │   │
//! │  │   │ Transactions  │    │ queries       │    │ 002_idx.sql  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (or :memory: in tests)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Injected-Connection Convention
//!
//! Every write method takes `conn: &mut SqliteConnection` instead of using
//! the pool directly. The caller decides the transaction boundary: an
//! orchestrator opens one transaction, threads `&mut *tx` through every
//! repository call, and commits once. Any error unwinds the whole unit of
//! work. Read methods use the pool directly since they need no atomicity.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations per entity family

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::Page;
