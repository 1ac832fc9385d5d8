//! # Reconciliation Core
//!
//! A bank-statement reconciliation engine: matches imported statement
//! lines against a ledger of internally recorded treasury movements so
//! that every line is either linked to exactly one movement or parked
//! for human review.
//!
//! ## Features
//!
//! - **Tiered matching**: EXACT, FUZZY (tolerance windows with confidence
//!   scoring), and REFERENCE strategies tried in priority order
//! - **Suspense handling**: unmatched lines are parked for review and can
//!   be resolved or turned into new movements
//! - **Manual overrides**: force-link, undo, and audit-tracked operator
//!   actions
//! - **Transactional linking**: item, movement, and statement counters
//!   commit as one atomic unit
//! - **Storage abstraction**: database-agnostic design with a trait-based
//!   storage backend
//!
//! ## Quick Start
//!
//! ```rust
//! use reconciliation_core::{MemoryStorage, ReconciliationEngine};
//!
//! let storage = MemoryStorage::new();
//! let mut engine = ReconciliationEngine::new(storage);
//! // Register statements, items, and movements, then run
//! // engine.auto_match_statement_items("stmt-1").
//! ```

pub mod engine;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use engine::*;
pub use traits::*;
pub use types::*;
pub use utils::memory_storage::MemoryStorage;
