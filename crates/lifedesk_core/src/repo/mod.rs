//! Persistence contracts and their SQLite implementations.
//!
//! # Responsibility
//! - Keep SQL details and ordering behavior inside the repository boundary.
//! - Expose the record-oriented contract the service layer consumes.
//!
//! # Invariants
//! - Multi-statement mutations run inside immediate transactions.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod category_repo;
pub mod item_repo;
