//! Use-case services above the repository layer.
//!
//! # Responsibility
//! - Validate hierarchy invariants before any write reaches storage.
//! - Map storage errors into the caller-facing taxonomy.
//!
//! # Invariants
//! - Every mutation is all-or-nothing; a rejected operation changes nothing.
//! - Cycle checks run against the full subtree, not just direct self-links.

pub mod category_service;
