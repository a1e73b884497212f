//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the keyed entry store contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Store writes enforce `MoodEntry::validate()` before persistence.
//! - Store APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod entry_repo;
