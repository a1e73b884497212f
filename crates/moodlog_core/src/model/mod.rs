//! Domain model for journaled moods.
//!
//! # Responsibility
//! - Define the fixed mood palette and the canonical entry record.
//!
//! # Invariants
//! - Every entry is identified by a creation-derived `EntryId`.
//! - Every entry mood is a palette value.

pub mod entry;
pub mod mood;
