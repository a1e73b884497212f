//! Core use-case services.
//!
//! # Responsibility
//! - Run the entry store on its worker thread and fan out the live list.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod journal;
pub mod live_store;
pub mod mood_repository;
