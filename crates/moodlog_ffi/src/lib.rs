//! Flutter-facing bindings for the mood journal core.

pub mod api;
