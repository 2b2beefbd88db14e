//! Flutter-facing bindings for the notelist core.

pub mod api;
