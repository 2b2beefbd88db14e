//! Repository layer: the note store gateway and preference persistence.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from services and the browser facade.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`,
//!   `StoreUnavailable`) in addition to DB transport errors.

pub mod note_repo;
pub mod preference_repo;
