//! Domain model for the note browser.
//!
//! # Responsibility
//! - Define the canonical note record read from the store.
//! - Define write-side shapes (`NewNote`, `NotePatch`) used to request
//!   mutations.
//!
//! # Invariants
//! - Every note is identified by a store-assigned, stable `NoteId`.
//! - The core never fabricates ids; it only reads and requests mutations.

pub mod note;
