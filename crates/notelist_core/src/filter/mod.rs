//! Live text filter over the note list.
//!
//! Keeps the displayed list consistent with a mutable query string by
//! re-reading the store on every change.

pub mod engine;
