//! Action composition and resolution.
//!
//! Built-in note actions are merged at presentation time with alternative
//! actions that externally registered capability providers offer for the
//! current selection. Discovery runs on every resolution; nothing is cached
//! across calls because providers may come and go between presentations.

pub mod builtin;
pub mod descriptor;
pub mod registry;
pub mod resolver;
