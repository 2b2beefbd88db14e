//! Field binding for list rendering.
//!
//! Maps raw note fields to display strings and background colors. Pure: no
//! store access, no side effects.

pub mod format;
