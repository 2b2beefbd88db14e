//! List configuration and its persistence collaborator.
//!
//! # Responsibility
//! - Hold the background-color choice as an explicit object passed to the
//!   components that need it.
//! - Load/save it through the narrow `PreferenceStore` interface.
//! - Parse textual color input (`#AARRGGBB` / `#RRGGBB`).
//!
//! # Invariants
//! - Missing preferences fall back to `DEFAULT_BACKGROUND_COLOR`.
//! - Six-digit colors are treated as fully opaque.

use crate::repo::note_repo::RepoResult;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Preference key for the list background color.
pub const PREF_BACKGROUND_COLOR: &str = "background_color";
/// Opaque white.
pub const DEFAULT_BACKGROUND_COLOR: u32 = 0xFFFF_FFFF;

/// Selectable list backgrounds, in presentation order.
pub const BACKGROUND_PALETTE: &[(&str, u32)] = &[
    ("white", 0xFFFF_FFFF),
    ("light gray", 0xFFE0_E0E0),
    ("blue", 0xFFBB_DEFB),
    ("green", 0xFFC8_E6C9),
    ("yellow", 0xFFFF_F9C4),
    ("orange", 0xFFFF_CCBC),
    ("purple", 0xFFE1_BEE7),
    ("red", 0xFFFF_CDD2),
];

static COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#?([0-9a-fA-F]{8}|[0-9a-fA-F]{6})$").expect("valid color regex")
});

/// Narrow key-value persistence used for list preferences.
pub trait PreferenceStore {
    fn load_u32(&self, key: &str) -> RepoResult<Option<u32>>;
    fn save_u32(&self, key: &str, value: u32) -> RepoResult<()>;
}

/// Explicit list configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListConfig {
    /// ARGB background color of the list surface.
    pub background_color: u32,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            background_color: DEFAULT_BACKGROUND_COLOR,
        }
    }
}

impl ListConfig {
    /// Reads persisted settings, defaulting anything missing.
    pub fn load(store: &impl PreferenceStore) -> RepoResult<Self> {
        let background_color = store
            .load_u32(PREF_BACKGROUND_COLOR)?
            .unwrap_or(DEFAULT_BACKGROUND_COLOR);
        Ok(Self { background_color })
    }

    /// Persists settings.
    pub fn save(&self, store: &impl PreferenceStore) -> RepoResult<()> {
        store.save_u32(PREF_BACKGROUND_COLOR, self.background_color)?;
        info!(
            "event=preference_save module=config status=ok key={} value={:#010X}",
            PREF_BACKGROUND_COLOR, self.background_color
        );
        Ok(())
    }

    /// Palette position of the current color; unknown colors map to 0.
    pub fn palette_index(&self) -> usize {
        palette_index(self.background_color)
    }
}

/// Palette position of `color`, or 0 when it is not a palette entry.
pub fn palette_index(color: u32) -> usize {
    BACKGROUND_PALETTE
        .iter()
        .position(|(_, value)| *value == color)
        .unwrap_or(0)
}

/// Parses `#AARRGGBB` or `#RRGGBB` (leading `#` optional).
pub fn parse_color(input: &str) -> Result<u32, ColorParseError> {
    let trimmed = input.trim();
    let caps = COLOR_RE
        .captures(trimmed)
        .ok_or_else(|| ColorParseError(trimmed.to_string()))?;
    let digits = &caps[1];
    let value =
        u32::from_str_radix(digits, 16).map_err(|_| ColorParseError(trimmed.to_string()))?;
    if digits.len() == 6 {
        Ok(0xFF00_0000 | value)
    } else {
        Ok(value)
    }
}

/// Formats a color as `#AARRGGBB`.
pub fn format_color(color: u32) -> String {
    format!("#{color:08X}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorParseError(pub String);

impl Display for ColorParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid color `{}`; expected #AARRGGBB or #RRGGBB",
            self.0
        )
    }
}

impl Error for ColorParseError {}
