//! Note domain model.
//!
//! # Invariants
//! - `category` is `None` for both "never assigned" and "explicitly cleared";
//!   an empty string is never kept as a category value.
//! - `color` distinguishes "unset" from every concrete ARGB value, including
//!   opaque white.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned stable note identifier.
pub type NoteId = i64;

/// Legacy integer sentinel that older rows use for "no color".
pub const LEGACY_UNSET_COLOR: i64 = -1;

/// Per-note color choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "argb")]
pub enum NoteColor {
    /// No color chosen; rendered transparent.
    #[default]
    Unset,
    /// 32-bit ARGB value.
    Argb(u32),
}

impl NoteColor {
    /// Decodes a persisted column value.
    ///
    /// NULL and the legacy `-1` sentinel both decode as `Unset`. Other
    /// negative values are legacy signed 32-bit ARGB and are reinterpreted.
    pub fn from_db(value: Option<i64>) -> Result<Self, NoteValidationError> {
        match value {
            None | Some(LEGACY_UNSET_COLOR) => Ok(Self::Unset),
            Some(raw) => u32::try_from(raw)
                .or_else(|_| i32::try_from(raw).map(|signed| signed as u32))
                .map(Self::Argb)
                .map_err(|_| NoteValidationError::ColorOutOfRange(raw)),
        }
    }

    /// Encodes for persistence; `Unset` is stored as NULL.
    pub fn to_db(self) -> Option<i64> {
        match self {
            Self::Unset => None,
            Self::Argb(value) => Some(i64::from(value)),
        }
    }

    pub fn is_unset(self) -> bool {
        matches!(self, Self::Unset)
    }
}

/// Canonical note record as returned by the store gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub body: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Primary list sort key.
    pub modified_at: i64,
    pub color: NoteColor,
    pub category: Option<String>,
}

impl Note {
    /// Returns the category only when it is a real, non-empty name.
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_deref().filter(|value| !value.is_empty())
    }
}

/// Insert request. Timestamps default to "now" in the store when omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub body: String,
    pub color: NoteColor,
    pub category: Option<String>,
    pub created_at: Option<i64>,
    pub modified_at: Option<i64>,
}

impl NewNote {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = normalize_category(Some(category.into()));
        self
    }

    pub fn with_modified_at(mut self, epoch_ms: i64) -> Self {
        self.modified_at = Some(epoch_ms);
        self
    }

    pub fn with_color(mut self, color: NoteColor) -> Self {
        self.color = color;
        self
    }
}

/// Partial update request. `None` fields are left untouched.
///
/// `category: Some(None)` clears the category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub color: Option<NoteColor>,
    pub category: Option<Option<String>>,
    pub modified_at: Option<i64>,
}

impl NotePatch {
    /// Patch that only changes the category; empty names clear it.
    pub fn category(category: Option<String>) -> Self {
        Self {
            category: Some(normalize_category(category)),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.color.is_none()
            && self.category.is_none()
            && self.modified_at.is_none()
    }
}

/// Folds empty category names into `None`.
pub fn normalize_category(category: Option<String>) -> Option<String> {
    category.filter(|value| !value.is_empty())
}

/// Field names understood by the store gateway and the binding layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteField {
    Title,
    Body,
    CreatedAt,
    ModifiedAt,
    Color,
    Category,
}

impl NoteField {
    pub fn column(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Body => "body",
            Self::CreatedAt => "created_at",
            Self::ModifiedAt => "modified_at",
            Self::Color => "color",
            Self::Category => "category",
        }
    }

    /// Whether the field holds free text (and so supports distinct values).
    pub fn is_text(self) -> bool {
        matches!(self, Self::Title | Self::Body | Self::Category)
    }
}

/// Invalid persisted or requested note state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    ColorOutOfRange(i64),
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ColorOutOfRange(value) => {
                write!(f, "color value {value} is not a 32-bit ARGB value")
            }
        }
    }
}

impl Error for NoteValidationError {}

#[cfg(test)]
mod tests {
    use super::{normalize_category, NoteColor, NotePatch, NoteValidationError};

    #[test]
    fn color_decodes_null_and_legacy_sentinel_as_unset() {
        assert_eq!(NoteColor::from_db(None), Ok(NoteColor::Unset));
        assert_eq!(NoteColor::from_db(Some(-1)), Ok(NoteColor::Unset));
        assert_eq!(
            NoteColor::from_db(Some(0xFFFF_FFFF)),
            Ok(NoteColor::Argb(0xFFFF_FFFF))
        );
    }

    #[test]
    fn color_decodes_legacy_signed_argb() {
        assert_eq!(
            NoteColor::from_db(Some(-4_464_901)),
            Ok(NoteColor::Argb(0xFFBB_DEFB))
        );
        assert_eq!(
            NoteColor::from_db(Some(i64::from(i32::MIN))),
            Ok(NoteColor::Argb(0x8000_0000))
        );
    }

    #[test]
    fn color_rejects_values_outside_i32_and_u32() {
        let below = i64::from(i32::MIN) - 1;
        assert_eq!(
            NoteColor::from_db(Some(below)),
            Err(NoteValidationError::ColorOutOfRange(below))
        );
        let above = i64::from(u32::MAX) + 1;
        assert_eq!(
            NoteColor::from_db(Some(above)),
            Err(NoteValidationError::ColorOutOfRange(above))
        );
    }

    #[test]
    fn empty_category_is_folded_into_none() {
        assert_eq!(normalize_category(Some(String::new())), None);
        assert_eq!(
            NotePatch::category(Some(String::new())).category,
            Some(None)
        );
        assert_eq!(
            normalize_category(Some("Home".to_string())).as_deref(),
            Some("Home")
        );
    }
}
