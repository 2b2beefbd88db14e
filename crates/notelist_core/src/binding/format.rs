//! Per-field display formatters.
//!
//! # Invariants
//! - `format` is a pure function of `(note, field)` for a given binder.
//! - Timestamps render as `YYYY-MM-DD <day period> hh:mm` on a 12-hour
//!   clock in the locale's fixed UTC offset.
//! - An unset color always renders as `Transparent`, never a literal color.

use crate::model::note::{Note, NoteColor, NoteField};
use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};
use serde::Serialize;

/// Locale conventions the formatters depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLocale {
    pub am_marker: String,
    pub pm_marker: String,
    /// Fixed offset from UTC, in seconds.
    pub utc_offset_seconds: i32,
}

impl DisplayLocale {
    pub fn new(
        am_marker: impl Into<String>,
        pm_marker: impl Into<String>,
        utc_offset_seconds: i32,
    ) -> Self {
        Self {
            am_marker: am_marker.into(),
            pm_marker: pm_marker.into(),
            utc_offset_seconds,
        }
    }

    /// `AM`/`PM`, UTC.
    pub fn en_us() -> Self {
        Self::new("AM", "PM", 0)
    }

    /// `上午`/`下午`, UTC+8.
    pub fn zh_cn() -> Self {
        Self::new("上午", "下午", 8 * 3600)
    }

    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_seconds).unwrap_or_else(|| Utc.fix())
    }
}

impl Default for DisplayLocale {
    fn default() -> Self {
        Self::en_us()
    }
}

/// Background to apply behind a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "argb")]
pub enum Background {
    Transparent,
    Argb(u32),
}

/// Formatted value for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum DisplayValue {
    Text(String),
    Background(Background),
}

impl DisplayValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::Background(_) => None,
        }
    }
}

/// Display projection of one list row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteRow {
    pub id: i64,
    pub title: String,
    pub modified: String,
    pub background: Background,
}

/// Binds note fields to display values under one locale.
#[derive(Debug, Clone, Default)]
pub struct NoteBinder {
    locale: DisplayLocale,
}

impl NoteBinder {
    pub fn new(locale: DisplayLocale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> &DisplayLocale {
        &self.locale
    }

    pub fn format(&self, note: &Note, field: NoteField) -> DisplayValue {
        match field {
            NoteField::ModifiedAt => DisplayValue::Text(self.format_timestamp(note.modified_at)),
            NoteField::CreatedAt => DisplayValue::Text(self.format_timestamp(note.created_at)),
            NoteField::Color => DisplayValue::Background(background_for(note.color)),
            NoteField::Title => DisplayValue::Text(note.title.clone()),
            NoteField::Body => DisplayValue::Text(note.body.clone()),
            NoteField::Category => {
                DisplayValue::Text(note.category_name().unwrap_or_default().to_string())
            }
        }
    }

    /// Title, formatted modification time and background for one row.
    pub fn bind_row(&self, note: &Note) -> NoteRow {
        NoteRow {
            id: note.id,
            title: note.title.clone(),
            modified: self.format_timestamp(note.modified_at),
            background: background_for(note.color),
        }
    }

    /// Formats epoch milliseconds; out-of-range values render empty.
    pub fn format_timestamp(&self, epoch_ms: i64) -> String {
        let Some(utc) = DateTime::from_timestamp_millis(epoch_ms) else {
            return String::new();
        };
        let local = utc.with_timezone(&self.locale.offset());
        let (is_pm, hour) = local.hour12();
        let marker = if is_pm {
            &self.locale.pm_marker
        } else {
            &self.locale.am_marker
        };
        format!(
            "{} {} {:02}:{:02}",
            local.format("%Y-%m-%d"),
            marker,
            hour,
            local.minute()
        )
    }
}

pub fn background_for(color: NoteColor) -> Background {
    match color {
        NoteColor::Unset => Background::Transparent,
        NoteColor::Argb(value) => Background::Argb(value),
    }
}
