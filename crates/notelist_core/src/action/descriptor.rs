//! Action descriptors and selector contexts.

use crate::model::note::NoteId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Scope an action applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSelector {
    /// One selected note.
    Single,
    /// The note collection as a whole (no selection).
    Collection,
}

/// What an action does, as declared by its owner.
///
/// `Edit` is the default single-note edit capability; providers declaring it
/// are placed in the "specific" group ahead of other alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionVerb {
    Insert,
    Paste,
    BackgroundColor,
    Open,
    Copy,
    Delete,
    Edit,
    Alternative,
}

/// Opaque capability reference. Two descriptors with equal handlers invoke
/// the same capability.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerRef(String);

impl HandlerRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for HandlerRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Menu shortcut: numeric key plus alphabetic key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shortcut {
    pub numeric: char,
    pub alpha: char,
}

impl Shortcut {
    pub const fn new(numeric: char, alpha: char) -> Self {
        Self { numeric, alpha }
    }
}

/// A presentable action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub label: String,
    pub target: TargetSelector,
    pub handler: HandlerRef,
    pub verb: ActionVerb,
    pub is_builtin: bool,
    pub shortcut: Option<Shortcut>,
}

impl ActionDescriptor {
    /// Descriptor for an externally provided action.
    pub fn alternative(
        label: impl Into<String>,
        target: TargetSelector,
        handler: impl Into<String>,
        verb: ActionVerb,
    ) -> Self {
        Self {
            label: label.into(),
            target,
            handler: HandlerRef::new(handler),
            verb,
            is_builtin: false,
            shortcut: None,
        }
    }
}

/// Selected note as seen by capability providers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteRef {
    pub id: NoteId,
    pub category: Option<String>,
}

/// Scope of an action resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SelectorContext {
    NoSelection,
    Single(NoteRef),
}

impl SelectorContext {
    /// Target selector an action must declare to apply here.
    pub fn target(&self) -> TargetSelector {
        match self {
            Self::NoSelection => TargetSelector::Collection,
            Self::Single(_) => TargetSelector::Single,
        }
    }

    pub fn note_id(&self) -> Option<NoteId> {
        match self {
            Self::NoSelection => None,
            Self::Single(note) => Some(note.id),
        }
    }
}

/// Context shape as received from an outer layer, before the note is looked
/// up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorShape {
    Collection,
    Note(NoteId),
}

impl SelectorShape {
    /// Parses `kind` (`none|collection|single|note`) plus an optional note id.
    pub fn parse(kind: &str, note_id: Option<i64>) -> Result<Self, InvalidSelectorContext> {
        match (kind.trim().to_ascii_lowercase().as_str(), note_id) {
            ("none" | "collection", None) => Ok(Self::Collection),
            ("none" | "collection", Some(id)) => Err(InvalidSelectorContext::UnexpectedNoteId(id)),
            ("single" | "note", Some(id)) if id > 0 => Ok(Self::Note(id)),
            ("single" | "note", Some(id)) => Err(InvalidSelectorContext::InvalidNoteId(id)),
            ("single" | "note", None) => Err(InvalidSelectorContext::MissingNoteId),
            (other, _) => Err(InvalidSelectorContext::UnknownKind(other.to_string())),
        }
    }
}

/// A resolution context that matches no known shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidSelectorContext {
    UnknownKind(String),
    MissingNoteId,
    UnexpectedNoteId(i64),
    InvalidNoteId(i64),
    UnknownNote(NoteId),
}

impl Display for InvalidSelectorContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownKind(kind) => write!(f, "unknown selector kind `{kind}`"),
            Self::MissingNoteId => write!(f, "single-note selector requires a note id"),
            Self::UnexpectedNoteId(id) => {
                write!(f, "collection selector must not carry a note id (got {id})")
            }
            Self::InvalidNoteId(id) => write!(f, "invalid note id {id}"),
            Self::UnknownNote(id) => write!(f, "selected note {id} does not exist"),
        }
    }
}

impl Error for InvalidSelectorContext {}

/// Environment facts that decide built-in eligibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionEnv {
    /// Clipboard currently holds something pasteable.
    pub clipboard_has_note: bool,
    /// The list is browsed for picking, not editing; mutating built-ins are
    /// hidden.
    pub read_only: bool,
}
