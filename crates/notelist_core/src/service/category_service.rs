//! Category aggregation and bulk reassignment.
//!
//! # Responsibility
//! - Project the distinct set of categories currently in use.
//! - Move every note of one category to another (or to none).
//!
//! # Invariants
//! - Categories are derived from notes on every call, never cached.
//! - Empty names are never listed.
//! - Deleting a category never deletes notes.
//! - A reassignment is either fully applied or reported as failed/partial;
//!   partial progress is never reported as success.

use crate::model::note::{NoteField, NoteId, NotePatch};
use crate::repo::note_repo::{BulkUpdateReport, NoteStore, RepoError};
use log::{error, info};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Distinct categories, ascending and case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryProjection {
    pub categories: Vec<String>,
}

impl CategoryProjection {
    pub fn contains(&self, name: &str) -> bool {
        self.categories.iter().any(|category| category == name)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Service error for category use-cases.
#[derive(Debug)]
pub enum CategoryError {
    InvalidCategory(String),
    Store(RepoError),
    /// Nothing was applied.
    BulkUpdateFailed {
        category: String,
        new_category: Option<String>,
        source: RepoError,
    },
    /// Some, but not all, matching notes were updated.
    PartialBulkUpdate {
        category: String,
        new_category: Option<String>,
        requested: usize,
        succeeded: usize,
        source: RepoError,
    },
}

impl CategoryError {
    /// Notes updated before the failure.
    pub fn succeeded(&self) -> usize {
        match self {
            Self::PartialBulkUpdate { succeeded, .. } => *succeeded,
            _ => 0,
        }
    }
}

impl Display for CategoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCategory(value) => write!(f, "invalid category name: `{value}`"),
            Self::Store(err) => write!(f, "category lookup failed: {err}"),
            Self::BulkUpdateFailed {
                category,
                new_category,
                source,
            } => write!(
                f,
                "moving notes from `{category}` to {} failed; no notes were changed: {source}",
                describe_target(new_category.as_deref())
            ),
            Self::PartialBulkUpdate {
                category,
                new_category,
                requested,
                succeeded,
                source,
            } => write!(
                f,
                "moving {requested} note(s) from `{category}` to {} stopped after {succeeded}: {source}",
                describe_target(new_category.as_deref())
            ),
        }
    }
}

impl Error for CategoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidCategory(_) => None,
            Self::Store(err)
            | Self::BulkUpdateFailed { source: err, .. }
            | Self::PartialBulkUpdate { source: err, .. } => Some(err),
        }
    }
}

impl From<RepoError> for CategoryError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

/// Successful reassignment summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReassignSummary {
    pub updated: usize,
}

/// Category use-cases over a note store.
pub struct CategoryService<S: NoteStore> {
    store: S,
}

impl<S: NoteStore> CategoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Recomputes the category projection from current store content.
    pub fn list_categories(&self) -> Result<CategoryProjection, CategoryError> {
        let values = self.store.distinct_values(NoteField::Category)?;
        Ok(CategoryProjection {
            categories: values.into_iter().collect(),
        })
    }

    /// Moves every note in `category` to `new_category`; an empty
    /// `new_category` clears it.
    pub fn reassign(
        &self,
        category: &str,
        new_category: &str,
    ) -> Result<ReassignSummary, CategoryError> {
        if category.trim().is_empty() {
            return Err(CategoryError::InvalidCategory(category.to_string()));
        }
        if is_blank_name(new_category) {
            return Err(CategoryError::InvalidCategory(new_category.to_string()));
        }
        let target = Some(new_category).filter(|value| !value.is_empty());

        let report = self.store.reassign_category(category, target);
        summarize(category, target, report)
    }

    /// Clears `category` from every note carrying it.
    pub fn delete_category(&self, category: &str) -> Result<ReassignSummary, CategoryError> {
        self.reassign(category, "")
    }

    /// Sets or clears the category of one note.
    pub fn assign(&self, note_id: NoteId, category: Option<&str>) -> Result<(), CategoryError> {
        if let Some(name) = category.filter(|name| is_blank_name(name)) {
            return Err(CategoryError::InvalidCategory(name.to_string()));
        }
        self.store
            .update(note_id, &NotePatch::category(category.map(str::to_string)))?;
        Ok(())
    }
}

/// Whitespace-only names; the empty string means "no category".
fn is_blank_name(name: &str) -> bool {
    !name.is_empty() && name.trim().is_empty()
}

fn summarize(
    category: &str,
    new_category: Option<&str>,
    report: BulkUpdateReport,
) -> Result<ReassignSummary, CategoryError> {
    let BulkUpdateReport {
        requested,
        updated,
        error: failure,
    } = report;

    match failure {
        None => {
            info!(
                "event=category_reassign module=category status=ok updated={} cleared={}",
                updated,
                new_category.is_none()
            );
            Ok(ReassignSummary { updated })
        }
        Some(source) if updated == 0 => {
            error!(
                "event=category_reassign module=category status=error requested={} updated=0 error={}",
                requested, source
            );
            Err(CategoryError::BulkUpdateFailed {
                category: category.to_string(),
                new_category: new_category.map(str::to_string),
                source,
            })
        }
        Some(source) => {
            error!(
                "event=category_reassign module=category status=partial requested={} updated={} error={}",
                requested, updated, source
            );
            Err(CategoryError::PartialBulkUpdate {
                category: category.to_string(),
                new_category: new_category.map(str::to_string),
                requested,
                succeeded: updated,
                source,
            })
        }
    }
}

fn describe_target(new_category: Option<&str>) -> String {
    match new_category {
        Some(name) => format!("`{name}`"),
        None => "no category".to_string(),
    }
}
