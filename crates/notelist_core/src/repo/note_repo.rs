//! Note store gateway contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the narrow gateway the browser core reads and mutates notes
//!   through (`query`, `update`, `delete`, `distinct_values`).
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Every query is a fresh read; nothing is cached between calls.
//! - Default ordering is `modified_at DESC, id ASC`.
//! - Title matching is a literal, case-insensitive substring match.
//! - Empty-string categories read back as `None` and are never listed.

use crate::db::{fold_case, DbError, FOLD_FUNCTION};
use crate::model::note::{
    normalize_category, NewNote, Note, NoteColor, NoteField, NoteId, NotePatch,
};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, ErrorCode, Row, Transaction, TransactionBehavior,
};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    body,
    created_at,
    modified_at,
    color,
    category
FROM notes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Store gateway error.
#[derive(Debug)]
pub enum RepoError {
    /// The backing store could not be reached (busy, locked, unopenable).
    /// Surfaced to the caller; the core never retries on its own.
    StoreUnavailable(String),
    Db(DbError),
    NotFound(NoteId),
    InvalidData(String),
}

impl RepoError {
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreUnavailable(message) => write!(f, "note store unavailable: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if is_unavailable_error(&value) {
            Self::StoreUnavailable(value.to_string())
        } else {
            Self::Db(DbError::Sqlite(value))
        }
    }
}

/// Category predicate in the store's query language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Exact, case-sensitive category match.
    Equals(String),
    /// Any non-empty category.
    Assigned,
    /// No category (NULL or empty).
    Unassigned,
}

/// Store predicate. All present clauses must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    /// Case-insensitive title substring.
    pub title_contains: Option<String>,
    pub category: Option<CategoryFilter>,
}

impl NoteFilter {
    pub fn is_unfiltered(&self) -> bool {
        self.title_contains.is_none() && self.category.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoteSort {
    /// `modified_at DESC, id ASC`.
    #[default]
    ModifiedDesc,
    /// `title ASC (case-insensitive), id ASC`.
    TitleAsc,
}

/// Query options for listing notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteQuery {
    pub filter: NoteFilter,
    pub sort: NoteSort,
}

impl NoteQuery {
    pub fn filtered(filter: NoteFilter) -> Self {
        Self {
            filter,
            sort: NoteSort::default(),
        }
    }
}

/// Outcome of a bulk category reassignment.
///
/// `error` is set when the operation stopped early; `updated` then tells how
/// much of `requested` had already been applied.
#[derive(Debug)]
pub struct BulkUpdateReport {
    pub requested: usize,
    pub updated: usize,
    pub error: Option<RepoError>,
}

impl BulkUpdateReport {
    pub fn complete(count: usize) -> Self {
        Self {
            requested: count,
            updated: count,
            error: None,
        }
    }

    pub fn failed(requested: usize, updated: usize, error: RepoError) -> Self {
        Self {
            requested,
            updated,
            error: Some(error),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.updated == self.requested
    }
}

/// Record store gateway consumed by the browser core.
pub trait NoteStore {
    fn query(&self, query: &NoteQuery) -> RepoResult<Vec<Note>>;
    fn get(&self, id: NoteId) -> RepoResult<Option<Note>>;
    fn insert(&self, note: &NewNote) -> RepoResult<NoteId>;
    fn update(&self, id: NoteId, patch: &NotePatch) -> RepoResult<()>;
    fn delete(&self, id: NoteId) -> RepoResult<()>;
    /// Distinct non-empty values of a text field, ascending and
    /// case-sensitive.
    fn distinct_values(&self, field: NoteField) -> RepoResult<BTreeSet<String>>;

    /// Sets `new_category` on every note currently in `category`.
    ///
    /// The default walks matching notes one `update` at a time and stops at
    /// the first failure, reporting how far it got. Notes deleted
    /// concurrently are dropped from `requested` rather than failing.
    fn reassign_category(&self, category: &str, new_category: Option<&str>) -> BulkUpdateReport {
        let query = NoteQuery::filtered(NoteFilter {
            category: Some(CategoryFilter::Equals(category.to_string())),
            ..NoteFilter::default()
        });
        let targets = match self.query(&query) {
            Ok(notes) => notes,
            Err(err) => return BulkUpdateReport::failed(0, 0, err),
        };

        let patch = NotePatch::category(new_category.map(str::to_string));
        let mut requested = targets.len();
        let mut updated = 0;
        for note in &targets {
            match self.update(note.id, &patch) {
                Ok(()) => updated += 1,
                Err(RepoError::NotFound(_)) => requested -= 1,
                Err(err) => return BulkUpdateReport::failed(requested, updated, err),
            }
        }
        BulkUpdateReport::complete(requested)
    }
}

impl<S: NoteStore + ?Sized> NoteStore for &S {
    fn query(&self, query: &NoteQuery) -> RepoResult<Vec<Note>> {
        (**self).query(query)
    }

    fn get(&self, id: NoteId) -> RepoResult<Option<Note>> {
        (**self).get(id)
    }

    fn insert(&self, note: &NewNote) -> RepoResult<NoteId> {
        (**self).insert(note)
    }

    fn update(&self, id: NoteId, patch: &NotePatch) -> RepoResult<()> {
        (**self).update(id, patch)
    }

    fn delete(&self, id: NoteId) -> RepoResult<()> {
        (**self).delete(id)
    }

    fn distinct_values(&self, field: NoteField) -> RepoResult<BTreeSet<String>> {
        (**self).distinct_values(field)
    }

    fn reassign_category(&self, category: &str, new_category: Option<&str>) -> BulkUpdateReport {
        (**self).reassign_category(category, new_category)
    }
}

/// SQLite-backed note store.
pub struct SqliteNoteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteStore<'conn> {
    /// Wraps a migrated connection (see `db::open_db`).
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn reassign_in_tx(&self, category: &str, new_category: Option<&str>) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE notes SET category = ?2 WHERE category = ?1;",
            params![category, new_category],
        )?;
        tx.commit()?;
        Ok(changed)
    }
}

impl NoteStore for SqliteNoteStore<'_> {
    fn query(&self, query: &NoteQuery) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(text) = query.filter.title_contains.as_ref() {
            sql.push_str(&format!(" AND instr({FOLD_FUNCTION}(title), ?) > 0"));
            bind_values.push(Value::Text(fold_case(text)));
        }

        match query.filter.category.as_ref() {
            Some(CategoryFilter::Equals(name)) => {
                sql.push_str(" AND category = ?");
                bind_values.push(Value::Text(name.clone()));
            }
            Some(CategoryFilter::Assigned) => {
                sql.push_str(" AND category IS NOT NULL AND category != ''");
            }
            Some(CategoryFilter::Unassigned) => {
                sql.push_str(" AND (category IS NULL OR category = '')");
            }
            None => {}
        }

        sql.push_str(match query.sort {
            NoteSort::ModifiedDesc => " ORDER BY modified_at DESC, id ASC",
            NoteSort::TitleAsc => " ORDER BY title COLLATE NOCASE ASC, id ASC",
        });

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn get(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }
        Ok(None)
    }

    fn insert(&self, note: &NewNote) -> RepoResult<NoteId> {
        let created_at = note
            .created_at
            .unwrap_or_else(|| Utc::now().timestamp_millis());
        let modified_at = note.modified_at.unwrap_or(created_at);
        let category = normalize_category(note.category.clone());

        self.conn.execute(
            "INSERT INTO notes (
                title,
                body,
                created_at,
                modified_at,
                color,
                category
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                note.title.as_str(),
                note.body.as_str(),
                created_at,
                modified_at,
                note.color.to_db(),
                category.as_deref(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, id: NoteId, patch: &NotePatch) -> RepoResult<()> {
        if patch.is_empty() {
            return match self.get(id)? {
                Some(_) => Ok(()),
                None => Err(RepoError::NotFound(id)),
            };
        }

        let mut assignments: Vec<&'static str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(title) = patch.title.as_ref() {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(body) = patch.body.as_ref() {
            assignments.push("body = ?");
            bind_values.push(Value::Text(body.clone()));
        }
        if let Some(color) = patch.color {
            assignments.push("color = ?");
            bind_values.push(color.to_db().map_or(Value::Null, Value::Integer));
        }
        if let Some(category) = patch.category.as_ref() {
            assignments.push("category = ?");
            bind_values.push(
                normalize_category(category.clone()).map_or(Value::Null, Value::Text),
            );
        }
        if let Some(modified_at) = patch.modified_at {
            assignments.push("modified_at = ?");
            bind_values.push(Value::Integer(modified_at));
        }

        let sql = format!("UPDATE notes SET {} WHERE id = ?;", assignments.join(", "));
        bind_values.push(Value::Integer(id));

        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete(&self, id: NoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn distinct_values(&self, field: NoteField) -> RepoResult<BTreeSet<String>> {
        if !field.is_text() {
            return Err(RepoError::InvalidData(format!(
                "distinct values are only defined for text fields, got `{}`",
                field.column()
            )));
        }

        let column = field.column();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT DISTINCT {column}
             FROM notes
             WHERE {column} IS NOT NULL
               AND {column} != '';"
        ))?;
        let mut rows = stmt.query([])?;
        let mut values = BTreeSet::new();
        while let Some(row) = rows.next()? {
            values.insert(row.get::<_, String>(0)?);
        }
        Ok(values)
    }

    fn reassign_category(&self, category: &str, new_category: Option<&str>) -> BulkUpdateReport {
        let new_category = new_category.filter(|value| !value.is_empty());
        match self.reassign_in_tx(category, new_category) {
            Ok(changed) => BulkUpdateReport::complete(changed),
            // Rolled back: nothing was applied.
            Err(err) => BulkUpdateReport::failed(0, 0, err),
        }
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let id: NoteId = row.get("id")?;
    let color = NoteColor::from_db(row.get("color")?)
        .map_err(|err| RepoError::InvalidData(format!("note {id}: {err}")))?;

    Ok(Note {
        id,
        title: row.get("title")?,
        body: row.get("body")?,
        created_at: row.get("created_at")?,
        modified_at: row.get("modified_at")?,
        color,
        category: normalize_category(row.get("category")?),
    })
}

fn is_unavailable_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => matches!(
            failure.code,
            ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure
        ),
        _ => false,
    }
}
