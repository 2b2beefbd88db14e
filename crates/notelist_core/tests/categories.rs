use notelist_core::db::open_db_in_memory;
use notelist_core::model::note::NoteField;
use notelist_core::repo::note_repo::NoteQuery;
use notelist_core::{
    CategoryError, CategoryService, NewNote, Note, NoteId, NotePatch, NoteStore, RepoError,
    RepoResult, SqliteNoteStore,
};
use std::cell::Cell;
use std::collections::BTreeSet;

/// Store whose `update` starts failing after a fixed number of calls, so the
/// default note-by-note reassignment stops halfway.
struct FlakyStore<'conn> {
    inner: SqliteNoteStore<'conn>,
    updates_before_failure: usize,
    updates: Cell<usize>,
}

impl NoteStore for FlakyStore<'_> {
    fn query(&self, query: &NoteQuery) -> RepoResult<Vec<Note>> {
        self.inner.query(query)
    }

    fn get(&self, id: NoteId) -> RepoResult<Option<Note>> {
        self.inner.get(id)
    }

    fn insert(&self, note: &NewNote) -> RepoResult<NoteId> {
        self.inner.insert(note)
    }

    fn update(&self, id: NoteId, patch: &NotePatch) -> RepoResult<()> {
        let seen = self.updates.get();
        self.updates.set(seen + 1);
        if seen >= self.updates_before_failure {
            return Err(RepoError::StoreUnavailable("disk went away".to_string()));
        }
        self.inner.update(id, patch)
    }

    fn delete(&self, id: NoteId) -> RepoResult<()> {
        self.inner.delete(id)
    }

    fn distinct_values(&self, field: NoteField) -> RepoResult<BTreeSet<String>> {
        self.inner.distinct_values(field)
    }
}

fn seed(store: &SqliteNoteStore<'_>, categories: &[&str]) {
    for (index, category) in categories.iter().enumerate() {
        store
            .insert(
                &NewNote::titled(format!("note {index}"))
                    .with_category(*category)
                    .with_modified_at(index as i64),
            )
            .unwrap();
    }
}

#[test]
fn scenario_lists_only_non_empty_categories() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::new(&conn);
    store
        .insert(
            &NewNote::titled("Buy milk")
                .with_modified_at(1_000)
                .with_category("Home"),
        )
        .unwrap();
    store
        .insert(
            &NewNote::titled("Buy car")
                .with_modified_at(2_000)
                .with_category(""),
        )
        .unwrap();

    let projection = CategoryService::new(&store).list_categories().unwrap();
    assert_eq!(projection.categories, vec!["Home"]);
}

#[test]
fn projection_is_sorted_and_distinct() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::new(&conn);
    seed(&store, &["Work", "Home", "Work", "", "Errands"]);

    let projection = CategoryService::new(&store).list_categories().unwrap();
    assert_eq!(projection.categories, vec!["Errands", "Home", "Work"]);
    assert!(projection.contains("Home"));
    assert!(!projection.contains("home"));
}

#[test]
fn deleting_a_category_removes_it_from_the_projection() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::new(&conn);
    seed(&store, &["Work", "Home", "Work", "Work"]);
    let service = CategoryService::new(&store);

    let summary = service.reassign("Work", "").unwrap();
    assert_eq!(summary.updated, 3);

    let projection = service.list_categories().unwrap();
    assert!(!projection.contains("Work"));
    assert_eq!(projection.categories, vec!["Home"]);
    assert_eq!(store.query(&NoteQuery::default()).unwrap().len(), 4);
}

#[test]
fn reassign_moves_notes_without_touching_modification_time() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::new(&conn);
    seed(&store, &["Work", "Home"]);
    let before = store.query(&NoteQuery::default()).unwrap();

    let summary = CategoryService::new(&store)
        .reassign("Work", "Office")
        .unwrap();
    assert_eq!(summary.updated, 1);

    let after = store.query(&NoteQuery::default()).unwrap();
    for (old, new) in before.iter().zip(after.iter()) {
        assert_eq!(old.id, new.id);
        assert_eq!(old.modified_at, new.modified_at);
    }
    let projection = CategoryService::new(&store).list_categories().unwrap();
    assert_eq!(projection.categories, vec!["Home", "Office"]);
}

#[test]
fn deleting_an_unused_category_is_a_no_op() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::new(&conn);
    seed(&store, &["Home"]);

    let summary = CategoryService::new(&store)
        .delete_category("Nowhere")
        .unwrap();
    assert_eq!(summary.updated, 0);
}

#[test]
fn blank_category_names_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::new(&conn);
    let service = CategoryService::new(&store);

    assert!(matches!(
        service.reassign("", "Home"),
        Err(CategoryError::InvalidCategory(_))
    ));
    assert!(matches!(
        service.delete_category("   "),
        Err(CategoryError::InvalidCategory(_))
    ));
    let id = store.insert(&NewNote::titled("n")).unwrap();
    assert!(matches!(
        service.assign(id, Some("  ")),
        Err(CategoryError::InvalidCategory(_))
    ));
}

#[test]
fn reassigning_to_a_blank_name_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::new(&conn);
    let id = store
        .insert(&NewNote::titled("standup").with_category("Work"))
        .unwrap();
    let service = CategoryService::new(&store);

    assert!(matches!(
        service.reassign("Work", "   "),
        Err(CategoryError::InvalidCategory(name)) if name == "   "
    ));
    assert_eq!(service.list_categories().unwrap().categories, vec!["Work"]);
    assert_eq!(
        store.get(id).unwrap().unwrap().category.as_deref(),
        Some("Work")
    );
}

#[test]
fn assign_sets_and_clears_one_note() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::new(&conn);
    let id = store.insert(&NewNote::titled("n")).unwrap();
    let service = CategoryService::new(&store);

    service.assign(id, Some("Home")).unwrap();
    assert_eq!(store.get(id).unwrap().unwrap().category.as_deref(), Some("Home"));
    service.assign(id, Some("")).unwrap();
    assert_eq!(store.get(id).unwrap().unwrap().category, None);
    assert!(matches!(
        service.assign(999, Some("Home")),
        Err(CategoryError::Store(RepoError::NotFound(999)))
    ));
}

#[test]
fn partial_bulk_update_is_reported_distinctly() {
    let conn = open_db_in_memory().unwrap();
    let sqlite = SqliteNoteStore::new(&conn);
    seed(&sqlite, &["Work", "Work", "Work", "Home"]);
    let flaky = FlakyStore {
        inner: SqliteNoteStore::new(&conn),
        updates_before_failure: 2,
        updates: Cell::new(0),
    };

    let err = CategoryService::new(&flaky)
        .delete_category("Work")
        .unwrap_err();
    match &err {
        CategoryError::PartialBulkUpdate {
            category,
            new_category,
            requested,
            succeeded,
            source,
        } => {
            assert_eq!(category, "Work");
            assert_eq!(new_category, &None);
            assert_eq!(*requested, 3);
            assert_eq!(*succeeded, 2);
            assert!(source.is_store_unavailable());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.succeeded(), 2);
    let message = err.to_string();
    assert!(message.contains("3 note(s)"), "{message}");
    assert!(message.contains("after 2"), "{message}");

    let remaining = CategoryService::new(&sqlite).list_categories().unwrap();
    assert!(remaining.contains("Work"));
}

#[test]
fn failure_before_any_update_is_not_partial() {
    let conn = open_db_in_memory().unwrap();
    let sqlite = SqliteNoteStore::new(&conn);
    seed(&sqlite, &["Work"]);
    let flaky = FlakyStore {
        inner: SqliteNoteStore::new(&conn),
        updates_before_failure: 0,
        updates: Cell::new(0),
    };

    let err = CategoryService::new(&flaky)
        .reassign("Work", "Office")
        .unwrap_err();
    assert!(matches!(
        err,
        CategoryError::BulkUpdateFailed { ref new_category, .. }
            if new_category.as_deref() == Some("Office")
    ));
    assert_eq!(err.succeeded(), 0);
}
