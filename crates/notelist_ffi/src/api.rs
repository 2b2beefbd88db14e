//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Mirror the `NoteBrowser` presentation boundary as flat FRB functions.
//! - Translate core errors into `ok` + `message` envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Each call opens its own connection; no browser state survives a call.

use log::warn;
use notelist_core::config::{format_color, palette_index, parse_color};
use notelist_core::db::open_db;
use notelist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    ActionGroup, Background, CapabilityRegistry, ListConfig, NoteBrowser, NoteRow,
    RepoError, ResolvedAction, SqliteNoteStore, SqlitePreferenceStore,
};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

const BROWSER_DB_FILE_NAME: &str = "notelist.sqlite3";
static BROWSER_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Idempotent for the same `level + log_dir`; conflicting calls fail.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One bound list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListItem {
    pub note_id: i64,
    pub title: String,
    /// Locale-formatted modification time.
    pub modified: String,
    /// ARGB background, `None` when transparent.
    pub background: Option<u32>,
}

/// Filtered list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListResponse {
    pub ok: bool,
    pub items: Vec<NoteListItem>,
    /// Filter text that produced `items`.
    pub filter_text: String,
    pub message: String,
}

/// One resolved action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionItem {
    pub label: String,
    pub handler: String,
    /// `builtin|specific|alternative`.
    pub group: String,
    /// `"<numeric><alpha>"`, e.g. `"1e"`.
    pub shortcut: Option<String>,
}

/// Action list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionListResponse {
    pub ok: bool,
    pub actions: Vec<ActionItem>,
    /// Recoverable problems met while resolving; `ok` stays true.
    pub warnings: Vec<String>,
    pub message: String,
}

/// Category list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryListResponse {
    pub ok: bool,
    pub categories: Vec<String>,
    pub message: String,
}

/// Category deletion envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryActionResponse {
    pub ok: bool,
    /// Notes whose category was cleared.
    pub updated: u32,
    pub message: String,
}

/// Background color envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundColorResponse {
    pub ok: bool,
    pub color: u32,
    /// `#AARRGGBB`.
    pub color_hex: String,
    pub palette_index: u32,
    pub message: String,
}

impl BackgroundColorResponse {
    fn success(color: u32, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            color,
            color_hex: format_color(color),
            palette_index: palette_index(color) as u32,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        let color = ListConfig::default().background_color;
        Self {
            ok: false,
            color,
            color_hex: format_color(color),
            palette_index: palette_index(color) as u32,
            message: message.into(),
        }
    }
}

/// Applies `text` as the list filter and returns the bound rows.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Empty text lists every note.
#[flutter_rust_bridge::frb(sync)]
pub fn browser_set_filter_text(text: String) -> NoteListResponse {
    let result = with_browser(|browser| {
        let notes = browser.set_filter_text(&text)?;
        Ok(browser.rows(&notes))
    });
    match result {
        Ok(rows) => {
            let items = rows.into_iter().map(to_note_list_item).collect::<Vec<_>>();
            NoteListResponse {
                ok: true,
                message: format!("Listed {} note(s).", items.len()),
                items,
                filter_text: text,
            }
        }
        Err(err) => NoteListResponse {
            ok: false,
            items: Vec::new(),
            filter_text: text,
            message: format!("browser_set_filter_text failed: {err}"),
        },
    }
}

/// Resolves the actions available for a selection.
///
/// - `kind`: `collection` (or `none`) without `note_id`, `note` (or
///   `single`) with a positive `note_id`.
/// - Shapes that match nothing return `ok = true` with an empty list and a
///   warning.
#[flutter_rust_bridge::frb(sync)]
pub fn browser_resolve_actions(
    kind: String,
    note_id: Option<i64>,
    clipboard_has_note: bool,
) -> ActionListResponse {
    let result = with_browser(|browser| {
        browser.set_clipboard_has_note(clipboard_has_note);
        browser.resolve_actions_for(&kind, note_id)
    });
    match result {
        Ok(resolved) => ActionListResponse {
            ok: true,
            message: format!("Resolved {} action(s).", resolved.len()),
            warnings: resolved
                .warnings
                .iter()
                .map(|warning| warning.to_string())
                .collect(),
            actions: resolved.actions.iter().map(to_action_item).collect(),
        },
        Err(err) => ActionListResponse {
            ok: false,
            actions: Vec::new(),
            warnings: Vec::new(),
            message: format!("browser_resolve_actions failed: {err}"),
        },
    }
}

/// Lists distinct non-empty categories in ascending order.
#[flutter_rust_bridge::frb(sync)]
pub fn browser_list_categories() -> CategoryListResponse {
    match with_browser(|browser| Ok(browser.list_categories())) {
        Ok(Ok(projection)) => CategoryListResponse {
            ok: true,
            message: format!("Found {} categor(ies).", projection.categories.len()),
            categories: projection.categories,
        },
        Ok(Err(err)) => category_list_failure(err),
        Err(err) => category_list_failure(err),
    }
}

/// Clears `name` from every note carrying it.
///
/// # FFI contract
/// - Partial failures report `ok = false` with the number of notes that
///   were updated before the failure.
#[flutter_rust_bridge::frb(sync)]
pub fn browser_delete_category(name: String) -> CategoryActionResponse {
    match with_browser(|browser| Ok(browser.delete_category(&name))) {
        Ok(Ok(summary)) => CategoryActionResponse {
            ok: true,
            updated: summary.updated as u32,
            message: format!("Cleared category from {} note(s).", summary.updated),
        },
        Ok(Err(err)) => CategoryActionResponse {
            ok: false,
            updated: err.succeeded() as u32,
            message: format!("browser_delete_category failed: {err}"),
        },
        Err(err) => CategoryActionResponse {
            ok: false,
            updated: 0,
            message: format!("browser_delete_category failed: {err}"),
        },
    }
}

/// Returns the persisted list background color.
#[flutter_rust_bridge::frb(sync)]
pub fn browser_get_background_color() -> BackgroundColorResponse {
    match with_browser(|browser| Ok(browser.background_color())) {
        Ok(color) => BackgroundColorResponse::success(color, "Background color loaded."),
        Err(err) => {
            BackgroundColorResponse::failure(format!("browser_get_background_color failed: {err}"))
        }
    }
}

/// Parses and persists a new background color (`#AARRGGBB` or `#RRGGBB`).
#[flutter_rust_bridge::frb(sync)]
pub fn browser_set_background_color(color: String) -> BackgroundColorResponse {
    let parsed = match parse_color(&color) {
        Ok(parsed) => parsed,
        Err(err) => {
            return BackgroundColorResponse::failure(format!(
                "browser_set_background_color failed: {err}"
            ))
        }
    };
    let db_path = resolve_browser_db_path();
    let result = open_db(&db_path)
        .map_err(|err| format!("browser DB open failed: {err}"))
        .and_then(|conn| {
            let preferences = SqlitePreferenceStore::new(&conn);
            ListConfig {
                background_color: parsed,
            }
            .save(&preferences)
            .map_err(|err| err.to_string())
        });
    match result {
        Ok(()) => BackgroundColorResponse::success(parsed, "Background color saved."),
        Err(err) => {
            BackgroundColorResponse::failure(format!("browser_set_background_color failed: {err}"))
        }
    }
}

fn resolve_browser_db_path() -> PathBuf {
    BROWSER_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("NOTELIST_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(BROWSER_DB_FILE_NAME)
        })
        .clone()
}

fn with_browser<T>(
    f: impl FnOnce(&mut NoteBrowser<SqliteNoteStore<'_>>) -> Result<T, RepoError>,
) -> Result<T, String> {
    let db_path = resolve_browser_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("browser DB open failed: {err}"))?;
    let config = ListConfig::load(&SqlitePreferenceStore::new(&conn))
        .map_err(|err| format!("browser preferences load failed: {err}"))?;
    let mut browser = NoteBrowser::new(
        SqliteNoteStore::new(&conn),
        Arc::new(CapabilityRegistry::global()),
    )
    .with_config(config);
    f(&mut browser).map_err(|err| {
        warn!(
            "event=ffi_call module=ffi status=error store_unavailable={}",
            err.is_store_unavailable()
        );
        err.to_string()
    })
}

fn category_list_failure(err: impl std::fmt::Display) -> CategoryListResponse {
    CategoryListResponse {
        ok: false,
        categories: Vec::new(),
        message: format!("browser_list_categories failed: {err}"),
    }
}

fn to_note_list_item(row: NoteRow) -> NoteListItem {
    NoteListItem {
        note_id: row.id,
        title: row.title,
        modified: row.modified,
        background: match row.background {
            Background::Transparent => None,
            Background::Argb(value) => Some(value),
        },
    }
}

fn to_action_item(action: &ResolvedAction) -> ActionItem {
    ActionItem {
        label: action.descriptor.label.clone(),
        handler: action.descriptor.handler.to_string(),
        group: group_label(action.group).to_string(),
        shortcut: action
            .descriptor
            .shortcut
            .map(|shortcut| format!("{}{}", shortcut.numeric, shortcut.alpha)),
    }
}

fn group_label(group: ActionGroup) -> &'static str {
    match group {
        ActionGroup::Builtin => "builtin",
        ActionGroup::Specific => "specific",
        ActionGroup::Alternative => "alternative",
    }
}

#[cfg(test)]
mod tests {
    use super::{
        browser_delete_category, browser_get_background_color, browser_list_categories,
        browser_resolve_actions, browser_set_background_color, browser_set_filter_text,
        core_version, init_logging, ping, resolve_browser_db_path,
    };
    use notelist_core::db::open_db;
    use notelist_core::{NewNote, NoteStore, SqliteNoteStore};
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/notelist-logs".to_string());
        assert!(error.contains("unsupported log level"));
    }

    #[test]
    fn filter_text_lists_matching_notes() {
        let token = unique_token("filter");
        let id = insert_note(&format!("buy {token}"), None);

        let response = browser_set_filter_text(token.clone());
        assert!(response.ok, "{}", response.message);
        assert_eq!(response.filter_text, token);
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].note_id, id);
        assert_eq!(response.items[0].background, None);
    }

    #[test]
    fn resolve_actions_for_collection_and_note() {
        let collection = browser_resolve_actions("collection".to_string(), None, false);
        assert!(collection.ok, "{}", collection.message);
        let handlers = collection
            .actions
            .iter()
            .map(|action| action.handler.as_str())
            .collect::<Vec<_>>();
        assert!(handlers.contains(&"builtin.note.insert"));
        assert!(!handlers.contains(&"builtin.note.paste"));

        let id = insert_note(&unique_token("resolve"), None);
        let single = browser_resolve_actions("note".to_string(), Some(id), false);
        assert!(single.ok, "{}", single.message);
        assert_eq!(single.actions[0].handler, "builtin.note.open");
        assert!(single.actions.iter().all(|action| action.group == "builtin"
            || action.group == "specific"
            || action.group == "alternative"));
    }

    #[test]
    fn resolve_actions_with_invalid_shape_returns_warning() {
        let response = browser_resolve_actions("note".to_string(), None, false);
        assert!(response.ok);
        assert!(response.actions.is_empty());
        assert_eq!(response.warnings.len(), 1);
    }

    #[test]
    fn delete_category_clears_it_from_the_projection() {
        let category = unique_token("Cat");
        insert_note("first", Some(&category));
        insert_note("second", Some(&category));

        let listed = browser_list_categories();
        assert!(listed.ok, "{}", listed.message);
        assert!(listed.categories.contains(&category));

        let deleted = browser_delete_category(category.clone());
        assert!(deleted.ok, "{}", deleted.message);
        assert_eq!(deleted.updated, 2);

        let listed = browser_list_categories();
        assert!(!listed.categories.contains(&category));
    }

    #[test]
    fn background_color_round_trips_through_preferences() {
        let saved = browser_set_background_color("#C8E6C9".to_string());
        assert!(saved.ok, "{}", saved.message);
        assert_eq!(saved.color, 0xFFC8_E6C9);
        assert_eq!(saved.palette_index, 3);

        let loaded = browser_get_background_color();
        assert!(loaded.ok, "{}", loaded.message);
        assert_eq!(loaded.color_hex, "#FFC8E6C9");

        let rejected = browser_set_background_color("green".to_string());
        assert!(!rejected.ok);
        assert!(rejected.message.contains("invalid color"));
    }

    fn insert_note(title: &str, category: Option<&str>) -> i64 {
        let conn = open_db(resolve_browser_db_path()).expect("open db");
        let store = SqliteNoteStore::new(&conn);
        let mut note = NewNote::titled(title);
        if let Some(category) = category {
            note = note.with_category(category);
        }
        store.insert(&note).expect("insert note")
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
