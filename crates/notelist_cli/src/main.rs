//! Command-line front end for the notelist browser.
//!
//! # Responsibility
//! - Drive the `NoteBrowser` facade against a file database.
//! - Keep output line-oriented and deterministic for scripting.

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use notelist_core::config::{format_color, parse_color};
use notelist_core::db::open_db;
use notelist_core::{
    default_log_level, init_logging, ActionGroup, Background, BrowseMode, CapabilityRegistry,
    DisplayLocale, ListConfig, NewNote, NoteBrowser, NoteColor, NoteStore, SqliteNoteStore,
    SqlitePreferenceStore,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

const DEFAULT_DB_FILE_NAME: &str = "notelist.sqlite3";

#[derive(Parser)]
#[command(name = "notelist", version)]
#[command(about = "Browse, filter and categorize notes")]
struct Cli {
    /// SQLite database file (defaults to $NOTELIST_DB_PATH, then the temp dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Locale used for timestamps
    #[arg(long, global = true, value_enum, default_value_t = LocaleArg::EnUs)]
    locale: LocaleArg,

    /// Absolute directory for rolling log files
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List notes whose title contains FILTER
    List {
        #[arg(default_value = "")]
        filter: String,
    },
    /// List distinct categories
    Categories,
    /// Clear a category from every note
    DeleteCategory { name: String },
    /// Show the actions offered for the list or for one note
    Actions {
        /// Note to resolve actions for; omit for the whole list
        note_id: Option<i64>,
        /// Pretend the clipboard holds a note
        #[arg(long)]
        clipboard: bool,
        /// Resolve as a read-only picker
        #[arg(long)]
        pick: bool,
    },
    /// Insert a note
    Add {
        title: String,
        #[arg(long, default_value = "")]
        body: String,
        #[arg(long)]
        category: Option<String>,
        /// `#AARRGGBB` or `#RRGGBB`
        #[arg(long)]
        color: Option<String>,
    },
    /// Show or set the list background color
    Background { color: Option<String> },
    /// Check core linkage
    Ping,
}

#[derive(Clone, Copy, ValueEnum)]
enum LocaleArg {
    EnUs,
    ZhCn,
}

impl LocaleArg {
    fn display_locale(self) -> DisplayLocale {
        match self {
            Self::EnUs => DisplayLocale::en_us(),
            Self::ZhCn => DisplayLocale::zh_cn(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Some(log_dir) = cli.log_dir.as_deref() {
        if let Err(err) = init_logging(default_log_level(), log_dir) {
            eprintln!("warning: {err}");
        }
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    if let Commands::Ping = cli.command {
        println!("notelist_core ping={}", notelist_core::ping());
        println!("notelist_core version={}", notelist_core::core_version());
        return Ok(());
    }

    let db_path = resolve_db_path(cli.db);
    let conn = open_db(&db_path).map_err(|err| err.to_string())?;
    let preferences = SqlitePreferenceStore::new(&conn);
    let config = ListConfig::load(&preferences).map_err(|err| err.to_string())?;
    let browser = NoteBrowser::new(
        SqliteNoteStore::new(&conn),
        Arc::new(CapabilityRegistry::global()),
    )
    .with_locale(cli.locale.display_locale())
    .with_config(config);

    info!(
        "event=cli_command module=cli status=start db={}",
        db_path.display()
    );

    match cli.command {
        Commands::List { filter } => list_notes(browser, &filter),
        Commands::Categories => {
            let projection = browser.list_categories().map_err(|err| err.to_string())?;
            for name in projection.categories {
                println!("{name}");
            }
            Ok(())
        }
        Commands::DeleteCategory { name } => {
            let summary = browser
                .delete_category(&name)
                .map_err(|err| err.to_string())?;
            println!("cleared `{name}` from {} note(s)", summary.updated);
            Ok(())
        }
        Commands::Actions {
            note_id,
            clipboard,
            pick,
        } => {
            let mode = if pick { BrowseMode::Pick } else { BrowseMode::Edit };
            let mut browser = browser.with_mode(mode);
            browser.set_clipboard_has_note(clipboard);
            show_actions(&browser, note_id)
        }
        Commands::Add {
            title,
            body,
            category,
            color,
        } => {
            let color = match color {
                Some(raw) => NoteColor::Argb(parse_color(&raw).map_err(|err| err.to_string())?),
                None => NoteColor::Unset,
            };
            let mut note = NewNote {
                body,
                color,
                ..NewNote::titled(title)
            };
            if let Some(category) = category {
                note = note.with_category(category);
            }
            let id = browser
                .store()
                .insert(&note)
                .map_err(|err| err.to_string())?;
            println!("{id}");
            Ok(())
        }
        Commands::Background { color } => {
            let mut browser = browser;
            if let Some(raw) = color {
                let parsed = parse_color(&raw).map_err(|err| err.to_string())?;
                browser
                    .set_background_color(parsed, &preferences)
                    .map_err(|err| err.to_string())?;
            }
            println!(
                "{} (palette index {})",
                format_color(browser.background_color()),
                browser.config().palette_index()
            );
            Ok(())
        }
        Commands::Ping => Ok(()),
    }
}

fn list_notes(mut browser: NoteBrowser<SqliteNoteStore<'_>>, filter: &str) -> Result<(), String> {
    let notes = browser
        .set_filter_text(filter)
        .map_err(|err| err.to_string())?;
    for row in browser.rows(&notes) {
        let background = match row.background {
            Background::Transparent => "-".to_string(),
            Background::Argb(value) => format_color(value),
        };
        println!("{}\t{}\t{}\t{}", row.id, row.modified, background, row.title);
    }
    Ok(())
}

fn show_actions(
    browser: &NoteBrowser<SqliteNoteStore<'_>>,
    note_id: Option<i64>,
) -> Result<(), String> {
    let kind = if note_id.is_some() { "note" } else { "collection" };
    let resolved = browser
        .resolve_actions_for(kind, note_id)
        .map_err(|err| err.to_string())?;
    for action in &resolved.actions {
        let group = match action.group {
            ActionGroup::Builtin => "builtin",
            ActionGroup::Specific => "specific",
            ActionGroup::Alternative => "alternative",
        };
        let shortcut = action
            .descriptor
            .shortcut
            .map(|shortcut| format!(" [{}{}]", shortcut.numeric, shortcut.alpha))
            .unwrap_or_default();
        println!(
            "{group}\t{}\t{}{shortcut}",
            action.descriptor.handler, action.descriptor.label
        );
    }
    for warning in &resolved.warnings {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

fn resolve_db_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| {
            std::env::var("NOTELIST_DB_PATH")
                .ok()
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
}
