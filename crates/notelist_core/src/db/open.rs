//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure pragmas the note store relies on.
//! - Run schema migrations before handing out a connection.
//!
//! # Invariants
//! - Returned connections have a bounded busy timeout, so store calls either
//!   complete or fail instead of blocking indefinitely.
//! - Returned connections have migrations fully applied.
//! - Returned connections expose `FOLD_FUNCTION` for Unicode-aware,
//!   case-insensitive text matching.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{error, info};
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQL scalar function lowercasing its text argument with `fold_case`.
pub const FOLD_FUNCTION: &str = "notelist_fold";

/// Case folding shared by SQL matching and the values bound against it.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path))
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    register_functions(conn)?;
    apply_migrations(conn)?;
    Ok(())
}

fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        FOLD_FUNCTION,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|value| fold_case(&value)))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::{fold_case, open_db_in_memory, FOLD_FUNCTION};

    #[test]
    fn fold_case_lowercases_beyond_ascii() {
        assert_eq!(fold_case("Éclair"), "éclair");
        assert_eq!(fold_case("ПРИВЕТ"), "привет");
        assert_eq!(fold_case("100% Done"), "100% done");
    }

    #[test]
    fn fold_function_is_available_on_opened_connections() {
        let conn = open_db_in_memory().unwrap();
        let folded: String = conn
            .query_row(&format!("SELECT {FOLD_FUNCTION}('Привет Мир')"), [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(folded, "привет мир");

        let null: Option<String> = conn
            .query_row(&format!("SELECT {FOLD_FUNCTION}(NULL)"), [], |row| row.get(0))
            .unwrap();
        assert_eq!(null, None);
    }
}
