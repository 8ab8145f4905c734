use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failures while bringing a database connection up. Anything past this point
/// is an ordinary storage error reported by the individual operation.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to create data directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to open SQLite database at {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to prepare schema: {step}")]
    Schema {
        step: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

/// Owns the single connection the application talks through. The connection
/// is opened on first use, reused until [`ConnectionProvider::close`], and
/// re-opened transparently if requested again afterwards.
pub struct ConnectionProvider {
    path: PathBuf,
    conn: Option<Connection>,
}

impl ConnectionProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Borrow the live connection, opening it first if needed.
    pub fn connection(&mut self) -> Result<&mut Connection, ConnectionError> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => open_database(&self.path)?,
        };
        Ok(self.conn.insert(conn))
    }

    /// Close the connection if one is open. Calling this twice is harmless.
    pub fn close(&mut self) -> Result<(), rusqlite::Error> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        match conn.close() {
            Ok(()) => {
                info!(path = %self.path.display(), "database connection closed");
                Ok(())
            }
            Err((conn, err)) => {
                warn!(error = %err, "failed to close database connection");
                self.conn = Some(conn);
                Err(err)
            }
        }
    }
}

impl Drop for ConnectionProvider {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Open the database file, turn on foreign keys and create any missing tables.
/// `PRAGMA foreign_keys` is per-connection in SQLite, so every (re)open has to
/// set it again or the cascades silently stop working.
fn open_database(path: &Path) -> Result<Connection, ConnectionError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConnectionError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let conn = Connection::open(path).map_err(|source| ConnectionError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .map_err(|source| ConnectionError::Schema {
            step: "enable foreign keys",
            source,
        })?;

    ensure_schema(&conn)?;
    info!(path = %path.display(), "database connection opened");
    Ok(conn)
}

/// Create the four tables if they do not exist yet.
pub fn ensure_schema(conn: &Connection) -> Result<(), ConnectionError> {
    let tables: [(&'static str, &str); 4] = [
        (
            "create author table",
            "CREATE TABLE IF NOT EXISTS author (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL DEFAULT '',
                bio TEXT
            )",
        ),
        (
            "create ingredient table",
            "CREATE TABLE IF NOT EXISTS ingredient (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                health_score INTEGER NOT NULL
            )",
        ),
        (
            "create recipe table",
            "CREATE TABLE IF NOT EXISTS recipe (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                instructions TEXT NOT NULL,
                prep_minutes INTEGER NOT NULL,
                cook_minutes INTEGER NOT NULL,
                author_id INTEGER NOT NULL,
                FOREIGN KEY(author_id) REFERENCES author(id) ON DELETE CASCADE
            )",
        ),
        (
            "create recipe_ingredient table",
            "CREATE TABLE IF NOT EXISTS recipe_ingredient (
                recipe_id INTEGER NOT NULL,
                ingredient_id INTEGER NOT NULL,
                quantity TEXT NOT NULL,
                FOREIGN KEY(recipe_id) REFERENCES recipe(id) ON DELETE CASCADE,
                FOREIGN KEY(ingredient_id) REFERENCES ingredient(id) ON DELETE CASCADE
            )",
        ),
    ];

    for (step, sql) in tables {
        conn.execute(sql, [])
            .map_err(|source| ConnectionError::Schema { step, source })?;
    }
    debug!("schema ready");
    Ok(())
}
