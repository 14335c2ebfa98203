//! Database layer for My Code Organizer
//!
//! [`Store`] owns the SQLite connection behind the catalog. It is constructed
//! explicitly, connected once at process start and closed at shutdown.

use mco_utils::default_db_path;
use rusqlite::Connection;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("Failed to open database at {path}: {message}")]
    Open { path: PathBuf, message: String },
    #[error("Database is not connected")]
    NotConnected,
}

/// Result type for database operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Database schema definitions
///
/// Table shapes match databases written by earlier releases of the organizer,
/// so an existing `projects.db` opens unchanged.
mod schema {
    pub const CREATE_PROJECTS_TABLE: &str = r#"
        CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            path TEXT NOT NULL UNIQUE,
            language TEXT,
            description TEXT,
            last_modified TIMESTAMP,
            is_favorite INTEGER DEFAULT 0,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
    "#;

    // Reserved: nothing reads or writes tags yet.
    pub const CREATE_TAGS_TABLE: &str = r#"
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            color TEXT DEFAULT '#3584e4'
        )
    "#;

    pub const CREATE_PROJECT_TAGS_TABLE: &str = r#"
        CREATE TABLE IF NOT EXISTS project_tags (
            project_id INTEGER,
            tag_id INTEGER,
            PRIMARY KEY (project_id, tag_id),
            FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
            FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
        )
    "#;

    pub const CREATE_PROJECTS_LAST_MODIFIED_INDEX: &str = r#"
        CREATE INDEX IF NOT EXISTS idx_projects_last_modified ON projects (last_modified)
    "#;

    pub const CREATE_PROJECTS_LANGUAGE_INDEX: &str = r#"
        CREATE INDEX IF NOT EXISTS idx_projects_language ON projects (language)
    "#;

    pub fn all_statements() -> [&'static str; 5] {
        [
            CREATE_PROJECTS_TABLE,
            CREATE_TAGS_TABLE,
            CREATE_PROJECT_TAGS_TABLE,
            CREATE_PROJECTS_LAST_MODIFIED_INDEX,
            CREATE_PROJECTS_LANGUAGE_INDEX,
        ]
    }
}

/// Where a [`Store`] keeps its data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

impl std::fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreLocation::File(path) => write!(f, "{}", path.display()),
            StoreLocation::Memory => write!(f, ":memory:"),
        }
    }
}

/// Owner of the catalog database connection
pub struct Store {
    location: StoreLocation,
    conn: Option<Connection>,
}

impl Store {
    /// Create an unconnected store for a database file
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            location: StoreLocation::File(path.as_ref().to_path_buf()),
            conn: None,
        }
    }

    /// Create an unconnected in-memory store
    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            conn: None,
        }
    }

    /// Open a database at a specific path, creating file and directory if needed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut store = Self::new(path);
        store.connect()?;
        Ok(store)
    }

    /// Open the database at the per-user default path
    pub fn open_default() -> Result<Self> {
        let db_path = default_db_path()?;
        Self::open(db_path)
    }

    /// Open a connected in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let mut store = Self::in_memory();
        store.connect()?;
        Ok(store)
    }

    /// Open the connection and make sure the schema exists
    ///
    /// Does nothing if the store is already connected.
    pub fn connect(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Ok(());
        }

        let conn = match &self.location {
            StoreLocation::File(path) => Self::open_file(path)?,
            StoreLocation::Memory => Connection::open_in_memory()?,
        };

        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Self::create_schema(&conn)?;

        log::info!("Opened catalog database at {}", self.location);
        self.conn = Some(conn);
        Ok(())
    }

    fn open_file(path: &Path) -> Result<Connection> {
        let open_error = |message: String| DatabaseError::Open {
            path: path.to_path_buf(),
            message,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| open_error(e.to_string()))?;
        }

        Connection::open(path).map_err(|e| open_error(e.to_string()))
    }

    /// Release the connection
    ///
    /// Safe to call on a store that was never connected, and more than once.
    pub fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| DatabaseError::Sqlite(e))?;
            log::debug!("Closed catalog database at {}", self.location);
        }
        Ok(())
    }

    /// Connection for issuing statements
    ///
    /// Fails with [`DatabaseError::NotConnected`] before `connect` or after `close`.
    pub fn connection(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(DatabaseError::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Create any missing tables and indexes
    pub fn initialize_schema(&self) -> Result<()> {
        Self::create_schema(self.connection()?)
    }

    fn create_schema(conn: &Connection) -> Result<()> {
        for statement in schema::all_statements() {
            conn.execute(statement, [])?;
        }
        log::debug!("Schema initialized");
        Ok(())
    }

    /// Names of the user tables in the database, sorted
    pub fn table_names(&self) -> Result<Vec<String>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut names = Vec::new();
        for name in rows {
            names.push(name?);
        }
        Ok(names)
    }
}

/// True if `err` is a UNIQUE constraint failure
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
