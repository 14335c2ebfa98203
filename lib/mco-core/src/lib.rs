//! Record operations over the project catalog
//!
//! [`Catalog`] owns a connected [`Store`] and exposes the operations the
//! presentation layer maps user intents onto: add, list, look up, delete,
//! search, toggle favorite and list languages.

use chrono::{DateTime, Utc};
use mco_db::is_unique_violation;
use mco_types::{Project, SearchFilter};
use mco_utils::{format_local_timestamp, modified_time, parse_local_timestamp, parse_timestamp};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod flow;

pub use flow::{AddProjectFlow, FlowError, FlowState, ProjectDraft};
pub use mco_db::{DatabaseError, Store, StoreLocation};

/// Catalog errors
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("A project with path {} is already in the catalog", .0.display())]
    DuplicatePath(PathBuf),
    #[error("Invalid project: {0}")]
    InvalidProject(String),
    #[error("Project {0} disappeared right after it was inserted")]
    MissingAfterInsert(i64),
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        CatalogError::Database(DatabaseError::Sqlite(err))
    }
}

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

const PROJECT_COLUMNS: &str =
    "id, name, path, language, description, last_modified, is_favorite, created_at";

// Latest modification first; projects whose directory was missing when added go last.
const ORDER_BY_RECENT: &str = "ORDER BY last_modified IS NULL, last_modified DESC, id DESC";

/// The project catalog
pub struct Catalog {
    store: Store,
}

impl Catalog {
    /// Build a catalog on top of a store, connecting it if needed
    pub fn new(mut store: Store) -> Result<Self> {
        store.connect()?;
        Ok(Self { store })
    }

    /// Open the catalog at the per-user default database path
    pub fn open_default() -> Result<Self> {
        Self::new(Store::open_default()?)
    }

    /// Open the catalog at a specific database path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(Store::open(path)?)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn into_store(self) -> Store {
        self.store
    }

    /// Close the underlying store; later operations fail with `NotConnected`
    pub fn close(&mut self) -> Result<()> {
        Ok(self.store.close()?)
    }

    fn conn(&self) -> Result<&Connection> {
        Ok(self.store.connection()?)
    }

    /// Add a project and return the stored record
    ///
    /// `last_modified` is taken from the directory's modification time if the
    /// path exists right now. Adding a path that is already catalogued fails
    /// with [`CatalogError::DuplicatePath`].
    pub fn add<P: AsRef<Path>>(
        &self,
        name: &str,
        path: P,
        language: Option<&str>,
        description: Option<&str>,
    ) -> Result<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::InvalidProject(
                "project name cannot be empty".to_string(),
            ));
        }

        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(CatalogError::InvalidProject(
                "project path cannot be empty".to_string(),
            ));
        }
        let path_text = path.to_str().ok_or_else(|| {
            CatalogError::InvalidProject(format!(
                "project path is not valid UTF-8: {}",
                path.display()
            ))
        })?;

        let last_modified = modified_time(path);
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO projects (name, path, language, description, last_modified)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                name,
                path_text,
                language,
                description,
                last_modified.as_ref().map(format_local_timestamp),
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                CatalogError::DuplicatePath(path.to_path_buf())
            } else {
                e.into()
            }
        })?;

        let id = conn.last_insert_rowid();
        log::info!("Added project {} ({}) as #{}", name, path.display(), id);

        self.get_by_id(id)?
            .ok_or(CatalogError::MissingAfterInsert(id))
    }

    /// Add the project described by a confirmed draft
    pub fn add_draft(&self, draft: &ProjectDraft) -> Result<Project> {
        self.add(
            &draft.name,
            &draft.path,
            draft.language.as_deref(),
            draft.description.as_deref(),
        )
    }

    /// Every project, most recently modified first
    pub fn get_all(&self) -> Result<Vec<Project>> {
        let sql = format!("SELECT {} FROM projects {}", PROJECT_COLUMNS, ORDER_BY_RECENT);
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], project_from_row)?;

        let mut projects = Vec::new();
        for project in rows {
            projects.push(project?);
        }
        Ok(projects)
    }

    /// Look up a project by id
    pub fn get_by_id(&self, id: i64) -> Result<Option<Project>> {
        let sql = format!("SELECT {} FROM projects WHERE id = ?", PROJECT_COLUMNS);
        let project = self
            .conn()?
            .query_row(&sql, params![id], project_from_row)
            .optional()?;
        Ok(project)
    }

    /// Remove a project from the catalog
    ///
    /// The directory itself is never touched. Returns whether a row was
    /// removed; a missing id is not an error.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let rows_affected = self
            .conn()?
            .execute("DELETE FROM projects WHERE id = ?", params![id])?;

        if rows_affected > 0 {
            log::info!("Deleted project #{}", id);
        } else {
            log::debug!("Delete of unknown project #{} ignored", id);
        }
        Ok(rows_affected > 0)
    }

    /// Search projects
    ///
    /// A non-empty query matches name, path or description as a
    /// case-insensitive substring. The language filter is an exact match.
    /// All filters are combined with AND; results use the same order as
    /// [`Catalog::get_all`].
    pub fn search(&self, filter: &SearchFilter) -> Result<Vec<Project>> {
        let mut sql = format!("SELECT {} FROM projects WHERE 1=1", PROJECT_COLUMNS);
        let mut values: Vec<String> = Vec::new();

        if !filter.query.is_empty() {
            sql.push_str(
                r" AND (name LIKE ? ESCAPE '\' OR path LIKE ? ESCAPE '\' OR description LIKE ? ESCAPE '\')",
            );
            let pattern = format!("%{}%", escape_like(&filter.query));
            values.extend([pattern.clone(), pattern.clone(), pattern]);
        }

        if let Some(language) = filter.language_filter() {
            sql.push_str(" AND language = ?");
            values.push(language.to_string());
        }

        if filter.favorites_only {
            sql.push_str(" AND is_favorite = 1");
        }

        sql.push(' ');
        sql.push_str(ORDER_BY_RECENT);

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), project_from_row)?;

        let mut projects = Vec::new();
        for project in rows {
            projects.push(project?);
        }
        Ok(projects)
    }

    /// Flip a project's favorite flag and return the new state
    ///
    /// Returns `None` without changing anything if the id is unknown.
    pub fn toggle_favorite(&self, id: i64) -> Result<Option<bool>> {
        let conn = self.conn()?;

        let current: Option<Option<i64>> = conn
            .query_row(
                "SELECT is_favorite FROM projects WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        let current = match current {
            Some(value) => value.unwrap_or(0) != 0,
            None => {
                log::debug!("Favorite toggle of unknown project #{} ignored", id);
                return Ok(None);
            }
        };

        let new_state = !current;
        conn.execute(
            "UPDATE projects SET is_favorite = ? WHERE id = ?",
            params![new_state as i64, id],
        )?;

        log::info!("Project #{} favorite = {}", id, new_state);
        Ok(Some(new_state))
    }

    /// Distinct non-empty languages, sorted ascending
    pub fn get_distinct_languages(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT language FROM projects
            WHERE language IS NOT NULL AND language != ''
            ORDER BY language
            "#,
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut languages = Vec::new();
        for language in rows {
            languages.push(language?);
        }
        Ok(languages)
    }

    /// Number of catalogued projects
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Escape LIKE wildcards so the query matches literally (escape char `\`)
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// `last_modified` holds local wall-clock text, `created_at` comes from CURRENT_TIMESTAMP (UTC).
fn timestamp_column<F>(row: &Row<'_>, idx: usize, parse: F) -> rusqlite::Result<Option<DateTime<Utc>>>
where
    F: Fn(&str) -> Option<DateTime<Utc>>,
{
    let value: Option<String> = row.get(idx)?;
    match value {
        None => Ok(None),
        Some(text) => parse(&text).map(Some).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                format!("invalid timestamp: {}", text).into(),
            )
        }),
    }
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    let path: String = row.get(2)?;
    let is_favorite: Option<i64> = row.get(6)?;

    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        path: PathBuf::from(path),
        language: row.get(3)?,
        description: row.get(4)?,
        last_modified: timestamp_column(row, 5, parse_local_timestamp)?,
        is_favorite: is_favorite.unwrap_or(0) != 0,
        created_at: timestamp_column(row, 7, parse_timestamp)?,
    })
}
