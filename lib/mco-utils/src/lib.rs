//! Utility functions for My Code Organizer
//!
//! Path helpers (data directory, database location, display formatting) and the
//! text codec used for timestamps stored in SQLite.

use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};

/// Directory name used under the per-user data directory
pub const APP_DIR_NAME: &str = "my-code-organizer";

/// File name of the catalog database
pub const DB_FILE_NAME: &str = "projects.db";

/// Storage format for timestamps, the same shape SQLite's CURRENT_TIMESTAMP produces
pub const SQL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Get the per-user data directory for the application
///
/// Falls back to `~/.local/share` when the platform reports no data directory.
pub fn app_data_dir() -> anyhow::Result<PathBuf> {
    let base = match dirs::data_dir() {
        Some(dir) => dir,
        None => {
            let home =
                dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
            home.join(".local").join("share")
        }
    };
    Ok(base.join(APP_DIR_NAME))
}

/// Get the default database path
pub fn default_db_path() -> anyhow::Result<PathBuf> {
    Ok(app_data_dir()?.join(DB_FILE_NAME))
}

/// Filesystem modification time of a path, if it currently exists
pub fn modified_time(path: &Path) -> Option<DateTime<Utc>> {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

/// Format a timestamp for storage as naive local time
///
/// Directory modification times have always been stored as local wall-clock
/// text without an offset, so new rows sort consistently with existing ones.
///
/// # Examples
/// ```
/// use chrono::{Local, TimeZone, Utc};
/// use mco_utils::format_local_timestamp;
///
/// let ts = Local.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
/// assert_eq!(format_local_timestamp(&ts.with_timezone(&Utc)), "2024-03-01 09:30:00");
/// ```
pub fn format_local_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format(SQL_TIMESTAMP_FORMAT)
        .to_string()
}

/// Parse a stored timestamp whose naive form is UTC, e.g. `CURRENT_TIMESTAMP`
///
/// Accepts the storage format, the `T`-separated ISO form and RFC 3339.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    parse_with(value, |naive| {
        Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
    })
}

/// Parse a stored timestamp whose naive form is local wall-clock time
///
/// Values carrying an offset are taken as is. A local time skipped by a DST
/// change is read one hour later.
pub fn parse_local_timestamp(value: &str) -> Option<DateTime<Utc>> {
    parse_with(value, |naive| {
        Local
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| Local.from_local_datetime(&(naive + Duration::hours(1))).earliest())
            .map(|dt| dt.with_timezone(&Utc))
    })
}

fn parse_with<F>(value: &str, from_naive: F) -> Option<DateTime<Utc>>
where
    F: Fn(NaiveDateTime) -> Option<DateTime<Utc>>,
{
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    [SQL_TIMESTAMP_FORMAT, "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .and_then(from_naive)
}

/// Normalize a path to absolute path, resolving relative components
pub fn normalize_path(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        return path.canonicalize().map_err(Into::into);
    }

    let current_dir = get_current_dir()?;
    current_dir.join(path).canonicalize().map_err(Into::into)
}

/// Turn user input into the path stored in the catalog
///
/// Expands a leading `~`. When `resolve` is set the result is made absolute:
/// existing paths are canonicalized, missing ones are joined onto the current
/// directory as they are.
pub fn resolve_project_path(input: &str, resolve: bool) -> anyhow::Result<PathBuf> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(anyhow::anyhow!("Project path cannot be empty"));
    }

    let expanded = expand_tilde(trimmed)?;
    if !resolve {
        return Ok(expanded);
    }

    if expanded.exists() {
        return normalize_path(&expanded);
    }

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(get_current_dir()?.join(expanded))
    }
}

/// Default project name for a directory: its final path component
pub fn default_project_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
}

/// Format a path for display, making it relative to home if possible
pub fn format_path_display(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(relative) = path.strip_prefix(&home) {
            if relative.as_os_str().is_empty() {
                return "~/".to_string();
            } else {
                return format!("~/{}", relative.display());
            }
        }
    }
    path.display().to_string()
}

/// Get the current working directory safely
pub fn get_current_dir() -> anyhow::Result<PathBuf> {
    std::env::current_dir().map_err(Into::into)
}

/// Expand tilde (~) in path strings
pub fn expand_tilde(path: &str) -> anyhow::Result<PathBuf> {
    if let Some(stripped) = path.strip_prefix('~') {
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        let relative_path = stripped.strip_prefix('/').unwrap_or(stripped);
        Ok(home.join(relative_path))
    } else {
        Ok(PathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_db_path() {
        let db_path = default_db_path().unwrap();
        assert!(db_path.ends_with("my-code-organizer/projects.db"));
    }

    #[test]
    fn test_app_data_dir() {
        let dir = app_data_dir().unwrap();
        assert!(dir.ends_with(APP_DIR_NAME));
        assert!(dir.is_absolute());
    }

    #[test]
    fn test_modified_time_existing_dir() {
        let temp_dir = tempdir().unwrap();
        let mtime = modified_time(temp_dir.path());
        assert!(mtime.is_some());
        assert!(mtime.unwrap() <= Utc::now());
    }

    #[test]
    fn test_modified_time_missing_path() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("does-not-exist");
        assert!(modified_time(&missing).is_none());
    }

    #[test]
    fn test_format_local_timestamp_matches_sqlite_shape() {
        let ts = Local.with_ymd_and_hms(2023, 1, 5, 14, 2, 9).unwrap();
        assert_eq!(format_local_timestamp(&ts.with_timezone(&Utc)), "2023-01-05 14:02:09");

        let with_fraction = ts.with_nanosecond(250_000_000).unwrap();
        assert_eq!(
            format_local_timestamp(&with_fraction.with_timezone(&Utc)),
            "2023-01-05 14:02:09.250"
        );
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2023, 11, 5, 14, 2, 9).unwrap();

        assert_eq!(parse_timestamp("2023-11-05 14:02:09"), Some(expected));
        assert_eq!(parse_timestamp("2023-11-05T14:02:09"), Some(expected));
        assert_eq!(parse_timestamp("2023-11-05T14:02:09+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-11-05T16:02:09+02:00"), Some(expected));

        let fractional = parse_timestamp("2023-11-05 14:02:09.123456").unwrap();
        assert_eq!(fractional.nanosecond(), 123_456_000);
    }

    #[test]
    fn test_parse_local_timestamp_reads_wall_clock_time() {
        let expected = Local
            .with_ymd_and_hms(2023, 1, 5, 14, 2, 9)
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(parse_local_timestamp("2023-01-05 14:02:09"), Some(expected));
        assert_eq!(parse_local_timestamp("2023-01-05T14:02:09"), Some(expected));
    }

    #[test]
    fn test_parse_local_timestamp_keeps_explicit_offset() {
        let expected = Utc.with_ymd_and_hms(2023, 11, 5, 14, 2, 9).unwrap();
        assert_eq!(parse_local_timestamp("2023-11-05T16:02:09+02:00"), Some(expected));
    }

    #[test]
    fn test_local_timestamp_round_trip() {
        let ts = Local
            .with_ymd_and_hms(2023, 1, 20, 8, 15, 42)
            .unwrap()
            .with_nanosecond(987_654_000)
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(parse_local_timestamp(&format_local_timestamp(&ts)), Some(ts));
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_local_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_timestamp_text_orders_chronologically() {
        let earlier = Local.with_ymd_and_hms(2023, 1, 9, 23, 59, 59).unwrap();
        let later = Local.with_ymd_and_hms(2023, 1, 10, 0, 0, 0).unwrap();
        assert!(
            format_local_timestamp(&earlier.with_timezone(&Utc))
                < format_local_timestamp(&later.with_timezone(&Utc))
        );
    }

    #[test]
    fn test_normalize_path() {
        let temp_dir = tempdir().unwrap();
        let normalized = normalize_path(temp_dir.path()).unwrap();
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_path_errors() {
        let result = normalize_path(Path::new("/non/existent/path/for/mco"));
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_project_path_existing() {
        let temp_dir = tempdir().unwrap();
        let project = temp_dir.path().join("proj");
        fs::create_dir(&project).unwrap();

        let resolved = resolve_project_path(project.to_str().unwrap(), true).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("proj"));
    }

    #[test]
    fn test_resolve_project_path_missing_relative() {
        let resolved = resolve_project_path("not-here-mco-test", true).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("not-here-mco-test"));
    }

    #[test]
    fn test_resolve_project_path_without_resolution() {
        let resolved = resolve_project_path("relative/dir", false).unwrap();
        assert_eq!(resolved, PathBuf::from("relative/dir"));
    }

    #[test]
    fn test_resolve_project_path_empty() {
        assert!(resolve_project_path("   ", true).is_err());
    }

    #[test]
    fn test_default_project_name() {
        assert_eq!(
            default_project_name(Path::new("/home/user/code/demo")),
            Some("demo".to_string())
        );
        assert_eq!(default_project_name(Path::new("/")), None);
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/test").unwrap();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("test"));
        }

        let no_tilde = expand_tilde("/absolute/path").unwrap();
        assert_eq!(no_tilde, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_format_path_display() {
        if let Some(home) = dirs::home_dir() {
            let home_subpath = home.join("projects");
            let display = format_path_display(&home_subpath);
            assert!(display.starts_with("~/"));
        }

        let absolute_path = Path::new("/tmp/test");
        let display = format_path_display(absolute_path);
        assert_eq!(display, "/tmp/test");
    }

    #[test]
    fn test_format_path_display_home() {
        if let Some(home) = dirs::home_dir() {
            let display = format_path_display(&home);
            assert_eq!(display, "~/");
        }
    }

    #[test]
    fn test_get_current_dir() {
        let current = get_current_dir().unwrap();
        assert!(current.is_absolute());
        assert!(current.is_dir());
    }
}
