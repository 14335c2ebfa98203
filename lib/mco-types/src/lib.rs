use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A catalogued project directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    /// Identifier assigned by the store on insertion
    pub id: i64,
    /// User-supplied label
    pub name: String,
    /// Absolute path to the project directory
    pub path: PathBuf,
    /// Free-form language tag, e.g. "Rust"
    pub language: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Modification time of the directory when it was added, if it existed then
    pub last_modified: Option<DateTime<Utc>>,
    /// Whether the project is marked as a favorite
    pub is_favorite: bool,
    /// Timestamp when the project was inserted
    pub created_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Language tag if it is set and non-empty
    pub fn language_tag(&self) -> Option<&str> {
        self.language.as_deref().filter(|l| !l.is_empty())
    }
}

/// Filters for searching the catalog
///
/// Every filter is optional. A default filter matches every project.
///
/// # Examples
/// ```
/// use mco_types::SearchFilter;
///
/// let filter = SearchFilter::new().query("demo").language("Go").favorites_only(true);
/// assert_eq!(filter.query, "demo");
/// assert_eq!(filter.language.as_deref(), Some("Go"));
/// assert!(filter.favorites_only);
/// assert!(SearchFilter::default().is_unfiltered());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchFilter {
    /// Case-insensitive substring matched against name, path and description
    pub query: String,
    /// Exact, case-sensitive language match
    pub language: Option<String>,
    /// Only return favorites
    pub favorites_only: bool,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn favorites_only(mut self, favorites_only: bool) -> Self {
        self.favorites_only = favorites_only;
        self
    }

    /// Language filter if it is set and non-empty
    pub fn language_filter(&self) -> Option<&str> {
        self.language.as_deref().filter(|l| !l.is_empty())
    }

    /// True when no filter narrows the result set
    pub fn is_unfiltered(&self) -> bool {
        self.query.is_empty() && self.language_filter().is_none() && !self.favorites_only
    }
}

/// Output formats understood by the presentation layer
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// Error returned when parsing an unknown output format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormat(pub String);

impl std::fmt::Display for UnknownFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown output format '{}' (expected table, json or yaml)", self.0)
    }
}

impl std::error::Error for UnknownFormat {}

impl std::str::FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_project() -> Project {
        Project {
            id: 7,
            name: "demo".to_string(),
            path: PathBuf::from("/tmp/demo"),
            language: Some("Go".to_string()),
            description: Some("desc".to_string()),
            last_modified: None,
            is_favorite: false,
            created_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_language_tag() {
        let mut project = sample_project();
        assert_eq!(project.language_tag(), Some("Go"));

        project.language = Some(String::new());
        assert_eq!(project.language_tag(), None);

        project.language = None;
        assert_eq!(project.language_tag(), None);
    }

    #[test]
    fn test_search_filter_defaults() {
        let filter = SearchFilter::default();
        assert!(filter.query.is_empty());
        assert!(filter.language.is_none());
        assert!(!filter.favorites_only);
        assert!(filter.is_unfiltered());
    }

    #[test]
    fn test_search_filter_empty_language_is_unfiltered() {
        let filter = SearchFilter::new().language("");
        assert_eq!(filter.language_filter(), None);
        assert!(filter.is_unfiltered());

        let filter = SearchFilter::new().language("Rust");
        assert_eq!(filter.language_filter(), Some("Rust"));
        assert!(!filter.is_unfiltered());
    }

    #[test]
    fn test_search_filter_favorites_only() {
        let filter = SearchFilter::new().favorites_only(true);
        assert!(!filter.is_unfiltered());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("yml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Yaml.to_string(), "yaml");
    }

    #[test]
    fn test_project_serialization() {
        let project = sample_project();
        let json = serde_json::to_string(&project).unwrap();
        assert!(json.contains("\"name\":\"demo\""));
        assert!(json.contains("\"is_favorite\":false"));

        let back: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(back, project);
    }

    #[test]
    fn test_output_format_serde_lowercase() {
        let yaml = serde_yaml::to_string(&OutputFormat::Json).unwrap();
        assert_eq!(yaml.trim(), "json");
        let parsed: OutputFormat = serde_yaml::from_str("yaml").unwrap();
        assert_eq!(parsed, OutputFormat::Yaml);
    }
}
