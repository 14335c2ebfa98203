//! Command-line interface for My Code Organizer
//!
//! Maps subcommands onto catalog operations: adding folders, listing,
//! searching, favorites and languages.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mco_config::{CatalogConfig, ConfigManager};
use mco_core::Catalog;
use mco_types::OutputFormat;

pub mod commands;
pub mod output;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "mco")]
#[command(about = "Catalog your local code projects, mark favorites and search them")]
#[command(version)]
pub struct Cli {
    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Database path (defaults to <data dir>/my-code-organizer/projects.db)
    #[arg(long)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Add a project folder to the catalog
    Add {
        /// Project directory
        path: String,

        /// Display name (defaults to the folder name)
        #[arg(long)]
        name: Option<String>,

        /// Language tag, e.g. Rust
        #[arg(long)]
        language: Option<String>,

        /// Free-form description
        #[arg(long)]
        description: Option<String>,
    },

    /// List every project, most recently modified first
    List {
        /// Output format
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Search projects by text, language and favorite flag
    Search {
        /// Substring matched against name, path and description
        query: Option<String>,

        /// Only projects with exactly this language
        #[arg(long)]
        language: Option<String>,

        /// Only favorite projects
        #[arg(long)]
        favorites: bool,

        /// Output format
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Show a single project
    Show {
        /// Project id
        id: i64,

        /// Output format
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Remove a project from the catalog (the directory is left alone)
    Delete {
        /// Project id
        id: i64,
    },

    /// Toggle the favorite flag of a project
    Favorite {
        /// Project id
        id: i64,
    },

    /// List the languages in use
    Languages {
        /// Output format
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Show current configuration
    Config {
        /// Output format
        #[arg(long)]
        format: Option<OutputFormat>,
    },
}

/// Main CLI runner
pub struct CliRunner {
    config: CatalogConfig,
    catalog: Catalog,
}

impl CliRunner {
    /// Load configuration and open the catalog
    pub fn new(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = if let Some(config_path) = &cli.config {
            ConfigManager::load_from_path(config_path)?
        } else {
            ConfigManager::load_config()?
        };

        if let Some(database) = &cli.database {
            config.database_path = Some(database.clone());
        }

        let database_path = config.database_path()?;
        log::debug!("Using catalog database {}", database_path.display());
        let catalog = Catalog::open(&database_path)
            .with_context(|| format!("Failed to open catalog at {}", database_path.display()))?;

        Ok(Self::with_catalog(config, catalog))
    }

    /// Build a runner around an already opened catalog
    pub fn with_catalog(config: CatalogConfig, catalog: Catalog) -> Self {
        Self { config, catalog }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Run the CLI command, printing to stdout
    pub fn run(&mut self, command: &Commands) -> anyhow::Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        self.run_to_writer(command, &mut handle)
    }

    /// Run the CLI command, printing to `writer`
    pub fn run_to_writer<W: Write>(&mut self, command: &Commands, writer: &mut W) -> anyhow::Result<()> {
        match command {
            Commands::Add { path, name, language, description } => self.run_add(
                path,
                name.as_deref(),
                language.as_deref(),
                description.as_deref(),
                writer,
            ),
            Commands::List { format } => self.run_list(self.format_or_default(*format), writer),
            Commands::Search { query, language, favorites, format } => self.run_search(
                query.as_deref(),
                language.as_deref(),
                *favorites,
                self.format_or_default(*format),
                writer,
            ),
            Commands::Show { id, format } => {
                self.run_show(*id, self.format_or_default(*format), writer)
            }
            Commands::Delete { id } => self.run_delete(*id, writer),
            Commands::Favorite { id } => self.run_favorite(*id, writer),
            Commands::Languages { format } => {
                self.run_languages(self.format_or_default(*format), writer)
            }
            Commands::Config { format } => self.run_config(self.format_or_default(*format), writer),
        }
    }

    fn format_or_default(&self, format: Option<OutputFormat>) -> OutputFormat {
        format.unwrap_or(self.config.default_format)
    }

    /// Close the catalog database
    pub fn close(mut self) -> anyhow::Result<()> {
        self.catalog.close()?;
        Ok(())
    }

    /// Run the command, then close the catalog
    ///
    /// The command's error is returned even if closing fails as well; the
    /// close failure is logged.
    pub fn run_and_close(mut self, command: &Commands) -> anyhow::Result<()> {
        let result = self.run(command);
        if let Err(e) = &result {
            log::error!("CLI command failed: {}", e);
        }
        merge_close_result(result, self.close())
    }
}

fn merge_close_result(result: anyhow::Result<()>, closed: anyhow::Result<()>) -> anyhow::Result<()> {
    match result {
        Ok(()) => closed,
        Err(e) => {
            if let Err(close_err) = closed {
                log::error!("Failed to close catalog: {}", close_err);
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_command_factory() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "mco",
            "-vv",
            "--config",
            "/tmp/mco.yaml",
            "--database",
            "/tmp/projects.db",
            "list",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/mco.yaml")));
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/projects.db")));
        assert_eq!(cli.command, Commands::List { format: None });
    }

    #[test]
    fn test_cli_add_options() {
        let cli = Cli::try_parse_from([
            "mco",
            "add",
            "~/code/demo",
            "--name",
            "Demo",
            "--language",
            "Rust",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Commands::Add {
                path: "~/code/demo".to_string(),
                name: Some("Demo".to_string()),
                language: Some("Rust".to_string()),
                description: None,
            }
        );
    }

    #[test]
    fn test_cli_search_options() {
        let cli = Cli::try_parse_from(["mco", "search", "demo", "--favorites", "--format", "json"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Search {
                query: Some("demo".to_string()),
                language: None,
                favorites: true,
                format: Some(OutputFormat::Json),
            }
        );

        let cli = Cli::try_parse_from(["mco", "search", "--language", "Go"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Search { query: None, ref language, favorites: false, format: None }
                if language.as_deref() == Some("Go")
        ));
    }

    #[test]
    fn test_cli_rejects_bad_input() {
        assert!(Cli::try_parse_from(["mco", "list", "--format", "xml"]).is_err());
        assert!(Cli::try_parse_from(["mco", "show", "abc"]).is_err());
        assert!(Cli::try_parse_from(["mco", "add"]).is_err());
        assert!(Cli::try_parse_from(["mco"]).is_err());
    }

    #[test]
    fn test_command_error_wins_over_close_error() {
        let merged = merge_close_result(
            Err(anyhow::anyhow!("Project #7 not found")),
            Err(anyhow::anyhow!("database is locked")),
        );
        assert_eq!(merged.unwrap_err().to_string(), "Project #7 not found");

        let merged = merge_close_result(Ok(()), Err(anyhow::anyhow!("database is locked")));
        assert_eq!(merged.unwrap_err().to_string(), "database is locked");

        assert!(merge_close_result(Ok(()), Ok(())).is_ok());
    }

    #[test]
    fn test_run_and_close_returns_command_error() -> anyhow::Result<()> {
        let runner = CliRunner::with_catalog(
            CatalogConfig::default(),
            Catalog::new(mco_core::Store::in_memory())?,
        );

        let err = runner
            .run_and_close(&Commands::Delete { id: 99 })
            .unwrap_err();
        assert_eq!(err.to_string(), "Project #99 not found");
        Ok(())
    }

    #[test]
    fn test_runner_uses_configured_default_format() -> anyhow::Result<()> {
        let config = CatalogConfig {
            default_format: OutputFormat::Json,
            ..CatalogConfig::default()
        };
        let runner = CliRunner::with_catalog(config, Catalog::new(mco_core::Store::in_memory())?);

        assert_eq!(runner.format_or_default(None), OutputFormat::Json);
        assert_eq!(runner.format_or_default(Some(OutputFormat::Yaml)), OutputFormat::Yaml);
        Ok(())
    }
}
