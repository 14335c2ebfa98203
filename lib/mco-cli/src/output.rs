//! Output formatting utilities

use std::io::Write;

use comfy_table::Table;
use mco_config::CatalogConfig;
use mco_types::{OutputFormat, Project};
use mco_utils::format_path_display;

/// Message printed when the catalog is empty
pub const NO_PROJECTS: &str = "No Projects";

/// Message printed when a search matches nothing
pub const NO_MATCHING_PROJECTS: &str = "No Matching Projects";

const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Output formatter
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Write a project list; `empty_message` replaces the table when there is nothing to show
    pub fn format_projects<W: Write>(
        &self,
        projects: &[Project],
        empty_message: &str,
        writer: &mut W,
    ) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Table => self.format_projects_table(projects, empty_message, writer),
            OutputFormat::Json => write_json(projects, writer),
            OutputFormat::Yaml => write_yaml(projects, writer),
        }
    }

    pub fn format_project<W: Write>(&self, project: &Project, writer: &mut W) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Table => self.format_project_table(project, writer),
            OutputFormat::Json => write_json(project, writer),
            OutputFormat::Yaml => write_yaml(project, writer),
        }
    }

    pub fn format_languages<W: Write>(&self, languages: &[String], writer: &mut W) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Table => {
                if languages.is_empty() {
                    writeln!(writer, "No Languages")?;
                    return Ok(());
                }
                let mut table = Table::new();
                table.set_header(vec!["Language"]);
                for language in languages {
                    table.add_row(vec![language.as_str()]);
                }
                writeln!(writer, "{}", table)?;
                Ok(())
            }
            OutputFormat::Json => write_json(languages, writer),
            OutputFormat::Yaml => write_yaml(languages, writer),
        }
    }

    pub fn format_config<W: Write>(&self, config: &CatalogConfig, writer: &mut W) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Table => {
                let database_path = config
                    .database_path
                    .as_ref()
                    .map(|p| format_path_display(p))
                    .unwrap_or_else(|| "(default)".to_string());

                let mut table = Table::new();
                table.set_header(vec!["Setting", "Value"]);
                table.add_row(vec!["database_path".to_string(), database_path]);
                table.add_row(vec!["default_format".to_string(), config.default_format.to_string()]);
                table.add_row(vec!["resolve_paths".to_string(), config.resolve_paths.to_string()]);
                writeln!(writer, "{}", table)?;
                Ok(())
            }
            OutputFormat::Json => write_json(config, writer),
            OutputFormat::Yaml => write_yaml(config, writer),
        }
    }
}

impl OutputFormatter {
    fn format_projects_table<W: Write>(
        &self,
        projects: &[Project],
        empty_message: &str,
        writer: &mut W,
    ) -> anyhow::Result<()> {
        if projects.is_empty() {
            writeln!(writer, "{}", empty_message)?;
            return Ok(());
        }

        let mut table = Table::new();
        table.set_header(vec!["ID", "Name", "Path", "Language", "Modified", "Fav"]);

        for project in projects {
            table.add_row(vec![
                project.id.to_string(),
                project.name.clone(),
                format_path_display(&project.path),
                project.language_tag().unwrap_or("-").to_string(),
                format_time(project.last_modified.as_ref()),
                if project.is_favorite { "*" } else { "" }.to_string(),
            ]);
        }

        writeln!(writer, "{}", table)?;
        Ok(())
    }

    fn format_project_table<W: Write>(&self, project: &Project, writer: &mut W) -> anyhow::Result<()> {
        let mut table = Table::new();
        table.set_header(vec!["Field", "Value"]);

        table.add_row(vec!["ID".to_string(), project.id.to_string()]);
        table.add_row(vec!["Name".to_string(), project.name.clone()]);
        table.add_row(vec!["Path".to_string(), project.path.display().to_string()]);
        table.add_row(vec![
            "Language".to_string(),
            project.language_tag().unwrap_or("-").to_string(),
        ]);
        table.add_row(vec![
            "Description".to_string(),
            project.description.clone().unwrap_or_default(),
        ]);
        table.add_row(vec![
            "Modified".to_string(),
            format_time(project.last_modified.as_ref()),
        ]);
        table.add_row(vec!["Added".to_string(), format_time(project.created_at.as_ref())]);
        table.add_row(vec![
            "Favorite".to_string(),
            if project.is_favorite { "yes" } else { "no" }.to_string(),
        ]);

        writeln!(writer, "{}", table)?;
        Ok(())
    }
}

fn format_time(timestamp: Option<&chrono::DateTime<chrono::Utc>>) -> String {
    timestamp
        .map(|t| t.format(DISPLAY_TIME_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn write_json<T: serde::Serialize + ?Sized, W: Write>(value: &T, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

fn write_yaml<T: serde::Serialize + ?Sized, W: Write>(value: &T, writer: &mut W) -> anyhow::Result<()> {
    serde_yaml::to_writer(writer, value)?;
    Ok(())
}
