//! CLI command implementations

use std::io::Write;

use mco_core::AddProjectFlow;
use mco_types::{OutputFormat, SearchFilter};
use mco_utils::{format_path_display, resolve_project_path};

use crate::output::{OutputFormatter, NO_MATCHING_PROJECTS, NO_PROJECTS};
use crate::CliRunner;

impl CliRunner {
    /// Run the add command
    ///
    /// Walks the add-project flow: the folder is picked from `path`, the
    /// details default to the folder name and blanks, then the draft is
    /// confirmed and stored.
    pub fn run_add<W: Write>(
        &self,
        path: &str,
        name: Option<&str>,
        language: Option<&str>,
        description: Option<&str>,
        writer: &mut W,
    ) -> anyhow::Result<()> {
        let path = resolve_project_path(path, self.config.resolve_paths)?;
        if !path.exists() {
            log::warn!(
                "{} does not exist; it is added without a modification time",
                path.display()
            );
        }

        let mut flow = AddProjectFlow::new();
        flow.folder_selected(path)?;
        if let Some(name) = name {
            flow.set_name(name)?;
        }
        if let Some(language) = language {
            flow.set_language(language)?;
        }
        if let Some(description) = description {
            flow.set_description(description)?;
        }
        let draft = flow.confirm()?;

        let project = self.catalog.add_draft(&draft)?;
        writeln!(
            writer,
            "Added project #{}: {} ({})",
            project.id,
            project.name,
            format_path_display(&project.path)
        )?;
        Ok(())
    }

    /// Run the list command
    pub fn run_list<W: Write>(&self, format: OutputFormat, writer: &mut W) -> anyhow::Result<()> {
        let projects = self.catalog.get_all()?;
        log::debug!("Listing {} projects", projects.len());

        OutputFormatter::new(format).format_projects(&projects, NO_PROJECTS, writer)
    }

    /// Run the search command
    pub fn run_search<W: Write>(
        &self,
        query: Option<&str>,
        language: Option<&str>,
        favorites_only: bool,
        format: OutputFormat,
        writer: &mut W,
    ) -> anyhow::Result<()> {
        let mut filter = SearchFilter::new()
            .query(query.unwrap_or_default())
            .favorites_only(favorites_only);
        if let Some(language) = language {
            filter = filter.language(language);
        }

        let projects = self.catalog.search(&filter)?;
        log::debug!("Search {:?} matched {} projects", filter, projects.len());

        // An unfiltered search only comes back empty when the catalog is empty
        let catalog_empty =
            projects.is_empty() && (filter.is_unfiltered() || self.catalog.count()? == 0);
        let empty_message = if catalog_empty {
            NO_PROJECTS
        } else {
            NO_MATCHING_PROJECTS
        };
        OutputFormatter::new(format).format_projects(&projects, empty_message, writer)
    }

    /// Run the show command
    pub fn run_show<W: Write>(&self, id: i64, format: OutputFormat, writer: &mut W) -> anyhow::Result<()> {
        let project = self
            .catalog
            .get_by_id(id)?
            .ok_or_else(|| anyhow::anyhow!("Project #{} not found", id))?;

        OutputFormatter::new(format).format_project(&project, writer)
    }

    /// Run the delete command
    pub fn run_delete<W: Write>(&self, id: i64, writer: &mut W) -> anyhow::Result<()> {
        if !self.catalog.delete(id)? {
            return Err(anyhow::anyhow!("Project #{} not found", id));
        }

        writeln!(writer, "Removed project #{} from the catalog", id)?;
        Ok(())
    }

    /// Run the favorite command
    pub fn run_favorite<W: Write>(&self, id: i64, writer: &mut W) -> anyhow::Result<()> {
        match self.catalog.toggle_favorite(id)? {
            Some(true) => writeln!(writer, "Project #{} marked as favorite", id)?,
            Some(false) => writeln!(writer, "Project #{} removed from favorites", id)?,
            None => return Err(anyhow::anyhow!("Project #{} not found", id)),
        }
        Ok(())
    }

    /// Run the languages command
    pub fn run_languages<W: Write>(&self, format: OutputFormat, writer: &mut W) -> anyhow::Result<()> {
        let languages = self.catalog.get_distinct_languages()?;
        OutputFormatter::new(format).format_languages(&languages, writer)
    }

    /// Run the config command
    ///
    /// Prints the effective configuration with the database path filled in.
    pub fn run_config<W: Write>(&self, format: OutputFormat, writer: &mut W) -> anyhow::Result<()> {
        let mut effective = self.config.clone();
        effective.database_path = Some(self.config.database_path()?);

        OutputFormatter::new(format).format_config(&effective, writer)
    }
}
