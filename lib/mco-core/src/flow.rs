//! Step-by-step flow for adding a project
//!
//! Picking a folder, filling in details and confirming are explicit states
//! instead of chained dialog callbacks, so any front end can drive them.

use mco_utils::default_project_name;
use std::path::PathBuf;
use thiserror::Error;

/// Details collected for a project that is about to be added
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDraft {
    pub name: String,
    pub path: PathBuf,
    pub language: Option<String>,
    pub description: Option<String>,
}

impl ProjectDraft {
    /// Draft for a folder, named after its final path component
    pub fn for_folder(path: PathBuf) -> Self {
        let name = default_project_name(&path).unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            path,
            language: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    PickingFolder,
    EnteringDetails(ProjectDraft),
    Confirmed(ProjectDraft),
    Cancelled,
}

impl FlowState {
    fn label(&self) -> &'static str {
        match self {
            FlowState::PickingFolder => "picking a folder",
            FlowState::EnteringDetails(_) => "entering details",
            FlowState::Confirmed(_) => "confirmed",
            FlowState::Cancelled => "cancelled",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error("project name cannot be empty")]
    EmptyName,
}

/// State machine: picking folder -> entering details -> confirmed or cancelled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddProjectFlow {
    state: FlowState,
}

impl Default for AddProjectFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl AddProjectFlow {
    pub fn new() -> Self {
        Self {
            state: FlowState::PickingFolder,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// True once the flow was confirmed or cancelled
    pub fn is_finished(&self) -> bool {
        matches!(self.state, FlowState::Confirmed(_) | FlowState::Cancelled)
    }

    fn invalid(&self, action: &'static str) -> FlowError {
        FlowError::InvalidTransition {
            action,
            state: self.state.label(),
        }
    }

    fn draft_mut(&mut self, action: &'static str) -> Result<&mut ProjectDraft, FlowError> {
        let state = self.state.label();
        match &mut self.state {
            FlowState::EnteringDetails(draft) => Ok(draft),
            _ => Err(FlowError::InvalidTransition { action, state }),
        }
    }

    /// A folder was picked; move on to the details step
    ///
    /// Returns the initial draft, named after the folder.
    pub fn folder_selected(&mut self, path: impl Into<PathBuf>) -> Result<ProjectDraft, FlowError> {
        if self.state != FlowState::PickingFolder {
            return Err(self.invalid("select a folder"));
        }

        let draft = ProjectDraft::for_folder(path.into());
        self.state = FlowState::EnteringDetails(draft.clone());
        Ok(draft)
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), FlowError> {
        self.draft_mut("set the name")?.name = name.trim().to_string();
        Ok(())
    }

    /// Blank input clears the language
    pub fn set_language(&mut self, language: &str) -> Result<(), FlowError> {
        self.draft_mut("set the language")?.language = non_blank(language);
        Ok(())
    }

    /// Blank input clears the description
    pub fn set_description(&mut self, description: &str) -> Result<(), FlowError> {
        self.draft_mut("set the description")?.description = non_blank(description);
        Ok(())
    }

    /// Confirm the details
    ///
    /// An empty name is rejected and the flow stays on the details step.
    pub fn confirm(&mut self) -> Result<ProjectDraft, FlowError> {
        let draft = self.draft_mut("confirm")?;
        if draft.name.trim().is_empty() {
            return Err(FlowError::EmptyName);
        }

        let draft = draft.clone();
        self.state = FlowState::Confirmed(draft.clone());
        Ok(draft)
    }

    /// Abandon the flow from any step that is not already finished
    pub fn cancel(&mut self) -> Result<(), FlowError> {
        if self.is_finished() {
            return Err(self.invalid("cancel"));
        }
        self.state = FlowState::Cancelled;
        Ok(())
    }

    /// The confirmed draft, if the flow ended in confirmation
    pub fn into_confirmed(self) -> Option<ProjectDraft> {
        match self.state {
            FlowState::Confirmed(draft) => Some(draft),
            _ => None,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
