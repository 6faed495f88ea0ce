//! Entry form and submission flow
//!
//! A submission walks `Idle → Validating → LookingUp → Inserting` and ends
//! either `Succeeded` or `Failed`, after which the form is idle again. Each
//! step gates the next: a failure aborts everything after it.

use thiserror::Error;

use super::code::{sanitize, TreasureCode};
use crate::backend::{Backend, BackendError, NewEntry, Team};
use crate::directory::TeamDirectory;
use crate::notify::Toasts;

/// Where a submission currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitPhase {
    #[default]
    Idle,
    Validating,
    LookingUp,
    Inserting,
}

/// Why a submission failed
///
/// The `Display` text is what the user is shown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Please fill in all fields")]
    MissingFields,

    #[error("Treasure code must be 7 digits")]
    InvalidCodeLength,

    /// The lookup itself failed; carries the backend message verbatim
    #[error("DB Error: {0}")]
    Lookup(String),

    #[error("Treasure code not found")]
    CodeNotFound,

    /// The insert failed; carries the backend message verbatim
    #[error("Insert Error: {0}")]
    Insert(String),

    #[error("An unexpected error occurred")]
    Unexpected { detail: String },

    /// Another submission has not finished yet
    #[error("Submission already in progress")]
    InProgress,

    /// The submit control is not on the mounted view
    #[error("Submit is not available on this view")]
    Unavailable,
}

/// Broad class of a submission failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caught before any backend call
    Validation,
    NotFound,
    Backend,
    Unexpected,
}

impl SubmitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubmitError::MissingFields
            | SubmitError::InvalidCodeLength
            | SubmitError::InProgress
            | SubmitError::Unavailable => ErrorKind::Validation,
            SubmitError::CodeNotFound => ErrorKind::NotFound,
            SubmitError::Lookup(_) | SubmitError::Insert(_) => ErrorKind::Backend,
            SubmitError::Unexpected { .. } => ErrorKind::Unexpected,
        }
    }

    /// Stable machine-readable reason
    pub fn reason(&self) -> &'static str {
        match self {
            SubmitError::MissingFields => "missing-fields",
            SubmitError::InvalidCodeLength => "invalid-code-length",
            SubmitError::Lookup(_) => "lookup-error",
            SubmitError::CodeNotFound => "code-not-found",
            SubmitError::Insert(_) => "insert-error",
            SubmitError::Unexpected { .. } => "unexpected-error",
            SubmitError::InProgress => "in-progress",
            SubmitError::Unavailable => "unavailable",
        }
    }

    fn unexpected(err: &BackendError) -> Self {
        SubmitError::Unexpected {
            detail: err.to_string(),
        }
    }
}

/// Terminal state of one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Succeeded(NewEntry),
    Failed(SubmitError),
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Succeeded(_))
    }

    pub fn error(&self) -> Option<&SubmitError> {
        match self {
            SubmitOutcome::Succeeded(_) => None,
            SubmitOutcome::Failed(e) => Some(e),
        }
    }
}

/// The selected id is not in the loaded directory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown team: {0}")]
pub struct UnknownTeam(pub i64);

/// State of the entry view: code input, team selection, submit guard
#[derive(Debug, Default)]
pub struct EntryForm {
    code: String,
    selected_team: Option<i64>,
    directory: TeamDirectory,
    submitting: bool,
    phase: SubmitPhase,
}

impl EntryForm {
    pub fn new(directory: TeamDirectory) -> Self {
        Self {
            directory,
            ..Self::default()
        }
    }

    /// Replace the code with the sanitised form of `raw`
    pub fn set_code(&mut self, raw: &str) -> &str {
        self.code = sanitize(raw);
        &self.code
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Select a team from the directory
    pub fn select_team(&mut self, team_id: i64) -> Result<(), UnknownTeam> {
        if !self.directory.contains(team_id) {
            return Err(UnknownTeam(team_id));
        }
        self.selected_team = Some(team_id);
        Ok(())
    }

    pub fn clear_team(&mut self) {
        self.selected_team = None;
    }

    pub fn selected_team_id(&self) -> Option<i64> {
        self.selected_team
    }

    pub fn selected_team(&self) -> Option<&Team> {
        self.selected_team.and_then(|id| self.directory.get(id))
    }

    pub fn directory(&self) -> &TeamDirectory {
        &self.directory
    }

    /// Install a freshly loaded directory
    pub fn set_directory(&mut self, directory: TeamDirectory) {
        self.directory = directory;
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn phase(&self) -> SubmitPhase {
        self.phase
    }

    /// Whether the submit control is enabled
    pub fn can_submit(&self) -> bool {
        !self.submitting && !self.code.is_empty() && self.selected_team.is_some()
    }

    /// Validate the form and raise the in-progress guard
    ///
    /// Nothing reaches the backend unless this succeeds.
    pub fn begin_submit(&mut self) -> Result<Submission, SubmitError> {
        if self.submitting {
            return Err(SubmitError::InProgress);
        }
        self.phase = SubmitPhase::Validating;

        let (code, team_id) = match self.validate() {
            Ok(valid) => valid,
            Err(e) => {
                self.phase = SubmitPhase::Idle;
                return Err(e);
            }
        };

        self.submitting = true;
        self.phase = SubmitPhase::LookingUp;
        Ok(Submission {
            code,
            team_id,
            phase: SubmitPhase::LookingUp,
        })
    }

    fn validate(&self) -> Result<(TreasureCode, i64), SubmitError> {
        let team_id = match self.selected_team {
            Some(id) if !self.code.is_empty() && self.directory.contains(id) => id,
            _ => return Err(SubmitError::MissingFields),
        };
        let code = self
            .code
            .parse()
            .map_err(|_| SubmitError::InvalidCodeLength)?;
        Ok((code, team_id))
    }

    /// Settle a submission: notify, reset on success, drop the guard
    pub fn finish_submit(
        &mut self,
        result: Result<NewEntry, SubmitError>,
        toasts: &mut Toasts,
    ) -> SubmitOutcome {
        if result == Err(SubmitError::InProgress) {
            // The running submission owns the guard
            return SubmitOutcome::Failed(SubmitError::InProgress);
        }

        self.submitting = false;
        self.phase = SubmitPhase::Idle;

        match result {
            Ok(entry) => {
                tracing::info!(
                    game_treasure_id = entry.game_treasure_id,
                    team_id = entry.team_id,
                    "Entry submitted"
                );
                toasts.success("Entry submitted successfully!");
                self.code.clear();
                self.selected_team = None;
                SubmitOutcome::Succeeded(entry)
            }
            Err(e) => {
                tracing::debug!(reason = e.reason(), "Submission failed");
                toasts.error(e.to_string());
                SubmitOutcome::Failed(e)
            }
        }
    }

    /// Run the whole flow against `backend`
    pub async fn submit(&mut self, backend: &dyn Backend, toasts: &mut Toasts) -> SubmitOutcome {
        let result = match self.begin_submit() {
            Ok(mut submission) => submission.execute(backend).await,
            Err(e) => Err(e),
        };
        self.finish_submit(result, toasts)
    }
}

/// A validated submission on its way through the backend
#[derive(Debug)]
pub struct Submission {
    code: TreasureCode,
    team_id: i64,
    phase: SubmitPhase,
}

impl Submission {
    pub fn code(&self) -> &TreasureCode {
        &self.code
    }

    pub fn team_id(&self) -> i64 {
        self.team_id
    }

    pub fn phase(&self) -> SubmitPhase {
        self.phase
    }

    /// Look the code up, then insert the entry
    pub async fn execute(&mut self, backend: &dyn Backend) -> Result<NewEntry, SubmitError> {
        self.phase = SubmitPhase::LookingUp;
        let numeric = self.code.value();

        let treasure = match backend.find_treasure_by_code(numeric).await {
            Ok(Some(treasure)) => treasure,
            Ok(None) => {
                tracing::debug!(code = numeric, "Treasure code not found");
                return Err(SubmitError::CodeNotFound);
            }
            Err(e) if e.is_unexpected() => {
                tracing::error!(error = %e, "Unexpected error");
                return Err(SubmitError::unexpected(&e));
            }
            Err(e) => {
                tracing::error!(error = %e, "Lookup error");
                return Err(SubmitError::Lookup(e.to_string()));
            }
        };

        self.phase = SubmitPhase::Inserting;
        let entry = NewEntry {
            game_treasure_id: treasure.id,
            team_id: self.team_id,
        };

        match backend.insert_entry(&entry).await {
            Ok(()) => Ok(entry),
            Err(e) if e.is_unexpected() => {
                tracing::error!(error = %e, "Unexpected error");
                Err(SubmitError::unexpected(&e))
            }
            Err(e) => {
                tracing::error!(error = %e, "Insert error");
                Err(SubmitError::Insert(e.to_string()))
            }
        }
    }
}
