//! Team Directory
//!
//! The selectable teams, loaded once each time the entry view mounts.
//! A failed load degrades to an empty list after raising a toast.

use crate::backend::{Backend, BackendResult, Team};
use crate::notify::Toasts;

/// Teams available for selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamDirectory {
    teams: Vec<Team>,
}

impl TeamDirectory {
    pub fn new(teams: Vec<Team>) -> Self {
        Self { teams }
    }

    /// Issue the directory read and settle it
    pub async fn load(backend: &dyn Backend, toasts: &mut Toasts) -> Self {
        let result = backend.read_teams().await;
        Self::from_load(result, toasts)
    }

    /// Settle a finished directory read
    pub fn from_load(result: BackendResult<Vec<Team>>, toasts: &mut Toasts) -> Self {
        match result {
            Ok(teams) => {
                tracing::debug!(count = teams.len(), "Team directory loaded");
                Self { teams }
            }
            Err(e) => {
                tracing::error!(error = %e, "Error fetching teams");
                toasts.error("Failed to load team data.");
                Self::default()
            }
        }
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.get(id).is_some()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.team_name == name)
    }

    /// Resolve user input naming a team, by id first and then by exact name
    pub fn resolve(&self, input: &str) -> Option<&Team> {
        let input = input.trim();
        input
            .parse::<i64>()
            .ok()
            .and_then(|id| self.get(id))
            .or_else(|| self.find_by_name(input))
    }
}
