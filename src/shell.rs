//! Tab Shell
//!
//! Exactly one of the two views is mounted at a time. Mounting a view resets
//! its local state and spawns its load; unmounting aborts a load that has not
//! finished, and a result that still arrives for an old mount is dropped.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::backend::{Backend, BackendResult, FeedActivity, FeedQuery, Team};
use crate::directory::TeamDirectory;
use crate::entry::{EntryForm, SubmitError, SubmitOutcome};
use crate::feed::FeedState;
use crate::notify::Toasts;

/// The two views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Entry,
    Feed,
}

impl Tab {
    pub fn all() -> &'static [Tab] {
        &[Tab::Feed, Tab::Entry]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Entry => "Entry",
            Tab::Feed => "Feed",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tab::Entry => write!(f, "entry"),
            Tab::Feed => write!(f, "feed"),
        }
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entry" => Ok(Tab::Entry),
            "feed" => Ok(Tab::Feed),
            other => Err(format!("Unknown tab: {}", other)),
        }
    }
}

/// Result of a mount-time load
#[derive(Debug)]
enum Loaded {
    Teams(BackendResult<Vec<Team>>),
    Feed(BackendResult<Vec<FeedActivity>>),
}

struct PendingLoad {
    mount: u64,
    handle: JoinHandle<Loaded>,
}

/// Two-tab application shell
pub struct TabShell {
    backend: Arc<dyn Backend>,
    feed_query: FeedQuery,
    active: Tab,
    mount: u64,
    mounted: bool,
    entry: EntryForm,
    feed: FeedState,
    toasts: Toasts,
    pending: Option<PendingLoad>,
}

impl TabShell {
    /// Create the shell; nothing is mounted until [`TabShell::start`]
    pub fn new(backend: Arc<dyn Backend>, feed_query: FeedQuery) -> Self {
        Self {
            backend,
            feed_query,
            active: Tab::default(),
            mount: 0,
            mounted: false,
            entry: EntryForm::default(),
            feed: FeedState::default(),
            toasts: Toasts::new(),
            pending: None,
        }
    }

    /// Mount the initial tab
    pub fn start(&mut self) {
        if !self.mounted {
            self.mount_active();
        }
    }

    pub fn active(&self) -> Tab {
        self.active
    }

    /// Switch tabs; returns whether a different view was mounted
    pub fn switch_to(&mut self, tab: Tab) -> bool {
        if self.mounted && tab == self.active {
            return false;
        }
        self.unmount();
        self.active = tab;
        self.mount_active();
        true
    }

    /// Whether the mounted view is still waiting for its load
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Wait for the mounted view's load and apply it
    ///
    /// Cancel-safe: dropping the future leaves the load pending.
    pub async fn settle(&mut self) -> bool {
        let joined = match self.pending.as_mut() {
            Some(pending) => (&mut pending.handle).await,
            None => return false,
        };
        let Some(pending) = self.pending.take() else {
            return false;
        };

        match joined {
            Ok(loaded) => self.apply(pending.mount, loaded),
            Err(e) if e.is_cancelled() => false,
            Err(e) => {
                tracing::error!(error = %e, "Load task failed");
                self.toasts.error("An unexpected error occurred");
                false
            }
        }
    }

    pub fn entry(&self) -> &EntryForm {
        &self.entry
    }

    pub fn entry_mut(&mut self) -> &mut EntryForm {
        &mut self.entry
    }

    pub fn feed(&self) -> &FeedState {
        &self.feed
    }

    pub fn toasts_mut(&mut self) -> &mut Toasts {
        &mut self.toasts
    }

    /// Submit the entry form
    ///
    /// Only the entry view has a submit control; from any other view the
    /// attempt fails with [`SubmitError::Unavailable`] and raises no toast.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if self.active != Tab::Entry {
            return SubmitOutcome::Failed(SubmitError::Unavailable);
        }
        let backend = Arc::clone(&self.backend);
        self.entry.submit(backend.as_ref(), &mut self.toasts).await
    }

    fn unmount(&mut self) {
        if let Some(pending) = self.pending.take() {
            tracing::debug!(tab = %self.active, mount = pending.mount, "Cancelling pending load");
            pending.handle.abort();
        }
        self.mounted = false;
    }

    fn mount_active(&mut self) {
        self.mount += 1;
        self.mounted = true;
        tracing::debug!(tab = %self.active, mount = self.mount, "Mounting view");

        let backend = Arc::clone(&self.backend);
        let handle = match self.active {
            Tab::Entry => {
                self.entry = EntryForm::default();
                tokio::spawn(async move { Loaded::Teams(backend.read_teams().await) })
            }
            Tab::Feed => {
                self.feed = FeedState::Loading;
                let query = self.feed_query;
                tokio::spawn(async move { Loaded::Feed(backend.read_feed(query).await) })
            }
        };

        self.pending = Some(PendingLoad {
            mount: self.mount,
            handle,
        });
    }

    fn apply(&mut self, mount: u64, loaded: Loaded) -> bool {
        if !self.mounted || mount != self.mount {
            tracing::debug!(mount, current = self.mount, "Dropping stale load");
            return false;
        }

        match (self.active, loaded) {
            (Tab::Entry, Loaded::Teams(result)) => {
                let directory = TeamDirectory::from_load(result, &mut self.toasts);
                self.entry.set_directory(directory);
                true
            }
            (Tab::Feed, Loaded::Feed(result)) => {
                self.feed = FeedState::from_load(result, &mut self.toasts);
                true
            }
            _ => false,
        }
    }
}
