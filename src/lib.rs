//! # RunHNT
//!
//! Client for a scavenger-hunt event: teams enter seven-digit treasure codes,
//! and a feed shows every team's submissions.
//!
//! ## Modules
//!
//! - [`backend`]: the hosted table backend seam and its HTTP client
//! - [`entry`]: code sanitising and the lookup-then-insert submission flow
//! - [`directory`]: the team directory loaded when the entry view mounts
//! - [`feed`]: the bounded activity feed and team colours
//! - [`shell`]: the two-tab shell that mounts one view at a time
//! - [`notify`]: transient toast notifications
//! - [`render`]: terminal rendering of the views
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use runhunt::{Config, EntryForm, RestBackend, TeamDirectory, Toasts};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let backend = RestBackend::new(&config.backend)?;
//!     let mut toasts = Toasts::new();
//!
//!     let directory = TeamDirectory::load(&backend, &mut toasts).await;
//!     let mut form = EntryForm::new(directory);
//!     form.set_code("1234568");
//!     form.select_team(2)?;
//!
//!     let outcome = form.submit(&backend, &mut toasts).await;
//!     println!("success: {}", outcome.is_success());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod directory;
pub mod entry;
pub mod feed;
pub mod notify;
pub mod render;
pub mod shell;

pub use backend::{
    Backend, BackendError, BackendResult, FeedActivity, FeedQuery, NewEntry, RestBackend, Team,
    TreasureRef, MAX_FEED_ROWS,
};

pub use config::{BackendConfig, Config, ConfigError, FeedConfig, LoggingConfig};

pub use directory::TeamDirectory;

pub use entry::{
    sanitize, EntryForm, ErrorKind, SubmitError, SubmitOutcome, SubmitPhase, TreasureCode,
    UnknownTeam,
};

pub use feed::{team_color, FeedState, Hsl};

pub use notify::{Toast, ToastLevel, Toasts};

pub use shell::{Tab, TabShell};
