//! Table Backend
//!
//! All persisted state lives in a hosted database exposing a PostgREST-style
//! table API. This module defines the seam the flows talk to and the HTTP
//! client that implements it.
//!
//! ## Operations
//!
//! - `read_teams`: every team, ascending by id
//! - `find_treasure_by_code`: resolve a numeric code to at most one record
//! - `insert_entry`: record one submission
//! - `read_feed`: a bounded, `created_at`-ascending slice of the activity view

mod client;
mod error;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::RestBackend;
pub use error::{BackendError, BackendResult};
pub use types::{FeedActivity, FeedQuery, NewEntry, Team, TreasureRef, MAX_FEED_ROWS};

use async_trait::async_trait;

/// Operations the client needs from the hosted backend
#[async_trait]
pub trait Backend: Send + Sync {
    /// Read the full team directory ordered by ascending id
    async fn read_teams(&self) -> BackendResult<Vec<Team>>;

    /// Look up a treasure by its numeric code; `None` when nothing matches
    async fn find_treasure_by_code(&self, code: u32) -> BackendResult<Option<TreasureRef>>;

    /// Create one entry row
    async fn insert_entry(&self, entry: &NewEntry) -> BackendResult<()>;

    /// Read the activity view ordered by ascending `created_at`
    async fn read_feed(&self, query: FeedQuery) -> BackendResult<Vec<FeedActivity>>;
}
