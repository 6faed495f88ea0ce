//! Record types exchanged with the table backend
//!
//! - `Team`: a selectable team from the directory
//! - `TreasureRef`: the resolved id of a treasure code
//! - `NewEntry`: the payload for one successful submission
//! - `FeedActivity`: one row of the aggregated activity view
//! - `FeedQuery`: the bounded read issued for the feed

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Hard cap on the number of feed rows a single read may request
pub const MAX_FEED_ROWS: usize = 150;

/// A team that entries can be submitted for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Team {
    pub id: i64,
    pub team_name: String,
}

impl Team {
    pub fn new(id: i64, team_name: impl Into<String>) -> Self {
        Self {
            id,
            team_name: team_name.into(),
        }
    }
}

/// Backend id a treasure code resolves to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreasureRef {
    pub id: i64,
}

/// Entry row created once per successful submission
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewEntry {
    pub game_treasure_id: i64,
    pub team_id: i64,
}

/// One row of the aggregated activity feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedActivity {
    pub id: i64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    pub team_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub scan: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub treasure_name_zh: String,
    pub points_earned: f64,
}

/// Parameters of the feed read
///
/// Rows are always ordered by ascending `created_at`; only the limit varies,
/// and it never exceeds [`MAX_FEED_ROWS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedQuery {
    limit: usize,
}

impl FeedQuery {
    /// Create a query for up to `limit` rows, clamped to [`MAX_FEED_ROWS`]
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.min(MAX_FEED_ROWS),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self::new(MAX_FEED_ROWS)
    }
}

/// Accepts RFC 3339 with an offset, or a bare timestamp taken as UTC
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Postgres `timestamp` columns serialise without an offset and may use a space
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!("invalid timestamp: {}", raw))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
