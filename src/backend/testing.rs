//! In-memory backend for exercising the flows without a network

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::{Backend, BackendError, BackendResult, FeedActivity, FeedQuery, NewEntry, Team, TreasureRef};

/// A call the flows made against the backend
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    ReadTeams,
    FindTreasure(u32),
    InsertEntry(NewEntry),
    ReadFeed(FeedQuery),
}

/// Which operation should fail, and how
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    Teams,
    Lookup,
    Insert,
    Feed,
    /// Lookup answers with a body the client cannot decode
    GarbledLookup,
}

/// Records every call and answers from fixed tables
#[derive(Default)]
pub(crate) struct RecordingBackend {
    teams: Vec<Team>,
    treasures: HashMap<u32, i64>,
    feed: Vec<FeedActivity>,
    faults: Vec<Fault>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
    finished: Mutex<Vec<Call>>,
}

impl RecordingBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_teams(mut self, teams: Vec<Team>) -> Self {
        self.teams = teams;
        self
    }

    pub(crate) fn with_treasure(mut self, code: u32, id: i64) -> Self {
        self.treasures.insert(code, id);
        self
    }

    pub(crate) fn with_feed(mut self, feed: Vec<FeedActivity>) -> Self {
        self.feed = feed;
        self
    }

    pub(crate) fn failing(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    /// Hold every read for `delay` before answering
    pub(crate) fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that ran to completion, in the order they finished
    pub(crate) fn finished(&self) -> Vec<Call> {
        self.finished.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn complete(&self, call: Call) {
        self.finished.lock().unwrap().push(call);
    }

    fn fault(&self, fault: Fault, message: &str) -> BackendResult<()> {
        if self.faults.contains(&fault) {
            Err(BackendError::Api {
                status: 500,
                message: message.to_string(),
            })
        } else {
            Ok(())
        }
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn read_teams(&self) -> BackendResult<Vec<Team>> {
        self.record(Call::ReadTeams);
        self.pause().await;
        self.complete(Call::ReadTeams);
        self.fault(Fault::Teams, "permission denied for table teams")?;
        Ok(self.teams.clone())
    }

    async fn find_treasure_by_code(&self, code: u32) -> BackendResult<Option<TreasureRef>> {
        self.record(Call::FindTreasure(code));
        self.complete(Call::FindTreasure(code));
        self.fault(Fault::Lookup, "connection reset by peer")?;
        if self.faults.contains(&Fault::GarbledLookup) {
            return Err(BackendError::Decode("expected value at line 1".to_string()));
        }
        Ok(self.treasures.get(&code).map(|&id| TreasureRef { id }))
    }

    async fn insert_entry(&self, entry: &NewEntry) -> BackendResult<()> {
        self.record(Call::InsertEntry(*entry));
        self.complete(Call::InsertEntry(*entry));
        self.fault(Fault::Insert, "new row violates row-level security policy")?;
        Ok(())
    }

    async fn read_feed(&self, query: FeedQuery) -> BackendResult<Vec<FeedActivity>> {
        self.record(Call::ReadFeed(query));
        self.pause().await;
        self.complete(Call::ReadFeed(query));
        self.fault(Fault::Feed, "relation \"feed_view\" does not exist")?;
        Ok(self.feed.iter().take(query.limit()).cloned().collect())
    }
}

/// Frogs (1) and Newts (2)
pub(crate) fn pond_teams() -> Vec<Team> {
    vec![Team::new(1, "Frogs"), Team::new(2, "Newts")]
}

/// A feed row with a fixed timestamp offset by `id` minutes
pub(crate) fn activity(id: i64, team_name: &str, points: f64) -> FeedActivity {
    use chrono::TimeZone;
    FeedActivity {
        id,
        created_at: chrono::Utc
            .with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
            .unwrap()
            + chrono::Duration::minutes(id),
        team_name: team_name.to_string(),
        scan: format!("{:07}", 1_000_000 + id),
        treasure_name_zh: "宝藏".to_string(),
        points_earned: points,
    }
}
