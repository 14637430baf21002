use serde::ser::{Serialize, Serializer};
use serde_json::Value;

use crate::aggregate::{AggregateError, PlayerClient, fetch_all_player_data};
use crate::api::{
    self, Club, ListEntry, Resource, StatsSummary, archive_urls, finished_entries,
    normalize_clubs, stats_summary,
};
use crate::game_view::GameView;
use crate::metrics::{PerformanceMetrics, Traversal, compute_metrics};
use crate::model::{Game, TimeClass};

/// Outcome of fetching one resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceResult {
    Ok { data: Value, cached: bool },
    Failed { error: String },
}

impl ResourceResult {
    pub fn fresh(data: Value) -> Self {
        ResourceResult::Ok {
            data,
            cached: false,
        }
    }

    pub fn from_cache(data: Value) -> Self {
        ResourceResult::Ok { data, cached: true }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        ResourceResult::Failed {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResourceResult::Ok { .. })
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, ResourceResult::Ok { cached: true, .. })
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            ResourceResult::Ok { data, .. } => Some(data),
            ResourceResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ResourceResult::Ok { .. } => None,
            ResourceResult::Failed { error } => Some(error),
        }
    }
}

// Wire shape: {success, data?, error?, cached}.
impl Serialize for ResourceResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct Wire<'a> {
            success: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            data: Option<&'a Value>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<&'a str>,
            cached: bool,
        }

        Wire {
            success: self.is_success(),
            data: self.data(),
            error: self.error(),
            cached: self.is_cached(),
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDataSet {
    pub profile: ResourceResult,
    pub stats: ResourceResult,
    pub archives: ResourceResult,
    pub recent_games: ResourceResult,
    pub tournaments: ResourceResult,
    pub clubs: ResourceResult,
    pub matches: ResourceResult,
}

impl PlayerDataSet {
    pub fn get(&self, resource: Resource) -> &ResourceResult {
        match resource {
            Resource::Profile => &self.profile,
            Resource::Stats => &self.stats,
            Resource::Archives => &self.archives,
            Resource::RecentGames => &self.recent_games,
            Resource::Tournaments => &self.tournaments,
            Resource::Clubs => &self.clubs,
            Resource::Matches => &self.matches,
        }
    }

    /// Only a successful profile makes the set usable.
    pub fn is_valid(&self) -> bool {
        self.profile.is_success()
    }

    pub fn failed_resources(&self) -> Vec<Resource> {
        Resource::ALL
            .into_iter()
            .filter(|r| !self.get(*r).is_success())
            .collect()
    }

    pub fn archive_urls(&self) -> Vec<String> {
        self.archives.data().map(archive_urls).unwrap_or_default()
    }

    /// Most recent month's games, oldest first as delivered upstream.
    pub fn recent_games(&self) -> Vec<Game> {
        self.recent_games
            .data()
            .map(api::parse_games)
            .unwrap_or_default()
    }

    pub fn clubs(&self) -> Vec<Club> {
        self.clubs.data().map(normalize_clubs).unwrap_or_default()
    }

    pub fn finished_tournaments(&self) -> Vec<ListEntry> {
        self.tournaments
            .data()
            .map(finished_entries)
            .unwrap_or_default()
    }

    pub fn finished_matches(&self) -> Vec<ListEntry> {
        self.matches.data().map(finished_entries).unwrap_or_default()
    }

    pub fn stats_summary(&self) -> StatsSummary {
        self.stats.data().map(stats_summary).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub username: String,
    pub data: PlayerDataSet,
}

impl PlayerSnapshot {
    /// Newest game first, the order used for display and export.
    pub fn games_newest_first(&self) -> Vec<Game> {
        let mut games = self.data.recent_games();
        games.reverse();
        games
    }

    /// Streaks are taken over the chronological order, so the current streak is
    /// the one that ends at the most recent game.
    pub fn metrics(&self) -> PerformanceMetrics {
        compute_metrics(&self.data.recent_games(), &self.username, Traversal::Forward)
    }

    pub fn game_view(&self) -> GameView {
        GameView::new(self.data.recent_games(), &self.username)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub time_class: TimeClass,
    pub player1: Option<u32>,
    pub player2: Option<u32>,
}

/// Head-to-head slots. Lives only while comparison mode is on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonState {
    pub player1: Option<PlayerSnapshot>,
    pub player2: Option<PlayerSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonSlot {
    First,
    Second,
}

impl ComparisonState {
    pub fn seeded(player1: Option<PlayerSnapshot>) -> Self {
        Self {
            player1,
            player2: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.player1.is_some() && self.player2.is_some()
    }

    pub fn next_slot(&self) -> Option<ComparisonSlot> {
        if self.player1.is_none() {
            Some(ComparisonSlot::First)
        } else if self.player2.is_none() {
            Some(ComparisonSlot::Second)
        } else {
            None
        }
    }

    /// Fills the first empty slot. Returns the snapshot back when both are taken.
    pub fn push(&mut self, snapshot: PlayerSnapshot) -> Result<ComparisonSlot, PlayerSnapshot> {
        match self.next_slot() {
            Some(ComparisonSlot::First) => {
                self.player1 = Some(snapshot);
                Ok(ComparisonSlot::First)
            }
            Some(ComparisonSlot::Second) => {
                self.player2 = Some(snapshot);
                Ok(ComparisonSlot::Second)
            }
            None => Err(snapshot),
        }
    }

    /// Per time class ratings side by side; rows where neither player has a
    /// rating are left out.
    pub fn rows(&self) -> Vec<ComparisonRow> {
        let s1 = self.player1.as_ref().map(|p| p.data.stats_summary());
        let s2 = self.player2.as_ref().map(|p| p.data.stats_summary());
        TimeClass::ALL
            .into_iter()
            .map(|time_class| ComparisonRow {
                time_class,
                player1: s1.as_ref().and_then(|s| s.rating(time_class)),
                player2: s2.as_ref().and_then(|s| s.rating(time_class)),
            })
            .filter(|row| row.player1.is_some() || row.player2.is_some())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    ComparisonFirst,
    ComparisonReady,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUpdate {
    pub outcome: LoadOutcome,
    pub username: String,
    /// Non-fatal advisory naming resources that could not be loaded.
    pub notice: Option<String>,
}

/// Everything one user interaction works against: the loaded player and, in
/// comparison mode, the two snapshots being compared.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<PlayerSnapshot>,
    comparison: Option<ComparisonState>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&PlayerSnapshot> {
        self.current.as_ref()
    }

    pub fn comparison(&self) -> Option<&ComparisonState> {
        self.comparison.as_ref()
    }

    pub fn in_comparison(&self) -> bool {
        self.comparison.is_some()
    }

    /// Starts comparing; the currently loaded player takes the first slot.
    pub fn enter_comparison(&mut self) {
        self.comparison = Some(ComparisonState::seeded(self.current.clone()));
    }

    pub fn exit_comparison(&mut self) {
        self.comparison = None;
    }

    /// Loads a player. In comparison mode with a free slot the result goes into
    /// that slot and the current player is left alone.
    pub fn load_player(
        &mut self,
        client: &PlayerClient,
        raw_username: &str,
        on_progress: impl FnMut(f64),
    ) -> Result<SessionUpdate, AggregateError> {
        let fetched = fetch_all_player_data(client, raw_username, on_progress)?;
        let notice = fetched.partial_failure_notice();
        let snapshot = fetched.into_snapshot();
        let username = snapshot.username.clone();
        let outcome = self.accept(snapshot);
        Ok(SessionUpdate {
            outcome,
            username,
            notice,
        })
    }

    /// Places an already aggregated snapshot.
    pub fn accept(&mut self, snapshot: PlayerSnapshot) -> LoadOutcome {
        if let Some(comparison) = self.comparison.as_mut() {
            match comparison.push(snapshot) {
                Ok(ComparisonSlot::First) => return LoadOutcome::ComparisonFirst,
                Ok(ComparisonSlot::Second) => return LoadOutcome::ComparisonReady,
                Err(snapshot) => {
                    self.current = Some(snapshot);
                    return LoadOutcome::Loaded;
                }
            }
        }
        self.current = Some(snapshot);
        LoadOutcome::Loaded
    }
}
