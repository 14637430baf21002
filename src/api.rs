use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::model::{Game, TimeClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Profile,
    Stats,
    Archives,
    RecentGames,
    Tournaments,
    Clubs,
    Matches,
}

impl Resource {
    /// Fixed fetch order; progress is reported in this order.
    pub const ALL: [Resource; 7] = [
        Resource::Profile,
        Resource::Stats,
        Resource::Archives,
        Resource::RecentGames,
        Resource::Tournaments,
        Resource::Clubs,
        Resource::Matches,
    ];

    /// Field name in the aggregated data set and prefix of cache keys.
    pub fn key(self) -> &'static str {
        match self {
            Resource::Profile => "profile",
            Resource::Stats => "stats",
            Resource::Archives => "archives",
            Resource::RecentGames => "recentGames",
            Resource::Tournaments => "tournaments",
            Resource::Clubs => "clubs",
            Resource::Matches => "matches",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Resource::Profile => "Profile",
            Resource::Stats => "Stats",
            Resource::Archives => "Game Archives",
            Resource::RecentGames => "Recent Games",
            Resource::Tournaments => "Tournaments",
            Resource::Clubs => "Clubs",
            Resource::Matches => "Matches",
        }
    }

    /// Used in error messages ("Player not found: {context}").
    pub fn context(self) -> &'static str {
        match self {
            Resource::Profile => "profile",
            Resource::Stats => "stats",
            Resource::Archives => "game archives",
            Resource::RecentGames => "recent games",
            Resource::Tournaments => "tournaments",
            Resource::Clubs => "clubs",
            Resource::Matches => "matches",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn profile(&self, username: &str) -> String {
        format!("{}/player/{username}", self.base)
    }

    pub fn stats(&self, username: &str) -> String {
        format!("{}/player/{username}/stats", self.base)
    }

    pub fn archives(&self, username: &str) -> String {
        format!("{}/player/{username}/games/archives", self.base)
    }

    pub fn games_by_month(&self, username: &str, month: ArchiveMonth) -> String {
        format!(
            "{}/player/{username}/games/{}/{:02}",
            self.base, month.year, month.month
        )
    }

    pub fn tournaments(&self, username: &str) -> String {
        format!("{}/player/{username}/tournaments", self.base)
    }

    pub fn clubs(&self, username: &str) -> String {
        format!("{}/player/{username}/clubs", self.base)
    }

    pub fn matches(&self, username: &str) -> String {
        format!("{}/player/{username}/matches", self.base)
    }

    /// URL of a directly addressable resource. Recent games depend on the
    /// archive list and have no fixed URL.
    pub fn url_for(&self, resource: Resource, username: &str) -> Option<String> {
        match resource {
            Resource::Profile => Some(self.profile(username)),
            Resource::Stats => Some(self.stats(username)),
            Resource::Archives => Some(self.archives(username)),
            Resource::RecentGames => None,
            Resource::Tournaments => Some(self.tournaments(username)),
            Resource::Clubs => Some(self.clubs(username)),
            Resource::Matches => Some(self.matches(username)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchiveMonth {
    pub year: i32,
    pub month: u32,
}

impl ArchiveMonth {
    /// Reads `{year}/{month}` from the last two path segments of an archive URL,
    /// e.g. `.../games/2024/03`.
    pub fn from_archive_url(url: &str) -> Option<Self> {
        let mut segments = url.trim_end_matches('/').rsplit('/');
        let month = segments.next()?.trim().parse::<u32>().ok()?;
        let year = segments.next()?.trim().parse::<i32>().ok()?;
        Some(Self { year, month })
    }

    pub fn context(&self) -> String {
        format!("games {self}")
    }
}

impl fmt::Display for ArchiveMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}", self.year, self.month)
    }
}

/// Archive URLs in upstream order (oldest month first).
pub fn archive_urls(data: &Value) -> Vec<String> {
    data.get("archives")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Games of a monthly archive payload. Entries that do not look like games are
/// skipped rather than failing the whole month.
pub fn parse_games(data: &Value) -> Vec<Game> {
    let Some(items) = data.get("games").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match Game::deserialize(item) {
            Ok(game) => Some(game),
            Err(err) => {
                debug!(error = %err, "skipping malformed game entry");
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Club {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub joined: Option<i64>,
}

/// The clubs endpoint has been seen returning a bare array, `{clubs: [...]}`,
/// `{active: [...]}`, and an object keyed by index. All of them end up here as
/// one list.
pub fn normalize_clubs(data: &Value) -> Vec<Club> {
    let items: Vec<&Value> = match data {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("clubs") {
                items.iter().collect()
            } else if let Some(Value::Array(items)) = map.get("active") {
                items.iter().collect()
            } else {
                map.values().filter(|v| v.is_object()).collect()
            }
        }
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter(|v| v.is_object())
        .filter_map(|v| Club::deserialize(v).ok())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Finished tournaments or matches (`{finished: [...]}`).
pub fn finished_entries(data: &Value) -> Vec<ListEntry> {
    data.get("finished")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| ListEntry::deserialize(v).ok())
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Record {
    pub win: u32,
    pub loss: u32,
    pub draw: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeClassRating {
    pub time_class: TimeClass,
    pub rating: u32,
    pub record: Option<Record>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSummary {
    pub ratings: Vec<TimeClassRating>,
    pub tactics_highest: Option<u32>,
    pub puzzle_rush_best: Option<u32>,
}

impl StatsSummary {
    pub fn rating(&self, time_class: TimeClass) -> Option<u32> {
        self.ratings
            .iter()
            .find(|r| r.time_class == time_class)
            .map(|r| r.rating)
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty() && self.tactics_highest.is_none() && self.puzzle_rush_best.is_none()
    }
}

pub fn stats_summary(data: &Value) -> StatsSummary {
    let mut ratings = Vec::new();
    for time_class in TimeClass::ALL {
        let Some(block) = data.get(time_class.stats_key()) else {
            continue;
        };
        let Some(rating) = positive_u32(block.pointer("/last/rating")) else {
            continue;
        };
        let record = block.get("record").filter(|v| v.is_object()).map(|r| Record {
            win: positive_u32(r.get("win")).unwrap_or(0),
            loss: positive_u32(r.get("loss")).unwrap_or(0),
            draw: positive_u32(r.get("draw")).unwrap_or(0),
        });
        ratings.push(TimeClassRating {
            time_class,
            rating,
            record,
        });
    }

    StatsSummary {
        ratings,
        tactics_highest: positive_u32(data.pointer("/tactics/highest/rating")),
        puzzle_rush_best: positive_u32(data.pointer("/puzzle_rush/best/score")),
    }
}

fn positive_u32(value: Option<&Value>) -> Option<u32> {
    value
        .and_then(Value::as_u64)
        .filter(|v| *v > 0)
        .and_then(|v| u32::try_from(v).ok())
}

#[cfg(test)]
mod tests {
    use super::ArchiveMonth;

    #[test]
    fn archive_month_reads_last_two_segments() {
        let month =
            ArchiveMonth::from_archive_url("https://api.chess.com/pub/player/bob/games/2024/03");
        assert_eq!(month, Some(ArchiveMonth { year: 2024, month: 3 }));
        assert_eq!(month.map(|m| m.to_string()).as_deref(), Some("2024/03"));
        assert_eq!(ArchiveMonth::from_archive_url("https://x/games/2024/"), None);
        assert_eq!(ArchiveMonth::from_archive_url("nope"), None);
    }
}
