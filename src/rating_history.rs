use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::aggregate::PlayerClient;
use crate::api::{ArchiveMonth, parse_games};
use crate::model::{Game, TimeClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingPoint {
    pub date: DateTime<Utc>,
    pub rating: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RatingHistory {
    pub blitz: Vec<RatingPoint>,
    pub bullet: Vec<RatingPoint>,
    pub rapid: Vec<RatingPoint>,
    pub daily: Vec<RatingPoint>,
}

impl RatingHistory {
    pub fn series(&self, time_class: TimeClass) -> &[RatingPoint] {
        match time_class {
            TimeClass::Blitz => &self.blitz,
            TimeClass::Bullet => &self.bullet,
            TimeClass::Rapid => &self.rapid,
            TimeClass::Daily => &self.daily,
        }
    }

    fn series_mut(&mut self, time_class: TimeClass) -> &mut Vec<RatingPoint> {
        match time_class {
            TimeClass::Blitz => &mut self.blitz,
            TimeClass::Bullet => &mut self.bullet,
            TimeClass::Rapid => &mut self.rapid,
            TimeClass::Daily => &mut self.daily,
        }
    }

    pub fn is_empty(&self) -> bool {
        TimeClass::ALL.iter().all(|tc| self.series(*tc).is_empty())
    }

    fn sort_chronologically(&mut self) {
        for time_class in TimeClass::ALL {
            self.series_mut(time_class).sort_by_key(|p| p.date);
        }
    }
}

/// Buckets the player's own rating from each game into the series whose name
/// appears in the game's time-control label. Games the player did not take
/// part in, or without a rating or end time, are ignored.
pub fn bucket_ratings(games: &[Game], username: &str) -> RatingHistory {
    let mut history = RatingHistory::default();
    extend_history(&mut history, games, username);
    history.sort_chronologically();
    history
}

fn extend_history(history: &mut RatingHistory, games: &[Game], username: &str) {
    for game in games {
        let side = if game.white.username == username {
            &game.white
        } else if game.black.username == username {
            &game.black
        } else {
            continue;
        };
        let Some(rating) = side.rating.filter(|r| *r > 0) else {
            continue;
        };
        let Some(date) = game
            .end_time
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        else {
            continue;
        };
        for time_class in TimeClass::ALL {
            if game.matches_time_control(time_class.key()) {
                history.series_mut(time_class).push(RatingPoint { date, rating });
            }
        }
    }
}

/// Rating series over the most recent archive months (the configured number,
/// six by default). Months are fetched uncached; a month that fails is logged
/// and left out.
pub fn fetch_rating_history(
    client: &PlayerClient,
    username: &str,
    archive_urls: &[String],
) -> RatingHistory {
    let months = client.history_months();
    let start = archive_urls.len().saturating_sub(months);
    let mut history = RatingHistory::default();

    for url in &archive_urls[start..] {
        let Some(month) = ArchiveMonth::from_archive_url(url) else {
            warn!(url = %url, "skipping unparsable archive url");
            continue;
        };
        let games_url = client.endpoints().games_by_month(username, month);
        match client.fetcher().fetch_json(&games_url, &month.context()) {
            Ok(data) => extend_history(&mut history, &parse_games(&data), username),
            Err(err) => warn!(month = %month, error = %err, "rating history month unavailable"),
        }
    }

    history.sort_chronologically();
    history
}
