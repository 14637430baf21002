use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const USERNAME_MIN_LEN: usize = 2;
pub const USERNAME_MAX_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsernameError {
    #[error("Please enter a username")]
    Empty,
    #[error("Username must be between 2 and 20 characters")]
    Length,
    #[error("Username can only contain letters, numbers, underscores, and hyphens")]
    Charset,
}

/// Trims and checks a username typed by the user. Returns the trimmed form.
pub fn validate_username(raw: &str) -> Result<String, UsernameError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UsernameError::Empty);
    }
    let len = trimmed.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(UsernameError::Length);
    }
    if !trimmed
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        return Err(UsernameError::Charset);
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// Maps an upstream per-side result code. Only `win` and the three
    /// losing codes are recognised; every other code counts as a draw.
    pub fn from_result_code(code: &str) -> Self {
        match code {
            "win" => Outcome::Win,
            "checkmated" | "resigned" | "timeout" => Outcome::Loss,
            _ => Outcome::Draw,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Win => "Win",
            Outcome::Loss => "Loss",
            Outcome::Draw => "Draw",
        }
    }
}

impl std::str::FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "win" => Ok(Outcome::Win),
            "loss" => Ok(Outcome::Loss),
            "draw" => Ok(Outcome::Draw),
            other => Err(format!("unknown result category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeClass {
    Blitz,
    Bullet,
    Rapid,
    Daily,
}

impl TimeClass {
    pub const ALL: [TimeClass; 4] = [
        TimeClass::Blitz,
        TimeClass::Bullet,
        TimeClass::Rapid,
        TimeClass::Daily,
    ];

    pub fn key(self) -> &'static str {
        match self {
            TimeClass::Blitz => "blitz",
            TimeClass::Bullet => "bullet",
            TimeClass::Rapid => "rapid",
            TimeClass::Daily => "daily",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeClass::Blitz => "Blitz",
            TimeClass::Bullet => "Bullet",
            TimeClass::Rapid => "Rapid",
            TimeClass::Daily => "Daily",
        }
    }

    pub fn stats_key(self) -> &'static str {
        match self {
            TimeClass::Blitz => "chess_blitz",
            TimeClass::Bullet => "chess_bullet",
            TimeClass::Rapid => "chess_rapid",
            TimeClass::Daily => "chess_daily",
        }
    }
}

impl fmt::Display for TimeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameSide {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub rating: Option<u32>,
    #[serde(default)]
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Game {
    pub white: GameSide,
    pub black: GameSide,
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub time_control: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_class: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pgn: Option<String>,
}

impl Game {
    /// The side played by `username`. Anything that is not an exact match on
    /// white is treated as black.
    pub fn player_side(&self, username: &str) -> &GameSide {
        if self.white.username == username {
            &self.white
        } else {
            &self.black
        }
    }

    pub fn opponent_side(&self, username: &str) -> &GameSide {
        if self.white.username == username {
            &self.black
        } else {
            &self.white
        }
    }

    pub fn outcome_for(&self, username: &str) -> Outcome {
        Outcome::from_result_code(&self.player_side(username).result)
    }

    pub fn opponent_rating(&self, username: &str) -> u32 {
        self.opponent_side(username).rating.unwrap_or(0)
    }

    pub fn end_time_or_zero(&self) -> i64 {
        self.end_time.unwrap_or(0)
    }

    /// Case-insensitive substring match against the time-control label: the
    /// upstream time class when present, and the raw time control.
    pub fn matches_time_control(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let class_hit = self
            .time_class
            .as_deref()
            .is_some_and(|tc| tc.to_lowercase().contains(&needle));
        class_hit || self.time_control.to_lowercase().contains(&needle)
    }
}
