use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::model::Game;
use crate::state::PlayerSnapshot;

pub const EXPORT_GAME_LIMIT: usize = 50;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<'a> {
    pub username: &'a str,
    pub export_date: String,
    pub profile: &'a Value,
    pub stats: Option<&'a Value>,
    pub games: Vec<Game>,
    pub tournaments: Option<&'a Value>,
    pub clubs: Option<&'a Value>,
    pub matches: Option<&'a Value>,
}

pub fn build_export(snapshot: &PlayerSnapshot, now: DateTime<Utc>) -> Result<ExportDocument<'_>> {
    let profile = snapshot
        .data
        .profile
        .data()
        .ok_or_else(|| anyhow!("No profile data to export"))?;
    let mut games = snapshot.games_newest_first();
    games.truncate(EXPORT_GAME_LIMIT);

    Ok(ExportDocument {
        username: &snapshot.username,
        export_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        profile,
        stats: snapshot.data.stats.data(),
        games,
        tournaments: snapshot.data.tournaments.data(),
        clubs: snapshot.data.clubs.data(),
        matches: snapshot.data.matches.data(),
    })
}

pub fn export_file_name(username: &str, now: DateTime<Utc>) -> String {
    format!("chess-profile-{username}-{}.json", now.timestamp_millis())
}

/// Writes the export into `dir` and returns the file path.
pub fn write_export(snapshot: &PlayerSnapshot, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
    let doc = build_export(snapshot, now)?;
    let json = serde_json::to_string_pretty(&doc).context("serialize export")?;

    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(export_file_name(&snapshot.username, now));
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, &path).with_context(|| format!("finalize {}", path.display()))?;
    Ok(path)
}
