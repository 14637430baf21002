mod common;

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use chess_insight::export::{EXPORT_GAME_LIMIT, build_export, export_file_name, write_export};
use chess_insight::metrics::{Streak, StreakKind};
use chess_insight::model::{Game, TimeClass};
use chess_insight::state::{
    ComparisonRow, LoadOutcome, PlayerDataSet, PlayerSnapshot, ResourceResult, Session,
};
use common::{Harness, ScriptedTransport, game, script_full_player, script_player_without};

fn export_time() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_704_412_800, 0).unwrap()
}

fn snapshot_with_games(games: &[Game]) -> PlayerSnapshot {
    let ok = |data: Value| ResourceResult::fresh(data);
    PlayerSnapshot {
        username: "bob".to_string(),
        data: PlayerDataSet {
            profile: ok(json!({"username": "bob"})),
            stats: ok(json!({})),
            archives: ok(json!({"archives": []})),
            recent_games: ok(json!({ "games": games })),
            tournaments: ResourceResult::failed("Player not found: tournaments"),
            clubs: ok(json!({"clubs": []})),
            matches: ok(json!({"finished": []})),
        },
    }
}

fn scratch_dir(tag: &str) -> PathBuf {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    std::env::temp_dir().join(format!("chess_insight_{tag}_{}_{nanos}", std::process::id()))
}

#[test]
fn loading_sets_the_current_player() {
    let transport = ScriptedTransport::new();
    script_full_player(&transport, "bob");
    let harness = Harness::new(transport);
    let mut session = Session::new();

    let update = session.load_player(&harness.client, "bob", |_| {}).unwrap();

    assert_eq!(update.outcome, LoadOutcome::Loaded);
    assert_eq!(update.username, "bob");
    assert_eq!(update.notice, None);
    let current = session.current().unwrap();
    assert_eq!(current.username, "bob");
    assert!(!session.in_comparison());

    let metrics = current.metrics();
    assert_eq!((metrics.wins, metrics.losses, metrics.draws), (3, 1, 1));
    assert_eq!(metrics.win_rate, 60.0);
    assert_eq!(metrics.current_streak, Streak { kind: StreakKind::Win, count: 2 });

    let view = current.game_view();
    assert_eq!(view.games()[0].url, "https://www.chess.com/game/live/1005");
}

#[test]
fn failed_load_keeps_previous_player() {
    let transport = ScriptedTransport::new();
    script_full_player(&transport, "bob");
    let harness = Harness::new(transport);
    let mut session = Session::new();

    session.load_player(&harness.client, "bob", |_| {}).unwrap();
    assert!(session.load_player(&harness.client, "ghost", |_| {}).is_err());
    assert_eq!(session.current().map(|p| p.username.as_str()), Some("bob"));
}

#[test]
fn partial_failure_notice_reaches_the_caller() {
    let transport = ScriptedTransport::new();
    script_player_without(&transport, "bob", &["/matches"]);
    let harness = Harness::new(transport);
    let mut session = Session::new();

    let update = session.load_player(&harness.client, "bob", |_| {}).unwrap();
    assert_eq!(
        update.notice.as_deref(),
        Some("Some data unavailable: Matches. Showing available data.")
    );
    assert!(session.current().unwrap().data.finished_matches().is_empty());
}

#[test]
fn comparison_pairs_current_player_with_next_load() {
    let transport = ScriptedTransport::new();
    script_full_player(&transport, "bob");
    script_full_player(&transport, "ann");
    script_full_player(&transport, "cid");
    let harness = Harness::new(transport);
    let mut session = Session::new();

    session.load_player(&harness.client, "bob", |_| {}).unwrap();
    session.enter_comparison();
    assert!(session.in_comparison());

    let update = session.load_player(&harness.client, "ann", |_| {}).unwrap();
    assert_eq!(update.outcome, LoadOutcome::ComparisonReady);
    assert_eq!(session.current().unwrap().username, "bob");

    let comparison = session.comparison().unwrap();
    assert!(comparison.is_ready());
    assert_eq!(comparison.player2.as_ref().unwrap().username, "ann");
    assert_eq!(
        comparison.rows(),
        vec![
            ComparisonRow {
                time_class: TimeClass::Blitz,
                player1: Some(1512),
                player2: Some(1512),
            },
            ComparisonRow {
                time_class: TimeClass::Rapid,
                player1: Some(1688),
                player2: Some(1688),
            },
        ]
    );

    let update = session.load_player(&harness.client, "cid", |_| {}).unwrap();
    assert_eq!(update.outcome, LoadOutcome::Loaded);
    assert_eq!(session.current().unwrap().username, "cid");

    session.exit_comparison();
    assert!(session.comparison().is_none());
}

#[test]
fn comparison_without_current_player_fills_first_slot() {
    let transport = ScriptedTransport::new();
    script_full_player(&transport, "ann");
    script_full_player(&transport, "bob");
    let harness = Harness::new(transport);
    let mut session = Session::new();

    session.enter_comparison();
    let first = session.load_player(&harness.client, "ann", |_| {}).unwrap();
    assert_eq!(first.outcome, LoadOutcome::ComparisonFirst);
    assert!(session.current().is_none());

    let second = session.load_player(&harness.client, "bob", |_| {}).unwrap();
    assert_eq!(second.outcome, LoadOutcome::ComparisonReady);
}

#[test]
fn export_keeps_fifty_newest_games() {
    let chronological: Vec<Game> = (0..60).map(|idx| game("bob", "win", Some(1400), idx)).collect();
    let snapshot = snapshot_with_games(&chronological);

    let doc = build_export(&snapshot, export_time()).unwrap();
    assert_eq!(doc.username, "bob");
    assert_eq!(doc.export_date, "2024-01-05T00:00:00.000Z");
    assert_eq!(doc.games.len(), EXPORT_GAME_LIMIT);
    assert_eq!(doc.games[0].end_time, Some(59));
    assert_eq!(doc.games[EXPORT_GAME_LIMIT - 1].end_time, Some(10));
    assert!(doc.tournaments.is_none());

    let value = serde_json::to_value(&doc).unwrap();
    assert_eq!(value["exportDate"], "2024-01-05T00:00:00.000Z");
    assert_eq!(value["profile"]["username"], "bob");
    assert!(value["tournaments"].is_null());
}

#[test]
fn export_requires_a_profile() {
    let mut snapshot = snapshot_with_games(&[]);
    snapshot.data.profile = ResourceResult::failed("Player not found: profile");
    let err = build_export(&snapshot, export_time()).unwrap_err();
    assert_eq!(err.to_string(), "No profile data to export");
}

#[test]
fn export_is_written_as_pretty_json() {
    let games = vec![game("bob", "win", Some(1400), 1), game("bob", "resigned", None, 2)];
    let snapshot = snapshot_with_games(&games);
    let dir = scratch_dir("export");

    let path = write_export(&snapshot, &dir, export_time()).unwrap();
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some(export_file_name("bob", export_time()).as_str())
    );
    assert_eq!(export_file_name("bob", export_time()), "chess-profile-bob-1704412800000.json");

    let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["username"], "bob");
    assert_eq!(written["games"].as_array().map(Vec::len), Some(2));
    assert_eq!(written["games"][0]["end_time"], 2);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn resource_results_serialize_with_success_flag() {
    let ok = serde_json::to_value(ResourceResult::from_cache(json!({"a": 1}))).unwrap();
    assert_eq!(ok, json!({"success": true, "data": {"a": 1}, "cached": true}));

    let failed = serde_json::to_value(ResourceResult::failed("Rate limit exceeded. Please try again later.")).unwrap();
    assert_eq!(
        failed,
        json!({
            "success": false,
            "error": "Rate limit exceeded. Please try again later.",
            "cached": false
        })
    );
}
