mod common;

use chess_insight::aggregate::{AggregateError, fetch_all_player_data};
use chess_insight::api::Resource;
use chess_insight::model::UsernameError;
use common::{
    BASE, Harness, ScriptedTransport, player_url, read_fixture, script_full_player,
    script_player_without,
};

#[test]
fn invalid_usernames_never_reach_the_network() {
    let harness = Harness::new(ScriptedTransport::new());
    let cases = [
        ("", UsernameError::Empty),
        ("   ", UsernameError::Empty),
        ("a", UsernameError::Length),
        ("abcdefghijklmnopqrstu", UsernameError::Length),
        ("bob smith", UsernameError::Charset),
        ("bob!", UsernameError::Charset),
    ];
    for (raw, expected) in cases {
        let err = fetch_all_player_data(&harness.client, raw, |_| {}).err();
        assert!(
            matches!(&err, Some(AggregateError::InvalidUsername(e)) if *e == expected),
            "{raw:?} gave {err:?}"
        );
    }
    assert!(harness.transport.calls().is_empty());
}

#[test]
fn username_errors_carry_user_facing_text() {
    let harness = Harness::new(ScriptedTransport::new());
    let err = fetch_all_player_data(&harness.client, "x", |_| {}).unwrap_err();
    assert_eq!(err.to_string(), "Username must be between 2 and 20 characters");
}

#[test]
fn missing_profile_fails_the_whole_load() {
    let transport = ScriptedTransport::new();
    script_player_without(&transport, "bob", &[""]);
    let harness = Harness::new(transport);

    let err = fetch_all_player_data(&harness.client, "bob", |_| {}).unwrap_err();
    assert!(matches!(err, AggregateError::ProfileUnavailable(_)));
    assert_eq!(err.to_string(), "Player not found: profile");
    assert_eq!(harness.transport.calls(), vec![player_url("bob", "")]);
}

#[test]
fn full_load_collects_every_resource() {
    let transport = ScriptedTransport::new();
    script_full_player(&transport, "bob");
    let harness = Harness::new(transport);
    let mut progress = Vec::new();

    let fetched = fetch_all_player_data(&harness.client, "  bob ", |pct| progress.push(pct)).unwrap();

    assert_eq!(fetched.username, "bob");
    assert!(fetched.errors.is_empty());
    assert_eq!(fetched.partial_failure_notice(), None);
    assert!(fetched.data.is_valid());
    for resource in Resource::ALL {
        assert!(fetched.data.get(resource).is_success(), "{resource} failed");
    }
    assert_eq!(fetched.data.recent_games().len(), 5);
    assert_eq!(fetched.data.archive_urls().len(), 2);

    assert_eq!(progress.len(), Resource::ALL.len());
    assert!(progress.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(progress.last().copied(), Some(100.0));
    assert_eq!(harness.transport.calls().len(), 7);
}

#[test]
fn latest_archive_month_is_zero_padded() {
    let transport = ScriptedTransport::new();
    script_full_player(&transport, "bob");
    let harness = Harness::new(transport);

    fetch_all_player_data(&harness.client, "bob", |_| {}).unwrap();

    let games_url = format!("{BASE}/player/bob/games/2024/03");
    assert_eq!(harness.transport.calls_to(&games_url), 1);
    assert_eq!(harness.transport.calls_to(&player_url("bob", "/games/2023/12")), 0);
}

#[test]
fn partial_failures_are_listed_in_fixed_order() {
    let transport = ScriptedTransport::new();
    script_player_without(&transport, "bob", &["/clubs", "/stats"]);
    let harness = Harness::new(transport);

    let fetched = fetch_all_player_data(&harness.client, "bob", |_| {}).unwrap();

    assert_eq!(
        fetched.failed_resources(),
        vec![Resource::Stats, Resource::Clubs]
    );
    assert_eq!(fetched.errors[0].error, "Player not found: stats");
    assert_eq!(
        fetched.partial_failure_notice().as_deref(),
        Some("Some data unavailable: Stats, Clubs. Showing available data.")
    );
    assert!(fetched.data.profile.is_success());
    assert!(fetched.data.clubs().is_empty());
    assert_eq!(fetched.data.failed_resources(), vec![Resource::Stats, Resource::Clubs]);
}

#[test]
fn failed_archives_leave_recent_games_empty_but_successful() {
    let transport = ScriptedTransport::new();
    script_player_without(&transport, "bob", &["/games/archives"]);
    let harness = Harness::new(transport);

    let fetched = fetch_all_player_data(&harness.client, "bob", |_| {}).unwrap();

    assert_eq!(fetched.failed_resources(), vec![Resource::Archives]);
    assert!(fetched.data.recent_games.is_success());
    assert!(fetched.data.recent_games().is_empty());
    assert_eq!(
        fetched.partial_failure_notice().as_deref(),
        Some("Some data unavailable: Game Archives. Showing available data.")
    );
}

#[test]
fn empty_archive_list_gives_no_games() {
    let transport = ScriptedTransport::new();
    transport
        .ok(player_url("bob", ""), read_fixture("profile_bob.json"))
        .ok(player_url("bob", "/games/archives"), r#"{"archives":[]}"#);
    let harness = Harness::new(transport);

    let fetched = fetch_all_player_data(&harness.client, "bob", |_| {}).unwrap();

    assert!(fetched.data.archives.is_success());
    assert_eq!(
        fetched.data.recent_games.data(),
        Some(&serde_json::json!({"games": []}))
    );
    assert!(!fetched.failed_resources().contains(&Resource::RecentGames));
}

#[test]
fn unreadable_archive_url_fails_recent_games_only() {
    let transport = ScriptedTransport::new();
    transport
        .ok(player_url("bob", ""), read_fixture("profile_bob.json"))
        .ok(
            player_url("bob", "/games/archives"),
            r#"{"archives":["https://api.test/pub/player/bob/games/latest"]}"#,
        );
    let harness = Harness::new(transport);

    let fetched = fetch_all_player_data(&harness.client, "bob", |_| {}).unwrap();

    assert_eq!(
        fetched.data.recent_games.error(),
        Some("Invalid archive URL: https://api.test/pub/player/bob/games/latest")
    );
    assert!(fetched.failed_resources().contains(&Resource::RecentGames));
}

#[test]
fn second_load_hits_cache_except_recent_games() {
    let transport = ScriptedTransport::new();
    script_full_player(&transport, "bob");
    let harness = Harness::new(transport);

    let first = fetch_all_player_data(&harness.client, "bob", |_| {}).unwrap();
    let second = fetch_all_player_data(&harness.client, "bob", |_| {}).unwrap();

    assert!(!first.data.profile.is_cached());
    for resource in Resource::ALL {
        let cached = second.data.get(resource).is_cached();
        assert_eq!(cached, resource != Resource::RecentGames, "{resource}");
    }
    assert_eq!(harness.transport.calls_to(&player_url("bob", "")), 1);
    assert_eq!(harness.transport.calls_to(&player_url("bob", "/games/2024/03")), 2);
    assert_eq!(harness.store.len(), 6);
}

#[test]
fn network_outage_on_profile_reports_network_error() {
    let transport = ScriptedTransport::new();
    transport.down(player_url("bob", ""));
    let harness = Harness::new(transport);

    let err = fetch_all_player_data(&harness.client, "bob", |_| {}).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Network error. Please check your internet connection."
    );
    assert_eq!(harness.sleeper.delays().len(), 2);
}
