#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chess_insight::aggregate::PlayerClient;
use chess_insight::api::Endpoints;
use chess_insight::cache::{ExpiringCache, ManualClock};
use chess_insight::cache_store::MemoryStore;
use chess_insight::fetcher::{Fetcher, Sleeper};
use chess_insight::http_client::{HttpResponse, Transport, TransportError};
use chess_insight::model::{Game, GameSide};

pub const BASE: &str = "https://api.test/pub";
pub const START_MILLIS: i64 = 1_700_000_000_000;

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

pub fn player_url(username: &str, suffix: &str) -> String {
    format!("{BASE}/player/{username}{suffix}")
}

#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, String),
    Down,
}

/// Replies per URL, consumed in order. The last reply for a URL repeats once
/// the queue is down to one; unscripted URLs answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, url: impl Into<String>, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(url.into())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn ok(&self, url: impl Into<String>, body: impl Into<String>) -> &Self {
        self.reply(url, Reply::Status(200, body.into()))
    }

    pub fn status(&self, url: impl Into<String>, status: u16) -> &Self {
        self.reply(url, Reply::Status(status, "{}".to_string()))
    }

    pub fn down(&self, url: impl Into<String>) -> &Self {
        self.reply(url, Reply::Down)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls().iter().filter(|u| u.as_str() == url).count()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(url.to_string());
        let mut replies = self.replies.lock().unwrap();
        let reply = match replies.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        match reply {
            Some(Reply::Status(status, body)) => Ok(HttpResponse { status, body }),
            Some(Reply::Down) => Err(TransportError("connection refused".to_string())),
            None => Ok(HttpResponse {
                status: 404,
                body: "{}".to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) {
        self.delays.lock().unwrap().push(delay);
    }
}

pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub sleeper: Arc<RecordingSleeper>,
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryStore>,
    pub client: PlayerClient,
}

impl Harness {
    pub fn new(transport: ScriptedTransport) -> Self {
        Self::with_store(transport, MemoryStore::new())
    }

    pub fn with_store(transport: ScriptedTransport, store: MemoryStore) -> Self {
        let transport = Arc::new(transport);
        let sleeper = Arc::new(RecordingSleeper::default());
        let clock = Arc::new(ManualClock::new(START_MILLIS));
        let store = Arc::new(store);
        let fetcher = Fetcher::new(transport.clone()).with_sleeper(sleeper.clone());
        let cache = ExpiringCache::new(store.clone()).with_clock(clock.clone());
        let client = PlayerClient::new(Endpoints::new(BASE), fetcher, cache).with_parallelism(2);
        Self {
            transport,
            sleeper,
            clock,
            store,
            client,
        }
    }
}

/// Scripts every endpoint for `username` from the fixture files, with the
/// latest archive month pointing at the March 2024 games.
pub fn script_full_player(transport: &ScriptedTransport, username: &str) {
    script_player_without(transport, username, &[]);
}

/// Like `script_full_player`, leaving the endpoints whose path suffix is in
/// `skip` unscripted so they answer 404.
pub fn script_player_without(transport: &ScriptedTransport, username: &str, skip: &[&str]) {
    let archives = serde_json::json!({
        "archives": [
            format!("{BASE}/player/{username}/games/2023/12"),
            format!("{BASE}/player/{username}/games/2024/3"),
        ]
    });
    let endpoints = [
        ("", read_fixture("profile_bob.json")),
        ("/stats", read_fixture("stats_bob.json")),
        ("/games/archives", archives.to_string()),
        ("/games/2024/03", read_fixture("games_bob_2024_03.json")),
        ("/tournaments", read_fixture("tournaments_bob.json")),
        ("/clubs", read_fixture("clubs_bob.json")),
        ("/matches", read_fixture("matches_bob.json")),
    ];
    for (suffix, body) in endpoints {
        if !skip.contains(&suffix) {
            transport.ok(player_url(username, suffix), body);
        }
    }
}

pub fn side(username: &str, rating: Option<u32>, result: &str) -> GameSide {
    GameSide {
        username: username.to_string(),
        rating,
        result: result.to_string(),
    }
}

/// A game where `player` holds white with `result` against `rival`.
pub fn game(player: &str, result: &str, opponent_rating: Option<u32>, end_time: i64) -> Game {
    let opponent_result = match result {
        "win" => "resigned",
        "checkmated" | "resigned" | "timeout" => "win",
        other => other,
    };
    Game {
        white: side(player, Some(1500), result),
        black: side("rival", opponent_rating, opponent_result),
        end_time: Some(end_time),
        time_control: "600".to_string(),
        time_class: Some("rapid".to_string()),
        url: format!("https://www.chess.com/game/live/{end_time}"),
        pgn: None,
    }
}

pub fn game_in(time_class: &str, time_control: &str, result: &str, end_time: i64) -> Game {
    Game {
        time_control: time_control.to_string(),
        time_class: Some(time_class.to_string()),
        ..game("bob", result, Some(1400), end_time)
    }
}
