use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.chess.com/pub";
pub const DEFAULT_CACHE_NAMESPACE: &str = "chess_cache_";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(60 * 60 * 1000);
const DEFAULT_USER_AGENT: &str = "chess_insight/0.1";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub cache_ttl: Duration,
    pub cache_namespace: String,
    // None disables the durable store; an in-memory store is used instead.
    pub cache_path: Option<PathBuf>,
    pub fetch_parallelism: usize,
    pub rating_history_months: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_base_delay: Duration::from_secs(1),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_namespace: DEFAULT_CACHE_NAMESPACE.to_string(),
            cache_path: default_cache_path(),
            fetch_parallelism: 6,
            rating_history_months: 6,
        }
    }
}

impl Config {
    /// Builds a config from the process environment, falling back to defaults
    /// for anything missing or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_base = env::var("CHESS_API_BASE")
            .ok()
            .map(|val| val.trim().trim_end_matches('/').to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or(defaults.api_base);
        let user_agent = env::var("CHESS_USER_AGENT")
            .ok()
            .filter(|val| !val.trim().is_empty())
            .unwrap_or(defaults.user_agent);
        let cache_namespace = env::var("CACHE_NAMESPACE")
            .ok()
            .filter(|val| !val.trim().is_empty())
            .unwrap_or(defaults.cache_namespace);
        let cache_path = match env::var("CACHE_PATH") {
            Ok(val) if val.trim().eq_ignore_ascii_case("none") => None,
            Ok(val) if !val.trim().is_empty() => Some(PathBuf::from(val.trim())),
            _ => defaults.cache_path,
        };

        Self {
            api_base,
            user_agent,
            request_timeout: Duration::from_secs(
                env_number("REQUEST_TIMEOUT_SECS").unwrap_or(10).clamp(1, 120),
            ),
            max_retries: env_number("FETCH_RETRIES").unwrap_or(2).min(10) as u32,
            retry_base_delay: Duration::from_millis(
                env_number("RETRY_BASE_DELAY_MS").unwrap_or(1000).min(60_000),
            ),
            cache_ttl: Duration::from_secs(
                env_number("CACHE_TTL_SECS").unwrap_or(3600).max(1),
            ),
            cache_namespace,
            cache_path,
            fetch_parallelism: env_number("FETCH_PARALLELISM").unwrap_or(6).clamp(1, 32)
                as usize,
            rating_history_months: env_number("RATING_HISTORY_MONTHS")
                .unwrap_or(6)
                .clamp(1, 36) as usize,
        }
    }
}

fn env_number(name: &str) -> Option<u64> {
    env::var(name)
        .ok()
        .and_then(|val| val.trim().parse::<u64>().ok())
}

pub fn app_cache_dir() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join("chess_insight"));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join("chess_insight"))
}

fn default_cache_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("cache.sqlite"))
}
