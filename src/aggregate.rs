use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use rayon::prelude::*;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ArchiveMonth, Endpoints, Resource, archive_urls};
use crate::cache::ExpiringCache;
use crate::cache_store::{CacheStore, MemoryStore, SqliteStore};
use crate::config::Config;
use crate::fetcher::{Fetcher, RetryPolicy};
use crate::http_client::ReqwestTransport;
use crate::model::{UsernameError, validate_username};
use crate::state::{PlayerDataSet, PlayerSnapshot, ResourceResult};

const PROFILE_FALLBACK_ERROR: &str = "Failed to fetch player profile";

// Everything except profile (fetched first) and recent games (needs archives).
const INDEPENDENT_RESOURCES: [Resource; 5] = [
    Resource::Stats,
    Resource::Archives,
    Resource::Tournaments,
    Resource::Clubs,
    Resource::Matches,
];

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    InvalidUsername(#[from] UsernameError),
    #[error("{0}")]
    ProfileUnavailable(String),
}

/// Upstream endpoints plus the fetch and cache layers used to reach them.
pub struct PlayerClient {
    endpoints: Endpoints,
    fetcher: Fetcher,
    cache: ExpiringCache,
    parallelism: usize,
    history_months: usize,
}

impl PlayerClient {
    pub fn new(endpoints: Endpoints, fetcher: Fetcher, cache: ExpiringCache) -> Self {
        Self {
            endpoints,
            fetcher,
            cache,
            parallelism: 6,
            history_months: 6,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config)?);
        let fetcher = Fetcher::new(transport).with_policy(RetryPolicy::from_config(config));
        let cache = ExpiringCache::from_config(open_store(config), config);
        Ok(Self::new(Endpoints::new(config.api_base.clone()), fetcher, cache)
            .with_parallelism(config.fetch_parallelism)
            .with_history_months(config.rating_history_months))
    }

    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = threads.max(1);
        self
    }

    pub fn with_history_months(mut self, months: usize) -> Self {
        self.history_months = months;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn cache(&self) -> &ExpiringCache {
        &self.cache
    }

    pub fn history_months(&self) -> usize {
        self.history_months
    }

    fn fetch_cached(&self, resource: Resource, username: &str) -> ResourceResult {
        let Some(url) = self.endpoints.url_for(resource, username) else {
            return ResourceResult::failed(format!("{resource} has no direct endpoint"));
        };
        let key = ExpiringCache::cache_key(resource, username);
        self.cache
            .fetch_with_caching(&self.fetcher, &url, resource.context(), &key)
    }

    /// Games of the most recent archive month. Always fetched fresh: the
    /// current month keeps changing until it ends.
    fn fetch_recent_games(&self, username: &str, archives: &ResourceResult) -> ResourceResult {
        let urls = archives.data().map(archive_urls).unwrap_or_default();
        let Some(latest) = urls.last() else {
            return ResourceResult::fresh(json!({ "games": [] }));
        };
        let Some(month) = ArchiveMonth::from_archive_url(latest) else {
            return ResourceResult::failed(format!("Invalid archive URL: {latest}"));
        };
        let url = self.endpoints.games_by_month(username, month);
        self.fetcher.fetch(&url, &month.context())
    }
}

fn open_store(config: &Config) -> Arc<dyn CacheStore> {
    let Some(path) = config.cache_path.as_ref() else {
        return Arc::new(MemoryStore::new());
    };
    match SqliteStore::open(path) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cache store unavailable, using memory");
            Arc::new(MemoryStore::new())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFailure {
    pub resource: Resource,
    pub error: String,
}

#[derive(Debug)]
pub struct PlayerFetch {
    pub username: String,
    pub data: PlayerDataSet,
    pub errors: Vec<ResourceFailure>,
}

impl PlayerFetch {
    pub fn failed_resources(&self) -> Vec<Resource> {
        self.errors.iter().map(|f| f.resource).collect()
    }

    pub fn partial_failure_notice(&self) -> Option<String> {
        let failed = self.errors.len();
        if failed == 0 || failed >= Resource::ALL.len() {
            return None;
        }
        let names = self
            .errors
            .iter()
            .map(|f| f.resource.label())
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!(
            "Some data unavailable: {names}. Showing available data."
        ))
    }

    pub fn into_snapshot(self) -> PlayerSnapshot {
        PlayerSnapshot {
            username: self.username,
            data: self.data,
        }
    }
}

/// Gathers all seven resources for one player. Only a failed profile is
/// fatal; any other failure is recorded in `PlayerFetch::errors`.
///
/// `on_progress` receives the completed percentage after each resource, in
/// the fixed order of `Resource::ALL`.
pub fn fetch_all_player_data(
    client: &PlayerClient,
    raw_username: &str,
    mut on_progress: impl FnMut(f64),
) -> Result<PlayerFetch, AggregateError> {
    let username = validate_username(raw_username)?;
    let total = Resource::ALL.len();
    let percent = |done: usize| done as f64 / total as f64 * 100.0;

    let profile = client.fetch_cached(Resource::Profile, &username);
    on_progress(percent(1));
    if let ResourceResult::Failed { error } = &profile {
        warn!(username = %username, error = %error, "profile fetch failed");
        let message = if error.trim().is_empty() {
            PROFILE_FALLBACK_ERROR.to_string()
        } else {
            error.clone()
        };
        return Err(AggregateError::ProfileUnavailable(message));
    }

    let mut results: HashMap<Resource, ResourceResult> =
        with_fetch_pool(client.parallelism, || {
            INDEPENDENT_RESOURCES[..]
                .par_iter()
                .map(|resource| (*resource, client.fetch_cached(*resource, &username)))
                .collect()
        });
    let archives = results
        .remove(&Resource::Archives)
        .unwrap_or_else(|| ResourceResult::failed("archives not fetched"));
    let recent_games = client.fetch_recent_games(&username, &archives);
    results.insert(Resource::Archives, archives);
    results.insert(Resource::RecentGames, recent_games);

    let mut errors = Vec::new();
    for (idx, resource) in Resource::ALL.iter().enumerate().skip(1) {
        if let Some(ResourceResult::Failed { error }) = results.get(resource) {
            warn!(username = %username, resource = resource.key(), error = %error, "resource unavailable");
            errors.push(ResourceFailure {
                resource: *resource,
                error: error.clone(),
            });
        }
        on_progress(percent(idx + 1));
    }

    let mut take = |resource: Resource| {
        results
            .remove(&resource)
            .unwrap_or_else(|| ResourceResult::failed(format!("{resource} not fetched")))
    };
    let data = PlayerDataSet {
        profile,
        stats: take(Resource::Stats),
        archives: take(Resource::Archives),
        recent_games: take(Resource::RecentGames),
        tournaments: take(Resource::Tournaments),
        clubs: take(Resource::Clubs),
        matches: take(Resource::Matches),
    };

    info!(
        username = %username,
        failed = errors.len(),
        cached = Resource::ALL.iter().filter(|r| data.get(**r).is_cached()).count(),
        "player data aggregated"
    );

    Ok(PlayerFetch {
        username,
        data,
        errors,
    })
}

pub(crate) fn with_fetch_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}
