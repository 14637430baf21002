pub mod aggregate;
pub mod api;
pub mod cache;
pub mod cache_store;
pub mod config;
pub mod export;
pub mod fetcher;
pub mod format;
pub mod game_view;
pub mod http_client;
pub mod metrics;
pub mod model;
pub mod rating_history;
pub mod state;
