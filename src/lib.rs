pub mod config;
pub mod error;
pub mod fallback;
pub mod http_client;
pub mod live_status;
pub mod match_history;
pub mod profile;
pub mod riot_fetch;
pub mod session;
pub mod sources;
pub mod state;
pub mod stats;
pub mod store;
pub mod timeout_guard;
