use crate::config::Config;
use crate::matcher_client::MatcherClient;

/// Shared application state injected into all route handlers via Axum extractors.
/// Read-only after startup; requests never share mutable state.
#[derive(Clone)]
pub struct AppState {
    pub matcher: MatcherClient,
    pub config: Config,
}
