//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::TokenService;
use crate::persistence::postgres::PgStore;
use crate::service::{AuthService, MembershipService, PoolService, QueryService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Identity exchange, onboarding, and session queries.
    pub auth: Arc<AuthService<PgStore>>,
    /// Pool creation and deletion.
    pub pools: Arc<PoolService<PgStore>>,
    /// Join and leave.
    pub membership: Arc<MembershipService<PgStore>>,
    /// Read-only pool queries.
    pub query: Arc<QueryService<PgStore>>,
    /// Token signing and verification, shared with the extractors.
    pub tokens: Arc<TokenService>,
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.tokens)
    }
}
