//! Read models over the pool catalogue.
//!
//! Pure queries: nothing here opens a transaction or mutates state.

use std::sync::Arc;

use crate::domain::{PoolDetail, PoolId, UserId};
use crate::error::ApiError;
use crate::persistence::{CarpoolStore, PoolFilter, UserPoolsScope};

/// A user's pools split by role. A scope that excludes one side leaves
/// that list empty.
#[derive(Debug, Clone, Default)]
pub struct UserPools {
    /// Pools the user created.
    pub created: Vec<PoolDetail>,
    /// Pools the user joined as a non-creator member.
    pub joined: Vec<PoolDetail>,
}

/// Listing, detail, and per-user pool views.
#[derive(Debug, Clone)]
pub struct QueryService<S> {
    store: Arc<S>,
}

impl<S: CarpoolStore> QueryService<S> {
    /// Creates a new `QueryService`.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Lists pools matching the filter, soonest departure first.
    ///
    /// # Errors
    ///
    /// Returns an internal error on store failure.
    pub async fn list(&self, filter: &PoolFilter) -> Result<Vec<PoolDetail>, ApiError> {
        self.store
            .list_pools(filter)
            .await
            .map_err(|e| ApiError::internal("Failed to fetch pools", e))
    }

    /// Loads one pool with creator and roster.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::PoolNotFound`] for unknown ids and an
    /// internal error on store failure.
    pub async fn detail(&self, id: PoolId) -> Result<PoolDetail, ApiError> {
        self.store
            .pool_detail(id)
            .await
            .map_err(|e| ApiError::internal("Failed to fetch pool", e))?
            .ok_or(ApiError::PoolNotFound)
    }

    /// The user's own pools, selected by scope.
    ///
    /// # Errors
    ///
    /// Returns an internal error on store failure.
    pub async fn user_pools(
        &self,
        user: UserId,
        scope: UserPoolsScope,
    ) -> Result<UserPools, ApiError> {
        let created = if scope.includes_created() {
            self.store
                .pools_created_by(user)
                .await
                .map_err(|e| ApiError::internal("Failed to fetch user pools", e))?
        } else {
            Vec::new()
        };
        let joined = if scope.includes_joined() {
            self.store
                .pools_joined_by(user)
                .await
                .map_err(|e| ApiError::internal("Failed to fetch user pools", e))?
        } else {
            Vec::new()
        };
        Ok(UserPools { created, joined })
    }
}
