//! Joining and leaving pools.
//!
//! Every transition locks the pool row first, so the occupancy check
//! and the membership write happen under one lock and a full pool can
//! never oversell a seat to two concurrent joiners.

use std::sync::Arc;

use crate::domain::{Gender, Pool, PoolId, UserId};
use crate::error::ApiError;
use crate::persistence::{CarpoolStore, StoreTx, UNIQUE_POOL_MEMBER};

/// Adds and removes pool members while keeping `current_persons` equal
/// to the membership count.
#[derive(Debug, Clone)]
pub struct MembershipService<S> {
    store: Arc<S>,
}

impl<S: CarpoolStore> MembershipService<S> {
    /// Creates a new `MembershipService`.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Adds `user` to the pool and returns the pool with its occupancy
    /// already bumped.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::PoolNotFound`], [`ApiError::AlreadyMember`],
    /// [`ApiError::PoolFull`], or [`ApiError::FemaleOnlyPool`] in that
    /// order of precedence, [`ApiError::UserNotFound`] when the joining
    /// user's row is gone, and an internal error on store failure.
    pub async fn join(&self, user: UserId, pool: PoolId) -> Result<Pool, ApiError> {
        let member = self
            .store
            .find_user(user)
            .await
            .map_err(|e| ApiError::internal("Failed to join pool", e))?
            .ok_or(ApiError::UserNotFound)?;

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| ApiError::internal("Failed to join pool", e))?;
        let Some(row) = tx
            .lock_pool(pool)
            .await
            .map_err(|e| ApiError::internal("Failed to join pool", e))?
        else {
            return Err(ApiError::PoolNotFound);
        };
        if tx
            .find_membership(pool, user)
            .await
            .map_err(|e| ApiError::internal("Failed to join pool", e))?
            .is_some()
        {
            return Err(ApiError::AlreadyMember);
        }
        if row.is_full() {
            return Err(ApiError::PoolFull);
        }
        if row.is_female_only && member.gender != Some(Gender::Female) {
            return Err(ApiError::FemaleOnlyPool);
        }

        match tx.insert_membership(pool, user, false).await {
            Ok(_) => {}
            Err(err) if err.is_duplicate_of(UNIQUE_POOL_MEMBER) => {
                return Err(ApiError::AlreadyMember);
            }
            Err(err) => return Err(ApiError::internal("Failed to join pool", err)),
        }
        let occupancy = row.current_persons.saturating_add(1);
        tx.set_occupancy(pool, occupancy)
            .await
            .map_err(|e| ApiError::internal("Failed to join pool", e))?;
        tx.commit()
            .await
            .map_err(|e| ApiError::internal("Failed to join pool", e))?;

        tracing::info!(pool_id = %pool, user_id = %user, "member joined");
        Ok(Pool {
            current_persons: occupancy,
            ..row
        })
    }

    /// Removes `user` from the pool, freeing the seat.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotMember`] when the user holds no membership
    /// (a missing pool reads the same way),
    /// [`ApiError::CreatorCannotLeave`] for the creator, and an internal
    /// error on store failure.
    pub async fn leave(&self, user: UserId, pool: PoolId) -> Result<(), ApiError> {
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| ApiError::internal("Failed to leave pool", e))?;
        let Some(row) = tx
            .lock_pool(pool)
            .await
            .map_err(|e| ApiError::internal("Failed to leave pool", e))?
        else {
            return Err(ApiError::NotMember);
        };
        let Some(membership) = tx
            .find_membership(pool, user)
            .await
            .map_err(|e| ApiError::internal("Failed to leave pool", e))?
        else {
            return Err(ApiError::NotMember);
        };
        if membership.is_creator {
            return Err(ApiError::CreatorCannotLeave);
        }

        tx.delete_membership(pool, user)
            .await
            .map_err(|e| ApiError::internal("Failed to leave pool", e))?;
        tx.set_occupancy(pool, row.current_persons.saturating_sub(1))
            .await
            .map_err(|e| ApiError::internal("Failed to leave pool", e))?;
        tx.commit()
            .await
            .map_err(|e| ApiError::internal("Failed to leave pool", e))?;

        tracing::info!(pool_id = %pool, user_id = %user, "member left");
        Ok(())
    }
}
