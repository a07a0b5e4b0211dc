//! Pool lifecycle: creation and deletion.

use std::sync::Arc;

use crate::domain::{Gender, PoolDetail, PoolDraft, PoolId, UserId};
use crate::error::ApiError;
use crate::persistence::{CarpoolStore, StoreTx};

/// Creates and deletes pools.
///
/// Creation seats the creator as the first member in the same
/// transaction as the pool row, so a pool is never observable without
/// its creator membership.
#[derive(Debug, Clone)]
pub struct PoolService<S> {
    store: Arc<S>,
}

impl<S: CarpoolStore> PoolService<S> {
    /// Creates a new `PoolService`.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates a pool from a validated draft. The creator becomes its
    /// first member and occupancy starts at one.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::FemaleOnlyCreation`] when a non-female user
    /// requests a female-only pool, [`ApiError::UserNotFound`] when the
    /// creator row is gone, and an internal error on store failure.
    pub async fn create(&self, creator: UserId, draft: PoolDraft) -> Result<PoolDetail, ApiError> {
        let user = self
            .store
            .find_user(creator)
            .await
            .map_err(|e| ApiError::internal("Failed to create pool", e))?
            .ok_or(ApiError::UserNotFound)?;
        if draft.is_female_only && user.gender != Some(Gender::Female) {
            return Err(ApiError::FemaleOnlyCreation);
        }

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| ApiError::internal("Failed to create pool", e))?;
        let pool = tx
            .insert_pool(&draft, creator)
            .await
            .map_err(|e| ApiError::internal("Failed to create pool", e))?;
        tx.insert_membership(pool.id, creator, true)
            .await
            .map_err(|e| ApiError::internal("Failed to create pool", e))?;
        tx.commit()
            .await
            .map_err(|e| ApiError::internal("Failed to create pool", e))?;

        tracing::info!(pool_id = %pool.id, user_id = %creator, "pool created");
        self.store
            .pool_detail(pool.id)
            .await
            .map_err(|e| ApiError::internal("Failed to create pool", e))?
            .ok_or_else(|| {
                ApiError::internal("Failed to create pool", "created pool vanished on readback")
            })
    }

    /// Deletes a pool and its roster. Only the creator may do this.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::PoolNotFound`] for unknown pools,
    /// [`ApiError::NotCreator`] for anyone but the creator, and an
    /// internal error on store failure.
    pub async fn delete(&self, requester: UserId, pool: PoolId) -> Result<(), ApiError> {
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| ApiError::internal("Failed to delete pool", e))?;
        let Some(row) = tx
            .lock_pool(pool)
            .await
            .map_err(|e| ApiError::internal("Failed to delete pool", e))?
        else {
            return Err(ApiError::PoolNotFound);
        };
        if row.created_by != requester {
            return Err(ApiError::NotCreator);
        }
        tx.delete_pool(pool)
            .await
            .map_err(|e| ApiError::internal("Failed to delete pool", e))?;
        tx.commit()
            .await
            .map_err(|e| ApiError::internal("Failed to delete pool", e))?;

        tracing::info!(pool_id = %pool, user_id = %requester, "pool deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::memory::MemoryStore;
    use crate::service::testing::{draft, seed_user};

    fn make_service() -> (PoolService<MemoryStore>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (PoolService::new(Arc::clone(&store)), store)
    }

    #[tokio::test]
    async fn create_seats_the_creator() {
        let (service, store) = make_service();
        let creator = seed_user(&store, "creator@thapar.edu", Some(("9876543210", Gender::Male)))
            .await;

        let Ok(detail) = service.create(creator.id, draft()).await else {
            panic!("create failed");
        };
        assert_eq!(detail.pool.current_persons, 1);
        assert_eq!(detail.pool.created_by, creator.id);
        assert!((detail.pool.fare_per_head() - 400.0).abs() < f64::EPSILON);
        assert_eq!(detail.members.len(), 1);
        let Some(member) = detail.members.first() else {
            panic!("creator membership missing");
        };
        assert!(member.is_creator);
        assert_eq!(member.user_id, creator.id);
        assert_eq!(detail.creator.email, "creator@thapar.edu");
    }

    #[tokio::test]
    async fn female_only_pool_requires_a_female_creator() {
        let (service, store) = make_service();
        let male = seed_user(&store, "male@thapar.edu", Some(("9876543210", Gender::Male))).await;
        let unset = seed_user(&store, "unset@thapar.edu", None).await;
        let female =
            seed_user(&store, "female@thapar.edu", Some(("9876543211", Gender::Female))).await;

        let restricted = PoolDraft {
            is_female_only: true,
            ..draft()
        };
        let result = service.create(male.id, restricted.clone()).await;
        assert!(matches!(result, Err(ApiError::FemaleOnlyCreation)));
        let result = service.create(unset.id, restricted.clone()).await;
        assert!(matches!(result, Err(ApiError::FemaleOnlyCreation)));

        // The rejection happens before the transaction opens.
        let Ok(rows) = store.pools_created_by(male.id).await else {
            panic!("lookup failed");
        };
        assert!(rows.is_empty());

        assert!(service.create(female.id, restricted).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_creator_is_rejected() {
        let (service, _store) = make_service();
        let result = service.create(UserId::new(), draft()).await;
        assert!(matches!(result, Err(ApiError::UserNotFound)));
    }

    #[tokio::test]
    async fn only_the_creator_may_delete() {
        let (service, store) = make_service();
        let creator = seed_user(&store, "creator@thapar.edu", Some(("9876543210", Gender::Male)))
            .await;
        let other = seed_user(&store, "other@thapar.edu", Some(("9876543211", Gender::Male))).await;
        let Ok(detail) = service.create(creator.id, draft()).await else {
            panic!("create failed");
        };

        let result = service.delete(other.id, detail.pool.id).await;
        assert!(matches!(result, Err(ApiError::NotCreator)));
        let Ok(Some(_)) = store.pool_detail(detail.pool.id).await else {
            panic!("pool should survive a rejected delete");
        };
    }

    #[tokio::test]
    async fn delete_removes_pool_and_roster() {
        let (service, store) = make_service();
        let creator = seed_user(&store, "creator@thapar.edu", Some(("9876543210", Gender::Male)))
            .await;
        let Ok(detail) = service.create(creator.id, draft()).await else {
            panic!("create failed");
        };

        let Ok(()) = service.delete(creator.id, detail.pool.id).await else {
            panic!("delete failed");
        };
        let Ok(found) = store.pool_detail(detail.pool.id).await else {
            panic!("lookup failed");
        };
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn deleting_a_missing_pool_is_not_found() {
        let (service, store) = make_service();
        let creator = seed_user(&store, "creator@thapar.edu", Some(("9876543210", Gender::Male)))
            .await;

        let result = service.delete(creator.id, PoolId::new()).await;
        assert!(matches!(result, Err(ApiError::PoolNotFound)));
    }
}
