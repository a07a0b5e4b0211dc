//! In-memory [`CarpoolStore`] for service tests.
//!
//! A transaction takes the whole-store mutex and mutates a working copy
//! of the state; commit writes the copy back, drop discards it. Holding
//! the store lock for the life of the transaction gives the same
//! serialization the PostgreSQL row lock provides, at store granularity.
//! Store-level reads wait for any open transaction, so tests must not
//! interleave them with one.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{
    CreatorProfile, Gender, Membership, MembershipId, Pool, PoolDetail, PoolDraft, PoolId,
    PoolMember, User, UserId,
};
use crate::persistence::{
    CarpoolStore, NewUser, PoolFilter, StoreError, StoreTx, UNIQUE_POOL_MEMBER, UNIQUE_USERS_EMAIL,
    UNIQUE_USERS_PHONE,
};

#[derive(Debug, Clone, Default)]
struct MemState {
    users: Vec<User>,
    pools: Vec<Pool>,
    memberships: Vec<Membership>,
}

/// In-memory store with transactional semantics.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn creator_profile(user: &User) -> CreatorProfile {
    CreatorProfile {
        id: user.id,
        full_name: user.full_name.clone(),
        email: user.email.clone(),
        phone_number: user.phone_number.clone(),
        gender: user.gender,
    }
}

fn member_row(state: &MemState, membership: &Membership) -> Result<PoolMember, StoreError> {
    let user = state
        .users
        .iter()
        .find(|u| u.id == membership.user_id)
        .ok_or_else(|| {
            StoreError::Database(format!("missing user row for member {}", membership.user_id))
        })?;
    Ok(PoolMember {
        id: membership.id,
        pool_id: membership.pool_id,
        user_id: membership.user_id,
        is_creator: membership.is_creator,
        joined_at: membership.joined_at,
        full_name: user.full_name.clone(),
        phone_number: user.phone_number.clone(),
        gender: user.gender,
    })
}

fn assemble(state: &MemState, pool: Pool) -> Result<PoolDetail, StoreError> {
    let creator = state
        .users
        .iter()
        .find(|u| u.id == pool.created_by)
        .map(creator_profile)
        .ok_or_else(|| {
            StoreError::Database(format!("missing creator row for pool {}", pool.id))
        })?;
    let mut members = state
        .memberships
        .iter()
        .filter(|m| m.pool_id == pool.id)
        .map(|m| member_row(state, m))
        .collect::<Result<Vec<_>, _>>()?;
    members.sort_by_key(|m| m.joined_at);
    Ok(PoolDetail {
        pool,
        creator,
        members,
    })
}

fn assemble_sorted(state: &MemState, mut pools: Vec<Pool>) -> Result<Vec<PoolDetail>, StoreError> {
    pools.sort_by_key(|p| p.departure_time);
    pools.into_iter().map(|p| assemble(state, p)).collect()
}

#[async_trait]
impl CarpoolStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let work = guard.clone();
        Ok(MemoryTx { guard, work })
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.phone_number.as_deref() == Some(phone))
            .cloned())
    }

    async fn list_pools(&self, filter: &PoolFilter) -> Result<Vec<PoolDetail>, StoreError> {
        let state = self.state.lock().await;
        let matches = |p: &Pool| {
            filter
                .start_point
                .as_deref()
                .is_none_or(|s| p.start_point.to_lowercase().contains(&s.to_lowercase()))
                && filter
                    .end_point
                    .as_deref()
                    .is_none_or(|s| p.end_point.to_lowercase().contains(&s.to_lowercase()))
                && filter
                    .transport_mode
                    .is_none_or(|m| p.transport_mode == m)
                && filter
                    .departure_date
                    .is_none_or(|d| p.departure_time.date_naive() == d)
                && filter.is_female_only.is_none_or(|f| p.is_female_only == f)
        };
        let pools: Vec<Pool> = state.pools.iter().filter(|p| matches(p)).cloned().collect();
        assemble_sorted(&state, pools)
    }

    async fn pool_detail(&self, id: PoolId) -> Result<Option<PoolDetail>, StoreError> {
        let state = self.state.lock().await;
        state
            .pools
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .map(|p| assemble(&state, p))
            .transpose()
    }

    async fn pools_created_by(&self, user: UserId) -> Result<Vec<PoolDetail>, StoreError> {
        let state = self.state.lock().await;
        let pools: Vec<Pool> = state
            .pools
            .iter()
            .filter(|p| p.created_by == user)
            .cloned()
            .collect();
        assemble_sorted(&state, pools)
    }

    async fn pools_joined_by(&self, user: UserId) -> Result<Vec<PoolDetail>, StoreError> {
        let state = self.state.lock().await;
        let joined: Vec<PoolId> = state
            .memberships
            .iter()
            .filter(|m| m.user_id == user && !m.is_creator)
            .map(|m| m.pool_id)
            .collect();
        let pools: Vec<Pool> = state
            .pools
            .iter()
            .filter(|p| joined.contains(&p.id))
            .cloned()
            .collect();
        assemble_sorted(&state, pools)
    }
}

/// One open transaction over the in-memory state.
#[derive(Debug)]
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemState>,
    work: MemState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn commit(mut self) -> Result<(), StoreError> {
        *self.guard = self.work;
        Ok(())
    }

    async fn insert_user(&mut self, user: &NewUser) -> Result<User, StoreError> {
        if self.work.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(UNIQUE_USERS_EMAIL.to_string()));
        }
        let row = User {
            id: UserId::new(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            phone_number: None,
            gender: None,
            provider_subject: user.provider_subject.clone(),
            date_joined: Utc::now(),
        };
        self.work.users.push(row.clone());
        Ok(row)
    }

    async fn update_onboarding(
        &mut self,
        id: UserId,
        phone: &str,
        gender: Gender,
    ) -> Result<Option<User>, StoreError> {
        if self
            .work
            .users
            .iter()
            .any(|u| u.id != id && u.phone_number.as_deref() == Some(phone))
        {
            return Err(StoreError::Duplicate(UNIQUE_USERS_PHONE.to_string()));
        }
        let Some(user) = self.work.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.phone_number = Some(phone.to_string());
        user.gender = Some(gender);
        Ok(Some(user.clone()))
    }

    async fn lock_pool(&mut self, id: PoolId) -> Result<Option<Pool>, StoreError> {
        Ok(self.work.pools.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_pool(
        &mut self,
        draft: &PoolDraft,
        created_by: UserId,
    ) -> Result<Pool, StoreError> {
        let pool = Pool {
            id: PoolId::new(),
            start_point: draft.start_point.clone(),
            end_point: draft.end_point.clone(),
            departure_time: draft.departure_time,
            arrival_time: draft.arrival_time,
            transport_mode: draft.transport_mode,
            total_persons: draft.total_persons,
            current_persons: 1,
            total_fare: draft.total_fare,
            is_female_only: draft.is_female_only,
            created_by,
            created_at: Utc::now(),
        };
        self.work.pools.push(pool.clone());
        Ok(pool)
    }

    async fn delete_pool(&mut self, id: PoolId) -> Result<bool, StoreError> {
        let before = self.work.pools.len();
        self.work.pools.retain(|p| p.id != id);
        self.work.memberships.retain(|m| m.pool_id != id);
        Ok(self.work.pools.len() < before)
    }

    async fn set_occupancy(&mut self, id: PoolId, current_persons: i32) -> Result<(), StoreError> {
        if let Some(pool) = self.work.pools.iter_mut().find(|p| p.id == id) {
            pool.current_persons = current_persons;
        }
        Ok(())
    }

    async fn find_membership(
        &mut self,
        pool: PoolId,
        user: UserId,
    ) -> Result<Option<Membership>, StoreError> {
        Ok(self
            .work
            .memberships
            .iter()
            .find(|m| m.pool_id == pool && m.user_id == user)
            .cloned())
    }

    async fn insert_membership(
        &mut self,
        pool: PoolId,
        user: UserId,
        is_creator: bool,
    ) -> Result<Membership, StoreError> {
        if self
            .work
            .memberships
            .iter()
            .any(|m| m.pool_id == pool && m.user_id == user)
        {
            return Err(StoreError::Duplicate(UNIQUE_POOL_MEMBER.to_string()));
        }
        let row = Membership {
            id: MembershipId::new(),
            pool_id: pool,
            user_id: user,
            is_creator,
            joined_at: Utc::now(),
        };
        self.work.memberships.push(row.clone());
        Ok(row)
    }

    async fn delete_membership(&mut self, pool: PoolId, user: UserId) -> Result<bool, StoreError> {
        let before = self.work.memberships.len();
        self.work
            .memberships
            .retain(|m| !(m.pool_id == pool && m.user_id == user));
        Ok(self.work.memberships.len() < before)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            full_name: "Test User".to_string(),
            provider_subject: None,
        }
    }

    #[tokio::test]
    async fn commit_makes_writes_visible() {
        let store = MemoryStore::new();
        let Ok(mut tx) = store.begin().await else {
            panic!("begin failed");
        };
        let Ok(user) = tx.insert_user(&new_user("rider@thapar.edu")).await else {
            panic!("insert failed");
        };
        let Ok(()) = tx.commit().await else {
            panic!("commit failed");
        };

        let Ok(Some(found)) = store.find_user(user.id).await else {
            panic!("committed user not found");
        };
        assert_eq!(found.email, "rider@thapar.edu");
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let store = MemoryStore::new();
        {
            let Ok(mut tx) = store.begin().await else {
                panic!("begin failed");
            };
            let Ok(_) = tx.insert_user(&new_user("ghost@thapar.edu")).await else {
                panic!("insert failed");
            };
        }

        let Ok(found) = store.find_user_by_email("ghost@thapar.edu").await else {
            panic!("lookup failed");
        };
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn duplicate_email_names_the_constraint() {
        let store = MemoryStore::new();
        let Ok(mut tx) = store.begin().await else {
            panic!("begin failed");
        };
        let Ok(_) = tx.insert_user(&new_user("taken@thapar.edu")).await else {
            panic!("first insert failed");
        };
        let Err(err) = tx.insert_user(&new_user("taken@thapar.edu")).await else {
            panic!("second insert should conflict");
        };
        assert!(err.is_duplicate_of(UNIQUE_USERS_EMAIL));
    }
}
