//! Shared fixtures for service tests.

#![allow(clippy::panic)]

use chrono::{Duration, Utc};

use crate::domain::{Gender, Pool, PoolDraft, TransportMode, User, UserId};
use crate::persistence::memory::MemoryStore;
use crate::persistence::{CarpoolStore, NewUser, StoreTx};

/// Registers a user, optionally with a completed onboarding profile.
pub(crate) async fn seed_user(
    store: &MemoryStore,
    email: &str,
    onboarding: Option<(&str, Gender)>,
) -> User {
    let Ok(mut tx) = store.begin().await else {
        panic!("begin failed");
    };
    let Ok(user) = tx
        .insert_user(&NewUser {
            email: email.to_string(),
            full_name: "Test Rider".to_string(),
            provider_subject: None,
        })
        .await
    else {
        panic!("insert user failed");
    };
    let user = if let Some((phone, gender)) = onboarding {
        let Ok(Some(updated)) = tx.update_onboarding(user.id, phone, gender).await else {
            panic!("onboarding failed");
        };
        updated
    } else {
        user
    };
    let Ok(()) = tx.commit().await else {
        panic!("commit failed");
    };
    user
}

/// Inserts a pool with its creator membership, as pool creation does.
pub(crate) async fn seed_pool(store: &MemoryStore, creator: UserId, draft: &PoolDraft) -> Pool {
    let Ok(mut tx) = store.begin().await else {
        panic!("begin failed");
    };
    let Ok(pool) = tx.insert_pool(draft, creator).await else {
        panic!("insert pool failed");
    };
    let Ok(_) = tx.insert_membership(pool.id, creator, true).await else {
        panic!("creator membership failed");
    };
    let Ok(()) = tx.commit().await else {
        panic!("commit failed");
    };
    pool
}

/// A plausible future trip with four seats and a 400 fare.
pub(crate) fn draft() -> PoolDraft {
    PoolDraft {
        start_point: "Hostel J".to_string(),
        end_point: "Delhi Airport".to_string(),
        departure_time: Utc::now() + Duration::hours(6),
        arrival_time: Utc::now() + Duration::hours(12),
        transport_mode: TransportMode::Car,
        total_persons: 4,
        total_fare: 400.0,
        is_female_only: false,
    }
}
