//! Persistence layer: the relational store behind a unit-of-work seam.
//!
//! Services depend on [`CarpoolStore`] and [`StoreTx`] only, never on a
//! concrete database API. A [`StoreTx`] is one transaction: mutations
//! composed on it become durable together on [`StoreTx::commit`], and
//! dropping an uncommitted transaction rolls everything back. The
//! production implementation is [`postgres::PgStore`]; service tests run
//! against the in-memory [`memory::MemoryStore`].

#[cfg(test)]
pub mod memory;
pub mod postgres;

use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{
    Gender, Membership, Pool, PoolDetail, PoolDraft, PoolId, TransportMode, User, UserId,
};

/// Unique constraint on `users.email`.
pub const UNIQUE_USERS_EMAIL: &str = "users_email_key";
/// Unique constraint on `users.phone_number`.
pub const UNIQUE_USERS_PHONE: &str = "users_phone_number_key";
/// Unique constraint on `pool_members (pool_id, user_id)`.
pub const UNIQUE_POOL_MEMBER: &str = "pool_members_pool_id_user_id_key";

/// Errors surfaced by store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the constraint
    /// name so callers can map it onto the business conflict it guards.
    #[error("unique constraint violated: {0}")]
    Duplicate(String),

    /// Any other database failure.
    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Whether this is a duplicate-key rejection of the named constraint.
    #[must_use]
    pub fn is_duplicate_of(&self, constraint: &str) -> bool {
        matches!(self, Self::Duplicate(name) if name == constraint)
    }
}

/// Insert payload for a new user row. Phone and gender stay unset until
/// onboarding completes.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Normalized (lowercase) institutional email.
    pub email: String,
    /// Display name from the identity provider.
    pub full_name: String,
    /// Subject identifier from the identity provider.
    pub provider_subject: Option<String>,
}

/// Filters for the pool listing query. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct PoolFilter {
    /// Case-insensitive substring of the trip origin.
    pub start_point: Option<String>,
    /// Case-insensitive substring of the trip destination.
    pub end_point: Option<String>,
    /// Exact transport mode.
    pub transport_mode: Option<TransportMode>,
    /// Pools departing on this UTC calendar day.
    pub departure_date: Option<NaiveDate>,
    /// Exact female-only flag.
    pub is_female_only: Option<bool>,
}

/// Scope selector for a user's own pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserPoolsScope {
    /// Pools the user created.
    Created,
    /// Pools the user joined as a non-creator member.
    Joined,
    /// Both lists.
    All,
}

impl UserPoolsScope {
    /// Whether the created list is part of this scope.
    #[must_use]
    pub const fn includes_created(self) -> bool {
        matches!(self, Self::Created | Self::All)
    }

    /// Whether the joined list is part of this scope.
    #[must_use]
    pub const fn includes_joined(self) -> bool {
        matches!(self, Self::Joined | Self::All)
    }
}

impl FromStr for UserPoolsScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "joined" => Ok(Self::Joined),
            "all" => Ok(Self::All),
            other => Err(format!("unknown pools scope: {other}")),
        }
    }
}

/// The authoritative store for users, pools, and memberships.
///
/// Read methods see committed state. Every multi-step mutation goes
/// through [`CarpoolStore::begin`] so its steps commit or roll back as
/// one unit.
#[async_trait]
pub trait CarpoolStore: Send + Sync + 'static {
    /// The unit-of-work type for this store.
    type Tx: StoreTx;

    /// Opens a new transaction.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the transaction cannot be opened.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Looks up a user by id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Looks up a user by normalized email.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Looks up a user by phone number.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError>;

    /// Lists pools matching `filter`, with creator and roster, ordered
    /// by departure time ascending.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn list_pools(&self, filter: &PoolFilter) -> Result<Vec<PoolDetail>, StoreError>;

    /// Loads one pool with creator and roster.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn pool_detail(&self, id: PoolId) -> Result<Option<PoolDetail>, StoreError>;

    /// Pools created by `user`, ordered by departure time ascending.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn pools_created_by(&self, user: UserId) -> Result<Vec<PoolDetail>, StoreError>;

    /// Pools `user` joined as a non-creator member, ordered by departure
    /// time ascending.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn pools_joined_by(&self, user: UserId) -> Result<Vec<PoolDetail>, StoreError>;
}

/// One open transaction against the store.
///
/// Mutating and reading operations compose on the transaction; nothing
/// is durable until [`StoreTx::commit`]. Dropping the value without
/// committing rolls the transaction back.
#[async_trait]
pub trait StoreTx: Send {
    /// Makes every operation performed on this transaction durable.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the commit fails; the transaction is
    /// rolled back in that case.
    async fn commit(self) -> Result<(), StoreError>;

    /// Inserts a new user row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] with [`UNIQUE_USERS_EMAIL`] if
    /// the email is already registered.
    async fn insert_user(&mut self, user: &NewUser) -> Result<User, StoreError>;

    /// Binds phone number and gender to a user, completing onboarding.
    /// Returns `None` if the user row does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] with [`UNIQUE_USERS_PHONE`] if
    /// the phone number belongs to another user.
    async fn update_onboarding(
        &mut self,
        id: UserId,
        phone: &str,
        gender: Gender,
    ) -> Result<Option<User>, StoreError>;

    /// Loads a pool row and locks it for the rest of this transaction,
    /// serializing concurrent membership transitions on the same pool.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn lock_pool(&mut self, id: PoolId) -> Result<Option<Pool>, StoreError>;

    /// Inserts a pool row with occupancy one.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn insert_pool(&mut self, draft: &PoolDraft, created_by: UserId)
    -> Result<Pool, StoreError>;

    /// Deletes a pool; memberships go with it. Returns whether a row
    /// was deleted.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn delete_pool(&mut self, id: PoolId) -> Result<bool, StoreError>;

    /// Writes the pool's occupancy counter.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure, including occupancy
    /// values outside the database's allowed range.
    async fn set_occupancy(&mut self, id: PoolId, current_persons: i32) -> Result<(), StoreError>;

    /// Looks up the membership of `user` in `pool`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn find_membership(
        &mut self,
        pool: PoolId,
        user: UserId,
    ) -> Result<Option<Membership>, StoreError>;

    /// Inserts a membership row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] with [`UNIQUE_POOL_MEMBER`] if
    /// the user already holds a membership in the pool.
    async fn insert_membership(
        &mut self,
        pool: PoolId,
        user: UserId,
        is_creator: bool,
    ) -> Result<Membership, StoreError>;

    /// Deletes the membership of `user` in `pool`. Returns whether a
    /// row was deleted.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn delete_membership(&mut self, pool: PoolId, user: UserId) -> Result<bool, StoreError>;
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn scope_parses_query_values() {
        assert_eq!(
            "created".parse::<UserPoolsScope>().ok(),
            Some(UserPoolsScope::Created)
        );
        assert_eq!(
            "joined".parse::<UserPoolsScope>().ok(),
            Some(UserPoolsScope::Joined)
        );
        assert_eq!(
            "all".parse::<UserPoolsScope>().ok(),
            Some(UserPoolsScope::All)
        );
        assert!("mine".parse::<UserPoolsScope>().is_err());
    }

    #[test]
    fn scope_membership_of_lists() {
        assert!(UserPoolsScope::Created.includes_created());
        assert!(!UserPoolsScope::Created.includes_joined());
        assert!(UserPoolsScope::Joined.includes_joined());
        assert!(!UserPoolsScope::Joined.includes_created());
        assert!(UserPoolsScope::All.includes_created());
        assert!(UserPoolsScope::All.includes_joined());
    }

    #[test]
    fn duplicate_matches_by_constraint_name() {
        let err = StoreError::Duplicate(UNIQUE_USERS_PHONE.to_string());
        assert!(err.is_duplicate_of(UNIQUE_USERS_PHONE));
        assert!(!err.is_duplicate_of(UNIQUE_USERS_EMAIL));
        assert!(!StoreError::Database("boom".to_string()).is_duplicate_of(UNIQUE_USERS_PHONE));
    }
}
