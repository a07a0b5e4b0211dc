//! Pool membership rows.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::user::Gender;
use super::{MembershipId, PoolId, UserId};

/// One user's membership in one pool, from the `pool_members` table.
///
/// Exactly one row per (pool, user) pair; exactly one row per pool has
/// `is_creator` set, written atomically with the pool itself.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Membership {
    /// Unique membership identifier.
    pub id: MembershipId,
    /// The pool this membership belongs to.
    pub pool_id: PoolId,
    /// The member.
    pub user_id: UserId,
    /// Whether this member created the pool.
    pub is_creator: bool,
    /// When the membership was created.
    pub joined_at: DateTime<Utc>,
}

/// Membership joined with the member's public profile fields, as carried
/// in pool rosters.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PoolMember {
    /// Unique membership identifier.
    pub id: MembershipId,
    /// The pool this membership belongs to.
    pub pool_id: PoolId,
    /// The member.
    pub user_id: UserId,
    /// Whether this member created the pool.
    pub is_creator: bool,
    /// When the membership was created.
    pub joined_at: DateTime<Utc>,
    /// Member's display name.
    pub full_name: String,
    /// Member's phone number, if onboarded.
    pub phone_number: Option<String>,
    /// Member's gender, if onboarded.
    pub gender: Option<Gender>,
}
