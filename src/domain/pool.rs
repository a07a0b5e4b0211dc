//! Pool entity with derived read-model fields.
//!
//! [`Pool`] mirrors one row of the `pools` table. Fare split, seat
//! availability, and fullness are never stored; they are pure functions
//! of the stored facts and are recomputed on every read.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::membership::PoolMember;
use super::user::CreatorProfile;
use super::{PoolId, UserId};

/// Smallest allowed pool capacity (the creator plus one seat).
pub const MIN_CAPACITY: i32 = 2;

/// Largest allowed pool capacity.
pub const MAX_CAPACITY: i32 = 50;

/// Means of transport for a pool. Stored as the Postgres enum
/// `transport_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transport_mode", rename_all = "PascalCase")]
#[allow(missing_docs)]
pub enum TransportMode {
    Car,
    Bike,
    Train,
    Bus,
    Plane,
    Ferry,
}

impl TransportMode {
    /// Every supported mode, in the order shown to users.
    pub const ALL: [Self; 6] = [
        Self::Car,
        Self::Bike,
        Self::Train,
        Self::Bus,
        Self::Plane,
        Self::Ferry,
    ];

    /// The wire label for this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Car => "Car",
            Self::Bike => "Bike",
            Self::Train => "Train",
            Self::Bus => "Bus",
            Self::Plane => "Plane",
            Self::Ferry => "Ferry",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| format!("unknown transport mode: {s}"))
    }
}

/// A carpool pool row from the `pools` table.
///
/// Invariant: `1 <= current_persons <= total_persons`, and
/// `current_persons` equals the number of membership rows at every
/// commit point. Both ends are also enforced by database constraints.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Pool {
    /// Unique pool identifier.
    pub id: PoolId,
    /// Trip origin.
    pub start_point: String,
    /// Trip destination.
    pub end_point: String,
    /// Scheduled departure.
    pub departure_time: DateTime<Utc>,
    /// Scheduled arrival.
    pub arrival_time: DateTime<Utc>,
    /// Means of transport.
    pub transport_mode: TransportMode,
    /// Seat capacity including the creator.
    pub total_persons: i32,
    /// Current occupancy including the creator.
    pub current_persons: i32,
    /// Total trip fare, split evenly across current members on read.
    pub total_fare: f64,
    /// When set, only users with [`super::Gender::Female`] may create or
    /// join.
    pub is_female_only: bool,
    /// The creating user.
    pub created_by: UserId,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Pool {
    /// Fare share per current member.
    ///
    /// Occupancy never drops below one, so the split is always defined;
    /// a zero fare yields `0.0`.
    #[must_use]
    pub fn fare_per_head(&self) -> f64 {
        self.total_fare / f64::from(self.current_persons)
    }

    /// Seats still open.
    #[must_use]
    pub const fn available_seats(&self) -> i32 {
        self.total_persons - self.current_persons
    }

    /// Whether every seat is taken.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current_persons >= self.total_persons
    }
}

/// Validated payload for creating a pool.
///
/// Produced by request validation at the API boundary; the service layer
/// trusts its field-level invariants (capacity bounds, time ordering,
/// non-negative fare).
#[derive(Debug, Clone)]
pub struct PoolDraft {
    /// Trip origin.
    pub start_point: String,
    /// Trip destination.
    pub end_point: String,
    /// Scheduled departure (strictly in the future at validation time).
    pub departure_time: DateTime<Utc>,
    /// Scheduled arrival (strictly after departure).
    pub arrival_time: DateTime<Utc>,
    /// Means of transport.
    pub transport_mode: TransportMode,
    /// Seat capacity, within [`MIN_CAPACITY`]..=[`MAX_CAPACITY`].
    pub total_persons: i32,
    /// Total trip fare, non-negative.
    pub total_fare: f64,
    /// Female-only restriction flag.
    pub is_female_only: bool,
}

/// A pool joined with its creator profile and full member roster.
#[derive(Debug, Clone)]
pub struct PoolDetail {
    /// The pool row.
    pub pool: Pool,
    /// Profile of the creating user.
    pub creator: CreatorProfile,
    /// All memberships with member profiles, ordered by join time.
    pub members: Vec<PoolMember>,
}

impl PoolDetail {
    /// Whether `user` currently holds a membership in this pool.
    #[must_use]
    pub fn has_member(&self, user: UserId) -> bool {
        self.members.iter().any(|m| m.user_id == user)
    }
}
