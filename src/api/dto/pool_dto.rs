//! Pool DTOs: creation and filter inputs plus the read-model payloads.
//!
//! [`CreatePoolRequest`] carries every field as an `Option` so that one
//! validation pass can report all missing and out-of-range fields
//! together instead of failing on the first.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::pool::{MAX_CAPACITY, MIN_CAPACITY};
use crate::domain::{
    CreatorProfile, Gender, MembershipId, Pool, PoolDetail, PoolDraft, PoolId, PoolMember,
    TransportMode, UserId,
};
use crate::persistence::{PoolFilter, UserPoolsScope};

/// Request body for `POST /pools`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreatePoolRequest {
    /// Trip origin.
    #[serde(default)]
    pub start_point: Option<String>,
    /// Trip destination.
    #[serde(default)]
    pub end_point: Option<String>,
    /// Scheduled departure, RFC 3339.
    #[serde(default)]
    pub departure_time: Option<DateTime<Utc>>,
    /// Scheduled arrival, RFC 3339.
    #[serde(default)]
    pub arrival_time: Option<DateTime<Utc>>,
    /// One of the supported transport mode labels.
    #[serde(default)]
    pub transport_mode: Option<String>,
    /// Seat capacity including the creator.
    #[serde(default)]
    pub total_persons: Option<i32>,
    /// Total trip fare.
    #[serde(default)]
    pub total_fare: Option<f64>,
    /// Female-only restriction, off when omitted.
    #[serde(default)]
    pub is_female_only: Option<bool>,
}

fn require_text(value: Option<String>, message: &str, errors: &mut Vec<String>) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Some(text.to_string()),
        _ => {
            errors.push(message.to_string());
            None
        }
    }
}

impl CreatePoolRequest {
    /// Checks every field against `now` and builds the validated draft.
    ///
    /// # Errors
    ///
    /// Returns the full list of validation messages when any field is
    /// missing, blank, or out of range.
    pub fn validate(self, now: DateTime<Utc>) -> Result<PoolDraft, Vec<String>> {
        let mut errors = Vec::new();

        let start_point = require_text(self.start_point, "Start point is required", &mut errors);
        let end_point = require_text(self.end_point, "End point is required", &mut errors);
        if self.departure_time.is_none() {
            errors.push("Departure time is required".to_string());
        }
        if self.arrival_time.is_none() {
            errors.push("Arrival time is required".to_string());
        }
        let transport_label =
            require_text(self.transport_mode, "Transport mode is required", &mut errors);
        if self.total_persons.is_none() {
            errors.push("Total persons is required".to_string());
        }
        if self.total_fare.is_none() {
            errors.push("Total fare is required".to_string());
        }

        if let Some(persons) = self.total_persons
            && !(MIN_CAPACITY..=MAX_CAPACITY).contains(&persons)
        {
            errors.push(format!(
                "Total persons must be between {MIN_CAPACITY} and {MAX_CAPACITY}"
            ));
        }
        if let Some(fare) = self.total_fare
            && fare < 0.0
        {
            errors.push("Total fare must be greater than or equal to 0".to_string());
        }
        if let Some(departure) = self.departure_time
            && departure <= now
        {
            errors.push("Departure time must be in the future".to_string());
        }
        if let (Some(departure), Some(arrival)) = (self.departure_time, self.arrival_time)
            && arrival <= departure
        {
            errors.push("Arrival time must be after departure time".to_string());
        }
        let transport_mode = match transport_label.as_deref().map(str::parse::<TransportMode>) {
            Some(Ok(mode)) => Some(mode),
            Some(Err(_)) => {
                let allowed = TransportMode::ALL.map(TransportMode::as_str).join(", ");
                errors.push(format!("Transport mode must be one of: {allowed}"));
                None
            }
            None => None,
        };

        match (
            start_point,
            end_point,
            self.departure_time,
            self.arrival_time,
            transport_mode,
            self.total_persons,
            self.total_fare,
        ) {
            (
                Some(start_point),
                Some(end_point),
                Some(departure_time),
                Some(arrival_time),
                Some(transport_mode),
                Some(total_persons),
                Some(total_fare),
            ) if errors.is_empty() => Ok(PoolDraft {
                start_point,
                end_point,
                departure_time,
                arrival_time,
                transport_mode,
                total_persons,
                total_fare,
                is_female_only: self.is_female_only.unwrap_or(false),
            }),
            _ => Err(errors),
        }
    }
}

/// Query parameters for `GET /pools`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PoolListQuery {
    /// Case-insensitive substring match on the trip origin.
    pub start_point: Option<String>,
    /// Case-insensitive substring match on the destination.
    pub end_point: Option<String>,
    /// Exact transport mode.
    pub transport_mode: Option<TransportMode>,
    /// Pools departing on this UTC calendar day, `YYYY-MM-DD`.
    pub departure_date: Option<NaiveDate>,
    /// Female-only flag filter.
    pub is_female_only: Option<bool>,
}

impl PoolListQuery {
    /// Store-level filter for this query.
    #[must_use]
    pub fn into_filter(self) -> PoolFilter {
        PoolFilter {
            start_point: self.start_point,
            end_point: self.end_point,
            transport_mode: self.transport_mode,
            departure_date: self.departure_date,
            is_female_only: self.is_female_only,
        }
    }
}

/// Query parameters for `GET /pools/users/me/pools`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MyPoolsQuery {
    /// `created`, `joined`, or `all`. Defaults to `all`.
    #[serde(rename = "type")]
    pub scope: Option<String>,
}

impl MyPoolsQuery {
    /// Selected scope; anything unrecognised falls back to both sides.
    #[must_use]
    pub fn scope(&self) -> UserPoolsScope {
        self.scope
            .as_deref()
            .and_then(|label| label.parse().ok())
            .unwrap_or(UserPoolsScope::All)
    }
}

/// Member profile embedded in roster entries.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberUserDto {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub full_name: String,
    /// Phone number, absent before onboarding.
    pub phone_number: Option<String>,
    /// Gender, absent before onboarding.
    pub gender: Option<Gender>,
}

/// One roster entry in a pool payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberDto {
    /// Membership row identifier.
    pub id: MembershipId,
    /// The pool.
    pub pool_id: PoolId,
    /// The member.
    pub user_id: UserId,
    /// Whether this member created the pool.
    pub is_creator: bool,
    /// When the membership was taken.
    pub joined_at: DateTime<Utc>,
    /// Member profile.
    pub user: MemberUserDto,
}

impl From<PoolMember> for MemberDto {
    fn from(member: PoolMember) -> Self {
        Self {
            id: member.id,
            pool_id: member.pool_id,
            user_id: member.user_id,
            is_creator: member.is_creator,
            joined_at: member.joined_at,
            user: MemberUserDto {
                id: member.user_id,
                full_name: member.full_name,
                phone_number: member.phone_number,
                gender: member.gender,
            },
        }
    }
}

/// Full pool payload: stored fields, derived read-model fields, the
/// creator profile, and the member roster.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PoolDto {
    /// Pool identifier.
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
    /// Total trip fare.
    pub total_fare: f64,
    /// Female-only restriction flag.
    pub is_female_only: bool,
    /// The creating user.
    pub created_by: UserId,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Profile of the creating user.
    pub creator: CreatorProfile,
    /// Roster ordered by join time.
    pub members: Vec<MemberDto>,
    /// Fare share per current member.
    pub fare_per_head: f64,
    /// Seats still open.
    pub available_seats: i32,
    /// Whether every seat is taken.
    pub is_full: bool,
    /// Whether the requesting user holds a membership. Omitted on
    /// responses with no viewer context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_is_member: Option<bool>,
}

impl PoolDto {
    /// Builds the payload; `viewer` switches the membership flag on.
    #[must_use]
    pub fn from_detail(detail: PoolDetail, viewer: Option<UserId>) -> Self {
        let user_is_member = viewer.map(|user| detail.has_member(user));
        let PoolDetail {
            pool,
            creator,
            members,
        } = detail;
        Self {
            fare_per_head: pool.fare_per_head(),
            available_seats: pool.available_seats(),
            is_full: pool.is_full(),
            user_is_member,
            id: pool.id,
            start_point: pool.start_point,
            end_point: pool.end_point,
            departure_time: pool.departure_time,
            arrival_time: pool.arrival_time,
            transport_mode: pool.transport_mode,
            total_persons: pool.total_persons,
            current_persons: pool.current_persons,
            total_fare: pool.total_fare,
            is_female_only: pool.is_female_only,
            created_by: pool.created_by,
            created_at: pool.created_at,
            creator,
            members: members.into_iter().map(MemberDto::from).collect(),
        }
    }
}

/// Compact pool payload returned after a join.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinedPoolDto {
    /// Pool identifier.
    pub id: PoolId,
    /// Occupancy after the join.
    pub current_persons: i32,
    /// Fare share after the join.
    pub fare_per_head: f64,
    /// Seats still open after the join.
    pub available_seats: i32,
    /// Whether the join took the last seat.
    pub is_full: bool,
}

impl From<&Pool> for JoinedPoolDto {
    fn from(pool: &Pool) -> Self {
        Self {
            id: pool.id,
            current_persons: pool.current_persons,
            fare_per_head: pool.fare_per_head(),
            available_seats: pool.available_seats(),
            is_full: pool.is_full(),
        }
    }
}

/// Response body for `GET /pools`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PoolListResponse {
    /// Always `true`.
    pub success: bool,
    /// Pools matching the filters, soonest departure first.
    pub pools: Vec<PoolDto>,
}

/// Response body for `GET /pools/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PoolDetailResponse {
    /// Always `true`.
    pub success: bool,
    /// The requested pool.
    pub pool: PoolDto,
}

/// Response body for `POST /pools` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatePoolResponse {
    /// Always `true`.
    pub success: bool,
    /// Confirmation message.
    pub message: String,
    /// The created pool with its creator seated.
    pub pool: PoolDto,
}

/// Response body for `POST /pools/{id}/join`.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinPoolResponse {
    /// Always `true`.
    pub success: bool,
    /// Confirmation message.
    pub message: String,
    /// Occupancy snapshot after the join.
    pub pool: JoinedPoolDto,
}

/// Response body for `GET /pools/users/me/pools`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MyPoolsResponse {
    /// Always `true`.
    pub success: bool,
    /// Pools the user created.
    pub created_pools: Vec<PoolDto>,
    /// Pools the user joined as a rider.
    pub joined_pools: Vec<PoolDto>,
}
