//! Domain layer: core entities and read-model functions.
//!
//! This module contains the server-side domain model: typed identifiers,
//! the user entity with its onboarding state, the pool entity with its
//! derived fare/seat fields, and membership rows. Nothing here talks to
//! the database; persistence lives behind the store traits.

pub mod ids;
pub mod membership;
pub mod pool;
pub mod user;

pub use ids::{MembershipId, PoolId, UserId};
pub use membership::{Membership, PoolMember};
pub use pool::{Pool, PoolDetail, PoolDraft, TransportMode};
pub use user::{CreatorProfile, Gender, User};
