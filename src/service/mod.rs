//! Service layer: business rules orchestrated over the store.
//!
//! Each service owns one slice of behavior and reaches the database
//! only through the [`crate::persistence::CarpoolStore`] traits, so the
//! whole layer runs unchanged against the in-memory store in tests.

pub mod auth_service;
pub mod membership_service;
pub mod pool_service;
pub mod query_service;

#[cfg(test)]
pub(crate) mod testing;

pub use auth_service::{AuthService, SignInOutcome};
pub use membership_service::MembershipService;
pub use pool_service::PoolService;
pub use query_service::{QueryService, UserPools};
