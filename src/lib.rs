//! # ridepool
//!
//! Carpool matching backend for a closed campus community.
//!
//! Students sign in with their institutional Cognito account, finish a
//! short onboarding step, and then create or join carpool pools to
//! split travel fares. Fares, free seats, and fullness are derived on
//! every read; the database stores only the facts.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers + Extractors (api/)
//!     │
//!     ├── AuthService / PoolService /
//!     │   MembershipService / QueryService (service/)
//!     │
//!     ├── TokenService + IdentityProvider (auth/)
//!     │
//!     └── CarpoolStore → PostgreSQL (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
