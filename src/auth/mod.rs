//! Authentication: token issuance and verification, plus the identity
//! provider seam used during sign-in.

pub mod provider;
pub mod token;

pub use provider::{CognitoIdentityProvider, IdentityProvider, VerifiedIdentity};
pub use token::{Claims, TokenService};
