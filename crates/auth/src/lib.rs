//! `billing-auth`: identity and access boundary.
//!
//! Identity comes from an external provider; this crate only models the
//! resolved caller and the ownership rules applied to bills. Every rule takes
//! the caller explicitly, there is no ambient "current user".

pub mod access;
pub mod caller;
pub mod claims;
pub mod roles;

pub use access::{AccessDenied, ensure_admin, ensure_can_order_for, ensure_owner_or_admin};
pub use caller::Caller;
pub use claims::{
    AuthError, Authenticator, Hs256JwtValidator, JwtClaims, TokenValidationError, validate_claims,
};
pub use roles::Role;
