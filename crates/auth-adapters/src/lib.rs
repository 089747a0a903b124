//! Bearer-token authentication for the alumni hub.
//!
//! Tokens are minted by the identity provider; this crate only needs the
//! shared secret to verify them. [`jwt::JwtAuthority::issue`] exists for the
//! seed tool and tests.

#[cfg(feature = "auth-jwt")]
pub mod jwt;

#[cfg(feature = "auth-jwt")]
pub use jwt::{Claims, JwtAuthority, TokenError};
