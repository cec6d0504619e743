//! `stocktrail-auth` — authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: claim
//! validation is pure, token decoding is behind a trait, and nothing here
//! knows about routes or tables.

pub mod claims;
pub mod password;
pub mod roles;
pub mod user;

pub use claims::{
    Hs256JwtValidator, JwtClaims, JwtValidator, TokenValidationError, validate_claims,
};
pub use password::{PasswordError, hash_password, verify_password};
pub use roles::{Role, is_admin, is_staff};
pub use user::{NewUser, User, UserPatch};
