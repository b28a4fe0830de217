//! Authentication: password rules and hashing, JWT access tokens, and the
//! request extractors that guard protected handlers.

pub mod extractors;
pub mod jwt;
pub mod password;

pub use extractors::{AdminUser, AuthUser};
