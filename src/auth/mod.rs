//! Authentication and authorization module

pub mod gate;
pub mod identity;
pub mod jwt;
pub mod password;

pub use gate::{authorize, Decision};
pub use identity::{extract_token, VerifiedIdentity};
pub use jwt::{Claims, JwtService, TokenError};
pub use password::PasswordHasher;
