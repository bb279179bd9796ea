//! Authentication for FileVault.
//!
//! This module provides password hashing, access tokens, and user
//! registration. The file core only ever sees the verified user id.

mod password;
mod registration;
mod token;

pub use password::{
    hash_password, validate_password, verify_password, PasswordError, MAX_PASSWORD_LENGTH,
    MIN_PASSWORD_LENGTH,
};
pub use registration::{authenticate, register, RegistrationRequest};
pub use token::{Claims, TokenService};
