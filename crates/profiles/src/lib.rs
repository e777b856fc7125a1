//! `stockroom-profiles`: user credentials (email as username).
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod password;
pub mod user;

use thiserror::Error;

pub use password::{hash_password, verify_password};
pub use user::{
    NewUserProfile, ProfileFields, UserProfile, create_superuser, create_user, normalize_email,
};

/// Credential invariant failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("An email address is required")]
    MissingEmail,

    /// Carries the name of the flag that was switched off.
    #[error("Superuser must have {0}=True.")]
    SuperuserFlag(&'static str),

    #[error("password hashing failed: {0}")]
    Hash(String),
}
