//! User profiles: email-as-username credentials.
//!
//! `create_user` / `create_superuser` build validated, not-yet-stored
//! profiles; persistence (and email uniqueness) belongs to the credential
//! store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{Entity, UserId};

use crate::ProfileError;
use crate::password::{self, UNUSABLE_PASSWORD};

// ─────────────────────────────────────────────────────────────────────────────
// Stored profile
// ─────────────────────────────────────────────────────────────────────────────

/// A stored user profile.
///
/// # Invariants
/// - `email` is non-empty and normalised; it doubles as the username.
/// - A superuser is always staff and admin as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_admin: bool,
    pub is_active: bool,
    pub avatar: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// The login name, which is the email address.
    pub fn username(&self) -> &str {
        &self.email
    }

    pub fn check_password(&self, raw_password: &str) -> bool {
        password::verify_password(raw_password, &self.password_hash)
    }
}

impl core::fmt::Display for UserProfile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.email)
    }
}

impl Entity for UserProfile {
    type Id = UserId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.date_joined
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Creation
// ─────────────────────────────────────────────────────────────────────────────

/// Optional profile attributes accepted on creation.
///
/// Flags left as `None` take the model defaults (or the superuser defaults in
/// `create_superuser`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_admin: Option<bool>,
    pub is_active: Option<bool>,
    pub avatar: Option<String>,
}

impl ProfileFields {
    pub fn named(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Default::default()
        }
    }
}

/// A validated profile waiting for the store to assign an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserProfile {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_admin: bool,
    pub is_active: bool,
    pub avatar: Option<String>,
    pub password_hash: String,
}

impl NewUserProfile {
    pub fn into_profile(self, id: UserId) -> UserProfile {
        UserProfile {
            id,
            email: self.email,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            date_joined: self.date_joined,
            last_login: None,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
            is_admin: self.is_admin,
            is_active: self.is_active,
            avatar: self.avatar,
            password_hash: self.password_hash,
        }
    }
}

/// Lower-case the domain part of an email address; the local part is kept
/// as given.
pub fn normalize_email(email: &str) -> String {
    match email.trim().rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Build a regular user. Without a password the profile cannot log in.
pub fn create_user(
    email: &str,
    password: Option<&str>,
    fields: ProfileFields,
    occurred_at: DateTime<Utc>,
) -> Result<NewUserProfile, ProfileError> {
    // Only the empty string counts as missing; whitespace is kept as given.
    if email.is_empty() {
        return Err(ProfileError::MissingEmail);
    }

    let password_hash = match password {
        Some(raw) => password::hash_password(raw)?,
        None => UNUSABLE_PASSWORD.to_string(),
    };

    Ok(NewUserProfile {
        email: normalize_email(email),
        username: fields.username,
        first_name: fields.first_name,
        last_name: fields.last_name,
        date_joined: occurred_at,
        is_staff: fields.is_staff.unwrap_or(false),
        is_superuser: fields.is_superuser.unwrap_or(false),
        is_admin: fields.is_admin.unwrap_or(false),
        is_active: fields.is_active.unwrap_or(true),
        avatar: fields.avatar,
        password_hash,
    })
}

/// Build a superuser: staff, superuser and admin flags default to true and
/// may not be switched off.
pub fn create_superuser(
    email: &str,
    password: &str,
    mut fields: ProfileFields,
    occurred_at: DateTime<Utc>,
) -> Result<NewUserProfile, ProfileError> {
    let is_staff = *fields.is_staff.get_or_insert(true);
    let is_superuser = *fields.is_superuser.get_or_insert(true);
    let is_admin = *fields.is_admin.get_or_insert(true);

    if !is_staff {
        return Err(ProfileError::SuperuserFlag("is_staff"));
    }
    if !is_superuser {
        return Err(ProfileError::SuperuserFlag("is_superuser"));
    }
    if !is_admin {
        return Err(ProfileError::SuperuserFlag("is_admin"));
    }

    create_user(email, Some(password), fields, occurred_at)
}
