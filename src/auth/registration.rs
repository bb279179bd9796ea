//! Account registration and login.

use tracing::{info, warn};

use crate::db::{Database, NewUser, User, UserRepository};
use crate::file::FileStorage;
use crate::{Result, VaultError};

use super::password::{hash_password, verify_password};

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 80;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Desired username.
    pub username: String,
    /// Email address, used to log in.
    pub email: String,
    /// Plain-text password (8-128 characters).
    pub password: String,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        let username = self.username.trim();
        if username.is_empty() || username.chars().count() > MAX_USERNAME_LENGTH {
            return Err(VaultError::Validation(format!(
                "username must be 1-{MAX_USERNAME_LENGTH} characters"
            )));
        }
        if username.chars().any(char::is_control) {
            return Err(VaultError::Validation(
                "username must not contain control characters".to_string(),
            ));
        }

        let email = self.email.trim();
        let well_formed = email
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if !well_formed || email.len() > MAX_EMAIL_LENGTH {
            return Err(VaultError::Validation("invalid email address".to_string()));
        }
        Ok(())
    }
}

/// Register a new user and create their storage root.
///
/// A taken username or email is `AlreadyExists`. If the storage root
/// cannot be created the user row is removed again.
pub async fn register(
    db: &Database,
    storage: &FileStorage,
    request: &RegistrationRequest,
) -> Result<User> {
    request.validate()?;

    let username = request.username.trim();
    let email = request.email.trim();
    let repo = UserRepository::new(db.pool());
    if repo.exists(username, email).await? {
        return Err(VaultError::AlreadyExists("username or email".to_string()));
    }

    let password_hash = hash_password(&request.password)?;
    let user = repo
        .create(&NewUser::new(username, email, password_hash))
        .await?;

    if let Err(e) = storage.ensure_user_root(user.id).await {
        warn!(user_id = user.id, error = %e, "Failed to create storage root, rolling back user");
        repo.delete(user.id).await?;
        return Err(e);
    }

    info!(user_id = user.id, username = %user.username, "User registered");
    Ok(user)
}

/// Check an email and password pair.
///
/// Unknown emails and wrong passwords fail the same way.
pub async fn authenticate(db: &Database, email: &str, password: &str) -> Result<User> {
    let user = UserRepository::new(db.pool())
        .get_by_email(email.trim())
        .await?
        .ok_or_else(|| VaultError::Auth("invalid credentials".to_string()))?;

    verify_password(password, &user.password)?;
    Ok(user)
}
