//! Authentication and profile service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        member::Member,
        user::{Caller, Role, Signup, UpdateProfile, User, UserClaims},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by email and password, returning a token
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !verify_password(&user.password_hash, password)? {
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }

        if !user.is_active {
            return Err(AppError::Authorization("Account is deactivated".to_string()));
        }

        let token = self.create_token(&user)?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok((token, user))
    }

    /// Self-registration as a member
    pub async fn signup(&self, signup: Signup) -> AppResult<(String, User)> {
        if self.repository.users.email_exists(&signup.email, None).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&signup.password)?;
        let user = self.repository.users.signup(&signup, &password_hash).await?;
        let token = self.create_token(&user)?;

        tracing::info!(user_id = user.id, member_id = ?user.member_id, "User signed up");
        Ok((token, user))
    }

    /// Turn validated token claims into the current identity of the caller.
    /// The user row is re-read so role changes and deactivation apply at once.
    pub async fn resolve_caller(&self, claims: &UserClaims) -> AppResult<Caller> {
        let user = match self.repository.users.get_by_id(claims.user_id).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Authentication("User no longer exists".to_string()))
            }
            Err(e) => return Err(e),
        };

        if !user.is_active {
            return Err(AppError::Authorization("Account is deactivated".to_string()));
        }

        Ok(Caller::from(&user))
    }

    /// Login and member profile of the caller
    pub async fn profile(&self, caller: &Caller) -> AppResult<(User, Option<Member>)> {
        let user = self.repository.users.get_by_id(caller.user_id).await?;
        let member = match user.member_id {
            Some(id) => Some(self.repository.members.get_by_id(id).await?),
            None => None,
        };
        Ok((user, member))
    }

    /// Update the caller's own profile
    pub async fn update_profile(
        &self,
        caller: &Caller,
        profile: UpdateProfile,
    ) -> AppResult<(User, Option<Member>)> {
        let user = self.repository.users.get_by_id(caller.user_id).await?;

        if let Some(ref email) = profile.email {
            let taken = self.repository.users.email_exists(email, Some(user.id)).await?
                || self.repository.members.email_exists(email, user.member_id).await?;
            if taken {
                return Err(AppError::Conflict("Email already in use".to_string()));
            }
        }

        let password_hash = match profile.password {
            Some(ref password) => Some(hash_password(password)?),
            None => None,
        };

        self.repository
            .users
            .update_profile(&user, &profile, password_hash)
            .await?;

        tracing::info!(user_id = user.id, "Profile updated");
        self.profile(caller).await
    }

    /// Create the configured admin account when no admin exists yet
    pub async fn ensure_admin(&self) -> AppResult<()> {
        let (email, password) = match (&self.config.admin_email, &self.config.admin_password) {
            (Some(email), Some(password)) => (email, password),
            _ => return Ok(()),
        };

        if self.repository.users.admin_exists().await? {
            return Ok(());
        }

        if self.repository.users.email_exists(email, None).await? {
            tracing::warn!(email = %email, "Cannot create admin: email already used by another account");
            return Ok(());
        }

        let user = self
            .repository
            .users
            .create(email, &hash_password(password)?, Role::Admin)
            .await?;
        tracing::info!(user_id = user.id, "Created initial admin account");
        Ok(())
    }

    /// Create JWT token for a user
    pub fn create_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.id.to_string(),
            user_id: user.id,
            role: user.role,
            member_id: user.member_id,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
